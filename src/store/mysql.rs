//! MySQL-backed school store.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlSslMode};
use tracing::{debug, info, instrument};

use super::{School, SchoolStore};
use crate::config::{Config, SslMode};
use crate::error::StoreError;
use crate::metrics;
use crate::validation::NewSchool;

const CREATE_SCHOOLS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schools (
    id BIGINT AUTO_INCREMENT PRIMARY KEY,
    name VARCHAR(255) COLLATE utf8mb4_bin NOT NULL,
    address VARCHAR(500) COLLATE utf8mb4_bin NOT NULL,
    latitude DOUBLE NOT NULL,
    longitude DOUBLE NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
    INDEX idx_schools_name (name),
    INDEX idx_schools_location (latitude, longitude),
    UNIQUE KEY uq_schools_name_address (name, address)
) DEFAULT CHARSET = utf8mb4
"#;

const SELECT_DUPLICATE: &str = "SELECT id FROM schools WHERE name = ? AND address = ? LIMIT 1";

const INSERT_SCHOOL: &str =
    "INSERT INTO schools (name, address, latitude, longitude) VALUES (?, ?, ?, ?)";

const SELECT_ALL: &str = "SELECT id, name, address, latitude, longitude, created_at, updated_at \
     FROM schools ORDER BY id";

impl From<SslMode> for MySqlSslMode {
    fn from(mode: SslMode) -> Self {
        match mode {
            SslMode::Disabled => MySqlSslMode::Disabled,
            SslMode::Preferred => MySqlSslMode::Preferred,
            SslMode::Required => MySqlSslMode::Required,
        }
    }
}

/// School store on a bounded MySQL connection pool.
#[derive(Debug, Clone)]
pub struct MySqlSchoolStore {
    pool: MySqlPool,
}

impl MySqlSchoolStore {
    /// Build the pool without connecting.
    ///
    /// Connections are opened on first use, so the server can start while
    /// the database is still unreachable. Callers waiting on an exhausted
    /// pool give up after the configured acquire timeout.
    pub fn connect_lazy(config: &Config) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.db_host)
            .port(config.db_port)
            .username(&config.db_user)
            .password(&config.db_password)
            .database(&config.db_name)
            .ssl_mode(config.db_ssl_mode.into());

        let pool = MySqlPoolOptions::new()
            .max_connections(config.db_connection_limit)
            .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
            .connect_lazy_with(options);

        info!(
            host = %config.db_host,
            port = config.db_port,
            database = %config.db_name,
            max_connections = config.db_connection_limit,
            ssl_mode = %config.db_ssl_mode,
            "MySQL pool configured"
        );

        Self { pool }
    }
}

#[async_trait]
impl SchoolStore for MySqlSchoolStore {
    #[instrument(skip(self))]
    async fn initialize(&self) -> Result<(), StoreError> {
        let _timer = metrics::timer_store_query("initialize");
        sqlx::query(CREATE_SCHOOLS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        debug!("schools table ready");
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn duplicate_exists(&self, name: &str, address: &str) -> Result<bool, StoreError> {
        let _timer = metrics::timer_store_query("duplicate_exists");
        let row: Option<(i64,)> = sqlx::query_as(SELECT_DUPLICATE)
            .bind(name)
            .bind(address)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(row.is_some())
    }

    #[instrument(skip(self, school), fields(name = %school.name))]
    async fn insert_school(&self, school: &NewSchool) -> Result<i64, StoreError> {
        let _timer = metrics::timer_store_query("insert_school");
        let result = sqlx::query(INSERT_SCHOOL)
            .bind(&school.name)
            .bind(&school.address)
            .bind(school.location.latitude)
            .bind(school.location.longitude)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;

        let id = result.last_insert_id();
        i64::try_from(id).map_err(|_| StoreError::Unexpected(format!("id {id} out of range")))
    }

    #[instrument(skip(self))]
    async fn list_schools(&self) -> Result<Vec<School>, StoreError> {
        let _timer = metrics::timer_store_query("list_schools");
        sqlx::query_as::<_, School>(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
