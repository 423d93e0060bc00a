//! Persistence gateway for schools.
//!
//! Handlers never touch a pool directly; they go through [`SchoolStore`],
//! which is constructed once at startup and injected via the app state.

pub mod memory;
pub mod mysql;

use std::time::Duration;

use async_trait::async_trait;
use sqlx::FromRow;
use time::OffsetDateTime;
use tracing::{error, info, warn};

use crate::error::StoreError;
use crate::geo::Coordinates;
use crate::validation::NewSchool;

pub use memory::InMemorySchoolStore;
pub use mysql::MySqlSchoolStore;

/// A stored school row.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct School {
    /// Store-generated identifier.
    pub id: i64,
    /// School name.
    pub name: String,
    /// Postal address.
    pub address: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Row creation time.
    pub created_at: OffsetDateTime,
    /// Last modification time.
    pub updated_at: OffsetDateTime,
}

impl School {
    /// Location of this school.
    pub fn location(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Storage operations for schools.
#[async_trait]
pub trait SchoolStore: Send + Sync + std::fmt::Debug {
    /// Create the schema if it does not exist yet.
    async fn initialize(&self) -> Result<(), StoreError>;

    /// Cheap connectivity check.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Whether a school with exactly this name and address exists.
    async fn duplicate_exists(&self, name: &str, address: &str) -> Result<bool, StoreError>;

    /// Insert a school and return its generated id.
    ///
    /// Fails with [`StoreError::Duplicate`] when the (name, address) pair
    /// is already taken, even if a prior `duplicate_exists` said otherwise.
    async fn insert_school(&self, school: &NewSchool) -> Result<i64, StoreError>;

    /// All schools in insertion order.
    async fn list_schools(&self) -> Result<Vec<School>, StoreError>;

    /// Release pooled resources.
    async fn close(&self) {}
}

/// Run [`SchoolStore::initialize`] up to `attempts` times, sleeping `delay`
/// between failures. Returns the last error if every attempt fails.
pub async fn initialize_with_retry(
    store: &dyn SchoolStore,
    attempts: u32,
    delay: Duration,
) -> Result<(), StoreError> {
    let mut attempt = 1;
    loop {
        match store.initialize().await {
            Ok(()) => {
                info!(attempt, "database initialized");
                return Ok(());
            }
            Err(e) if attempt < attempts => {
                warn!(attempt, attempts, error = %e, "database initialization failed, retrying in {:?}", delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                error!(attempt, error = %e, "database initialization failed");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn retry_gives_up_after_all_attempts() {
        let store = InMemorySchoolStore::new();
        store.set_unavailable(true);

        let result = initialize_with_retry(&store, 3, Duration::from_millis(1)).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn retry_succeeds_once_store_recovers() {
        let store = std::sync::Arc::new(InMemorySchoolStore::new());
        store.set_unavailable(true);

        let recovering = store.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            recovering.set_unavailable(false);
        });

        initialize_with_retry(store.as_ref(), 50, Duration::from_millis(5))
            .await
            .unwrap();
    }
}
