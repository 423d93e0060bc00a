//! Application configuration loaded from environment variables.

use serde::Deserialize;
use strum::Display;

/// TLS mode for the database connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SslMode {
    /// Plain TCP.
    #[default]
    Disabled,
    /// TLS if the server offers it.
    Preferred,
    /// TLS required, certificate not verified.
    Required,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// HTTP listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log filter (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,

    // === Database Connection ===
    /// Database host.
    #[serde(default = "default_db_host")]
    pub db_host: String,

    /// Database port.
    #[serde(default = "default_db_port")]
    pub db_port: u16,

    /// Database user.
    #[serde(default = "default_db_user")]
    pub db_user: String,

    /// Database password.
    #[serde(default)]
    pub db_password: String,

    /// Database (schema) name.
    #[serde(default = "default_db_name")]
    pub db_name: String,

    /// TLS mode.
    #[serde(default)]
    pub db_ssl_mode: SslMode,

    // === Pool ===
    /// Maximum concurrent connections.
    #[serde(default = "default_connection_limit")]
    pub db_connection_limit: u32,

    /// Seconds a request waits for a free connection.
    #[serde(default = "default_acquire_timeout")]
    pub db_acquire_timeout_secs: u64,

    // === Startup ===
    /// Schema initialization attempts before giving up.
    #[serde(default = "default_init_attempts")]
    pub db_init_attempts: u32,

    /// Seconds between schema initialization attempts.
    #[serde(default = "default_init_retry")]
    pub db_init_retry_secs: u64,
}

/// Variables injected by hosting platforms (`MYSQLHOST`, `MYSQLPORT`, ...).
/// When present they win over the `DB_*` equivalents.
#[derive(Debug, Default, Deserialize)]
struct PlatformDatabase {
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    password: Option<String>,
    database: Option<String>,
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    3306
}

fn default_db_user() -> String {
    "root".to_string()
}

fn default_db_name() -> String {
    "test".to_string()
}

fn default_connection_limit() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_init_attempts() -> u32 {
    5
}

fn default_init_retry() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            rust_log: default_log_level(),
            log_format: LogFormat::default(),
            db_host: default_db_host(),
            db_port: default_db_port(),
            db_user: default_db_user(),
            db_password: String::new(),
            db_name: default_db_name(),
            db_ssl_mode: SslMode::default(),
            db_connection_limit: default_connection_limit(),
            db_acquire_timeout_secs: default_acquire_timeout(),
            db_init_attempts: default_init_attempts(),
            db_init_retry_secs: default_init_retry(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        let mut config: Config = envy::from_env()?;
        let platform: PlatformDatabase = envy::prefixed("MYSQL").from_env()?;
        config.apply_platform(platform);
        Ok(config)
    }

    fn apply_platform(&mut self, platform: PlatformDatabase) {
        if let Some(host) = platform.host {
            self.db_host = host;
        }
        if let Some(port) = platform.port {
            self.db_port = port;
        }
        if let Some(user) = platform.user {
            self.db_user = user;
        }
        if let Some(password) = platform.password {
            self.db_password = password;
        }
        if let Some(database) = platform.database {
            self.db_name = database;
        }
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.db_name.is_empty() {
            return Err("DB_NAME must not be empty".to_string());
        }

        if self.db_host.is_empty() {
            return Err("DB_HOST must not be empty".to_string());
        }

        if self.db_connection_limit == 0 {
            return Err("DB_CONNECTION_LIMIT must be at least 1".to_string());
        }

        if self.db_init_attempts == 0 {
            return Err("DB_INIT_ATTEMPTS must be at least 1".to_string());
        }

        Ok(())
    }

    /// Connection target with the password redacted, for logs.
    pub fn database_summary(&self) -> String {
        let password = if self.db_password.is_empty() {
            ""
        } else {
            ":<redacted>"
        };
        format!(
            "mysql://{}{}@{}:{}/{}",
            self.db_user, password, self.db_host, self.db_port, self.db_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_sensible() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.db_port, 3306);
        assert_eq!(config.db_connection_limit, 10);
        assert_eq!(config.db_ssl_mode, SslMode::Disabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_connection_limit() {
        let config = Config {
            db_connection_limit: 0,
            ..Config::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_database_name() {
        let config = Config {
            db_name: String::new(),
            ..Config::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn platform_variables_override_defaults() {
        let mut config = Config::default();
        config.apply_platform(PlatformDatabase {
            host: Some("db.internal".to_string()),
            port: Some(3307),
            database: Some("railway".to_string()),
            ..PlatformDatabase::default()
        });

        assert_eq!(config.db_host, "db.internal");
        assert_eq!(config.db_port, 3307);
        assert_eq!(config.db_name, "railway");
        assert_eq!(config.db_user, "root");
    }

    #[test]
    fn summary_hides_password() {
        let config = Config {
            db_password: "hunter2".to_string(),
            ..Config::default()
        };

        let summary = config.database_summary();
        assert!(!summary.contains("hunter2"));
        assert_eq!(summary, "mysql://root:<redacted>@localhost:3306/test");
    }

    #[test]
    fn ssl_mode_displays_lowercase() {
        assert_eq!(SslMode::Required.to_string(), "required");
        assert_eq!(LogFormat::Json.to_string(), "json");
    }
}
