//! Unified error types for the school locator.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use strum::IntoStaticStr;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use crate::metrics;

/// Client message for any 500 response.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Client message for a 500 caused by a missing `schools` table.
pub const MISSING_TABLE_MESSAGE: &str = "Database table not found";

/// Client message for a duplicate (name, address) pair.
pub const DUPLICATE_SCHOOL_MESSAGE: &str = "School with this name and address already exists";

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    /// Offending input field.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error returned by request handlers.
///
/// The variant decides the HTTP status; nothing downstream inspects
/// store-specific codes.
#[derive(Error, Debug, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum AppError {
    /// Input failed validation.
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// Resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// No route matched.
    #[error("endpoint not found")]
    NotFound,

    /// Anything else. `public` is what the client sees.
    #[error("internal error: {source}")]
    Internal {
        /// Message returned to the client.
        public: &'static str,
        /// Underlying cause, logged only.
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metric label for this error.
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    /// Wrap an unexpected failure as a generic 500.
    pub fn internal(source: impl Into<anyhow::Error>) -> Self {
        AppError::Internal {
            public: INTERNAL_ERROR_MESSAGE,
            source: source.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => AppError::Conflict(DUPLICATE_SCHOOL_MESSAGE.to_string()),
            StoreError::MissingTable(_) => AppError::Internal {
                public: MISSING_TABLE_MESSAGE,
                source: err.into(),
            },
            other => AppError::internal(other),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Summary of the failure.
    pub message: String,
    /// Per-field details, present for validation failures only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        metrics::inc_api_errors(self.kind());

        let body = match self {
            AppError::Validation(errors) => ErrorBody {
                success: false,
                message: "Validation error".to_string(),
                errors: Some(errors),
            },
            AppError::Conflict(message) => ErrorBody {
                success: false,
                message,
                errors: None,
            },
            AppError::NotFound => ErrorBody {
                success: false,
                message: "Endpoint not found".to_string(),
                errors: None,
            },
            AppError::Internal { public, source } => {
                error!(error = ?source, "request failed");
                ErrorBody {
                    success: false,
                    message: public.to_string(),
                    errors: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Persistence errors, classified where the store raises them.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Unique (name, address) index violated.
    #[error("duplicate school")]
    Duplicate,

    /// The `schools` table does not exist.
    #[error("table missing: {0}")]
    MissingTable(String),

    /// No connection could be obtained.
    #[error("database unavailable: {0}")]
    Unavailable(String),

    /// The store returned something unusable.
    #[error("unexpected result: {0}")]
    Unexpected(String),

    /// Any other query failure.
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),
}

/// MySQL `ER_NO_SUCH_TABLE`.
const MYSQL_NO_SUCH_TABLE: &str = "1146";

/// SQLSTATE for an unknown table.
const SQLSTATE_NO_SUCH_TABLE: &str = "42S02";

impl StoreError {
    /// Classify a sqlx error.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
            sqlx::Error::Database(db)
                if db.code().as_deref() == Some(SQLSTATE_NO_SUCH_TABLE)
                    || db.code().as_deref() == Some(MYSQL_NO_SUCH_TABLE) =>
            {
                StoreError::MissingTable(db.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            _ => StoreError::Query(err),
        }
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
