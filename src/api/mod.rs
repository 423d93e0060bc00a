//! HTTP API: school endpoints, health, readiness, metrics, and docs.

pub mod handlers;
pub mod openapi;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
