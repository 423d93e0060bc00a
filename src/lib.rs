//! School locator API.
//!
//! Registers schools with their coordinates and lists them ordered by
//! great-circle distance from a caller-supplied point.
//!
//! ```text
//! POST /api/addSchool                       register a school
//! GET  /api/listSchools?latitude=&longitude= schools, nearest first
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Error types and their HTTP mapping
//! - [`geo`]: Haversine distance
//! - [`validation`]: Request validation
//! - [`store`]: Persistence gateway (MySQL and in-memory)
//! - [`schools`]: Registration and proximity ranking
//! - [`api`]: HTTP handlers and router
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod geo;
pub mod metrics;
pub mod schools;
pub mod store;
pub mod utils;
pub mod validation;

pub use config::Config;
pub use error::{AppError, Result};
