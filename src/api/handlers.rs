//! HTTP API handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, ErrorBody, FieldError};
use crate::geo::{round_km, Coordinates};
use crate::metrics;
use crate::schools::{RankedSchool, SchoolService};
use crate::store::School;
use crate::validation::{validate_new_school, validate_reference_point, ListSchoolsQuery};

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// School operations.
    pub schools: SchoolService,
    /// Whether the schema has been initialized.
    pub ready: Arc<AtomicBool>,
    /// Prometheus renderer, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new(schools: SchoolService) -> Self {
        Self {
            schools,
            ready: Arc::new(AtomicBool::new(false)),
            metrics: None,
        }
    }

    /// Attach a metrics renderer.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Set ready state.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Check if ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

/// Service banner.
#[derive(Debug, Serialize, ToSchema)]
pub struct BannerResponse {
    /// Always `true`.
    pub success: bool,
    /// Banner text.
    pub message: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Server time, RFC 3339.
    pub timestamp: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always `true`.
    pub success: bool,
    /// Status: "healthy".
    pub status: &'static str,
    /// Server time, RFC 3339.
    pub timestamp: String,
}

/// Readiness check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Whether the service can serve API requests.
    pub ready: bool,
    /// Database state: "up", "down", or "initializing".
    pub database: &'static str,
}

/// Add-school request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddSchoolRequest {
    /// School name, 1..=255 characters.
    pub name: String,
    /// Address, 1..=500 characters.
    pub address: String,
    /// Latitude, -90..=90.
    pub latitude: f64,
    /// Longitude, -180..=180.
    pub longitude: f64,
}

/// A school as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SchoolData {
    /// Generated id.
    pub id: i64,
    /// School name.
    pub name: String,
    /// Address.
    pub address: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
}

impl From<&School> for SchoolData {
    fn from(school: &School) -> Self {
        Self {
            id: school.id,
            name: school.name.clone(),
            address: school.address.clone(),
            latitude: school.latitude,
            longitude: school.longitude,
        }
    }
}

/// A school with its distance from the reference point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SchoolWithDistance {
    /// School fields.
    #[serde(flatten)]
    pub school: SchoolData,
    /// Distance in kilometers, two decimals.
    pub distance: f64,
}

impl From<RankedSchool> for SchoolWithDistance {
    fn from(ranked: RankedSchool) -> Self {
        Self {
            school: SchoolData::from(&ranked.school),
            distance: round_km(ranked.distance_km),
        }
    }
}

/// Add-school response.
#[derive(Debug, Serialize, ToSchema)]
pub struct AddSchoolResponse {
    /// Always `true`.
    pub success: bool,
    /// Outcome message.
    pub message: &'static str,
    /// The created school.
    pub data: SchoolData,
}

/// List-schools response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListSchoolsResponse {
    /// Always `true`.
    pub success: bool,
    /// Outcome message.
    pub message: &'static str,
    /// Schools, nearest first.
    pub data: Vec<SchoolWithDistance>,
    /// Echo of the reference point.
    pub user_location: Coordinates,
}

/// Documented shape of the list-schools query.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListSchoolsParams {
    /// Reference latitude, -90..=90.
    pub latitude: f64,
    /// Reference longitude, -180..=180.
    pub longitude: f64,
}

/// Service banner.
#[utoipa::path(get, path = "/", tag = "service",
    responses((status = 200, description = "Service banner", body = BannerResponse)))]
pub async fn root() -> impl IntoResponse {
    Json(BannerResponse {
        success: true,
        message: "School Management API is running",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: now_rfc3339(),
    })
}

/// Health check handler - always returns 200.
#[utoipa::path(get, path = "/health", tag = "service",
    responses((status = 200, description = "Process is alive", body = HealthResponse)))]
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        success: true,
        status: "healthy",
        timestamp: now_rfc3339(),
    })
}

/// Readiness check handler - returns 200 once the schema exists and the
/// database answers, 503 otherwise.
#[utoipa::path(get, path = "/ready", tag = "service",
    responses(
        (status = 200, description = "Ready", body = ReadyResponse),
        (status = 503, description = "Not ready", body = ReadyResponse)))]
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    if !state.is_ready() {
        let response = ReadyResponse {
            ready: false,
            database: "initializing",
        };
        return (StatusCode::SERVICE_UNAVAILABLE, Json(response));
    }

    match state.schools.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadyResponse {
                ready: true,
                database: "up",
            }),
        ),
        Err(e) => {
            debug!(error = %e, "readiness ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    ready: false,
                    database: "down",
                }),
            )
        }
    }
}

/// Prometheus metrics in text exposition format.
pub async fn metrics_text(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let handle = state.metrics.ok_or(AppError::NotFound)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}

/// Register a school.
#[utoipa::path(post, path = "/api/addSchool", tag = "schools",
    request_body = AddSchoolRequest,
    responses(
        (status = 201, description = "School created", body = AddSchoolResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 409, description = "Duplicate name and address", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)))]
pub async fn add_school(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let _timer = metrics::timer_http_request("add_school");

    let Json(body) = payload.map_err(|rejection| {
        metrics::inc_validation_failures("add_school");
        AppError::Validation(vec![FieldError::new("body", rejection.body_text())])
    })?;

    let school = validate_new_school(&body).map_err(|errors| {
        metrics::inc_validation_failures("add_school");
        AppError::Validation(errors)
    })?;

    let id = state.schools.add_school(&school).await?;

    Ok((
        StatusCode::CREATED,
        Json(AddSchoolResponse {
            success: true,
            message: "School added successfully",
            data: SchoolData {
                id,
                name: school.name,
                address: school.address,
                latitude: school.location.latitude,
                longitude: school.location.longitude,
            },
        }),
    ))
}

/// List all schools ordered by distance from a reference point.
#[utoipa::path(get, path = "/api/listSchools", tag = "schools",
    params(ListSchoolsParams),
    responses(
        (status = 200, description = "Schools nearest first", body = ListSchoolsResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)))]
pub async fn list_schools(
    State(state): State<AppState>,
    query: Result<Query<ListSchoolsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let _timer = metrics::timer_http_request("list_schools");

    let Query(query) = query.map_err(|rejection| {
        metrics::inc_validation_failures("list_schools");
        AppError::Validation(vec![FieldError::new("query", rejection.body_text())])
    })?;

    let origin = validate_reference_point(&query).map_err(|errors| {
        metrics::inc_validation_failures("list_schools");
        AppError::Validation(errors)
    })?;

    let ranked = state.schools.list_by_proximity(origin).await?;

    let message = if ranked.is_empty() {
        "No schools found"
    } else {
        "Schools retrieved successfully"
    };

    Ok(Json(ListSchoolsResponse {
        success: true,
        message,
        data: ranked.into_iter().map(SchoolWithDistance::from).collect(),
        user_location: origin,
    }))
}

/// Catch-all for unmatched routes and methods.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
