//! OpenAPI document for the public endpoints.

use utoipa::OpenApi;

use super::handlers;
use crate::error::{ErrorBody, FieldError};
use crate::geo::Coordinates;

/// Generated OpenAPI description, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(title = "School Locator API", description = "Register schools and list them by distance"),
    paths(
        handlers::root,
        handlers::health,
        handlers::ready,
        handlers::add_school,
        handlers::list_schools,
    ),
    components(schemas(
        handlers::AddSchoolRequest,
        handlers::AddSchoolResponse,
        handlers::ListSchoolsResponse,
        handlers::SchoolData,
        handlers::SchoolWithDistance,
        Coordinates,
        ErrorBody,
        FieldError,
    )),
    tags(
        (name = "schools", description = "School registration and proximity search"),
        (name = "service", description = "Banner, health, and readiness"),
    )
)]
pub struct ApiDoc;
