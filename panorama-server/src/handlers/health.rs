//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always "healthy" when the process answers
    #[schema(value_type = String)]
    pub status: &'static str,
    /// Server version from Cargo.toml
    #[schema(value_type = String)]
    pub version: &'static str,
    /// Service name
    #[schema(value_type = String)]
    pub service: &'static str,
    /// Object store backend in use
    #[schema(value_type = String, example = "filesystem")]
    pub storage: &'static str,
    /// Credential scheme for admin requests
    #[schema(value_type = String, example = "shared-secret")]
    pub auth: &'static str,
}

/// GET /health - Health check endpoint
///
/// Does not touch the store or the identity provider.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "panorama-server",
        storage: state.catalog.store().backend_name(),
        auth: state.authenticator.scheme(),
    })
}
