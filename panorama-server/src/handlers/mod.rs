//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod admin;
pub mod health;
pub mod image;
pub mod list;

use axum::http::{Method, Uri};
use axum::Json;

pub use crate::state::AppState;
pub use admin::{admin_handler, DeleteResponse, UploadResponse, VariantUrls};
pub use health::{health, HealthResponse};
pub use image::{image_handler, IMAGE_CACHE_CONTROL};
pub use list::{list_handler, ListQuery, ListResponse, ScanEntryResponse};

use crate::error::ApiError;
use crate::openapi::ApiDoc;

/// 405 for any method a route does not handle
pub async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::MethodNotAllowed(format!("{} is not allowed on {}", method, uri.path()))
}

/// 404 for unknown paths
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}

/// GET /api-docs/openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    use utoipa::OpenApi;
    Json(ApiDoc::openapi())
}
