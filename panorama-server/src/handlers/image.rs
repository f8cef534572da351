//! Image proxy handler
//!
//! Serves stored variants without authentication. Each client IP is held to
//! a fixed number of requests per window.

use axum::{
    extract::{rejection::QueryRejection, Query, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use panorama_core::Variant;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::ApiError;
use crate::rate_limit::{client_ip, retry_after_secs};
use crate::state::AppState;
use crate::validation::parse_photo_id;

/// Stored variants never change under the same key.
pub const IMAGE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

#[derive(Debug, Deserialize, IntoParams)]
pub struct ImageQuery {
    /// Photo ID
    pub id: Option<String>,
    /// `1.jpg` (default), `mobile.webp` or `desktop.webp`
    pub file: Option<String>,
}

/// Fetch a stored variant
#[utoipa::path(
    get,
    path = "/image",
    tag = "Catalog",
    params(ImageQuery),
    responses(
        (status = 200, description = "Image bytes", content_type = "image/*"),
        (status = 400, description = "Malformed id or unknown file"),
        (status = 404, description = "Variant not stored"),
        (status = 429, description = "Rate limit exceeded; see Retry-After")
    )
)]
pub async fn image_handler(
    State(state): State<AppState>,
    query: Result<Query<ImageQuery>, QueryRejection>,
    request: Request,
) -> Result<Response, ApiError> {
    let ip = client_ip(
        request.headers(),
        request.extensions(),
        state.config.trust_proxy_headers,
    );
    state
        .image_limiter
        .check(ip)
        .map_err(|wait| ApiError::RateLimited {
            retry_after_secs: retry_after_secs(wait),
        })?;

    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let id = parse_photo_id("id", query.id.as_deref())?;

    let file = query
        .file
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or(Variant::Primary.file_name());
    let variant = Variant::from_file_name(file).ok_or_else(|| {
        ApiError::bad_request(format!(
            "'file' must be one of 1.jpg, mobile.webp, desktop.webp, got '{}'",
            file
        ))
    })?;

    let object = state
        .catalog
        .variant(id, variant)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Photo {} has no {}", id, file)))?;

    let content_type = object
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static(variant.content_type()));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static(IMAGE_CACHE_CONTROL),
            ),
        ],
        object.data,
    )
        .into_response())
}
