//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.
//! Every error renders as `{ "success": false, "error": ..., "code": ... }`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use panorama_core::CatalogError;
use thiserror::Error;

/// Message returned for every authentication failure.
///
/// The concrete reason is logged but never sent, so callers cannot tell a
/// wrong secret from an unknown account.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unauthorized - missing, invalid or expired credential (reason is logged only)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Not found - requested object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Method not allowed on this path
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Too many image requests from one client
    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Internal server error - unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Store or identity provider failure, surfaced verbatim
    #[error("{0}")]
    Dependency(String),

    /// Catalog failure (object store, manifest, static fallback)
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create an unauthorized error; `reason` is logged, not returned
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized(reason.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a dependency (store / identity provider) error
    pub fn dependency(message: impl Into<String>) -> Self {
        Self::Dependency(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) | Self::Dependency(_) | Self::Catalog(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Dependency(_) => "DEPENDENCY_ERROR",
            Self::Catalog(ref e) => match e {
                CatalogError::Store(_) => "STORE_ERROR",
                CatalogError::Manifest(_) => "MANIFEST_ERROR",
                CatalogError::Fallback(_) => "STATIC_MANIFEST_ERROR",
            },
        }
    }

    /// Get the message sent to the client
    fn client_message(&self) -> String {
        match self {
            Self::Unauthorized(_) => UNAUTHORIZED_MESSAGE.to_string(),
            Self::BadRequest(m) | Self::NotFound(m) | Self::MethodNotAllowed(m) => m.clone(),
            Self::RateLimited { .. } => "Too many requests".to_string(),
            // Dependency failures are reported as-is
            _ => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::MethodNotAllowed(_) => "method_not_allowed",
            Self::RateLimited { .. } => "rate_limited",
            Self::Internal(_) => "internal",
            Self::Dependency(_) | Self::Catalog(_) => "dependency",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        match &self {
            Self::BadRequest(_) | Self::NotFound(_) | Self::MethodNotAllowed(_) => {
                tracing::warn!(
                    status = %status,
                    category = category,
                    code = code,
                    error = %internal_message,
                    "Client error"
                );
            }
            Self::Unauthorized(_) => {
                tracing::warn!(
                    status = %status,
                    category = category,
                    code = code,
                    error = %internal_message,
                    "Authentication error"
                );
            }
            Self::RateLimited { .. } => {
                tracing::debug!(
                    status = %status,
                    category = category,
                    error = %internal_message,
                    "Rate limited"
                );
            }
            Self::Internal(_) | Self::Dependency(_) | Self::Catalog(_) => {
                tracing::error!(
                    status = %status,
                    category = category,
                    code = code,
                    error = %internal_message,
                    "Server error"
                );
            }
        }

        let body = serde_json::json!({
            "success": false,
            "error": client_message,
            "code": code,
        });

        let mut response = (status, Json(body)).into_response();
        if let Self::RateLimited { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
