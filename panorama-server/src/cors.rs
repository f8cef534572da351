//! CORS middleware.
//!
//! The admin page is served from a different origin than the handler, so
//! every response carries CORS headers, errors and 405s included. A request
//! `Origin` on the allow-list is echoed back; anything else gets the fixed
//! default origin. Preflight requests are answered here with `204`.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";
const MAX_AGE_SECS: &str = "86400";

/// Origin allow-list plus the fallback origin.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
    default_origin: String,
}

impl CorsPolicy {
    pub fn new(allowed_origins: Vec<String>, default_origin: impl Into<String>) -> Self {
        Self {
            allowed_origins,
            default_origin: default_origin.into(),
        }
    }

    /// Origin to send back for a request carrying `origin`.
    pub fn resolve<'a>(&'a self, origin: Option<&'a str>) -> &'a str {
        match origin {
            Some(o) if self.allowed_origins.iter().any(|allowed| allowed == o) => o,
            _ => &self.default_origin,
        }
    }

    fn apply(&self, request_origin: Option<&str>, headers: &mut HeaderMap) {
        let origin = self.resolve(request_origin);
        if let Ok(value) = HeaderValue::from_str(origin) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE_SECS));
        if origin != "*" {
            headers.append(header::VARY, HeaderValue::from_static("Origin"));
        }
    }
}

/// Answer preflights and decorate every other response.
pub async fn cors_middleware(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    policy.apply(origin.as_deref(), response.headers_mut());
    response
}
