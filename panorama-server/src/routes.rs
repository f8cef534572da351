//! Router configuration module
//!
//! Configures all routes, middleware layers, and creates the application router.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, StatusCode},
    middleware,
    routing::get,
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::propagate_header::PropagateHeaderLayer;
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::cors::{cors_middleware, CorsPolicy};
use crate::handlers::{
    admin_handler, health, image_handler, list_handler, method_not_allowed, not_found,
    openapi_json,
};
use crate::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Create the application router with default config and in-memory storage (for testing)
pub fn create_router() -> Router {
    create_router_with_config(&Config {
        storage: crate::config::StorageBackend::Memory,
        ..Config::default()
    })
}

/// Create the application router with custom configuration over an in-memory store
///
/// Filesystem storage needs async setup; use [`AppState::from_config`] and
/// [`create_router_with_state`] for that.
pub fn create_router_with_config(config: &Config) -> Router {
    let state = AppState::with_store(config, Arc::new(panorama_core::MemoryStore::new()));
    create_router_with_state(state)
}

/// Create the application router over prepared state
pub fn create_router_with_state(state: AppState) -> Router {
    let config = state.config.clone();

    if config.allowed_origins.is_empty() {
        tracing::warn!(
            default_origin = %config.default_origin,
            "CORS: no allow-list, every response carries the default origin"
        );
    } else {
        tracing::info!(
            "CORS: echoing {} allow-listed origin(s)",
            config.allowed_origins.len()
        );
    }
    let cors = Arc::new(CorsPolicy::new(
        config.allowed_origins.clone(),
        config.default_origin.clone(),
    ));

    let body_limit_bytes = config.body_limit_mb * 1024 * 1024;

    let timeout = TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.timeout_secs),
    );

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route(
            "/",
            get(list_handler)
                .post(admin_handler)
                .fallback(method_not_allowed),
        )
        .route("/image", get(image_handler).fallback(method_not_allowed))
        .route("/health", get(health).fallback(method_not_allowed))
        .route(
            "/api-docs/openapi.json",
            get(openapi_json).fallback(method_not_allowed),
        )
        .fallback(not_found)
        .with_state(state)
        // Multipart reads honour DefaultBodyLimit, not the tower-http layer
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .layer(timeout)
        .layer(middleware::from_fn_with_state(cors, cors_middleware))
        .layer(PropagateHeaderLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}
