//! Panorama Server Library - upload/manifest handler for the VR panorama gallery
//!
//! This library exposes the server components for use in integration tests.
//! The main binary uses these same components.

pub mod auth;
pub mod config;
pub mod cors;
pub mod error;
pub mod handlers;
pub mod multipart;
pub mod openapi;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod validation;

pub use auth::{
    build_authenticator, AdminPolicy, Authenticator, Authorization, Credentials, DenyReason,
    Identity, JwksCache, LocalTokenAuthenticator, SharedSecretAuthenticator,
    TokenIntrospectionAuthenticator,
};
pub use config::{AuthMode, Config, StorageBackend};
pub use cors::CorsPolicy;
pub use error::{ApiError, UNAUTHORIZED_MESSAGE};
pub use openapi::ApiDoc;
pub use rate_limit::FixedWindowLimiter;
pub use routes::{create_router, create_router_with_config, create_router_with_state};
pub use state::AppState;
