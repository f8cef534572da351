//! Admin authentication module
//!
//! Every mutating request carries one credential, checked before anything
//! else about the request is validated. Three interchangeable schemes are
//! supported, selected by `AUTH_MODE`:
//!
//! - [`SharedSecretAuthenticator`] - `password` / `apiSecret` form field,
//!   compared in constant time
//! - [`TokenIntrospectionAuthenticator`] - Google ID token checked by the
//!   provider's tokeninfo endpoint
//! - [`LocalTokenAuthenticator`] - Google ID token verified locally against
//!   the provider's JWKS
//!
//! Each produces a uniform [`Authorization`]: granted with an [`Identity`],
//! or denied with a [`DenyReason`]. Denials become a generic 401; the reason
//! only reaches the logs.

mod claims;
mod introspection;
mod jwks;
mod shared_secret;

pub use claims::{AdminPolicy, GoogleClaims, GOOGLE_ISSUERS};
pub use introspection::TokenIntrospectionAuthenticator;
pub use jwks::{JwksCache, LocalTokenAuthenticator};
pub use shared_secret::{constant_time_eq, SharedSecretAuthenticator};

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use thiserror::Error;

use crate::config::{AuthMode, Config};
use crate::error::ApiError;
use crate::multipart::MultipartFields;

/// Credential material presented with a request.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// `password` form field
    pub password: Option<String>,
    /// `apiSecret` form field
    pub api_secret: Option<String>,
    /// `googleToken` form field, or the `Authorization: Bearer` token
    pub token: Option<String>,
}

impl Credentials {
    /// Collect credentials from the form, falling back to the bearer header for the token.
    pub fn from_request(fields: &MultipartFields, headers: &HeaderMap) -> Self {
        let non_empty = |name: &str| {
            fields
                .get_text(name)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Self {
            password: non_empty("password"),
            api_secret: non_empty("apiSecret"),
            token: non_empty("googleToken")
                .or_else(|| extract_bearer_token(headers).map(str::to_string)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.password.is_none() && self.api_secret.is_none() && self.token.is_none()
    }
}

/// Who was let in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable subject: the secret's field name or the token's `sub`
    pub subject: String,
    /// Email from the identity token, when there is one
    pub email: Option<String>,
    /// Scheme that granted access
    pub scheme: &'static str,
}

/// Why a credential was refused. Never sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DenyReason {
    #[error("no credential supplied")]
    MissingCredential,
    #[error("shared secret mismatch")]
    SecretMismatch,
    #[error("no shared secret configured")]
    NoSecretConfigured,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("token expired")]
    Expired,
    #[error("unexpected token issuer '{0}'")]
    WrongIssuer(String),
    #[error("unexpected token audience '{0}'")]
    WrongAudience(String),
    #[error("no token audience configured")]
    NoAudienceConfigured,
    #[error("email not verified")]
    EmailNotVerified,
    #[error("email '{0}' is not an administrator")]
    EmailNotAllowed(String),
}

/// Outcome of a credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Granted(Identity),
    Denied(DenyReason),
}

/// A credential scheme.
///
/// `Err` is reserved for identity-provider failures (network, malformed
/// provider responses); a bad credential is `Ok(Authorization::Denied(..))`.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authorize(&self, credentials: &Credentials) -> Result<Authorization, ApiError>;

    /// Scheme name for logs and health output.
    fn scheme(&self) -> &'static str;
}

/// Run the authenticator and turn a denial into a 401.
pub async fn require_admin(
    authenticator: &dyn Authenticator,
    credentials: &Credentials,
) -> Result<Identity, ApiError> {
    if credentials.is_empty() {
        return Err(ApiError::unauthorized(DenyReason::MissingCredential.to_string()));
    }

    match authenticator.authorize(credentials).await? {
        Authorization::Granted(identity) => {
            tracing::debug!(
                subject = %identity.subject,
                scheme = identity.scheme,
                "Admin authenticated"
            );
            Ok(identity)
        }
        Authorization::Denied(reason) => Err(ApiError::unauthorized(format!(
            "{} ({})",
            reason,
            authenticator.scheme()
        ))),
    }
}

/// Build the authenticator selected by the configuration.
pub fn build_authenticator(config: &Config) -> Arc<dyn Authenticator> {
    let policy = AdminPolicy::new(
        config.google_client_id.clone(),
        config.allowed_emails.iter().cloned(),
    );

    match config.auth_mode {
        AuthMode::SharedSecret => {
            if config.admin_password.is_none() && config.api_secret.is_none() {
                tracing::warn!("Auth: no ADMIN_PASSWORD or API_SECRET set, all writes will be refused");
            }
            Arc::new(SharedSecretAuthenticator::new(
                config.admin_password.clone(),
                config.api_secret.clone(),
            ))
        }
        AuthMode::TokenIntrospection => {
            warn_on_incomplete_policy(&policy);
            Arc::new(TokenIntrospectionAuthenticator::new(
                config.tokeninfo_url.clone(),
                policy,
            ))
        }
        AuthMode::TokenLocal => {
            warn_on_incomplete_policy(&policy);
            Arc::new(LocalTokenAuthenticator::new(
                Arc::new(JwksCache::new(config.jwks_url.clone())),
                policy,
            ))
        }
    }
}

fn warn_on_incomplete_policy(policy: &AdminPolicy) {
    if policy.audience().is_none() {
        tracing::warn!("Auth: GOOGLE_CLIENT_ID not set, all tokens will be refused");
    }
    if policy.allowed_emails().is_empty() {
        tracing::warn!("Auth: ALLOWED_EMAILS is empty, all tokens will be refused");
    }
}

/// Extract the Bearer token from the Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
