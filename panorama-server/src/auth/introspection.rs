//! ID token checks delegated to the provider's tokeninfo endpoint.

use async_trait::async_trait;

use super::claims::{AdminPolicy, GoogleClaims};
use super::{Authenticator, Authorization, Credentials, DenyReason};
use crate::error::ApiError;

/// Asks the provider's tokeninfo endpoint whether an ID token is genuine.
///
/// The endpoint checks the signature and expiry; a non-2xx answer means the
/// token was rejected. The returned claims then go through [`AdminPolicy`].
pub struct TokenIntrospectionAuthenticator {
    tokeninfo_url: String,
    policy: AdminPolicy,
    http_client: reqwest::Client,
}

impl TokenIntrospectionAuthenticator {
    pub fn new(tokeninfo_url: String, policy: AdminPolicy) -> Self {
        Self {
            tokeninfo_url,
            policy,
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Authenticator for TokenIntrospectionAuthenticator {
    async fn authorize(&self, credentials: &Credentials) -> Result<Authorization, ApiError> {
        let Some(token) = credentials.token.as_deref() else {
            return Ok(Authorization::Denied(DenyReason::MissingCredential));
        };

        let response = self
            .http_client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", token)])
            .send()
            .await
            .map_err(|e| ApiError::dependency(format!("Token introspection failed: {}", e)))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(ApiError::dependency(format!(
                "Token introspection endpoint returned {}",
                status
            )));
        }
        if !status.is_success() {
            return Ok(Authorization::Denied(DenyReason::InvalidToken(format!(
                "rejected by provider ({})",
                status
            ))));
        }

        let claims: GoogleClaims = match response.json().await {
            Ok(claims) => claims,
            Err(e) => {
                return Ok(Authorization::Denied(DenyReason::InvalidToken(format!(
                    "unexpected tokeninfo payload: {}",
                    e
                ))))
            }
        };

        Ok(self
            .policy
            .evaluate(&claims, chrono::Utc::now().timestamp(), self.scheme()))
    }

    fn scheme(&self) -> &'static str {
        "token-introspection"
    }
}
