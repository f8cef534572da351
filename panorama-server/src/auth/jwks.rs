//! Local ID token verification against the provider's JWKS.
//!
//! Signing keys are fetched once and cached for an hour.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, jwk, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::claims::{AdminPolicy, GoogleClaims, GOOGLE_ISSUERS};
use super::{Authenticator, Authorization, Credentials, DenyReason};
use crate::error::ApiError;

/// JWKS cache TTL (1 hour)
const JWKS_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Cached JWKS keys with timestamp
struct CachedJwks {
    keys: Vec<jwk::Jwk>,
    fetched_at: Instant,
}

#[derive(Deserialize)]
struct JwksResponse {
    keys: Vec<jwk::Jwk>,
}

/// JWKS cache that fetches and caches the provider's JSON Web Key Set
pub struct JwksCache {
    keys: RwLock<Option<CachedJwks>>,
    jwks_url: String,
    http_client: reqwest::Client,
}

impl JwksCache {
    pub fn new(jwks_url: String) -> Self {
        Self {
            keys: RwLock::new(None),
            jwks_url,
            http_client: reqwest::Client::new(),
        }
    }

    /// Cache pre-seeded with `keys`, as if just fetched.
    pub fn with_keys(jwks_url: String, keys: Vec<jwk::Jwk>) -> Self {
        Self {
            keys: RwLock::new(Some(CachedJwks {
                keys,
                fetched_at: Instant::now(),
            })),
            jwks_url,
            http_client: reqwest::Client::new(),
        }
    }

    /// Get cached keys, fetching them if expired or not yet cached
    async fn get_keys(&self) -> Result<Vec<jwk::Jwk>, ApiError> {
        {
            let cache = self.keys.read().await;
            if let Some(ref cached) = *cache {
                if cached.fetched_at.elapsed() < JWKS_CACHE_TTL {
                    return Ok(cached.keys.clone());
                }
            }
        }

        let mut cache = self.keys.write().await;

        // Another task may have refreshed while we waited for the write lock
        if let Some(ref cached) = *cache {
            if cached.fetched_at.elapsed() < JWKS_CACHE_TTL {
                return Ok(cached.keys.clone());
            }
        }

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| ApiError::dependency(format!("Failed to fetch JWKS: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::dependency(format!(
                "JWKS endpoint returned {}",
                status
            )));
        }

        let jwks: JwksResponse = response
            .json()
            .await
            .map_err(|e| ApiError::dependency(format!("Failed to parse JWKS: {}", e)))?;

        tracing::info!(key_count = jwks.keys.len(), "Refreshed JWKS cache");

        *cache = Some(CachedJwks {
            keys: jwks.keys.clone(),
            fetched_at: Instant::now(),
        });

        Ok(jwks.keys)
    }

    async fn find_key(&self, kid: &str) -> Result<Option<jwk::Jwk>, ApiError> {
        Ok(self
            .get_keys()
            .await?
            .into_iter()
            .find(|k| k.common.key_id.as_deref() == Some(kid)))
    }
}

/// Verifies RS256 ID tokens with cached provider keys, then applies the admin policy.
pub struct LocalTokenAuthenticator {
    jwks: Arc<JwksCache>,
    policy: AdminPolicy,
}

impl LocalTokenAuthenticator {
    pub fn new(jwks: Arc<JwksCache>, policy: AdminPolicy) -> Self {
        Self { jwks, policy }
    }

    async fn verify(&self, token: &str) -> Result<Result<GoogleClaims, DenyReason>, ApiError> {
        let header = match decode_header(token) {
            Ok(header) => header,
            Err(e) => return Ok(Err(DenyReason::InvalidToken(format!("bad header: {}", e)))),
        };

        let Some(kid) = header.kid else {
            return Ok(Err(DenyReason::InvalidToken("header missing 'kid'".into())));
        };

        let Some(jwk) = self.jwks.find_key(&kid).await? else {
            return Ok(Err(DenyReason::InvalidToken(format!(
                "no signing key for kid '{}'",
                kid
            ))));
        };

        let decoding_key = DecodingKey::from_jwk(&jwk)
            .map_err(|e| ApiError::dependency(format!("Unusable JWKS key '{}': {}", kid, e)))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_issuer(&GOOGLE_ISSUERS);
        // Audience is matched by the admin policy
        validation.validate_aud = false;

        Ok(
            decode::<GoogleClaims>(token, &decoding_key, &validation)
                .map(|data| data.claims)
                .map_err(|e| match e.kind() {
                    ErrorKind::ExpiredSignature => DenyReason::Expired,
                    ErrorKind::InvalidIssuer => DenyReason::WrongIssuer("unexpected".into()),
                    ErrorKind::InvalidSignature => {
                        DenyReason::InvalidToken("invalid signature".into())
                    }
                    _ => DenyReason::InvalidToken(e.to_string()),
                }),
        )
    }
}

#[async_trait]
impl Authenticator for LocalTokenAuthenticator {
    async fn authorize(&self, credentials: &Credentials) -> Result<Authorization, ApiError> {
        let Some(token) = credentials.token.as_deref() else {
            return Ok(Authorization::Denied(DenyReason::MissingCredential));
        };

        Ok(match self.verify(token).await? {
            Ok(claims) => {
                self.policy
                    .evaluate(&claims, chrono::Utc::now().timestamp(), self.scheme())
            }
            Err(reason) => Authorization::Denied(reason),
        })
    }

    fn scheme(&self) -> &'static str {
        "token-local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const PRIVATE_KEY: &str = include_str!("../../tests/fixtures/test_rsa_private.pem");
    const JWKS: &str = include_str!("../../tests/fixtures/test_jwks.json");
    const CLIENT_ID: &str = "client-1.apps.googleusercontent.com";

    fn authenticator() -> LocalTokenAuthenticator {
        let jwks: JwksResponse = serde_json::from_str(JWKS).unwrap();
        LocalTokenAuthenticator::new(
            Arc::new(JwksCache::with_keys(
                "http://127.0.0.1:9/unused".into(),
                jwks.keys,
            )),
            AdminPolicy::new(Some(CLIENT_ID.into()), vec!["admin@example.com".to_string()]),
        )
    }

    fn sign(kid: &str, claims: serde_json::Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        let key = EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).unwrap();
        encode(&header, &claims, &key).unwrap()
    }

    fn claims(email: &str, exp_offset: i64) -> serde_json::Value {
        serde_json::json!({
            "iss": "https://accounts.google.com",
            "aud": CLIENT_ID,
            "sub": "1234567890",
            "exp": chrono::Utc::now().timestamp() + exp_offset,
            "email": email,
            "email_verified": true,
        })
    }

    fn token_creds(token: String) -> Credentials {
        Credentials {
            token: Some(token),
            ..Credentials::default()
        }
    }

    #[tokio::test]
    async fn test_valid_token_granted() {
        let token = sign("test-key-1", claims("admin@example.com", 600));
        let outcome = authenticator().authorize(&token_creds(token)).await.unwrap();
        assert!(matches!(outcome, Authorization::Granted(_)));
    }

    #[tokio::test]
    async fn test_expired_token_denied() {
        let token = sign("test-key-1", claims("admin@example.com", -3600));
        let outcome = authenticator().authorize(&token_creds(token)).await.unwrap();
        assert_eq!(outcome, Authorization::Denied(DenyReason::Expired));
    }

    #[tokio::test]
    async fn test_unknown_kid_denied() {
        let token = sign("rotated-away", claims("admin@example.com", 600));
        let outcome = authenticator().authorize(&token_creds(token)).await.unwrap();
        assert!(matches!(
            outcome,
            Authorization::Denied(DenyReason::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_tampered_token_denied() {
        let token = sign("test-key-1", claims("admin@example.com", 600));
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = sign("test-key-1", claims("intruder@example.com", 600));
        let forged_payload = forged.split('.').nth(1).unwrap().to_string();
        parts[1] = &forged_payload;
        let outcome = authenticator()
            .authorize(&token_creds(parts.join(".")))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            Authorization::Denied(DenyReason::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_garbage_token_denied() {
        let outcome = authenticator()
            .authorize(&token_creds("not-a-jwt".into()))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            Authorization::Denied(DenyReason::InvalidToken(_))
        ));
    }
}
