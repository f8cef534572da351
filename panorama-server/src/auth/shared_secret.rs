//! Shared-secret authentication: the admin password or the scripting API secret.

use async_trait::async_trait;
use sha3::{Digest, Sha3_256};

use super::{Authenticator, Authorization, Credentials, DenyReason, Identity};
use crate::error::ApiError;

/// Compare two secrets without leaking where they differ, or their lengths.
///
/// Both inputs are hashed first so the fold always runs over 32 bytes.
pub fn constant_time_eq(provided: &str, expected: &str) -> bool {
    let a = Sha3_256::digest(provided.as_bytes());
    let b = Sha3_256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Accepts the admin password (`password`) or the scripting secret (`apiSecret`).
pub struct SharedSecretAuthenticator {
    admin_password: Option<String>,
    api_secret: Option<String>,
}

impl SharedSecretAuthenticator {
    pub fn new(admin_password: Option<String>, api_secret: Option<String>) -> Self {
        Self {
            admin_password,
            api_secret,
        }
    }

    fn check(provided: Option<&str>, expected: Option<&str>) -> Option<bool> {
        match (provided, expected) {
            (Some(p), Some(e)) => Some(constant_time_eq(p, e)),
            _ => None,
        }
    }
}

#[async_trait]
impl Authenticator for SharedSecretAuthenticator {
    async fn authorize(&self, credentials: &Credentials) -> Result<Authorization, ApiError> {
        if self.admin_password.is_none() && self.api_secret.is_none() {
            return Ok(Authorization::Denied(DenyReason::NoSecretConfigured));
        }

        let attempts = [
            (
                "password",
                Self::check(
                    credentials.password.as_deref(),
                    self.admin_password.as_deref(),
                ),
            ),
            (
                "apiSecret",
                Self::check(credentials.api_secret.as_deref(), self.api_secret.as_deref()),
            ),
        ];

        let mut tried = false;
        for (field, outcome) in attempts {
            match outcome {
                Some(true) => {
                    return Ok(Authorization::Granted(Identity {
                        subject: field.to_string(),
                        email: None,
                        scheme: self.scheme(),
                    }))
                }
                Some(false) => tried = true,
                None => {}
            }
        }

        Ok(Authorization::Denied(if tried {
            DenyReason::SecretMismatch
        } else {
            DenyReason::MissingCredential
        }))
    }

    fn scheme(&self) -> &'static str {
        "shared-secret"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(password: Option<&str>, api_secret: Option<&str>) -> Credentials {
        Credentials {
            password: password.map(String::from),
            api_secret: api_secret.map(String::from),
            token: None,
        }
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("correct horse", "correct horse"));
        assert!(!constant_time_eq("correct horse", "correct horsf"));
        assert!(!constant_time_eq("short", "a much longer secret"));
        assert!(!constant_time_eq("", "x"));
    }

    #[tokio::test]
    async fn test_password_accepted() {
        let auth = SharedSecretAuthenticator::new(Some("pw".into()), Some("api".into()));
        let outcome = auth.authorize(&creds(Some("pw"), None)).await.unwrap();
        assert!(matches!(
            outcome,
            Authorization::Granted(Identity { ref subject, .. }) if subject == "password"
        ));
    }

    #[tokio::test]
    async fn test_api_secret_accepted_after_wrong_password() {
        let auth = SharedSecretAuthenticator::new(Some("pw".into()), Some("api".into()));
        let outcome = auth
            .authorize(&creds(Some("nope"), Some("api")))
            .await
            .unwrap();
        assert!(matches!(outcome, Authorization::Granted(_)));
    }

    #[tokio::test]
    async fn test_wrong_secret_denied() {
        let auth = SharedSecretAuthenticator::new(Some("pw".into()), None);
        let outcome = auth.authorize(&creds(Some("PW"), None)).await.unwrap();
        assert_eq!(outcome, Authorization::Denied(DenyReason::SecretMismatch));
    }

    #[tokio::test]
    async fn test_api_secret_ignored_when_not_configured() {
        let auth = SharedSecretAuthenticator::new(Some("pw".into()), None);
        let outcome = auth.authorize(&creds(None, Some("pw"))).await.unwrap();
        assert_eq!(outcome, Authorization::Denied(DenyReason::MissingCredential));
    }

    #[tokio::test]
    async fn test_nothing_configured_denies_everything() {
        let auth = SharedSecretAuthenticator::new(None, None);
        let outcome = auth.authorize(&creds(Some(""), Some(""))).await.unwrap();
        assert_eq!(outcome, Authorization::Denied(DenyReason::NoSecretConfigured));
    }
}
