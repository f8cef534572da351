//! Google ID token claims and the admin policy applied to them.
//!
//! Both token schemes end up here: the introspection endpoint returns the
//! claims as JSON (with every value stringified), local verification decodes
//! them from the JWT payload. The policy checks issuer, audience, expiry,
//! email verification and finally the email allow-list.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer};

use super::{Authorization, DenyReason, Identity};

/// Issuers Google puts in its ID tokens.
pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Claims of a Google ID token that the admin policy looks at.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    #[serde(deserialize_with = "number_or_string")]
    pub exp: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "bool_or_string")]
    pub email_verified: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose<T> {
    Typed(T),
    Text(String),
}

// tokeninfo returns `"exp": "1700000000"` and `"email_verified": "true"`
fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Loose::<i64>::deserialize(deserializer)? {
        Loose::Typed(n) => Ok(n),
        Loose::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn bool_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Loose::<bool>::deserialize(deserializer)? {
        Loose::Typed(b) => Ok(b),
        Loose::Text(s) => Ok(s.eq_ignore_ascii_case("true")),
    }
}

/// Who may administer the gallery.
#[derive(Debug, Clone, Default)]
pub struct AdminPolicy {
    audience: Option<String>,
    allowed_emails: HashSet<String>,
}

impl AdminPolicy {
    pub fn new(audience: Option<String>, allowed_emails: impl IntoIterator<Item = String>) -> Self {
        Self {
            audience,
            allowed_emails: allowed_emails
                .into_iter()
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }

    pub fn allowed_emails(&self) -> &HashSet<String> {
        &self.allowed_emails
    }

    /// Apply the policy to verified claims, at time `now` (unix seconds).
    pub fn evaluate(&self, claims: &GoogleClaims, now: i64, scheme: &'static str) -> Authorization {
        match self.check(claims, now) {
            Ok(email) => Authorization::Granted(Identity {
                subject: claims.sub.clone(),
                email: Some(email),
                scheme,
            }),
            Err(reason) => Authorization::Denied(reason),
        }
    }

    fn check(&self, claims: &GoogleClaims, now: i64) -> Result<String, DenyReason> {
        if !GOOGLE_ISSUERS.contains(&claims.iss.as_str()) {
            return Err(DenyReason::WrongIssuer(claims.iss.clone()));
        }

        let audience = self
            .audience
            .as_deref()
            .ok_or(DenyReason::NoAudienceConfigured)?;
        if claims.aud != audience {
            return Err(DenyReason::WrongAudience(claims.aud.clone()));
        }

        if claims.exp <= now {
            return Err(DenyReason::Expired);
        }

        if !claims.email_verified {
            return Err(DenyReason::EmailNotVerified);
        }

        let email = claims
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .ok_or_else(|| DenyReason::InvalidToken("missing email claim".into()))?;

        if !self.allowed_emails.contains(&email) {
            return Err(DenyReason::EmailNotAllowed(email));
        }

        Ok(email)
    }
}
