//! HTTP client for the gallery handler.
//!
//! Mirrors the browser admin page: every mutation is a multipart POST to
//! the handler root carrying the credential, the action and the photo ID.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use panorama_core::{PhotoId, Variant};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use crate::exit_codes;

const USER_AGENT: &str = concat!("panorama-cli/", env!("CARGO_PKG_VERSION"));

/// Credential sent with admin requests.
#[derive(Clone)]
pub enum Credential {
    Password(String),
    Token(String),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password(_) => f.write_str("Password(***)"),
            Self::Token(_) => f.write_str("Token(***)"),
        }
    }
}

/// One file of an upload, already encoded.
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub variant: Variant,
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Error body returned by the handler.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    code: Option<String>,
}

/// Request refused by the handler.
#[derive(Debug)]
pub struct Rejected {
    pub status: u16,
    pub code: Option<String>,
    pub message: String,
}

impl Rejected {
    pub fn exit_code(&self) -> i32 {
        match self.status {
            401 | 403 => exit_codes::AUTH_ERROR,
            400..=499 => exit_codes::DATA_ERROR,
            _ => exit_codes::NETWORK_ERROR,
        }
    }
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "handler returned {} ({}): {}", self.status, code, self.message),
            None => write!(f, "handler returned {}: {}", self.status, self.message),
        }
    }
}

impl std::error::Error for Rejected {}

#[derive(Debug, Deserialize)]
pub struct VariantUrls {
    pub primary: String,
    pub mobile: Option<String>,
    pub desktop: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadReply {
    pub message: String,
    pub urls: VariantUrls,
    pub added: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReply {
    pub message: String,
    pub removed: Vec<String>,
    pub was_listed: bool,
}

#[derive(Debug, Deserialize)]
pub struct ScanEntry {
    pub id: u64,
    pub file: String,
}

#[derive(Debug, Deserialize)]
pub struct ListReply {
    pub photos: Vec<u64>,
    pub source: String,
    pub origin: Option<String>,
    pub entries: Option<Vec<ScanEntry>>,
}

/// Client for one handler endpoint.
pub struct AdminClient {
    http: reqwest::Client,
    endpoint: String,
    credential: Option<Credential>,
}

impl AdminClient {
    pub fn new(endpoint: &str, credential: Option<Credential>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            credential,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn admin_form(&self, action: &str, id: PhotoId) -> Form {
        let mut form = Form::new()
            .text("action", action.to_string())
            .text("sceneId", id.to_string());
        if let Some(Credential::Password(password)) = &self.credential {
            form = form.text("password", password.clone());
        }
        form
    }

    async fn post(&self, form: Form) -> Result<reqwest::Response> {
        let mut request = self.http.post(format!("{}/", self.endpoint)).multipart(form);
        if let Some(Credential::Token(token)) = &self.credential {
            request = request.bearer_auth(token);
        }
        request
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.endpoint))
    }

    /// Upload a photo and its previews.
    pub async fn upload(&self, id: PhotoId, parts: Vec<UploadPart>) -> Result<UploadReply> {
        let mut form = self.admin_form("upload", id);
        for part in parts {
            let field = field_name(part.variant);
            debug!(field, bytes = part.data.len(), content_type = %part.content_type, "Attaching file");
            let file = Part::bytes(part.data)
                .file_name(part.variant.file_name())
                .mime_str(&part.content_type)
                .with_context(|| format!("Invalid content type '{}'", part.content_type))?;
            form = form.part(field, file);
        }
        read_json(self.post(form).await?).await
    }

    /// Delete a photo and drop it from the manifest.
    pub async fn delete(&self, id: PhotoId) -> Result<DeleteReply> {
        read_json(self.post(self.admin_form("delete", id)).await?).await
    }

    /// List photo IDs from the manifest or a store scan.
    pub async fn list(&self, scan: bool, only: Option<PhotoId>) -> Result<ListReply> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if scan {
            query.push(("source", "scan".to_string()));
        }
        if let Some(id) = only {
            query.push(("id", id.to_string()));
        }
        let response = self
            .http
            .get(format!("{}/", self.endpoint))
            .query(&query)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.endpoint))?;
        read_json(response).await
    }
}

/// Form field carrying a variant.
pub fn field_name(variant: Variant) -> &'static str {
    match variant {
        Variant::Primary => "file",
        Variant::Mobile => "mobile",
        Variant::Desktop => "desktop",
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .context("Failed to read handler response")?;
    debug!(status = status.as_u16(), bytes = body.len(), "Handler responded");

    if !status.is_success() {
        let rejected = match serde_json::from_slice::<ErrorBody>(&body) {
            Ok(err) => Rejected {
                status: status.as_u16(),
                code: err.code,
                message: err.error,
            },
            Err(_) => Rejected {
                status: status.as_u16(),
                code: None,
                message: String::from_utf8_lossy(&body).trim().to_string(),
            },
        };
        return Err(rejected.into());
    }

    serde_json::from_slice(&body).context("Unexpected response from handler")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_match_handler() {
        assert_eq!(field_name(Variant::Primary), "file");
        assert_eq!(field_name(Variant::Mobile), "mobile");
        assert_eq!(field_name(Variant::Desktop), "desktop");
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let debug = format!("{:?}", Credential::Password("hunter2".into()));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_rejected_display() {
        let rejected = Rejected {
            status: 401,
            code: Some("UNAUTHORIZED".into()),
            message: "Unauthorized".into(),
        };
        assert_eq!(
            rejected.to_string(),
            "handler returned 401 (UNAUTHORIZED): Unauthorized"
        );
    }

    #[test]
    fn test_endpoint_trailing_slash_is_trimmed() {
        let client =
            AdminClient::new("http://localhost:8787/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8787");
    }
}
