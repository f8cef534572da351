//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use panorama_core::DEFAULT_MANIFEST_KEY;

/// Google's token introspection endpoint.
pub const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Google's OAuth signing keys.
pub const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

/// Where photos and the manifest are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Local directory
    Filesystem(PathBuf),
    /// Process memory (lost on restart)
    Memory,
}

/// How admin requests are authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// `password` / `apiSecret` form field compared to a configured secret
    SharedSecret,
    /// Google ID token checked by the provider's tokeninfo endpoint
    TokenIntrospection,
    /// Google ID token verified locally against the provider's JWKS
    TokenLocal,
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shared-secret" | "password" => Ok(Self::SharedSecret),
            "token-introspection" | "introspection" => Ok(Self::TokenIntrospection),
            "token-local" | "jwt" => Ok(Self::TokenLocal),
            other => Err(format!("unknown AUTH_MODE '{}'", other)),
        }
    }
}

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 8787)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// CORS allow-list; a matching `Origin` is echoed back
    pub allowed_origins: Vec<String>,
    /// Origin sent when the request origin is not allow-listed
    pub default_origin: String,
    /// Request body limit in MB (default: 100)
    pub body_limit_mb: usize,
    /// Maximum size of each uploaded file in MB (default: 50)
    pub max_file_size_mb: usize,
    /// Request timeout in seconds (default: 60)
    pub timeout_secs: u64,
    /// Storage backend
    pub storage: StorageBackend,
    /// Public base URL of the bucket, used to build canonical photo URLs
    pub public_url: String,
    /// Object key of the manifest
    pub manifest_key: String,
    /// Static manifest consulted when the stored one is missing or empty
    pub static_manifest_url: Option<String>,
    /// Credential scheme for POST requests
    pub auth_mode: AuthMode,
    /// Admin password (shared-secret mode)
    pub admin_password: Option<String>,
    /// API secret for scripted clients (shared-secret mode)
    pub api_secret: Option<String>,
    /// OAuth client ID expected as token audience
    pub google_client_id: Option<String>,
    /// Emails allowed to administer the gallery (token modes)
    pub allowed_emails: Vec<String>,
    /// Token introspection endpoint
    pub tokeninfo_url: String,
    /// JWKS endpoint for local token verification
    pub jwks_url: String,
    /// Image proxy: requests allowed per window per client
    pub image_rate_limit: u32,
    /// Image proxy: window length in seconds
    pub image_rate_window_secs: u64,
    /// Trust `CF-Connecting-IP` / `X-Forwarded-For` for the client address
    pub trust_proxy_headers: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8787,
            host: [127, 0, 0, 1],
            allowed_origins: Vec::new(),
            default_origin: "*".to_string(),
            body_limit_mb: 100,
            max_file_size_mb: 50,
            timeout_secs: 60,
            storage: StorageBackend::Memory, // from_env() defaults to the filesystem
            public_url: "http://localhost:8787".to_string(),
            manifest_key: DEFAULT_MANIFEST_KEY.to_string(),
            static_manifest_url: None,
            auth_mode: AuthMode::SharedSecret,
            admin_password: None,
            api_secret: None,
            google_client_id: None,
            allowed_emails: Vec::new(),
            tokeninfo_url: GOOGLE_TOKENINFO_URL.to_string(),
            jwks_url: GOOGLE_JWKS_URL.to_string(),
            image_rate_limit: 60,
            image_rate_window_secs: 60,
            trust_proxy_headers: false,
        }
    }
}

fn env_list(name: &str) -> Vec<String> {
    std::env::var(name)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("HOST")
            .ok()
            .map(|h| {
                if h == "0.0.0.0" {
                    [0, 0, 0, 0]
                } else {
                    [127, 0, 0, 1]
                }
            })
            .unwrap_or(defaults.host);

        let allowed_origins = env_list("ALLOWED_ORIGINS");
        let default_origin = env_opt("DEFAULT_ORIGIN")
            .or_else(|| allowed_origins.first().cloned())
            .unwrap_or(defaults.default_origin);

        let storage = match std::env::var("STORAGE_BACKEND")
            .map(|v| v.to_lowercase())
            .as_deref()
        {
            Ok("memory") => StorageBackend::Memory,
            _ => StorageBackend::Filesystem(
                env_opt("STORAGE_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("./data")),
            ),
        };

        let auth_mode = match env_opt("AUTH_MODE") {
            Some(mode) => mode.parse().unwrap_or_else(|e: String| {
                tracing::warn!("{}, falling back to shared-secret", e);
                AuthMode::SharedSecret
            }),
            None => AuthMode::SharedSecret,
        };

        let allowed_emails = env_list("ALLOWED_EMAILS")
            .into_iter()
            .map(|e| e.to_lowercase())
            .collect();

        let trust_proxy_headers = std::env::var("TRUST_PROXY_HEADERS")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        Self {
            port: env_parse("PORT", defaults.port),
            host,
            allowed_origins,
            default_origin,
            body_limit_mb: env_parse("BODY_LIMIT_MB", defaults.body_limit_mb),
            max_file_size_mb: env_parse("MAX_FILE_SIZE_MB", defaults.max_file_size_mb),
            timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", defaults.timeout_secs),
            storage,
            public_url: env_opt("PUBLIC_URL").unwrap_or(defaults.public_url),
            manifest_key: env_opt("MANIFEST_KEY").unwrap_or(defaults.manifest_key),
            static_manifest_url: env_opt("STATIC_MANIFEST_URL"),
            auth_mode,
            admin_password: env_opt("ADMIN_PASSWORD"),
            api_secret: env_opt("API_SECRET"),
            google_client_id: env_opt("GOOGLE_CLIENT_ID"),
            allowed_emails,
            tokeninfo_url: env_opt("GOOGLE_TOKENINFO_URL").unwrap_or(defaults.tokeninfo_url),
            jwks_url: env_opt("GOOGLE_JWKS_URL").unwrap_or(defaults.jwks_url),
            image_rate_limit: env_parse("IMAGE_RATE_LIMIT", defaults.image_rate_limit),
            image_rate_window_secs: env_parse(
                "IMAGE_RATE_WINDOW_SECS",
                defaults.image_rate_window_secs,
            ),
            trust_proxy_headers,
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    /// Maximum size of a single uploaded file in bytes
    pub fn max_file_size(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        check_http_url("PUBLIC_URL", &self.public_url)?;
        if let Some(url) = &self.static_manifest_url {
            check_http_url("STATIC_MANIFEST_URL", url)?;
        }
        check_http_url("GOOGLE_TOKENINFO_URL", &self.tokeninfo_url)?;
        check_http_url("GOOGLE_JWKS_URL", &self.jwks_url)?;
        if self.image_rate_limit == 0 || self.image_rate_window_secs == 0 {
            return Err("IMAGE_RATE_LIMIT and IMAGE_RATE_WINDOW_SECS must be positive".into());
        }
        if self.max_file_size_mb > self.body_limit_mb {
            return Err(format!(
                "MAX_FILE_SIZE_MB ({}) exceeds BODY_LIMIT_MB ({})",
                self.max_file_size_mb, self.body_limit_mb
            ));
        }
        Ok(())
    }
}

fn check_http_url(name: &str, value: &str) -> Result<(), String> {
    let url = url::Url::parse(value).map_err(|e| format!("{} is not a valid URL: {}", name, e))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("{} must be http(s), got '{}'", name, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8787);
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.auth_mode, AuthMode::SharedSecret);
        assert_eq!(config.manifest_key, "manifest.json");
        assert_eq!(config.default_origin, "*");
    }

    #[test]
    fn test_auth_mode_parsing() {
        assert_eq!("shared-secret".parse::<AuthMode>(), Ok(AuthMode::SharedSecret));
        assert_eq!("Token-Local".parse::<AuthMode>(), Ok(AuthMode::TokenLocal));
        assert_eq!(
            "introspection".parse::<AuthMode>(),
            Ok(AuthMode::TokenIntrospection)
        );
        assert!("oauth".parse::<AuthMode>().is_err());
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let bad_url = Config {
            public_url: "not a url".into(),
            ..Config::default()
        };
        assert!(bad_url.validate().is_err());

        let bad_scheme = Config {
            static_manifest_url: Some("ftp://example.com/manifest.json".into()),
            ..Config::default()
        };
        assert!(bad_scheme.validate().is_err());

        let file_bigger_than_body = Config {
            max_file_size_mb: 200,
            ..Config::default()
        };
        assert!(file_bigger_than_body.validate().is_err());
    }

    #[test]
    fn test_max_file_size_in_bytes() {
        let config = Config {
            max_file_size_mb: 2,
            ..Config::default()
        };
        assert_eq!(config.max_file_size(), 2 * 1024 * 1024);
    }
}
