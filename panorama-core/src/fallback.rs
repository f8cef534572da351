//! Static manifest fallback.
//!
//! When the store holds no manifest (or an empty one) the catalog falls back
//! to a separately hosted static manifest, typically the one shipped with
//! the public gallery site.

use async_trait::async_trait;

use crate::error::Result;
use crate::manifest::Manifest;

/// A read-only source of the static manifest.
#[async_trait]
pub trait ManifestFallback: Send + Sync {
    /// Fetch the static manifest. `Ok(None)` means "nothing published".
    async fn fetch(&self) -> Result<Option<Manifest>>;
}

/// A fixed manifest held in memory.
#[derive(Debug, Clone, Default)]
pub struct FixedManifest(pub Manifest);

#[async_trait]
impl ManifestFallback for FixedManifest {
    async fn fetch(&self) -> Result<Option<Manifest>> {
        Ok(Some(self.0.clone()))
    }
}

#[cfg(feature = "network")]
pub use http::HttpManifestFallback;

#[cfg(feature = "network")]
mod http {
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use tracing::{debug, warn};

    use super::ManifestFallback;
    use crate::error::{CatalogError, Result};
    use crate::manifest::Manifest;

    /// Fetches the static manifest over HTTP(S). A single GET, no retries.
    #[derive(Debug, Clone)]
    pub struct HttpManifestFallback {
        client: reqwest::Client,
        url: String,
    }

    impl HttpManifestFallback {
        pub fn new(url: impl Into<String>) -> Self {
            Self::with_client(reqwest::Client::new(), url)
        }

        pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
            Self {
                client,
                url: url.into(),
            }
        }
    }

    #[async_trait]
    impl ManifestFallback for HttpManifestFallback {
        async fn fetch(&self) -> Result<Option<Manifest>> {
            let response = self
                .client
                .get(&self.url)
                .send()
                .await
                .map_err(|e| CatalogError::Fallback(e.to_string()))?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                debug!(url = %self.url, "Static manifest not published");
                return Ok(None);
            }
            if !status.is_success() {
                warn!(url = %self.url, status = %status, "Static manifest request failed");
                return Err(CatalogError::Fallback(format!(
                    "{} returned {}",
                    self.url, status
                )));
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| CatalogError::Fallback(e.to_string()))?;
            Ok(Some(Manifest::from_json(&body)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PhotoId;

    #[tokio::test]
    async fn test_fixed_manifest_returns_copy() {
        let manifest = Manifest::from_ids([PhotoId::new(3).unwrap()]);
        let fallback = FixedManifest(manifest.clone());
        assert_eq!(fallback.fetch().await.unwrap(), Some(manifest));
    }
}
