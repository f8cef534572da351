//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use panorama_core::{
    Catalog, FilesystemStore, HttpManifestFallback, MemoryStore, ObjectStore, StoreResult,
};

use crate::auth::{build_authenticator, Authenticator};
use crate::config::{Config, StorageBackend};
use crate::rate_limit::FixedWindowLimiter;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Photo catalog over the configured object store
    pub catalog: Catalog,
    /// Credential check for POST requests
    pub authenticator: Arc<dyn Authenticator>,
    /// Per-IP limiter for the image proxy
    pub image_limiter: Arc<FixedWindowLimiter>,
    /// Loaded configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Build state from configuration, opening the configured store.
    pub async fn from_config(config: &Config) -> StoreResult<Self> {
        let store: Arc<dyn ObjectStore> = match &config.storage {
            StorageBackend::Filesystem(root) => open_filesystem(root).await?,
            StorageBackend::Memory => {
                tracing::warn!("Storage: in-memory backend, photos are lost on restart");
                Arc::new(MemoryStore::new())
            }
        };
        Ok(Self::with_store(config, store))
    }

    /// Build state over an existing store.
    pub fn with_store(config: &Config, store: Arc<dyn ObjectStore>) -> Self {
        let mut catalog = Catalog::new(store).with_manifest_key(config.manifest_key.clone());
        if let Some(url) = &config.static_manifest_url {
            tracing::info!(url = %url, "Static manifest fallback enabled");
            catalog = catalog.with_fallback(Arc::new(HttpManifestFallback::new(url.clone())));
        }

        Self::with_catalog(config, catalog, build_authenticator(config))
    }

    /// Build state from explicit parts.
    pub fn with_catalog(
        config: &Config,
        catalog: Catalog,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            catalog,
            authenticator,
            image_limiter: Arc::new(FixedWindowLimiter::new(
                config.image_rate_limit,
                Duration::from_secs(config.image_rate_window_secs),
            )),
            config: Arc::new(config.clone()),
        }
    }

    /// Canonical public URL of an object key.
    pub fn public_url(&self, key: &str) -> String {
        panorama_core::public_url(&self.config.public_url, key)
    }
}

async fn open_filesystem(root: &Path) -> StoreResult<Arc<dyn ObjectStore>> {
    let store = FilesystemStore::new(root).await?;
    tracing::info!(root = %root.display(), "Storage: filesystem backend");
    Ok(Arc::new(store))
}
