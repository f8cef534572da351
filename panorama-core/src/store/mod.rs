//! Object store abstraction.
//!
//! The gallery keeps photo bytes and the manifest in a flat key/value blob
//! store. Backends implement [`ObjectStore`]; the catalog only ever talks to
//! the trait object.

mod filesystem;
mod memory;

pub use filesystem::FilesystemStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreResult;

/// An object read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Bytes,
    /// Content type recorded at write time, if the backend keeps one.
    pub content_type: Option<String>,
}

/// Key/value blob storage.
///
/// Implementations must be thread-safe (`Send + Sync`). No operation retries
/// internally; a failure is returned to the caller as-is.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Read an object. Returns `Ok(None)` when the key does not exist.
    async fn get(&self, key: &str) -> StoreResult<Option<StoredObject>>;

    /// Write (or replace) an object.
    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> StoreResult<()>;

    /// Delete an object. Returns `Ok(false)` when the key did not exist.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// List every key starting with `prefix`, in ascending order.
    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Human-readable backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}
