//! Local filesystem object store.
//!
//! Keys map directly onto paths below the root directory. Content types are
//! not persisted; readers fall back to the variant's canonical type.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{ObjectStore, StoredObject};
use crate::error::{StoreError, StoreResult};

/// Object store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    root: PathBuf,
}

impl FilesystemStore {
    /// Create the store, creating the root directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Resolve a key to a path, rejecting anything that could escape the root.
    fn key_path(&self, key: &str) -> StoreResult<PathBuf> {
        if key.is_empty() || key.starts_with('/') || key.starts_with('\\') {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        for component in Path::new(key).components() {
            if !matches!(component, Component::Normal(_)) {
                return Err(StoreError::InvalidKey(key.to_string()));
            }
        }
        Ok(self.root.join(key))
    }

    /// Remove directories left empty by a delete, stopping at the root.
    async fn prune_empty_dirs(&self, path: &Path) {
        let mut dir = path.parent();
        while let Some(current) = dir {
            if current == self.root || !current.starts_with(&self.root) {
                break;
            }
            // Fails on a non-empty directory, which ends the walk.
            if fs::remove_dir(current).await.is_err() {
                break;
            }
            dir = current.parent();
        }
    }

    fn key_from_path(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<_> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

async fn write_then_rename(temp_path: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(temp_path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(temp_path, path).await
}

fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().contains(".tmp."))
        .unwrap_or(false)
}

#[async_trait]
impl ObjectStore for FilesystemStore {
    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn get(&self, key: &str) -> StoreResult<Option<StoredObject>> {
        let path = self.key_path(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(StoredObject {
                data: Bytes::from(data),
                content_type: None,
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    #[instrument(skip(self, data, _content_type), fields(backend = "filesystem", size = data.len()))]
    async fn put(&self, key: &str, data: Bytes, _content_type: Option<&str>) -> StoreResult<()> {
        let path = self.key_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to a uniquely named sibling, then rename over the target.
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = path.with_file_name(format!("{}.tmp.{}", file_name, Uuid::new_v4()));
        if let Err(e) = write_then_rename(&temp_path, &path, &data).await {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %temp_path.display(), error = %cleanup, "Failed to remove temp file");
                }
            }
            return Err(StoreError::Io(e));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                self.prune_empty_dirs(&path).await;
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut stack = vec![self.root.clone()];

        while let Some(dir) = stack.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StoreError::Io(e)),
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                // file_type() does not follow symlinks; symlinks are skipped.
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    stack.push(path);
                } else if file_type.is_file() && !is_temp_file(&path) {
                    if let Some(key) = self.key_from_path(&path) {
                        if key.starts_with(prefix) {
                            keys.push(key);
                        }
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store() -> (TempDir, FilesystemStore) {
        let dir = TempDir::new().unwrap();
        let store = FilesystemStore::new(dir.path()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_roundtrip_and_missing_delete() {
        let (_dir, store) = store().await;

        store
            .put("7/picture/1.jpg", Bytes::from_static(b"abc"), Some("image/jpeg"))
            .await
            .unwrap();
        let object = store.get("7/picture/1.jpg").await.unwrap().unwrap();
        assert_eq!(object.data.as_ref(), b"abc");
        assert!(object.content_type.is_none());

        assert!(store.delete("7/picture/1.jpg").await.unwrap());
        assert!(!store.delete("7/picture/1.jpg").await.unwrap());
        assert!(store.get("7/picture/1.jpg").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_existing() {
        let (_dir, store) = store().await;
        store.put("manifest.json", Bytes::from_static(b"one"), None).await.unwrap();
        store.put("manifest.json", Bytes::from_static(b"two"), None).await.unwrap();

        let object = store.get("manifest.json").await.unwrap().unwrap();
        assert_eq!(object.data.as_ref(), b"two");
        assert_eq!(store.list("").await.unwrap(), vec!["manifest.json"]);
    }

    #[tokio::test]
    async fn test_list_walks_nested_keys() {
        let (_dir, store) = store().await;
        for key in ["3/picture/1.jpg", "3/picture/mobile.webp", "12/picture/1.jpg", "manifest.json"] {
            store.put(key, Bytes::new(), None).await.unwrap();
        }

        assert_eq!(
            store.list("").await.unwrap(),
            vec![
                "12/picture/1.jpg",
                "3/picture/1.jpg",
                "3/picture/mobile.webp",
                "manifest.json"
            ]
        );
        assert_eq!(store.list("3/").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_prunes_empty_directories() {
        let (dir, store) = store().await;
        store.put("4/picture/1.jpg", Bytes::from_static(b"a"), None).await.unwrap();
        store.put("4/picture/mobile.webp", Bytes::from_static(b"m"), None).await.unwrap();

        store.delete("4/picture/1.jpg").await.unwrap();
        assert!(dir.path().join("4/picture").is_dir());

        store.delete("4/picture/mobile.webp").await.unwrap();
        assert!(!dir.path().join("4").exists());
        assert!(dir.path().is_dir());
    }

    #[tokio::test]
    async fn test_failed_put_leaves_no_temp_file() {
        let (dir, store) = store().await;
        store.put("9/picture/1.jpg", Bytes::from_static(b"a"), None).await.unwrap();

        // "9/picture" is a directory, so renaming a file over it fails.
        let result = store.put("9/picture", Bytes::from_static(b"b"), None).await;
        assert!(matches!(result, Err(StoreError::Io(_))));

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("9"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(leftovers, vec!["picture"]);
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let (_dir, store) = store().await;
        for key in ["../escape", "/etc/passwd", "a/../../b", ""] {
            assert!(matches!(
                store.get(key).await,
                Err(StoreError::InvalidKey(_))
            ));
        }
    }
}
