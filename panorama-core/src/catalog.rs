//! Photo catalog: uploads, deletes and manifest reconciliation.
//!
//! Blob writes and manifest writes are independent store calls. A request
//! that fails between them leaves the manifest out of step with the blobs,
//! and two concurrent writers race on the manifest read-modify-write (last
//! writer wins). Both are accepted; the next successful write for an ID
//! repairs its entry.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::fallback::ManifestFallback;
use crate::manifest::{Manifest, DEFAULT_MANIFEST_KEY};
use crate::photo::{parse_key, PhotoId, Variant};
use crate::store::{ObjectStore, StoredObject};

/// Where a loaded manifest came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestOrigin {
    /// The manifest object in the store.
    Store,
    /// The static fallback manifest.
    Static,
    /// Neither source had anything.
    Empty,
}

#[derive(Debug, Clone)]
pub struct LoadedManifest {
    pub manifest: Manifest,
    pub origin: ManifestOrigin,
}

/// One file of an upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub data: Bytes,
    pub content_type: Option<String>,
}

impl UploadFile {
    pub fn new(data: impl Into<Bytes>, content_type: Option<String>) -> Self {
        Self {
            data: data.into(),
            content_type,
        }
    }
}

/// The files written by a single upload request.
#[derive(Debug, Clone)]
pub struct UploadSet {
    pub primary: UploadFile,
    pub mobile: Option<UploadFile>,
    pub desktop: Option<UploadFile>,
}

impl UploadSet {
    pub fn primary_only(primary: UploadFile) -> Self {
        Self {
            primary,
            mobile: None,
            desktop: None,
        }
    }

    fn files(&self) -> impl Iterator<Item = (Variant, &UploadFile)> {
        [
            (Variant::Primary, Some(&self.primary)),
            (Variant::Mobile, self.mobile.as_ref()),
            (Variant::Desktop, self.desktop.as_ref()),
        ]
        .into_iter()
        .filter_map(|(variant, file)| file.map(|f| (variant, f)))
    }
}

#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub id: PhotoId,
    /// Variants written, with their keys, primary first.
    pub written: Vec<(Variant, String)>,
    /// Whether the ID was newly added to the manifest.
    pub added: bool,
}

#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub id: PhotoId,
    /// Keys that existed and were removed.
    pub removed: Vec<String>,
    /// Whether the ID was listed in the manifest before the delete.
    pub was_listed: bool,
}

/// Which index a listing is answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListSource {
    /// The manifest, with static fallback.
    #[default]
    Manifest,
    /// A live scan of the store's keys.
    Scan,
}

/// A photo discovered by a store scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanEntry {
    pub id: PhotoId,
    /// First file name listed under this ID.
    pub file: String,
}

#[derive(Debug, Clone)]
pub struct Listing {
    /// IDs in ascending order.
    pub photos: Vec<PhotoId>,
    /// `None` for scan listings.
    pub origin: Option<ManifestOrigin>,
    /// Present for scan listings only.
    pub entries: Option<Vec<ScanEntry>>,
}

/// The photo catalog over an object store.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn ObjectStore>,
    manifest_key: String,
    fallback: Option<Arc<dyn ManifestFallback>>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("backend", &self.store.backend_name())
            .field("manifest_key", &self.manifest_key)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl Catalog {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            manifest_key: DEFAULT_MANIFEST_KEY.to_string(),
            fallback: None,
        }
    }

    pub fn with_manifest_key(mut self, key: impl Into<String>) -> Self {
        self.manifest_key = key.into();
        self
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn ManifestFallback>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Read the stored manifest, ignoring it when absent or unparseable.
    ///
    /// An empty manifest only counts when it carries `lastUpdated`: every
    /// rewrite stamps it, so an empty stamped manifest is the result of
    /// deleting the last photo. A bare `{"photos":[]}` is a placeholder.
    async fn stored_manifest(&self) -> Result<Option<Manifest>> {
        let Some(object) = self.store.get(&self.manifest_key).await? else {
            return Ok(None);
        };
        match Manifest::from_json(&object.data) {
            Ok(manifest) if !manifest.is_empty() || manifest.last_updated.is_some() => {
                Ok(Some(manifest))
            }
            Ok(_) => Ok(None),
            Err(e) => {
                warn!(key = %self.manifest_key, error = %e, "Stored manifest is corrupt, ignoring");
                Ok(None)
            }
        }
    }

    /// Load the authoritative manifest.
    ///
    /// The stored manifest wins when present and non-empty or stamped;
    /// otherwise the static fallback is consulted; otherwise the manifest
    /// is empty.
    pub async fn load_manifest(&self) -> Result<LoadedManifest> {
        if let Some(manifest) = self.stored_manifest().await? {
            return Ok(LoadedManifest {
                manifest,
                origin: ManifestOrigin::Store,
            });
        }

        if let Some(fallback) = &self.fallback {
            if let Some(manifest) = fallback.fetch().await? {
                debug!(photos = manifest.photos.len(), "Using static manifest");
                return Ok(LoadedManifest {
                    manifest,
                    origin: ManifestOrigin::Static,
                });
            }
        }

        Ok(LoadedManifest {
            manifest: Manifest::new(),
            origin: ManifestOrigin::Empty,
        })
    }

    async fn write_manifest(&self, manifest: &mut Manifest) -> Result<()> {
        manifest.touch();
        let json = manifest.to_json()?;
        self.store
            .put(&self.manifest_key, Bytes::from(json), Some("application/json"))
            .await?;
        Ok(())
    }

    /// Add an ID to the manifest and rewrite it.
    pub async fn register(&self, id: PhotoId) -> Result<bool> {
        let mut manifest = self.load_manifest().await?.manifest;
        let added = manifest.insert(id);
        self.write_manifest(&mut manifest).await?;
        Ok(added)
    }

    /// Remove an ID from the manifest and rewrite it.
    pub async fn unregister(&self, id: PhotoId) -> Result<bool> {
        let mut manifest = self.load_manifest().await?.manifest;
        let removed = manifest.remove(id);
        self.write_manifest(&mut manifest).await?;
        Ok(removed)
    }

    /// Write every file of the upload, then record the ID in the manifest.
    ///
    /// The first failing write aborts the request; files written before it
    /// stay in place and the manifest is left untouched.
    pub async fn upload(&self, id: PhotoId, upload: UploadSet) -> Result<UploadOutcome> {
        let mut written = Vec::new();
        for (variant, file) in upload.files() {
            let key = id.key(variant);
            let content_type = file
                .content_type
                .as_deref()
                .unwrap_or(variant.content_type());
            self.store
                .put(&key, file.data.clone(), Some(content_type))
                .await?;
            debug!(photo_id = %id, key = %key, bytes = file.data.len(), "Stored variant");
            written.push((variant, key));
        }

        let added = self.register(id).await?;
        info!(photo_id = %id, variants = written.len(), added, "Photo uploaded");

        Ok(UploadOutcome { id, written, added })
    }

    /// Remove every variant of a photo, then drop the ID from the manifest.
    ///
    /// Missing keys are not an error, so deleting an unknown ID succeeds.
    pub async fn delete(&self, id: PhotoId) -> Result<DeleteOutcome> {
        let mut removed = Vec::new();
        for key in id.all_keys() {
            if self.store.delete(&key).await? {
                removed.push(key);
            }
        }

        let was_listed = self.unregister(id).await?;
        info!(photo_id = %id, removed = removed.len(), was_listed, "Photo deleted");

        Ok(DeleteOutcome {
            id,
            removed,
            was_listed,
        })
    }

    /// Scan the store, grouping keys by their leading numeric segment.
    pub async fn scan(&self) -> Result<Vec<ScanEntry>> {
        let keys = self.store.list("").await?;
        let mut by_id: BTreeMap<PhotoId, String> = BTreeMap::new();
        for key in &keys {
            if let Some((id, file)) = parse_key(key) {
                by_id.entry(id).or_insert_with(|| file.to_string());
            }
        }
        Ok(by_id
            .into_iter()
            .map(|(id, file)| ScanEntry { id, file })
            .collect())
    }

    /// List photo IDs from the chosen source, optionally narrowed to one ID.
    pub async fn list(&self, source: ListSource, only: Option<PhotoId>) -> Result<Listing> {
        let keep = |id: &PhotoId| only.map_or(true, |wanted| *id == wanted);

        match source {
            ListSource::Manifest => {
                let loaded = self.load_manifest().await?;
                Ok(Listing {
                    photos: loaded.manifest.ids().into_iter().filter(keep).collect(),
                    origin: Some(loaded.origin),
                    entries: None,
                })
            }
            ListSource::Scan => {
                let entries: Vec<ScanEntry> = self
                    .scan()
                    .await?
                    .into_iter()
                    .filter(|e| keep(&e.id))
                    .collect();
                Ok(Listing {
                    photos: entries.iter().map(|e| e.id).collect(),
                    origin: None,
                    entries: Some(entries),
                })
            }
        }
    }

    /// Fetch one stored variant.
    pub async fn variant(&self, id: PhotoId, variant: Variant) -> Result<Option<StoredObject>> {
        Ok(self.store.get(&id.key(variant)).await?)
    }
}
