//! Panorama Core - photo catalog for the VR panorama gallery
//!
//! This crate holds everything the admin handler and the admin client share:
//!
//! - [`PhotoId`] and [`Variant`], and the `{id}/picture/{file}` key layout
//! - the [`Manifest`] JSON index (always ascending, never duplicated)
//! - the [`ObjectStore`] trait with filesystem and in-memory backends
//! - the [`Catalog`] service: upload, delete, list, store scan and the
//!   best-effort manifest reconciliation that ties them together
//! - client-side variant rendering (feature `resize`)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use panorama_core::{Catalog, ListSource, MemoryStore, PhotoId, UploadFile, UploadSet};
//!
//! # async fn example() -> panorama_core::Result<()> {
//! let catalog = Catalog::new(Arc::new(MemoryStore::new()));
//! let id: PhotoId = "7".parse().expect("valid ID");
//!
//! let jpeg = UploadFile::new(b"\xFF\xD8...".to_vec(), Some("image/jpeg".into()));
//! catalog.upload(id, UploadSet::primary_only(jpeg)).await?;
//!
//! let listing = catalog.list(ListSource::Manifest, None).await?;
//! assert!(listing.photos.contains(&id));
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod error;
pub mod fallback;
pub mod manifest;
pub mod photo;
pub mod store;
#[cfg(feature = "resize")]
pub mod variants;

pub use catalog::{
    Catalog, DeleteOutcome, ListSource, Listing, LoadedManifest, ManifestOrigin, ScanEntry,
    UploadFile, UploadOutcome, UploadSet,
};
pub use error::{CatalogError, InvalidPhotoId, Result, StoreError, StoreResult};
pub use fallback::{FixedManifest, ManifestFallback};
pub use manifest::{Manifest, DEFAULT_MANIFEST_KEY};
pub use photo::{parse_key, public_url, PhotoId, Variant};
pub use store::{FilesystemStore, MemoryStore, ObjectStore, StoredObject};

#[cfg(feature = "network")]
pub use fallback::HttpManifestFallback;

#[cfg(feature = "resize")]
pub use variants::{render_all, RenderedVariant, VariantError};
