//! End-to-end catalog tests against the filesystem backend.
//!
//! These tests exercise the manifest invariants (ascending, no duplicates)
//! across reopened stores, mixed operation orders and store/manifest drift.

use std::sync::Arc;

use panorama_core::{
    Catalog, FilesystemStore, ListSource, Manifest, ManifestOrigin, MemoryStore, ObjectStore,
    PhotoId, UploadFile, UploadSet, Variant,
};
use tempfile::TempDir;

const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0 test \xFF\xD9";

fn id(n: u64) -> PhotoId {
    PhotoId::new(n).unwrap()
}

fn jpeg() -> UploadSet {
    UploadSet::primary_only(UploadFile::new(JPEG, Some("image/jpeg".into())))
}

async fn fs_catalog(dir: &TempDir) -> Catalog {
    let store = FilesystemStore::new(dir.path()).await.unwrap();
    Catalog::new(Arc::new(store))
}

async fn manifest_ids(catalog: &Catalog) -> Vec<u64> {
    catalog
        .list(ListSource::Manifest, None)
        .await
        .unwrap()
        .photos
        .into_iter()
        .map(PhotoId::get)
        .collect()
}

// ============================================================================
// Ordering Invariants
// ============================================================================

#[tokio::test]
async fn test_any_insertion_order_yields_sorted_unique_ids() {
    let orders: [&[u64]; 4] = [
        &[1, 2, 3, 10, 20],
        &[20, 10, 3, 2, 1],
        &[10, 1, 20, 3, 2, 10, 1],
        &[3, 3, 3, 20, 1, 2, 10, 2],
    ];

    for order in orders {
        let catalog = Catalog::new(Arc::new(MemoryStore::new()));
        for n in order {
            catalog.upload(id(*n), jpeg()).await.unwrap();
        }
        assert_eq!(
            manifest_ids(&catalog).await,
            vec![1, 2, 3, 10, 20],
            "insertion order {:?}",
            order
        );
    }
}

#[tokio::test]
async fn test_numeric_not_lexicographic_order() {
    let catalog = Catalog::new(Arc::new(MemoryStore::new()));
    for n in [100, 9, 1000, 11] {
        catalog.upload(id(n), jpeg()).await.unwrap();
    }

    assert_eq!(manifest_ids(&catalog).await, vec![9, 11, 100, 1000]);
    let scanned: Vec<u64> = catalog
        .scan()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id.get())
        .collect();
    assert_eq!(scanned, vec![9, 11, 100, 1000]);
}

#[tokio::test]
async fn test_interleaved_uploads_and_deletes() {
    let catalog = Catalog::new(Arc::new(MemoryStore::new()));

    catalog.upload(id(5), jpeg()).await.unwrap();
    catalog.upload(id(2), jpeg()).await.unwrap();
    catalog.delete(id(5)).await.unwrap();
    catalog.upload(id(8), jpeg()).await.unwrap();
    catalog.delete(id(40)).await.unwrap();
    catalog.upload(id(5), jpeg()).await.unwrap();

    assert_eq!(manifest_ids(&catalog).await, vec![2, 5, 8]);
}

// ============================================================================
// Filesystem Persistence
// ============================================================================

#[tokio::test]
async fn test_manifest_survives_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let catalog = fs_catalog(&dir).await;
        catalog.upload(id(30), jpeg()).await.unwrap();
        catalog.upload(id(4), jpeg()).await.unwrap();
    }

    let catalog = fs_catalog(&dir).await;
    let loaded = catalog.load_manifest().await.unwrap();
    assert_eq!(loaded.origin, ManifestOrigin::Store);
    assert_eq!(loaded.manifest.ids(), vec![id(4), id(30)]);
    assert!(loaded.manifest.last_updated.is_some());

    let object = catalog
        .variant(id(30), Variant::Primary)
        .await
        .unwrap()
        .expect("primary persisted");
    assert_eq!(object.data.as_ref(), JPEG);
}

#[tokio::test]
async fn test_manifest_file_is_plain_json() {
    let dir = TempDir::new().unwrap();
    let catalog = fs_catalog(&dir).await;
    catalog.upload(id(12), jpeg()).await.unwrap();
    catalog.upload(id(3), jpeg()).await.unwrap();

    let raw = std::fs::read(dir.path().join("manifest.json")).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(json["photos"], serde_json::json!([3, 12]));
    assert!(json["lastUpdated"].is_string());

    // Round-trips through the typed manifest
    let manifest = Manifest::from_json(&raw).unwrap();
    assert_eq!(manifest.ids(), vec![id(3), id(12)]);
}

#[tokio::test]
async fn test_delete_removes_every_variant_on_disk() {
    let dir = TempDir::new().unwrap();
    let catalog = fs_catalog(&dir).await;
    let upload = UploadSet {
        primary: UploadFile::new(JPEG, None),
        mobile: Some(UploadFile::new(&b"RIFFmobile"[..], None)),
        desktop: Some(UploadFile::new(&b"RIFFdesktop"[..], None)),
    };
    catalog.upload(id(6), upload).await.unwrap();
    assert!(dir.path().join("6/picture/mobile.webp").exists());

    let outcome = catalog.delete(id(6)).await.unwrap();
    assert_eq!(outcome.removed.len(), 3);
    assert!(outcome.was_listed);
    assert!(!dir.path().join("6/picture/1.jpg").exists());
    assert!(!dir.path().join("6/picture/desktop.webp").exists());
}

// ============================================================================
// Store / Manifest Drift
// ============================================================================

#[tokio::test]
async fn test_scan_reports_blobs_missing_from_manifest() {
    let store = Arc::new(MemoryStore::new());
    let catalog = Catalog::new(store.clone());

    catalog.upload(id(1), jpeg()).await.unwrap();
    // Blob written outside the catalog, never registered
    store
        .put("77/picture/1.jpg", bytes::Bytes::from_static(JPEG), None)
        .await
        .unwrap();

    assert_eq!(manifest_ids(&catalog).await, vec![1]);

    let scan = catalog.list(ListSource::Scan, None).await.unwrap();
    assert_eq!(scan.photos, vec![id(1), id(77)]);
    assert!(scan.origin.is_none());
}

#[tokio::test]
async fn test_next_upload_repairs_lost_manifest() {
    let store = Arc::new(MemoryStore::new());
    let catalog = Catalog::new(store.clone());

    catalog.upload(id(2), jpeg()).await.unwrap();
    store.delete("manifest.json").await.unwrap();
    assert_eq!(
        catalog.load_manifest().await.unwrap().origin,
        ManifestOrigin::Empty
    );

    catalog.upload(id(2), jpeg()).await.unwrap();
    assert_eq!(manifest_ids(&catalog).await, vec![2]);
}

#[tokio::test]
async fn test_invalid_ids_never_reach_the_store() {
    for raw in ["", "0", "-3", "abc", "1e3", "7a", "4.5"] {
        assert!(raw.parse::<PhotoId>().is_err(), "{:?} should be rejected", raw);
    }
    assert_eq!("0042".parse::<PhotoId>().unwrap(), id(42));
}
