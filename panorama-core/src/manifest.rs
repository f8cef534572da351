//! The gallery manifest: the JSON index of known photo IDs.
//!
//! Stored as `{ "photos": [1, 2, 7], "lastUpdated": "2024-05-01" }`.
//! IDs are kept in a `BTreeSet`, so a manifest is always strictly ascending
//! and duplicate-free no matter what order IDs were added in or what the
//! stored document contained.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::photo::PhotoId;

/// Default object key of the manifest.
pub const DEFAULT_MANIFEST_KEY: &str = "manifest.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub photos: BTreeSet<PhotoId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<NaiveDate>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids(ids: impl IntoIterator<Item = PhotoId>) -> Self {
        Self {
            photos: ids.into_iter().collect(),
            last_updated: None,
        }
    }

    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Add an ID. Returns `false` if it was already listed.
    pub fn insert(&mut self, id: PhotoId) -> bool {
        self.photos.insert(id)
    }

    /// Remove an ID. Returns `false` if it was not listed.
    pub fn remove(&mut self, id: PhotoId) -> bool {
        self.photos.remove(&id)
    }

    /// Stamp the manifest with today's UTC date before it is rewritten.
    pub fn touch(&mut self) {
        self.last_updated = Some(Utc::now().date_naive());
    }

    /// IDs in ascending order.
    pub fn ids(&self) -> Vec<PhotoId> {
        self.photos.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> PhotoId {
        PhotoId::new(n).unwrap()
    }

    #[test]
    fn test_insert_keeps_ascending_and_unique() {
        let mut manifest = Manifest::new();
        for n in [9, 3, 7, 3, 1, 9] {
            manifest.insert(id(n));
        }
        assert_eq!(manifest.ids(), vec![id(1), id(3), id(7), id(9)]);
    }

    #[test]
    fn test_insert_and_remove_report_change() {
        let mut manifest = Manifest::from_ids([id(4)]);
        assert!(!manifest.insert(id(4)));
        assert!(manifest.insert(id(5)));
        assert!(manifest.remove(id(4)));
        assert!(!manifest.remove(id(4)));
        assert_eq!(manifest.ids(), vec![id(5)]);
    }

    #[test]
    fn test_json_shape() {
        let mut manifest = Manifest::from_ids([id(2), id(1)]);
        manifest.last_updated = NaiveDate::from_ymd_opt(2024, 5, 1);

        let value: serde_json::Value =
            serde_json::from_slice(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(value["photos"], serde_json::json!([1, 2]));
        assert_eq!(value["lastUpdated"], "2024-05-01");
    }

    #[test]
    fn test_unsorted_document_is_normalised() {
        let manifest = Manifest::from_json(br#"{"photos":[5,2,5,9,2]}"#).unwrap();
        assert_eq!(manifest.ids(), vec![id(2), id(5), id(9)]);
        assert!(manifest.last_updated.is_none());
    }

    #[test]
    fn test_missing_photos_field_is_empty() {
        let manifest = Manifest::from_json(br#"{"lastUpdated":"2023-12-31"}"#).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_zero_id_is_rejected() {
        assert!(Manifest::from_json(br#"{"photos":[0]}"#).is_err());
    }

    #[test]
    fn test_touch_sets_date() {
        let mut manifest = Manifest::new();
        manifest.touch();
        assert_eq!(manifest.last_updated, Some(Utc::now().date_naive()));
    }
}
