//! Photo listing handler
//!
//! Handles GET / from the manifest (default) or from a live store scan.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use panorama_core::{ListSource, ManifestOrigin};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::parse_photo_id;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Only report this photo ID
    pub id: Option<String>,
    /// `manifest` (default) or `scan`
    pub source: Option<String>,
}

impl ListQuery {
    fn list_source(&self) -> Result<ListSource, ApiError> {
        match self.source.as_deref().map(str::trim) {
            None | Some("") | Some("manifest") => Ok(ListSource::Manifest),
            Some("scan") => Ok(ListSource::Scan),
            Some(other) => Err(ApiError::bad_request(format!(
                "'source' must be 'manifest' or 'scan', got '{}'",
                other
            ))),
        }
    }
}

/// A photo found by scanning the store
#[derive(Debug, Serialize, ToSchema)]
pub struct ScanEntryResponse {
    #[schema(example = 7)]
    pub id: u64,
    /// First file stored under the ID
    #[schema(example = "1.jpg")]
    pub file: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub success: bool,
    /// Photo IDs, ascending
    #[schema(example = json!([3, 7, 42]))]
    pub photos: Vec<u64>,
    pub count: usize,
    /// Index the listing was answered from: `manifest` or `scan`
    #[schema(value_type = String, example = "manifest")]
    pub source: &'static str,
    /// For manifest listings: `store`, `static` or `empty`
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "store")]
    pub origin: Option<ManifestOrigin>,
    /// For scan listings: first file per photo
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<ScanEntryResponse>>,
}

/// List photo IDs
///
/// Reads the manifest, falling back to the static manifest when the stored
/// one is missing or empty. With `source=scan` the store keys are scanned
/// instead and grouped by their leading numeric segment.
#[utoipa::path(
    get,
    path = "/",
    tag = "Catalog",
    params(ListQuery),
    responses(
        (status = 200, description = "Photo IDs", body = ListResponse),
        (status = 400, description = "Malformed id or source"),
        (status = 500, description = "Store or static manifest failure")
    )
)]
pub async fn list_handler(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let source = query.list_source()?;
    let only = match query.id.as_deref() {
        Some(raw) => Some(parse_photo_id("id", Some(raw))?),
        None => None,
    };

    let listing = state.catalog.list(source, only).await?;

    Ok(Json(ListResponse {
        success: true,
        count: listing.photos.len(),
        photos: listing.photos.iter().map(|id| id.get()).collect(),
        source: match source {
            ListSource::Manifest => "manifest",
            ListSource::Scan => "scan",
        },
        origin: listing.origin,
        entries: listing.entries.map(|entries| {
            entries
                .into_iter()
                .map(|e| ScanEntryResponse {
                    id: e.id.get(),
                    file: e.file,
                })
                .collect()
        }),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(source: Option<&str>) -> ListQuery {
        ListQuery {
            id: None,
            source: source.map(String::from),
        }
    }

    #[test]
    fn test_list_source_parsing() {
        assert_eq!(query(None).list_source().unwrap(), ListSource::Manifest);
        assert_eq!(query(Some("")).list_source().unwrap(), ListSource::Manifest);
        assert_eq!(query(Some("scan")).list_source().unwrap(), ListSource::Scan);
        assert!(query(Some("bucket")).list_source().is_err());
    }
}
