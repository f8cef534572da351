//! Admin upload/delete handler
//!
//! Handles POST / requests. The order of checks is fixed: credential first,
//! then action and photo ID, then the files. A request with a bad
//! credential is refused before anything else about it is looked at, and
//! never reaches the store.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use panorama_core::{PhotoId, UploadFile, UploadSet, Variant};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{require_admin, Credentials};
use crate::error::ApiError;
use crate::multipart::{MultipartFields, FILE_FIELDS, PRIMARY_FIELD};
use crate::state::AppState;
use crate::validation::parse_photo_id;

/// Form fields that may carry the photo ID, in order of preference.
const ID_FIELDS: [&str; 2] = ["sceneId", "id"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Upload,
    Delete,
}

impl Action {
    fn from_field(raw: Option<&str>) -> Result<Self, ApiError> {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            None | Some("") | Some("upload") => Ok(Self::Upload),
            Some("delete") => Ok(Self::Delete),
            Some(other) => Err(ApiError::bad_request(format!(
                "'action' must be 'upload' or 'delete', got '{}'",
                other
            ))),
        }
    }
}

/// Public URLs of the variants written by an upload
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct VariantUrls {
    pub primary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desktop: Option<String>,
}

/// Response for a successful upload
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    #[schema(example = "Photo 7 uploaded")]
    pub message: String,
    #[schema(example = 7)]
    pub id: u64,
    /// Canonical public URL of the primary image
    #[schema(example = "https://photos.example.com/7/picture/1.jpg")]
    pub url: String,
    pub urls: VariantUrls,
    /// Object key of the primary image
    #[schema(example = "7/picture/1.jpg")]
    pub filename: String,
    /// Whether the ID was new to the manifest
    pub added: bool,
}

/// Response for a successful delete
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    #[schema(example = "Photo 7 deleted")]
    pub message: String,
    #[schema(example = 7)]
    pub id: u64,
    /// Object keys that existed and were removed
    pub removed: Vec<String>,
    /// Whether the ID was listed in the manifest before the delete
    pub was_listed: bool,
}

/// Upload or delete a photo
///
/// Accepts multipart/form-data with:
/// - **password**, **apiSecret** or **googleToken** (or an `Authorization: Bearer` header)
/// - **action** (optional): `upload` (default) or `delete`
/// - **sceneId** (alias **id**): positive integer photo ID
/// - **file** (upload): the primary JPEG
/// - **mobile**, **desktop** (optional): WebP previews
#[utoipa::path(
    post,
    path = "/",
    tag = "Admin",
    request_body(
        content_type = "multipart/form-data",
        description = "Credential, action, photo ID and image files"
    ),
    responses(
        (status = 200, description = "Photo uploaded (DeleteResponse for action=delete)", body = UploadResponse),
        (status = 400, description = "Missing or malformed ID, action or file"),
        (status = 401, description = "Missing or rejected credential"),
        (status = 500, description = "Store or identity provider failure")
    )
)]
pub async fn admin_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    // A broken form is reported only after the credential check
    let (fields, form_error) = match multipart {
        Ok(mut multipart) => match MultipartFields::parse(&mut multipart).await {
            Ok(fields) => (fields, None),
            Err(e) => (MultipartFields::default(), Some(e)),
        },
        Err(rejection) => (
            MultipartFields::default(),
            Some(ApiError::bad_request(rejection.body_text())),
        ),
    };

    let credentials = Credentials::from_request(&fields, &headers);
    let identity = require_admin(state.authenticator.as_ref(), &credentials).await?;

    if let Some(err) = form_error {
        return Err(err);
    }

    let action = Action::from_field(fields.get_text("action"))?;
    let id_field = ID_FIELDS
        .into_iter()
        .find(|name| fields.first_text(&[*name]).is_some())
        .unwrap_or(ID_FIELDS[0]);
    let id = parse_photo_id(id_field, fields.first_text(&[id_field]))?;

    tracing::info!(
        photo_id = %id,
        action = ?action,
        subject = %identity.subject,
        "Admin request"
    );

    match action {
        Action::Upload => upload(&state, id, &fields).await,
        Action::Delete => delete(&state, id).await,
    }
}

async fn upload(
    state: &AppState,
    id: PhotoId,
    fields: &MultipartFields,
) -> Result<Response, ApiError> {
    fields.validate_files(state.config.max_file_size())?;
    let primary = fields.require_file(PRIMARY_FIELD)?;

    let optional = |variant: Variant| {
        FILE_FIELDS
            .iter()
            .find(|(_, v)| *v == variant)
            .and_then(|(name, _)| fields.get_file(name))
            .map(UploadFile::from)
    };

    let set = UploadSet {
        primary: UploadFile::from(primary),
        mobile: optional(Variant::Mobile),
        desktop: optional(Variant::Desktop),
    };

    let outcome = state.catalog.upload(id, set).await?;

    let mut urls = VariantUrls::default();
    for (variant, key) in &outcome.written {
        let url = state.public_url(key);
        match variant {
            Variant::Primary => urls.primary = url,
            Variant::Mobile => urls.mobile = Some(url),
            Variant::Desktop => urls.desktop = Some(url),
        }
    }

    Ok(Json(UploadResponse {
        success: true,
        message: format!("Photo {} uploaded", id),
        id: id.get(),
        url: urls.primary.clone(),
        urls,
        filename: id.key(Variant::Primary),
        added: outcome.added,
    })
    .into_response())
}

async fn delete(state: &AppState, id: PhotoId) -> Result<Response, ApiError> {
    let outcome = state.catalog.delete(id).await?;

    Ok(Json(DeleteResponse {
        success: true,
        message: format!("Photo {} deleted", id),
        id: id.get(),
        removed: outcome.removed,
        was_listed: outcome.was_listed,
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parsing() {
        assert_eq!(Action::from_field(None).unwrap(), Action::Upload);
        assert_eq!(Action::from_field(Some(" ")).unwrap(), Action::Upload);
        assert_eq!(Action::from_field(Some("upload")).unwrap(), Action::Upload);
        assert_eq!(Action::from_field(Some("DELETE")).unwrap(), Action::Delete);
        assert!(Action::from_field(Some("rename")).is_err());
    }
}
