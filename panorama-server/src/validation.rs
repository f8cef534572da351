//! Request validation module
//!
//! Field-level checks for admin requests: photo IDs, file types and sizes.

use panorama_core::{InvalidPhotoId, PhotoId};

use crate::error::ApiError;

/// Allowed MIME type categories for image uploads
const ALLOWED_MIME_PREFIXES: &[&str] = &["image/", "application/octet-stream"];

/// Parse a photo ID from the named field
pub fn parse_photo_id(field: &str, raw: Option<&str>) -> Result<PhotoId, ApiError> {
    raw.unwrap_or("")
        .parse::<PhotoId>()
        .map_err(|e| match e {
            InvalidPhotoId::Missing => ApiError::bad_request(format!("'{}' is required", field)),
            InvalidPhotoId::NotNumeric(_) => {
                ApiError::bad_request(format!("'{}' must be a number", field))
            }
            InvalidPhotoId::NotPositive => {
                ApiError::bad_request(format!("'{}' must be a positive number", field))
            }
        })
}

/// Validates the Content-Type of an uploaded file
///
/// Accepts image/* and application/octet-stream. A missing Content-Type is
/// treated as binary.
pub fn validate_content_type(field: &str, content_type: Option<&str>) -> Result<(), ApiError> {
    match content_type {
        Some(ct) => {
            let ct_lower = ct.to_lowercase();
            if ALLOWED_MIME_PREFIXES
                .iter()
                .any(|prefix| ct_lower.starts_with(prefix))
            {
                Ok(())
            } else {
                Err(ApiError::bad_request(format!(
                    "Unsupported Content-Type for '{}': '{}'. Allowed types: image/*, application/octet-stream",
                    field, ct
                )))
            }
        }
        None => Ok(()),
    }
}

/// Validates the size of an uploaded file
pub fn validate_file_size(field: &str, size: usize, max_size: usize) -> Result<(), ApiError> {
    if size > max_size {
        let max_mb = max_size / (1024 * 1024);
        let actual_mb = size / (1024 * 1024);
        Err(ApiError::bad_request(format!(
            "'{}' too large: {} MB exceeds maximum of {} MB",
            field, actual_mb, max_mb
        )))
    } else {
        Ok(())
    }
}
