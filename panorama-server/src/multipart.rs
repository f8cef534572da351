//! Multipart form parsing helpers
//!
//! Admin requests arrive as multipart/form-data: a credential, an action,
//! a photo ID, and up to three image files (`file`, `mobile`, `desktop`).
//! Parsing only collects the parts; file validation runs separately so the
//! credential can be checked first.

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;
use panorama_core::{UploadFile, Variant};

use crate::error::ApiError;
use crate::validation::{validate_content_type, validate_file_size};

/// Form field carrying the primary image.
pub const PRIMARY_FIELD: &str = "file";

/// Form field names that carry files, and the variant each one becomes.
pub const FILE_FIELDS: [(&str, Variant); 3] = [
    (PRIMARY_FIELD, Variant::Primary),
    ("mobile", Variant::Mobile),
    ("desktop", Variant::Desktop),
];

/// Represents a file uploaded via multipart form
#[derive(Debug, Clone)]
pub struct FileField {
    pub data: Bytes,
    /// Content-Type from the multipart field (if provided)
    pub content_type: Option<String>,
    /// Original filename from the multipart field (if provided)
    pub file_name: Option<String>,
}

impl From<&FileField> for UploadFile {
    fn from(field: &FileField) -> Self {
        UploadFile::new(field.data.clone(), field.content_type.clone())
    }
}

/// Parsed multipart form fields
#[derive(Debug, Default)]
pub struct MultipartFields {
    /// File fields indexed by name
    files: HashMap<String, FileField>,
    /// Text fields indexed by name
    text_fields: HashMap<String, String>,
}

fn is_file_field(name: &str) -> bool {
    FILE_FIELDS.iter().any(|(field, _)| *field == name)
}

impl MultipartFields {
    /// Parse all fields from a multipart request
    ///
    /// Parts named like a file field, or sent with a filename, are kept as
    /// raw bytes; everything else is read as text. A repeated field keeps
    /// its last value.
    pub async fn parse(multipart: &mut Multipart) -> Result<Self, ApiError> {
        let mut fields = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to parse multipart: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();

            if is_file_field(&name) || field.file_name().is_some() {
                let content_type = field.content_type().map(|s| s.to_string());
                let file_name = field.file_name().map(|s| s.to_string());

                let data = field.bytes().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read file '{}': {}", name, e))
                })?;

                fields.files.insert(
                    name,
                    FileField {
                        data,
                        content_type,
                        file_name,
                    },
                );
            } else {
                let value = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read field '{}': {}", name, e))
                })?;
                fields.text_fields.insert(name, value);
            }
        }

        Ok(fields)
    }

    /// Build from text fields only
    pub fn from_text(text_fields: HashMap<String, String>) -> Self {
        Self {
            files: HashMap::new(),
            text_fields,
        }
    }

    /// Add or replace a file field
    pub fn with_file(mut self, name: &str, file: FileField) -> Self {
        self.files.insert(name.to_string(), file);
        self
    }

    /// Check Content-Type and size of every recognised file field
    pub fn validate_files(&self, max_file_size: usize) -> Result<(), ApiError> {
        for (name, _) in FILE_FIELDS {
            if let Some(file) = self.files.get(name) {
                validate_content_type(name, file.content_type.as_deref())?;
                validate_file_size(name, file.data.len(), max_file_size)?;
            }
        }
        Ok(())
    }

    /// Get a file field, failing with a field-level message when absent or empty
    pub fn require_file(&self, name: &str) -> Result<&FileField, ApiError> {
        match self.files.get(name) {
            Some(file) if !file.data.is_empty() => Ok(file),
            Some(_) => Err(ApiError::bad_request(format!("'{}' is empty", name))),
            None => Err(ApiError::bad_request(format!(
                "No file provided. Use '{}' field in multipart form.",
                name
            ))),
        }
    }

    /// Get a non-empty file field
    pub fn get_file(&self, name: &str) -> Option<&FileField> {
        self.files.get(name).filter(|f| !f.data.is_empty())
    }

    /// Get a text field value
    ///
    /// Returns `None` if the field is not present.
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.text_fields.get(name).map(|s| s.as_str())
    }

    /// First non-blank text value among `names`
    pub fn first_text(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .filter_map(|name| self.get_text(name))
            .map(str::trim)
            .find(|v| !v.is_empty())
    }
}
