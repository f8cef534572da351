use thiserror::Error;

/// Why a string could not be turned into a [`PhotoId`](crate::PhotoId).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidPhotoId {
    #[error("photo ID is required")]
    Missing,

    #[error("photo ID must be a number, got '{0}'")]
    NotNumeric(String),

    #[error("photo ID must be a positive integer")]
    NotPositive,
}

/// Object store failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Failures of catalog operations (upload, delete, list).
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("manifest is not valid JSON: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("static manifest unavailable: {0}")]
    Fallback(String),
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
