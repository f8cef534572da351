//! Exit codes following sysexits.h conventions.
//!
//! These codes let scripts tell a rejected credential from an unreachable
//! handler or a bad input file.

use crate::client::Rejected;
use crate::utils::{NotAnImage, WrongFormat};

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid arguments, malformed photo ID).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data format error (not an image, wrong image format, request rejected).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: i32 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Handler unreachable or failing.
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const NETWORK_ERROR: i32 = 69;

/// Credential rejected.
/// Maps to EX_NOPERM from sysexits.h.
pub const AUTH_ERROR: i32 = 77;

/// Invalid combination of arguments detected after parsing.
#[derive(Debug)]
pub struct UsageError(pub String);

impl std::fmt::Display for UsageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for UsageError {}

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        // Classify by the first typed error found in the chain
        let code = err
            .chain()
            .find_map(|cause| {
                if let Some(rejected) = cause.downcast_ref::<Rejected>() {
                    Some(rejected.exit_code())
                } else if cause.is::<NotAnImage>() || cause.is::<WrongFormat>() {
                    Some(DATA_ERROR)
                } else if cause.is::<panorama_core::InvalidPhotoId>() || cause.is::<UsageError>() {
                    Some(USAGE_ERROR)
                } else if cause.is::<std::io::Error>() {
                    Some(INPUT_ERROR)
                } else if cause.is::<reqwest::Error>() {
                    Some(NETWORK_ERROR)
                } else {
                    classify_variant_error(cause)
                }
            })
            .unwrap_or(GENERAL_ERROR);

        Self {
            code,
            message: Some(message),
        }
    }
}

#[cfg(feature = "resize")]
fn classify_variant_error(cause: &(dyn std::error::Error + 'static)) -> Option<i32> {
    cause
        .is::<panorama_core::VariantError>()
        .then_some(DATA_ERROR)
}

#[cfg(not(feature = "resize"))]
fn classify_variant_error(_cause: &(dyn std::error::Error + 'static)) -> Option<i32> {
    None
}
