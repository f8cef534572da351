//! Photo identifiers, variants and the object key layout.
//!
//! Every stored object lives under `{id}/picture/{file}`:
//!
//! | Variant   | File           | Produced by                  |
//! |-----------|----------------|------------------------------|
//! | Primary   | `1.jpg`        | the uploaded original        |
//! | Mobile    | `mobile.webp`  | optional resize (2048 px)    |
//! | Desktop   | `desktop.webp` | optional resize (4096 px)    |

use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InvalidPhotoId;

/// Path segment between the photo ID and the variant file name.
pub const PICTURE_DIR: &str = "picture";

/// Positive integer identifying a photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(NonZeroU64);

impl PhotoId {
    /// Create a photo ID, returning `None` for zero.
    pub fn new(value: u64) -> Option<Self> {
        NonZeroU64::new(value).map(Self)
    }

    /// Raw integer value.
    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// Object key for one variant of this photo.
    pub fn key(self, variant: Variant) -> String {
        format!("{}/{}/{}", self, PICTURE_DIR, variant.file_name())
    }

    /// Object keys for every known variant, primary first.
    pub fn all_keys(self) -> Vec<String> {
        Variant::ALL.iter().map(|v| self.key(*v)).collect()
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PhotoId {
    type Err = InvalidPhotoId;

    /// Parse a decimal, strictly positive ID.
    ///
    /// Signs, whitespace inside the digits, fractions and zero are all rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(InvalidPhotoId::Missing);
        }
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidPhotoId::NotNumeric(trimmed.to_string()));
        }
        let value: u64 = trimmed
            .parse()
            .map_err(|_| InvalidPhotoId::NotNumeric(trimmed.to_string()))?;
        PhotoId::new(value).ok_or(InvalidPhotoId::NotPositive)
    }
}

/// A stored rendition of a photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Primary,
    Mobile,
    Desktop,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Primary, Variant::Mobile, Variant::Desktop];

    pub fn file_name(self) -> &'static str {
        match self {
            Variant::Primary => "1.jpg",
            Variant::Mobile => "mobile.webp",
            Variant::Desktop => "desktop.webp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Variant::Primary => "image/jpeg",
            Variant::Mobile | Variant::Desktop => "image/webp",
        }
    }

    /// Look up a variant by its stored file name (`1.jpg`, `mobile.webp`, ...).
    pub fn from_file_name(name: &str) -> Option<Self> {
        Variant::ALL.into_iter().find(|v| v.file_name() == name)
    }
}

/// Split an object key into its leading photo ID and trailing file name.
///
/// Keys that do not start with a numeric segment (the manifest, stray
/// uploads) yield `None`.
pub fn parse_key(key: &str) -> Option<(PhotoId, &str)> {
    let (head, _) = key.split_once('/')?;
    let id = head.parse::<PhotoId>().ok()?;
    let file = key.rsplit('/').next()?;
    if file.is_empty() {
        return None;
    }
    Some((id, file))
}

/// Join a public base URL and an object key.
pub fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}
