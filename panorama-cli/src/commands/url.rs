//! Url command implementation.
//!
//! Prints the canonical public URL of a photo, the string a gallery QR code
//! encodes. Works offline.

use anyhow::Result;
use panorama_core::{public_url, PhotoId, Variant};

use crate::exit_codes::UsageError;

/// Canonical URL of one variant of a photo.
pub fn photo_url(base: &str, id: PhotoId, variant: Variant) -> String {
    public_url(base, &id.key(variant))
}

/// Execute the url command.
pub fn execute(base: &str, id: PhotoId, file: Option<&str>) -> Result<()> {
    let variant = match file {
        None => Variant::Primary,
        Some(name) => Variant::from_file_name(name).ok_or_else(|| {
            UsageError(format!(
                "Unknown file '{}' (expected 1.jpg, mobile.webp or desktop.webp)",
                name
            ))
        })?,
    };
    println!("{}", photo_url(base, id, variant));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_url() {
        let id = PhotoId::new(42).unwrap();
        assert_eq!(
            photo_url("https://photos.example.com/", id, Variant::Primary),
            "https://photos.example.com/42/picture/1.jpg"
        );
        assert_eq!(
            photo_url("https://photos.example.com", id, Variant::Mobile),
            "https://photos.example.com/42/picture/mobile.webp"
        );
    }
}
