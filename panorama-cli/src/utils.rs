//! Common utility functions shared across CLI commands.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use panorama_core::{PhotoId, Variant};
use tracing::debug;

use crate::client::UploadPart;

/// Input file whose extension is not a supported image type.
#[derive(Debug)]
pub struct NotAnImage(pub PathBuf);

impl fmt::Display for NotAnImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} is not an image (expected .jpg, .png, .webp or .gif)",
            self.0.display()
        )
    }
}

impl std::error::Error for NotAnImage {}

/// Image whose format does not match the file name it would be stored under.
#[derive(Debug)]
pub struct WrongFormat {
    pub path: PathBuf,
    pub found: &'static str,
    pub variant: Variant,
}

impl fmt::Display for WrongFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} is {} but {} must be {} (pass --resize to convert)",
            self.path.display(),
            self.found,
            self.variant.file_name(),
            self.variant.content_type()
        )
    }
}

impl std::error::Error for WrongFormat {}

/// Parse a photo ID argument.
pub fn parse_id(raw: &str) -> Result<PhotoId> {
    raw.parse::<PhotoId>()
        .with_context(|| format!("Invalid photo ID '{}'", raw))
}

/// Content type implied by a file extension, or `None` for non-images.
pub fn image_content_type(path: &Path) -> Option<&'static str> {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
        .as_deref()
    {
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("png") => Some("image/png"),
        Some("webp") => Some("image/webp"),
        Some("gif") => Some("image/gif"),
        _ => None,
    }
}

/// Read an image file as-is.
///
/// The file is sent unchanged, so its format has to match the variant's
/// stored name: JPEG for `1.jpg`, WebP for the previews.
pub fn read_image(path: &Path, variant: Variant) -> Result<UploadPart> {
    let Some(content_type) = image_content_type(path) else {
        return Err(NotAnImage(path.to_path_buf()).into());
    };
    if content_type != variant.content_type() {
        return Err(WrongFormat {
            path: path.to_path_buf(),
            found: content_type,
            variant,
        }
        .into());
    }
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    debug!(path = %path.display(), bytes = data.len(), ?variant, "Read file");

    Ok(UploadPart {
        variant,
        data,
        content_type: content_type.to_string(),
    })
}

/// Decode a source image and render every gallery variant from it.
#[cfg(feature = "resize")]
pub fn render_variants(path: &Path) -> Result<Vec<UploadPart>> {
    let source = std::fs::read(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let rendered = panorama_core::render_all(&source)
        .with_context(|| format!("Failed to render variants of {}", path.display()))?;

    Ok(rendered
        .into_iter()
        .map(|r| {
            debug!(variant = ?r.variant, width = r.width, height = r.height, bytes = r.data.len(), "Rendered variant");
            UploadPart {
                variant: r.variant,
                content_type: r.content_type().to_string(),
                data: r.data,
            }
        })
        .collect())
}

/// Human-readable byte count.
pub fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_content_type() {
        assert_eq!(image_content_type(Path::new("a.JPG")), Some("image/jpeg"));
        assert_eq!(image_content_type(Path::new("a.jpeg")), Some("image/jpeg"));
        assert_eq!(image_content_type(Path::new("a.webp")), Some("image/webp"));
        assert_eq!(image_content_type(Path::new("notes.txt")), None);
        assert_eq!(image_content_type(Path::new("noext")), None);
    }

    #[test]
    fn test_read_image_rejects_non_images() {
        let err = read_image(&PathBuf::from("report.pdf"), Variant::Primary).unwrap_err();
        assert!(err.to_string().contains("is not an image"));
    }

    #[test]
    fn test_read_image_requires_matching_format() {
        let err = read_image(Path::new("pano.png"), Variant::Primary).unwrap_err();
        let wrong = err.downcast_ref::<WrongFormat>().unwrap();
        assert_eq!(wrong.found, "image/png");
        assert_eq!(
            err.to_string(),
            "pano.png is image/png but 1.jpg must be image/jpeg (pass --resize to convert)"
        );

        let err = read_image(Path::new("small.jpg"), Variant::Mobile).unwrap_err();
        assert!(err.to_string().contains("mobile.webp must be image/webp"));
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("12").unwrap().get(), 12);
        assert!(parse_id("0").is_err());
        assert!(parse_id("x").is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
