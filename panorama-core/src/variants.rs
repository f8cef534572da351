//! Client-side variant generation.
//!
//! Produces the three renditions the gallery serves from one source image:
//! a JPEG primary for the VR viewer and two WebP previews. Images are only
//! ever scaled down, never up.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use thiserror::Error;

use crate::photo::Variant;

/// Longest edge of the mobile preview.
pub const MOBILE_MAX_EDGE: u32 = 2048;
/// Longest edge of the desktop preview.
pub const DESKTOP_MAX_EDGE: u32 = 4096;
/// Longest edge of the VR primary.
pub const PRIMARY_MAX_EDGE: u32 = 8192;
/// JPEG quality of the VR primary.
pub const PRIMARY_JPEG_QUALITY: u8 = 90;

#[derive(Error, Debug)]
pub enum VariantError {
    #[error("not a decodable image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode {variant:?} variant: {source}")]
    Encode {
        variant: Variant,
        #[source]
        source: image::ImageError,
    },
}

/// Encoded bytes of one rendition.
#[derive(Debug, Clone)]
pub struct RenderedVariant {
    pub variant: Variant,
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RenderedVariant {
    pub fn content_type(&self) -> &'static str {
        self.variant.content_type()
    }
}

/// Maximum long edge for a variant.
pub fn max_edge(variant: Variant) -> u32 {
    match variant {
        Variant::Primary => PRIMARY_MAX_EDGE,
        Variant::Mobile => MOBILE_MAX_EDGE,
        Variant::Desktop => DESKTOP_MAX_EDGE,
    }
}

fn fit_within(image: &DynamicImage, edge: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width.max(height) <= edge {
        image.clone()
    } else {
        image.resize(edge, edge, FilterType::Lanczos3)
    }
}

/// Render a single variant from an already decoded image.
pub fn render(image: &DynamicImage, variant: Variant) -> Result<RenderedVariant, VariantError> {
    let scaled = fit_within(image, max_edge(variant));
    let (width, height) = scaled.dimensions();
    let mut out = Cursor::new(Vec::new());

    let encoded = match variant {
        Variant::Primary => {
            let encoder = JpegEncoder::new_with_quality(&mut out, PRIMARY_JPEG_QUALITY);
            DynamicImage::ImageRgb8(scaled.to_rgb8()).write_with_encoder(encoder)
        }
        Variant::Mobile | Variant::Desktop => {
            DynamicImage::ImageRgba8(scaled.to_rgba8()).write_to(&mut out, ImageFormat::WebP)
        }
    };
    encoded.map_err(|source| VariantError::Encode { variant, source })?;

    Ok(RenderedVariant {
        variant,
        data: out.into_inner(),
        width,
        height,
    })
}

/// Decode `source` and render every variant, primary first.
pub fn render_all(source: &[u8]) -> Result<Vec<RenderedVariant>, VariantError> {
    let image = image::load_from_memory(source).map_err(VariantError::Decode)?;
    Variant::ALL
        .iter()
        .map(|variant| render(&image, *variant))
        .collect()
}
