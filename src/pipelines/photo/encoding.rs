// SPDX-License-Identifier: GPL-3.0-only

//! Output encoding for annotated photos
//!
//! The annotated surface is always written as JPEG at a fixed quality. Alpha
//! is dropped, the same way a canvas flattens onto an opaque JPEG.

use crate::constants::JPEG_QUALITY;
use crate::errors::{CaptureResult, ErrorDescriptor};
use base64::Engine as _;
use base64::engine::general_purpose;
use image::{DynamicImage, RgbaImage};
use tracing::debug;

/// Encoded output image, owned by the caller once returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl AnnotatedImage {
    pub const MIME_TYPE: &'static str = "image/jpeg";

    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        "jpg"
    }

    /// `data:image/jpeg;base64,...`
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            Self::MIME_TYPE,
            general_purpose::STANDARD.encode(&self.data)
        )
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Encode an RGBA surface as JPEG
pub fn encode_jpeg(surface: &RgbaImage) -> CaptureResult<AnnotatedImage> {
    let (width, height) = surface.dimensions();
    let rgb = DynamicImage::ImageRgba8(surface.clone()).into_rgb8();

    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);

    encoder
        .encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| ErrorDescriptor::unknown(format!("JPEG encoding failed: {}", e)))?;

    debug!(size = buffer.len(), width, height, "Encoding complete");

    Ok(AnnotatedImage {
        data: buffer,
        width,
        height,
    })
}
