// SPDX-License-Identifier: GPL-3.0-only

//! Still-image sources for the virtual camera

use crate::backends::camera::types::RawFrame;
use crate::errors::{CaptureResult, ErrorDescriptor};
use std::path::Path;
use tracing::info;

/// Load an image file as an RGBA frame
pub fn load_image_as_frame(path: &Path) -> CaptureResult<RawFrame> {
    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        ErrorDescriptor::unavailable(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    info!(width, height, "Image loaded successfully");

    Ok(RawFrame::new(width, height, rgba.into_raw()))
}

/// A uniformly coloured frame
pub fn solid_frame(width: u32, height: u32, rgba: [u8; 4]) -> RawFrame {
    let pixels = (width as usize) * (height as usize);
    let data: Vec<u8> = std::iter::repeat_n(rgba, pixels).flatten().collect();
    RawFrame::new(width, height, data)
}

/// A frame with a diagonal gradient, so every pixel differs from its neighbours
pub fn gradient_frame(width: u32, height: u32) -> RawFrame {
    let mut data = Vec::with_capacity((width as usize) * (height as usize) * 4);
    for y in 0..height {
        for x in 0..width {
            let r = ((x * 255) / width.max(1)) as u8;
            let g = ((y * 255) / height.max(1)) as u8;
            let b = (((x + y) * 255) / (width + height).max(1)) as u8;
            data.extend_from_slice(&[r, g, b, 255]);
        }
    }
    RawFrame::new(width, height, data)
}
