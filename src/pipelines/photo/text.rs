// SPDX-License-Identifier: GPL-3.0-only

//! Text rasterisation for the overlay

use crate::constants::FONT_SEARCH_PATHS;
use crate::errors::{CaptureResult, ErrorDescriptor};
use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::path::Path;
use tracing::{debug, info, warn};

/// Draws single lines of text onto an RGBA surface
pub trait TextRenderer: Send + Sync {
    /// Width and height of the pixels `draw` may touch, from its (x, y) origin
    fn measure(&self, text: &str, font_size: f32) -> (u32, u32);

    /// Height of a full line box at `font_size`, ascender to descender
    fn line_height(&self, font_size: f32) -> u32 {
        font_size.ceil() as u32
    }

    /// Draw `text` with the top-left corner of its line box at (`x`, `y`)
    fn draw(
        &self,
        surface: &mut RgbaImage,
        text: &str,
        x: i32,
        y: i32,
        font_size: f32,
        color: Rgba<u8>,
    );
}

/// TrueType/OpenType renderer backed by `ab_glyph`
#[derive(Clone)]
pub struct FontTextRenderer {
    font: FontArc,
}

impl FontTextRenderer {
    pub fn from_bytes(data: Vec<u8>) -> CaptureResult<Self> {
        let font = FontArc::try_from_vec(data)
            .map_err(|e| ErrorDescriptor::unknown(format!("invalid font data: {}", e)))?;
        Ok(Self { font })
    }

    pub fn from_file(path: &Path) -> CaptureResult<Self> {
        let data = std::fs::read(path).map_err(|e| {
            ErrorDescriptor::unknown(format!("failed to read font '{}': {}", path.display(), e))
        })?;
        let renderer = Self::from_bytes(data)?;
        info!(path = %path.display(), "Loaded overlay font");
        Ok(renderer)
    }

    /// Whether the face has a glyph for every visible character of `text`
    pub fn covers(&self, text: &str) -> bool {
        text.chars()
            .filter(|c| !c.is_whitespace())
            .all(|c| self.font.glyph_id(c).0 != 0)
    }

    /// Use `configured` when given, otherwise the first well-known font that
    /// can draw `sample`
    ///
    /// A face missing some of `sample`'s characters is only used when no
    /// search location holds a better one.
    pub fn discover(configured: Option<&Path>, sample: &str) -> CaptureResult<Self> {
        if let Some(path) = configured {
            let renderer = Self::from_file(path)?;
            if !renderer.covers(sample) {
                warn!(path = %path.display(), "Configured font lacks glyphs for the overlay labels");
            }
            return Ok(renderer);
        }
        let candidates: Vec<&Path> = FONT_SEARCH_PATHS.iter().map(Path::new).collect();
        Self::discover_in(&candidates, sample)
    }

    fn discover_in(candidates: &[&Path], sample: &str) -> CaptureResult<Self> {
        let mut partial = None;
        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::from_file(path) {
                Ok(renderer) if renderer.covers(sample) => return Ok(renderer),
                Ok(renderer) => {
                    debug!(path = %path.display(), "Font lacks glyphs for the overlay labels");
                    if partial.is_none() {
                        partial = Some((renderer, path.display().to_string()));
                    }
                }
                Err(e) => debug!(path = %path.display(), error = %e, "Skipping font"),
            }
        }
        match partial {
            Some((renderer, path)) => {
                warn!(
                    %path,
                    "No installed font covers the overlay labels, some characters will render as boxes; set font_path in the config"
                );
                Ok(renderer)
            }
            None => Err(ErrorDescriptor::unknown(
                "no usable overlay font found; set font_path in the config",
            )),
        }
    }

    /// Rightmost pixel column any glyph outline reaches, laid out the way
    /// `draw_text_mut` lays them out
    fn ink_right(&self, scale: PxScale, text: &str) -> f32 {
        let scaled = self.font.as_scaled(scale);
        let mut caret = 0.0f32;
        let mut right = 0.0f32;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            let glyph = id.with_scale_and_position(scale, point(caret, scaled.ascent()));
            caret += scaled.h_advance(id);
            if let Some(outline) = scaled.outline_glyph(glyph) {
                right = right.max(outline.px_bounds().max.x);
            }
        }
        right
    }
}

impl TextRenderer for FontTextRenderer {
    fn measure(&self, text: &str, font_size: f32) -> (u32, u32) {
        let scale = PxScale::from(font_size);
        let (advance, _) = text_size(scale, &self.font, text);
        // Bold and italic outlines can overhang the advance box
        let width = advance.max(self.ink_right(scale, text).ceil() as u32);
        (width, self.line_height(font_size))
    }

    fn line_height(&self, font_size: f32) -> u32 {
        let scaled = self.font.as_scaled(PxScale::from(font_size));
        (scaled.ascent() - scaled.descent()).ceil() as u32
    }

    fn draw(
        &self,
        surface: &mut RgbaImage,
        text: &str,
        x: i32,
        y: i32,
        font_size: f32,
        color: Rgba<u8>,
    ) {
        draw_text_mut(surface, color, x, y, PxScale::from(font_size), &self.font, text);
    }
}

impl std::fmt::Debug for FontTextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontTextRenderer").finish_non_exhaustive()
    }
}
