// SPDX-License-Identifier: GPL-3.0-only

//! Shared helpers for integration tests
#![allow(dead_code)]

use geostamp::backends::location::PositionReading;
use geostamp::backends::virtual_camera::{VirtualCamera, solid_frame};
use geostamp::pipelines::photo::{
    CapturePipeline, FixedClock, OverlayClock, TextRenderer, WatermarkCompositor,
};
use image::{Rgba, RgbaImage};
use std::sync::Arc;

/// 2023-11-14 22:13:20 UTC
pub const CAPTURE_TIME_MS: i64 = 1_700_000_000_000;

pub const BACKGROUND: [u8; 4] = [90, 120, 160, 255];

/// Paints each line as a solid box, so tests need no font files
pub struct BlockRenderer;

impl TextRenderer for BlockRenderer {
    fn measure(&self, text: &str, font_size: f32) -> (u32, u32) {
        let width = text.chars().count() as f32 * font_size * 0.6;
        (width as u32, font_size as u32)
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
        let (width, height) = self.measure(text, font_size);
        let (surface_width, surface_height) = surface.dimensions();
        for py in y.max(0)..(y + height as i32).min(surface_height as i32) {
            for px in x.max(0)..(x + width as i32).min(surface_width as i32) {
                surface.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

pub fn san_francisco() -> PositionReading {
    PositionReading::new(37.7749, -122.4194, 5.0, CAPTURE_TIME_MS).unwrap()
}

pub fn compositor() -> WatermarkCompositor {
    WatermarkCompositor::new(Arc::new(BlockRenderer))
        .with_clock(OverlayClock::from_offset_minutes(0).unwrap())
}

pub fn camera(width: u32, height: u32) -> VirtualCamera {
    VirtualCamera::new(solid_frame(width, height, BACKGROUND))
}

pub fn pipeline(camera: &Arc<VirtualCamera>) -> CapturePipeline {
    CapturePipeline::new(camera.clone(), compositor()).with_clock(Arc::new(FixedClock(CAPTURE_TIME_MS)))
}
