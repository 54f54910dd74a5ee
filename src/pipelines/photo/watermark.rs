// SPDX-License-Identifier: GPL-3.0-only

//! Telemetry watermark compositing
//!
//! Burns three text lines into the bottom-left corner of a frame. From the
//! bottom up: latitude, longitude, capture time. Each line is outlined in
//! black, then filled in white, so it stays legible on any background.
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │                                      │
//! │                                      │
//! │  时间：2023-11-15 06:13:20            │
//! │  经度：-122.41940                     │
//! │  纬度：37.77490                       │
//! │                                      │  ← padding = one font size
//! └──────────────────────────────────────┘
//! ```
//!
//! Compositing is a pure function of (frame, position, timestamp): the input
//! frame is never touched and every call allocates a fresh surface.

use super::encoding::{AnnotatedImage, encode_jpeg};
use super::text::{FontTextRenderer, TextRenderer};
use crate::backends::camera::types::RawFrame;
use crate::backends::location::PositionReading;
use crate::config::{Config, Locale};
use crate::constants::overlay;
use crate::errors::{CaptureResult, ErrorDescriptor};
use chrono::{DateTime, FixedOffset, Utc};
use image::{Rgba, RgbaImage};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Labels prefixed to each overlay line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayLabels {
    pub latitude: &'static str,
    pub longitude: &'static str,
    pub time: &'static str,
}

impl OverlayLabels {
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::ZhCn => Self {
                latitude: "纬度：",
                longitude: "经度：",
                time: "时间：",
            },
            Locale::En => Self {
                latitude: "Lat: ",
                longitude: "Lon: ",
                time: "Time: ",
            },
        }
    }

    /// Every character the overlay can draw with these labels
    pub fn glyph_sample(&self) -> String {
        format!(
            "{}{}{}0123456789.-:",
            self.latitude, self.longitude, self.time
        )
    }
}

/// Time zone used to render the capture time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayClock {
    /// The device's local time zone
    #[default]
    Local,
    /// A fixed UTC offset
    Fixed(FixedOffset),
}

impl OverlayClock {
    /// Fixed offset in minutes east of UTC; `None` for out-of-range values
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(OverlayClock::Fixed)
    }

    /// Format an epoch-milliseconds timestamp as `YYYY-MM-DD HH:MM:SS`
    pub fn format(&self, timestamp_ms: i64) -> CaptureResult<String> {
        let utc = DateTime::<Utc>::from_timestamp_millis(timestamp_ms).ok_or_else(|| {
            ErrorDescriptor::unknown(format!("timestamp out of range: {}", timestamp_ms))
        })?;
        let formatted = match self {
            OverlayClock::Local => utc
                .with_timezone(&chrono::Local)
                .format(overlay::TIME_PATTERN)
                .to_string(),
            OverlayClock::Fixed(offset) => utc
                .with_timezone(offset)
                .format(overlay::TIME_PATTERN)
                .to_string(),
        };
        Ok(formatted)
    }
}

/// Size-dependent overlay geometry, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLayout {
    pub font_size: f32,
    pub line_height: f32,
    pub padding: f32,
    pub stroke_width: f32,
}

impl OverlayLayout {
    /// Geometry for an image `width` pixels wide
    pub fn for_width(width: u32) -> Self {
        let font_size = (width as f32 / overlay::WIDTH_DIVISOR).max(overlay::MIN_FONT_SIZE);
        Self {
            font_size,
            line_height: font_size * overlay::LINE_SPACING,
            padding: font_size,
            stroke_width: (font_size / overlay::STROKE_DIVISOR).max(overlay::MIN_STROKE_WIDTH),
        }
    }

    /// Bottom edge of line `index`, counting from the bottom line
    pub fn baseline(&self, image_height: u32, index: usize) -> f32 {
        image_height as f32 - self.padding - index as f32 * self.line_height
    }

    /// Top edge of line `index`'s line box
    pub fn line_top(&self, image_height: u32, index: usize) -> i32 {
        (self.baseline(image_height, index) - self.font_size).round() as i32
    }

    pub fn left(&self) -> i32 {
        self.padding.round() as i32
    }

    /// Outline radius in whole pixels
    pub fn stroke_radius(&self) -> i32 {
        (self.stroke_width / 2.0).ceil() as i32
    }

    /// Offsets at which the outline pass is drawn
    fn stroke_offsets(&self) -> Vec<(i32, i32)> {
        let radius = self.stroke_radius();
        let mut offsets = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if (dx, dy) != (0, 0) && dx * dx + dy * dy <= radius * radius {
                    offsets.push((dx, dy));
                }
            }
        }
        offsets
    }
}

/// Pixel box touched by the overlay, inclusive-exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayRegion {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl OverlayRegion {
    pub fn contains(&self, x: u32, y: u32) -> bool {
        let (x, y) = (x as i64, y as i64);
        x >= self.left as i64 && x < self.right as i64 && y >= self.top as i64 && y < self.bottom as i64
    }
}

#[derive(Clone)]
pub struct WatermarkCompositor {
    renderer: Arc<dyn TextRenderer>,
    labels: OverlayLabels,
    clock: OverlayClock,
}

impl WatermarkCompositor {
    /// Chinese labels, device local time
    pub fn new(renderer: Arc<dyn TextRenderer>) -> Self {
        Self {
            renderer,
            labels: OverlayLabels::for_locale(Locale::ZhCn),
            clock: OverlayClock::Local,
        }
    }

    /// Font, labels and clock taken from user configuration
    pub fn from_config(config: &Config) -> CaptureResult<Self> {
        let labels = OverlayLabels::for_locale(config.locale);
        let renderer =
            FontTextRenderer::discover(config.font_path.as_deref(), &labels.glyph_sample())?;
        let mut compositor = Self::new(Arc::new(renderer)).with_locale(config.locale);
        if let Some(minutes) = config.utc_offset_minutes {
            match OverlayClock::from_offset_minutes(minutes) {
                Some(clock) => compositor = compositor.with_clock(clock),
                None => warn!(minutes, "Ignoring out-of-range UTC offset, using local time"),
            }
        }
        Ok(compositor)
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.labels = OverlayLabels::for_locale(locale);
        self
    }

    pub fn with_clock(mut self, clock: OverlayClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn labels(&self) -> OverlayLabels {
        self.labels
    }

    /// Overlay text, bottom line first
    pub fn overlay_lines(
        &self,
        position: &PositionReading,
        timestamp_ms: i64,
    ) -> CaptureResult<[String; 3]> {
        let precision = overlay::COORDINATE_PRECISION;
        Ok([
            format!(
                "{}{:.*}",
                self.labels.latitude,
                precision,
                position.latitude()
            ),
            format!(
                "{}{:.*}",
                self.labels.longitude,
                precision,
                position.longitude()
            ),
            format!("{}{}", self.labels.time, self.clock.format(timestamp_ms)?),
        ])
    }

    /// Region of a `width`×`height` image the given lines can touch
    pub fn overlay_region(&self, width: u32, height: u32, lines: &[String]) -> OverlayRegion {
        let layout = OverlayLayout::for_width(width);
        let radius = layout.stroke_radius();
        let left = layout.left();
        let mut region = OverlayRegion {
            left: left - radius,
            top: i32::MAX,
            right: left + radius,
            bottom: i32::MIN,
        };
        let line_height = self.renderer.line_height(layout.font_size);
        for (index, line) in lines.iter().enumerate() {
            let (text_width, text_height) = self.renderer.measure(line, layout.font_size);
            let top = layout.line_top(height, index);
            let extent = text_height.max(line_height) as i32;
            region.top = region.top.min(top - radius);
            region.bottom = region.bottom.max(top + extent + radius);
            region.right = region.right.max(left + text_width as i32 + radius);
        }
        region
    }

    /// Draw the frame and overlay onto a new surface
    pub fn compose(
        &self,
        frame: &RawFrame,
        position: &PositionReading,
        timestamp_ms: i64,
    ) -> CaptureResult<RgbaImage> {
        if frame.width == 0 || frame.height == 0 || frame.expected_len().is_none() {
            return Err(ErrorDescriptor::unknown(format!(
                "cannot create a {}x{} output surface",
                frame.width, frame.height
            )));
        }
        let mut surface = RgbaImage::from_raw(frame.width, frame.height, frame.data.to_vec())
            .ok_or_else(|| {
                ErrorDescriptor::unknown(format!(
                    "cannot decode frame: {} bytes for {}x{} RGBA",
                    frame.data.len(),
                    frame.width,
                    frame.height
                ))
            })?;

        let lines = self.overlay_lines(position, timestamp_ms)?;
        self.draw_overlay(&mut surface, &lines);
        Ok(surface)
    }

    /// Compose and encode as JPEG
    pub fn annotate(
        &self,
        frame: &RawFrame,
        position: &PositionReading,
        timestamp_ms: i64,
    ) -> CaptureResult<AnnotatedImage> {
        info!(
            width = frame.width,
            height = frame.height,
            "Compositing watermark"
        );
        let surface = self.compose(frame, position, timestamp_ms)?;
        encode_jpeg(&surface)
    }

    /// Decode an encoded still image, then annotate it
    pub fn annotate_encoded(
        &self,
        bytes: &[u8],
        position: &PositionReading,
        timestamp_ms: i64,
    ) -> CaptureResult<AnnotatedImage> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| ErrorDescriptor::unknown(format!("cannot decode image: {}", e)))?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        let frame = RawFrame::new(width, height, rgba.into_raw());
        self.annotate(&frame, position, timestamp_ms)
    }

    fn draw_overlay(&self, surface: &mut RgbaImage, lines: &[String]) {
        let (width, height) = surface.dimensions();
        let layout = OverlayLayout::for_width(width);
        let offsets = layout.stroke_offsets();
        let left = layout.left();

        debug!(
            font_size = layout.font_size,
            stroke_width = layout.stroke_width,
            "Drawing overlay"
        );

        for (index, line) in lines.iter().enumerate() {
            let top = layout.line_top(height, index);
            for (dx, dy) in &offsets {
                self.renderer.draw(
                    surface,
                    line,
                    left + dx,
                    top + dy,
                    layout.font_size,
                    Rgba(overlay::STROKE),
                );
            }
            self.renderer
                .draw(surface, line, left, top, layout.font_size, Rgba(overlay::FILL));
        }
    }
}

impl std::fmt::Debug for WatermarkCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkCompositor")
            .field("labels", &self.labels)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use std::sync::Mutex;

    /// Paints one solid box per line and remembers what it drew
    #[derive(Default)]
    struct RecordingRenderer {
        fills: Mutex<Vec<(String, i32)>>,
    }

    impl TextRenderer for RecordingRenderer {
        fn measure(&self, text: &str, font_size: f32) -> (u32, u32) {
            ((text.chars().count() as f32 * font_size * 0.6) as u32, font_size as u32)
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
            if color == Rgba(overlay::FILL) {
                self.fills.lock().unwrap().push((text.to_string(), y));
            }
            let (w, h) = self.measure(text, font_size);
            for py in y.max(0)..(y + h as i32).min(surface.height() as i32) {
                for px in x.max(0)..(x + w as i32).min(surface.width() as i32) {
                    surface.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }

    fn position() -> PositionReading {
        PositionReading::new(37.7749, -122.4194, 5.0, 1_700_000_000_000).unwrap()
    }

    fn utc() -> OverlayClock {
        OverlayClock::from_offset_minutes(0).unwrap()
    }

    #[test]
    fn test_layout_minimum_font() {
        let layout = OverlayLayout::for_width(320);
        assert_eq!(layout.font_size, 24.0);
        assert_eq!(layout.line_height, 36.0);
        assert_eq!(layout.padding, 24.0);
        assert_eq!(layout.stroke_width, 2.0);
    }

    #[test]
    fn test_layout_scales_with_width() {
        let layout = OverlayLayout::for_width(1920);
        assert_eq!(layout.font_size, 96.0);
        assert_eq!(layout.stroke_width, 8.0);
        assert_eq!(layout.baseline(1080, 0), 984.0);
        assert_eq!(layout.baseline(1080, 1), 840.0);
    }

    #[test]
    fn test_lines_bottom_to_top() {
        let compositor =
            WatermarkCompositor::new(Arc::new(RecordingRenderer::default())).with_clock(utc());
        let lines = compositor.overlay_lines(&position(), 1_700_000_000_000).unwrap();
        assert_eq!(lines[0], "纬度：37.77490");
        assert_eq!(lines[1], "经度：-122.41940");
        assert_eq!(lines[2], "时间：2023-11-14 22:13:20");
    }

    #[test]
    fn test_fixed_offset_clock() {
        let beijing = OverlayClock::from_offset_minutes(8 * 60).unwrap();
        assert_eq!(beijing.format(1_700_000_000_000).unwrap(), "2023-11-15 06:13:20");
        assert!(OverlayClock::from_offset_minutes(48 * 60).is_none());
    }

    #[test]
    fn test_compose_draws_fill_after_stroke_in_order() {
        let renderer = Arc::new(RecordingRenderer::default());
        let compositor = WatermarkCompositor::new(renderer.clone()).with_clock(utc());
        let frame = RawFrame::new(200, 160, vec![128u8; 200 * 160 * 4]);

        let surface = compositor.compose(&frame, &position(), 1_700_000_000_000).unwrap();
        assert_eq!(surface.dimensions(), (200, 160));

        let fills = renderer.fills.lock().unwrap();
        assert_eq!(fills.len(), 3);
        assert!(fills[0].0.starts_with("纬度"));
        assert!(fills[1].0.starts_with("经度"));
        assert!(fills[0].1 > fills[1].1 && fills[1].1 > fills[2].1);
        // Fill colour wins at the line origin
        let layout = OverlayLayout::for_width(200);
        let origin = surface.get_pixel(layout.left() as u32, fills[0].1 as u32);
        assert_eq!(*origin, Rgba(overlay::FILL));
    }

    #[test]
    fn test_compose_leaves_input_untouched() {
        let compositor =
            WatermarkCompositor::new(Arc::new(RecordingRenderer::default())).with_clock(utc());
        let frame = RawFrame::new(120, 90, vec![7u8; 120 * 90 * 4]);
        compositor.compose(&frame, &position(), 0).unwrap();
        assert!(frame.data.iter().all(|&b| b == 7));
    }

    #[test]
    fn test_bad_buffer_is_unknown() {
        let compositor = WatermarkCompositor::new(Arc::new(RecordingRenderer::default()));
        let short = RawFrame::new(10, 10, vec![0u8; 12]);
        let err = compositor.compose(&short, &position(), 0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unknown);

        let empty = RawFrame::new(0, 10, Vec::new());
        let err = compositor.compose(&empty, &position(), 0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unknown);
    }

    #[test]
    fn test_undecodable_bytes_are_unknown() {
        let compositor = WatermarkCompositor::new(Arc::new(RecordingRenderer::default()));
        let err = compositor
            .annotate_encoded(b"not an image", &position(), 0)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unknown);
    }

    #[test]
    fn test_english_labels() {
        let compositor = WatermarkCompositor::new(Arc::new(RecordingRenderer::default()))
            .with_locale(Locale::En)
            .with_clock(utc());
        let lines = compositor.overlay_lines(&position(), 0).unwrap();
        assert_eq!(lines[0], "Lat: 37.77490");
        assert_eq!(lines[2], "Time: 1970-01-01 00:00:00");
    }

    #[test]
    fn test_glyph_sample_holds_labels_and_digits() {
        let sample = OverlayLabels::for_locale(Locale::ZhCn).glyph_sample();
        assert!(sample.contains("纬度：") && sample.contains("时间："));
        assert!(sample.contains('7') && sample.contains('-'));
    }

    /// Paints a taller box than `measure` reports, like a font with descenders
    struct DescendingRenderer;

    impl TextRenderer for DescendingRenderer {
        fn measure(&self, text: &str, font_size: f32) -> (u32, u32) {
            ((text.chars().count() as f32 * font_size * 0.6) as u32, font_size as u32)
        }

        fn line_height(&self, font_size: f32) -> u32 {
            (font_size * 1.25) as u32
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
            let (w, _) = self.measure(text, font_size);
            let h = self.line_height(font_size) as i32;
            for py in y.max(0)..(y + h).min(surface.height() as i32) {
                for px in x.max(0)..(x + w as i32).min(surface.width() as i32) {
                    surface.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }

    #[test]
    fn test_region_covers_full_line_box() {
        let compositor = WatermarkCompositor::new(Arc::new(DescendingRenderer)).with_clock(utc());
        let background = [10u8, 20, 30, 255];
        let data: Vec<u8> = background.repeat(320 * 240);
        let frame = RawFrame::new(320, 240, data);

        let surface = compositor.compose(&frame, &position(), 0).unwrap();
        let lines = compositor.overlay_lines(&position(), 0).unwrap();
        let region = compositor.overlay_region(320, 240, &lines);

        for (x, y, pixel) in surface.enumerate_pixels() {
            if !region.contains(x, y) {
                assert_eq!(pixel.0, background, "pixel ({}, {}) outside region", x, y);
            }
        }
    }
}
