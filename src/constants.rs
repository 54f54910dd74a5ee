// SPDX-License-Identifier: GPL-3.0-only

//! Crate-wide constants

use std::time::Duration;

/// Upper bound on waiting for a single location fix
pub const FIX_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Upper bound on waiting for stream metadata and playback start
pub const PRIMING_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Resolution requested as "ideal" by the first three ladder rungs
pub const IDEAL_WIDTH: u32 = 1920;
pub const IDEAL_HEIGHT: u32 = 1080;

/// JPEG quality of the annotated output (0.9 on a 0-1 scale)
pub const JPEG_QUALITY: u8 = 90;

/// Overlay geometry
pub mod overlay {
    /// Smallest font size in pixels
    pub const MIN_FONT_SIZE: f32 = 24.0;
    /// Font size is `width / WIDTH_DIVISOR` above the minimum
    pub const WIDTH_DIVISOR: f32 = 20.0;
    /// Baseline-to-baseline distance as a multiple of the font size
    pub const LINE_SPACING: f32 = 1.5;
    /// Smallest outline stroke width in pixels
    pub const MIN_STROKE_WIDTH: f32 = 2.0;
    /// Stroke width is `font_size / STROKE_DIVISOR` above the minimum
    pub const STROKE_DIVISOR: f32 = 12.0;
    /// Fill colour (white)
    pub const FILL: [u8; 4] = [255, 255, 255, 255];
    /// Outline colour (black)
    pub const STROKE: [u8; 4] = [0, 0, 0, 255];
    /// Decimal places for latitude and longitude
    pub const COORDINATE_PRECISION: usize = 5;
    /// chrono pattern for the capture time line
    pub const TIME_PATTERN: &str = "%Y-%m-%d %H:%M:%S";
}

/// Font files searched when no font is configured. CJK-capable faces come first
/// because the default labels are Chinese.
pub const FONT_SEARCH_PATHS: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Bold.ttc",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Bold.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Bold.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/System/Library/Fonts/PingFang.ttc",
    "C:\\Windows\\Fonts\\msyh.ttc",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
];
