// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for telemetry watermark compositing

mod common;

use geostamp::backends::camera::types::RawFrame;
use geostamp::backends::virtual_camera::{gradient_frame, solid_frame};
use geostamp::config::Locale;
use geostamp::errors::ErrorKind;
use geostamp::pipelines::photo::{
    FontTextRenderer, OverlayClock, OverlayLabels, WatermarkCompositor,
};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;

#[test]
fn test_overlay_text_for_reference_position() {
    let lines = common::compositor()
        .overlay_lines(&common::san_francisco(), common::CAPTURE_TIME_MS)
        .unwrap();

    assert_eq!(
        lines,
        [
            "纬度：37.77490".to_string(),
            "经度：-122.41940".to_string(),
            "时间：2023-11-14 22:13:20".to_string(),
        ]
    );
}

#[test]
fn test_only_overlay_region_changes() {
    let compositor = common::compositor();
    let frame = solid_frame(640, 480, common::BACKGROUND);
    let position = common::san_francisco();

    let surface = compositor
        .compose(&frame, &position, common::CAPTURE_TIME_MS)
        .unwrap();
    assert_eq!(surface.dimensions(), (640, 480));

    let lines = compositor
        .overlay_lines(&position, common::CAPTURE_TIME_MS)
        .unwrap();
    let region = compositor.overlay_region(640, 480, &lines);

    // Bottom-left anchoring
    assert!(region.left > 0 && region.left < 64);
    assert!(region.bottom <= 480);
    assert!(region.top > 240);

    let mut white = 0;
    let mut black = 0;
    for (x, y, pixel) in surface.enumerate_pixels() {
        if region.contains(x, y) {
            match pixel.0 {
                [255, 255, 255, 255] => white += 1,
                [0, 0, 0, 255] => black += 1,
                _ => {}
            }
        } else {
            assert_eq!(pixel.0, common::BACKGROUND, "pixel ({}, {}) changed", x, y);
        }
    }
    assert!(white > 0, "Fill should be drawn");
    assert!(black > 0, "Outline should be drawn");
}

#[test]
fn test_installed_font_stays_inside_overlay_region() {
    for locale in [Locale::ZhCn, Locale::En] {
        let sample = OverlayLabels::for_locale(locale).glyph_sample();
        let Ok(renderer) = FontTextRenderer::discover(None, &sample) else {
            eprintln!("Skipping: no overlay font installed");
            return;
        };
        let compositor = WatermarkCompositor::new(Arc::new(renderer))
            .with_locale(locale)
            .with_clock(OverlayClock::from_offset_minutes(0).unwrap());

        for (width, height) in [(640, 480), (1920, 1080), (320, 240)] {
            let frame = solid_frame(width, height, common::BACKGROUND);
            let position = common::san_francisco();
            let surface = compositor
                .compose(&frame, &position, common::CAPTURE_TIME_MS)
                .unwrap();
            let lines = compositor
                .overlay_lines(&position, common::CAPTURE_TIME_MS)
                .unwrap();
            let region = compositor.overlay_region(width, height, &lines);

            let mut changed = 0;
            for (x, y, pixel) in surface.enumerate_pixels() {
                if pixel.0 == common::BACKGROUND {
                    continue;
                }
                changed += 1;
                assert!(
                    region.contains(x, y),
                    "{:?} {}x{}: pixel ({}, {}) outside {:?}",
                    locale,
                    width,
                    height,
                    x,
                    y,
                    region
                );
            }
            assert!(changed > 0, "Overlay should be drawn");
        }
    }
}

#[test]
fn test_input_frame_is_not_mutated() {
    let frame = gradient_frame(200, 150);
    let before = frame.data.to_vec();

    common::compositor()
        .annotate(&frame, &common::san_francisco(), common::CAPTURE_TIME_MS)
        .unwrap();

    assert_eq!(&frame.data[..], &before[..]);
}

#[test]
fn test_annotated_jpeg_keeps_dimensions() {
    let frame = solid_frame(333, 222, common::BACKGROUND);

    let annotated = common::compositor()
        .annotate(&frame, &common::san_francisco(), common::CAPTURE_TIME_MS)
        .unwrap();

    assert_eq!((annotated.width, annotated.height), (333, 222));
    let decoded = image::load_from_memory_with_format(&annotated.data, ImageFormat::Jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (333, 222));
    assert!(annotated.to_data_url().starts_with("data:image/jpeg;base64,/9j/"));
}

#[test]
fn test_annotate_encoded_png() {
    let source = RgbaImage::from_pixel(120, 80, Rgba(common::BACKGROUND));
    let mut png = Vec::new();
    source
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();

    let annotated = common::compositor()
        .annotate_encoded(&png, &common::san_francisco(), common::CAPTURE_TIME_MS)
        .unwrap();

    assert_eq!((annotated.width, annotated.height), (120, 80));
}

#[test]
fn test_english_overlay() {
    let lines = common::compositor()
        .with_locale(Locale::En)
        .overlay_lines(&common::san_francisco(), common::CAPTURE_TIME_MS)
        .unwrap();

    assert_eq!(lines[0], "Lat: 37.77490");
    assert_eq!(lines[1], "Lon: -122.41940");
}

#[test]
fn test_unusable_frames_are_unknown() {
    let compositor = common::compositor();
    let position = common::san_francisco();

    let empty = RawFrame::new(0, 0, Vec::new());
    let truncated = RawFrame::new(10, 10, vec![0u8; 99]);

    for frame in [empty, truncated] {
        let err = compositor
            .compose(&frame, &position, common::CAPTURE_TIME_MS)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unknown);
    }
}
