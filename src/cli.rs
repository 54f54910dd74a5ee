// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Watermarking an existing image
//! - Running the full capture pipeline against a virtual camera
//! - Checking whether an origin may open the camera

use crate::FacingArg;
use geostamp::backends::camera::SecurityContext;
use geostamp::backends::camera::types::FacingMode;
use geostamp::backends::location::{PositionProvider, PositionReading, StaticLocation};
use geostamp::backends::virtual_camera::VirtualCamera;
use geostamp::cancellation::CancelToken;
use geostamp::config::{Config, Locale};
use geostamp::errors::{ErrorDescriptor, ErrorKind};
use geostamp::pipelines::photo::{AnnotatedImage, CapturePipeline, WatermarkCompositor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Arguments of the `stamp` command
pub struct StampArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub lat: f64,
    pub lon: f64,
    pub time_ms: Option<i64>,
    pub font: Option<PathBuf>,
    pub locale: Option<Locale>,
}

/// Explicit config file, or the user's config with defaults
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None => Ok(Config::load_or_default()),
    }
}

/// Watermark an image file
pub fn stamp(config: &Config, args: StampArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = config.clone();
    if let Some(font) = args.font {
        config.font_path = Some(font);
    }
    if let Some(locale) = args.locale {
        config.locale = locale;
    }

    let timestamp_ms = args
        .time_ms
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
    let position = PositionReading::new(args.lat, args.lon, 0.0, timestamp_ms)?;
    let compositor = WatermarkCompositor::from_config(&config)?;

    let bytes = std::fs::read(&args.input)?;
    let annotated = compositor
        .annotate_encoded(&bytes, &position, timestamp_ms)
        .map_err(|e| explain(e, config.locale))?;

    save(annotated, &args.output)
}

/// Capture through the full pipeline, with `source` standing in for the camera
pub fn capture(
    config: &Config,
    source: &Path,
    output: &Path,
    lat: f64,
    lon: f64,
    facing: FacingArg,
) -> Result<(), Box<dyn std::error::Error>> {
    let facings = match facing {
        FacingArg::Rear => vec![FacingMode::Environment],
        FacingArg::Front => vec![FacingMode::User],
        FacingArg::Any => vec![FacingMode::Environment, FacingMode::User],
    };
    let camera = VirtualCamera::from_image_file(source)?.with_facings(facings);
    let pipeline = CapturePipeline::from_config(Arc::new(camera), config)?;

    let now = chrono::Utc::now().timestamp_millis();
    let location = StaticLocation::new(PositionReading::new(lat, lon, 0.0, now)?);
    let provider = PositionProvider::new(Arc::new(location)).with_timeout(config.fix_timeout());

    let rt = tokio::runtime::Runtime::new()?;
    let annotated = rt.block_on(async {
        let cancel = CancelToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });

        let position = provider.request_fix().await?;
        println!(
            "Position: {:.5}, {:.5}",
            position.latitude(),
            position.longitude()
        );
        println!("Capturing...");
        pipeline
            .capture_annotated_photo(Some(&position), &cancel)
            .await
    });

    let annotated = annotated.map_err(|e| explain(e, config.locale))?;
    save(annotated, output)
}

/// Print whether camera access would be allowed from `origin`
pub fn check_origin(
    config: &Config,
    origin: &str,
    secure: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let context = SecurityContext::from_origin(origin, secure);
    if context.scheme.is_empty() || (context.host.is_empty() && context.scheme != "file") {
        return Err(format!("Not an origin: {}", origin).into());
    }

    if context.is_trusted() {
        println!("{}: camera access allowed", origin);
    } else {
        println!("{}: camera access refused", origin);
        println!(
            "  {}",
            ErrorKind::ContextInsecure.remediation(config.locale)
        );
    }
    Ok(())
}

fn save(annotated: AnnotatedImage, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let (width, height) = (annotated.width, annotated.height);
    std::fs::write(output, annotated.into_bytes())?;
    info!(path = %output.display(), width, height, "Annotated photo written");
    println!("Photo saved: {} ({}x{})", output.display(), width, height);
    Ok(())
}

/// Print the remediation hint for a failure before handing it back
fn explain(error: ErrorDescriptor, locale: Locale) -> ErrorDescriptor {
    eprintln!("{}", error.kind.remediation(locale));
    error
}
