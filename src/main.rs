// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand, ValueEnum};
use geostamp::config::Locale;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "geostamp")]
#[command(about = "Capture photos watermarked with position and time")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Configuration file (default: <config dir>/geostamp/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Camera facing for the virtual device
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FacingArg {
    Rear,
    Front,
    Any,
}

#[derive(Subcommand)]
enum Commands {
    /// Watermark an existing image
    Stamp {
        /// Input image (any format the image crate decodes)
        #[arg(short, long)]
        input: PathBuf,

        /// Output JPEG path
        #[arg(short, long)]
        output: PathBuf,

        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Capture time in epoch milliseconds (default: now)
        #[arg(long)]
        time_ms: Option<i64>,

        /// Overlay font, overrides the configured one
        #[arg(long)]
        font: Option<PathBuf>,

        /// Overlay language (zh-cn, en)
        #[arg(long)]
        locale: Option<Locale>,
    },

    /// Run the full capture pipeline against a virtual camera
    Capture {
        /// Image served as the camera feed
        #[arg(short, long)]
        source: PathBuf,

        /// Output JPEG path
        #[arg(short, long)]
        output: PathBuf,

        /// Latitude reported by the location service
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude reported by the location service
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Which cameras the virtual device has
        #[arg(long, value_enum, default_value = "rear")]
        facing: FacingArg,
    },

    /// Report whether an origin may open the camera
    CheckOrigin {
        /// Origin such as https://example.com or http://localhost:8080
        origin: String,

        /// Treat the page as a secure context regardless of scheme
        #[arg(long)]
        secure: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=geostamp=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = cli::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Stamp {
            input,
            output,
            lat,
            lon,
            time_ms,
            font,
            locale,
        } => cli::stamp(
            &config,
            cli::StampArgs {
                input,
                output,
                lat,
                lon,
                time_ms,
                font,
                locale,
            },
        ),
        Commands::Capture {
            source,
            output,
            lat,
            lon,
            facing,
        } => cli::capture(&config, &source, &output, lat, lon, facing),
        Commands::CheckOrigin { origin, secure } => cli::check_origin(&config, &origin, secure),
    }
}
