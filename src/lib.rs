// SPDX-License-Identifier: GPL-3.0-only

//! Geostamp - GPS and time watermarked photo capture
//!
//! This library captures a single still frame from a camera stream and burns
//! the device position and capture time into its bottom-left corner.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Location and camera service abstractions, plus an
//!   in-process virtual camera
//! - [`pipelines`]: The capture-and-watermark photo pipeline
//! - [`errors`]: Failure taxonomy shared by every component
//! - [`config`]: User configuration handling
//! - [`cancellation`]: Cooperative cancellation for in-flight captures
//!
//! # Example
//!
//! ```ignore
//! let provider = Arc::new(PositionProvider::new(location_service));
//! let position = provider.request_fix().await?;
//!
//! let pipeline = CapturePipeline::from_config(media_service, &Config::load_or_default())?;
//! let photo = pipeline
//!     .capture_annotated_photo(Some(&position), &CancelToken::new())
//!     .await?;
//! std::fs::write("photo.jpg", photo.into_bytes())?;
//! ```

pub mod backends;
pub mod cancellation;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;

// Re-export commonly used types
pub use backends::camera::types::{FacingMode, MediaStreamHandle, RawFrame, StreamConstraints};
pub use backends::camera::{MediaAcquirer, MediaService, MediaStream, SecurityContext};
pub use backends::location::{FixState, LocationService, PositionProvider, PositionReading};
pub use backends::virtual_camera::VirtualCamera;
pub use cancellation::CancelToken;
pub use config::{Config, Locale};
pub use errors::{CaptureResult, ErrorDescriptor, ErrorKind};
pub use pipelines::photo::{AnnotatedImage, CapturePipeline, PipelineState, WatermarkCompositor};
