// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   CapturePipeline   │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │    MediaAcquirer    │  ← preconditions, constraint fallback ladder
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ MediaService Trait  │  ← common interface
//! └──────────┬──────────┘
//!            │
//!            ▼
//!   ┌────────────────┐
//!   │ VirtualCamera, │  ← concrete implementations
//!   │ browser, ...   │
//!   └────────────────┘
//! ```

pub mod acquirer;
pub mod security;
pub mod types;

pub use acquirer::{FALLBACK_LADDER, MediaAcquirer, Rung};
pub use security::SecurityContext;
pub use types::*;

use crate::errors::PlatformMediaError;
use async_trait::async_trait;

/// Platform media-capture capability
#[async_trait]
pub trait MediaService: Send + Sync {
    /// Whether the platform exposes media capture at all
    fn supports_capture(&self) -> bool;

    /// Trust level of the context the service runs in
    fn security_context(&self) -> SecurityContext;

    /// Ask for a video stream. May suspend on a permission prompt.
    async fn request_video_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, PlatformMediaError>;
}

/// A live video stream as handed out by a [`MediaService`]
#[async_trait]
pub trait MediaStream: Send + Sync {
    /// Identifier used in logs
    fn id(&self) -> &str;

    /// Number of video tracks that are currently live
    fn active_video_tracks(&self) -> usize;

    /// Natural dimensions of the video; zero while metadata is unknown
    fn dimensions(&self) -> VideoDimensions;

    /// Resolves once metadata (dimensions) is available
    async fn loaded_metadata(&self) -> Result<VideoDimensions, PlatformMediaError>;

    /// Start playback so frames can be drawn
    async fn play(&self) -> Result<(), PlatformMediaError>;

    /// Draw the current video frame at native resolution
    fn grab_frame(&self) -> Result<RawFrame, PlatformMediaError>;

    /// Stop all tracks. Must be idempotent.
    fn stop(&self);
}
