// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use super::MediaStream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Which way the requested camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacingMode {
    /// Rear camera ("environment" in browser terms)
    Environment,
    /// Front camera ("user" in browser terms)
    User,
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacingMode::Environment => write!(f, "environment"),
            FacingMode::User => write!(f, "user"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Video constraints for one stream request
///
/// `None` means "no constraint". The resolution is an ideal, not an exact
/// requirement, mirroring `{ width: { ideal }, height: { ideal } }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamConstraints {
    pub facing: Option<FacingMode>,
    pub ideal_resolution: Option<Resolution>,
}

impl StreamConstraints {
    /// Plain `{ video: true }`
    pub const BASELINE: StreamConstraints = StreamConstraints {
        facing: None,
        ideal_resolution: None,
    };

    pub const fn new(facing: Option<FacingMode>, ideal_resolution: Option<Resolution>) -> Self {
        Self {
            facing,
            ideal_resolution,
        }
    }

    pub fn is_baseline(&self) -> bool {
        *self == Self::BASELINE
    }
}

impl std::fmt::Display for StreamConstraints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_baseline() {
            return write!(f, "video");
        }
        let facing = self
            .facing
            .map(|facing| facing.to_string())
            .unwrap_or_else(|| "any".to_string());
        match self.ideal_resolution {
            Some(resolution) => write!(f, "facing={} ideal={}", facing, resolution),
            None => write!(f, "facing={}", facing),
        }
    }
}

/// Natural size of the video track; zero until metadata has loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoDimensions {
    pub width: u32,
    pub height: u32,
}

impl VideoDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_known(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl std::fmt::Display for VideoDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One still frame grabbed from a live stream
///
/// `data` holds tightly packed RGBA samples (`width * height * 4` bytes).
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    /// When the frame was grabbed
    pub captured_at: Instant,
}

impl RawFrame {
    pub fn new(width: u32, height: u32, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            data: data.into(),
            captured_at: Instant::now(),
        }
    }

    /// Byte length a well-formed RGBA buffer of this size must have
    pub fn expected_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(4)
    }

    pub fn is_well_formed(&self) -> bool {
        self.width > 0 && self.height > 0 && self.expected_len() == Some(self.data.len())
    }
}

/// Exclusive owner of a live camera stream
///
/// Dropping the handle stops every track, so a stream cannot outlive the
/// code path that acquired it. [`release`](Self::release) is the explicit path.
pub struct MediaStreamHandle {
    stream: Box<dyn MediaStream>,
    released: bool,
}

impl MediaStreamHandle {
    pub fn new(stream: Box<dyn MediaStream>) -> Self {
        Self {
            stream,
            released: false,
        }
    }

    pub fn stream(&self) -> &dyn MediaStream {
        self.stream.as_ref()
    }

    pub fn id(&self) -> &str {
        self.stream.id()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Stop all tracks and give up the stream
    pub fn release(mut self) {
        self.stop_tracks();
    }

    fn stop_tracks(&mut self) {
        if self.released {
            return;
        }
        self.stream.stop();
        self.released = true;
        info!(stream = %self.stream.id(), "Camera stream released");
    }
}

impl Drop for MediaStreamHandle {
    fn drop(&mut self) {
        if !self.released {
            warn!(stream = %self.stream.id(), "Camera stream dropped without release, stopping tracks");
            self.stop_tracks();
        }
    }
}

impl std::fmt::Debug for MediaStreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStreamHandle")
            .field("id", &self.stream.id())
            .field("released", &self.released)
            .finish()
    }
}
