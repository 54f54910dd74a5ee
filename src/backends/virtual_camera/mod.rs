// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! An in-process [`MediaService`] that serves a still image as if it were a
//! live camera. It behaves like a strict browser media stack: a facing mode
//! that no device offers, or an ideal resolution the device refuses, is
//! reported as `OverconstrainedError`. Platform failures can be queued so the
//! acquisition ladder and the pipeline can be driven through every path.
//!
//! ```text
//! Image file / RGBA buffer
//!        │
//!        ▼
//! ┌──────────────────┐
//! │  VirtualCamera   │  ← constraint checks, scripted failures, counters
//! └──────────────────┘
//!        │  request_video_stream
//!        ▼
//! ┌──────────────────┐
//! │  VirtualStream   │  ← metadata delay, play result, frame copies
//! └──────────────────┘
//! ```

mod file_source;
mod stream;

pub use file_source::{gradient_frame, load_image_as_frame, solid_frame};
pub use stream::VirtualStream;

use crate::backends::camera::types::{FacingMode, RawFrame, StreamConstraints};
use crate::backends::camera::{MediaService, MediaStream, SecurityContext};
use crate::errors::{CaptureResult, PlatformMediaError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Counters shared between the camera and the streams it hands out
#[derive(Debug, Default)]
pub(crate) struct StreamStats {
    pub(crate) requests: Mutex<Vec<StreamConstraints>>,
    pub(crate) opened: AtomicUsize,
    pub(crate) open: AtomicUsize,
}

/// Per-stream behaviour copied into every new stream
#[derive(Debug, Clone)]
pub(crate) struct StreamBehavior {
    pub(crate) metadata_delay: Duration,
    pub(crate) play_error: Option<PlatformMediaError>,
    pub(crate) reports_dimensions: bool,
}

impl Default for StreamBehavior {
    fn default() -> Self {
        Self {
            metadata_delay: Duration::ZERO,
            play_error: None,
            reports_dimensions: true,
        }
    }
}

pub struct VirtualCamera {
    frame: RawFrame,
    facings: Vec<FacingMode>,
    supported: bool,
    security: SecurityContext,
    accepts_ideal_resolution: bool,
    behavior: StreamBehavior,
    /// Failures returned by the next requests, in order
    scripted: Mutex<VecDeque<PlatformMediaError>>,
    stats: Arc<StreamStats>,
}

impl VirtualCamera {
    /// A device with a rear and a front camera, both serving `frame`
    pub fn new(frame: RawFrame) -> Self {
        Self {
            frame,
            facings: vec![FacingMode::Environment, FacingMode::User],
            supported: true,
            security: SecurityContext::trusted(),
            accepts_ideal_resolution: true,
            behavior: StreamBehavior::default(),
            scripted: Mutex::new(VecDeque::new()),
            stats: Arc::new(StreamStats::default()),
        }
    }

    /// Serve an image file
    pub fn from_image_file(path: &Path) -> CaptureResult<Self> {
        Ok(Self::new(load_image_as_frame(path)?))
    }

    /// Limit which facings exist; an empty list means no camera at all
    pub fn with_facings(mut self, facings: Vec<FacingMode>) -> Self {
        self.facings = facings;
        self
    }

    /// Pretend the platform has no media capture
    pub fn unsupported(mut self) -> Self {
        self.supported = false;
        self
    }

    pub fn with_security_context(mut self, security: SecurityContext) -> Self {
        self.security = security;
        self
    }

    /// Reject every request that carries an ideal resolution
    pub fn rejecting_ideal_resolution(mut self) -> Self {
        self.accepts_ideal_resolution = false;
        self
    }

    /// Delay before stream metadata becomes available
    pub fn with_metadata_delay(mut self, delay: Duration) -> Self {
        self.behavior.metadata_delay = delay;
        self
    }

    /// Make playback start fail
    pub fn with_play_error(mut self, error: PlatformMediaError) -> Self {
        self.behavior.play_error = Some(error);
        self
    }

    /// Streams never report their natural size
    pub fn without_dimensions(mut self) -> Self {
        self.behavior.reports_dimensions = false;
        self
    }

    /// Queue a failure for the next stream request
    pub fn push_error(&self, error: PlatformMediaError) {
        self.scripted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(error);
    }

    /// Number of stream requests received
    pub fn request_count(&self) -> usize {
        self.requested_constraints().len()
    }

    /// Constraints of every stream request, in order
    pub fn requested_constraints(&self) -> Vec<StreamConstraints> {
        self.stats
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Streams handed out and not yet stopped
    pub fn open_streams(&self) -> usize {
        self.stats.open.load(Ordering::SeqCst)
    }

    /// Streams handed out in total
    pub fn streams_opened(&self) -> usize {
        self.stats.opened.load(Ordering::SeqCst)
    }

    fn check_constraints(&self, constraints: &StreamConstraints) -> Result<(), PlatformMediaError> {
        if self.facings.is_empty() {
            return Err(PlatformMediaError::not_found());
        }
        if let Some(facing) = constraints.facing
            && !self.facings.contains(&facing)
        {
            return Err(PlatformMediaError::overconstrained("facingMode"));
        }
        if constraints.ideal_resolution.is_some() && !self.accepts_ideal_resolution {
            return Err(PlatformMediaError::overconstrained("width"));
        }
        Ok(())
    }
}

#[async_trait]
impl MediaService for VirtualCamera {
    fn supports_capture(&self) -> bool {
        self.supported
    }

    fn security_context(&self) -> SecurityContext {
        self.security.clone()
    }

    async fn request_video_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, PlatformMediaError> {
        self.stats
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*constraints);

        let scripted = self
            .scripted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(error) = scripted {
            debug!(constraints = %constraints, error = %error, "Virtual camera returning scripted failure");
            return Err(error);
        }

        self.check_constraints(constraints)?;

        let facing = constraints
            .facing
            .or_else(|| self.facings.first().copied())
            .unwrap_or(FacingMode::Environment);
        let serial = self.stats.opened.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.open.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(VirtualStream::new(
            format!("virtual-{}-{}", serial, facing),
            self.frame.clone(),
            self.behavior.clone(),
            Arc::clone(&self.stats),
        )))
    }
}

impl std::fmt::Debug for VirtualCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualCamera")
            .field("width", &self.frame.width)
            .field("height", &self.frame.height)
            .field("facings", &self.facings)
            .field("open_streams", &self.open_streams())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> VirtualCamera {
        VirtualCamera::new(solid_frame(16, 9, [0, 0, 0, 255]))
    }

    #[tokio::test]
    async fn test_missing_facing_is_overconstrained() {
        let camera = camera().with_facings(vec![FacingMode::User]);
        let rear = StreamConstraints::new(Some(FacingMode::Environment), None);

        let err = camera.request_video_stream(&rear).await.err().unwrap();
        assert_eq!(err.name, "OverconstrainedError");
        assert_eq!(camera.open_streams(), 0);
    }

    #[tokio::test]
    async fn test_no_devices_is_not_found() {
        let camera = camera().with_facings(Vec::new());
        let err = camera
            .request_video_stream(&StreamConstraints::BASELINE)
            .await
            .err()
            .unwrap();
        assert_eq!(err.name, "NotFoundError");
    }

    #[tokio::test]
    async fn test_stop_closes_stream_once() {
        let camera = camera();
        let stream = camera
            .request_video_stream(&StreamConstraints::BASELINE)
            .await
            .unwrap();
        assert_eq!(camera.open_streams(), 1);
        assert_eq!(stream.active_video_tracks(), 1);

        stream.stop();
        stream.stop();
        assert_eq!(camera.open_streams(), 0);
        assert_eq!(stream.active_video_tracks(), 0);
    }

    #[tokio::test]
    async fn test_scripted_errors_come_first() {
        let camera = camera();
        camera.push_error(PlatformMediaError::not_readable());

        assert!(camera
            .request_video_stream(&StreamConstraints::BASELINE)
            .await
            .is_err());
        assert!(camera
            .request_video_stream(&StreamConstraints::BASELINE)
            .await
            .is_ok());
        assert_eq!(camera.request_count(), 2);
    }
}
