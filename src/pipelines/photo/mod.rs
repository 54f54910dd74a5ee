// SPDX-License-Identifier: GPL-3.0-only

//! Capture-and-watermark photo pipeline
//!
//! ```text
//! Idle → Acquiring → Priming → Capturing → Compositing → ReleasingStream → Idle
//!            │           │          │            │
//!            └───────────┴──────────┴────────────┴──→ ReleasingStream → Failed(kind)
//! ```
//!
//! # Pipeline Stages
//!
//! 1. **Acquiring**: Negotiate a camera stream through the fallback ladder
//! 2. **Priming**: Wait for metadata and playback, bounded by a timeout
//! 3. **Capturing**: Grab one frame at native resolution
//! 4. **Compositing**: Burn the telemetry overlay and encode JPEG (blocking pool)
//! 5. **ReleasingStream**: Stop every track, on every exit path
//!
//! The open stream lives in a field of the pipeline, not in ambient state.
//! Holding that slot is also what makes a second concurrent capture fail
//! with `Busy`.

pub mod capture;
pub mod encoding;
pub mod text;
pub mod watermark;

pub use capture::FrameCapturer;
pub use encoding::{AnnotatedImage, encode_jpeg};
pub use text::{FontTextRenderer, TextRenderer};
pub use watermark::{OverlayClock, OverlayLabels, OverlayLayout, OverlayRegion, WatermarkCompositor};

use crate::backends::camera::types::MediaStreamHandle;
use crate::backends::camera::{MediaAcquirer, MediaService};
use crate::backends::location::PositionReading;
use crate::cancellation::CancelToken;
use crate::config::Config;
use crate::constants::PRIMING_TIMEOUT;
use crate::errors::{CaptureResult, ErrorDescriptor, ErrorKind};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard, watch};
use tracing::{debug, error, info, warn};

/// Observable pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PipelineState {
    #[default]
    Idle,
    Acquiring,
    Priming,
    Capturing,
    Compositing,
    ReleasingStream,
    Failed(ErrorKind),
}

impl PipelineState {
    /// Whether a capture is in flight
    pub fn is_active(&self) -> bool {
        !matches!(self, PipelineState::Idle | PipelineState::Failed(_))
    }
}

/// Source of the capture timestamp
pub trait Clock: Send + Sync {
    fn now_epoch_ms(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock stuck at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_epoch_ms(&self) -> i64 {
        self.0
    }
}

/// Orchestrates acquire → prime → capture → composite → release
pub struct CapturePipeline {
    acquirer: MediaAcquirer,
    compositor: WatermarkCompositor,
    clock: Arc<dyn Clock>,
    priming_timeout: Duration,
    /// The one stream this instance may hold open
    active_stream: Mutex<Option<MediaStreamHandle>>,
    state: watch::Sender<PipelineState>,
}

impl CapturePipeline {
    pub fn new(media: Arc<dyn MediaService>, compositor: WatermarkCompositor) -> Self {
        let (state, _) = watch::channel(PipelineState::Idle);
        Self {
            acquirer: MediaAcquirer::new(media),
            compositor,
            clock: Arc::new(SystemClock),
            priming_timeout: PRIMING_TIMEOUT,
            active_stream: Mutex::new(None),
            state,
        }
    }

    /// Build a pipeline from user configuration
    ///
    /// Loads the overlay font (configured path, else system locations) and
    /// applies locale, overlay clock and priming timeout.
    pub fn from_config(media: Arc<dyn MediaService>, config: &Config) -> CaptureResult<Self> {
        let compositor = WatermarkCompositor::from_config(config)?;
        Ok(Self::new(media, compositor).with_priming_timeout(config.priming_timeout()))
    }

    pub fn with_priming_timeout(mut self, timeout: Duration) -> Self {
        self.priming_timeout = timeout;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> PipelineState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    /// Whether a capture currently holds the stream slot
    pub fn is_busy(&self) -> bool {
        self.active_stream.try_lock().is_err()
    }

    /// Capture one frame and return it annotated with `position`
    ///
    /// The stream is released before this returns, whatever the outcome.
    /// If the returned future is dropped mid-capture, the stream is released
    /// during the drop.
    ///
    /// # Errors
    /// * `Unavailable` - no position was supplied; the camera is never touched
    /// * `Busy` - another capture is in flight on this instance
    /// * `Cancelled` - `cancel` fired
    /// * any acquisition, priming or compositing failure kind
    pub async fn capture_annotated_photo(
        &self,
        position: Option<&PositionReading>,
        cancel: &CancelToken,
    ) -> CaptureResult<AnnotatedImage> {
        let Some(position) = position.copied() else {
            warn!("Capture requested without a position fix");
            return Err(ErrorDescriptor::unavailable(
                "no position fix available; request location first",
            ));
        };

        let slot = self.active_stream.try_lock().map_err(|_| {
            debug!("Capture rejected, another capture is in flight");
            ErrorDescriptor::busy()
        })?;

        let mut lease = StreamLease {
            slot,
            state: &self.state,
            finished: false,
        };

        let outcome = self.run(&mut lease, position, cancel).await;
        lease.finish(outcome)
    }

    async fn run(
        &self,
        lease: &mut StreamLease<'_>,
        position: PositionReading,
        cancel: &CancelToken,
    ) -> CaptureResult<AnnotatedImage> {
        lease.transition(PipelineState::Acquiring);
        let handle = self.acquirer.acquire(cancel).await?;
        lease.hold(handle);
        let handle = lease.held()?;

        lease.transition(PipelineState::Priming);
        self.prime(handle, cancel).await?;

        lease.transition(PipelineState::Capturing);
        let frame = FrameCapturer::capture(handle)?;
        let timestamp_ms = self.clock.now_epoch_ms();

        lease.transition(PipelineState::Compositing);
        let compositor = self.compositor.clone();
        let compositing = async move {
            tokio::task::spawn_blocking(move || compositor.annotate(&frame, &position, timestamp_ms))
                .await
                .unwrap_or_else(|e| {
                    Err(ErrorDescriptor::unknown(format!("compositing task failed: {}", e)))
                })
        };
        until_cancelled(cancel, compositing).await
    }

    /// Wait for usable dimensions and playback
    async fn prime(&self, handle: &MediaStreamHandle, cancel: &CancelToken) -> CaptureResult<()> {
        let stream = handle.stream();
        let readiness = async {
            let dimensions = stream.loaded_metadata().await.map_err(ErrorDescriptor::from)?;
            stream.play().await.map_err(|e| {
                ErrorDescriptor::unknown(format!("playback failed to start: {}", e))
            })?;
            Ok::<_, ErrorDescriptor>(dimensions)
        };

        let bounded = async {
            tokio::time::timeout(self.priming_timeout, readiness)
                .await
                .unwrap_or_else(|_| {
                    Err(ErrorDescriptor::timeout(format!(
                        "stream not ready within {} ms",
                        self.priming_timeout.as_millis()
                    )))
                })
        };

        let dimensions = until_cancelled(cancel, bounded).await?;
        debug!(stream = %handle.id(), %dimensions, "Stream primed");
        Ok(())
    }
}

impl std::fmt::Debug for CapturePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturePipeline")
            .field("state", &self.state())
            .field("priming_timeout", &self.priming_timeout)
            .finish_non_exhaustive()
    }
}

/// Race `work` against the cancel token
async fn until_cancelled<T>(
    cancel: &CancelToken,
    work: impl Future<Output = CaptureResult<T>>,
) -> CaptureResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ErrorDescriptor::cancelled()),
        result = work => result,
    }
}

/// Exclusive claim on the pipeline's stream slot for one capture
///
/// Whatever happens to the capture future, dropping the lease stops the held
/// stream and leaves the state machine out of its active states.
struct StreamLease<'a> {
    slot: MutexGuard<'a, Option<MediaStreamHandle>>,
    state: &'a watch::Sender<PipelineState>,
    finished: bool,
}

impl StreamLease<'_> {
    fn transition(&self, next: PipelineState) {
        debug!(state = ?next, "Pipeline state");
        self.state.send_replace(next);
    }

    fn hold(&mut self, handle: MediaStreamHandle) {
        *self.slot = Some(handle);
    }

    fn held(&self) -> CaptureResult<&MediaStreamHandle> {
        self.slot
            .as_ref()
            .ok_or_else(|| ErrorDescriptor::unknown("no stream held by this capture"))
    }

    fn release_stream(&mut self) {
        if let Some(handle) = self.slot.take() {
            handle.release();
        }
    }

    fn finish(mut self, outcome: CaptureResult<AnnotatedImage>) -> CaptureResult<AnnotatedImage> {
        self.transition(PipelineState::ReleasingStream);
        self.release_stream();
        self.finished = true;

        match &outcome {
            Ok(image) => {
                info!(
                    width = image.width,
                    height = image.height,
                    bytes = image.data.len(),
                    "Annotated photo captured"
                );
                self.transition(PipelineState::Idle);
            }
            Err(e) => {
                if e.kind == ErrorKind::Cancelled {
                    info!("Capture cancelled");
                } else {
                    error!(error = %e, "Capture failed");
                }
                self.transition(PipelineState::Failed(e.kind));
            }
        }
        outcome
    }
}

impl Drop for StreamLease<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!("Capture abandoned mid-flight, releasing stream");
        self.state.send_replace(PipelineState::ReleasingStream);
        self.release_stream();
        self.state
            .send_replace(PipelineState::Failed(ErrorKind::Cancelled));
    }
}
