// SPDX-License-Identifier: GPL-3.0-only

//! Stream handed out by the virtual camera

use super::{StreamBehavior, StreamStats};
use crate::backends::camera::MediaStream;
use crate::backends::camera::types::{RawFrame, VideoDimensions};
use crate::errors::PlatformMediaError;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::debug;

pub struct VirtualStream {
    id: String,
    frame: RawFrame,
    behavior: StreamBehavior,
    stats: Arc<StreamStats>,
    metadata_loaded: AtomicBool,
    playing: AtomicBool,
    stopped: AtomicBool,
}

impl VirtualStream {
    pub(crate) fn new(
        id: String,
        frame: RawFrame,
        behavior: StreamBehavior,
        stats: Arc<StreamStats>,
    ) -> Self {
        Self {
            id,
            frame,
            behavior,
            stats,
            metadata_loaded: AtomicBool::new(false),
            playing: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn native_dimensions(&self) -> VideoDimensions {
        if self.behavior.reports_dimensions {
            VideoDimensions::new(self.frame.width, self.frame.height)
        } else {
            VideoDimensions::default()
        }
    }

    fn ensure_live(&self) -> Result<(), PlatformMediaError> {
        if self.is_stopped() {
            Err(PlatformMediaError::new(
                "InvalidStateError",
                "the stream has been stopped",
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MediaStream for VirtualStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn active_video_tracks(&self) -> usize {
        if self.is_stopped() { 0 } else { 1 }
    }

    fn dimensions(&self) -> VideoDimensions {
        if self.metadata_loaded.load(Ordering::SeqCst) {
            self.native_dimensions()
        } else {
            VideoDimensions::default()
        }
    }

    async fn loaded_metadata(&self) -> Result<VideoDimensions, PlatformMediaError> {
        if !self.behavior.metadata_delay.is_zero() {
            tokio::time::sleep(self.behavior.metadata_delay).await;
        }
        self.ensure_live()?;
        self.metadata_loaded.store(true, Ordering::SeqCst);
        Ok(self.native_dimensions())
    }

    async fn play(&self) -> Result<(), PlatformMediaError> {
        self.ensure_live()?;
        if let Some(error) = &self.behavior.play_error {
            return Err(error.clone());
        }
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn grab_frame(&self) -> Result<RawFrame, PlatformMediaError> {
        self.ensure_live()?;
        Ok(RawFrame {
            captured_at: Instant::now(),
            ..self.frame.clone()
        })
    }

    fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.playing.store(false, Ordering::SeqCst);
            self.stats.open.fetch_sub(1, Ordering::SeqCst);
            debug!(stream = %self.id, "Virtual stream stopped");
        }
    }
}
