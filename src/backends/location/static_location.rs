// SPDX-License-Identifier: GPL-3.0-only

//! Location service that answers with a configured fix
//!
//! Used when the position is known ahead of time (CLI, kiosks with a fixed
//! mount point) and as a scriptable stand-in for platform geolocation.

use super::{FixOptions, LocationService, PlatformFix, PositionReading};
use crate::errors::PlatformLocationError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

type Outcome = Result<PlatformFix, PlatformLocationError>;

pub struct StaticLocation {
    supported: bool,
    default_outcome: Outcome,
    /// One-off outcomes consumed before falling back to `default_outcome`
    scripted: Mutex<VecDeque<Outcome>>,
    delay: Duration,
    requests: AtomicUsize,
    last_options: Mutex<Option<FixOptions>>,
}

impl StaticLocation {
    /// Always answer with `reading`
    pub fn new(reading: PositionReading) -> Self {
        Self::with_outcome(Ok(PlatformFix {
            latitude: reading.latitude(),
            longitude: reading.longitude(),
            accuracy: Some(reading.accuracy_meters()),
            timestamp_ms: reading.captured_at_epoch_ms(),
        }))
    }

    /// Always answer with a raw platform fix (which may omit accuracy)
    pub fn from_platform_fix(fix: PlatformFix) -> Self {
        Self::with_outcome(Ok(fix))
    }

    /// Always fail with `error`
    pub fn failing(error: PlatformLocationError) -> Self {
        Self::with_outcome(Err(error))
    }

    /// A platform without any location capability
    pub fn unsupported() -> Self {
        let mut service = Self::with_outcome(Err(PlatformLocationError::new(
            0,
            "geolocation is not supported",
        )));
        service.supported = false;
        service
    }

    fn with_outcome(outcome: Outcome) -> Self {
        Self {
            supported: true,
            default_outcome: outcome,
            scripted: Mutex::new(VecDeque::new()),
            delay: Duration::ZERO,
            requests: AtomicUsize::new(0),
            last_options: Mutex::new(None),
        }
    }

    /// Answer only after `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue a one-off failure for the next request
    pub fn push_error(&self, error: PlatformLocationError) {
        self.scripted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Err(error));
    }

    /// Number of requests that reached this service
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Options of the most recent request
    pub fn last_options(&self) -> Option<FixOptions> {
        *self
            .last_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl LocationService for StaticLocation {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn request_single_fix(&self, options: FixOptions) -> Outcome {
        self.requests.fetch_add(1, Ordering::SeqCst);
        *self
            .last_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(options);

        let outcome = self
            .scripted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.default_outcome.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        outcome
    }
}
