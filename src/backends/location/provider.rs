// SPDX-License-Identifier: GPL-3.0-only

//! One-shot position requests with observable state
//!
//! The provider never retries on its own. A failed request leaves the error in
//! [`FixState::Failed`] and the caller decides whether to ask again.

use super::{FixOptions, LocationService, PositionReading};
use crate::constants;
use crate::errors::{ErrorDescriptor, ErrorKind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Extra time granted to the platform before the provider's own guard fires,
/// so the platform's timeout is normally the one reported.
const TIMEOUT_GRACE: Duration = Duration::from_millis(250);

/// Observable state of the most recent request
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FixState {
    /// No request has been made yet
    #[default]
    Idle,
    /// A request is waiting on the platform
    Pending,
    /// The most recent request produced a fix
    Ready(PositionReading),
    /// The most recent request failed
    Failed(ErrorDescriptor),
}

impl FixState {
    pub fn is_pending(&self) -> bool {
        matches!(self, FixState::Pending)
    }

    pub fn reading(&self) -> Option<&PositionReading> {
        match self {
            FixState::Ready(reading) => Some(reading),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorDescriptor> {
        match self {
            FixState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

pub struct PositionProvider {
    service: Arc<dyn LocationService>,
    timeout: Duration,
    state: watch::Sender<FixState>,
    /// Incremented per request; only the newest request publishes its outcome
    generation: AtomicU64,
}

impl PositionProvider {
    pub fn new(service: Arc<dyn LocationService>) -> Self {
        let (state, _) = watch::channel(FixState::Idle);
        Self {
            service,
            timeout: constants::FIX_TIMEOUT,
            state,
            generation: AtomicU64::new(0),
        }
    }

    /// Override the bounded wait (10 s by default)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Snapshot of the current state
    pub fn state(&self) -> FixState {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<FixState> {
        self.state.subscribe()
    }

    /// Request a fresh fix and wait for it
    ///
    /// A second call while one is pending takes over the published state; the
    /// first call still returns its own outcome to its own caller.
    pub async fn request_fix(&self) -> Result<PositionReading, ErrorDescriptor> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.service.is_supported() {
            let err = ErrorDescriptor::unsupported("location services are not available");
            warn!(error = %err, "Location request rejected");
            self.publish(generation, FixState::Failed(err.clone()));
            return Err(err);
        }

        self.publish(generation, FixState::Pending);
        info!(timeout_ms = self.timeout.as_millis() as u64, "Requesting location fix");

        let options = FixOptions::fresh(self.timeout);
        let outcome = match tokio::time::timeout(
            self.timeout + TIMEOUT_GRACE,
            self.service.request_single_fix(options),
        )
        .await
        {
            Ok(Ok(fix)) => PositionReading::try_from(fix),
            Ok(Err(platform)) => Err(ErrorDescriptor::from(platform)),
            Err(_) => Err(ErrorDescriptor::timeout("location request timed out")),
        };

        match &outcome {
            Ok(reading) => {
                info!(
                    latitude = reading.latitude(),
                    longitude = reading.longitude(),
                    accuracy = reading.accuracy_meters(),
                    "Location fix acquired"
                );
                self.publish(generation, FixState::Ready(*reading));
            }
            Err(err) => {
                if err.kind == ErrorKind::Unknown {
                    warn!(error = %err, "Location request failed");
                } else {
                    info!(kind = %err.kind, "Location request failed");
                }
                self.publish(generation, FixState::Failed(err.clone()));
            }
        }

        outcome
    }

    /// Start a request in the background and return a subscription to it
    ///
    /// Must be called from within a tokio runtime.
    pub fn request_location(self: &Arc<Self>) -> watch::Receiver<FixState> {
        let receiver = self.subscribe();
        let provider = Arc::clone(self);
        tokio::spawn(async move {
            let _ = provider.request_fix().await;
        });
        receiver
    }

    /// Publish `state` unless a newer request has started
    ///
    /// The generation is compared while the channel is locked, so a request
    /// that starts concurrently always publishes after this one.
    fn publish(&self, generation: u64, state: FixState) {
        let published = self.state.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *current = state;
            true
        });
        if !published {
            debug!(generation, "Dropping outcome of superseded location request");
        }
    }
}

impl std::fmt::Debug for PositionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionProvider")
            .field("timeout", &self.timeout)
            .field("state", &*self.state.borrow())
            .finish()
    }
}
