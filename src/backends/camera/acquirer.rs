// SPDX-License-Identifier: GPL-3.0-only

//! Camera stream negotiation
//!
//! The acquirer checks platform preconditions, then walks a static ladder of
//! constraint sets from most to least specific. Only an unsatisfiable
//! constraint lets it move to the next rung; permission, device and busy
//! failures end the walk at once because a looser request cannot fix them.

use super::types::{FacingMode, MediaStreamHandle, Resolution, StreamConstraints};
use super::MediaService;
use crate::cancellation::CancelToken;
use crate::constants::{IDEAL_HEIGHT, IDEAL_WIDTH};
use crate::errors::{CaptureResult, ErrorDescriptor, ErrorKind};
use std::sync::Arc;
use tracing::{debug, info, warn};

const IDEAL: Option<Resolution> = Some(Resolution::new(IDEAL_WIDTH, IDEAL_HEIGHT));

/// One entry of the fallback ladder
#[derive(Debug, Clone, Copy)]
pub struct Rung {
    pub name: &'static str,
    pub constraints: StreamConstraints,
    /// Whether a failure of this kind lets the walk continue to the next rung
    pub falls_through: fn(ErrorKind) -> bool,
}

fn on_unsatisfiable(kind: ErrorKind) -> bool {
    kind == ErrorKind::ConstraintUnsatisfiable
}

fn never(_: ErrorKind) -> bool {
    false
}

/// Rear camera, front camera, any camera, then a bare `{ video: true }`
pub const FALLBACK_LADDER: [Rung; 4] = [
    Rung {
        name: "rear",
        constraints: StreamConstraints::new(Some(FacingMode::Environment), IDEAL),
        falls_through: on_unsatisfiable,
    },
    Rung {
        name: "front",
        constraints: StreamConstraints::new(Some(FacingMode::User), IDEAL),
        falls_through: on_unsatisfiable,
    },
    Rung {
        name: "any",
        constraints: StreamConstraints::new(None, IDEAL),
        falls_through: on_unsatisfiable,
    },
    Rung {
        name: "baseline",
        constraints: StreamConstraints::BASELINE,
        falls_through: never,
    },
];

#[derive(Clone)]
pub struct MediaAcquirer {
    service: Arc<dyn MediaService>,
}

impl MediaAcquirer {
    pub fn new(service: Arc<dyn MediaService>) -> Self {
        Self { service }
    }

    /// Negotiate a stream, starting from the first rung every time
    pub async fn acquire(&self, cancel: &CancelToken) -> CaptureResult<MediaStreamHandle> {
        self.check_preconditions()?;

        let [relaxable @ .., baseline] = &FALLBACK_LADDER;
        for (index, rung) in relaxable.iter().enumerate() {
            match self.request(rung, index + 1, cancel).await {
                Err(error) if (rung.falls_through)(error.kind) => {
                    warn!(rung = rung.name, error = %error, "Constraints rejected, relaxing");
                }
                outcome => return outcome,
            }
        }
        self.request(baseline, FALLBACK_LADDER.len(), cancel).await
    }

    /// One attempt with a single rung's constraints
    async fn request(
        &self,
        rung: &Rung,
        attempt: usize,
        cancel: &CancelToken,
    ) -> CaptureResult<MediaStreamHandle> {
        if cancel.is_cancelled() {
            return Err(ErrorDescriptor::cancelled());
        }

        debug!(rung = rung.name, constraints = %rung.constraints, "Requesting camera stream");

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ErrorDescriptor::cancelled()),
            outcome = self.service.request_video_stream(&rung.constraints) => outcome,
        };

        let stream = outcome.map_err(|platform| {
            let error = ErrorDescriptor::from(platform);
            info!(rung = rung.name, kind = %error.kind, "Camera request failed");
            error
        })?;

        let handle = MediaStreamHandle::new(stream);
        if handle.stream().active_video_tracks() == 0 {
            handle.release();
            return Err(ErrorDescriptor::unavailable(
                "camera stream has no active video track",
            ));
        }
        info!(
            rung = rung.name,
            attempt,
            stream = %handle.id(),
            "Camera stream acquired"
        );
        Ok(handle)
    }

    /// Hard preconditions, checked before any permission prompt
    fn check_preconditions(&self) -> CaptureResult<()> {
        if !self.service.supports_capture() {
            return Err(ErrorDescriptor::unsupported(
                "media capture is not available on this platform",
            ));
        }
        let context = self.service.security_context();
        if !context.is_trusted() {
            warn!(scheme = %context.scheme, host = %context.host, "Refusing camera access from insecure context");
            return Err(ErrorDescriptor::new(
                ErrorKind::ContextInsecure,
                format!(
                    "camera access requires HTTPS or a local origin (got {}://{})",
                    context.scheme, context.host
                ),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for MediaAcquirer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaAcquirer").finish_non_exhaustive()
    }
}
