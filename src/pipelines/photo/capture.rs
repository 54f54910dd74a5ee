// SPDX-License-Identifier: GPL-3.0-only

//! Still-frame capture from a primed stream
//!
//! This module grabs exactly one frame at the stream's native resolution.
//! There is no retry: either a complete frame comes back or the call fails.

use crate::backends::camera::types::{MediaStreamHandle, RawFrame};
use crate::errors::{CaptureResult, ErrorDescriptor};
use tracing::debug;

/// Frame capture handler
pub struct FrameCapturer;

impl FrameCapturer {
    /// Capture the current frame of a stream that is already playing
    ///
    /// # Returns
    /// * `Ok(RawFrame)` - Tightly packed RGBA frame at native resolution
    /// * `Err(ErrorDescriptor)` - `Unavailable` when the stream has no known
    ///   size yet, otherwise the classified platform failure
    pub fn capture(handle: &MediaStreamHandle) -> CaptureResult<RawFrame> {
        let stream = handle.stream();
        let dimensions = stream.dimensions();
        if !dimensions.is_known() {
            return Err(ErrorDescriptor::unavailable(format!(
                "stream {} has no video dimensions yet",
                handle.id()
            )));
        }

        let frame = stream.grab_frame().map_err(ErrorDescriptor::from)?;

        if frame.width != dimensions.width || frame.height != dimensions.height {
            return Err(ErrorDescriptor::unknown(format!(
                "captured frame is {}x{} but the stream reports {}",
                frame.width, frame.height, dimensions
            )));
        }
        if !frame.is_well_formed() {
            return Err(ErrorDescriptor::unknown(format!(
                "captured frame is incomplete: {} bytes for {}",
                frame.data.len(),
                dimensions
            )));
        }

        debug!(
            width = frame.width,
            height = frame.height,
            stream = %handle.id(),
            "Frame captured from stream"
        );

        Ok(frame)
    }
}
