// SPDX-License-Identifier: GPL-3.0-only

//! Location backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  PositionProvider   │  ← single request in view, pending/ready/error state
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ LocationService     │  ← platform geolocation (browser, OS, fixed)
//! └─────────────────────┘
//! ```

pub mod provider;
pub mod static_location;

pub use provider::{FixState, PositionProvider};
pub use static_location::StaticLocation;

use crate::errors::{ErrorDescriptor, PlatformLocationError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A fully populated geographic fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionReading {
    latitude: f64,
    longitude: f64,
    accuracy_meters: f64,
    captured_at_epoch_ms: i64,
}

impl PositionReading {
    /// Create a reading, rejecting coordinates outside the WGS84 ranges
    pub fn new(
        latitude: f64,
        longitude: f64,
        accuracy_meters: f64,
        captured_at_epoch_ms: i64,
    ) -> Result<Self, ErrorDescriptor> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ErrorDescriptor::unknown(format!(
                "latitude out of range: {}",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ErrorDescriptor::unknown(format!(
                "longitude out of range: {}",
                longitude
            )));
        }
        let accuracy_meters = if accuracy_meters.is_finite() && accuracy_meters >= 0.0 {
            accuracy_meters
        } else {
            0.0
        };
        Ok(Self {
            latitude,
            longitude,
            accuracy_meters,
            captured_at_epoch_ms,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn accuracy_meters(&self) -> f64 {
        self.accuracy_meters
    }

    pub fn captured_at_epoch_ms(&self) -> i64 {
        self.captured_at_epoch_ms
    }
}

/// Fix as reported by the platform, before validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Some platforms omit accuracy
    pub accuracy: Option<f64>,
    pub timestamp_ms: i64,
}

impl TryFrom<PlatformFix> for PositionReading {
    type Error = ErrorDescriptor;

    fn try_from(fix: PlatformFix) -> Result<Self, Self::Error> {
        PositionReading::new(
            fix.latitude,
            fix.longitude,
            fix.accuracy.unwrap_or(0.0),
            fix.timestamp_ms,
        )
    }
}

/// Options passed with every fix request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Maximum age of a cached fix the platform may return
    pub maximum_age: Duration,
}

impl FixOptions {
    /// Highest accuracy, bounded wait, never a cached fix
    pub fn fresh(timeout: Duration) -> Self {
        Self {
            high_accuracy: true,
            timeout,
            maximum_age: Duration::ZERO,
        }
    }
}

/// Platform geolocation capability
#[async_trait]
pub trait LocationService: Send + Sync {
    /// Whether the platform exposes a location-fix capability at all
    fn is_supported(&self) -> bool;

    /// Request one fix
    async fn request_single_fix(
        &self,
        options: FixOptions,
    ) -> Result<PlatformFix, PlatformLocationError>;
}
