// SPDX-License-Identifier: GPL-3.0-only

//! Platform collaborators for location and camera access
//!
//! The capture core never touches a platform API directly. It talks to the
//! traits defined here, and each implementation translates its own failures
//! into [`ErrorKind`](crate::errors::ErrorKind) before they cross the boundary.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            CapturePipeline / UI              │
//! └──────────┬──────────────────────┬───────────┘
//!            │                      │
//! ┌──────────┴─────────┐  ┌─────────┴───────────┐
//! │  PositionProvider  │  │    MediaAcquirer     │
//! │ (LocationService)  │  │   (MediaService)     │
//! └────────────────────┘  └─────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`location`]: Single-fix position requests and their state
//! - [`camera`]: Stream negotiation with the constraint fallback ladder
//! - [`virtual_camera`]: In-process camera that serves a still image

pub mod camera;
pub mod location;
pub mod virtual_camera;
