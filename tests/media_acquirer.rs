// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for camera stream negotiation

mod common;

use geostamp::backends::camera::types::{FacingMode, Resolution, StreamConstraints};
use geostamp::backends::camera::{MediaAcquirer, SecurityContext};
use geostamp::backends::virtual_camera::VirtualCamera;
use geostamp::cancellation::CancelToken;
use geostamp::errors::{ErrorKind, PlatformMediaError};
use std::sync::Arc;

const IDEAL: Option<Resolution> = Some(Resolution::new(1920, 1080));

fn rear() -> StreamConstraints {
    StreamConstraints::new(Some(FacingMode::Environment), IDEAL)
}

fn front() -> StreamConstraints {
    StreamConstraints::new(Some(FacingMode::User), IDEAL)
}

fn acquirer(camera: &Arc<VirtualCamera>) -> MediaAcquirer {
    MediaAcquirer::new(camera.clone())
}

#[tokio::test]
async fn test_rear_camera_first() {
    let camera = Arc::new(common::camera(64, 48));
    let handle = acquirer(&camera).acquire(&CancelToken::new()).await.unwrap();

    assert_eq!(camera.requested_constraints(), vec![rear()]);
    assert!(handle.stream().active_video_tracks() >= 1);
    assert_eq!(camera.open_streams(), 1);

    handle.release();
    assert_eq!(camera.open_streams(), 0);
}

#[tokio::test]
async fn test_permission_denied_stops_ladder() {
    let camera = Arc::new(common::camera(64, 48));
    camera.push_error(PlatformMediaError::not_allowed());

    let err = acquirer(&camera).acquire(&CancelToken::new()).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::PermissionDenied);
    assert_eq!(camera.request_count(), 1, "No further rung after a denial");
    assert_eq!(camera.open_streams(), 0);
}

#[tokio::test]
async fn test_device_busy_skips_front_camera() {
    let camera = Arc::new(common::camera(64, 48));
    camera.push_error(PlatformMediaError::not_readable());

    let err = acquirer(&camera).acquire(&CancelToken::new()).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::DeviceBusy);
    assert_eq!(camera.requested_constraints(), vec![rear()]);
}

#[tokio::test]
async fn test_no_camera_is_device_not_found() {
    let camera = Arc::new(common::camera(64, 48).with_facings(Vec::new()));

    let err = acquirer(&camera).acquire(&CancelToken::new()).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::DeviceNotFound);
    assert_eq!(camera.request_count(), 1);
}

#[tokio::test]
async fn test_front_only_device_falls_back() {
    let camera = Arc::new(common::camera(64, 48).with_facings(vec![FacingMode::User]));

    let handle = acquirer(&camera).acquire(&CancelToken::new()).await.unwrap();

    assert_eq!(camera.requested_constraints(), vec![rear(), front()]);
    assert!(handle.id().ends_with("user"), "got {}", handle.id());
    handle.release();
}

#[tokio::test]
async fn test_baseline_rung_is_last_resort() {
    // Device refuses any ideal resolution, only plain { video: true } works
    let camera = Arc::new(common::camera(64, 48).rejecting_ideal_resolution());

    let handle = acquirer(&camera).acquire(&CancelToken::new()).await.unwrap();

    let requested = camera.requested_constraints();
    assert_eq!(requested.len(), 4);
    assert_eq!(requested[2], StreamConstraints::new(None, IDEAL));
    assert!(requested[3].is_baseline());
    handle.release();
    assert_eq!(camera.open_streams(), 0);
}

#[tokio::test]
async fn test_every_rung_unsatisfiable_surfaces_last_error() {
    let camera = Arc::new(common::camera(64, 48));
    for _ in 0..4 {
        camera.push_error(PlatformMediaError::overconstrained("width"));
    }

    let err = acquirer(&camera).acquire(&CancelToken::new()).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::ConstraintUnsatisfiable);
    assert_eq!(camera.request_count(), 4);
}

#[tokio::test]
async fn test_baseline_rung_failure_is_classified_on_its_own() {
    let camera = Arc::new(common::camera(64, 48));
    for _ in 0..3 {
        camera.push_error(PlatformMediaError::overconstrained("width"));
    }
    camera.push_error(PlatformMediaError::not_found());

    let err = acquirer(&camera).acquire(&CancelToken::new()).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::DeviceNotFound);
    assert_eq!(camera.request_count(), 4);
    assert_eq!(
        camera.requested_constraints().last(),
        Some(&StreamConstraints::BASELINE)
    );
    assert_eq!(camera.open_streams(), 0);
}

#[tokio::test]
async fn test_denial_on_later_rung_is_surfaced() {
    let camera = Arc::new(common::camera(64, 48));
    camera.push_error(PlatformMediaError::overconstrained("facingMode"));
    camera.push_error(PlatformMediaError::not_allowed());

    let err = acquirer(&camera).acquire(&CancelToken::new()).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::PermissionDenied);
    assert_eq!(camera.requested_constraints(), vec![rear(), front()]);
}

#[tokio::test]
async fn test_insecure_context_fails_before_any_request() {
    let camera = Arc::new(
        common::camera(64, 48)
            .with_security_context(SecurityContext::from_origin("http://example.com", false)),
    );

    let err = acquirer(&camera).acquire(&CancelToken::new()).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::ContextInsecure);
    assert_eq!(camera.request_count(), 0);
}

#[tokio::test]
async fn test_localhost_over_http_is_allowed() {
    let camera = Arc::new(
        common::camera(64, 48)
            .with_security_context(SecurityContext::from_origin("http://localhost:3000", false)),
    );

    let handle = acquirer(&camera).acquire(&CancelToken::new()).await.unwrap();
    handle.release();
}

#[tokio::test]
async fn test_unsupported_platform() {
    let camera = Arc::new(common::camera(64, 48).unsupported());

    let err = acquirer(&camera).acquire(&CancelToken::new()).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Unsupported);
    assert_eq!(camera.request_count(), 0);
}

#[tokio::test]
async fn test_every_call_restarts_at_rear() {
    let camera = Arc::new(common::camera(64, 48).with_facings(vec![FacingMode::User]));
    let acquirer = acquirer(&camera);

    acquirer.acquire(&CancelToken::new()).await.unwrap().release();
    acquirer.acquire(&CancelToken::new()).await.unwrap().release();

    assert_eq!(
        camera.requested_constraints(),
        vec![rear(), front(), rear(), front()]
    );
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let camera = Arc::new(common::camera(64, 48));
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = acquirer(&camera).acquire(&cancel).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Cancelled);
    assert_eq!(camera.request_count(), 0);
}
