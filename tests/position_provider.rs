// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for location fix acquisition

mod common;

use geostamp::backends::location::{
    FixState, PlatformFix, PositionProvider, PositionReading, StaticLocation,
};
use geostamp::errors::{ErrorKind, PlatformLocationError};
use std::sync::Arc;
use std::time::Duration;

fn provider(service: &Arc<StaticLocation>) -> Arc<PositionProvider> {
    Arc::new(PositionProvider::new(service.clone()))
}

#[tokio::test]
async fn test_fix_is_fully_populated() {
    let service = Arc::new(StaticLocation::new(common::san_francisco()));
    let provider = provider(&service);

    let fix = provider.request_fix().await.unwrap();

    assert_eq!(fix.latitude(), 37.7749);
    assert_eq!(fix.longitude(), -122.4194);
    assert_eq!(fix.accuracy_meters(), 5.0);
    assert_eq!(fix.captured_at_epoch_ms(), common::CAPTURE_TIME_MS);
    assert_eq!(provider.state(), FixState::Ready(fix));
}

#[tokio::test]
async fn test_missing_accuracy_becomes_zero() {
    let service = Arc::new(StaticLocation::from_platform_fix(PlatformFix {
        latitude: 1.5,
        longitude: 2.5,
        accuracy: None,
        timestamp_ms: 0,
    }));

    let fix = provider(&service).request_fix().await.unwrap();
    assert_eq!(fix.accuracy_meters(), 0.0);
}

#[tokio::test]
async fn test_requests_fresh_high_accuracy_fix() {
    let service = Arc::new(StaticLocation::new(common::san_francisco()));
    let provider = Arc::new(
        PositionProvider::new(service.clone()).with_timeout(Duration::from_secs(3)),
    );

    provider.request_fix().await.unwrap();

    let options = service.last_options().unwrap();
    assert!(options.high_accuracy);
    assert_eq!(options.maximum_age, Duration::ZERO, "Cached fixes must not be used");
    assert_eq!(options.timeout, Duration::from_secs(3));
}

#[tokio::test]
async fn test_platform_codes_are_classified() {
    let cases = [
        (PlatformLocationError::PERMISSION_DENIED, ErrorKind::PermissionDenied),
        (PlatformLocationError::POSITION_UNAVAILABLE, ErrorKind::Unavailable),
        (PlatformLocationError::TIMEOUT, ErrorKind::Timeout),
        (42, ErrorKind::Unknown),
    ];

    for (code, expected) in cases {
        let service = Arc::new(StaticLocation::failing(PlatformLocationError::new(
            code, "platform failure",
        )));
        let provider = provider(&service);

        let err = provider.request_fix().await.unwrap_err();
        assert_eq!(err.kind, expected, "code {}", code);
        assert_eq!(provider.state(), FixState::Failed(err));
    }
}

#[tokio::test]
async fn test_unsupported_platform_never_called() {
    let service = Arc::new(StaticLocation::unsupported());

    let err = provider(&service).request_fix().await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Unsupported);
    assert_eq!(service.request_count(), 0);
}

#[tokio::test]
async fn test_slow_platform_times_out() {
    let service = Arc::new(
        StaticLocation::new(common::san_francisco()).with_delay(Duration::from_secs(5)),
    );
    let provider = PositionProvider::new(service.clone()).with_timeout(Duration::from_millis(20));

    let err = provider.request_fix().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Timeout);
}

#[tokio::test]
async fn test_invalid_platform_coordinates_are_rejected() {
    let service = Arc::new(StaticLocation::from_platform_fix(PlatformFix {
        latitude: 123.0,
        longitude: 0.0,
        accuracy: Some(1.0),
        timestamp_ms: 0,
    }));

    let err = provider(&service).request_fix().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unknown);
}

#[tokio::test]
async fn test_background_request_publishes_state() {
    let service = Arc::new(StaticLocation::new(common::san_francisco()));
    let provider = provider(&service);

    let mut state = provider.request_location();
    let ready = state
        .wait_for(|s| s.reading().is_some() || s.error().is_some())
        .await
        .unwrap()
        .clone();

    assert_eq!(ready.reading(), Some(&common::san_francisco()));
}

#[tokio::test]
async fn test_newer_request_owns_visible_state() {
    let service = Arc::new(
        StaticLocation::new(common::san_francisco()).with_delay(Duration::from_millis(300)),
    );
    service.push_error(PlatformLocationError::new(
        PlatformLocationError::PERMISSION_DENIED,
        "denied",
    ));
    let provider = provider(&service);

    let first = tokio::spawn({
        let provider = provider.clone();
        async move { provider.request_fix().await }
    });
    tokio::time::sleep(Duration::from_millis(150)).await;
    let second = tokio::spawn({
        let provider = provider.clone();
        async move { provider.request_fix().await }
    });

    // The first caller still gets its own outcome...
    let first = first.await.unwrap().unwrap_err();
    assert_eq!(first.kind, ErrorKind::PermissionDenied);
    // ...but it is not published over the newer pending request
    assert!(provider.state().is_pending());

    let second: PositionReading = second.await.unwrap().unwrap();
    assert_eq!(provider.state(), FixState::Ready(second));
}
