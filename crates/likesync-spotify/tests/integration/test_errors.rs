//! HTTP error mapping tests

use std::time::Duration;

use wiremock::ResponseTemplate;

use likesync_core::domain::FailureKind;
use likesync_core::ports::{ILikedTrackSource, SourceError};

use crate::common::{mount_saved_tracks_response, setup_spotify_mock};

#[tokio::test]
async fn test_unauthorized_maps_to_transient_unauthorized() {
    let (server, source) = setup_spotify_mock().await;
    mount_saved_tracks_response(
        &server,
        ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {"status": 401, "message": "The access token expired"}
        })),
    )
    .await;

    let err = source.fetch_liked_page(0, 50).await.unwrap_err();

    match &err {
        SourceError::Unauthorized(message) => assert_eq!(message, "The access token expired"),
        other => panic!("Expected Unauthorized, got {other:?}"),
    }
    assert_eq!(err.kind(), FailureKind::Transient);
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let (server, source) = setup_spotify_mock().await;
    mount_saved_tracks_response(
        &server,
        ResponseTemplate::new(429).insert_header("Retry-After", "12"),
    )
    .await;

    let err = source.fetch_liked_page(0, 50).await.unwrap_err();

    assert!(matches!(
        err,
        SourceError::RateLimited {
            retry_after: Some(d)
        } if d == Duration::from_secs(12)
    ));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let (server, source) = setup_spotify_mock().await;
    mount_saved_tracks_response(&server, ResponseTemplate::new(503)).await;

    let err = source.fetch_liked_page(0, 50).await.unwrap_err();

    assert!(matches!(err, SourceError::Server { status: 503, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_forbidden_is_permanent() {
    let (server, source) = setup_spotify_mock().await;
    mount_saved_tracks_response(
        &server,
        ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "error": {"status": 403, "message": "Insufficient client scope"}
        })),
    )
    .await;

    let err = source.fetch_liked_page(0, 50).await.unwrap_err();

    match &err {
        SourceError::Rejected { status, message } => {
            assert_eq!(*status, 403);
            assert_eq!(message, "Insufficient client scope");
        }
        other => panic!("Expected Rejected, got {other:?}"),
    }
    assert_eq!(err.kind(), FailureKind::Permanent);
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let (server, source) = setup_spotify_mock().await;
    mount_saved_tracks_response(
        &server,
        ResponseTemplate::new(200).set_body_string("<html>not json</html>"),
    )
    .await;

    let err = source.fetch_liked_page(0, 50).await.unwrap_err();

    assert!(matches!(err, SourceError::InvalidResponse(_)));
    assert_eq!(err.kind(), FailureKind::Permanent);
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let (server, source) = setup_spotify_mock().await;
    mount_saved_tracks_response(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({"items": [], "next": null}))
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    let err = source.fetch_liked_page(0, 50).await.unwrap_err();

    assert!(matches!(err, SourceError::Timeout(d) if d == Duration::from_millis(500)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let (server, source) = setup_spotify_mock().await;
    drop(server);

    let err = source.fetch_liked_page(0, 50).await.unwrap_err();

    assert!(matches!(
        err,
        SourceError::Network(_) | SourceError::Timeout(_)
    ));
    assert!(err.is_transient());
}
