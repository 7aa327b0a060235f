//! Saved tracks paging tests

use chrono::{TimeZone, Utc};

use likesync_core::ports::ILikedTrackSource;

use crate::common::{mount_saved_tracks_page, saved_track, setup_spotify_mock};

#[tokio::test]
async fn test_fetch_first_page_with_more() {
    let (server, source) = setup_spotify_mock().await;
    mount_saved_tracks_page(
        &server,
        0,
        1,
        vec![saved_track("t1", "Song A", &["X"], "2024-01-01T00:00:00Z")],
        true,
    )
    .await;

    let page = source.fetch_liked_page(0, 1).await.unwrap();

    assert!(page.has_more);
    assert_eq!(page.total, Some(2));
    assert_eq!(page.items.len(), 1);

    let entry = &page.items[0];
    assert_eq!(entry.id.as_deref(), Some("t1"));
    assert_eq!(entry.artists, vec!["X"]);
    assert_eq!(entry.album_name.as_deref(), Some("Song A (album)"));
    assert_eq!(entry.images, vec!["https://i.scdn.co/t1.jpg"]);
    assert_eq!(entry.preview_url, None);
    assert_eq!(entry.duration_ms, Some(180_000));
    assert_eq!(
        entry.added_at,
        Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn test_fetch_two_pages_by_offset() {
    let (server, source) = setup_spotify_mock().await;
    mount_saved_tracks_page(
        &server,
        0,
        1,
        vec![saved_track("t1", "Song A", &["X"], "2024-01-01T00:00:00Z")],
        true,
    )
    .await;
    mount_saved_tracks_page(
        &server,
        1,
        1,
        vec![saved_track("t2", "Song B", &[], "2024-01-02T00:00:00Z")],
        false,
    )
    .await;

    let first = source.fetch_liked_page(0, 1).await.unwrap();
    let second = source.fetch_liked_page(1, 1).await.unwrap();

    assert!(first.has_more);
    assert!(!second.has_more);
    assert_eq!(second.items[0].id.as_deref(), Some("t2"));
    assert!(second.items[0].artists.is_empty());

    server.verify().await;
}
