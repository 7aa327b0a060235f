//! Shared test helpers for Spotify Web API integration tests
//!
//! Each helper mounts mock endpoints on a wiremock server and returns a
//! source pointing at it.

use std::time::Duration;

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use likesync_spotify::{SpotifyClient, SpotifyLikedSource};

pub const TEST_TOKEN: &str = "test-access-token";

/// Starts a mock server and returns it with a source bound to it
pub async fn setup_spotify_mock() -> (MockServer, SpotifyLikedSource) {
    let server = MockServer::start().await;
    let client = SpotifyClient::with_base_url(TEST_TOKEN, server.uri())
        .with_timeout(Duration::from_millis(500));
    (server, SpotifyLikedSource::new(client))
}

/// Builds a saved-track object as returned inside `items`
pub fn saved_track(id: &str, name: &str, artists: &[&str], added_at: &str) -> serde_json::Value {
    let artists: Vec<serde_json::Value> = artists
        .iter()
        .map(|a| serde_json::json!({"name": a}))
        .collect();

    serde_json::json!({
        "added_at": added_at,
        "track": {
            "id": id,
            "name": name,
            "artists": artists,
            "album": {
                "name": format!("{} (album)", name),
                "images": [{"url": format!("https://i.scdn.co/{}.jpg", id)}]
            },
            "preview_url": null,
            "duration_ms": 180000,
            "external_urls": {"spotify": format!("https://open.spotify.com/track/{}", id)}
        }
    })
}

/// Mounts one `/me/tracks` page answering the given offset/limit
pub async fn mount_saved_tracks_page(
    server: &MockServer,
    offset: u32,
    limit: u32,
    items: Vec<serde_json::Value>,
    has_next: bool,
) {
    let next = has_next.then(|| {
        format!(
            "{}/me/tracks?offset={}&limit={}",
            server.uri(),
            offset + limit,
            limit
        )
    });

    Mock::given(method("GET"))
        .and(path("/me/tracks"))
        .and(query_param("offset", offset.to_string()))
        .and(query_param("limit", limit.to_string()))
        .and(header("authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "href": format!("{}/me/tracks", server.uri()),
            "items": items,
            "limit": limit,
            "offset": offset,
            "next": next,
            "total": 2
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// Mounts `/me/tracks` answering every request with the given template
pub async fn mount_saved_tracks_response(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/me/tracks"))
        .respond_with(response)
        .mount(server)
        .await;
}
