//! Saved tracks (`GET /me/tracks`)
//!
//! Response types for the user's library listing and the parser that turns
//! them into the port-level [`LikedPage`]. Every field Spotify may omit or
//! null out is optional here; deciding what to do with missing data is the
//! engine's job.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::debug;

use likesync_core::ports::{LikedPage, RawTrackEntry, SourceError};

use crate::client::SpotifyClient;

/// Saved tracks endpoint path
pub const SAVED_TRACKS_PATH: &str = "/me/tracks";

// ============================================================================
// Spotify response types
// ============================================================================

/// Paging object returned by `GET /me/tracks`
#[derive(Debug, Deserialize)]
pub struct SavedTracksResponse {
    #[serde(default)]
    items: Vec<SavedTrackItem>,
    /// URL of the next page; null on the last page
    next: Option<String>,
    total: Option<u64>,
}

/// One saved-track object
#[derive(Debug, Deserialize)]
struct SavedTrackItem {
    added_at: Option<String>,
    /// Null for tracks that are no longer available
    track: Option<TrackObject>,
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    id: Option<String>,
    name: Option<String>,
    artists: Option<Vec<ArtistObject>>,
    album: Option<AlbumObject>,
    preview_url: Option<String>,
    duration_ms: Option<u64>,
    external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Deserialize)]
struct ArtistObject {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlbumObject {
    name: Option<String>,
    images: Option<Vec<ImageObject>>,
}

#[derive(Debug, Deserialize)]
struct ImageObject {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

// ============================================================================
// Parsing
// ============================================================================

/// Converts a raw `/me/tracks` response into a [`LikedPage`]
///
/// `has_more` follows the presence of `next`. Items whose track object is
/// null are kept as entries without an id so the caller can count them.
pub fn parse_saved_tracks(response: SavedTracksResponse) -> LikedPage {
    let items = response.items.into_iter().map(parse_item).collect();

    LikedPage {
        items,
        has_more: response.next.is_some(),
        total: response.total,
    }
}

fn parse_item(item: SavedTrackItem) -> RawTrackEntry {
    let added_at = item.added_at.as_deref().and_then(parse_added_at);

    let Some(track) = item.track else {
        return RawTrackEntry {
            added_at,
            ..RawTrackEntry::default()
        };
    };

    let artists = track
        .artists
        .unwrap_or_default()
        .into_iter()
        .filter_map(|a| a.name)
        .collect();

    let (album_name, images) = match track.album {
        Some(album) => (
            album.name,
            album
                .images
                .unwrap_or_default()
                .into_iter()
                .filter_map(|i| i.url)
                .collect(),
        ),
        None => (None, Vec::new()),
    };

    RawTrackEntry {
        id: track.id,
        name: track.name,
        artists,
        album_name,
        images,
        preview_url: track.preview_url,
        duration_ms: track.duration_ms,
        external_url: track.external_urls.and_then(|u| u.spotify),
        added_at,
    }
}

/// Parses `added_at`, accepting RFC 3339 or a bare date (midnight UTC)
fn parse_added_at(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => date.and_hms_opt(0, 0, 0).map(|ndt| ndt.and_utc()),
        Err(_) => {
            debug!(value, "Ignoring unparseable added_at");
            None
        }
    }
}

// ============================================================================
// Endpoint
// ============================================================================

impl SpotifyClient {
    /// Fetches one page of the user's saved tracks
    ///
    /// # Arguments
    /// * `offset` - Index of the first item to return
    /// * `limit` - Maximum number of items (Spotify caps this at 50)
    ///
    /// # Errors
    ///
    /// See [`SpotifyClient::get_json`].
    pub async fn get_saved_tracks(&self, offset: u32, limit: u32) -> Result<LikedPage, SourceError> {
        let query = [("offset", offset.to_string()), ("limit", limit.to_string())];
        let response: SavedTracksResponse = self.get_json(SAVED_TRACKS_PATH, &query).await?;
        Ok(parse_saved_tracks(response))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse(json: serde_json::Value) -> LikedPage {
        let response: SavedTracksResponse = serde_json::from_value(json).unwrap();
        parse_saved_tracks(response)
    }

    #[test]
    fn test_parse_full_item() {
        let page = parse(serde_json::json!({
            "items": [{
                "added_at": "2024-01-01T10:30:00Z",
                "track": {
                    "id": "t1",
                    "name": "Song A",
                    "artists": [{"name": "X"}, {"name": "Y"}],
                    "album": {
                        "name": "Album A",
                        "images": [
                            {"url": "https://i.scdn.co/large.jpg", "width": 640},
                            {"url": "https://i.scdn.co/small.jpg", "width": 64}
                        ]
                    },
                    "preview_url": "https://p.scdn.co/preview",
                    "duration_ms": 201000,
                    "external_urls": {"spotify": "https://open.spotify.com/track/t1"}
                }
            }],
            "next": "https://api.spotify.com/v1/me/tracks?offset=50&limit=50",
            "total": 120
        }));

        assert!(page.has_more);
        assert_eq!(page.total, Some(120));
        assert_eq!(page.items.len(), 1);

        let entry = &page.items[0];
        assert_eq!(entry.id.as_deref(), Some("t1"));
        assert_eq!(entry.name.as_deref(), Some("Song A"));
        assert_eq!(entry.artists, vec!["X", "Y"]);
        assert_eq!(entry.album_name.as_deref(), Some("Album A"));
        assert_eq!(entry.images[0], "https://i.scdn.co/large.jpg");
        assert_eq!(entry.preview_url.as_deref(), Some("https://p.scdn.co/preview"));
        assert_eq!(entry.duration_ms, Some(201_000));
        assert_eq!(
            entry.external_url.as_deref(),
            Some("https://open.spotify.com/track/t1")
        );
        assert_eq!(
            entry.added_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_last_page_has_no_more() {
        let page = parse(serde_json::json!({"items": [], "next": null, "total": 0}));
        assert!(!page.has_more);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_parse_sparse_item() {
        let page = parse(serde_json::json!({
            "items": [{
                "added_at": "2024-01-02",
                "track": {
                    "id": "t2",
                    "name": "Song B",
                    "artists": [],
                    "album": null,
                    "preview_url": null
                }
            }],
            "next": null
        }));

        let entry = &page.items[0];
        assert_eq!(entry.id.as_deref(), Some("t2"));
        assert!(entry.artists.is_empty());
        assert!(entry.album_name.is_none());
        assert!(entry.images.is_empty());
        assert!(entry.duration_ms.is_none());
        assert!(entry.external_url.is_none());
        assert_eq!(
            entry.added_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(page.total, None);
    }

    #[test]
    fn test_parse_null_track_yields_entry_without_id() {
        let page = parse(serde_json::json!({
            "items": [{"added_at": "2024-01-01T00:00:00Z", "track": null}],
            "next": null
        }));

        assert_eq!(page.items.len(), 1);
        assert!(page.items[0].id.is_none());
    }

    #[test]
    fn test_parse_added_at_rejects_garbage() {
        assert_eq!(parse_added_at("last tuesday"), None);
    }
}
