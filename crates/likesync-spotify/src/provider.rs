//! SpotifyLikedSource - ILikedTrackSource implementation for the Spotify Web API
//!
//! Wraps the [`SpotifyClient`] and delegates to the saved tracks endpoint to
//! fulfil the [`ILikedTrackSource`] port contract.

use likesync_core::ports::{ILikedTrackSource, LikedPage, SourceError};
use tracing::debug;

use crate::client::SpotifyClient;

/// Remote liked-track source backed by the user's Spotify library
pub struct SpotifyLikedSource {
    client: SpotifyClient,
}

impl SpotifyLikedSource {
    /// Creates a new source around an authenticated client
    pub fn new(client: SpotifyClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client
    pub fn client(&self) -> &SpotifyClient {
        &self.client
    }
}

#[async_trait::async_trait]
impl ILikedTrackSource for SpotifyLikedSource {
    async fn fetch_liked_page(&self, offset: u32, limit: u32) -> Result<LikedPage, SourceError> {
        debug!(offset, limit, "Fetching saved tracks page");
        let page = self.client.get_saved_tracks(offset, limit).await?;
        debug!(
            offset,
            items = page.items.len(),
            has_more = page.has_more,
            "Received saved tracks page"
        );
        Ok(page)
    }
}
