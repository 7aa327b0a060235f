//! Integration tests for likesync-spotify
//!
//! Uses wiremock to simulate the Spotify Web API and verifies paging,
//! request shape and HTTP error mapping of the SpotifyLikedSource.

mod common;

mod test_errors;
mod test_saved_tracks;
