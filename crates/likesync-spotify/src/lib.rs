//! likesync Spotify - Spotify Web API client
//!
//! Provides an async client for:
//! - Listing the current user's saved ("liked") tracks, one page at a time
//! - Mapping HTTP failures onto the transient/permanent [`SourceError`] taxonomy
//!
//! ## Modules
//!
//! - [`client`] - Authenticated HTTP client and status mapping
//! - [`saved_tracks`] - `/me/tracks` response types and parsing
//! - [`provider`] - [`ILikedTrackSource`] implementation
//!
//! The bearer token is supplied by the caller; this crate never refreshes
//! or stores credentials.
//!
//! [`SourceError`]: likesync_core::ports::SourceError
//! [`ILikedTrackSource`]: likesync_core::ports::ILikedTrackSource

pub mod client;
pub mod provider;
pub mod saved_tracks;

pub use client::SpotifyClient;
pub use provider::SpotifyLikedSource;
