//! TrackSnapshot domain entity
//!
//! A snapshot is the locally persisted view of one remote track: its
//! metadata as last fetched and whether it is currently liked. Snapshots are
//! keyed by [`RemoteTrackId`] and are never deleted by reconciliation; a track
//! that disappears from the remote listing is only flagged as not liked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::RemoteTrackId;

/// Artist name stored when the remote entry carries no artists
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Remote-derived, mutable fields of a track
///
/// Every field here is overwritten as a whole each time the track is seen
/// during a run (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Track title (may be empty when the remote omits it)
    pub title: String,
    /// Name of the first listed artist, or [`UNKNOWN_ARTIST`]
    pub artist_name: String,
    /// Album the track belongs to
    pub album_name: Option<String>,
    /// Album artwork URL (first image offered by the remote)
    pub artwork_url: Option<String>,
    /// Short audio preview URL
    pub preview_url: Option<String>,
    /// Link to the track on the remote service
    pub external_url: Option<String>,
    /// Track length in milliseconds
    pub duration_ms: Option<u64>,
}

impl TrackMetadata {
    /// Resolves the displayable artist from a remote artist list
    ///
    /// The first non-blank name wins; an empty list yields [`UNKNOWN_ARTIST`].
    pub fn primary_artist<I, S>(artists: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        artists
            .into_iter()
            .find_map(|name| {
                let name = name.as_ref().trim();
                (!name.is_empty()).then(|| name.to_string())
            })
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string())
    }
}

/// Locally persisted state of one remote track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSnapshot {
    remote_id: RemoteTrackId,
    metadata: TrackMetadata,
    is_currently_liked: bool,
    /// When the remote service recorded the like (not local write time)
    liked_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TrackSnapshot {
    /// Creates a snapshot for a track seen for the first time
    ///
    /// New snapshots are always liked.
    pub fn new_liked(
        remote_id: RemoteTrackId,
        metadata: TrackMetadata,
        liked_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            remote_id,
            metadata,
            is_currently_liked: true,
            liked_at,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds a snapshot from stored values
    pub fn from_parts(
        remote_id: RemoteTrackId,
        metadata: TrackMetadata,
        is_currently_liked: bool,
        liked_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            remote_id,
            metadata,
            is_currently_liked,
            liked_at,
            created_at,
            updated_at,
        }
    }

    // --- Getters ---

    pub fn remote_id(&self) -> &RemoteTrackId {
        &self.remote_id
    }

    pub fn metadata(&self) -> &TrackMetadata {
        &self.metadata
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    pub fn artist_name(&self) -> &str {
        &self.metadata.artist_name
    }

    pub fn is_currently_liked(&self) -> bool {
        self.is_currently_liked
    }

    pub fn liked_at(&self) -> Option<DateTime<Utc>> {
        self.liked_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // --- Mutations ---

    /// Overwrites the snapshot with freshly fetched remote values
    ///
    /// Forces the liked flag back on, replaces every metadata field and
    /// takes `liked_at` verbatim from the remote entry.
    pub fn apply_remote(
        &mut self,
        metadata: TrackMetadata,
        liked_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) {
        self.metadata = metadata;
        self.is_currently_liked = true;
        self.liked_at = liked_at;
        self.updated_at = now;
    }

    /// Flags the track as no longer liked on the remote service
    pub fn retract(&mut self, now: DateTime<Utc>) {
        if self.is_currently_liked {
            self.is_currently_liked = false;
            self.updated_at = now;
        }
    }
}
