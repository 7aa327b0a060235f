//! Track store port (driven/secondary port)
//!
//! This module defines the interface for persisting and querying
//! [`TrackSnapshot`]s.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   (SQLite, in-memory, ...) and the engine treats all of them the same way:
//!   the run fails.
//! - Snapshots are never deleted through this port; retraction only flips
//!   the liked flag.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::domain::{RemoteTrackId, TrackSnapshot};

/// Filter criteria for listing snapshots
#[derive(Debug, Clone, Default)]
pub struct TrackFilter {
    /// When true, only currently liked snapshots are returned
    pub liked_only: bool,
    /// Maximum number of snapshots to return (None = no limit)
    pub limit: Option<u32>,
}

impl TrackFilter {
    /// Creates a new empty filter (matches all snapshots)
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the listing to currently liked snapshots
    pub fn liked_only(mut self) -> Self {
        self.liked_only = true;
        self
    }

    /// Caps the number of returned snapshots
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Port trait for track snapshot storage
#[async_trait::async_trait]
pub trait ITrackStore: Send + Sync {
    /// Looks up a snapshot by its remote identifier
    async fn find_by_remote_id(
        &self,
        remote_id: &RemoteTrackId,
    ) -> anyhow::Result<Option<TrackSnapshot>>;

    /// Inserts a new snapshot
    ///
    /// Fails if a snapshot with the same remote id already exists.
    async fn insert_track(&self, track: &TrackSnapshot) -> anyhow::Result<()>;

    /// Overwrites an existing snapshot
    ///
    /// Fails if no snapshot with that remote id exists.
    async fn update_track(&self, track: &TrackSnapshot) -> anyhow::Result<()>;

    /// Retracts every liked snapshot whose id is not in `seen`
    ///
    /// Sets `is_currently_liked = false` and `updated_at = now` on the
    /// affected rows in one bulk operation and returns how many rows changed.
    async fn mark_unliked_except(
        &self,
        seen: &HashSet<RemoteTrackId>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<u64>;

    /// Lists snapshots, most recently liked first
    async fn list_tracks(&self, filter: &TrackFilter) -> anyhow::Result<Vec<TrackSnapshot>>;

    /// Counts snapshots currently flagged as liked
    async fn count_liked(&self) -> anyhow::Result<u64>;
}
