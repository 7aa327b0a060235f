//! SQLite implementation of ITrackStore and ISyncRunLedger
//!
//! This module provides the concrete SQLite-based implementation of the
//! storage ports defined in likesync-core. It handles domain type
//! conversion and SQL query construction.
//!
//! ## Type Mapping
//!
//! | Domain Type     | SQL Type | Strategy                                          |
//! |-----------------|----------|---------------------------------------------------|
//! | RemoteTrackId   | TEXT     | String via `.as_str()` / `RemoteTrackId::new()`   |
//! | RunId           | TEXT     | UUID string via `.to_string()` / `FromStr`        |
//! | DateTime<Utc>   | TEXT     | RFC 3339, microseconds, `Z` suffix (sortable)     |
//! | RunStatus       | TEXT     | `.as_str()` / `FromStr`                           |
//! | FailureKind     | TEXT     | `.as_str()` / `FromStr`                           |
//! | bool            | INTEGER  | 0 / 1                                             |
//! | u64 counters    | INTEGER  | `as i64`, non-negative via CHECK constraints      |

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use likesync_core::domain::{
    FailureKind, RemoteTrackId, RunCounters, RunId, RunStatus, SyncRun, TrackMetadata,
    TrackSnapshot,
};
use likesync_core::ports::{ISyncRunLedger, ITrackStore, RunInProgress, TrackFilter};

use crate::CacheError;

/// SQLite-based implementation of the library storage ports
///
/// One instance serves both the track snapshot table and the run ledger;
/// all operations go through the shared connection pool.
pub struct SqliteLibraryStore {
    pool: SqlitePool,
}

impl SqliteLibraryStore {
    /// Creates a new store instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Helper functions for type conversion
// ============================================================================

/// Format a DateTime<Utc> so that lexical order matches chronological order
fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a DateTime<Utc> from an ISO 8601 string
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, CacheError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // SQLite default format, no timezone
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
                .map(|ndt| ndt.and_utc())
        })
        .map_err(|e| {
            CacheError::SerializationError(format!("Failed to parse datetime '{}': {}", s, e))
        })
}

/// Parse an optional DateTime<Utc> from an optional string
fn parse_optional_datetime(s: Option<String>) -> Result<Option<DateTime<Utc>>, CacheError> {
    match s {
        Some(ref val) if !val.is_empty() => parse_datetime(val).map(Some),
        _ => Ok(None),
    }
}

/// `duration_ms` as stored; values past `i64::MAX` are refused, not wrapped
fn duration_column(meta: &TrackMetadata) -> Result<Option<i64>, CacheError> {
    meta.duration_ms
        .map(i64::try_from)
        .transpose()
        .map_err(|_| {
            CacheError::SerializationError(format!(
                "duration_ms {:?} does not fit in INTEGER",
                meta.duration_ms
            ))
        })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

// ============================================================================
// Row mapping functions
// ============================================================================

/// Reconstruct a TrackSnapshot from a database row
fn track_from_row(row: &SqliteRow) -> Result<TrackSnapshot, CacheError> {
    let remote_id_str: String = row.get("remote_id");
    let duration_ms: Option<i64> = row.get("duration_ms");
    let is_currently_liked: i64 = row.get("is_currently_liked");
    let liked_at_str: Option<String> = row.get("liked_at");
    let created_at_str: String = row.get("created_at");
    let updated_at_str: String = row.get("updated_at");

    let remote_id = RemoteTrackId::new(remote_id_str)
        .map_err(|e| CacheError::SerializationError(e.to_string()))?;

    let metadata = TrackMetadata {
        title: row.get("title"),
        artist_name: row.get("artist_name"),
        album_name: row.get("album_name"),
        artwork_url: row.get("artwork_url"),
        preview_url: row.get("preview_url"),
        external_url: row.get("external_url"),
        duration_ms: duration_ms.map(|d| d as u64),
    };

    Ok(TrackSnapshot::from_parts(
        remote_id,
        metadata,
        is_currently_liked != 0,
        parse_optional_datetime(liked_at_str)?,
        parse_datetime(&created_at_str)?,
        parse_datetime(&updated_at_str)?,
    ))
}

/// Reconstruct a SyncRun from a database row
fn run_from_row(row: &SqliteRow) -> Result<SyncRun, CacheError> {
    let id_str: String = row.get("id");
    let started_at_str: String = row.get("started_at");
    let completed_at_str: Option<String> = row.get("completed_at");
    let status_str: String = row.get("status");
    let error_message: Option<String> = row.get("error_message");
    let error_kind_str: Option<String> = row.get("error_kind");

    let id = RunId::from_str(&id_str).map_err(|e| CacheError::SerializationError(e.to_string()))?;
    let status = RunStatus::from_str(&status_str)
        .map_err(|e| CacheError::SerializationError(e.to_string()))?;
    let error_kind = error_kind_str
        .as_deref()
        .map(FailureKind::from_str)
        .transpose()
        .map_err(|e| CacheError::SerializationError(e.to_string()))?;

    let counters = RunCounters {
        tracks_added: row.get::<i64, _>("tracks_added") as u64,
        tracks_updated: row.get::<i64, _>("tracks_updated") as u64,
        tracks_removed: row.get::<i64, _>("tracks_removed") as u64,
        total_tracks_processed: row.get::<i64, _>("total_tracks_processed") as u64,
        tracks_skipped: row.get::<i64, _>("tracks_skipped") as u64,
    };

    Ok(SyncRun::from_parts(
        id,
        parse_datetime(&started_at_str)?,
        parse_optional_datetime(completed_at_str)?,
        status,
        counters,
        error_message,
        error_kind,
    ))
}

// ============================================================================
// ITrackStore implementation
// ============================================================================

#[async_trait::async_trait]
impl ITrackStore for SqliteLibraryStore {
    async fn find_by_remote_id(
        &self,
        remote_id: &RemoteTrackId,
    ) -> anyhow::Result<Option<TrackSnapshot>> {
        let row = sqlx::query("SELECT * FROM track_snapshots WHERE remote_id = ?")
            .bind(remote_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(track_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn insert_track(&self, track: &TrackSnapshot) -> anyhow::Result<()> {
        let meta = track.metadata();

        sqlx::query(
            "INSERT INTO track_snapshots \
             (remote_id, title, artist_name, album_name, artwork_url, preview_url, \
              external_url, duration_ms, is_currently_liked, liked_at, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(track.remote_id().as_str())
        .bind(&meta.title)
        .bind(&meta.artist_name)
        .bind(&meta.album_name)
        .bind(&meta.artwork_url)
        .bind(&meta.preview_url)
        .bind(&meta.external_url)
        .bind(duration_column(meta)?)
        .bind(track.is_currently_liked() as i64)
        .bind(track.liked_at().map(format_datetime))
        .bind(format_datetime(track.created_at()))
        .bind(format_datetime(track.updated_at()))
        .execute(&self.pool)
        .await?;

        tracing::trace!(remote_id = %track.remote_id(), "Inserted track snapshot");
        Ok(())
    }

    async fn update_track(&self, track: &TrackSnapshot) -> anyhow::Result<()> {
        let meta = track.metadata();

        let result = sqlx::query(
            "UPDATE track_snapshots SET \
             title = ?, artist_name = ?, album_name = ?, artwork_url = ?, preview_url = ?, \
             external_url = ?, duration_ms = ?, is_currently_liked = ?, liked_at = ?, \
             updated_at = ? \
             WHERE remote_id = ?",
        )
        .bind(&meta.title)
        .bind(&meta.artist_name)
        .bind(&meta.album_name)
        .bind(&meta.artwork_url)
        .bind(&meta.preview_url)
        .bind(&meta.external_url)
        .bind(duration_column(meta)?)
        .bind(track.is_currently_liked() as i64)
        .bind(track.liked_at().map(format_datetime))
        .bind(format_datetime(track.updated_at()))
        .bind(track.remote_id().as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(
                CacheError::NotFound(format!("track snapshot {}", track.remote_id())).into(),
            );
        }

        tracing::trace!(remote_id = %track.remote_id(), "Updated track snapshot");
        Ok(())
    }

    async fn mark_unliked_except(
        &self,
        seen: &HashSet<RemoteTrackId>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<u64> {
        let seen_ids: Vec<&str> = seen.iter().map(RemoteTrackId::as_str).collect();
        let seen_json = serde_json::to_string(&seen_ids)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE track_snapshots SET is_currently_liked = 0, updated_at = ? \
             WHERE is_currently_liked = 1 \
             AND remote_id NOT IN (SELECT value FROM json_each(?))",
        )
        .bind(format_datetime(now))
        .bind(&seen_json)
        .execute(&self.pool)
        .await?;

        let retracted = result.rows_affected();
        tracing::debug!(retracted, seen = seen.len(), "Retracted unliked tracks");
        Ok(retracted)
    }

    async fn list_tracks(&self, filter: &TrackFilter) -> anyhow::Result<Vec<TrackSnapshot>> {
        let mut sql = String::from("SELECT * FROM track_snapshots WHERE 1=1");

        if filter.liked_only {
            sql.push_str(" AND is_currently_liked = 1");
        }

        // NULL liked_at sorts last under DESC
        sql.push_str(" ORDER BY liked_at DESC, remote_id ASC");

        if filter.limit.is_some() {
            sql.push_str(" LIMIT ?");
        }

        let mut query = sqlx::query(&sql);
        if let Some(limit) = filter.limit {
            query = query.bind(limit as i64);
        }

        let rows = query.fetch_all(&self.pool).await?;

        let mut tracks = Vec::with_capacity(rows.len());
        for row in &rows {
            tracks.push(track_from_row(row)?);
        }

        Ok(tracks)
    }

    async fn count_liked(&self) -> anyhow::Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM track_snapshots WHERE is_currently_liked = 1")
                .fetch_one(&self.pool)
                .await?;

        Ok(count as u64)
    }
}

// ============================================================================
// ISyncRunLedger implementation
// ============================================================================

#[async_trait::async_trait]
impl ISyncRunLedger for SqliteLibraryStore {
    async fn create_run(&self, started_at: DateTime<Utc>) -> anyhow::Result<SyncRun> {
        let run = SyncRun::start(started_at);

        let inserted = sqlx::query(
            "INSERT INTO sync_runs (id, started_at, status) VALUES (?, ?, ?)",
        )
        .bind(run.id().to_string())
        .bind(format_datetime(run.started_at()))
        .bind(run.status().as_str())
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => {
                tracing::trace!(run_id = %run.id(), "Created sync run");
                Ok(run)
            }
            Err(ref e) if is_unique_violation(e) => Err(RunInProgress.into()),
            Err(e) => Err(CacheError::from(e).into()),
        }
    }

    async fn finalize_run(&self, run: &SyncRun) -> anyhow::Result<SyncRun> {
        if !run.status().is_terminal() {
            anyhow::bail!("Sync run {} cannot be finalized while still pending", run.id());
        }

        let id_str = run.id().to_string();
        let counters = run.counters();

        let result = sqlx::query(
            "UPDATE sync_runs SET \
             completed_at = ?, status = ?, tracks_added = ?, tracks_updated = ?, \
             tracks_removed = ?, total_tracks_processed = ?, tracks_skipped = ?, \
             error_message = ?, error_kind = ? \
             WHERE id = ? AND status = 'pending'",
        )
        .bind(run.completed_at().map(format_datetime))
        .bind(run.status().as_str())
        .bind(counters.tracks_added as i64)
        .bind(counters.tracks_updated as i64)
        .bind(counters.tracks_removed as i64)
        .bind(counters.total_tracks_processed as i64)
        .bind(counters.tracks_skipped as i64)
        .bind(run.error_message())
        .bind(run.error_kind().map(|k| k.as_str()))
        .bind(&id_str)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<String> = sqlx::query_scalar("SELECT id FROM sync_runs WHERE id = ?")
                .bind(&id_str)
                .fetch_optional(&self.pool)
                .await?;

            return Err(match exists {
                Some(_) => CacheError::RunAlreadyFinalized(id_str),
                None => CacheError::NotFound(format!("sync run {}", id_str)),
            }
            .into());
        }

        tracing::trace!(run_id = %id_str, status = %run.status(), "Finalized sync run");
        Ok(run.clone())
    }

    async fn get_run(&self, id: &RunId) -> anyhow::Result<Option<SyncRun>> {
        let row = sqlx::query("SELECT * FROM sync_runs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(run_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn recent_runs(&self, limit: u32) -> anyhow::Result<Vec<SyncRun>> {
        let rows = sqlx::query("SELECT * FROM sync_runs ORDER BY started_at DESC LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let mut runs = Vec::with_capacity(rows.len());
        for row in &rows {
            runs.push(run_from_row(row)?);
        }

        Ok(runs)
    }

    async fn latest_completed_run(&self) -> anyhow::Result<Option<SyncRun>> {
        let row = sqlx::query(
            "SELECT * FROM sync_runs WHERE status = 'completed' \
             ORDER BY completed_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(run_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn fail_abandoned_runs(
        &self,
        started_before: DateTime<Utc>,
        reason: &str,
    ) -> anyhow::Result<u64> {
        let result = sqlx::query(
            "UPDATE sync_runs SET status = 'failed', completed_at = ?, \
             error_message = ?, error_kind = ? \
             WHERE status = 'pending' AND started_at < ?",
        )
        .bind(format_datetime(Utc::now()))
        .bind(reason)
        .bind(FailureKind::Transient.as_str())
        .bind(format_datetime(started_before))
        .execute(&self.pool)
        .await?;

        let closed = result.rows_affected();
        if closed > 0 {
            tracing::warn!(closed, "Failed abandoned sync runs");
        }
        Ok(closed)
    }
}
