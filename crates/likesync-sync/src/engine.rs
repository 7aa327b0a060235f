//! Reconciliation engine
//!
//! Pulls the complete liked-track listing from an [`ILikedTrackSource`],
//! upserts one [`TrackSnapshot`] per remote id and retracts snapshots that no
//! longer appear remotely. Every attempt is bracketed by a [`SyncRun`] in the
//! ledger: opened as pending before the first page, finalized exactly once.
//!
//! ## Failure semantics
//!
//! The first source or store error aborts the run. Counters keep whatever
//! was processed before the failure and retraction is skipped, since it
//! needs the full seen set. The caller always gets a finalized record back,
//! never an error.
//!
//! ## Concurrency
//!
//! Runs through one engine are serialized with an async mutex. The SQLite
//! ledger additionally refuses a second pending run, which covers separate
//! processes.

use std::collections::HashSet;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use likesync_core::config::{SyncConfig, MAX_PAGE_SIZE};
use likesync_core::domain::{
    FailureKind, RemoteTrackId, RunCounters, SyncRun, TrackMetadata, TrackSnapshot,
};
use likesync_core::ports::{ILibraryStore, ILikedTrackSource, RawTrackEntry, RunInProgress};

use crate::ReconcileError;

/// Tunables for a reconciliation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    page_size: u32,
    retract_on_empty_remote: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            retract_on_empty_remote: false,
        }
    }
}

impl ReconcileOptions {
    /// Builds options from the `sync` configuration section
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::default()
            .with_page_size(config.page_size)
            .with_retract_on_empty_remote(config.retract_on_empty_remote)
    }

    /// Sets the page size, clamped to `1..=MAX_PAGE_SIZE`
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Allows an empty remote listing to retract every local like
    pub fn with_retract_on_empty_remote(mut self, enabled: bool) -> Self {
        self.retract_on_empty_remote = enabled;
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn retract_on_empty_remote(&self) -> bool {
        self.retract_on_empty_remote
    }
}

/// Reconciles the remote liked-track listing into the local store
///
/// The engine holds no connection state: the source and the store are
/// passed to every [`reconcile`](Self::reconcile) call.
pub struct ReconcileEngine {
    options: ReconcileOptions,
    /// Serializes runs issued through this engine
    run_lock: Mutex<()>,
}

impl Default for ReconcileEngine {
    fn default() -> Self {
        Self::new(ReconcileOptions::default())
    }
}

impl ReconcileEngine {
    pub fn new(options: ReconcileOptions) -> Self {
        Self {
            options,
            run_lock: Mutex::new(()),
        }
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Runs one reconciliation and returns its finalized record
    ///
    /// Never fails: any error is reported through the returned run's status,
    /// error message and error kind. If the ledger refuses to open a run, the
    /// returned failed record was never persisted. If the ledger refuses to
    /// finalize it, the in-memory record is returned as is.
    #[tracing::instrument(skip_all, fields(run_id = tracing::field::Empty))]
    pub async fn reconcile(
        &self,
        source: &dyn ILikedTrackSource,
        store: &dyn ILibraryStore,
    ) -> SyncRun {
        let _guard = self.run_lock.lock().await;

        let started_at = Utc::now();
        let mut run = match store.create_run(started_at).await {
            Ok(run) => run,
            Err(err) => {
                let kind = open_failure_kind(&err);
                let message = format!("Could not open sync run: {}", crate::error_chain(&err));
                error!(%kind, %message);
                let mut run = SyncRun::start(started_at);
                close_run(&mut run, RunCounters::default(), Err((kind, message)));
                return run;
            }
        };

        tracing::Span::current().record("run_id", tracing::field::display(run.id()));
        info!(page_size = self.options.page_size, "Starting reconciliation");

        let mut counters = RunCounters::default();
        let outcome = self.pull_and_apply(source, store, &mut counters).await;

        match &outcome {
            Ok(()) => info!(
                added = counters.tracks_added,
                updated = counters.tracks_updated,
                removed = counters.tracks_removed,
                skipped = counters.tracks_skipped,
                total = counters.total_tracks_processed,
                "Reconciliation completed"
            ),
            Err(err) => warn!(
                kind = %err.kind(),
                error = %err,
                processed = counters.total_tracks_processed,
                "Reconciliation failed"
            ),
        }

        close_run(
            &mut run,
            counters,
            outcome.map_err(|err| (err.kind(), err.to_string())),
        );

        match store.finalize_run(&run).await {
            Ok(stored) => stored,
            Err(err) => {
                error!(error = %crate::error_chain(&err), "Failed to persist sync run outcome");
                run
            }
        }
    }

    /// Pages through the source, applies every entry, then retracts
    async fn pull_and_apply(
        &self,
        source: &dyn ILikedTrackSource,
        store: &dyn ILibraryStore,
        counters: &mut RunCounters,
    ) -> Result<(), ReconcileError> {
        let limit = self.options.page_size;
        let mut offset: u32 = 0;
        let mut page_number: u32 = 0;
        let mut seen: HashSet<RemoteTrackId> = HashSet::new();

        loop {
            let page = source
                .fetch_liked_page(offset, limit)
                .await
                .map_err(|error| ReconcileError::Source { offset, error })?;
            page_number += 1;

            debug!(
                page = page_number,
                offset,
                items = page.items.len(),
                has_more = page.has_more,
                "Fetched liked page"
            );

            if page.items.is_empty() && page.has_more {
                return Err(ReconcileError::StalledPagination { offset });
            }

            for entry in page.items {
                apply_entry(store, entry, &mut seen, counters).await?;
            }

            if !page.has_more {
                break;
            }
            offset = offset.saturating_add(limit);
        }

        if seen.is_empty() && !self.options.retract_on_empty_remote {
            warn!("Remote listing is empty, keeping local likes untouched");
            return Ok(());
        }

        counters.tracks_removed = store
            .mark_unliked_except(&seen, Utc::now())
            .await
            .map_err(|e| ReconcileError::store("retracting unliked tracks", e))?;

        Ok(())
    }
}

/// Upserts one remote entry and records it in the seen set
async fn apply_entry(
    store: &dyn ILibraryStore,
    entry: RawTrackEntry,
    seen: &mut HashSet<RemoteTrackId>,
    counters: &mut RunCounters,
) -> Result<(), ReconcileError> {
    counters.total_tracks_processed += 1;

    let Some(remote_id) = entry
        .id
        .as_deref()
        .and_then(|id| RemoteTrackId::new(id).ok())
    else {
        warn!(
            title = entry.name.as_deref().unwrap_or_default(),
            "Skipping liked entry without a usable id"
        );
        counters.tracks_skipped += 1;
        return Ok(());
    };

    let metadata = track_metadata(&entry);
    let now = Utc::now();

    let existing = store
        .find_by_remote_id(&remote_id)
        .await
        .map_err(|e| ReconcileError::store("looking up a track", e))?;

    match existing {
        Some(mut track) => {
            track.apply_remote(metadata, entry.added_at, now);
            store
                .update_track(&track)
                .await
                .map_err(|e| ReconcileError::store("updating a track", e))?;
            counters.tracks_updated += 1;
        }
        None => {
            let track = TrackSnapshot::new_liked(remote_id.clone(), metadata, entry.added_at, now);
            store
                .insert_track(&track)
                .await
                .map_err(|e| ReconcileError::store("inserting a track", e))?;
            counters.tracks_added += 1;
        }
    }

    seen.insert(remote_id);
    Ok(())
}

/// Maps a raw entry onto snapshot metadata
///
/// Missing text becomes empty or `None`; an empty artist list becomes
/// [`UNKNOWN_ARTIST`](likesync_core::domain::UNKNOWN_ARTIST). A duration
/// too large to store is dropped.
pub fn track_metadata(entry: &RawTrackEntry) -> TrackMetadata {
    TrackMetadata {
        title: entry.name.clone().unwrap_or_default(),
        artist_name: TrackMetadata::primary_artist(&entry.artists),
        album_name: non_blank(entry.album_name.as_deref()),
        artwork_url: non_blank(entry.images.first().map(String::as_str)),
        preview_url: non_blank(entry.preview_url.as_deref()),
        external_url: non_blank(entry.external_url.as_deref()),
        duration_ms: entry.duration_ms.filter(|d| i64::try_from(*d).is_ok()),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// A busy ledger clears up by itself; anything else needs a look
fn open_failure_kind(err: &anyhow::Error) -> FailureKind {
    if err.downcast_ref::<RunInProgress>().is_some() {
        FailureKind::Transient
    } else {
        FailureKind::Permanent
    }
}

/// Moves a pending run into its terminal state
fn close_run(
    run: &mut SyncRun,
    counters: RunCounters,
    outcome: Result<(), (FailureKind, String)>,
) {
    let completed_at = Utc::now();
    let transition = match outcome {
        Ok(()) => run.complete(counters, completed_at),
        Err((kind, message)) => run.fail(counters, kind, message, completed_at),
    };

    // Only reachable if the ledger handed back a finalized run
    if let Err(err) = transition {
        error!(run_id = %run.id(), %err, "Sync run was not pending");
    }
}
