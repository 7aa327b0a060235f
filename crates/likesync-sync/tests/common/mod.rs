//! Test doubles for the reconciliation engine
//!
//! - [`ScriptedSource`] replays a fixed sequence of page results
//! - [`StaticSource`] answers every request with the same page
//! - [`MemoryStore`] keeps snapshots and runs in memory, with failure switches

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};

use likesync_core::domain::{RemoteTrackId, RunId, SyncRun, TrackMetadata, TrackSnapshot};
use likesync_core::ports::{
    ILikedTrackSource, ISyncRunLedger, ITrackStore, LikedPage, RawTrackEntry, RunInProgress,
    SourceError, TrackFilter,
};

// ============================================================================
// Builders
// ============================================================================

pub fn day(date: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

pub fn raw(id: &str, name: &str, artists: &[&str], added: &str) -> RawTrackEntry {
    RawTrackEntry {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        artists: artists.iter().map(|a| a.to_string()).collect(),
        added_at: Some(day(added)),
        ..RawTrackEntry::default()
    }
}

pub fn page(items: Vec<RawTrackEntry>, has_more: bool) -> LikedPage {
    LikedPage {
        items,
        has_more,
        total: None,
    }
}

pub fn rid(id: &str) -> RemoteTrackId {
    RemoteTrackId::new(id).unwrap()
}

pub fn liked_snapshot(id: &str) -> TrackSnapshot {
    let metadata = TrackMetadata {
        title: format!("Old {id}"),
        artist_name: "Old Artist".to_string(),
        ..TrackMetadata::default()
    };
    TrackSnapshot::new_liked(rid(id), metadata, Some(day("2023-06-01")), day("2023-06-01"))
}

// ============================================================================
// Sources
// ============================================================================

/// Replays scripted results in order and records the requested windows
#[derive(Default)]
pub struct ScriptedSource {
    results: Mutex<VecDeque<Result<LikedPage, SourceError>>>,
    requests: Mutex<Vec<(u32, u32)>>,
}

impl ScriptedSource {
    pub fn new(results: Vec<Result<LikedPage, SourceError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn pages(pages: Vec<LikedPage>) -> Self {
        Self::new(pages.into_iter().map(Ok).collect())
    }

    /// `(offset, limit)` of every call so far
    pub fn requests(&self) -> Vec<(u32, u32)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ILikedTrackSource for ScriptedSource {
    async fn fetch_liked_page(&self, offset: u32, limit: u32) -> Result<LikedPage, SourceError> {
        self.requests.lock().unwrap().push((offset, limit));
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SourceError::InvalidResponse("script exhausted".to_string())))
    }
}

/// Returns the same single page for every request
pub struct StaticSource {
    page: LikedPage,
    calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(items: Vec<RawTrackEntry>) -> Self {
        Self {
            page: page(items, false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ILikedTrackSource for StaticSource {
    async fn fetch_liked_page(&self, _offset: u32, _limit: u32) -> Result<LikedPage, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(self.page.clone())
    }
}

// ============================================================================
// Store
// ============================================================================

/// In-memory library store
///
/// Enforces the same rules as the SQLite store: unique remote ids, at most
/// one pending run, and finalize-once.
#[derive(Default)]
pub struct MemoryStore {
    tracks: Mutex<BTreeMap<String, TrackSnapshot>>,
    runs: Mutex<Vec<SyncRun>>,
    writes: AtomicUsize,
    /// Fail every track write after this many successful ones
    fail_writes_after: Mutex<Option<usize>>,
    fail_create_run: AtomicBool,
    fail_finalize_run: AtomicBool,
    fail_retraction: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tracks(tracks: Vec<TrackSnapshot>) -> Self {
        let store = Self::new();
        {
            let mut map = store.tracks.lock().unwrap();
            for track in tracks {
                map.insert(track.remote_id().to_string(), track);
            }
        }
        store
    }

    pub fn fail_writes_after(&self, successful: usize) {
        *self.fail_writes_after.lock().unwrap() = Some(successful);
    }

    pub fn fail_create_run(&self) {
        self.fail_create_run.store(true, Ordering::SeqCst);
    }

    pub fn fail_finalize_run(&self) {
        self.fail_finalize_run.store(true, Ordering::SeqCst);
    }

    pub fn fail_retraction(&self) {
        self.fail_retraction.store(true, Ordering::SeqCst);
    }

    pub fn track(&self, id: &str) -> Option<TrackSnapshot> {
        self.tracks.lock().unwrap().get(id).cloned()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.lock().unwrap().len()
    }

    pub fn stored_runs(&self) -> Vec<SyncRun> {
        self.runs.lock().unwrap().clone()
    }

    fn check_write(&self) -> anyhow::Result<()> {
        let done = self.writes.fetch_add(1, Ordering::SeqCst);
        match *self.fail_writes_after.lock().unwrap() {
            Some(limit) if done >= limit => anyhow::bail!("simulated write failure"),
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl ITrackStore for MemoryStore {
    async fn find_by_remote_id(
        &self,
        remote_id: &RemoteTrackId,
    ) -> anyhow::Result<Option<TrackSnapshot>> {
        Ok(self.track(remote_id.as_str()))
    }

    async fn insert_track(&self, track: &TrackSnapshot) -> anyhow::Result<()> {
        self.check_write()?;
        let mut tracks = self.tracks.lock().unwrap();
        let key = track.remote_id().to_string();
        if tracks.contains_key(&key) {
            anyhow::bail!("duplicate remote id {key}");
        }
        tracks.insert(key, track.clone());
        Ok(())
    }

    async fn update_track(&self, track: &TrackSnapshot) -> anyhow::Result<()> {
        self.check_write()?;
        let mut tracks = self.tracks.lock().unwrap();
        match tracks.get_mut(track.remote_id().as_str()) {
            Some(slot) => {
                *slot = track.clone();
                Ok(())
            }
            None => anyhow::bail!("no track {}", track.remote_id()),
        }
    }

    async fn mark_unliked_except(
        &self,
        seen: &HashSet<RemoteTrackId>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<u64> {
        if self.fail_retraction.load(Ordering::SeqCst) {
            anyhow::bail!("simulated retraction failure");
        }
        let mut tracks = self.tracks.lock().unwrap();
        let mut changed = 0;
        for track in tracks.values_mut() {
            if track.is_currently_liked() && !seen.contains(track.remote_id()) {
                track.retract(now);
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn list_tracks(&self, filter: &TrackFilter) -> anyhow::Result<Vec<TrackSnapshot>> {
        let tracks = self.tracks.lock().unwrap();
        let mut listed: Vec<TrackSnapshot> = tracks
            .values()
            .filter(|t| !filter.liked_only || t.is_currently_liked())
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.liked_at().cmp(&a.liked_at()));
        if let Some(limit) = filter.limit {
            listed.truncate(limit as usize);
        }
        Ok(listed)
    }

    async fn count_liked(&self) -> anyhow::Result<u64> {
        let tracks = self.tracks.lock().unwrap();
        Ok(tracks.values().filter(|t| t.is_currently_liked()).count() as u64)
    }
}

#[async_trait::async_trait]
impl ISyncRunLedger for MemoryStore {
    async fn create_run(&self, started_at: DateTime<Utc>) -> anyhow::Result<SyncRun> {
        if self.fail_create_run.load(Ordering::SeqCst) {
            anyhow::bail!("simulated ledger outage");
        }
        let mut runs = self.runs.lock().unwrap();
        if runs.iter().any(SyncRun::is_pending) {
            return Err(RunInProgress.into());
        }
        let run = SyncRun::start(started_at);
        runs.push(run.clone());
        Ok(run)
    }

    async fn finalize_run(&self, run: &SyncRun) -> anyhow::Result<SyncRun> {
        if self.fail_finalize_run.load(Ordering::SeqCst) {
            anyhow::bail!("simulated ledger outage");
        }
        let mut runs = self.runs.lock().unwrap();
        let slot = runs
            .iter_mut()
            .find(|r| r.id() == run.id())
            .ok_or_else(|| anyhow::anyhow!("unknown run {}", run.id()))?;
        if !slot.is_pending() {
            anyhow::bail!("run {} already finalized", run.id());
        }
        *slot = run.clone();
        Ok(run.clone())
    }

    async fn get_run(&self, id: &RunId) -> anyhow::Result<Option<SyncRun>> {
        Ok(self.runs.lock().unwrap().iter().find(|r| r.id() == id).cloned())
    }

    async fn recent_runs(&self, limit: u32) -> anyhow::Result<Vec<SyncRun>> {
        let runs = self.runs.lock().unwrap();
        Ok(runs.iter().rev().take(limit as usize).cloned().collect())
    }

    async fn latest_completed_run(&self) -> anyhow::Result<Option<SyncRun>> {
        let runs = self.runs.lock().unwrap();
        Ok(runs
            .iter()
            .rev()
            .find(|r| r.status() == likesync_core::domain::RunStatus::Completed)
            .cloned())
    }

    async fn fail_abandoned_runs(
        &self,
        _started_before: DateTime<Utc>,
        _reason: &str,
    ) -> anyhow::Result<u64> {
        Ok(0)
    }
}
