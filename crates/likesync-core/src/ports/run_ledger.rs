//! Sync run ledger port (driven/secondary port)
//!
//! Persistence contract for [`SyncRun`] records. The reconciliation engine
//! is the only writer: it creates one pending record per attempt and
//! finalizes it exactly once. Everything else reads.
//!
//! ## Implementation Notes
//!
//! - `finalize_run` must refuse to overwrite a record that is no longer
//!   pending, so a finalized record can never be revisited.
//! - Implementations may refuse `create_run` while another run is pending
//!   (the SQLite adapter does). They signal it with [`RunInProgress`] so the
//!   engine can tell a busy ledger (transient) from a broken one (permanent).

use chrono::{DateTime, Utc};

use thiserror::Error;

use crate::domain::{RunId, SyncRun};

/// `create_run` refused because another run is still pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Another sync run is already in progress")]
pub struct RunInProgress;

/// Port trait for sync run persistence
#[async_trait::async_trait]
pub trait ISyncRunLedger: Send + Sync {
    /// Opens and persists a new pending run
    ///
    /// Fails with [`RunInProgress`] (inside the `anyhow::Error`) when the
    /// ledger only admits one pending run and one exists.
    async fn create_run(&self, started_at: DateTime<Utc>) -> anyhow::Result<SyncRun>;

    /// Persists the terminal state of a run
    ///
    /// `run` must already carry its terminal status, counters and error
    /// detail. Returns the stored record.
    async fn finalize_run(&self, run: &SyncRun) -> anyhow::Result<SyncRun>;

    /// Retrieves a run by its ID
    async fn get_run(&self, id: &RunId) -> anyhow::Result<Option<SyncRun>>;

    /// Retrieves the most recent runs, newest first
    async fn recent_runs(&self, limit: u32) -> anyhow::Result<Vec<SyncRun>>;

    /// Retrieves the most recent completed run
    async fn latest_completed_run(&self) -> anyhow::Result<Option<SyncRun>>;

    /// Fails pending runs that started before `started_before`
    ///
    /// Used to close runs left pending by a crashed process. Returns the
    /// number of runs closed.
    async fn fail_abandoned_runs(
        &self,
        started_before: DateTime<Utc>,
        reason: &str,
    ) -> anyhow::Result<u64>;
}
