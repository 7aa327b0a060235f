//! SyncRun domain entity
//!
//! A SyncRun is the durable audit record of one reconciliation attempt. It is
//! created in [`RunStatus::Pending`] and transitions exactly once to either
//! [`RunStatus::Completed`] or [`RunStatus::Failed`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::RunId;

/// Lifecycle state of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Run has been opened and is still reconciling
    Pending,
    /// Run finished after consuming every remote page
    Completed,
    /// Run was aborted; see the error message
    Failed,
}

impl RunStatus {
    /// Stable lowercase name used for storage and display
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    /// Returns true for `completed` and `failed`
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Pending)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RunStatus::Pending),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            other => Err(DomainError::UnknownValue {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// Classification of a run failure
///
/// Transient failures (network, timeouts, rate limiting, expired auth,
/// server errors) may succeed if the run is simply attempted again later.
/// Permanent failures need intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transient,
    Permanent,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Transient => "transient",
            FailureKind::Permanent => "permanent",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transient" => Ok(FailureKind::Transient),
            "permanent" => Ok(FailureKind::Permanent),
            other => Err(DomainError::UnknownValue {
                field: "error_kind",
                value: other.to_string(),
            }),
        }
    }
}

/// Counters accumulated while a run processes remote entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    /// Snapshots created during the run
    pub tracks_added: u64,
    /// Existing snapshots overwritten during the run
    pub tracks_updated: u64,
    /// Snapshots retracted (flagged as no longer liked)
    pub tracks_removed: u64,
    /// Remote entries handled, including skipped ones
    pub total_tracks_processed: u64,
    /// Remote entries ignored because they had no usable identifier
    pub tracks_skipped: u64,
}

/// Record of one reconciliation attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRun {
    id: RunId,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    status: RunStatus,
    counters: RunCounters,
    error_message: Option<String>,
    error_kind: Option<FailureKind>,
}

impl SyncRun {
    /// Opens a new pending run starting at `started_at`
    pub fn start(started_at: DateTime<Utc>) -> Self {
        Self {
            id: RunId::new(),
            started_at,
            completed_at: None,
            status: RunStatus::Pending,
            counters: RunCounters::default(),
            error_message: None,
            error_kind: None,
        }
    }

    /// Rebuilds a run from stored values
    pub fn from_parts(
        id: RunId,
        started_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
        status: RunStatus,
        counters: RunCounters,
        error_message: Option<String>,
        error_kind: Option<FailureKind>,
    ) -> Self {
        Self {
            id,
            started_at,
            completed_at,
            status,
            counters,
            error_message,
            error_kind,
        }
    }

    // --- Getters ---

    pub fn id(&self) -> &RunId {
        &self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    pub fn tracks_added(&self) -> u64 {
        self.counters.tracks_added
    }

    pub fn tracks_updated(&self) -> u64 {
        self.counters.tracks_updated
    }

    pub fn tracks_removed(&self) -> u64 {
        self.counters.tracks_removed
    }

    pub fn total_tracks_processed(&self) -> u64 {
        self.counters.total_tracks_processed
    }

    pub fn tracks_skipped(&self) -> u64 {
        self.counters.tracks_skipped
    }

    /// Human-readable failure detail; only set on failed runs
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Failure classification; only set on failed runs
    pub fn error_kind(&self) -> Option<FailureKind> {
        self.error_kind
    }

    // --- Computed Properties ---

    /// Wall-clock duration in seconds, once the run has finished
    pub fn duration_seconds(&self) -> Option<f64> {
        self.completed_at.map(|completed| {
            (completed - self.started_at)
                .num_milliseconds()
                .max(0) as f64
                / 1000.0
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == RunStatus::Pending
    }

    // --- State Transitions ---

    /// Finalizes the run as completed with the given counters
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidState`] if the run is already terminal
    pub fn complete(
        &mut self,
        counters: RunCounters,
        completed_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.ensure_pending(RunStatus::Completed)?;
        self.status = RunStatus::Completed;
        self.counters = counters;
        self.completed_at = Some(completed_at);
        Ok(())
    }

    /// Finalizes the run as failed, keeping the partial counters
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidState`] if the run is already terminal
    pub fn fail(
        &mut self,
        counters: RunCounters,
        kind: FailureKind,
        message: impl Into<String>,
        completed_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.ensure_pending(RunStatus::Failed)?;
        self.status = RunStatus::Failed;
        self.counters = counters;
        self.error_kind = Some(kind);
        self.error_message = Some(message.into());
        self.completed_at = Some(completed_at);
        Ok(())
    }

    fn ensure_pending(&self, target: RunStatus) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidState {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        Ok(())
    }
}
