//! likesync Sync - Liked-track reconciliation engine
//!
//! Provides:
//! - Paginated pull of the remote liked-track listing
//! - Keyed upsert of local track snapshots
//! - Bulk retraction of tracks no longer liked remotely
//! - A ledger record for every attempt, success or failure
//!
//! ## Modules
//!
//! - [`engine`] - The reconciliation engine and its options

pub mod engine;

pub use engine::{ReconcileEngine, ReconcileOptions};

use likesync_core::domain::FailureKind;
use likesync_core::ports::SourceError;
use thiserror::Error;

/// Reasons a reconciliation run stops early
///
/// Never returned to callers of [`ReconcileEngine::reconcile`]; it is
/// folded into the failed run record.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The remote source failed while fetching a page
    #[error("Failed to fetch liked tracks at offset {offset}: {error}")]
    Source {
        /// Offset of the page being fetched
        offset: u32,
        /// Error reported by the source
        error: SourceError,
    },

    /// The remote reported more pages after an empty one
    #[error("Remote returned an empty page at offset {offset} while reporting more pages")]
    StalledPagination {
        /// Offset of the empty page
        offset: u32,
    },

    /// A local store operation failed
    #[error("Local store failed while {action}: {message}")]
    Store {
        /// What the engine was doing
        action: &'static str,
        /// Error chain from the store
        message: String,
    },
}

impl ReconcileError {
    /// Wraps a store error with the action that failed
    pub fn store(action: &'static str, error: anyhow::Error) -> Self {
        ReconcileError::Store {
            action,
            message: error_chain(&error),
        }
    }

    /// Classifies the error for the run record
    pub fn kind(&self) -> FailureKind {
        match self {
            ReconcileError::Source { error, .. } => error.kind(),
            ReconcileError::StalledPagination { .. } | ReconcileError::Store { .. } => {
                FailureKind::Permanent
            }
        }
    }
}

/// Renders an error and its causes as `outer: inner: root`
///
/// A cause already quoted by the message above it is left out; sqlx
/// database errors embed their source in their own message.
pub(crate) fn error_chain(error: &anyhow::Error) -> String {
    let mut parts: Vec<String> = Vec::new();
    for cause in error.chain() {
        let text = cause.to_string();
        if parts.last().is_some_and(|previous| previous.contains(&text)) {
            continue;
        }
        parts.push(text);
    }
    parts.join(": ")
}
