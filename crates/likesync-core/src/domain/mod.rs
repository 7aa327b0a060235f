//! Domain entities and business logic
//!
//! This module contains the core domain types for likesync:
//! - Newtypes for type-safe identifiers
//! - Track snapshots (locally persisted liked-track state)
//! - Sync runs (the audit record of one reconciliation attempt)
//! - Domain-specific error types

pub mod errors;
pub mod newtypes;
pub mod run;
pub mod track;

// Re-export commonly used types
pub use errors::DomainError;
pub use newtypes::{RemoteTrackId, RunId};
pub use run::{FailureKind, RunCounters, RunStatus, SyncRun};
pub use track::{TrackMetadata, TrackSnapshot, UNKNOWN_ARTIST};
