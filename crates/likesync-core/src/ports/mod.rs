//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the reconciliation
//! engine depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ILikedTrackSource`] - Paginated listing of the user's liked tracks
//! - [`ITrackStore`] - Persistent storage for track snapshots
//! - [`ISyncRunLedger`] - Persistent storage for sync run records
//! - [`ILibraryStore`] - A single handle combining the two local stores

pub mod liked_source;
pub mod run_ledger;
pub mod track_store;

pub use liked_source::{ILikedTrackSource, LikedPage, RawTrackEntry, SourceError};
pub use run_ledger::{ISyncRunLedger, RunInProgress};
pub use track_store::{ITrackStore, TrackFilter};

/// The local store handed to the reconciliation engine
///
/// Any type implementing both [`ITrackStore`] and [`ISyncRunLedger`]
/// qualifies automatically.
pub trait ILibraryStore: ITrackStore + ISyncRunLedger {}

impl<T> ILibraryStore for T where T: ITrackStore + ISyncRunLedger + ?Sized {}
