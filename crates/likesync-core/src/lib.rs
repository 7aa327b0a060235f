//! likesync Core - Domain logic and port definitions
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `TrackSnapshot`, `SyncRun`
//! - **Port definitions** - Traits for adapters: `ILikedTrackSource`, `ITrackStore`,
//!   `ISyncRunLedger`
//! - **Configuration** - YAML-backed settings shared by every crate
//!
//! # Architecture
//!
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement; the
//! reconciliation engine in `likesync-sync` only talks to these traits.

pub mod config;
pub mod domain;
pub mod ports;
