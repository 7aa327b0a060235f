//! Liked-track source port (driven/secondary port)
//!
//! This module defines the interface for listing the user's liked tracks on
//! the remote music service, one page at a time.
//!
//! ## Design Notes
//!
//! - Unlike the store ports, this port returns a typed [`SourceError`] so the
//!   engine can tell transient failures from permanent ones without parsing
//!   error strings.
//! - [`RawTrackEntry`] is a port-level DTO that mirrors what the remote API
//!   returns; every field is optional because upstream data can be partial.
//!   The engine is responsible for mapping entries to snapshots.
//! - Authentication is established out-of-band; implementations carry their
//!   own bearer credential.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::FailureKind;

/// A single liked track as reported by the remote service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTrackEntry {
    /// Remote identifier (None or blank when the entry cannot be tracked)
    pub id: Option<String>,
    /// Track title
    pub name: Option<String>,
    /// Artist names in the order the remote lists them
    pub artists: Vec<String>,
    /// Album name
    pub album_name: Option<String>,
    /// Artwork URLs, preferred image first
    pub images: Vec<String>,
    /// Audio preview URL
    pub preview_url: Option<String>,
    /// Track length in milliseconds
    pub duration_ms: Option<u64>,
    /// Link to the track on the remote service
    pub external_url: Option<String>,
    /// When the user liked the track, per the remote service
    pub added_at: Option<DateTime<Utc>>,
}

/// One page of the liked-track listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LikedPage {
    /// Entries on this page, in remote order
    pub items: Vec<RawTrackEntry>,
    /// Whether another page follows this one
    pub has_more: bool,
    /// Total number of liked tracks, when the remote reports it
    pub total: Option<u64>,
}

/// Errors returned by a liked-track source
#[derive(Debug, Error)]
pub enum SourceError {
    /// The request did not complete within the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// A network-level error occurred (DNS, connection reset, TLS, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// The remote service is throttling requests
    #[error("Rate limited by remote service{}", retry_hint(.retry_after))]
    RateLimited {
        /// How long the service asked the client to wait, if it said
        retry_after: Option<Duration>,
    },

    /// The bearer credential was rejected or has expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The remote service failed (5xx)
    #[error("Remote server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Body or reason phrase
        message: String,
    },

    /// The response could not be parsed or violated the paging contract
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The request was refused for a reason retrying will not fix
    #[error("Request rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Body or reason phrase
        message: String,
    },
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(", retry after {}s", d.as_secs()),
        None => String::new(),
    }
}

impl SourceError {
    /// Classifies the error for the sync run record
    ///
    /// Expired credentials count as transient: the credential provider is
    /// expected to refresh them before the next attempt.
    pub fn kind(&self) -> FailureKind {
        match self {
            SourceError::Timeout(_)
            | SourceError::Network(_)
            | SourceError::RateLimited { .. }
            | SourceError::Unauthorized(_)
            | SourceError::Server { .. } => FailureKind::Transient,
            SourceError::InvalidResponse(_) | SourceError::Rejected { .. } => {
                FailureKind::Permanent
            }
        }
    }

    /// Returns true if a later attempt may succeed unchanged
    pub fn is_transient(&self) -> bool {
        self.kind() == FailureKind::Transient
    }
}

/// Port trait for the remote liked-track listing
///
/// ## Implementation Notes
///
/// - `offset` is the zero-based index of the first entry to return and
///   `limit` the maximum number of entries.
/// - Implementations must not retry internally; the engine treats any error
///   as terminal for the run.
/// - Implementations should bound each request with a timeout and report it
///   as [`SourceError::Timeout`].
#[async_trait::async_trait]
pub trait ILikedTrackSource: Send + Sync {
    /// Fetches one page of liked tracks
    async fn fetch_liked_page(&self, offset: u32, limit: u32) -> Result<LikedPage, SourceError>;
}
