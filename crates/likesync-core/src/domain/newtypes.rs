//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for the two identifiers the system deals with:
//! the remote service's track id (natural key of a snapshot) and the local
//! id of a sync run.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

// ============================================================================
// RunId
// ============================================================================

/// Identifier for SyncRun entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Create a new random RunId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a RunId from an existing UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RunId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RunId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::InvalidId(format!("Invalid RunId: {e}")))
    }
}

impl From<Uuid> for RunId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

// ============================================================================
// RemoteTrackId
// ============================================================================

/// Stable identifier of a track on the remote music service
///
/// This is the natural key of a [`TrackSnapshot`](super::TrackSnapshot):
/// exactly one snapshot exists per remote id. Surrounding whitespace is
/// trimmed; an id that is empty after trimming is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemoteTrackId(String);

impl RemoteTrackId {
    /// Create a new RemoteTrackId
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidRemoteId`] if the id is empty or blank
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidRemoteId(
                "Remote ID cannot be empty".to_string(),
            ));
        }

        if trimmed.len() == id.len() {
            Ok(Self(id))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RemoteTrackId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RemoteTrackId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RemoteTrackId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RemoteTrackId> for String {
    fn from(id: RemoteTrackId) -> Self {
        id.0
    }
}
