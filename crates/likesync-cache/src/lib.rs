//! likesync Cache - Local state persistence
//!
//! SQLite-based storage for:
//! - Track snapshots (one row per remote track id)
//! - The sync run ledger
//!
//! ## Architecture
//!
//! This crate implements the `ITrackStore` and `ISyncRunLedger` ports from
//! `likesync-core` using SQLite as the storage backend. It is a driven
//! (secondary) adapter in the hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Connection pool with migration support
//! - [`SqliteLibraryStore`] - Implementation of both store ports
//! - [`CacheError`] - Error types for cache operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use likesync_cache::{DatabasePool, SqliteLibraryStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/home/user/.local/share/likesync/likesync.db")).await?;
//! let store = SqliteLibraryStore::new(pool.pool().clone());
//! // Hand `store` to the reconciliation engine...
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod repository;

pub use pool::DatabasePool;
pub use repository::SqliteLibraryStore;

/// Errors that can occur during cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Serialization or deserialization of domain types failed
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The run exists but has already been finalized
    #[error("Sync run {0} is already finalized")]
    RunAlreadyFinalized(String),

    /// No row matched the given key
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<sqlx::Error> for CacheError {
    fn from(e: sqlx::Error) -> Self {
        CacheError::QueryFailed(e.to_string())
    }
}
