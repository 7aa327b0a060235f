//! SQLite pool setup for the likesync library database
//!
//! File databases run in WAL mode so `likesync runs` / `likesync likes` can
//! read while a sync is writing. The schema is embedded in the binary and
//! applied on every open; all statements are `IF NOT EXISTS`.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::CacheError;

/// Embedded schema
const SCHEMA_SQL: &str = include_str!("migrations/0001_initial.sql");

/// Connections kept for a file database
const FILE_MAX_CONNECTIONS: u32 = 5;

/// How long a writer waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection pool for the track snapshot and sync run tables
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens (creating if needed) the database file at `db_path`
    ///
    /// Missing parent directories are created and the schema is applied
    /// before the pool is returned.
    ///
    /// # Errors
    ///
    /// [`CacheError::ConnectionFailed`] when the directory or the file cannot
    /// be opened, [`CacheError::MigrationFailed`] when the schema does not apply.
    pub async fn new(db_path: &Path) -> Result<Self, CacheError> {
        if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| {
                CacheError::ConnectionFailed(format!("Cannot create {}: {}", dir.display(), e))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(FILE_MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| {
                CacheError::ConnectionFailed(format!("Cannot open {}: {}", db_path.display(), e))
            })?;

        apply_schema(&pool).await?;

        tracing::info!(path = %db_path.display(), "Opened library database");
        Ok(Self { pool })
    }

    /// Opens a private in-memory database with the schema applied
    ///
    /// Limited to one connection: every SQLite memory connection is its own
    /// database.
    pub async fn in_memory() -> Result<Self, CacheError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| CacheError::ConnectionFailed(format!("In-memory database: {}", e)))?;

        apply_schema(&pool).await?;

        tracing::debug!("Opened in-memory library database");
        Ok(Self { pool })
    }

    /// The underlying sqlx pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), CacheError> {
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await
        .map_err(|e| CacheError::MigrationFailed(format!("0001_initial: {}", e)))?;

    tracing::debug!("Library schema up to date");
    Ok(())
}
