//! CLI subcommands
//!
//! Every command receives a [`CommandContext`] carrying the resolved
//! configuration and the selected output format.

pub mod completions;
pub mod config;
pub mod likes;
pub mod runs;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};

use likesync_cache::{DatabasePool, SqliteLibraryStore};
use likesync_core::config::Config;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

/// State shared by all commands for one invocation
pub struct CommandContext {
    pub format: OutputFormat,
    /// Where the configuration was (or would be) loaded from
    pub config_path: PathBuf,
    pub config: Config,
}

impl CommandContext {
    pub fn new(format: OutputFormat, config_path: PathBuf, config: Config) -> Self {
        Self {
            format,
            config_path,
            config,
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.is_json())
    }

    /// Opens (and migrates) the configured database
    pub async fn open_store(&self) -> Result<SqliteLibraryStore> {
        let db_path = &self.config.database.path;
        let pool = DatabasePool::new(db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
        Ok(SqliteLibraryStore::new(pool.pool().clone()))
    }
}
