//! Configuration module for likesync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Largest page the liked-tracks endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Upper bound for `sync.stale_run_after_secs` (30 days).
pub const MAX_STALE_RUN_AFTER_SECS: u64 = 30 * 24 * 60 * 60;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for likesync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub remote: RemoteConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
}

/// Reconciliation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Entries requested per remote page (1..=50).
    pub page_size: u32,
    /// Whether a complete but empty remote listing retracts every liked track.
    pub retract_on_empty_remote: bool,
    /// Pending runs older than this many seconds are treated as abandoned.
    pub stale_run_after_secs: u64,
}

/// Remote music service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the Web API, without trailing slash.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

/// Local database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

/// Credential settings.
///
/// Obtaining and refreshing the token is handled elsewhere; this is only a
/// place to hand one over.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer token for the remote API.
    pub access_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/likesync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("likesync")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            retract_on_empty_remote: false,
            stale_run_after_secs: 3600,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.spotify.com/v1".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("likesync");
        Self {
            path: data_dir.join("likesync.db"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.page_size"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- sync ---
        if self.sync.page_size == 0 || self.sync.page_size > MAX_PAGE_SIZE {
            errors.push(ValidationError {
                field: "sync.page_size".into(),
                message: format!("must be in range 1..={MAX_PAGE_SIZE}"),
            });
        }
        if self.sync.stale_run_after_secs == 0
            || self.sync.stale_run_after_secs > MAX_STALE_RUN_AFTER_SECS
        {
            errors.push(ValidationError {
                field: "sync.stale_run_after_secs".into(),
                message: format!("must be in range 1..={MAX_STALE_RUN_AFTER_SECS}"),
            });
        }

        // --- remote ---
        let base_url = self.remote.base_url.as_str();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            errors.push(ValidationError {
                field: "remote.base_url".into(),
                message: format!("must be an http(s) URL, got '{base_url}'"),
            });
        } else if base_url.ends_with('/') {
            errors.push(ValidationError {
                field: "remote.base_url".into(),
                message: "must not end with '/'".into(),
            });
        }
        if self.remote.request_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "remote.request_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- database ---
        if self.database.path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "database.path".into(),
                message: "must not be empty".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        // --- auth ---
        if matches!(self.auth.access_token.as_deref(), Some(t) if t.trim().is_empty()) {
            errors.push(ValidationError {
                field: "auth.access_token".into(),
                message: "must not be blank when set".into(),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use likesync_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .sync_page_size(20)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- sync ---

    pub fn sync_page_size(mut self, page_size: u32) -> Self {
        self.config.sync.page_size = page_size;
        self
    }

    pub fn sync_retract_on_empty_remote(mut self, enabled: bool) -> Self {
        self.config.sync.retract_on_empty_remote = enabled;
        self
    }

    pub fn sync_stale_run_after_secs(mut self, seconds: u64) -> Self {
        self.config.sync.stale_run_after_secs = seconds;
        self
    }

    // --- remote ---

    pub fn remote_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.remote.base_url = base_url.into();
        self
    }

    pub fn remote_request_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.remote.request_timeout_secs = seconds;
        self
    }

    // --- database ---

    pub fn database_path(mut self, path: PathBuf) -> Self {
        self.config.database.path = path;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- auth ---

    pub fn auth_access_token(mut self, token: impl Into<String>) -> Self {
        self.config.auth.access_token = Some(token.into());
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
