//! Config command - View and manage likesync configuration
//!
//! Provides the `likesync config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON), token redacted
//! 2. Sets individual configuration values via dot-notation keys
//! 3. Validates the configuration file and reports errors

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use tracing::info;

use likesync_core::config::Config;

use super::CommandContext;

/// Shown instead of the access token
const REDACTED: &str = "********";

/// Keys accepted by `config set`
const SUPPORTED_KEYS: &[(&str, &str)] = &[
    ("sync.page_size", "Entries per remote page (1-50)"),
    ("sync.retract_on_empty_remote", "true|false"),
    ("sync.stale_run_after_secs", "Seconds before a pending run is abandoned"),
    ("remote.base_url", "Spotify Web API base URL"),
    ("remote.request_timeout_secs", "Per-request timeout in seconds"),
    ("database.path", "SQLite database file"),
    ("logging.level", "trace|debug|info|warn|error"),
    ("auth.access_token", "Bearer token (empty to unset)"),
];

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "sync.page_size")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, ctx: &CommandContext) -> Result<ExitCode> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx),
            ConfigCommand::Set { key, value } => self.execute_set(ctx, key, value),
            ConfigCommand::Validate => self.execute_validate(ctx),
        }
    }

    fn execute_show(&self, ctx: &CommandContext) -> Result<ExitCode> {
        let formatter = ctx.formatter();
        let config = redacted(&ctx.config);

        info!(config_path = %ctx.config_path.display(), "Showing configuration");

        if ctx.is_json() {
            let json = serde_json::to_value(&config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
            formatter.info("");

            let yaml = serde_yaml::to_string(&config)
                .context("Failed to serialize configuration to YAML")?;
            for line in yaml.lines() {
                formatter.info(line);
            }
        }

        Ok(ExitCode::SUCCESS)
    }

    fn execute_set(&self, ctx: &CommandContext, key: &str, value: &str) -> Result<ExitCode> {
        let formatter = ctx.formatter();
        let mut config = ctx.config.clone();

        info!(key = %key, "Setting configuration value");

        if let Err(e) = apply_config_value(&mut config, key, value) {
            if ctx.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "error": e.to_string(),
                }));
            } else {
                formatter.error(&format!("Failed to set '{}': {}", key, e));
                formatter.info("");
                formatter.info("Supported keys:");
                for (name, help) in SUPPORTED_KEYS {
                    formatter.info(&format!("  {:<30} - {}", name, help));
                }
            }
            return Ok(ExitCode::FAILURE);
        }

        let errors = config.validate();
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            if ctx.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "errors": messages,
                }));
            } else {
                formatter.error(&format!("Invalid value for '{}': {}", key, messages.join("; ")));
            }
            return Ok(ExitCode::FAILURE);
        }

        write_config_file(&ctx.config_path, &config)?;

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "key": key,
                "config_path": ctx.config_path.display().to_string(),
            }));
        } else {
            let shown = if key == "auth.access_token" { REDACTED } else { value };
            formatter.success(&format!("Set {} = {}", key, shown));
            formatter.info(&format!("Saved to {}", ctx.config_path.display()));
        }

        Ok(ExitCode::SUCCESS)
    }

    fn execute_validate(&self, ctx: &CommandContext) -> Result<ExitCode> {
        let formatter = ctx.formatter();
        let config_path = &ctx.config_path;

        if !config_path.exists() {
            if ctx.is_json() {
                formatter.print_json(&serde_json::json!({
                    "valid": true,
                    "config_path": config_path.display().to_string(),
                    "errors": [],
                    "defaults": true,
                }));
            } else {
                formatter.info(&format!(
                    "Configuration file not found at {}",
                    config_path.display()
                ));
                formatter.info("Using default configuration.");
            }
            return Ok(ExitCode::SUCCESS);
        }

        info!(config_path = %config_path.display(), "Validating configuration");

        // main() already refused a file that does not parse
        let errors = ctx.config.validate();

        if ctx.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": config_path.display().to_string(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", config_path.display()));
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ));
            formatter.info(&format!("File: {}", config_path.display()));
            formatter.info("");
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        Ok(if errors.is_empty() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }
}

/// Writes `config` as YAML to `path`
///
/// On Unix a file holding an access token is created, or narrowed to,
/// owner-only permissions before the token is written.
fn write_config_file(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
    }
    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    // Owner-only (Unix) whenever the file carries a token
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        if config.auth.access_token.is_some() {
            options.mode(0o600);
            if path.exists() {
                std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                    .context("Failed to restrict configuration file permissions")?;
            }
        }
    }

    let mut file = options
        .open(path)
        .context("Failed to open configuration file")?;
    file.write_all(yaml.as_bytes())
        .context("Failed to write configuration file")?;
    Ok(())
}

/// Copy of the configuration that is safe to print
fn redacted(config: &Config) -> Config {
    let mut copy = config.clone();
    if copy.auth.access_token.is_some() {
        copy.auth.access_token = Some(REDACTED.to_string());
    }
    copy
}

/// Apply a dot-notation key/value pair to a Config struct
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "sync.page_size" => {
            config.sync.page_size = value
                .parse::<u32>()
                .context("Expected a positive integer for sync.page_size")?;
        }
        "sync.retract_on_empty_remote" => {
            config.sync.retract_on_empty_remote = value
                .parse::<bool>()
                .context("Expected true or false for sync.retract_on_empty_remote")?;
        }
        "sync.stale_run_after_secs" => {
            config.sync.stale_run_after_secs = value
                .parse::<u64>()
                .context("Expected a positive integer for sync.stale_run_after_secs")?;
        }
        "remote.base_url" => {
            config.remote.base_url = value.to_string();
        }
        "remote.request_timeout_secs" => {
            config.remote.request_timeout_secs = value
                .parse::<u64>()
                .context("Expected a positive integer for remote.request_timeout_secs")?;
        }
        "database.path" => {
            config.database.path = PathBuf::from(value);
        }
        "logging.level" => {
            config.logging.level = value.to_lowercase();
        }
        "auth.access_token" => {
            config.auth.access_token = (!value.trim().is_empty()).then(|| value.trim().to_string());
        }
        other => bail!("Unknown configuration key: {}", other),
    }
    Ok(())
}
