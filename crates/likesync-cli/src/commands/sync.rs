//! Sync command - Reconcile liked tracks with the local library
//!
//! Provides the `likesync sync` CLI command which:
//! 1. Refuses an invalid configuration, then resolves the bearer token
//!    (environment, then configuration)
//! 2. Opens the database and fails runs abandoned by a crashed process
//! 3. Runs the ReconcileEngine against the Spotify saved tracks listing
//! 4. Prints the finalized run; the exit code is 1 when the run failed

use std::process::ExitCode;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use tracing::info;

use likesync_core::domain::RunStatus;
use likesync_core::ports::ISyncRunLedger;
use likesync_spotify::{SpotifyClient, SpotifyLikedSource};
use likesync_sync::{ReconcileEngine, ReconcileOptions};

use super::CommandContext;
use crate::output::{format_duration, run_json};

/// Environment variable that overrides `auth.access_token`
pub const ACCESS_TOKEN_ENV: &str = "LIKESYNC_ACCESS_TOKEN";

/// Sync command options
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Override the configured page size (1-50)
    #[arg(long)]
    pub page_size: Option<u32>,
}

impl SyncCommand {
    /// Execute the sync command
    pub async fn execute(&self, ctx: &CommandContext) -> Result<ExitCode> {
        let formatter = ctx.formatter();
        let config = &ctx.config;

        let errors = config.validate();
        if !errors.is_empty() {
            for error in &errors {
                formatter.error(&format!("Invalid configuration: {}", error));
            }
            return Ok(ExitCode::FAILURE);
        }

        let token = pick_access_token(
            std::env::var(ACCESS_TOKEN_ENV).ok(),
            config.auth.access_token.as_deref(),
        );
        let Some(token) = token else {
            formatter.error(&format!(
                "No access token. Set {} or auth.access_token in {}",
                ACCESS_TOKEN_ENV,
                ctx.config_path.display()
            ));
            return Ok(ExitCode::FAILURE);
        };

        let store = ctx.open_store().await?;

        let stale_before = stale_cutoff(Utc::now(), config.sync.stale_run_after_secs)?;
        let abandoned = store
            .fail_abandoned_runs(stale_before, "Abandoned: the process ended before the run finished")
            .await?;
        if abandoned > 0 {
            formatter.warn(&format!("Closed {} abandoned sync run(s)", abandoned));
        }

        let mut options = ReconcileOptions::from_config(&config.sync);
        if let Some(page_size) = self.page_size {
            options = options.with_page_size(page_size);
        }

        let client = SpotifyClient::from_config(&config.remote, token);
        let source = SpotifyLikedSource::new(client);
        let engine = ReconcileEngine::new(options);

        formatter.info("Fetching liked tracks...");
        info!(page_size = engine.options().page_size(), "Starting sync");

        let run = engine.reconcile(&source, &store).await;

        if ctx.is_json() {
            formatter.print_json(&run_json(&run));
        } else {
            let duration = run
                .duration_seconds()
                .map(format_duration)
                .unwrap_or_else(|| "-".to_string());

            match run.status() {
                RunStatus::Completed => {
                    formatter.success(&format!("Sync completed in {}", duration))
                }
                _ => formatter.error(&format!(
                    "Sync failed after {}: {}",
                    duration,
                    run.error_message().unwrap_or("unknown error")
                )),
            }

            formatter.info(&format!("Added:     {}", run.tracks_added()));
            formatter.info(&format!("Updated:   {}", run.tracks_updated()));
            formatter.info(&format!("Removed:   {}", run.tracks_removed()));
            if run.tracks_skipped() > 0 {
                formatter.info(&format!("Skipped:   {}", run.tracks_skipped()));
            }
            formatter.info(&format!("Processed: {}", run.total_tracks_processed()));
            if let Some(kind) = run.error_kind() {
                formatter.info(&format!("Failure:   {}", kind));
            }
        }

        Ok(if run.status() == RunStatus::Completed {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }
}

/// Start time before which a pending run counts as abandoned
///
/// Always in the past relative to `now`.
fn stale_cutoff(now: DateTime<Utc>, stale_after_secs: u64) -> Result<DateTime<Utc>> {
    let window = i64::try_from(stale_after_secs)
        .ok()
        .filter(|secs| *secs > 0)
        .and_then(chrono::Duration::try_seconds)
        .ok_or_else(|| anyhow!("sync.stale_run_after_secs out of range: {}", stale_after_secs))?;

    now.checked_sub_signed(window)
        .ok_or_else(|| anyhow!("sync.stale_run_after_secs out of range: {}", stale_after_secs))
}

/// Chooses the bearer token: a non-blank environment value wins
fn pick_access_token(from_env: Option<String>, configured: Option<&str>) -> Option<String> {
    [from_env.as_deref(), configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_string)
}
