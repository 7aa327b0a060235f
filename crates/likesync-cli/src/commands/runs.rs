//! Runs command - Show the sync run history
//!
//! Lists the most recent runs from the ledger, newest first.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use likesync_core::ports::ISyncRunLedger;

use super::CommandContext;
use crate::output::{run_json, run_line};

/// Runs command options
#[derive(Debug, Args)]
pub struct RunsCommand {
    /// Maximum number of runs to show
    #[arg(long, default_value_t = 10)]
    pub limit: u32,
}

impl RunsCommand {
    /// Execute the runs command
    pub async fn execute(&self, ctx: &CommandContext) -> Result<ExitCode> {
        let formatter = ctx.formatter();
        let store = ctx.open_store().await?;

        let runs = store
            .recent_runs(self.limit)
            .await
            .context("Failed to read sync runs")?;

        if ctx.is_json() {
            let json: Vec<serde_json::Value> = runs.iter().map(run_json).collect();
            formatter.print_json(&serde_json::Value::Array(json));
            return Ok(ExitCode::SUCCESS);
        }

        if runs.is_empty() {
            formatter.info("No sync runs recorded yet. Run 'likesync sync' first.");
            return Ok(ExitCode::SUCCESS);
        }

        formatter.success(&format!("Last {} sync run(s)", runs.len()));
        for run in &runs {
            formatter.info(&run_line(run));
            if let Some(message) = run.error_message() {
                formatter.info(&format!("    {}", message));
            }
        }

        let latest = store
            .latest_completed_run()
            .await
            .context("Failed to read latest completed run")?;
        match latest {
            Some(run) => formatter.info(&format!(
                "Last successful sync: {}",
                run.completed_at()
                    .unwrap_or_else(|| run.started_at())
                    .format("%Y-%m-%d %H:%M:%S")
            )),
            None => formatter.info("No successful sync yet"),
        }

        Ok(ExitCode::SUCCESS)
    }
}
