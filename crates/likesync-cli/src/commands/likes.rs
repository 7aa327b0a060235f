//! Likes command - List stored tracks
//!
//! Shows the locally stored snapshots, most recently liked first. By default
//! only tracks that are still liked are listed.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use likesync_core::ports::{ITrackStore, TrackFilter};

use super::CommandContext;
use crate::output::{track_json, track_line};

/// Likes command options
#[derive(Debug, Args)]
pub struct LikesCommand {
    /// Include tracks that are no longer liked
    #[arg(long)]
    pub all: bool,

    /// Maximum number of tracks to show
    #[arg(long, default_value_t = 20)]
    pub limit: u32,
}

impl LikesCommand {
    /// Execute the likes command
    pub async fn execute(&self, ctx: &CommandContext) -> Result<ExitCode> {
        let formatter = ctx.formatter();
        let store = ctx.open_store().await?;

        let mut filter = TrackFilter::new().with_limit(self.limit);
        if !self.all {
            filter = filter.liked_only();
        }

        let tracks = store
            .list_tracks(&filter)
            .await
            .context("Failed to list tracks")?;
        let liked = store
            .count_liked()
            .await
            .context("Failed to count liked tracks")?;

        if ctx.is_json() {
            let items: Vec<serde_json::Value> = tracks.iter().map(track_json).collect();
            formatter.print_json(&serde_json::json!({
                "liked_count": liked,
                "tracks": items,
            }));
            return Ok(ExitCode::SUCCESS);
        }

        formatter.success(&format!("{} liked track(s) stored", liked));
        for track in &tracks {
            formatter.info(&track_line(track));
        }

        Ok(ExitCode::SUCCESS)
    }
}
