//! likesync CLI - Command-line interface for likesync
//!
//! Provides commands for:
//! - Reconciling Spotify liked tracks into the local library
//! - Viewing the sync run history
//! - Listing stored tracks
//! - Viewing and editing configuration

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use likesync_core::config::Config;

mod commands;
mod output;

use commands::{
    completions::CompletionsCommand, config::ConfigCommand, likes::LikesCommand,
    runs::RunsCommand, sync::SyncCommand, CommandContext,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "likesync", version, about = "Keep a local copy of your Spotify liked tracks")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconcile liked tracks with the local library
    Sync(SyncCommand),
    /// Show recent sync runs
    Runs(RunsCommand),
    /// List stored tracks
    Likes(LikesCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = if config_path.exists() {
        Config::load(&config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?
    } else {
        Config::default()
    };

    // Setup tracing
    let filter = match cli.verbose {
        0 => config.logging.level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    let ctx = CommandContext::new(format, config_path, config);

    match cli.command {
        Commands::Sync(cmd) => cmd.execute(&ctx).await,
        Commands::Runs(cmd) => cmd.execute(&ctx).await,
        Commands::Likes(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
        Commands::Completions(cmd) => cmd.execute(&ctx).await,
    }
}
