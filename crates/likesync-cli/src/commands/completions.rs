//! Shell completions generation command
//!
//! Generates shell completions for bash, zsh, fish, elvish, and powershell.
//! Usage: `likesync completions bash > ~/.local/share/bash-completion/completions/likesync`

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::Shell;

use super::CommandContext;

/// Arguments for the completions subcommand
#[derive(Debug, clap::Args)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsCommand {
    /// Execute the completions command, printing completions to stdout
    pub async fn execute(&self, _ctx: &CommandContext) -> Result<ExitCode> {
        let mut cmd = crate::Cli::command();
        clap_complete::generate(self.shell, &mut cmd, "likesync", &mut io::stdout());
        Ok(ExitCode::SUCCESS)
    }
}
