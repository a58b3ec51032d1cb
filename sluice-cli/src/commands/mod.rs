//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod pipeline;

pub use pipeline::PipelineCommands;

use anyhow::Result;
use clap::Subcommand;
use colored::*;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Check that the orchestrator and its pipeline store are reachable
    Health,
    /// Pipeline definitions, snapshots and live reconfiguration
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Health => check_health(config).await,
        Commands::Pipeline { command } => pipeline::handle_pipeline_command(command, config).await,
    }
}

async fn check_health(config: &Config) -> Result<()> {
    let client = config.client()?;

    client.health().await?;

    println!(
        "{} Orchestrator at {} is healthy",
        "✓".green().bold(),
        client.base_url().cyan()
    );

    Ok(())
}
