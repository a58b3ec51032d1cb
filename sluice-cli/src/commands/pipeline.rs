//! Pipeline command handlers
//!
//! Handles listing and inspecting pipelines, registering definitions and
//! pushing edited definitions to the running elements.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use sluice_core::domain::pipeline::{PipelineGraph, PipelineSnapshot, StaticParameter};
use sluice_core::domain::reconfiguration::OperationStatus;
use sluice_core::dto::pipeline::PipelineSummary;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::id_resolver::resolve_pipeline_id;
use crate::types::IdOrPrefix;
use sluice_client::OrchestratorClient;

/// Pipeline subcommands
#[derive(Subcommand)]
pub enum PipelineCommands {
    /// List all pipelines
    List,
    /// Show a stored pipeline definition
    Get {
        /// Pipeline ID or unambiguous prefix
        id: IdOrPrefix,
    },
    /// Show the state the running elements were last confirmed with
    Snapshot {
        /// Pipeline ID or unambiguous prefix
        id: IdOrPrefix,
    },
    /// Register or replace a pipeline definition without touching running elements
    Push {
        /// Path to the pipeline definition (JSON)
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Apply changed reconfigurable parameters to the running elements
    Reconfigure {
        /// Path to the edited pipeline definition (JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// Also store the edited definition
        #[arg(long)]
        persist: bool,
    },
}

/// Handle pipeline commands
///
/// Routes pipeline subcommands to their respective handlers.
pub async fn handle_pipeline_command(command: PipelineCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        PipelineCommands::List => list_pipelines(&client).await,
        PipelineCommands::Get { id } => get_pipeline(&client, &id).await,
        PipelineCommands::Snapshot { id } => get_snapshot(&client, &id).await,
        PipelineCommands::Push { file } => push_pipeline(&client, &file).await,
        PipelineCommands::Reconfigure { file, persist } => {
            reconfigure_pipeline(&client, &file, persist).await
        }
    }
}

/// Read a pipeline definition from a JSON file
fn read_pipeline_file(path: &Path) -> Result<PipelineGraph> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pipeline file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse pipeline definition: {}", path.display()))
}

/// List all pipelines
async fn list_pipelines(client: &OrchestratorClient) -> Result<()> {
    let pipelines = client.list_pipelines().await?;

    if pipelines.is_empty() {
        println!("{}", "No pipelines found.".yellow());
    } else {
        println!(
            "{}",
            format!("Found {} pipeline(s):", pipelines.len()).bold()
        );
        println!();
        for pipeline in pipelines {
            print_pipeline_summary(&pipeline);
        }
    }

    Ok(())
}

/// Get and display a single pipeline definition
async fn get_pipeline(client: &OrchestratorClient, id: &IdOrPrefix) -> Result<()> {
    let uuid = resolve_pipeline_id(client, id).await?;

    let pipeline = client.get_pipeline(uuid).await?;

    println!("{}", "Pipeline Definition:".bold());
    print_pipeline_details(&pipeline);

    Ok(())
}

/// Get and display the running snapshot of a pipeline
async fn get_snapshot(client: &OrchestratorClient, id: &IdOrPrefix) -> Result<()> {
    let uuid = resolve_pipeline_id(client, id).await?;

    let snapshot = client.get_snapshot(uuid).await?;

    print_snapshot(&snapshot);

    Ok(())
}

/// Register or replace a pipeline definition
async fn push_pipeline(client: &OrchestratorClient, file: &Path) -> Result<()> {
    let pipeline = read_pipeline_file(file)?;

    let summary = client.save_pipeline(&pipeline).await?;

    println!("{}", "✓ Pipeline stored successfully!".green().bold());
    println!("  ID:       {}", summary.id.to_string().cyan());
    println!("  Name:     {}", summary.name.bold());
    println!(
        "  Elements: {} ({} reconfigurable parameter(s))",
        summary.element_count,
        summary.reconfigurable_count.to_string().dimmed()
    );

    Ok(())
}

/// Reconfigure the running elements of a pipeline
///
/// Every element status is printed; a round that did not fully succeed
/// ends the command with an error.
async fn reconfigure_pipeline(
    client: &OrchestratorClient,
    file: &Path,
    persist: bool,
) -> Result<()> {
    let pipeline = read_pipeline_file(file)?;

    let status = client.reconfigure_pipeline(&pipeline, persist).await?;

    print_operation_status(&status);

    if persist {
        println!("  {}", "Definition stored.".dimmed());
    }

    if !status.success {
        anyhow::bail!(
            "{} of {} element(s) were not reconfigured",
            status.failed_elements().count(),
            status.element_statuses.len()
        );
    }

    Ok(())
}

/// Print a pipeline summary
fn print_pipeline_summary(pipeline: &PipelineSummary) {
    println!("  {} {}", "▸".cyan(), pipeline.name.bold());
    println!("    ID:       {}", pipeline.id.to_string().dimmed());
    println!(
        "    Elements: {} ({} reconfigurable parameter(s))",
        pipeline.element_count,
        pipeline.reconfigurable_count
    );
    println!();
}

/// Print detailed pipeline information
fn print_pipeline_details(pipeline: &PipelineGraph) {
    println!("  ID:          {}", pipeline.id.to_string().cyan());
    println!("  Name:        {}", pipeline.name.bold());
    if let Some(desc) = &pipeline.description {
        println!("  Description: {}", desc);
    }

    println!("\n{}", "Elements:".bold());
    println!("{}", "─".repeat(80).dimmed());
    for element in &pipeline.elements {
        println!(
            "  {} {} [{}] {}",
            "▸".cyan(),
            element.name.bold(),
            element.kind,
            element.element_id.dimmed()
        );
        println!(
            "    Instance: {} on {}",
            element.deployment_running_instance_id, element.deployment_target
        );
        for parameter in &element.parameters {
            println!("    {}", describe_parameter(parameter));
        }
    }
    println!("{}", "─".repeat(80).dimmed());
}

fn print_snapshot(snapshot: &PipelineSnapshot) {
    println!("{}", "Running Snapshot:".bold());
    println!(
        "  Captured:    {}",
        snapshot.captured_at.format("%Y-%m-%d %H:%M:%S")
    );
    print_pipeline_details(&snapshot.pipeline);
}

fn print_operation_status(status: &OperationStatus) {
    if status.success {
        println!("{}", format!("✓ {}", status.title).green().bold());
    } else {
        println!("{}", format!("✗ {}", status.title).red().bold());
    }

    if status.element_statuses.is_empty() {
        println!("  {}", "No reconfigurable parameter changed.".dimmed());
    }

    for element in &status.element_statuses {
        let marker = if element.success {
            "✓".green()
        } else {
            "✗".red()
        };
        println!(
            "  {} {} ({}): {}",
            marker,
            element.element_name.bold(),
            element.instance_id.dimmed(),
            element.message
        );
    }
}

fn describe_parameter(parameter: &StaticParameter) -> String {
    match parameter {
        StaticParameter::FreeText(p) if p.reconfigurable => {
            format!("{} = {} {}", p.internal_name, p.value, "(live)".yellow())
        }
        StaticParameter::FreeText(p) => format!("{} = {}", p.internal_name, p.value),
        StaticParameter::OneOf(p) => format!(
            "{} = {} (one of {})",
            p.internal_name,
            p.selected.as_deref().unwrap_or("-"),
            p.options.join(", ")
        ),
        StaticParameter::Mapping(p) => format!(
            "{} -> {}",
            p.internal_name,
            p.selector.as_deref().unwrap_or("-")
        ),
    }
}
