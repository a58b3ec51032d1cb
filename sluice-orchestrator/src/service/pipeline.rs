//! Pipeline Service
//!
//! Business logic for pipeline definitions and running snapshots.

use sluice_core::domain::pipeline::{PipelineGraph, PipelineSnapshot};
use std::collections::HashSet;
use uuid::Uuid;

use crate::repository::{PipelineStore, StoreError};

/// Service error type
#[derive(Debug)]
pub enum PipelineError {
    NotFound(Uuid),
    ValidationError(String),
    Store(StoreError),
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        PipelineError::Store(err)
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Get a pipeline definition by ID
pub async fn get_pipeline(store: &dyn PipelineStore, id: Uuid) -> Result<PipelineGraph> {
    let pipeline = store
        .find_pipeline(id)
        .await?
        .ok_or(PipelineError::NotFound(id))?;

    Ok(pipeline)
}

/// List all pipeline definitions
pub async fn list_pipelines(store: &dyn PipelineStore) -> Result<Vec<PipelineGraph>> {
    let pipelines = store.list_pipelines().await?;
    Ok(pipelines)
}

/// Create or replace a pipeline definition
///
/// Registering a definition is how a deployed pipeline becomes known to the
/// orchestrator. The running snapshot is left untouched.
pub async fn save_pipeline(store: &dyn PipelineStore, pipeline: &PipelineGraph) -> Result<()> {
    validate_pipeline(pipeline)?;

    store.overwrite_pipeline(pipeline).await?;

    tracing::info!("Pipeline saved: {} ({})", pipeline.name, pipeline.id);

    Ok(())
}

/// Get the snapshot a pipeline's elements were last confirmed to run with
pub async fn get_snapshot(store: &dyn PipelineStore, id: Uuid) -> Result<PipelineSnapshot> {
    store
        .find_snapshot(id)
        .await?
        .ok_or(PipelineError::NotFound(id))
}

// =============================================================================
// Validation
// =============================================================================

pub fn validate_pipeline(pipeline: &PipelineGraph) -> Result<()> {
    if pipeline.name.trim().is_empty() {
        return Err(PipelineError::ValidationError(
            "Pipeline name cannot be empty".to_string(),
        ));
    }

    if pipeline.name.len() > 255 {
        return Err(PipelineError::ValidationError(
            "Pipeline name is too long (max 255 characters)".to_string(),
        ));
    }

    let mut seen = HashSet::new();

    for element in &pipeline.elements {
        if element.element_id.trim().is_empty() {
            return Err(PipelineError::ValidationError(format!(
                "Element '{}' has an empty element id",
                element.name
            )));
        }

        if !seen.insert(element.element_id.as_str()) {
            return Err(PipelineError::ValidationError(format!(
                "Duplicate element id '{}'",
                element.element_id
            )));
        }

        if element.deployment_running_instance_id.trim().is_empty() {
            return Err(PipelineError::ValidationError(format!(
                "Element '{}' has no running instance id",
                element.element_id
            )));
        }

        if element.deployment_target.port == 0 {
            return Err(PipelineError::ValidationError(format!(
                "Element '{}' targets port 0 on node {}",
                element.element_id, element.deployment_target.node_id
            )));
        }

        if element
            .parameters
            .iter()
            .any(|p| p.internal_name().trim().is_empty())
        {
            return Err(PipelineError::ValidationError(format!(
                "Element '{}' has a parameter without a name",
                element.element_id
            )));
        }
    }

    Ok(())
}
