//! Pipeline DTOs for inter-service communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::pipeline::PipelineGraph;

/// Request to reconfigure the running elements of a pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconfigurePipeline {
    /// Edited pipeline definition
    pub pipeline: PipelineGraph,

    /// Also store the edited definition as the new source of truth
    #[serde(default)]
    pub persist: bool,
}

/// Lightweight pipeline summary for listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub id: Uuid,
    pub name: String,
    pub element_count: usize,
    pub reconfigurable_count: usize,
}

impl From<&PipelineGraph> for PipelineSummary {
    fn from(pipeline: &PipelineGraph) -> Self {
        Self {
            id: pipeline.id,
            name: pipeline.name.clone(),
            element_count: pipeline.elements.len(),
            reconfigurable_count: pipeline.reconfigurable_count(),
        }
    }
}
