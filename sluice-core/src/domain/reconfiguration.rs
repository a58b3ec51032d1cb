//! Reconfiguration domain types
//!
//! Deltas and statuses exist only for the duration of one reconfiguration
//! round; none of them are persisted.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::pipeline::{DeploymentTarget, FreeTextParameter, PipelineGraph};

/// Changed parameter values for one live element instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconfigurationDelta {
    pub deployment_running_instance_id: String,
    pub element_name: String,
    pub target: DeploymentTarget,
    /// New values, taken from the desired pipeline
    pub changed_parameters: Vec<FreeTextParameter>,
}

/// Outcome of applying one delta
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementStatus {
    pub instance_id: String,
    pub element_name: String,
    pub success: bool,
    pub message: String,
}

impl ElementStatus {
    pub fn succeeded(delta: &ReconfigurationDelta, message: impl Into<String>) -> Self {
        Self {
            instance_id: delta.deployment_running_instance_id.clone(),
            element_name: delta.element_name.clone(),
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(delta: &ReconfigurationDelta, message: impl Into<String>) -> Self {
        Self {
            instance_id: delta.deployment_running_instance_id.clone(),
            element_name: delta.element_name.clone(),
            success: false,
            message: message.into(),
        }
    }
}

/// Aggregate result of a reconfiguration round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationStatus {
    pub pipeline_id: Uuid,
    pub title: String,
    pub success: bool,
    pub element_statuses: Vec<ElementStatus>,
}

impl OperationStatus {
    /// Builds the round result; succeeds only if every element succeeded
    pub fn aggregate(pipeline: &PipelineGraph, element_statuses: Vec<ElementStatus>) -> Self {
        let success = element_statuses.iter().all(|s| s.success);
        let title = if success {
            format!(
                "Successfully reconfigured Pipeline Elements in Pipeline {}",
                pipeline.name
            )
        } else {
            format!(
                "Could not reconfigure all Pipeline Elements in Pipeline {}",
                pipeline.name
            )
        };

        Self {
            pipeline_id: pipeline.id,
            title,
            success,
            element_statuses,
        }
    }

    pub fn failed_elements(&self) -> impl Iterator<Item = &ElementStatus> {
        self.element_statuses.iter().filter(|s| !s.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> PipelineGraph {
        PipelineGraph {
            id: Uuid::new_v4(),
            name: "temperature".to_string(),
            description: None,
            elements: vec![],
        }
    }

    fn delta(instance_id: &str) -> ReconfigurationDelta {
        ReconfigurationDelta {
            deployment_running_instance_id: instance_id.to_string(),
            element_name: "Threshold".to_string(),
            target: DeploymentTarget {
                node_id: "edge-01".to_string(),
                hostname: "localhost".to_string(),
                port: 7077,
            },
            changed_parameters: vec![],
        }
    }

    #[test]
    fn test_aggregate_empty_is_success() {
        let pipeline = pipeline();
        let status = OperationStatus::aggregate(&pipeline, vec![]);

        assert!(status.success);
        assert_eq!(status.pipeline_id, pipeline.id);
        assert_eq!(
            status.title,
            "Successfully reconfigured Pipeline Elements in Pipeline temperature"
        );
    }

    #[test]
    fn test_aggregate_requires_unanimity() {
        let status = OperationStatus::aggregate(
            &pipeline(),
            vec![
                ElementStatus::succeeded(&delta("i-1"), "applied"),
                ElementStatus::failed(&delta("i-2"), "connection refused"),
                ElementStatus::succeeded(&delta("i-3"), "applied"),
            ],
        );

        assert!(!status.success);
        assert_eq!(status.element_statuses.len(), 3);
        assert_eq!(
            status.title,
            "Could not reconfigure all Pipeline Elements in Pipeline temperature"
        );

        let failed: Vec<_> = status.failed_elements().map(|s| s.instance_id.as_str()).collect();
        assert_eq!(failed, vec!["i-2"]);
    }
}
