//! Element reconfiguration executor
//!
//! Applies one delta to one live element instance and folds every outcome,
//! including timeouts, into an [`ElementStatus`]. It never returns an error.

use sluice_core::domain::pipeline::PipelineGraph;
use sluice_core::domain::reconfiguration::{ElementStatus, ReconfigurationDelta};
use sluice_core::dto::element::ReconfigureElement;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, info, info_span, warn};

use crate::repository::ElementRepository;

pub struct ElementReconfigurationExecutor {
    elements: Arc<dyn ElementRepository>,
    call_timeout: Duration,
}

impl ElementReconfigurationExecutor {
    pub fn new(elements: Arc<dyn ElementRepository>, call_timeout: Duration) -> Self {
        Self {
            elements,
            call_timeout,
        }
    }

    /// Sends the delta's parameters to its instance in a single call
    pub async fn execute(
        &self,
        pipeline: &PipelineGraph,
        delta: &ReconfigurationDelta,
    ) -> ElementStatus {
        let span = info_span!(
            "reconfigure_element",
            pipeline_id = %pipeline.id,
            pipeline = %pipeline.name,
            instance_id = %delta.deployment_running_instance_id,
            node = %delta.target.node_id,
        );

        self.apply(pipeline, delta).instrument(span).await
    }

    async fn apply(&self, pipeline: &PipelineGraph, delta: &ReconfigurationDelta) -> ElementStatus {
        let request = ReconfigureElement {
            pipeline_id: pipeline.id,
            instance_id: delta.deployment_running_instance_id.clone(),
            parameters: delta.changed_parameters.clone(),
        };

        let call = self.elements.reconfigure(&delta.target, &request);

        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(Ok(ack)) => {
                info!(
                    "Reconfigured {} parameter(s) of {}",
                    delta.changed_parameters.len(),
                    delta.element_name
                );
                let message = ack
                    .message
                    .unwrap_or_else(|| format!("Reconfigured {}", delta.element_name));
                ElementStatus::succeeded(delta, message)
            }
            Ok(Err(e)) => {
                warn!("Reconfiguration of {} failed: {:#}", delta.element_name, e);
                ElementStatus::failed(delta, format!("{:#}", e))
            }
            Err(_) => {
                warn!(
                    "Reconfiguration of {} timed out after {:?}",
                    delta.element_name, self.call_timeout
                );
                ElementStatus::failed(
                    delta,
                    format!(
                        "Node {} did not answer within {:?}",
                        delta.target, self.call_timeout
                    ),
                )
            }
        }
    }
}
