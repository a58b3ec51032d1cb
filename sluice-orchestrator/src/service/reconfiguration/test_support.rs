//! Builders and doubles shared by the reconfiguration tests

use anyhow::Result;
use async_trait::async_trait;
use sluice_core::domain::pipeline::{
    DeploymentTarget, ElementInvocation, ElementKind, FreeTextParameter, PipelineGraph,
    StaticParameter,
};
use sluice_core::domain::reconfiguration::ReconfigurationDelta;
use sluice_core::dto::element::{ReconfigureElement, ReconfigureElementAck};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

use crate::repository::ElementRepository;

pub fn pipeline(elements: Vec<ElementInvocation>) -> PipelineGraph {
    PipelineGraph {
        id: Uuid::new_v4(),
        name: "temperature".to_string(),
        description: None,
        elements,
    }
}

pub fn element(
    element_id: &str,
    instance_id: &str,
    parameters: Vec<StaticParameter>,
) -> ElementInvocation {
    ElementInvocation {
        element_id: element_id.to_string(),
        name: format!("{element_id} processor"),
        kind: ElementKind::Processor,
        deployment_running_instance_id: instance_id.to_string(),
        deployment_target: DeploymentTarget {
            node_id: format!("node-{instance_id}"),
            hostname: "localhost".to_string(),
            port: 7077,
        },
        parameters,
    }
}

pub fn free_text(name: &str, value: &str, reconfigurable: bool) -> StaticParameter {
    StaticParameter::FreeText(FreeTextParameter {
        internal_name: name.to_string(),
        value: value.to_string(),
        reconfigurable,
    })
}

pub fn delta(instance_id: &str, changed: &[(&str, &str)]) -> ReconfigurationDelta {
    ReconfigurationDelta {
        deployment_running_instance_id: instance_id.to_string(),
        element_name: format!("{instance_id} processor"),
        target: DeploymentTarget {
            node_id: format!("node-{instance_id}"),
            hostname: "localhost".to_string(),
            port: 7077,
        },
        changed_parameters: changed
            .iter()
            .map(|(name, value)| FreeTextParameter::new(*name, *value).reconfigurable())
            .collect(),
    }
}

/// Element repository that records every call
///
/// Instances registered with `failing` answer with an error, instances
/// registered with `hanging` never answer.
#[derive(Default)]
pub struct RecordingElements {
    calls: Mutex<Vec<ReconfigureElement>>,
    failures: HashMap<String, String>,
    hangs: HashSet<String>,
}

impl RecordingElements {
    pub fn failing(mut self, instance_id: &str, message: &str) -> Self {
        self.failures
            .insert(instance_id.to_string(), message.to_string());
        self
    }

    pub fn hanging(mut self, instance_id: &str) -> Self {
        self.hangs.insert(instance_id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<ReconfigureElement> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ElementRepository for RecordingElements {
    async fn reconfigure(
        &self,
        _target: &DeploymentTarget,
        request: &ReconfigureElement,
    ) -> Result<ReconfigureElementAck> {
        self.calls.lock().unwrap().push(request.clone());

        if self.hangs.contains(&request.instance_id) {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }

        if let Some(message) = self.failures.get(&request.instance_id) {
            anyhow::bail!("{}", message);
        }

        Ok(ReconfigureElementAck {
            success: true,
            message: None,
        })
    }
}
