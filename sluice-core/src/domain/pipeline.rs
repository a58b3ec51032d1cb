//! Pipeline domain types
//!
//! A pipeline is an ordered list of element invocations. Each invocation is
//! one live instance of a pipeline element (source, processor or sink) placed
//! on a node, together with the static parameters it was started with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline definition
///
/// Structure shared between orchestrator (persists, reconfigures) and the
/// CLI (edits, submits).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineGraph {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub elements: Vec<ElementInvocation>,
}

impl PipelineGraph {
    /// Number of parameters across all elements that may change at runtime
    pub fn reconfigurable_count(&self) -> usize {
        self.elements
            .iter()
            .map(|e| e.reconfigurable_parameters().count())
            .sum()
    }
}

/// One deployed, running instance of a pipeline element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementInvocation {
    /// Identity of the element inside the pipeline, stable across edits
    pub element_id: String,

    pub name: String,

    #[serde(default)]
    pub kind: ElementKind,

    /// Identity of the live remote instance; unchanged until redeployment
    pub deployment_running_instance_id: String,

    pub deployment_target: DeploymentTarget,

    #[serde(default)]
    pub parameters: Vec<StaticParameter>,
}

impl ElementInvocation {
    /// Free-text parameters flagged as reconfigurable, in declaration order
    pub fn reconfigurable_parameters(&self) -> impl Iterator<Item = &FreeTextParameter> {
        self.parameters.iter().filter_map(StaticParameter::as_reconfigurable)
    }
}

/// Role of an element within the pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Source,
    #[default]
    Processor,
    Sink,
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementKind::Source => write!(f, "source"),
            ElementKind::Processor => write!(f, "processor"),
            ElementKind::Sink => write!(f, "sink"),
        }
    }
}

/// Node an element instance runs on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentTarget {
    pub node_id: String,
    pub hostname: String,
    pub port: u16,
}

impl std::fmt::Display for DeploymentTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}:{})", self.node_id, self.hostname, self.port)
    }
}

/// A static parameter of an element invocation
///
/// Only [`StaticParameter::FreeText`] values can be changed on a live
/// instance, and only when flagged `reconfigurable`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StaticParameter {
    FreeText(FreeTextParameter),
    OneOf(SelectionParameter),
    Mapping(MappingParameter),
}

impl StaticParameter {
    pub fn internal_name(&self) -> &str {
        match self {
            StaticParameter::FreeText(p) => &p.internal_name,
            StaticParameter::OneOf(p) => &p.internal_name,
            StaticParameter::Mapping(p) => &p.internal_name,
        }
    }

    /// Returns the free-text parameter if it may be changed at runtime
    pub fn as_reconfigurable(&self) -> Option<&FreeTextParameter> {
        match self {
            StaticParameter::FreeText(p) if p.reconfigurable => Some(p),
            _ => None,
        }
    }
}

/// Named free-text value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeTextParameter {
    pub internal_name: String,
    pub value: String,
    #[serde(default)]
    pub reconfigurable: bool,
}

impl FreeTextParameter {
    pub fn new(internal_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            internal_name: internal_name.into(),
            value: value.into(),
            reconfigurable: false,
        }
    }

    pub fn reconfigurable(mut self) -> Self {
        self.reconfigurable = true;
        self
    }
}

/// Choice among fixed options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionParameter {
    pub internal_name: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub selected: Option<String>,
}

/// Binding of a parameter to a field of the input stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingParameter {
    pub internal_name: String,
    #[serde(default)]
    pub selector: Option<String>,
}

/// Last confirmed-applied version of a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    pub pipeline: PipelineGraph,
    pub captured_at: DateTime<Utc>,
}
