//! Element worker DTOs
//!
//! Payloads exchanged with the node hosting a live element instance.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::pipeline::FreeTextParameter;

/// Request to apply new parameter values to a running element instance
///
/// All changed parameters of one instance travel in a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconfigureElement {
    pub pipeline_id: Uuid,
    pub instance_id: String,
    pub parameters: Vec<FreeTextParameter>,
}

/// Reply from the element worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconfigureElementAck {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}
