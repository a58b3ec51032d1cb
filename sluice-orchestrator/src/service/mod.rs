//! Service Module
//!
//! Business logic layer for the orchestrator.
//! Services orchestrate between repositories and contain domain logic.

pub mod pipeline;
pub mod reconfiguration;

// Re-export for convenience
pub use pipeline as pipeline_service;
pub use reconfiguration::{ReconfigurationError, ReconfigurationService};
