//! Repository Module
//!
//! Data access layer for the orchestrator.
//! Pipeline stores persist definitions and snapshots; the element repository
//! talks to the nodes running element instances.
//!
//! Both seams are trait-based so the reconfiguration service can be driven
//! by test doubles.

pub mod element;
pub mod memory;
pub mod pipeline;

pub use element::{ElementRepository, HttpElementRepository};
pub use memory::InMemoryPipelineStore;
pub use pipeline::{PgPipelineStore, PipelineStore, StoreError};
