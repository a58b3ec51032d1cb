//! Sluice Core
//!
//! Core types shared by the Sluice control plane.
//!
//! This crate contains:
//! - Domain types: pipelines, element invocations, reconfiguration results
//! - DTOs: Data transfer objects for orchestrator and element worker APIs

pub mod domain;
pub mod dto;
