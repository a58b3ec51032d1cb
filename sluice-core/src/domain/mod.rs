//! Core domain types
//!
//! This module contains the core domain structures used across Sluice services.
//! The orchestrator persists and reconfigures pipelines built from these types;
//! the client and CLI exchange them over HTTP.

pub mod pipeline;
pub mod reconfiguration;
