//! Data Transfer Objects for inter-service communication
//!
//! This module contains DTOs used between the orchestrator, its clients and
//! the element workers that accept live reconfiguration calls.

pub mod element;
pub mod pipeline;
