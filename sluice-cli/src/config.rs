//! Configuration module
//!
//! Handles CLI configuration including orchestrator URL and other settings.

use anyhow::{Context, Result};
use sluice_client::OrchestratorClient;
use std::time::Duration;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the orchestrator service
    pub orchestrator_url: String,

    /// Upper bound for one orchestrator request; a reconfiguration round
    /// answers only after every element call finished
    pub request_timeout: Duration,
}

impl Config {
    /// Build an orchestrator client honouring the configured timeout
    pub fn client(&self) -> Result<OrchestratorClient> {
        let http = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(OrchestratorClient::with_client(&self.orchestrator_url, http))
    }
}
