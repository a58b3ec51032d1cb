//! Element repository
//!
//! Handles communication with the nodes hosting live element instances:
//! - Applying new parameter values to a running instance

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Url};
use sluice_core::domain::pipeline::DeploymentTarget;
use sluice_core::dto::element::{ReconfigureElement, ReconfigureElementAck};
use std::net::IpAddr;
use std::time::Duration;

/// Repository trait for calls against running element instances
#[async_trait]
pub trait ElementRepository: Send + Sync {
    /// Sends all changed parameters of one instance in a single call
    ///
    /// # Arguments
    /// * `target` - Node the instance runs on
    /// * `request` - Instance id and new parameter values
    ///
    /// # Returns
    /// The worker's acknowledgement. A worker that rejects the values is
    /// reported as an error.
    async fn reconfigure(
        &self,
        target: &DeploymentTarget,
        request: &ReconfigureElement,
    ) -> Result<ReconfigureElementAck>;
}

/// HTTP implementation of ElementRepository
pub struct HttpElementRepository {
    client: Client,
}

impl HttpElementRepository {
    /// Creates a repository whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build element HTTP client")?;

        Ok(Self { client })
    }

    /// Builds `http://{host}:{port}/element/{instance_id}/reconfigure`
    ///
    /// The instance id is a single percent-encoded path segment; IP
    /// hostnames (including IPv6) are set as IP hosts.
    fn reconfigure_url(target: &DeploymentTarget, instance_id: &str) -> Result<Url> {
        let mut url = Url::parse("http://localhost/").context("Invalid base URL")?;

        match target.hostname.parse::<IpAddr>() {
            Ok(ip) => url
                .set_ip_host(ip)
                .map_err(|_| anyhow!("Cannot address node {} by IP", target.node_id))?,
            Err(_) => url
                .set_host(Some(&target.hostname))
                .with_context(|| format!("Invalid hostname for node {}", target))?,
        }

        url.set_port(Some(target.port))
            .map_err(|_| anyhow!("Cannot set port for node {}", target))?;

        url.path_segments_mut()
            .map_err(|_| anyhow!("Node URL cannot carry a path"))?
            .pop_if_empty()
            .push("element")
            .push(instance_id)
            .push("reconfigure");

        Ok(url)
    }
}

#[async_trait]
impl ElementRepository for HttpElementRepository {
    async fn reconfigure(
        &self,
        target: &DeploymentTarget,
        request: &ReconfigureElement,
    ) -> Result<ReconfigureElementAck> {
        let url = Self::reconfigure_url(target, &request.instance_id)?;

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .with_context(|| format!("Failed to reach node {}", target))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Node {} answered {} - {}", target.node_id, status, body);
        }

        let ack: ReconfigureElementAck = response
            .json()
            .await
            .context("Failed to parse reconfiguration acknowledgement")?;

        if !ack.success {
            anyhow::bail!(
                "Element rejected reconfiguration: {}",
                ack.message.as_deref().unwrap_or("no reason given")
            );
        }

        Ok(ack)
    }
}
