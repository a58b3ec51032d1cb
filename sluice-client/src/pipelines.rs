//! Pipeline-related API endpoints

use crate::OrchestratorClient;
use crate::error::Result;
use sluice_core::domain::pipeline::{PipelineGraph, PipelineSnapshot};
use sluice_core::domain::reconfiguration::OperationStatus;
use sluice_core::dto::pipeline::{PipelineSummary, ReconfigurePipeline};
use uuid::Uuid;

impl OrchestratorClient {
    // =============================================================================
    // Pipeline Management
    // =============================================================================

    /// List all pipelines
    pub async fn list_pipelines(&self) -> Result<Vec<PipelineSummary>> {
        let url = format!("{}/pipeline/list", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Get a pipeline definition by ID
    pub async fn get_pipeline(&self, pipeline_id: Uuid) -> Result<PipelineGraph> {
        let url = format!("{}/pipeline/{}", self.base_url, pipeline_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Create or replace a pipeline definition
    ///
    /// The running elements are not touched; use
    /// [`reconfigure_pipeline`](Self::reconfigure_pipeline) for that.
    pub async fn save_pipeline(&self, pipeline: &PipelineGraph) -> Result<PipelineSummary> {
        let url = format!("{}/pipeline/{}", self.base_url, pipeline.id);
        tracing::debug!("Saving pipeline {} to {}", pipeline.id, url);
        let response = self.client.put(&url).json(pipeline).send().await?;

        self.handle_response(response).await
    }

    /// Get the state a pipeline's elements were last confirmed to run with
    pub async fn get_snapshot(&self, pipeline_id: Uuid) -> Result<PipelineSnapshot> {
        let url = format!("{}/pipeline/{}/snapshot", self.base_url, pipeline_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Reconfiguration
    // =============================================================================

    /// Apply the changed reconfigurable parameters of `pipeline` to its
    /// running elements
    ///
    /// # Arguments
    /// * `pipeline` - Edited pipeline definition
    /// * `persist` - Also store the edited definition
    ///
    /// # Returns
    /// The round's status. A round where elements failed is still `Ok`;
    /// check `success` on the returned status.
    ///
    /// # Example
    /// ```no_run
    /// # use sluice_client::OrchestratorClient;
    /// # use sluice_core::domain::pipeline::PipelineGraph;
    /// # async fn example(pipeline: PipelineGraph) -> anyhow::Result<()> {
    /// let client = OrchestratorClient::new("http://localhost:8080");
    /// let status = client.reconfigure_pipeline(&pipeline, true).await?;
    /// println!("{}", status.title);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn reconfigure_pipeline(
        &self,
        pipeline: &PipelineGraph,
        persist: bool,
    ) -> Result<OperationStatus> {
        let url = format!("{}/pipeline/{}/reconfigure", self.base_url, pipeline.id);
        let req = ReconfigurePipeline {
            pipeline: pipeline.clone(),
            persist,
        };
        tracing::debug!("Reconfiguring pipeline {} (persist: {})", pipeline.id, persist);
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientError;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pipeline() -> PipelineGraph {
        PipelineGraph {
            id: Uuid::new_v4(),
            name: "alerts".to_string(),
            description: None,
            elements: vec![],
        }
    }

    #[tokio::test]
    async fn test_list_pipelines() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/pipeline/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": id,
                "name": "alerts",
                "element_count": 3,
                "reconfigurable_count": 2
            }])))
            .mount(&server)
            .await;

        let pipelines = OrchestratorClient::new(server.uri())
            .list_pipelines()
            .await
            .unwrap();

        assert_eq!(pipelines.len(), 1);
        assert_eq!(pipelines[0].id, id);
        assert_eq!(pipelines[0].reconfigurable_count, 2);
    }

    #[tokio::test]
    async fn test_get_missing_pipeline() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path(format!("/pipeline/{id}")))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({ "error": format!("Pipeline {id} not found") })),
            )
            .mount(&server)
            .await;

        let err = OrchestratorClient::new(server.uri())
            .get_pipeline(id)
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_save_pipeline_puts_definition() {
        let server = MockServer::start().await;
        let p = pipeline();

        Mock::given(method("PUT"))
            .and(path(format!("/pipeline/{}", p.id)))
            .and(body_json(&p))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": p.id,
                "name": "alerts",
                "element_count": 0,
                "reconfigurable_count": 0
            })))
            .expect(1)
            .mount(&server)
            .await;

        let summary = OrchestratorClient::new(server.uri())
            .save_pipeline(&p)
            .await
            .unwrap();

        assert_eq!(summary.id, p.id);
    }

    #[tokio::test]
    async fn test_reconfigure_returns_failed_status() {
        let server = MockServer::start().await;
        let p = pipeline();

        Mock::given(method("POST"))
            .and(path(format!("/pipeline/{}/reconfigure", p.id)))
            .and(body_json(json!({ "pipeline": &p, "persist": true })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pipeline_id": p.id,
                "title": "Could not reconfigure all Pipeline Elements in Pipeline alerts",
                "success": false,
                "element_statuses": [{
                    "instance_id": "i-1",
                    "element_name": "Threshold filter",
                    "success": false,
                    "message": "node offline"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let status = OrchestratorClient::new(server.uri())
            .reconfigure_pipeline(&p, true)
            .await
            .unwrap();

        assert!(!status.success);
        assert_eq!(status.element_statuses[0].message, "node offline");
    }

    #[tokio::test]
    async fn test_reconfigure_snapshot_failure_is_server_error() {
        let server = MockServer::start().await;
        let p = pipeline();

        Mock::given(method("POST"))
            .and(path(format!("/pipeline/{}/reconfigure", p.id)))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({ "error": "Failed to capture pipeline snapshot" })),
            )
            .mount(&server)
            .await;

        let err = OrchestratorClient::new(server.uri())
            .reconfigure_pipeline(&p, false)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::ApiError { status: 500, .. }));
    }
}
