//! Reconfiguration Service
//!
//! Applies an edited pipeline definition to the element instances that are
//! already running, without redeploying the pipeline.
//!
//! A round moves through these phases:
//! 1. `loaded` - the running snapshot (or, before the first round, the stored
//!    definition) is read as the comparison baseline
//! 2. `diffed` - one delta per instance with changed reconfigurable values
//! 3. `executing` - every delta is sent to its node; a failure never stops
//!    the other deltas and applied changes are not rolled back
//! 4. `aggregated` - the round succeeds only if every element succeeded
//! 5. on success the snapshot is replaced by a copy of the desired pipeline
//! 6. `persisted` / `done` - the definition is stored when requested,
//!    whatever the element outcomes were
//!
//! Rounds for the same pipeline must not overlap. This service takes no
//! lock; callers serialize requests per pipeline id.

pub mod delta;
pub mod executor;

#[cfg(test)]
mod test_support;

pub use executor::ElementReconfigurationExecutor;

use futures::stream::{self, StreamExt};
use sluice_core::domain::pipeline::PipelineGraph;
use sluice_core::domain::reconfiguration::{ElementStatus, OperationStatus, ReconfigurationDelta};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::repository::{PipelineStore, StoreError};

/// Errors that end a round without an operation status
#[derive(Debug, Error)]
pub enum ReconfigurationError {
    /// Nothing was ever deployed under this id
    #[error("Pipeline {0} not found")]
    NotFound(Uuid),

    /// The snapshot could not be captured after a successful round; the
    /// previous snapshot is still in place
    #[error("Failed to capture pipeline snapshot: {0}")]
    Serialization(serde_json::Error),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ReconfigurationError {
    fn from(err: StoreError) -> Self {
        ReconfigurationError::Store(err)
    }
}

pub type Result<T> = std::result::Result<T, ReconfigurationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Loaded,
    Diffed,
    Executing,
    Aggregated,
    Persisted,
    Done,
}

impl std::fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundPhase::Loaded => write!(f, "loaded"),
            RoundPhase::Diffed => write!(f, "diffed"),
            RoundPhase::Executing => write!(f, "executing"),
            RoundPhase::Aggregated => write!(f, "aggregated"),
            RoundPhase::Persisted => write!(f, "persisted"),
            RoundPhase::Done => write!(f, "done"),
        }
    }
}

pub struct ReconfigurationService {
    store: Arc<dyn PipelineStore>,
    executor: ElementReconfigurationExecutor,
    max_concurrent_calls: usize,
}

impl ReconfigurationService {
    pub fn new(store: Arc<dyn PipelineStore>, executor: ElementReconfigurationExecutor) -> Self {
        Self {
            store,
            executor,
            max_concurrent_calls: 1,
        }
    }

    /// Allows up to `limit` element calls in flight; statuses keep delta order
    pub fn with_max_concurrent_calls(mut self, limit: usize) -> Self {
        self.max_concurrent_calls = limit.max(1);
        self
    }

    /// Reconfigures the running elements of `desired`
    ///
    /// # Arguments
    /// * `desired` - Edited pipeline definition
    /// * `persist` - Store `desired` as the pipeline definition afterwards
    ///
    /// # Returns
    /// The per-element outcome. A failed element is reported in the status,
    /// not as an error.
    pub async fn reconfigure_pipeline(
        &self,
        desired: &PipelineGraph,
        persist: bool,
    ) -> Result<OperationStatus> {
        let stored = self.load_baseline(desired.id).await?;
        debug!(phase = %RoundPhase::Loaded, pipeline_id = %desired.id, "Loaded running pipeline");

        let deltas = delta::build_deltas(desired, &stored);
        debug!(
            phase = %RoundPhase::Diffed,
            pipeline_id = %desired.id,
            deltas = deltas.len(),
            "Computed reconfiguration deltas"
        );

        debug!(phase = %RoundPhase::Executing, pipeline_id = %desired.id, "Applying deltas");
        let statuses = self.execute_all(desired, &deltas).await;

        let status = OperationStatus::aggregate(desired, statuses);
        debug!(
            phase = %RoundPhase::Aggregated,
            pipeline_id = %desired.id,
            success = status.success,
            "Aggregated element statuses"
        );

        if status.success {
            self.advance_snapshot(desired).await?;
        } else {
            for failed in status.failed_elements() {
                warn!(
                    "Element {} ({}) was not reconfigured: {}",
                    failed.element_name, failed.instance_id, failed.message
                );
            }
        }

        if persist {
            self.store.overwrite_pipeline(desired).await?;
            debug!(
                phase = %RoundPhase::Persisted,
                pipeline_id = %desired.id,
                "Stored pipeline definition"
            );
        } else {
            debug!(phase = %RoundPhase::Done, pipeline_id = %desired.id, "Round finished");
        }

        info!("{}", status.title);

        Ok(status)
    }

    async fn load_baseline(&self, id: Uuid) -> Result<PipelineGraph> {
        if let Some(snapshot) = self.store.find_snapshot(id).await? {
            return Ok(snapshot.pipeline);
        }

        self.store
            .find_pipeline(id)
            .await?
            .ok_or(ReconfigurationError::NotFound(id))
    }

    async fn execute_all(
        &self,
        desired: &PipelineGraph,
        deltas: &[ReconfigurationDelta],
    ) -> Vec<ElementStatus> {
        let calls: Vec<_> = deltas
            .iter()
            .map(|delta| self.executor.execute(desired, delta))
            .collect();

        stream::iter(calls)
            .buffered(self.max_concurrent_calls)
            .collect()
            .await
    }

    async fn advance_snapshot(&self, desired: &PipelineGraph) -> Result<()> {
        let snapshot = desired.clone();

        match self.store.replace_snapshot(&snapshot).await {
            Ok(()) => Ok(()),
            Err(StoreError::Encode(err)) => Err(ReconfigurationError::Serialization(err)),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::test_support::{RecordingElements, element, free_text, pipeline};
    use crate::repository::InMemoryPipelineStore;
    use async_trait::async_trait;
    use sluice_core::domain::pipeline::{FreeTextParameter, PipelineSnapshot, StaticParameter};
    use std::time::Duration;

    fn service(
        store: Arc<dyn PipelineStore>,
        elements: Arc<RecordingElements>,
    ) -> ReconfigurationService {
        let executor = ElementReconfigurationExecutor::new(elements, Duration::from_millis(200));
        ReconfigurationService::new(store, executor)
    }

    fn threshold(pipeline: &PipelineGraph, element_id: &str) -> String {
        let element = pipeline
            .elements
            .iter()
            .find(|e| e.element_id == element_id)
            .unwrap();

        match &element.parameters[0] {
            StaticParameter::FreeText(FreeTextParameter { value, .. }) => value.clone(),
            other => panic!("unexpected parameter {other:?}"),
        }
    }

    fn three_elements(value: &str) -> PipelineGraph {
        pipeline(vec![
            element("E1", "i-1", vec![free_text("threshold", value, true)]),
            element("E2", "i-2", vec![free_text("threshold", value, true)]),
            element("E3", "i-3", vec![free_text("threshold", value, true)]),
        ])
    }

    fn edited(stored: &PipelineGraph, value: &str) -> PipelineGraph {
        let mut desired = stored.clone();
        for element in &mut desired.elements {
            element.parameters = vec![free_text("threshold", value, true)];
        }
        desired
    }

    #[tokio::test]
    async fn test_changed_threshold_is_applied_and_snapshot_advances() {
        let store = Arc::new(InMemoryPipelineStore::new());
        let elements = Arc::new(RecordingElements::default());
        let stored = pipeline(vec![element("E1", "i-1", vec![free_text("threshold", "5", true)])]);
        store.overwrite_pipeline(&stored).await.unwrap();

        let desired = edited(&stored, "9");
        let status = service(store.clone(), elements.clone())
            .reconfigure_pipeline(&desired, false)
            .await
            .unwrap();

        assert!(status.success);
        assert_eq!(status.element_statuses.len(), 1);
        assert_eq!(status.element_statuses[0].instance_id, "i-1");

        let calls = elements.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].parameters[0].value, "9");

        let snapshot = store.find_snapshot(desired.id).await.unwrap().unwrap();
        assert_eq!(snapshot.pipeline, desired);
        assert_eq!(threshold(&snapshot.pipeline, "E1"), "9");

        // the definition is untouched without persist
        let definition = store.find_pipeline(desired.id).await.unwrap().unwrap();
        assert_eq!(threshold(&definition, "E1"), "5");
    }

    #[tokio::test]
    async fn test_identical_pipeline_issues_no_calls() {
        let store = Arc::new(InMemoryPipelineStore::new());
        let elements = Arc::new(RecordingElements::default());
        let stored = three_elements("5");
        store.overwrite_pipeline(&stored).await.unwrap();

        let status = service(store, elements.clone())
            .reconfigure_pipeline(&stored.clone(), false)
            .await
            .unwrap();

        assert!(status.success);
        assert!(status.element_statuses.is_empty());
        assert!(elements.calls().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_round_is_idempotent() {
        let store = Arc::new(InMemoryPipelineStore::new());
        let elements = Arc::new(RecordingElements::default());
        let stored = three_elements("5");
        store.overwrite_pipeline(&stored).await.unwrap();
        let service = service(store, elements.clone());

        let desired = edited(&stored, "9");
        service.reconfigure_pipeline(&desired, false).await.unwrap();
        service.reconfigure_pipeline(&desired, false).await.unwrap();

        assert_eq!(elements.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_one_failure_fails_round_and_keeps_snapshot() {
        let store = Arc::new(InMemoryPipelineStore::new());
        let elements = Arc::new(RecordingElements::default().failing("i-2", "connection refused"));
        let stored = three_elements("5");
        store.overwrite_pipeline(&stored).await.unwrap();
        store.replace_snapshot(&stored).await.unwrap();

        let desired = edited(&stored, "9");
        let status = service(store.clone(), elements.clone())
            .reconfigure_pipeline(&desired, false)
            .await
            .unwrap();

        assert!(!status.success);
        assert_eq!(status.element_statuses.len(), 3);
        assert_eq!(
            status.title,
            "Could not reconfigure all Pipeline Elements in Pipeline temperature"
        );
        // no short-circuit: every delta was attempted
        assert_eq!(elements.calls().len(), 3);

        let snapshot = store.find_snapshot(desired.id).await.unwrap().unwrap();
        assert_eq!(snapshot.pipeline, stored);
    }

    #[tokio::test]
    async fn test_timeout_does_not_affect_other_elements() {
        let store = Arc::new(InMemoryPipelineStore::new());
        let elements = Arc::new(RecordingElements::default().hanging("i-2"));
        let stored = three_elements("5");
        store.overwrite_pipeline(&stored).await.unwrap();

        let desired = edited(&stored, "9");
        let status = service(store, elements)
            .with_max_concurrent_calls(3)
            .reconfigure_pipeline(&desired, false)
            .await
            .unwrap();

        assert!(!status.success);
        let outcome: Vec<_> = status
            .element_statuses
            .iter()
            .map(|s| (s.instance_id.as_str(), s.success))
            .collect();
        assert_eq!(outcome, vec![("i-1", true), ("i-2", false), ("i-3", true)]);
    }

    #[tokio::test]
    async fn test_unknown_pipeline_is_not_found() {
        let store = Arc::new(InMemoryPipelineStore::new());
        let elements = Arc::new(RecordingElements::default());
        let desired = three_elements("9");

        let result = service(store, elements.clone())
            .reconfigure_pipeline(&desired, true)
            .await;

        assert!(matches!(result, Err(ReconfigurationError::NotFound(id)) if id == desired.id));
        assert!(elements.calls().is_empty());
    }

    #[tokio::test]
    async fn test_persist_stores_definition_even_on_failure() {
        let store = Arc::new(InMemoryPipelineStore::new());
        let elements = Arc::new(RecordingElements::default().failing("i-3", "rejected"));
        let stored = three_elements("5");
        store.overwrite_pipeline(&stored).await.unwrap();
        store.replace_snapshot(&stored).await.unwrap();

        let desired = edited(&stored, "9");
        let status = service(store.clone(), elements)
            .reconfigure_pipeline(&desired, true)
            .await
            .unwrap();

        assert!(!status.success);
        let definition = store.find_pipeline(desired.id).await.unwrap().unwrap();
        assert_eq!(definition, desired);
        let snapshot = store.find_snapshot(desired.id).await.unwrap().unwrap();
        assert_eq!(snapshot.pipeline, stored);
    }

    #[tokio::test]
    async fn test_snapshot_is_preferred_over_definition() {
        let store = Arc::new(InMemoryPipelineStore::new());
        let elements = Arc::new(RecordingElements::default());
        let running = pipeline(vec![element("E1", "i-1", vec![free_text("threshold", "5", true)])]);
        let requested = edited(&running, "9");
        store.replace_snapshot(&running).await.unwrap();
        store.overwrite_pipeline(&requested).await.unwrap();

        // the definition already says 9, the instance still runs with 5
        service(store, elements.clone())
            .reconfigure_pipeline(&requested, false)
            .await
            .unwrap();

        assert_eq!(elements.calls().len(), 1);
    }

    /// Store whose snapshot writes always fail to encode
    struct UnencodableSnapshots {
        inner: InMemoryPipelineStore,
    }

    #[async_trait]
    impl PipelineStore for UnencodableSnapshots {
        async fn find_pipeline(
            &self,
            id: Uuid,
        ) -> std::result::Result<Option<PipelineGraph>, StoreError> {
            self.inner.find_pipeline(id).await
        }

        async fn list_pipelines(&self) -> std::result::Result<Vec<PipelineGraph>, StoreError> {
            self.inner.list_pipelines().await
        }

        async fn overwrite_pipeline(
            &self,
            pipeline: &PipelineGraph,
        ) -> std::result::Result<(), StoreError> {
            self.inner.overwrite_pipeline(pipeline).await
        }

        async fn find_snapshot(
            &self,
            id: Uuid,
        ) -> std::result::Result<Option<PipelineSnapshot>, StoreError> {
            self.inner.find_snapshot(id).await
        }

        async fn replace_snapshot(
            &self,
            _pipeline: &PipelineGraph,
        ) -> std::result::Result<(), StoreError> {
            let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
            Err(StoreError::Encode(err))
        }
    }

    #[tokio::test]
    async fn test_snapshot_encode_failure_is_fatal() {
        let inner = InMemoryPipelineStore::new();
        let stored = three_elements("5");
        inner.overwrite_pipeline(&stored).await.unwrap();
        let store = Arc::new(UnencodableSnapshots { inner });
        let elements = Arc::new(RecordingElements::default());

        let desired = edited(&stored, "9");
        let result = service(store.clone(), elements.clone())
            .reconfigure_pipeline(&desired, true)
            .await;

        assert!(matches!(result, Err(ReconfigurationError::Serialization(_))));
        // the remote changes happened
        assert_eq!(elements.calls().len(), 3);
        // but neither the snapshot nor the definition moved
        assert!(store.find_snapshot(desired.id).await.unwrap().is_none());
        let definition = store.find_pipeline(desired.id).await.unwrap().unwrap();
        assert_eq!(definition, stored);
    }

    #[tokio::test]
    async fn test_round_runs_on_spawned_task() {
        let store = Arc::new(InMemoryPipelineStore::new());
        let elements = Arc::new(RecordingElements::default());
        let stored = three_elements("5");
        store.overwrite_pipeline(&stored).await.unwrap();

        let service = Arc::new(service(store, elements.clone()).with_max_concurrent_calls(2));
        let desired = edited(&stored, "9");

        // the round future must be Send for the HTTP handlers
        let round =
            tokio::spawn(async move { service.reconfigure_pipeline(&desired, false).await });
        let status = round.await.unwrap().unwrap();

        assert!(status.success);
        assert_eq!(elements.calls().len(), 3);
    }

    #[test]
    fn test_round_phase_display() {
        assert_eq!(RoundPhase::Loaded.to_string(), "loaded");
        assert_eq!(RoundPhase::Persisted.to_string(), "persisted");
    }
}
