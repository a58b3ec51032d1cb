//! In-memory pipeline store
//!
//! Keeps definitions and snapshots in process memory. Used for local
//! development (`SLUICE_STORE=memory`) and as the store in tests.

use async_trait::async_trait;
use sluice_core::domain::pipeline::{PipelineGraph, PipelineSnapshot};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::pipeline::{PipelineStore, StoreError};

/// Every value handed in or out is cloned, so callers never share state
/// with the store.
#[derive(Default)]
pub struct InMemoryPipelineStore {
    pipelines: RwLock<HashMap<Uuid, PipelineGraph>>,
    snapshots: RwLock<HashMap<Uuid, PipelineSnapshot>>,
}

impl InMemoryPipelineStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PipelineStore for InMemoryPipelineStore {
    async fn find_pipeline(&self, id: Uuid) -> Result<Option<PipelineGraph>, StoreError> {
        Ok(self.pipelines.read().await.get(&id).cloned())
    }

    async fn list_pipelines(&self) -> Result<Vec<PipelineGraph>, StoreError> {
        let mut pipelines: Vec<_> = self.pipelines.read().await.values().cloned().collect();
        pipelines.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(pipelines)
    }

    async fn overwrite_pipeline(&self, pipeline: &PipelineGraph) -> Result<(), StoreError> {
        self.pipelines
            .write()
            .await
            .insert(pipeline.id, pipeline.clone());
        Ok(())
    }

    async fn find_snapshot(&self, id: Uuid) -> Result<Option<PipelineSnapshot>, StoreError> {
        Ok(self.snapshots.read().await.get(&id).cloned())
    }

    async fn replace_snapshot(&self, pipeline: &PipelineGraph) -> Result<(), StoreError> {
        let snapshot = PipelineSnapshot {
            pipeline: pipeline.clone(),
            captured_at: chrono::Utc::now(),
        };
        self.snapshots.write().await.insert(pipeline.id, snapshot);
        Ok(())
    }
}
