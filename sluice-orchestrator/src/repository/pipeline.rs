//! Pipeline Repository
//!
//! Storage of pipeline definitions and of the snapshot each pipeline was
//! last confirmed to be running with.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sluice_core::domain::pipeline::{PipelineGraph, PipelineSnapshot};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by pipeline stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The pipeline could not be encoded for storage; nothing was written
    #[error("failed to encode pipeline: {0}")]
    Encode(serde_json::Error),

    #[error("stored pipeline {id} is not readable: {source}")]
    Decode {
        id: Uuid,
        #[source]
        source: serde_json::Error,
    },
}

/// Storage handle for pipeline definitions and snapshots
///
/// Definitions are the requested state of a pipeline. Snapshots are the
/// last state confirmed to be applied on the running elements.
#[async_trait]
pub trait PipelineStore: Send + Sync {
    /// Find a pipeline definition by ID
    async fn find_pipeline(&self, id: Uuid) -> Result<Option<PipelineGraph>, StoreError>;

    /// List all pipeline definitions
    async fn list_pipelines(&self) -> Result<Vec<PipelineGraph>, StoreError>;

    /// Create or replace a pipeline definition
    async fn overwrite_pipeline(&self, pipeline: &PipelineGraph) -> Result<(), StoreError>;

    /// Find the running snapshot of a pipeline
    async fn find_snapshot(&self, id: Uuid) -> Result<Option<PipelineSnapshot>, StoreError>;

    /// Replace the running snapshot of a pipeline wholesale
    async fn replace_snapshot(&self, pipeline: &PipelineGraph) -> Result<(), StoreError>;
}

/// Postgres implementation of PipelineStore
#[derive(Clone)]
pub struct PgPipelineStore {
    pool: PgPool,
}

impl PgPipelineStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PipelineStore for PgPipelineStore {
    async fn find_pipeline(&self, id: Uuid) -> Result<Option<PipelineGraph>, StoreError> {
        let row = sqlx::query_as::<_, PipelineRow>(
            r#"
            SELECT id, graph
            FROM pipelines
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PipelineGraph::try_from).transpose()
    }

    async fn list_pipelines(&self) -> Result<Vec<PipelineGraph>, StoreError> {
        let rows = sqlx::query_as::<_, PipelineRow>(
            r#"
            SELECT id, graph
            FROM pipelines
            ORDER BY updated_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PipelineGraph::try_from).collect()
    }

    async fn overwrite_pipeline(&self, pipeline: &PipelineGraph) -> Result<(), StoreError> {
        let graph = serde_json::to_value(pipeline).map_err(StoreError::Encode)?;

        sqlx::query(
            r#"
            INSERT INTO pipelines (id, name, graph, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                graph = EXCLUDED.graph,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(pipeline.id)
        .bind(&pipeline.name)
        .bind(graph)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_snapshot(&self, id: Uuid) -> Result<Option<PipelineSnapshot>, StoreError> {
        let row = sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT pipeline_id, graph, captured_at
            FROM pipeline_snapshots
            WHERE pipeline_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PipelineSnapshot::try_from).transpose()
    }

    async fn replace_snapshot(&self, pipeline: &PipelineGraph) -> Result<(), StoreError> {
        let graph = serde_json::to_value(pipeline).map_err(StoreError::Encode)?;

        sqlx::query(
            r#"
            INSERT INTO pipeline_snapshots (pipeline_id, graph, captured_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (pipeline_id) DO UPDATE SET
                graph = EXCLUDED.graph,
                captured_at = EXCLUDED.captured_at
            "#,
        )
        .bind(pipeline.id)
        .bind(graph)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct PipelineRow {
    id: Uuid,
    graph: serde_json::Value,
}

impl TryFrom<PipelineRow> for PipelineGraph {
    type Error = StoreError;

    fn try_from(row: PipelineRow) -> Result<Self, Self::Error> {
        serde_json::from_value(row.graph)
            .map_err(|source| StoreError::Decode { id: row.id, source })
    }
}

#[derive(sqlx::FromRow)]
struct SnapshotRow {
    pipeline_id: Uuid,
    graph: serde_json::Value,
    captured_at: DateTime<Utc>,
}

impl TryFrom<SnapshotRow> for PipelineSnapshot {
    type Error = StoreError;

    fn try_from(row: SnapshotRow) -> Result<Self, Self::Error> {
        let pipeline = serde_json::from_value(row.graph).map_err(|source| StoreError::Decode {
            id: row.pipeline_id,
            source,
        })?;

        Ok(PipelineSnapshot {
            pipeline,
            captured_at: row.captured_at,
        })
    }
}
