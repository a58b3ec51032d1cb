//! Pipeline API Handlers
//!
//! HTTP endpoints for pipeline definitions, snapshots and live
//! reconfiguration.

use axum::{
    Json,
    extract::{Path, State},
};
use sluice_core::domain::pipeline::{PipelineGraph, PipelineSnapshot};
use sluice_core::domain::reconfiguration::OperationStatus;
use sluice_core::dto::pipeline::{PipelineSummary, ReconfigurePipeline};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::service::pipeline_service;

/// GET /pipeline/list
/// List all pipelines
pub async fn list_pipelines(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PipelineSummary>>> {
    tracing::debug!("Listing all pipelines");

    let pipelines = pipeline_service::list_pipelines(state.store.as_ref()).await?;

    Ok(Json(pipelines.iter().map(PipelineSummary::from).collect()))
}

/// GET /pipeline/{id}
/// Get pipeline definition by ID
pub async fn get_pipeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PipelineGraph>> {
    tracing::debug!("Getting pipeline: {}", id);

    let pipeline = pipeline_service::get_pipeline(state.store.as_ref(), id).await?;

    Ok(Json(pipeline))
}

/// PUT /pipeline/{id}
/// Create or replace a pipeline definition
pub async fn save_pipeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(pipeline): Json<PipelineGraph>,
) -> ApiResult<Json<PipelineSummary>> {
    tracing::info!("Saving pipeline: {} ({})", pipeline.name, id);

    ensure_matching_id(id, &pipeline)?;

    pipeline_service::save_pipeline(state.store.as_ref(), &pipeline).await?;

    Ok(Json(PipelineSummary::from(&pipeline)))
}

/// GET /pipeline/{id}/snapshot
/// Get the state the pipeline's elements were last confirmed to run with
pub async fn get_snapshot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PipelineSnapshot>> {
    tracing::debug!("Getting snapshot of pipeline: {}", id);

    let snapshot = pipeline_service::get_snapshot(state.store.as_ref(), id)
        .await
        .map_err(|e| match e {
            pipeline_service::PipelineError::NotFound(id) => {
                ApiError::NotFound(format!("Pipeline {} has no running snapshot", id))
            }
            other => other.into(),
        })?;

    Ok(Json(snapshot))
}

/// POST /pipeline/{id}/reconfigure
/// Apply changed reconfigurable parameters to the running elements
///
/// A round in which some elements failed still answers 200; the returned
/// status carries `success: false` and one entry per attempted element.
pub async fn reconfigure_pipeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReconfigurePipeline>,
) -> ApiResult<Json<OperationStatus>> {
    tracing::info!(
        "Reconfiguring pipeline: {} ({}), persist: {}",
        req.pipeline.name,
        id,
        req.persist
    );

    ensure_matching_id(id, &req.pipeline)?;
    pipeline_service::validate_pipeline(&req.pipeline)?;

    let _guard = state.locks.acquire(id).await;

    let status = state
        .reconfiguration
        .reconfigure_pipeline(&req.pipeline, req.persist)
        .await?;

    Ok(Json(status))
}

fn ensure_matching_id(id: Uuid, pipeline: &PipelineGraph) -> ApiResult<()> {
    if pipeline.id != id {
        return Err(ApiError::BadRequest(format!(
            "Pipeline id {} in body does not match path id {}",
            pipeline.id, id
        )));
    }

    Ok(())
}
