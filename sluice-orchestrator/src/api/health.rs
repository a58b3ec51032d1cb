//! Health Check API Handler
//!
//! Reports whether the orchestrator can reach its pipeline store.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

use crate::api::state::AppState;

/// GET /health
/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.find_pipeline(Uuid::nil()).await {
        Ok(_) => (StatusCode::OK, "OK"),
        Err(err) => {
            tracing::warn!("Health check failed, pipeline store unreachable: {}", err);
            (StatusCode::SERVICE_UNAVAILABLE, "pipeline store unreachable")
        }
    }
}
