//! Liveness and editing-service status handlers.

use crate::{types::ServiceStatusResponse, AppState};
use axum::{extract::State, Json};

/// Process liveness
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Server is running", body = String)),
    tag = "status"
)]
pub async fn health() -> &'static str {
    "OK"
}

/// Probe the editing service
///
/// Always answers 200; `available` tells whether the model can be reached and
/// `active_job` names the job holding the run slot.
#[utoipa::path(
    get,
    path = "/api/status",
    responses((status = 200, description = "Health probe result", body = ServiceStatusResponse)),
    tag = "status"
)]
pub async fn service_status(State(state): State<AppState>) -> Json<ServiceStatusResponse> {
    let result = state.pipeline.editor().ensure_available().await;
    if let Err(e) = &result {
        tracing::warn!(error = %e, "Editing service probe failed");
    }

    Json(ServiceStatusResponse {
        available: result.is_ok(),
        base_url: state.config.ollama.base_url.clone(),
        model: state.config.ollama.model.clone(),
        error: result.err().map(|e| e.to_string()),
        active_job: state.jobs.active_job(),
    })
}
