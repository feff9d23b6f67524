use crate::{
    AppState,
    types::{AppError, ResearchCreated, ResearchRequest, Result, StatusResponse},
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

/// Start a background research job
///
/// Returns immediately with the new job id. Progress is observed by polling
/// the status endpoint.
#[utoipa::path(
    post,
    path = "/api/research",
    request_body = ResearchRequest,
    responses(
        (status = 200, description = "Research started", body = ResearchCreated),
        (status = 400, description = "Missing topic or malformed request body"),
        (status = 503, description = "Concurrent job limit reached")
    ),
    tag = "research"
)]
pub async fn create_research(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ResearchRequest>, JsonRejection>,
) -> Result<Json<ResearchCreated>> {
    let Json(payload) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;

    // Pick up hot-reloaded research settings for each new job
    let settings = state.config_manager.config().job_settings();
    let created = state
        .orchestrator
        .create_research_with(&payload.topic, settings)?;

    Ok(Json(created))
}

/// Poll the status of a research job
///
/// Unknown ids are not an error: they are reported with status `not_found`.
#[utoipa::path(
    get,
    path = "/api/status/{id}",
    responses(
        (status = 200, description = "Current job status", body = StatusResponse)
    ),
    params(
        ("id" = String, Path, description = "Research job id")
    ),
    tag = "research"
)]
pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<StatusResponse> {
    Json(state.orchestrator.get_status(&id))
}
