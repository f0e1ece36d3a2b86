//! Pipeline run handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use trailhound_core::{PipelineError, PipelineStatus};

use crate::state::AppState;

#[derive(Serialize)]
pub struct RunStartedResponse {
    pub started: bool,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Kick off a batch run in the background.
pub async fn trigger_run(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<RunStartedResponse>), (StatusCode, Json<ErrorResponse>)> {
    let pipeline = Arc::clone(state.pipeline());

    if pipeline.is_running() {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: PipelineError::AlreadyRunning.to_string(),
            }),
        ));
    }

    tokio::spawn(async move {
        match pipeline.run_batch().await {
            Ok(summary) => tracing::info!(
                placed = summary.placed_count(),
                failed = summary.failed_count(),
                "API-triggered batch run finished"
            ),
            Err(e) => tracing::error!("API-triggered batch run failed: {}", e),
        }
    });

    Ok((StatusCode::ACCEPTED, Json(RunStartedResponse { started: true })))
}

/// Request cooperative cancellation of the current run.
pub async fn cancel_run(State(state): State<Arc<AppState>>) -> StatusCode {
    state.pipeline().cancel();
    StatusCode::ACCEPTED
}

/// Current pipeline status plus the last run summary.
pub async fn run_status(State(state): State<Arc<AppState>>) -> Json<PipelineStatus> {
    Json(state.pipeline().status().await)
}
