//! Catalog webhook handler.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use trailhound_core::{CatalogEvent, EventDisposition, PipelineError};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EventErrorResponse {
    pub error: String,
}

/// Receive a grab/download/rename/delete notification from the catalog
/// and run the event-mode pipeline for the movie.
pub async fn receive_event(
    State(state): State<Arc<AppState>>,
    Json(event): Json<CatalogEvent>,
) -> Result<Json<EventDisposition>, (StatusCode, Json<EventErrorResponse>)> {
    tracing::info!(?event, "Received catalog event");

    state
        .pipeline()
        .handle_event(&event)
        .await
        .map(Json)
        .map_err(|e| {
            let status = match e {
                PipelineError::MovieNotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                Json(EventErrorResponse {
                    error: e.to_string(),
                }),
            )
        })
}
