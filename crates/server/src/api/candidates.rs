//! Candidate API handlers: listing, interactive selection, and reset.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use trailhound_core::{
    CandidateStatus, PipelineError, SelectionResult, StoreError, TrailerCandidate,
};

use crate::state::AppState;

/// Query parameters for listing candidates
#[derive(Debug, Deserialize)]
pub struct ListCandidatesParams {
    /// Filter by candidate status.
    pub status: Option<String>,
}

/// Error response; `url` is set when the failure concerns one candidate.
#[derive(Debug, Serialize)]
pub struct CandidateErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

type CandidateError = (StatusCode, Json<CandidateErrorResponse>);

fn error_response(status: StatusCode, error: String, url: Option<String>) -> CandidateError {
    (status, Json(CandidateErrorResponse { error, url }))
}

fn store_error(e: StoreError, url: Option<String>) -> CandidateError {
    let status = match e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Conflict { .. } => StatusCode::CONFLICT,
        StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, e.to_string(), url)
}

fn pipeline_error(e: PipelineError, url: Option<String>) -> CandidateError {
    match e {
        PipelineError::MovieNotFound(_) => {
            error_response(StatusCode::NOT_FOUND, e.to_string(), url)
        }
        PipelineError::Store(se) => store_error(se, url),
        other => error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string(), url),
    }
}

/// List a movie's candidates, optionally filtered by status.
pub async fn list_candidates(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<i64>,
    Query(params): Query<ListCandidatesParams>,
) -> Result<Json<Vec<TrailerCandidate>>, CandidateError> {
    let status = match params.status.as_deref() {
        None => None,
        Some(s) => Some(CandidateStatus::parse(s).ok_or_else(|| {
            error_response(
                StatusCode::BAD_REQUEST,
                format!("unknown status filter: {}", s),
                None,
            )
        })?),
    };

    state
        .store()
        .candidates_for(movie_id, status)
        .map(Json)
        .map_err(|e| store_error(e, None))
}

/// Interactive selection: place the given Downloaded candidate.
///
/// Failures name the error kind and the candidate's URL.
pub async fn select_candidate(
    State(state): State<Arc<AppState>>,
    Path((movie_id, candidate_id)): Path<(i64, String)>,
) -> Result<Json<SelectionResult>, CandidateError> {
    match state
        .pipeline()
        .run_interactive(movie_id, &candidate_id)
        .await
    {
        Ok(selection) => Ok(Json(selection)),
        Err(e) => {
            let url = state
                .store()
                .candidate(&candidate_id)
                .ok()
                .flatten()
                .map(|c| c.url);
            Err(pipeline_error(e, url))
        }
    }
}

/// Return a Broken or Rejected candidate to New.
pub async fn reset_candidate(
    State(state): State<Arc<AppState>>,
    Path(candidate_id): Path<String>,
) -> Result<Json<TrailerCandidate>, CandidateError> {
    state
        .store()
        .reset_candidate(&candidate_id)
        .map(Json)
        .map_err(|e| store_error(e, None))
}
