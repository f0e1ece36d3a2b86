use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{candidates, events, middleware, runs, system};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes, behind authentication
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(system::health))
        .route("/config", get(system::get_config))
        // Pipeline runs
        .route("/runs", post(runs::trigger_run))
        .route("/runs/cancel", post(runs::cancel_run))
        .route("/runs/status", get(runs::run_status))
        // Catalog webhook
        .route("/events", post(events::receive_event))
        // Candidates
        .route(
            "/movies/{movie_id}/candidates",
            get(candidates::list_candidates),
        )
        .route(
            "/movies/{movie_id}/candidates/{candidate_id}/select",
            post(candidates::select_candidate),
        )
        .route(
            "/candidates/{candidate_id}/reset",
            post(candidates::reset_candidate),
        )
        .layer(from_fn_with_state(
            Arc::clone(&state),
            middleware::auth_middleware,
        ))
        .with_state(state);

    Router::new()
        // Prometheus scrape endpoint stays outside authentication.
        .route("/metrics", get(system::metrics))
        .nest("/api/v1", api_routes)
        .layer(from_fn(middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
