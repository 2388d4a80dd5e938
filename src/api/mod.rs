//! HTTP API module
//!
//! Intent endpoints for the presentation layer plus status and health.

pub mod handlers;
pub mod responses;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/day/start", post(start_day_handler))
        .route("/day/end", post(end_day_handler))
        .route("/day/new", post(new_day_handler))
        .route("/timer/start", post(start_handler))
        .route("/timer/pause", post(pause_handler))
        .route("/timer/reset", post(reset_handler))
        .route("/timer/resync", post(resync_handler))
        .route("/settings", put(settings_handler))
        .route("/summary", get(summary_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
