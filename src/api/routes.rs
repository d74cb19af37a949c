//! API route definitions
//!
//! - /api/stats - one enriched snapshot
//! - /api/start-session, /api/end-session - coaching session lifecycle
//! - /api/models - model registry status
//! - /stream-telemetry - NDJSON live stream
//! - /health - liveness

use axum::{routing::{get, post}, Router};

use super::handlers::{self, ApiState};

pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/stats", get(handlers::get_stats))
        .route("/start-session", post(handlers::start_session))
        .route("/end-session", get(handlers::end_session))
        .route("/models", get(handlers::get_models))
        .with_state(state)
}

pub fn root_routes(state: ApiState) -> Router {
    Router::new()
        .route("/stream-telemetry", get(handlers::stream_telemetry))
        .route("/health", get(handlers::health))
        .with_state(state)
}
