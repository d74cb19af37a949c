//! REST API module using Axum
//!
//! Endpoints for the live-coaching dashboard:
//! - `/api/*` JSON endpoints (stats, session lifecycle, model status)
//! - `/stream-telemetry` NDJSON stream
//! - `/health`

pub mod handlers;
mod routes;

pub use handlers::ApiState;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

/// CORS from `server.cors_origins`. A `"*"` entry allows any origin.
fn build_cors_layer(server: &ServerConfig) -> CorsLayer {
    if server.cors_origins.iter().any(|o| o.trim() == "*") {
        tracing::info!("CORS: allowing any origin");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let allowed: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|o| o.trim().parse().ok())
        .collect();
    tracing::info!(origins = ?server.cors_origins, "CORS: allowing configured origins");
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Create the complete application router.
pub fn create_app(state: ApiState) -> Router {
    let cors = build_cors_layer(&state.ctx.config.server);

    Router::new()
        .nest("/api", routes::api_routes(state.clone()))
        .merge(routes::root_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
