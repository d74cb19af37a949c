//! API request handlers

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::models::SlotStatus;
use crate::pipeline::{AppContext, TelemetryStreamer};
use crate::types::{EnrichedRecord, SessionSummary};

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Shared state for all handlers.
#[derive(Clone)]
pub struct ApiState {
    pub ctx: AppContext,
    pub streamer: TelemetryStreamer,
    /// Parent of every stream's token; cancelled on server shutdown.
    pub shutdown: CancellationToken,
}

impl ApiState {
    pub fn new(ctx: AppContext, shutdown: CancellationToken) -> Self {
        Self {
            streamer: TelemetryStreamer::new(ctx.clone()),
            ctx,
            shutdown,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SeriesQuery {
    pub series_id: Option<String>,
}

impl SeriesQuery {
    fn resolve(self, ctx: &AppContext) -> String {
        self.series_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| ctx.config.stream.default_series_id.clone())
    }
}

// ============================================================================
// Telemetry
// ============================================================================

/// GET /api/stats - one enriched snapshot, no session side effects.
pub async fn get_stats(
    State(state): State<ApiState>,
    Query(query): Query<SeriesQuery>,
) -> Json<EnrichedRecord> {
    let series_id = query.resolve(&state.ctx);
    Json(state.streamer.enrich(&series_id).await)
}

/// GET /stream-telemetry - NDJSON, one record per interval until disconnect.
pub async fn stream_telemetry(
    State(state): State<ApiState>,
    Query(query): Query<SeriesQuery>,
) -> Response {
    let series_id = query.resolve(&state.ctx);
    info!(series_id = %series_id, "Client subscribed to telemetry stream");

    let handle = state
        .streamer
        .spawn(series_id, state.shutdown.child_token());

    let lines = handle.into_stream().filter_map(|record| match record.to_ndjson_line() {
        Ok(line) => Some(Ok::<_, Infallible>(line)),
        Err(e) => {
            warn!("Failed to serialize telemetry record: {}", e);
            None
        }
    });

    (
        [
            (header::CONTENT_TYPE, NDJSON_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(lines),
    )
        .into_response()
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StartSessionResponse {
    pub status: String,
    pub start_time: DateTime<Utc>,
}

/// POST /api/start-session
pub async fn start_session(State(state): State<ApiState>) -> Json<StartSessionResponse> {
    let start_time = state.ctx.tracker.write().await.start_session();
    info!(start_time = %start_time, "🎮 Coaching session started");
    Json(StartSessionResponse {
        status: "Session Started".to_string(),
        start_time,
    })
}

/// GET /api/end-session - current summary. Read only; the session stays open.
pub async fn end_session(State(state): State<ApiState>) -> Json<SessionSummary> {
    let summary = state.ctx.tracker.read().await.summary();
    info!(
        total_anomalies = summary.total_anomalies,
        status = %summary.status,
        "📋 Session summary requested"
    );
    Json(summary)
}

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub source: String,
    pub models_available: usize,
    pub session_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_elapsed_secs: Option<u64>,
}

/// GET /health
pub async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let tracker = state.ctx.tracker.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.ctx.uptime_secs(),
        source: state.ctx.source.source_name().to_string(),
        models_available: state.ctx.registry.available_count(),
        session_active: tracker.is_active(),
        session_elapsed_secs: tracker.elapsed_secs(),
    })
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub available: usize,
    pub sequence_runtime: bool,
    pub slots: Vec<SlotStatus>,
}

/// GET /api/models - per-slot registry status.
pub async fn get_models(State(state): State<ApiState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        available: state.ctx.registry.available_count(),
        sequence_runtime: cfg!(feature = "sequence-model"),
        slots: state.ctx.registry.status(),
    })
}
