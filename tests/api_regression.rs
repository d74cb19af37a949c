//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and exercise
//! every endpoint using `tower::ServiceExt::oneshot()`.
//! No binary spawn, no network port.

use aegis_live::api::{create_app, ApiState};
use aegis_live::pipeline::{AppContext, PredictionService};
use aegis_live::types::{Prediction, TelemetrySnapshot};

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

struct AlwaysLow;

impl PredictionService for AlwaysLow {
    fn predict(&self, snapshot: &TelemetrySnapshot) -> Vec<Prediction> {
        snapshot
            .players()
            .iter()
            .map(|p| Prediction::new(p.name.clone(), 0.1))
            .collect()
    }
}

fn app_with(ctx: AppContext) -> Router {
    create_app(ApiState::new(ctx, CancellationToken::new()))
}

async fn call(app: Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_get_endpoints_return_200() {
    for endpoint in ["/health", "/api/stats", "/api/end-session", "/api/models"] {
        let (status, body) = call(app_with(AppContext::synthetic()), Method::GET, endpoint).await;
        assert_eq!(status, StatusCode::OK, "{endpoint} should return 200");
        assert!(body.is_object(), "{endpoint} should return a JSON object");
    }
}

#[tokio::test]
async fn test_stats_contains_predictions_and_analysis() {
    let (_, body) = call(
        app_with(AppContext::synthetic()),
        Method::GET,
        "/api/stats?series_id=777",
    )
    .await;

    assert_eq!(body["series_id"], "777");
    assert_eq!(body["players"].as_array().map(Vec::len), Some(5));
    assert_eq!(body["predictions"].as_array().map(Vec::len), Some(5));

    let analysis = &body["mie_analysis"];
    assert!(analysis["summary"].is_string());
    assert_eq!(analysis["squad_telemetry"].as_array().map(Vec::len), Some(5));
    assert!(analysis["probability_metrics"]["clutch_potential"]
        .as_str()
        .is_some_and(|s| s.ends_with('%')));
    assert!(analysis["probability_metrics"]["tempo_deviation"]
        .as_str()
        .is_some_and(|s| s.ends_with("vs. pro baseline")));
    assert!(body.get("win_prob").is_none(), "stats carries no win probability");
}

#[tokio::test]
async fn test_stats_defaults_series_id() {
    let (_, body) = call(app_with(AppContext::synthetic()), Method::GET, "/api/stats").await;
    assert_eq!(body["series_id"], "2616372");
}

#[tokio::test]
async fn test_stats_has_no_session_side_effects() {
    let ctx = AppContext::synthetic().with_predictor(Arc::new(AlwaysLow));
    ctx.tracker.write().await.start_session();

    call(app_with(ctx.clone()), Method::GET, "/api/stats").await;
    assert_eq!(ctx.tracker.read().await.anomaly_count(), 0);
}

#[tokio::test]
async fn test_session_lifecycle() {
    let ctx = AppContext::synthetic();

    let (status, body) = call(app_with(ctx.clone()), Method::GET, "/api/end-session").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "No Active Session");

    let (status, body) = call(app_with(ctx.clone()), Method::POST, "/api/start-session").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Session Started");
    let start_time = body["start_time"].as_str().expect("start_time string");
    assert!(chrono::DateTime::parse_from_rfc3339(start_time).is_ok());

    let (_, summary) = call(app_with(ctx.clone()), Method::GET, "/api/end-session").await;
    assert_eq!(summary["status"], "Analysis Complete");
    assert_eq!(summary["total_anomalies"], 0);
    assert_eq!(summary["match_duration"], "--:--");
    assert!(summary["drills"].as_array().is_some_and(|d| d.len() >= 2));

    // Reading the summary does not end the session.
    let (_, again) = call(app_with(ctx), Method::GET, "/api/end-session").await;
    assert_eq!(summary, again);
}

#[tokio::test]
async fn test_start_session_requires_post() {
    let resp = app_with(AppContext::synthetic())
        .oneshot(
            Request::builder()
                .uri("/api/start-session")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_models_reports_three_absent_slots() {
    let (_, body) = call(app_with(AppContext::synthetic()), Method::GET, "/api/models").await;
    assert_eq!(body["available"], 0);
    let slots = body["slots"].as_array().expect("slots array");
    assert_eq!(slots.len(), 3);
    assert!(slots.iter().all(|s| s["available"] == false));
}

#[tokio::test]
async fn test_health_reports_session_state() {
    let ctx = AppContext::synthetic();
    let (_, body) = call(app_with(ctx.clone()), Method::GET, "/health").await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["session_active"], false);
    assert_eq!(body["source"], "synthetic");

    ctx.tracker.write().await.start_session();
    let (_, body) = call(app_with(ctx), Method::GET, "/health").await;
    assert_eq!(body["session_active"], true);
    assert!(body["session_elapsed_secs"].is_u64());
}
