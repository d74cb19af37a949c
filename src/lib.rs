//! Aegis Live: real-time esports telemetry enrichment
//!
//! ## Architecture
//!
//! - **Model Registry**: loads the three predictive model artifacts once,
//!   tolerating any subset being absent
//! - **Inference Engine**: turns a snapshot into a structured [`Insight`],
//!   substituting bounded fallback estimates for absent models
//! - **Anomaly Tracker**: session-scoped anomaly log and coaching summary
//! - **Telemetry Streamer**: 1 Hz fetch → predict → enrich → detect → emit loop
//! - **API**: Axum endpoints plus an NDJSON live stream

pub mod api;
pub mod config;
pub mod inference;
pub mod models;
pub mod pipeline;
pub mod session;
pub mod types;

pub use config::AegisConfig;
pub use inference::InferenceEngine;
pub use models::{ModelRegistry, ModelSlot, ModelStrategy};
pub use pipeline::{AppContext, PredictionService, TelemetrySource, TelemetryStreamer};
pub use session::{AnomalyTracker, TrackerError};
pub use types::{
    AnomalyEvent, AnomalyKind, EnrichedRecord, Insight, PlayerRecord, Prediction,
    SessionSummary, TelemetrySnapshot,
};
