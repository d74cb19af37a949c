//! Streaming Pipeline
//!
//! ```text
//! TelemetrySource ──▶ PredictionService ──▶ InferenceEngine ──▶ anomaly rules ──▶ mpsc ──▶ client
//!    (1 Hz)              (per player)          (Insight)         (AnomalyTracker)
//! ```
//!
//! [`AppContext`] carries the shared collaborators; [`TelemetryStreamer`]
//! owns the per-stream loop.

mod context;
pub mod prediction;
pub mod source;
pub mod streamer;

pub use context::AppContext;
pub use prediction::{HeuristicPredictionService, PredictionService};
pub use source::{HttpSource, ReplaySource, SourceError, SyntheticSource, TelemetrySource};
pub use streamer::{StreamHandle, TelemetryStreamer};
