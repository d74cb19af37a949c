//! System-wide default constants.
//!
//! Centralises the numbers the pipeline depends on. Grouped by subsystem
//! for easy discovery. Anything operator-tunable is mirrored in
//! [`AegisConfig`](super::AegisConfig) and only defaults from here.

// ============================================================================
// Streaming
// ============================================================================

/// Cadence of the telemetry stream (ms). One enriched record per tick.
pub const STREAM_INTERVAL_MS: u64 = 1_000;

/// Series used when a request does not name one.
pub const DEFAULT_SERIES_ID: &str = "2616372";

/// Bounded buffer between the stream task and the HTTP body.
///
/// Small on purpose: a consumer that stops reading should stall the loop,
/// not let records pile up.
pub const STREAM_CHANNEL_CAPACITY: usize = 4;

/// Placeholder win-probability range (percent), uniform.
pub const WIN_PROB_RANGE: (f64, f64) = (45.0, 65.0);

// ============================================================================
// Anomaly Detection
// ============================================================================

/// Assist-impact probability below which a `micro` anomaly is raised.
pub const MICRO_ANOMALY_THRESHOLD: f64 = 0.3;

/// Assist-impact probability above which a `macro` anomaly is raised.
pub const MACRO_ANOMALY_THRESHOLD: f64 = 0.8;

/// Player status boundaries used when annotating predictions.
pub const STATUS_OPTIMAL_ABOVE: f64 = 0.6;
pub const STATUS_WARNING_ABOVE: f64 = 0.3;

/// Impact attached to each anomaly kind (percent swing).
pub const MICRO_ANOMALY_IMPACT: i32 = -5;
pub const MACRO_ANOMALY_IMPACT: i32 = 5;

/// Micro anomaly count that must be *exceeded* before the aim drill leads.
pub const MICRO_DRILL_THRESHOLD: usize = 3;

// ============================================================================
// Fallback Estimate Ranges (inclusive)
// ============================================================================

/// Creep-score equivalent (secondary resource).
pub const FALLBACK_CS_RANGE: (i64, i64) = (150, 300);

/// Resource differential.
pub const FALLBACK_GOLD_DIFF_RANGE: (i64, i64) = (-500, 2_000);

/// Vision / awareness score.
pub const FALLBACK_VISION_RANGE: (i64, i64) = (10, 50);

/// Site-retake success (percent).
pub const FALLBACK_RETAKE_RANGE: (f64, f64) = (30.0, 80.0);

/// Objective-contest rate (percent).
pub const FALLBACK_CONTEST_RANGE: (f64, f64) = (40.0, 95.0);

/// Clutch potential (percent).
pub const FALLBACK_CLUTCH_RANGE: (f64, f64) = (60.0, 85.0);

/// Tempo deviation against the pro baseline (seconds).
pub const FALLBACK_TEMPO_RANGE: (f64, f64) = (-15.0, 15.0);

// ============================================================================
// Model Artifacts
// ============================================================================

/// Directory searched for model artifacts when none is configured.
pub const DEFAULT_MODEL_DIR: &str = "./models";

pub const TREE_ENSEMBLE_FILE: &str = "tree_ensemble.json";
pub const GRADIENT_BOOSTED_FILE: &str = "gradient_boosted.json";
pub const SEQUENCE_FILE: &str = "sequence.json";

// ============================================================================
// Telemetry Sources
// ============================================================================

/// HTTP timeout for the upstream telemetry feed (seconds).
pub const SOURCE_HTTP_TIMEOUT_SECS: u64 = 5;

/// Environment variable holding the upstream feed API key.
pub const SOURCE_API_KEY_ENV: &str = "AEGIS_FEED_API_KEY";
