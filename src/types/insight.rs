//! Inference engine output types.

use serde::{Serialize, Serializer};

/// Per-player squad metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SquadMetric {
    pub name: String,
    /// "K/D/A", copied from the feed.
    pub kda: String,
    /// Creep-score equivalent.
    pub cs: i64,
    /// Resource differential against the lane opponent.
    pub gold_diff: i64,
    /// Vision / awareness score.
    pub vision_score: i64,
}

/// Team-level percentage metrics, serialised as `"NN.N%"` strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityMetrics {
    #[serde(serialize_with = "as_percent")]
    pub site_retake_success: f64,
    #[serde(serialize_with = "as_percent")]
    pub baron_contest_rate: f64,
    #[serde(serialize_with = "as_percent")]
    pub clutch_potential: f64,
    /// Seconds ahead (+) or behind (-) the pro baseline.
    #[serde(serialize_with = "as_tempo")]
    pub tempo_deviation: f64,
}

fn as_percent<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("{value:.1}%"))
}

fn as_tempo<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_tempo(*value))
}

/// Render a tempo deviation the way the dashboard expects it.
pub fn format_tempo(seconds: f64) -> String {
    format!("{seconds:+.1}s vs. pro baseline")
}

/// Where a metric value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricSource {
    Model,
    #[default]
    Fallback,
}

/// Provenance of every modeled metric in an [`Insight`]. Internal only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricProvenance {
    pub cs: MetricSource,
    pub gold_diff: MetricSource,
    pub vision_score: MetricSource,
    pub site_retake_success: MetricSource,
    pub baron_contest_rate: MetricSource,
    pub clutch_potential: MetricSource,
    pub tempo_deviation: MetricSource,
}

impl MetricProvenance {
    pub const TOTAL: usize = 7;

    /// How many metrics were backed by a model.
    pub fn model_backed(&self) -> usize {
        [
            self.cs,
            self.gold_diff,
            self.vision_score,
            self.site_retake_success,
            self.baron_contest_rate,
            self.clutch_potential,
            self.tempo_deviation,
        ]
        .iter()
        .filter(|s| **s == MetricSource::Model)
        .count()
    }
}

/// Tactical analysis for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub summary: String,
    pub squad_telemetry: Vec<SquadMetric>,
    pub probability_metrics: ProbabilityMetrics,
    pub recommendation: String,
    #[serde(skip)]
    pub provenance: MetricProvenance,
}
