//! Inference Engine
//!
//! Turns a [`TelemetrySnapshot`] into an [`Insight`]:
//!
//! 1. Per-player squad metrics. K/D/A is copied from the feed; creep score
//!    and vision come from the tree ensemble, resource differential from the
//!    gradient-boosted model.
//! 2. Team percentages. Retake and contest rates from the gradient-boosted
//!    model over the squad mean; clutch potential and tempo deviation from the
//!    sequence model over the ordered squad.
//! 3. A templated recommendation built from the computed metrics.
//!
//! Any metric whose model is absent (or returns nothing usable) is replaced by
//! a bounded fallback estimate, see [`fallback`]. The engine holds no mutable
//! state; output depends only on the snapshot, the registry and the RNG.

pub mod fallback;
pub mod recommendation;

use rand::Rng;
use std::sync::Arc;

use crate::models::features::{player_features, FeatureVector};
use crate::models::{ModelRegistry, ModelSlot, Predictor};
use crate::types::{
    Insight, MetricProvenance, MetricSource, ProbabilityMetrics, SquadMetric, TelemetrySnapshot,
};
use fallback::{round1, IntMetric, RealMetric};

/// Output head names shared with the model artifacts.
pub mod heads {
    pub const CS: &str = "cs";
    pub const VISION: &str = "vision_score";
    pub const GOLD_DIFF: &str = "gold_diff";
    pub const SITE_RETAKE: &str = "site_retake_success";
    pub const OBJECTIVE_CONTEST: &str = "baron_contest_rate";
    pub const CLUTCH: &str = "clutch_potential";
    pub const TEMPO: &str = "tempo_deviation";
}

#[derive(Debug, Clone)]
pub struct InferenceEngine {
    registry: Arc<ModelRegistry>,
}

impl InferenceEngine {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Analyze one snapshot using the thread-local RNG for fallbacks.
    pub fn generate_insights(&self, snapshot: &TelemetrySnapshot) -> Insight {
        self.generate_insights_with_rng(snapshot, &mut rand::thread_rng())
    }

    pub fn generate_insights_with_rng<R: Rng>(
        &self,
        snapshot: &TelemetrySnapshot,
        rng: &mut R,
    ) -> Insight {
        let players = snapshot.players();
        let rows: Vec<FeatureVector> = players.iter().map(player_features).collect();
        let mut provenance = MetricProvenance::default();

        // Per-player metrics. A metric counts as model-backed only if every
        // player's value came from the model.
        let mut all_model = [!players.is_empty(); 3];
        let squad_telemetry: Vec<SquadMetric> = players
            .iter()
            .zip(&rows)
            .map(|(player, row)| {
                let row = std::slice::from_ref(row);
                let (cs, s0) = self.int_metric(ModelSlot::TreeEnsemble, heads::CS, row, IntMetric::CreepScore, rng);
                let (gold_diff, s1) =
                    self.int_metric(ModelSlot::GradientBoosted, heads::GOLD_DIFF, row, IntMetric::GoldDiff, rng);
                let (vision_score, s2) =
                    self.int_metric(ModelSlot::TreeEnsemble, heads::VISION, row, IntMetric::Vision, rng);
                for (flag, src) in all_model.iter_mut().zip([s0, s1, s2]) {
                    *flag &= src == MetricSource::Model;
                }
                SquadMetric {
                    name: player.name.clone(),
                    kda: player.kda(),
                    cs: cs.max(0),
                    gold_diff,
                    vision_score: vision_score.max(0),
                }
            })
            .collect();

        let as_source = |model: bool| if model { MetricSource::Model } else { MetricSource::Fallback };
        provenance.cs = as_source(all_model[0]);
        provenance.gold_diff = as_source(all_model[1]);
        provenance.vision_score = as_source(all_model[2]);

        let (site_retake_success, src) =
            self.percent_metric(ModelSlot::GradientBoosted, heads::SITE_RETAKE, &rows, RealMetric::SiteRetake, rng);
        provenance.site_retake_success = src;
        let (baron_contest_rate, src) = self.percent_metric(
            ModelSlot::GradientBoosted,
            heads::OBJECTIVE_CONTEST,
            &rows,
            RealMetric::ObjectiveContest,
            rng,
        );
        provenance.baron_contest_rate = src;
        let (clutch_potential, src) =
            self.percent_metric(ModelSlot::Sequence, heads::CLUTCH, &rows, RealMetric::Clutch, rng);
        provenance.clutch_potential = src;
        let (tempo_deviation, src) =
            self.real_metric(ModelSlot::Sequence, heads::TEMPO, &rows, RealMetric::Tempo, rng);
        provenance.tempo_deviation = src;

        let probability_metrics = ProbabilityMetrics {
            site_retake_success,
            baron_contest_rate,
            clutch_potential,
            tempo_deviation,
        };

        let recommendation = recommendation::recommend(&probability_metrics, &squad_telemetry);
        let summary = format!(
            "Analyzed {} players ({}/{} metrics model-backed)",
            players.len(),
            provenance.model_backed(),
            MetricProvenance::TOTAL
        );

        Insight {
            summary,
            squad_telemetry,
            probability_metrics,
            recommendation,
            provenance,
        }
    }

    /// Model output if the slot is loaded and yields a finite value.
    fn modeled(&self, slot: ModelSlot, head: &str, rows: &[FeatureVector]) -> Option<f64> {
        self.registry
            .strategy(slot)
            .predict(head, rows)
            .filter(|v| v.is_finite())
    }

    fn int_metric<R: Rng>(
        &self,
        slot: ModelSlot,
        head: &str,
        rows: &[FeatureVector],
        metric: IntMetric,
        rng: &mut R,
    ) -> (i64, MetricSource) {
        match self.modeled(slot, head, rows) {
            Some(v) => (v.round() as i64, MetricSource::Model),
            None => (metric.sample(rng), MetricSource::Fallback),
        }
    }

    fn real_metric<R: Rng>(
        &self,
        slot: ModelSlot,
        head: &str,
        rows: &[FeatureVector],
        metric: RealMetric,
        rng: &mut R,
    ) -> (f64, MetricSource) {
        match self.modeled(slot, head, rows) {
            Some(v) => (round1(v), MetricSource::Model),
            None => (metric.sample(rng), MetricSource::Fallback),
        }
    }

    /// Like [`Self::real_metric`], with modeled values clamped to [0, 100].
    fn percent_metric<R: Rng>(
        &self,
        slot: ModelSlot,
        head: &str,
        rows: &[FeatureVector],
        metric: RealMetric,
        rng: &mut R,
    ) -> (f64, MetricSource) {
        let (v, src) = self.real_metric(slot, head, rows, metric, rng);
        (v.clamp(0.0, 100.0), src)
    }
}
