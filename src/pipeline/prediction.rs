//! Per-player outcome prediction.
//!
//! The streamer only depends on [`PredictionService`]. The bundled
//! [`HeuristicPredictionService`] scores assist impact from the raw
//! kill/death/assist line so the pipeline runs without an external model.

use crate::types::{PlayerRecord, Prediction, TelemetrySnapshot};

/// Produces one prediction per player, in roster order.
pub trait PredictionService: Send + Sync + 'static {
    fn predict(&self, snapshot: &TelemetrySnapshot) -> Vec<Prediction>;
}

/// Logistic score over assists, kills and deaths.
#[derive(Debug, Clone)]
pub struct HeuristicPredictionService {
    pub assist_weight: f64,
    pub kill_weight: f64,
    pub death_weight: f64,
    pub bias: f64,
}

impl Default for HeuristicPredictionService {
    fn default() -> Self {
        Self {
            assist_weight: 0.35,
            kill_weight: 0.15,
            death_weight: -0.3,
            bias: -1.5,
        }
    }
}

impl HeuristicPredictionService {
    pub fn new() -> Self {
        Self::default()
    }

    fn score(&self, player: &PlayerRecord) -> f64 {
        let z = self.bias
            + self.assist_weight * player.stat("assists")
            + self.kill_weight * player.stat("kills")
            + self.death_weight * player.stat("deaths");
        let p = 1.0 / (1.0 + (-z).exp());
        (p * 1000.0).round() / 1000.0
    }
}

fn recommendation_for(p: f64) -> &'static str {
    if p > 0.8 {
        "Commit to teamfights and play around objectives"
    } else if p > 0.6 {
        "Keep grouping with the carry and look for picks"
    } else if p > 0.3 {
        "Track enemy jungle and rotate earlier to skirmishes"
    } else {
        "Play safer and prioritise vision near objectives"
    }
}

impl PredictionService for HeuristicPredictionService {
    fn predict(&self, snapshot: &TelemetrySnapshot) -> Vec<Prediction> {
        snapshot
            .players()
            .iter()
            .map(|player| {
                let p = self.score(player);
                let mut prediction = Prediction::new(player.name.clone(), p);
                prediction.recommendation = Some(recommendation_for(p).to_string());
                prediction
            })
            .collect()
    }
}
