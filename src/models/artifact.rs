//! Model artifact formats and evaluation.
//!
//! Artifacts are JSON documents holding one or more named output heads.
//! Three families are supported:
//! - **Tree ensemble**: averaged decision stumps
//! - **Gradient boosted**: base score + learning rate × sum of stumps,
//!   optionally squashed through a logistic into a percentage
//! - **Sequence**: a single-unit recurrent cell run over the squad in order
//!
//! Every artifact is validated against [`NUM_FEATURES`] on load so evaluation
//! can index feature vectors without bounds surprises.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::features::{mean_features, FeatureVector, NUM_FEATURES};
use super::{ModelLoadError, ModelSlot};

/// Artifact format version understood by this build.
pub const ARTIFACT_VERSION: u32 = 1;

// ============================================================================
// Predictor
// ============================================================================

/// Evaluates a named output head over a sequence of feature vectors.
///
/// Single-row models evaluate the column mean of the sequence; a one-player
/// sequence is therefore a per-player prediction. Returns `None` when the
/// head does not exist or the input is empty.
pub trait Predictor {
    fn predict(&self, head: &str, sequence: &[FeatureVector]) -> Option<f64>;
}

// ============================================================================
// Building Blocks
// ============================================================================

/// A depth-one decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stump {
    pub feature: usize,
    pub threshold: f64,
    pub left: f64,
    pub right: f64,
}

impl Stump {
    fn eval(&self, x: &FeatureVector) -> f64 {
        if x[self.feature] <= self.threshold {
            self.left
        } else {
            self.right
        }
    }

    fn check(&self, head: &str, errors: &mut Vec<String>) {
        if self.feature >= NUM_FEATURES {
            errors.push(format!(
                "head '{head}': stump feature index {} out of range (< {NUM_FEATURES})",
                self.feature
            ));
        }
        if ![self.threshold, self.left, self.right].iter().all(|v| v.is_finite()) {
            errors.push(format!("head '{head}': stump contains non-finite values"));
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

// ============================================================================
// Tree Ensemble
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub version: u32,
    pub heads: BTreeMap<String, Vec<Stump>>,
}

impl Predictor for TreeEnsemble {
    fn predict(&self, head: &str, sequence: &[FeatureVector]) -> Option<f64> {
        let stumps = self.heads.get(head).filter(|s| !s.is_empty())?;
        if sequence.is_empty() {
            return None;
        }
        let x = mean_features(sequence);
        Some(stumps.iter().map(|s| s.eval(&x)).sum::<f64>() / stumps.len() as f64)
    }
}

impl TreeEnsemble {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (name, stumps) in &self.heads {
            if stumps.is_empty() {
                errors.push(format!("head '{name}' has no stumps"));
            }
            stumps.iter().for_each(|s| s.check(name, &mut errors));
        }
        errors
    }
}

// ============================================================================
// Gradient Boosted
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedHead {
    pub base_score: f64,
    pub learning_rate: f64,
    pub stumps: Vec<Stump>,
    /// Map the raw margin through a logistic and scale to percent.
    #[serde(default)]
    pub logistic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosted {
    pub version: u32,
    pub heads: BTreeMap<String, BoostedHead>,
}

impl Predictor for GradientBoosted {
    fn predict(&self, head: &str, sequence: &[FeatureVector]) -> Option<f64> {
        let h = self.heads.get(head)?;
        if sequence.is_empty() {
            return None;
        }
        let x = mean_features(sequence);
        let margin = h.base_score + h.learning_rate * h.stumps.iter().map(|s| s.eval(&x)).sum::<f64>();
        Some(if h.logistic { sigmoid(margin) * 100.0 } else { margin })
    }
}

impl GradientBoosted {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (name, h) in &self.heads {
            if !h.base_score.is_finite() || !h.learning_rate.is_finite() {
                errors.push(format!("head '{name}': non-finite base score or learning rate"));
            }
            h.stumps.iter().for_each(|s| s.check(name, &mut errors));
        }
        errors
    }
}

// ============================================================================
// Sequence
// ============================================================================

/// `h_t = tanh(w · x_t + r · h_{t-1} + b)`, output `offset + scale · h_T`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrentHead {
    pub input_weights: Vec<f64>,
    pub recurrent_weight: f64,
    pub bias: f64,
    pub output_scale: f64,
    pub output_offset: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceModel {
    pub version: u32,
    pub heads: BTreeMap<String, RecurrentHead>,
}

impl Predictor for SequenceModel {
    fn predict(&self, head: &str, sequence: &[FeatureVector]) -> Option<f64> {
        let h = self.heads.get(head)?;
        if sequence.is_empty() {
            return None;
        }
        let state = sequence.iter().fold(0.0, |prev, x| {
            let drive: f64 = h.input_weights.iter().zip(x).map(|(w, v)| w * v).sum();
            (drive + h.recurrent_weight * prev + h.bias).tanh()
        });
        Some(h.output_offset + h.output_scale * state)
    }
}

impl SequenceModel {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (name, h) in &self.heads {
            if h.input_weights.len() != NUM_FEATURES {
                errors.push(format!(
                    "head '{name}': expected {NUM_FEATURES} input weights, found {}",
                    h.input_weights.len()
                ));
            }
            let scalars = [h.recurrent_weight, h.bias, h.output_scale, h.output_offset];
            if !h.input_weights.iter().chain(scalars.iter()).all(|v| v.is_finite()) {
                errors.push(format!("head '{name}': non-finite weights"));
            }
        }
        errors
    }
}

// ============================================================================
// Strategy
// ============================================================================

/// Loaded model, dispatched on by the inference engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelStrategy {
    TreeEnsemble(TreeEnsemble),
    GradientBoosted(GradientBoosted),
    Sequence(SequenceModel),
    Absent,
}

impl Predictor for ModelStrategy {
    fn predict(&self, head: &str, sequence: &[FeatureVector]) -> Option<f64> {
        match self {
            ModelStrategy::TreeEnsemble(m) => m.predict(head, sequence),
            ModelStrategy::GradientBoosted(m) => m.predict(head, sequence),
            ModelStrategy::Sequence(m) => m.predict(head, sequence),
            ModelStrategy::Absent => None,
        }
    }
}

/// An immutable handle to a loaded model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    pub slot: ModelSlot,
    pub strategy: ModelStrategy,
}

impl ModelArtifact {
    pub fn is_available(&self) -> bool {
        !matches!(self.strategy, ModelStrategy::Absent)
    }

    /// Read, deserialize and validate the artifact for `slot` at `path`.
    pub fn load(slot: ModelSlot, path: &Path) -> Result<Self, ModelLoadError> {
        let data = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ModelLoadError::NotFound(path.to_path_buf())
            } else {
                ModelLoadError::Io(path.to_path_buf(), e)
            }
        })?;

        let deser = |e| ModelLoadError::Deserialize(path.to_path_buf(), e);
        let (version, mut errors, strategy) = match slot {
            ModelSlot::TreeEnsemble => {
                let m: TreeEnsemble = serde_json::from_slice(&data).map_err(deser)?;
                (m.version, m.validate(), ModelStrategy::TreeEnsemble(m))
            }
            ModelSlot::GradientBoosted => {
                let m: GradientBoosted = serde_json::from_slice(&data).map_err(deser)?;
                (m.version, m.validate(), ModelStrategy::GradientBoosted(m))
            }
            ModelSlot::Sequence => {
                let m: SequenceModel = serde_json::from_slice(&data).map_err(deser)?;
                (m.version, m.validate(), ModelStrategy::Sequence(m))
            }
        };

        if version != ARTIFACT_VERSION {
            errors.push(format!(
                "unsupported artifact version {version} (expected {ARTIFACT_VERSION})"
            ));
        }
        if !errors.is_empty() {
            return Err(ModelLoadError::Invalid(path.to_path_buf(), errors.join("; ")));
        }

        Ok(Self { slot, strategy })
    }
}
