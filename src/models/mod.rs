//! Model Registry
//!
//! Loads the three inference model slots once at startup. Each slot is loaded
//! in isolation: a missing file, a corrupt artifact or a disabled runtime is
//! recorded as "absent" for that slot alone and logged, never propagated.
//!
//! ## Slots
//!
//! - **Tree ensemble**: per-player creep score and vision
//! - **Gradient boosted**: resource differential, retake and contest rates
//! - **Sequence**: clutch potential and tempo, over the ordered squad.
//!   Requires the `sequence-model` build feature and `models.sequence_enabled`.
//!
//! The registry is immutable after [`ModelRegistry::load`] and is shared as
//! `Arc<ModelRegistry>`; concurrent reads need no locking.

pub mod artifact;
pub mod features;

pub use artifact::{ModelArtifact, ModelStrategy, Predictor};
pub use features::{FeatureVector, NUM_FEATURES};

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::ModelsConfig;

/// A model slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSlot {
    TreeEnsemble,
    GradientBoosted,
    Sequence,
}

impl ModelSlot {
    pub const ALL: [ModelSlot; 3] = [
        ModelSlot::TreeEnsemble,
        ModelSlot::GradientBoosted,
        ModelSlot::Sequence,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn file_name(self, config: &ModelsConfig) -> &str {
        match self {
            ModelSlot::TreeEnsemble => &config.tree_ensemble_file,
            ModelSlot::GradientBoosted => &config.gradient_boosted_file,
            ModelSlot::Sequence => &config.sequence_file,
        }
    }
}

impl std::fmt::Display for ModelSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelSlot::TreeEnsemble => write!(f, "tree-ensemble"),
            ModelSlot::GradientBoosted => write!(f, "gradient-boosted"),
            ModelSlot::Sequence => write!(f, "sequence"),
        }
    }
}

/// Why a slot could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("artifact not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
    #[error("failed to deserialize {}: {1}", .0.display())]
    Deserialize(PathBuf, #[source] serde_json::Error),
    #[error("invalid artifact {}: {1}", .0.display())]
    Invalid(PathBuf, String),
    #[error("runtime unavailable: {0}")]
    RuntimeUnavailable(&'static str),
    #[error("disabled by configuration")]
    Disabled,
}

/// Load outcome of one slot, as reported by `/api/models`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotStatus {
    pub slot: ModelSlot,
    pub available: bool,
    pub path: Option<PathBuf>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
struct SlotEntry {
    artifact: ModelArtifact,
    path: Option<PathBuf>,
    reason: Option<String>,
}

impl SlotEntry {
    fn absent(slot: ModelSlot, path: Option<PathBuf>, reason: Option<String>) -> Self {
        Self {
            artifact: ModelArtifact {
                slot,
                strategy: ModelStrategy::Absent,
            },
            path,
            reason,
        }
    }
}

/// Read-only view of the loaded models.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    slots: [SlotEntry; 3],
}

impl ModelRegistry {
    /// A registry with every slot absent.
    pub fn empty() -> Self {
        Self {
            slots: ModelSlot::ALL.map(|slot| SlotEntry::absent(slot, None, None)),
        }
    }

    /// Build a registry from already-loaded artifacts. Slots not covered stay
    /// absent; a later artifact for the same slot replaces an earlier one.
    pub fn from_artifacts(artifacts: impl IntoIterator<Item = ModelArtifact>) -> Self {
        let mut registry = Self::empty();
        for artifact in artifacts {
            let idx = artifact.slot.index();
            registry.slots[idx] = SlotEntry {
                artifact,
                path: None,
                reason: None,
            };
        }
        registry
    }

    /// Attempt every slot from `config.model_dir`. Never fails.
    pub fn load(config: &ModelsConfig) -> Self {
        info!(dir = %config.model_dir.display(), "Loading inference models");

        let slots = ModelSlot::ALL.map(|slot| {
            let path = config.model_dir.join(slot.file_name(config));
            match Self::load_slot(slot, &path, config) {
                Ok(artifact) => {
                    info!(slot = %slot, path = %path.display(), "✓ Model loaded");
                    SlotEntry {
                        artifact,
                        path: Some(path),
                        reason: None,
                    }
                }
                Err(e) => {
                    warn!(slot = %slot, error = %e, "Model unavailable, using fallback estimates");
                    SlotEntry::absent(slot, Some(path), Some(e.to_string()))
                }
            }
        });

        let registry = Self { slots };
        info!(
            available = registry.available_count(),
            total = ModelSlot::ALL.len(),
            "Model registry ready"
        );
        registry
    }

    fn load_slot(
        slot: ModelSlot,
        path: &Path,
        config: &ModelsConfig,
    ) -> Result<ModelArtifact, ModelLoadError> {
        if slot == ModelSlot::Sequence {
            if !cfg!(feature = "sequence-model") {
                return Err(ModelLoadError::RuntimeUnavailable(
                    "built without the `sequence-model` feature",
                ));
            }
            if !config.sequence_enabled {
                return Err(ModelLoadError::Disabled);
            }
        }
        ModelArtifact::load(slot, path)
    }

    pub fn is_available(&self, slot: ModelSlot) -> bool {
        self.slots[slot.index()].artifact.is_available()
    }

    /// The loaded artifact, or `None` when the slot is absent.
    pub fn get(&self, slot: ModelSlot) -> Option<&ModelArtifact> {
        let artifact = &self.slots[slot.index()].artifact;
        artifact.is_available().then_some(artifact)
    }

    /// Strategy for a slot (`Absent` when not loaded).
    pub fn strategy(&self, slot: ModelSlot) -> &ModelStrategy {
        &self.slots[slot.index()].artifact.strategy
    }

    pub fn available_count(&self) -> usize {
        ModelSlot::ALL.iter().filter(|s| self.is_available(**s)).count()
    }

    pub fn status(&self) -> Vec<SlotStatus> {
        self.slots
            .iter()
            .map(|e| SlotStatus {
                slot: e.artifact.slot,
                available: e.artifact.is_available(),
                path: e.path.clone(),
                reason: e.reason.clone(),
            })
            .collect()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_json(dir: &Path, name: &str, value: &serde_json::Value) {
        std::fs::write(dir.join(name), serde_json::to_vec(value).expect("json")).expect("write");
    }

    fn tree_json() -> serde_json::Value {
        json!({
            "version": 1,
            "heads": {
                "cs": [{"feature": 4, "threshold": 100.0, "left": 180.0, "right": 260.0}]
            }
        })
    }

    fn config_for(dir: &Path) -> ModelsConfig {
        ModelsConfig {
            model_dir: dir.to_path_buf(),
            ..ModelsConfig::default()
        }
    }

    #[test]
    fn test_empty_dir_loads_all_absent() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let registry = ModelRegistry::load(&config_for(dir.path()));

        for slot in ModelSlot::ALL {
            assert!(!registry.is_available(slot));
            assert!(registry.get(slot).is_none());
        }
        let status = registry.status();
        assert_eq!(status.len(), 3);
        assert!(status.iter().all(|s| s.reason.is_some()));
    }

    #[test]
    fn test_corrupt_slot_does_not_block_others() {
        let dir = tempfile::tempdir().expect("tmpdir");
        write_json(dir.path(), "tree_ensemble.json", &tree_json());
        std::fs::write(dir.path().join("gradient_boosted.json"), b"{ not json").expect("write");

        let registry = ModelRegistry::load(&config_for(dir.path()));

        assert!(registry.is_available(ModelSlot::TreeEnsemble));
        assert!(!registry.is_available(ModelSlot::GradientBoosted));
        let boosted = &registry.status()[1];
        assert!(boosted
            .reason
            .as_deref()
            .is_some_and(|r| r.contains("deserialize")));
    }

    #[test]
    fn test_invalid_feature_index_rejected() {
        let dir = tempfile::tempdir().expect("tmpdir");
        write_json(
            dir.path(),
            "tree_ensemble.json",
            &json!({
                "version": 1,
                "heads": {"cs": [{"feature": 99, "threshold": 0.0, "left": 1.0, "right": 2.0}]}
            }),
        );

        let err = ModelArtifact::load(ModelSlot::TreeEnsemble, &dir.path().join("tree_ensemble.json"))
            .expect_err("feature 99 is out of range");
        assert!(matches!(err, ModelLoadError::Invalid(_, ref msg) if msg.contains("out of range")));
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let mut doc = tree_json();
        doc["version"] = json!(7);
        write_json(dir.path(), "tree_ensemble.json", &doc);

        let registry = ModelRegistry::load(&config_for(dir.path()));
        assert!(!registry.is_available(ModelSlot::TreeEnsemble));
    }

    #[cfg(not(feature = "sequence-model"))]
    #[test]
    fn test_sequence_slot_needs_feature() {
        let dir = tempfile::tempdir().expect("tmpdir");
        write_json(
            dir.path(),
            "sequence.json",
            &json!({"version": 1, "heads": {}}),
        );

        let registry = ModelRegistry::load(&config_for(dir.path()));
        assert!(!registry.is_available(ModelSlot::Sequence));
        assert!(registry.status()[2]
            .reason
            .as_deref()
            .is_some_and(|r| r.contains("sequence-model")));
    }

    #[cfg(feature = "sequence-model")]
    #[test]
    fn test_sequence_slot_respects_config_switch() {
        let dir = tempfile::tempdir().expect("tmpdir");
        write_json(
            dir.path(),
            "sequence.json",
            &json!({"version": 1, "heads": {}}),
        );

        let mut config = config_for(dir.path());
        assert!(ModelRegistry::load(&config).is_available(ModelSlot::Sequence));

        config.sequence_enabled = false;
        assert!(!ModelRegistry::load(&config).is_available(ModelSlot::Sequence));
    }

    #[test]
    fn test_from_artifacts() {
        let artifact = ModelArtifact {
            slot: ModelSlot::GradientBoosted,
            strategy: ModelStrategy::GradientBoosted(artifact::GradientBoosted {
                version: 1,
                heads: Default::default(),
            }),
        };
        let registry = ModelRegistry::from_artifacts([artifact]);
        assert!(registry.is_available(ModelSlot::GradientBoosted));
        assert!(!registry.is_available(ModelSlot::TreeEnsemble));
        assert_eq!(registry.available_count(), 1);
    }
}
