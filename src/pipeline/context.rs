//! Process-wide shared state.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use super::prediction::{HeuristicPredictionService, PredictionService};
use super::source::{SyntheticSource, TelemetrySource};
use crate::config::AegisConfig;
use crate::inference::InferenceEngine;
use crate::models::ModelRegistry;
use crate::session::AnomalyTracker;

/// Everything a request or stream needs, built once in `main`.
///
/// Cloning is cheap: every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AegisConfig>,
    pub registry: Arc<ModelRegistry>,
    pub engine: InferenceEngine,
    pub tracker: Arc<RwLock<AnomalyTracker>>,
    pub source: Arc<dyn TelemetrySource>,
    pub predictor: Arc<dyn PredictionService>,
    pub started: Instant,
}

impl AppContext {
    pub fn new(
        config: AegisConfig,
        registry: ModelRegistry,
        source: Arc<dyn TelemetrySource>,
        predictor: Arc<dyn PredictionService>,
    ) -> Self {
        let registry = Arc::new(registry);
        Self {
            config: Arc::new(config),
            engine: InferenceEngine::new(Arc::clone(&registry)),
            registry,
            tracker: Arc::new(RwLock::new(AnomalyTracker::new())),
            source,
            predictor,
            started: Instant::now(),
        }
    }

    /// Default config, empty registry, synthetic feed, heuristic predictor.
    pub fn synthetic() -> Self {
        Self::new(
            AegisConfig::default(),
            ModelRegistry::empty(),
            Arc::new(SyntheticSource::new()),
            Arc::new(HeuristicPredictionService::new()),
        )
    }

    pub fn with_source(mut self, source: Arc<dyn TelemetrySource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_predictor(mut self, predictor: Arc<dyn PredictionService>) -> Self {
        self.predictor = predictor;
        self
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
