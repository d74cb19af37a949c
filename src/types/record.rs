//! The enriched record emitted to clients.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use super::{Insight, Prediction, TelemetrySnapshot};

/// Keys owned by the pipeline. Upstream fields with these names are replaced.
const RESERVED_KEYS: [&str; 4] = ["predictions", "mie_analysis", "win_prob", "source_error"];

/// One enriched snapshot.
///
/// Serialises flat: every upstream snapshot field, followed by `predictions`,
/// `mie_analysis`, `win_prob` and `source_error` when set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedRecord {
    pub snapshot: Map<String, Value>,
    pub predictions: Option<Vec<Prediction>>,
    pub mie_analysis: Option<Insight>,
    pub win_prob: Option<f64>,
    /// Set when the telemetry source failed for this tick.
    pub source_error: Option<String>,
}

impl EnrichedRecord {
    pub fn from_snapshot(snapshot: &TelemetrySnapshot) -> Self {
        Self {
            snapshot: snapshot.raw.clone(),
            ..Self::default()
        }
    }

    pub fn source_failure(error: impl std::fmt::Display) -> Self {
        Self {
            source_error: Some(error.to_string()),
            ..Self::default()
        }
    }

    /// One NDJSON line, newline included.
    pub fn to_ndjson_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

impl Serialize for EnrichedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (k, v) in &self.snapshot {
            if !RESERVED_KEYS.contains(&k.as_str()) {
                map.serialize_entry(k, v)?;
            }
        }
        if let Some(ref predictions) = self.predictions {
            map.serialize_entry("predictions", predictions)?;
        }
        if let Some(ref insight) = self.mie_analysis {
            map.serialize_entry("mie_analysis", insight)?;
        }
        if let Some(win_prob) = self.win_prob {
            map.serialize_entry("win_prob", &win_prob)?;
        }
        if let Some(ref err) = self.source_error {
            map.serialize_entry("source_error", err)?;
        }
        map.end()
    }
}
