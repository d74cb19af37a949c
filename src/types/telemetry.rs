//! Telemetry snapshot and prediction types.
//!
//! Snapshots arrive as loosely-structured JSON from an upstream feed. They are
//! parsed leniently: the raw object is kept verbatim for passthrough, and the
//! `players` array is lifted into typed [`PlayerRecord`]s with any missing or
//! non-numeric stat treated as absent (reads as zero).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One player's numeric stats for a single match instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    #[serde(default)]
    pub stats: BTreeMap<String, f64>,
}

impl PlayerRecord {
    /// Stat value, or `0.0` when the feed did not carry it.
    pub fn stat(&self, key: &str) -> f64 {
        self.stats.get(key).copied().unwrap_or(0.0)
    }

    /// Compact "K/D/A" rendering.
    pub fn kda(&self) -> String {
        format!(
            "{}/{}/{}",
            self.stat("kills").max(0.0).round() as i64,
            self.stat("deaths").max(0.0).round() as i64,
            self.stat("assists").max(0.0).round() as i64
        )
    }

    fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self {
                name: "Unknown".to_string(),
                stats: BTreeMap::new(),
            };
        };

        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown")
            .to_string();

        let mut stats = BTreeMap::new();
        collect_numeric(obj, &mut stats);
        // A nested `stats` object wins over top-level fields of the same name.
        if let Some(nested) = obj.get("stats").and_then(Value::as_object) {
            collect_numeric(nested, &mut stats);
        }

        Self { name, stats }
    }
}

fn collect_numeric(obj: &Map<String, Value>, out: &mut BTreeMap<String, f64>) {
    for (k, v) in obj {
        if let Some(n) = v.as_f64().filter(|n| n.is_finite()) {
            out.insert(k.clone(), n);
        }
    }
}

/// One match instant as delivered by a telemetry source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    /// Every top-level field exactly as received.
    pub raw: Map<String, Value>,
    /// `Some` iff the record carried a `players` array.
    pub players: Option<Vec<PlayerRecord>>,
}

impl TelemetrySnapshot {
    /// Build a snapshot from arbitrary JSON. Never fails; anything that is not
    /// an object becomes an empty snapshot.
    pub fn from_raw(value: Value) -> Self {
        let raw = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let players = raw
            .get("players")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().map(PlayerRecord::from_value).collect());
        Self { raw, players }
    }

    /// Players, or an empty slice when absent.
    pub fn players(&self) -> &[PlayerRecord] {
        self.players.as_deref().unwrap_or(&[])
    }

    pub fn has_players(&self) -> bool {
        self.players.is_some()
    }
}

/// Output of the external prediction service for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub name: String,
    #[serde(default)]
    pub high_assist_probability: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    /// Player status derived from the probability (filled in by the streamer).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PlayerStatus>,
    /// Any further fields the service returns, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Prediction {
    pub fn new(name: impl Into<String>, high_assist_probability: f64) -> Self {
        Self {
            name: name.into(),
            high_assist_probability,
            recommendation: None,
            status: None,
            extra: Map::new(),
        }
    }
}

/// Dashboard status band for a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    Optimal,
    Warning,
    Critical,
}

impl PlayerStatus {
    /// Classify an assist-impact probability.
    pub fn from_probability(p: f64) -> Self {
        use crate::config::defaults::{STATUS_OPTIMAL_ABOVE, STATUS_WARNING_ABOVE};
        if p > STATUS_OPTIMAL_ABOVE {
            PlayerStatus::Optimal
        } else if p > STATUS_WARNING_ABOVE {
            PlayerStatus::Warning
        } else {
            PlayerStatus::Critical
        }
    }
}
