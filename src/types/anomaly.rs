//! Anomaly and session summary types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide sequence keeping ids unique within one millisecond.
static ANOMALY_SEQ: AtomicU64 = AtomicU64::new(0);

/// Anomaly category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyKind {
    /// Individual mechanical lapse (low assist impact).
    Micro,
    /// Team-level opportunity (high assist impact).
    Macro,
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyKind::Micro => write!(f, "micro"),
            AnomalyKind::Macro => write!(f, "macro"),
        }
    }
}

/// A recorded anomaly. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub player: String,
    pub message: String,
    /// Estimated swing in win probability, percent.
    pub impact: i32,
    pub timestamp: DateTime<Utc>,
}

impl AnomalyEvent {
    pub fn new(
        kind: AnomalyKind,
        player: impl Into<String>,
        message: impl Into<String>,
        impact: i32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let player = player.into();
        let seq = ANOMALY_SEQ.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!("anom-{}-{}-{}", timestamp.timestamp_millis(), seq, player),
            kind,
            player,
            message: message.into(),
            impact,
            timestamp,
        }
    }
}

/// Post-match coaching summary, computed on demand from a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub total_anomalies: usize,
    pub anomalies_by_type: BTreeMap<AnomalyKind, usize>,
    pub drills: Vec<String>,
    pub match_duration: String,
}
