//! Anomaly Tracker
//!
//! Session-scoped accumulator of anomaly events.
//!
//! ## State Machine
//!
//! ```text
//! Idle ──start_session()──▶ Active ──start_session()──▶ Active (fresh)
//!                             │
//!                             └── add_anomaly() appends, summary() projects
//! ```
//!
//! - `start_session()` is valid from any state and discards the prior events.
//! - `add_anomaly()` while `Idle` is rejected with
//!   [`TrackerError::NoActiveSession`]; the event is not stored.
//! - `summary()` never changes state. Two calls with no `add_anomaly()` in
//!   between return identical summaries.
//!
//! One tracker serves the whole process. Streams running concurrently all feed
//! the same session; their events interleave in arrival order.

pub mod drills;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::types::{AnomalyEvent, AnomalyKind, SessionSummary};

pub const STATUS_COMPLETE: &str = "Analysis Complete";
pub const STATUS_NO_SESSION: &str = "No Active Session";

/// Shown until real match clocks are wired into the feed.
pub const MATCH_DURATION_PLACEHOLDER: &str = "--:--";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("no active session; call start_session() first")]
    NoActiveSession,
}

#[derive(Debug, Clone)]
enum SessionState {
    Idle,
    Active {
        started_at: DateTime<Utc>,
        /// Monotonic start, for elapsed-time reporting.
        started: Instant,
        events: Vec<AnomalyEvent>,
    },
}

#[derive(Debug, Clone)]
pub struct AnomalyTracker {
    state: SessionState,
}

impl Default for AnomalyTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AnomalyTracker {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    /// Start (or restart) a session. Returns the wall-clock start time.
    pub fn start_session(&mut self) -> DateTime<Utc> {
        let started_at = Utc::now();
        if let SessionState::Active { events, .. } = &self.state {
            tracing::info!(discarded = events.len(), "Restarting coaching session");
        }
        self.state = SessionState::Active {
            started_at,
            started: Instant::now(),
            events: Vec::new(),
        };
        started_at
    }

    pub fn add_anomaly(&mut self, event: AnomalyEvent) -> Result<(), TrackerError> {
        match &mut self.state {
            SessionState::Active { events, .. } => {
                events.push(event);
                Ok(())
            }
            SessionState::Idle => Err(TrackerError::NoActiveSession),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active { .. })
    }

    /// Recorded events in arrival order (empty while idle).
    pub fn events(&self) -> &[AnomalyEvent] {
        match &self.state {
            SessionState::Active { events, .. } => events,
            SessionState::Idle => &[],
        }
    }

    pub fn anomaly_count(&self) -> usize {
        self.events().len()
    }

    /// Seconds since the session started, if one is active.
    pub fn elapsed_secs(&self) -> Option<u64> {
        match &self.state {
            SessionState::Active { started, .. } => Some(started.elapsed().as_secs()),
            SessionState::Idle => None,
        }
    }

    /// Project the current session into a summary. Pure read.
    pub fn summary(&self) -> SessionSummary {
        let events = self.events();

        let mut by_type: BTreeMap<AnomalyKind, usize> = BTreeMap::new();
        for e in events {
            *by_type.entry(e.kind).or_insert(0) += 1;
        }

        let (status, started_at) = match &self.state {
            SessionState::Active { started_at, .. } => (STATUS_COMPLETE, Some(*started_at)),
            SessionState::Idle => (STATUS_NO_SESSION, None),
        };

        SessionSummary {
            status: status.to_string(),
            started_at,
            total_anomalies: events.len(),
            drills: drills::select_drills(&by_type),
            anomalies_by_type: by_type,
            match_duration: MATCH_DURATION_PLACEHOLDER.to_string(),
        }
    }
}
