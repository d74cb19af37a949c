//! Telemetry Streamer
//!
//! Fixed-cadence enrichment loop. Each tick:
//!
//! 1. Fetch one snapshot from the [`TelemetrySource`](super::TelemetrySource).
//!    A failed fetch still produces a record (with `source_error` set).
//! 2. If the snapshot carries a `players` array: predictions, player status
//!    and an [`Insight`](crate::types::Insight).
//! 3. Anomaly rules over the predictions, fed to the shared tracker.
//! 4. A bounded win-probability estimate.
//! 5. Emit, then wait for the next interval boundary.
//!
//! Only cancellation ends a stream: the token passed to [`TelemetryStreamer::spawn`]
//! or the consumer dropping its receiver.

use chrono::Utc;
use rand::Rng;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::AppContext;
use crate::config::defaults::{
    MACRO_ANOMALY_IMPACT, MICRO_ANOMALY_IMPACT, STREAM_CHANNEL_CAPACITY, WIN_PROB_RANGE,
};
use crate::inference::fallback::round1;
use crate::session::TrackerError;
use crate::types::{
    AnomalyEvent, AnomalyKind, EnrichedRecord, PlayerStatus, Prediction, TelemetrySnapshot,
};

// ============================================================================
// Stream Handle
// ============================================================================

/// A running stream. Dropping the handle (or the stream made from it) stops
/// the task at its next suspension point.
pub struct StreamHandle {
    rx: mpsc::Receiver<EnrichedRecord>,
    cancel: CancellationToken,
    task: JoinHandle<u64>,
}

impl StreamHandle {
    /// Next record, or `None` once the stream has stopped.
    pub async fn recv(&mut self) -> Option<EnrichedRecord> {
        self.rx.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel and wait for the task. Returns the number of ticks emitted.
    pub async fn stop(self) -> u64 {
        self.cancel.cancel();
        drop(self.rx);
        self.task.await.unwrap_or_else(|e| {
            warn!("Stream task ended abnormally: {}", e);
            0
        })
    }

    /// Hand the records to a consumer. The task keeps running until the
    /// stream is dropped or the token is cancelled.
    pub fn into_stream(self) -> ReceiverStream<EnrichedRecord> {
        ReceiverStream::new(self.rx)
    }
}

// ============================================================================
// Streamer
// ============================================================================

#[derive(Clone)]
pub struct TelemetryStreamer {
    ctx: AppContext,
    interval: Duration,
}

impl TelemetryStreamer {
    pub fn new(ctx: AppContext) -> Self {
        let interval = Duration::from_millis(ctx.config.stream.interval_ms.max(1));
        Self { ctx, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One enriched snapshot with no session side effects.
    pub async fn enrich(&self, series_id: &str) -> EnrichedRecord {
        let raw = match self.ctx.source.fetch(series_id).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    series_id,
                    source = self.ctx.source.source_name(),
                    "Telemetry fetch failed: {}",
                    e
                );
                return EnrichedRecord::source_failure(e);
            }
        };

        let snapshot = TelemetrySnapshot::from_raw(raw);
        let mut record = EnrichedRecord::from_snapshot(&snapshot);
        if !snapshot.has_players() {
            debug!(series_id, "Snapshot has no player data, skipping enrichment");
            return record;
        }

        let mut predictions = self.ctx.predictor.predict(&snapshot);
        for p in &mut predictions {
            p.status = Some(PlayerStatus::from_probability(p.high_assist_probability));
        }
        record.predictions = Some(predictions);
        record.mie_analysis = Some(self.ctx.engine.generate_insights(&snapshot));
        record
    }

    /// One full stream tick: enrich, record anomalies, attach win probability.
    pub async fn tick(&self, series_id: &str) -> EnrichedRecord {
        let mut record = self.enrich(series_id).await;

        if let Some(ref predictions) = record.predictions {
            let events = self.detect_anomalies(predictions);
            if !events.is_empty() {
                self.record_anomalies(events).await;
            }
        }

        record.win_prob = Some(win_probability(&mut rand::thread_rng()));
        record
    }

    /// Apply the threshold rules to one prediction list.
    pub fn detect_anomalies(&self, predictions: &[Prediction]) -> Vec<AnomalyEvent> {
        let cfg = &self.ctx.config.anomaly;
        let now = Utc::now();

        predictions
            .iter()
            .filter_map(|p| {
                let prob = p.high_assist_probability;
                if prob < cfg.micro_threshold {
                    Some(AnomalyEvent::new(
                        AnomalyKind::Micro,
                        p.name.clone(),
                        format!(
                            "{}: assist impact {:.0}% is below the {:.0}% floor. Tighten spacing and trade timing.",
                            p.name,
                            prob * 100.0,
                            cfg.micro_threshold * 100.0
                        ),
                        MICRO_ANOMALY_IMPACT,
                        now,
                    ))
                } else if cfg.detect_macro && prob > cfg.macro_threshold {
                    let advice = p.recommendation.as_deref().unwrap_or("Play around this player");
                    Some(AnomalyEvent::new(
                        AnomalyKind::Macro,
                        p.name.clone(),
                        format!("{}: {}. Model predicts high utility impact.", p.name, advice),
                        MACRO_ANOMALY_IMPACT,
                        now,
                    ))
                } else {
                    None
                }
            })
            .collect()
    }

    async fn record_anomalies(&self, events: Vec<AnomalyEvent>) {
        let mut tracker = self.ctx.tracker.write().await;
        for event in events {
            let (kind, player) = (event.kind, event.player.clone());
            match tracker.add_anomaly(event) {
                Ok(()) => debug!(%kind, player = %player, "Anomaly recorded"),
                Err(TrackerError::NoActiveSession) => {
                    debug!(%kind, player = %player, "Anomaly dropped, no active session")
                }
            }
        }
    }

    /// Run the loop on its own task.
    pub fn spawn(&self, series_id: impl Into<String>, cancel: CancellationToken) -> StreamHandle {
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let streamer = self.clone();
        let series_id = series_id.into();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move { streamer.run(series_id, tx, task_cancel).await });
        StreamHandle { rx, cancel, task }
    }

    async fn run(
        self,
        series_id: String,
        tx: mpsc::Sender<EnrichedRecord>,
        cancel: CancellationToken,
    ) -> u64 {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut emitted = 0u64;

        info!(
            series_id = %series_id,
            source = self.ctx.source.source_name(),
            interval_ms = self.interval.as_millis() as u64,
            "📡 Telemetry stream started"
        );

        loop {
            // Cancellation wins over a tick or send that is ready at the same time.
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tx.closed() => break,
                _ = ticker.tick() => {}
            }

            let record = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                record = self.tick(&series_id) => record,
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                sent = tx.send(record) => {
                    if sent.is_err() {
                        break;
                    }
                    emitted += 1;
                }
            }
        }

        info!(series_id = %series_id, emitted, "📴 Telemetry stream stopped");
        emitted
    }
}

/// Placeholder overall win probability until a real model exists.
pub fn win_probability<R: Rng>(rng: &mut R) -> f64 {
    let (lo, hi) = WIN_PROB_RANGE;
    round1(rng.gen_range(lo..=hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{PredictionService, SourceError, TelemetrySource};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedPredictions(Vec<Prediction>);

    impl PredictionService for FixedPredictions {
        fn predict(&self, _snapshot: &TelemetrySnapshot) -> Vec<Prediction> {
            self.0.clone()
        }
    }

    /// Fails on exactly one (1-based) call.
    struct FlakySource {
        calls: AtomicUsize,
        fail_on: usize,
    }

    #[async_trait]
    impl TelemetrySource for FlakySource {
        async fn fetch(&self, series_id: &str) -> Result<Value, SourceError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.fail_on {
                return Err(SourceError::Other("feed timeout".to_string()));
            }
            Ok(json!({"series_id": series_id, "tick": n, "players": [{"name": "Zven", "assists": 4}]}))
        }

        fn source_name(&self) -> &str {
            "flaky"
        }
    }

    struct NoPlayers;

    #[async_trait]
    impl TelemetrySource for NoPlayers {
        async fn fetch(&self, _series_id: &str) -> Result<Value, SourceError> {
            Ok(json!({"status": "lobby"}))
        }

        fn source_name(&self) -> &str {
            "no-players"
        }
    }

    fn streamer_with(predictions: Vec<Prediction>) -> TelemetryStreamer {
        let ctx = AppContext::synthetic().with_predictor(Arc::new(FixedPredictions(predictions)));
        TelemetryStreamer::new(ctx)
    }

    #[tokio::test]
    async fn test_low_probability_records_one_micro_anomaly() {
        let streamer = streamer_with(vec![Prediction::new("Zven", 0.1)]);
        streamer.ctx.tracker.write().await.start_session();

        streamer.tick("2616372").await;

        let tracker = streamer.ctx.tracker.read().await;
        assert_eq!(tracker.anomaly_count(), 1);
        let event = &tracker.events()[0];
        assert_eq!(event.kind, AnomalyKind::Micro);
        assert_eq!(event.player, "Zven");
        assert_eq!(event.impact, MICRO_ANOMALY_IMPACT);
    }

    #[test]
    fn test_duplicate_player_in_one_tick_gets_unique_ids() {
        let streamer = streamer_with(Vec::new());
        let events = streamer.detect_anomalies(&[Prediction::new("Zven", 0.1), Prediction::new("Zven", 0.2)]);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].timestamp, events[1].timestamp);
        assert_ne!(events[0].id, events[1].id);
    }

    #[tokio::test]
    async fn test_anomalies_dropped_without_session() {
        let streamer = streamer_with(vec![Prediction::new("Zven", 0.1)]);
        let record = streamer.tick("2616372").await;
        assert!(record.predictions.is_some());
        assert_eq!(streamer.ctx.tracker.read().await.anomaly_count(), 0);
    }

    #[tokio::test]
    async fn test_high_probability_records_macro_anomaly() {
        let mut p = Prediction::new("Blaber", 0.9);
        p.recommendation = Some("Invade enemy jungle".to_string());
        let streamer = streamer_with(vec![p, Prediction::new("Vulcan", 0.5)]);
        streamer.ctx.tracker.write().await.start_session();

        streamer.tick("1").await;

        let tracker = streamer.ctx.tracker.read().await;
        assert_eq!(tracker.anomaly_count(), 1);
        assert_eq!(tracker.events()[0].kind, AnomalyKind::Macro);
        assert_eq!(
            tracker.events()[0].message,
            "Blaber: Invade enemy jungle. Model predicts high utility impact."
        );
    }

    #[test]
    fn test_macro_detection_can_be_disabled() {
        let mut ctx = AppContext::synthetic();
        let mut config = (*ctx.config).clone();
        config.anomaly.detect_macro = false;
        ctx.config = Arc::new(config);
        let streamer = TelemetryStreamer::new(ctx);
        assert!(streamer
            .detect_anomalies(&[Prediction::new("Blaber", 0.95)])
            .is_empty());
    }

    #[test]
    fn test_thresholds_are_strict() {
        let streamer = streamer_with(Vec::new());
        let events = streamer.detect_anomalies(&[
            Prediction::new("a", 0.3),
            Prediction::new("b", 0.8),
            Prediction::new("c", 0.29),
        ]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].player, "c");
    }

    #[tokio::test]
    async fn test_enrich_attaches_status_and_insight() {
        let streamer = streamer_with(vec![
            Prediction::new("Zven", 0.7),
            Prediction::new("Vulcan", 0.2),
        ]);
        let record = streamer.enrich("1").await;
        let preds = record.predictions.expect("predictions");
        assert_eq!(preds[0].status, Some(PlayerStatus::Optimal));
        assert_eq!(preds[1].status, Some(PlayerStatus::Critical));
        assert!(record.mie_analysis.is_some());
        assert!(record.win_prob.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_without_players_passes_through() {
        let ctx = AppContext::synthetic().with_source(Arc::new(NoPlayers));
        let record = TelemetryStreamer::new(ctx).tick("1").await;
        assert_eq!(record.snapshot["status"], "lobby");
        assert!(record.predictions.is_none());
        assert!(record.mie_analysis.is_none());
        assert!(record.win_prob.is_some());
    }

    #[test]
    fn test_win_probability_range() {
        let mut rng = rand::thread_rng();
        for _ in 0..1_000 {
            let p = win_probability(&mut rng);
            assert!((45.0..=65.0).contains(&p));
            assert_eq!(p, round1(p));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_failure_does_not_break_cadence() {
        let ctx = AppContext::synthetic().with_source(Arc::new(FlakySource {
            calls: AtomicUsize::new(0),
            fail_on: 3,
        }));
        let streamer = TelemetryStreamer::new(ctx);
        let mut handle = streamer.spawn("2616372", CancellationToken::new());

        let start = tokio::time::Instant::now();
        let mut records = Vec::new();
        for _ in 0..4 {
            records.push(handle.recv().await.expect("stream ended early"));
        }
        assert_eq!(start.elapsed(), Duration::from_secs(3));

        assert_eq!(records.len(), 4);
        assert!(records[2].source_error.is_some());
        for i in [0, 1, 3] {
            assert!(records[i].source_error.is_none());
            assert!(records[i].mie_analysis.is_some());
        }
        assert!(records.iter().all(|r| r.win_prob.is_some()));

        assert!(handle.stop().await >= 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_stream() {
        let cancel = CancellationToken::new();
        let mut handle = TelemetryStreamer::new(AppContext::synthetic()).spawn("1", cancel.clone());
        assert!(handle.recv().await.is_some());

        cancel.cancel();
        assert!(handle.recv().await.is_none());
        assert_eq!(handle.stop().await, 1);
    }

    /// Takes two seconds per fetch.
    struct SlowSource {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TelemetrySource for SlowSource {
        async fn fetch(&self, _series_id: &str) -> Result<Value, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok(json!({"players": [{"name": "Blaber", "assists": 3}]}))
        }

        fn source_name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_fetch_emits_nothing_more() {
        for _ in 0..50 {
            let calls = Arc::new(AtomicUsize::new(0));
            let ctx = AppContext::synthetic()
                .with_source(Arc::new(SlowSource { calls: calls.clone() }))
                .with_predictor(Arc::new(FixedPredictions(vec![Prediction::new("Blaber", 0.1)])));
            ctx.tracker.write().await.start_session();
            let cancel = CancellationToken::new();
            let mut handle = TelemetryStreamer::new(ctx.clone()).spawn("1", cancel.clone());

            // Tick 1 fetches over [0s, 2s]; tick 2 starts at 2s.
            assert!(handle.recv().await.is_some());
            tokio::time::sleep(Duration::from_millis(500)).await;
            assert_eq!(calls.load(Ordering::SeqCst), 2);

            cancel.cancel();
            assert!(handle.recv().await.is_none());
            tokio::time::sleep(Duration::from_secs(5)).await;
            assert_eq!(calls.load(Ordering::SeqCst), 2);
            assert_eq!(ctx.tracker.read().await.anomaly_count(), 1);
            assert_eq!(handle.stop().await, 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_consumer_ends_task() {
        let handle = TelemetryStreamer::new(AppContext::synthetic()).spawn("1", CancellationToken::new());
        let StreamHandle { rx, task, .. } = handle;
        drop(rx);
        let emitted = task.await.expect("task");
        assert!(emitted <= 1);
    }
}
