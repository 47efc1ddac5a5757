//! Poll-cycle collectors
//!
//! One collector per FRM endpoint. A cycle fetches a snapshot, publishes the
//! pass-through gauges and (for trains and vehicles) runs the entity tracker.
//! A failed fetch skips the whole cycle: no tracker mutation, no gauge writes,
//! previous values stay visible.

use crate::domain::types::ProductionRecord;
use crate::infra::clock::Clock;
use crate::infra::metrics::Metrics;
use crate::io::frm::{RetrievalError, SnapshotSource};
use crate::services::telemetry::Telemetry;
use crate::services::tracker::{EntityTracker, TransitionDetector};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

#[async_trait]
pub trait Collect: Send + Sync {
    /// Label used for logs and self-metrics
    fn name(&self) -> &'static str;

    /// Run one poll cycle
    async fn collect(&self) -> Result<(), RetrievalError>;
}

/// Collector that infers trips for one entity kind
pub struct TripCollector<S, D: TransitionDetector> {
    name: &'static str,
    source: S,
    /// Held for the entire cycle so cycles never interleave
    tracker: Mutex<EntityTracker<D>>,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,
}

impl<S, D> TripCollector<S, D>
where
    S: SnapshotSource<D::Record>,
    D: TransitionDetector,
{
    pub fn new(
        name: &'static str,
        source: S,
        detector: D,
        clock: Arc<dyn Clock>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { name, source, tracker: Mutex::new(EntityTracker::new(detector)), clock, metrics }
    }

    pub async fn tracked_count(&self) -> usize {
        self.tracker.lock().await.tracked_count()
    }

    pub async fn is_tracked(&self, name: &str) -> bool {
        self.tracker.lock().await.is_tracked(name)
    }
}

#[async_trait]
impl<S, D> Collect for TripCollector<S, D>
where
    S: SnapshotSource<D::Record> + 'static,
    D: TransitionDetector + 'static,
    D::Record: Telemetry + Send + Sync + 'static,
    D::State: Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    async fn collect(&self) -> Result<(), RetrievalError> {
        let started = Instant::now();
        let mut tracker = self.tracker.lock().await;

        let records = match self.source.fetch().await {
            Ok(records) => records,
            Err(e) => {
                self.metrics.record_poll_failure(self.name);
                return Err(e);
            }
        };

        let now = self.clock.now();
        let sink = self.metrics.as_ref();

        for record in &records {
            record.publish(sink);
        }
        tracker.update(&records, now, sink);

        let tracked = tracker.tracked_count();
        drop(tracker);

        self.metrics.record_poll(self.name, started.elapsed(), Some(tracked));
        debug!(collector = self.name, records = records.len(), tracked, "poll_completed");
        Ok(())
    }
}

/// Stateless collector for `/getProdStats`
pub struct ProductionCollector<S> {
    source: S,
    metrics: Arc<Metrics>,
}

impl<S: SnapshotSource<ProductionRecord>> ProductionCollector<S> {
    pub fn new(source: S, metrics: Arc<Metrics>) -> Self {
        Self { source, metrics }
    }
}

#[async_trait]
impl<S: SnapshotSource<ProductionRecord> + 'static> Collect for ProductionCollector<S> {
    fn name(&self) -> &'static str {
        "production"
    }

    async fn collect(&self) -> Result<(), RetrievalError> {
        let started = Instant::now();

        let records = match self.source.fetch().await {
            Ok(records) => records,
            Err(e) => {
                self.metrics.record_poll_failure(self.name());
                return Err(e);
            }
        };

        for record in &records {
            record.publish(self.metrics.as_ref());
        }

        self.metrics.record_poll(self.name(), started.elapsed(), None);
        debug!(collector = self.name(), records = records.len(), "poll_completed");
        Ok(())
    }
}

/// Drive a collector on a fixed interval until shutdown
pub async fn run_collector(
    collector: Arc<dyn Collect>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);
    // A slow endpoint must not cause a burst of catch-up polls
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        collector = collector.name(),
        interval_ms = period.as_millis() as u64,
        "collector_started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = collector.collect().await {
                    warn!(collector = collector.name(), error = %e, "poll_failed");
                }
            }
            result = shutdown.changed() => {
                if result.is_err() || *shutdown.borrow() {
                    info!(collector = collector.name(), "collector_shutdown");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{DriveMode, TimetableStop, TrainRecord};
    use crate::infra::clock::ManualClock;
    use crate::infra::metrics::MetricId;
    use crate::services::train_detector::TrainDetector;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays queued snapshots; empty queue yields an empty snapshot
    struct ScriptedSource<R> {
        queue: parking_lot::Mutex<VecDeque<Result<Vec<R>, RetrievalError>>>,
        fetches: AtomicUsize,
    }

    impl<R> ScriptedSource<R> {
        fn new() -> Self {
            Self { queue: parking_lot::Mutex::new(VecDeque::new()), fetches: AtomicUsize::new(0) }
        }

        fn push(&self, snapshot: Vec<R>) {
            self.queue.lock().push_back(Ok(snapshot));
        }

        fn push_failure(&self) {
            self.queue.lock().push_back(Err(RetrievalError::Status {
                url: "http://frm/test".to_string(),
                status: 500,
            }));
        }
    }

    #[async_trait]
    impl<R: Send + 'static> SnapshotSource<R> for Arc<ScriptedSource<R>> {
        async fn fetch(&self) -> Result<Vec<R>, RetrievalError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.queue.lock().pop_front().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn train(station: &str, mode: DriveMode) -> TrainRecord {
        TrainRecord {
            name: "T1".to_string(),
            power_consumed: 12.0,
            station: station.to_string(),
            derailed: false,
            mode,
            timetable: ["A", "B"]
                .iter()
                .map(|s| TimetableStop { station_name: s.to_string() })
                .collect(),
        }
    }

    fn train_collector(
        source: Arc<ScriptedSource<TrainRecord>>,
        clock: Arc<ManualClock>,
        metrics: Arc<Metrics>,
    ) -> TripCollector<Arc<ScriptedSource<TrainRecord>>, TrainDetector> {
        TripCollector::new("trains", source, TrainDetector::new(), clock, metrics)
    }

    #[tokio::test]
    async fn test_cycle_publishes_telemetry_and_trips() {
        let source = Arc::new(ScriptedSource::new());
        let clock = Arc::new(ManualClock::at_epoch_secs(0));
        let metrics = Arc::new(Metrics::new());
        let collector = train_collector(source.clone(), clock.clone(), metrics.clone());

        source.push(vec![train("B", DriveMode::Autonomous)]);
        source.push(vec![train("A", DriveMode::Autonomous)]);
        source.push(vec![train("B", DriveMode::Autonomous)]);

        collector.collect().await.unwrap();
        clock.set_epoch_secs(10);
        collector.collect().await.unwrap();
        clock.set_epoch_secs(70);
        collector.collect().await.unwrap();

        assert_eq!(metrics.value(MetricId::TrainPower, &["T1"]), Some(12.0));
        assert_eq!(metrics.value(MetricId::TrainSegmentTrip, &["T1", "A", "B"]), Some(60.0));
        assert_eq!(metrics.value(MetricId::TrainRoundTrip, &["T1"]), None);
        assert_eq!(metrics.value(MetricId::PollsTotal, &["trains"]), Some(3.0));
        assert_eq!(metrics.value(MetricId::TrackedEntities, &["trains"]), Some(1.0));
    }

    #[tokio::test]
    async fn test_failure_leaves_state_untouched() {
        let source = Arc::new(ScriptedSource::new());
        let clock = Arc::new(ManualClock::at_epoch_secs(0));
        let metrics = Arc::new(Metrics::new());
        let collector = train_collector(source.clone(), clock.clone(), metrics.clone());

        source.push(vec![train("B", DriveMode::Autonomous)]);
        source.push(vec![train("A", DriveMode::Autonomous)]);
        collector.collect().await.unwrap();
        clock.set_epoch_secs(5);
        collector.collect().await.unwrap();

        let before = metrics.series(MetricId::TrainPower);

        source.push_failure();
        clock.set_epoch_secs(30);
        assert!(collector.collect().await.is_err());

        assert!(collector.is_tracked("T1").await);
        assert_eq!(metrics.series(MetricId::TrainPower), before);
        assert_eq!(metrics.value(MetricId::PollFailuresTotal, &["trains"]), Some(1.0));
        assert_eq!(metrics.value(MetricId::PollsTotal, &["trains"]), Some(2.0));

        // Timing continues from the last successful cycle
        source.push(vec![train("B", DriveMode::Autonomous)]);
        clock.set_epoch_secs(45);
        collector.collect().await.unwrap();
        assert_eq!(metrics.value(MetricId::TrainSegmentTrip, &["T1", "A", "B"]), Some(40.0));
    }

    #[tokio::test]
    async fn test_manual_train_untracked() {
        let source = Arc::new(ScriptedSource::new());
        let metrics = Arc::new(Metrics::new());
        let collector =
            train_collector(source.clone(), Arc::new(ManualClock::default()), metrics.clone());

        source.push(vec![train("A", DriveMode::Autonomous)]);
        source.push(vec![train("A", DriveMode::Manual)]);
        collector.collect().await.unwrap();
        assert_eq!(collector.tracked_count().await, 1);

        collector.collect().await.unwrap();
        assert_eq!(collector.tracked_count().await, 0);
        assert_eq!(metrics.value(MetricId::TrackedEntities, &["trains"]), Some(0.0));
        // Telemetry still flows for manual trains
        assert_eq!(metrics.value(MetricId::TrainDerailed, &["T1"]), Some(0.0));
    }

    #[tokio::test]
    async fn test_production_collector() {
        let source: Arc<ScriptedSource<ProductionRecord>> = Arc::new(ScriptedSource::new());
        let metrics = Arc::new(Metrics::new());
        let collector = ProductionCollector::new(source.clone(), metrics.clone());

        source.push(vec![ProductionRecord {
            name: "Screw".to_string(),
            prod_percent: 50.0,
            cons_percent: 25.0,
            current_production: 200.0,
            current_consumption: 100.0,
            max_production: 400.0,
            max_consumption: 400.0,
        }]);
        source.push_failure();

        collector.collect().await.unwrap();
        assert!(collector.collect().await.is_err());

        assert_eq!(metrics.value(MetricId::ItemProductionPerMin, &["Screw"]), Some(200.0));
        assert_eq!(metrics.value(MetricId::PollsTotal, &["production"]), Some(1.0));
        assert_eq!(metrics.value(MetricId::PollFailuresTotal, &["production"]), Some(1.0));
        assert!(metrics.series(MetricId::TrackedEntities).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_collector_polls_until_shutdown() {
        let source: Arc<ScriptedSource<ProductionRecord>> = Arc::new(ScriptedSource::new());
        let metrics = Arc::new(Metrics::new());
        let collector: Arc<dyn Collect> =
            Arc::new(ProductionCollector::new(source.clone(), metrics.clone()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(run_collector(collector, Duration::from_secs(5), shutdown_rx));

        tokio::time::sleep(Duration::from_secs(12)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        // Ticks at 0s, 5s and 10s
        assert_eq!(source.fetches.load(Ordering::SeqCst), 3);
        assert_eq!(metrics.value(MetricId::PollsTotal, &["production"]), Some(3.0));
    }
}
