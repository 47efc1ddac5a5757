//! Gauge registry backing the Prometheus endpoint
//!
//! Every metric family is a map from label tuple to value behind its own
//! `RwLock`. Writers take the write lock for a single insert; the exporter
//! takes read locks while rendering, so a scrape never blocks a poll cycle
//! for longer than one family copy.
//!
//! NOTE: gauges use set semantics (last write wins). Counters are the only
//! families that accumulate and are reserved for collector self-metrics.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::time::Duration;

/// Prometheus metric type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Gauge,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
        }
    }
}

/// Every metric family the exporter publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricId {
    TrainRoundTrip,
    TrainSegmentTrip,
    TrainPower,
    TrainDerailed,
    VehicleRoundTrip,
    VehicleFuel,
    ItemProductionPerMin,
    ItemConsumptionPerMin,
    ItemProductionCapacityPc,
    ItemConsumptionCapacityPc,
    ItemProductionCapacityPerMin,
    ItemConsumptionCapacityPerMin,
    PollsTotal,
    PollFailuresTotal,
    TrackedEntities,
    PollDuration,
    BuildInfo,
}

impl MetricId {
    /// Rendering order on `/metrics`
    pub const ALL: [MetricId; 17] = [
        MetricId::TrainRoundTrip,
        MetricId::TrainSegmentTrip,
        MetricId::TrainPower,
        MetricId::TrainDerailed,
        MetricId::VehicleRoundTrip,
        MetricId::VehicleFuel,
        MetricId::ItemProductionPerMin,
        MetricId::ItemConsumptionPerMin,
        MetricId::ItemProductionCapacityPc,
        MetricId::ItemConsumptionCapacityPc,
        MetricId::ItemProductionCapacityPerMin,
        MetricId::ItemConsumptionCapacityPerMin,
        MetricId::PollsTotal,
        MetricId::PollFailuresTotal,
        MetricId::TrackedEntities,
        MetricId::PollDuration,
        MetricId::BuildInfo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetricId::TrainRoundTrip => "train_round_trip_seconds",
            MetricId::TrainSegmentTrip => "train_segment_trip_seconds",
            MetricId::TrainPower => "train_power_consumed",
            MetricId::TrainDerailed => "train_derailed",
            MetricId::VehicleRoundTrip => "vehicle_round_trip_seconds",
            MetricId::VehicleFuel => "vehicle_fuel",
            MetricId::ItemProductionPerMin => "item_production_per_min",
            MetricId::ItemConsumptionPerMin => "item_consumption_per_min",
            MetricId::ItemProductionCapacityPc => "item_production_capacity_pc",
            MetricId::ItemConsumptionCapacityPc => "item_consumption_capacity_pc",
            MetricId::ItemProductionCapacityPerMin => "item_production_capacity_per_min",
            MetricId::ItemConsumptionCapacityPerMin => "item_consumption_capacity_per_min",
            MetricId::PollsTotal => "frm_polls_total",
            MetricId::PollFailuresTotal => "frm_poll_failures_total",
            MetricId::TrackedEntities => "frm_tracked_entities",
            MetricId::PollDuration => "frm_poll_duration_seconds",
            MetricId::BuildInfo => "frm_exporter_build_info",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            MetricId::TrainRoundTrip => "Recorded train round trip time in seconds",
            MetricId::TrainSegmentTrip => {
                "Recorded train trip time between two stations in seconds"
            }
            MetricId::TrainPower => "Power consumed by the train in MW",
            MetricId::TrainDerailed => "Whether the train is derailed (1) or not (0)",
            MetricId::VehicleRoundTrip => "Recorded vehicle round trip time in seconds",
            MetricId::VehicleFuel => "Amount of fuel remaining",
            MetricId::ItemProductionPerMin => "Current items produced per minute",
            MetricId::ItemConsumptionPerMin => "Current items consumed per minute",
            MetricId::ItemProductionCapacityPc => "Production as a percentage of capacity",
            MetricId::ItemConsumptionCapacityPc => "Consumption as a percentage of capacity",
            MetricId::ItemProductionCapacityPerMin => "Maximum items produced per minute",
            MetricId::ItemConsumptionCapacityPerMin => "Maximum items consumed per minute",
            MetricId::PollsTotal => "Successful poll cycles",
            MetricId::PollFailuresTotal => {
                "Poll cycles skipped because the snapshot could not be retrieved"
            }
            MetricId::TrackedEntities => "Entities currently under trip timing",
            MetricId::PollDuration => "Duration of the last successful poll cycle in seconds",
            MetricId::BuildInfo => "Exporter build information",
        }
    }

    pub fn label_names(self) -> &'static [&'static str] {
        match self {
            MetricId::TrainRoundTrip
            | MetricId::TrainPower
            | MetricId::TrainDerailed
            | MetricId::ItemProductionPerMin
            | MetricId::ItemConsumptionPerMin
            | MetricId::ItemProductionCapacityPc
            | MetricId::ItemConsumptionCapacityPc
            | MetricId::ItemProductionCapacityPerMin
            | MetricId::ItemConsumptionCapacityPerMin => &["name"],
            MetricId::TrainSegmentTrip => &["name", "from", "to"],
            MetricId::VehicleRoundTrip => &["name", "path_name"],
            MetricId::VehicleFuel => &["name", "fuel_type"],
            MetricId::PollsTotal
            | MetricId::PollFailuresTotal
            | MetricId::TrackedEntities
            | MetricId::PollDuration => &["collector"],
            MetricId::BuildInfo => &["version", "git_hash"],
        }
    }

    pub fn metric_type(self) -> MetricType {
        match self {
            MetricId::PollsTotal | MetricId::PollFailuresTotal => MetricType::Counter,
            _ => MetricType::Gauge,
        }
    }
}

/// Destination for derived values
///
/// Implementations must tolerate concurrent readers; a later `set` for the
/// same label tuple replaces the earlier value.
pub trait MetricsSink: Send + Sync {
    fn set(&self, metric: MetricId, labels: &[&str], value: f64);
}

type Series = BTreeMap<Vec<String>, f64>;

/// Registry of all metric families
pub struct Metrics {
    families: FxHashMap<MetricId, RwLock<Series>>,
}

impl Metrics {
    pub fn new() -> Self {
        let families = MetricId::ALL.iter().map(|&id| (id, RwLock::new(Series::new()))).collect();
        Self { families }
    }

    fn family(&self, metric: MetricId) -> &RwLock<Series> {
        // Every MetricId is inserted in new()
        &self.families[&metric]
    }

    #[inline]
    fn key(metric: MetricId, labels: &[&str]) -> Vec<String> {
        debug_assert_eq!(
            labels.len(),
            metric.label_names().len(),
            "label arity mismatch for {}",
            metric.name()
        );
        labels.iter().map(|l| l.to_string()).collect()
    }

    /// Add 1 to a counter series
    pub fn inc(&self, metric: MetricId, labels: &[&str]) {
        let key = Self::key(metric, labels);
        *self.family(metric).write().entry(key).or_insert(0.0) += 1.0;
    }

    /// Current value of one series
    pub fn value(&self, metric: MetricId, labels: &[&str]) -> Option<f64> {
        let key = Self::key(metric, labels);
        self.family(metric).read().get(&key).copied()
    }

    /// Copy of all series of a family, ordered by label values
    pub fn series(&self, metric: MetricId) -> Vec<(Vec<String>, f64)> {
        self.family(metric).read().iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    /// Record a completed poll cycle
    pub fn record_poll(&self, collector: &str, elapsed: Duration, tracked: Option<usize>) {
        self.inc(MetricId::PollsTotal, &[collector]);
        self.set(MetricId::PollDuration, &[collector], elapsed.as_secs_f64());
        if let Some(count) = tracked {
            self.set(MetricId::TrackedEntities, &[collector], count as f64);
        }
    }

    /// Record a poll cycle that was skipped
    pub fn record_poll_failure(&self, collector: &str) {
        self.inc(MetricId::PollFailuresTotal, &[collector]);
    }

    pub fn set_build_info(&self, version: &str, git_hash: &str) {
        self.set(MetricId::BuildInfo, &[version, git_hash], 1.0);
    }
}

impl MetricsSink for Metrics {
    fn set(&self, metric: MetricId, labels: &[&str], value: f64) {
        let key = Self::key(metric, labels);
        self.family(metric).write().insert(key, value);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
