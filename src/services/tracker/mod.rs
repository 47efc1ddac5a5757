//! Entity tracking and trip event publishing
//!
//! The EntityTracker owns the per-entity trip state for one entity kind and
//! shares the registration/eviction skeleton between kinds:
//! - Manual records evict any tracked state
//! - Unknown autonomous records are offered to the detector for registration
//! - Tracked autonomous records are advanced by the detector
//! - Tracked entities missing from the snapshot are dropped
//!
//! The kind-specific rules live behind `TransitionDetector`.


use crate::domain::trip::TripEvent;
use crate::domain::types::EntityRecord;
use crate::infra::metrics::{MetricId, MetricsSink};
use chrono::{DateTime, Utc};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Outcome of feeding one record to a detector
#[derive(Debug)]
pub struct Transition<S> {
    pub state: S,
    pub events: SmallVec<[TripEvent; 2]>,
}

impl<S> Transition<S> {
    /// No event; state carried over as is
    pub fn unchanged(state: S) -> Self {
        Self { state, events: SmallVec::new() }
    }
}

/// Per-kind trip rules
///
/// Implementations are pure: all state lives in `State` and the current time
/// is passed in.
pub trait TransitionDetector: Send + Sync {
    type Record: EntityRecord;
    type State;

    /// Seed tracked state from a first autonomous sighting.
    /// Returns None when the record is not eligible yet.
    fn register(&self, record: &Self::Record) -> Option<Self::State>;

    /// Apply a record for an already tracked entity
    fn advance(
        &self,
        state: Self::State,
        record: &Self::Record,
        now: DateTime<Utc>,
    ) -> Transition<Self::State>;
}

/// Owns the tracked-entity map for one collector
pub struct EntityTracker<D: TransitionDetector> {
    detector: D,
    entries: HashMap<String, D::State>,
}

impl<D: TransitionDetector> EntityTracker<D> {
    pub fn new(detector: D) -> Self {
        Self { detector, entries: HashMap::new() }
    }

    /// Process one snapshot
    pub fn update(&mut self, records: &[D::Record], now: DateTime<Utc>, sink: &dyn MetricsSink) {
        let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());

        for record in records {
            let name = record.name();

            if !record.mode().is_autonomous() {
                if self.entries.remove(name).is_some() {
                    debug!(name = %name, mode = %record.mode(), "entity_untracked");
                }
                continue;
            }

            seen.insert(name);

            let Some(state) = self.entries.remove(name) else {
                if let Some(state) = self.detector.register(record) {
                    debug!(name = %name, "entity_tracked");
                    self.entries.insert(name.to_string(), state);
                }
                continue;
            };

            let transition = self.detector.advance(state, record, now);
            self.entries.insert(name.to_string(), transition.state);

            for event in &transition.events {
                publish_event(event, sink);
            }
        }

        let before = self.entries.len();
        self.entries.retain(|name, _| seen.contains(name.as_str()));
        let dropped = before - self.entries.len();
        if dropped > 0 {
            debug!(count = dropped, reason = "absent", "entity_untracked");
        }
    }

    pub fn tracked_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_tracked(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[cfg(test)]
    pub(crate) fn entry(&self, name: &str) -> Option<&D::State> {
        self.entries.get(name)
    }
}

/// Translate a trip event into its gauge
fn publish_event(event: &TripEvent, sink: &dyn MetricsSink) {
    debug!(name = %event.name(), event = event.as_str(), seconds = ?event.seconds(), "trip_event");

    match event {
        TripEvent::TripStarted { .. } => {}
        TripEvent::SegmentCompleted { name, from, to, seconds } => {
            let labels = [name.as_str(), from.as_str(), to.as_str()];
            sink.set(MetricId::TrainSegmentTrip, &labels, *seconds);
        }
        TripEvent::TrainRoundTrip { name, seconds } => {
            sink.set(MetricId::TrainRoundTrip, &[name.as_str()], *seconds);
        }
        TripEvent::VehicleRoundTrip { name, path_name, seconds } => {
            sink.set(MetricId::VehicleRoundTrip, &[name.as_str(), path_name.as_str()], *seconds);
        }
    }
}
