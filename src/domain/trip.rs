//! Tracked trip state and the events inferred from it

use crate::domain::types::{Location, TrainRecord, VehicleRecord};
use chrono::{DateTime, Utc};

/// Seconds elapsed between two instants, never negative
#[inline]
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let millis = (to - from).num_milliseconds();
    (millis.max(0) as f64) / 1000.0
}

/// Progress of a tracked train through its timetable
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrainPhase {
    /// Registered; waiting for the first station change
    AwaitingFirstArrival,
    Running {
        /// Start of the current round trip
        first_arrival_at: DateTime<Utc>,
        /// Last station change
        arrived_at: DateTime<Utc>,
        stops_since_first_arrival: usize,
    },
}

/// Train under trip timing
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedTrain {
    pub name: String,
    pub station: String,
    /// Timetable captured at registration
    pub route: Vec<String>,
    pub phase: TrainPhase,
}

impl TrackedTrain {
    pub fn new(record: &TrainRecord) -> Self {
        Self {
            name: record.name.clone(),
            station: record.station.clone(),
            route: record.timetable.iter().map(|stop| stop.station_name.clone()).collect(),
            phase: TrainPhase::AwaitingFirstArrival,
        }
    }

    #[inline]
    pub fn stops_since_first_arrival(&self) -> Option<usize> {
        match self.phase {
            TrainPhase::AwaitingFirstArrival => None,
            TrainPhase::Running { stops_since_first_arrival, .. } => {
                Some(stops_since_first_arrival)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VehiclePhase {
    /// Within the home radius
    NotDeparted,
    Departed { departed_at: DateTime<Utc> },
}

/// Vehicle under trip timing
///
/// `home` is the position and heading captured when tracking started.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedVehicle {
    pub name: String,
    pub path_name: String,
    pub home: Location,
    pub phase: VehiclePhase,
}

impl TrackedVehicle {
    pub fn new(record: &VehicleRecord) -> Self {
        Self {
            name: record.name.clone(),
            path_name: record.path_name.clone(),
            home: record.location,
            phase: VehiclePhase::NotDeparted,
        }
    }

    #[inline]
    pub fn has_departed(&self) -> bool {
        matches!(self.phase, VehiclePhase::Departed { .. })
    }
}

/// Event inferred from consecutive snapshots of one entity
#[derive(Debug, Clone, PartialEq)]
pub enum TripEvent {
    /// Timing baseline established (first train arrival, or vehicle left home)
    TripStarted { name: String },
    SegmentCompleted { name: String, from: String, to: String, seconds: f64 },
    TrainRoundTrip { name: String, seconds: f64 },
    VehicleRoundTrip { name: String, path_name: String, seconds: f64 },
}

impl TripEvent {
    pub fn name(&self) -> &str {
        match self {
            TripEvent::TripStarted { name }
            | TripEvent::SegmentCompleted { name, .. }
            | TripEvent::TrainRoundTrip { name, .. }
            | TripEvent::VehicleRoundTrip { name, .. } => name,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TripEvent::TripStarted { .. } => "trip_started",
            TripEvent::SegmentCompleted { .. } => "segment_completed",
            TripEvent::TrainRoundTrip { .. } => "train_round_trip",
            TripEvent::VehicleRoundTrip { .. } => "vehicle_round_trip",
        }
    }

    /// Duration carried by the event, if any
    pub fn seconds(&self) -> Option<f64> {
        match self {
            TripEvent::TripStarted { .. } => None,
            TripEvent::SegmentCompleted { seconds, .. }
            | TripEvent::TrainRoundTrip { seconds, .. }
            | TripEvent::VehicleRoundTrip { seconds, .. } => Some(*seconds),
        }
    }
}
