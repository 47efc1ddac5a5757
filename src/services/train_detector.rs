//! Train trip detection from station changes
//!
//! The only discrete signal a snapshot carries for a train is the station it
//! is at (or last left). Every change of that station is an arrival:
//! - The first arrival after registration starts the round trip clock
//! - Each later arrival completes a segment from the previous station
//! - After as many arrivals as the timetable has stops, the round trip completes
//!
//! Derailment is published as its own gauge and does not pause the clock.

use crate::domain::trip::{seconds_between, TrackedTrain, TrainPhase, TripEvent};
use crate::domain::types::TrainRecord;
use crate::services::tracker::{Transition, TransitionDetector};
use chrono::{DateTime, Utc};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, Default)]
pub struct TrainDetector;

impl TrainDetector {
    pub fn new() -> Self {
        Self
    }
}

impl TransitionDetector for TrainDetector {
    type Record = TrainRecord;
    type State = TrackedTrain;

    fn register(&self, record: &TrainRecord) -> Option<TrackedTrain> {
        Some(TrackedTrain::new(record))
    }

    fn advance(
        &self,
        mut train: TrackedTrain,
        record: &TrainRecord,
        now: DateTime<Utc>,
    ) -> Transition<TrackedTrain> {
        if record.station == train.station {
            return Transition::unchanged(train);
        }

        let mut events = SmallVec::new();

        train.phase = match train.phase {
            TrainPhase::AwaitingFirstArrival => {
                events.push(TripEvent::TripStarted { name: train.name.clone() });
                TrainPhase::Running {
                    first_arrival_at: now,
                    arrived_at: now,
                    stops_since_first_arrival: 0,
                }
            }
            TrainPhase::Running { first_arrival_at, arrived_at, stops_since_first_arrival } => {
                let stops = stops_since_first_arrival + 1;

                events.push(TripEvent::SegmentCompleted {
                    name: train.name.clone(),
                    from: train.station.clone(),
                    to: record.station.clone(),
                    seconds: seconds_between(arrived_at, now),
                });

                // Empty timetable: every arrival closes a round trip
                if stops >= train.route.len() {
                    events.push(TripEvent::TrainRoundTrip {
                        name: train.name.clone(),
                        seconds: seconds_between(first_arrival_at, now),
                    });
                    TrainPhase::Running {
                        first_arrival_at: now,
                        arrived_at: now,
                        stops_since_first_arrival: 0,
                    }
                } else {
                    TrainPhase::Running {
                        first_arrival_at,
                        arrived_at: now,
                        stops_since_first_arrival: stops,
                    }
                }
            }
        };

        train.station.clone_from(&record.station);

        Transition { state: train, events }
    }
}
