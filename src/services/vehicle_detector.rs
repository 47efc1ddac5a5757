//! Vehicle round trip detection from position samples
//!
//! A vehicle is registered while (nearly) standing still, which fixes its home
//! position and heading. Leaving the home radius starts the clock; coming back
//! into it facing the same way completes the round trip.

use crate::domain::trip::{seconds_between, TrackedVehicle, TripEvent, VehiclePhase};
use crate::domain::types::VehicleRecord;
use crate::infra::config::Config;
use crate::services::proximity::{LocationComparator, ToleranceComparator};
use crate::services::tracker::{Transition, TransitionDetector};
use chrono::{DateTime, Utc};
use smallvec::smallvec;
use tracing::debug;

pub struct VehicleDetector<C = ToleranceComparator> {
    comparator: C,
    registration_speed_limit: f64,
}

impl VehicleDetector<ToleranceComparator> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(ToleranceComparator::from_config(config), config.registration_speed_limit())
    }
}

impl<C: LocationComparator> VehicleDetector<C> {
    pub fn new(comparator: C, registration_speed_limit: f64) -> Self {
        Self { comparator, registration_speed_limit }
    }

    pub fn registration_speed_limit(&self) -> f64 {
        self.registration_speed_limit
    }
}

impl<C: LocationComparator> TransitionDetector for VehicleDetector<C> {
    type Record = VehicleRecord;
    type State = TrackedVehicle;

    fn register(&self, record: &VehicleRecord) -> Option<TrackedVehicle> {
        if record.forward_speed < self.registration_speed_limit {
            Some(TrackedVehicle::new(record))
        } else {
            debug!(
                name = %record.name,
                speed = record.forward_speed,
                "vehicle_registration_deferred"
            );
            None
        }
    }

    fn advance(
        &self,
        mut vehicle: TrackedVehicle,
        record: &VehicleRecord,
        now: DateTime<Utc>,
    ) -> Transition<TrackedVehicle> {
        let nearby = self.comparator.is_nearby(&vehicle.home, &record.location);

        match vehicle.phase {
            VehiclePhase::NotDeparted if !nearby => {
                vehicle.phase = VehiclePhase::Departed { departed_at: now };
                let events = smallvec![TripEvent::TripStarted { name: vehicle.name.clone() }];
                Transition { state: vehicle, events }
            }
            VehiclePhase::Departed { departed_at }
                if nearby
                    && self.comparator.is_same_direction(&vehicle.home, &record.location) =>
            {
                let event = TripEvent::VehicleRoundTrip {
                    name: vehicle.name.clone(),
                    path_name: vehicle.path_name.clone(),
                    seconds: seconds_between(departed_at, now),
                };
                vehicle.phase = VehiclePhase::NotDeparted;
                Transition { state: vehicle, events: smallvec![event] }
            }
            _ => Transition::unchanged(vehicle),
        }
    }
}
