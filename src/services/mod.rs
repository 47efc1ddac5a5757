//! Services - trip inference and poll-cycle orchestration
//!
//! This module contains the core business logic services:
//! - `tracker` - Per-kind entity map with the shared registration/eviction skeleton
//! - `train_detector` - Station-change rules for train segments and round trips
//! - `vehicle_detector` - Depart/return rules for vehicle round trips
//! - `proximity` - Pluggable "nearby" and "same direction" predicates
//! - `telemetry` - Pass-through gauges (power, fuel, production)
//! - `collector` - Poll cycles and the interval runner

pub mod collector;
pub mod proximity;
pub mod telemetry;
pub mod tracker;
pub mod train_detector;
pub mod vehicle_detector;

// Re-export commonly used types
pub use collector::{run_collector, Collect, ProductionCollector, TripCollector};
pub use proximity::{LocationComparator, ToleranceComparator};
pub use telemetry::Telemetry;
pub use tracker::{EntityTracker, Transition, TransitionDetector};
pub use train_detector::TrainDetector;
pub use vehicle_detector::VehicleDetector;
