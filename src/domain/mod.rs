//! Domain models - snapshot records and trip state
//!
//! This module contains the canonical data types used throughout the system:
//! - `TrainRecord` / `VehicleRecord` / `ProductionRecord` - FRM snapshot entries
//! - `DriveMode` - autonomous vs. manual control
//! - `TrackedTrain` / `TrackedVehicle` - per-entity trip timing state
//! - `TripEvent` - events inferred from consecutive snapshots

pub mod trip;
pub mod types;

// Re-export commonly used types at module level
pub use trip::{TrackedTrain, TrackedVehicle, TrainPhase, TripEvent, VehiclePhase};
pub use types::{
    DriveMode, EntityRecord, Location, ProductionRecord, TimetableStop, TrainRecord, VehicleRecord,
};
