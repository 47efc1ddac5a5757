//! Snapshot records served by the FRM endpoints

use serde::{Deserialize, Deserializer};

/// Status FRM reports for a train that is running its timetable
pub const TRAIN_SELF_DRIVING: &str = "TS_SelfDriving";

/// Control mode of a train or vehicle
///
/// Trip timing only runs while an entity is `Autonomous`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    Autonomous,
    Manual,
}

impl DriveMode {
    #[inline]
    pub fn is_autonomous(self) -> bool {
        matches!(self, DriveMode::Autonomous)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DriveMode::Autonomous => "autonomous",
            DriveMode::Manual => "manual",
        }
    }
}

impl std::fmt::Display for DriveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trains report a status string; only the self-driving status counts as autonomous
fn deserialize_train_status<'de, D>(deserializer: D) -> Result<DriveMode, D::Error>
where
    D: Deserializer<'de>,
{
    let status = String::deserialize(deserializer)?;
    Ok(if status == TRAIN_SELF_DRIVING { DriveMode::Autonomous } else { DriveMode::Manual })
}

/// Vehicles report a plain autopilot flag
fn deserialize_autopilot<'de, D>(deserializer: D) -> Result<DriveMode, D::Error>
where
    D: Deserializer<'de>,
{
    let autopilot = bool::deserialize(deserializer)?;
    Ok(if autopilot { DriveMode::Autonomous } else { DriveMode::Manual })
}

/// Common view of a snapshot record used by the entity tracker
pub trait EntityRecord {
    /// Stable identifier, unique per entity kind
    fn name(&self) -> &str;
    fn mode(&self) -> DriveMode;
}

/// One stop of a train timetable
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimetableStop {
    #[serde(rename = "StationName")]
    pub station_name: String,
}

/// Train entry from `/getTrains`
#[derive(Debug, Clone, Deserialize)]
pub struct TrainRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "PowerConsumed", default)]
    pub power_consumed: f64,
    /// Station the train is at, or last left
    #[serde(rename = "TrainStation", default)]
    pub station: String,
    #[serde(rename = "Derailed", default)]
    pub derailed: bool,
    #[serde(rename = "Status", deserialize_with = "deserialize_train_status")]
    pub mode: DriveMode,
    #[serde(rename = "TimeTable", default)]
    pub timetable: Vec<TimetableStop>,
}

impl EntityRecord for TrainRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn mode(&self) -> DriveMode {
        self.mode
    }
}

/// World position plus heading in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub rotation: f64,
}

impl Location {
    pub fn new(x: f64, y: f64, z: f64, rotation: f64) -> Self {
        Self { x, y, z, rotation }
    }

    /// Straight-line distance in world units
    pub fn distance_to(&self, other: &Location) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Smallest angle between the two headings, in [0, 180]
    pub fn heading_difference(&self, other: &Location) -> f64 {
        let diff = (self.rotation - other.rotation).rem_euclid(360.0);
        diff.min(360.0 - diff)
    }
}

/// Vehicle entry from `/getVehicles`
#[derive(Debug, Clone, Deserialize)]
pub struct VehicleRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "location", default)]
    pub location: Location,
    #[serde(rename = "ForwardSpeed", default)]
    pub forward_speed: f64,
    #[serde(rename = "AutoPilot", deserialize_with = "deserialize_autopilot")]
    pub mode: DriveMode,
    #[serde(rename = "FuelType", default)]
    pub fuel_type: String,
    #[serde(rename = "FuelInventory", default)]
    pub fuel_inventory: f64,
    #[serde(rename = "PathName", default)]
    pub path_name: String,
}

impl EntityRecord for VehicleRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn mode(&self) -> DriveMode {
        self.mode
    }
}

/// Item throughput entry from `/getProdStats`
#[derive(Debug, Clone, Deserialize)]
pub struct ProductionRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "ProdPercent", default)]
    pub prod_percent: f64,
    #[serde(rename = "ConsPercent", default)]
    pub cons_percent: f64,
    #[serde(rename = "CurrentProd", default)]
    pub current_production: f64,
    #[serde(rename = "CurrentConsumed", default)]
    pub current_consumption: f64,
    #[serde(rename = "MaxProd", default)]
    pub max_production: f64,
    #[serde(rename = "MaxConsumed", default)]
    pub max_consumption: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_record_from_json() {
        let json = r#"[{
            "Name": "Freight 1",
            "PowerConsumed": 42.5,
            "TrainStation": "Iron Mine",
            "Derailed": false,
            "Status": "TS_SelfDriving",
            "TimeTable": [{"StationName": "Iron Mine"}, {"StationName": "Smelter"}]
        }]"#;

        let trains: Vec<TrainRecord> = serde_json::from_str(json).unwrap();

        assert_eq!(trains.len(), 1);
        assert_eq!(trains[0].name, "Freight 1");
        assert_eq!(trains[0].station, "Iron Mine");
        assert_eq!(trains[0].mode, DriveMode::Autonomous);
        assert_eq!(trains[0].timetable.len(), 2);
        assert_eq!(trains[0].timetable[1].station_name, "Smelter");
    }

    #[test]
    fn test_train_status_other_than_self_driving_is_manual() {
        for status in ["TS_ManualDriving", "TS_Parked", "TS_Docking", ""] {
            let json = format!(r#"{{"Name": "T", "Status": "{status}"}}"#);
            let train: TrainRecord = serde_json::from_str(&json).unwrap();
            assert_eq!(train.mode, DriveMode::Manual, "status {status:?}");
        }
    }

    #[test]
    fn test_vehicle_record_from_json() {
        let json = r#"{
            "Name": "Truck 1",
            "location": {"x": 100.0, "y": -50.5, "z": 12, "rotation": 270},
            "ForwardSpeed": 3.2,
            "AutoPilot": true,
            "FuelType": "Fuel",
            "FuelInventory": 48,
            "PathName": "Ore Run"
        }"#;

        let vehicle: VehicleRecord = serde_json::from_str(json).unwrap();

        assert_eq!(vehicle.mode, DriveMode::Autonomous);
        assert_eq!(vehicle.location, Location::new(100.0, -50.5, 12.0, 270.0));
        assert_eq!(vehicle.path_name, "Ore Run");
        assert_eq!(vehicle.fuel_inventory, 48.0);
    }

    #[test]
    fn test_vehicle_autopilot_off_is_manual() {
        let json = r#"{"Name": "Truck 2", "AutoPilot": false}"#;
        let vehicle: VehicleRecord = serde_json::from_str(json).unwrap();
        assert_eq!(vehicle.mode, DriveMode::Manual);
        assert_eq!(vehicle.location, Location::default());
    }

    #[test]
    fn test_production_record_from_json() {
        let json = r#"{"Name": "Iron Plate", "ProdPercent": 80.0, "ConsPercent": 55.5,
            "CurrentProd": 120.0, "CurrentConsumed": 90.0,
            "MaxProd": 150.0, "MaxConsumed": 160.0}"#;
        let record: ProductionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.name, "Iron Plate");
        assert_eq!(record.current_production, 120.0);
        assert_eq!(record.max_consumption, 160.0);
    }

    #[test]
    fn test_drive_mode_display() {
        assert_eq!(DriveMode::Autonomous.to_string(), "autonomous");
        assert_eq!(DriveMode::Manual.to_string(), "manual");
        assert_eq!(format!("mode={}", DriveMode::Manual), "mode=manual");
    }

    #[test]
    fn test_location_distance() {
        let a = Location::new(0.0, 0.0, 0.0, 0.0);
        let b = Location::new(3.0, 4.0, 12.0, 0.0);
        assert_eq!(a.distance_to(&b), 13.0);
        assert_eq!(b.distance_to(&a), 13.0);
    }

    #[test]
    fn test_heading_difference_wraps() {
        let a = Location::new(0.0, 0.0, 0.0, 350.0);
        let b = Location::new(0.0, 0.0, 0.0, 10.0);
        assert_eq!(a.heading_difference(&b), 20.0);
        assert_eq!(b.heading_difference(&a), 20.0);

        let opposite = Location::new(0.0, 0.0, 0.0, 190.0);
        assert_eq!(b.heading_difference(&opposite), 180.0);
    }
}
