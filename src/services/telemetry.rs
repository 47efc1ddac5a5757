//! Pass-through gauges for snapshot fields that need no inference

use crate::domain::types::{ProductionRecord, TrainRecord, VehicleRecord};
use crate::infra::metrics::{MetricId, MetricsSink};

/// Record-level gauges published on every successful poll
pub trait Telemetry {
    fn publish(&self, sink: &dyn MetricsSink);
}

impl Telemetry for TrainRecord {
    fn publish(&self, sink: &dyn MetricsSink) {
        let labels = [self.name.as_str()];
        sink.set(MetricId::TrainPower, &labels, self.power_consumed);
        sink.set(MetricId::TrainDerailed, &labels, if self.derailed { 1.0 } else { 0.0 });
    }
}

impl Telemetry for VehicleRecord {
    fn publish(&self, sink: &dyn MetricsSink) {
        sink.set(
            MetricId::VehicleFuel,
            &[self.name.as_str(), self.fuel_type.as_str()],
            self.fuel_inventory,
        );
    }
}

impl Telemetry for ProductionRecord {
    fn publish(&self, sink: &dyn MetricsSink) {
        let labels = [self.name.as_str()];
        sink.set(MetricId::ItemProductionPerMin, &labels, self.current_production);
        sink.set(MetricId::ItemConsumptionPerMin, &labels, self.current_consumption);
        sink.set(MetricId::ItemProductionCapacityPc, &labels, self.prod_percent);
        sink.set(MetricId::ItemConsumptionCapacityPc, &labels, self.cons_percent);
        sink.set(MetricId::ItemProductionCapacityPerMin, &labels, self.max_production);
        sink.set(MetricId::ItemConsumptionCapacityPerMin, &labels, self.max_consumption);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{DriveMode, Location};
    use crate::infra::metrics::Metrics;

    #[test]
    fn test_train_telemetry() {
        let metrics = Metrics::new();
        let train = TrainRecord {
            name: "Freight 1".to_string(),
            power_consumed: 42.5,
            station: "Iron Mine".to_string(),
            derailed: true,
            mode: DriveMode::Manual,
            timetable: Vec::new(),
        };

        train.publish(&metrics);

        assert_eq!(metrics.value(MetricId::TrainPower, &["Freight 1"]), Some(42.5));
        assert_eq!(metrics.value(MetricId::TrainDerailed, &["Freight 1"]), Some(1.0));
    }

    #[test]
    fn test_vehicle_fuel() {
        let metrics = Metrics::new();
        let vehicle = VehicleRecord {
            name: "Truck 1".to_string(),
            location: Location::default(),
            forward_speed: 0.0,
            mode: DriveMode::Autonomous,
            fuel_type: "Packaged Fuel".to_string(),
            fuel_inventory: 37.0,
            path_name: "Ore Run".to_string(),
        };

        vehicle.publish(&metrics);

        assert_eq!(metrics.value(MetricId::VehicleFuel, &["Truck 1", "Packaged Fuel"]), Some(37.0));
    }

    #[test]
    fn test_production_gauges() {
        let metrics = Metrics::new();
        let record = ProductionRecord {
            name: "Iron Plate".to_string(),
            prod_percent: 80.0,
            cons_percent: 60.0,
            current_production: 120.0,
            current_consumption: 90.0,
            max_production: 150.0,
            max_consumption: 150.0,
        };

        record.publish(&metrics);

        let labels = ["Iron Plate"];
        assert_eq!(metrics.value(MetricId::ItemProductionPerMin, &labels), Some(120.0));
        assert_eq!(metrics.value(MetricId::ItemConsumptionPerMin, &labels), Some(90.0));
        assert_eq!(metrics.value(MetricId::ItemProductionCapacityPc, &labels), Some(80.0));
        assert_eq!(metrics.value(MetricId::ItemConsumptionCapacityPc, &labels), Some(60.0));
        assert_eq!(metrics.value(MetricId::ItemProductionCapacityPerMin, &labels), Some(150.0));
        assert_eq!(metrics.value(MetricId::ItemConsumptionCapacityPerMin, &labels), Some(150.0));
    }
}
