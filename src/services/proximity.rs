//! Geometric predicates for vehicle trip detection
//!
//! A vehicle is home again when it is both close to the position captured at
//! registration and pointing roughly the same way. Passing through the depot
//! in the opposite direction does not complete a loop.

use crate::domain::types::Location;
use crate::infra::config::Config;

/// Compares a vehicle's current location against its tracked home
pub trait LocationComparator: Send + Sync {
    fn is_nearby(&self, home: &Location, current: &Location) -> bool;
    fn is_same_direction(&self, home: &Location, current: &Location) -> bool;
}

/// Fixed-tolerance comparator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceComparator {
    /// World units
    pub nearby_distance: f64,
    /// Degrees
    pub heading_tolerance_deg: f64,
}

impl ToleranceComparator {
    pub fn new(nearby_distance: f64, heading_tolerance_deg: f64) -> Self {
        Self { nearby_distance, heading_tolerance_deg }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.nearby_distance(), config.heading_tolerance_deg())
    }
}

impl LocationComparator for ToleranceComparator {
    #[inline]
    fn is_nearby(&self, home: &Location, current: &Location) -> bool {
        home.distance_to(current) <= self.nearby_distance
    }

    #[inline]
    fn is_same_direction(&self, home: &Location, current: &Location) -> bool {
        home.heading_difference(current) <= self.heading_tolerance_deg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearby_boundary_is_inclusive() {
        let cmp = ToleranceComparator::new(5.0, 30.0);
        let home = Location::new(0.0, 0.0, 0.0, 0.0);

        assert!(cmp.is_nearby(&home, &Location::new(3.0, 4.0, 0.0, 0.0)));
        assert!(!cmp.is_nearby(&home, &Location::new(3.0, 4.1, 0.0, 0.0)));
    }

    #[test]
    fn test_height_counts_towards_distance() {
        let cmp = ToleranceComparator::new(10.0, 30.0);
        let home = Location::new(0.0, 0.0, 0.0, 0.0);
        assert!(!cmp.is_nearby(&home, &Location::new(0.0, 0.0, 50.0, 0.0)));
    }

    #[test]
    fn test_same_direction_across_north() {
        let cmp = ToleranceComparator::new(10.0, 30.0);
        let home = Location::new(0.0, 0.0, 0.0, 350.0);

        assert!(cmp.is_same_direction(&home, &Location::new(0.0, 0.0, 0.0, 15.0)));
        assert!(!cmp.is_same_direction(&home, &Location::new(0.0, 0.0, 0.0, 170.0)));
    }

    #[test]
    fn test_from_config() {
        let config = Config::default().with_vehicle_tolerances(800.0, 45.0);
        let cmp = ToleranceComparator::from_config(&config);
        assert_eq!(cmp, ToleranceComparator::new(800.0, 45.0));
    }
}
