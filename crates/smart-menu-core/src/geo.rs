//! # Geo Module
//!
//! Great-circle distance plus the road distance and travel time estimates
//! used to quote deliveries.
//!
//! ## Estimation Pipeline
//! ```text
//! restaurant ──┐
//!              ├──► haversine_distance ──► × road_factor ──► distance_km (2 dp)
//! customer ────┘         (km)               (1.3)               │
//!                                                               ▼
//!                                          distance / speed × 60, floor 5 min
//! ```
//!
//! Geocoding itself is I/O and lives in the service crate; this module only
//! sees coordinates.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::GeoPoint;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates, in kilometres.
///
/// ## Example
/// ```rust
/// use smart_menu_core::geo::haversine_distance;
///
/// // Auckland CBD to Wellington CBD, roughly 490 km
/// let d = haversine_distance(-36.8485, 174.7633, -41.2865, 174.7762);
/// assert!((d - 493.0).abs() < 5.0);
/// ```
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

impl GeoPoint {
    /// Straight-line distance to `other`, in kilometres.
    #[inline]
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        haversine_distance(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Rounds to `places` decimal places, half away from zero.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

// =============================================================================
// Distance Model
// =============================================================================

/// Policy constants turning a straight line into a delivery estimate.
///
/// None of these are measured; they are tunable per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceModel {
    /// Road distance ÷ straight-line distance.
    pub road_factor: f64,
    /// Flat average urban driving speed.
    pub average_speed_kmh: f64,
    /// Shortest duration ever quoted.
    pub min_duration_minutes: u32,
}

impl Default for DistanceModel {
    fn default() -> Self {
        DistanceModel {
            road_factor: 1.3,
            average_speed_kmh: 35.0,
            min_duration_minutes: 5,
        }
    }
}

impl DistanceModel {
    /// Estimated road distance, rounded to 2 decimal places.
    pub fn estimate_road_distance(&self, straight_line_km: f64) -> f64 {
        round_to(straight_line_km * self.road_factor, 2)
    }

    /// Estimated travel time in whole minutes, never below the floor.
    pub fn estimate_duration(&self, distance_km: f64) -> u32 {
        let minutes = (distance_km / self.average_speed_kmh * 60.0).round();
        // Saturating cast; a non-finite or negative input lands on the floor.
        let minutes = if minutes.is_finite() && minutes > 0.0 {
            minutes as u32
        } else {
            0
        };
        minutes.max(self.min_duration_minutes)
    }

    /// Runs the whole pipeline between two points.
    pub fn estimate_route(&self, origin: &GeoPoint, destination: &GeoPoint) -> RouteEstimate {
        let straight_line_km = origin.distance_to(destination);
        let distance_km = self.estimate_road_distance(straight_line_km);

        RouteEstimate {
            straight_line_km,
            distance_km,
            duration_minutes: self.estimate_duration(distance_km),
        }
    }
}

/// Result of [`DistanceModel::estimate_route`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RouteEstimate {
    pub straight_line_km: f64,
    /// Road distance used for pricing (2 dp).
    pub distance_km: f64,
    pub duration_minutes: u32,
}

impl RouteEstimate {
    /// Distance shown to customers (1 dp).
    pub fn display_distance_km(&self) -> f64 {
        round_to(self.distance_km, 1)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Degrees of latitude spanning `km` along a meridian.
    fn km_to_lat_degrees(km: f64) -> f64 {
        (km / EARTH_RADIUS_KM).to_degrees()
    }

    #[test]
    fn test_haversine_symmetry_and_identity() {
        let auckland = GeoPoint::new(-36.8485, 174.7633);
        let wellington = GeoPoint::new(-41.2865, 174.7762);

        assert_eq!(auckland.distance_to(&wellington), wellington.distance_to(&auckland));
        assert_eq!(auckland.distance_to(&auckland), 0.0);
    }

    #[test]
    fn test_haversine_monotonic_with_separation() {
        let origin = GeoPoint::new(-36.8485, 174.7633);
        let mut previous = 0.0;
        for step in 1..=20 {
            let point = GeoPoint::new(origin.lat + step as f64 * 0.01, origin.lng + step as f64 * 0.01);
            let d = origin.distance_to(&point);
            assert!(d > previous);
            previous = d;
        }
    }

    #[test]
    fn test_meridian_distance() {
        let origin = GeoPoint::new(-36.8485, 174.7633);
        let north = GeoPoint::new(origin.lat + km_to_lat_degrees(4.2), origin.lng);
        assert!((origin.distance_to(&north) - 4.2).abs() < 1e-9);
    }

    #[test]
    fn test_road_distance_and_duration() {
        let model = DistanceModel::default();
        assert_eq!(model.estimate_road_distance(4.2), 5.46);
        assert_eq!(model.estimate_road_distance(0.0), 0.0);

        // 5.46 km at 35 km/h = 9.36 min
        assert_eq!(model.estimate_duration(5.46), 9);
        // Short hops hit the floor
        assert_eq!(model.estimate_duration(0.5), 5);
        assert_eq!(model.estimate_duration(35.0), 60);
    }

    #[test]
    fn test_configurable_model() {
        let model = DistanceModel {
            road_factor: 1.5,
            average_speed_kmh: 50.0,
            min_duration_minutes: 10,
        };
        assert_eq!(model.estimate_road_distance(2.0), 3.0);
        assert_eq!(model.estimate_duration(3.0), 10);
        assert_eq!(model.estimate_duration(25.0), 30);
    }

    #[test]
    fn test_estimate_route() {
        let origin = GeoPoint::new(-36.8485, 174.7633);
        let customer = GeoPoint::new(origin.lat + km_to_lat_degrees(4.2), origin.lng);

        let route = DistanceModel::default().estimate_route(&origin, &customer);
        assert_eq!(route.distance_km, 5.46);
        assert_eq!(route.display_distance_km(), 5.5);
        assert_eq!(route.duration_minutes, 9);
    }
}
