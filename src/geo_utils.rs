// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coordinate helpers: great-circle distance, validation and formatting.

use crate::models::place::LatLng;
use geo::{Distance, Haversine, Point};

/// Great-circle distance between two coordinates, in meters.
pub fn haversine_distance(a: &LatLng, b: &LatLng) -> f64 {
    Haversine.distance(Point::from(*a), Point::from(*b))
}

/// Check that a coordinate is finite and inside lat/lng bounds.
pub fn validate_location(location: &LatLng) -> bool {
    location.lat.is_finite()
        && location.lng.is_finite()
        && (-90.0..=90.0).contains(&location.lat)
        && (-180.0..=180.0).contains(&location.lng)
}

/// Format a distance for display, e.g. "850m" or "4.21km".
pub fn format_distance(distance_meters: f64) -> String {
    if distance_meters < 1000.0 {
        format!("{:.0}m", distance_meters)
    } else {
        format!("{:.2}km", distance_meters / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_location_valid() {
        assert!(validate_location(&LatLng::new(35.6762, 139.6503)));
        assert!(validate_location(&LatLng::new(-90.0, 180.0)));
    }

    #[test]
    fn test_validate_location_invalid() {
        assert!(!validate_location(&LatLng::new(200.0, 100.0)));
        assert!(!validate_location(&LatLng::new(35.0, -180.5)));
        assert!(!validate_location(&LatLng::new(f64::NAN, 0.0)));
    }

    #[test]
    fn test_haversine_tokyo_osaka() {
        let tokyo = LatLng::new(35.6762, 139.6503);
        let osaka = LatLng::new(34.6937, 135.5023);

        let distance = haversine_distance(&tokyo, &osaka);

        // Roughly 400km
        assert!(390_000.0 < distance && distance < 410_000.0, "{}", distance);
    }

    #[test]
    fn test_haversine_same_point_is_zero() {
        let p = LatLng::new(48.8566, 2.3522);
        assert!(haversine_distance(&p, &p).abs() < 1e-6);
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(500.0), "500m");
        assert_eq!(format_distance(1500.0), "1.50km");
        assert_eq!(format_distance(10000.0), "10.00km");
    }
}
