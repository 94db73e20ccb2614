// src/geo/mod.rs
//! Typed coordinates, great-circle distance and the legacy location string codec

pub mod codec;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use codec::{format_location, parse_location, try_parse_location, LocationParseError};

/// Mean Earth radius used by the haversine formula, in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Latitude within [-90, 90], longitude within [-180, 180], both finite
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        haversine_km(self, other)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_location(*self))
    }
}

impl FromStr for Coordinates {
    type Err = LocationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_location(s)
    }
}

/// Great-circle distance between two points, in kilometres.
pub fn haversine_km(a: &Coordinates, b: &Coordinates) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = ((d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2))
    .clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const HANOI: Coordinates = Coordinates {
        lat: 21.0285,
        lng: 105.8542,
    };
    const HCMC: Coordinates = Coordinates {
        lat: 10.8231,
        lng: 106.6297,
    };

    #[test]
    fn test_distance_to_self_is_zero() {
        assert_eq!(haversine_km(&HANOI, &HANOI), 0.0);
        assert_eq!(haversine_km(&HCMC, &HCMC), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        assert_eq!(haversine_km(&HANOI, &HCMC), haversine_km(&HCMC, &HANOI));
    }

    #[test]
    fn test_hanoi_to_saigon() {
        let d = HANOI.distance_km(&HCMC);
        assert!((d - 1137.0).abs() < 10.0, "got {}", d);
    }

    #[test]
    fn test_antipodes_do_not_produce_nan() {
        let a = Coordinates::new(0.0, 0.0);
        let b = Coordinates::new(0.0, 180.0);
        let d = haversine_km(&a, &b);
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_is_valid() {
        assert!(HANOI.is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, -181.0).is_valid());
        assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_display_and_from_str_agree() {
        let text = HANOI.to_string();
        let parsed: Coordinates = text.parse().unwrap();
        assert!((parsed.lat - HANOI.lat).abs() < 1e-6);
        assert!((parsed.lng - HANOI.lng).abs() < 1e-6);
    }
}
