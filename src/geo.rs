//! Great-circle distance between geographic coordinates.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Earth's mean radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Latitude bounds in degrees.
pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);

/// Longitude bounds in degrees.
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    /// Latitude, -90..=90.
    pub latitude: f64,
    /// Longitude, -180..=180.
    pub longitude: f64,
}

impl Coordinates {
    /// Create a coordinate pair. Bounds are checked by the validator, not here.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Haversine distance in kilometers between two points.
///
/// Inputs are expected to be within geographic bounds already.
pub fn distance_km(from: Coordinates, to: Coordinates) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = ((d_lat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos()
            * to.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2))
    .clamp(0.0, 1.0);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Round a distance to two decimal places for display.
pub fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONDON: Coordinates = Coordinates {
        latitude: 51.5074,
        longitude: -0.1278,
    };
    const PARIS: Coordinates = Coordinates {
        latitude: 48.8566,
        longitude: 2.3522,
    };

    #[test]
    fn same_point_is_zero() {
        assert_eq!(distance_km(LONDON, LONDON), 0.0);
        let origin = Coordinates::new(0.0, 0.0);
        assert_eq!(distance_km(origin, origin), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let points = [
            LONDON,
            PARIS,
            Coordinates::new(-33.8688, 151.2093),
            Coordinates::new(90.0, 0.0),
            Coordinates::new(-90.0, 180.0),
            Coordinates::new(0.0, -180.0),
        ];

        for a in points {
            for b in points {
                let ab = distance_km(a, b);
                let ba = distance_km(b, a);
                assert!((ab - ba).abs() < 1e-9, "{a:?} <-> {b:?}: {ab} vs {ba}");
            }
        }
    }

    #[test]
    fn quarter_great_circle() {
        let d = distance_km(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 90.0));
        assert_eq!(round_km(d), 10007.54);
    }

    #[test]
    fn london_to_paris() {
        let d = distance_km(LONDON, PARIS);
        assert!((d - 343.5).abs() < 1.0, "got {d}");
    }

    #[test]
    fn antipodes_are_half_circumference() {
        let d = distance_km(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn rounding_keeps_two_decimals() {
        assert_eq!(round_km(343.5567), 343.56);
        assert_eq!(round_km(0.004), 0.0);
        assert_eq!(round_km(12.0), 12.0);
    }
}
