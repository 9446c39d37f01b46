//! Geographic coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when latitude or longitude is out of range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid coordinates ({lat}, {lon}): {reason}")]
pub struct InvalidCoordinates {
    lat: f64,
    lon: f64,
    reason: &'static str,
}

#[derive(Deserialize)]
struct RawCoordinates {
    lat: f64,
    lon: f64,
}

/// A WGS84 position in decimal degrees.
///
/// Latitude is within [-90, 90] and longitude within [-180, 180];
/// both are finite. These hold for every value by construction.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinates")]
pub struct Coordinates {
    lat: f64,
    lon: f64,
}

impl Coordinates {
    /// Create coordinates, validating ranges.
    pub fn new(lat: f64, lon: f64) -> Result<Self, InvalidCoordinates> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(InvalidCoordinates {
                lat,
                lon,
                reason: "must be finite",
            });
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(InvalidCoordinates {
                lat,
                lon,
                reason: "latitude must be within [-90, 90]",
            });
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(InvalidCoordinates {
                lat,
                lon,
                reason: "longitude must be within [-180, 180]",
            });
        }
        Ok(Self { lat, lon })
    }

    /// Create coordinates, wrapping longitude into [-180, 180] and clamping latitude.
    ///
    /// Used for computed points (interpolation, perturbation) that may drift
    /// marginally outside the valid range.
    pub fn normalized(lat: f64, lon: f64) -> Self {
        let lat = lat.clamp(-90.0, 90.0);
        let mut lon = (lon + 180.0).rem_euclid(360.0) - 180.0;
        if lon == -180.0 {
            lon = 180.0;
        }
        Self { lat, lon }
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Convert to a `geo` point (x = longitude, y = latitude).
    pub fn to_point(&self) -> geo::Point<f64> {
        geo::Point::new(self.lon, self.lat)
    }

    /// Approximate equality within `eps` degrees on both axes.
    ///
    /// Longitudes of -180 and 180 are treated as equal.
    pub fn approx_eq(&self, other: &Coordinates, eps: f64) -> bool {
        let dlon = (self.lon - other.lon).abs();
        let dlon = dlon.min(360.0 - dlon);
        (self.lat - other.lat).abs() <= eps && dlon <= eps
    }
}

impl TryFrom<RawCoordinates> for Coordinates {
    type Error = InvalidCoordinates;

    fn try_from(raw: RawCoordinates) -> Result<Self, Self::Error> {
        Coordinates::new(raw.lat, raw.lon)
    }
}

impl fmt::Debug for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_range() {
        assert!(Coordinates::new(62.0278, 129.7042).is_ok());
        assert!(Coordinates::new(-90.0, -180.0).is_ok());
        assert!(Coordinates::new(90.0, 180.0).is_ok());
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(Coordinates::new(91.0, 0.0).is_err());
        assert!(Coordinates::new(0.0, 180.5).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn normalized_wraps_longitude() {
        let c = Coordinates::normalized(10.0, 190.0);
        assert!((c.lon() - -170.0).abs() < 1e-9);

        let c = Coordinates::normalized(10.0, -181.0);
        assert!((c.lon() - 179.0).abs() < 1e-9);

        let c = Coordinates::normalized(95.0, 0.0);
        assert_eq!(c.lat(), 90.0);
    }

    #[test]
    fn approx_eq_across_antimeridian() {
        let a = Coordinates::new(0.0, 180.0).unwrap();
        let b = Coordinates::new(0.0, -180.0).unwrap();
        assert!(a.approx_eq(&b, 1e-9));
    }

    #[test]
    fn deserialize_validates() {
        let ok: Coordinates = serde_json::from_str(r#"{"lat": 55.7558, "lon": 37.6173}"#).unwrap();
        assert_eq!(ok.lat(), 55.7558);
        assert!(serde_json::from_str::<Coordinates>(r#"{"lat": 120.0, "lon": 0.0}"#).is_err());
    }
}
