//! Validation thresholds.

use crate::domain::TransportType;

/// Thresholds for the structural and plausibility checks.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Relative difference tolerated between declared and expected distance.
    pub distance_tolerance: f64,

    /// Relative difference tolerated between declared and expected base fare.
    pub price_tolerance: f64,

    /// A terrain-following geometry no longer than this multiple of the
    /// straight line is suspicious.
    pub min_terrain_path_ratio: f64,

    /// Any geometry longer than this multiple of the straight line is suspicious.
    pub max_path_ratio: f64,
}

impl ValidationConfig {
    pub fn new(distance_tolerance: f64, price_tolerance: f64) -> Self {
        Self {
            distance_tolerance,
            price_tolerance,
            ..Self::default()
        }
    }

    /// Fastest believable average speed (km/h).
    pub fn max_speed_kmh(&self, transport: TransportType) -> f64 {
        match transport {
            TransportType::Airplane => 1000.0,
            TransportType::Train => 200.0,
            TransportType::Bus => 120.0,
            TransportType::Ferry => 60.0,
            TransportType::WinterRoad => 90.0,
            TransportType::Taxi => 150.0,
        }
    }

    /// Typical ratio of travelled to great-circle distance.
    pub fn circuity(&self, transport: TransportType) -> f64 {
        match transport {
            TransportType::Airplane => 1.05,
            TransportType::Train => 1.25,
            TransportType::Bus | TransportType::Taxi => 1.3,
            TransportType::Ferry => 1.3,
            TransportType::WinterRoad => 1.35,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            distance_tolerance: 0.25,
            price_tolerance: 0.30,
            min_terrain_path_ratio: 1.01,
            max_path_ratio: 3.0,
        }
    }
}
