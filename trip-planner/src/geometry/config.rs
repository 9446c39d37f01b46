//! Geometry synthesis configuration.

use std::time::Duration;

/// Parameters for synthesized geometry.
#[derive(Debug, Clone)]
pub struct GeometryConfig {
    /// Fewest points on a great-circle arc.
    pub min_arc_points: usize,

    /// Most points on a great-circle arc.
    pub max_arc_points: usize,

    /// Arc length represented by each additional point (km).
    pub km_per_arc_point: f64,

    /// Number of half-waves on a ferry or winter-road line.
    pub wave_count: u32,

    /// Peak lateral offset as a fraction of the line length.
    pub wave_amplitude_ratio: f64,

    /// Points on a wavy line.
    pub wave_points: usize,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            min_arc_points: 10,
            max_arc_points: 100,
            km_per_arc_point: 50.0,
            wave_count: 3,
            wave_amplitude_ratio: 0.05,
            wave_points: 24,
        }
    }
}

/// Configuration for road-routing lookups and their cache.
#[derive(Debug, Clone)]
pub struct RouterCacheConfig {
    /// Upper bound on one routing call, including connection setup.
    pub timeout: Duration,

    /// TTL for cached routed geometries.
    pub ttl: Duration,

    /// Maximum number of cached geometries.
    pub max_capacity: u64,
}

impl Default for RouterCacheConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(1500),
            ttl: Duration::from_secs(24 * 60 * 60),
            max_capacity: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = GeometryConfig::default();
        assert_eq!(config.min_arc_points, 10);
        assert_eq!(config.max_arc_points, 100);
        assert_eq!(config.km_per_arc_point, 50.0);

        let router = RouterCacheConfig::default();
        assert_eq!(router.timeout, Duration::from_millis(1500));
        assert_eq!(router.max_capacity, 10_000);
    }
}
