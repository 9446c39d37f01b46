//! Canonical ground distance.
//!
//! Haversine distance is the single source of truth for "how far apart are
//! two points" across geometry synthesis, hub ranking and validation.

use geo::{Haversine, Length, LineString, line_string};

use crate::domain::Coordinates;

/// Great-circle distance between two points in kilometres.
///
/// # Examples
///
/// ```
/// use trip_planner::domain::Coordinates;
/// use trip_planner::geometry::haversine_km;
///
/// let yakutsk = Coordinates::new(62.0278, 129.7042).unwrap();
/// let moscow = Coordinates::new(55.7558, 37.6173).unwrap();
/// let d = haversine_km(&yakutsk, &moscow);
/// assert!((4800.0..5000.0).contains(&d));
/// ```
pub fn haversine_km(a: &Coordinates, b: &Coordinates) -> f64 {
    let line: LineString<f64> = line_string![a.to_point().0, b.to_point().0];
    Haversine.length(&line) / 1000.0
}

/// Length of a polyline in kilometres, summing haversine distances.
pub fn path_length_km(points: &[Coordinates]) -> f64 {
    points.windows(2).map(|w| haversine_km(&w[0], &w[1])).sum()
}
