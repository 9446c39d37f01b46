//! Locally synthesized geometries: great-circle arcs, wavy lines and
//! straight lines.

use crate::domain::Coordinates;

use super::config::GeometryConfig;
use super::distance::haversine_km;

/// Number of arc points for a great circle of `distance_km`.
///
/// `clamp(ceil(distance_km / km_per_arc_point) + 1, min_arc_points, max_arc_points)`,
/// so the count never decreases as distance grows. The bounds are taken as
/// at least two points with `max >= min`, whatever the config says.
pub fn arc_point_count(distance_km: f64, config: &GeometryConfig) -> usize {
    let min = config.min_arc_points.max(2);
    let max = config.max_arc_points.max(min);
    // Float-to-int casts saturate: a zero step gives usize::MAX, NaN gives 0.
    let raw = ((distance_km / config.km_per_arc_point).ceil() as usize).saturating_add(1);
    raw.clamp(min, max)
}

fn to_unit(c: &Coordinates) -> [f64; 3] {
    let lat = c.lat().to_radians();
    let lon = c.lon().to_radians();
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

fn from_unit(v: [f64; 3]) -> Coordinates {
    let lat = v[2].atan2((v[0] * v[0] + v[1] * v[1]).sqrt());
    let lon = v[1].atan2(v[0]);
    Coordinates::normalized(lat.to_degrees(), lon.to_degrees())
}

/// Great-circle arc from `from` to `to` by spherical linear interpolation.
///
/// Identical endpoints yield a single point. Otherwise the first and last
/// points are exactly the inputs and longitudes stay within [-180, 180],
/// including on arcs that cross the antimeridian. Antipodal endpoints have
/// no unique great circle and fall back to a straight pair.
pub fn great_circle(from: &Coordinates, to: &Coordinates, config: &GeometryConfig) -> Vec<Coordinates> {
    if from == to {
        return vec![*from];
    }

    let a = to_unit(from);
    let b = to_unit(to);
    let dot = (a[0] * b[0] + a[1] * b[1] + a[2] * b[2]).clamp(-1.0, 1.0);
    let omega = dot.acos();
    let sin_omega = omega.sin();

    if sin_omega.abs() < 1e-12 {
        return vec![*from, *to];
    }

    let n = arc_point_count(haversine_km(from, to), config);
    let mut points = Vec::with_capacity(n);
    points.push(*from);

    for i in 1..n - 1 {
        let f = i as f64 / (n - 1) as f64;
        let wa = ((1.0 - f) * omega).sin() / sin_omega;
        let wb = (f * omega).sin() / sin_omega;
        points.push(from_unit([
            wa * a[0] + wb * b[0],
            wa * a[1] + wb * b[1],
            wa * a[2] + wb * b[2],
        ]));
    }

    points.push(*to);
    points
}

/// A deterministic gently waving line for waterways and ice roads.
///
/// The lateral offset is a sine of `wave_count` half-waves, so it vanishes
/// at both endpoints, which are exactly the inputs.
pub fn wavy_line(from: &Coordinates, to: &Coordinates, config: &GeometryConfig) -> Vec<Coordinates> {
    if from == to {
        return vec![*from];
    }

    let dlat = to.lat() - from.lat();
    let mut dlon = to.lon() - from.lon();
    if dlon > 180.0 {
        dlon -= 360.0;
    } else if dlon < -180.0 {
        dlon += 360.0;
    }

    // Local equirectangular frame: x east, y north, both in latitude degrees.
    let mid_lat = (from.lat() + dlat / 2.0).to_radians();
    let k = mid_lat.cos().max(0.01);
    let (dx, dy) = (dlon * k, dlat);
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-12 {
        return vec![*from, *to];
    }
    let (perp_x, perp_y) = (-dy / len, dx / len);
    let amplitude = len * config.wave_amplitude_ratio;
    let n = config.wave_points.max(3);

    let mut points = Vec::with_capacity(n);
    points.push(*from);
    for i in 1..n - 1 {
        let f = i as f64 / (n - 1) as f64;
        let offset = amplitude * (f * f64::from(config.wave_count) * std::f64::consts::PI).sin();
        points.push(Coordinates::normalized(
            from.lat() + dy * f + perp_y * offset,
            from.lon() + (dx * f + perp_x * offset) / k,
        ));
    }
    points.push(*to);
    points
}

/// Two-point straight line; a single point for identical endpoints.
pub fn straight_line(from: &Coordinates, to: &Coordinates) -> Vec<Coordinates> {
    if from == to {
        vec![*from]
    } else {
        vec![*from, *to]
    }
}
