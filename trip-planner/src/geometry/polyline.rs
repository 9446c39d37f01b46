//! Encoded polyline format (precision 5).
//!
//! The format used by road routers and map clients: each coordinate is
//! scaled by 1e5, delta-encoded against the previous point, zig-zag encoded
//! and emitted in 5-bit chunks offset by 63. Latitude precedes longitude.

use crate::domain::Coordinates;

const FACTOR: f64 = 1e5;

/// Error decoding a polyline string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolylineError {
    /// A byte outside the encoding alphabet
    #[error("invalid polyline byte {byte:#x} at offset {offset}")]
    InvalidByte { byte: u8, offset: usize },

    /// The string ended in the middle of a value
    #[error("polyline truncated at offset {0}")]
    Truncated(usize),

    /// A decoded point is outside valid coordinate ranges
    #[error("decoded point out of range at offset {0}")]
    OutOfRange(usize),
}

/// Encode coordinates into a polyline string.
///
/// # Examples
///
/// ```
/// use trip_planner::domain::Coordinates;
/// use trip_planner::geometry::{decode_polyline, encode_polyline};
///
/// let pts = vec![
///     Coordinates::new(38.5, -120.2).unwrap(),
///     Coordinates::new(40.7, -120.95).unwrap(),
///     Coordinates::new(43.252, -126.453).unwrap(),
/// ];
/// let encoded = encode_polyline(&pts);
/// assert_eq!(encoded, "_p~iF~ps|U_ulLnnqC_mqNvxq`@");
/// assert_eq!(decode_polyline(&encoded).unwrap().len(), 3);
/// ```
pub fn encode_polyline(points: &[Coordinates]) -> String {
    let mut out = String::with_capacity(points.len() * 8);
    let mut prev_lat = 0i64;
    let mut prev_lon = 0i64;

    for p in points {
        let lat = (p.lat() * FACTOR).round() as i64;
        let lon = (p.lon() * FACTOR).round() as i64;
        encode_value(lat - prev_lat, &mut out);
        encode_value(lon - prev_lon, &mut out);
        prev_lat = lat;
        prev_lon = lon;
    }

    out
}

fn encode_value(delta: i64, out: &mut String) {
    let zigzag = if delta < 0 { !(delta << 1) } else { delta << 1 };
    let mut v = zigzag as u64;
    while v >= 0x20 {
        out.push(char::from((((v & 0x1f) | 0x20) + 63) as u8));
        v >>= 5;
    }
    out.push(char::from((v + 63) as u8));
}

/// Decode a polyline string into coordinates.
pub fn decode_polyline(encoded: &str) -> Result<Vec<Coordinates>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut offset = 0;
    let mut lat = 0i64;
    let mut lon = 0i64;

    while offset < bytes.len() {
        let start = offset;
        lat += decode_value(bytes, &mut offset)?;
        lon += decode_value(bytes, &mut offset)?;

        let point = Coordinates::new(lat as f64 / FACTOR, lon as f64 / FACTOR)
            .map_err(|_| PolylineError::OutOfRange(start))?;
        points.push(point);
    }

    Ok(points)
}

fn decode_value(bytes: &[u8], offset: &mut usize) -> Result<i64, PolylineError> {
    let mut result = 0u64;
    let mut shift = 0;

    loop {
        let Some(&byte) = bytes.get(*offset) else {
            return Err(PolylineError::Truncated(*offset));
        };
        if !(63..127).contains(&byte) || shift > 60 {
            return Err(PolylineError::InvalidByte {
                byte,
                offset: *offset,
            });
        }
        *offset += 1;

        let chunk = u64::from(byte - 63);
        result |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk < 0x20 {
            break;
        }
    }

    let value = if result & 1 == 1 {
        !(result >> 1) as i64
    } else {
        (result >> 1) as i64
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    #[test]
    fn reference_example() {
        let encoded = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";
        let pts = decode_polyline(encoded).unwrap();
        assert_eq!(pts.len(), 3);
        assert!(pts[0].approx_eq(&c(38.5, -120.2), 1e-9));
        assert!(pts[1].approx_eq(&c(40.7, -120.95), 1e-9));
        assert!(pts[2].approx_eq(&c(43.252, -126.453), 1e-9));
    }

    #[test]
    fn empty() {
        assert_eq!(encode_polyline(&[]), "");
        assert!(decode_polyline("").unwrap().is_empty());
    }

    #[test]
    fn truncated_input() {
        // Continuation bit set on the last byte
        assert!(matches!(decode_polyline("_p~iF~ps|"), Err(PolylineError::Truncated(_))));
        // Only the latitude of the first point
        assert!(matches!(decode_polyline("_p~iF"), Err(PolylineError::Truncated(_))));
    }

    #[test]
    fn invalid_byte() {
        assert!(matches!(
            decode_polyline("_p~iF ps|U"),
            Err(PolylineError::InvalidByte { byte: b' ', .. })
        ));
    }
}
