//! Geographic helpers and segment geometry.
//!
//! Distance, polyline coding, synthesized shapes, and the road-routing
//! client with its caching service.

mod config;
mod distance;
mod polyline;
mod router;
mod service;
mod synth;

pub use config::{GeometryConfig, RouterCacheConfig};
pub use distance::{haversine_km, path_length_km};
pub use polyline::{PolylineError, decode_polyline, encode_polyline};
pub use router::{OsrmClient, RoadRouter, RouterConfig, RoutingError};
pub use service::PathGeometryService;
pub use synth::{arc_point_count, great_circle, straight_line, wavy_line};
