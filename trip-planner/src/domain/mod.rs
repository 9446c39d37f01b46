//! Domain types for the trip planner.
//!
//! This module contains the core domain model types that represent
//! validated transport data. All types enforce their invariants at
//! construction time, so code that receives these types can trust their
//! validity.

mod coordinates;
mod error;
mod ids;
mod price;
mod route;
mod schedule;
mod season;
mod stop;
mod transport;
mod validation;

pub use coordinates::{Coordinates, InvalidCoordinates};
pub use error::DomainError;
pub use ids::{CityId, InvalidId, RouteId, StopId};
pub use price::{AdditionalExpenses, Money, PriceBreakdown, PriceMismatch};
pub use route::{BuiltRoute, Geometry, GeometryQuality, RouteSegment, RouteTotals, StopRef};
pub use schedule::{DaysOfWeek, InvalidDaysOfWeek, ScheduledLeg};
pub use season::Season;
pub use stop::{City, Stop, StopKind};
pub use transport::{ModeFilter, TransportType, UnknownTransportType};
pub use validation::{
    Correction, CorrectionKind, IssueKind, SegmentValidation, ValidationIssue, ValidationResult,
};

#[cfg(test)]
pub(crate) use route::fixtures;
