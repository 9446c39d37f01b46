//! Route types.
//!
//! A `BuiltRoute` is the finished product of a search: ordered segments,
//! their aggregates and the validation verdict. It is never edited after
//! construction; rebuilding produces a new route with a new id.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    CityId, Coordinates, DomainError, PriceBreakdown, RouteId, Stop, StopId, TransportType,
    ValidationResult,
};

/// Endpoint of a segment with the stop metadata needed for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopRef {
    pub id: StopId,
    pub name: String,
    pub city_id: CityId,
    pub coordinates: Coordinates,
    pub is_airport: bool,
}

impl From<&Stop> for StopRef {
    fn from(stop: &Stop) -> Self {
        Self {
            id: stop.id.clone(),
            name: stop.name.clone(),
            city_id: stop.city_id.clone(),
            coordinates: stop.coordinates,
            is_airport: stop.is_airport,
        }
    }
}

/// How a segment's geometry was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryQuality {
    /// Returned by the external road router.
    Routed,
    /// Synthesized locally for this mode.
    Synthesized,
    /// Straight-line fallback after the road router failed.
    Degraded,
}

/// Renderable coordinates of a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub points: Vec<Coordinates>,
    pub quality: GeometryQuality,
}

/// One leg of a built route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSegment {
    pub route_id: RouteId,
    pub transport: TransportType,
    pub from: StopRef,
    pub to: StopRef,
    pub distance_km: f64,
    pub duration_minutes: i64,
    pub departure: NaiveDateTime,
    pub arrival: NaiveDateTime,
    pub price: PriceBreakdown,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
}

impl RouteSegment {
    /// Returns a copy with `geometry` attached.
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }
}

/// Aggregates over a route's segments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTotals {
    pub distance_km: f64,
    /// Elapsed minutes from first departure to last arrival, waits included.
    pub duration_minutes: i64,
    /// In-vehicle minutes only.
    pub travel_minutes: i64,
    pub price: PriceBreakdown,
    /// Changes of vehicle; consecutive segments on one route id are one ride.
    pub transfer_count: usize,
}

impl RouteTotals {
    fn compute(segments: &[RouteSegment]) -> Self {
        let distance_km = segments.iter().map(|s| s.distance_km).sum();
        let travel_minutes = segments.iter().map(|s| s.duration_minutes).sum();
        let duration_minutes = match (segments.first(), segments.last()) {
            (Some(first), Some(last)) => (last.arrival - first.departure).num_minutes(),
            _ => 0,
        };

        Self {
            distance_km,
            duration_minutes,
            travel_minutes,
            price: PriceBreakdown::sum(segments.iter().map(|s| &s.price)),
            transfer_count: segments
                .windows(2)
                .filter(|w| w[0].route_id != w[1].route_id)
                .count(),
        }
    }
}

/// A complete, priced and validated route.
///
/// # Invariants
///
/// - At least one segment
/// - `totals` are derived from `segments` and never set independently
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltRoute {
    id: Uuid,
    graph_version: String,
    created_at: DateTime<Utc>,
    segments: Vec<RouteSegment>,
    totals: RouteTotals,
    validation: ValidationResult,
}

impl BuiltRoute {
    /// Construct a route, computing its aggregates.
    ///
    /// Adjacency is not enforced here: routes received from outside may have
    /// gaps, which the structural validator reports as `empty_space`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `segments` is empty.
    pub fn new(
        graph_version: impl Into<String>,
        segments: Vec<RouteSegment>,
        validation: ValidationResult,
    ) -> Result<Self, DomainError> {
        if segments.is_empty() {
            return Err(DomainError::EmptyRoute);
        }

        let totals = RouteTotals::compute(&segments);

        Ok(Self {
            id: Uuid::new_v4(),
            graph_version: graph_version.into(),
            created_at: Utc::now(),
            segments,
            totals,
            validation,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn graph_version(&self) -> &str {
        &self.graph_version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn segments(&self) -> &[RouteSegment] {
        &self.segments
    }

    pub fn totals(&self) -> &RouteTotals {
        &self.totals
    }

    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    /// First boarding stop.
    pub fn origin(&self) -> &StopRef {
        &self.segments[0].from
    }

    /// Final alighting stop.
    pub fn destination(&self) -> &StopRef {
        &self.segments[self.segments.len() - 1].to
    }

    /// Whether every segment ends where the next begins.
    pub fn is_chained(&self) -> bool {
        self.segments.windows(2).all(|w| w[0].to.id == w[1].from.id)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Segment builders shared by tests across modules.

    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{AdditionalExpenses, Money};

    pub fn stop_ref(id: &str, city: &str, lat: f64, lon: f64, is_airport: bool) -> StopRef {
        StopRef {
            id: StopId::parse(id).unwrap(),
            name: id.to_uppercase(),
            city_id: CityId::parse(city).unwrap(),
            coordinates: Coordinates::new(lat, lon).unwrap(),
            is_airport,
        }
    }

    pub fn at(day: u32, hhmm: &str) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, day)
            .unwrap()
            .and_time(chrono::NaiveTime::parse_from_str(hhmm, "%H:%M").unwrap())
    }

    pub fn segment(
        transport: TransportType,
        from: StopRef,
        to: StopRef,
        distance_km: f64,
        departure: NaiveDateTime,
        arrival: NaiveDateTime,
        base_rubles: f64,
    ) -> RouteSegment {
        RouteSegment {
            route_id: RouteId::parse("T1").unwrap(),
            transport,
            from,
            to,
            distance_km,
            duration_minutes: (arrival - departure).num_minutes(),
            departure,
            arrival,
            price: PriceBreakdown::new(Money::from_rubles(base_rubles), AdditionalExpenses::default()),
            geometry: None,
        }
    }
}
