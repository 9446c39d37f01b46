//! Turning an edge path into scheduled segments.
//!
//! Each edge is bound to the first departure of its route that runs on the
//! day and leaves no earlier than the ready time. The ready time starts at
//! the requested date and moves to the previous arrival plus the minimum
//! connection time; staying aboard the same route needs no connection time.
//! A missing departure fails the whole path; segments are never dropped.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::domain::{PriceBreakdown, RouteSegment, ScheduledLeg, Stop, StopId, StopRef};
use crate::graph::GraphEdge;
use crate::repository::{RepositoryError, ScheduleRepository, StopRepository};

use super::config::SearchConfig;
use super::engine::EdgePath;
use super::error::PlanError;

/// A scheduled segment and the departure it was bound to.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledSegment {
    /// Segment without price or geometry.
    pub segment: RouteSegment,
    pub leg: ScheduledLeg,
}

/// Binds edge paths to scheduled departures.
pub struct SegmentAssembler<'a> {
    stops: &'a dyn StopRepository,
    schedules: &'a dyn ScheduleRepository,
    config: &'a SearchConfig,
}

impl<'a> SegmentAssembler<'a> {
    pub fn new(
        stops: &'a dyn StopRepository,
        schedules: &'a dyn ScheduleRepository,
        config: &'a SearchConfig,
    ) -> Self {
        Self {
            stops,
            schedules,
            config,
        }
    }

    /// Assemble `path`, with the first departure no earlier than `not_before`.
    pub fn assemble(
        &self,
        path: &EdgePath,
        not_before: NaiveDateTime,
    ) -> Result<Vec<AssembledSegment>, PlanError> {
        let mut ready = not_before;
        let mut out = Vec::with_capacity(path.len());

        let edges = path.edges();
        for (i, edge) in edges.iter().enumerate() {
            let (leg, day) = self.next_departure(edge, ready)?.ok_or_else(|| {
                PlanError::no_path(
                    &edge.from,
                    &edge.to,
                    format!(
                        "no departure of {} after {} within {} days",
                        edge.route_id,
                        ready.format("%Y-%m-%d %H:%M"),
                        self.config.max_rollover_days
                    ),
                )
            })?;

            let from_stop = self.stop(&edge.from)?;
            let to_stop = self.stop(&edge.to)?;
            let departure = leg.departure_on(day);
            let arrival = leg.arrival_on(day);

            out.push(AssembledSegment {
                segment: RouteSegment {
                    route_id: edge.route_id.clone(),
                    transport: edge.transport,
                    from: StopRef::from(&from_stop),
                    to: StopRef::from(&to_stop),
                    distance_km: edge.distance_km,
                    duration_minutes: (arrival - departure).num_minutes(),
                    departure,
                    arrival,
                    price: PriceBreakdown::default(),
                    geometry: None,
                },
                leg,
            });

            let stays_aboard = edges
                .get(i + 1)
                .is_some_and(|next| next.route_id == edge.route_id);
            ready = if stays_aboard {
                arrival
            } else {
                arrival + self.config.min_connection()
            };
        }

        debug!(segments = out.len(), "Assembled segments");
        Ok(out)
    }

    fn next_departure(
        &self,
        edge: &GraphEdge,
        ready: NaiveDateTime,
    ) -> Result<Option<(ScheduledLeg, NaiveDate)>, PlanError> {
        for offset in 0..=i64::from(self.config.max_rollover_days) {
            let day = ready.date() + Duration::days(offset);
            let found = self
                .schedules
                .legs_between(&edge.from, &edge.to, day)?
                .into_iter()
                .filter(|l| l.route_id == edge.route_id && l.departure_on(day) >= ready)
                .min_by_key(|l| l.departure);
            if let Some(leg) = found {
                return Ok(Some((leg, day)));
            }
        }
        Ok(None)
    }

    fn stop(&self, id: &StopId) -> Result<Stop, PlanError> {
        self.stops.find_stop(id)?.ok_or_else(|| {
            PlanError::Repository(RepositoryError::Corrupt {
                what: "stop".to_string(),
                reason: format!("{id} is in the graph but has no stop record"),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{City, CityId, Coordinates, DaysOfWeek, Money, RouteId, TransportType};
    use crate::domain::fixtures::at;
    use crate::graph::fixtures::{edge, sid};
    use crate::repository::{InMemoryScheduleRepository, InMemoryStopRepository};
    use chrono::NaiveTime;

    fn stops() -> InMemoryStopRepository {
        let stop = |id: &str, lon: f64| {
            Stop::new(
                sid(id),
                id.to_uppercase(),
                Coordinates::new(60.0, lon).unwrap(),
                CityId::parse(&format!("c-{id}")).unwrap(),
            )
        };
        InMemoryStopRepository::new(
            vec![stop("a", 100.0), stop("b", 101.0), stop("c", 102.0)],
            Vec::<City>::new(),
        )
    }

    fn leg(route: &str, from: &str, to: &str, dep: &str, arr: &str, offset: u8, days: &str) -> ScheduledLeg {
        let t = |s: &str| NaiveTime::parse_from_str(s, "%H:%M").unwrap();
        ScheduledLeg {
            route_id: RouteId::parse(route).unwrap(),
            from: sid(from),
            to: sid(to),
            departure: t(dep),
            arrival: t(arr),
            arrival_day_offset: offset,
            days: DaysOfWeek::parse(days).unwrap(),
            fare: Some(Money::from_rubles(1000.0)),
            capacity: 50,
        }
    }

    fn path(edges: Vec<GraphEdge>) -> EdgePath {
        EdgePath::new("v1", NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(), edges)
    }

    fn two_edges() -> EdgePath {
        path(vec![
            edge("a", "b", 120, 100.0, TransportType::Bus, "B1"),
            edge("b", "c", 60, 50.0, TransportType::Bus, "B2"),
        ])
    }

    // 2025-06-02 is a Monday.

    #[test]
    fn chains_with_min_connection() {
        let stops = stops();
        let schedules = InMemoryScheduleRepository::new(vec![
            leg("B1", "a", "b", "08:00", "10:00", 0, "1234567"),
            leg("B2", "b", "c", "10:30", "11:30", 0, "1234567"), // too tight
            leg("B2", "b", "c", "11:00", "12:00", 0, "1234567"),
        ]);
        let config = SearchConfig::default();
        let segs = SegmentAssembler::new(&stops, &schedules, &config)
            .assemble(&two_edges(), at(2, "00:00"))
            .unwrap();

        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].segment.departure, at(2, "08:00"));
        assert_eq!(segs[1].segment.departure, at(2, "11:00"));
        assert_eq!(segs[0].segment.to.id, segs[1].segment.from.id);
        assert_eq!(segs[1].segment.duration_minutes, 60);
        assert_eq!(segs[0].leg.fare, Some(Money::from_rubles(1000.0)));
    }

    #[test]
    fn staying_aboard_needs_no_connection_time() {
        let stops = stops();
        let schedules = InMemoryScheduleRepository::new(vec![
            leg("9", "a", "b", "10:00", "10:50", 0, "1234567"),
            leg("9", "b", "c", "10:55", "11:40", 0, "1234567"),
        ]);
        let config = SearchConfig::default();
        let p = path(vec![
            edge("a", "b", 50, 70.0, TransportType::Train, "9"),
            edge("b", "c", 45, 70.0, TransportType::Train, "9"),
        ]);
        let segs = SegmentAssembler::new(&stops, &schedules, &config)
            .assemble(&p, at(2, "00:00"))
            .unwrap();
        assert_eq!(segs[1].segment.departure, at(2, "10:55"));
    }

    #[test]
    fn rolls_over_to_next_day() {
        let stops = stops();
        let schedules = InMemoryScheduleRepository::new(vec![
            leg("B1", "a", "b", "20:00", "22:00", 0, "1234567"),
            leg("B2", "b", "c", "07:00", "08:00", 0, "2"),
        ]);
        let config = SearchConfig::default();
        let segs = SegmentAssembler::new(&stops, &schedules, &config)
            .assemble(&two_edges(), at(2, "00:00"))
            .unwrap();
        assert_eq!(segs[1].segment.departure, at(3, "07:00"));
    }

    #[test]
    fn overnight_arrival() {
        let stops = stops();
        let schedules = InMemoryScheduleRepository::new(vec![
            leg("B1", "a", "b", "22:00", "06:00", 1, "1"),
            leg("B2", "b", "c", "08:00", "09:00", 0, "2"),
        ]);
        let config = SearchConfig::default();
        let segs = SegmentAssembler::new(&stops, &schedules, &config)
            .assemble(&two_edges(), at(2, "00:00"))
            .unwrap();
        assert_eq!(segs[0].segment.arrival, at(3, "06:00"));
        assert_eq!(segs[0].segment.duration_minutes, 8 * 60);
        assert_eq!(segs[1].segment.departure, at(3, "08:00"));
    }

    #[test]
    fn missing_departure_fails_whole_path() {
        let stops = stops();
        let schedules = InMemoryScheduleRepository::new(vec![
            leg("B1", "a", "b", "08:00", "10:00", 0, "1234567"),
            // Runs only on Sunday, beyond the rollover window.
            leg("B2", "b", "c", "11:00", "12:00", 0, "7"),
        ]);
        let config = SearchConfig::default();
        let err = SegmentAssembler::new(&stops, &schedules, &config)
            .assemble(&two_edges(), at(2, "00:00"))
            .unwrap_err();
        assert!(matches!(err, PlanError::NoPathFound { ref from, .. } if from == "b"));
    }

    #[test]
    fn route_id_must_match_edge() {
        let stops = stops();
        let schedules = InMemoryScheduleRepository::new(vec![leg("OTHER", "a", "b", "08:00", "10:00", 0, "1234567")]);
        let config = SearchConfig::default();
        let p = path(vec![edge("a", "b", 120, 100.0, TransportType::Bus, "B1")]);
        assert!(
            SegmentAssembler::new(&stops, &schedules, &config)
                .assemble(&p, at(2, "00:00"))
                .is_err()
        );
    }

    #[test]
    fn unknown_stop_record_is_repository_error() {
        let stops = stops();
        let schedules = InMemoryScheduleRepository::new(vec![leg("B1", "a", "x", "08:00", "10:00", 0, "1234567")]);
        let config = SearchConfig::default();
        let p = path(vec![edge("a", "x", 120, 100.0, TransportType::Bus, "B1")]);
        let err = SegmentAssembler::new(&stops, &schedules, &config)
            .assemble(&p, at(2, "00:00"))
            .unwrap_err();
        assert!(matches!(err, PlanError::Repository(_)));
    }
}
