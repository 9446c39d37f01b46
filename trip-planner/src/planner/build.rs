//! The route-building pipeline.
//!
//! `RoutePlanner` pins one graph version per request and runs:
//! cache lookup, path search (rail resolver for rail-only requests, hub
//! routing when a small airport leaves the plain search empty-handed),
//! schedule assembly, pricing, geometry, validation, and cache store.

use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{CacheService, RouteCache};
use crate::connectivity::{self, ConnectivityReport};
use crate::domain::{BuiltRoute, City, CityId, RouteId, RouteSegment, StopId, ValidationIssue, ValidationResult};
use crate::geometry::{PathGeometryService, RoadRouter};
use crate::graph::{GraphSnapshot, GraphStore};
use crate::pricing::{PriceCalculator, PricingContext};
use crate::repository::{ScheduleRepository, StopRepository};
use crate::validate::RouteValidator;

use super::assemble::{AssembledSegment, SegmentAssembler};
use super::autocomplete;
use super::config::SearchConfig;
use super::engine::{EdgePath, PathfindingEngine, SearchOptions};
use super::error::PlanError;
use super::hubs::{HubRegistry, HubSelector};
use super::rail::TrainSubgraphResolver;
use super::request::RouteRequest;

/// A successful build.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub route: BuiltRoute,
    /// Served from the route cache.
    pub from_cache: bool,
    pub execution_time_ms: u64,
}

/// Serializable result of a build, success or not.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResponse {
    pub success: bool,
    pub graph_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<BuiltRoute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
    pub from_cache: bool,
    pub execution_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What to reality-check.
#[derive(Debug, Clone)]
pub enum RealityCheckTarget {
    Route(Box<BuiltRoute>),
    /// A route previously built and still cached.
    Id(Uuid),
}

/// Findings of a reality check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealityCheck {
    pub has_issues: bool,
    /// Errors first, then warnings.
    pub issues: Vec<ValidationIssue>,
    pub recommendations: Vec<String>,
}

impl From<ValidationResult> for RealityCheck {
    fn from(result: ValidationResult) -> Self {
        let has_issues = result.has_issues();
        let mut issues = result.errors;
        issues.extend(result.warnings);
        Self {
            has_issues,
            issues,
            recommendations: result.recommendations,
        }
    }
}

/// Builds, prices and validates routes over the published graph.
pub struct RoutePlanner<R, C> {
    graph: Arc<GraphStore>,
    stops: Arc<dyn StopRepository>,
    schedules: Arc<dyn ScheduleRepository>,
    hubs: HubRegistry,
    pricing: PriceCalculator,
    geometry: PathGeometryService<R>,
    validator: RouteValidator,
    cache: RouteCache<C>,
    config: SearchConfig,
}

impl<R: RoadRouter, C: CacheService> RoutePlanner<R, C> {
    pub fn new(
        graph: Arc<GraphStore>,
        stops: Arc<dyn StopRepository>,
        schedules: Arc<dyn ScheduleRepository>,
        geometry: PathGeometryService<R>,
        cache: RouteCache<C>,
    ) -> Self {
        Self {
            graph,
            stops,
            schedules,
            hubs: HubRegistry::new(),
            pricing: PriceCalculator::default(),
            geometry,
            validator: RouteValidator::default(),
            cache,
            config: SearchConfig::default(),
        }
    }

    pub fn with_hubs(mut self, hubs: HubRegistry) -> Self {
        self.hubs = hubs;
        self
    }

    pub fn with_pricing(mut self, pricing: PriceCalculator) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_validator(mut self, validator: RouteValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn graph_store(&self) -> &GraphStore {
        &self.graph
    }

    pub fn hubs(&self) -> &HubRegistry {
        &self.hubs
    }

    pub fn geometry(&self) -> &PathGeometryService<R> {
        &self.geometry
    }

    pub fn cache(&self) -> &RouteCache<C> {
        &self.cache
    }

    fn pin(&self) -> Result<Arc<GraphSnapshot>, PlanError> {
        self.graph.pin().ok_or(PlanError::GraphUnavailable)
    }

    /// Build a route for `request`.
    pub async fn build(&self, request: &RouteRequest) -> Result<BuildOutcome, PlanError> {
        let started = Instant::now();
        let graph = self.pin()?;
        request.validate()?;

        let booking_date = request
            .booking_date
            .unwrap_or_else(|| Utc::now().date_naive());
        let fingerprint = request.fingerprint(booking_date, graph.version());

        match self.cache.find_by_fingerprint(&fingerprint).await {
            Ok(Some(route)) => {
                debug!(%fingerprint, id = %route.id(), "Route cache hit");
                return Ok(BuildOutcome {
                    route,
                    from_cache: true,
                    execution_time_ms: elapsed_ms(started),
                });
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Route cache lookup failed"),
        }

        let path = self.find_path(&graph, request)?;
        let hub_count = self.hubs.count_in(&path);
        debug!(edges = path.len(), hub_count, "Path found");

        let not_before = NaiveDateTime::new(request.date, NaiveTime::MIN);
        let assembled = SegmentAssembler::new(self.stops.as_ref(), self.schedules.as_ref(), &self.config)
            .assemble(&path, not_before)?;

        let segments = self.price(assembled, request, booking_date, hub_count);
        debug!(segments = segments.len(), "Priced segments");

        let segments = self.geometry.attach(segments).await;
        let validation = self.validator.validate(&segments, hub_count);

        let route = BuiltRoute::new(graph.version(), segments, validation)?;
        if let Err(e) = self.cache.store(&fingerprint, &route).await {
            warn!(error = %e, "Failed to cache built route");
        }

        let execution_time_ms = elapsed_ms(started);
        info!(
            id = %route.id(),
            from = %request.from_city,
            to = %request.to_city,
            version = route.graph_version(),
            segments = route.segments().len(),
            total = %route.totals().price.total(),
            valid = route.validation().is_valid,
            execution_time_ms,
            "Built route"
        );

        Ok(BuildOutcome {
            route,
            from_cache: false,
            execution_time_ms,
        })
    }

    /// Like `build`, folded into a response for clients.
    pub async fn build_response(&self, request: &RouteRequest) -> BuildResponse {
        let started = Instant::now();
        match self.build(request).await {
            Ok(outcome) => BuildResponse {
                success: true,
                graph_available: true,
                validation: Some(outcome.route.validation().clone()),
                route: Some(outcome.route),
                from_cache: outcome.from_cache,
                execution_time_ms: outcome.execution_time_ms,
                error: None,
            },
            Err(e) => BuildResponse {
                success: false,
                graph_available: !matches!(e, PlanError::GraphUnavailable),
                route: None,
                validation: None,
                from_cache: false,
                execution_time_ms: elapsed_ms(started),
                error: Some(e.to_string()),
            },
        }
    }

    /// Re-run validation over a route, or over a cached route by id.
    pub async fn reality_check(&self, target: RealityCheckTarget) -> Result<RealityCheck, PlanError> {
        let route = match target {
            RealityCheckTarget::Route(route) => *route,
            RealityCheckTarget::Id(id) => self
                .cache
                .get_route(id)
                .await?
                .ok_or(PlanError::RouteNotFound(id))?,
        };
        let hub_count = self.hub_count(route.segments());
        Ok(self.validator.validate(route.segments(), hub_count).into())
    }

    /// City suggestions for `query`.
    pub fn autocomplete(&self, query: &str, limit: Option<usize>) -> Result<Vec<City>, PlanError> {
        Ok(autocomplete::autocomplete(self.stops.as_ref(), query, limit)?)
    }

    /// Connectivity of the published graph version.
    pub fn connectivity(&self) -> Result<ConnectivityReport, PlanError> {
        let graph = self.pin()?;
        let cities = self.stops.all_cities()?;
        Ok(connectivity::analyze(&graph, &cities))
    }

    fn city_stops(&self, graph: &GraphSnapshot, city: &CityId) -> Result<Vec<StopId>, PlanError> {
        let stops: Vec<StopId> = graph.stops_in_city(city).into_iter().cloned().collect();
        if stops.is_empty() {
            return Err(PlanError::NoStopsForCity { city: city.clone() });
        }
        Ok(stops)
    }

    fn find_path(&self, graph: &GraphSnapshot, request: &RouteRequest) -> Result<EdgePath, PlanError> {
        let from = self.city_stops(graph, &request.from_city)?;
        let to = self.city_stops(graph, &request.to_city)?;
        let modes = request.mode_filter();
        let max_transfers = request
            .preferences
            .max_transfers
            .unwrap_or(self.config.max_transfers);

        if modes.is_rail_only() {
            debug!(max_transfers, "Rail-only search");
            return TrainSubgraphResolver::new(graph, &self.config)
                .find_shortest_path_between(&from, &to, request.date, max_transfers);
        }

        let options = SearchOptions::new(Some(max_transfers), modes);
        let err = match PathfindingEngine::new(graph).search_between(&from, &to, request.date, &options) {
            Ok(path) => return Ok(path),
            Err(e @ PlanError::NoPathFound { .. }) => e,
            Err(e) => return Err(e),
        };

        let selector = HubSelector::new(graph, self.stops.as_ref(), &self.hubs, &self.config);
        let mut best: Option<EdgePath> = None;
        for f in &from {
            for t in &to {
                if !(selector.is_small_airport(f)? || selector.is_small_airport(t)?) {
                    continue;
                }
                debug!(from = %f, to = %t, "Trying hub routing for small airport");
                if let Ok(path) = selector.find_path_via_hubs(f, t, request.date, &options)
                    && best
                        .as_ref()
                        .is_none_or(|b| path.total_minutes() < b.total_minutes())
                {
                    best = Some(path);
                }
            }
        }
        best.ok_or(err)
    }

    fn price(
        &self,
        assembled: Vec<AssembledSegment>,
        request: &RouteRequest,
        booking_date: NaiveDate,
        hub_count: usize,
    ) -> Vec<RouteSegment> {
        let prefs = &request.preferences;
        let mut previous_route: Option<RouteId> = None;
        assembled
            .into_iter()
            .map(|a| {
                let mut segment = a.segment;
                // Staying aboard the same route is not a change of vehicle.
                let transfer = previous_route
                    .replace(segment.route_id.clone())
                    .is_some_and(|prev| prev != segment.route_id);
                let ctx = PricingContext::new(segment.distance_km, booking_date, segment.departure.date())
                    .with_departure_time(segment.departure.time())
                    .with_baggage(prefs.baggage_kg)
                    .with_insurance(prefs.insurance)
                    .with_transfers(u32::from(transfer));
                segment.price = self.pricing.price_segment(
                    segment.transport,
                    &ctx,
                    hub_count,
                    a.leg.fare,
                    Some(&segment.from.city_id),
                );
                segment
            })
            .collect()
    }

    /// Hubs at the interchanges of already-built segments.
    fn hub_count(&self, segments: &[RouteSegment]) -> usize {
        segments
            .iter()
            .take(segments.len().saturating_sub(1))
            .filter(|s| self.hubs.is_hub(&s.to.id))
            .count()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
