//! Per-segment geometry, chosen by transport mode.
//!
//! Road modes go through a `RoadRouter` with a bounded timeout and a TTL
//! cache keyed by rounded endpoints. Every other mode is synthesized locally.
//! A routing failure never fails the caller: the segment gets a straight line
//! marked `Degraded`.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use moka::future::Cache as MokaCache;
use tracing::{debug, warn};

use crate::domain::{Coordinates, Geometry, GeometryQuality, RouteSegment, TransportType};

use super::config::{GeometryConfig, RouterCacheConfig};
use super::router::{RoadRouter, RoutingError};
use super::synth::{great_circle, straight_line, wavy_line};

/// Cache key for routed geometries: endpoints rounded to 4 decimals, and mode.
type RouteKey = (i32, i32, i32, i32, TransportType);

fn round4(v: f64) -> i32 {
    (v * 10_000.0).round() as i32
}

fn route_key(from: &Coordinates, to: &Coordinates, mode: TransportType) -> RouteKey {
    (
        round4(from.lat()),
        round4(from.lon()),
        round4(to.lat()),
        round4(to.lon()),
        mode,
    )
}

/// Geometry service with caching of road-routing results.
pub struct PathGeometryService<R> {
    router: R,
    config: GeometryConfig,
    timeout: Duration,
    routes: MokaCache<RouteKey, Arc<Vec<Coordinates>>>,
}

impl<R: RoadRouter> PathGeometryService<R> {
    pub fn new(router: R, config: GeometryConfig, cache_config: &RouterCacheConfig) -> Self {
        let routes = MokaCache::builder()
            .time_to_live(cache_config.ttl)
            .max_capacity(cache_config.max_capacity)
            .build();

        Self {
            router,
            config,
            timeout: cache_config.timeout,
            routes,
        }
    }

    /// Geometry from `from` to `to` for `mode`.
    pub async fn geometry_for(
        &self,
        mode: TransportType,
        from: &Coordinates,
        to: &Coordinates,
    ) -> Geometry {
        match mode {
            TransportType::Airplane => synthesized(great_circle(from, to, &self.config)),
            TransportType::Ferry | TransportType::WinterRoad => {
                synthesized(wavy_line(from, to, &self.config))
            }
            TransportType::Train => synthesized(straight_line(from, to)),
            TransportType::Bus | TransportType::Taxi => self.road_geometry(mode, from, to).await,
        }
    }

    /// Geometry for one segment, from its endpoints and mode.
    pub async fn geometry_for_segment(&self, segment: &RouteSegment) -> Geometry {
        self.geometry_for(
            segment.transport,
            &segment.from.coordinates,
            &segment.to.coordinates,
        )
        .await
    }

    /// Attach geometry to every segment, fetching concurrently.
    pub async fn attach(&self, segments: Vec<RouteSegment>) -> Vec<RouteSegment> {
        let geometries = join_all(segments.iter().map(|s| self.geometry_for_segment(s))).await;
        segments
            .into_iter()
            .zip(geometries)
            .map(|(segment, geometry)| segment.with_geometry(geometry))
            .collect()
    }

    async fn road_geometry(
        &self,
        mode: TransportType,
        from: &Coordinates,
        to: &Coordinates,
    ) -> Geometry {
        if from == to {
            return synthesized(straight_line(from, to));
        }

        let key = route_key(from, to, mode);
        if let Some(points) = self.routes.get(&key).await {
            return Geometry {
                points: points.as_ref().clone(),
                quality: GeometryQuality::Routed,
            };
        }

        match self.fetch(mode, from, to).await {
            Ok(points) => {
                debug!(mode = %mode, points = points.len(), "Routed road geometry");
                let points = Arc::new(points);
                self.routes.insert(key, points.clone()).await;
                Geometry {
                    points: points.as_ref().clone(),
                    quality: GeometryQuality::Routed,
                }
            }
            Err(e) => {
                warn!(
                    mode = %mode,
                    from = ?(from.lat(), from.lon()),
                    to = ?(to.lat(), to.lon()),
                    error = %e,
                    "Road routing failed, using straight line"
                );
                Geometry {
                    points: straight_line(from, to),
                    quality: GeometryQuality::Degraded,
                }
            }
        }
    }

    async fn fetch(
        &self,
        mode: TransportType,
        from: &Coordinates,
        to: &Coordinates,
    ) -> Result<Vec<Coordinates>, RoutingError> {
        tokio::time::timeout(self.timeout, self.router.route(from, to, mode))
            .await
            .map_err(|_| RoutingError::Timeout(self.timeout))?
    }

    /// Number of cached routed geometries.
    pub fn cache_entry_count(&self) -> u64 {
        self.routes.entry_count()
    }

    /// Invalidate all cached geometries.
    pub fn invalidate_cache(&self) {
        self.routes.invalidate_all();
    }
}

fn synthesized(points: Vec<Coordinates>) -> Geometry {
    Geometry {
        points,
        quality: GeometryQuality::Synthesized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{at, segment, stop_ref};
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behaviour {
        Succeed,
        Fail,
        Hang,
    }

    struct MockRouter {
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl MockRouter {
        fn new(behaviour: Behaviour) -> Self {
            Self {
                behaviour,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl RoadRouter for MockRouter {
        async fn route(
            &self,
            from: &Coordinates,
            to: &Coordinates,
            _mode: TransportType,
        ) -> Result<Vec<Coordinates>, RoutingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Succeed => {
                    let mid = Coordinates::normalized(
                        (from.lat() + to.lat()) / 2.0 + 0.01,
                        (from.lon() + to.lon()) / 2.0,
                    );
                    Ok(vec![*from, mid, *to])
                }
                Behaviour::Fail => Err(RoutingError::Api {
                    status: 503,
                    message: "unavailable".into(),
                }),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(RoutingError::NoRoute("too late".into()))
                }
            }
        }
    }

    fn service(behaviour: Behaviour) -> PathGeometryService<MockRouter> {
        let cache = RouterCacheConfig {
            timeout: Duration::from_millis(50),
            ..RouterCacheConfig::default()
        };
        PathGeometryService::new(MockRouter::new(behaviour), GeometryConfig::default(), &cache)
    }

    fn c(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    #[tokio::test]
    async fn air_is_great_circle() {
        let svc = service(Behaviour::Fail);
        let g = svc
            .geometry_for(TransportType::Airplane, &c(62.09, 129.77), &c(55.97, 37.41))
            .await;
        assert_eq!(g.quality, GeometryQuality::Synthesized);
        assert!(g.points.len() >= 10);
        assert_eq!(svc.router.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rail_is_straight() {
        let svc = service(Behaviour::Succeed);
        let g = svc
            .geometry_for(TransportType::Train, &c(60.0, 100.0), &c(61.0, 101.0))
            .await;
        assert_eq!(g.points.len(), 2);
        assert_eq!(g.quality, GeometryQuality::Synthesized);
    }

    #[tokio::test]
    async fn ferry_is_wavy() {
        let svc = service(Behaviour::Succeed);
        let g = svc
            .geometry_for(TransportType::Ferry, &c(62.0, 129.7), &c(63.0, 128.0))
            .await;
        assert!(g.points.len() > 2);
        assert_eq!(g.points[0], c(62.0, 129.7));
        assert_eq!(*g.points.last().unwrap(), c(63.0, 128.0));
    }

    #[tokio::test]
    async fn road_routed_and_cached() {
        let svc = service(Behaviour::Succeed);
        let from = c(62.02781, 129.70421);
        let to = c(62.5, 130.0);

        let first = svc.geometry_for(TransportType::Bus, &from, &to).await;
        assert_eq!(first.quality, GeometryQuality::Routed);
        assert_eq!(first.points.len(), 3);

        // Same endpoints at 4-decimal precision hit the cache.
        let nearby = c(62.027812, 129.704214);
        let second = svc.geometry_for(TransportType::Bus, &nearby, &to).await;
        assert_eq!(second.quality, GeometryQuality::Routed);
        assert_eq!(svc.router.calls.load(Ordering::SeqCst), 1);

        // A different mode is a different key.
        svc.geometry_for(TransportType::Taxi, &from, &to).await;
        assert_eq!(svc.router.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn road_failure_degrades() {
        let svc = service(Behaviour::Fail);
        let from = c(62.0, 129.7);
        let to = c(62.5, 130.0);
        let g = svc.geometry_for(TransportType::Taxi, &from, &to).await;
        assert_eq!(g.quality, GeometryQuality::Degraded);
        assert_eq!(g.points, vec![from, to]);
    }

    #[tokio::test]
    async fn road_timeout_degrades() {
        let svc = service(Behaviour::Hang);
        let g = svc
            .geometry_for(TransportType::Bus, &c(62.0, 129.7), &c(62.5, 130.0))
            .await;
        assert_eq!(g.quality, GeometryQuality::Degraded);
        assert_eq!(g.points.len(), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let svc = service(Behaviour::Fail);
        let from = c(62.0, 129.7);
        let to = c(62.5, 130.0);
        svc.geometry_for(TransportType::Bus, &from, &to).await;
        svc.geometry_for(TransportType::Bus, &from, &to).await;
        assert_eq!(svc.router.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn attach_fills_every_segment() {
        let svc = service(Behaviour::Succeed);
        let a = stop_ref("a", "ca", 62.0, 129.7, true);
        let b = stop_ref("b", "cb", 55.9, 37.4, true);
        let c2 = stop_ref("c", "cc", 56.0, 38.0, false);
        let segments = vec![
            segment(TransportType::Airplane, a, b.clone(), 4900.0, at(2, "08:00"), at(2, "14:00"), 24500.0),
            segment(TransportType::Bus, b, c2, 45.0, at(2, "15:00"), at(2, "16:00"), 90.0),
        ];

        let out = svc.attach(segments).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].geometry.as_ref().unwrap().quality, GeometryQuality::Synthesized);
        assert_eq!(out[1].geometry.as_ref().unwrap().quality, GeometryQuality::Routed);
    }
}
