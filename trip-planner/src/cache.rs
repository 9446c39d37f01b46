//! Caching of built routes.
//!
//! `CacheService` is a string key/value store with per-entry TTL; values
//! are JSON. `RouteCache` layers the route keys on top of it:
//!
//! - `route:{id}` holds a serialized `BuiltRoute`
//! - `search:{...}` (a request fingerprint) holds the id of the route built
//!   for that request
//!
//! The route is always written before the fingerprint pointer, and a
//! pointer whose route has gone is a miss, so readers never see half an
//! entry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache as MokaCache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::domain::BuiltRoute;

/// Errors from a cache backend.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Backend failed
    #[error("cache backend error: {0}")]
    Backend(String),

    /// Value could not be (de)serialized
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Key/value store with per-entry expiry.
#[allow(async_fn_in_trait)]
pub trait CacheService {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_raw(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get_raw(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, raw, ttl).await
    }
}

/// Configuration for the route cache.
#[derive(Debug, Clone)]
pub struct RouteCacheConfig {
    /// TTL for built routes and their fingerprints.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl RouteCacheConfig {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            ..Self::default()
        }
    }
}

impl Default for RouteCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
            max_capacity: 10_000,
        }
    }
}

#[derive(Clone)]
struct Entry {
    value: Arc<str>,
    ttl: Duration,
}

/// Each entry lives for the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process cache backed by moka.
pub struct MokaCacheService {
    entries: MokaCache<String, Entry>,
}

impl MokaCacheService {
    pub fn new(config: &RouteCacheConfig) -> Self {
        let entries = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { entries }
    }

    /// Get cache statistics (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }
}

impl CacheService for MokaCacheService {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.get(key).await.map(|e| e.value.to_string()))
    }

    async fn set_raw(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            value: value.into(),
            ttl,
        };
        self.entries.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.invalidate(key).await;
        Ok(())
    }
}

/// Plain map with expiry checked on read.
#[derive(Default)]
pub struct MapCacheService {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MapCacheService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, (String, Instant)>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Backend("cache lock poisoned".to_string()))
    }
}

impl CacheService for MapCacheService {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some((value, expires)) if *expires > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_raw(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.lock()?
            .insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

fn route_key(id: Uuid) -> String {
    format!("route:{id}")
}

/// Built routes by id and by request fingerprint.
pub struct RouteCache<C> {
    service: C,
    ttl: Duration,
}

impl<C: CacheService> RouteCache<C> {
    pub fn new(service: C, config: &RouteCacheConfig) -> Self {
        Self {
            service,
            ttl: config.ttl,
        }
    }

    pub fn service(&self) -> &C {
        &self.service
    }

    pub async fn get_route(&self, id: Uuid) -> Result<Option<BuiltRoute>, CacheError> {
        self.service.get(&route_key(id)).await
    }

    /// The route previously built for `fingerprint`, if both entries survive.
    pub async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<BuiltRoute>, CacheError> {
        let Some(id) = self.service.get::<Uuid>(fingerprint).await? else {
            return Ok(None);
        };
        let route = self.get_route(id).await?;
        if route.is_none() {
            debug!(fingerprint, %id, "Fingerprint points at an evicted route");
        }
        Ok(route)
    }

    /// Store `route` under its id, then point `fingerprint` at it.
    pub async fn store(&self, fingerprint: &str, route: &BuiltRoute) -> Result<(), CacheError> {
        self.service.set(&route_key(route.id()), route, self.ttl).await?;
        self.service.set(fingerprint, &route.id(), self.ttl).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{at, segment, stop_ref};
    use crate::domain::{TransportType, ValidationResult};

    fn route() -> BuiltRoute {
        let a = stop_ref("a", "ca", 60.0, 100.0, false);
        let b = stop_ref("b", "cb", 60.0, 101.0, false);
        let seg = segment(TransportType::Bus, a, b, 72.0, at(2, "08:00"), at(2, "09:30"), 144.0);
        BuiltRoute::new("v1", vec![seg], ValidationResult::default()).unwrap()
    }

    #[tokio::test]
    async fn typed_round_trip_through_map() {
        let cache = MapCacheService::new();
        cache.set("k", &vec![1, 2, 3], Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get::<Vec<i32>>("k").await.unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(cache.get::<Vec<i32>>("missing").await.unwrap(), None);

        cache.delete("k").await.unwrap();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn wrong_type_is_serialization_error() {
        let cache = MapCacheService::new();
        cache.set("k", &"text", Duration::from_secs(60)).await.unwrap();
        let err = cache.get::<Vec<i32>>("k").await.unwrap_err();
        assert!(matches!(err, CacheError::Serialization(_)));
    }

    #[tokio::test]
    async fn map_entries_expire() {
        let cache = MapCacheService::new();
        cache.set_raw("k", "v".into(), Duration::from_millis(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get_raw("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn moka_honours_per_entry_ttl() {
        let cache = MokaCacheService::new(&RouteCacheConfig::default());
        cache.set_raw("short", "1".into(), Duration::from_millis(20)).await.unwrap();
        cache.set_raw("long", "2".into(), Duration::from_secs(60)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cache.get_raw("short").await.unwrap(), None);
        assert_eq!(cache.get_raw("long").await.unwrap().as_deref(), Some("2"));

        cache.delete("long").await.unwrap();
        assert_eq!(cache.get_raw("long").await.unwrap(), None);
    }

    #[tokio::test]
    async fn route_by_fingerprint_and_id() {
        let cache = RouteCache::new(MapCacheService::new(), &RouteCacheConfig::default());
        let route = route();

        assert!(cache.find_by_fingerprint("search:x").await.unwrap().is_none());
        cache.store("search:x", &route).await.unwrap();

        assert_eq!(cache.find_by_fingerprint("search:x").await.unwrap(), Some(route.clone()));
        assert_eq!(cache.get_route(route.id()).await.unwrap(), Some(route.clone()));
        assert_eq!(cache.service().len(), 2);
    }

    #[tokio::test]
    async fn dangling_pointer_is_a_miss() {
        let cache = RouteCache::new(MapCacheService::new(), &RouteCacheConfig::default());
        let route = route();
        cache.store("search:x", &route).await.unwrap();
        cache.service().delete(&format!("route:{}", route.id())).await.unwrap();

        assert!(cache.find_by_fingerprint("search:x").await.unwrap().is_none());
    }
}
