//! Process-level configuration.
//!
//! Every component has its own config struct with defaults; `AppConfig`
//! gathers the ones the binary needs and applies environment overrides.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::RouteCacheConfig;
use crate::geometry::{GeometryConfig, RouterCacheConfig, RouterConfig};
use crate::planner::SearchConfig;
use crate::pricing::PricingConfig;
use crate::validate::ValidationConfig;

pub const ROUTING_BASE_URL: &str = "ROUTING_BASE_URL";
pub const ROUTING_TIMEOUT_MS: &str = "ROUTING_TIMEOUT_MS";
pub const ROUTE_CACHE_TTL_SECS: &str = "ROUTE_CACHE_TTL_SECS";
pub const GRAPH_SNAPSHOT_DIR: &str = "GRAPH_SNAPSHOT_DIR";

/// An environment variable held a value that could not be used.
#[derive(Debug, thiserror::Error)]
#[error("invalid value {value:?} for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub router: RouterConfig,
    pub router_cache: RouterCacheConfig,
    pub geometry: GeometryConfig,
    pub route_cache: RouteCacheConfig,
    pub search: SearchConfig,
    pub pricing: PricingConfig,
    pub validation: ValidationConfig,
    /// Where graph snapshots are saved, if anywhere.
    pub snapshot_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Defaults overridden from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup(ROUTING_BASE_URL).filter(|s| !s.trim().is_empty()) {
            config.router.base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup(ROUTING_TIMEOUT_MS) {
            let ms = parse_positive(ROUTING_TIMEOUT_MS, &raw)?;
            let timeout = Duration::from_millis(ms);
            config.router.timeout = timeout;
            config.router_cache.timeout = timeout;
        }
        if let Some(raw) = lookup(ROUTE_CACHE_TTL_SECS) {
            config.route_cache.ttl = Duration::from_secs(parse_positive(ROUTE_CACHE_TTL_SECS, &raw)?);
        }
        if let Some(dir) = lookup(GRAPH_SNAPSHOT_DIR).filter(|s| !s.trim().is_empty()) {
            config.snapshot_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    let invalid = |reason: String| ConfigError {
        var,
        value: raw.to_string(),
        reason,
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(invalid("must be positive".to_string())),
        Ok(n) => Ok(n),
        Err(e) => Err(invalid(e.to_string())),
    }
}
