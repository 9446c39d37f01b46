//! Road-routing client.
//!
//! Talks to an OSRM-compatible HTTP API to obtain road-following geometry for
//! bus and taxi segments. The service is a soft dependency: callers are
//! expected to fall back to a straight line on any `RoutingError`.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Semaphore;

use crate::domain::{Coordinates, TransportType};

use super::polyline::{PolylineError, decode_polyline};

/// Default base URL for the public OSRM demo server.
const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Errors from the road-routing service.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// HTTP request failed (network error, connect failure, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The call did not complete within the configured bound
    #[error("routing timed out after {0:?}")]
    Timeout(Duration),

    /// API returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the API
    #[error("rate limited by routing API")]
    RateLimited,

    /// JSON deserialization failed
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// The service answered but found no route
    #[error("no route: {0}")]
    NoRoute(String),

    /// The returned geometry could not be decoded
    #[error("bad route geometry: {0}")]
    Polyline(#[from] PolylineError),

    /// The client was shut down
    #[error("routing client closed")]
    Closed,
}

/// Source of road-following geometry.
///
/// This abstraction allows the geometry service to be tested without a
/// network.
#[allow(async_fn_in_trait)]
pub trait RoadRouter {
    /// Road geometry from `from` to `to` for `mode`.
    async fn route(
        &self,
        from: &Coordinates,
        to: &Coordinates,
        mode: TransportType,
    ) -> Result<Vec<Coordinates>, RoutingError>;
}

/// Configuration for the OSRM client.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout
    pub timeout: Duration,
}

impl RouterConfig {
    /// Create a config for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout: Duration::from_millis(1500),
        }
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: String,
}

/// OSRM HTTP client.
///
/// Uses a semaphore to limit concurrent requests.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl OsrmClient {
    /// Create a new client with the given configuration.
    pub fn new(config: RouterConfig) -> Result<Self, RoutingError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    /// OSRM profile for a road mode. Both road modes ride the car network.
    fn profile(_mode: TransportType) -> &'static str {
        "driving"
    }

    fn route_url(&self, from: &Coordinates, to: &Coordinates, mode: TransportType) -> String {
        format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}",
            self.base_url,
            Self::profile(mode),
            from.lon(),
            from.lat(),
            to.lon(),
            to.lat()
        )
    }
}

impl RoadRouter for OsrmClient {
    async fn route(
        &self,
        from: &Coordinates,
        to: &Coordinates,
        mode: TransportType,
    ) -> Result<Vec<Coordinates>, RoutingError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| RoutingError::Closed)?;

        let response = self
            .http
            .get(self.route_url(from, to, mode))
            .query(&[("overview", "full"), ("geometries", "polyline")])
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RoutingError::RateLimited);
        }

        let body = response.text().await?;

        let parsed: OsrmResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => {
                return Err(RoutingError::Json {
                    message: e.to_string(),
                });
            }
            Err(_) => {
                return Err(RoutingError::Api {
                    status: status.as_u16(),
                    message: body.chars().take(500).collect(),
                });
            }
        };

        if parsed.code != "Ok" {
            return Err(RoutingError::NoRoute(
                parsed.message.unwrap_or(parsed.code),
            ));
        }

        let route = parsed
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| RoutingError::NoRoute("empty routes array".to_string()))?;

        let points = decode_polyline(&route.geometry)?;
        if points.len() < 2 {
            return Err(RoutingError::NoRoute("degenerate geometry".to_string()));
        }
        Ok(points)
    }
}
