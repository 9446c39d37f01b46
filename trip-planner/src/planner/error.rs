//! Planner error type.

use uuid::Uuid;

use crate::cache::CacheError;
use crate::domain::{CityId, DomainError, StopId};
use crate::repository::RepositoryError;

/// Error from route construction.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// No graph version has been published
    #[error("graph is not available")]
    GraphUnavailable,

    /// The city has no stops in the current graph
    #[error("no stops for city {city}")]
    NoStopsForCity { city: CityId },

    /// A stop is not part of the current graph
    #[error("stop {0} is not in the graph")]
    StopNotInGraph(StopId),

    /// Search or schedule resolution failed
    #[error("no path from {from} to {to}: {reason}")]
    NoPathFound {
        from: String,
        to: String,
        reason: String,
    },

    /// Invalid request
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A route id was not found in the cache
    #[error("route {0} not found")]
    RouteNotFound(Uuid),

    /// A built route violated a domain invariant
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl PlanError {
    pub(crate) fn no_path(from: impl ToString, to: impl ToString, reason: impl Into<String>) -> Self {
        PlanError::NoPathFound {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error reports missing connectivity rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PlanError::NoPathFound { .. }
                | PlanError::NoStopsForCity { .. }
                | PlanError::StopNotInGraph(_)
                | PlanError::RouteNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(PlanError::GraphUnavailable.to_string(), "graph is not available");
        let e = PlanError::no_path("a", "b", "no train edges");
        assert_eq!(e.to_string(), "no path from a to b: no train edges");
        assert!(e.is_not_found());
        assert!(!PlanError::InvalidRequest("x".into()).is_not_found());
    }

    #[test]
    fn infrastructure_errors_keep_message() {
        let e: PlanError = RepositoryError::Unavailable("db down".into()).into();
        assert_eq!(e.to_string(), "repository unavailable: db down");
    }
}
