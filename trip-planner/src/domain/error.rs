//! Domain error types.
//!
//! These errors represent validation failures and data inconsistencies
//! in the domain layer. They are distinct from repository and network errors.

use super::{InvalidCoordinates, InvalidId, StopId};

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DomainError {
    /// A route must contain at least one segment
    #[error("route must have at least one segment")]
    EmptyRoute,

    /// An identifier failed validation
    #[error(transparent)]
    InvalidId(#[from] InvalidId),

    /// Coordinates failed validation
    #[error(transparent)]
    InvalidCoordinates(#[from] InvalidCoordinates),

    /// A stop referenced by an edge or leg is unknown
    #[error("unknown stop: {0}")]
    UnknownStop(StopId),

    /// An edge is malformed (self-loop, non-positive weight, ...)
    #[error("invalid edge {from} -> {to}: {reason}")]
    InvalidEdge {
        from: StopId,
        to: StopId,
        reason: &'static str,
    },
}
