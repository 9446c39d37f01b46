//! Route planning over a versioned transport graph.
//!
//! The planner answers "how do I get from this city to that one on this
//! date?". A shortest-path search over the pinned graph version finds the
//! edges; rail-only trips use a transfer-bounded rail search, and small
//! airports fall back to routing through hubs. The edge path is then bound
//! to scheduled departures, priced, given geometry and validated.

mod assemble;
mod autocomplete;
mod build;
mod config;
mod engine;
mod error;
mod hubs;
mod rail;
mod request;

pub use assemble::{AssembledSegment, SegmentAssembler};
pub use autocomplete::{DEFAULT_LIMIT, MAX_LIMIT, autocomplete};
pub use build::{BuildOutcome, BuildResponse, RealityCheck, RealityCheckTarget, RoutePlanner};
pub use config::SearchConfig;
pub use engine::{EdgePath, PathfindingEngine, SearchOptions};
pub use error::PlanError;
pub use hubs::{HubLevel, HubRegistry, HubSelector};
pub use rail::{TrainSubgraphResolver, count_transfers};
pub use request::{RouteRequest, TripPreferences};
