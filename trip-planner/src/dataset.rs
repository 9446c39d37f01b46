//! Reference dataset loading.
//!
//! A dataset is one JSON document holding cities, stops, graph edges,
//! scheduled legs and hub designations:
//!
//! ```json
//! {
//!   "version": "2025-06-01",
//!   "cities": [{"id": "yakutsk", "name": "Yakutsk", "region": "Sakha"}],
//!   "stops": [{"id": "yks", "name": "Yakutsk Airport",
//!              "coordinates": {"lat": 62.09, "lon": 129.77},
//!              "cityId": "yakutsk", "isAirport": true, "isHub": true}],
//!   "edges": [...],
//!   "legs": [...],
//!   "hubs": [{"stopId": "yks", "level": "federal"}]
//! }
//! ```
//!
//! Loading validates cross references and yields the repositories, the
//! graph snapshot and the hub registry the planner runs on.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{City, DomainError, ScheduledLeg, Stop, StopId};
use crate::graph::{GraphEdge, GraphNode, GraphSnapshot};
use crate::planner::{HubLevel, HubRegistry};
use crate::repository::{InMemoryScheduleRepository, InMemoryStopRepository};

/// Errors from loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// Dataset file could not be read
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Dataset JSON is malformed
    #[error("dataset JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Dataset content is inconsistent
    #[error("invalid dataset: {0}")]
    Invalid(#[from] DomainError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubEntry {
    pub stop_id: StopId,
    pub level: HubLevel,
}

/// Raw dataset document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetFile {
    pub version: String,
    #[serde(default)]
    pub cities: Vec<City>,
    pub stops: Vec<Stop>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
    #[serde(default)]
    pub legs: Vec<ScheduledLeg>,
    #[serde(default)]
    pub hubs: Vec<HubEntry>,
}

/// A loaded, cross-checked dataset.
#[derive(Debug)]
pub struct Dataset {
    pub graph: GraphSnapshot,
    pub stops: InMemoryStopRepository,
    pub schedules: InMemoryScheduleRepository,
    pub hubs: HubRegistry,
}

impl Dataset {
    /// Load and validate the dataset at `path`.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let contents = std::fs::read_to_string(path).map_err(|e| DatasetError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file: DatasetFile = serde_json::from_str(&contents)?;
        let dataset = Self::from_file(file)?;
        info!(
            path = %path.display(),
            version = dataset.graph.version(),
            nodes = dataset.graph.node_count(),
            edges = dataset.graph.edge_count(),
            legs = dataset.schedules.leg_count(),
            hubs = dataset.hubs.len(),
            "Loaded dataset"
        );
        Ok(dataset)
    }

    /// Build a dataset from an already-parsed document.
    ///
    /// Stops flagged `isHub` become regional hubs unless the hub list says
    /// otherwise.
    pub fn from_file(file: DatasetFile) -> Result<Self, DomainError> {
        let mut builder = GraphSnapshot::builder(file.version);
        for stop in &file.stops {
            builder.add_node(GraphNode::from(stop));
        }
        for edge in file.edges {
            builder.add_edge(edge)?;
        }

        for leg in &file.legs {
            for id in [&leg.from, &leg.to] {
                if !builder.contains_node(id) {
                    return Err(DomainError::UnknownStop(id.clone()));
                }
            }
        }

        let mut hubs = HubRegistry::new();
        for stop in file.stops.iter().filter(|s| s.is_hub) {
            hubs.insert(stop.id.clone(), HubLevel::Regional);
        }
        for entry in file.hubs {
            if !builder.contains_node(&entry.stop_id) {
                return Err(DomainError::UnknownStop(entry.stop_id));
            }
            hubs.insert(entry.stop_id, entry.level);
        }

        Ok(Self {
            graph: builder.build(),
            stops: InMemoryStopRepository::new(file.stops, file.cities),
            schedules: InMemoryScheduleRepository::new(file.legs),
            hubs,
        })
    }
}
