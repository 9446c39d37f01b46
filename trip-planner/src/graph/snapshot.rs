//! Immutable, versioned adjacency graph.
//!
//! A `GraphSnapshot` is built once by `GraphBuilder` and never mutated.
//! Node lookups, adjacency lists (full and rail-only) and the best edge
//! between each ordered node pair are all precomputed at build time, so
//! queries only index into vectors and maps.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CityId, Coordinates, DomainError, RouteId, Stop, StopId, TransportType};

/// Dense index of a node within one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Dense index of an edge within one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeIndex(pub u32);

impl EdgeIndex {
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// A graph node: a stop with the metadata the graph algorithms need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: StopId,
    pub city_id: CityId,
    pub coordinates: Coordinates,
}

impl From<&Stop> for GraphNode {
    fn from(stop: &Stop) -> Self {
        Self {
            id: stop.id.clone(),
            city_id: stop.city_id.clone(),
            coordinates: stop.coordinates,
        }
    }
}

/// A directed connection between two stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub from: StopId,
    pub to: StopId,
    /// Travel time in minutes; the search weight.
    pub duration_minutes: u32,
    pub distance_km: f64,
    pub transport: TransportType,
    pub route_id: RouteId,
}

/// Outgoing adjacency entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRef {
    pub to: NodeIndex,
    pub edge: EdgeIndex,
}

/// Neighbour as reported to collaborators outside the search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Neighbor {
    pub neighbor_id: StopId,
    pub weight: u32,
    pub distance_km: f64,
    pub transport: TransportType,
    pub route_id: RouteId,
}

/// Descriptive information about a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadata {
    pub version: String,
    pub built_at: DateTime<Utc>,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Serialized form of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotData {
    pub version: String,
    pub built_at: DateTime<Utc>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Immutable multimodal graph.
#[derive(Debug)]
pub struct GraphSnapshot {
    metadata: GraphMetadata,
    nodes: Vec<GraphNode>,
    index: HashMap<StopId, NodeIndex>,
    edges: Vec<GraphEdge>,
    out: Vec<Vec<EdgeRef>>,
    rail_out: Vec<Vec<EdgeRef>>,
    /// Fastest edge for each ordered pair.
    best_edge: HashMap<(NodeIndex, NodeIndex), EdgeIndex>,
}

impl GraphSnapshot {
    /// Start building a snapshot for `version`.
    pub fn builder(version: impl Into<String>) -> GraphBuilder {
        GraphBuilder::new(version)
    }

    /// Rebuild a snapshot from its serialized form.
    pub fn from_data(data: SnapshotData) -> Result<Self, DomainError> {
        let mut builder = GraphBuilder::new(data.version).built_at(data.built_at);
        for node in data.nodes {
            builder.add_node(node);
        }
        for edge in data.edges {
            builder.add_edge(edge)?;
        }
        Ok(builder.build())
    }

    /// Serializable copy of this snapshot.
    pub fn to_data(&self) -> SnapshotData {
        SnapshotData {
            version: self.metadata.version.clone(),
            built_at: self.metadata.built_at,
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    pub fn version(&self) -> &str {
        &self.metadata.version
    }

    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn has_node(&self, id: &StopId) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_index(&self, id: &StopId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &GraphNode {
        &self.nodes[idx.idx()]
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edge(&self, idx: EdgeIndex) -> &GraphEdge {
        &self.edges[idx.idx()]
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Outgoing edges of a node, all modes.
    pub fn out_edges(&self, idx: NodeIndex) -> &[EdgeRef] {
        &self.out[idx.idx()]
    }

    /// Outgoing train edges of a node.
    pub fn rail_out_edges(&self, idx: NodeIndex) -> &[EdgeRef] {
        &self.rail_out[idx.idx()]
    }

    /// Neighbours of a stop, one entry per outgoing edge.
    pub fn neighbors(&self, id: &StopId) -> Vec<Neighbor> {
        let Some(idx) = self.node_index(id) else {
            return Vec::new();
        };
        self.out_edges(idx)
            .iter()
            .map(|r| {
                let edge = self.edge(r.edge);
                Neighbor {
                    neighbor_id: edge.to.clone(),
                    weight: edge.duration_minutes,
                    distance_km: edge.distance_km,
                    transport: edge.transport,
                    route_id: edge.route_id.clone(),
                }
            })
            .collect()
    }

    /// Number of distinct stops directly reachable from `id`.
    pub fn distinct_neighbor_count(&self, id: &StopId) -> usize {
        let Some(idx) = self.node_index(id) else {
            return 0;
        };
        let mut targets: Vec<NodeIndex> = self.out_edges(idx).iter().map(|r| r.to).collect();
        targets.sort_unstable();
        targets.dedup();
        targets.len()
    }

    /// The fastest direct edge between two stops.
    pub fn edge_metadata(&self, from: &StopId, to: &StopId) -> Option<&GraphEdge> {
        let a = self.node_index(from)?;
        let b = self.node_index(to)?;
        self.best_edge.get(&(a, b)).map(|e| self.edge(*e))
    }

    /// Weight (minutes) of the fastest direct edge between two stops.
    pub fn edge_weight(&self, from: &StopId, to: &StopId) -> Option<u32> {
        self.edge_metadata(from, to).map(|e| e.duration_minutes)
    }

    /// Whether a direct edge exists between two stops.
    pub fn has_direct_edge(&self, from: &StopId, to: &StopId) -> bool {
        self.edge_metadata(from, to).is_some()
    }

    /// Stops of the graph located in `city`.
    pub fn stops_in_city(&self, city: &CityId) -> Vec<&StopId> {
        self.nodes
            .iter()
            .filter(|n| &n.city_id == city)
            .map(|n| &n.id)
            .collect()
    }
}

/// Accumulates nodes and edges, then precomputes the snapshot indexes.
#[derive(Debug)]
pub struct GraphBuilder {
    version: String,
    built_at: DateTime<Utc>,
    nodes: Vec<GraphNode>,
    index: HashMap<StopId, NodeIndex>,
    edges: Vec<GraphEdge>,
}

impl GraphBuilder {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            built_at: Utc::now(),
            nodes: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
        }
    }

    /// Override the build timestamp.
    pub fn built_at(mut self, at: DateTime<Utc>) -> Self {
        self.built_at = at;
        self
    }

    /// Add a node. Re-adding an existing id replaces its metadata.
    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(idx) = self.index.get(&node.id) {
            self.nodes[idx.idx()] = node;
            return *idx;
        }
        let idx = NodeIndex(self.nodes.len() as u32);
        self.index.insert(node.id.clone(), idx);
        self.nodes.push(node);
        idx
    }

    /// Add a directed edge between two known nodes.
    pub fn add_edge(&mut self, edge: GraphEdge) -> Result<(), DomainError> {
        if !self.index.contains_key(&edge.from) {
            return Err(DomainError::UnknownStop(edge.from));
        }
        if !self.index.contains_key(&edge.to) {
            return Err(DomainError::UnknownStop(edge.to));
        }
        if edge.from == edge.to {
            return Err(DomainError::InvalidEdge {
                from: edge.from,
                to: edge.to,
                reason: "self-loop",
            });
        }
        if edge.duration_minutes == 0 {
            return Err(DomainError::InvalidEdge {
                from: edge.from,
                to: edge.to,
                reason: "duration must be positive",
            });
        }
        if !edge.distance_km.is_finite() || edge.distance_km < 0.0 {
            return Err(DomainError::InvalidEdge {
                from: edge.from,
                to: edge.to,
                reason: "distance must be finite and non-negative",
            });
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Whether a node with `id` was added.
    pub fn contains_node(&self, id: &StopId) -> bool {
        self.index.contains_key(id)
    }

    /// Freeze into an immutable snapshot.
    pub fn build(self) -> GraphSnapshot {
        let n = self.nodes.len();
        let mut out: Vec<Vec<EdgeRef>> = vec![Vec::new(); n];
        let mut rail_out: Vec<Vec<EdgeRef>> = vec![Vec::new(); n];
        let mut best_edge: HashMap<(NodeIndex, NodeIndex), EdgeIndex> = HashMap::new();

        for (i, edge) in self.edges.iter().enumerate() {
            // Endpoints were checked in add_edge.
            let from = self.index[&edge.from];
            let to = self.index[&edge.to];
            let r = EdgeRef {
                to,
                edge: EdgeIndex(i as u32),
            };
            out[from.idx()].push(r);
            if edge.transport == TransportType::Train {
                rail_out[from.idx()].push(r);
            }

            let replace = match best_edge.get(&(from, to)) {
                Some(existing) => {
                    let cur = &self.edges[existing.idx()];
                    (edge.duration_minutes, edge.distance_km)
                        < (cur.duration_minutes, cur.distance_km)
                }
                None => true,
            };
            if replace {
                best_edge.insert((from, to), r.edge);
            }
        }

        let metadata = GraphMetadata {
            version: self.version,
            built_at: self.built_at,
            node_count: n,
            edge_count: self.edges.len(),
        };

        GraphSnapshot {
            metadata,
            nodes: self.nodes,
            index: self.index,
            edges: self.edges,
            out,
            rail_out,
            best_edge,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Small graphs shared by tests across modules.

    use super::*;

    pub fn sid(s: &str) -> StopId {
        StopId::parse(s).unwrap()
    }

    pub fn node(id: &str, city: &str, lat: f64, lon: f64) -> GraphNode {
        GraphNode {
            id: sid(id),
            city_id: CityId::parse(city).unwrap(),
            coordinates: Coordinates::new(lat, lon).unwrap(),
        }
    }

    pub fn edge(
        from: &str,
        to: &str,
        minutes: u32,
        km: f64,
        transport: TransportType,
        route: &str,
    ) -> GraphEdge {
        GraphEdge {
            from: sid(from),
            to: sid(to),
            duration_minutes: minutes,
            distance_km: km,
            transport,
            route_id: RouteId::parse(route).unwrap(),
        }
    }

    /// Build a snapshot from nodes `(id, city)` placed on a line and edges.
    pub fn line_graph(version: &str, nodes: &[(&str, &str)], edges: Vec<GraphEdge>) -> GraphSnapshot {
        let mut b = GraphBuilder::new(version);
        for (i, (id, city)) in nodes.iter().enumerate() {
            b.add_node(node(id, city, 60.0, 100.0 + i as f64));
        }
        for e in edges {
            b.add_edge(e).unwrap();
        }
        b.build()
    }
}
