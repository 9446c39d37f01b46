//! Connectivity analysis of a graph version.
//!
//! Components are computed over the undirected graph. For every component
//! other than the largest, the report suggests one virtual link through the
//! nearest pair of stops. The graph itself is never modified.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::domain::{City, CityId, StopId};
use crate::geometry::haversine_km;
use crate::graph::{GraphSnapshot, NodeIndex};

/// One connected component.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub size: usize,
    pub cities: Vec<CityId>,
    pub stops: Vec<StopId>,
}

/// A link that would join a component to the largest one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedConnection {
    pub from: StopId,
    pub to: StopId,
    pub distance_km: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphSize {
    pub nodes: usize,
    pub edges: usize,
}

/// Connectivity of one graph version.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityReport {
    pub is_connected: bool,
    pub component_count: usize,
    /// Largest first.
    pub components: Vec<Component>,
    /// Cities none of whose stops has an edge.
    pub isolated_cities: Vec<CityId>,
    pub added_connections: Vec<SuggestedConnection>,
    pub graph: GraphSize,
}

struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// Analyze `graph`; `cities` are the known cities, used for isolation.
pub fn analyze(graph: &GraphSnapshot, cities: &[City]) -> ConnectivityReport {
    let n = graph.node_count();
    let mut sets = DisjointSet::new(n);
    let mut has_edge = vec![false; n];

    for i in 0..n {
        let from = NodeIndex(i as u32);
        for r in graph.out_edges(from) {
            sets.union(i, r.to.idx());
            has_edge[i] = true;
            has_edge[r.to.idx()] = true;
        }
    }

    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..n {
        groups.entry(sets.find(i)).or_default().push(i);
    }
    let mut groups: Vec<Vec<usize>> = groups.into_values().collect();
    groups.sort_by(|a, b| {
        b.len()
            .cmp(&a.len())
            .then_with(|| graph.node(NodeIndex(a[0] as u32)).id.cmp(&graph.node(NodeIndex(b[0] as u32)).id))
    });

    let components = groups
        .iter()
        .map(|members| {
            let nodes = members.iter().map(|&i| graph.node(NodeIndex(i as u32)));
            let cities: BTreeSet<CityId> = nodes.clone().map(|n| n.city_id.clone()).collect();
            let mut stops: Vec<StopId> = nodes.map(|n| n.id.clone()).collect();
            stops.sort();
            Component {
                size: members.len(),
                cities: cities.into_iter().collect(),
                stops,
            }
        })
        .collect::<Vec<_>>();

    let added_connections = match groups.split_first() {
        Some((largest, rest)) => rest
            .iter()
            .filter_map(|minor| nearest_pair(graph, minor, largest))
            .collect(),
        None => Vec::new(),
    };

    let connected_cities: BTreeSet<&CityId> = (0..n)
        .filter(|&i| has_edge[i])
        .map(|i| &graph.node(NodeIndex(i as u32)).city_id)
        .collect();
    let isolated_cities: Vec<CityId> = cities
        .iter()
        .map(|c| &c.id)
        .chain(graph.nodes().iter().map(|n| &n.city_id))
        .filter(|id| !connected_cities.contains(id))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    ConnectivityReport {
        is_connected: components.len() <= 1,
        component_count: components.len(),
        components,
        isolated_cities,
        added_connections,
        graph: GraphSize {
            nodes: n,
            edges: graph.edge_count(),
        },
    }
}

fn nearest_pair(graph: &GraphSnapshot, minor: &[usize], major: &[usize]) -> Option<SuggestedConnection> {
    let mut best: Option<(f64, usize, usize)> = None;
    for &a in minor {
        let ca = &graph.node(NodeIndex(a as u32)).coordinates;
        for &b in major {
            let d = haversine_km(ca, &graph.node(NodeIndex(b as u32)).coordinates);
            if best.is_none_or(|(bd, _, _)| d < bd) {
                best = Some((d, a, b));
            }
        }
    }
    best.map(|(d, a, b)| SuggestedConnection {
        from: graph.node(NodeIndex(a as u32)).id.clone(),
        to: graph.node(NodeIndex(b as u32)).id.clone(),
        distance_km: d,
    })
}
