//! Shortest-path search over a pinned graph version.
//!
//! Dijkstra with a lexicographic cost: total minutes, then total distance,
//! then number of edges. Every boarding after the first is a transfer, so
//! fewer edges means fewer transfers. With a transfer bound the search
//! state is (node, edges used) so that a slower path with fewer edges is
//! still found when the fastest one is too long.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use chrono::NaiveDate;
use tracing::trace;

use crate::domain::{ModeFilter, StopId};
use crate::graph::{EdgeIndex, GraphEdge, GraphSnapshot, NodeIndex};

use super::error::PlanError;

/// An ordered sequence of graph edges, bound to the graph version it was
/// found in and the travel date it was found for.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePath {
    version: String,
    date: NaiveDate,
    edges: Vec<GraphEdge>,
}

impl EdgePath {
    pub fn new(version: impl Into<String>, date: NaiveDate, edges: Vec<GraphEdge>) -> Self {
        Self {
            version: version.into(),
            date,
            edges,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Boardings after the first.
    pub fn transfers(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    pub fn total_minutes(&self) -> u64 {
        self.edges.iter().map(|e| u64::from(e.duration_minutes)).sum()
    }

    pub fn total_km(&self) -> f64 {
        self.edges.iter().map(|e| e.distance_km).sum()
    }

    pub fn origin(&self) -> Option<&StopId> {
        self.edges.first().map(|e| &e.from)
    }

    pub fn destination(&self) -> Option<&StopId> {
        self.edges.last().map(|e| &e.to)
    }

    /// Every stop on the path in travel order.
    pub fn stops(&self) -> Vec<&StopId> {
        let mut stops: Vec<&StopId> = self.edges.iter().map(|e| &e.from).collect();
        if let Some(last) = self.edges.last() {
            stops.push(&last.to);
        }
        stops
    }

    /// Stops strictly between origin and destination.
    pub fn intermediate_stops(&self) -> Vec<&StopId> {
        self.edges.iter().skip(1).map(|e| &e.from).collect()
    }
}

/// Search options shared by the engine, hub routing and rail search.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Transfers allowed; unbounded when absent.
    pub max_transfers: Option<usize>,
    pub modes: ModeFilter,
}

impl SearchOptions {
    pub fn new(max_transfers: Option<usize>, modes: ModeFilter) -> Self {
        Self {
            max_transfers,
            modes,
        }
    }

    /// Most edges a path may have.
    pub fn max_edges(&self) -> Option<usize> {
        self.max_transfers.map(|k| k + 1)
    }
}

/// (minutes, metres, edges)
type Cost = (u64, u64, usize);

/// (node, layer); the layer is the edge count when the search is bounded.
type State = (NodeIndex, usize);

fn metres(km: f64) -> u64 {
    (km * 1000.0).round().max(0.0) as u64
}

/// Shortest-path engine over one snapshot.
pub struct PathfindingEngine<'a> {
    graph: &'a GraphSnapshot,
}

impl<'a> PathfindingEngine<'a> {
    pub fn new(graph: &'a GraphSnapshot) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &'a GraphSnapshot {
        self.graph
    }

    /// Shortest path between two stops.
    pub fn search(
        &self,
        from: &StopId,
        to: &StopId,
        date: NaiveDate,
        options: &SearchOptions,
    ) -> Result<EdgePath, PlanError> {
        if from == to {
            return Err(PlanError::InvalidRequest(
                "origin and destination are the same stop".to_string(),
            ));
        }
        self.search_between(std::slice::from_ref(from), std::slice::from_ref(to), date, options)
    }

    /// Shortest path from any of `sources` to any of `targets`.
    pub fn search_between(
        &self,
        sources: &[StopId],
        targets: &[StopId],
        date: NaiveDate,
        options: &SearchOptions,
    ) -> Result<EdgePath, PlanError> {
        let source_idx = self.resolve(sources)?;
        let target_idx: HashSet<NodeIndex> = self.resolve(targets)?.into_iter().collect();

        let found = self.shortest(
            &source_idx,
            &target_idx,
            options.modes,
            options.max_edges(),
            &HashSet::new(),
        );

        match found {
            Some(edges) => Ok(self.to_path(&edges, date)),
            None => Err(PlanError::no_path(
                join_ids(sources),
                join_ids(targets),
                match options.max_transfers {
                    Some(k) => format!("no path within {k} transfers"),
                    None => "no connecting edges".to_string(),
                },
            )),
        }
    }

    pub(crate) fn resolve(&self, ids: &[StopId]) -> Result<Vec<NodeIndex>, PlanError> {
        if ids.is_empty() {
            return Err(PlanError::InvalidRequest("empty stop set".to_string()));
        }
        ids.iter()
            .map(|id| {
                self.graph
                    .node_index(id)
                    .ok_or_else(|| PlanError::StopNotInGraph(id.clone()))
            })
            .collect()
    }

    pub(crate) fn to_path(&self, edges: &[EdgeIndex], date: NaiveDate) -> EdgePath {
        EdgePath::new(
            self.graph.version(),
            date,
            edges.iter().map(|e| self.graph.edge(*e).clone()).collect(),
        )
    }

    /// Dijkstra core. Never enters a node in `avoid`, and never returns a
    /// zero-edge path.
    pub(crate) fn shortest(
        &self,
        sources: &[NodeIndex],
        targets: &HashSet<NodeIndex>,
        modes: ModeFilter,
        max_edges: Option<usize>,
        avoid: &HashSet<NodeIndex>,
    ) -> Option<Vec<EdgeIndex>> {
        let layered = max_edges.is_some();
        let mut best: HashMap<State, Cost> = HashMap::new();
        let mut prev: HashMap<State, (State, EdgeIndex)> = HashMap::new();
        let mut heap: BinaryHeap<Reverse<(Cost, NodeIndex, usize)>> = BinaryHeap::new();
        let mut settled = 0usize;

        for &s in sources {
            if avoid.contains(&s) {
                continue;
            }
            best.insert((s, 0), (0, 0, 0));
            heap.push(Reverse(((0, 0, 0), s, 0)));
        }

        while let Some(Reverse((cost, node, layer))) = heap.pop() {
            if best.get(&(node, layer)).is_some_and(|b| *b < cost) {
                continue;
            }
            settled += 1;

            if cost.2 > 0 && targets.contains(&node) {
                trace!(settled, minutes = cost.0, edges = cost.2, "Path found");
                return Some(reconstruct(&prev, (node, layer)));
            }
            if max_edges.is_some_and(|m| cost.2 >= m) {
                continue;
            }

            for r in self.graph.out_edges(node) {
                let edge = self.graph.edge(r.edge);
                if !modes.allows(edge.transport) || avoid.contains(&r.to) {
                    continue;
                }
                let next: Cost = (
                    cost.0 + u64::from(edge.duration_minutes),
                    cost.1 + metres(edge.distance_km),
                    cost.2 + 1,
                );
                let key = (r.to, if layered { layer + 1 } else { 0 });
                if best.get(&key).is_none_or(|b| next < *b) {
                    best.insert(key, next);
                    prev.insert(key, ((node, layer), r.edge));
                    heap.push(Reverse((next, key.0, key.1)));
                }
            }
        }

        trace!(settled, "No path");
        None
    }
}

fn reconstruct(prev: &HashMap<State, (State, EdgeIndex)>, end: State) -> Vec<EdgeIndex> {
    let mut edges = Vec::new();
    let mut cur = end;
    while let Some((before, edge)) = prev.get(&cur) {
        edges.push(*edge);
        cur = *before;
    }
    edges.reverse();
    edges
}

pub(crate) fn join_ids(ids: &[StopId]) -> String {
    ids.iter()
        .map(StopId::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransportType::{self, *};
    use crate::graph::fixtures::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn ids(path: &EdgePath) -> Vec<&str> {
        path.stops().into_iter().map(StopId::as_str).collect()
    }

    fn any() -> SearchOptions {
        SearchOptions::default()
    }

    fn bounded(k: usize) -> SearchOptions {
        SearchOptions::new(Some(k), ModeFilter::all())
    }

    fn chain() -> GraphSnapshot {
        // a-b-c-d-e only as a 4-edge chain
        line_graph(
            "v1",
            &[("a", "ca"), ("b", "cb"), ("c", "cc"), ("d", "cd"), ("e", "ce")],
            vec![
                edge("a", "b", 60, 50.0, Bus, "1"),
                edge("b", "c", 60, 50.0, Bus, "2"),
                edge("c", "d", 60, 50.0, Bus, "3"),
                edge("d", "e", 60, 50.0, Bus, "4"),
            ],
        )
    }

    #[test]
    fn direct_edge() {
        let g = chain();
        let path = PathfindingEngine::new(&g).search(&sid("a"), &sid("b"), date(), &any()).unwrap();
        assert_eq!(ids(&path), vec!["a", "b"]);
        assert_eq!(path.version(), "v1");
        assert_eq!(path.date(), date());
        assert_eq!(path.transfers(), 0);
    }

    #[test]
    fn prefers_faster_multi_hop() {
        let g = line_graph(
            "v1",
            &[("a", "ca"), ("b", "cb"), ("c", "cc")],
            vec![
                edge("a", "c", 300, 100.0, Bus, "slow"),
                edge("a", "b", 60, 60.0, Bus, "1"),
                edge("b", "c", 60, 60.0, Bus, "2"),
            ],
        );
        let path = PathfindingEngine::new(&g).search(&sid("a"), &sid("c"), date(), &any()).unwrap();
        assert_eq!(ids(&path), vec!["a", "b", "c"]);
        assert_eq!(path.total_minutes(), 120);
        assert_eq!(path.total_km(), 120.0);
    }

    #[test]
    fn ties_break_on_distance_then_edges() {
        let g = line_graph(
            "v1",
            &[("a", "ca"), ("b", "cb"), ("c", "cc"), ("d", "cd")],
            vec![
                edge("a", "d", 120, 200.0, Bus, "long"),
                edge("a", "b", 60, 90.0, Bus, "1"),
                edge("b", "d", 60, 90.0, Bus, "2"),
                edge("a", "c", 60, 90.0, Train, "3"),
            ],
        );
        let engine = PathfindingEngine::new(&g);
        let path = engine.search(&sid("a"), &sid("d"), date(), &any()).unwrap();
        assert_eq!(ids(&path), vec!["a", "b", "d"]);

        let g = line_graph(
            "v1",
            &[("a", "ca"), ("b", "cb"), ("d", "cd")],
            vec![
                edge("a", "d", 120, 180.0, Bus, "direct"),
                edge("a", "b", 60, 90.0, Bus, "1"),
                edge("b", "d", 60, 90.0, Bus, "2"),
            ],
        );
        let path = PathfindingEngine::new(&g).search(&sid("a"), &sid("d"), date(), &any()).unwrap();
        assert_eq!(ids(&path), vec!["a", "d"]);
    }

    #[test]
    fn four_hop_chain_exceeds_two_transfers() {
        let g = chain();
        let engine = PathfindingEngine::new(&g);

        let err = engine.search(&sid("a"), &sid("e"), date(), &bounded(2)).unwrap_err();
        assert!(matches!(err, PlanError::NoPathFound { .. }));

        let path = engine.search(&sid("a"), &sid("e"), date(), &bounded(3)).unwrap();
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn bound_finds_slower_shorter_path() {
        let g = line_graph(
            "v1",
            &[("a", "ca"), ("b", "cb"), ("c", "cc"), ("d", "cd")],
            vec![
                edge("a", "b", 10, 10.0, Bus, "1"),
                edge("b", "c", 10, 10.0, Bus, "2"),
                edge("c", "d", 10, 10.0, Bus, "3"),
                edge("a", "d", 500, 30.0, Ferry, "4"),
            ],
        );
        let engine = PathfindingEngine::new(&g);
        assert_eq!(engine.search(&sid("a"), &sid("d"), date(), &any()).unwrap().len(), 3);

        let path = engine.search(&sid("a"), &sid("d"), date(), &bounded(0)).unwrap();
        assert_eq!(ids(&path), vec!["a", "d"]);
        assert_eq!(path.edges()[0].transport, Ferry);
    }

    #[test]
    fn mode_filter_restricts_edges() {
        let g = line_graph(
            "v1",
            &[("a", "ca"), ("b", "cb"), ("c", "cc")],
            vec![
                edge("a", "c", 60, 100.0, Bus, "bus"),
                edge("a", "b", 100, 60.0, Train, "t1"),
                edge("b", "c", 100, 60.0, Train, "t2"),
            ],
        );
        let engine = PathfindingEngine::new(&g);
        let rail = SearchOptions::new(None, ModeFilter::only(&[Train]));
        let path = engine.search(&sid("a"), &sid("c"), date(), &rail).unwrap();
        assert!(path.edges().iter().all(|e| e.transport == TransportType::Train));

        let air = SearchOptions::new(None, ModeFilter::only(&[Airplane]));
        assert!(engine.search(&sid("a"), &sid("c"), date(), &air).is_err());
    }

    #[test]
    fn unknown_stop_is_reported() {
        let g = chain();
        let err = PathfindingEngine::new(&g)
            .search(&sid("a"), &sid("zz"), date(), &any())
            .unwrap_err();
        assert!(matches!(err, PlanError::StopNotInGraph(id) if id.as_str() == "zz"));
    }

    #[test]
    fn same_stop_rejected() {
        let g = chain();
        let err = PathfindingEngine::new(&g)
            .search(&sid("a"), &sid("a"), date(), &any())
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidRequest(_)));
    }

    #[test]
    fn no_reverse_travel_on_directed_edges() {
        let g = chain();
        let err = PathfindingEngine::new(&g)
            .search(&sid("e"), &sid("a"), date(), &any())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn multi_source_multi_target() {
        let g = line_graph(
            "v1",
            &[("a1", "ca"), ("a2", "ca"), ("m", "cm"), ("b1", "cb"), ("b2", "cb")],
            vec![
                edge("a1", "m", 100, 10.0, Bus, "1"),
                edge("a2", "m", 30, 10.0, Bus, "2"),
                edge("m", "b1", 50, 10.0, Bus, "3"),
                edge("m", "b2", 20, 10.0, Bus, "4"),
            ],
        );
        let path = PathfindingEngine::new(&g)
            .search_between(&[sid("a1"), sid("a2")], &[sid("b1"), sid("b2")], date(), &any())
            .unwrap();
        assert_eq!(ids(&path), vec!["a2", "m", "b2"]);
    }

    #[test]
    fn avoid_set_is_honoured() {
        let g = line_graph(
            "v1",
            &[("a", "ca"), ("b", "cb"), ("c", "cc"), ("d", "cd")],
            vec![
                edge("a", "b", 10, 1.0, Bus, "1"),
                edge("b", "d", 10, 1.0, Bus, "2"),
                edge("a", "c", 50, 1.0, Bus, "3"),
                edge("c", "d", 50, 1.0, Bus, "4"),
            ],
        );
        let engine = PathfindingEngine::new(&g);
        let a = g.node_index(&sid("a")).unwrap();
        let b = g.node_index(&sid("b")).unwrap();
        let d = g.node_index(&sid("d")).unwrap();
        let edges = engine
            .shortest(&[a], &HashSet::from([d]), ModeFilter::all(), None, &HashSet::from([b]))
            .unwrap();
        let path = engine.to_path(&edges, date());
        assert_eq!(ids(&path), vec!["a", "c", "d"]);
    }
}
