//! Rail-only search with a transfer bound.
//!
//! On the rail network a transfer is a change of train (route id), not a
//! stop. Staying aboard through intermediate stations is free; changing
//! trains costs a minimum transfer time on top of the travel minutes.
//!
//! The resolver first runs the unconstrained search over (node, train). If
//! the best path changes trains too often, it reruns with the number of
//! transfers so far as part of the state.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use chrono::NaiveDate;
use tracing::{debug, trace};

use crate::domain::{RouteId, StopId};
use crate::graph::{EdgeIndex, GraphEdge, GraphSnapshot, NodeIndex};

use super::config::SearchConfig;
use super::engine::{EdgePath, PathfindingEngine, join_ids};
use super::error::PlanError;

/// Number of train changes along `edges`.
pub fn count_transfers(edges: &[GraphEdge]) -> usize {
    edges
        .windows(2)
        .filter(|w| w[0].route_id != w[1].route_id)
        .count()
}

/// (minutes incl. penalties, metres, transfers)
type Cost = (u64, u64, usize);

/// (node, train ridden into it, transfers; zero when unbounded)
type State = (NodeIndex, Option<RouteId>, usize);

/// Rail sub-graph resolver over one snapshot.
pub struct TrainSubgraphResolver<'a> {
    graph: &'a GraphSnapshot,
    config: &'a SearchConfig,
}

impl<'a> TrainSubgraphResolver<'a> {
    pub fn new(graph: &'a GraphSnapshot, config: &'a SearchConfig) -> Self {
        Self { graph, config }
    }

    /// Shortest rail path with at most `max_transfers` train changes.
    pub fn find_shortest_path(
        &self,
        from: &StopId,
        to: &StopId,
        date: NaiveDate,
        max_transfers: usize,
    ) -> Result<EdgePath, PlanError> {
        self.find_shortest_path_between(
            std::slice::from_ref(from),
            std::slice::from_ref(to),
            date,
            max_transfers,
        )
    }

    /// As `find_shortest_path`, from any of `sources` to any of `targets`.
    pub fn find_shortest_path_between(
        &self,
        sources: &[StopId],
        targets: &[StopId],
        date: NaiveDate,
        max_transfers: usize,
    ) -> Result<EdgePath, PlanError> {
        let engine = PathfindingEngine::new(self.graph);
        let source_idx = engine.resolve(sources)?;
        let target_idx: HashSet<NodeIndex> = engine.resolve(targets)?.into_iter().collect();

        let not_found = |reason: &str| {
            PlanError::no_path(join_ids(sources), join_ids(targets), reason)
        };

        let Some(edges) = self.dijkstra(&source_idx, &target_idx, None) else {
            return Err(not_found("no rail connection"));
        };
        let path = engine.to_path(&edges, date);
        let transfers = count_transfers(path.edges());
        if transfers <= max_transfers {
            return Ok(path);
        }

        debug!(transfers, max_transfers, "Fastest rail path changes too often, bounding");
        match self.dijkstra(&source_idx, &target_idx, Some(max_transfers)) {
            Some(edges) => Ok(engine.to_path(&edges, date)),
            None => Err(not_found(&format!("no rail path within {max_transfers} transfers"))),
        }
    }

    fn dijkstra(
        &self,
        sources: &[NodeIndex],
        targets: &HashSet<NodeIndex>,
        bound: Option<usize>,
    ) -> Option<Vec<EdgeIndex>> {
        let penalty = u64::from(self.config.rail_transfer_penalty_mins);
        let mut best: HashMap<State, Cost> = HashMap::new();
        let mut prev: HashMap<State, (State, EdgeIndex)> = HashMap::new();
        let mut heap: BinaryHeap<Reverse<(Cost, NodeIndex, Option<RouteId>, usize)>> =
            BinaryHeap::new();

        for &s in sources {
            best.insert((s, None, 0), (0, 0, 0));
            heap.push(Reverse(((0, 0, 0), s, None, 0)));
        }

        while let Some(Reverse((cost, node, route, layer))) = heap.pop() {
            let state = (node, route.clone(), layer);
            if best.get(&state).is_some_and(|b| *b < cost) {
                continue;
            }
            if route.is_some() && targets.contains(&node) {
                trace!(minutes = cost.0, transfers = cost.2, "Rail path found");
                return Some(reconstruct(&prev, state));
            }

            for r in self.graph.rail_out_edges(node) {
                let edge = self.graph.edge(r.edge);
                let change = route.as_ref().is_some_and(|cur| *cur != edge.route_id);
                let transfers = cost.2 + usize::from(change);
                if bound.is_some_and(|b| transfers > b) {
                    continue;
                }

                let next: Cost = (
                    cost.0 + u64::from(edge.duration_minutes) + if change { penalty } else { 0 },
                    cost.1 + (edge.distance_km * 1000.0).round().max(0.0) as u64,
                    transfers,
                );
                let layer = if bound.is_some() { transfers } else { 0 };
                let key = (r.to, Some(edge.route_id.clone()), layer);
                if best.get(&key).is_none_or(|b| next < *b) {
                    best.insert(key.clone(), next);
                    prev.insert(key.clone(), (state.clone(), r.edge));
                    heap.push(Reverse((next, key.0, key.1, key.2)));
                }
            }
        }

        None
    }
}

fn reconstruct(prev: &HashMap<State, (State, EdgeIndex)>, end: State) -> Vec<EdgeIndex> {
    let mut edges = Vec::new();
    let mut cur = end;
    while let Some((before, edge)) = prev.get(&cur) {
        edges.push(*edge);
        cur = before.clone();
    }
    edges.reverse();
    edges
}
