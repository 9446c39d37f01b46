//! Hub routing for weakly connected endpoints.
//!
//! A small airport often has no useful direct flights. When the plain search
//! fails, the planner routes through designated hubs instead: an access leg
//! in any mode to the first hub, legs between hubs in the requested modes,
//! and an access leg from the last hub to the destination.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ModeFilter, StopId};
use crate::geometry::haversine_km;
use crate::graph::{EdgeIndex, GraphSnapshot, NodeIndex};
use crate::repository::StopRepository;

use super::config::SearchConfig;
use super::engine::{EdgePath, PathfindingEngine, SearchOptions, join_ids};
use super::error::PlanError;

/// Importance of a hub. Federal hubs are preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HubLevel {
    Federal,
    Regional,
}

/// Designated hub stops.
#[derive(Debug, Clone, Default)]
pub struct HubRegistry {
    hubs: HashMap<StopId, HubLevel>,
}

impl HubRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hub. Re-registering keeps the more important level.
    pub fn insert(&mut self, id: StopId, level: HubLevel) {
        self.hubs
            .entry(id)
            .and_modify(|l| *l = (*l).min(level))
            .or_insert(level);
    }

    pub fn with(mut self, id: StopId, level: HubLevel) -> Self {
        self.insert(id, level);
        self
    }

    pub fn level(&self, id: &StopId) -> Option<HubLevel> {
        self.hubs.get(id).copied()
    }

    pub fn is_hub(&self, id: &StopId) -> bool {
        self.hubs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.hubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StopId, HubLevel)> {
        self.hubs.iter().map(|(id, level)| (id, *level))
    }

    /// Hubs among the intermediate stops of `path`.
    pub fn count_in(&self, path: &EdgePath) -> usize {
        path.intermediate_stops()
            .into_iter()
            .filter(|s| self.is_hub(s))
            .count()
    }
}

/// Hub selection and hub-routed search over one snapshot.
pub struct HubSelector<'a> {
    graph: &'a GraphSnapshot,
    stops: &'a dyn StopRepository,
    hubs: &'a HubRegistry,
    config: &'a SearchConfig,
}

impl<'a> HubSelector<'a> {
    pub fn new(
        graph: &'a GraphSnapshot,
        stops: &'a dyn StopRepository,
        hubs: &'a HubRegistry,
        config: &'a SearchConfig,
    ) -> Self {
        Self {
            graph,
            stops,
            hubs,
            config,
        }
    }

    /// Whether `id` is a non-hub airport with few distinct neighbours.
    pub fn is_small_airport(&self, id: &StopId) -> Result<bool, PlanError> {
        let Some(stop) = self.stops.find_stop(id)? else {
            return Ok(false);
        };
        Ok(stop.is_airport
            && !stop.is_hub
            && !self.hubs.is_hub(id)
            && self.graph.distinct_neighbor_count(id) < self.config.small_airport_threshold)
    }

    /// Candidate hubs for a trip, best first.
    ///
    /// Federal before regional; within a level, the smallest detour
    /// `haversine(from, hub) + haversine(hub, to)`. Endpoints and hubs
    /// missing from the graph are excluded.
    pub fn select_hubs(&self, from: &StopId, to: &StopId) -> Vec<StopId> {
        let (Some(a), Some(b)) = (self.graph.node_index(from), self.graph.node_index(to)) else {
            return Vec::new();
        };
        let from_c = self.graph.node(a).coordinates;
        let to_c = self.graph.node(b).coordinates;

        let mut ranked: Vec<(HubLevel, f64, &StopId)> = self
            .hubs
            .iter()
            .filter(|(id, _)| *id != from && *id != to)
            .filter_map(|(id, level)| {
                let hub = self.graph.node(self.graph.node_index(id)?).coordinates;
                let detour = haversine_km(&from_c, &hub) + haversine_km(&hub, &to_c);
                Some((level, detour, id))
            })
            .collect();

        ranked.sort_by(|x, y| {
            x.0.cmp(&y.0)
                .then(x.1.total_cmp(&y.1))
                .then_with(|| x.2.cmp(y.2))
        });
        ranked.into_iter().map(|(_, _, id)| id.clone()).collect()
    }

    /// Hubs among the intermediate stops of `path`.
    pub fn count_hubs(&self, path: &EdgePath) -> usize {
        self.hubs.count_in(path)
    }

    /// Shortest path from `from` to `to` through one or more hubs.
    ///
    /// Minimizes total minutes, then hub count. The result has at least two
    /// edges, never revisits a stop, and never exceeds the transfer bound.
    pub fn find_path_via_hubs(
        &self,
        from: &StopId,
        to: &StopId,
        date: NaiveDate,
        options: &SearchOptions,
    ) -> Result<EdgePath, PlanError> {
        let engine = PathfindingEngine::new(self.graph);
        let from_idx = engine.resolve(std::slice::from_ref(from))?[0];
        let to_idx = engine.resolve(std::slice::from_ref(to))?[0];

        let candidates: Vec<NodeIndex> = self
            .select_hubs(from, to)
            .iter()
            .take(self.config.hub_candidates)
            .filter_map(|id| self.graph.node_index(id))
            .collect();

        let mut sequences = Vec::new();
        hub_sequences(&candidates, self.config.max_hubs, &mut Vec::new(), &mut sequences);

        let mut best: Option<((u64, usize, usize), Vec<EdgeIndex>)> = None;
        for seq in &sequences {
            let Some(edges) = self.route_through(&engine, from_idx, to_idx, seq, options) else {
                continue;
            };
            let minutes: u64 = edges
                .iter()
                .map(|e| u64::from(self.graph.edge(*e).duration_minutes))
                .sum();
            // Access legs may pass through other hubs, so count them on the path.
            let hubs = edges[..edges.len() - 1]
                .iter()
                .filter(|e| self.hubs.is_hub(&self.graph.edge(**e).to))
                .count();
            let key = (minutes, hubs, edges.len());
            if best.as_ref().is_none_or(|(b, _)| key < *b) {
                best = Some((key, edges));
            }
        }

        match best {
            Some(((minutes, hubs, _), edges)) => {
                debug!(%from, %to, minutes, hubs, edges = edges.len(), "Hub path found");
                Ok(engine.to_path(&edges, date))
            }
            None => Err(PlanError::no_path(
                join_ids(std::slice::from_ref(from)),
                join_ids(std::slice::from_ref(to)),
                "no path through hubs",
            )),
        }
    }

    /// Chain shortest legs through `hubs` in order.
    fn route_through(
        &self,
        engine: &PathfindingEngine<'_>,
        from: NodeIndex,
        to: NodeIndex,
        hubs: &[NodeIndex],
        options: &SearchOptions,
    ) -> Option<Vec<EdgeIndex>> {
        let mut waypoints = Vec::with_capacity(hubs.len() + 2);
        waypoints.push(from);
        waypoints.extend_from_slice(hubs);
        waypoints.push(to);
        let legs = waypoints.len() - 1;

        let mut used: HashSet<NodeIndex> = HashSet::from([from]);
        let mut edges: Vec<EdgeIndex> = Vec::new();

        for i in 0..legs {
            let (a, b) = (waypoints[i], waypoints[i + 1]);
            let access = i == 0 || i == legs - 1;
            let modes = if access { ModeFilter::all() } else { options.modes };

            let budget = match options.max_edges() {
                Some(m) => {
                    let left = m.checked_sub(edges.len() + (legs - i - 1))?;
                    if left == 0 {
                        return None;
                    }
                    Some(left)
                }
                None => None,
            };

            let mut avoid = used.clone();
            avoid.remove(&a);
            avoid.extend(waypoints[i + 2..].iter().copied());

            let leg = engine.shortest(&[a], &HashSet::from([b]), modes, budget, &avoid)?;
            for e in &leg {
                used.extend(self.graph.node_index(&self.graph.edge(*e).to));
            }
            edges.extend(leg);
        }

        Some(edges)
    }
}

/// All ordered sequences of distinct candidates, of length 1..=max_len.
fn hub_sequences(
    candidates: &[NodeIndex],
    max_len: usize,
    prefix: &mut Vec<NodeIndex>,
    out: &mut Vec<Vec<NodeIndex>>,
) {
    if prefix.len() == max_len {
        return;
    }
    for &c in candidates {
        if prefix.contains(&c) {
            continue;
        }
        prefix.push(c);
        out.push(prefix.clone());
        hub_sequences(candidates, max_len, prefix, out);
        prefix.pop();
    }
}
