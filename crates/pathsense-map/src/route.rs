//! Route planning over the spatial graph.
//!
//! Shortest paths are computed with Dijkstra over the undirected edge
//! set, weighted by the static edge distances.  Obstacle nodes and any
//! edge touching one are excluded outright: a route only ever runs along
//! traversed, traversable ground.
//!
//! Endpoints are arbitrary coordinates; both are snapped to the nearest
//! non-obstacle node within [`RoutePlanner::snap_radius_m`] (default
//! [`DEFAULT_SNAP_RADIUS_M`]) before planning.
//!
//! The planner keeps the last computed route and a cursor so callers can
//! walk it node by node with [`RoutePlanner::next_node`].

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use thiserror::Error;
use tracing::debug;

use pathsense_geo::distance_m;

use crate::graph::{NodeHandle, SpatialGraph};

/// Default maximum distance between a requested endpoint and the node
/// it snaps to.
pub const DEFAULT_SNAP_RADIUS_M: f64 = 25.0;

/// Why planning produced no route.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouteError {
    #[error("no traversable node within {0} m of the requested point")]
    NoNearbyNode(f64),

    #[error("no traversable path connects the two points")]
    NoRoute,
}

/// Min-heap entry; `Ord` is reversed on cost so `BinaryHeap` pops the
/// cheapest frontier node first.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HeapEntry {
    cost: f64,
    node: usize,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Plans and replays shortest routes between coordinates.
#[derive(Debug)]
pub struct RoutePlanner {
    snap_radius_m: f64,
    route: Vec<NodeHandle>,
    cursor: usize,
}

impl RoutePlanner {
    pub fn new() -> Self {
        Self::with_snap_radius(DEFAULT_SNAP_RADIUS_M)
    }

    pub fn with_snap_radius(snap_radius_m: f64) -> Self {
        Self {
            snap_radius_m,
            route: Vec::new(),
            cursor: 0,
        }
    }

    pub fn snap_radius_m(&self) -> f64 {
        self.snap_radius_m
    }

    /// The most recently planned route, start to goal inclusive.  Empty
    /// until a plan succeeds.
    pub fn route(&self) -> &[NodeHandle] {
        &self.route
    }

    /// Drop the stored route and cursor.  Required after the graph is
    /// cleared or reloaded, since handles do not survive either.
    pub fn reset(&mut self) {
        self.route.clear();
        self.cursor = 0;
    }

    /// Plan the shortest traversable route from `(start_lat, start_lng)`
    /// to `(end_lat, end_lng)`.
    ///
    /// On success the route (start node to goal node inclusive) is
    /// stored, the replay cursor rewinds, and the route is returned.  On
    /// failure the previously stored route is left untouched.
    pub fn find_path(
        &mut self,
        graph: &SpatialGraph,
        start_lat: f64,
        start_lng: f64,
        end_lat: f64,
        end_lng: f64,
    ) -> Result<&[NodeHandle], RouteError> {
        let start = self
            .snap(graph, start_lat, start_lng)
            .ok_or(RouteError::NoNearbyNode(self.snap_radius_m))?;
        let goal = self
            .snap(graph, end_lat, end_lng)
            .ok_or(RouteError::NoNearbyNode(self.snap_radius_m))?;

        if start == goal {
            self.route = vec![start];
            self.cursor = 0;
            return Ok(&self.route);
        }

        let route = shortest_path(graph, start, goal).ok_or(RouteError::NoRoute)?;
        debug!(hops = route.len(), "route planned");
        self.route = route;
        self.cursor = 0;
        Ok(&self.route)
    }

    /// Advance the cursor and return the coordinates of the next route
    /// node, or `None` when the route is exhausted (or none is stored).
    pub fn next_node(&mut self, graph: &SpatialGraph) -> Option<(f64, f64)> {
        let handle = self.route.get(self.cursor)?;
        self.cursor += 1;
        let node = graph.node(*handle);
        Some((node.lat, node.lng))
    }

    /// Nearest non-obstacle node within the snap radius.
    fn snap(&self, graph: &SpatialGraph, lat: f64, lng: f64) -> Option<NodeHandle> {
        let mut best: Option<(NodeHandle, f64)> = None;
        for (handle, node) in graph.nodes() {
            if node.is_obstacle {
                continue;
            }
            let dist = distance_m(lat, lng, node.lat, node.lng);
            if dist <= self.snap_radius_m && best.is_none_or(|(_, d)| dist < d) {
                best = Some((handle, dist));
            }
        }
        best.map(|(h, _)| h)
    }
}

impl Default for RoutePlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Dijkstra over the non-obstacle subgraph.  Returns the node sequence
/// from `start` to `goal` inclusive, or `None` when they are not
/// connected.
fn shortest_path(
    graph: &SpatialGraph,
    start: NodeHandle,
    goal: NodeHandle,
) -> Option<Vec<NodeHandle>> {
    let n = graph.node_count();

    // Undirected adjacency over edges whose endpoints are both
    // traversable.
    let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    for (_, edge) in graph.edges() {
        let (s, t) = (edge.source.index(), edge.target.index());
        if graph.node(edge.source).is_obstacle || graph.node(edge.target).is_obstacle {
            continue;
        }
        adjacency[s].push((t, edge.weight_m));
        adjacency[t].push((s, edge.weight_m));
    }

    let mut dist = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<usize>> = vec![None; n];
    let mut heap = BinaryHeap::new();

    dist[start.index()] = 0.0;
    heap.push(HeapEntry {
        cost: 0.0,
        node: start.index(),
    });

    while let Some(HeapEntry { cost, node }) = heap.pop() {
        if node == goal.index() {
            break;
        }
        if cost > dist[node] {
            continue;
        }
        for &(next, weight) in &adjacency[node] {
            let candidate = cost + weight;
            if candidate < dist[next] {
                dist[next] = candidate;
                prev[next] = Some(node);
                heap.push(HeapEntry {
                    cost: candidate,
                    node: next,
                });
            }
        }
    }

    if dist[goal.index()].is_infinite() {
        return None;
    }

    let mut path = vec![goal.index()];
    let mut cursor = goal.index();
    while let Some(p) = prev[cursor] {
        path.push(p);
        cursor = p;
    }
    path.reverse();
    Some(path.into_iter().map(NodeHandle).collect())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
