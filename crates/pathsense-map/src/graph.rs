//! Spatial Graph Store.
//!
//! Owns the node and edge collections that make up the cane's memory of
//! traversed space, under a strict fixed-capacity contract: both arenas
//! are bounded ([`MAX_NODES`] / [`MAX_EDGES`]), insertion is refused with
//! [`MapError::CapacityExceeded`] once a bound is reached, and nothing is
//! ever evicted short of a full [`clear`][SpatialGraph::clear].
//!
//! # Identity
//!
//! Node and edge ids are opaque strings (`"n_7"`, `"e_3"`) generated from
//! a process-local monotonic counter, so they are unique for the lifetime
//! of the store and survive persistence round-trips unchanged.  Lookups
//! inside the crate go through dense [`NodeHandle`] / [`EdgeHandle`]
//! indices backed by a side table; the string ids exist for the wire
//! format and for human-readable landmark names embedded into them.
//!
//! # Example
//!
//! ```rust
//! use pathsense_map::graph::SpatialGraph;
//!
//! let mut graph = SpatialGraph::new();
//! let a = graph.insert_node(59.0, 18.0, "path", false).unwrap();
//! let b = graph.insert_node(59.0001, 18.0, "path", false).unwrap();
//!
//! let edge = graph.insert_or_merge_edge(a, b, 11.1).unwrap();
//! assert_eq!(graph.edge(edge).traverse_count, 1);
//!
//! // The reverse direction merges into the same undirected edge.
//! let same = graph.insert_or_merge_edge(b, a, 11.1).unwrap();
//! assert_eq!(edge, same);
//! assert_eq!(graph.edge(edge).traverse_count, 2);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use pathsense_geo::distance_m;
use thiserror::Error;

/// Maximum number of nodes the store will hold.
pub const MAX_NODES: usize = 500;
/// Maximum number of edges the store will hold.
pub const MAX_EDGES: usize = 1000;

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Which bounded arena an operation ran out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Nodes,
    Edges,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Nodes => write!(f, "node"),
            Section::Edges => write!(f, "edge"),
        }
    }
}

/// Errors from graph store mutations.
///
/// All of these are recoverable: callers that feed sensor data into the
/// store treat them as degraded-operation conditions, never as faults.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("{section} store is at capacity ({limit})")]
    CapacityExceeded { section: Section, limit: usize },

    #[error("an edge cannot connect a node to itself")]
    SelfLoop,
}

// ────────────────────────────────────────────────────────────────────────────
// Handles
// ────────────────────────────────────────────────────────────────────────────

/// Stable dense reference to a node in the store.
///
/// Handles stay valid until [`SpatialGraph::clear`] (there is no per-node
/// deletion); do not hold them across a clear or a document load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(pub(crate) usize);

impl NodeHandle {
    /// Dense index of the node, in insertion order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Stable dense reference to an edge in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeHandle(pub(crate) usize);

impl EdgeHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Records
// ────────────────────────────────────────────────────────────────────────────

/// A place the cane has been, or an obstacle it has observed there.
#[derive(Debug, Clone)]
pub struct MapNode {
    /// Opaque unique id; never reused for the process lifetime.
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    /// Open classification vocabulary: `"path"`, `"door"`, `"room"`,
    /// `"street"`, obstacle subtypes (`"wall"`, `"stairs"`, ...),
    /// landmark subtypes, or anything else a collaborator reports.
    pub kind: String,
    /// Obstacle nodes are excluded from traversable-path semantics.
    pub is_obstacle: bool,
    /// Monotonic time of the most recent observation.  Not persisted.
    pub last_seen: Instant,
    /// Number of observations merged into this node (≥ 1).
    pub visit_count: u32,
}

/// An observed transition between two nodes.  Undirected: the
/// source/target order carries no meaning for identity or weight.
#[derive(Debug, Clone)]
pub struct MapEdge {
    pub id: String,
    pub source: NodeHandle,
    pub target: NodeHandle,
    /// Great-circle distance in metres between the two node positions at
    /// creation time.  Static; never re-measured on reuse.
    pub weight_m: f64,
    /// Monotonic time of the most recent traversal.  Not persisted.
    pub last_traversed: Instant,
    /// Number of traversals merged into this edge (≥ 1).
    pub traverse_count: u32,
}

impl MapEdge {
    /// True when this edge connects the unordered pair `{a, b}`.
    pub fn connects(&self, a: NodeHandle, b: NodeHandle) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Area classification
// ────────────────────────────────────────────────────────────────────────────

/// Coarse bucket describing what kind of place dominates an area.
///
/// [`SpatialGraph::area_type`] votes over the nodes within a radius.
/// Ties are broken by the fixed priority `Path > Door > Room > Street >
/// Other`; `Unknown` means no node was in range at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaType {
    Path,
    Door,
    Room,
    Street,
    Other,
    Unknown,
}

impl fmt::Display for AreaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AreaType::Path => "path",
            AreaType::Door => "door",
            AreaType::Room => "room",
            AreaType::Street => "street",
            AreaType::Other => "other",
            AreaType::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SpatialGraph
// ────────────────────────────────────────────────────────────────────────────

/// Bounded topological memory of traversed space.
///
/// Construct with [`SpatialGraph::new`] (device capacities) or
/// [`SpatialGraph::with_capacity`] (tests).  All spatial queries are
/// linear scans; with a few hundred nodes that is cheaper than
/// maintaining an index on a device this size.
#[derive(Debug)]
pub struct SpatialGraph {
    nodes: Vec<MapNode>,
    edges: Vec<MapEdge>,
    /// Side table: string id → dense node index.
    node_index: HashMap<String, usize>,
    node_capacity: usize,
    edge_capacity: usize,
    /// Monotonic id sequence shared by nodes and edges.  Never reset,
    /// not even by [`clear`][Self::clear]: ids are never reused.
    next_seq: u64,
}

impl SpatialGraph {
    /// Create an empty store with the device capacities
    /// ([`MAX_NODES`] / [`MAX_EDGES`]).
    pub fn new() -> Self {
        Self::with_capacity(MAX_NODES, MAX_EDGES)
    }

    /// Create an empty store with explicit capacities.
    pub fn with_capacity(node_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            node_index: HashMap::new(),
            node_capacity,
            edge_capacity,
            next_seq: 0,
        }
    }

    // ── counts ───────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_capacity(&self) -> usize {
        self.node_capacity
    }

    pub fn edge_capacity(&self) -> usize {
        self.edge_capacity
    }

    // ── access ───────────────────────────────────────────────────────────

    /// Shared access to a node.  Handles are never invalidated short of
    /// [`clear`][Self::clear], so this indexes directly.
    pub fn node(&self, handle: NodeHandle) -> &MapNode {
        &self.nodes[handle.0]
    }

    pub fn edge(&self, handle: EdgeHandle) -> &MapEdge {
        &self.edges[handle.0]
    }

    /// Resolve a string id to its handle.
    pub fn node_by_id(&self, id: &str) -> Option<NodeHandle> {
        self.node_index.get(id).copied().map(NodeHandle)
    }

    /// Iterate nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeHandle, &MapNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeHandle(i), n))
    }

    /// Iterate edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeHandle, &MapEdge)> {
        self.edges.iter().enumerate().map(|(i, e)| (EdgeHandle(i), e))
    }

    // ── id generation ────────────────────────────────────────────────────

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Advance the id counter past any numeric suffix in `id`, so ids
    /// re-ingested from a persisted document can never collide with
    /// freshly generated ones.
    pub(crate) fn bump_seq_from_id(&mut self, id: &str) {
        if let Some(tail) = id.rsplit('_').next()
            && let Ok(seq) = tail.parse::<u64>()
        {
            self.next_seq = self.next_seq.max(seq + 1);
        }
    }

    // ── insertion ────────────────────────────────────────────────────────

    /// Append a node, returning [`MapError::CapacityExceeded`] when the
    /// node arena is full.
    pub fn insert_node(
        &mut self,
        lat: f64,
        lng: f64,
        kind: impl Into<String>,
        is_obstacle: bool,
    ) -> Result<NodeHandle, MapError> {
        let id = format!("n_{}", self.next_seq());
        self.push_node(id, lat, lng, kind.into(), is_obstacle)
    }

    /// Append a landmark node whose id embeds `name` for human-readable
    /// lookup (`"pharmacy_n_12"`).  Landmarks are deliberately never
    /// merged with earlier landmarks at the same spot: names are meant
    /// to stay distinct.
    pub fn insert_named_node(
        &mut self,
        name: &str,
        lat: f64,
        lng: f64,
        kind: impl Into<String>,
    ) -> Result<NodeHandle, MapError> {
        let id = format!("{}_n_{}", name, self.next_seq());
        self.push_node(id, lat, lng, kind.into(), false)
    }

    fn push_node(
        &mut self,
        id: String,
        lat: f64,
        lng: f64,
        kind: String,
        is_obstacle: bool,
    ) -> Result<NodeHandle, MapError> {
        if self.nodes.len() >= self.node_capacity {
            return Err(MapError::CapacityExceeded {
                section: Section::Nodes,
                limit: self.node_capacity,
            });
        }
        let index = self.nodes.len();
        self.node_index.insert(id.clone(), index);
        self.nodes.push(MapNode {
            id,
            lat,
            lng,
            kind,
            is_obstacle,
            last_seen: Instant::now(),
            visit_count: 1,
        });
        Ok(NodeHandle(index))
    }

    /// Record a fresh observation of an existing node: refresh
    /// `last_seen` and bump `visit_count`.
    pub fn touch_node(&mut self, handle: NodeHandle) {
        let node = &mut self.nodes[handle.0];
        node.last_seen = Instant::now();
        node.visit_count += 1;
    }

    /// Overwrite a node's classification tag (most recent wins).
    pub fn retag_node(&mut self, handle: NodeHandle, kind: impl Into<String>) {
        self.nodes[handle.0].kind = kind.into();
    }

    // ── edges ────────────────────────────────────────────────────────────

    /// Find the edge connecting the unordered pair `{a, b}`, if any.
    pub fn find_edge_between(&self, a: NodeHandle, b: NodeHandle) -> Option<EdgeHandle> {
        self.edges
            .iter()
            .position(|e| e.connects(a, b))
            .map(EdgeHandle)
    }

    /// Record a traversal between two nodes.
    ///
    /// If an edge already connects the unordered pair, its `last_traversed`
    /// and `traverse_count` are updated and the existing handle returned;
    /// otherwise a new edge with the given static weight is created,
    /// subject to the edge capacity.
    pub fn insert_or_merge_edge(
        &mut self,
        a: NodeHandle,
        b: NodeHandle,
        weight_m: f64,
    ) -> Result<EdgeHandle, MapError> {
        if a == b {
            return Err(MapError::SelfLoop);
        }
        if let Some(existing) = self.find_edge_between(a, b) {
            let edge = &mut self.edges[existing.0];
            edge.last_traversed = Instant::now();
            edge.traverse_count += 1;
            return Ok(existing);
        }
        if self.edges.len() >= self.edge_capacity {
            return Err(MapError::CapacityExceeded {
                section: Section::Edges,
                limit: self.edge_capacity,
            });
        }
        let index = self.edges.len();
        let id = format!("e_{}", self.next_seq());
        self.edges.push(MapEdge {
            id,
            source: a,
            target: b,
            weight_m,
            last_traversed: Instant::now(),
            traverse_count: 1,
        });
        Ok(EdgeHandle(index))
    }

    // ── spatial queries ──────────────────────────────────────────────────

    /// Nearest node to `(lat, lng)` within `max_distance_m`, or `None`.
    ///
    /// Ties resolve to the first-inserted node (stable scan order).
    pub fn nearest_node(&self, lat: f64, lng: f64, max_distance_m: f64) -> Option<NodeHandle> {
        let mut best: Option<(usize, f64)> = None;
        for (i, node) in self.nodes.iter().enumerate() {
            let dist = distance_m(lat, lng, node.lat, node.lng);
            if dist <= max_distance_m && best.is_none_or(|(_, d)| dist < d) {
                best = Some((i, dist));
            }
        }
        best.map(|(i, _)| NodeHandle(i))
    }

    /// True when any obstacle-flagged node lies within `radius_m`
    /// (inclusive boundary).
    pub fn is_obstacle_nearby(&self, lat: f64, lng: f64, radius_m: f64) -> bool {
        self.nodes
            .iter()
            .filter(|n| n.is_obstacle)
            .any(|n| distance_m(lat, lng, n.lat, n.lng) <= radius_m)
    }

    /// Majority-vote classification of the area around `(lat, lng)`.
    ///
    /// Counts nodes of each coarse kind bucket within `radius_m` and
    /// returns the strict maximum.  The scan order over buckets encodes
    /// the tie-break priority.
    pub fn area_type(&self, lat: f64, lng: f64, radius_m: f64) -> AreaType {
        // Buckets in priority order: path, door, room, street, other.
        let mut counts = [0u32; 5];
        for node in &self.nodes {
            if distance_m(lat, lng, node.lat, node.lng) > radius_m {
                continue;
            }
            let bucket = match node.kind.as_str() {
                "path" => 0,
                "door" => 1,
                "room" => 2,
                "street" => 3,
                _ => 4,
            };
            counts[bucket] += 1;
        }

        let mut winner = None;
        let mut max = 0u32;
        for (bucket, &count) in counts.iter().enumerate() {
            // Strict `>` keeps the earliest (highest-priority) bucket on
            // ties.
            if count > max {
                max = count;
                winner = Some(bucket);
            }
        }

        match winner {
            Some(0) => AreaType::Path,
            Some(1) => AreaType::Door,
            Some(2) => AreaType::Room,
            Some(3) => AreaType::Street,
            Some(_) => AreaType::Other,
            None => AreaType::Unknown,
        }
    }

    // ── wholesale replacement ────────────────────────────────────────────

    /// Empty both arenas and the id table.
    ///
    /// The id counter keeps counting: ids are never reused, even across
    /// a clear.  Deleting the durable copy is the persistence layer's
    /// job (see [`clear_map`][crate::persist::clear_map]).
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.node_index.clear();
    }

    /// Replace the entire contents with pre-validated collections
    /// (document load).  The caller guarantees edges reference valid
    /// indices and both vectors respect the capacities.
    pub(crate) fn replace_contents(&mut self, nodes: Vec<MapNode>, edges: Vec<MapEdge>) {
        debug_assert!(nodes.len() <= self.node_capacity);
        debug_assert!(edges.len() <= self.edge_capacity);
        self.node_index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        for node in &nodes {
            self.bump_seq_from_id(&node.id);
        }
        for edge in &edges {
            self.bump_seq_from_id(&edge.id);
        }
        self.nodes = nodes;
        self.edges = edges;
    }
}

impl Default for SpatialGraph {
    fn default() -> Self {
        Self::new()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // Roughly 1 m of latitude in degrees.
    const LAT_METRE: f64 = 1.0 / 111_195.0;

    // ── insertion and identity ───────────────────────────────────────────────

    #[test]
    fn insert_assigns_unique_monotonic_ids() {
        let mut g = SpatialGraph::new();
        let a = g.insert_node(0.0, 0.0, "path", false).unwrap();
        let b = g.insert_node(1.0, 1.0, "path", false).unwrap();
        assert_ne!(g.node(a).id, g.node(b).id);
        assert_eq!(g.node(a).id, "n_0");
        assert_eq!(g.node(b).id, "n_1");
        assert_eq!(g.node_count(), 2);
    }

    #[test]
    fn named_node_embeds_name_in_id() {
        let mut g = SpatialGraph::new();
        let h = g.insert_named_node("pharmacy", 0.0, 0.0, "shop").unwrap();
        assert!(g.node(h).id.starts_with("pharmacy_n_"));
        assert!(!g.node(h).is_obstacle);
    }

    #[test]
    fn node_by_id_resolves_handle() {
        let mut g = SpatialGraph::new();
        let h = g.insert_node(0.0, 0.0, "path", false).unwrap();
        let id = g.node(h).id.clone();
        assert_eq!(g.node_by_id(&id), Some(h));
        assert_eq!(g.node_by_id("n_999"), None);
    }

    #[test]
    fn node_capacity_ceiling() {
        let mut g = SpatialGraph::with_capacity(3, 10);
        for _ in 0..3 {
            g.insert_node(0.0, 0.0, "path", false).unwrap();
        }
        let err = g.insert_node(0.0, 0.0, "path", false).unwrap_err();
        assert!(matches!(
            err,
            MapError::CapacityExceeded {
                section: Section::Nodes,
                limit: 3
            }
        ));
        assert_eq!(g.node_count(), 3);
    }

    #[test]
    fn ids_not_reused_after_clear() {
        let mut g = SpatialGraph::new();
        let a = g.insert_node(0.0, 0.0, "path", false).unwrap();
        let first_id = g.node(a).id.clone();
        g.clear();
        let b = g.insert_node(0.0, 0.0, "path", false).unwrap();
        assert_ne!(g.node(b).id, first_id);
    }

    #[test]
    fn touch_bumps_visit_count_and_retag_overwrites_kind() {
        let mut g = SpatialGraph::new();
        let h = g.insert_node(0.0, 0.0, "chair", true).unwrap();
        g.touch_node(h);
        g.touch_node(h);
        g.retag_node(h, "table");
        assert_eq!(g.node(h).visit_count, 3);
        assert_eq!(g.node(h).kind, "table");
    }

    // ── edges ────────────────────────────────────────────────────────────────

    #[test]
    fn edge_dedup_is_symmetric() {
        let mut g = SpatialGraph::new();
        let a = g.insert_node(0.0, 0.0, "path", false).unwrap();
        let b = g.insert_node(0.001, 0.0, "path", false).unwrap();

        let e1 = g.insert_or_merge_edge(a, b, 111.0).unwrap();
        let e2 = g.insert_or_merge_edge(b, a, 111.0).unwrap();
        assert_eq!(e1, e2);
        assert_eq!(g.edge_count(), 1);
        // traverse_count reflects the sum of both calls.
        assert_eq!(g.edge(e1).traverse_count, 2);
    }

    #[test]
    fn edge_weight_is_static_on_merge() {
        let mut g = SpatialGraph::new();
        let a = g.insert_node(0.0, 0.0, "path", false).unwrap();
        let b = g.insert_node(0.001, 0.0, "path", false).unwrap();
        let e = g.insert_or_merge_edge(a, b, 111.0).unwrap();
        g.insert_or_merge_edge(a, b, 999.0).unwrap();
        assert_eq!(g.edge(e).weight_m, 111.0);
    }

    #[test]
    fn self_loop_rejected() {
        let mut g = SpatialGraph::new();
        let a = g.insert_node(0.0, 0.0, "path", false).unwrap();
        assert_eq!(g.insert_or_merge_edge(a, a, 0.0), Err(MapError::SelfLoop));
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn edge_capacity_ceiling() {
        let mut g = SpatialGraph::with_capacity(10, 1);
        let a = g.insert_node(0.0, 0.0, "path", false).unwrap();
        let b = g.insert_node(0.001, 0.0, "path", false).unwrap();
        let c = g.insert_node(0.002, 0.0, "path", false).unwrap();

        g.insert_or_merge_edge(a, b, 1.0).unwrap();
        let err = g.insert_or_merge_edge(b, c, 1.0).unwrap_err();
        assert!(matches!(
            err,
            MapError::CapacityExceeded {
                section: Section::Edges,
                ..
            }
        ));
        // Merging into the existing edge still works at capacity.
        g.insert_or_merge_edge(a, b, 1.0).unwrap();
        assert_eq!(g.edge_count(), 1);
    }

    // ── nearest_node ─────────────────────────────────────────────────────────

    #[test]
    fn nearest_node_picks_minimum_distance() {
        let mut g = SpatialGraph::new();
        let far = g.insert_node(0.0, 0.0, "path", false).unwrap();
        let near = g
            .insert_node(10.0 * LAT_METRE, 0.0, "path", false)
            .unwrap();
        let found = g.nearest_node(11.0 * LAT_METRE, 0.0, 50.0).unwrap();
        assert_eq!(found, near);
        assert_ne!(found, far);
    }

    #[test]
    fn nearest_node_respects_max_distance() {
        let mut g = SpatialGraph::new();
        g.insert_node(0.0, 0.0, "path", false).unwrap();
        assert!(g.nearest_node(100.0 * LAT_METRE, 0.0, 5.0).is_none());
    }

    #[test]
    fn nearest_node_breaks_ties_by_insertion_order() {
        let mut g = SpatialGraph::new();
        let first = g.insert_node(LAT_METRE, 0.0, "path", false).unwrap();
        let _second = g.insert_node(-LAT_METRE, 0.0, "path", false).unwrap();
        // Query point is equidistant from both.
        assert_eq!(g.nearest_node(0.0, 0.0, 5.0), Some(first));
    }

    // ── is_obstacle_nearby ───────────────────────────────────────────────────

    #[test]
    fn obstacle_boundary_is_inclusive() {
        let mut g = SpatialGraph::new();
        g.insert_node(0.0, 0.0, "wall", true).unwrap();
        let dist = distance_m(0.0, 0.0, 100.0 * LAT_METRE, 0.0);

        assert!(g.is_obstacle_nearby(100.0 * LAT_METRE, 0.0, dist));
        assert!(!g.is_obstacle_nearby(100.0 * LAT_METRE, 0.0, dist - 0.01));
    }

    #[test]
    fn non_obstacle_nodes_do_not_count() {
        let mut g = SpatialGraph::new();
        g.insert_node(0.0, 0.0, "path", false).unwrap();
        assert!(!g.is_obstacle_nearby(0.0, 0.0, 100.0));
    }

    // ── area_type ────────────────────────────────────────────────────────────

    #[test]
    fn area_majority_vote() {
        let mut g = SpatialGraph::new();
        g.insert_node(0.0, 0.0, "path", false).unwrap();
        g.insert_node(LAT_METRE, 0.0, "path", false).unwrap();
        g.insert_node(2.0 * LAT_METRE, 0.0, "door", false).unwrap();
        assert_eq!(g.area_type(0.0, 0.0, 50.0), AreaType::Path);
    }

    #[test]
    fn area_tie_breaks_by_priority() {
        let mut g = SpatialGraph::new();
        g.insert_node(0.0, 0.0, "door", false).unwrap();
        g.insert_node(LAT_METRE, 0.0, "room", false).unwrap();
        // One of each: door outranks room.
        assert_eq!(g.area_type(0.0, 0.0, 50.0), AreaType::Door);
    }

    #[test]
    fn area_unknown_when_nothing_in_range() {
        let mut g = SpatialGraph::new();
        g.insert_node(1.0, 1.0, "path", false).unwrap();
        assert_eq!(g.area_type(0.0, 0.0, 5.0), AreaType::Unknown);
    }

    #[test]
    fn area_other_for_unbucketed_kinds() {
        let mut g = SpatialGraph::new();
        g.insert_node(0.0, 0.0, "wall", true).unwrap();
        g.insert_node(LAT_METRE, 0.0, "bench", false).unwrap();
        assert_eq!(g.area_type(0.0, 0.0, 50.0), AreaType::Other);
    }

    #[test]
    fn area_radius_is_inclusive() {
        let mut g = SpatialGraph::new();
        g.insert_node(100.0 * LAT_METRE, 0.0, "street", false).unwrap();
        let dist = distance_m(0.0, 0.0, 100.0 * LAT_METRE, 0.0);
        assert_eq!(g.area_type(0.0, 0.0, dist), AreaType::Street);
    }

    // ── clear ────────────────────────────────────────────────────────────────

    #[test]
    fn clear_empties_everything() {
        let mut g = SpatialGraph::new();
        let a = g.insert_node(0.0, 0.0, "path", false).unwrap();
        let b = g.insert_node(0.001, 0.0, "path", false).unwrap();
        g.insert_or_merge_edge(a, b, 1.0).unwrap();
        let old_id = g.node(a).id.clone();

        g.clear();
        assert_eq!(g.node_count(), 0);
        assert_eq!(g.edge_count(), 0);
        assert!(g.node_by_id(&old_id).is_none());
    }
}
