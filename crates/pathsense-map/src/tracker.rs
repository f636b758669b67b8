//! Incremental Position Tracker.
//!
//! Feeds position fixes into the [`SpatialGraph`] one at a time and
//! maintains the single piece of traversal state the map builder needs:
//! which node the cane is currently at.  Every fix becomes exactly one of
//! five outcomes (see [`TrackOutcome`]), and consecutive distinct nodes
//! are linked by an undirected edge so the traversable topology grows as
//! a side effect of walking.
//!
//! Coalescing radius: a fix within [`PROXIMITY_THRESHOLD_M`] of the
//! current node is treated as standing still; a fix within the same
//! radius of any *other* node snaps to that node instead of minting a
//! duplicate.

use tracing::warn;

use pathsense_types::Fix;

use crate::graph::{EdgeHandle, NodeHandle, SpatialGraph};

/// Fixes closer than this to an existing node merge into it instead of
/// creating a new one.
pub const PROXIMITY_THRESHOLD_M: f64 = 5.0;

/// What a single fix did to the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    /// The map was empty; this fix seeded the first node.
    FirstNode(NodeHandle),
    /// The fix stayed within the coalescing radius of the current node.
    Revisit(NodeHandle),
    /// The fix snapped to a different existing node; `edge` is the link
    /// from the previous node, `None` if linking failed or the nodes
    /// were the same.
    Merged {
        node: NodeHandle,
        edge: Option<EdgeHandle>,
    },
    /// A new node was created and (best-effort) linked to the previous one.
    NewNode {
        node: NodeHandle,
        edge: Option<EdgeHandle>,
    },
    /// Nothing was recorded, typically because the node store is full.
    Skipped,
}

/// Tracks the cane's current node across a stream of fixes.
///
/// Holds no graph data itself; it only remembers where in the graph the
/// cane last was.  Invalidated by [`SpatialGraph::clear`] or a document
/// load, after which the caller must [`reset`][PositionTracker::reset].
#[derive(Debug, Default)]
pub struct PositionTracker {
    current: Option<NodeHandle>,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The node the cane is currently at, if tracking has started.
    pub fn current(&self) -> Option<NodeHandle> {
        self.current
    }

    pub fn is_tracking(&self) -> bool {
        self.current.is_some()
    }

    /// Forget the current node.  Required after the graph is cleared or
    /// reloaded, since handles do not survive either.
    pub fn reset(&mut self) {
        self.current = None;
    }

    /// Ingest one position fix.
    ///
    /// Capacity errors are degraded operation, not faults: they are
    /// logged and reported as [`TrackOutcome::Skipped`], and the tracker
    /// keeps its previous state so a later successful fix can resume.
    pub fn update(&mut self, graph: &mut SpatialGraph, fix: &Fix) -> TrackOutcome {
        let Some(current) = self.current else {
            return match graph.insert_node(fix.lat, fix.lng, "path", false) {
                Ok(handle) => {
                    self.current = Some(handle);
                    TrackOutcome::FirstNode(handle)
                }
                Err(err) => {
                    warn!(error = %err, "could not seed first map node");
                    TrackOutcome::Skipped
                }
            };
        };

        let here = graph.node(current);
        if pathsense_geo::distance_m(fix.lat, fix.lng, here.lat, here.lng)
            <= PROXIMITY_THRESHOLD_M
        {
            graph.touch_node(current);
            return TrackOutcome::Revisit(current);
        }

        // Moved away from the current node: snap to a nearby existing
        // node before considering a new one.
        if let Some(found) = graph.nearest_node(fix.lat, fix.lng, PROXIMITY_THRESHOLD_M) {
            graph.touch_node(found);
            let edge = if found != current {
                self.link(graph, current, found)
            } else {
                None
            };
            self.current = Some(found);
            return TrackOutcome::Merged { node: found, edge };
        }

        match graph.insert_node(fix.lat, fix.lng, "path", false) {
            Ok(node) => {
                let edge = self.link(graph, current, node);
                self.current = Some(node);
                TrackOutcome::NewNode { node, edge }
            }
            Err(err) => {
                warn!(error = %err, "could not record new map node");
                TrackOutcome::Skipped
            }
        }
    }

    /// Best-effort edge between consecutive nodes.  The weight is the
    /// distance between the node positions, not the raw fix, so repeated
    /// traversals agree on it.
    fn link(
        &self,
        graph: &mut SpatialGraph,
        from: NodeHandle,
        to: NodeHandle,
    ) -> Option<EdgeHandle> {
        let a = graph.node(from);
        let b = graph.node(to);
        let weight = pathsense_geo::distance_m(a.lat, a.lng, b.lat, b.lng);
        match graph.insert_or_merge_edge(from, to, weight) {
            Ok(edge) => Some(edge),
            Err(err) => {
                warn!(error = %err, "could not link consecutive map nodes");
                None
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
