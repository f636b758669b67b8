//! Obstacle and landmark registration.
//!
//! Obstacles coalesce: a report within [`PROXIMITY_THRESHOLD_M`] of an
//! existing obstacle node refreshes that node and overwrites its kind
//! (the most recent classification wins).  Landmarks never coalesce: two
//! landmarks named at the same corner are two distinct nodes, because
//! their names are the point.

use tracing::warn;

use crate::graph::{NodeHandle, SpatialGraph};
use crate::tracker::PROXIMITY_THRESHOLD_M;

/// Record a classified obstacle at `(lat, lng)`.
///
/// Merges into a nearby obstacle node when one exists; otherwise inserts
/// a new obstacle-flagged node.  Returns `None` when the store is full
/// (logged, not fatal).
pub fn report_obstacle(
    graph: &mut SpatialGraph,
    lat: f64,
    lng: f64,
    kind: impl Into<String>,
) -> Option<NodeHandle> {
    if let Some(found) = graph.nearest_node(lat, lng, PROXIMITY_THRESHOLD_M)
        && graph.node(found).is_obstacle
    {
        graph.touch_node(found);
        graph.retag_node(found, kind);
        return Some(found);
    }
    match graph.insert_node(lat, lng, kind, true) {
        Ok(handle) => Some(handle),
        Err(err) => {
            warn!(error = %err, "could not record obstacle");
            None
        }
    }
}

/// Record a named landmark at `(lat, lng)`.
///
/// Always inserts; the name ends up embedded in the node id.  Returns
/// `None` when the store is full.
pub fn report_landmark(
    graph: &mut SpatialGraph,
    lat: f64,
    lng: f64,
    kind: impl Into<String>,
    name: &str,
) -> Option<NodeHandle> {
    match graph.insert_named_node(name, lat, lng, kind) {
        Ok(handle) => Some(handle),
        Err(err) => {
            warn!(error = %err, name, "could not record landmark");
            None
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
