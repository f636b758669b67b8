//! `pathsense-map` – The Spatial Memory.
//!
//! Builds and keeps the cane's incremental map of traversed space: a
//! bounded graph of places and obstacles, grown one position fix at a
//! time, persisted between sessions, and queryable for routes and
//! situational context.
//!
//! # Modules
//!
//! - [`graph`] – [`SpatialGraph`][graph::SpatialGraph]: the bounded
//!   node/edge store with proximity queries, area classification, and
//!   undirected edge deduplication.
//! - [`tracker`] – [`PositionTracker`][tracker::PositionTracker]: turns
//!   a stream of fixes into map growth, coalescing nearby fixes and
//!   linking consecutive places.
//! - [`obstacles`] – obstacle and landmark registration on top of the
//!   graph store.
//! - [`route`] – [`RoutePlanner`][route::RoutePlanner]: Dijkstra
//!   shortest paths over the non-obstacle subgraph, with endpoint
//!   snapping and node-by-node replay.
//! - [`persist`] – the [`MapDocument`][persist::MapDocument] snapshot
//!   format plus JSON-file and SQLite [`MapStorage`][persist::MapStorage]
//!   backends.

pub mod graph;
pub mod obstacles;
pub mod persist;
pub mod route;
pub mod tracker;

pub use graph::{AreaType, MapError, SpatialGraph, MAX_EDGES, MAX_NODES};
pub use persist::{
    clear_map, load_map, save_map, JsonFileStorage, MapDocument, MapStorage, SqliteStorage,
    StorageError,
};
pub use route::{RouteError, RoutePlanner, DEFAULT_SNAP_RADIUS_M};
pub use tracker::{PositionTracker, TrackOutcome, PROXIMITY_THRESHOLD_M};
