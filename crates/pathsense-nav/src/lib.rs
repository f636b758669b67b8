//! `pathsense-nav` – The Guidance Layer.
//!
//! Named destinations and the turn-by-turn instructions that lead to
//! them.
//!
//! # Modules
//!
//! - [`waypoints`] – [`WaypointStore`][waypoints::WaypointStore]: a
//!   bounded, case-insensitive collection of user-named destinations.
//! - [`guidance`] – [`GuidanceEngine`][guidance::GuidanceEngine]:
//!   per-fix distance and relative-direction tracking with throttled
//!   spoken-style instructions.

pub mod guidance;
pub mod waypoints;

pub use guidance::{Destination, GuidanceEngine, ARRIVAL_THRESHOLD_M, REANNOUNCE_DEG};
pub use waypoints::{Waypoint, WaypointStore, MAX_WAYPOINTS};
