//! Named waypoint store.
//!
//! A small, bounded list of user-named destinations ("home", "work",
//! "pharmacy").  Names are the keys, matched case-insensitively, and
//! setting an existing name moves the waypoint instead of duplicating
//! it.  Bounded at [`MAX_WAYPOINTS`]; a full store refuses new names
//! rather than evicting old ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of stored waypoints.
pub const MAX_WAYPOINTS: usize = 30;

/// A user-named destination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Waypoint {
    pub name: String,
    /// Free-form category, e.g. `"home"`, `"shop"`, `"transit"`.
    pub kind: String,
    pub lat: f64,
    pub lng: f64,
    /// When the waypoint was last set or moved.
    pub timestamp: DateTime<Utc>,
}

/// Bounded, order-preserving collection of waypoints keyed by name.
#[derive(Debug, Default)]
pub struct WaypointStore {
    waypoints: Vec<Waypoint>,
}

impl WaypointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Create or move a waypoint.  Matching an existing name
    /// (case-insensitively) updates it in place, keeping its position in
    /// the list; otherwise a new entry is appended.  Returns `false`
    /// only when the name is new and the store is full.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        kind: impl Into<String>,
        lat: f64,
        lng: f64,
    ) -> bool {
        let name = name.into();
        let kind = kind.into();
        if let Some(existing) = self
            .waypoints
            .iter_mut()
            .find(|w| w.name.eq_ignore_ascii_case(&name))
        {
            existing.lat = lat;
            existing.lng = lng;
            existing.kind = kind;
            existing.timestamp = Utc::now();
            return true;
        }
        if self.waypoints.len() >= MAX_WAYPOINTS {
            return false;
        }
        self.waypoints.push(Waypoint {
            name,
            kind,
            lat,
            lng,
            timestamp: Utc::now(),
        });
        true
    }

    /// Look up a waypoint by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&Waypoint> {
        self.waypoints
            .iter()
            .find(|w| w.name.eq_ignore_ascii_case(name))
    }

    /// Waypoint at a list position, in insertion order.
    pub fn get_at(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    /// Remove a waypoint by name, preserving the order of the rest.
    /// Returns `false` when no such name exists.
    pub fn delete(&mut self, name: &str) -> bool {
        let before = self.waypoints.len();
        self.waypoints.retain(|w| !w.name.eq_ignore_ascii_case(name));
        self.waypoints.len() < before
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
