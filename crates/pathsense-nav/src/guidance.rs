//! Turn-by-turn guidance engine.
//!
//! Tracks a single destination and, from each position fix, derives the
//! distance remaining and the relative direction (degrees off the
//! current heading, positive to the right).  A spoken-style instruction
//! is offered only when the direction changes by more than
//! [`REANNOUNCE_DEG`] since the last announcement, so the user is not
//! chattered at while walking a straight line.
//!
//! Arrival is declared inside [`ARRIVAL_THRESHOLD_M`], which also stops
//! navigation.

use tracing::info;

use pathsense_geo::{bearing_deg, distance_m, normalize_relative_deg};

/// Within this distance of the destination, navigation declares arrival.
pub const ARRIVAL_THRESHOLD_M: f64 = 10.0;

/// Direction must swing by more than this many degrees before a new
/// instruction is announced.
pub const REANNOUNCE_DEG: i32 = 30;

/// The destination currently navigated towards.
#[derive(Debug, Clone, PartialEq)]
pub struct Destination {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

/// Stateful turn-by-turn guidance towards one destination at a time.
#[derive(Debug, Default)]
pub struct GuidanceEngine {
    destination: Option<Destination>,
    active: bool,
    distance_m: f64,
    /// Degrees off the current heading, rounded; positive is right.
    relative_direction: i32,
    /// Direction at the last announcement.  `None` forces the first
    /// instruction after navigation starts.
    last_announced: Option<i32>,
    instruction_pending: bool,
    reached: bool,
}

impl GuidanceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    pub fn relative_direction(&self) -> i32 {
        self.relative_direction
    }

    pub fn destination_reached(&self) -> bool {
        self.reached
    }

    /// Begin navigating towards a destination.  Resets announcement
    /// state so the first fix produces an instruction.
    pub fn start(&mut self, name: impl Into<String>, lat: f64, lng: f64) {
        let name = name.into();
        info!(destination = %name, "navigation started");
        self.destination = Some(Destination { name, lat, lng });
        self.active = true;
        self.reached = false;
        self.last_announced = None;
        self.instruction_pending = false;
    }

    /// Stop navigating without clearing the destination.
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Feed one position fix (with the current compass heading in
    /// degrees).  No-op while navigation is inactive.
    pub fn update(&mut self, lat: f64, lng: f64, heading_deg: f64) {
        if !self.active {
            return;
        }
        let Some(dest) = &self.destination else {
            return;
        };

        self.distance_m = distance_m(lat, lng, dest.lat, dest.lng);
        if self.distance_m < ARRIVAL_THRESHOLD_M {
            info!(destination = %dest.name, "destination reached");
            self.reached = true;
            self.active = false;
            self.instruction_pending = true;
            return;
        }

        let bearing = bearing_deg(lat, lng, dest.lat, dest.lng);
        self.relative_direction =
            normalize_relative_deg(bearing - heading_deg).round() as i32;

        let changed = match self.last_announced {
            None => true,
            Some(last) => (self.relative_direction - last).abs() > REANNOUNCE_DEG,
        };
        if changed {
            self.instruction_pending = true;
            self.last_announced = Some(self.relative_direction);
        }
    }

    /// Take the pending instruction, if any.  Consuming it clears the
    /// pending flag until the direction swings again.
    pub fn take_instruction(&mut self) -> Option<String> {
        if !self.instruction_pending {
            return None;
        }
        self.instruction_pending = false;
        let dest = self.destination.as_ref()?;

        if self.reached {
            return Some(format!("You have arrived at {}", dest.name));
        }

        let turn = turn_phrase(self.relative_direction);
        let distance = distance_phrase(self.distance_m);
        Some(format!("{turn}, {distance} to {}", dest.name))
    }
}

/// Spoken turn phrase for a relative direction in degrees.
fn turn_phrase(direction: i32) -> &'static str {
    match direction {
        -15..=15 => "Continue straight",
        16..=45 => "Slight right",
        46..=135 => "Turn right",
        -45..=-16 => "Slight left",
        -135..=-46 => "Turn left",
        _ => "Turn around",
    }
}

/// Spoken distance: whole metres under 100 m, otherwise kilometres with
/// one decimal.
fn distance_phrase(distance_m: f64) -> String {
    if distance_m < 100.0 {
        format!("{} meters", distance_m as i64)
    } else {
        format!("{:.1} kilometers", distance_m / 1000.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const LAT_METRE: f64 = 1.0 / 111_195.0;

    // ── phrase tables ────────────────────────────────────────────────────────

    #[test]
    fn turn_phrases_cover_the_circle() {
        assert_eq!(turn_phrase(0), "Continue straight");
        assert_eq!(turn_phrase(15), "Continue straight");
        assert_eq!(turn_phrase(-15), "Continue straight");
        assert_eq!(turn_phrase(16), "Slight right");
        assert_eq!(turn_phrase(45), "Slight right");
        assert_eq!(turn_phrase(90), "Turn right");
        assert_eq!(turn_phrase(135), "Turn right");
        assert_eq!(turn_phrase(136), "Turn around");
        assert_eq!(turn_phrase(180), "Turn around");
        assert_eq!(turn_phrase(-16), "Slight left");
        assert_eq!(turn_phrase(-90), "Turn left");
        assert_eq!(turn_phrase(-136), "Turn around");
    }

    #[test]
    fn distance_switches_to_kilometers_at_100_m() {
        assert_eq!(distance_phrase(42.7), "42 meters");
        assert_eq!(distance_phrase(99.9), "99 meters");
        assert_eq!(distance_phrase(100.0), "0.1 kilometers");
        assert_eq!(distance_phrase(1234.0), "1.2 kilometers");
    }

    // ── engine ───────────────────────────────────────────────────────────────

    #[test]
    fn first_update_announces_an_instruction() {
        let mut engine = GuidanceEngine::new();
        // Destination 500 m due north.
        engine.start("home", 500.0 * LAT_METRE, 0.0);
        engine.update(0.0, 0.0, 0.0);

        let instruction = engine.take_instruction().unwrap();
        assert_eq!(instruction, "Continue straight, 0.5 kilometers to home");
        // Consumed; nothing pending until the direction swings.
        assert!(engine.take_instruction().is_none());
    }

    #[test]
    fn small_direction_changes_stay_quiet() {
        let mut engine = GuidanceEngine::new();
        engine.start("home", 500.0 * LAT_METRE, 0.0);
        engine.update(0.0, 0.0, 0.0);
        engine.take_instruction();

        // Heading drifts 20°: under the re-announcement threshold.
        engine.update(0.0, 0.0, 20.0);
        assert!(engine.take_instruction().is_none());

        // A 40° swing from the last announcement speaks up.
        engine.update(0.0, 0.0, 40.0);
        let instruction = engine.take_instruction().unwrap();
        assert!(instruction.starts_with("Slight left"));
    }

    #[test]
    fn direction_is_relative_to_heading() {
        let mut engine = GuidanceEngine::new();
        engine.start("home", 500.0 * LAT_METRE, 0.0);
        // Facing east, destination north: 90° to the left.
        engine.update(0.0, 0.0, 90.0);
        assert_eq!(engine.relative_direction(), -90);
        assert!(engine.take_instruction().unwrap().starts_with("Turn left"));
    }

    #[test]
    fn arrival_inside_threshold_stops_navigation() {
        let mut engine = GuidanceEngine::new();
        engine.start("home", 5.0 * LAT_METRE, 0.0);
        engine.update(0.0, 0.0, 0.0);

        assert!(engine.destination_reached());
        assert!(!engine.is_active());
        assert_eq!(
            engine.take_instruction().unwrap(),
            "You have arrived at home"
        );
    }

    #[test]
    fn updates_are_ignored_while_inactive() {
        let mut engine = GuidanceEngine::new();
        engine.update(0.0, 0.0, 0.0);
        assert!(engine.take_instruction().is_none());

        engine.start("home", 500.0 * LAT_METRE, 0.0);
        engine.stop();
        engine.update(0.0, 0.0, 0.0);
        assert!(engine.take_instruction().is_none());
    }

    #[test]
    fn restarting_forces_a_fresh_announcement() {
        let mut engine = GuidanceEngine::new();
        engine.start("home", 500.0 * LAT_METRE, 0.0);
        engine.update(0.0, 0.0, 0.0);
        engine.take_instruction();

        engine.start("work", 500.0 * LAT_METRE, 0.0);
        engine.update(0.0, 0.0, 0.0);
        assert!(engine.take_instruction().is_some());
    }
}
