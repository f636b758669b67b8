//! Single-threaded control loop.
//!
//! One [`tick`][ControlLoop::tick] per cycle: read both range beams,
//! update the obstacle classifier, fold the position fix (when there is
//! one) into the spatial map, advance guidance, and periodically flush
//! the map to storage.  A danger reading additionally sweeps the lower
//! ranger sideways for an evasion suggestion.  Everything the tick
//! observed comes back in a [`TickReport`], alongside a [`DeviceEvent`]
//! stream for the presentation layer, so the caller decides how to
//! present it.
//!
//! Sensor faults and full map stores degrade the tick, they never abort
//! it: a faulted beam reads as open space, and a full map simply stops
//! growing.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use pathsense_map::persist::StorageError;
use pathsense_map::route::RouteError;
use pathsense_map::{
    obstacles, save_map, AreaType, MapStorage, PositionTracker, RoutePlanner, SpatialGraph,
    TrackOutcome,
};
use pathsense_nav::{GuidanceEngine, WaypointStore};
use pathsense_sense::{
    suggest_direction, Classification, ObstacleClassifier, RangeSensor, Steer, ThreatLevel,
    MAX_RANGE_CM,
};
use pathsense_types::{DeviceEvent, EventPayload, Fix, ObstacleReport};

/// Default interval between automatic map saves.
pub const DEFAULT_SAVE_INTERVAL: Duration = Duration::from_secs(600);

/// `source` stamped on every [`DeviceEvent`] this loop emits.
const EVENT_SOURCE: &str = "pathsense-runtime::control_loop";

/// Errors from control-loop commands (not from ticking, which never
/// fails).
#[derive(Error, Debug)]
pub enum ControlError {
    #[error("no position fix yet")]
    NoFix,

    #[error("no waypoint named '{0}'")]
    UnknownWaypoint(String),

    #[error("waypoint store is full")]
    WaypointsFull,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Tunables for [`ControlLoop`].
#[derive(Debug, Clone)]
pub struct ControlLoopConfig {
    pub save_interval: Duration,
    pub snap_radius_m: f64,
}

impl Default for ControlLoopConfig {
    fn default() -> Self {
        Self {
            save_interval: DEFAULT_SAVE_INTERVAL,
            snap_radius_m: pathsense_map::DEFAULT_SNAP_RADIUS_M,
        }
    }
}

/// Everything one tick observed.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub lower_cm: f32,
    pub upper_cm: f32,
    pub threat: ThreatLevel,
    /// Evasion suggestion from the danger-triggered side sweep;
    /// `None` on ticks that didn't sweep.
    pub steer: Option<Steer>,
    /// Classification recorded into the map this tick, if any.
    pub obstacle: Option<Classification>,
    /// What the fix did to the map; `None` when the tick had no fix.
    pub track: Option<TrackOutcome>,
    /// Guidance instruction ready to be spoken, if one became due.
    pub instruction: Option<String>,
    /// Whether this tick flushed the map to storage.
    pub saved: bool,
    /// Events for the presentation layer (speech, haptics, logging),
    /// in the order they occurred.
    pub events: Vec<DeviceEvent>,
}

/// Owns the full device state and drives it one tick at a time.
pub struct ControlLoop {
    graph: SpatialGraph,
    tracker: PositionTracker,
    classifier: ObstacleClassifier,
    guidance: GuidanceEngine,
    waypoints: WaypointStore,
    planner: RoutePlanner,
    lower: Box<dyn RangeSensor>,
    upper: Box<dyn RangeSensor>,
    storage: Box<dyn MapStorage>,
    save_interval: Duration,
    last_save: Instant,
    last_fix: Option<Fix>,
}

impl ControlLoop {
    /// Assemble the loop and restore any previously saved map.  A
    /// failed restore is logged and startup continues with an empty map.
    pub fn new(
        config: ControlLoopConfig,
        lower: Box<dyn RangeSensor>,
        upper: Box<dyn RangeSensor>,
        storage: Box<dyn MapStorage>,
    ) -> Self {
        let mut graph = SpatialGraph::new();
        match pathsense_map::load_map(&mut graph, storage.as_ref()) {
            Ok(true) => info!(
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                "map restored from storage"
            ),
            Ok(false) => info!("no stored map, starting fresh"),
            Err(err) => warn!(error = %err, "could not restore map, starting fresh"),
        }

        Self {
            graph,
            tracker: PositionTracker::new(),
            classifier: ObstacleClassifier::new(),
            guidance: GuidanceEngine::new(),
            waypoints: WaypointStore::new(),
            planner: RoutePlanner::with_snap_radius(config.snap_radius_m),
            lower,
            upper,
            storage,
            save_interval: config.save_interval,
            last_save: Instant::now(),
            last_fix: None,
        }
    }

    // ── the tick ─────────────────────────────────────────────────────────

    /// Run one control cycle.  `fix` is the freshest position, `None`
    /// when the receiver has nothing new.
    pub fn tick(&mut self, fix: Option<Fix>) -> TickReport {
        let mut events = Vec::new();

        let lower_cm = self.read_beam(BeamSlot::Lower, &mut events);
        let upper_cm = self.read_beam(BeamSlot::Upper, &mut events);

        self.classifier.update(lower_cm, upper_cm);
        let threat = ThreatLevel::assess(lower_cm, upper_cm);

        if let Some(fix) = fix {
            self.last_fix = Some(fix);
            events.push(DeviceEvent::new(
                EVENT_SOURCE,
                EventPayload::PositionFix(fix),
            ));
        }

        let mut obstacle = None;
        let mut steer = None;
        if threat == ThreatLevel::Danger {
            // The lower ranger rides a servo; on danger it sweeps left
            // then right to pick the clearer side.
            let left_cm = self.read_beam(BeamSlot::Lower, &mut events);
            let right_cm = self.read_beam(BeamSlot::Lower, &mut events);
            steer = Some(suggest_direction(left_cm, right_cm));

            // A dangerous reading with a known position becomes a mapped
            // obstacle, tagged with the classifier's best guess.
            if let Some(fix) = self.last_fix {
                let classification = self.classifier.classify();
                if obstacles::report_obstacle(
                    &mut self.graph,
                    fix.lat,
                    fix.lng,
                    classification.kind,
                )
                .is_some()
                {
                    obstacle = Some(classification);
                    events.push(DeviceEvent::new(
                        EVENT_SOURCE,
                        EventPayload::ObstacleDetected(ObstacleReport {
                            lat: fix.lat,
                            lng: fix.lng,
                            kind: classification.kind.to_string(),
                            confidence: classification.confidence,
                        }),
                    ));
                } else {
                    events.push(DeviceEvent::new(
                        EVENT_SOURCE,
                        EventPayload::Degraded {
                            component: "map".to_string(),
                            details: "node store full, obstacle not recorded".to_string(),
                        },
                    ));
                }
            }
        }

        let mut track = None;
        let mut instruction = None;
        if let Some(fix) = fix {
            let outcome = self.tracker.update(&mut self.graph, &fix);
            if matches!(outcome, TrackOutcome::Skipped) {
                events.push(DeviceEvent::new(
                    EVENT_SOURCE,
                    EventPayload::Degraded {
                        component: "map".to_string(),
                        details: "node store full, position not recorded".to_string(),
                    },
                ));
            }
            track = Some(outcome);
            self.guidance
                .update(fix.lat, fix.lng, fix.heading_deg.unwrap_or(0.0));
            instruction = self.guidance.take_instruction();
            if let Some(phrase) = &instruction {
                events.push(DeviceEvent::new(
                    EVENT_SOURCE,
                    EventPayload::Guidance(phrase.clone()),
                ));
            }
        }

        let saved = self.maybe_save(&mut events);

        TickReport {
            lower_cm,
            upper_cm,
            threat,
            steer,
            obstacle,
            track,
            instruction,
            saved,
            events,
        }
    }

    fn read_beam(&mut self, slot: BeamSlot, events: &mut Vec<DeviceEvent>) -> f32 {
        let sensor = match slot {
            BeamSlot::Lower => &mut self.lower,
            BeamSlot::Upper => &mut self.upper,
        };
        match sensor.read_cm() {
            Ok(reading) => reading,
            Err(err) => {
                warn!(sensor = sensor.id(), error = %err, "range sensor fault, assuming open space");
                events.push(DeviceEvent::new(
                    EVENT_SOURCE,
                    EventPayload::Degraded {
                        component: sensor.id().to_string(),
                        details: err.to_string(),
                    },
                ));
                MAX_RANGE_CM
            }
        }
    }

    fn maybe_save(&mut self, events: &mut Vec<DeviceEvent>) -> bool {
        if self.last_save.elapsed() < self.save_interval {
            return false;
        }
        self.last_save = Instant::now();
        match save_map(&self.graph, self.storage.as_ref()) {
            Ok(()) => {
                info!(nodes = self.graph.node_count(), "map saved");
                true
            }
            Err(err) => {
                warn!(error = %err, "periodic map save failed");
                events.push(DeviceEvent::new(
                    EVENT_SOURCE,
                    EventPayload::Degraded {
                        component: "storage".to_string(),
                        details: err.to_string(),
                    },
                ));
                false
            }
        }
    }

    // ── commands ─────────────────────────────────────────────────────────

    /// Flush the map to storage now, regardless of the interval.
    pub fn save_now(&mut self) -> Result<(), ControlError> {
        save_map(&self.graph, self.storage.as_ref())?;
        self.last_save = Instant::now();
        Ok(())
    }

    /// Wipe the map, in memory and in storage.  Tracking and routing
    /// state is dropped with it.
    pub fn clear_map(&mut self) -> Result<(), ControlError> {
        pathsense_map::clear_map(&mut self.graph, self.storage.as_ref())?;
        self.tracker.reset();
        self.planner.reset();
        info!("map cleared");
        Ok(())
    }

    /// Record a named landmark at the current position.
    pub fn mark_landmark(
        &mut self,
        name: &str,
        kind: impl Into<String>,
    ) -> Result<(), ControlError> {
        let fix = self.last_fix.ok_or(ControlError::NoFix)?;
        obstacles::report_landmark(&mut self.graph, fix.lat, fix.lng, kind, name);
        Ok(())
    }

    /// Save (or move) a waypoint at the current position.
    pub fn set_waypoint_here(
        &mut self,
        name: impl Into<String>,
        kind: impl Into<String>,
    ) -> Result<(), ControlError> {
        let fix = self.last_fix.ok_or(ControlError::NoFix)?;
        if self.waypoints.set(name, kind, fix.lat, fix.lng) {
            Ok(())
        } else {
            Err(ControlError::WaypointsFull)
        }
    }

    /// Start guidance towards a stored waypoint.
    pub fn navigate_to(&mut self, name: &str) -> Result<(), ControlError> {
        let waypoint = self
            .waypoints
            .get(name)
            .ok_or_else(|| ControlError::UnknownWaypoint(name.to_string()))?;
        let (wp_name, lat, lng) = (waypoint.name.clone(), waypoint.lat, waypoint.lng);
        self.guidance.start(wp_name, lat, lng);
        Ok(())
    }

    /// Plan a route from the current position to a stored waypoint,
    /// returning the planned node coordinates in order.
    pub fn plan_route_to(&mut self, name: &str) -> Result<Vec<(f64, f64)>, ControlError> {
        let fix = self.last_fix.ok_or(ControlError::NoFix)?;
        let waypoint = self
            .waypoints
            .get(name)
            .ok_or_else(|| ControlError::UnknownWaypoint(name.to_string()))?;
        let (lat, lng) = (waypoint.lat, waypoint.lng);
        let route = self
            .planner
            .find_path(&self.graph, fix.lat, fix.lng, lat, lng)?;
        Ok(route
            .iter()
            .map(|&h| {
                let node = self.graph.node(h);
                (node.lat, node.lng)
            })
            .collect())
    }

    /// Pop the next node of the planned route.
    pub fn next_route_node(&mut self) -> Option<(f64, f64)> {
        self.planner.next_node(&self.graph)
    }

    /// Coarse description of the surroundings at the current position.
    pub fn area_here(&self, radius_m: f64) -> Result<AreaType, ControlError> {
        let fix = self.last_fix.ok_or(ControlError::NoFix)?;
        Ok(self.graph.area_type(fix.lat, fix.lng, radius_m))
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn graph(&self) -> &SpatialGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SpatialGraph {
        &mut self.graph
    }

    pub fn waypoints(&self) -> &WaypointStore {
        &self.waypoints
    }

    pub fn guidance(&self) -> &GuidanceEngine {
        &self.guidance
    }

    pub fn last_fix(&self) -> Option<Fix> {
        self.last_fix
    }
}

#[derive(Clone, Copy)]
enum BeamSlot {
    Lower,
    Upper,
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pathsense_map::JsonFileStorage;
    use pathsense_sense::SimRangeSensor;
    use pathsense_types::CaneError;

    const LAT_METRE: f64 = 1.0 / 111_195.0;

    fn loop_with(
        dir: &tempfile::TempDir,
        lower: Vec<f32>,
        upper: Vec<f32>,
    ) -> ControlLoop {
        ControlLoop::new(
            ControlLoopConfig::default(),
            SimRangeSensor::new("lower", lower),
            SimRangeSensor::new("upper", upper),
            Box::new(JsonFileStorage::new(dir.path().join("map.json"))),
        )
    }

    #[test]
    fn clear_tick_reports_clear_threat() {
        let dir = tempfile::tempdir().unwrap();
        let mut cl = loop_with(&dir, vec![400.0], vec![400.0]);

        let report = cl.tick(Some(Fix::at(0.0, 0.0)));
        assert_eq!(report.threat, ThreatLevel::Clear);
        assert!(report.steer.is_none());
        assert!(report.obstacle.is_none());
        assert!(matches!(report.track, Some(TrackOutcome::FirstNode(_))));
    }

    #[test]
    fn danger_reading_maps_an_obstacle() {
        let dir = tempfile::tempdir().unwrap();
        // Flat close readings: the classifier calls this a wall.
        let mut cl = loop_with(&dir, vec![40.0], vec![40.0]);

        // Saturate the classifier window; the mapped obstacle merges and
        // re-tags on every tick, so the final tick's kind sticks.
        let mut report = cl.tick(Some(Fix::at(0.0, 0.0)));
        for _ in 0..7 {
            report = cl.tick(Some(Fix::at(0.0, 0.0)));
        }
        assert_eq!(report.threat, ThreatLevel::Danger);
        let classification = report.obstacle.unwrap();
        assert_eq!(classification.kind, "wall");
        assert!(cl.graph().is_obstacle_nearby(0.0, 0.0, 1.0));
    }

    #[test]
    fn danger_without_any_fix_maps_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut cl = loop_with(&dir, vec![40.0], vec![40.0]);

        let report = cl.tick(None);
        assert_eq!(report.threat, ThreatLevel::Danger);
        assert!(report.obstacle.is_none());
        assert!(cl.graph().is_empty());
    }

    #[test]
    fn danger_tick_sweeps_for_the_clearer_side() {
        let dir = tempfile::tempdir().unwrap();
        // Forward read, then the left and right sweep samples.
        let mut cl = loop_with(&dir, vec![40.0, 200.0, 50.0], vec![400.0]);

        let report = cl.tick(None);
        assert_eq!(report.threat, ThreatLevel::Danger);
        assert_eq!(report.steer, Some(Steer::Left));
    }

    #[test]
    fn similar_sweep_clearances_hold() {
        let dir = tempfile::tempdir().unwrap();
        let mut cl = loop_with(&dir, vec![40.0], vec![400.0]);

        let report = cl.tick(None);
        assert_eq!(report.steer, Some(Steer::Hold));
    }

    #[test]
    fn ticks_surface_device_events() {
        let dir = tempfile::tempdir().unwrap();
        let mut cl = loop_with(&dir, vec![40.0], vec![40.0]);

        let report = cl.tick(Some(Fix::at(0.0, 0.0)));
        assert!(report
            .events
            .iter()
            .any(|e| matches!(e.payload, EventPayload::PositionFix(_))));
        assert!(report
            .events
            .iter()
            .any(|e| matches!(e.payload, EventPayload::ObstacleDetected(_))));
        for event in &report.events {
            assert_eq!(event.source, "pathsense-runtime::control_loop");
        }
    }

    #[test]
    fn faulted_beam_reads_open_and_degrades() {
        struct FaultyRanger;

        impl RangeSensor for FaultyRanger {
            fn id(&self) -> &str {
                "ranger_lower"
            }

            fn read_cm(&mut self) -> Result<f32, CaneError> {
                Err(CaneError::SensorFault {
                    component: "ranger_lower".to_string(),
                    details: "echo timeout".to_string(),
                })
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let mut cl = ControlLoop::new(
            ControlLoopConfig::default(),
            Box::new(FaultyRanger),
            SimRangeSensor::open("upper"),
            Box::new(JsonFileStorage::new(dir.path().join("map.json"))),
        );

        let report = cl.tick(None);
        assert_eq!(report.lower_cm, MAX_RANGE_CM);
        assert_eq!(report.threat, ThreatLevel::Clear);
        assert!(report.events.iter().any(|e| matches!(
            &e.payload,
            EventPayload::Degraded { component, .. } if component == "ranger_lower"
        )));
    }

    #[test]
    fn ticks_grow_the_map_along_the_walk() {
        let dir = tempfile::tempdir().unwrap();
        let mut cl = loop_with(&dir, vec![400.0], vec![400.0]);

        for i in 0..4 {
            cl.tick(Some(Fix::at(i as f64 * 20.0 * LAT_METRE, 0.0)));
        }
        assert_eq!(cl.graph().node_count(), 4);
        assert_eq!(cl.graph().edge_count(), 3);
    }

    #[test]
    fn waypoint_commands_require_a_fix() {
        let dir = tempfile::tempdir().unwrap();
        let mut cl = loop_with(&dir, vec![400.0], vec![400.0]);

        assert!(matches!(
            cl.set_waypoint_here("home", "home"),
            Err(ControlError::NoFix)
        ));

        cl.tick(Some(Fix::at(59.0, 18.0)));
        cl.set_waypoint_here("home", "home").unwrap();
        assert_eq!(cl.waypoints().get("home").unwrap().lat, 59.0);
    }

    #[test]
    fn navigation_to_waypoint_produces_instructions() {
        let dir = tempfile::tempdir().unwrap();
        let mut cl = loop_with(&dir, vec![400.0], vec![400.0]);

        cl.tick(Some(Fix::at(500.0 * LAT_METRE, 0.0)));
        cl.set_waypoint_here("home", "home").unwrap();

        // Walk away, then navigate back.
        cl.tick(Some(Fix::at(0.0, 0.0).with_heading(0.0)));
        cl.navigate_to("home").unwrap();
        let report = cl.tick(Some(Fix::at(0.0, 0.0).with_heading(0.0)));
        let instruction = report.instruction.unwrap();
        assert!(instruction.starts_with("Continue straight"));
        assert!(instruction.ends_with("to home"));
        // The spoken phrase also goes out as an event.
        assert!(report.events.iter().any(|e| matches!(
            &e.payload,
            EventPayload::Guidance(phrase) if *phrase == instruction
        )));
    }

    #[test]
    fn navigate_to_unknown_waypoint_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut cl = loop_with(&dir, vec![400.0], vec![400.0]);
        assert!(matches!(
            cl.navigate_to("nowhere"),
            Err(ControlError::UnknownWaypoint(_))
        ));
    }

    #[test]
    fn route_planning_follows_the_walked_chain() {
        let dir = tempfile::tempdir().unwrap();
        let mut cl = loop_with(&dir, vec![400.0], vec![400.0]);

        for i in 0..4 {
            cl.tick(Some(Fix::at(i as f64 * 20.0 * LAT_METRE, 0.0)));
        }
        cl.set_waypoint_here("end", "misc").unwrap();
        // Walk back along the chain so no shortcut edges appear.
        for i in (0..4).rev() {
            cl.tick(Some(Fix::at(i as f64 * 20.0 * LAT_METRE, 0.0)));
        }

        let route = cl.plan_route_to("end").unwrap();
        assert_eq!(route.len(), 4);
        assert_eq!(cl.next_route_node(), Some(route[0]));
    }

    #[test]
    fn save_now_persists_and_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut cl = loop_with(&dir, vec![400.0], vec![400.0]);
            cl.tick(Some(Fix::at(0.0, 0.0)));
            cl.tick(Some(Fix::at(20.0 * LAT_METRE, 0.0)));
            cl.save_now().unwrap();
        }
        let cl = loop_with(&dir, vec![400.0], vec![400.0]);
        assert_eq!(cl.graph().node_count(), 2);
        assert_eq!(cl.graph().edge_count(), 1);
    }

    #[test]
    fn clear_map_wipes_memory_and_storage() {
        let dir = tempfile::tempdir().unwrap();
        let mut cl = loop_with(&dir, vec![400.0], vec![400.0]);
        cl.tick(Some(Fix::at(0.0, 0.0)));
        cl.save_now().unwrap();

        cl.clear_map().unwrap();
        assert!(cl.graph().is_empty());
        assert!(!dir.path().join("map.json").exists());

        // The next fix seeds a fresh map rather than touching stale handles.
        let report = cl.tick(Some(Fix::at(1.0, 1.0)));
        assert!(matches!(report.track, Some(TrackOutcome::FirstNode(_))));
    }

    #[test]
    fn periodic_save_respects_the_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut cl = ControlLoop::new(
            ControlLoopConfig {
                save_interval: Duration::ZERO,
                ..ControlLoopConfig::default()
            },
            SimRangeSensor::new("lower", vec![400.0]),
            SimRangeSensor::new("upper", vec![400.0]),
            Box::new(JsonFileStorage::new(dir.path().join("map.json"))),
        );
        let report = cl.tick(Some(Fix::at(0.0, 0.0)));
        assert!(report.saved);
        assert!(dir.path().join("map.json").exists());
    }
}
