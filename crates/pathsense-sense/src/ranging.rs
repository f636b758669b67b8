//! Generic `RangeSensor` trait for ultrasonic and time-of-flight rangers.
//!
//! Drivers implement this trait; the control loop only ever talks to the
//! trait, so a bench rig, a simulator, or real hardware can be swapped in
//! without touching detection or mapping logic.  Readings are distances
//! in centimetres, clamped to [`MAX_RANGE_CM`].

use pathsense_types::CaneError;

/// Distance past which a ranger reports "nothing in range".
pub const MAX_RANGE_CM: f32 = 400.0;

/// Anything closer than this gets the user's attention.
pub const WARNING_THRESHOLD_CM: f32 = 150.0;

/// Anything closer than this demands an immediate reaction.
pub const DANGER_THRESHOLD_CM: f32 = 50.0;

/// A single-beam distance sensor.
///
/// # Errors
///
/// [`read_cm`][RangeSensor::read_cm] returns
/// [`CaneError::SensorFault`] when the hardware fails to produce a
/// reading; a timeout (nothing in range) is not a fault and reports
/// [`MAX_RANGE_CM`] instead.
pub trait RangeSensor: Send {
    /// Stable identifier, e.g. `"ranger_lower"` or `"ranger_upper"`.
    fn id(&self) -> &str;

    /// Measure the distance to the nearest reflector, in centimetres,
    /// clamped to `0.0..=MAX_RANGE_CM`.
    fn read_cm(&mut self) -> Result<f32, CaneError>;
}

/// Scripted range sensor for tests and headless runs.  Cycles through a
/// fixed sequence of readings, repeating forever.
pub struct SimRangeSensor {
    id: String,
    script: Vec<f32>,
    cursor: usize,
}

impl SimRangeSensor {
    pub fn new(id: impl Into<String>, script: Vec<f32>) -> Box<Self> {
        Box::new(Self {
            id: id.into(),
            script,
            cursor: 0,
        })
    }

    /// A sensor that always reports open space.
    pub fn open(id: impl Into<String>) -> Box<Self> {
        Self::new(id, vec![MAX_RANGE_CM])
    }
}

impl RangeSensor for SimRangeSensor {
    fn id(&self) -> &str {
        &self.id
    }

    fn read_cm(&mut self) -> Result<f32, CaneError> {
        if self.script.is_empty() {
            return Ok(MAX_RANGE_CM);
        }
        let reading = self.script[self.cursor % self.script.len()];
        self.cursor += 1;
        Ok(reading.clamp(0.0, MAX_RANGE_CM))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Threat assessment
// ────────────────────────────────────────────────────────────────────────────

/// Urgency of the closest current reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ThreatLevel {
    Clear,
    Warning,
    Danger,
}

impl ThreatLevel {
    /// Classify a pair of readings (lower and upper beam) by the closer
    /// of the two.
    pub fn assess(lower_cm: f32, upper_cm: f32) -> Self {
        let closest = lower_cm.min(upper_cm);
        if closest < DANGER_THRESHOLD_CM {
            ThreatLevel::Danger
        } else if closest < WARNING_THRESHOLD_CM {
            ThreatLevel::Warning
        } else {
            ThreatLevel::Clear
        }
    }
}

/// Which way around an obstacle has more room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steer {
    Left,
    Right,
    /// Neither side is clearly better; stop and wait.
    Hold,
}

/// Suggest an evasion direction from averaged side-sweep clearances.
///
/// A side must beat the other by a 1.25× margin before it is suggested;
/// anything closer is a [`Steer::Hold`].
pub fn suggest_direction(left_avg_cm: f32, right_avg_cm: f32) -> Steer {
    if left_avg_cm > right_avg_cm * 1.25 {
        Steer::Left
    } else if right_avg_cm > left_avg_cm * 1.25 {
        Steer::Right
    } else {
        Steer::Hold
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── sim sensor ───────────────────────────────────────────────────────────

    #[test]
    fn sim_sensor_cycles_its_script() {
        let mut sensor = SimRangeSensor::new("lower", vec![100.0, 200.0]);
        assert_eq!(sensor.read_cm().unwrap(), 100.0);
        assert_eq!(sensor.read_cm().unwrap(), 200.0);
        assert_eq!(sensor.read_cm().unwrap(), 100.0);
    }

    #[test]
    fn sim_sensor_clamps_to_max_range() {
        let mut sensor = SimRangeSensor::new("lower", vec![9999.0, -5.0]);
        assert_eq!(sensor.read_cm().unwrap(), MAX_RANGE_CM);
        assert_eq!(sensor.read_cm().unwrap(), 0.0);
    }

    #[test]
    fn open_sensor_reports_max_range() {
        let mut sensor = SimRangeSensor::open("upper");
        assert_eq!(sensor.id(), "upper");
        assert_eq!(sensor.read_cm().unwrap(), MAX_RANGE_CM);
    }

    // ── threat levels ────────────────────────────────────────────────────────

    #[test]
    fn threat_uses_the_closer_beam() {
        assert_eq!(ThreatLevel::assess(400.0, 400.0), ThreatLevel::Clear);
        assert_eq!(ThreatLevel::assess(400.0, 120.0), ThreatLevel::Warning);
        assert_eq!(ThreatLevel::assess(30.0, 400.0), ThreatLevel::Danger);
    }

    #[test]
    fn threat_thresholds_are_exclusive_at_the_boundary() {
        assert_eq!(ThreatLevel::assess(150.0, 400.0), ThreatLevel::Clear);
        assert_eq!(ThreatLevel::assess(149.9, 400.0), ThreatLevel::Warning);
        assert_eq!(ThreatLevel::assess(50.0, 400.0), ThreatLevel::Warning);
        assert_eq!(ThreatLevel::assess(49.9, 400.0), ThreatLevel::Danger);
    }

    #[test]
    fn threat_levels_order_by_urgency() {
        assert!(ThreatLevel::Danger > ThreatLevel::Warning);
        assert!(ThreatLevel::Warning > ThreatLevel::Clear);
    }

    // ── direction suggestion ─────────────────────────────────────────────────

    #[test]
    fn clearer_side_wins_with_margin() {
        assert_eq!(suggest_direction(200.0, 100.0), Steer::Left);
        assert_eq!(suggest_direction(100.0, 200.0), Steer::Right);
    }

    #[test]
    fn similar_clearances_hold() {
        assert_eq!(suggest_direction(100.0, 100.0), Steer::Hold);
        // 1.2× advantage is under the margin.
        assert_eq!(suggest_direction(120.0, 100.0), Steer::Hold);
    }
}
