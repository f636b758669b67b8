use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A single position sample from the GPS receiver.
///
/// Fixes carry no accuracy estimate; the map layer deduplicates them by
/// distance alone, never by timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
    /// Course over ground in degrees `[0, 360)`, when the receiver reports
    /// one (it only does while the user is moving).
    pub heading_deg: Option<f64>,
    /// Wall-clock time at which the fix was received.
    pub timestamp: DateTime<Utc>,
}

impl Fix {
    /// Construct a fix at the current wall-clock time with no heading.
    pub fn at(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            heading_deg: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach a course-over-ground heading to this fix.
    pub fn with_heading(mut self, heading_deg: f64) -> Self {
        self.heading_deg = Some(heading_deg);
        self
    }
}

/// A classified obstacle observation at a known position.
///
/// `kind` is an open string vocabulary produced by the classifier
/// (e.g. `"wall"`, `"stairs"`, `"person"`); the map layer stores it
/// without validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleReport {
    pub lat: f64,
    pub lng: f64,
    pub kind: String,
    /// Classifier confidence in `[0.0, 1.0]`.
    pub confidence: f32,
}

/// Unified event wrapper for anything the device wants to surface to the
/// user interface (haptics, speech, logging).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g. `"pathsense-runtime::control_loop"`
    pub source: String,
    pub payload: EventPayload,
}

impl DeviceEvent {
    /// Wrap a payload with a fresh id and the current timestamp.
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Variants of data the device can announce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    /// A new position fix was accepted.
    PositionFix(Fix),
    /// An obstacle was classified close enough to matter.
    ObstacleDetected(ObstacleReport),
    /// A turn-by-turn guidance phrase for the speaker.
    Guidance(String),
    /// A degraded-operation condition (map full, storage offline, ...).
    Degraded { component: String, details: String },
}

/// Hardware-level errors raised by sensor drivers.
///
/// Recoverable by construction: the control loop treats a faulted beam
/// as open space and keeps the cycle going rather than halting.
#[derive(Error, Debug)]
pub enum CaneError {
    #[error("sensor fault on {component}: {details}")]
    SensorFault { component: String, details: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fix_serialization_roundtrip() {
        let fix = Fix::at(59.3293, 18.0686).with_heading(42.0);
        let json = serde_json::to_string(&fix).unwrap();
        let back: Fix = serde_json::from_str(&json).unwrap();
        assert_eq!(fix, back);
    }

    #[test]
    fn fix_at_has_no_heading() {
        let fix = Fix::at(0.0, 0.0);
        assert!(fix.heading_deg.is_none());
    }

    #[test]
    fn device_event_roundtrip() {
        let event = DeviceEvent::new(
            "pathsense-runtime::control_loop",
            EventPayload::ObstacleDetected(ObstacleReport {
                lat: 1.0,
                lng: 2.0,
                kind: "stairs".to_string(),
                confidence: 0.89,
            }),
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: DeviceEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event.id, back.id);
        assert_eq!(event.source, back.source);
    }

    #[test]
    fn cane_error_display() {
        let err = CaneError::SensorFault {
            component: "ultrasonic_lower".to_string(),
            details: "echo timeout".to_string(),
        };
        assert!(err.to_string().contains("ultrasonic_lower"));
        assert!(err.to_string().contains("echo timeout"));
    }
}
