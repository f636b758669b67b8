//! `pathsense-sense` – The Sensing Layer.
//!
//! Turns raw range-beam readings into threat levels, evasion
//! suggestions, and obstacle classifications.
//!
//! # Modules
//!
//! - [`ranging`] – the [`RangeSensor`][ranging::RangeSensor] driver
//!   trait, a scripted simulator, [`ThreatLevel`][ranging::ThreatLevel]
//!   assessment, and side-clearance steering suggestions.
//! - [`classifier`] – [`ObstacleClassifier`][classifier::ObstacleClassifier]:
//!   a sliding-window heuristic that names what the cane is facing from
//!   the shape of the two beams over time.

pub mod classifier;
pub mod ranging;

pub use classifier::{Classification, ObstacleClassifier};
pub use ranging::{
    suggest_direction, RangeSensor, SimRangeSensor, Steer, ThreatLevel, DANGER_THRESHOLD_CM,
    MAX_RANGE_CM, WARNING_THRESHOLD_CM,
};
