//! `pathsense-runtime` – The Device Loop.
//!
//! Assembles the sensing, mapping, and guidance layers into a
//! single-threaded tick loop, and owns process-wide telemetry setup.
//!
//! # Modules
//!
//! - [`control_loop`] – [`ControlLoop`][control_loop::ControlLoop]: one
//!   [`tick`][control_loop::ControlLoop::tick] per cycle reads the range
//!   beams, folds the latest fix into the map, advances guidance, and
//!   periodically flushes the map to storage.  Commands (waypoints,
//!   navigation, route planning, map maintenance) live here too.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   initialises the global `tracing` subscriber with an optional OTLP
//!   span exporter.  Set `OTEL_EXPORTER_OTLP_ENDPOINT` to enable live
//!   trace export to any OTLP-compatible collector.

pub mod control_loop;
pub mod telemetry;

pub use control_loop::{
    ControlError, ControlLoop, ControlLoopConfig, TickReport, DEFAULT_SAVE_INTERVAL,
};
