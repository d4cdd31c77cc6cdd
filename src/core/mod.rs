//! Core modules for Eyewatch

pub mod geometry;
pub mod smoother;
pub mod baseline;
pub mod threshold;
pub mod closure;
pub mod detector;
pub mod control;
pub mod ports;
pub mod sinks;
pub mod monitor;
pub mod api;

pub use geometry::{OpennessReducer, OpennessReading, combine};
pub use smoother::SmoothingWindow;
pub use baseline::{BaselineCalibrator, BaselineUpdate, median};
pub use threshold::ThresholdDeriver;
pub use closure::{ClosureTracker, ClosureDecision, alert_condition};
pub use detector::EyeClosureDetector;
pub use control::{ControlError, ControlFile, ControlSource, SharedControl, ensure_control_file};
pub use ports::{LandmarkSource, MetricsSink, JsonLinesSource, VecSource};
pub use sinks::{JsonLinesSink, TerminalSink, VecSink};
pub use monitor::{Monitor, RunSummary};
pub use api::{AppState, LiveSink, create_router, run_server};
