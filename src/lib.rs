//! Eyewatch: self-calibrating eye-closure detection
//!
//! Landmarks → openness ratio → smoothing → baseline → dynamic threshold →
//! Calibrating / Open / Closed, with an alert once eyes stay closed too long.

pub mod core;
pub mod types;

// =============================================================================
// DECISION DEFAULTS [C] - live-editable through the control file
// =============================================================================

/// Fallback threshold reported while no baseline exists yet
pub const DEFAULT_EAR_THRESHOLD: f64 = 0.26;

/// Consecutive closed frames before the alert fires
pub const DEFAULT_FRAME_THRESHOLD: u32 = 50;

/// Threshold = baseline × ratio (bounded by MIN_MARGIN and MIN_DYNAMIC_THRESHOLD)
pub const DEFAULT_DYNAMIC_RATIO: f64 = 0.92;

/// Accepted range for the dynamic ratio; out-of-range values are clamped
pub const DYNAMIC_RATIO_MIN: f64 = 0.70;
pub const DYNAMIC_RATIO_MAX: f64 = 0.98;

/// Accepted range for the frame threshold; out-of-range values are clamped
pub const FRAME_THRESHOLD_MIN: u32 = 1;
pub const FRAME_THRESHOLD_MAX: u32 = 10_000;

// =============================================================================
// TUNING [C] - hand-tuned heuristics, change only with sign-off
// =============================================================================

/// Moving-average window over the raw metric (frames)
pub const SMOOTHING_WINDOW: usize = 3;

/// Frames collected before the first baseline is taken
pub const CALIBRATION_FRAMES: usize = 30;

/// Absolute lower bound for the dynamic threshold
pub const MIN_DYNAMIC_THRESHOLD: f64 = 0.18;

/// Blend weight pulling the baseline toward the median of recent open frames
pub const BASELINE_ALPHA: f64 = 0.06;

/// Frames below baseline × guard never feed the baseline
pub const BASELINE_GUARD_RATIO: f64 = 0.85;

/// Minimum gap between baseline and threshold
pub const MIN_MARGIN: f64 = 0.015;

/// Horizontal distances below this are degenerate (ratio = 0)
pub const GEOMETRY_EPSILON: f64 = 1e-5;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
