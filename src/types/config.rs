//! Detector configuration
//!
//! Two layers: `DetectorSettings` are the knobs an operator edits live (they
//! are re-read every frame and may hold garbage mid-edit), `TuningConfig`
//! holds the compiled-in heuristics. Neither ever fails: bad values are
//! clamped to the nearest valid bound.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use crate::{
    DEFAULT_DYNAMIC_RATIO, DEFAULT_FRAME_THRESHOLD, DYNAMIC_RATIO_MIN, DYNAMIC_RATIO_MAX,
    FRAME_THRESHOLD_MIN, FRAME_THRESHOLD_MAX, DEFAULT_EAR_THRESHOLD, SMOOTHING_WINDOW,
    CALIBRATION_FRAMES, MIN_DYNAMIC_THRESHOLD, BASELINE_ALPHA, BASELINE_GUARD_RATIO,
    MIN_MARGIN, GEOMETRY_EPSILON,
};

/// Live settings as stored in the control file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// Threshold = baseline × ratio (before margin/floor bounds)
    #[serde(rename = "ear_dynamic_ratio", alias = "dynamic_ratio", deserialize_with = "lenient_ratio")]
    pub dynamic_ratio: f64,
    /// Closed frames before alert; signed so negative input can be clamped
    #[serde(deserialize_with = "lenient_count")]
    pub frame_threshold: i64,
    /// Audible alert requested
    pub sound_alert: bool,
    /// On-screen alert requested
    pub visual_alert: bool,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            dynamic_ratio: DEFAULT_DYNAMIC_RATIO,
            frame_threshold: i64::from(DEFAULT_FRAME_THRESHOLD),
            sound_alert: true,
            visual_alert: true,
        }
    }
}

impl DetectorSettings {
    /// Clamp every value into its documented range
    pub fn sanitized(&self) -> EffectiveSettings {
        let dynamic_ratio = if self.dynamic_ratio.is_finite() {
            self.dynamic_ratio.clamp(DYNAMIC_RATIO_MIN, DYNAMIC_RATIO_MAX)
        } else {
            DEFAULT_DYNAMIC_RATIO
        };
        let frame_threshold = self
            .frame_threshold
            .clamp(FRAME_THRESHOLD_MIN as i64, FRAME_THRESHOLD_MAX as i64) as u32;

        EffectiveSettings {
            dynamic_ratio,
            frame_threshold,
            sound_alert: self.sound_alert,
            visual_alert: self.visual_alert,
            clamped: dynamic_ratio != self.dynamic_ratio
                || i64::from(frame_threshold) != self.frame_threshold,
        }
    }
}

/// Numeric field as a hand-edited document may hold it
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Int(i64),
    Float(f64),
    Text(String),
    Other(#[allow(dead_code)] IgnoredAny),
}

impl LooseNumber {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            Self::Text(text) => text.trim().parse().ok(),
            Self::Other(_) => None,
        }
    }
}

/// Frame count: integers as-is, floats and numeric strings truncated,
/// anything else falls back to the default. Range is enforced by `sanitized`.
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = LooseNumber::deserialize(deserializer)?;
    Ok(match value {
        LooseNumber::Int(n) => n,
        other => match other.as_f64() {
            // `as` saturates at the i64 bounds
            Some(f) if f.is_finite() => f.trunc() as i64,
            _ => i64::from(DEFAULT_FRAME_THRESHOLD),
        },
    })
}

/// Ratio: numbers and numeric strings, anything else falls back to the default
fn lenient_ratio<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = LooseNumber::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or(DEFAULT_DYNAMIC_RATIO))
}

/// Settings after clamping, as used for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveSettings {
    pub dynamic_ratio: f64,
    pub frame_threshold: u32,
    pub sound_alert: bool,
    pub visual_alert: bool,
    /// Some input value was out of range
    pub clamped: bool,
}

impl Default for EffectiveSettings {
    fn default() -> Self {
        DetectorSettings::default().sanitized()
    }
}

/// Compiled-in heuristics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TuningConfig {
    /// Frames at or above baseline × guard_ratio may adapt the baseline
    pub guard_ratio: f64,
    /// Baseline blend weight
    pub alpha: f64,
    /// Minimum baseline-to-threshold gap
    pub min_margin: f64,
    /// Absolute floor for the dynamic threshold
    pub min_dynamic_floor: f64,
    /// Threshold reported while uncalibrated
    pub default_threshold: f64,
    /// Smoothing window size (W)
    pub smoothing_window: usize,
    /// Calibration buffer size (C)
    pub calibration_frames: usize,
    /// Degenerate-distance guard
    pub epsilon: f64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            guard_ratio: BASELINE_GUARD_RATIO,
            alpha: BASELINE_ALPHA,
            min_margin: MIN_MARGIN,
            min_dynamic_floor: MIN_DYNAMIC_THRESHOLD,
            default_threshold: DEFAULT_EAR_THRESHOLD,
            smoothing_window: SMOOTHING_WINDOW,
            calibration_frames: CALIBRATION_FRAMES,
            epsilon: GEOMETRY_EPSILON,
        }
    }
}

impl TuningConfig {
    /// Override buffer sizes, keeping everything else
    pub fn with_windows(mut self, smoothing_window: usize, calibration_frames: usize) -> Self {
        self.smoothing_window = smoothing_window;
        self.calibration_frames = calibration_frames;
        self
    }

    /// Clamp into usable ranges; non-finite values fall back to defaults
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let finite_or = |v: f64, d: f64| if v.is_finite() { v } else { d };

        Self {
            guard_ratio: finite_or(self.guard_ratio, defaults.guard_ratio).clamp(f64::EPSILON, 1.0),
            alpha: finite_or(self.alpha, defaults.alpha).clamp(0.0, 1.0),
            min_margin: finite_or(self.min_margin, defaults.min_margin).max(0.0),
            min_dynamic_floor: finite_or(self.min_dynamic_floor, defaults.min_dynamic_floor).max(0.0),
            default_threshold: finite_or(self.default_threshold, defaults.default_threshold).max(0.0),
            smoothing_window: self.smoothing_window.max(1),
            calibration_frames: self.calibration_frames.max(1),
            epsilon: if self.epsilon.is_finite() && self.epsilon > 0.0 {
                self.epsilon
            } else {
                defaults.epsilon
            },
        }
    }
}

/// The control document shared with the operator UI
///
/// Keys the UI keeps for itself (overlays, theme, ...) are ignored here.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlState {
    /// Opaque counter; any change requests a recalibration
    pub recalibrate_token: u64,
    /// Live detector settings
    pub settings: DetectorSettings,
}

// =============================================================================
// TESTS
// =============================================================================
