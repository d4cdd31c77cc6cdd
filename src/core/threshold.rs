//! Dynamic threshold deriver
//!
//! drop      = max(min_margin, baseline × (1 − dynamic_ratio))
//! threshold = max(min_dynamic_floor, baseline − drop)
//!
//! Without a baseline the fixed default threshold is reported; it is never
//! used for classification since uncalibrated frames are always CALIBRATING.

use crate::types::TuningConfig;

/// Derives the closed/open boundary from the baseline
#[derive(Debug, Clone, Copy)]
pub struct ThresholdDeriver {
    min_margin: f64,
    min_dynamic_floor: f64,
    default_threshold: f64,
}

impl Default for ThresholdDeriver {
    fn default() -> Self {
        Self::from_tuning(&TuningConfig::default())
    }
}

impl ThresholdDeriver {
    pub fn new(min_margin: f64, min_dynamic_floor: f64, default_threshold: f64) -> Self {
        Self { min_margin, min_dynamic_floor, default_threshold }
    }

    pub fn from_tuning(tuning: &TuningConfig) -> Self {
        Self::new(tuning.min_margin, tuning.min_dynamic_floor, tuning.default_threshold)
    }

    /// Threshold for this frame; `dynamic_ratio` must already be clamped
    pub fn derive(&self, baseline: Option<f64>, dynamic_ratio: f64) -> f64 {
        match baseline {
            Some(baseline) => {
                let drop = self.min_margin.max(baseline * (1.0 - dynamic_ratio));
                self.min_dynamic_floor.max(baseline - drop)
            }
            None => self.default_threshold,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
