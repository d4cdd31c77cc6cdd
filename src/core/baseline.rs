//! Baseline calibrator: learns the subject's "fully open" reference
//!
//! Uncalibrated: collect smoothed samples until the buffer is full, then take
//! the median. Calibrated: frames still plausibly open (≥ baseline × guard)
//! join the buffer and nudge the baseline toward the buffer median. Frames
//! below the guard never touch the buffer or the baseline, so a long closure
//! cannot redefine "open".

use std::collections::VecDeque;

/// What a single update did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineUpdate {
    /// Still filling the calibration buffer
    Collecting,
    /// Buffer filled, baseline set on this sample
    Established,
    /// Baseline blended toward the recent-open median
    Adapted,
    /// Sample below the guard, nothing changed
    Guarded,
}

/// Baseline state: optional baseline plus a bounded sample buffer
#[derive(Debug, Clone)]
pub struct BaselineCalibrator {
    baseline: Option<f64>,
    samples: VecDeque<f64>,
    capacity: usize,
    guard_ratio: f64,
    alpha: f64,
}

impl BaselineCalibrator {
    /// Create calibrator with buffer size C, guard ratio and blend weight α
    pub fn new(capacity: usize, guard_ratio: f64, alpha: f64) -> Self {
        let capacity = capacity.max(1);
        Self {
            baseline: None,
            samples: VecDeque::with_capacity(capacity),
            capacity,
            guard_ratio,
            alpha,
        }
    }

    /// Feed one smoothed sample
    pub fn update(&mut self, smoothed: f64) -> BaselineUpdate {
        match self.baseline {
            None => {
                self.push(smoothed);
                if self.samples.len() >= self.capacity {
                    self.baseline = Some(median(&self.samples));
                    BaselineUpdate::Established
                } else {
                    BaselineUpdate::Collecting
                }
            }
            Some(baseline) => {
                if smoothed < baseline * self.guard_ratio {
                    return BaselineUpdate::Guarded;
                }
                self.push(smoothed);
                let target = median(&self.samples);
                self.baseline = Some(baseline * (1.0 - self.alpha) + target * self.alpha);
                BaselineUpdate::Adapted
            }
        }
    }

    fn push(&mut self, value: f64) {
        self.samples.push_back(value);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Current baseline, None while uncalibrated
    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_some()
    }

    /// Samples currently buffered
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Back to uncalibrated with an empty buffer
    pub fn reset(&mut self) {
        self.baseline = None;
        self.samples.clear();
    }
}

/// Median; even-sized input averages the two central values
pub fn median(values: &VecDeque<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f64> = values.iter().copied().collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

// =============================================================================
// TESTS
// =============================================================================
