//! Eye-closure detector: the per-frame reducer
//!
//! One call per frame, in order:
//! 1. snapshot + clamp the live settings
//! 2. recalibration check (token changed → drop smoother/baseline/run)
//! 3. no face → run resets, nothing else moves
//! 4. geometry → smoother → baseline → threshold → classification
//!
//! The detector owns all mutable state and never fails; every anomaly
//! degrades to CALIBRATING or "no face".

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::core::baseline::{BaselineCalibrator, BaselineUpdate};
use crate::core::closure::ClosureTracker;
use crate::core::geometry::OpennessReducer;
use crate::core::smoother::SmoothingWindow;
use crate::core::threshold::ThresholdDeriver;
use crate::types::{
    ControlState, EffectiveSettings, EyeIndexScheme, EyePair, EyeState, FrameDims, FrameMetrics,
    LandmarkFrame, ReasonCode, TuningConfig,
};

/// Stateful eye-closure detector
#[derive(Debug, Clone)]
pub struct EyeClosureDetector {
    tuning: TuningConfig,
    scheme: EyeIndexScheme,
    reducer: OpennessReducer,
    smoother: SmoothingWindow,
    calibrator: BaselineCalibrator,
    deriver: ThresholdDeriver,
    closure: ClosureTracker,
    /// Last recalibration token seen
    last_seen_token: u64,
    /// Frames processed, including no-face frames
    frame_index: u64,
    /// Reset happened on a no-face frame, report it on the next observed one
    recalibration_pending: bool,
}

impl Default for EyeClosureDetector {
    fn default() -> Self {
        Self::new(TuningConfig::default(), 0)
    }
}

impl EyeClosureDetector {
    /// Create detector; `initial_token` is the token already present at start-up
    pub fn new(tuning: TuningConfig, initial_token: u64) -> Self {
        let tuning = tuning.sanitized();
        Self {
            tuning,
            scheme: EyeIndexScheme::default(),
            reducer: OpennessReducer::new(tuning.epsilon),
            smoother: SmoothingWindow::new(tuning.smoothing_window),
            calibrator: BaselineCalibrator::new(tuning.calibration_frames, tuning.guard_ratio, tuning.alpha),
            deriver: ThresholdDeriver::from_tuning(&tuning),
            closure: ClosureTracker::new(),
            last_seen_token: initial_token,
            frame_index: 0,
            recalibration_pending: false,
        }
    }

    /// Use a different mesh index layout
    pub fn with_scheme(mut self, scheme: EyeIndexScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Reset learned state if the token differs from the last one seen
    ///
    /// Only inequality matters; the value itself is opaque.
    pub fn sync_recalibration(&mut self, token: u64) -> bool {
        if token == self.last_seen_token {
            return false;
        }
        info!(from = self.last_seen_token, to = token, "recalibration requested");
        self.last_seen_token = token;
        self.reset_learning();
        true
    }

    /// Process one tracked frame with the detector's index scheme
    pub fn process(&mut self, frame: &LandmarkFrame, control: &ControlState) -> FrameMetrics {
        let eyes = frame.eye_pair(&self.scheme);
        self.advance(eyes.as_ref(), frame.dims(), control)
    }

    /// Advance by one frame
    pub fn advance(&mut self, eyes: Option<&EyePair>, dims: FrameDims, control: &ControlState) -> FrameMetrics {
        self.frame_index += 1;

        let settings = control.settings.sanitized();
        if settings.clamped {
            debug!(
                dynamic_ratio = control.settings.dynamic_ratio,
                frame_threshold = control.settings.frame_threshold,
                "settings out of range, clamped"
            );
        }

        if self.sync_recalibration(control.recalibrate_token) {
            self.recalibration_pending = true;
        }

        match eyes {
            Some(eyes) => {
                let recalibrated = std::mem::take(&mut self.recalibration_pending);
                self.observe(eyes, dims, &settings, recalibrated)
            }
            None => {
                self.closure.observe_absence();
                // Baseline is learned state, it survives a missing face
                FrameMetrics {
                    baseline: self.calibrator.baseline(),
                    ..FrameMetrics::no_face(self.frame_index)
                }
            }
        }
    }

    fn observe(
        &mut self,
        eyes: &EyePair,
        dims: FrameDims,
        settings: &EffectiveSettings,
        recalibrated: bool,
    ) -> FrameMetrics {
        let reading = self.reducer.measure(eyes, dims);
        let smoothed = self.smoother.push(reading.raw);

        let was_calibrated = self.calibrator.is_calibrated();
        let update = self.calibrator.update(smoothed);
        let baseline = self.calibrator.baseline();
        let threshold = self.deriver.derive(baseline, settings.dynamic_ratio);

        if update == BaselineUpdate::Established {
            info!(frame = self.frame_index, baseline = baseline.unwrap_or_default(), "calibration complete");
        }

        // A frame that entered uncalibrated stays CALIBRATING, even the one
        // that completes the buffer.
        let mut decision = if was_calibrated {
            self.closure.classify(smoothed, threshold, settings.frame_threshold)
        } else {
            self.closure.record(EyeState::Calibrating, settings.frame_threshold)
        };

        let reason = decision.reason;
        match reason {
            ReasonCode::R001_CALIBRATING if recalibrated => decision.reason = ReasonCode::R001_RECALIBRATED,
            ReasonCode::R001_CALIBRATING if update == BaselineUpdate::Established => {
                decision.reason = ReasonCode::R001_CALIBRATION_COMPLETE
            }
            ReasonCode::R003_ALERT_RAISED => warn!(
                frame = self.frame_index,
                closed_frames = decision.closed_frames,
                smoothed,
                threshold,
                "eyes closed too long"
            ),
            ReasonCode::R003_ALERT_CLEARED => info!(frame = self.frame_index, "alert cleared"),
            _ => {}
        }

        FrameMetrics {
            frame: self.frame_index,
            timestamp: Utc::now(),
            raw: Some(reading.raw),
            smoothed: Some(smoothed),
            threshold: Some(threshold),
            baseline,
            state: Some(decision.state),
            closed_frames: decision.closed_frames,
            alert: decision.alert,
            reason: decision.reason,
        }
    }

    /// Drop smoother, baseline and closed run
    fn reset_learning(&mut self) {
        self.smoother.clear();
        self.calibrator.reset();
        self.closure.reset();
    }

    /// Current baseline, None while calibrating
    pub fn baseline(&self) -> Option<f64> {
        self.calibrator.baseline()
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrator.is_calibrated()
    }

    /// Calibration progress as (collected, needed)
    pub fn calibration_progress(&self) -> (usize, usize) {
        if self.calibrator.is_calibrated() {
            (self.calibrator.capacity(), self.calibrator.capacity())
        } else {
            (self.calibrator.sample_count(), self.calibrator.capacity())
        }
    }

    pub fn closed_run_length(&self) -> u32 {
        self.closure.closed_run_length()
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn last_seen_token(&self) -> u64 {
        self.last_seen_token
    }

    pub fn tuning(&self) -> &TuningConfig {
        &self.tuning
    }

    /// Reset everything except the frame counter and token
    pub fn reset(&mut self) {
        self.reset_learning();
    }
}

// =============================================================================
// TESTS
// =============================================================================
