//! Closure state machine
//!
//! Per frame:
//! - no baseline            → CALIBRATING, run = 0
//! - smoothed < threshold   → CLOSED, run += 1
//! - otherwise              → OPEN, run = 0
//!
//! Alert = CLOSED and run ≥ frame_threshold. It is recomputed every frame
//! from the run length; the previous frame's value is kept only to name the
//! transition.

use crate::types::{EyeState, ReasonCode};

/// Outcome of one classified frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosureDecision {
    pub state: EyeState,
    pub closed_frames: u32,
    pub alert: bool,
    pub reason: ReasonCode,
}

/// Tracks the consecutive closed-frame run
///
/// Transition reasons (raised, held, cleared) come from the previous frame's
/// alert, so a frame threshold edited mid-run still reports the edge.
#[derive(Debug, Clone, Default)]
pub struct ClosureTracker {
    closed_run_length: u32,
    alerting: bool,
}

impl ClosureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a calibrated frame against its threshold
    pub fn classify(&mut self, smoothed: f64, threshold: f64, frame_threshold: u32) -> ClosureDecision {
        let state = if smoothed < threshold {
            EyeState::Closed
        } else {
            EyeState::Open
        };
        self.record(state, frame_threshold)
    }

    /// Apply an already decided classification
    pub fn record(&mut self, state: EyeState, frame_threshold: u32) -> ClosureDecision {
        let was_alerting = self.alerting;

        self.closed_run_length = match state {
            EyeState::Closed => self.closed_run_length.saturating_add(1),
            EyeState::Open | EyeState::Calibrating => 0,
        };
        let alert = alert_condition(state, self.closed_run_length, frame_threshold);
        self.alerting = alert;

        let reason = match (state, was_alerting, alert) {
            (EyeState::Calibrating, _, _) => ReasonCode::R001_CALIBRATING,
            (_, false, true) => ReasonCode::R003_ALERT_RAISED,
            (_, true, true) => ReasonCode::R003_ALERT_HELD,
            (_, true, false) => ReasonCode::R003_ALERT_CLEARED,
            (EyeState::Closed, false, false) => ReasonCode::R002_EYES_CLOSING,
            (EyeState::Open, false, false) => ReasonCode::R002_EYES_OPEN,
        };

        ClosureDecision {
            state,
            closed_frames: self.closed_run_length,
            alert,
            reason,
        }
    }

    /// No observation this frame: run resets, nothing is classified
    pub fn observe_absence(&mut self) {
        self.closed_run_length = 0;
        self.alerting = false;
    }

    pub fn closed_run_length(&self) -> u32 {
        self.closed_run_length
    }

    /// Whether the last classified frame was alerting
    pub fn is_alerting(&self) -> bool {
        self.alerting
    }

    pub fn reset(&mut self) {
        self.closed_run_length = 0;
        self.alerting = false;
    }
}

/// Alert condition for a classified frame
pub fn alert_condition(state: EyeState, closed_run_length: u32, frame_threshold: u32) -> bool {
    state == EyeState::Closed && closed_run_length >= frame_threshold
}

// =============================================================================
// TESTS
// =============================================================================
