//! Per-frame output record

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::types::{EyeState, ReasonCode};

/// Snapshot of one frame's decision, handed to every metrics consumer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameMetrics {
    /// Frame index (1-based, counts no-face frames too)
    pub frame: u64,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Combined openness ratio before smoothing
    pub raw: Option<f64>,
    /// Moving average of the raw metric
    pub smoothed: Option<f64>,
    /// Closed/open decision boundary used for this frame
    pub threshold: Option<f64>,
    /// Learned open-eye reference, None while calibrating (kept on no-face frames)
    pub baseline: Option<f64>,
    /// Classification, None when no face was observed
    pub state: Option<EyeState>,
    /// Consecutive closed frames including this one
    pub closed_frames: u32,
    /// Eyes closed for at least the configured frame threshold
    pub alert: bool,
    /// Reason for this frame's outcome
    pub reason: ReasonCode,
}

impl FrameMetrics {
    /// Output for a frame without a usable face
    pub fn no_face(frame: u64) -> Self {
        Self {
            frame,
            timestamp: Utc::now(),
            raw: None,
            smoothed: None,
            threshold: None,
            baseline: None,
            state: None,
            closed_frames: 0,
            alert: false,
            reason: ReasonCode::R004_NO_FACE,
        }
    }

    /// Was a face observed on this frame?
    pub fn observed(&self) -> bool {
        self.state.is_some()
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let Some(state) = self.state else {
            return format!("\x1b[90m· frame={} | no face | {}\x1b[0m", self.frame, self.reason.code());
        };

        format!(
            "{}{} frame={} | ear={:.3} | thr={:.3} | state={} | closed={} | {}{}",
            state.color_code(),
            state.emoji(),
            self.frame,
            self.smoothed.unwrap_or_default(),
            self.threshold.unwrap_or_default(),
            state,
            self.closed_frames,
            self.reason.code(),
            EyeState::color_reset()
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        match self.state {
            Some(state) => format!(
                "frame={} | ear={:.3} | thr={:.3} | state={} | closed={} | alert={} | reason={}",
                self.frame,
                self.smoothed.unwrap_or_default(),
                self.threshold.unwrap_or_default(),
                state,
                self.closed_frames,
                self.alert,
                self.reason.code()
            ),
            None => format!(
                "frame={} | state=NONE | closed=0 | alert=false | reason={}",
                self.frame,
                self.reason.code()
            ),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
