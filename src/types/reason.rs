//! Reason codes attached to every frame decision

use serde::{Deserialize, Serialize};

/// Why a frame was classified the way it was
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // R001: Calibration
    // =========================================================================
    /// Collecting open-eye samples, no baseline yet
    R001_CALIBRATING,
    /// Calibration buffer filled, baseline taken this frame
    R001_CALIBRATION_COMPLETE,
    /// Recalibration token changed, all learned state dropped
    R001_RECALIBRATED,

    // =========================================================================
    // R002: Classification
    // =========================================================================
    /// Smoothed metric at or above threshold
    R002_EYES_OPEN,
    /// Smoothed metric below threshold, run still under the alert bound
    R002_EYES_CLOSING,

    // =========================================================================
    // R003: Alert
    // =========================================================================
    /// Closed run reached the frame threshold on this frame
    R003_ALERT_RAISED,
    /// Closed run still at or above the frame threshold
    R003_ALERT_HELD,
    /// Eyes reopened after an alert
    R003_ALERT_CLEARED,

    // =========================================================================
    // R004: Observation
    // =========================================================================
    /// No face, or an incomplete landmark set
    R004_NO_FACE,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::R001_CALIBRATING => "R001_CALIBRATING",
            Self::R001_CALIBRATION_COMPLETE => "R001_CALIBRATION_COMPLETE",
            Self::R001_RECALIBRATED => "R001_RECALIBRATED",
            Self::R002_EYES_OPEN => "R002_EYES_OPEN",
            Self::R002_EYES_CLOSING => "R002_EYES_CLOSING",
            Self::R003_ALERT_RAISED => "R003_ALERT_RAISED",
            Self::R003_ALERT_HELD => "R003_ALERT_HELD",
            Self::R003_ALERT_CLEARED => "R003_ALERT_CLEARED",
            Self::R004_NO_FACE => "R004_NO_FACE",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::R001_CALIBRATING => "Calibrating - keep eyes open",
            Self::R001_CALIBRATION_COMPLETE => "Baseline established",
            Self::R001_RECALIBRATED => "Recalibration requested",
            Self::R002_EYES_OPEN => "Eyes open",
            Self::R002_EYES_CLOSING => "Eyes closed",
            Self::R003_ALERT_RAISED => "Eyes closed too long - alert",
            Self::R003_ALERT_HELD => "Alert active",
            Self::R003_ALERT_CLEARED => "Alert cleared",
            Self::R004_NO_FACE => "No face in frame",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
