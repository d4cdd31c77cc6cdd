//! Eye state definitions

use serde::{Deserialize, Serialize};

/// Per-frame classification of the monitored eyes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EyeState {
    /// No baseline yet, collecting open-eye samples
    Calibrating,
    /// Smoothed metric at or above the dynamic threshold
    Open,
    /// Smoothed metric below the dynamic threshold
    Closed,
}

impl EyeState {
    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            EyeState::Calibrating => "\x1b[33m", // Yellow
            EyeState::Open => "\x1b[32m",        // Green
            EyeState::Closed => "\x1b[31m",      // Red
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }

    /// Get emoji for state
    pub fn emoji(&self) -> &'static str {
        match self {
            EyeState::Calibrating => "⏳",
            EyeState::Open => "👀",
            EyeState::Closed => "😑",
        }
    }
}

impl std::fmt::Display for EyeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EyeState::Calibrating => "CALIBRATING",
            EyeState::Open => "OPEN",
            EyeState::Closed => "CLOSED",
        };
        write!(f, "{}", name)
    }
}
