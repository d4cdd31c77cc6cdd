//! Core types for Eyewatch

mod state;
mod reason;
mod output;
mod landmark;
mod config;

pub use state::EyeState;
pub use reason::ReasonCode;
pub use output::FrameMetrics;
pub use landmark::{
    LandmarkPoint, LandmarkPair, EyeSample, EyePair, EyeIndices, EyeIndexScheme,
    LandmarkFrame, FrameDims,
};
pub use config::{DetectorSettings, EffectiveSettings, TuningConfig, ControlState};
