//! Monitor: the host loop around the detector
//!
//! source frame → control snapshot → detector → sink, until the source ends.
//! Undecodable frames count as "no face"; only a failing sink stops the run.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::control::ControlSource;
use crate::core::detector::EyeClosureDetector;
use crate::core::ports::{LandmarkSource, MetricsSink};
use crate::types::{FrameDims, FrameMetrics, LandmarkFrame};

/// Totals for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub frames: u64,
    pub no_face_frames: u64,
    pub alert_frames: u64,
    pub recalibrations: u64,
    /// Frames the source could not decode
    pub source_errors: u64,
}

/// Drives a detector from a landmark source into a metrics sink
#[derive(Debug)]
pub struct Monitor<C> {
    detector: EyeClosureDetector,
    control: C,
    summary: RunSummary,
}

impl<C: ControlSource> Monitor<C> {
    pub fn new(detector: EyeClosureDetector, control: C) -> Self {
        Self {
            detector,
            control,
            summary: RunSummary::default(),
        }
    }

    /// Process one frame (`None` = undecodable) and publish the result
    pub fn step(&mut self, frame: Option<&LandmarkFrame>, sink: &mut impl MetricsSink) -> anyhow::Result<FrameMetrics> {
        let control = self.control.snapshot();
        let settings = control.settings.sanitized();
        let token_before = self.detector.last_seen_token();

        let metrics = match frame {
            Some(frame) => self.detector.process(frame, &control),
            None => self.detector.advance(None, FrameDims::new(0, 0), &control),
        };

        self.summary.frames += 1;
        if !metrics.observed() {
            self.summary.no_face_frames += 1;
        }
        if metrics.alert {
            self.summary.alert_frames += 1;
        }
        if self.detector.last_seen_token() != token_before {
            self.summary.recalibrations += 1;
        }

        sink.publish(&metrics, &settings)
            .with_context(|| format!("publishing metrics for frame {}", metrics.frame))?;
        Ok(metrics)
    }

    /// Run until the source is exhausted
    pub fn run(&mut self, source: &mut impl LandmarkSource, sink: &mut impl MetricsSink) -> anyhow::Result<RunSummary> {
        while let Some(item) = source.next_frame() {
            match item {
                Ok(frame) => {
                    self.step(Some(&frame), sink)?;
                }
                Err(e) => {
                    warn!("{e:#}");
                    self.summary.source_errors += 1;
                    self.step(None, sink)?;
                }
            }
        }
        sink.flush()?;
        debug!(summary = ?self.summary, "landmark source exhausted");
        Ok(self.summary)
    }

    pub fn detector(&self) -> &EyeClosureDetector {
        &self.detector
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }
}

// =============================================================================
// TESTS
// =============================================================================
