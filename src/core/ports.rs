//! Capability ports between the detector and the outside world
//!
//! The detector depends on none of these; the monitor loop wires a landmark
//! source and a metrics sink around it.

use std::io::{BufRead, ErrorKind};

use anyhow::Context;

use crate::types::{EffectiveSettings, FrameMetrics, LandmarkFrame};

/// Port yielding one tracked frame at a time.
pub trait LandmarkSource {
    /// Next frame; `None` once the source is exhausted.
    ///
    /// # Errors
    ///
    /// Individual items may be errors if a frame cannot be decoded.
    fn next_frame(&mut self) -> Option<anyhow::Result<LandmarkFrame>>;
}

/// Port receiving every frame's decision.
pub trait MetricsSink {
    /// Publishes one frame's metrics.
    ///
    /// # Errors
    ///
    /// Returns an error if the consumer can no longer accept output.
    fn publish(&mut self, metrics: &FrameMetrics, settings: &EffectiveSettings) -> anyhow::Result<()>;

    /// Flushes any buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn flush(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<S: MetricsSink + ?Sized> MetricsSink for Box<S> {
    fn publish(&mut self, metrics: &FrameMetrics, settings: &EffectiveSettings) -> anyhow::Result<()> {
        (**self).publish(metrics, settings)
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        (**self).flush()
    }
}

/// Fan-out to several sinks
impl<S: MetricsSink> MetricsSink for Vec<S> {
    fn publish(&mut self, metrics: &FrameMetrics, settings: &EffectiveSettings) -> anyhow::Result<()> {
        self.iter_mut().try_for_each(|sink| sink.publish(metrics, settings))
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        self.iter_mut().try_for_each(|sink| sink.flush())
    }
}

/// Newline-delimited JSON frames from any reader (stdin, file, pipe)
///
/// A line that fails to decode is one error item and the stream goes on. A
/// failing reader is reported once, then the source is exhausted.
pub struct JsonLinesSource<R> {
    reader: R,
    line: String,
    line_number: usize,
    failed: bool,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_number: 0,
            failed: false,
        }
    }
}

impl<R: BufRead> LandmarkSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Option<anyhow::Result<LandmarkFrame>> {
        if self.failed {
            return None;
        }
        loop {
            self.line.clear();
            self.line_number += 1;
            match self.reader.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) => {}
                // The bad line was consumed, the next read makes progress
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    return Some(Err(e).with_context(|| format!("invalid UTF-8 on line {}", self.line_number)));
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e).context("reading landmark stream"));
                }
            }

            let line = self.line.trim();
            if line.is_empty() {
                continue;
            }
            return Some(
                serde_json::from_str(line)
                    .with_context(|| format!("invalid landmark frame on line {}", self.line_number)),
            );
        }
    }
}

/// Replays an in-memory list of frames
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    frames: std::collections::VecDeque<LandmarkFrame>,
}

impl VecSource {
    pub fn new(frames: impl IntoIterator<Item = LandmarkFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

impl LandmarkSource for VecSource {
    fn next_frame(&mut self) -> Option<anyhow::Result<LandmarkFrame>> {
        self.frames.pop_front().map(Ok)
    }
}

// =============================================================================
// TESTS
// =============================================================================
