//! Metrics sinks: where each frame's decision goes

use std::io::Write;

use anyhow::Context;
use colored::Colorize;

use crate::core::ports::MetricsSink;
use crate::types::{EffectiveSettings, FrameMetrics};

/// One JSON object per line
pub struct JsonLinesSink<W> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MetricsSink for JsonLinesSink<W> {
    fn publish(&mut self, metrics: &FrameMetrics, _settings: &EffectiveSettings) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.out, metrics).context("encoding frame metrics")?;
        writeln!(self.out).context("writing frame metrics")?;
        Ok(())
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        self.out.flush().context("flushing frame metrics")
    }
}

/// Human-readable line per frame, plus the alert presentation
pub struct TerminalSink<W> {
    out: W,
    color: bool,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MetricsSink for TerminalSink<W> {
    fn publish(&mut self, metrics: &FrameMetrics, settings: &EffectiveSettings) -> anyhow::Result<()> {
        let line = if self.color {
            metrics.to_terminal_string()
        } else {
            metrics.to_parseable_string()
        };
        writeln!(self.out, "{}", line)?;

        if metrics.alert {
            if settings.visual_alert {
                let banner = format!("  ⚠ ALERT - eyes closed for {} frames", metrics.closed_frames);
                if self.color {
                    writeln!(self.out, "{}", banner.red().bold())?;
                } else {
                    writeln!(self.out, "{}", banner)?;
                }
            }
            if settings.sound_alert {
                write!(self.out, "\x07")?; // Terminal bell
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        self.out.flush().context("flushing terminal output")
    }
}

/// Collects everything, for tests and offline analysis
#[derive(Debug, Clone, Default)]
pub struct VecSink {
    pub frames: Vec<FrameMetrics>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetricsSink for VecSink {
    fn publish(&mut self, metrics: &FrameMetrics, _settings: &EffectiveSettings) -> anyhow::Result<()> {
        self.frames.push(metrics.clone());
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
