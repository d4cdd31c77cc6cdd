//! Eyewatch CLI
//!
//! Usage:
//!   tracker | eyewatch                          # Colored line per frame
//!   eyewatch --input frames.jsonl --json        # Metrics as JSON lines
//!   tracker | eyewatch --serve                  # HTTP/WebSocket API
//!   eyewatch --recalibrate                      # Bump the token in the control file

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use eyewatch::core::{
    AppState, ControlFile, EyeClosureDetector, JsonLinesSink, JsonLinesSource, LiveSink, MetricsSink,
    Monitor, SharedControl, TerminalSink, run_server,
};
use eyewatch::types::TuningConfig;
use eyewatch::{CALIBRATION_FRAMES, SMOOTHING_WINDOW, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "eyewatch",
    version = VERSION,
    about = "Eyewatch - self-calibrating eye-closure detector",
    long_about = "Eyewatch reads tracked face landmarks (one JSON frame per line)\n\
                  and decides every frame whether the eyes are open or closed.\n\n\
                  It first calibrates an open-eye baseline, then derives a dynamic\n\
                  threshold from it and raises an alert once the eyes stay closed\n\
                  for the configured number of frames.\n\n\
                  Frame format:\n  \
                  {\"width\": 640, \"height\": 480, \"landmarks\": [{\"x\": .., \"y\": .., \"z\": ..}, ...]}\n  \
                  (omit \"landmarks\" or set it to null when no face was found)\n\n\
                  States:\n  \
                  CALIBRATING - Learning the open-eye baseline\n  \
                  OPEN        - Eyes open\n  \
                  CLOSED      - Eyes closed (alert after frame_threshold frames)"
)]
struct Args {
    /// Landmark stream, `-` for stdin
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Control file shared with the operator UI
    #[arg(short, long, default_value = "control_state.json")]
    control: PathBuf,

    /// Output metrics as JSON lines
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Request a recalibration and exit
    #[arg(long)]
    recalibrate: bool,

    /// Frames collected before the first baseline
    #[arg(long, default_value_t = CALIBRATION_FRAMES)]
    calibration_frames: usize,

    /// Moving-average window over the raw metric
    #[arg(long, default_value_t = SMOOTHING_WINDOW)]
    smoothing_window: usize,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match args.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    // stdout carries metrics, logs go to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    if args.no_color {
        colored::control::set_override(false);
    }

    let result = if args.recalibrate {
        run_recalibrate(&args)
    } else if args.serve {
        run_serve(&args)
    } else {
        run_detect(&args)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Bump the recalibration token in the control file
fn run_recalibrate(args: &Args) -> anyhow::Result<()> {
    let mut control = ControlFile::open(&args.control)?;
    let token = control.request_recalibration()?;
    println!("recalibrate_token={}", token);
    Ok(())
}

/// Detect from the landmark stream, printing one line per frame
fn run_detect(args: &Args) -> anyhow::Result<()> {
    let control = ControlFile::open(&args.control)?;
    let detector = EyeClosureDetector::new(tuning(args), control.current().recalibrate_token);
    let mut monitor = Monitor::new(detector, control);
    let mut source = JsonLinesSource::new(open_input(&args.input)?);

    let stdout = io::stdout().lock();
    let mut sink: Box<dyn MetricsSink> = if args.json {
        Box::new(JsonLinesSink::new(stdout))
    } else {
        Box::new(TerminalSink::new(stdout, !args.no_color))
    };

    let summary = monitor.run(&mut source, &mut sink)?;
    info!(
        frames = summary.frames,
        no_face = summary.no_face_frames,
        alert_frames = summary.alert_frames,
        recalibrations = summary.recalibrations,
        "session ended"
    );
    Ok(())
}

/// Detect on a worker thread and serve results over HTTP
fn run_serve(args: &Args) -> anyhow::Result<()> {
    let seed = ControlFile::open(&args.control)?.current().clone();
    let detector = EyeClosureDetector::new(tuning(args), seed.recalibrate_token);
    let control = SharedControl::new(seed);
    let state = AppState::new(control.clone());

    let reader = open_input(&args.input)?;
    let mut sink = LiveSink::new(state.clone());
    std::thread::Builder::new()
        .name("detector".to_string())
        .spawn(move || {
            let mut monitor = Monitor::new(detector, control);
            let mut source = JsonLinesSource::new(reader);
            match monitor.run(&mut source, &mut sink) {
                Ok(summary) => info!(frames = summary.frames, "landmark stream ended"),
                Err(e) => tracing::error!("detection stopped: {e:#}"),
            }
        })
        .context("spawning detector thread")?;

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(run_server(&args.addr, state))
}

fn tuning(args: &Args) -> TuningConfig {
    TuningConfig::default().with_windows(args.smoothing_window, args.calibration_frames)
}

fn open_input(input: &str) -> anyhow::Result<Box<dyn BufRead + Send>> {
    if input == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(input).with_context(|| format!("opening landmark stream {}", input))?;
    Ok(Box::new(BufReader::new(file)))
}
