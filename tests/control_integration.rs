//! Integration tests for the control file and monitor loop
//!
//! Tests that operator edits on disk reach the detector on the next frame

use std::fs;
use std::io::Cursor;

use eyewatch::core::{ControlFile, EyeClosureDetector, JsonLinesSource, Monitor, VecSink};
use eyewatch::types::{EyeIndexScheme, EyeIndices, EyeState, LandmarkFrame, LandmarkPoint, ReasonCode, TuningConfig};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn place_eye(mesh: &mut [LandmarkPoint], indices: &EyeIndices, x0: f64, gap: f64) {
    let (top, bottom) = (0.45 - gap / 2.0, 0.45 + gap / 2.0);
    let xs = [x0, x0 + 0.1, x0 + 0.2, x0 + 0.3, x0 + 0.2, x0 + 0.1];
    let ys = [0.45, top, top, 0.45, bottom, bottom];
    for k in 0..6 {
        mesh[indices.contour[k]] = LandmarkPoint::new(xs[k], ys[k], 0.0);
    }
    for &(a, b) in indices.vertical_pairs.iter() {
        if !indices.contour.contains(&a) {
            mesh[a] = LandmarkPoint::new(x0 + 0.15, top, 0.0);
        }
        if !indices.contour.contains(&b) {
            mesh[b] = LandmarkPoint::new(mesh[a].x, bottom, 0.0);
        }
    }
}

fn face(gap: f64) -> LandmarkFrame {
    let mut mesh = vec![LandmarkPoint::new(0.5, 0.5, 0.0); 478];
    let scheme = EyeIndexScheme::FACE_MESH;
    place_eye(&mut mesh, &scheme.left, 0.20, gap);
    place_eye(&mut mesh, &scheme.right, 0.55, gap);
    LandmarkFrame::with_face(640, 480, mesh)
}

fn monitor_for(control: ControlFile) -> Monitor<ControlFile> {
    let tuning = TuningConfig::default().with_windows(1, 5);
    let detector = EyeClosureDetector::new(tuning, control.current().recalibrate_token);
    Monitor::new(detector, control)
}

#[test]
fn test_missing_control_file_runs_on_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("control_state.json");

    let control = ControlFile::open(&path).unwrap();
    assert!(path.exists());

    let mut monitor = monitor_for(control);
    let mut sink = VecSink::new();
    let metrics = monitor.step(Some(&face(0.12)), &mut sink).unwrap();
    assert_eq!(metrics.state, Some(EyeState::Calibrating));
}

#[test]
fn test_frame_threshold_edit_applies_next_frame() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("control_state.json");
    let mut monitor = monitor_for(ControlFile::open(&path).unwrap());
    let mut sink = VecSink::new();

    for _ in 0..5 {
        monitor.step(Some(&face(0.12)), &mut sink).unwrap();
    }
    monitor.step(Some(&face(0.01)), &mut sink).unwrap();
    let second = monitor.step(Some(&face(0.01)), &mut sink).unwrap();
    assert!(!second.alert);

    fs::write(&path, r#"{"recalibrate_token": 0, "settings": {"frame_threshold": 3}}"#).unwrap();
    let third = monitor.step(Some(&face(0.01)), &mut sink).unwrap();
    assert!(third.alert);
    assert_eq!(third.reason, ReasonCode::R003_ALERT_RAISED);
}

#[test]
fn test_token_bump_on_disk_recalibrates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("control_state.json");
    let mut monitor = monitor_for(ControlFile::open(&path).unwrap());
    let mut sink = VecSink::new();

    for _ in 0..6 {
        monitor.step(Some(&face(0.12)), &mut sink).unwrap();
    }
    assert!(monitor.detector().is_calibrated());

    // The UI (or `eyewatch --recalibrate`) holds its own handle
    let mut operator = ControlFile::open(&path).unwrap();
    assert_eq!(operator.request_recalibration().unwrap(), 1);

    let metrics = monitor.step(Some(&face(0.12)), &mut sink).unwrap();
    assert_eq!(metrics.reason, ReasonCode::R001_RECALIBRATED);
    assert!(!monitor.detector().is_calibrated());
    assert_eq!(monitor.summary().recalibrations, 1);
}

#[test]
fn test_half_written_control_file_keeps_settings() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("control_state.json");
    fs::write(&path, r#"{"recalibrate_token": 7, "settings": {"frame_threshold": 2}}"#).unwrap();
    let mut monitor = monitor_for(ControlFile::open(&path).unwrap());
    let mut sink = VecSink::new();

    for _ in 0..5 {
        monitor.step(Some(&face(0.12)), &mut sink).unwrap();
    }

    fs::write(&path, r#"{"recalibrate_token": 7, "sett"#).unwrap();
    monitor.step(Some(&face(0.01)), &mut sink).unwrap();
    let metrics = monitor.step(Some(&face(0.01)), &mut sink).unwrap();
    assert!(metrics.alert);
    assert_eq!(monitor.summary().recalibrations, 0);
}

#[test]
fn test_json_lines_stream_end_to_end() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("control_state.json");
    let mut monitor = monitor_for(ControlFile::open(&path).unwrap());

    let mut stream = String::new();
    for gap in [0.12, 0.12, 0.12, 0.12, 0.12, 0.12] {
        stream.push_str(&serde_json::to_string(&face(gap)).unwrap());
        stream.push('\n');
    }
    stream.push_str("{\"width\": 640, \"height\": 480, \"landmarks\": null}\n");
    stream.push_str("garbage\n");
    stream.push_str(&serde_json::to_string(&face(0.01)).unwrap());
    stream.push('\n');

    let mut source = JsonLinesSource::new(Cursor::new(stream));
    let mut sink = VecSink::new();
    let summary = monitor.run(&mut source, &mut sink).unwrap();

    assert_eq!(summary.frames, 9);
    assert_eq!(summary.no_face_frames, 2);
    assert_eq!(summary.source_errors, 1);

    let states: Vec<Option<EyeState>> = sink.frames.iter().map(|m| m.state).collect();
    assert_eq!(states[4], Some(EyeState::Calibrating));
    assert_eq!(states[5], Some(EyeState::Open));
    assert_eq!(states[6], None);
    assert_eq!(states[8], Some(EyeState::Closed));
    assert_eq!(sink.frames[8].closed_frames, 1);
    assert_eq!(sink.frames[8].frame, 9);
}

#[test]
fn test_float_frame_threshold_with_token_bump() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("control_state.json");
    let ui_document = r#"{"recalibrate_token": 0, "overlays": {"text": true}, "settings": {"frame_threshold": 40.0, "theme": "dark"}}"#;
    fs::write(&path, ui_document).unwrap();

    // Hand-edited float is coerced, the document is not replaced with defaults
    let control = ControlFile::open(&path).unwrap();
    assert_eq!(control.current().settings.frame_threshold, 40);
    assert_eq!(fs::read_to_string(&path).unwrap(), ui_document);

    let mut monitor = monitor_for(control);
    let mut sink = VecSink::new();
    for _ in 0..6 {
        monitor.step(Some(&face(0.12)), &mut sink).unwrap();
    }

    fs::write(&path, r#"{"recalibrate_token": 3, "settings": {"frame_threshold": 2.9}}"#).unwrap();
    let metrics = monitor.step(Some(&face(0.12)), &mut sink).unwrap();
    assert_eq!(metrics.reason, ReasonCode::R001_RECALIBRATED);
    assert_eq!(monitor.detector().last_seen_token(), 3);
    assert_eq!(monitor.summary().recalibrations, 1);
}
