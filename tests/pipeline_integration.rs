//! Integration tests for the detection pipeline
//!
//! Tests the full path: face mesh → eye samples → ratios → smoothing →
//! baseline → threshold → classification / alert

use eyewatch::core::EyeClosureDetector;
use eyewatch::types::{
    ControlState, EyeIndexScheme, EyeIndices, EyeState, FrameMetrics, LandmarkFrame, LandmarkPoint,
    ReasonCode, TuningConfig,
};
use eyewatch::{CALIBRATION_FRAMES, DYNAMIC_RATIO_MAX, MIN_DYNAMIC_THRESHOLD};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

/// Lid gap giving openness 0.30 (57.6px over a 192px eye)
const OPEN: f64 = 0.12;
/// Lid gap giving openness 0.025
const SHUT: f64 = 0.01;

fn place_eye(mesh: &mut [LandmarkPoint], indices: &EyeIndices, x0: f64, gap: f64) {
    let top = 0.45 - gap / 2.0;
    let bottom = 0.45 + gap / 2.0;
    let xs = [x0, x0 + 0.1, x0 + 0.2, x0 + 0.3, x0 + 0.2, x0 + 0.1];
    let ys = [0.45, top, top, 0.45, bottom, bottom];
    for k in 0..6 {
        mesh[indices.contour[k]] = LandmarkPoint::new(xs[k], ys[k], 0.0);
    }

    // Lid points outside the contour sit straight above/below their partner
    for &(a, b) in indices.vertical_pairs.iter() {
        let in_contour = |i: usize| indices.contour.contains(&i);
        if !in_contour(a) {
            let x = if in_contour(b) { mesh[b].x } else { x0 + 0.15 };
            mesh[a] = LandmarkPoint::new(x, top, 0.0);
        }
        if !in_contour(b) {
            let x = if in_contour(a) { mesh[a].x } else { x0 + 0.15 };
            mesh[b] = LandmarkPoint::new(x, bottom, 0.0);
        }
    }
}

/// Full 478-point mesh with both eyes open by `gap`
fn face(gap: f64) -> LandmarkFrame {
    let mut mesh = vec![LandmarkPoint::new(0.5, 0.5, 0.0); 478];
    let scheme = EyeIndexScheme::FACE_MESH;
    place_eye(&mut mesh, &scheme.left, 0.20, gap);
    place_eye(&mut mesh, &scheme.right, 0.55, gap);
    LandmarkFrame::with_face(WIDTH, HEIGHT, mesh)
}

fn control(frame_threshold: i64) -> ControlState {
    let mut control = ControlState::default();
    control.settings.frame_threshold = frame_threshold;
    control
}

/// Detector without smoothing lag, so every frame is judged on its own
fn unsmoothed() -> EyeClosureDetector {
    EyeClosureDetector::new(TuningConfig::default().with_windows(1, CALIBRATION_FRAMES), 0)
}

fn calibrate(detector: &mut EyeClosureDetector, control: &ControlState) -> Vec<FrameMetrics> {
    (0..CALIBRATION_FRAMES).map(|_| detector.process(&face(OPEN), control)).collect()
}

#[test]
fn test_mesh_fixture_measures_expected_openness() {
    let mut detector = EyeClosureDetector::default();
    let output = detector.process(&face(OPEN), &control(50));
    let raw = output.raw.unwrap();
    assert!((raw - 0.30).abs() < 1e-9, "open raw = {}", raw);

    let output = detector.process(&face(SHUT), &control(50));
    assert!((output.raw.unwrap() - 0.025).abs() < 1e-9);
}

#[test]
fn test_calibration_then_open() {
    let mut detector = EyeClosureDetector::default();
    let ctl = control(50);

    let outputs = calibrate(&mut detector, &ctl);
    assert!(outputs.iter().all(|m| m.state == Some(EyeState::Calibrating)));
    assert!(outputs.iter().all(|m| m.closed_frames == 0 && !m.alert));
    assert_eq!(outputs.last().unwrap().reason, ReasonCode::R001_CALIBRATION_COMPLETE);

    let baseline = detector.baseline().unwrap();
    assert!((baseline - 0.30).abs() < 1e-9, "baseline = {}", baseline);

    let output = detector.process(&face(OPEN), &ctl);
    assert_eq!(output.state, Some(EyeState::Open));
    // 0.30 − 0.30 × 0.08
    assert!((output.threshold.unwrap() - 0.276).abs() < 1e-9);
}

#[test]
fn test_uncalibrated_threshold_is_default() {
    let mut detector = EyeClosureDetector::default();
    let output = detector.process(&face(OPEN), &control(50));
    assert_eq!(output.threshold, Some(eyewatch::DEFAULT_EAR_THRESHOLD));
    assert_eq!(output.baseline, None);
}

#[test]
fn test_closed_run_counts_then_resets() {
    let mut detector = unsmoothed();
    let ctl = control(50);
    calibrate(&mut detector, &ctl);

    for n in 1..=12u32 {
        let output = detector.process(&face(SHUT), &ctl);
        assert_eq!(output.state, Some(EyeState::Closed));
        assert_eq!(output.closed_frames, n);
    }
    let output = detector.process(&face(OPEN), &ctl);
    assert_eq!(output.state, Some(EyeState::Open));
    assert_eq!(output.closed_frames, 0);
}

#[test]
fn test_alert_edge_with_frame_threshold_three() {
    let mut detector = unsmoothed();
    let ctl = control(3);
    calibrate(&mut detector, &ctl);

    let alerts: Vec<bool> = (0..3).map(|_| detector.process(&face(SHUT), &ctl).alert).collect();
    assert_eq!(alerts, vec![false, false, true]);

    let output = detector.process(&face(OPEN), &ctl);
    assert!(!output.alert);
    assert_eq!(output.reason, ReasonCode::R003_ALERT_CLEARED);
}

#[test]
fn test_live_frame_threshold_edits_report_alert_edges() {
    let mut detector = unsmoothed();
    let mut ctl = control(50);
    calibrate(&mut detector, &ctl);

    for _ in 0..5 {
        detector.process(&face(SHUT), &ctl);
    }
    ctl.settings.frame_threshold = 3;
    let onset = detector.process(&face(SHUT), &ctl);
    assert!(onset.alert);
    assert_eq!(onset.reason, ReasonCode::R003_ALERT_RAISED);

    ctl.settings.frame_threshold = 50;
    let reopened = detector.process(&face(OPEN), &ctl);
    assert!(!reopened.alert);
    assert_eq!(reopened.reason, ReasonCode::R003_ALERT_CLEARED);
}

#[test]
fn test_blink_never_alerts() {
    let mut detector = EyeClosureDetector::default();
    let ctl = control(50);
    calibrate(&mut detector, &ctl);

    for _ in 0..20 {
        for gap in [OPEN, SHUT, SHUT, OPEN, OPEN, OPEN, OPEN, OPEN] {
            let output = detector.process(&face(gap), &ctl);
            assert!(!output.alert);
        }
    }
}

#[test]
fn test_smoothing_delays_closure_by_window() {
    let mut detector = EyeClosureDetector::default();
    let ctl = control(50);
    calibrate(&mut detector, &ctl);

    // (0.30 + 0.30 + 0.025) / 3 ≈ 0.208 is already under 0.276
    let first = detector.process(&face(SHUT), &ctl);
    assert_eq!(first.state, Some(EyeState::Closed));
    assert!(first.smoothed.unwrap() > first.raw.unwrap());

    // Reopening needs the window to refill with open frames
    detector.process(&face(SHUT), &ctl);
    detector.process(&face(SHUT), &ctl);
    let reopening = detector.process(&face(OPEN), &ctl);
    assert_eq!(reopening.state, Some(EyeState::Closed));
    detector.process(&face(OPEN), &ctl);
    let open = detector.process(&face(OPEN), &ctl);
    assert_eq!(open.state, Some(EyeState::Open));
}

#[test]
fn test_long_closure_never_moves_baseline() {
    let mut detector = EyeClosureDetector::default();
    let ctl = control(50);
    calibrate(&mut detector, &ctl);
    let before = detector.baseline();

    let mut alert_frames = 0;
    for _ in 0..500 {
        if detector.process(&face(SHUT), &ctl).alert {
            alert_frames += 1;
        }
    }
    assert_eq!(detector.baseline(), before);
    assert_eq!(alert_frames, 500 - 49);
}

#[test]
fn test_baseline_follows_slow_drift() {
    let mut detector = EyeClosureDetector::default();
    let ctl = control(50);
    calibrate(&mut detector, &ctl);

    // Glasses repositioned: eyes now measure 0.325
    for _ in 0..300 {
        let output = detector.process(&face(0.13), &ctl);
        assert_eq!(output.state, Some(EyeState::Open));
    }
    let baseline = detector.baseline().unwrap();
    assert!(baseline > 0.315 && baseline <= 0.325 + 1e-9, "baseline = {}", baseline);
}

#[test]
fn test_no_face_resets_run_and_keeps_calibration() {
    let mut detector = unsmoothed();
    let ctl = control(50);
    calibrate(&mut detector, &ctl);

    for _ in 0..10 {
        detector.process(&face(SHUT), &ctl);
    }
    assert_eq!(detector.closed_run_length(), 10);

    let output = detector.process(&LandmarkFrame::empty(WIDTH, HEIGHT), &ctl);
    assert_eq!(output.state, None);
    assert_eq!(output.closed_frames, 0);
    assert!(!output.alert);
    assert!(detector.is_calibrated());

    let output = detector.process(&face(SHUT), &ctl);
    assert_eq!(output.closed_frames, 1);
}

#[test]
fn test_truncated_mesh_is_no_face() {
    let mut detector = EyeClosureDetector::default();
    let mut frame = face(OPEN);
    if let Some(mesh) = frame.landmarks.as_mut() {
        mesh.truncate(300);
    }
    let output = detector.process(&frame, &control(50));
    assert_eq!(output.reason, ReasonCode::R004_NO_FACE);
    assert_eq!(detector.calibration_progress(), (0, CALIBRATION_FRAMES));
}

#[test]
fn test_recalibration_restarts_calibration() {
    let mut detector = EyeClosureDetector::default();
    let mut ctl = control(50);
    calibrate(&mut detector, &ctl);

    ctl.recalibrate_token = 1;
    let outputs = calibrate(&mut detector, &ctl);
    assert_eq!(outputs[0].reason, ReasonCode::R001_RECALIBRATED);
    assert!(outputs.iter().all(|m| m.state == Some(EyeState::Calibrating)));
    assert!(detector.is_calibrated());

    // Same token again: no further reset
    let output = detector.process(&face(OPEN), &ctl);
    assert_eq!(output.state, Some(EyeState::Open));
}

#[test]
fn test_recalibration_clears_active_alert() {
    let mut detector = unsmoothed();
    let mut ctl = control(3);
    calibrate(&mut detector, &ctl);
    for _ in 0..5 {
        detector.process(&face(SHUT), &ctl);
    }

    ctl.recalibrate_token = 99;
    let output = detector.process(&face(SHUT), &ctl);
    assert_eq!(output.state, Some(EyeState::Calibrating));
    assert_eq!(output.closed_frames, 0);
    assert!(!output.alert);
}

#[test]
fn test_out_of_range_ratio_is_clamped() {
    let mut detector = EyeClosureDetector::default();
    let mut ctl = control(50);
    calibrate(&mut detector, &ctl);

    ctl.settings.dynamic_ratio = 1.4;
    let output = detector.process(&face(OPEN), &ctl);
    let threshold = output.threshold.unwrap();
    let baseline = output.baseline.unwrap();

    // Clamped to DYNAMIC_RATIO_MAX: drop = max(0.015, 0.30 × 0.02)
    assert!(DYNAMIC_RATIO_MAX < 1.0);
    assert!((threshold - (baseline - 0.015)).abs() < 1e-9);
    assert!(threshold >= MIN_DYNAMIC_THRESHOLD && threshold <= baseline);
}

#[test]
fn test_non_positive_frame_threshold_is_clamped() {
    let mut detector = unsmoothed();
    let ctl = control(-4);
    calibrate(&mut detector, &ctl);

    // Clamped to 1: the first closed frame alerts
    let output = detector.process(&face(SHUT), &ctl);
    assert!(output.alert);
}

#[test]
fn test_json_output_valid() {
    let mut detector = EyeClosureDetector::default();
    let output = detector.process(&face(OPEN), &control(50));

    let json = serde_json::to_string(&output).unwrap();
    assert!(json.contains("\"state\":\"CALIBRATING\""));
    assert!(json.contains("\"closed_frames\""));
    assert!(json.contains("\"reason\""));

    let _: FrameMetrics = serde_json::from_str(&json).unwrap();
}

#[test]
fn test_parseable_output_format() {
    let mut detector = EyeClosureDetector::default();
    let output = detector.process(&face(OPEN), &control(50));
    let formatted = output.to_parseable_string();

    assert!(formatted.contains("frame=1"));
    assert!(formatted.contains("ear="));
    assert!(formatted.contains("thr="));
    assert!(formatted.contains("state=CALIBRATING"));
    assert!(formatted.contains("reason=R001_CALIBRATING"));
}
