//! End-to-end temporal properties over synthetic clips.

use gonio_clinical::{ClinicalJointMeasurement, ClinicalMeasurementService, CompensationType, Severity};
use gonio_core::synthetic::SyntheticPose;
use gonio_core::{EngineConfig, Side, Timestamp, ViewOrientation};
use gonio_temporal::{TemporalAnalyzer, TemporalMeasurementSequence, TrajectoryPattern};

const FPS: f64 = 30.0;

fn at_frame(i: usize) -> Timestamp {
    Timestamp::from_secs_f64(i as f64 / FPS)
}

/// Measure shoulder flexion for every angle, one frame each
fn flexion_clip(angles: &[f64]) -> TemporalMeasurementSequence {
    let mut service = ClinicalMeasurementService::from_config(&EngineConfig::default()).unwrap();
    let measurements: Vec<ClinicalJointMeasurement> = angles
        .iter()
        .enumerate()
        .map(|(i, &angle)| {
            let pose = SyntheticPose::new(ViewOrientation::Sagittal, Side::Left)
                .shoulder_flexion(angle)
                .at(at_frame(i))
                .generate();
            service.measure_shoulder_flexion(&pose, Side::Left).unwrap()
        })
        .collect();
    TemporalMeasurementSequence::from_measurements(measurements, FPS)
}

fn ramp(frames: usize, from: f64, to: f64) -> Vec<f64> {
    (0..frames)
        .map(|i| from + (to - from) * i as f64 / (frames - 1) as f64)
        .collect()
}

#[test]
fn smooth_ramp_passes_as_increasing() {
    let clip = flexion_clip(&ramp(150, 0.0, 150.0));
    let result = TemporalAnalyzer::default()
        .analyze(&clip, &vec![0.9; 150], Some(TrajectoryPattern::Increasing))
        .unwrap();

    assert_eq!(result.consistency.sudden_jumps, 0);
    assert!(result.consistency.smoothness_score > 0.8, "{}", result.consistency.smoothness_score);
    assert_eq!(result.trajectory.observed, TrajectoryPattern::Increasing);
    assert!(result.trajectory.matches_expected);
    assert!(result.passed, "{:?}", result.failures);
    assert!((result.duration_secs - 149.0 / FPS).abs() < 1e-6);
    // ~1°/frame at 30 fps
    assert!((result.trajectory.average_velocity - 30.2).abs() < 1.0);
}

#[test]
fn single_frame_jump_fails() {
    let mut angles = ramp(90, 20.0, 110.0);
    angles[45] += 30.0;
    let clip = flexion_clip(&angles);
    let analyzer = TemporalAnalyzer::default();

    let result = analyzer.analyze(&clip, &vec![0.9; 90], None).unwrap();
    assert!(result.consistency.sudden_jumps >= 1);
    assert!(!result.passed);

    let anomalies = analyzer.detect_anomalous_frames(&clip).unwrap();
    assert!(anomalies.iter().any(|a| a.frame == 45));
}

#[test]
fn decaying_quality_is_reported() {
    let clip = flexion_clip(&ramp(150, 10.0, 100.0));
    let qualities = ramp(150, 0.95, 0.65);

    let result = TemporalAnalyzer::default().analyze(&clip, &qualities, None).unwrap();
    assert!(result.quality.degradation_rate < 0.0);
    assert!(result.quality.final_quality < result.quality.initial_quality);
    assert!((result.quality.min_quality - 0.65).abs() < 1e-9);
    // Still above the floor: warned, not failed
    assert!(result.passed);
    assert!(result.issues.iter().any(|i| i.contains("quality")));
}

#[test]
fn wraparound_sequence_is_continuous() {
    // Angles arrive already wrapped into [0, 360)
    let mut clip = flexion_clip(&[30.0; 12]);
    let angles = [340.0, 345.0, 350.0, 355.0, 0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0];
    for (m, angle) in clip.measurements.iter_mut().zip(angles) {
        m.primary.angle = angle;
    }

    let result = TemporalAnalyzer::default()
        .analyze(&clip, &[0.9; 12], Some(TrajectoryPattern::Increasing))
        .unwrap();
    assert_eq!(result.consistency.sudden_jumps, 0);
    assert!((result.consistency.max_delta - 5.0).abs() < 1e-9);
    assert_eq!(result.trajectory.observed, TrajectoryPattern::Increasing);
    assert!((result.trajectory.displacement - 55.0).abs() < 1e-9);
    assert!(result.passed);
}

#[test]
fn held_position_is_static() {
    let clip = flexion_clip(&[90.0; 45]);
    let result = TemporalAnalyzer::default()
        .analyze_recorded(&clip, Some(TrajectoryPattern::Static))
        .unwrap();
    assert_eq!(result.trajectory.observed, TrajectoryPattern::Static);
    assert!((result.trajectory.trend_consistency - 1.0).abs() < 1e-12);
    assert!(result.passed);
}

#[test]
fn stalled_timestamps_use_the_frame_clock_for_quality_trend() {
    let timed = flexion_clip(&ramp(150, 10.0, 100.0));
    let stalled = TemporalMeasurementSequence::new(
        timed.measurements.clone(),
        vec![Timestamp(0); 150],
        FPS,
    );
    let qualities = ramp(150, 0.95, 0.65);
    let analyzer = TemporalAnalyzer::default();

    let result = analyzer.analyze(&stalled, &qualities, None).unwrap();
    // 0.3 lost over 149 nominal frames
    let expected = -0.3 / (149.0 / FPS);
    assert!(
        (result.quality.degradation_rate - expected).abs() < 1e-9,
        "{}",
        result.quality.degradation_rate
    );
    assert!((result.duration_secs - 149.0 / FPS).abs() < 1e-9);

    let reference = analyzer.analyze(&timed, &qualities, None).unwrap();
    assert!((result.quality.degradation_rate - reference.quality.degradation_rate).abs() < 1e-6);
}

#[test]
fn growing_trunk_lean_is_tracked_as_persistent_and_progressive() {
    let mut service = ClinicalMeasurementService::from_config(&EngineConfig::default()).unwrap();
    let frames = 60;
    let measurements: Vec<ClinicalJointMeasurement> = (0..frames)
        .map(|i| {
            let pose = SyntheticPose::new(ViewOrientation::Frontal, Side::Left)
                .shoulder_abduction(60.0)
                .trunk_lean(27.0 * i as f64 / (frames - 1) as f64)
                .at(at_frame(i))
                .generate();
            service.measure_shoulder_abduction(&pose, Side::Left).unwrap()
        })
        .collect();
    let clip = TemporalMeasurementSequence::from_measurements(measurements, FPS);

    let result = TemporalAnalyzer::default()
        .analyze(&clip, &vec![0.9; frames], None)
        .unwrap();
    let lean = result.tracking(CompensationType::TrunkLean).unwrap();
    assert!(lean.is_persistent);
    assert!(lean.is_progressive);
    assert!(lean.persistence_rate > 0.75);
    assert_eq!(lean.peak_severity, Severity::Severe);
    assert!(result.has_persistent_compensation());

    // Compensations are soft warnings only
    assert!(result.passed, "{:?}", result.failures);
    assert!(result.issues.iter().any(|i| i.starts_with("Persistent trunk lean")));
    assert!(result.issues.iter().any(|i| i.starts_with("Trunk lean worsens")));
}
