//! Cross-crate properties of the clinical measurement pipeline.

use gonio_clinical::{
    ClinicalGrade, ClinicalMeasurementService, CompensationType, QualityLevel, Severity,
};
use gonio_core::synthetic::SyntheticPose;
use gonio_core::{EngineConfig, Error, FrameType, LandmarkName, MovementType, Side, ViewOrientation};
use gonio_frames::{FrameBuilder, FrameSet};

fn service() -> ClinicalMeasurementService {
    ClinicalMeasurementService::from_config(&EngineConfig::default()).unwrap()
}

#[test]
fn shoulder_flexion_at_target_is_excellent_and_uncompensated() {
    let mut service = service();
    let pose = SyntheticPose::new(ViewOrientation::Sagittal, Side::Right)
        .shoulder_flexion(160.0)
        .generate();

    let m = service.measure_shoulder_flexion(&pose, Side::Right).unwrap();

    assert!((m.primary.angle - 160.0).abs() <= 1.0, "angle {}", m.primary.angle);
    assert_eq!(m.primary.grade, ClinicalGrade::Excellent);
    assert!((m.primary.percent_of_target - 100.0).abs() < 1.0);
    assert!(m.compensations.is_empty(), "{:?}", m.compensations);
    assert_eq!(m.primary.target_angle, 160.0);
}

#[test]
fn flexion_grading_is_monotone() {
    let mut service = service();
    let mut last_percent = f64::NEG_INFINITY;
    let mut last_grade = ClinicalGrade::Limited;

    for step in 0..=36 {
        let angle = step as f64 * 5.0;
        let pose = SyntheticPose::new(ViewOrientation::Sagittal, Side::Left)
            .shoulder_flexion(angle)
            .generate();
        let m = service.measure_shoulder_flexion(&pose, Side::Left).unwrap();

        assert!(
            m.primary.percent_of_target >= last_percent - 1e-9,
            "percent regressed at {angle}°"
        );
        assert!(m.primary.grade >= last_grade, "grade regressed at {angle}°");
        last_percent = m.primary.percent_of_target;
        last_grade = m.primary.grade;
    }
    assert_eq!(last_grade, ClinicalGrade::Excellent);
}

#[test]
fn trunk_lean_thresholds_match_bands() {
    let mut service = service();
    let lean = |service: &mut ClinicalMeasurementService, degrees: f64| {
        let pose = SyntheticPose::new(ViewOrientation::Frontal, Side::Left)
            .shoulder_abduction(45.0)
            .trunk_lean(degrees)
            .generate();
        service
            .measure_shoulder_abduction(&pose, Side::Left)
            .unwrap()
            .compensations
            .into_iter()
            .find(|c| c.compensation_type == CompensationType::TrunkLean)
    };

    assert!(lean(&mut service, 3.0).is_none());
    assert_eq!(lean(&mut service, 7.0).unwrap().severity, Severity::Mild);
    assert_eq!(lean(&mut service, 25.0).unwrap().severity, Severity::Severe);
}

fn mean_absolute_error(
    service: &mut ClinicalMeasurementService,
    movement: MovementType,
    view: ViewOrientation,
    side: Side,
) -> f64 {
    let truths = [0.0, 30.0, 60.0, 90.0, 120.0, 150.0, 180.0];
    let total: f64 = truths
        .iter()
        .map(|&truth| {
            let pose = SyntheticPose::new(view, side);
            let pose = match movement {
                MovementType::ShoulderFlexion => pose.shoulder_flexion(truth),
                MovementType::ShoulderAbduction => pose.shoulder_abduction(truth),
                _ => unreachable!(),
            };
            let m = service.measure(movement, &pose.generate(), side).unwrap();
            (m.primary.angle - truth).abs()
        })
        .sum();
    total / truths.len() as f64
}

#[test]
fn synthetic_round_trip_accuracy() {
    let mut service = service();
    for side in [Side::Left, Side::Right] {
        let flexion = mean_absolute_error(
            &mut service,
            MovementType::ShoulderFlexion,
            ViewOrientation::Sagittal,
            side,
        );
        assert!(flexion < 5.0, "flexion MAE {flexion}");

        let abduction = mean_absolute_error(
            &mut service,
            MovementType::ShoulderAbduction,
            ViewOrientation::Frontal,
            side,
        );
        assert!(abduction < 5.0, "abduction MAE {abduction}");

        let posterior = mean_absolute_error(
            &mut service,
            MovementType::ShoulderAbduction,
            ViewOrientation::Posterior,
            side,
        );
        assert!(posterior < 5.0, "posterior abduction MAE {posterior}");
    }
}

#[test]
fn frontal_flexion_with_depth_is_accurate() {
    let mut service = service();
    for truth in [30.0, 90.0, 150.0] {
        let pose = SyntheticPose::new(ViewOrientation::Frontal, Side::Right)
            .shoulder_flexion(truth)
            .with_depth(true)
            .generate();
        let m = service.measure_shoulder_flexion(&pose, Side::Right).unwrap();
        assert!((m.primary.angle - truth).abs() < 1e-6, "{truth}: {}", m.primary.angle);
        assert_eq!(m.quality.depth_reliability, 1.0);
        assert_eq!(m.quality.overall, QualityLevel::Excellent);
    }
}

#[test]
fn unsupported_view_is_rejected() {
    let mut service = service();
    let frontal = SyntheticPose::new(ViewOrientation::Frontal, Side::Left).generate();
    let sagittal = SyntheticPose::new(ViewOrientation::Sagittal, Side::Left).generate();
    let posterior = SyntheticPose::new(ViewOrientation::Posterior, Side::Left).generate();

    let err = service.measure_knee_flexion(&frontal, Side::Left).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidViewOrientation {
            view: ViewOrientation::Frontal,
            ..
        }
    ));
    assert!(err.is_recoverable());

    assert!(matches!(
        service.measure_shoulder_abduction(&sagittal, Side::Left),
        Err(Error::InvalidViewOrientation { .. })
    ));
    assert!(matches!(
        service.measure_shoulder_rotation(&posterior, Side::Left),
        Err(Error::InvalidViewOrientation { .. })
    ));
}

#[test]
fn measuring_without_upstream_frames_is_missing_frame() {
    let service = service();
    let pose = SyntheticPose::new(ViewOrientation::Frontal, Side::Left).generate();

    let err = service
        .measure_with_frames(MovementType::ShoulderFlexion, &pose, Side::Left, &FrameSet::new())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::MissingFrame {
            frame: FrameType::Thorax
        }
    ));

    let builder = FrameBuilder::default();
    let mut frames = FrameSet::new();
    for frame_type in [FrameType::Global, FrameType::Thorax, FrameType::UpperArmLeft] {
        frames.insert(builder.build(frame_type, &pose, &frames).unwrap());
    }
    let err = service
        .measure_with_frames(MovementType::ShoulderRotation, &pose, Side::Left, &frames)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::MissingFrame {
            frame: FrameType::ForearmLeft
        }
    ));

    // The same frames suffice for flexion
    assert!(service
        .measure_with_frames(MovementType::ShoulderFlexion, &pose, Side::Left, &frames)
        .is_ok());
}

#[test]
fn occluded_limb_is_insufficient() {
    let mut service = service();
    let mut pose = SyntheticPose::new(ViewOrientation::Sagittal, Side::Right)
        .shoulder_flexion(90.0)
        .generate();
    pose.insert(LandmarkName::RightElbow, 0.6, 0.35, None, 0.2);

    let err = service.measure_shoulder_flexion(&pose, Side::Right).unwrap_err();
    match err {
        Error::InsufficientLandmarks { missing, .. } => {
            assert_eq!(missing, vec![LandmarkName::RightElbow]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn frontal_flexion_without_depth_tracks_foreshortening() {
    let mut service = service();
    // 90° points the arm straight at the camera and has no 2D segment
    let truths = [0.0, 30.0, 60.0, 89.0, 91.0, 120.0, 150.0, 180.0];
    for side in [Side::Left, Side::Right] {
        let mut total = 0.0;
        for truth in truths {
            let pose = SyntheticPose::new(ViewOrientation::Frontal, side)
                .shoulder_flexion(truth)
                .generate();
            let m = service.measure_shoulder_flexion(&pose, side).unwrap();
            let error = (m.primary.angle - truth).abs();
            assert!(error < 1e-3, "{side} {truth}: got {}", m.primary.angle);
            total += error;
        }
        let mae = total / truths.len() as f64;
        assert!(mae < 5.0, "{side} frontal flexion MAE {mae}");
    }
}

#[test]
fn elbow_and_knee_round_trip() {
    let mut service = service();
    for side in [Side::Left, Side::Right] {
        let elbow_truths = [0.0, 30.0, 60.0, 90.0, 120.0, 145.0];
        let elbow: f64 = elbow_truths
            .iter()
            .map(|&truth| {
                let pose = SyntheticPose::new(ViewOrientation::Sagittal, side)
                    .elbow_flexion(truth)
                    .generate();
                let m = service.measure_elbow_flexion(&pose, side).unwrap();
                (m.primary.angle - truth).abs()
            })
            .sum::<f64>()
            / elbow_truths.len() as f64;
        assert!(elbow < 5.0, "{side} elbow MAE {elbow}");

        let knee_truths = [0.0, 30.0, 60.0, 90.0, 120.0];
        let knee: f64 = knee_truths
            .iter()
            .map(|&truth| {
                let pose = SyntheticPose::new(ViewOrientation::Sagittal, side)
                    .knee_flexion(truth)
                    .generate();
                let m = service.measure_knee_flexion(&pose, side).unwrap();
                (m.primary.angle - truth).abs()
            })
            .sum::<f64>()
            / knee_truths.len() as f64;
        assert!(knee < 5.0, "{side} knee MAE {knee}");
    }
}

#[test]
fn rotation_round_trip_without_depth() {
    let mut service = service();
    let truths = [-30.0, 0.0, 45.0, 80.0];
    for side in [Side::Left, Side::Right] {
        let mae: f64 = truths
            .iter()
            .map(|&truth| {
                let pose = SyntheticPose::new(ViewOrientation::Frontal, side)
                    .elbow_flexion(90.0)
                    .shoulder_rotation(truth)
                    .generate();
                let m = service.measure_shoulder_rotation(&pose, side).unwrap();
                (m.primary.angle - truth).abs()
            })
            .sum::<f64>()
            / truths.len() as f64;
        assert!(mae < 5.0, "{side} rotation MAE {mae}");
    }
}

#[test]
fn rhythm_tolerates_shoulder_jitter() {
    let mut service = service();
    for side in [Side::Left, Side::Right] {
        for hike_cm in [-0.1, 0.1] {
            let pose = SyntheticPose::new(ViewOrientation::Frontal, side)
                .shoulder_abduction(90.0)
                .shoulder_hike_cm(hike_cm)
                .generate();
            let m = service.measure_shoulder_abduction(&pose, side).unwrap();

            let rhythm = m.primary.rhythm.unwrap();
            let ratio = rhythm.ratio.unwrap();
            assert!(rhythm.is_normal, "{side} {hike_cm} cm: ratio {ratio}");
            assert!((2.0..=3.5).contains(&ratio), "{ratio}");
            assert!(
                !m.has_compensation(CompensationType::ShoulderHiking),
                "{:?}",
                m.compensations
            );
        }
    }
}
