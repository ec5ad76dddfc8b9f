//! Clinical joint measurement service.
//!
//! One operation per movement. All share the same pipeline: view check,
//! frame resolution through the cache, primary angle in the movement's
//! plane, grading against the configured target, secondary joint checks,
//! compensation detection and a quality assessment.

use std::borrow::Cow;

use gonio_core::{
    angle_between, angle_in_plane, normalize, rotate_about_axis, signed_angle_in_plane,
    ClinicalConfig, EngineConfig, Error, FrameType, LandmarkName, LandmarkSet, MovementTarget,
    MovementType, ReferenceFrame, Result, Side, Timestamp, ViewOrientation,
};
use gonio_frames::{CacheStats, FrameBuilder, FrameCache, FrameSet};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::compensation::{
    CompensationDetector, CompensationPattern, CompensationType, MovementContext, Severity,
};
use crate::quality::QualityAssessment;

/// Allowed humerus drift from the trunk while measuring elbow flexion
const SHOULDER_REFERENCE_TOLERANCE: f64 = 20.0;

const RATIO_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalGrade {
    Limited,
    Good,
    Excellent,
}

impl ClinicalGrade {
    pub fn from_percent(percent: f64, target: &MovementTarget) -> Self {
        if percent >= target.excellent_percent {
            ClinicalGrade::Excellent
        } else if percent >= target.good_percent {
            ClinicalGrade::Good
        } else {
            ClinicalGrade::Limited
        }
    }
}

/// Glenohumeral / scapulothoracic decomposition of arm elevation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RhythmComponents {
    /// Elevation in the scapular plane (degrees)
    pub total_elevation: f64,
    pub glenohumeral: f64,
    pub scapulothoracic: f64,
    /// Shoulder line against the thorax transverse plane, positive when the
    /// moving shoulder is higher
    pub girdle_elevation: f64,
    /// glenohumeral / scapulothoracic; `None` below the minimum elevation
    pub ratio: Option<f64>,
    pub is_normal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryJointResult {
    pub joint: String,
    pub movement: MovementType,
    pub side: Side,
    /// Measured angle in degrees
    pub angle: f64,
    pub target_angle: f64,
    pub percent_of_target: f64,
    pub grade: ClinicalGrade,
    pub rhythm: Option<RhythmComponents>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckRole {
    /// Observed for context only
    Reference,
    /// Must hold for the primary reading to be trusted
    Gating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryJointCheck {
    pub joint: String,
    pub role: CheckRole,
    pub angle: f64,
    pub expected: f64,
    pub tolerance: f64,
    pub passed: bool,
    pub warning: Option<String>,
}

impl SecondaryJointCheck {
    fn evaluate(joint: &str, role: CheckRole, angle: f64, expected: f64, tolerance: f64) -> Self {
        let deviation = (angle - expected).abs();
        let passed = deviation <= tolerance;
        let warning = (!passed).then(|| {
            format!(
                "{joint} at {angle:.0}°, expected {expected:.0}° ± {tolerance:.0}°; reading may be unreliable"
            )
        });
        Self {
            joint: joint.to_string(),
            role,
            angle,
            expected,
            tolerance,
            passed,
            warning,
        }
    }

    pub fn deviation(&self) -> f64 {
        (self.angle - self.expected).abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaneKind {
    Sagittal,
    Frontal,
    Scapular,
    Transverse,
}

/// Plane the primary angle was measured in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementPlane {
    pub kind: PlaneKind,
    pub normal: Vector3<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalJointMeasurement {
    pub timestamp: Timestamp,
    pub view: ViewOrientation,
    pub primary: PrimaryJointResult,
    pub secondary: Vec<SecondaryJointCheck>,
    pub compensations: Vec<CompensationPattern>,
    pub quality: QualityAssessment,
    /// Frames the primary angle was computed from
    pub frames: Vec<ReferenceFrame>,
    pub plane: MeasurementPlane,
}

impl ClinicalJointMeasurement {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn has_compensation(&self, compensation_type: CompensationType) -> bool {
        self.compensations
            .iter()
            .any(|c| c.compensation_type == compensation_type)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.secondary.iter().filter_map(|c| c.warning.as_deref())
    }
}

/// Movement-specific part of a measurement
struct JointReading {
    angle: f64,
    plane: MeasurementPlane,
    rhythm: Option<RhythmComponents>,
    secondary: Vec<SecondaryJointCheck>,
    extra_compensations: Vec<CompensationPattern>,
    landmarks: Vec<LandmarkName>,
    frames: Vec<ReferenceFrame>,
}

#[derive(Debug)]
pub struct ClinicalMeasurementService {
    config: ClinicalConfig,
    builder: FrameBuilder,
    cache: FrameCache,
    detector: CompensationDetector,
}

impl ClinicalMeasurementService {
    pub fn new(
        config: ClinicalConfig,
        detector: CompensationDetector,
        cache: FrameCache,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            builder: FrameBuilder::new(config.visibility_floor),
            config,
            cache,
            detector,
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(
            config.clinical.clone(),
            CompensationDetector::new(config.compensation.clone())?,
            FrameCache::new(config.cache)?,
        )
    }

    pub fn config(&self) -> &ClinicalConfig {
        &self.config
    }

    /// Swap the clinical configuration; the old one stays on validation failure
    pub fn set_config(&mut self, config: ClinicalConfig) -> Result<()> {
        config.validate()?;
        if config.visibility_floor != self.config.visibility_floor {
            // Cached frames were accepted under the old floor
            self.cache.clear();
        }
        self.builder = FrameBuilder::new(config.visibility_floor);
        self.config = config;
        Ok(())
    }

    pub fn detector(&self) -> &CompensationDetector {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut CompensationDetector {
        &mut self.detector
    }

    pub fn cache(&self) -> &FrameCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut FrameCache {
        &mut self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn measure_shoulder_flexion(
        &mut self,
        landmarks: &LandmarkSet,
        side: Side,
    ) -> Result<ClinicalJointMeasurement> {
        self.measure(MovementType::ShoulderFlexion, landmarks, side)
    }

    pub fn measure_shoulder_abduction(
        &mut self,
        landmarks: &LandmarkSet,
        side: Side,
    ) -> Result<ClinicalJointMeasurement> {
        self.measure(MovementType::ShoulderAbduction, landmarks, side)
    }

    pub fn measure_shoulder_rotation(
        &mut self,
        landmarks: &LandmarkSet,
        side: Side,
    ) -> Result<ClinicalJointMeasurement> {
        self.measure(MovementType::ShoulderRotation, landmarks, side)
    }

    pub fn measure_elbow_flexion(
        &mut self,
        landmarks: &LandmarkSet,
        side: Side,
    ) -> Result<ClinicalJointMeasurement> {
        self.measure(MovementType::ElbowFlexion, landmarks, side)
    }

    pub fn measure_knee_flexion(
        &mut self,
        landmarks: &LandmarkSet,
        side: Side,
    ) -> Result<ClinicalJointMeasurement> {
        self.measure(MovementType::KneeFlexion, landmarks, side)
    }

    /// Resolve the frames a movement needs through the cache, then measure
    pub fn measure(
        &mut self,
        movement: MovementType,
        landmarks: &LandmarkSet,
        side: Side,
    ) -> Result<ClinicalJointMeasurement> {
        let view = self.resolve_view(movement, landmarks)?;
        let landmarks = with_view(landmarks, view);

        let mut frames = FrameSet::new();
        for frame_type in required_frames(movement, side) {
            self.builder
                .resolve(&mut self.cache, &landmarks, frame_type, &mut frames)?;
        }
        // Compensation rules use these when available
        for frame_type in [FrameType::Global, FrameType::Thorax, FrameType::Pelvis] {
            if frames.contains(frame_type) {
                continue;
            }
            if let Err(error) = self
                .builder
                .resolve(&mut self.cache, &landmarks, frame_type, &mut frames)
            {
                tracing::debug!(?frame_type, %error, "optional frame unavailable");
            }
        }

        self.measure_with_frames(movement, &landmarks, side, &frames)
    }

    /// Measure against frames resolved by the caller.
    ///
    /// Fails with `MissingFrame` when a frame the movement needs is absent.
    pub fn measure_with_frames(
        &self,
        movement: MovementType,
        landmarks: &LandmarkSet,
        side: Side,
        frames: &FrameSet,
    ) -> Result<ClinicalJointMeasurement> {
        let view = self.resolve_view(movement, landmarks)?;
        let context = MovementContext::new(movement, side).with_view(view);

        let reading = match movement {
            MovementType::ShoulderFlexion => self.shoulder_flexion(landmarks, side, frames, view)?,
            MovementType::ShoulderAbduction => {
                self.shoulder_abduction(landmarks, side, frames, &context)?
            }
            MovementType::ShoulderRotation => {
                self.shoulder_rotation(landmarks, side, frames, view, &context)?
            }
            MovementType::ElbowFlexion => self.elbow_flexion(landmarks, side, frames)?,
            MovementType::KneeFlexion => self.knee_flexion(landmarks, side, frames)?,
        };

        let target = self.config.target(movement);
        let percent_of_target = (reading.angle / target.target_angle * 100.0).max(0.0);
        let grade = ClinicalGrade::from_percent(percent_of_target, target);

        let mut compensations = self.detector.detect(landmarks, frames, &context);
        for extra in reading.extra_compensations {
            if !compensations
                .iter()
                .any(|c| c.compensation_type == extra.compensation_type)
            {
                compensations.push(extra);
            }
        }

        let quality = QualityAssessment::assess(
            landmarks,
            &reading.landmarks,
            &reading.frames,
            &self.config.quality,
        );

        tracing::debug!(
            movement = %movement,
            side = %side,
            angle = reading.angle,
            grade = ?grade,
            compensations = compensations.len(),
            "measurement complete"
        );

        Ok(ClinicalJointMeasurement {
            timestamp: landmarks.timestamp,
            view,
            primary: PrimaryJointResult {
                joint: movement.joint().to_string(),
                movement,
                side,
                angle: reading.angle,
                target_angle: target.target_angle,
                percent_of_target,
                grade,
                rhythm: reading.rhythm,
            },
            secondary: reading.secondary,
            compensations,
            quality,
            frames: reading.frames,
            plane: reading.plane,
        })
    }

    fn resolve_view(&self, movement: MovementType, landmarks: &LandmarkSet) -> Result<ViewOrientation> {
        let view = match landmarks.view {
            ViewOrientation::Unknown if self.config.infer_unknown_view => {
                ViewOrientation::infer(landmarks).unwrap_or(ViewOrientation::Unknown)
            }
            view => view,
        };

        let supported = movement.supported_views();
        if supported.contains(&view) {
            Ok(view)
        } else {
            Err(Error::InvalidViewOrientation {
                movement: movement.name().to_string(),
                view,
                expected: supported.to_vec(),
            })
        }
    }

    fn point(&self, landmarks: &LandmarkSet, name: LandmarkName) -> Result<Vector3<f64>> {
        landmarks
            .position(name, self.config.visibility_floor)
            .ok_or_else(|| Error::insufficient(format!("{name:?}"), vec![name]))
    }

    /// Elbow flexion from landmarks, `None` when the wrist is not usable
    fn elbow_angle(&self, landmarks: &LandmarkSet, side: Side) -> Option<f64> {
        let floor = self.config.visibility_floor;
        let shoulder = landmarks.position(LandmarkName::shoulder(side), floor)?;
        let elbow = landmarks.position(LandmarkName::elbow(side), floor)?;
        let wrist = landmarks.position(LandmarkName::wrist(side), floor)?;
        Some(angle_between(&(elbow - shoulder), &(wrist - elbow)))
    }

    /// Straight-arm reference check shared by flexion and abduction
    fn extended_elbow_check(&self, landmarks: &LandmarkSet, side: Side) -> Option<SecondaryJointCheck> {
        let elbow = self.elbow_angle(landmarks, side)?;
        Some(SecondaryJointCheck::evaluate(
            "elbow",
            CheckRole::Reference,
            elbow,
            0.0,
            self.detector.config().elbow_drift.mild,
        ))
    }

    fn shoulder_flexion(
        &self,
        landmarks: &LandmarkSet,
        side: Side,
        frames: &FrameSet,
        view: ViewOrientation,
    ) -> Result<JointReading> {
        let thorax = *frames.require(FrameType::Thorax)?;
        let upper = *frames.require(FrameType::upper_arm(side))?;

        let segment = [LandmarkName::shoulder(side), LandmarkName::elbow(side)];
        let trunk_down = -thorax.y_axis;
        let humerus_down = if view.observes_coronal_plane() && landmarks.depth_coverage(&segment) < 1.0 {
            self.foreshortened_humerus(landmarks, side, &thorax, view)?
        } else {
            -upper.y_axis
        };
        let angle = angle_in_plane(&trunk_down, &humerus_down, &thorax.x_axis)
            .unwrap_or_else(|| angle_between(&trunk_down, &humerus_down));

        Ok(JointReading {
            angle,
            plane: MeasurementPlane {
                kind: PlaneKind::Sagittal,
                normal: thorax.x_axis,
            },
            rhythm: None,
            secondary: self.extended_elbow_check(landmarks, side).into_iter().collect(),
            extra_compensations: Vec::new(),
            landmarks: FrameType::upper_arm(side).lineage_landmarks(),
            frames: vec![thorax, upper],
        })
    }

    /// Upper-arm direction with the camera-axis component recovered from the
    /// apparent humerus length against the expected one
    fn foreshortened_humerus(
        &self,
        landmarks: &LandmarkSet,
        side: Side,
        thorax: &ReferenceFrame,
        view: ViewOrientation,
    ) -> Result<Vector3<f64>> {
        let hips = [LandmarkName::LeftHip, LandmarkName::RightHip];
        let hip_mid = landmarks
            .midpoint(hips[0], hips[1], self.config.visibility_floor)
            .ok_or_else(|| Error::insufficient("shoulder flexion without depth", hips.to_vec()))?;
        let trunk = thorax.origin - hip_mid;
        let expected = self.config.upper_arm_to_trunk_ratio * trunk.x.hypot(trunk.y);

        let mut humerus = self.point(landmarks, LandmarkName::elbow(side))?
            - self.point(landmarks, LandmarkName::shoulder(side))?;
        let observed = humerus.x.hypot(humerus.y);
        let toward_camera = view.expected_forward().map_or(1.0, |f| f.z.signum());
        humerus.z = (expected * expected - observed * observed).max(0.0).sqrt() * toward_camera;
        tracing::trace!(side = %side, expected, observed, "humerus depth from foreshortening");
        Ok(humerus)
    }

    fn shoulder_abduction(
        &self,
        landmarks: &LandmarkSet,
        side: Side,
        frames: &FrameSet,
        context: &MovementContext,
    ) -> Result<JointReading> {
        let thorax = *frames.require(FrameType::Thorax)?;
        let upper = *frames.require(FrameType::upper_arm(side))?;

        let trunk_down = -thorax.y_axis;
        let humerus_down = -upper.y_axis;
        let angle = angle_in_plane(&trunk_down, &humerus_down, &thorax.z_axis)
            .unwrap_or_else(|| angle_between(&trunk_down, &humerus_down));

        let rhythm = self.rhythm(landmarks, side, &thorax, &humerus_down)?;
        let mut extra_compensations = Vec::new();
        // Scapular over-contribution shows up as shoulder hiking
        let scapula_dominant = rhythm
            .ratio
            .is_some_and(|ratio| ratio < self.config.rhythm.normal_min - RATIO_EPSILON);
        if scapula_dominant {
            let elevation = self.detector.shoulder_elevation(landmarks, frames);
            let (centimeters, elevated_side) = match elevation {
                Some(e) => (e.centimeters, e.elevated_side),
                None => (
                    self.detector.config().shoulder_width_cm
                        * rhythm.girdle_elevation.to_radians().sin().abs(),
                    side,
                ),
            };
            extra_compensations.extend(self.detector.classify_pattern(
                CompensationType::ShoulderHiking,
                centimeters,
                context,
                Some(elevated_side),
                Severity::Minimal,
            ));
        }

        Ok(JointReading {
            angle,
            plane: MeasurementPlane {
                kind: PlaneKind::Frontal,
                normal: thorax.z_axis,
            },
            rhythm: Some(rhythm),
            secondary: self.extended_elbow_check(landmarks, side).into_iter().collect(),
            extra_compensations,
            landmarks: FrameType::upper_arm(side).lineage_landmarks(),
            frames: vec![thorax, upper],
        })
    }

    fn rhythm(
        &self,
        landmarks: &LandmarkSet,
        side: Side,
        thorax: &ReferenceFrame,
        humerus_down: &Vector3<f64>,
    ) -> Result<RhythmComponents> {
        let trunk_down = -thorax.y_axis;
        let lateral = thorax.x_axis * side.lateral_sign();
        // Swing the lateral axis anteriorly about the trunk axis
        let scapular_direction = rotate_about_axis(
            &lateral,
            &thorax.y_axis,
            -side.lateral_sign() * self.config.scapular_plane_offset,
        );
        let scapular_normal = scapular_direction.cross(&thorax.y_axis);
        let total_elevation = angle_in_plane(&trunk_down, humerus_down, &scapular_normal)
            .unwrap_or_else(|| angle_between(&trunk_down, humerus_down));

        let shoulder_line = self.point(landmarks, LandmarkName::shoulder(side))?
            - self.point(landmarks, LandmarkName::shoulder(side.opposite()))?;
        let girdle_elevation = normalize(&shoulder_line).map_or(0.0, |line| {
            line.dot(&thorax.y_axis).clamp(-1.0, 1.0).asin().to_degrees()
        });

        let rhythm = &self.config.rhythm;
        // An unelevated girdle reproduces the nominal ratio exactly
        let scapulothoracic = total_elevation / (1.0 + rhythm.nominal_ratio()) + girdle_elevation;
        let glenohumeral = total_elevation - scapulothoracic;

        let (ratio, is_normal) = if total_elevation < rhythm.min_elevation {
            (None, true)
        } else if scapulothoracic <= RATIO_EPSILON {
            (None, false)
        } else {
            let ratio = glenohumeral / scapulothoracic;
            let normal = ratio >= rhythm.normal_min - RATIO_EPSILON
                && ratio <= rhythm.normal_max + RATIO_EPSILON;
            (Some(ratio), normal)
        };

        Ok(RhythmComponents {
            total_elevation,
            glenohumeral,
            scapulothoracic,
            girdle_elevation,
            ratio,
            is_normal,
        })
    }

    fn shoulder_rotation(
        &self,
        landmarks: &LandmarkSet,
        side: Side,
        frames: &FrameSet,
        view: ViewOrientation,
        context: &MovementContext,
    ) -> Result<JointReading> {
        let thorax = *frames.require(FrameType::Thorax)?;
        let upper = *frames.require(FrameType::upper_arm(side))?;
        let forearm_frame = *frames.require(FrameType::forearm(side))?;

        let shoulder = self.point(landmarks, LandmarkName::shoulder(side))?;
        let elbow = self.point(landmarks, LandmarkName::elbow(side))?;
        let wrist = self.point(landmarks, LandmarkName::wrist(side))?;
        let upper_vector = elbow - shoulder;
        let mut forearm = wrist - elbow;

        let has_depth = landmarks.depth_coverage(&[
            LandmarkName::shoulder(side),
            LandmarkName::elbow(side),
            LandmarkName::wrist(side),
        ]) >= 1.0;
        if !has_depth {
            // Recover the out-of-plane component from foreshortening
            let expected = self.config.forearm_to_upper_arm_ratio * upper_vector.norm();
            let observed = (forearm.x * forearm.x + forearm.y * forearm.y).sqrt();
            let toward_camera = view.expected_forward().map_or(1.0, |f| f.z.signum());
            forearm.z = (expected * expected - observed * observed).max(0.0).sqrt() * toward_camera;
        }

        let angle = signed_angle_in_plane(&thorax.z_axis, &forearm, &upper.y_axis)
            .map_or(0.0, |a| a * side.lateral_sign());

        let gate = &self.config.rotation_elbow_gate;
        let elbow_flexion = angle_between(&upper_vector, &forearm);
        let check = SecondaryJointCheck::evaluate(
            "elbow",
            CheckRole::Gating,
            elbow_flexion,
            gate.expected_angle,
            gate.warning_tolerance,
        );
        let mut extra_compensations = Vec::new();
        if let Some(warning) = &check.warning {
            tracing::warn!(side = %side, elbow = elbow_flexion, "{warning}");
        }
        if check.deviation() > gate.significant_deviation {
            extra_compensations.extend(self.detector.classify_pattern(
                CompensationType::ElbowFlexion,
                check.deviation(),
                context,
                Some(side),
                Severity::Mild,
            ));
        }

        Ok(JointReading {
            angle,
            plane: MeasurementPlane {
                kind: PlaneKind::Transverse,
                normal: upper.y_axis,
            },
            rhythm: None,
            secondary: vec![check],
            extra_compensations,
            landmarks: FrameType::forearm(side).lineage_landmarks(),
            frames: vec![thorax, upper, forearm_frame],
        })
    }

    fn elbow_flexion(
        &self,
        landmarks: &LandmarkSet,
        side: Side,
        frames: &FrameSet,
    ) -> Result<JointReading> {
        let upper = *frames.require(FrameType::upper_arm(side))?;
        let forearm_frame = *frames.require(FrameType::forearm(side))?;

        let shoulder = self.point(landmarks, LandmarkName::shoulder(side))?;
        let elbow = self.point(landmarks, LandmarkName::elbow(side))?;
        let wrist = self.point(landmarks, LandmarkName::wrist(side))?;
        let angle = angle_between(&(elbow - shoulder), &(wrist - elbow));

        let secondary = frames
            .get(FrameType::Thorax)
            .map(|thorax| {
                SecondaryJointCheck::evaluate(
                    "shoulder",
                    CheckRole::Reference,
                    angle_between(&-thorax.y_axis, &-upper.y_axis),
                    0.0,
                    SHOULDER_REFERENCE_TOLERANCE,
                )
            })
            .into_iter()
            .collect();

        Ok(JointReading {
            angle,
            plane: MeasurementPlane {
                kind: PlaneKind::Sagittal,
                normal: upper.x_axis,
            },
            rhythm: None,
            secondary,
            extra_compensations: Vec::new(),
            landmarks: FrameType::forearm(side).lineage_landmarks(),
            frames: vec![upper, forearm_frame],
        })
    }

    fn knee_flexion(
        &self,
        landmarks: &LandmarkSet,
        side: Side,
        frames: &FrameSet,
    ) -> Result<JointReading> {
        let pelvis = *frames.require(FrameType::Pelvis)?;

        let used = vec![
            LandmarkName::hip(side),
            LandmarkName::hip(side.opposite()),
            LandmarkName::knee(side),
            LandmarkName::ankle(side),
        ];
        landmarks.require(&used, self.config.visibility_floor, "knee flexion")?;
        let hip = self.point(landmarks, LandmarkName::hip(side))?;
        let knee = self.point(landmarks, LandmarkName::knee(side))?;
        let ankle = self.point(landmarks, LandmarkName::ankle(side))?;
        let angle = angle_between(&(knee - hip), &(ankle - knee));

        Ok(JointReading {
            angle,
            plane: MeasurementPlane {
                kind: PlaneKind::Sagittal,
                normal: pelvis.x_axis,
            },
            rhythm: None,
            secondary: Vec::new(),
            extra_compensations: Vec::new(),
            landmarks: used,
            frames: vec![pelvis],
        })
    }
}

fn required_frames(movement: MovementType, side: Side) -> Vec<FrameType> {
    match movement {
        MovementType::ShoulderFlexion | MovementType::ShoulderAbduction => {
            vec![FrameType::Thorax, FrameType::upper_arm(side)]
        }
        MovementType::ShoulderRotation => vec![
            FrameType::Thorax,
            FrameType::upper_arm(side),
            FrameType::forearm(side),
        ],
        MovementType::ElbowFlexion => vec![FrameType::upper_arm(side), FrameType::forearm(side)],
        MovementType::KneeFlexion => vec![FrameType::Pelvis],
    }
}

/// Landmark set tagged with the resolved view
fn with_view(landmarks: &LandmarkSet, view: ViewOrientation) -> Cow<'_, LandmarkSet> {
    if landmarks.view == view {
        Cow::Borrowed(landmarks)
    } else {
        let mut tagged = landmarks.clone();
        tagged.view = view;
        Cow::Owned(tagged)
    }
}
