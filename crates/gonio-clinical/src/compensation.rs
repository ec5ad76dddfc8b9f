//! Compensation pattern detection.
//!
//! Every rule is independent and purely geometric. A rule yields nothing when
//! its landmarks are below the visibility floor, a frame it needs was not
//! resolved, or the view cannot observe the signal. Detection never fails.

use std::fmt;

use gonio_core::{
    angle_between, angle_in_plane, CompensationConfig, FrameType, LandmarkName, LandmarkSet,
    MovementType, Result, SeverityBands, Side, ViewOrientation,
};
use gonio_frames::FrameSet;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Tolerance for a value sitting exactly on a band boundary
const BAND_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationType {
    TrunkLean,
    TrunkRotation,
    ShoulderHiking,
    ElbowFlexion,
    HipHike,
    ContralateralLean,
}

impl CompensationType {
    pub fn name(&self) -> &'static str {
        match self {
            CompensationType::TrunkLean => "trunk_lean",
            CompensationType::TrunkRotation => "trunk_rotation",
            CompensationType::ShoulderHiking => "shoulder_hiking",
            CompensationType::ElbowFlexion => "elbow_flexion",
            CompensationType::HipHike => "hip_hike",
            CompensationType::ContralateralLean => "contralateral_lean",
        }
    }

    pub fn unit(&self) -> MagnitudeUnit {
        match self {
            CompensationType::ShoulderHiking => MagnitudeUnit::Centimeters,
            _ => MagnitudeUnit::Degrees,
        }
    }
}

impl fmt::Display for CompensationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MagnitudeUnit {
    Degrees,
    Centimeters,
}

impl MagnitudeUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            MagnitudeUnit::Degrees => "°",
            MagnitudeUnit::Centimeters => " cm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minimal,
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn classify(value: f64, bands: &SeverityBands) -> Self {
        let value = value.abs() + BAND_EPSILON;
        if value >= bands.severe {
            Severity::Severe
        } else if value >= bands.moderate {
            Severity::Moderate
        } else if value >= bands.mild {
            Severity::Mild
        } else {
            Severity::Minimal
        }
    }

    /// 0 for minimal through 3 for severe
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minimal => "minimal",
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }
}

/// A detected substitute movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationPattern {
    pub compensation_type: CompensationType,
    pub severity: Severity,
    /// Degrees or centimeters, see `unit`
    pub magnitude: f64,
    pub unit: MagnitudeUnit,
    pub affected_joint: String,
    pub movement: MovementType,
    /// Direction of the deviation: lean side, elevated side or raised hip
    pub side: Option<Side>,
    pub note: String,
}

/// Movement under assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementContext {
    pub movement: MovementType,
    pub side: Side,
    /// Overrides the landmark set's own view tag
    pub view: Option<ViewOrientation>,
}

impl MovementContext {
    pub fn new(movement: MovementType, side: Side) -> Self {
        Self {
            movement,
            side,
            view: None,
        }
    }

    pub fn with_view(mut self, view: ViewOrientation) -> Self {
        self.view = Some(view);
        self
    }
}

/// Shoulder elevation estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShoulderElevation {
    pub centimeters: f64,
    pub elevated_side: Side,
}

#[derive(Debug, Clone)]
pub struct CompensationDetector {
    config: CompensationConfig,
}

impl CompensationDetector {
    pub fn new(config: CompensationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CompensationConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: CompensationConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Run every rule against one landmark set.
    ///
    /// Trunk rotation is an axial twist toward or away from the camera and
    /// is read from the thorax's anterior axis. Without depth that axis stays
    /// on the camera line whatever the twist, so 2D input never reports
    /// `TrunkRotation`; a flat shoulder width is not used as a stand-in
    /// because it also varies with build and camera distance.
    pub fn detect(
        &self,
        landmarks: &LandmarkSet,
        frames: &FrameSet,
        context: &MovementContext,
    ) -> Vec<CompensationPattern> {
        let view = self.effective_view(landmarks, context);

        let patterns: Vec<CompensationPattern> = [
            self.trunk_lean(landmarks, frames, context, view),
            self.trunk_rotation(landmarks, frames, context, view),
            self.shoulder_hiking(landmarks, frames, context, view),
            self.elbow_drift(landmarks, context),
            self.hip_hike(landmarks, context, view),
        ]
        .into_iter()
        .flatten()
        .collect();

        if !patterns.is_empty() {
            tracing::debug!(
                movement = %context.movement,
                side = %context.side,
                count = patterns.len(),
                "compensations detected"
            );
        }
        patterns
    }

    /// Classify a magnitude into a pattern, no lower than `floor`.
    ///
    /// Returns `None` for minimal results unless `report_minimal` is set.
    pub fn classify_pattern(
        &self,
        compensation_type: CompensationType,
        magnitude: f64,
        context: &MovementContext,
        side: Option<Side>,
        floor: Severity,
    ) -> Option<CompensationPattern> {
        let bands = self.bands(compensation_type);
        let severity = Severity::classify(magnitude, bands).max(floor);
        if severity == Severity::Minimal && !self.config.report_minimal {
            return None;
        }

        let magnitude = magnitude.abs();
        Some(CompensationPattern {
            compensation_type,
            severity,
            magnitude,
            unit: compensation_type.unit(),
            affected_joint: context.movement.joint().to_string(),
            movement: context.movement,
            side,
            note: clinical_note(compensation_type, severity, magnitude, side, context),
        })
    }

    /// Elevation of one shoulder over the other along the trunk axis.
    ///
    /// Scaled by the unelevated side's ear-to-shoulder distance, or by the
    /// shoulder width when the ears are not visible.
    pub fn shoulder_elevation(
        &self,
        landmarks: &LandmarkSet,
        frames: &FrameSet,
    ) -> Option<ShoulderElevation> {
        let floor = self.config.visibility_floor;
        let left = landmarks.position(LandmarkName::LeftShoulder, floor)?;
        let right = landmarks.position(LandmarkName::RightShoulder, floor)?;

        let trunk_up = frames
            .get(FrameType::Thorax)
            .map(|thorax| thorax.y_axis)
            .unwrap_or_else(Vector3::y);
        let offset = (left - right).dot(&trunk_up);
        let elevated_side = if offset >= 0.0 { Side::Left } else { Side::Right };

        let ears = (
            landmarks.position(LandmarkName::LeftEar, floor),
            landmarks.position(LandmarkName::RightEar, floor),
        );
        let centimeters = match ears {
            (Some(left_ear), Some(right_ear)) => {
                let reference = (left_ear - left).norm().max((right_ear - right).norm());
                if reference < 1e-9 {
                    return None;
                }
                offset.abs() / reference * self.config.ear_to_shoulder_cm
            }
            _ => {
                let width = (left - right).norm();
                if width < 1e-9 {
                    return None;
                }
                offset.abs() / width * self.config.shoulder_width_cm
            }
        };

        Some(ShoulderElevation {
            centimeters,
            elevated_side,
        })
    }

    fn bands(&self, compensation_type: CompensationType) -> &SeverityBands {
        match compensation_type {
            CompensationType::TrunkLean | CompensationType::ContralateralLean => &self.config.trunk_lean,
            CompensationType::TrunkRotation => &self.config.trunk_rotation,
            CompensationType::ShoulderHiking => &self.config.shoulder_hiking,
            CompensationType::ElbowFlexion => &self.config.elbow_drift,
            CompensationType::HipHike => &self.config.hip_hike,
        }
    }

    fn effective_view(&self, landmarks: &LandmarkSet, context: &MovementContext) -> ViewOrientation {
        match context.view.unwrap_or(landmarks.view) {
            ViewOrientation::Unknown => {
                ViewOrientation::infer(landmarks).unwrap_or(ViewOrientation::Unknown)
            }
            view => view,
        }
    }

    fn torso_visible(&self, landmarks: &LandmarkSet) -> bool {
        landmarks
            .missing(&FrameType::Thorax.own_landmarks(), self.config.visibility_floor)
            .is_empty()
    }

    fn trunk_lean(
        &self,
        landmarks: &LandmarkSet,
        frames: &FrameSet,
        context: &MovementContext,
        view: ViewOrientation,
    ) -> Option<CompensationPattern> {
        let subject_left = view.subject_left()?;
        if !self.torso_visible(landmarks) {
            return None;
        }
        let global = frames.get(FrameType::Global)?;
        let thorax = frames.get(FrameType::Thorax)?;

        let lean = angle_in_plane(&global.y_axis, &thorax.y_axis, &global.z_axis)?;
        let toward = if thorax.y_axis.dot(&subject_left) >= 0.0 {
            Side::Left
        } else {
            Side::Right
        };
        let compensation_type = if toward == context.side {
            CompensationType::TrunkLean
        } else {
            CompensationType::ContralateralLean
        };

        self.classify_pattern(compensation_type, lean, context, Some(toward), Severity::Minimal)
    }

    /// Needs depth on the shoulders; see [`CompensationDetector::detect`]
    fn trunk_rotation(
        &self,
        landmarks: &LandmarkSet,
        frames: &FrameSet,
        context: &MovementContext,
        view: ViewOrientation,
    ) -> Option<CompensationPattern> {
        let forward = view.expected_forward()?;
        if !self.torso_visible(landmarks) {
            return None;
        }
        let global = frames.get(FrameType::Global)?;
        let thorax = frames.get(FrameType::Thorax)?;

        let rotation = angle_in_plane(&forward, &thorax.z_axis, &global.y_axis)?;
        // The side whose shoulder swung forward
        let left_forward = thorax.x_axis.dot(&forward) > 0.0;
        let side = if left_forward { Side::Left } else { Side::Right };

        self.classify_pattern(
            CompensationType::TrunkRotation,
            rotation,
            context,
            Some(side),
            Severity::Minimal,
        )
    }

    fn shoulder_hiking(
        &self,
        landmarks: &LandmarkSet,
        frames: &FrameSet,
        context: &MovementContext,
        view: ViewOrientation,
    ) -> Option<CompensationPattern> {
        if !view.observes_coronal_plane() {
            return None;
        }
        let ears = [LandmarkName::LeftEar, LandmarkName::RightEar];
        if !landmarks.missing(&ears, self.config.visibility_floor).is_empty() {
            return None;
        }
        let elevation = self.shoulder_elevation(landmarks, frames)?;

        self.classify_pattern(
            CompensationType::ShoulderHiking,
            elevation.centimeters,
            context,
            Some(elevation.elevated_side),
            Severity::Minimal,
        )
    }

    fn elbow_drift(
        &self,
        landmarks: &LandmarkSet,
        context: &MovementContext,
    ) -> Option<CompensationPattern> {
        if !context.movement.assumes_extended_elbow() {
            return None;
        }
        let floor = self.config.visibility_floor;
        let shoulder = landmarks.position(LandmarkName::shoulder(context.side), floor)?;
        let elbow = landmarks.position(LandmarkName::elbow(context.side), floor)?;
        let wrist = landmarks.position(LandmarkName::wrist(context.side), floor)?;

        let flexion = angle_between(&(elbow - shoulder), &(wrist - elbow));
        self.classify_pattern(
            CompensationType::ElbowFlexion,
            flexion,
            context,
            Some(context.side),
            Severity::Minimal,
        )
    }

    fn hip_hike(
        &self,
        landmarks: &LandmarkSet,
        context: &MovementContext,
        view: ViewOrientation,
    ) -> Option<CompensationPattern> {
        if !view.observes_coronal_plane() {
            return None;
        }
        let floor = self.config.visibility_floor;
        let left = landmarks.position(LandmarkName::LeftHip, floor)?;
        let right = landmarks.position(LandmarkName::RightHip, floor)?;

        let line = left - right;
        let horizontal = (line.x * line.x + line.z * line.z).sqrt();
        if horizontal < 1e-9 {
            return None;
        }
        let tilt = line.y.abs().atan2(horizontal).to_degrees();
        let raised = if line.y >= 0.0 { Side::Left } else { Side::Right };

        self.classify_pattern(CompensationType::HipHike, tilt, context, Some(raised), Severity::Minimal)
    }
}

fn clinical_note(
    compensation_type: CompensationType,
    severity: Severity,
    magnitude: f64,
    side: Option<Side>,
    context: &MovementContext,
) -> String {
    let amount = format!("{magnitude:.1}{}", compensation_type.unit().symbol());
    let side = side.map(|s| s.as_str()).unwrap_or("either");
    let movement = context.movement.name().replace('_', " ");

    match compensation_type {
        CompensationType::TrunkLean => format!(
            "{} trunk lean of {amount} toward the {side} side during {movement}; cue an upright trunk",
            capitalized(severity)
        ),
        CompensationType::ContralateralLean => format!(
            "{} lean of {amount} away from the moving arm, toward the {side} side, during {movement}; stabilize the trunk",
            capitalized(severity)
        ),
        CompensationType::TrunkRotation => format!(
            "{} trunk rotation of {amount} bringing the {side} shoulder forward during {movement}; keep the chest facing forward",
            capitalized(severity)
        ),
        CompensationType::ShoulderHiking => format!(
            "{} shoulder hiking: {side} shoulder elevated about {amount} during {movement}; cue shoulder depression",
            capitalized(severity)
        ),
        CompensationType::ElbowFlexion => format!(
            "{} elbow flexion of {amount} on the {side} side during {movement}; keep the elbow straight",
            capitalized(severity)
        ),
        CompensationType::HipHike => format!(
            "{} hip hike of {amount} on the {side} side during {movement}; keep the pelvis level",
            capitalized(severity)
        ),
    }
}

fn capitalized(severity: Severity) -> &'static str {
    match severity {
        Severity::Minimal => "Minimal",
        Severity::Mild => "Mild",
        Severity::Moderate => "Moderate",
        Severity::Severe => "Severe",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gonio_core::synthetic::SyntheticPose;
    use gonio_frames::FrameBuilder;

    fn frames_for(landmarks: &LandmarkSet) -> FrameSet {
        let builder = FrameBuilder::default();
        let mut frames = FrameSet::new();
        for frame_type in [FrameType::Global, FrameType::Thorax, FrameType::Pelvis] {
            if let Ok(frame) = builder.build(frame_type, landmarks, &frames) {
                frames.insert(frame);
            }
        }
        frames
    }

    fn detect(pose: SyntheticPose, movement: MovementType) -> Vec<CompensationPattern> {
        let detector = CompensationDetector::new(CompensationConfig::default()).unwrap();
        let landmarks = pose.generate();
        let frames = frames_for(&landmarks);
        detector.detect(&landmarks, &frames, &MovementContext::new(movement, pose.side))
    }

    fn only(patterns: &[CompensationPattern], kind: CompensationType) -> Option<&CompensationPattern> {
        patterns.iter().find(|p| p.compensation_type == kind)
    }

    #[test]
    fn test_classify_boundaries() {
        let bands = SeverityBands::new(5.0, 15.0, 25.0);
        assert_eq!(Severity::classify(3.0, &bands), Severity::Minimal);
        assert_eq!(Severity::classify(5.0, &bands), Severity::Mild);
        assert_eq!(Severity::classify(14.9, &bands), Severity::Mild);
        assert_eq!(Severity::classify(15.0, &bands), Severity::Moderate);
        assert_eq!(Severity::classify(25.0, &bands), Severity::Severe);
        assert_eq!(Severity::classify(-30.0, &bands), Severity::Severe);
    }

    #[test]
    fn test_neutral_pose_has_no_compensations() {
        let pose = SyntheticPose::new(ViewOrientation::Frontal, Side::Left).shoulder_abduction(90.0);
        assert!(detect(pose, MovementType::ShoulderAbduction).is_empty());
    }

    #[test]
    fn test_trunk_lean_toward_and_away() {
        let toward = detect(
            SyntheticPose::new(ViewOrientation::Frontal, Side::Right).trunk_lean(10.0),
            MovementType::ShoulderAbduction,
        );
        let lean = only(&toward, CompensationType::TrunkLean).unwrap();
        assert_eq!(lean.severity, Severity::Mild);
        assert_eq!(lean.side, Some(Side::Right));
        assert!((lean.magnitude - 10.0).abs() < 1e-6);

        let away = detect(
            SyntheticPose::new(ViewOrientation::Frontal, Side::Right).trunk_lean(-18.0),
            MovementType::ShoulderAbduction,
        );
        let lean = only(&away, CompensationType::ContralateralLean).unwrap();
        assert_eq!(lean.severity, Severity::Moderate);
        assert_eq!(lean.side, Some(Side::Left));
        assert!(only(&away, CompensationType::TrunkLean).is_none());
    }

    #[test]
    fn test_trunk_lean_unobservable_in_sagittal_view() {
        let patterns = detect(
            SyntheticPose::new(ViewOrientation::Sagittal, Side::Right).trunk_lean(20.0),
            MovementType::ShoulderFlexion,
        );
        assert!(only(&patterns, CompensationType::TrunkLean).is_none());
        assert!(only(&patterns, CompensationType::ContralateralLean).is_none());
    }

    #[test]
    fn test_posterior_view_lean_direction() {
        let patterns = detect(
            SyntheticPose::new(ViewOrientation::Posterior, Side::Left).trunk_lean(12.0),
            MovementType::ShoulderAbduction,
        );
        let lean = only(&patterns, CompensationType::TrunkLean).unwrap();
        assert_eq!(lean.side, Some(Side::Left));
    }

    #[test]
    fn test_trunk_rotation_needs_depth() {
        for degrees in [15.0, 30.0] {
            let flat = detect(
                SyntheticPose::new(ViewOrientation::Frontal, Side::Left).trunk_rotation(degrees),
                MovementType::ShoulderAbduction,
            );
            assert!(only(&flat, CompensationType::TrunkRotation).is_none());
        }

        let deep = detect(
            SyntheticPose::new(ViewOrientation::Frontal, Side::Left)
                .trunk_rotation(15.0)
                .with_depth(true),
            MovementType::ShoulderAbduction,
        );
        let rotation = only(&deep, CompensationType::TrunkRotation).unwrap();
        assert_eq!(rotation.severity, Severity::Moderate);
        assert_eq!(rotation.side, Some(Side::Left));
        assert!((rotation.magnitude - 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_shoulder_hiking_in_centimeters() {
        let patterns = detect(
            SyntheticPose::new(ViewOrientation::Frontal, Side::Right).shoulder_hike_cm(2.5),
            MovementType::ShoulderAbduction,
        );
        let hike = only(&patterns, CompensationType::ShoulderHiking).unwrap();
        assert_eq!(hike.severity, Severity::Moderate);
        assert_eq!(hike.side, Some(Side::Right));
        assert_eq!(hike.unit, MagnitudeUnit::Centimeters);
        assert!((hike.magnitude - 2.5).abs() < 1e-6);
        assert!(hike.note.contains("right shoulder elevated"));
    }

    #[test]
    fn test_shoulder_hiking_requires_ears() {
        let detector = CompensationDetector::new(CompensationConfig::default()).unwrap();
        let mut landmarks = SyntheticPose::new(ViewOrientation::Frontal, Side::Left)
            .shoulder_hike_cm(3.0)
            .generate();
        landmarks.remove(LandmarkName::LeftEar);
        let frames = frames_for(&landmarks);
        let patterns = detector.detect(
            &landmarks,
            &frames,
            &MovementContext::new(MovementType::ShoulderAbduction, Side::Left),
        );
        assert!(only(&patterns, CompensationType::ShoulderHiking).is_none());
        // Width fallback still yields an estimate
        assert!(detector.shoulder_elevation(&landmarks, &frames).is_some());
    }

    #[test]
    fn test_elbow_drift_only_for_straight_arm_movements() {
        let bent = SyntheticPose::new(ViewOrientation::Sagittal, Side::Left)
            .shoulder_flexion(90.0)
            .elbow_flexion(25.0);
        let patterns = detect(bent.clone(), MovementType::ShoulderFlexion);
        let drift = only(&patterns, CompensationType::ElbowFlexion).unwrap();
        assert_eq!(drift.severity, Severity::Moderate);
        assert_eq!(drift.affected_joint, "shoulder");

        let patterns = detect(bent, MovementType::ElbowFlexion);
        assert!(only(&patterns, CompensationType::ElbowFlexion).is_none());
    }

    #[test]
    fn test_hip_hike_bands() {
        let patterns = detect(
            SyntheticPose::new(ViewOrientation::Frontal, Side::Left).hip_hike(6.0),
            MovementType::ShoulderAbduction,
        );
        let hike = only(&patterns, CompensationType::HipHike).unwrap();
        assert_eq!(hike.severity, Severity::Moderate);
        assert_eq!(hike.side, Some(Side::Left));

        let patterns = detect(
            SyntheticPose::new(ViewOrientation::Frontal, Side::Left).hip_hike(2.0),
            MovementType::ShoulderAbduction,
        );
        assert!(only(&patterns, CompensationType::HipHike).is_none());
    }

    #[test]
    fn test_low_visibility_yields_nothing() {
        let patterns = detect(
            SyntheticPose::new(ViewOrientation::Frontal, Side::Left)
                .trunk_lean(20.0)
                .hip_hike(7.0)
                .visibility(0.4),
            MovementType::ShoulderAbduction,
        );
        assert!(patterns.is_empty());
    }

    #[test]
    fn test_report_minimal() {
        let config = CompensationConfig {
            report_minimal: true,
            ..CompensationConfig::default()
        };
        let detector = CompensationDetector::new(config).unwrap();
        let landmarks = SyntheticPose::new(ViewOrientation::Frontal, Side::Left)
            .trunk_lean(3.0)
            .generate();
        let frames = frames_for(&landmarks);
        let patterns = detector.detect(
            &landmarks,
            &frames,
            &MovementContext::new(MovementType::ShoulderAbduction, Side::Left),
        );
        let lean = only(&patterns, CompensationType::TrunkLean).unwrap();
        assert_eq!(lean.severity, Severity::Minimal);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CompensationConfig {
            trunk_lean: SeverityBands::new(15.0, 5.0, 25.0),
            ..CompensationConfig::default()
        };
        assert!(CompensationDetector::new(config).is_err());
    }
}
