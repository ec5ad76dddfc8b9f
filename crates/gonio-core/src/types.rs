//! Fundamental types for the goniometry engine.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Visibility below which a landmark is treated as absent.
pub const DEFAULT_VISIBILITY_FLOOR: f64 = 0.5;

/// Identifier of a temporal measurement sequence (one recorded clip)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceId(pub Uuid);

impl SequenceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SequenceId {
    fn default() -> Self {
        Self::new()
    }
}

/// Timestamp wrapper with nanosecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_nanos_opt().unwrap_or(0))
    }

    pub fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub fn from_secs_f64(secs: f64) -> Self {
        Self((secs * 1_000_000_000.0).round() as i64)
    }

    pub fn as_nanos(&self) -> i64 {
        self.0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1_000_000_000.0
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.0)
    }
}

/// Body side of a limb or movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// +1 for left, -1 for right; multiplies the body-space lateral (left) axis.
    pub fn lateral_sign(&self) -> f64 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anatomical keypoint names understood by the engine (COCO naming).
///
/// 33-point BlazePose sets carry more points; only these are consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LandmarkName {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl LandmarkName {
    pub const ALL: [LandmarkName; 17] = [
        LandmarkName::Nose,
        LandmarkName::LeftEye,
        LandmarkName::RightEye,
        LandmarkName::LeftEar,
        LandmarkName::RightEar,
        LandmarkName::LeftShoulder,
        LandmarkName::RightShoulder,
        LandmarkName::LeftElbow,
        LandmarkName::RightElbow,
        LandmarkName::LeftWrist,
        LandmarkName::RightWrist,
        LandmarkName::LeftHip,
        LandmarkName::RightHip,
        LandmarkName::LeftKnee,
        LandmarkName::RightKnee,
        LandmarkName::LeftAnkle,
        LandmarkName::RightAnkle,
    ];

    pub fn ear(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftEar,
            Side::Right => Self::RightEar,
        }
    }

    pub fn shoulder(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftShoulder,
            Side::Right => Self::RightShoulder,
        }
    }

    pub fn elbow(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftElbow,
            Side::Right => Self::RightElbow,
        }
    }

    pub fn wrist(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftWrist,
            Side::Right => Self::RightWrist,
        }
    }

    pub fn hip(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftHip,
            Side::Right => Self::RightHip,
        }
    }

    pub fn knee(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftKnee,
            Side::Right => Self::RightKnee,
        }
    }

    pub fn ankle(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftAnkle,
            Side::Right => Self::RightAnkle,
        }
    }
}

/// Keypoint topology of the upstream detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LandmarkSchema {
    /// 17-point COCO layout
    Coco17,
    /// 33-point BlazePose / MediaPipe layout
    BlazePose33,
}

impl LandmarkSchema {
    pub fn landmark_count(&self) -> usize {
        match self {
            LandmarkSchema::Coco17 => 17,
            LandmarkSchema::BlazePose33 => 33,
        }
    }

    /// Detector index of a named landmark in this topology
    pub fn index_of(&self, name: LandmarkName) -> u8 {
        match self {
            LandmarkSchema::Coco17 => match name {
                LandmarkName::Nose => 0,
                LandmarkName::LeftEye => 1,
                LandmarkName::RightEye => 2,
                LandmarkName::LeftEar => 3,
                LandmarkName::RightEar => 4,
                LandmarkName::LeftShoulder => 5,
                LandmarkName::RightShoulder => 6,
                LandmarkName::LeftElbow => 7,
                LandmarkName::RightElbow => 8,
                LandmarkName::LeftWrist => 9,
                LandmarkName::RightWrist => 10,
                LandmarkName::LeftHip => 11,
                LandmarkName::RightHip => 12,
                LandmarkName::LeftKnee => 13,
                LandmarkName::RightKnee => 14,
                LandmarkName::LeftAnkle => 15,
                LandmarkName::RightAnkle => 16,
            },
            LandmarkSchema::BlazePose33 => match name {
                LandmarkName::Nose => 0,
                LandmarkName::LeftEye => 2,
                LandmarkName::RightEye => 5,
                LandmarkName::LeftEar => 7,
                LandmarkName::RightEar => 8,
                LandmarkName::LeftShoulder => 11,
                LandmarkName::RightShoulder => 12,
                LandmarkName::LeftElbow => 13,
                LandmarkName::RightElbow => 14,
                LandmarkName::LeftWrist => 15,
                LandmarkName::RightWrist => 16,
                LandmarkName::LeftHip => 23,
                LandmarkName::RightHip => 24,
                LandmarkName::LeftKnee => 25,
                LandmarkName::RightKnee => 26,
                LandmarkName::LeftAnkle => 27,
                LandmarkName::RightAnkle => 28,
            },
        }
    }

    pub fn name_at(&self, index: u8) -> Option<LandmarkName> {
        LandmarkName::ALL
            .iter()
            .copied()
            .find(|name| self.index_of(*name) == index)
    }
}

/// Camera viewpoint relative to the subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewOrientation {
    /// Subject faces the camera
    Frontal,
    /// Subject is side-on to the camera
    Sagittal,
    /// Subject faces away from the camera
    Posterior,
    Unknown,
}

impl ViewOrientation {
    /// Shoulder-width to trunk-height ratio separating frontal from side-on views.
    pub const FRONTAL_WIDTH_RATIO: f64 = 0.35;

    /// Guess the view from shoulder and hip geometry.
    ///
    /// Returns `None` when shoulders or hips are not visible.
    pub fn infer(landmarks: &LandmarkSet) -> Option<Self> {
        let floor = DEFAULT_VISIBILITY_FLOOR;
        let ls = landmarks.visible(LandmarkName::LeftShoulder, floor)?;
        let rs = landmarks.visible(LandmarkName::RightShoulder, floor)?;
        let lh = landmarks.visible(LandmarkName::LeftHip, floor)?;
        let rh = landmarks.visible(LandmarkName::RightHip, floor)?;

        let shoulder_mid = ((ls.x + rs.x) / 2.0, (ls.y + rs.y) / 2.0);
        let hip_mid = ((lh.x + rh.x) / 2.0, (lh.y + rh.y) / 2.0);
        let trunk_height =
            ((shoulder_mid.0 - hip_mid.0).powi(2) + (shoulder_mid.1 - hip_mid.1).powi(2)).sqrt();
        if trunk_height < 1e-9 {
            return None;
        }

        let shoulder_width = ((ls.x - rs.x).powi(2) + (ls.y - rs.y).powi(2)).sqrt();
        if shoulder_width / trunk_height < Self::FRONTAL_WIDTH_RATIO {
            Some(ViewOrientation::Sagittal)
        } else if ls.x > rs.x {
            // The subject's left appears on the image right when facing the camera
            Some(ViewOrientation::Frontal)
        } else {
            Some(ViewOrientation::Posterior)
        }
    }

    /// Body-space direction of the subject's left side, when observable.
    pub fn subject_left(&self) -> Option<Vector3<f64>> {
        match self {
            ViewOrientation::Frontal => Some(Vector3::x()),
            ViewOrientation::Posterior => Some(-Vector3::x()),
            ViewOrientation::Sagittal | ViewOrientation::Unknown => None,
        }
    }

    /// Body-space direction the subject is expected to face.
    pub fn expected_forward(&self) -> Option<Vector3<f64>> {
        match self {
            ViewOrientation::Frontal => Some(Vector3::z()),
            ViewOrientation::Posterior => Some(-Vector3::z()),
            ViewOrientation::Sagittal | ViewOrientation::Unknown => None,
        }
    }

    /// Whether lateral (coronal-plane) deviations are visible from this view.
    pub fn observes_coronal_plane(&self) -> bool {
        matches!(self, ViewOrientation::Frontal | ViewOrientation::Posterior)
    }
}

/// A single detected keypoint in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    /// Optional depth hint, negative is closer to the camera
    pub depth: Option<f64>,
    /// Visibility / confidence in [0, 1]
    pub visibility: f64,
    /// Stable detector index
    pub index: u8,
}

impl Landmark {
    pub fn new(x: f64, y: f64, depth: Option<f64>, visibility: f64, index: u8) -> Self {
        Self {
            x,
            y,
            depth,
            visibility: visibility.clamp(0.0, 1.0),
            index,
        }
    }

    /// Position lifted into body space (Y up, Z toward the camera)
    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(self.x, -self.y, -self.depth.unwrap_or(0.0))
    }

    pub fn has_depth(&self) -> bool {
        self.depth.is_some()
    }

    pub fn is_visible(&self, floor: f64) -> bool {
        self.visibility >= floor
    }
}

/// One frame of detector output, keyed by anatomical name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    pub schema: LandmarkSchema,
    pub view: ViewOrientation,
    /// Overall detection quality in [0, 1]
    pub quality: f64,
    pub timestamp: Timestamp,
    landmarks: BTreeMap<LandmarkName, Landmark>,
}

impl LandmarkSet {
    pub fn new(schema: LandmarkSchema, view: ViewOrientation, timestamp: Timestamp) -> Self {
        Self {
            schema,
            view,
            quality: 1.0,
            timestamp,
            landmarks: BTreeMap::new(),
        }
    }

    /// Build from raw detector rows `[x, y, depth, visibility]` indexed by the schema.
    ///
    /// A NaN depth means the detector supplied none. Rows at indices the
    /// engine does not consume are ignored.
    pub fn from_indexed(
        schema: LandmarkSchema,
        view: ViewOrientation,
        rows: &[[f64; 4]],
        timestamp: Timestamp,
    ) -> Result<Self> {
        if rows.len() != schema.landmark_count() {
            return Err(Error::insufficient(
                format!(
                    "{:?} schema expects {} rows, got {}",
                    schema,
                    schema.landmark_count(),
                    rows.len()
                ),
                Vec::new(),
            ));
        }

        let mut set = Self::new(schema, view, timestamp);
        for (index, row) in rows.iter().enumerate() {
            let Some(name) = schema.name_at(index as u8) else {
                continue;
            };
            let depth = if row[2].is_nan() { None } else { Some(row[2]) };
            set.landmarks.insert(
                name,
                Landmark::new(row[0], row[1], depth, row[3], index as u8),
            );
        }

        let visibilities: Vec<f64> = set.landmarks.values().map(|l| l.visibility).collect();
        set.quality = if visibilities.is_empty() {
            0.0
        } else {
            visibilities.iter().sum::<f64>() / visibilities.len() as f64
        };
        Ok(set)
    }

    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = quality.clamp(0.0, 1.0);
        self
    }

    pub fn with_landmark(
        mut self,
        name: LandmarkName,
        x: f64,
        y: f64,
        depth: Option<f64>,
        visibility: f64,
    ) -> Self {
        self.insert(name, x, y, depth, visibility);
        self
    }

    pub fn insert(&mut self, name: LandmarkName, x: f64, y: f64, depth: Option<f64>, visibility: f64) {
        let index = self.schema.index_of(name);
        self.landmarks
            .insert(name, Landmark::new(x, y, depth, visibility, index));
    }

    pub fn remove(&mut self, name: LandmarkName) -> Option<Landmark> {
        self.landmarks.remove(&name)
    }

    pub fn get(&self, name: LandmarkName) -> Option<&Landmark> {
        self.landmarks.get(&name)
    }

    /// Landmark if present and at or above the visibility floor
    pub fn visible(&self, name: LandmarkName, floor: f64) -> Option<&Landmark> {
        self.landmarks.get(&name).filter(|l| l.is_visible(floor))
    }

    pub fn position(&self, name: LandmarkName, floor: f64) -> Option<Vector3<f64>> {
        self.visible(name, floor).map(Landmark::position)
    }

    pub fn midpoint(&self, a: LandmarkName, b: LandmarkName, floor: f64) -> Option<Vector3<f64>> {
        Some((self.position(a, floor)? + self.position(b, floor)?) / 2.0)
    }

    /// Names from `names` that are missing or below the floor
    pub fn missing(&self, names: &[LandmarkName], floor: f64) -> Vec<LandmarkName> {
        names
            .iter()
            .copied()
            .filter(|n| self.visible(*n, floor).is_none())
            .collect()
    }

    /// Fail with `InsufficientLandmarks` unless every name is visible
    pub fn require(&self, names: &[LandmarkName], floor: f64, context: &str) -> Result<()> {
        let missing = self.missing(names, floor);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::insufficient(context, missing))
        }
    }

    /// Minimum visibility among `names`; 0 when any is absent
    pub fn min_visibility(&self, names: &[LandmarkName]) -> f64 {
        names
            .iter()
            .map(|n| self.get(*n).map_or(0.0, |l| l.visibility))
            .fold(1.0, f64::min)
    }

    pub fn mean_visibility(&self, names: &[LandmarkName]) -> f64 {
        if names.is_empty() {
            return 0.0;
        }
        names
            .iter()
            .map(|n| self.get(*n).map_or(0.0, |l| l.visibility))
            .sum::<f64>()
            / names.len() as f64
    }

    /// Fraction of `names` carrying a depth hint
    pub fn depth_coverage(&self, names: &[LandmarkName]) -> f64 {
        if names.is_empty() {
            return 0.0;
        }
        let with_depth = names
            .iter()
            .filter(|n| self.get(**n).is_some_and(Landmark::has_depth))
            .count();
        with_depth as f64 / names.len() as f64
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LandmarkName, &Landmark)> {
        self.landmarks.iter()
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}

/// Body segment a reference frame is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FrameType {
    Global,
    Thorax,
    Pelvis,
    UpperArmLeft,
    UpperArmRight,
    ForearmLeft,
    ForearmRight,
}

impl FrameType {
    pub fn upper_arm(side: Side) -> Self {
        match side {
            Side::Left => FrameType::UpperArmLeft,
            Side::Right => FrameType::UpperArmRight,
        }
    }

    pub fn forearm(side: Side) -> Self {
        match side {
            Side::Left => FrameType::ForearmLeft,
            Side::Right => FrameType::ForearmRight,
        }
    }

    /// Frame this one is resolved against
    pub fn parent(&self) -> Option<FrameType> {
        match self {
            FrameType::Global => None,
            FrameType::Thorax | FrameType::Pelvis => Some(FrameType::Global),
            FrameType::UpperArmLeft | FrameType::UpperArmRight => Some(FrameType::Thorax),
            FrameType::ForearmLeft => Some(FrameType::UpperArmLeft),
            FrameType::ForearmRight => Some(FrameType::UpperArmRight),
        }
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            FrameType::UpperArmLeft | FrameType::ForearmLeft => Some(Side::Left),
            FrameType::UpperArmRight | FrameType::ForearmRight => Some(Side::Right),
            _ => None,
        }
    }

    /// Landmarks this frame is built from, excluding ancestors
    pub fn own_landmarks(&self) -> Vec<LandmarkName> {
        use LandmarkName::*;
        match self {
            FrameType::Global | FrameType::Pelvis => vec![LeftHip, RightHip],
            FrameType::Thorax => vec![LeftShoulder, RightShoulder, LeftHip, RightHip],
            FrameType::UpperArmLeft => vec![LeftShoulder, LeftElbow],
            FrameType::UpperArmRight => vec![RightShoulder, RightElbow],
            FrameType::ForearmLeft => vec![LeftElbow, LeftWrist],
            FrameType::ForearmRight => vec![RightElbow, RightWrist],
        }
    }

    /// Landmarks this frame and all of its ancestors depend on, deduplicated
    pub fn lineage_landmarks(&self) -> Vec<LandmarkName> {
        let mut names = self.own_landmarks();
        let mut current = self.parent();
        while let Some(frame) = current {
            names.extend(frame.own_landmarks());
            current = frame.parent();
        }
        names.sort();
        names.dedup();
        names
    }
}

/// Movement a clinical measurement is taken for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementType {
    ShoulderFlexion,
    ShoulderAbduction,
    ShoulderRotation,
    ElbowFlexion,
    KneeFlexion,
}

impl MovementType {
    pub const ALL: [MovementType; 5] = [
        MovementType::ShoulderFlexion,
        MovementType::ShoulderAbduction,
        MovementType::ShoulderRotation,
        MovementType::ElbowFlexion,
        MovementType::KneeFlexion,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MovementType::ShoulderFlexion => "shoulder_flexion",
            MovementType::ShoulderAbduction => "shoulder_abduction",
            MovementType::ShoulderRotation => "shoulder_rotation",
            MovementType::ElbowFlexion => "elbow_flexion",
            MovementType::KneeFlexion => "knee_flexion",
        }
    }

    pub fn joint(&self) -> &'static str {
        match self {
            MovementType::ShoulderFlexion
            | MovementType::ShoulderAbduction
            | MovementType::ShoulderRotation => "shoulder",
            MovementType::ElbowFlexion => "elbow",
            MovementType::KneeFlexion => "knee",
        }
    }

    /// Views from which the movement's measurement plane is observable
    pub fn supported_views(&self) -> &'static [ViewOrientation] {
        match self {
            MovementType::ShoulderFlexion | MovementType::ElbowFlexion => {
                &[ViewOrientation::Sagittal, ViewOrientation::Frontal]
            }
            MovementType::ShoulderAbduction => {
                &[ViewOrientation::Frontal, ViewOrientation::Posterior]
            }
            MovementType::ShoulderRotation => &[ViewOrientation::Frontal],
            MovementType::KneeFlexion => &[ViewOrientation::Sagittal],
        }
    }

    /// Movements graded on the assumption that the elbow stays extended
    pub fn assumes_extended_elbow(&self) -> bool {
        matches!(
            self,
            MovementType::ShoulderFlexion | MovementType::ShoulderAbduction
        )
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standing_frontal() -> LandmarkSet {
        LandmarkSet::new(LandmarkSchema::Coco17, ViewOrientation::Unknown, Timestamp(0))
            .with_landmark(LandmarkName::Nose, 0.5, 0.15, None, 0.9)
            .with_landmark(LandmarkName::LeftShoulder, 0.6, 0.3, None, 0.9)
            .with_landmark(LandmarkName::RightShoulder, 0.4, 0.3, None, 0.9)
            .with_landmark(LandmarkName::LeftHip, 0.57, 0.6, None, 0.9)
            .with_landmark(LandmarkName::RightHip, 0.43, 0.6, None, 0.9)
    }

    #[test]
    fn test_schema_index_roundtrip() {
        for schema in [LandmarkSchema::Coco17, LandmarkSchema::BlazePose33] {
            for name in LandmarkName::ALL {
                let idx = schema.index_of(name);
                assert!((idx as usize) < schema.landmark_count());
                assert_eq!(schema.name_at(idx), Some(name));
            }
        }
    }

    #[test]
    fn test_position_flips_image_y() {
        let lm = Landmark::new(0.2, 0.7, Some(-0.1), 0.9, 0);
        let p = lm.position();
        assert!((p.x - 0.2).abs() < 1e-12);
        assert!((p.y + 0.7).abs() < 1e-12);
        assert!((p.z - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_require_reports_missing_and_low_visibility() {
        let mut set = standing_frontal();
        set.insert(LandmarkName::LeftElbow, 0.65, 0.45, None, 0.2);

        let err = set
            .require(
                &[LandmarkName::LeftShoulder, LandmarkName::LeftElbow, LandmarkName::LeftWrist],
                DEFAULT_VISIBILITY_FLOOR,
                "upper arm",
            )
            .unwrap_err();

        match err {
            Error::InsufficientLandmarks { missing, .. } => {
                assert_eq!(missing, vec![LandmarkName::LeftElbow, LandmarkName::LeftWrist]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_view_inference() {
        let frontal = standing_frontal();
        assert_eq!(ViewOrientation::infer(&frontal), Some(ViewOrientation::Frontal));

        let mut posterior = frontal.clone();
        posterior.insert(LandmarkName::LeftShoulder, 0.4, 0.3, None, 0.9);
        posterior.insert(LandmarkName::RightShoulder, 0.6, 0.3, None, 0.9);
        assert_eq!(ViewOrientation::infer(&posterior), Some(ViewOrientation::Posterior));

        let mut side_on = frontal;
        side_on.insert(LandmarkName::LeftShoulder, 0.51, 0.3, None, 0.9);
        side_on.insert(LandmarkName::RightShoulder, 0.49, 0.3, None, 0.9);
        assert_eq!(ViewOrientation::infer(&side_on), Some(ViewOrientation::Sagittal));
    }

    #[test]
    fn test_from_indexed_blazepose() {
        let mut rows = vec![[0.0, 0.0, f64::NAN, 0.0]; 33];
        rows[11] = [0.6, 0.3, -0.05, 0.95];
        rows[12] = [0.4, 0.3, f64::NAN, 0.85];

        let set = LandmarkSet::from_indexed(
            LandmarkSchema::BlazePose33,
            ViewOrientation::Frontal,
            &rows,
            Timestamp(5),
        )
        .unwrap();

        let left = set.get(LandmarkName::LeftShoulder).unwrap();
        assert_eq!(left.index, 11);
        assert_eq!(left.depth, Some(-0.05));
        assert!(set.get(LandmarkName::RightShoulder).unwrap().depth.is_none());
        assert_eq!(set.len(), LandmarkName::ALL.len());

        assert!(LandmarkSet::from_indexed(
            LandmarkSchema::Coco17,
            ViewOrientation::Frontal,
            &rows,
            Timestamp(5)
        )
        .is_err());
    }

    #[test]
    fn test_frame_lineage_includes_ancestors() {
        let lineage = FrameType::ForearmRight.lineage_landmarks();
        for name in [
            LandmarkName::RightWrist,
            LandmarkName::RightElbow,
            LandmarkName::RightShoulder,
            LandmarkName::LeftShoulder,
            LandmarkName::LeftHip,
            LandmarkName::RightHip,
        ] {
            assert!(lineage.contains(&name), "{name:?} missing from lineage");
        }
        assert!(!lineage.contains(&LandmarkName::LeftWrist));
    }
}
