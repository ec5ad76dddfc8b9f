//! Reference frame construction from landmark sets.

use std::collections::BTreeMap;

use gonio_core::{
    normalize, Error, FrameType, LandmarkName, LandmarkSet, ReferenceFrame, Result, Side,
    ViewOrientation, DEFAULT_VISIBILITY_FLOOR,
};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::cache::FrameCache;

/// Shoulder-line length, relative to trunk length, below which the line is
/// too foreshortened to define the lateral axis.
const MIN_LATERAL_RATIO: f64 = 0.1;

/// Frames resolved for one landmark set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSet {
    frames: BTreeMap<FrameType, ReferenceFrame>,
}

impl FrameSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, frame: ReferenceFrame) {
        self.frames.insert(frame.frame_type, frame);
    }

    pub fn get(&self, frame_type: FrameType) -> Option<&ReferenceFrame> {
        self.frames.get(&frame_type)
    }

    /// Frame that must already have been computed
    pub fn require(&self, frame_type: FrameType) -> Result<&ReferenceFrame> {
        self.frames
            .get(&frame_type)
            .ok_or(Error::MissingFrame { frame: frame_type })
    }

    pub fn contains(&self, frame_type: FrameType) -> bool {
        self.frames.contains_key(&frame_type)
    }

    pub fn frame_types(&self) -> Vec<FrameType> {
        self.frames.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceFrame> {
        self.frames.values()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn mean_confidence(&self) -> f64 {
        if self.frames.is_empty() {
            return 0.0;
        }
        self.frames.values().map(|f| f.confidence).sum::<f64>() / self.frames.len() as f64
    }
}

/// Stateless anatomical frame builder
#[derive(Debug, Clone, Copy)]
pub struct FrameBuilder {
    visibility_floor: f64,
}

impl FrameBuilder {
    pub fn new(visibility_floor: f64) -> Self {
        Self {
            visibility_floor: visibility_floor.clamp(0.0, 1.0),
        }
    }

    pub fn visibility_floor(&self) -> f64 {
        self.visibility_floor
    }

    /// World frame rooted at the hip midpoint
    pub fn global(&self, landmarks: &LandmarkSet) -> Result<ReferenceFrame> {
        let names = FrameType::Global.own_landmarks();
        landmarks.require(&names, self.visibility_floor, "global frame")?;
        let origin = self.point_midpoint(landmarks, LandmarkName::LeftHip, LandmarkName::RightHip)?;

        Ok(ReferenceFrame::identity(
            FrameType::Global,
            origin,
            landmarks.min_visibility(&names),
        ))
    }

    pub fn thorax(&self, landmarks: &LandmarkSet, global: &ReferenceFrame) -> Result<ReferenceFrame> {
        let names = FrameType::Thorax.own_landmarks();
        landmarks.require(&names, self.visibility_floor, "thorax frame")?;

        let shoulder_mid =
            self.point_midpoint(landmarks, LandmarkName::LeftShoulder, LandmarkName::RightShoulder)?;
        let hip_mid = self.point_midpoint(landmarks, LandmarkName::LeftHip, LandmarkName::RightHip)?;
        let trunk = shoulder_mid - hip_mid;

        let shoulder_line = self.point(landmarks, LandmarkName::LeftShoulder)?
            - self.point(landmarks, LandmarkName::RightShoulder)?;
        let seeds = self.lateral_seeds(landmarks, shoulder_line, trunk.norm(), global);

        seeds
            .into_iter()
            .find_map(|seed| {
                ReferenceFrame::from_axes(
                    FrameType::Thorax,
                    shoulder_mid,
                    trunk,
                    seed,
                    landmarks.min_visibility(&names),
                )
            })
            .ok_or_else(|| Error::insufficient("thorax frame (degenerate trunk axis)", names))
    }

    /// Pelvis frame: lateral axis along the hip line, kept orthogonal to vertical
    pub fn pelvis(&self, landmarks: &LandmarkSet, global: &ReferenceFrame) -> Result<ReferenceFrame> {
        let names = FrameType::Pelvis.own_landmarks();
        landmarks.require(&names, self.visibility_floor, "pelvis frame")?;

        let hip_mid = self.point_midpoint(landmarks, LandmarkName::LeftHip, LandmarkName::RightHip)?;
        let hip_line = self.point(landmarks, LandmarkName::LeftHip)?
            - self.point(landmarks, LandmarkName::RightHip)?;
        let seeds = self.lateral_seeds(landmarks, hip_line, 0.0, global);

        seeds
            .into_iter()
            .find_map(|seed| {
                ReferenceFrame::from_axes(
                    FrameType::Pelvis,
                    hip_mid,
                    global.y_axis,
                    seed,
                    landmarks.min_visibility(&names),
                )
            })
            .ok_or_else(|| Error::insufficient("pelvis frame (degenerate hip line)", names))
    }

    /// Humerus frame; the thorax resolves rotation about the long axis
    pub fn upper_arm(
        &self,
        landmarks: &LandmarkSet,
        side: Side,
        thorax: &ReferenceFrame,
    ) -> Result<ReferenceFrame> {
        let frame_type = FrameType::upper_arm(side);
        self.segment(
            landmarks,
            frame_type,
            LandmarkName::shoulder(side),
            LandmarkName::elbow(side),
            thorax,
        )
    }

    pub fn forearm(
        &self,
        landmarks: &LandmarkSet,
        side: Side,
        upper_arm: &ReferenceFrame,
    ) -> Result<ReferenceFrame> {
        let frame_type = FrameType::forearm(side);
        self.segment(
            landmarks,
            frame_type,
            LandmarkName::elbow(side),
            LandmarkName::wrist(side),
            upper_arm,
        )
    }

    /// Build any frame type against previously computed parents.
    ///
    /// Fails with `MissingFrame` when the parent is not in `frames`.
    pub fn build(
        &self,
        frame_type: FrameType,
        landmarks: &LandmarkSet,
        frames: &FrameSet,
    ) -> Result<ReferenceFrame> {
        let parent = match frame_type.parent() {
            Some(parent_type) => Some(frames.require(parent_type)?),
            None => None,
        };

        match (frame_type, parent) {
            (FrameType::Global, _) => self.global(landmarks),
            (FrameType::Thorax, Some(global)) => self.thorax(landmarks, global),
            (FrameType::Pelvis, Some(global)) => self.pelvis(landmarks, global),
            (FrameType::UpperArmLeft, Some(thorax)) => self.upper_arm(landmarks, Side::Left, thorax),
            (FrameType::UpperArmRight, Some(thorax)) => {
                self.upper_arm(landmarks, Side::Right, thorax)
            }
            (FrameType::ForearmLeft, Some(upper)) => self.forearm(landmarks, Side::Left, upper),
            (FrameType::ForearmRight, Some(upper)) => self.forearm(landmarks, Side::Right, upper),
            (other, None) => Err(Error::MissingFrame {
                frame: other.parent().unwrap_or(other),
            }),
        }
    }

    /// Resolve `frame_type` and its ancestors through the cache into `frames`
    pub fn resolve(
        &self,
        cache: &mut FrameCache,
        landmarks: &LandmarkSet,
        frame_type: FrameType,
        frames: &mut FrameSet,
    ) -> Result<ReferenceFrame> {
        if let Some(frame) = frames.get(frame_type) {
            return Ok(*frame);
        }
        if let Some(parent) = frame_type.parent() {
            self.resolve(cache, landmarks, parent, frames)?;
        }

        // Cache keys ignore visibility, so occlusion is checked on every lookup
        landmarks.require(
            &frame_type.own_landmarks(),
            self.visibility_floor,
            &format!("{frame_type:?} frame"),
        )?;
        let parents: &FrameSet = frames;
        let frame = cache.get(frame_type, landmarks, || {
            self.build(frame_type, landmarks, parents)
        })?;
        frames.insert(frame);
        Ok(frame)
    }

    fn segment(
        &self,
        landmarks: &LandmarkSet,
        frame_type: FrameType,
        proximal: LandmarkName,
        distal: LandmarkName,
        parent: &ReferenceFrame,
    ) -> Result<ReferenceFrame> {
        let names = [proximal, distal];
        landmarks.require(&names, self.visibility_floor, &format!("{frame_type:?} frame"))?;

        let origin = self.point(landmarks, proximal)?;
        let long_axis = origin - self.point(landmarks, distal)?;

        [parent.x_axis, parent.z_axis]
            .into_iter()
            .find_map(|seed| {
                ReferenceFrame::from_axes(
                    frame_type,
                    origin,
                    long_axis,
                    seed,
                    landmarks.min_visibility(&names),
                )
            })
            .ok_or_else(|| {
                Error::insufficient(format!("{frame_type:?} frame (zero-length segment)"), names.to_vec())
            })
    }

    /// Candidate lateral directions, most trusted first.
    ///
    /// A side-on camera collapses the left-right line unless depth is
    /// available, so the camera axis stands in for it.
    fn lateral_seeds(
        &self,
        landmarks: &LandmarkSet,
        line: Vector3<f64>,
        reference_length: f64,
        global: &ReferenceFrame,
    ) -> Vec<Vector3<f64>> {
        let line_usable = normalize(&line).is_some()
            && line.norm() >= reference_length * MIN_LATERAL_RATIO;
        let sagittal = landmarks.view == ViewOrientation::Sagittal;
        let has_depth = landmarks.depth_coverage(&FrameType::Thorax.own_landmarks()) >= 1.0;

        let mut seeds = Vec::with_capacity(3);
        if line_usable && (!sagittal || has_depth) {
            seeds.push(line);
        }
        if sagittal {
            seeds.push(global.z_axis);
            seeds.push(global.x_axis);
        } else {
            seeds.push(global.x_axis);
            seeds.push(global.z_axis);
        }
        seeds
    }

    fn point(&self, landmarks: &LandmarkSet, name: LandmarkName) -> Result<Vector3<f64>> {
        landmarks
            .position(name, self.visibility_floor)
            .ok_or_else(|| Error::insufficient(format!("{name:?}"), vec![name]))
    }

    fn point_midpoint(
        &self,
        landmarks: &LandmarkSet,
        a: LandmarkName,
        b: LandmarkName,
    ) -> Result<Vector3<f64>> {
        Ok((self.point(landmarks, a)? + self.point(landmarks, b)?) / 2.0)
    }
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBILITY_FLOOR)
    }
}
