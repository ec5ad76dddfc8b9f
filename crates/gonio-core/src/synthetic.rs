//! Synthetic landmark sets with known ground-truth joint angles.
//!
//! Poses are built in a body-local basis (left, up, anterior) rooted at the
//! hip midpoint, then placed in front of a virtual camera for the requested
//! view. Segment lengths are in normalized image units.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::geometry::{normalize, rotate_about_axis};
use crate::types::{LandmarkName, LandmarkSchema, LandmarkSet, Side, Timestamp, ViewOrientation};

pub const HIP_HALF_WIDTH: f64 = 0.07;
pub const SHOULDER_HALF_WIDTH: f64 = 0.1;
pub const TRUNK_LENGTH: f64 = 0.3;
pub const UPPER_ARM_LENGTH: f64 = 0.15;
pub const FOREARM_LENGTH: f64 = 0.1275;
pub const THIGH_LENGTH: f64 = 0.22;
pub const SHANK_LENGTH: f64 = 0.2;
/// Ear height above the shoulder line
pub const EAR_HEIGHT: f64 = 0.1;
pub const EAR_HALF_WIDTH: f64 = 0.07;

/// Image position of the hip midpoint
const IMAGE_HIP_CENTER: (f64, f64) = (0.5, 0.65);

/// Ground-truth pose description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticPose {
    pub view: ViewOrientation,
    /// Side of the moving limb
    pub side: Side,
    pub shoulder_flexion: f64,
    /// Coronal-plane abduction; takes precedence over flexion when non-zero
    pub shoulder_abduction: f64,
    /// External rotation of the forearm about the upper-arm axis
    pub shoulder_rotation: f64,
    pub elbow_flexion: f64,
    pub knee_flexion: f64,
    /// Lateral trunk tilt in degrees, positive toward the moving side
    pub trunk_lean: f64,
    /// Axial trunk rotation in degrees, positive turns the moving side forward
    pub trunk_rotation: f64,
    /// Elevation of the moving-side shoulder in centimeters
    pub shoulder_hike_cm: f64,
    /// Pelvic obliquity in degrees, moving-side hip raised
    pub hip_hike: f64,
    /// Emit depth hints
    pub with_depth: bool,
    pub visibility: f64,
    /// Reference ear-to-shoulder distance in cm, used to scale `shoulder_hike_cm`
    pub ear_to_shoulder_cm: f64,
    pub timestamp: Timestamp,
}

impl Default for SyntheticPose {
    fn default() -> Self {
        Self {
            view: ViewOrientation::Frontal,
            side: Side::Left,
            shoulder_flexion: 0.0,
            shoulder_abduction: 0.0,
            shoulder_rotation: 0.0,
            elbow_flexion: 0.0,
            knee_flexion: 0.0,
            trunk_lean: 0.0,
            trunk_rotation: 0.0,
            shoulder_hike_cm: 0.0,
            hip_hike: 0.0,
            with_depth: false,
            visibility: 0.95,
            ear_to_shoulder_cm: 12.0,
            timestamp: Timestamp(0),
        }
    }
}

impl SyntheticPose {
    pub fn new(view: ViewOrientation, side: Side) -> Self {
        Self {
            view,
            side,
            ..Self::default()
        }
    }

    pub fn shoulder_flexion(mut self, degrees: f64) -> Self {
        self.shoulder_flexion = degrees;
        self
    }

    pub fn shoulder_abduction(mut self, degrees: f64) -> Self {
        self.shoulder_abduction = degrees;
        self
    }

    pub fn shoulder_rotation(mut self, degrees: f64) -> Self {
        self.shoulder_rotation = degrees;
        self
    }

    pub fn elbow_flexion(mut self, degrees: f64) -> Self {
        self.elbow_flexion = degrees;
        self
    }

    pub fn knee_flexion(mut self, degrees: f64) -> Self {
        self.knee_flexion = degrees;
        self
    }

    pub fn trunk_lean(mut self, degrees: f64) -> Self {
        self.trunk_lean = degrees;
        self
    }

    pub fn trunk_rotation(mut self, degrees: f64) -> Self {
        self.trunk_rotation = degrees;
        self
    }

    pub fn shoulder_hike_cm(mut self, cm: f64) -> Self {
        self.shoulder_hike_cm = cm;
        self
    }

    pub fn hip_hike(mut self, degrees: f64) -> Self {
        self.hip_hike = degrees;
        self
    }

    pub fn with_depth(mut self, with_depth: bool) -> Self {
        self.with_depth = with_depth;
        self
    }

    pub fn visibility(mut self, visibility: f64) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Render the pose as a detector-style landmark set
    pub fn generate(&self) -> LandmarkSet {
        let s = self.side.lateral_sign();
        let left = Vector3::<f64>::x();
        let up = Vector3::<f64>::y();
        let anterior = Vector3::<f64>::z();

        let mut points: Vec<(LandmarkName, Vector3<f64>)> = Vec::with_capacity(17);

        // Pelvis: obliquity raises the moving-side hip
        let hip_tilt = self.hip_hike.to_radians();
        let hip_axis = Vector3::new(hip_tilt.cos(), s * hip_tilt.sin(), 0.0);
        let moving_hip = hip_axis * (s * HIP_HALF_WIDTH);
        let other_hip = -moving_hip;
        points.push((LandmarkName::hip(self.side), moving_hip));
        points.push((LandmarkName::hip(self.side.opposite()), other_hip));

        // Legs: moving-side knee flexes the shank backwards
        let knee_angle = self.knee_flexion.to_radians();
        let moving_knee = moving_hip - up * THIGH_LENGTH;
        let shank = -up * knee_angle.cos() - anterior * knee_angle.sin();
        points.push((LandmarkName::knee(self.side), moving_knee));
        points.push((LandmarkName::ankle(self.side), moving_knee + shank * SHANK_LENGTH));
        let other_knee = other_hip - up * THIGH_LENGTH;
        points.push((LandmarkName::knee(self.side.opposite()), other_knee));
        points.push((
            LandmarkName::ankle(self.side.opposite()),
            other_knee - up * SHANK_LENGTH,
        ));

        // Trunk: lateral lean about the anterior axis, then axial rotation
        let lean = self.trunk_lean.to_radians();
        let trunk_up = Vector3::new(s * lean.sin(), lean.cos(), 0.0);
        let trunk_left = Vector3::new(lean.cos(), -s * lean.sin(), 0.0);
        let trunk_left = rotate_about_axis(&trunk_left, &trunk_up, -s * self.trunk_rotation);
        let trunk_anterior = trunk_left.cross(&trunk_up);

        let shoulder_mid = trunk_up * TRUNK_LENGTH;
        let hike_units = self.shoulder_hike_cm * ear_shoulder_distance() / self.ear_to_shoulder_cm;
        let moving_shoulder = shoulder_mid + trunk_left * (s * SHOULDER_HALF_WIDTH) + trunk_up * hike_units;
        let other_shoulder = shoulder_mid - trunk_left * (s * SHOULDER_HALF_WIDTH);
        points.push((LandmarkName::shoulder(self.side), moving_shoulder));
        points.push((LandmarkName::shoulder(self.side.opposite()), other_shoulder));

        // Head
        let head = shoulder_mid + trunk_up * EAR_HEIGHT;
        points.push((LandmarkName::LeftEar, head + trunk_left * EAR_HALF_WIDTH));
        points.push((LandmarkName::RightEar, head - trunk_left * EAR_HALF_WIDTH));
        let face = head + trunk_up * 0.03 + trunk_anterior * 0.04;
        points.push((LandmarkName::Nose, face));
        points.push((LandmarkName::LeftEye, face + trunk_up * 0.01 + trunk_left * 0.02));
        points.push((LandmarkName::RightEye, face + trunk_up * 0.01 - trunk_left * 0.02));

        // Moving arm
        let lateral = trunk_left * s;
        let humerus = if self.shoulder_abduction.abs() > 1e-9 {
            let a = self.shoulder_abduction.to_radians();
            -trunk_up * a.cos() + lateral * a.sin()
        } else {
            let f = self.shoulder_flexion.to_radians();
            -trunk_up * f.cos() + trunk_anterior * f.sin()
        };
        let elbow = moving_shoulder + humerus * UPPER_ARM_LENGTH;

        let r = self.shoulder_rotation.to_radians();
        let bend_seed = trunk_anterior * r.cos() + lateral * r.sin();
        let bend = normalize(&(bend_seed - humerus * bend_seed.dot(&humerus)))
            .or_else(|| normalize(&(trunk_up - humerus * trunk_up.dot(&humerus))))
            .unwrap_or(anterior);
        let phi = self.elbow_flexion.to_radians();
        let forearm = humerus * phi.cos() + bend * phi.sin();
        points.push((LandmarkName::elbow(self.side), elbow));
        points.push((LandmarkName::wrist(self.side), elbow + forearm * FOREARM_LENGTH));

        // Resting arm
        let other_elbow = other_shoulder - trunk_up * UPPER_ARM_LENGTH;
        points.push((LandmarkName::elbow(self.side.opposite()), other_elbow));
        points.push((
            LandmarkName::wrist(self.side.opposite()),
            other_elbow - trunk_up * FOREARM_LENGTH,
        ));

        let (world_left, world_anterior) = view_axes(self.view);
        let mut set = LandmarkSet::new(LandmarkSchema::Coco17, self.view, self.timestamp)
            .with_quality(self.visibility);
        for (name, local) in points {
            let world = world_left * local.x + Vector3::y() * local.y + world_anterior * local.z;
            let depth = if self.with_depth { Some(-world.z) } else { None };
            set.insert(
                name,
                IMAGE_HIP_CENTER.0 + world.x,
                IMAGE_HIP_CENTER.1 - world.y,
                depth,
                self.visibility,
            );
        }
        set
    }
}

/// Distance from an ear to the same-side shoulder in a neutral pose
pub fn ear_shoulder_distance() -> f64 {
    ((SHOULDER_HALF_WIDTH - EAR_HALF_WIDTH).powi(2) + EAR_HEIGHT.powi(2)).sqrt()
}

/// Body-space directions of the subject's left and anterior axes for a view
fn view_axes(view: ViewOrientation) -> (Vector3<f64>, Vector3<f64>) {
    match view {
        ViewOrientation::Frontal | ViewOrientation::Unknown => (Vector3::x(), Vector3::z()),
        ViewOrientation::Posterior => (-Vector3::x(), -Vector3::z()),
        // Facing image right; the left side is away from the camera
        ViewOrientation::Sagittal => (-Vector3::z(), Vector3::x()),
    }
}
