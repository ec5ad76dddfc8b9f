//! Geometric utilities for anatomical reference frames and joint angles.
//!
//! All public angle values are in degrees.

use nalgebra::{Matrix3, Rotation3, Unit, Vector3};
use serde::{Deserialize, Serialize};

use crate::types::FrameType;

/// Vectors shorter than this are treated as degenerate.
pub const GEOMETRY_EPSILON: f64 = 1e-9;

/// Orthonormal local coordinate system attached to a body segment.
///
/// X points toward the subject's left, Y superior (proximal for limb
/// segments), Z anterior; Z = X × Y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFrame {
    pub frame_type: FrameType,
    pub origin: Vector3<f64>,
    pub x_axis: Vector3<f64>,
    pub y_axis: Vector3<f64>,
    pub z_axis: Vector3<f64>,
    /// Minimum visibility among the landmarks the frame was built from
    pub confidence: f64,
}

impl ReferenceFrame {
    /// Build a frame from a primary Y direction and a lateral seed.
    ///
    /// The seed is orthogonalized against Y (Gram-Schmidt). Returns `None`
    /// when Y is degenerate or the seed is parallel to it.
    pub fn from_axes(
        frame_type: FrameType,
        origin: Vector3<f64>,
        y_direction: Vector3<f64>,
        lateral_seed: Vector3<f64>,
        confidence: f64,
    ) -> Option<Self> {
        let y_axis = normalize(&y_direction)?;
        let x_axis = normalize(&(lateral_seed - y_axis * lateral_seed.dot(&y_axis)))?;
        let z_axis = x_axis.cross(&y_axis).normalize();

        Some(Self {
            frame_type,
            origin,
            x_axis,
            y_axis,
            z_axis,
            confidence: confidence.clamp(0.0, 1.0),
        })
    }

    /// Body-space basis at `origin`
    pub fn identity(frame_type: FrameType, origin: Vector3<f64>, confidence: f64) -> Self {
        Self {
            frame_type,
            origin,
            x_axis: Vector3::x(),
            y_axis: Vector3::y(),
            z_axis: Vector3::z(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Rows are the frame axes, so `R * v` expresses `v` in local coordinates
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        Matrix3::from_rows(&[
            self.x_axis.transpose(),
            self.y_axis.transpose(),
            self.z_axis.transpose(),
        ])
    }

    pub fn to_local(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.rotation_matrix() * (point - self.origin)
    }

    pub fn direction_to_local(&self, direction: &Vector3<f64>) -> Vector3<f64> {
        self.rotation_matrix() * direction
    }

    pub fn is_orthonormal(&self, tolerance: f64) -> bool {
        let unit = |v: &Vector3<f64>| (v.norm() - 1.0).abs() < tolerance;
        unit(&self.x_axis)
            && unit(&self.y_axis)
            && unit(&self.z_axis)
            && self.x_axis.dot(&self.y_axis).abs() < tolerance
            && self.y_axis.dot(&self.z_axis).abs() < tolerance
            && self.z_axis.dot(&self.x_axis).abs() < tolerance
    }
}

pub fn normalize(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    let norm = v.norm();
    if norm < GEOMETRY_EPSILON {
        None
    } else {
        Some(v / norm)
    }
}

/// Calculate unsigned angle between two vectors in degrees
pub fn angle_between(v1: &Vector3<f64>, v2: &Vector3<f64>) -> f64 {
    let dot = v1.dot(v2);
    let norms = v1.norm() * v2.norm();
    if norms < GEOMETRY_EPSILON {
        0.0
    } else {
        (dot / norms).clamp(-1.0, 1.0).acos().to_degrees()
    }
}

/// Component of `v` lying in the plane with the given normal
pub fn project_onto_plane(v: &Vector3<f64>, normal: &Vector3<f64>) -> Vector3<f64> {
    match normalize(normal) {
        Some(n) => v - n * v.dot(&n),
        None => *v,
    }
}

/// Signed angle from `from` to `to` about `normal`, after projecting both into
/// the plane, in degrees within (-180, 180].
///
/// Returns `None` when either projection is degenerate.
pub fn signed_angle_in_plane(
    from: &Vector3<f64>,
    to: &Vector3<f64>,
    normal: &Vector3<f64>,
) -> Option<f64> {
    let n = normalize(normal)?;
    let a = normalize(&project_onto_plane(from, &n))?;
    let b = normalize(&project_onto_plane(to, &n))?;
    let sin = n.dot(&a.cross(&b));
    let cos = a.dot(&b).clamp(-1.0, 1.0);
    Some(sin.atan2(cos).to_degrees())
}

/// Unsigned angle between the in-plane projections, in degrees within [0, 180]
pub fn angle_in_plane(from: &Vector3<f64>, to: &Vector3<f64>, normal: &Vector3<f64>) -> Option<f64> {
    signed_angle_in_plane(from, to, normal).map(f64::abs)
}

/// Rotate `v` about `axis` by `angle_degrees` (right-hand rule)
pub fn rotate_about_axis(v: &Vector3<f64>, axis: &Vector3<f64>, angle_degrees: f64) -> Vector3<f64> {
    match normalize(axis) {
        Some(a) => Rotation3::from_axis_angle(&Unit::new_unchecked(a), angle_degrees.to_radians()) * v,
        None => *v,
    }
}

/// Shortest signed angular distance from `from` to `to`, in degrees within [-180, 180)
pub fn shortest_angular_distance(from: f64, to: f64) -> f64 {
    (to - from + 180.0).rem_euclid(360.0) - 180.0
}
