//! Measurement quality assessment.

use gonio_core::{LandmarkName, LandmarkSet, QualityThresholds, ReferenceFrame};
use serde::{Deserialize, Serialize};

const VISIBILITY_WEIGHT: f64 = 0.5;
const STABILITY_WEIGHT: f64 = 0.3;
const DEPTH_WEIGHT: f64 = 0.2;

/// Overall quality bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl QualityLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.85 {
            QualityLevel::Excellent
        } else if score >= 0.70 {
            QualityLevel::Good
        } else if score >= 0.50 {
            QualityLevel::Fair
        } else {
            QualityLevel::Poor
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub overall: QualityLevel,
    /// Weighted score in [0, 1]
    pub score: f64,
    /// Mean visibility of the landmarks the measurement used
    pub landmark_visibility: f64,
    /// Mean confidence of the frames the measurement used
    pub frame_stability: f64,
    /// Fraction of used landmarks carrying a depth hint
    pub depth_reliability: f64,
    pub recommendations: Vec<String>,
}

impl QualityAssessment {
    pub fn assess(
        landmarks: &LandmarkSet,
        used_landmarks: &[LandmarkName],
        frames: &[ReferenceFrame],
        thresholds: &QualityThresholds,
    ) -> Self {
        let landmark_visibility = landmarks.mean_visibility(used_landmarks);
        let frame_stability = if frames.is_empty() {
            0.0
        } else {
            frames.iter().map(|f| f.confidence).sum::<f64>() / frames.len() as f64
        };
        let depth_reliability = landmarks.depth_coverage(used_landmarks);

        let score = (VISIBILITY_WEIGHT * landmark_visibility
            + STABILITY_WEIGHT * frame_stability
            + DEPTH_WEIGHT * depth_reliability)
            .clamp(0.0, 1.0);

        let mut recommendations = Vec::new();
        if landmark_visibility < thresholds.low_visibility {
            recommendations
                .push("Improve lighting or reduce occlusion so all joints are clearly visible".to_string());
        }
        if frame_stability < thresholds.low_stability {
            recommendations.push(
                "Hold the camera steady and keep the whole body inside the frame".to_string(),
            );
        }
        if depth_reliability < thresholds.low_depth {
            recommendations.push("A depth sensor would improve accuracy".to_string());
        }

        Self {
            overall: QualityLevel::from_score(score),
            score,
            landmark_visibility,
            frame_stability,
            depth_reliability,
            recommendations,
        }
    }
}
