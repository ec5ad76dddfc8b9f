//! Frame-to-frame consistency.
//!
//! A sudden jump is a change between consecutive frames that a real joint
//! cannot produce: either the angle moved more than the per-frame bound or
//! the implied angular velocity exceeds the physiological bound. Smoothness
//! is scored from the RMS of the second differences:
//!
//! S = exp(-rms(Δ²θ) / scale)

use gonio_core::{AngleSeries, TemporalConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyReason {
    /// Per-frame change above the configured bound
    SuddenJump,
    /// Angular velocity above the configured bound
    ImplausibleVelocity,
}

/// Frame whose change from its predecessor is physiologically implausible
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalousFrame {
    /// Index of the offending frame (always ≥ 1)
    pub frame: usize,
    /// Shortest angular change from the previous frame (degrees)
    pub delta: f64,
    /// Angular velocity from the previous frame (deg/s)
    pub velocity: f64,
    pub reason: AnomalyReason,
}

/// Flag frames whose delta or angular velocity from the predecessor is out of bounds
pub fn detect_anomalous_frames(series: &AngleSeries, config: &TemporalConfig) -> Vec<AnomalousFrame> {
    series
        .deltas()
        .into_iter()
        .zip(series.velocities())
        .enumerate()
        .filter_map(|(i, (delta, velocity))| {
            let reason = if delta.abs() > config.max_delta_per_frame {
                AnomalyReason::SuddenJump
            } else if velocity.abs() > config.max_angular_velocity {
                AnomalyReason::ImplausibleVelocity
            } else {
                return None;
            };
            Some(AnomalousFrame {
                frame: i + 1,
                delta,
                velocity,
                reason,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyMetrics {
    pub sudden_jumps: u32,
    pub anomalous_frames: Vec<AnomalousFrame>,
    /// Largest absolute frame-to-frame change (degrees)
    pub max_delta: f64,
    /// RMS second difference (deg/frame²)
    pub rms_jerk: f64,
    /// Smoothness in [0, 1]; 1 for constant-velocity motion
    pub smoothness_score: f64,
}

impl ConsistencyMetrics {
    pub fn from_series(series: &AngleSeries, config: &TemporalConfig) -> Self {
        let anomalous_frames = detect_anomalous_frames(series, config);
        let max_delta = series
            .deltas()
            .iter()
            .fold(0.0_f64, |acc, d| acc.max(d.abs()));
        let rms_jerk = series.rms_jerk();

        Self {
            sudden_jumps: anomalous_frames.len() as u32,
            anomalous_frames,
            max_delta,
            rms_jerk,
            smoothness_score: smoothness(rms_jerk, config.smoothness_scale),
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.sudden_jumps == 0
    }
}

fn smoothness(rms_jerk: f64, scale: f64) -> f64 {
    (-rms_jerk / scale).exp().clamp(0.0, 1.0)
}
