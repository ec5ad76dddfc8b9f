//! Per-frame quality trend over a clip.

use gonio_core::{linear_slope, mean};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub initial_quality: f64,
    pub final_quality: f64,
    pub mean_quality: f64,
    pub min_quality: f64,
    /// Least-squares slope of quality per second; negative when worsening
    pub degradation_rate: f64,
    /// Runs of consecutive frames below the minimum quality
    pub dropouts: u32,
    /// Frames below the minimum quality
    pub dropout_frames: usize,
}

impl QualityMetrics {
    /// `elapsed_secs` and `qualities` are parallel, one entry per frame
    pub fn from_samples(qualities: &[f64], elapsed_secs: &[f64], min_quality: f64) -> Self {
        let mut dropouts = 0u32;
        let mut dropout_frames = 0usize;
        let mut in_dropout = false;
        for &q in qualities {
            if q < min_quality {
                dropout_frames += 1;
                if !in_dropout {
                    dropouts += 1;
                    in_dropout = true;
                }
            } else {
                in_dropout = false;
            }
        }

        Self {
            initial_quality: qualities.first().copied().unwrap_or(0.0),
            final_quality: qualities.last().copied().unwrap_or(0.0),
            mean_quality: mean(qualities),
            min_quality: qualities.iter().cloned().reduce(f64::min).unwrap_or(0.0),
            degradation_rate: linear_slope(elapsed_secs, qualities),
            dropouts,
            dropout_frames,
        }
    }

    pub fn is_degrading(&self) -> bool {
        self.degradation_rate < 0.0
    }
}
