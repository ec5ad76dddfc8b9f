//! Temporal analyzer orchestrating the per-sequence checks.

use gonio_clinical::CompensationType;
use gonio_core::{Error, MovementType, Result, SequenceId, Side, TemporalConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consistency::{detect_anomalous_frames, AnomalousFrame, ConsistencyMetrics};
use crate::quality::QualityMetrics;
use crate::sequence::TemporalMeasurementSequence;
use crate::tracking::{track_compensations, CompensationTracking};
use crate::trajectory::{TrajectoryMetrics, TrajectoryPattern};

/// Outcome of analysing one sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalValidationResult {
    pub sequence_id: SequenceId,
    pub movement: MovementType,
    pub side: Side,
    pub frame_count: usize,
    pub duration_secs: f64,
    pub consistency: ConsistencyMetrics,
    pub trajectory: TrajectoryMetrics,
    pub compensations: Vec<CompensationTracking>,
    pub quality: QualityMetrics,
    pub passed: bool,
    /// Reasons the sequence failed
    pub failures: Vec<String>,
    /// Soft warnings that do not fail the sequence
    pub issues: Vec<String>,
}

impl TemporalValidationResult {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn tracking(&self, compensation_type: CompensationType) -> Option<&CompensationTracking> {
        self.compensations
            .iter()
            .find(|t| t.compensation_type == compensation_type)
    }

    pub fn has_persistent_compensation(&self) -> bool {
        self.compensations.iter().any(|t| t.is_persistent)
    }
}

/// Stateless analyzer; every call is a pure function of its input
#[derive(Debug, Clone, Default)]
pub struct TemporalAnalyzer {
    config: TemporalConfig,
}

impl TemporalAnalyzer {
    pub fn new(config: TemporalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TemporalConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: TemporalConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Analyse a sequence with one quality value per frame
    pub fn analyze(
        &self,
        sequence: &TemporalMeasurementSequence,
        per_frame_quality: &[f64],
        expected: Option<TrajectoryPattern>,
    ) -> Result<TemporalValidationResult> {
        sequence.validate()?;
        if per_frame_quality.len() != sequence.len() {
            return Err(Error::InvalidSequence(format!(
                "{} measurements but {} quality values",
                sequence.len(),
                per_frame_quality.len()
            )));
        }
        if let Some(bad) = per_frame_quality.iter().find(|q| !q.is_finite()) {
            return Err(Error::InvalidSequence(format!("non-finite frame quality {bad}")));
        }

        let config = &self.config;
        let series = sequence.angle_series();
        let consistency = ConsistencyMetrics::from_series(&series, config);
        let trajectory = TrajectoryMetrics::from_series(&series, expected, config);
        let compensations =
            track_compensations(&sequence.measurements, config.persistence_threshold);
        let quality = QualityMetrics::from_samples(
            per_frame_quality,
            &sequence.elapsed_secs(),
            config.min_quality,
        );

        let mut failures = Vec::new();
        if !consistency.is_consistent() {
            let frames: Vec<String> = consistency
                .anomalous_frames
                .iter()
                .map(|a| a.frame.to_string())
                .collect();
            failures.push(format!(
                "{} sudden jump(s) at frame(s) {}",
                consistency.sudden_jumps,
                frames.join(", ")
            ));
        }
        if let (Some(expected), false) = (trajectory.expected, trajectory.matches_expected) {
            failures.push(format!(
                "Expected {expected} trajectory, observed {}",
                trajectory.observed
            ));
        }
        let quality_failed =
            quality.is_degrading() && quality.final_quality < config.quality_floor;
        if quality_failed {
            failures.push(format!(
                "Quality degraded to {:.2}, below the floor of {:.2}",
                quality.final_quality, config.quality_floor
            ));
        }

        let mut issues = Vec::new();
        if consistency.smoothness_score < config.smoothness_warning {
            issues.push(format!(
                "Movement is not smooth (score {:.2})",
                consistency.smoothness_score
            ));
        }
        if !quality_failed && quality.degradation_rate < config.degradation_warning_rate {
            issues.push(format!(
                "Tracking quality is dropping by {:.3} per second",
                -quality.degradation_rate
            ));
        }
        if quality.dropouts > 0 {
            issues.push(format!(
                "{} low-quality dropout(s) covering {} frame(s)",
                quality.dropouts, quality.dropout_frames
            ));
        }
        for tracked in &compensations {
            if tracked.is_persistent {
                issues.push(format!(
                    "Persistent {} in {:.0}% of frames",
                    tracked.compensation_type.name().replace('_', " "),
                    tracked.persistence_rate * 100.0
                ));
            }
            if tracked.is_progressive {
                issues.push(format!(
                    "{} worsens over the movement",
                    capitalize(&tracked.compensation_type.name().replace('_', " "))
                ));
            }
        }

        let passed = failures.is_empty();
        let (movement, side) = match (sequence.movement(), sequence.side()) {
            (Some(movement), Some(side)) => (movement, side),
            _ => return Err(Error::InvalidSequence("sequence has no measurements".to_string())),
        };

        debug!(
            sequence = %sequence.id.0,
            frames = sequence.len(),
            %movement,
            passed,
            jumps = consistency.sudden_jumps,
            smoothness = consistency.smoothness_score,
            pattern = %trajectory.observed,
            "Temporal analysis complete"
        );

        Ok(TemporalValidationResult {
            sequence_id: sequence.id,
            movement,
            side,
            frame_count: sequence.len(),
            duration_secs: sequence.duration_secs(),
            consistency,
            trajectory,
            compensations,
            quality,
            passed,
            failures,
            issues,
        })
    }

    /// Analyse using each measurement's own quality score
    pub fn analyze_recorded(
        &self,
        sequence: &TemporalMeasurementSequence,
        expected: Option<TrajectoryPattern>,
    ) -> Result<TemporalValidationResult> {
        let qualities: Vec<f64> = sequence.measurements.iter().map(|m| m.quality.score).collect();
        self.analyze(sequence, &qualities, expected)
    }

    /// Frames whose change from the predecessor is physiologically implausible
    pub fn detect_anomalous_frames(
        &self,
        sequence: &TemporalMeasurementSequence,
    ) -> Result<Vec<AnomalousFrame>> {
        sequence.validate()?;
        Ok(detect_anomalous_frames(&sequence.angle_series(), &self.config))
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
