//! Validation harness for the goniometry engine.
//!
//! Feeds synthetic landmark sets with known ground truth through the public
//! measurement operations and aggregates accuracy (MAE, RMSE, R²) and
//! compensation detection (sensitivity, specificity) against thresholds.

use std::fs;
use std::path::Path;

use gonio_clinical::{ClinicalMeasurementService, CompensationType, Severity};
use gonio_core::synthetic::SyntheticPose;
use gonio_core::{EngineConfig, MovementType, Side, ViewOrientation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("failed to read protocol file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse protocol JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("protocol is invalid: {0}")]
    InvalidProtocol(String),
    #[error("engine error: {0}")]
    Engine(#[from] gonio_core::Error),
}

/// Ground-truth angle sweep for one movement
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccuracyTrial {
    pub movement: MovementType,
    pub view: ViewOrientation,
    pub side: Side,
    /// Ground-truth angles in degrees
    pub angles: Vec<f64>,
    #[serde(default)]
    pub with_depth: bool,
}

impl AccuracyTrial {
    /// Trial in the movement's preferred view, left side, no depth
    pub fn new(movement: MovementType, angles: Vec<f64>) -> Self {
        let view = movement
            .supported_views()
            .first()
            .copied()
            .unwrap_or(ViewOrientation::Frontal);
        Self {
            movement,
            view,
            side: Side::Left,
            angles,
            with_depth: false,
        }
    }

    fn validate(&self) -> Result<(), EvalError> {
        if self.angles.is_empty() {
            return Err(EvalError::InvalidProtocol(format!(
                "{} trial has no angles",
                self.movement
            )));
        }
        if !self.movement.supported_views().contains(&self.view) {
            return Err(EvalError::InvalidProtocol(format!(
                "{} cannot be measured from a {:?} view",
                self.movement, self.view
            )));
        }
        Ok(())
    }

    fn pose(&self, angle: f64) -> SyntheticPose {
        let pose = SyntheticPose::new(self.view, self.side).with_depth(self.with_depth);
        match self.movement {
            MovementType::ShoulderFlexion => pose.shoulder_flexion(angle),
            MovementType::ShoulderAbduction => pose.shoulder_abduction(angle),
            MovementType::ShoulderRotation => pose.elbow_flexion(90.0).shoulder_rotation(angle),
            MovementType::ElbowFlexion => pose.elbow_flexion(angle),
            MovementType::KneeFlexion => pose.knee_flexion(angle),
        }
    }
}

/// Known compensation magnitudes injected during shoulder abduction
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompensationTrial {
    pub compensation: CompensationType,
    /// Injected magnitudes in the compensation's unit
    pub magnitudes: Vec<f64>,
    #[serde(default = "default_trial_side")]
    pub side: Side,
    #[serde(default = "default_trial_abduction")]
    pub abduction: f64,
}

fn default_trial_side() -> Side {
    Side::Left
}

fn default_trial_abduction() -> f64 {
    90.0
}

impl CompensationTrial {
    pub fn new(compensation: CompensationType, magnitudes: Vec<f64>) -> Self {
        Self {
            compensation,
            magnitudes,
            side: default_trial_side(),
            abduction: default_trial_abduction(),
        }
    }

    fn pose(&self, magnitude: f64) -> SyntheticPose {
        let pose = SyntheticPose::new(ViewOrientation::Frontal, self.side)
            .shoulder_abduction(self.abduction);
        match self.compensation {
            CompensationType::TrunkLean => pose.trunk_lean(magnitude),
            CompensationType::ContralateralLean => pose.trunk_lean(-magnitude),
            CompensationType::TrunkRotation => pose.trunk_rotation(magnitude).with_depth(true),
            CompensationType::ShoulderHiking => pose.shoulder_hike_cm(magnitude),
            CompensationType::ElbowFlexion => pose.elbow_flexion(magnitude),
            CompensationType::HipHike => pose.hip_hike(magnitude),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub trials: usize,
    pub mean_absolute_error: f64,
    pub root_mean_square_error: f64,
    pub r_squared: f64,
    pub max_error: f64,
}

impl AccuracyReport {
    /// Aggregate `(truth, measured)` pairs; `None` when empty
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Option<Self> {
        if pairs.is_empty() {
            return None;
        }
        let n = pairs.len() as f64;
        let errors: Vec<f64> = pairs.iter().map(|(truth, measured)| measured - truth).collect();

        let mean_absolute_error = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
        let ss_res: f64 = errors.iter().map(|e| e * e).sum();
        let root_mean_square_error = (ss_res / n).sqrt();
        let max_error = errors.iter().fold(0.0_f64, |acc, e| acc.max(e.abs()));

        let truth_mean = pairs.iter().map(|(truth, _)| truth).sum::<f64>() / n;
        let ss_tot: f64 = pairs.iter().map(|(truth, _)| (truth - truth_mean).powi(2)).sum();
        let r_squared = if ss_tot > 1e-12 {
            1.0 - ss_res / ss_tot
        } else if ss_res < 1e-12 {
            1.0
        } else {
            0.0
        };

        Some(Self {
            trials: pairs.len(),
            mean_absolute_error,
            root_mean_square_error,
            r_squared,
            max_error,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub true_positives: u32,
    pub false_positives: u32,
    pub true_negatives: u32,
    pub false_negatives: u32,
}

impl DetectionReport {
    pub fn record(&mut self, expected: bool, detected: bool) {
        match (expected, detected) {
            (true, true) => self.true_positives += 1,
            (true, false) => self.false_negatives += 1,
            (false, true) => self.false_positives += 1,
            (false, false) => self.true_negatives += 1,
        }
    }

    /// TP / (TP + FN); `None` without positive trials
    pub fn sensitivity(&self) -> Option<f64> {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// TN / (TN + FP); `None` without negative trials
    pub fn specificity(&self) -> Option<f64> {
        ratio(self.true_negatives, self.true_negatives + self.false_positives)
    }

    pub fn merge(&mut self, other: &DetectionReport) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.true_negatives += other.true_negatives;
        self.false_negatives += other.false_negatives;
    }
}

fn ratio(num: u32, den: u32) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64)
}

/// Measure every ground-truth angle of `movement` in its preferred view
pub fn evaluate_movement_accuracy(
    service: &mut ClinicalMeasurementService,
    movement: MovementType,
    angles: &[f64],
) -> Result<AccuracyReport, EvalError> {
    evaluate_accuracy_trial(service, &AccuracyTrial::new(movement, angles.to_vec()))
}

pub fn evaluate_accuracy_trial(
    service: &mut ClinicalMeasurementService,
    trial: &AccuracyTrial,
) -> Result<AccuracyReport, EvalError> {
    trial.validate()?;
    let mut pairs = Vec::with_capacity(trial.angles.len());
    for &truth in &trial.angles {
        let landmarks = trial.pose(truth).generate();
        let measurement = service.measure(trial.movement, &landmarks, trial.side)?;
        pairs.push((truth, measurement.primary.angle));
    }
    AccuracyReport::from_pairs(&pairs)
        .ok_or_else(|| EvalError::InvalidProtocol("accuracy trial produced no samples".to_string()))
}

/// Inject each magnitude and check whether the compensation is reported.
///
/// A magnitude is a true compensation when it reaches the detector's mild
/// band; a report counts only at mild severity or above.
pub fn evaluate_compensation_detection(
    service: &mut ClinicalMeasurementService,
    trial: &CompensationTrial,
) -> Result<DetectionReport, EvalError> {
    let mild = mild_threshold(service, trial.compensation);
    let mut report = DetectionReport::default();
    for &magnitude in &trial.magnitudes {
        let landmarks = trial.pose(magnitude).generate();
        let measurement = service.measure(MovementType::ShoulderAbduction, &landmarks, trial.side)?;
        let detected = measurement.compensations.iter().any(|c| {
            c.compensation_type == trial.compensation && c.severity >= Severity::Mild
        });
        report.record(magnitude.abs() >= mild, detected);
    }
    Ok(report)
}

fn mild_threshold(service: &ClinicalMeasurementService, compensation: CompensationType) -> f64 {
    let config = service.detector().config();
    match compensation {
        CompensationType::TrunkLean | CompensationType::ContralateralLean => config.trunk_lean.mild,
        CompensationType::TrunkRotation => config.trunk_rotation.mild,
        CompensationType::ShoulderHiking => config.shoulder_hiking.mild,
        CompensationType::ElbowFlexion => config.elbow_drift.mild,
        CompensationType::HipHike => config.hip_hike.mild,
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvaluationThresholds {
    pub max_mae_deg: f64,
    pub min_sensitivity: f64,
    pub min_specificity: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvaluationProtocol {
    pub name: String,
    #[serde(default)]
    pub config: EngineConfig,
    pub thresholds: EvaluationThresholds,
    #[serde(default)]
    pub accuracy_trials: Vec<AccuracyTrial>,
    #[serde(default)]
    pub compensation_trials: Vec<CompensationTrial>,
}

impl EvaluationProtocol {
    fn validate(&self) -> Result<(), EvalError> {
        if self.accuracy_trials.is_empty() && self.compensation_trials.is_empty() {
            return Err(EvalError::InvalidProtocol(
                "protocol must contain at least one trial".to_string(),
            ));
        }
        for trial in &self.accuracy_trials {
            trial.validate()?;
        }
        if let Some(trial) = self.compensation_trials.iter().find(|t| t.magnitudes.is_empty()) {
            return Err(EvalError::InvalidProtocol(format!(
                "{} trial has no magnitudes",
                trial.compensation.name()
            )));
        }
        self.config.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementAccuracy {
    pub movement: MovementType,
    pub view: ViewOrientation,
    pub side: Side,
    pub report: AccuracyReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationDetection {
    pub compensation: CompensationType,
    pub report: DetectionReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub protocol_name: String,
    pub accuracy: Vec<MovementAccuracy>,
    pub detection: Vec<CompensationDetection>,
    /// Pooled over all compensation trials
    pub overall_detection: DetectionReport,
    pub failures: Vec<String>,
}

impl EvaluationReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

pub fn load_protocol(path: impl AsRef<Path>) -> Result<EvaluationProtocol, EvalError> {
    let path = path.as_ref();
    let payload = fs::read_to_string(path).map_err(|source| EvalError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let protocol: EvaluationProtocol = serde_json::from_str(&payload)?;
    protocol.validate()?;
    Ok(protocol)
}

pub fn evaluate_protocol_path(path: impl AsRef<Path>) -> Result<EvaluationReport, EvalError> {
    let protocol = load_protocol(path)?;
    evaluate_protocol(&protocol)
}

pub fn evaluate_protocol(protocol: &EvaluationProtocol) -> Result<EvaluationReport, EvalError> {
    protocol.validate()?;
    let mut service = ClinicalMeasurementService::from_config(&protocol.config)?;
    let thresholds = &protocol.thresholds;
    let mut failures = Vec::new();

    let mut accuracy = Vec::with_capacity(protocol.accuracy_trials.len());
    for trial in &protocol.accuracy_trials {
        let report = evaluate_accuracy_trial(&mut service, trial)?;
        if report.mean_absolute_error > thresholds.max_mae_deg {
            failures.push(format!(
                "{} {} ({:?} view) MAE {:.2}° exceeds {:.2}°",
                trial.side, trial.movement, trial.view, report.mean_absolute_error, thresholds.max_mae_deg
            ));
        }
        accuracy.push(MovementAccuracy {
            movement: trial.movement,
            view: trial.view,
            side: trial.side,
            report,
        });
    }

    let mut detection = Vec::with_capacity(protocol.compensation_trials.len());
    let mut overall_detection = DetectionReport::default();
    for trial in &protocol.compensation_trials {
        let report = evaluate_compensation_detection(&mut service, trial)?;
        overall_detection.merge(&report);
        detection.push(CompensationDetection {
            compensation: trial.compensation,
            report,
        });
    }
    if let Some(sensitivity) = overall_detection.sensitivity() {
        if sensitivity < thresholds.min_sensitivity {
            failures.push(format!(
                "compensation sensitivity {sensitivity:.2} below {:.2}",
                thresholds.min_sensitivity
            ));
        }
    }
    if let Some(specificity) = overall_detection.specificity() {
        if specificity < thresholds.min_specificity {
            failures.push(format!(
                "compensation specificity {specificity:.2} below {:.2}",
                thresholds.min_specificity
            ));
        }
    }

    info!(
        protocol = %protocol.name,
        accuracy_trials = accuracy.len(),
        compensation_trials = detection.len(),
        failures = failures.len(),
        "Evaluation complete"
    );

    Ok(EvaluationReport {
        protocol_name: protocol.name.clone(),
        accuracy,
        detection,
        overall_detection,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_statistics() {
        let report = AccuracyReport::from_pairs(&[(0.0, 1.0), (10.0, 9.0), (20.0, 23.0)]).unwrap();
        assert_eq!(report.trials, 3);
        assert!((report.mean_absolute_error - 5.0 / 3.0).abs() < 1e-12);
        assert!((report.root_mean_square_error - (11.0_f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(report.max_error, 3.0);
        // ss_tot = 200, ss_res = 11
        assert!((report.r_squared - (1.0 - 11.0 / 200.0)).abs() < 1e-12);
        assert!(AccuracyReport::from_pairs(&[]).is_none());
    }

    #[test]
    fn test_detection_rates() {
        let mut report = DetectionReport::default();
        report.record(true, true);
        report.record(true, false);
        report.record(false, false);
        report.record(false, false);
        report.record(false, true);

        assert_eq!(report.sensitivity(), Some(0.5));
        assert!((report.specificity().unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(DetectionReport::default().sensitivity(), None);
    }

    #[test]
    fn test_trial_rejects_unsupported_view() {
        let trial = AccuracyTrial {
            view: ViewOrientation::Posterior,
            ..AccuracyTrial::new(MovementType::KneeFlexion, vec![30.0])
        };
        assert!(matches!(trial.validate(), Err(EvalError::InvalidProtocol(_))));
        assert_eq!(
            AccuracyTrial::new(MovementType::ShoulderAbduction, vec![]).view,
            ViewOrientation::Frontal
        );
    }
}
