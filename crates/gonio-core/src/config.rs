//! Engine configuration.
//!
//! Every record is closed (unknown keys are rejected) and validated before
//! use; a record that fails validation never reaches a running component.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::MovementType;

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Clinical targets, tolerances and grade bands
    pub clinical: ClinicalConfig,

    /// Compensation severity thresholds
    pub compensation: CompensationConfig,

    /// Frame cache sizing
    pub cache: CacheConfig,

    /// Temporal consistency thresholds
    pub temporal: TemporalConfig,
}

impl EngineConfig {
    /// Load configuration from file, overlaid with `GONIO_*` environment variables
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("GONIO").separator("__"))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("GONIO").separator("__"))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.clinical.validate()?;
        self.compensation.validate()?;
        self.cache.validate()?;
        self.temporal.validate()
    }
}

/// Target range of motion and grade bands for one movement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MovementTarget {
    /// Target angle in degrees
    pub target_angle: f64,
    /// Percent of target at or above which the grade is excellent
    pub excellent_percent: f64,
    /// Percent of target at or above which the grade is good
    pub good_percent: f64,
}

impl MovementTarget {
    pub fn new(target_angle: f64) -> Self {
        Self {
            target_angle,
            excellent_percent: 90.0,
            good_percent: 70.0,
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !(self.target_angle > 0.0 && self.target_angle <= 360.0) {
            return Err(Error::Configuration(format!(
                "{name}.target_angle must be in (0, 360], got {}",
                self.target_angle
            )));
        }
        if !(self.good_percent > 0.0 && self.good_percent < self.excellent_percent) {
            return Err(Error::Configuration(format!(
                "{name}: good_percent ({}) must be positive and below excellent_percent ({})",
                self.good_percent, self.excellent_percent
            )));
        }
        Ok(())
    }
}

/// Secondary joint that must be held at a set angle while another is measured
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatingConfig {
    pub expected_angle: f64,
    /// Deviation beyond which a warning is attached
    pub warning_tolerance: f64,
    /// Deviation beyond which a compensation is reported
    pub significant_deviation: f64,
}

impl Default for GatingConfig {
    fn default() -> Self {
        Self {
            expected_angle: 90.0,
            warning_tolerance: 15.0,
            significant_deviation: 25.0,
        }
    }
}

/// Acceptable glenohumeral to scapulothoracic ratio during abduction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RhythmConfig {
    pub normal_min: f64,
    pub normal_max: f64,
    /// Elevation below which the ratio is not evaluated (setting phase)
    pub min_elevation: f64,
}

impl RhythmConfig {
    /// Ratio of an unelevated shoulder girdle, the middle of the normal band
    pub fn nominal_ratio(&self) -> f64 {
        (self.normal_min + self.normal_max) / 2.0
    }
}

impl Default for RhythmConfig {
    fn default() -> Self {
        Self {
            normal_min: 2.0,
            normal_max: 3.5,
            min_elevation: 30.0,
        }
    }
}

/// Score thresholds below which quality recommendations are issued
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QualityThresholds {
    pub low_visibility: f64,
    pub low_stability: f64,
    pub low_depth: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            low_visibility: 0.7,
            low_stability: 0.7,
            low_depth: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClinicalConfig {
    pub shoulder_flexion: MovementTarget,
    pub shoulder_abduction: MovementTarget,
    pub shoulder_rotation: MovementTarget,
    pub elbow_flexion: MovementTarget,
    pub knee_flexion: MovementTarget,

    /// Elbow held near 90° during shoulder rotation
    pub rotation_elbow_gate: GatingConfig,

    pub rhythm: RhythmConfig,

    /// Scapular plane, degrees anterior to the coronal plane
    pub scapular_plane_offset: f64,

    /// Assumed forearm length relative to the upper arm when depth is absent
    pub forearm_to_upper_arm_ratio: f64,

    /// Assumed upper-arm length relative to the trunk (hip to shoulder
    /// midpoint) when depth is absent
    pub upper_arm_to_trunk_ratio: f64,

    /// Landmarks below this visibility are treated as absent
    pub visibility_floor: f64,

    /// Infer the view when the detector reports `Unknown`
    pub infer_unknown_view: bool,

    pub quality: QualityThresholds,
}

impl Default for ClinicalConfig {
    fn default() -> Self {
        Self {
            shoulder_flexion: MovementTarget::new(160.0),
            shoulder_abduction: MovementTarget::new(160.0),
            shoulder_rotation: MovementTarget::new(90.0),
            elbow_flexion: MovementTarget::new(150.0),
            knee_flexion: MovementTarget::new(135.0),
            rotation_elbow_gate: GatingConfig::default(),
            rhythm: RhythmConfig::default(),
            scapular_plane_offset: 35.0,
            forearm_to_upper_arm_ratio: 0.85,
            upper_arm_to_trunk_ratio: 0.5,
            visibility_floor: 0.5,
            infer_unknown_view: true,
            quality: QualityThresholds::default(),
        }
    }
}

impl ClinicalConfig {
    pub fn target(&self, movement: MovementType) -> &MovementTarget {
        match movement {
            MovementType::ShoulderFlexion => &self.shoulder_flexion,
            MovementType::ShoulderAbduction => &self.shoulder_abduction,
            MovementType::ShoulderRotation => &self.shoulder_rotation,
            MovementType::ElbowFlexion => &self.elbow_flexion,
            MovementType::KneeFlexion => &self.knee_flexion,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for movement in MovementType::ALL {
            self.target(movement).validate(movement.name())?;
        }

        let gate = &self.rotation_elbow_gate;
        if gate.warning_tolerance <= 0.0 || gate.warning_tolerance >= gate.significant_deviation {
            return Err(Error::Configuration(format!(
                "rotation_elbow_gate: warning_tolerance ({}) must be positive and below significant_deviation ({})",
                gate.warning_tolerance, gate.significant_deviation
            )));
        }
        if !(0.0..=180.0).contains(&gate.expected_angle) {
            return Err(Error::Configuration(format!(
                "rotation_elbow_gate.expected_angle must be in [0, 180], got {}",
                gate.expected_angle
            )));
        }

        let rhythm = &self.rhythm;
        if rhythm.normal_min <= 0.0 || rhythm.normal_min >= rhythm.normal_max {
            return Err(Error::Configuration(format!(
                "rhythm: normal_min ({}) must be positive and below normal_max ({})",
                rhythm.normal_min, rhythm.normal_max
            )));
        }
        if !(0.0..180.0).contains(&rhythm.min_elevation) {
            return Err(Error::Configuration(format!(
                "rhythm.min_elevation must be in [0, 180), got {}",
                rhythm.min_elevation
            )));
        }

        if !(0.0..90.0).contains(&self.scapular_plane_offset) {
            return Err(Error::Configuration(format!(
                "scapular_plane_offset must be in [0, 90), got {}",
                self.scapular_plane_offset
            )));
        }
        positive("forearm_to_upper_arm_ratio", self.forearm_to_upper_arm_ratio)?;
        positive("upper_arm_to_trunk_ratio", self.upper_arm_to_trunk_ratio)?;
        unit_interval("clinical.visibility_floor", self.visibility_floor)?;
        unit_interval("quality.low_visibility", self.quality.low_visibility)?;
        unit_interval("quality.low_stability", self.quality.low_stability)?;
        unit_interval("quality.low_depth", self.quality.low_depth)
    }
}

/// Severity thresholds for one compensation rule.
///
/// Values below `mild` are minimal; `[mild, moderate)` mild;
/// `[moderate, severe)` moderate; at or above `severe` severe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeverityBands {
    pub mild: f64,
    pub moderate: f64,
    pub severe: f64,
}

impl SeverityBands {
    pub const fn new(mild: f64, moderate: f64, severe: f64) -> Self {
        Self {
            mild,
            moderate,
            severe,
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !(self.mild > 0.0 && self.mild < self.moderate && self.moderate < self.severe) {
            return Err(Error::Configuration(format!(
                "{name}: thresholds must satisfy 0 < mild < moderate < severe, got {} / {} / {}",
                self.mild, self.moderate, self.severe
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompensationConfig {
    /// Lateral trunk tilt (degrees)
    pub trunk_lean: SeverityBands,
    /// Trunk axial rotation (degrees)
    pub trunk_rotation: SeverityBands,
    /// Shoulder elevation (centimeters)
    pub shoulder_hiking: SeverityBands,
    /// Loss of elbow extension (degrees)
    pub elbow_drift: SeverityBands,
    /// Pelvic obliquity (degrees)
    pub hip_hike: SeverityBands,

    pub visibility_floor: f64,

    /// Report sub-threshold deviations with minimal severity
    pub report_minimal: bool,

    /// Typical vertical ear-to-shoulder distance, used to scale pixels to cm
    pub ear_to_shoulder_cm: f64,

    /// Typical biacromial width, used when ears are not visible
    pub shoulder_width_cm: f64,
}

impl Default for CompensationConfig {
    fn default() -> Self {
        Self {
            trunk_lean: SeverityBands::new(5.0, 15.0, 25.0),
            trunk_rotation: SeverityBands::new(5.0, 12.0, 20.0),
            shoulder_hiking: SeverityBands::new(1.0, 2.0, 3.5),
            elbow_drift: SeverityBands::new(5.0, 20.0, 35.0),
            hip_hike: SeverityBands::new(3.0, 5.5, 8.0),
            visibility_floor: 0.5,
            report_minimal: false,
            ear_to_shoulder_cm: 12.0,
            shoulder_width_cm: 38.0,
        }
    }
}

impl CompensationConfig {
    pub fn validate(&self) -> Result<()> {
        self.trunk_lean.validate("trunk_lean")?;
        self.trunk_rotation.validate("trunk_rotation")?;
        self.shoulder_hiking.validate("shoulder_hiking")?;
        self.elbow_drift.validate("elbow_drift")?;
        self.hip_hike.validate("hip_hike")?;
        unit_interval("compensation.visibility_floor", self.visibility_floor)?;
        if self.ear_to_shoulder_cm <= 0.0 || self.shoulder_width_cm <= 0.0 {
            return Err(Error::Configuration(
                "reference body dimensions must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Frame cache sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum resident entries (60 ≈ one second at 60 fps)
    pub max_entries: usize,
    /// Entry time-to-live in milliseconds
    pub ttl_ms: u64,
    /// Decimal places kept when quantizing landmark coordinates, in [0, 5]
    pub precision: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 60,
            ttl_ms: 16,
            precision: 2,
        }
    }
}

impl CacheConfig {
    pub const MAX_PRECISION: u32 = 5;

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(Error::Configuration(
                "cache.max_entries must be at least 1".to_string(),
            ));
        }
        if self.ttl_ms == 0 {
            return Err(Error::Configuration(
                "cache.ttl_ms must be at least 1".to_string(),
            ));
        }
        if self.precision > Self::MAX_PRECISION {
            return Err(Error::Configuration(format!(
                "cache.precision must be in [0, {}], got {}",
                Self::MAX_PRECISION,
                self.precision
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemporalConfig {
    /// Frame-to-frame change (degrees) above which a sudden jump is counted
    pub max_delta_per_frame: f64,
    /// Physiologically implausible angular velocity (deg/s)
    pub max_angular_velocity: f64,
    /// RMS second difference (deg/frame²) at which smoothness falls to 1/e
    pub smoothness_scale: f64,
    /// Smoothness below which a soft warning is issued
    pub smoothness_warning: f64,
    /// Peak-to-peak range (degrees) under which a sequence is static
    pub static_range: f64,
    /// |net| / path above which a sequence is monotone
    pub monotonicity_threshold: f64,
    /// Retreat (degrees) from an extremum that counts as a reversal
    pub reversal_hysteresis: f64,
    /// Reversals at which a sequence is oscillating
    pub oscillation_reversals: u32,
    /// Per-frame quality below which a frame is a dropout
    pub min_quality: f64,
    /// Final quality below which a degrading sequence fails
    pub quality_floor: f64,
    /// Fraction of frames above which a compensation is persistent
    pub persistence_threshold: f64,
    /// Quality slope (per second) below which a soft warning is issued
    pub degradation_warning_rate: f64,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            max_delta_per_frame: 25.0,
            max_angular_velocity: 720.0,
            smoothness_scale: 5.0,
            smoothness_warning: 0.7,
            static_range: 5.0,
            monotonicity_threshold: 0.7,
            reversal_hysteresis: 3.0,
            oscillation_reversals: 2,
            min_quality: 0.5,
            quality_floor: 0.5,
            persistence_threshold: 0.5,
            degradation_warning_rate: -0.05,
        }
    }
}

impl TemporalConfig {
    pub fn validate(&self) -> Result<()> {
        positive("temporal.max_delta_per_frame", self.max_delta_per_frame)?;
        positive("temporal.max_angular_velocity", self.max_angular_velocity)?;
        positive("temporal.smoothness_scale", self.smoothness_scale)?;
        non_negative("temporal.static_range", self.static_range)?;
        non_negative("temporal.reversal_hysteresis", self.reversal_hysteresis)?;
        if self.oscillation_reversals == 0 {
            return Err(Error::Configuration(
                "temporal.oscillation_reversals must be at least 1".to_string(),
            ));
        }
        if !self.degradation_warning_rate.is_finite() {
            return Err(Error::Configuration(format!(
                "temporal.degradation_warning_rate must be finite, got {}",
                self.degradation_warning_rate
            )));
        }
        unit_interval("temporal.smoothness_warning", self.smoothness_warning)?;
        unit_interval("temporal.monotonicity_threshold", self.monotonicity_threshold)?;
        unit_interval("temporal.min_quality", self.min_quality)?;
        unit_interval("temporal.quality_floor", self.quality_floor)?;
        unit_interval("temporal.persistence_threshold", self.persistence_threshold)
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::Configuration(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::Configuration(format!(
            "{name} must be non-negative and finite, got {value}"
        )))
    }
}

fn unit_interval(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::Configuration(format!(
            "{name} must be in [0, 1], got {value}"
        )))
    }
}
