//! Ordered clinical measurements of one joint over a clip.

use gonio_clinical::ClinicalJointMeasurement;
use gonio_core::{AngleSample, AngleSeries, Error, MovementType, Result, SequenceId, Side, Timestamp};
use serde::{Deserialize, Serialize};

/// Measurements with parallel timestamps, assumed ordered by time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalMeasurementSequence {
    pub id: SequenceId,
    pub measurements: Vec<ClinicalJointMeasurement>,
    pub timestamps: Vec<Timestamp>,
    /// Nominal frame rate (fps)
    pub frame_rate: f64,
}

impl TemporalMeasurementSequence {
    pub fn new(
        measurements: Vec<ClinicalJointMeasurement>,
        timestamps: Vec<Timestamp>,
        frame_rate: f64,
    ) -> Self {
        Self {
            id: SequenceId::new(),
            measurements,
            timestamps,
            frame_rate,
        }
    }

    /// Sequence timed by each measurement's own timestamp
    pub fn from_measurements(measurements: Vec<ClinicalJointMeasurement>, frame_rate: f64) -> Self {
        let timestamps = measurements.iter().map(|m| m.timestamp).collect();
        Self::new(measurements, timestamps, frame_rate)
    }

    pub fn empty(frame_rate: f64) -> Self {
        Self::new(Vec::new(), Vec::new(), frame_rate)
    }

    pub fn push(&mut self, measurement: ClinicalJointMeasurement) {
        self.timestamps.push(measurement.timestamp);
        self.measurements.push(measurement);
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    pub fn movement(&self) -> Option<MovementType> {
        self.measurements.first().map(|m| m.primary.movement)
    }

    pub fn side(&self) -> Option<Side> {
        self.measurements.first().map(|m| m.primary.side)
    }

    /// Seconds spanned by the clip, on the nominal frame clock where
    /// timestamps do not advance
    pub fn duration_secs(&self) -> f64 {
        self.elapsed_secs().last().copied().unwrap_or(0.0)
    }

    /// Primary angles paired with their timestamps
    pub fn angle_series(&self) -> AngleSeries {
        let samples = self
            .measurements
            .iter()
            .zip(&self.timestamps)
            .map(|(m, t)| AngleSample::new(*t, m.primary.angle))
            .collect();
        AngleSeries::new(samples, self.frame_rate)
    }

    /// Seconds since the first frame, one per frame.
    ///
    /// Intervals whose timestamps do not advance count as one nominal frame.
    pub fn elapsed_secs(&self) -> Vec<f64> {
        self.angle_series().elapsed_secs()
    }

    /// Structural checks: non-empty, parallel arrays, one joint, positive rate
    pub fn validate(&self) -> Result<()> {
        if self.measurements.is_empty() {
            return Err(Error::InvalidSequence("sequence has no measurements".to_string()));
        }
        if self.timestamps.len() != self.measurements.len() {
            return Err(Error::InvalidSequence(format!(
                "{} measurements but {} timestamps",
                self.measurements.len(),
                self.timestamps.len()
            )));
        }
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(Error::InvalidSequence(format!(
                "frame rate must be positive, got {}",
                self.frame_rate
            )));
        }

        let first = &self.measurements[0].primary;
        if let Some(other) = self
            .measurements
            .iter()
            .map(|m| &m.primary)
            .find(|p| p.movement != first.movement || p.side != first.side)
        {
            return Err(Error::InvalidSequence(format!(
                "sequence mixes {} {} with {} {}",
                first.side, first.movement, other.side, other.movement
            )));
        }
        Ok(())
    }
}
