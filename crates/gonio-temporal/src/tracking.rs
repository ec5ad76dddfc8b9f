//! Compensation persistence and progression across a clip.

use gonio_clinical::{ClinicalJointMeasurement, CompensationType, Severity};
use gonio_core::mean;
use serde::{Deserialize, Serialize};

/// Detections needed before a trend in severity is considered
const MIN_PROGRESSIVE_DETECTIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationTracking {
    pub compensation_type: CompensationType,
    /// Fraction of frames showing the compensation
    pub persistence_rate: f64,
    pub first_detected_frame: usize,
    /// Frames showing the compensation
    pub detections: usize,
    pub peak_severity: Severity,
    pub is_persistent: bool,
    /// Severity rises from the earlier to the later detections
    pub is_progressive: bool,
}

/// Track every compensation type seen in `measurements`, ordered by first detection
pub fn track_compensations(
    measurements: &[ClinicalJointMeasurement],
    persistence_threshold: f64,
) -> Vec<CompensationTracking> {
    // Worst severity per frame, keyed by type in order of first appearance
    let mut seen: Vec<(CompensationType, Vec<(usize, Severity)>)> = Vec::new();
    for (frame, measurement) in measurements.iter().enumerate() {
        for pattern in &measurement.compensations {
            let idx = match seen.iter().position(|(t, _)| *t == pattern.compensation_type) {
                Some(idx) => idx,
                None => {
                    seen.push((pattern.compensation_type, Vec::new()));
                    seen.len() - 1
                }
            };
            let hits = &mut seen[idx].1;
            match hits.last_mut() {
                Some((last, severity)) if *last == frame => {
                    *severity = (*severity).max(pattern.severity);
                }
                _ => hits.push((frame, pattern.severity)),
            }
        }
    }

    let frames = measurements.len().max(1) as f64;
    seen.into_iter()
        .filter_map(|(compensation_type, hits)| {
            let (first_detected_frame, _) = *hits.first()?;
            let peak_severity = hits.iter().map(|(_, s)| *s).max()?;
            let persistence_rate = hits.len() as f64 / frames;
            Some(CompensationTracking {
                compensation_type,
                persistence_rate,
                first_detected_frame,
                detections: hits.len(),
                peak_severity,
                is_persistent: persistence_rate > persistence_threshold,
                is_progressive: is_progressive(&hits),
            })
        })
        .collect()
}

fn is_progressive(hits: &[(usize, Severity)]) -> bool {
    if hits.len() < MIN_PROGRESSIVE_DETECTIONS {
        return false;
    }
    let ranks: Vec<f64> = hits.iter().map(|(_, s)| s.rank() as f64).collect();
    let half = ranks.len() / 2;
    mean(&ranks[ranks.len() - half..]) > mean(&ranks[..half])
}

#[cfg(test)]
mod tests {
    use super::*;
    use gonio_clinical::ClinicalMeasurementService;
    use gonio_core::synthetic::SyntheticPose;
    use gonio_core::{EngineConfig, Side, ViewOrientation};

    fn measurements(leans: &[f64]) -> Vec<ClinicalJointMeasurement> {
        let mut service = ClinicalMeasurementService::from_config(&EngineConfig::default()).unwrap();
        leans
            .iter()
            .map(|&lean| {
                let pose = SyntheticPose::new(ViewOrientation::Frontal, Side::Left)
                    .shoulder_abduction(60.0)
                    .trunk_lean(lean)
                    .generate();
                service.measure_shoulder_abduction(&pose, Side::Left).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_growing_lean_is_persistent_and_progressive() {
        let leans = [0.0, 0.0, 7.0, 8.0, 12.0, 16.0, 20.0, 26.0];
        let tracked = track_compensations(&measurements(&leans), 0.5);

        let lean = tracked
            .iter()
            .find(|t| t.compensation_type == CompensationType::TrunkLean)
            .unwrap();
        assert_eq!(lean.first_detected_frame, 2);
        assert_eq!(lean.detections, 6);
        assert!((lean.persistence_rate - 0.75).abs() < 1e-12);
        assert!(lean.is_persistent);
        assert!(lean.is_progressive);
        assert_eq!(lean.peak_severity, Severity::Severe);
    }

    #[test]
    fn test_steady_intermittent_lean_is_neither() {
        let leans = [8.0, 0.0, 0.0, 8.0, 0.0, 0.0, 8.0, 0.0];
        let tracked = track_compensations(&measurements(&leans), 0.5);

        let lean = tracked
            .iter()
            .find(|t| t.compensation_type == CompensationType::TrunkLean)
            .unwrap();
        assert_eq!(lean.detections, 3);
        assert!(!lean.is_persistent);
        assert!(!lean.is_progressive);
    }

    #[test]
    fn test_clean_clip_tracks_nothing() {
        assert!(track_compensations(&measurements(&[0.0, 0.0, 0.0]), 0.5).is_empty());
        assert!(track_compensations(&[], 0.5).is_empty());
    }
}
