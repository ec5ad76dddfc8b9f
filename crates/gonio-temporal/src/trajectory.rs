//! Trajectory shape classification and velocity statistics.

use std::fmt;

use gonio_core::{mean, AngleSeries, TemporalConfig};
use serde::{Deserialize, Serialize};

/// Overall shape of a joint-angle trajectory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrajectoryPattern {
    Increasing,
    Decreasing,
    Static,
    Oscillating,
}

impl TrajectoryPattern {
    /// Classify a series.
    ///
    /// Static when the peak-to-peak range stays inside the static band,
    /// oscillating once enough reversals accumulate or when motion is not
    /// monotone, otherwise increasing or decreasing by net displacement.
    pub fn classify(series: &AngleSeries, config: &TemporalConfig) -> Self {
        if series.range() < config.static_range {
            return TrajectoryPattern::Static;
        }
        if series.count_reversals(config.reversal_hysteresis) >= config.oscillation_reversals {
            return TrajectoryPattern::Oscillating;
        }
        if series.monotonicity() < config.monotonicity_threshold {
            return TrajectoryPattern::Oscillating;
        }
        if series.displacement() >= 0.0 {
            TrajectoryPattern::Increasing
        } else {
            TrajectoryPattern::Decreasing
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrajectoryPattern::Increasing => "increasing",
            TrajectoryPattern::Decreasing => "decreasing",
            TrajectoryPattern::Static => "static",
            TrajectoryPattern::Oscillating => "oscillating",
        }
    }
}

impl fmt::Display for TrajectoryPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryMetrics {
    pub observed: TrajectoryPattern,
    pub expected: Option<TrajectoryPattern>,
    /// Observed equals expected; true when nothing was expected
    pub matches_expected: bool,
    /// Agreement of frame-to-frame motion with the expected (or observed) pattern, in [0, 1]
    pub trend_consistency: f64,
    /// Mean absolute angular velocity (deg/s)
    pub average_velocity: f64,
    /// Peak absolute angular velocity (deg/s)
    pub peak_velocity: f64,
    pub reversals: u32,
    /// Net change over the clip (degrees)
    pub displacement: f64,
    /// Peak-to-peak range (degrees)
    pub range: f64,
}

impl TrajectoryMetrics {
    pub fn from_series(
        series: &AngleSeries,
        expected: Option<TrajectoryPattern>,
        config: &TemporalConfig,
    ) -> Self {
        let observed = TrajectoryPattern::classify(series, config);
        let reversals = series.count_reversals(config.reversal_hysteresis);
        let speeds: Vec<f64> = series.velocities().iter().map(|v| v.abs()).collect();
        let reference = expected.unwrap_or(observed);

        Self {
            observed,
            expected,
            matches_expected: expected.map_or(true, |e| e == observed),
            trend_consistency: trend_consistency(series, reference, reversals, config),
            average_velocity: mean(&speeds),
            peak_velocity: speeds.iter().cloned().fold(0.0, f64::max),
            reversals,
            displacement: series.displacement(),
            range: series.range(),
        }
    }
}

fn trend_consistency(
    series: &AngleSeries,
    pattern: TrajectoryPattern,
    reversals: u32,
    config: &TemporalConfig,
) -> f64 {
    let deltas = series.deltas();
    if deltas.is_empty() {
        return 1.0;
    }

    let fraction = |keep: &dyn Fn(f64) -> bool, pool: &dyn Fn(f64) -> bool| {
        let considered: Vec<f64> = deltas.iter().cloned().filter(|d| pool(*d)).collect();
        if considered.is_empty() {
            return 0.0;
        }
        considered.iter().filter(|d| keep(**d)).count() as f64 / considered.len() as f64
    };
    let moving = |d: f64| d.abs() > 1e-9;

    match pattern {
        TrajectoryPattern::Increasing => fraction(&|d: f64| d > 0.0, &moving),
        TrajectoryPattern::Decreasing => fraction(&|d: f64| d < 0.0, &moving),
        TrajectoryPattern::Static => {
            fraction(&|d: f64| d.abs() <= config.reversal_hysteresis, &|_: f64| true)
        }
        TrajectoryPattern::Oscillating => {
            (reversals as f64 / config.oscillation_reversals as f64).min(1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gonio_core::{AngleSample, Timestamp};

    fn series(angles: &[f64]) -> AngleSeries {
        AngleSeries::new(
            angles
                .iter()
                .enumerate()
                .map(|(i, a)| AngleSample::new(Timestamp::from_nanos(i as i64 * 100_000_000), *a))
                .collect(),
            10.0,
        )
    }

    #[test]
    fn test_classifies_basic_shapes() {
        let config = TemporalConfig::default();
        let up: Vec<f64> = (0..30).map(|i| i as f64 * 3.0).collect();
        let down: Vec<f64> = up.iter().rev().cloned().collect();
        let still: Vec<f64> = (0..30).map(|i| 45.0 + (i % 3) as f64).collect();
        let wave: Vec<f64> = (0..60)
            .map(|i| 90.0 + 40.0 * (i as f64 * 0.3).sin())
            .collect();

        assert_eq!(TrajectoryPattern::classify(&series(&up), &config), TrajectoryPattern::Increasing);
        assert_eq!(TrajectoryPattern::classify(&series(&down), &config), TrajectoryPattern::Decreasing);
        assert_eq!(TrajectoryPattern::classify(&series(&still), &config), TrajectoryPattern::Static);
        assert_eq!(TrajectoryPattern::classify(&series(&wave), &config), TrajectoryPattern::Oscillating);
    }

    #[test]
    fn test_single_excursion_reverses_once() {
        // Raise to 120° and lower back: one reversal, net displacement ~0
        let mut angles: Vec<f64> = (0..=40).map(|i| i as f64 * 3.0).collect();
        angles.extend((0..40).rev().map(|i| i as f64 * 3.0));
        let config = TemporalConfig {
            oscillation_reversals: 2,
            ..TemporalConfig::default()
        };
        let s = series(&angles);
        assert_eq!(s.count_reversals(config.reversal_hysteresis), 1);
        // Below the reversal count but far from monotone
        assert_eq!(TrajectoryPattern::classify(&s, &config), TrajectoryPattern::Oscillating);
    }

    #[test]
    fn test_expected_pattern_and_velocity() {
        let up: Vec<f64> = (0..30).map(|i| i as f64 * 3.0).collect();
        let config = TemporalConfig::default();

        let matched = TrajectoryMetrics::from_series(&series(&up), Some(TrajectoryPattern::Increasing), &config);
        assert!(matched.matches_expected);
        assert!((matched.trend_consistency - 1.0).abs() < 1e-12);
        assert!((matched.average_velocity - 30.0).abs() < 1e-6);
        assert!((matched.peak_velocity - 30.0).abs() < 1e-6);

        let mismatched = TrajectoryMetrics::from_series(&series(&up), Some(TrajectoryPattern::Decreasing), &config);
        assert!(!mismatched.matches_expected);
        assert_eq!(mismatched.trend_consistency, 0.0);

        let unconstrained = TrajectoryMetrics::from_series(&series(&up), None, &config);
        assert!(unconstrained.matches_expected);
        assert_eq!(unconstrained.expected, None);
    }
}
