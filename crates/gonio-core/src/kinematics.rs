//! Angular kinematics over joint-angle time series.

use serde::{Deserialize, Serialize};

use crate::geometry::shortest_angular_distance;
use crate::types::Timestamp;

/// One joint-angle observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleSample {
    pub timestamp: Timestamp,
    /// Joint angle in degrees
    pub angle: f64,
}

impl AngleSample {
    pub fn new(timestamp: Timestamp, angle: f64) -> Self {
        Self { timestamp, angle }
    }
}

/// Ordered joint-angle series sampled at a nominal frame rate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AngleSeries {
    pub samples: Vec<AngleSample>,
    /// Nominal frame rate used when timestamps do not advance
    pub frame_rate: f64,
}

impl AngleSeries {
    pub fn new(samples: Vec<AngleSample>, frame_rate: f64) -> Self {
        Self {
            samples,
            frame_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Frame-to-frame change, using the shortest angular distance
    pub fn deltas(&self) -> Vec<f64> {
        self.samples
            .windows(2)
            .map(|w| shortest_angular_distance(w[0].angle, w[1].angle))
            .collect()
    }

    /// Angles with wrap-around removed: the first angle plus cumulative deltas
    pub fn unwrapped(&self) -> Vec<f64> {
        let Some(first) = self.samples.first() else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(self.samples.len());
        let mut current = first.angle;
        out.push(current);
        for delta in self.deltas() {
            current += delta;
            out.push(current);
        }
        out
    }

    /// Seconds between consecutive samples; falls back to the nominal frame
    /// interval when timestamps do not advance
    pub fn intervals_secs(&self) -> Vec<f64> {
        let nominal = if self.frame_rate > 0.0 {
            1.0 / self.frame_rate
        } else {
            0.0
        };
        self.samples
            .windows(2)
            .map(|w| {
                let dt = (w[1].timestamp.as_nanos() - w[0].timestamp.as_nanos()) as f64 / 1e9;
                if dt > 0.0 {
                    dt
                } else {
                    nominal
                }
            })
            .collect()
    }

    /// Seconds since the first sample, accumulated from `intervals_secs`
    pub fn elapsed_secs(&self) -> Vec<f64> {
        if self.samples.is_empty() {
            return Vec::new();
        }
        let mut elapsed = 0.0;
        std::iter::once(0.0)
            .chain(self.intervals_secs().into_iter().map(|dt| {
                elapsed += dt;
                elapsed
            }))
            .collect()
    }

    /// Signed angular velocity per interval (deg/s)
    pub fn velocities(&self) -> Vec<f64> {
        self.deltas()
            .iter()
            .zip(self.intervals_secs())
            .map(|(d, dt)| if dt > 0.0 { d / dt } else { 0.0 })
            .collect()
    }

    /// Second-order differences of the angle (deg/frame²), the jerk proxy
    pub fn second_differences(&self) -> Vec<f64> {
        self.deltas().windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Root mean square of the second-order differences
    pub fn rms_jerk(&self) -> f64 {
        let diffs = self.second_differences();
        if diffs.is_empty() {
            return 0.0;
        }
        (diffs.iter().map(|d| d * d).sum::<f64>() / diffs.len() as f64).sqrt()
    }

    /// Total angular distance travelled
    pub fn path_length(&self) -> f64 {
        self.deltas().iter().map(|d| d.abs()).sum()
    }

    /// Net change from first to last sample
    pub fn displacement(&self) -> f64 {
        self.deltas().iter().sum()
    }

    /// |displacement| / path length; 1.0 for a perfectly monotone series
    pub fn monotonicity(&self) -> f64 {
        let path = self.path_length();
        if path < 1e-10 {
            return 1.0;
        }
        self.displacement().abs() / path
    }

    /// Peak-to-peak range of the unwrapped angle
    pub fn range(&self) -> f64 {
        let unwrapped = self.unwrapped();
        let max = unwrapped.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min = unwrapped.iter().cloned().fold(f64::INFINITY, f64::min);
        if unwrapped.is_empty() {
            0.0
        } else {
            max - min
        }
    }

    /// Direction reversals at local extrema.
    ///
    /// A reversal counts once motion retreats more than `hysteresis` degrees
    /// from the running extremum, so sensor jitter does not register.
    pub fn count_reversals(&self, hysteresis: f64) -> u32 {
        let unwrapped = self.unwrapped();
        if unwrapped.len() < 3 {
            return 0;
        }

        let mut reversals = 0u32;
        let mut direction = 0i8;
        let mut extremum = unwrapped[0];

        for &angle in &unwrapped[1..] {
            match direction {
                0 => {
                    if angle - extremum > hysteresis {
                        direction = 1;
                        extremum = angle;
                    } else if extremum - angle > hysteresis {
                        direction = -1;
                        extremum = angle;
                    }
                }
                1 => {
                    if angle > extremum {
                        extremum = angle;
                    } else if extremum - angle > hysteresis {
                        reversals += 1;
                        direction = -1;
                        extremum = angle;
                    }
                }
                _ => {
                    if angle < extremum {
                        extremum = angle;
                    } else if angle - extremum > hysteresis {
                        reversals += 1;
                        direction = 1;
                        extremum = angle;
                    }
                }
            }
        }

        reversals
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance
pub fn variance(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Least-squares slope of `ys` over `xs`; 0 when undefined
pub fn linear_slope(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let mx = mean(&xs[..n]);
    let my = mean(&ys[..n]);
    let mut num = 0.0;
    let mut den = 0.0;
    for i in 0..n {
        num += (xs[i] - mx) * (ys[i] - my);
        den += (xs[i] - mx).powi(2);
    }
    if den < 1e-12 {
        0.0
    } else {
        num / den
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(angles: &[f64], fps: f64) -> AngleSeries {
        let step = (1e9 / fps) as i64;
        AngleSeries::new(
            angles
                .iter()
                .enumerate()
                .map(|(i, a)| AngleSample::new(Timestamp::from_nanos(i as i64 * step), *a))
                .collect(),
            fps,
        )
    }

    #[test]
    fn test_ramp_is_smooth_and_monotone() {
        let angles: Vec<f64> = (0..150).map(|i| i as f64).collect();
        let s = series(&angles, 30.0);

        assert!(s.rms_jerk() < 1e-9);
        assert!((s.monotonicity() - 1.0).abs() < 1e-12);
        assert!((s.displacement() - 149.0).abs() < 1e-9);
        assert_eq!(s.count_reversals(3.0), 0);
        let v = s.velocities();
        assert!((v[0] - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_wraparound_deltas_use_shortest_path() {
        let s = series(&[350.0, 355.0, 0.0, 5.0, 10.0], 30.0);
        let deltas = s.deltas();
        assert!(deltas.iter().all(|d| (d - 5.0).abs() < 1e-9));
        assert!((s.range() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_reversals_ignore_jitter() {
        let jitter = series(&[10.0, 11.0, 10.0, 11.0, 10.0, 11.0], 30.0);
        assert_eq!(jitter.count_reversals(3.0), 0);

        let reps = series(&[0.0, 40.0, 80.0, 40.0, 0.0, 40.0, 80.0], 30.0);
        assert_eq!(reps.count_reversals(3.0), 2);
    }

    #[test]
    fn test_intervals_fall_back_to_frame_rate() {
        let s = AngleSeries::new(
            vec![
                AngleSample::new(Timestamp(0), 0.0),
                AngleSample::new(Timestamp(0), 1.0),
            ],
            50.0,
        );
        assert!((s.intervals_secs()[0] - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_linear_slope() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.0, 0.9, 0.8, 0.7];
        assert!((linear_slope(&xs, &ys) + 0.1).abs() < 1e-12);
        assert_eq!(linear_slope(&[1.0], &[2.0]), 0.0);
    }

    #[test]
    fn test_elapsed_falls_back_to_frame_clock() {
        let stalled = AngleSeries::new(
            (0..4).map(|i| AngleSample::new(Timestamp(0), i as f64)).collect(),
            20.0,
        );
        let elapsed = stalled.elapsed_secs();
        assert_eq!(elapsed.len(), 4);
        assert!((elapsed[3] - 0.15).abs() < 1e-12);

        let timed = series(&[0.0, 1.0, 2.0], 10.0);
        assert!((timed.elapsed_secs()[2] - 0.2).abs() < 1e-9);
        assert!(AngleSeries::new(Vec::new(), 30.0).elapsed_secs().is_empty());
    }
}
