//! Benchmarks for temporal sequence analysis.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gonio_clinical::ClinicalMeasurementService;
use gonio_core::synthetic::SyntheticPose;
use gonio_core::{EngineConfig, Side, Timestamp, ViewOrientation};
use gonio_temporal::{TemporalAnalyzer, TemporalMeasurementSequence, TrajectoryPattern};

fn flexion_clip(frames: usize) -> Option<TemporalMeasurementSequence> {
    let mut service = ClinicalMeasurementService::from_config(&EngineConfig::default()).ok()?;
    let mut clip = TemporalMeasurementSequence::empty(30.0);
    for i in 0..frames {
        let pose = SyntheticPose::new(ViewOrientation::Frontal, Side::Right)
            .shoulder_abduction(i as f64)
            .trunk_lean(if i > frames / 2 { 8.0 } else { 0.0 })
            .at(Timestamp::from_secs_f64(i as f64 / 30.0))
            .generate();
        clip.push(service.measure_shoulder_abduction(&pose, Side::Right).ok()?);
    }
    Some(clip)
}

fn benchmark_analyze(c: &mut Criterion) {
    let Some(clip) = flexion_clip(150) else {
        return;
    };
    let qualities: Vec<f64> = (0..150).map(|i| 0.95 - 0.002 * i as f64).collect();
    let analyzer = TemporalAnalyzer::default();

    c.bench_function("analyze_150_frames", |b| {
        b.iter(|| {
            analyzer
                .analyze(black_box(&clip), &qualities, Some(TrajectoryPattern::Increasing))
                .ok()
        })
    });

    c.bench_function("detect_anomalous_frames_150", |b| {
        b.iter(|| analyzer.detect_anomalous_frames(black_box(&clip)).ok())
    });
}

criterion_group!(benches, benchmark_analyze);
criterion_main!(benches);
