//! Criterion benchmarks for the pull graph (`rivulet-core`).
//!
//! Measures per-block cost of the buffering and combinator nodes with
//! synthetic sources, so results reflect graph overhead rather than I/O.
//!
//! Run with: `cargo bench -p rivulet-core`
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rivulet_core::{
    CircularBuffer, ConstantSource, Mixer, Multiplier, ResampleMode, SampleBuffer, SignalGraph,
};

const SAMPLE_RATE: f64 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 256, 1024];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE;
            ((2.0 * std::f64::consts::PI * 440.0 * t).sin() * 0.5) as f32
        })
        .collect()
}

fn bench_ring_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_buffer");

    for &block_size in BLOCK_SIZES {
        let block = SampleBuffer::from(generate_test_signal(block_size));
        group.bench_with_input(
            BenchmarkId::new("write_read", block_size),
            &block_size,
            |b, &n| {
                let mut ring = CircularBuffer::new(n * 4).unwrap();
                b.iter(|| {
                    ring.write(black_box(&block)).unwrap();
                    black_box(ring.read(n).unwrap());
                });
            },
        );
    }

    group.finish();
}

fn bench_adapter(c: &mut Criterion) {
    let mut group = c.benchmark_group("adapter");

    for &block_size in BLOCK_SIZES {
        group.bench_with_input(
            BenchmarkId::new("rechunk_from_100", block_size),
            &block_size,
            |b, &n| {
                let mut graph = SignalGraph::new();
                let src = graph.add(ConstantSource::new(0.5f32));
                let adapter = graph.add_adapter(src, Some(100)).unwrap();
                b.iter(|| black_box(graph.sample(&adapter, n).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_tee(c: &mut Criterion) {
    let mut group = c.benchmark_group("tee");

    for branches in [2usize, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("fan_out_256", branches),
            &branches,
            |b, &k| {
                let mut graph = SignalGraph::new();
                let src = graph.add(ConstantSource::new(0.5f32));
                let taps = graph.tee(src, k).unwrap();
                b.iter(|| {
                    for tap in &taps {
                        black_box(graph.sample(tap, 256).unwrap());
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_combinators(c: &mut Criterion) {
    let mut group = c.benchmark_group("combinators");

    for &block_size in BLOCK_SIZES {
        group.bench_with_input(
            BenchmarkId::new("mixer_4_inputs", block_size),
            &block_size,
            |b, &n| {
                let mut graph = SignalGraph::new();
                let mut mixer = Mixer::new();
                for i in 0..4 {
                    let src = graph.add(ConstantSource::new(i as f32));
                    mixer = mixer.with_input(src, 0.25f32);
                }
                let mix = graph.add(mixer);
                b.iter(|| black_box(graph.sample(&mix, n).unwrap()));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("multiplier_2_inputs", block_size),
            &block_size,
            |b, &n| {
                let mut graph = SignalGraph::new();
                let a = graph.add(ConstantSource::new(0.5f32));
                let c = graph.add(ConstantSource::new(2.0f64));
                let product = graph.add(Multiplier::new().with_input(a).with_input(c));
                b.iter(|| black_box(graph.sample(&product, n).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");

    for mode in [
        ResampleMode::Best,
        ResampleMode::Fastest,
        ResampleMode::Linear,
        ResampleMode::Reference,
    ] {
        group.bench_with_input(
            BenchmarkId::new("48k_to_44k1_1024", format!("{mode:?}")),
            &mode,
            |b, &mode| {
                let mut graph = SignalGraph::new();
                let src = graph.add(ConstantSource::new(0.5f32));
                let resampled = graph.add_resample(src, 44100.0, Some(mode)).unwrap();
                b.iter(|| black_box(graph.sample(&resampled, 1024).unwrap()));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_ring_buffer,
    bench_adapter,
    bench_tee,
    bench_combinators,
    bench_resample
);
criterion_main!(benches);
