//! Criterion benchmarks for the filtro render kernel
//!
//! Run with: cargo bench -p filtro-core
#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use filtro_core::{
    AtomicParam, ChannelState, FilterKernel, FilterParam, FilterParams, RenderSetup,
    SmoothedParam, lowpass_coefficients,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_channel_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("ChannelState");
    let coeffs = lowpass_coefficients(1000.0, 0.707, SAMPLE_RATE);

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);
        group.bench_with_input(
            BenchmarkId::new("process", block_size),
            &block_size,
            |b, _| {
                let mut state = ChannelState::new();
                b.iter(|| {
                    for &sample in &input {
                        black_box(state.process(&coeffs, black_box(sample)));
                    }
                });
            },
        );
    }

    // Coefficient calculation cost
    group.bench_function("coefficient_calc", |b| {
        b.iter(|| {
            black_box(lowpass_coefficients(
                black_box(1000.0),
                black_box(0.707),
                black_box(SAMPLE_RATE),
            ))
        });
    });

    group.finish();
}

fn bench_kernel(c: &mut Criterion) {
    let mut group = c.benchmark_group("FilterKernel");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        // Settled controls: coefficients are reused every frame.
        group.bench_with_input(
            BenchmarkId::new("stereo_static", block_size),
            &block_size,
            |b, &frames| {
                let params = Arc::new(FilterParams::new());
                let mut kernel = FilterKernel::new(params);
                kernel
                    .allocate_render_resources(RenderSetup::symmetric(2, frames, SAMPLE_RATE))
                    .unwrap();
                let mut buffers = vec![input.clone(), input.clone()];
                b.iter(|| {
                    kernel.render_in_place(&mut buffers, frames).unwrap();
                    black_box(&buffers);
                });
            },
        );

        // Cutoff sweeping every block: coefficients recomputed per frame.
        group.bench_with_input(
            BenchmarkId::new("stereo_sweep", block_size),
            &block_size,
            |b, &frames| {
                let params = Arc::new(FilterParams::new());
                let mut kernel = FilterKernel::new(Arc::clone(&params));
                kernel
                    .allocate_render_resources(RenderSetup::symmetric(2, frames, SAMPLE_RATE))
                    .unwrap();
                let mut buffers = vec![input.clone(), input.clone()];
                let mut high = false;
                b.iter(|| {
                    high = !high;
                    params.set(FilterParam::Cutoff, if high { 8000.0 } else { 200.0 });
                    kernel.render_in_place(&mut buffers, frames).unwrap();
                    black_box(&buffers);
                });
            },
        );
    }

    group.finish();
}

fn bench_smoothed_param(c: &mut Criterion) {
    let mut group = c.benchmark_group("SmoothedParam");

    group.bench_function("advance_1024", |b| {
        let target = Arc::new(AtomicParam::new(0.0, 0.0, 1.0));
        let mut param = SmoothedParam::with_config(Arc::clone(&target), SAMPLE_RATE, 20.0);
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            target.set_target(if flip { 1.0 } else { 0.0 });
            param.latch_target();
            for _ in 0..1024 {
                black_box(param.advance());
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_channel_state, bench_kernel, bench_smoothed_param);
criterion_main!(benches);
