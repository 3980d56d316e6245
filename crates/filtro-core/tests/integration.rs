//! Integration tests for filtro-core.
//!
//! Exercises the kernel end to end with signal-level measurements: sine
//! wave analysis for the frequency response, click detection across a
//! parameter step, lifecycle failures and block-size independence.

use std::sync::Arc;

use filtro_core::{
    ConfigurationError, FilterKernel, FilterParam, FilterParams, KernelState, RenderError,
    RenderSetup, Smoothing, lowpass_coefficients,
};

const TAU: f32 = core::f32::consts::TAU;

/// Generate a sine wave buffer at the given frequency and sample rate.
fn generate_sine(freq_hz: f32, amplitude: f32, sample_rate: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|n| amplitude * libm::sinf(TAU * freq_hz * n as f32 / sample_rate))
        .collect()
}

/// Measure RMS amplitude of a signal buffer.
fn rms(signal: &[f32]) -> f32 {
    let sum_sq: f32 = signal.iter().map(|&s| s * s).sum();
    libm::sqrtf(sum_sq / signal.len() as f32)
}

fn kernel_with(
    cutoff: f32,
    resonance: f32,
    channels: usize,
    max_frames: usize,
    sample_rate: f32,
) -> (FilterKernel, Arc<FilterParams>) {
    let params = Arc::new(FilterParams::new());
    params.set(FilterParam::Cutoff, cutoff);
    params.set(FilterParam::Resonance, resonance);
    let mut kernel = FilterKernel::new(Arc::clone(&params));
    kernel
        .allocate_render_resources(RenderSetup::symmetric(channels, max_frames, sample_rate))
        .unwrap();
    (kernel, params)
}

/// Render `signal` through `kernel` in blocks of `block` frames.
fn render_mono(kernel: &mut FilterKernel, signal: &[f32], block: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(signal.len());
    for chunk in signal.chunks(block) {
        let mut buffers = vec![chunk.to_vec()];
        kernel.render_in_place(&mut buffers, chunk.len()).unwrap();
        out.extend_from_slice(&buffers[0]);
    }
    out
}

// ============================================================================
// Frequency response
// ============================================================================

#[test]
fn measured_gain_matches_design() {
    let sr = 48000.0;
    let (mut kernel, _) = kernel_with(1000.0, 0.707, 1, 4800, sr);
    let reference = lowpass_coefficients(1000.0, 0.707, sr);

    for &freq in &[100.0, 1000.0, 4000.0] {
        kernel.reset();
        let input = generate_sine(freq, 0.5, sr, 9600);
        let output = render_mono(&mut kernel, &input, 4800);
        let measured = rms(&output[4800..]) / rms(&input[4800..]);
        let expected = reference.magnitude_at(freq, sr);
        assert!(
            (measured - expected).abs() < 0.02,
            "{freq} Hz: measured {measured}, expected {expected}"
        );
    }
}

#[test]
fn wide_open_filter_is_near_transparent() {
    let sr = 32000.0;
    // 20 kHz is above Nyquist here, so the design clamps to the maximum
    // cutoff; minimum Q flattens the peak.
    let (mut kernel, _) = kernel_with(20000.0, 0.1, 1, 8192, sr);
    for &freq in &[50.0, 440.0, 2000.0, 8000.0] {
        kernel.reset();
        let input = generate_sine(freq, 0.5, sr, 8192);
        let output = render_mono(&mut kernel, &input, 8192);
        let gain = rms(&output[4096..]) / rms(&input[4096..]);
        assert!((gain - 1.0).abs() < 0.03, "{freq} Hz gain {gain}");
    }
}

#[test]
fn resonance_boosts_cutoff_region() {
    let sr = 48000.0;
    let (mut flat, _) = kernel_with(1000.0, 0.707, 1, 9600, sr);
    let (mut peaky, _) = kernel_with(1000.0, 8.0, 1, 9600, sr);
    let input = generate_sine(1000.0, 0.1, sr, 9600);
    let flat_rms = rms(&render_mono(&mut flat, &input, 9600)[4800..]);
    let peak_rms = rms(&render_mono(&mut peaky, &input, 9600)[4800..]);
    assert!(peak_rms > 5.0 * flat_rms, "flat {flat_rms}, resonant {peak_rms}");
}

// ============================================================================
// Silence and transparency
// ============================================================================

#[test]
fn silence_in_silence_out() {
    let (mut kernel, params) = kernel_with(1000.0, 20.0, 2, 512, 48000.0);
    params.set(FilterParam::Cutoff, 50.0);
    for _ in 0..20 {
        let mut buffers = vec![vec![0.0f32; 512]; 2];
        kernel.render_in_place(&mut buffers, 512).unwrap();
        assert!(buffers.iter().flatten().all(|&s| s == 0.0));
    }
}

#[test]
fn bypass_is_bit_transparent() {
    let (mut kernel, params) = kernel_with(200.0, 10.0, 2, 256, 48000.0);
    params.set_bypassed(true);
    let input = vec![generate_sine(3000.0, 0.8, 48000.0, 256); 2];
    let mut output = vec![vec![0.0f32; 256]; 2];
    kernel.render(&input, &mut output, 256).unwrap();
    assert_eq!(input, output);
}

// ============================================================================
// Parameter smoothing
// ============================================================================

/// Largest absolute difference between adjacent samples.
fn max_first_difference(signal: &[f32]) -> f32 {
    signal
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .fold(0.0, f32::max)
}

#[test]
fn cutoff_step_does_not_click() {
    let sr = 44100.0;
    let (mut kernel, params) = kernel_with(200.0, 0.707, 1, 512, sr);
    let input = generate_sine(100.0, 0.5, sr, 44100);

    // Let the filter settle at 200 Hz, then jump the target.
    let mut output = render_mono(&mut kernel, &input[..8820], 512);
    params.set(FilterParam::Cutoff, 5000.0);
    output.extend(render_mono(&mut kernel, &input[8820..], 512));

    let step = max_first_difference(&output[8000..]);
    assert!(step < 0.05, "max first difference {step}");
    assert!(output.iter().all(|s| s.is_finite()));
}

#[test]
fn linear_smoothing_reaches_target_on_time() {
    let sr = 48000.0;
    let (kernel, params) = kernel_with(1000.0, 0.707, 1, 480, sr);
    let mut kernel = kernel.with_smoothing(Smoothing::Linear, 10.0);
    params.set(FilterParam::Cutoff, 2000.0);

    let mut buffers = vec![vec![0.0f32; 479]];
    kernel.render_in_place(&mut buffers, 479).unwrap();
    assert!(kernel.smoothed_values().0 < 2000.0);

    let mut buffers = vec![vec![0.0f32; 1]];
    kernel.render_in_place(&mut buffers, 1).unwrap();
    assert_eq!(kernel.smoothed_values().0, 2000.0);
    assert_eq!(kernel.coefficients(), lowpass_coefficients(2000.0, 0.707, sr));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn mismatched_allocation_leaves_no_state() {
    let params = Arc::new(FilterParams::new());
    let mut kernel = FilterKernel::new(params);
    let err = kernel
        .allocate_render_resources(RenderSetup {
            input_channels: 1,
            output_channels: 2,
            max_frames: 512,
            sample_rate: 44100.0,
        })
        .unwrap_err();
    assert_eq!(err, ConfigurationError::ChannelMismatch { input: 1, output: 2 });
    assert_eq!(kernel.state(), KernelState::Uninitialized);
    assert!(kernel.channel_states().is_empty());

    let mut buffers = vec![vec![0.0f32; 16]];
    assert_eq!(
        kernel.render_in_place(&mut buffers, 16),
        Err(RenderError::NotAllocated)
    );
}

#[test]
fn reset_clears_ringing() {
    let (mut kernel, _) = kernel_with(500.0, 15.0, 1, 256, 48000.0);
    let mut buffers = vec![vec![0.0f32; 256]];
    buffers[0][0] = 1.0;
    kernel.render_in_place(&mut buffers, 256).unwrap();
    assert!(!kernel.channel_states()[0].is_clear());

    kernel.reset();
    assert!(kernel.channel_states()[0].is_clear());
    let mut buffers = vec![vec![0.0f32; 256]];
    kernel.render_in_place(&mut buffers, 256).unwrap();
    assert!(buffers[0].iter().all(|&s| s == 0.0));
}

#[test]
fn channels_are_independent() {
    let (mut kernel, _) = kernel_with(1000.0, 2.0, 2, 512, 48000.0);
    let mut buffers = vec![generate_sine(440.0, 0.5, 48000.0, 512), vec![0.0f32; 512]];
    kernel.render_in_place(&mut buffers, 512).unwrap();
    assert!(buffers[1].iter().all(|&s| s == 0.0));
    assert!(rms(&buffers[0]) > 0.1);
}

#[test]
fn block_size_does_not_change_output() {
    let sr = 48000.0;
    let input = generate_sine(700.0, 0.5, sr, 4096);

    let (mut whole, params_a) = kernel_with(300.0, 3.0, 1, 4096, sr);
    params_a.set(FilterParam::Cutoff, 3000.0);
    let reference = render_mono(&mut whole, &input, 4096);

    for &block in &[1usize, 7, 64, 333, 1024] {
        let (mut chunked, params_b) = kernel_with(300.0, 3.0, 1, 4096, sr);
        params_b.set(FilterParam::Cutoff, 3000.0);
        let output = render_mono(&mut chunked, &input, block);
        for (i, (a, b)) in reference.iter().zip(&output).enumerate() {
            assert_eq!(a.to_bits(), b.to_bits(), "block {block}, sample {i}");
        }
    }
}
