//! Frequency-response measurement.
//!
//! Renders a unit impulse through the filter, takes its spectrum and compares
//! the measured magnitude with the response of the designed coefficients.

use clap::Args;
use filtro_core::{Coefficients, FilterParam};
use filtro_unit::{AudioFormat, FilterUnit, HostBufferList};
use rustfft::{FftPlanner, num_complex::Complex};
use serde::Serialize;

use crate::config::FilterArgs;

#[derive(Args)]
pub struct ResponseArgs {
    #[command(flatten)]
    filter: FilterArgs,

    /// Sample rate in Hz
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Impulse length and FFT size
    #[arg(long, default_value = "16384")]
    fft_size: usize,

    /// Number of log-spaced measurement points
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u16).range(2..=1024))]
    points: u16,

    /// Explicit measurement frequencies in Hz (comma-separated)
    #[arg(long = "freq", value_delimiter = ',')]
    frequencies: Vec<f32>,

    /// Fail if any point deviates from the design by more than this many dB
    #[arg(long)]
    tolerance: Option<f32>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

/// One measured frequency.
#[derive(Debug, Serialize)]
struct ResponsePoint {
    frequency_hz: f32,
    measured_db: f32,
    expected_db: f32,
    deviation_db: f32,
}

/// Full measurement.
#[derive(Debug, Serialize)]
struct ResponseReport {
    sample_rate: u32,
    fft_size: usize,
    cutoff_hz: f32,
    resonance: f32,
    bypassed: bool,
    max_deviation_db: f32,
    points: Vec<ResponsePoint>,
}

pub fn run(args: ResponseArgs) -> anyhow::Result<()> {
    if args.fft_size < 64 {
        anyhow::bail!("FFT size must be at least 64 (got {})", args.fft_size);
    }
    if args.sample_rate == 0 {
        anyhow::bail!("sample rate must be positive");
    }

    let settings = args.filter.resolve()?;
    let sample_rate = args.sample_rate as f32;

    let mut unit = FilterUnit::with_format(AudioFormat::planar(sample_rate, 1));
    settings.configure(&mut unit)?;
    unit.allocate_render_resources()?;

    let impulse = render_impulse(&mut unit, args.fft_size)?;
    let spectrum = magnitude_spectrum(&impulse);
    let design = unit.kernel().coefficients();
    let bypassed = unit.bypass();

    let frequencies = if args.frequencies.is_empty() {
        log_spaced(usize::from(args.points), 20.0, sample_rate * 0.45)
    } else {
        args.frequencies.clone()
    };

    let points: Vec<ResponsePoint> = frequencies
        .iter()
        .map(|&f| measure_point(&spectrum, &design, f, sample_rate, args.fft_size, bypassed))
        .collect();
    let max_deviation_db = points
        .iter()
        .map(|p| p.deviation_db.abs())
        .fold(0.0, f32::max);

    let (cutoff_hz, resonance) = unit.kernel().smoothed_values();
    let report = ResponseReport {
        sample_rate: args.sample_rate,
        fft_size: args.fft_size,
        cutoff_hz,
        resonance,
        bypassed,
        max_deviation_db,
        points,
    };
    tracing::debug!(max_deviation_db, "response measured");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&unit, &report);
    }

    if let Some(tolerance) = args.tolerance {
        if report.max_deviation_db > tolerance {
            anyhow::bail!(
                "response deviates from the design by {:.4} dB (tolerance {tolerance} dB)",
                report.max_deviation_db
            );
        }
    }
    Ok(())
}

/// Render a unit impulse of `len` frames in blocks of the unit's maximum size.
fn render_impulse(unit: &mut FilterUnit, len: usize) -> anyhow::Result<Vec<f32>> {
    let mut samples = vec![0.0f32; len];
    samples[0] = 1.0;

    let block_size = unit.maximum_frames_to_render();
    for chunk in samples.chunks_mut(block_size) {
        let frames = chunk.len();
        let mut channels: [&mut [f32]; 1] = [chunk];
        unit.render(
            &mut HostBufferList::Planar(&mut channels),
            &mut HostBufferList::Empty,
            frames,
        )?;
    }
    Ok(samples)
}

/// Magnitudes of the first `len / 2 + 1` bins.
fn magnitude_spectrum(samples: &[f32]) -> Vec<f32> {
    let mut buffer: Vec<Complex<f32>> = samples.iter().map(|&s| Complex::new(s, 0.0)).collect();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(buffer.len());
    fft.process(&mut buffer);
    buffer[..=samples.len() / 2].iter().map(|c| c.norm()).collect()
}

fn measure_point(
    spectrum: &[f32],
    design: &Coefficients,
    frequency: f32,
    sample_rate: f32,
    fft_size: usize,
    bypassed: bool,
) -> ResponsePoint {
    let bin_width = sample_rate / fft_size as f32;
    let bin = ((frequency / bin_width).round() as usize).clamp(1, spectrum.len() - 1);
    let bin_frequency = bin as f32 * bin_width;

    let measured = spectrum[bin];
    let expected = if bypassed {
        1.0
    } else {
        design.magnitude_at(bin_frequency, sample_rate)
    };
    let measured_db = linear_to_db(measured);
    let expected_db = linear_to_db(expected);
    ResponsePoint {
        frequency_hz: bin_frequency,
        measured_db,
        expected_db,
        deviation_db: measured_db - expected_db,
    }
}

fn log_spaced(count: usize, low: f32, high: f32) -> Vec<f32> {
    let ratio = high / low;
    (0..count)
        .map(|i| low * ratio.powf(i as f32 / (count - 1) as f32))
        .collect()
}

fn linear_to_db(linear: f32) -> f32 {
    if linear <= 1e-9 {
        -180.0
    } else {
        20.0 * linear.log10()
    }
}

fn print_report(unit: &FilterUnit, report: &ResponseReport) {
    println!(
        "Response at {}, Q {} ({} Hz, {}-point FFT){}",
        unit.parameter_display_string(FilterParam::Cutoff),
        unit.parameter_display_string(FilterParam::Resonance),
        report.sample_rate,
        report.fft_size,
        if report.bypassed { ", bypassed" } else { "" }
    );
    println!();
    println!("{:>10}  {:>10}  {:>10}  {:>10}", "Freq (Hz)", "Measured", "Design", "Delta");
    println!("{}", "-".repeat(46));
    for point in &report.points {
        println!(
            "{:>10.1}  {:>8.2} dB  {:>8.2} dB  {:>8.4}",
            point.frequency_hz, point.measured_db, point.expected_db, point.deviation_db
        );
    }
    println!();
    println!("Max deviation: {:.4} dB", report.max_deviation_db);
}
