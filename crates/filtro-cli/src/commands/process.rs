//! File-based filter processing command.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use filtro_core::FilterParam;
use filtro_unit::{AudioFormat, FilterUnit, HostBufferList};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::FilterArgs;
use crate::wav::{WavSpec, read_wav, write_wav};

#[derive(Args)]
pub struct ProcessArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    #[command(flatten)]
    filter: FilterArgs,

    /// Output bit depth (16, 24, or 32); defaults to the input's
    #[arg(long)]
    bit_depth: Option<u16>,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

pub fn run(args: ProcessArgs) -> anyhow::Result<()> {
    let settings = args.filter.resolve()?;

    println!("Reading {}...", args.input.display());
    let (mut channels, spec) =
        read_wav(&args.input).with_context(|| format!("cannot read '{}'", args.input.display()))?;
    let bit_depth = args.bit_depth.unwrap_or(spec.bits_per_sample);
    if !matches!(bit_depth, 16 | 24 | 32) {
        anyhow::bail!("unsupported bit depth {bit_depth} (expected 16, 24 or 32)");
    }

    let frames = channels.first().map_or(0, Vec::len);
    let sample_rate = spec.sample_rate as f32;
    println!(
        "  {} frames, {} channel(s), {} Hz, {:.2}s",
        frames,
        channels.len(),
        spec.sample_rate,
        frames as f32 / sample_rate
    );

    let mut unit = FilterUnit::with_format(AudioFormat::planar(sample_rate, channels.len()));
    settings.configure(&mut unit)?;
    unit.allocate_render_resources()?;

    if unit.bypass() {
        println!("Bypassed");
    } else {
        println!(
            "Filtering at {}, Q {}{}",
            unit.parameter_display_string(FilterParam::Cutoff),
            unit.parameter_display_string(FilterParam::Resonance),
            unit.current_preset()
                .map(|p| format!(" (preset {})", p.name()))
                .unwrap_or_default()
        );
    }

    let input_stats = Stats::measure(&channels);

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(frames as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let block_size = unit.maximum_frames_to_render();
    let mut start = 0;
    while start < frames {
        let len = block_size.min(frames - start);
        let mut block: Vec<&mut [f32]> = channels
            .iter_mut()
            .map(|channel| &mut channel[start..start + len])
            .collect();
        unit.render(
            &mut HostBufferList::Planar(&mut block),
            &mut HostBufferList::Empty,
            len,
        )?;
        start += len;
        pb.set_position(start as u64);
    }
    pb.finish_with_message("done");
    unit.deallocate_render_resources();

    let output_stats = Stats::measure(&channels);
    println!("\nStats:");
    println!(
        "  Input:  RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(input_stats.rms),
        linear_to_db(input_stats.peak)
    );
    println!(
        "  Output: RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(output_stats.rms),
        linear_to_db(output_stats.peak)
    );

    let out_spec = WavSpec {
        bits_per_sample: bit_depth,
        ..spec
    };
    println!("\nWriting {}...", args.output.display());
    write_wav(&args.output, &channels, out_spec)
        .with_context(|| format!("cannot write '{}'", args.output.display()))?;
    println!("Done!");

    Ok(())
}

struct Stats {
    rms: f32,
    peak: f32,
}

impl Stats {
    fn measure(channels: &[Vec<f32>]) -> Self {
        let count: usize = channels.iter().map(Vec::len).sum();
        if count == 0 {
            return Self { rms: 0.0, peak: 0.0 };
        }
        let samples = channels.iter().flatten();
        let sum: f64 = samples.clone().map(|&s| f64::from(s) * f64::from(s)).sum();
        let peak = samples.map(|s| s.abs()).fold(0.0, f32::max);
        Self {
            rms: (sum / count as f64).sqrt() as f32,
            peak,
        }
    }
}

fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        -120.0
    } else {
        20.0 * linear.log10()
    }
}
