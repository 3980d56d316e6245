//! Factory preset listing.

use clap::Args;
use filtro_core::{FilterParam, ParameterInfo};
use filtro_unit::{FACTORY_PRESETS, FilterUnit};
use serde::Serialize;

#[derive(Args)]
pub struct PresetsArgs {
    /// Print the list as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct PresetEntry<'a> {
    number: usize,
    name: &'a str,
    cutoff: f32,
    resonance: f32,
}

pub fn run(args: PresetsArgs) -> anyhow::Result<()> {
    if args.json {
        let entries: Vec<PresetEntry<'_>> = FACTORY_PRESETS
            .iter()
            .map(|p| PresetEntry {
                number: p.number,
                name: p.name,
                cutoff: p.cutoff,
                resonance: p.resonance,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    // Display strings come from the unit so they match what a host shows.
    let unit = FilterUnit::new();
    println!("Factory Presets:\n");
    for preset in unit.factory_presets() {
        unit.set_current_preset(preset.number);
        println!(
            "  {:>2}  {:<12} cutoff {:>9}  resonance {}",
            preset.number,
            preset.name,
            unit.parameter_display_string(FilterParam::Cutoff),
            unit.parameter_display_string(FilterParam::Resonance),
        );
    }

    println!("\nParameters:\n");
    for index in 0..unit.param_count() {
        if let Some(desc) = unit.param_info(index) {
            println!(
                "  {:<10} {} .. {} (default {})",
                desc.name,
                desc.format_value(desc.min),
                desc.format_value(desc.max),
                desc.format_value(desc.default),
            );
        }
    }

    Ok(())
}
