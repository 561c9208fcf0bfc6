//! Digital preview command implementation
//!
//! Runs the dither linearity sweep and the probe-tone sweeps for dynamic
//! range and clock jitter.

use anyhow::{Context, Result};
use colored::Colorize;
use overtone_engine::Engine;
use std::process::ExitCode;

use crate::input::load_patch;
use crate::output::{print_json, CurvePoint, DigitalSummary};

/// Run the digital command
///
/// # Arguments
/// * `patch_path` - Patch file, or `-` for stdin
/// * `sample_rate` - Rate of the probe tones
/// * `json_output` - Whether to output JSON
pub fn run(patch_path: &str, sample_rate: f64, json_output: bool) -> Result<ExitCode> {
    let patch = load_patch(patch_path)?;
    let preview = Engine::new()
        .digital_preview(&patch, sample_rate)
        .with_context(|| format!("Failed to analyse {}", patch_path))?;
    let summary = DigitalSummary::from(&preview);

    if json_output {
        print_json(&summary)?;
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} {}", "Digital preview:".cyan().bold(), patch_path);
    if patch.quantization_enabled() {
        println!(
            "  {} {} bit, {:?} dither",
            "Quantizer:".dimmed(),
            patch.digital_bit_depth,
            patch.digital_dither_type
        );
    } else {
        println!("  {} off", "Quantizer:".dimmed());
    }

    println!();
    println!("{}", "Dither linearity (LSB in -> out):".bold());
    for point in summary.linearity.iter().step_by(4) {
        println!("  {:>6.3} -> {:>8.4}", point.input_lsb, point.output_lsb);
    }

    print_curve("Residue level (dB):", &summary.dynamic_range);
    print_curve("Jitter error (dB):", &summary.jitter);
    Ok(ExitCode::SUCCESS)
}

fn print_curve(title: &str, points: &[CurvePoint]) {
    println!();
    println!("{}", title.bold());
    for point in points {
        println!("  {:>8.1} Hz {:>8.1}", point.frequency_hz, point.value);
    }
}
