//! THD command implementations
//!
//! `thd` reports the distortion of a full-scale sine at the patch frequency;
//! `thd-graph` sweeps the same measurement across the audio band.

use anyhow::{Context, Result};
use colored::Colorize;
use overtone_engine::Engine;
use std::process::ExitCode;

use crate::input::load_patch;
use crate::output::{print_json, ThdGraphSummary, ThdSummary};

/// Width of the bar drawn for 100 % THD on a log scale.
const BAR_WIDTH: usize = 40;

/// Run the thd command
///
/// # Arguments
/// * `patch_path` - Patch file, or `-` for stdin
/// * `json_output` - Whether to output JSON
pub fn run(patch_path: &str, json_output: bool) -> Result<ExitCode> {
    let patch = load_patch(patch_path)?;
    let thd_percent = Engine::new()
        .thd_percent(&patch)
        .with_context(|| format!("Failed to measure THD of {}", patch_path))?;
    let summary = ThdSummary {
        fundamental_hz: patch.frequency,
        thd_percent,
    };

    if json_output {
        print_json(&summary)?;
    } else {
        println!("{} {}", "THD:".cyan().bold(), patch_path);
        println!(
            "  {:.1} Hz: {}",
            summary.fundamental_hz,
            format_percent(summary.thd_percent)
        );
    }
    Ok(ExitCode::SUCCESS)
}

/// Run the thd-graph command
pub fn run_graph(patch_path: &str, json_output: bool) -> Result<ExitCode> {
    let patch = load_patch(patch_path)?;
    let graph = Engine::new()
        .thd_graph(&patch)
        .with_context(|| format!("Failed to sweep THD of {}", patch_path))?;
    let summary = ThdGraphSummary::from(&graph);

    if json_output {
        print_json(&summary)?;
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} {}", "THD graph:".cyan().bold(), patch_path);
    for point in &summary.points {
        println!(
            "  {:>8.1} Hz {:>10} {}",
            point.frequency_hz,
            format_percent(point.value),
            bar(point.value)
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn format_percent(thd: f64) -> String {
    if thd == 0.0 {
        "0 %".to_string()
    } else if thd < 0.01 {
        format!("{:.2e} %", thd)
    } else {
        format!("{:.3} %", thd)
    }
}

/// Log-scaled bar spanning 0.001 % to 100 %.
fn bar(thd: f64) -> String {
    if thd <= 0.0 {
        return String::new();
    }
    let position = ((thd.log10() + 3.0) / 5.0).clamp(0.0, 1.0);
    "#".repeat((position * BAR_WIDTH as f64).round() as usize)
}
