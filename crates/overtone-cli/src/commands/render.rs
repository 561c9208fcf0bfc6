//! Render command implementation
//!
//! Renders a mono or stereo patch and reports the buffer statistics.

use anyhow::{Context, Result};
use colored::Colorize;
use overtone_engine::{Engine, RenderRequest};
use std::process::ExitCode;

use crate::input::{load_optional_patch, load_patch};
use crate::output::{print_json, RenderSummary};

/// Render command arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderArgs {
    /// Patch of the first channel
    pub patch: String,
    /// Optional patch of a second channel
    pub right: Option<String>,
    /// Output sample rate in Hz
    pub sample_rate: f64,
    /// Minimum lead-in in samples
    pub pre_delay: usize,
    /// Print JSON instead of a colored summary
    pub json: bool,
}

/// Run the render command
///
/// # Arguments
/// * `args` - Patch paths and render settings
///
/// # Returns
/// Exit code: 0 on success
pub fn run(args: &RenderArgs) -> Result<ExitCode> {
    let patch = load_patch(&args.patch)?;
    let right = load_optional_patch(args.right.as_deref())?;

    let request = RenderRequest {
        sample_rate: args.sample_rate,
        patch,
        patch_right: right,
        max_pre_delay_samples: args.pre_delay,
    };
    let result = Engine::new()
        .render(&request)
        .with_context(|| format!("Failed to render {}", args.patch))?;
    let summary = RenderSummary::from(&result);

    if args.json {
        print_json(&summary)?;
    } else {
        print_human(&args.patch, &summary);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_human(path: &str, summary: &RenderSummary) {
    println!("{} {}", "Rendered:".cyan().bold(), path);
    println!(
        "  {} {} Hz, {} channel(s)",
        "Format:".dimmed(),
        summary.sample_rate,
        summary.channels
    );
    println!(
        "  {} {} samples ({:.3} s)",
        "Length:".dimmed(),
        summary.samples,
        summary.duration_seconds
    );
    if summary.pre_delay_samples > 0 {
        println!(
            "  {} {} samples",
            "Pre-delay:".dimmed(),
            summary.pre_delay_samples
        );
    }
    println!(
        "  {} {:.4} ({:.2} dBFS)",
        "Peak:".dimmed(),
        summary.peak,
        summary.peak_db
    );
    for line in &summary.oversampling {
        println!("  {} {}", "Oversampling:".dimmed(), line);
    }
}
