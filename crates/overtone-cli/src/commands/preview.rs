//! Preview command implementation
//!
//! Prints the steady-state spectrum of one cycle, or of a long
//! cycle-aligned window with `--detailed`.

use anyhow::{Context, Result};
use colored::Colorize;
use overtone_engine::{Engine, FilterSubject};
use std::process::ExitCode;

use crate::input::load_patch;
use crate::output::{print_json, PreviewSummary};

/// Preview command arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewArgs {
    /// Patch file, or `-` for stdin
    pub patch: String,
    /// Sample rate the harmonic count is limited by, in Hz
    pub sample_rate: f64,
    /// Cutoff point the filter is frozen at
    pub filter: FilterSubject,
    /// Analyse the long window including inharmonic partials
    pub detailed: bool,
    /// Number of harmonics to report
    pub harmonics: usize,
    /// Print JSON instead of a colored summary
    pub json: bool,
}

/// Run the preview command
///
/// # Returns
/// Exit code: 0 on success
pub fn run(args: &PreviewArgs) -> Result<ExitCode> {
    let patch = load_patch(&args.patch)?;
    let engine = Engine::new();

    let summary = if args.detailed {
        let preview = engine
            .detailed_preview(&patch, args.filter, args.sample_rate)
            .with_context(|| format!("Failed to preview {}", args.patch))?;
        PreviewSummary::from_detailed(&preview, args.harmonics)
    } else {
        let preview = engine
            .preview(&patch, args.filter, args.sample_rate)
            .with_context(|| format!("Failed to preview {}", args.patch))?;
        PreviewSummary::from_preview(&preview, args.harmonics)
    };

    if args.json {
        print_json(&summary)?;
    } else {
        print_human(&args.patch, &summary);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_human(path: &str, summary: &PreviewSummary) {
    println!("{} {}", "Preview:".cyan().bold(), path);
    println!(
        "  {} {:.1} Hz, {} cycle(s), peak {:.4}",
        "Window:".dimmed(),
        summary.sample_rate,
        summary.cycles,
        summary.peak
    );
    if let Some(cutoff) = summary.filter_cutoff_hz {
        println!("  {} {:.1} Hz", "Filter cutoff:".dimmed(), cutoff);
    }
    if let Some(report) = &summary.oversampling {
        println!("  {} {}", "Oversampling:".dimmed(), report);
    }

    println!();
    if summary.harmonics.is_empty() {
        println!("{}", "No audible harmonics".yellow());
        return;
    }
    println!("  {:>4} {:>10} {:>10}", "n", "level dB", "phase deg");
    for line in &summary.harmonics {
        println!(
            "  {:>4} {:>10.2} {:>10.1}",
            line.harmonic, line.level_db, line.phase_degrees
        );
    }
}
