//! Null test command implementation
//!
//! Renders two patches (each optionally stereo) and reports how far their
//! normalized, requantized outputs are from cancelling.

use anyhow::{Context, Result};
use colored::Colorize;
use overtone_engine::{Engine, NullTestOptions, NullTestSide, RenderRequest, RenderResult};
use overtone_patch::Patch;
use std::process::ExitCode;

use crate::input::{load_optional_patch, load_patch};
use crate::output::{print_json, NullTestSummary};

/// Null test command arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct NullTestArgs {
    /// Patch of side A
    pub a: String,
    /// Second-channel patch of side A
    pub a_right: Option<String>,
    /// Patch of side B
    pub b: String,
    /// Second-channel patch of side B
    pub b_right: Option<String>,
    /// Output sample rate in Hz
    pub sample_rate: f64,
    /// Scale A and B to their own peaks
    pub independent: bool,
    /// Print JSON instead of a colored summary
    pub json: bool,
}

struct LoadedSide {
    patch: Patch,
    right: Option<Patch>,
    render: RenderResult,
}

fn render_side(
    engine: &Engine,
    path: &str,
    right: Option<&str>,
    sample_rate: f64,
) -> Result<LoadedSide> {
    let patch = load_patch(path)?;
    let right = load_optional_patch(right)?;
    let request = RenderRequest {
        sample_rate,
        patch: patch.clone(),
        patch_right: right.clone(),
        max_pre_delay_samples: 0,
    };
    let render = engine
        .render(&request)
        .with_context(|| format!("Failed to render {}", path))?;
    Ok(LoadedSide {
        patch,
        right,
        render,
    })
}

/// Run the null test command
///
/// # Returns
/// Exit code: 0 when the sides null, 1 otherwise
pub fn run(args: &NullTestArgs) -> Result<ExitCode> {
    let engine = Engine::new();
    let a = render_side(&engine, &args.a, args.a_right.as_deref(), args.sample_rate)?;
    let b = render_side(&engine, &args.b, args.b_right.as_deref(), args.sample_rate)?;

    let result = engine
        .null_test(
            &NullTestSide::new(&a.render, &a.patch, a.right.as_ref()),
            &NullTestSide::new(&b.render, &b.patch, b.right.as_ref()),
            NullTestOptions {
                normalize_independently: args.independent,
            },
        )
        .context("Null test failed")?;
    let summary = NullTestSummary::from(&result);

    if args.json {
        print_json(&summary)?;
    } else {
        print_human(args, &summary);
    }

    Ok(if summary.null {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn print_human(args: &NullTestArgs, summary: &NullTestSummary) {
    println!("{}", "Null test:".cyan().bold());
    println!("  {} {}", "A:".dimmed(), args.a);
    println!("  {} {}", "B:".dimmed(), args.b);
    println!(
        "  {} {} channel(s), {} samples",
        "Compared:".dimmed(),
        summary.channels,
        summary.samples
    );
    println!(
        "  {} A {:.2} dBFS, B {:.2} dBFS",
        "Peaks:".dimmed(),
        summary.a_peak_db,
        summary.b_peak_db
    );
    println!();
    if summary.null {
        println!("{}", "NULL - outputs cancel".green().bold());
    } else {
        println!(
            "{} difference peaks at {:.2} dBFS",
            "NO NULL -".red().bold(),
            summary.difference_peak_db
        );
    }
}
