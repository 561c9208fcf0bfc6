//! Overtone CLI - Command-line interface for the Overtone synthesis engine
//!
//! This binary renders patches and runs the engine's analyses: null tests,
//! THD measurements, steady-state previews and digital sweeps.

use clap::{Parser, Subcommand, ValueEnum};
use overtone_engine::FilterSubject;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use overtone_cli::commands::{
    self, null_test::NullTestArgs, preview::PreviewArgs, render::RenderArgs, DEFAULT_SAMPLE_RATE,
};

/// Overtone - deterministic additive synthesis and distortion analysis
#[derive(Parser)]
#[command(name = "overtone")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Filter cutoff a preview freezes the swept filter at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FilterArg {
    Off,
    Start,
    Peak,
    End,
}

impl From<FilterArg> for FilterSubject {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Off => FilterSubject::Off,
            FilterArg::Start => FilterSubject::Start,
            FilterArg::Peak => FilterSubject::Peak,
            FilterArg::End => FilterSubject::End,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Render a patch and print buffer statistics
    Render {
        /// Patch JSON file (`-` for stdin)
        #[arg(short, long)]
        patch: String,

        /// Patch JSON file of a second channel
        #[arg(short, long)]
        right: Option<String>,

        /// Output sample rate in Hz
        #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: f64,

        /// Minimum lead-in in samples
        #[arg(long, default_value_t = 0)]
        pre_delay: usize,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Normalize two renders and check whether they cancel
    NullTest {
        /// Patch JSON file of side A
        #[arg(short, long)]
        a: String,

        /// Second-channel patch of side A
        #[arg(long)]
        a_right: Option<String>,

        /// Patch JSON file of side B
        #[arg(short, long)]
        b: String,

        /// Second-channel patch of side B
        #[arg(long)]
        b_right: Option<String>,

        /// Output sample rate in Hz
        #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: f64,

        /// Normalize each side to its own peak
        #[arg(long)]
        independent: bool,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Measure THD of a full-scale sine at the patch frequency
    Thd {
        /// Patch JSON file (`-` for stdin)
        #[arg(short, long)]
        patch: String,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Sweep THD from 20 Hz to 20 kHz
    ThdGraph {
        /// Patch JSON file (`-` for stdin)
        #[arg(short, long)]
        patch: String,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Dither linearity, dynamic range and jitter sweeps
    Digital {
        /// Patch JSON file (`-` for stdin)
        #[arg(short, long)]
        patch: String,

        /// Probe sample rate in Hz
        #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: f64,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Steady-state waveform spectrum
    Preview {
        /// Patch JSON file (`-` for stdin)
        #[arg(short, long)]
        patch: String,

        /// Sample rate the harmonic count is limited by, in Hz
        #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: f64,

        /// Freeze the filter at one of its cutoff points
        #[arg(short, long, value_enum, default_value_t = FilterArg::Off)]
        filter: FilterArg,

        /// Analyse a long cycle-aligned window including inharmonic partials
        #[arg(long)]
        detailed: bool,

        /// Number of harmonics to report
        #[arg(long, default_value_t = 16)]
        harmonics: usize,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },
}

/// Logs go to stderr so `--json` output stays parseable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Render {
            patch,
            right,
            sample_rate,
            pre_delay,
            json,
        } => commands::render::run(&RenderArgs {
            patch,
            right,
            sample_rate,
            pre_delay,
            json,
        }),
        Commands::NullTest {
            a,
            a_right,
            b,
            b_right,
            sample_rate,
            independent,
            json,
        } => commands::null_test::run(&NullTestArgs {
            a,
            a_right,
            b,
            b_right,
            sample_rate,
            independent,
            json,
        }),
        Commands::Thd { patch, json } => commands::thd::run(&patch, json),
        Commands::ThdGraph { patch, json } => commands::thd::run_graph(&patch, json),
        Commands::Digital {
            patch,
            sample_rate,
            json,
        } => commands::digital::run(&patch, sample_rate, json),
        Commands::Preview {
            patch,
            sample_rate,
            filter,
            detailed,
            harmonics,
            json,
        } => commands::preview::run(&PreviewArgs {
            patch,
            sample_rate,
            filter: filter.into(),
            detailed,
            harmonics,
            json,
        }),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_render() {
        let cli = Cli::try_parse_from(["overtone", "render", "--patch", "bass.json"]).unwrap();
        match cli.command {
            Commands::Render {
                patch,
                right,
                sample_rate,
                pre_delay,
                json,
            } => {
                assert_eq!(patch, "bass.json");
                assert!(right.is_none());
                assert_eq!(sample_rate, DEFAULT_SAMPLE_RATE);
                assert_eq!(pre_delay, 0);
                assert!(!json);
            }
            _ => panic!("expected render command"),
        }
    }

    #[test]
    fn test_cli_parses_stereo_render() {
        let cli = Cli::try_parse_from([
            "overtone",
            "render",
            "-p",
            "left.json",
            "-r",
            "right.json",
            "-s",
            "44100",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Render {
                right,
                sample_rate,
                json,
                ..
            } => {
                assert_eq!(right.as_deref(), Some("right.json"));
                assert_eq!(sample_rate, 44_100.0);
                assert!(json);
            }
            _ => panic!("expected render command"),
        }
    }

    #[test]
    fn test_cli_parses_null_test() {
        let cli = Cli::try_parse_from([
            "overtone",
            "null-test",
            "--a",
            "a.json",
            "--b",
            "b.json",
            "--b-right",
            "b_right.json",
            "--independent",
        ])
        .unwrap();
        match cli.command {
            Commands::NullTest {
                a,
                a_right,
                b,
                b_right,
                independent,
                ..
            } => {
                assert_eq!(a, "a.json");
                assert!(a_right.is_none());
                assert_eq!(b, "b.json");
                assert_eq!(b_right.as_deref(), Some("b_right.json"));
                assert!(independent);
            }
            _ => panic!("expected null-test command"),
        }
    }

    #[test]
    fn test_cli_parses_thd_commands() {
        let cli = Cli::try_parse_from(["overtone", "thd", "--patch", "-"]).unwrap();
        assert!(matches!(cli.command, Commands::Thd { ref patch, json: false } if patch == "-"));

        let cli = Cli::try_parse_from(["overtone", "thd-graph", "-p", "x.json", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::ThdGraph { json: true, .. }));
    }

    #[test]
    fn test_cli_parses_preview_filter() {
        let cli = Cli::try_parse_from([
            "overtone",
            "preview",
            "-p",
            "x.json",
            "--filter",
            "peak",
            "--detailed",
        ])
        .unwrap();
        match cli.command {
            Commands::Preview {
                filter,
                detailed,
                harmonics,
                ..
            } => {
                assert_eq!(FilterSubject::from(filter), FilterSubject::Peak);
                assert!(detailed);
                assert_eq!(harmonics, 16);
            }
            _ => panic!("expected preview command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_filter() {
        assert!(
            Cli::try_parse_from(["overtone", "preview", "-p", "x.json", "--filter", "mid"])
                .is_err()
        );
    }

    #[test]
    fn test_cli_requires_patch() {
        assert!(Cli::try_parse_from(["overtone", "digital"]).is_err());
    }
}
