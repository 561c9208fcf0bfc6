//! JSON output types for machine-readable CLI output.
//!
//! Each `--json` command prints exactly one of these documents to stdout.
//! They are plain summaries of engine results; raw sample buffers are never
//! emitted.

use anyhow::{Context, Result};
use overtone_engine::level::{gain_to_db, peak, ZERO_LEVEL};
use overtone_engine::render::{DetailedPreview, DigitalPreview, ProbeCurve, ThdGraph};
use overtone_engine::{NullTestResult, Preview, RenderResult};
use serde::{Deserialize, Serialize};

/// Prints a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize JSON output")?;
    println!("{}", json);
    Ok(())
}

/// Statistics of a finished render.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderSummary {
    pub sample_rate: f64,
    pub channels: usize,
    pub samples: usize,
    pub duration_seconds: f64,
    pub pre_delay_samples: usize,
    pub peak: f64,
    pub peak_db: f64,
    /// One line per oversampled channel.
    pub oversampling: Vec<String>,
}

impl From<&RenderResult> for RenderSummary {
    fn from(result: &RenderResult) -> Self {
        let buffer = &result.buffer;
        Self {
            sample_rate: buffer.sample_rate,
            channels: buffer.channel_count(),
            samples: buffer.len(),
            duration_seconds: buffer.len() as f64 / buffer.sample_rate,
            pre_delay_samples: result.pre_delay,
            peak: result.peak,
            peak_db: gain_to_db(result.peak),
            oversampling: result
                .oversampling_summary()
                .lines()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Outcome of a null test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NullTestSummary {
    pub channels: usize,
    pub samples: usize,
    pub a_peak_db: f64,
    pub b_peak_db: f64,
    /// Peak of the raw difference.
    pub difference_peak_db: f64,
    pub display_gain_db: f64,
    pub null: bool,
}

impl From<&NullTestResult> for NullTestSummary {
    fn from(result: &NullTestResult) -> Self {
        Self {
            channels: result.difference.channel_count(),
            samples: result.difference.len(),
            a_peak_db: gain_to_db(result.a.peak()),
            b_peak_db: gain_to_db(result.b.peak()),
            difference_peak_db: result.peak_db,
            display_gain_db: gain_to_db(result.display_gain),
            null: result.is_null(),
        }
    }
}

/// Single THD figure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThdSummary {
    pub fundamental_hz: f64,
    pub thd_percent: f64,
}

/// One point of a frequency curve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CurvePoint {
    pub frequency_hz: f64,
    pub value: f64,
}

fn curve(frequencies: &[f64], values: &[f64]) -> Vec<CurvePoint> {
    frequencies
        .iter()
        .zip(values)
        .map(|(&frequency_hz, &value)| CurvePoint {
            frequency_hz,
            value,
        })
        .collect()
}

/// THD in percent across the audio band.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThdGraphSummary {
    pub points: Vec<CurvePoint>,
}

impl From<&ThdGraph> for ThdGraphSummary {
    fn from(graph: &ThdGraph) -> Self {
        Self {
            points: curve(&graph.frequencies, &graph.thd),
        }
    }
}

/// Input/output pair of the dither linearity sweep, in LSB.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LinearityPoint {
    pub input_lsb: f64,
    pub output_lsb: f64,
}

/// Dither linearity, dynamic range and jitter curves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DigitalSummary {
    pub linearity: Vec<LinearityPoint>,
    /// Residue level in dB per probe tone.
    pub dynamic_range: Vec<CurvePoint>,
    /// Jitter error level in dB per probe tone.
    pub jitter: Vec<CurvePoint>,
}

fn probe_points(probe: &ProbeCurve) -> Vec<CurvePoint> {
    curve(&probe.frequencies, &probe.level_db)
}

impl From<&DigitalPreview> for DigitalSummary {
    fn from(preview: &DigitalPreview) -> Self {
        Self {
            linearity: preview
                .linearity_inputs
                .iter()
                .zip(&preview.dither_linear)
                .map(|(&input_lsb, &output_lsb)| LinearityPoint {
                    input_lsb,
                    output_lsb,
                })
                .collect(),
            dynamic_range: probe_points(&preview.dither_dynamic_range),
            jitter: probe_points(&preview.jitter_curve),
        }
    }
}

/// One harmonic of a preview spectrum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HarmonicLine {
    pub harmonic: usize,
    pub level_db: f64,
    pub phase_degrees: f64,
}

/// Steady-state spectrum of a preview.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreviewSummary {
    pub sample_rate: f64,
    /// Cycles of the fundamental in the analysed window.
    pub cycles: usize,
    pub peak: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_cutoff_hz: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oversampling: Option<String>,
    /// Audible harmonics, in order.
    pub harmonics: Vec<HarmonicLine>,
}

/// Harmonic lines of an amplitude spectrum whose fundamental sits in bin
/// `cycles`. Bins below the zero floor are skipped.
fn harmonic_lines(
    magnitude: &[f64],
    phase: &[f64],
    cycles: usize,
    count: usize,
) -> Vec<HarmonicLine> {
    (1..=count)
        .map(|n| (n, n * cycles))
        .take_while(|&(_, bin)| bin < magnitude.len())
        .filter(|&(_, bin)| magnitude[bin] > ZERO_LEVEL)
        .map(|(harmonic, bin)| HarmonicLine {
            harmonic,
            level_db: gain_to_db(magnitude[bin]),
            phase_degrees: phase[bin].to_degrees(),
        })
        .collect()
}

impl PreviewSummary {
    /// Summary of a single-cycle preview.
    pub fn from_preview(preview: &Preview, count: usize) -> Self {
        Self {
            sample_rate: preview.sample_rate,
            cycles: 1,
            peak: peak(&preview.distorted_samples),
            filter_cutoff_hz: preview.filter.as_ref().map(|f| f.cutoff_hz),
            oversampling: preview.oversampling.map(|r| r.to_string()),
            harmonics: harmonic_lines(&preview.fft.magnitude, &preview.fft.phase, 1, count),
        }
    }

    /// Summary of a long cycle-aligned preview.
    pub fn from_detailed(preview: &DetailedPreview, count: usize) -> Self {
        Self {
            sample_rate: preview.sample_rate,
            cycles: preview.cycles,
            peak: peak(&preview.samples),
            filter_cutoff_hz: None,
            oversampling: None,
            harmonics: harmonic_lines(
                &preview.fft.magnitude,
                &preview.fft.phase,
                preview.cycles,
                count,
            ),
        }
    }
}
