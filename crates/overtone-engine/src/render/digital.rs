//! Requantization and clock-jitter sweeps.

use std::f64::consts::TAU;

use overtone_patch::Patch;
use tracing::debug;

use crate::effects::{apply_jitter, requantize, DitherParams, JitterParams};
use crate::engine::Engine;
use crate::error::{check_sample_rate, EngineResult};
use crate::level::{db_to_gain, gain_to_db};
use crate::resample::BoundaryPolicy;
use crate::rng::{dither_seed, NoiseSource};
use crate::transform::FftResult;

/// Input levels of the linearity sweep.
pub const LINEARITY_STEPS: usize = 40;

/// Probe tones of the dynamic-range and jitter sweeps.
pub const PROBE_TONES: usize = 15;

/// Samples averaged per linearity level.
const LINEARITY_SAMPLES: usize = 4096;

/// FFT length of each probe tone.
const PROBE_LEN: usize = 4096;

/// Probe tone level in dBFS.
const PROBE_LEVEL_DB: f64 = -6.0;

/// Probe tone range in Hz, clipped to the rate's Nyquist bin.
const PROBE_RANGE: (f64, f64) = (20.0, 20_000.0);

/// Residual level at each probe tone.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeCurve {
    /// Probe frequency in Hz, aligned to an FFT bin.
    pub frequencies: Vec<f64>,
    /// Residual level in dBFS.
    pub level_db: Vec<f64>,
}

/// Clock-jitter error per probe tone.
pub type JitterCurve = ProbeCurve;

/// Digital-stage analysis of one patch.
#[derive(Debug, Clone, PartialEq)]
pub struct DigitalPreview {
    /// Input level of each linearity step in LSB, `0..=1`.
    pub linearity_inputs: Vec<f64>,
    /// Mean requantized output for each input, in LSB.
    pub dither_linear: Vec<f64>,
    /// Harmonic residue left by requantization at each probe tone.
    pub dither_dynamic_range: ProbeCurve,
    /// Non-tone energy added by clock jitter at each probe tone.
    pub jitter_curve: JitterCurve,
}

/// Log-spaced FFT bins for the probe tones.
fn probe_bins(sample_rate: f64) -> Vec<usize> {
    let (lo, hi) = PROBE_RANGE;
    let steps = (PROBE_TONES - 1) as f64;
    (0..PROBE_TONES)
        .map(|i| {
            let hz = lo * (hi / lo).powf(i as f64 / steps);
            ((hz * PROBE_LEN as f64 / sample_rate).round() as usize).clamp(1, PROBE_LEN / 2 - 1)
        })
        .collect()
}

fn probe_tone(bin: usize) -> Vec<f64> {
    let amplitude = db_to_gain(PROBE_LEVEL_DB);
    (0..PROBE_LEN)
        .map(|i| amplitude * (TAU * (bin * i) as f64 / PROBE_LEN as f64).sin())
        .collect()
}

/// Root-sum-square of the bins `bin·j` for `j >= 2`.
fn harmonic_residue(spectrum: &FftResult, bin: usize) -> f64 {
    spectrum
        .magnitude
        .iter()
        .enumerate()
        .filter(|&(k, _)| k > bin && k % bin == 0)
        .map(|(_, m)| m * m)
        .sum::<f64>()
        .sqrt()
}

/// Root-sum-square of every bin except DC and the tone's own.
fn off_tone_residue(spectrum: &FftResult, bin: usize) -> f64 {
    spectrum
        .magnitude
        .iter()
        .enumerate()
        .filter(|&(k, _)| k != 0 && k != bin)
        .map(|(_, m)| m * m)
        .sum::<f64>()
        .sqrt()
}

impl Engine {
    /// Linearity, dynamic range and jitter sweeps of the patch's digital stages.
    ///
    /// Every sweep step draws from a fresh noise stream with the same seed, so
    /// the linearity curve compares levels under identical dither.
    pub fn digital_preview(
        &self,
        patch: &Patch,
        sample_rate: f64,
    ) -> EngineResult<DigitalPreview> {
        let sample_rate = check_sample_rate(sample_rate)?;
        patch.validate()?;
        let dither = DitherParams::from_patch(patch);
        let seed = dither_seed(patch.seed, 0);

        let linearity_inputs: Vec<f64> = (0..LINEARITY_STEPS)
            .map(|i| i as f64 / (LINEARITY_STEPS - 1) as f64)
            .collect();
        let dither_linear = match &dither {
            Some(params) => linearity_inputs
                .iter()
                .map(|&lsb| {
                    let input = vec![lsb / params.max_int; LINEARITY_SAMPLES];
                    let mut noise = NoiseSource::new(seed);
                    let output = requantize(params, &input, &mut noise);
                    output.iter().sum::<f64>() / LINEARITY_SAMPLES as f64 * params.max_int
                })
                .collect(),
            None => linearity_inputs.clone(),
        };

        let bins = probe_bins(sample_rate);
        let frequencies: Vec<f64> = bins
            .iter()
            .map(|&b| b as f64 * sample_rate / PROBE_LEN as f64)
            .collect();
        let jitter = JitterParams::from_patch(patch);
        let jitter_kernel = self.kernels().jitter_kernel();

        let mut dynamic_range = Vec::with_capacity(PROBE_TONES);
        let mut jitter_levels = Vec::with_capacity(PROBE_TONES);
        for &bin in &bins {
            let tone = probe_tone(bin);

            let residue = match &dither {
                Some(params) => {
                    let mut noise = NoiseSource::new(seed);
                    let quantized = requantize(params, &tone, &mut noise);
                    harmonic_residue(&self.fft().forward(&quantized)?, bin)
                }
                None => 0.0,
            };
            dynamic_range.push(gain_to_db(residue));

            let jitter_error = if jitter.is_active() {
                let jittered = apply_jitter(
                    &jitter,
                    &tone,
                    sample_rate,
                    patch.seed,
                    BoundaryPolicy::Cyclic,
                    &jitter_kernel,
                );
                off_tone_residue(&self.fft().forward(&jittered)?, bin)
            } else {
                0.0
            };
            jitter_levels.push(gain_to_db(jitter_error));
        }
        debug!(
            quantized = dither.is_some(),
            jitter = jitter.is_active(),
            "digital preview"
        );

        Ok(DigitalPreview {
            linearity_inputs,
            dither_linear,
            dither_dynamic_range: ProbeCurve {
                frequencies: frequencies.clone(),
                level_db: dynamic_range,
            },
            jitter_curve: ProbeCurve {
                frequencies,
                level_db: jitter_levels,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::ZERO_LEVEL;
    use overtone_patch::DitherType;

    const SR: f64 = 48_000.0;

    fn eight_bit() -> Patch {
        Patch {
            digital_bit_depth: 8,
            digital_dither_type: DitherType::Triangular,
            digital_dither_level: 2.0,
            ..Patch::default()
        }
    }

    #[test]
    fn test_probe_bins_span_the_band() {
        let bins = probe_bins(SR);
        assert_eq!(bins.len(), PROBE_TONES);
        assert_eq!(bins[0], 2);
        assert_eq!(bins[PROBE_TONES - 1], 1707);
        assert!(bins.windows(2).all(|w| w[1] >= w[0]));
        // low rates clip at the last bin below Nyquist
        assert!(probe_bins(8000.0).iter().all(|&b| b < PROBE_LEN / 2));
    }

    #[test]
    fn test_linearity_is_monotonic_with_tpdf() {
        let engine = Engine::new();
        let preview = engine.digital_preview(&eight_bit(), SR).unwrap();
        let linear = &preview.dither_linear;
        assert_eq!(linear.len(), LINEARITY_STEPS);
        assert!(linear.windows(2).all(|w| w[1] >= w[0]));
        assert!(linear[0].abs() <= 1.0);
        assert!((linear[LINEARITY_STEPS - 1] - 1.0).abs() <= 1.0);
        // TPDF at 2 LSB removes the staircase
        for (x, y) in preview.linearity_inputs.iter().zip(linear) {
            assert!((x - y).abs() < 0.05, "{} -> {}", x, y);
        }
    }

    #[test]
    fn test_undithered_quantizer_is_a_staircase() {
        let engine = Engine::new();
        let patch = Patch {
            digital_dither_level: 0.0,
            ..eight_bit()
        };
        let preview = engine.digital_preview(&patch, SR).unwrap();
        for (x, y) in preview.linearity_inputs.iter().zip(&preview.dither_linear) {
            assert_eq!(*y, x.round());
        }
    }

    #[test]
    fn test_full_resolution_patch_is_clean() {
        let engine = Engine::new();
        let preview = engine.digital_preview(&Patch::default(), SR).unwrap();
        assert_eq!(preview.dither_linear, preview.linearity_inputs);
        let floor = gain_to_db(ZERO_LEVEL);
        assert!(preview.dither_dynamic_range.level_db.iter().all(|&db| db == floor));
        assert!(preview.jitter_curve.level_db.iter().all(|&db| db == floor));
    }

    #[test]
    fn test_fewer_bits_raise_the_residue() {
        let engine = Engine::new();
        let coarse = engine.digital_preview(&eight_bit(), SR).unwrap();
        let fine = engine
            .digital_preview(
                &Patch {
                    digital_bit_depth: 16,
                    ..eight_bit()
                },
                SR,
            )
            .unwrap();
        let mean = |c: &ProbeCurve| c.level_db.iter().sum::<f64>() / c.level_db.len() as f64;
        assert!(mean(&coarse.dither_dynamic_range) > mean(&fine.dither_dynamic_range) + 30.0);
    }

    #[test]
    fn test_jitter_curve_rises_with_frequency() {
        let engine = Engine::new();
        let patch = Patch {
            jitter_dac_ns: 1000.0,
            ..Patch::default()
        };
        let curve = engine.digital_preview(&patch, SR).unwrap().jitter_curve;
        assert!(curve.level_db[PROBE_TONES - 2] > curve.level_db[2] + 20.0);
    }
}
