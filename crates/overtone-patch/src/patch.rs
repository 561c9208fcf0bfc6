//! The patch record: every named parameter of one sound.

use serde::{Deserialize, Serialize};

use crate::error::PatchError;
use crate::partial::{InharmonicPartial, INHARMONIC_SLOTS};

/// Current patch schema version.
pub const PATCH_VERSION: u32 = 1;

/// Oversampling factors selectable through [`Patch::oversample_times`].
pub const OVERSAMPLE_FACTORS: [usize; 8] = [1, 2, 3, 4, 6, 8, 12, 16];

/// Bit depth value meaning "no requantization".
pub const BIT_DEPTH_OFF: u32 = 25;

/// How a delay of the fundamental relative to the higher harmonics is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DelayMode {
    /// The lagging side's envelope and waveform are delayed together.
    #[default]
    Envelope,
    /// Envelopes stay aligned; the delay is applied as a phase shift.
    Phase,
}

/// Probability distribution of dither noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DitherType {
    /// Uniform distribution.
    Rectangular,
    /// Sum of two uniform draws.
    #[default]
    Triangular,
    /// Normal distribution with triangular-equivalent RMS.
    Gaussian,
}

/// A complete, immutable description of one sound.
///
/// Missing JSON fields fall back to [`Patch::default`]; unknown fields are
/// rejected. Stages that need a variant clone the patch and override fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Patch {
    /// Schema version, must equal [`PATCH_VERSION`].
    pub version: u32,
    /// Base seed for jitter and dither noise.
    pub seed: u32,

    // Tone
    /// Fundamental frequency in Hz.
    pub frequency: f64,
    /// Linear peak amplitude of the harmonic series.
    pub amplitude: f64,

    // Amplitude envelope
    /// Attack time in seconds.
    pub attack: f64,
    /// Hold time in seconds.
    pub hold: f64,
    /// Decay time to -60 dB in seconds.
    pub decay: f64,
    /// One-pole smoothing amount applied to the envelope, in samples.
    pub envelope_filter: f64,

    // Harmonic levels
    /// Energy bias between fundamental (-1), all equal (0) and higher only (+1).
    pub balance: f64,
    /// Level of odd harmonics above the fundamental.
    pub odd_level: f64,
    /// Level of even harmonics.
    pub even_level: f64,
    /// Falloff exponent of odd harmonics (`n^-falloff`).
    pub odd_falloff: f64,
    /// Falloff exponent of even harmonics.
    pub even_falloff: f64,
    /// Depth of the alternating-polarity modulation.
    pub alternate: f64,
    /// Harmonic count per alternation cycle.
    pub alternate_period: f64,
    /// Alternation offset as a fraction of a cycle.
    pub alternate_offset: f64,
    /// Highest synthesized frequency as a multiple of Nyquist. Values above 1 alias.
    pub alias_limit: f64,

    // Phase and delay
    /// Phase shift of the fundamental in degrees.
    pub phase_degrees: f64,
    /// Delay of the fundamental in milliseconds. Negative values lead.
    pub delay_ms: f64,
    /// Fraction of the fundamental's phase shift applied to higher harmonics.
    pub higher_phase_fraction: f64,
    /// Fraction of the fundamental's delay applied to higher harmonics.
    pub higher_delay_fraction: f64,
    /// Rendering of delays.
    pub delay_mode: DelayMode,

    // Filter envelope
    /// Low-pass slope in dB/octave; 0 disables the filter.
    pub filter_slope: f64,
    /// Cutoff at note start in Hz.
    pub filter_start_hz: f64,
    /// Cutoff reached at the end of the filter attack in Hz.
    pub filter_peak_hz: f64,
    /// Cutoff reached at the end of the filter decay in Hz.
    pub filter_end_hz: f64,
    /// Filter attack time in seconds.
    pub filter_attack: f64,
    /// Filter hold time in seconds.
    pub filter_hold: f64,
    /// Filter decay time in seconds.
    pub filter_decay: f64,
    /// One-pole smoothing amount of the cutoff trajectory, in samples.
    pub filter_smoothing: f64,

    // Waveshaping
    /// Master waveshaping amount; 0 disables waveshaping.
    pub distortion: f64,
    /// Weight of hard clipping.
    pub distortion_clip: f64,
    /// Weight of hyperbolic saturation.
    pub distortion_hyperbolic: f64,
    /// Weight of cubic (odd-order) shaping.
    pub distortion_odd: f64,
    /// Weight of tanh saturation.
    pub distortion_tanh: f64,

    // Oversampling
    /// Index into [`OVERSAMPLE_FACTORS`].
    pub oversample_times: usize,
    /// Kernel transition width as a fraction of the base-rate Nyquist.
    pub oversample_transition: f64,
    /// Kernel stop-band attenuation in dB.
    pub oversample_stop_db: f64,

    // Speaker model
    /// Wet mix of the nonlinear oscillator; 0 disables it.
    pub speaker_amount: f64,
    /// Natural frequency of the oscillator in Hz.
    pub speaker_resonance_hz: f64,
    /// Damping ratio.
    pub speaker_damping: f64,
    /// Cubic stiffness coefficient.
    pub speaker_nonlinearity: f64,

    // Jitter
    /// RMS sampling-clock jitter in nanoseconds.
    pub jitter_adc_ns: f64,
    /// RMS reconstruction-clock jitter in nanoseconds.
    pub jitter_dac_ns: f64,
    /// Peak periodic reconstruction-clock jitter in nanoseconds.
    pub jitter_periodic_ns: f64,
    /// Frequency of the periodic jitter component in Hz.
    pub jitter_periodic_hz: f64,

    // Requantization
    /// Target bit depth, [`BIT_DEPTH_OFF`] disables requantization.
    pub digital_bit_depth: u32,
    /// Dither distribution.
    pub digital_dither_type: DitherType,
    /// Dither peak-to-peak width in LSB; 0 disables dither.
    pub digital_dither_level: f64,
    /// Share of dither added after quantization, as an angle in degrees.
    pub digital_dither_fakeness: f64,
    /// Fraction of the previous quantization error fed back.
    pub digital_noise_shaping: f64,
    /// Subtract the pre-quantization dither after quantization.
    pub digital_dither_subtract: bool,

    // Output
    /// Output attenuation in dB applied after A/B normalization.
    pub attenuation_db: f64,
    /// Inharmonic partials mixed in after the harmonic series.
    pub inharmonics: [InharmonicPartial; INHARMONIC_SLOTS],
}

impl Default for Patch {
    fn default() -> Self {
        Self {
            version: PATCH_VERSION,
            seed: 0,
            frequency: 50.0,
            amplitude: 1.0,
            attack: 0.005,
            hold: 0.0,
            decay: 0.4,
            envelope_filter: 150.0,
            balance: -1.0,
            odd_level: 1.0,
            even_level: 1.0,
            odd_falloff: 1.0,
            even_falloff: 1.0,
            alternate: 0.0,
            alternate_period: 2.0,
            alternate_offset: 0.25,
            alias_limit: 1.0,
            phase_degrees: 0.0,
            delay_ms: 0.0,
            higher_phase_fraction: 0.0,
            higher_delay_fraction: 0.0,
            delay_mode: DelayMode::Envelope,
            filter_slope: 0.0,
            filter_start_hz: 200.0,
            filter_peak_hz: 5000.0,
            filter_end_hz: 500.0,
            filter_attack: 0.01,
            filter_hold: 0.0,
            filter_decay: 0.5,
            filter_smoothing: 150.0,
            distortion: 0.0,
            distortion_clip: 0.0,
            distortion_hyperbolic: 0.0,
            distortion_odd: 0.0,
            distortion_tanh: 1.0,
            oversample_times: 0,
            oversample_transition: 0.1,
            oversample_stop_db: 100.0,
            speaker_amount: 0.0,
            speaker_resonance_hz: 80.0,
            speaker_damping: 0.3,
            speaker_nonlinearity: 0.0,
            jitter_adc_ns: 0.0,
            jitter_dac_ns: 0.0,
            jitter_periodic_ns: 0.0,
            jitter_periodic_hz: 1000.0,
            digital_bit_depth: BIT_DEPTH_OFF,
            digital_dither_type: DitherType::Triangular,
            digital_dither_level: 2.0,
            digital_dither_fakeness: 0.0,
            digital_noise_shaping: 0.0,
            digital_dither_subtract: false,
            attenuation_db: 0.0,
            inharmonics: [InharmonicPartial::default(); INHARMONIC_SLOTS],
        }
    }
}

impl Patch {
    /// Parses a patch from JSON, filling missing fields with defaults.
    ///
    /// The parsed patch is validated before it is returned.
    pub fn from_json(json: &str) -> Result<Self, PatchError> {
        let patch: Patch = serde_json::from_str(json)?;
        patch.validate()?;
        Ok(patch)
    }

    /// Serializes the patch to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, PatchError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Oversampling factor selected by [`Patch::oversample_times`].
    ///
    /// Out-of-table indices select the largest factor.
    pub fn oversample_factor(&self) -> usize {
        OVERSAMPLE_FACTORS[self.oversample_times.min(OVERSAMPLE_FACTORS.len() - 1)]
    }

    /// Whether the patch filters its harmonics.
    pub fn filter_enabled(&self) -> bool {
        self.filter_slope > 0.0
    }

    /// Whether any waveshaping is applied.
    pub fn waveshaping_enabled(&self) -> bool {
        self.distortion > 0.0
            && (self.distortion_clip > 0.0
                || self.distortion_hyperbolic > 0.0
                || self.distortion_odd > 0.0
                || self.distortion_tanh > 0.0)
    }

    /// Whether the speaker model is applied.
    pub fn speaker_enabled(&self) -> bool {
        self.speaker_amount > 0.0
    }

    /// Whether any jitter component is non-zero.
    pub fn jitter_enabled(&self) -> bool {
        self.jitter_adc_ns > 0.0 || self.jitter_dac_ns > 0.0 || self.jitter_periodic_ns > 0.0
    }

    /// Whether requantization is applied.
    pub fn quantization_enabled(&self) -> bool {
        self.digital_bit_depth < BIT_DEPTH_OFF
    }

    /// Largest representable positive quantization level, `2^(bits-1)`.
    pub fn max_int(&self) -> f64 {
        2.0_f64.powi(self.digital_bit_depth.clamp(2, 24) as i32 - 1)
    }

    /// Output gain derived from [`Patch::attenuation_db`].
    pub fn attenuation_gain(&self) -> f64 {
        10.0_f64.powf(-self.attenuation_db.max(0.0) / 20.0)
    }

    /// Returns a copy reduced to a bare sine at the same frequency.
    ///
    /// Distortion, speaker and oversampling settings are kept so the copy can
    /// be used to measure the nonlinear stages in isolation.
    pub fn forced_sine(&self) -> Self {
        Self {
            amplitude: 1.0,
            balance: -1.0,
            alternate: 0.0,
            alias_limit: 1.0,
            phase_degrees: 0.0,
            delay_ms: 0.0,
            filter_slope: 0.0,
            jitter_adc_ns: 0.0,
            jitter_dac_ns: 0.0,
            jitter_periodic_ns: 0.0,
            digital_bit_depth: BIT_DEPTH_OFF,
            inharmonics: [InharmonicPartial::default(); INHARMONIC_SLOTS],
            ..self.clone()
        }
    }

    /// Returns a copy with the fundamental moved to `frequency`.
    pub fn with_frequency(&self, frequency: f64) -> Self {
        Self {
            frequency,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partial::PartialTuning;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_document_is_default() {
        let patch = Patch::from_json("{}").unwrap();
        assert_eq!(patch, Patch::default());
    }

    #[test]
    fn test_partial_document_overrides() {
        let patch = Patch::from_json(r#"{"frequency": 440.0, "distortion": 0.5}"#).unwrap();
        assert_eq!(
            patch,
            Patch {
                frequency: 440.0,
                distortion: 0.5,
                ..Patch::default()
            }
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Patch::from_json(r#"{"frequncy": 440.0}"#).unwrap_err();
        assert_eq!(err.code(), "PATCH_005");
    }

    #[test]
    fn test_json_roundtrip() {
        let mut patch = Patch {
            delay_mode: DelayMode::Phase,
            digital_dither_type: DitherType::Gaussian,
            ..Patch::default()
        };
        patch.inharmonics[1] =
            InharmonicPartial::new(PartialTuning::EqualTempered { semitones: 7.0 }, -12.0);

        let json = patch.to_json().unwrap();
        let parsed = Patch::from_json(&json).unwrap();
        assert_eq!(parsed, patch);
    }

    #[test]
    fn test_oversample_factor_table() {
        let factors: Vec<usize> = (0..8)
            .map(|i| {
                Patch {
                    oversample_times: i,
                    ..Patch::default()
                }
                .oversample_factor()
            })
            .collect();
        assert_eq!(factors, vec![1, 2, 3, 4, 6, 8, 12, 16]);
    }

    #[test]
    fn test_max_int() {
        let patch = Patch {
            digital_bit_depth: 8,
            ..Patch::default()
        };
        assert_eq!(patch.max_int(), 128.0);
        assert!(patch.quantization_enabled());
        assert!(!Patch::default().quantization_enabled());
    }

    #[test]
    fn test_forced_sine_keeps_distortion() {
        let patch = Patch {
            balance: 0.5,
            distortion: 0.3,
            filter_slope: 24.0,
            oversample_times: 3,
            ..Patch::default()
        };
        let sine = patch.forced_sine();
        assert_eq!(sine.balance, -1.0);
        assert_eq!(sine.filter_slope, 0.0);
        assert_eq!(sine.distortion, 0.3);
        assert_eq!(sine.oversample_times, 3);
        // the source is untouched
        assert_eq!(patch.balance, 0.5);
    }

    #[test]
    fn test_waveshaping_needs_amount_and_weight() {
        let mut patch = Patch::default();
        assert!(!patch.waveshaping_enabled());
        patch.distortion = 0.2;
        assert!(patch.waveshaping_enabled());
        patch.distortion_tanh = 0.0;
        assert!(!patch.waveshaping_enabled());
    }
}
