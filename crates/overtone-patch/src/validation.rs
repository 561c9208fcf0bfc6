//! Range validation for patches.
//!
//! Every numeric field has a documented inclusive range. Validation stops at
//! the first violation and reports the field by its JSON name.

use crate::error::PatchError;
use crate::patch::{Patch, BIT_DEPTH_OFF, OVERSAMPLE_FACTORS, PATCH_VERSION};

/// Checks that `value` is finite and inside `[min, max]`.
pub fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), PatchError> {
    if !value.is_finite() {
        return Err(PatchError::NotFinite { field });
    }
    if value < min || value > max {
        return Err(PatchError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

impl Patch {
    /// Validates every field against its documented range.
    pub fn validate(&self) -> Result<(), PatchError> {
        if self.version != PATCH_VERSION {
            return Err(PatchError::UnsupportedVersion {
                found: self.version,
                expected: PATCH_VERSION,
            });
        }

        let ranges = [
            ("frequency", self.frequency, 10.0, 20_000.0),
            ("amplitude", self.amplitude, 0.0, 1.0),
            ("attack", self.attack, 0.0, 10.0),
            ("hold", self.hold, 0.0, 10.0),
            ("decay", self.decay, 0.001, 30.0),
            ("envelope_filter", self.envelope_filter, 0.0, 10_000.0),
            ("balance", self.balance, -1.0, 1.0),
            ("odd_level", self.odd_level, 0.0, 1.0),
            ("even_level", self.even_level, 0.0, 1.0),
            ("odd_falloff", self.odd_falloff, 1.0, 2.0),
            ("even_falloff", self.even_falloff, 1.0, 2.0),
            ("alternate", self.alternate, 0.0, 1.0),
            ("alternate_period", self.alternate_period, 1.0, 1000.0),
            ("alternate_offset", self.alternate_offset, 0.0, 1.0),
            ("alias_limit", self.alias_limit, 1.0, 4.0),
            ("phase_degrees", self.phase_degrees, -360.0, 360.0),
            ("delay_ms", self.delay_ms, -50.0, 50.0),
            ("higher_phase_fraction", self.higher_phase_fraction, 0.0, 1.0),
            ("higher_delay_fraction", self.higher_delay_fraction, 0.0, 1.0),
            ("filter_slope", self.filter_slope, 0.0, 96.0),
            ("filter_start_hz", self.filter_start_hz, 10.0, 40_000.0),
            ("filter_peak_hz", self.filter_peak_hz, 10.0, 40_000.0),
            ("filter_end_hz", self.filter_end_hz, 10.0, 40_000.0),
            ("filter_attack", self.filter_attack, 0.0, 30.0),
            ("filter_hold", self.filter_hold, 0.0, 30.0),
            ("filter_decay", self.filter_decay, 0.0, 30.0),
            ("filter_smoothing", self.filter_smoothing, 0.0, 10_000.0),
            ("distortion", self.distortion, 0.0, 1.0),
            ("distortion_clip", self.distortion_clip, 0.0, 1.0),
            ("distortion_hyperbolic", self.distortion_hyperbolic, 0.0, 1.0),
            ("distortion_odd", self.distortion_odd, 0.0, 1.0),
            ("distortion_tanh", self.distortion_tanh, 0.0, 1.0),
            ("oversample_transition", self.oversample_transition, 0.01, 1.0),
            ("oversample_stop_db", self.oversample_stop_db, 20.0, 200.0),
            ("speaker_amount", self.speaker_amount, 0.0, 1.0),
            ("speaker_resonance_hz", self.speaker_resonance_hz, 10.0, 5000.0),
            ("speaker_damping", self.speaker_damping, 0.01, 2.0),
            ("speaker_nonlinearity", self.speaker_nonlinearity, 0.0, 100.0),
            ("jitter_adc_ns", self.jitter_adc_ns, 0.0, 100_000.0),
            ("jitter_dac_ns", self.jitter_dac_ns, 0.0, 100_000.0),
            ("jitter_periodic_ns", self.jitter_periodic_ns, 0.0, 100_000.0),
            ("jitter_periodic_hz", self.jitter_periodic_hz, 1.0, 24_000.0),
            ("digital_dither_level", self.digital_dither_level, 0.0, 8.0),
            ("digital_dither_fakeness", self.digital_dither_fakeness, 0.0, 90.0),
            ("digital_noise_shaping", self.digital_noise_shaping, 0.0, 1.0),
            ("attenuation_db", self.attenuation_db, 0.0, 120.0),
            (
                "digital_bit_depth",
                self.digital_bit_depth as f64,
                2.0,
                BIT_DEPTH_OFF as f64,
            ),
        ];
        for (field, value, min, max) in ranges {
            check_range(field, value, min, max)?;
        }

        if self.filter_slope % 6.0 != 0.0 {
            return Err(PatchError::invalid(
                "filter_slope",
                format!("{} dB/octave is not a multiple of 6", self.filter_slope),
            ));
        }

        if self.oversample_times >= OVERSAMPLE_FACTORS.len() {
            return Err(PatchError::OutOfRange {
                field: "oversample_times",
                value: self.oversample_times as f64,
                min: 0.0,
                max: (OVERSAMPLE_FACTORS.len() - 1) as f64,
            });
        }

        for partial in &self.inharmonics {
            check_range("inharmonics.level_db", partial.level_db, -200.0, 0.0)?;
            if let Some(freq) = partial.tuning.frequency(self.frequency) {
                if !freq.is_finite() || freq <= 0.0 {
                    return Err(PatchError::invalid(
                        "inharmonics.tuning",
                        format!("resolves to a non-positive frequency ({freq})"),
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partial::{InharmonicPartial, PartialTuning};

    #[test]
    fn test_default_is_valid() {
        assert!(Patch::default().validate().is_ok());
    }

    #[test]
    fn test_balance_out_of_range() {
        let patch = Patch {
            balance: 1.5,
            ..Patch::default()
        };
        match patch.validate() {
            Err(PatchError::OutOfRange { field, .. }) => assert_eq!(field, "balance"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_nan_rejected() {
        let patch = Patch {
            decay: f64::NAN,
            ..Patch::default()
        };
        assert!(matches!(
            patch.validate(),
            Err(PatchError::NotFinite { field: "decay" })
        ));
    }

    #[test]
    fn test_odd_slope_rejected() {
        let patch = Patch {
            filter_slope: 10.0,
            ..Patch::default()
        };
        assert!(matches!(
            patch.validate(),
            Err(PatchError::Invalid {
                field: "filter_slope",
                ..
            })
        ));
    }

    #[test]
    fn test_version_mismatch() {
        let patch = Patch {
            version: 7,
            ..Patch::default()
        };
        assert!(matches!(
            patch.validate(),
            Err(PatchError::UnsupportedVersion { found: 7, .. })
        ));
    }

    #[test]
    fn test_oversample_index_bounds() {
        let patch = Patch {
            oversample_times: 8,
            ..Patch::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_negative_absolute_partial_rejected() {
        let mut patch = Patch::default();
        patch.inharmonics[0] = InharmonicPartial::new(PartialTuning::Absolute { hz: -5.0 }, -6.0);
        assert!(patch.validate().is_err());
    }
}
