//! Inharmonic partial descriptions.

use serde::{Deserialize, Serialize};

/// Number of inharmonic partial slots carried by every patch.
pub const INHARMONIC_SLOTS: usize = 3;

/// How an inharmonic partial's frequency is derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum PartialTuning {
    /// Slot unused.
    #[default]
    Off,
    /// Absolute frequency in Hz, independent of the fundamental.
    Absolute {
        /// Frequency in Hz.
        hz: f64,
    },
    /// Equal-tempered interval above (or below) the fundamental.
    EqualTempered {
        /// Interval in semitones; fractional values are allowed.
        semitones: f64,
    },
    /// Just-intonation ratio to the fundamental.
    Just {
        /// Ratio numerator.
        numerator: u32,
        /// Ratio denominator.
        denominator: u32,
    },
}

impl PartialTuning {
    /// Resolves the partial frequency in Hz for a given fundamental.
    ///
    /// Returns `None` for [`PartialTuning::Off`] and for degenerate ratios.
    pub fn frequency(&self, fundamental: f64) -> Option<f64> {
        match *self {
            PartialTuning::Off => None,
            PartialTuning::Absolute { hz } => Some(hz),
            PartialTuning::EqualTempered { semitones } => {
                Some(fundamental * 2.0_f64.powf(semitones / 12.0))
            }
            PartialTuning::Just {
                numerator,
                denominator,
            } => {
                if numerator == 0 || denominator == 0 {
                    None
                } else {
                    Some(fundamental * numerator as f64 / denominator as f64)
                }
            }
        }
    }
}

/// One inharmonic partial mixed in after the harmonic series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InharmonicPartial {
    /// Frequency derivation.
    #[serde(default)]
    pub tuning: PartialTuning,
    /// Level in dB relative to full scale. At or below `-100` the partial is off.
    #[serde(default = "default_level_db")]
    pub level_db: f64,
}

fn default_level_db() -> f64 {
    -100.0
}

impl Default for InharmonicPartial {
    fn default() -> Self {
        Self {
            tuning: PartialTuning::Off,
            level_db: default_level_db(),
        }
    }
}

impl InharmonicPartial {
    /// Creates a partial with the given tuning and level.
    pub fn new(tuning: PartialTuning, level_db: f64) -> Self {
        Self { tuning, level_db }
    }
}
