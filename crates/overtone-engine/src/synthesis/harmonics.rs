//! Harmonic series level, phase and delay laws.
//!
//! [`HarmonicTable::build`] evaluates every law once and returns an explicit
//! table. Synthesis and previews are separate consumers of that table.

use std::f64::consts::{PI, TAU};

use overtone_patch::{DelayMode, Patch};

use super::partial::Partial;

/// Upper bound on the number of harmonics in one series.
pub const MAX_HARMONICS: usize = 2048;

/// Smoothstep `x²(3 − 2x)` on `0..=1`.
fn smoothstep(x: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);
    x * x * (3.0 - 2.0 * x)
}

/// Fundamental and higher-harmonic base levels for a balance in `-1..=1`.
///
/// `-1` keeps only the fundamental, `0` weights all harmonics equally and
/// `+1` removes the fundamental.
pub fn balance_levels(balance: f64) -> (f64, f64) {
    let first = if balance <= 0.0 {
        1.0
    } else {
        1.0 - smoothstep(balance)
    };
    let higher = if balance < 0.0 {
        smoothstep(1.0 + balance)
    } else {
        1.0
    };
    (first, higher)
}

/// Level of harmonic `n` before the patch amplitude is applied.
pub fn harmonic_level(patch: &Patch, n: usize) -> f64 {
    let (first, higher) = balance_levels(patch.balance);
    let base = if n == 1 {
        first
    } else {
        let nf = n as f64;
        let (parity, falloff) = if n % 2 == 1 {
            (patch.odd_level, patch.odd_falloff)
        } else {
            (patch.even_level, patch.even_falloff)
        };
        higher * parity * nf.powf(-falloff)
    };

    let alternation = if patch.alternate > 0.0 {
        let period = patch.alternate_period.max(1.0);
        let angle = n as f64 * TAU / period - TAU * patch.alternate_offset;
        (angle.sin() - 1.0) * patch.alternate + 1.0
    } else {
        1.0
    };
    base * alternation
}

/// Per-harmonic levels, phases and delays of one patch at one sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicTable {
    /// Angular frequency of the fundamental in radians per sample.
    pub omega_root: f64,
    /// Harmonic `n` is at index `n - 1`.
    pub partials: Vec<Partial>,
}

impl HarmonicTable {
    /// Builds the series up to the alias limit.
    pub fn build(patch: &Patch, sample_rate: f64) -> Self {
        Self::build_limited(patch, sample_rate, MAX_HARMONICS)
    }

    /// Builds the series up to the alias limit or `max_number` harmonics.
    pub fn build_limited(patch: &Patch, sample_rate: f64, max_number: usize) -> Self {
        let omega_root = TAU * patch.frequency / sample_rate;
        let limit = PI * patch.alias_limit.max(0.0);

        let root_phase = patch.phase_degrees.to_radians();
        let root_delay = patch.delay_ms * sample_rate / 1000.0;

        let partials = (1..=max_number.min(MAX_HARMONICS))
            .take_while(|&n| n as f64 * omega_root < limit)
            .map(|n| {
                let omega = n as f64 * omega_root;
                let (phase, delay) = if n == 1 {
                    (root_phase, root_delay)
                } else {
                    (
                        root_phase * patch.higher_phase_fraction,
                        root_delay * patch.higher_delay_fraction,
                    )
                };
                let (phase, delay) = match patch.delay_mode {
                    DelayMode::Envelope => (phase, delay),
                    DelayMode::Phase => (phase - omega * delay, 0.0),
                };
                Partial {
                    omega,
                    level: harmonic_level(patch, n) * patch.amplitude,
                    phase,
                    delay,
                }
            })
            .collect();

        Self {
            omega_root,
            partials,
        }
    }

    /// Number of harmonics in the table.
    pub fn len(&self) -> usize {
        self.partials.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.partials.is_empty()
    }

    /// Harmonics paired with their number, starting at 1.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &Partial)> {
        self.partials.iter().enumerate().map(|(i, p)| (i + 1, p))
    }

    /// Copy with every delay folded into the phase, for periodic rendering.
    pub fn phase_shifted(&self) -> Self {
        Self {
            omega_root: self.omega_root,
            partials: self
                .partials
                .iter()
                .map(|p| Partial {
                    phase: p.phase - p.omega * p.delay,
                    delay: 0.0,
                    ..*p
                })
                .collect(),
        }
    }

    /// Smallest and largest delay in samples, `(0, 0)` for an empty table.
    pub fn delay_range(&self) -> (f64, f64) {
        self.partials
            .iter()
            .filter(|p| p.is_audible())
            .fold((0.0_f64, 0.0_f64), |(lo, hi), p| {
                (lo.min(p.delay), hi.max(p.delay))
            })
    }
}
