//! Inharmonic partials mixed in after the harmonic series.

use std::f64::consts::{PI, TAU};

use overtone_patch::Patch;

use super::partial::Partial;
use crate::level::{db_to_gain, OFF_DB};

/// Resolves the patch's inharmonic slots into partials.
///
/// Slots that are off, at or below [`OFF_DB`], or above the alias limit are
/// dropped. Partials start with zero phase at the channel pre-delay.
pub fn inharmonic_partials(patch: &Patch, sample_rate: f64) -> Vec<Partial> {
    let limit = PI * patch.alias_limit.max(0.0);
    patch
        .inharmonics
        .iter()
        .filter(|slot| slot.level_db > OFF_DB)
        .filter_map(|slot| slot.tuning.frequency(patch.frequency).map(|hz| (slot, hz)))
        .map(|(slot, hz)| Partial {
            omega: TAU * hz / sample_rate,
            level: db_to_gain(slot.level_db),
            phase: 0.0,
            delay: 0.0,
        })
        .filter(|p| p.omega > 0.0 && p.omega < limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use overtone_patch::{InharmonicPartial, PartialTuning};

    #[test]
    fn test_resolves_tunings_and_levels() {
        let mut patch = Patch {
            frequency: 100.0,
            ..Patch::default()
        };
        patch.inharmonics = [
            InharmonicPartial::new(PartialTuning::Absolute { hz: 1234.0 }, -6.0),
            InharmonicPartial::new(PartialTuning::EqualTempered { semitones: 12.0 }, -20.0),
            InharmonicPartial::new(
                PartialTuning::Just {
                    numerator: 3,
                    denominator: 2,
                },
                -100.0,
            ),
        ];

        let partials = inharmonic_partials(&patch, 48_000.0);
        assert_eq!(partials.len(), 2);
        assert!((partials[0].omega - TAU * 1234.0 / 48_000.0).abs() < 1e-15);
        assert!((partials[0].level - db_to_gain(-6.0)).abs() < 1e-15);
        assert!((partials[1].omega - TAU * 200.0 / 48_000.0).abs() < 1e-12);
        assert!((partials[1].level - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_drops_partials_above_nyquist() {
        let mut patch = Patch::default();
        patch.inharmonics[0] =
            InharmonicPartial::new(PartialTuning::Absolute { hz: 30_000.0 }, 0.0);
        assert!(inharmonic_partials(&patch, 48_000.0).is_empty());
    }

    #[test]
    fn test_default_slots_are_off() {
        assert!(inharmonic_partials(&Patch::default(), 48_000.0).is_empty());
    }
}
