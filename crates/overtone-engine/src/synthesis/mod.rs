//! Additive synthesis of one channel.
//!
//! - `harmonics` - level, phase and delay laws evaluated into a [`HarmonicTable`]
//! - `inharmonic` - the patch's fixed set of inharmonic partials
//! - `partial` - the sine generator every partial is rendered with

pub mod harmonics;
pub mod inharmonic;
pub mod partial;

pub use harmonics::{balance_levels, harmonic_level, HarmonicTable, MAX_HARMONICS};
pub use inharmonic::inharmonic_partials;
pub use partial::{add_partial, Partial};

use overtone_patch::Patch;
use tracing::trace;

use crate::envelope::{build_envelope, envelope_length, AhdParams};
use crate::filter::FilterEnvelope;

/// Derived per-channel timing, computed once per render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelState {
    /// Samples covered by the amplitude envelope.
    pub envelope_length: usize,
    /// Common start offset of every partial, in samples.
    pub pre_delay: usize,
    /// Extra samples needed by the most delayed partial.
    pub tail: usize,
    /// Output buffer length.
    pub length: usize,
    /// Phase shift of the fundamental in radians.
    pub phase_shift: f64,
}

impl ChannelState {
    /// Pre-delay needed so that no partial starts before sample 0.
    pub fn required_pre_delay(table: &HarmonicTable) -> usize {
        let (earliest, _) = table.delay_range();
        (-earliest).max(0.0).ceil() as usize
    }

    /// Timing for a patch rendered with `pre_delay` samples of lead-in.
    pub fn new(patch: &Patch, sample_rate: f64, table: &HarmonicTable, pre_delay: usize) -> Self {
        let envelope_length = envelope_length(sample_rate, &AhdParams::amplitude(patch));
        let (_, latest) = table.delay_range();
        let tail = latest.max(0.0).ceil() as usize;
        Self {
            envelope_length,
            pre_delay,
            tail,
            length: envelope_length + pre_delay + tail,
            phase_shift: patch.phase_degrees.to_radians(),
        }
    }
}

/// Samples and modulation artifacts of one synthesized channel.
#[derive(Debug, Clone)]
pub struct ChannelSynthesis {
    /// Synthesized samples.
    pub samples: Vec<f64>,
    /// Amplitude envelope shared by every partial.
    pub envelope: Vec<f64>,
    /// Cutoff trajectory, when the patch filters.
    pub filter: Option<FilterEnvelope>,
}

/// Renders the harmonic series followed by the inharmonic partials.
pub fn synthesize_channel(
    patch: &Patch,
    sample_rate: f64,
    table: &HarmonicTable,
    state: &ChannelState,
) -> ChannelSynthesis {
    let envelope = build_envelope(
        sample_rate,
        state.envelope_length,
        &AhdParams::amplitude(patch),
    );
    let filter = patch
        .filter_enabled()
        .then(|| FilterEnvelope::from_patch(patch, sample_rate, state.envelope_length));

    let mut samples = vec![0.0; state.length];
    let pre_delay = state.pre_delay as f64;

    let mut rendered = 0;
    for partial in table.partials.iter().filter(|p| p.is_audible()) {
        add_partial(
            &mut samples,
            partial,
            pre_delay + partial.delay,
            &envelope,
            filter.as_ref(),
        );
        rendered += 1;
    }

    let inharmonics = inharmonic_partials(patch, sample_rate);
    for partial in &inharmonics {
        add_partial(&mut samples, partial, pre_delay, &envelope, filter.as_ref());
    }
    trace!(
        harmonics = table.len(),
        rendered,
        inharmonics = inharmonics.len(),
        length = state.length,
        "synthesized channel"
    );

    ChannelSynthesis {
        samples,
        envelope,
        filter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overtone_patch::DelayMode;

    const SR: f64 = 48_000.0;

    #[test]
    fn test_default_patch_timing() {
        let patch = Patch::default();
        let table = HarmonicTable::build(&patch, SR);
        let state = ChannelState::new(&patch, SR, &table, 0);
        assert_eq!(state.length, 29_280);
        assert_eq!(ChannelState::required_pre_delay(&table), 0);
    }

    #[test]
    fn test_negative_delay_requires_pre_delay() {
        let patch = Patch {
            delay_ms: -1.0,
            ..Patch::default()
        };
        let table = HarmonicTable::build(&patch, SR);
        let pre_delay = ChannelState::required_pre_delay(&table);
        assert_eq!(pre_delay, 48);
        let state = ChannelState::new(&patch, SR, &table, pre_delay);
        assert_eq!(state.length, 29_280 + 48);

        let out = synthesize_channel(&patch, SR, &table, &state);
        assert!(out.samples.iter().any(|v| v.abs() > 0.5));
    }

    #[test]
    fn test_envelope_delay_shifts_fundamental() {
        let base = Patch::default();
        let delayed = Patch {
            delay_ms: 2.0,
            delay_mode: DelayMode::Envelope,
            ..Patch::default()
        };
        let render = |patch: &Patch| {
            let table = HarmonicTable::build(patch, SR);
            let state = ChannelState::new(patch, SR, &table, 0);
            synthesize_channel(patch, SR, &table, &state).samples
        };
        let a = render(&base);
        let b = render(&delayed);
        assert_eq!(b.len(), a.len() + 96);
        assert!(b[..96].iter().all(|&v| v == 0.0));
        for i in (0..a.len()).step_by(101) {
            assert!((a[i] - b[i + 96]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_filter_artifact_present_only_when_enabled() {
        let patch = Patch::default();
        let table = HarmonicTable::build(&patch, SR);
        let state = ChannelState::new(&patch, SR, &table, 0);
        assert!(synthesize_channel(&patch, SR, &table, &state).filter.is_none());

        let filtered = Patch {
            filter_slope: 24.0,
            ..Patch::default()
        };
        let out = synthesize_channel(&filtered, SR, &table, &state);
        assert_eq!(out.filter.map(|f| f.len()), Some(state.envelope_length));
    }
}
