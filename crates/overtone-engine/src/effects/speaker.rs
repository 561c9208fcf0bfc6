//! Driven nonlinear oscillator ("speaker") model.
//!
//! `x'' + 2ζω₀x' + ω₀²(x + βx³) = ω₀²u`, integrated with semi-implicit
//! Euler at a fixed number of sub-steps per sample.

use std::f64::consts::TAU;

use overtone_patch::Patch;
use tracing::debug;

use crate::resample::BoundaryPolicy;

/// Excursion limit of the oscillator state.
const MAX_EXCURSION: f64 = 8.0;

/// Most samples integrated while warming up a cyclic buffer.
const MAX_WARMUP_SAMPLES: usize = 1 << 22;

/// Transient decay, in time constants, allowed before a cyclic pass is recorded.
const WARMUP_TIME_CONSTANTS: f64 = 20.0;

/// Parameters of the speaker model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeakerModel {
    /// Wet mix in `0..=1`.
    pub amount: f64,
    /// Natural frequency in Hz.
    pub resonance_hz: f64,
    /// Damping ratio ζ.
    pub damping: f64,
    /// Cubic stiffness β.
    pub nonlinearity: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct OscillatorState {
    x: f64,
    v: f64,
}

impl SpeakerModel {
    /// Speaker settings of a patch.
    pub fn from_patch(patch: &Patch) -> Self {
        Self {
            amount: patch.speaker_amount.clamp(0.0, 1.0),
            resonance_hz: patch.speaker_resonance_hz,
            damping: patch.speaker_damping,
            nonlinearity: patch.speaker_nonlinearity,
        }
    }

    /// Whether the model changes the signal.
    pub fn is_active(&self) -> bool {
        self.amount > 0.0
    }

    fn substeps(&self, omega0: f64, sample_rate: f64) -> usize {
        let stiffest = omega0 * (1.0 + 3.0 * self.nonlinearity.max(0.0)).sqrt();
        ((stiffest * 4.0 / sample_rate).ceil() as usize).clamp(4, 64)
    }

    /// Drives the oscillator with `input` and returns the wet/dry mix.
    pub fn process(&self, input: &[f64], sample_rate: f64, policy: BoundaryPolicy) -> Vec<f64> {
        if !self.is_active() || input.is_empty() {
            return input.to_vec();
        }
        let omega0 = TAU * self.resonance_hz.max(1.0);
        let zeta = self.damping.max(1e-4);
        let substeps = self.substeps(omega0, sample_rate);
        let dt = 1.0 / (sample_rate * substeps as f64);
        let w2 = omega0 * omega0;
        let beta = self.nonlinearity.max(0.0);

        let step = |state: &mut OscillatorState, u: f64| {
            for _ in 0..substeps {
                let force = w2 * (u - state.x - beta * state.x * state.x * state.x)
                    - 2.0 * zeta * omega0 * state.v;
                state.v += force * dt;
                state.x = (state.x + state.v * dt).clamp(-MAX_EXCURSION, MAX_EXCURSION);
            }
        };

        let mut state = OscillatorState::default();
        if policy == BoundaryPolicy::Cyclic {
            let settle = WARMUP_TIME_CONSTANTS / (zeta * omega0) * sample_rate;
            let max_passes = (MAX_WARMUP_SAMPLES / input.len()).max(1);
            let passes = ((settle / input.len() as f64).ceil() as usize).clamp(1, max_passes);
            debug!(passes, substeps, "speaker warm-up");
            for _ in 0..passes {
                for &u in input {
                    step(&mut state, u);
                }
            }
        }

        let wet = self.amount;
        input
            .iter()
            .map(|&u| {
                step(&mut state, u);
                (1.0 - wet) * u + wet * state.x
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 48_000.0;

    fn model(amount: f64, resonance_hz: f64, damping: f64, nonlinearity: f64) -> SpeakerModel {
        SpeakerModel {
            amount,
            resonance_hz,
            damping,
            nonlinearity,
        }
    }

    #[test]
    fn test_inactive_passes_through() {
        let speaker = SpeakerModel::from_patch(&Patch::default());
        assert!(!speaker.is_active());
        let x = vec![0.1, 0.2];
        assert_eq!(speaker.process(&x, SR, BoundaryPolicy::ZeroPadded), x);
    }

    #[test]
    fn test_settles_to_dc_input() {
        let speaker = model(1.0, 200.0, 0.7, 0.0);
        let out = speaker.process(&vec![0.5; 4800], SR, BoundaryPolicy::ZeroPadded);
        assert!(out[0].abs() < 0.01);
        assert!((out[4799] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_resonant_gain() {
        // 480 Hz at 48 kHz is 100 samples per cycle
        let speaker = model(1.0, 480.0, 0.25, 0.0);
        let input: Vec<f64> = (0..1000).map(|i| 0.1 * (TAU * i as f64 / 100.0).sin()).collect();
        let out = speaker.process(&input, SR, BoundaryPolicy::Cyclic);
        let peak = out.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        // |H(ω₀)| = 1/(2ζ)
        assert!((peak / 0.1 - 2.0).abs() < 0.06, "gain {}", peak / 0.1);
    }

    #[test]
    fn test_stiffening_compresses() {
        let input: Vec<f64> = (0..1000).map(|i| 0.8 * (TAU * i as f64 / 1000.0).sin()).collect();
        let linear = model(1.0, 2000.0, 0.7, 0.0).process(&input, SR, BoundaryPolicy::Cyclic);
        let stiff = model(1.0, 2000.0, 0.7, 5.0).process(&input, SR, BoundaryPolicy::Cyclic);
        let peak = |v: &[f64]| v.iter().fold(0.0_f64, |m, s| m.max(s.abs()));
        assert!(peak(&stiff) < peak(&linear) * 0.8);
    }

    #[test]
    fn test_dry_mix() {
        let input = vec![0.25; 64];
        let out = model(0.5, 500.0, 0.5, 0.0).process(&input, SR, BoundaryPolicy::ZeroPadded);
        // first sample: the oscillator has barely moved
        assert!((out[0] - 0.125).abs() < 0.01);
    }
}
