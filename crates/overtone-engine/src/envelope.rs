//! Attack-hold-decay envelope generator.
//!
//! The raw trajectory ramps linearly during attack, holds at 1 and decays
//! exponentially to -60 dB at the nominal decay time. A one-pole low-pass
//! then rounds off the corners so the envelope adds little bandwidth to the
//! partials it modulates.

use overtone_patch::Patch;

/// Attack-hold-decay parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AhdParams {
    /// Attack time in seconds.
    pub attack: f64,
    /// Hold time in seconds.
    pub hold: f64,
    /// Decay time to -60 dB in seconds.
    pub decay: f64,
    /// One-pole smoothing amount in samples; values below 1 disable smoothing.
    pub smoothing: f64,
}

impl AhdParams {
    /// Creates new parameters, clamping negative times to zero.
    pub fn new(attack: f64, hold: f64, decay: f64, smoothing: f64) -> Self {
        Self {
            attack: attack.max(0.0),
            hold: hold.max(0.0),
            decay: decay.max(0.0),
            smoothing: smoothing.max(0.0),
        }
    }

    /// Amplitude envelope of a patch.
    pub fn amplitude(patch: &Patch) -> Self {
        Self::new(patch.attack, patch.hold, patch.decay, patch.envelope_filter)
    }

    /// Filter cutoff trajectory timing of a patch.
    pub fn filter(patch: &Patch) -> Self {
        Self::new(
            patch.filter_attack,
            patch.filter_hold,
            patch.filter_decay,
            patch.filter_smoothing,
        )
    }
}

/// Envelope generator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    /// Rising from 0 to 1.
    Attack,
    /// Held at 1.
    Hold,
    /// Falling towards 0.
    Decay,
}

/// Sample-by-sample state machine shared by the amplitude and cutoff envelopes.
///
/// [`AhdStateMachine::next`] returns the state together with the progress
/// through it: the attack ramp in `0..=1`, and for decay the elapsed decay
/// samples.
#[derive(Debug, Clone)]
pub(crate) struct AhdStateMachine {
    state: EnvelopeState,
    attack_step: f64,
    hold_samples: f64,
    ramp: f64,
    elapsed: f64,
}

impl AhdStateMachine {
    pub(crate) fn new(params: &AhdParams, sample_rate: f64) -> Self {
        let attack_samples = params.attack * sample_rate;
        Self {
            state: EnvelopeState::Attack,
            attack_step: if attack_samples >= 1.0 {
                1.0 / attack_samples
            } else {
                1.0
            },
            hold_samples: params.hold * sample_rate,
            ramp: 0.0,
            elapsed: 0.0,
        }
    }

    pub(crate) fn next(&mut self) -> (EnvelopeState, f64) {
        let current = match self.state {
            EnvelopeState::Attack => (EnvelopeState::Attack, self.ramp),
            EnvelopeState::Hold => (EnvelopeState::Hold, 1.0),
            EnvelopeState::Decay => (EnvelopeState::Decay, self.elapsed),
        };

        match self.state {
            EnvelopeState::Attack => {
                self.ramp += self.attack_step;
                if self.ramp >= 1.0 {
                    self.ramp = 1.0;
                    self.state = if self.hold_samples >= 1.0 {
                        EnvelopeState::Hold
                    } else {
                        EnvelopeState::Decay
                    };
                }
            }
            EnvelopeState::Hold => {
                self.elapsed += 1.0;
                if self.elapsed >= self.hold_samples {
                    self.elapsed = 0.0;
                    self.state = EnvelopeState::Decay;
                }
            }
            EnvelopeState::Decay => self.elapsed += 1.0,
        }
        current
    }
}

/// One-pole low-pass `y += a·(x − y)` with `a = 1/max(1, amount)`.
#[derive(Debug, Clone, Copy)]
pub struct OnePole {
    coeff: f64,
    state: f64,
}

impl OnePole {
    /// Creates a smoother starting at `initial`.
    pub fn new(amount: f64, initial: f64) -> Self {
        Self {
            coeff: 1.0 / amount.max(1.0),
            state: initial,
        }
    }

    /// Feeds one sample and returns the smoothed value.
    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        self.state += self.coeff * (x - self.state);
        self.state
    }
}

/// Renders `length` samples of the smoothed amplitude envelope.
///
/// # Arguments
/// * `sample_rate` - Audio sample rate
/// * `length` - Number of samples to render
/// * `params` - Attack, hold, decay and smoothing settings
///
/// # Returns
/// Vector of envelope values, rising from 0.0 towards 1.0
pub fn build_envelope(sample_rate: f64, length: usize, params: &AhdParams) -> Vec<f64> {
    let decay_samples = params.decay * sample_rate;
    let lambda = if decay_samples >= 1.0 {
        1024.0_f64.ln() / decay_samples
    } else {
        1.0
    };

    let mut machine = AhdStateMachine::new(params, sample_rate);
    let mut smoother = OnePole::new(params.smoothing, 0.0);
    let mut decaying = 1.0;

    (0..length)
        .map(|_| {
            let raw = match machine.next() {
                (EnvelopeState::Attack, ramp) => ramp,
                (EnvelopeState::Hold, _) => 1.0,
                (EnvelopeState::Decay, _) => {
                    let x = decaying;
                    decaying -= lambda * decaying;
                    x
                }
            };
            smoother.process(raw)
        })
        .collect()
}

/// Samples covered by the envelope before it is negligible.
///
/// # Arguments
/// * `sample_rate` - Audio sample rate
/// * `params` - Envelope timings
///
/// # Returns
/// Attack, hold, 1.4 decay times and the smoothing tail, in samples
pub fn envelope_length(sample_rate: f64, params: &AhdParams) -> usize {
    let seconds = params.attack + params.hold + 1.4 * params.decay + params.smoothing * 0.0003;
    (seconds * sample_rate).round().max(1.0) as usize
}
