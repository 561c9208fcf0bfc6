//! Swept Butterworth-slope low-pass applied per partial.
//!
//! The filter is never run as a recursive filter over the mixed signal.
//! Instead each partial is attenuated by the magnitude response at its own
//! frequency, evaluated against a cutoff that moves sample by sample.

use std::f64::consts::TAU;

use overtone_patch::Patch;

use crate::envelope::{AhdParams, AhdStateMachine, EnvelopeState, OnePole};
use crate::level::ZERO_LEVEL;

/// Entries of the transition-band lookup table.
pub const FILTER_LUT_SIZE: usize = 10_000;

/// Attenuation at the pass-band edge in dB.
pub const PASS_BAND_DB: f64 = -0.05;

/// Butterworth magnitude `1/sqrt(1 + r^order)` tabulated over the transition band.
///
/// The table is indexed linearly in `ln r`, `r` being the ratio of a partial's
/// frequency to the cutoff.
#[derive(Debug, Clone)]
pub struct ButterworthTable {
    order: f64,
    ln_pass: f64,
    ln_stop: f64,
    scale: f64,
    table: Vec<f64>,
}

impl ButterworthTable {
    /// Tabulates the response for a slope in dB/octave.
    pub fn new(slope_db_per_octave: f64) -> Self {
        let order = (slope_db_per_octave / 6.0 * 2.0).max(1.0);
        let pass_ratio = (10.0_f64.powf(-PASS_BAND_DB / 10.0) - 1.0).powf(1.0 / order);
        let stop_ratio = (1.0 / (ZERO_LEVEL * ZERO_LEVEL) - 1.0).powf(1.0 / order);
        let ln_pass = pass_ratio.ln();
        let ln_stop = stop_ratio.ln();
        let step = (ln_stop - ln_pass) / (FILTER_LUT_SIZE - 1) as f64;

        let table = (0..FILTER_LUT_SIZE)
            .map(|i| magnitude(order, (ln_pass + i as f64 * step).exp()))
            .collect();

        Self {
            order,
            ln_pass,
            ln_stop,
            scale: 1.0 / step,
            table,
        }
    }

    /// Exponent of the magnitude equation.
    pub fn order(&self) -> f64 {
        self.order
    }

    /// Frequency ratio at the pass-band edge.
    pub fn pass_ratio(&self) -> f64 {
        self.ln_pass.exp()
    }

    /// Frequency ratio where the response falls under [`ZERO_LEVEL`].
    pub fn stop_ratio(&self) -> f64 {
        self.ln_stop.exp()
    }

    /// Magnitude for `ln r`, linearly interpolated from the table.
    #[inline]
    pub fn gain(&self, ln_ratio: f64) -> f64 {
        if ln_ratio <= self.ln_pass {
            return 1.0;
        }
        if ln_ratio >= self.ln_stop {
            return 0.0;
        }
        let pos = (ln_ratio - self.ln_pass) * self.scale;
        let idx = (pos as usize).min(FILTER_LUT_SIZE - 2);
        let frac = pos - idx as f64;
        self.table[idx] + (self.table[idx + 1] - self.table[idx]) * frac
    }
}

/// Exact Butterworth magnitude at frequency ratio `r`.
pub fn magnitude(order: f64, ratio: f64) -> f64 {
    1.0 / (1.0 + ratio.powf(order)).sqrt()
}

/// Per-sample inverse angular cutoff plus the transition-band table.
#[derive(Debug, Clone)]
pub struct FilterEnvelope {
    inv_cutoff: Vec<f64>,
    log_inv_cutoff: Vec<f64>,
    response: ButterworthTable,
}

impl FilterEnvelope {
    /// Builds the swept cutoff of a patch.
    ///
    /// # Arguments
    /// * `patch` - Corner frequencies, timings and slope
    /// * `sample_rate` - Audio sample rate
    /// * `length` - Samples to cover, normally the envelope length
    pub fn from_patch(patch: &Patch, sample_rate: f64, length: usize) -> Self {
        let corners = [
            patch.filter_start_hz,
            patch.filter_peak_hz,
            patch.filter_end_hz,
        ];
        Self::sweep(
            corners,
            &AhdParams::filter(patch),
            patch.filter_slope,
            sample_rate,
            length,
        )
    }

    /// Builds a cutoff moving start → peak → end, linear in log2(frequency).
    pub fn sweep(
        corners_hz: [f64; 3],
        timing: &AhdParams,
        slope_db_per_octave: f64,
        sample_rate: f64,
        length: usize,
    ) -> Self {
        let [start, peak, end] = corners_hz.map(|f| f.max(f64::MIN_POSITIVE).log2());
        let decay_samples = (timing.decay * sample_rate).max(1.0);
        let mut machine = AhdStateMachine::new(timing, sample_rate);
        let mut smoother = OnePole::new(timing.smoothing, start);

        let log2_cutoff = (0..length).map(|_| {
            let target = match machine.next() {
                (EnvelopeState::Attack, ramp) => start + (peak - start) * ramp,
                (EnvelopeState::Hold, _) => peak,
                (EnvelopeState::Decay, elapsed) => {
                    peak + (end - peak) * (elapsed / decay_samples).min(1.0)
                }
            };
            smoother.process(target)
        });
        Self::from_log2_cutoff(log2_cutoff, slope_db_per_octave, sample_rate)
    }

    /// Builds a fixed cutoff, used for previews.
    pub fn constant(
        cutoff_hz: f64,
        slope_db_per_octave: f64,
        sample_rate: f64,
        length: usize,
    ) -> Self {
        let log2 = cutoff_hz.max(f64::MIN_POSITIVE).log2();
        Self::from_log2_cutoff(
            std::iter::repeat(log2).take(length),
            slope_db_per_octave,
            sample_rate,
        )
    }

    fn from_log2_cutoff(
        log2_cutoff: impl Iterator<Item = f64>,
        slope_db_per_octave: f64,
        sample_rate: f64,
    ) -> Self {
        let inv_cutoff: Vec<f64> = log2_cutoff
            .map(|l| sample_rate / (TAU * l.exp2()))
            .collect();
        let log_inv_cutoff = inv_cutoff.iter().map(|v| v.ln()).collect();
        Self {
            inv_cutoff,
            log_inv_cutoff,
            response: ButterworthTable::new(slope_db_per_octave),
        }
    }

    /// Number of samples covered.
    pub fn len(&self) -> usize {
        self.inv_cutoff.len()
    }

    /// Whether the envelope covers no samples.
    pub fn is_empty(&self) -> bool {
        self.inv_cutoff.is_empty()
    }

    /// Transition-band response table.
    pub fn response(&self) -> &ButterworthTable {
        &self.response
    }

    /// `sample_rate / (2π·cutoff)` per sample.
    pub fn inv_cutoff(&self) -> &[f64] {
        &self.inv_cutoff
    }

    /// Cutoff in Hz at sample `t`, holding the last value past the end.
    pub fn cutoff_hz(&self, t: usize, sample_rate: f64) -> f64 {
        match self.inv_cutoff.get(t.min(self.len().saturating_sub(1))) {
            Some(inv) => sample_rate / (TAU * inv),
            None => sample_rate / 2.0,
        }
    }

    /// Gain for a partial at angular frequency `omega` (radians per sample) at sample `t`.
    #[inline]
    pub fn gain(&self, omega: f64, t: usize) -> f64 {
        match self.log_inv_cutoff.get(t).or(self.log_inv_cutoff.last()) {
            Some(log_inv) => self.response.gain(omega.ln() + log_inv),
            None => 1.0,
        }
    }

    /// Whether a partial at `omega` is fully stopped at sample `t`.
    #[inline]
    pub fn is_stopped(&self, omega: f64, t: usize) -> bool {
        self.gain(omega, t) == 0.0
    }

    /// Magnitude response at sample `t` over `bins` evenly spaced bins up to Nyquist.
    pub fn magnitude_response(&self, t: usize, bins: usize) -> Vec<f64> {
        (0..bins)
            .map(|k| {
                if k == 0 {
                    1.0
                } else {
                    self.gain(std::f64::consts::PI * k as f64 / bins as f64, t)
                }
            })
            .collect()
    }
}
