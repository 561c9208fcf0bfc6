//! Shared sine generator used for every partial.

use crate::filter::FilterEnvelope;
use crate::level::ZERO_LEVEL;

/// Samples between phasor renormalizations.
const RENORMALIZE_INTERVAL: usize = 1024;

/// One sinusoidal component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partial {
    /// Angular frequency in radians per sample.
    pub omega: f64,
    /// Signed linear level.
    pub level: f64,
    /// Sine phase at the partial's start, in radians.
    pub phase: f64,
    /// Start offset relative to the channel pre-delay, in samples. May be negative.
    pub delay: f64,
}

impl Partial {
    /// Whether the partial contributes anything.
    pub fn is_audible(&self) -> bool {
        self.level.abs() >= ZERO_LEVEL
    }
}

/// Adds `level · env(τ) · filter(ω, τ) · sin(ωτ + phase)` to `out`.
///
/// `τ` is time since `start`, which may be fractional: the phasor is rotated
/// by the fractional part before the first output sample and the envelope is
/// linearly interpolated.
///
/// # Arguments
/// * `out` - Buffer to mix into
/// * `partial` - Level, angular frequency and phase
/// * `start` - Sample position where the envelope begins
/// * `envelope` - Amplitude envelope shared by all partials
/// * `filter` - Swept filter, if the patch filters
pub fn add_partial(
    out: &mut [f64],
    partial: &Partial,
    start: f64,
    envelope: &[f64],
    filter: Option<&FilterEnvelope>,
) {
    if !partial.is_audible() || envelope.is_empty() {
        return;
    }
    let first = start.ceil().max(0.0);
    let lead = first - start;
    let skip = lead.floor() as usize;
    let frac = lead - skip as f64;

    let (step_sin, step_cos) = partial.omega.sin_cos();
    let (mut s, mut c) = (partial.phase + partial.omega * lead).sin_cos();

    let first = first as usize;
    for (i, t) in (skip..envelope.len()).zip(first..out.len()) {
        let next = envelope.get(i + 1).copied().unwrap_or(0.0);
        let env = envelope[i] + (next - envelope[i]) * frac;

        if env.abs() >= ZERO_LEVEL {
            let gain = filter.map_or(1.0, |f| f.gain(partial.omega, i));
            if gain > 0.0 {
                out[t] += partial.level * env * gain * s;
            }
        }

        let rotated = s * step_cos + c * step_sin;
        c = c * step_cos - s * step_sin;
        s = rotated;

        if (i - skip) % RENORMALIZE_INTERVAL == RENORMALIZE_INTERVAL - 1 {
            let norm = (s * s + c * c).sqrt();
            s /= norm;
            c /= norm;
        }
    }
}
