//! Level floors, decibel conversion and peak/scale helpers.

/// Magnitude treated as silence (-160 dB).
pub const ZERO_LEVEL: f64 = 1e-8;

/// Levels at or below this many dB are considered off.
pub const OFF_DB: f64 = -100.0;

/// Converts decibels to a linear gain.
#[inline]
pub fn db_to_gain(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Converts a linear magnitude to decibels, flooring at [`ZERO_LEVEL`].
#[inline]
pub fn gain_to_db(gain: f64) -> f64 {
    20.0 * gain.abs().max(ZERO_LEVEL).log10()
}

/// Largest absolute sample value.
pub fn peak(samples: &[f64]) -> f64 {
    samples.iter().map(|s| s.abs()).fold(0.0_f64, f64::max)
}

/// Largest absolute sample value across several channels.
pub fn peak_channels(channels: &[Vec<f64>]) -> f64 {
    channels
        .iter()
        .map(|c| peak(c))
        .fold(0.0_f64, f64::max)
}

/// Gain that brings `current_peak` to `headroom_db` below full scale.
///
/// Returns 1.0 for silent material so it stays silent.
pub fn normalization_gain(current_peak: f64, headroom_db: f64) -> f64 {
    if current_peak > ZERO_LEVEL {
        db_to_gain(headroom_db) / current_peak
    } else {
        1.0
    }
}

/// Multiplies every sample by `gain`.
pub fn scale(samples: &mut [f64], gain: f64) {
    for sample in samples.iter_mut() {
        *sample *= gain;
    }
}
