//! Windowed-sinc kernel design and polyphase decomposition.

use tracing::warn;

use super::fft::FftCache;
use super::window::{blackman_harris, kaiser};
use crate::error::EngineResult;

/// Longest kernel the Kaiser designer will produce.
pub const MAX_KERNEL_TAPS: usize = 16_385;

/// Kernel length and window shape meeting a stop-band/transition target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KaiserDesign {
    /// Odd number of taps.
    pub taps: usize,
    /// Kaiser shape parameter (`beta / π`).
    pub alpha: f64,
}

/// Applies Kaiser's empirical formulas.
///
/// `stop_db` is the stop-band attenuation in dB and `transition` the
/// transition width in cycles per sample.
pub fn kaiser_design(stop_db: f64, transition: f64) -> KaiserDesign {
    let a = stop_db.max(0.0);
    let beta = if a > 50.0 {
        0.1102 * (a - 8.7)
    } else if a >= 21.0 {
        0.5842 * (a - 21.0).powf(0.4) + 0.07886 * (a - 21.0)
    } else {
        0.0
    };

    let width = transition.max(1e-9);
    let estimate = ((a - 8.0) / (2.285 * std::f64::consts::TAU * width)).ceil().max(0.0) + 1.0;
    let mut taps = if estimate > MAX_KERNEL_TAPS as f64 {
        warn!(
            requested = estimate,
            cap = MAX_KERNEL_TAPS,
            "kernel length capped"
        );
        MAX_KERNEL_TAPS
    } else {
        estimate as usize
    };
    if taps % 2 == 0 {
        taps += 1;
    }
    let taps = taps.clamp(3, MAX_KERNEL_TAPS);

    KaiserDesign {
        taps,
        alpha: beta / std::f64::consts::PI,
    }
}

fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        let px = std::f64::consts::PI * x;
        px.sin() / px
    }
}

/// Low-pass `h[n] = 2fc·sinc(2fc(n-c))·w[n]`, normalized to unity DC gain.
fn windowed_sinc(cutoff: f64, window: Vec<f64>) -> Vec<f64> {
    let center = (window.len() as f64 - 1.0) / 2.0;
    let mut kernel: Vec<f64> = window
        .into_iter()
        .enumerate()
        .map(|(n, w)| 2.0 * cutoff * sinc(2.0 * cutoff * (n as f64 - center)) * w)
        .collect();
    let sum: f64 = kernel.iter().sum();
    if sum.abs() > f64::EPSILON {
        for tap in &mut kernel {
            *tap /= sum;
        }
    }
    kernel
}

/// Kaiser-windowed sinc low-pass with `cutoff` in cycles per sample.
pub fn kaiser_sinc_kernel(cutoff: f64, taps: usize, alpha: f64) -> Vec<f64> {
    windowed_sinc(cutoff, kaiser(taps, alpha))
}

/// Kaiser-windowed sinc low-pass sized for a stop-band depth and transition width.
pub fn design_kaiser_sinc(cutoff: f64, stop_db: f64, transition: f64) -> Vec<f64> {
    let design = kaiser_design(stop_db, transition);
    kaiser_sinc_kernel(cutoff, design.taps, design.alpha)
}

/// Blackman-Harris-windowed sinc low-pass with `cutoff` in cycles per sample.
pub fn blackman_harris_sinc(cutoff: f64, taps: usize) -> Vec<f64> {
    windowed_sinc(cutoff, blackman_harris(taps))
}

/// A kernel split into interleaved sub-filters for upsampling.
///
/// Each phase is scaled by the factor so zero-stuffed input keeps its level.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyphaseKernel {
    /// Upsampling factor, equal to the number of phases.
    pub factor: usize,
    /// `phases[r][k] = factor · padded[k·factor + r]`.
    pub phases: Vec<Vec<f64>>,
    /// Zeros prepended so the kernel length is a multiple of the factor.
    pub pad: usize,
    /// Kernel center in padded coordinates.
    pub center: usize,
}

impl PolyphaseKernel {
    /// Taps per phase.
    pub fn phase_len(&self) -> usize {
        self.phases.first().map_or(0, Vec::len)
    }

    /// Rebuilds the source kernel by interleaving the phases.
    pub fn reconstruct(&self) -> Vec<f64> {
        let len = self.phase_len() * self.factor;
        let scale = self.factor as f64;
        (self.pad..len)
            .map(|i| self.phases[i % self.factor][i / self.factor] / scale)
            .collect()
    }
}

/// Splits an odd-length symmetric kernel into `factor` sub-filters.
pub fn polyphase_decompose(kernel: &[f64], factor: usize) -> PolyphaseKernel {
    let factor = factor.max(1);
    let pad = (factor - kernel.len() % factor) % factor;
    let padded_len = kernel.len() + pad;
    let scale = factor as f64;

    let phases = (0..factor)
        .map(|r| {
            (r..padded_len)
                .step_by(factor)
                .map(|i| if i < pad { 0.0 } else { kernel[i - pad] * scale })
                .collect()
        })
        .collect();

    PolyphaseKernel {
        factor,
        phases,
        pad,
        center: kernel.len().saturating_sub(1) / 2 + pad,
    }
}

/// Turns a zero-phase magnitude response into a windowed linear-phase FIR.
///
/// `magnitude` samples the response at bins `0..N/2` of an `N`-point grid.
/// The result has `N - 1` taps centered on tap `N/2 - 1`.
///
/// # Errors
/// Returns an error when `2 · magnitude.len()` is not a supported FFT length.
pub fn linear_phase_kernel(fft: &FftCache, magnitude: &[f64]) -> EngineResult<Vec<f64>> {
    let n = magnitude.len() * 2;
    let cos: Vec<f64> = magnitude
        .iter()
        .enumerate()
        .map(|(k, &m)| if k == 0 { m / n as f64 } else { 2.0 * m / n as f64 })
        .collect();
    let sin = vec![0.0; cos.len()];
    let impulse = fft.inverse(&cos, &sin)?;

    let window = blackman_harris(n - 1);
    Ok((1..n)
        .map(|i| impulse[(i + n / 2) % n])
        .zip(window)
        .map(|(h, w)| h * w)
        .collect())
}
