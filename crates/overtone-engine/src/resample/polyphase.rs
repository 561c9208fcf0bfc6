//! Polyphase interpolation and strided decimation.

use super::convolve::convolve_strided;
use super::BoundaryPolicy;
use crate::transform::PolyphaseKernel;

/// Raises the rate of `x` by `kernel.factor`.
///
/// Output sample `j` sits at input position `j / factor`; the kernel's group
/// delay is removed so the result is time-aligned with the input.
pub fn upsample(x: &[f64], kernel: &PolyphaseKernel, policy: BoundaryPolicy) -> Vec<f64> {
    let factor = kernel.factor;
    if factor <= 1 {
        return x.to_vec();
    }
    let n = x.len() as isize;
    let phase_len = kernel.phase_len() as isize;

    (0..x.len() * factor)
        .map(|j| {
            let t = j + kernel.center;
            let phase = &kernel.phases[t % factor];
            let q = (t / factor) as isize;
            if q - phase_len + 1 >= 0 && q < n {
                phase
                    .iter()
                    .enumerate()
                    .map(|(k, &h)| h * x[(q - k as isize) as usize])
                    .sum()
            } else {
                phase
                    .iter()
                    .enumerate()
                    .map(|(k, &h)| h * policy.sample(x, q - k as isize))
                    .sum()
            }
        })
        .collect()
}

/// Low-pass filters `x` with `kernel` and keeps every `factor`-th sample.
///
/// Returns `ceil(len / factor)` samples.
pub fn downsample(x: &[f64], kernel: &[f64], factor: usize, policy: BoundaryPolicy) -> Vec<f64> {
    if factor <= 1 {
        return x.to_vec();
    }
    let center = (kernel.len().saturating_sub(1) / 2) as isize;
    let out_len = x.len().div_ceil(factor);
    convolve_strided(x, kernel, factor, center, out_len, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{design_kaiser_sinc, polyphase_decompose};
    use std::f64::consts::TAU;

    fn kernel_for(factor: usize) -> Vec<f64> {
        let t = 0.2;
        design_kaiser_sinc((1.0 - t / 2.0) * 0.5 / factor as f64, 100.0, t * 0.5 / factor as f64)
    }

    #[test]
    fn test_dc_roundtrip() {
        for factor in [2, 3, 4, 8] {
            let kernel = kernel_for(factor);
            let poly = polyphase_decompose(&kernel, factor);
            let x = vec![0.6; 64];

            let up = upsample(&x, &poly, BoundaryPolicy::Cyclic);
            assert_eq!(up.len(), 64 * factor);
            for v in &up {
                assert!((v - 0.6).abs() < 1e-4, "factor {} up {}", factor, v);
            }
            let down = downsample(&up, &kernel, factor, BoundaryPolicy::Cyclic);
            assert_eq!(down.len(), 64);
            for v in &down {
                assert!((v - 0.6).abs() < 1e-4, "factor {} down {}", factor, v);
            }
        }
    }

    #[test]
    fn test_sine_roundtrip_keeps_amplitude_and_phase() {
        let factor = 4;
        let kernel = kernel_for(factor);
        let poly = polyphase_decompose(&kernel, factor);
        let n = 256;
        let x: Vec<f64> = (0..n).map(|i| (TAU * 13.0 * i as f64 / n as f64 + 0.3).sin()).collect();

        let up = upsample(&x, &poly, BoundaryPolicy::Cyclic);
        // the interpolated signal passes through the original samples
        for i in 0..n {
            assert!((up[i * factor] - x[i]).abs() < 1e-4);
        }
        let down = downsample(&up, &kernel, factor, BoundaryPolicy::Cyclic);
        for (a, b) in x.iter().zip(&down) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_zero_padded_lengths() {
        let factor = 3;
        let kernel = kernel_for(factor);
        let poly = polyphase_decompose(&kernel, factor);
        let x = vec![1.0; 10];
        let up = upsample(&x, &poly, BoundaryPolicy::ZeroPadded);
        assert_eq!(up.len(), 30);
        assert_eq!(downsample(&up[..29], &kernel, factor, BoundaryPolicy::ZeroPadded).len(), 10);
    }

    #[test]
    fn test_factor_one_is_identity() {
        let poly = polyphase_decompose(&[1.0], 1);
        let x = vec![0.1, 0.2];
        assert_eq!(upsample(&x, &poly, BoundaryPolicy::ZeroPadded), x);
        assert_eq!(downsample(&x, &[1.0], 1, BoundaryPolicy::ZeroPadded), x);
    }
}
