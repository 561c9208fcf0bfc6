//! Sampling and reconstruction clock jitter.
//!
//! The ADC side re-reads the signal at `k + e_adc[k]` with a 3-point
//! Lagrange interpolator. The DAC side treats those readings as emitted at
//! `k + e_dac[k]` and rebuilds the waveform on a uniform 3x grid with a
//! 4-point Lagrange interpolator through the jittered instants. The grid is
//! then decimated back to the base rate.

use std::f64::consts::TAU;

use overtone_patch::Patch;
use tracing::debug;

use crate::resample::{downsample, BoundaryPolicy};
use crate::rng::{jitter_seed, NoiseSource};

/// Grid density of the reconstruction stage.
pub const JITTER_OVERSAMPLE: usize = 3;

/// Largest clock offset, in samples.
pub const MAX_OFFSET: f64 = 0.45;

/// Clock jitter amounts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitterParams {
    /// RMS sampling-clock jitter in nanoseconds.
    pub adc_ns: f64,
    /// RMS reconstruction-clock jitter in nanoseconds.
    pub dac_ns: f64,
    /// Peak sinusoidal reconstruction-clock jitter in nanoseconds.
    pub periodic_ns: f64,
    /// Frequency of the sinusoidal component in Hz.
    pub periodic_hz: f64,
}

impl JitterParams {
    /// Jitter settings of a patch.
    pub fn from_patch(patch: &Patch) -> Self {
        Self {
            adc_ns: patch.jitter_adc_ns.max(0.0),
            dac_ns: patch.jitter_dac_ns.max(0.0),
            periodic_ns: patch.jitter_periodic_ns.max(0.0),
            periodic_hz: patch.jitter_periodic_hz,
        }
    }

    /// Whether any component is non-zero.
    pub fn is_active(&self) -> bool {
        self.adc_ns > 0.0 || self.dac_ns > 0.0 || self.periodic_ns > 0.0
    }

    /// Per-sample clock offsets `(adc, dac)` in samples.
    fn offsets(
        &self,
        len: usize,
        sample_rate: f64,
        noise: &mut NoiseSource,
    ) -> (Vec<f64>, Vec<f64>) {
        let to_samples = 1e-9 * sample_rate;
        let adc_sigma = self.adc_ns * to_samples;
        let dac_sigma = self.dac_ns * to_samples;
        let periodic = self.periodic_ns * to_samples;
        let periodic_step = TAU * self.periodic_hz / sample_rate;

        (0..len)
            .map(|k| {
                let adc = adc_sigma * noise.gaussian();
                let dac =
                    dac_sigma * noise.gaussian() + periodic * (periodic_step * k as f64).sin();
                (
                    adc.clamp(-MAX_OFFSET, MAX_OFFSET),
                    dac.clamp(-MAX_OFFSET, MAX_OFFSET),
                )
            })
            .unzip()
    }
}

/// 3-point Lagrange through `x[k-1], x[k], x[k+1]` evaluated at `k + t`.
#[inline]
fn lagrange3(prev: f64, here: f64, next: f64, t: f64) -> f64 {
    prev * t * (t - 1.0) / 2.0 + here * (1.0 - t * t) + next * t * (t + 1.0) / 2.0
}

/// 4-point Lagrange through `(nodes[j], values[j])` evaluated at `p`.
#[inline]
fn lagrange4(nodes: &[f64; 4], values: &[f64; 4], p: f64) -> f64 {
    let mut sum = 0.0;
    for j in 0..4 {
        let mut basis = 1.0;
        for i in 0..4 {
            if i != j {
                basis *= (p - nodes[i]) / (nodes[j] - nodes[i]);
            }
        }
        sum += values[j] * basis;
    }
    sum
}

/// Applies ADC and DAC clock jitter to one channel.
///
/// The noise stream is seeded from `seed` alone so every channel of a render
/// sees the same clock. `decimation_kernel` is the low-pass used to return
/// from the 3x grid.
///
/// # Arguments
/// * `params` - ADC, DAC and periodic jitter amounts
/// * `samples` - Input channel
/// * `sample_rate` - Audio sample rate
/// * `seed` - The patch's base seed
/// * `policy` - Edge handling of the interpolation stencils and decimator
/// * `decimation_kernel` - Low-pass kernel at the 3x rate
///
/// # Returns
/// The jittered channel, same length as `samples`
pub fn apply_jitter(
    params: &JitterParams,
    samples: &[f64],
    sample_rate: f64,
    seed: u32,
    policy: BoundaryPolicy,
    decimation_kernel: &[f64],
) -> Vec<f64> {
    if !params.is_active() || samples.is_empty() {
        return samples.to_vec();
    }
    let n = samples.len();
    let mut noise = NoiseSource::new(jitter_seed(seed));
    let (adc, dac) = params.offsets(n, sample_rate, &mut noise);

    let sampled: Vec<f64> = (0..n)
        .map(|k| {
            let k = k as isize;
            lagrange3(
                policy.sample(samples, k - 1),
                policy.sample(samples, k),
                policy.sample(samples, k + 1),
                adc[k as usize],
            )
        })
        .collect();

    // outside a zero-padded buffer the clock is ideal and the output silent
    let node = |j: isize| -> (f64, f64) {
        let offset = match policy {
            BoundaryPolicy::Cyclic => dac[j.rem_euclid(n as isize) as usize],
            BoundaryPolicy::ZeroPadded => {
                if (0..n as isize).contains(&j) {
                    dac[j as usize]
                } else {
                    0.0
                }
            }
        };
        (j as f64 + offset, policy.sample(&sampled, j))
    };

    let grid: Vec<f64> = (0..n * JITTER_OVERSAMPLE)
        .map(|m| {
            let p = m as f64 / JITTER_OVERSAMPLE as f64;
            let k = (m / JITTER_OVERSAMPLE) as isize;
            let mut nodes = [0.0; 4];
            let mut values = [0.0; 4];
            for (i, j) in (k - 1..=k + 2).enumerate() {
                let (t, v) = node(j);
                nodes[i] = t;
                values[i] = v;
            }
            lagrange4(&nodes, &values, p)
        })
        .collect();

    debug!(len = n, ?params, "applied clock jitter");
    downsample(&grid, decimation_kernel, JITTER_OVERSAMPLE, policy)
}
