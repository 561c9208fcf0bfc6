//! Static waveshaping, optionally run at an oversampled rate.

use overtone_patch::Patch;
use tracing::debug;

use crate::resample::{BoundaryPolicy, KernelCache, OversamplingReport};

/// Weighted blend of four waveshaping curves at one drive amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waveshaper {
    amount: f64,
    clip: f64,
    hyperbolic: f64,
    odd: f64,
    tanh: f64,
}

impl Waveshaper {
    /// Creates a shaper from a drive amount in `0..=1` and per-curve weights.
    pub fn new(amount: f64, clip: f64, hyperbolic: f64, odd: f64, tanh: f64) -> Self {
        Self {
            amount: amount.clamp(0.0, 1.0),
            clip,
            hyperbolic,
            odd,
            tanh,
        }
    }

    /// Waveshaping settings of a patch.
    pub fn from_patch(patch: &Patch) -> Self {
        Self::new(
            patch.distortion,
            patch.distortion_clip,
            patch.distortion_hyperbolic,
            patch.distortion_odd,
            patch.distortion_tanh,
        )
    }

    /// Whether shaping changes the signal at all.
    pub fn is_active(&self) -> bool {
        self.amount > 0.0
            && (self.clip > 0.0 || self.hyperbolic > 0.0 || self.odd > 0.0 || self.tanh > 0.0)
    }

    /// `x + Σ w·(curve(x) − x)`.
    #[inline]
    pub fn shape(&self, x: f64) -> f64 {
        let d = self.amount;
        let mut y = x;
        if self.clip > 0.0 {
            let threshold = 1.0 - 0.99 * d;
            y += self.clip * (x.clamp(-threshold, threshold) - x);
        }
        if self.hyperbolic > 0.0 {
            let k = 10.0 * d;
            y += self.hyperbolic * ((1.0 + k) * x / (1.0 + k * x.abs()) - x);
        }
        if self.odd > 0.0 {
            y += self.odd * (-d * x * x * x);
        }
        if self.tanh > 0.0 {
            let k = 5.0 * d;
            if k > 1e-9 {
                y += self.tanh * ((k * x).tanh() / k.tanh() - x);
            }
        }
        y
    }

    /// Shapes every sample in place.
    pub fn apply(&self, samples: &mut [f64]) {
        for sample in samples.iter_mut() {
            *sample = self.shape(*sample);
        }
    }
}

/// Applies the patch's waveshaping, oversampled when the patch asks for it.
///
/// Returns the processed samples and, when oversampling ran, its diagnostic.
/// A patch without active waveshaping is returned unchanged.
///
/// # Arguments
/// * `patch` - Waveshaping and oversampling settings
/// * `samples` - Input channel
/// * `sample_rate` - Audio sample rate
/// * `policy` - Edge handling of the resampling filters
/// * `kernels` - Shared oversampler cache
pub fn distort(
    patch: &Patch,
    samples: &[f64],
    sample_rate: f64,
    policy: BoundaryPolicy,
    kernels: &KernelCache,
) -> (Vec<f64>, Option<OversamplingReport>) {
    let shaper = Waveshaper::from_patch(patch);
    if !shaper.is_active() {
        return (samples.to_vec(), None);
    }

    let factor = patch.oversample_factor();
    if factor == 1 {
        let mut out = samples.to_vec();
        shaper.apply(&mut out);
        return (out, None);
    }

    let oversampler =
        kernels.oversampler(factor, patch.oversample_stop_db, patch.oversample_transition);
    let report = oversampler.report(sample_rate);
    debug!(%report, len = samples.len(), "oversampled waveshaping");
    let out = oversampler.process(samples, policy, |raised| shaper.apply(raised));
    (out, Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn only(clip: f64, hyperbolic: f64, odd: f64, tanh: f64, amount: f64) -> Waveshaper {
        Waveshaper::new(amount, clip, hyperbolic, odd, tanh)
    }

    #[test]
    fn test_curves() {
        assert!((only(1.0, 0.0, 0.0, 0.0, 0.5).shape(0.9) - 0.505).abs() < 1e-12);
        let k = 10.0 * 0.3;
        let expected = -(1.0 + k) * 0.5 / (1.0 + k * 0.5);
        assert!((only(0.0, 1.0, 0.0, 0.0, 0.3).shape(-0.5) - expected).abs() < 1e-12);
        assert!((only(0.0, 0.0, 1.0, 0.0, 0.2).shape(0.5) - (0.5 - 0.2 * 0.125)).abs() < 1e-12);
        assert!((only(0.0, 0.0, 0.0, 1.0, 1.0).shape(1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_weights_blend_linearly() {
        let half = only(0.0, 0.0, 0.5, 0.0, 0.4);
        let full = only(0.0, 0.0, 1.0, 0.0, 0.4);
        let x = 0.7;
        assert!((half.shape(x) - (x + full.shape(x)) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_amount_is_inactive() {
        let patch = Patch::default();
        assert!(!Waveshaper::from_patch(&patch).is_active());
        let samples = vec![0.3, -0.9];
        let kernels = KernelCache::new();
        let (out, report) =
            distort(&patch, &samples, 48_000.0, BoundaryPolicy::ZeroPadded, &kernels);
        assert_eq!(out, samples);
        assert!(report.is_none());
    }

    #[test]
    fn test_oversampled_distortion_reports() {
        let patch = Patch {
            distortion: 0.5,
            oversample_times: 2,
            ..Patch::default()
        };
        let n = 1024;
        let samples: Vec<f64> = (0..n).map(|i| (TAU * 3.0 * i as f64 / n as f64).sin()).collect();
        let kernels = KernelCache::new();
        let (out, report) = distort(&patch, &samples, 48_000.0, BoundaryPolicy::Cyclic, &kernels);
        assert_eq!(out.len(), n);
        let report = report.unwrap();
        assert_eq!(report.factor, 3);
        // tanh saturation keeps the peak near full scale
        let peak = out.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        assert!((peak - 1.0).abs() < 0.01);
    }
}
