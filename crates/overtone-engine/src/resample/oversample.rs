//! Band-limited oversampling around nonlinear stages, and the kernel cache.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

use tracing::debug;

use super::polyphase::{downsample, upsample};
use super::BoundaryPolicy;
use crate::transform::{
    blackman_harris_sinc, kaiser_design, kaiser_sinc_kernel, polyphase_decompose,
    PolyphaseKernel,
};

/// Taps of the fixed decimation kernel used by the jitter stage.
pub const JITTER_KERNEL_TAPS: usize = 97;

/// Diagnostic describing the filter used by one oversampled stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OversamplingReport {
    /// Oversampling factor.
    pub factor: usize,
    /// Kernel length in taps at the raised rate.
    pub taps: usize,
    /// Designed stop-band attenuation in dB.
    pub stop_db: f64,
    /// Upper edge of the flat pass band in Hz.
    pub passband_hz: f64,
    /// Nyquist frequency at the raised rate in Hz.
    pub nyquist_hz: f64,
}

impl fmt::Display for OversamplingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x oversampling: {} taps, {:.0} dB stop band, flat to {:.0} Hz, internal Nyquist {:.0} Hz",
            self.factor, self.taps, self.stop_db, self.passband_hz, self.nyquist_hz
        )
    }
}

/// Interpolation/decimation filter pair for one factor and design target.
#[derive(Debug, Clone)]
pub struct Oversampler {
    factor: usize,
    stop_db: f64,
    transition: f64,
    kernel: Vec<f64>,
    polyphase: PolyphaseKernel,
}

impl Oversampler {
    /// Designs the kernel for `factor` with the stop edge at the base-rate Nyquist.
    ///
    /// `transition` is the transition width as a fraction of the base-rate Nyquist.
    pub fn new(factor: usize, stop_db: f64, transition: f64) -> Self {
        let factor = factor.max(1);
        let transition = transition.clamp(0.001, 1.0);
        let (kernel, polyphase) = if factor == 1 {
            (vec![1.0], polyphase_decompose(&[1.0], 1))
        } else {
            let base_nyquist = 0.5 / factor as f64;
            let cutoff = (1.0 - transition / 2.0) * base_nyquist;
            let design = kaiser_design(stop_db, transition * base_nyquist);
            let kernel = kaiser_sinc_kernel(cutoff, design.taps, design.alpha);
            let polyphase = polyphase_decompose(&kernel, factor);
            (kernel, polyphase)
        };
        debug!(factor, taps = kernel.len(), stop_db, transition, "designed oversampling kernel");
        Self {
            factor,
            stop_db,
            transition,
            kernel,
            polyphase,
        }
    }

    /// Oversampling factor.
    pub fn factor(&self) -> usize {
        self.factor
    }

    /// Full-length low-pass kernel at the raised rate.
    pub fn kernel(&self) -> &[f64] {
        &self.kernel
    }

    /// Raises the rate of `x` by the factor.
    pub fn upsample(&self, x: &[f64], policy: BoundaryPolicy) -> Vec<f64> {
        upsample(x, &self.polyphase, policy)
    }

    /// Returns `x` to the base rate.
    pub fn downsample(&self, x: &[f64], policy: BoundaryPolicy) -> Vec<f64> {
        downsample(x, &self.kernel, self.factor, policy)
    }

    /// Runs `stage` at the raised rate.
    pub fn process<F>(&self, x: &[f64], policy: BoundaryPolicy, mut stage: F) -> Vec<f64>
    where
        F: FnMut(&mut [f64]),
    {
        if self.factor == 1 {
            let mut out = x.to_vec();
            stage(&mut out);
            return out;
        }
        let mut raised = self.upsample(x, policy);
        stage(&mut raised);
        let mut out = self.downsample(&raised, policy);
        out.truncate(x.len());
        out
    }

    /// Diagnostic for a base sample rate.
    pub fn report(&self, sample_rate: f64) -> OversamplingReport {
        OversamplingReport {
            factor: self.factor,
            taps: self.kernel.len(),
            stop_db: self.stop_db,
            passband_hz: (1.0 - self.transition) * sample_rate / 2.0,
            nyquist_hz: sample_rate * self.factor as f64 / 2.0,
        }
    }
}

type OversamplerKey = (usize, u64, u64);

/// Lazily built resampling kernels shared between renders.
///
/// Concurrent first use of a key may design the kernel twice; the first
/// inserted copy is kept.
#[derive(Debug, Default)]
pub struct KernelCache {
    oversamplers: RwLock<HashMap<OversamplerKey, Arc<Oversampler>>>,
    jitter: OnceLock<Arc<Vec<f64>>>,
}

impl KernelCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the oversampler for a factor and design target.
    pub fn oversampler(&self, factor: usize, stop_db: f64, transition: f64) -> Arc<Oversampler> {
        let key = (factor, stop_db.to_bits(), transition.to_bits());
        {
            let map = self.oversamplers.read().unwrap_or_else(|e| e.into_inner());
            if let Some(os) = map.get(&key) {
                return Arc::clone(os);
            }
        }
        let built = Arc::new(Oversampler::new(factor, stop_db, transition));
        let mut map = self.oversamplers.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(map.entry(key).or_insert(built))
    }

    /// Decimation kernel from the jitter stage's 3x grid back to the base rate.
    pub fn jitter_kernel(&self) -> Arc<Vec<f64>> {
        Arc::clone(
            self.jitter
                .get_or_init(|| Arc::new(blackman_harris_sinc(1.0 / 6.0, JITTER_KERNEL_TAPS))),
        )
    }

    /// Number of distinct oversamplers built so far.
    pub fn cached_oversamplers(&self) -> usize {
        self.oversamplers.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}
