//! Convolution and sample-rate conversion.
//!
//! Every primitive takes a [`BoundaryPolicy`] that decides what lies outside
//! the buffer: the buffer repeated (single-cycle previews) or silence
//! (one-shot renders).

pub mod convolve;
pub mod oversample;
pub mod polyphase;

pub use convolve::{convolve, convolve_strided};
pub use oversample::{KernelCache, Oversampler, OversamplingReport, JITTER_KERNEL_TAPS};
pub use polyphase::{downsample, upsample};

/// How samples outside `0..len` are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryPolicy {
    /// The buffer is one period of a periodic signal.
    Cyclic,
    /// The buffer is surrounded by zeros.
    ZeroPadded,
}

impl BoundaryPolicy {
    /// Reads `x[idx]` under this policy.
    #[inline]
    pub fn sample(self, x: &[f64], idx: isize) -> f64 {
        if x.is_empty() {
            return 0.0;
        }
        match self {
            BoundaryPolicy::Cyclic => x[idx.rem_euclid(x.len() as isize) as usize],
            BoundaryPolicy::ZeroPadded => {
                if idx >= 0 && (idx as usize) < x.len() {
                    x[idx as usize]
                } else {
                    0.0
                }
            }
        }
    }
}
