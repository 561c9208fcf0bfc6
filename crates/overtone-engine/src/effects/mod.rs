//! Post-synthesis stages.
//!
//! The nonlinear chain runs in a fixed order: waveshaping, speaker model,
//! clock jitter. Requantization is applied later, after the orchestration
//! layer has scaled the buffers.

pub mod distortion;
pub mod dither;
pub mod jitter;
pub mod speaker;

pub use distortion::{distort, Waveshaper};
pub use dither::{draw_dither, requantize, DitherParams, Quantizer};
pub use jitter::{apply_jitter, JitterParams, JITTER_OVERSAMPLE};
pub use speaker::SpeakerModel;

use overtone_patch::Patch;

use crate::resample::{BoundaryPolicy, KernelCache, OversamplingReport};

/// Output of the nonlinear chain for one channel.
#[derive(Debug, Clone)]
pub struct ChainOutput {
    /// Processed samples.
    pub samples: Vec<f64>,
    /// Diagnostic of the oversampled waveshaper, if it ran.
    pub oversampling: Option<OversamplingReport>,
}

/// Runs waveshaping, the speaker model and clock jitter over one channel.
pub fn apply_chain(
    patch: &Patch,
    samples: &[f64],
    sample_rate: f64,
    policy: BoundaryPolicy,
    kernels: &KernelCache,
) -> ChainOutput {
    let (shaped, oversampling) = distort(patch, samples, sample_rate, policy, kernels);
    let speaker = SpeakerModel::from_patch(patch).process(&shaped, sample_rate, policy);

    let jitter = JitterParams::from_patch(patch);
    let samples = if jitter.is_active() {
        apply_jitter(
            &jitter,
            &speaker,
            sample_rate,
            patch.seed,
            policy,
            &kernels.jitter_kernel(),
        )
    } else {
        speaker
    };

    ChainOutput {
        samples,
        oversampling,
    }
}
