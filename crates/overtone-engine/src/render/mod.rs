//! Full-patch renders and the analyses built on them.
//!
//! - [`Engine::render`] - one or two channels through synthesis and the nonlinear chain
//! - [`Engine::null_test`] - normalized A/B difference
//! - [`Engine::preview`] / [`Engine::detailed_preview`] - steady-state waveforms and spectra
//! - [`Engine::thd_percent`] / [`Engine::thd_graph`] - harmonic distortion
//! - [`Engine::digital_preview`] - dither linearity, dynamic range and jitter sweeps

mod digital;
mod measure;
mod preview;


pub use digital::{DigitalPreview, JitterCurve, ProbeCurve, LINEARITY_STEPS, PROBE_TONES};
pub use measure::{ThdGraph, THD_GRAPH_POINTS};
pub use null_test::{NullTestOptions, NullTestResult, NullTestSide, NULL_TEST_HEADROOM_DB};
pub use preview::{
    DetailedPreview, FilterPreview, FilterSubject, Preview, LONG_PREVIEW_LEN, PREVIEW_LEN,
};

use overtone_patch::Patch;
use tracing::debug;

use crate::effects::apply_chain;
use crate::engine::Engine;
use crate::error::{check_sample_rate, EngineResult};
use crate::filter::FilterEnvelope;
use crate::level::{peak_channels, scale};
use crate::resample::{BoundaryPolicy, OversamplingReport};
use crate::synthesis::{synthesize_channel, ChannelState, HarmonicTable};

/// Parameters of one render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    /// Output sample rate in Hz.
    pub sample_rate: f64,
    /// Patch of the first (or only) channel.
    pub patch: Patch,
    /// Patch of a second channel.
    pub patch_right: Option<Patch>,
    /// Lead-in applied to every channel; raised when a patch needs more.
    pub max_pre_delay_samples: usize,
}

impl RenderRequest {
    /// Mono request without extra lead-in.
    pub fn mono(sample_rate: f64, patch: Patch) -> Self {
        Self {
            sample_rate,
            patch,
            patch_right: None,
            max_pre_delay_samples: 0,
        }
    }

    /// Stereo request without extra lead-in.
    pub fn stereo(sample_rate: f64, left: Patch, right: Patch) -> Self {
        Self {
            sample_rate,
            patch: left,
            patch_right: Some(right),
            max_pre_delay_samples: 0,
        }
    }

    /// Patches in channel order.
    pub fn channel_patches(&self) -> Vec<&Patch> {
        std::iter::once(&self.patch)
            .chain(self.patch_right.as_ref())
            .collect()
    }
}

/// Equal-length channels at one sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// One or two channels of equal length.
    pub channels: Vec<Vec<f64>>,
}

impl AudioBuffer {
    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Whether the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Largest absolute sample across channels.
    pub fn peak(&self) -> f64 {
        peak_channels(&self.channels)
    }

    /// Multiplies every channel by `gain`.
    pub fn scale(&mut self, gain: f64) {
        for channel in &mut self.channels {
            scale(channel, gain);
        }
    }
}

/// A rendered buffer and the artifacts produced along the way.
#[derive(Debug, Clone)]
pub struct RenderResult {
    /// Rendered audio.
    pub buffer: AudioBuffer,
    /// Amplitude envelope per channel.
    pub envelopes: Vec<Vec<f64>>,
    /// Cutoff trajectory per channel, `None` where the patch does not filter.
    pub filter_envelopes: Vec<Option<FilterEnvelope>>,
    /// Oversampled waveshaping diagnostic per channel.
    pub oversampling_reports: Vec<Option<OversamplingReport>>,
    /// Common lead-in of every channel, in samples.
    pub pre_delay: usize,
    /// Peak magnitude of the buffer.
    pub peak: f64,
}

impl RenderResult {
    /// Oversampling diagnostics joined into one line per channel.
    pub fn oversampling_summary(&self) -> String {
        self.oversampling_reports
            .iter()
            .enumerate()
            .filter_map(|(ch, report)| report.map(|r| format!("channel {ch}: {r}")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Engine {
    /// Renders one or two channels: synthesis, waveshaping, speaker, jitter.
    ///
    /// # Arguments
    /// * `request` - Sample rate, channel patches and minimum lead-in
    ///
    /// # Returns
    /// Equal-length channels with their envelopes, filter sweeps and
    /// oversampling diagnostics
    ///
    /// # Errors
    /// Returns an error for an invalid sample rate or an invalid patch.
    pub fn render(&self, request: &RenderRequest) -> EngineResult<RenderResult> {
        let sample_rate = check_sample_rate(request.sample_rate)?;
        let patches = request.channel_patches();
        for patch in &patches {
            patch.validate()?;
        }

        let tables: Vec<HarmonicTable> = patches
            .iter()
            .map(|p| HarmonicTable::build(p, sample_rate))
            .collect();
        let pre_delay = tables
            .iter()
            .map(ChannelState::required_pre_delay)
            .fold(request.max_pre_delay_samples, usize::max);

        let mut states: Vec<ChannelState> = patches
            .iter()
            .zip(&tables)
            .map(|(p, t)| ChannelState::new(p, sample_rate, t, pre_delay))
            .collect();
        let length = states.iter().map(|s| s.length).max().unwrap_or(0);
        for state in &mut states {
            state.length = length;
        }

        let mut channels = Vec::with_capacity(patches.len());
        let mut envelopes = Vec::with_capacity(patches.len());
        let mut filter_envelopes = Vec::with_capacity(patches.len());
        let mut oversampling_reports = Vec::with_capacity(patches.len());

        for ((patch, table), state) in patches.iter().zip(&tables).zip(&states) {
            let synth = synthesize_channel(patch, sample_rate, table, state);
            let chain = apply_chain(
                patch,
                &synth.samples,
                sample_rate,
                BoundaryPolicy::ZeroPadded,
                self.kernels(),
            );
            channels.push(chain.samples);
            envelopes.push(synth.envelope);
            filter_envelopes.push(synth.filter);
            oversampling_reports.push(chain.oversampling);
        }

        let buffer = AudioBuffer {
            sample_rate,
            channels,
        };
        let peak = buffer.peak();
        debug!(
            channels = buffer.channel_count(),
            length,
            pre_delay,
            peak,
            "rendered patch"
        );

        Ok(RenderResult {
            buffer,
            envelopes,
            filter_envelopes,
            oversampling_reports,
            pre_delay,
            peak,
        })
    }
}
