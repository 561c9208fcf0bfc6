//! Steady-state previews.
//!
//! A preview renders the periodic part of a patch with no envelope: every
//! delay is folded into phase and buffers wrap cyclically. The single-cycle
//! preview runs at a virtual sample rate of `frequency · PREVIEW_LEN`, so
//! harmonic `n` lands exactly in FFT bin `n`.

use std::f64::consts::{PI, TAU};

use overtone_patch::Patch;
use tracing::debug;

use crate::effects::{distort, SpeakerModel};
use crate::engine::Engine;
use crate::error::{check_sample_rate, EngineError, EngineResult};
use crate::filter::FilterEnvelope;
use crate::level::ZERO_LEVEL;
use crate::resample::{BoundaryPolicy, OversamplingReport};
use crate::synthesis::{add_partial, inharmonic_partials, HarmonicTable, Partial};
use crate::transform::{linear_phase_kernel, FftResult};

/// Samples in one cycle of the single-cycle preview.
pub const PREVIEW_LEN: usize = 1024;

/// Samples in the detailed preview.
pub const LONG_PREVIEW_LEN: usize = 65_536;

/// Which point of the filter sweep a preview is filtered at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterSubject {
    /// Unfiltered.
    #[default]
    Off,
    /// Cutoff at the start of the sweep.
    Start,
    /// Cutoff at the peak of the sweep.
    Peak,
    /// Cutoff at the end of the sweep.
    End,
}

impl FilterSubject {
    /// Cutoff this subject selects, `None` for [`FilterSubject::Off`].
    pub fn cutoff_hz(self, patch: &Patch) -> Option<f64> {
        match self {
            FilterSubject::Off => None,
            FilterSubject::Start => Some(patch.filter_start_hz),
            FilterSubject::Peak => Some(patch.filter_peak_hz),
            FilterSubject::End => Some(patch.filter_end_hz),
        }
    }
}

impl TryFrom<u8> for FilterSubject {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FilterSubject::Off),
            1 => Ok(FilterSubject::Start),
            2 => Ok(FilterSubject::Peak),
            3 => Ok(FilterSubject::End),
            other => Err(EngineError::invalid_param(
                "filter_subject",
                format!("{} is not one of 0 (off), 1 (start), 2 (peak), 3 (end)", other),
            )),
        }
    }
}

/// Fixed-cutoff filter shown with a preview.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPreview {
    /// Cutoff in Hz.
    pub cutoff_hz: f64,
    /// Magnitude per preview bin, bin `k` at `k · frequency` Hz.
    pub magnitude: Vec<f64>,
    /// Linear-phase FIR with the same magnitude response.
    pub kernel: Vec<f64>,
}

/// One cycle of a patch, before and after distortion.
#[derive(Debug, Clone)]
pub struct Preview {
    /// Virtual sample rate, `frequency · PREVIEW_LEN`.
    pub sample_rate: f64,
    /// Clean cycle.
    pub samples: Vec<f64>,
    /// Level per harmonic number, index 0 is DC.
    pub magnitude: Vec<f64>,
    /// Sine phase per harmonic number in radians.
    pub phase: Vec<f64>,
    /// Filter at the requested subject, when the patch filters.
    pub filter: Option<FilterPreview>,
    /// Cycle after waveshaping and the speaker model.
    pub distorted_samples: Vec<f64>,
    /// Spectrum of the distorted cycle.
    pub fft: FftResult,
    /// Oversampled waveshaping diagnostic, if it ran.
    pub oversampling: Option<OversamplingReport>,
}

/// A long periodic render including inharmonic partials.
#[derive(Debug, Clone)]
pub struct DetailedPreview {
    /// Sample rate nudged so the buffer holds a whole number of cycles.
    pub sample_rate: f64,
    /// Fundamental cycles in the buffer.
    pub cycles: usize,
    /// Distorted samples.
    pub samples: Vec<f64>,
    /// Spectrum of `samples`.
    pub fft: FftResult,
}

fn wrap_phase(phase: f64) -> f64 {
    (phase + PI).rem_euclid(TAU) - PI
}

impl Engine {
    /// Renders one steady-state cycle of `patch` and its spectrum.
    ///
    /// Harmonics are limited by the patch's alias limit at `sample_rate` and by
    /// the preview's own Nyquist bin.
    pub fn preview(
        &self,
        patch: &Patch,
        filter_subject: FilterSubject,
        sample_rate: f64,
    ) -> EngineResult<Preview> {
        let sample_rate = check_sample_rate(sample_rate)?;
        patch.validate()?;

        let bins = PREVIEW_LEN / 2;
        let virtual_rate = patch.frequency * PREVIEW_LEN as f64;
        let count = HarmonicTable::build(patch, sample_rate).len().min(bins - 1);
        let table = HarmonicTable::build_limited(patch, virtual_rate, count).phase_shifted();

        let filter = self.preview_filter(patch, filter_subject, virtual_rate, bins)?;
        let filter_envelope = filter
            .as_ref()
            .map(|f| FilterEnvelope::constant(f.cutoff_hz, patch.filter_slope, virtual_rate, 1));

        let mut magnitude = vec![0.0; bins];
        let mut phase = vec![0.0; bins];
        for (n, partial) in table.numbered() {
            let gain = filter_envelope
                .as_ref()
                .map_or(1.0, |f| f.gain(partial.omega, 0));
            let level = partial.level * gain;
            if level.abs() < ZERO_LEVEL {
                continue;
            }
            magnitude[n] = level.abs();
            phase[n] = if level < 0.0 {
                wrap_phase(partial.phase + PI)
            } else {
                wrap_phase(partial.phase)
            };
        }

        let samples = render_periodic(&table.partials, PREVIEW_LEN, filter_envelope.as_ref());
        let (distorted_samples, oversampling) =
            self.distort_periodic(patch, &samples, virtual_rate);
        let fft = self.fft().forward(&distorted_samples)?;
        debug!(harmonics = table.len(), virtual_rate, "single-cycle preview");

        Ok(Preview {
            sample_rate: virtual_rate,
            samples,
            magnitude,
            phase,
            filter,
            distorted_samples,
            fft,
            oversampling,
        })
    }

    /// Renders [`LONG_PREVIEW_LEN`] periodic samples including inharmonic partials.
    ///
    /// The sample rate is nudged so the buffer holds a whole number of
    /// fundamental cycles; inharmonic partials are not bin-aligned.
    pub fn detailed_preview(
        &self,
        patch: &Patch,
        filter_subject: FilterSubject,
        sample_rate: f64,
    ) -> EngineResult<DetailedPreview> {
        let sample_rate = check_sample_rate(sample_rate)?;
        patch.validate()?;

        let cycles = ((LONG_PREVIEW_LEN as f64 * patch.frequency / sample_rate).round() as usize)
            .max(1);
        let nudged_rate = LONG_PREVIEW_LEN as f64 * patch.frequency / cycles as f64;
        let max_number = (LONG_PREVIEW_LEN / 2 - 1) / cycles;
        let table = HarmonicTable::build_limited(patch, nudged_rate, max_number).phase_shifted();

        let filter_envelope = match filter_subject.cutoff_hz(patch) {
            Some(cutoff) if patch.filter_enabled() => Some(FilterEnvelope::constant(
                cutoff,
                patch.filter_slope,
                nudged_rate,
                1,
            )),
            _ => None,
        };

        let mut partials = table.partials;
        partials.extend(inharmonic_partials(patch, nudged_rate));
        let samples = render_periodic(&partials, LONG_PREVIEW_LEN, filter_envelope.as_ref());
        let (samples, _) = self.distort_periodic(patch, &samples, nudged_rate);
        let fft = self.fft().forward(&samples)?;
        debug!(cycles, nudged_rate, partials = partials.len(), "detailed preview");

        Ok(DetailedPreview {
            sample_rate: nudged_rate,
            cycles,
            samples,
            fft,
        })
    }

    fn preview_filter(
        &self,
        patch: &Patch,
        subject: FilterSubject,
        virtual_rate: f64,
        bins: usize,
    ) -> EngineResult<Option<FilterPreview>> {
        let cutoff_hz = match subject.cutoff_hz(patch) {
            Some(cutoff) if patch.filter_enabled() => cutoff,
            _ => return Ok(None),
        };
        let envelope = FilterEnvelope::constant(cutoff_hz, patch.filter_slope, virtual_rate, 1);
        let magnitude = envelope.magnitude_response(0, bins);
        let kernel = linear_phase_kernel(self.fft(), &magnitude)?;
        Ok(Some(FilterPreview {
            cutoff_hz,
            magnitude,
            kernel,
        }))
    }

    /// Waveshaping and speaker model over a periodic buffer.
    pub(crate) fn distort_periodic(
        &self,
        patch: &Patch,
        samples: &[f64],
        sample_rate: f64,
    ) -> (Vec<f64>, Option<OversamplingReport>) {
        let (shaped, report) = distort(
            patch,
            samples,
            sample_rate,
            BoundaryPolicy::Cyclic,
            self.kernels(),
        );
        let out =
            SpeakerModel::from_patch(patch).process(&shaped, sample_rate, BoundaryPolicy::Cyclic);
        (out, report)
    }
}

/// Sums partials over `len` samples at full level, starting at phase.
fn render_periodic(partials: &[Partial], len: usize, filter: Option<&FilterEnvelope>) -> Vec<f64> {
    let envelope = vec![1.0; len];
    let mut out = vec![0.0; len];
    for partial in partials {
        add_partial(&mut out, partial, 0.0, &envelope, filter);
    }
    out
}
