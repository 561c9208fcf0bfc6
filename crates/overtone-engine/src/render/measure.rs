//! Harmonic distortion measurements.

use overtone_patch::Patch;
use tracing::debug;

use super::preview::FilterSubject;
use crate::engine::Engine;
use crate::error::EngineResult;
use crate::level::ZERO_LEVEL;

/// Points on the THD-versus-frequency curve.
pub const THD_GRAPH_POINTS: usize = 31;

/// Lowest and highest frequency of the THD curve, in Hz.
const THD_GRAPH_RANGE: (f64, f64) = (20.0, 20_000.0);

/// Highest harmonic bin summed into THD.
const THD_LAST_HARMONIC: usize = 11;

/// Rate that decides which harmonics of the measured sine exist at all.
const THD_REFERENCE_RATE: f64 = 48_000.0;

/// Total harmonic distortion across a logarithmic frequency grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ThdGraph {
    /// Fundamental frequency of each point in Hz.
    pub frequencies: Vec<f64>,
    /// THD in percent at each frequency.
    pub thd: Vec<f64>,
}

/// Log-spaced frequencies from 20 Hz to 20 kHz.
fn graph_frequencies() -> Vec<f64> {
    let (lo, hi) = THD_GRAPH_RANGE;
    let steps = (THD_GRAPH_POINTS - 1) as f64;
    (0..THD_GRAPH_POINTS)
        .map(|i| lo * (hi / lo).powf(i as f64 / steps))
        .collect()
}

impl Engine {
    /// THD in percent of the patch's nonlinear stages driven by a full-scale sine.
    ///
    /// The patch is reduced with [`Patch::forced_sine`], rendered through the
    /// single-cycle preview, and bins 2 to 11 of the distorted cycle are
    /// compared to bin 1. A clean chain returns exactly 0.
    ///
    /// # Arguments
    /// * `patch` - Patch whose distortion, speaker and oversampling settings are measured
    ///
    /// # Returns
    /// THD in percent of the fundamental
    pub fn thd_percent(&self, patch: &Patch) -> EngineResult<f64> {
        let sine = patch.forced_sine();
        let preview = self.preview(&sine, FilterSubject::Off, THD_REFERENCE_RATE)?;
        let magnitude = &preview.fft.magnitude;

        let fundamental = magnitude.get(1).copied().unwrap_or(0.0);
        if fundamental < ZERO_LEVEL {
            return Ok(0.0);
        }
        let harmonics: f64 = magnitude
            .iter()
            .take(THD_LAST_HARMONIC + 1)
            .skip(2)
            .filter(|m| **m >= ZERO_LEVEL)
            .map(|m| m * m)
            .sum();
        Ok(100.0 * harmonics.sqrt() / fundamental)
    }

    /// THD in percent at [`THD_GRAPH_POINTS`] log-spaced frequencies.
    pub fn thd_graph(&self, patch: &Patch) -> EngineResult<ThdGraph> {
        let frequencies = graph_frequencies();
        let thd = frequencies
            .iter()
            .map(|&f| self.thd_percent(&patch.with_frequency(f)))
            .collect::<EngineResult<Vec<_>>>()?;
        debug!(points = thd.len(), "THD graph");
        Ok(ThdGraph { frequencies, thd })
    }
}
