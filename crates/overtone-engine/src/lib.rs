//! Overtone rendering engine
//!
//! This crate renders additive-synthesis patches into sample buffers and
//! analyses them. A [`Patch`](overtone_patch::Patch) describes a harmonic
//! series, its envelopes and filter sweep, the nonlinear stages that follow
//! (waveshaping, a speaker model, clock jitter) and a requantizer.
//!
//! # Overview
//!
//! A render runs every stage in a fixed order:
//!
//! 1. **Synthesis** - harmonic series, then inharmonic partials, each with the
//!    shared amplitude envelope and swept Butterworth filter
//! 2. **Waveshaping** - optionally at an oversampled rate
//! 3. **Speaker** - damped nonlinear oscillator
//! 4. **Jitter** - ADC and DAC clock jitter on a 3x grid
//! 5. **Requantization** - after the caller's global scaling, see [`Engine::null_test`]
//!
//! # Determinism
//!
//! Every stochastic stage draws from a PCG32 stream seeded via BLAKE3 from the
//! patch seed. Jitter uses one stream for all channels; dither uses one stream
//! per channel index, so identical patches always null.
//!
//! # Example
//!
//! ```ignore
//! use overtone_engine::{Engine, RenderRequest};
//! use overtone_patch::Patch;
//!
//! let engine = Engine::new();
//! let patch = Patch::from_json(json_string)?;
//! let result = engine.render(&RenderRequest::mono(48_000.0, patch.clone()))?;
//! println!("peak {:.3}, {} samples", result.peak, result.buffer.len());
//!
//! let thd = engine.thd_percent(&patch)?;
//! ```
//!
//! # Crate Structure
//!
//! - [`Engine`] - cache context and every render/analysis entry point
//! - [`transform`] - FFT, windows and FIR kernel design
//! - [`resample`] - boundary policies, convolution, polyphase oversampling
//! - [`envelope`] - attack/hold/decay generators
//! - [`filter`] - swept Butterworth filter envelope
//! - [`synthesis`] - harmonic table and sine partial generator
//! - [`effects`] - waveshaping, speaker, jitter, dither
//! - [`render`] - full renders, null test, previews, THD and digital sweeps
//! - [`rng`] - deterministic noise with seed derivation

pub mod effects;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod level;
pub mod render;
pub mod resample;
pub mod rng;
pub mod synthesis;
pub mod transform;

// Re-export main types at crate root
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use render::{
    AudioBuffer, DetailedPreview, DigitalPreview, FilterSubject, JitterCurve, NullTestOptions,
    NullTestResult, NullTestSide, Preview, ProbeCurve, RenderRequest, RenderResult, ThdGraph,
};
pub use resample::BoundaryPolicy;
pub use transform::FftResult;
