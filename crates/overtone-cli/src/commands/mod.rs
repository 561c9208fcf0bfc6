//! CLI command implementations.

pub mod digital;
pub mod null_test;
pub mod preview;
pub mod render;
pub mod thd;

/// Sample rate used when a command is not given one.
pub const DEFAULT_SAMPLE_RATE: f64 = 48_000.0;
