//! Deterministic RNG using PCG32 with BLAKE3 seed derivation.
//!
//! All randomness in the engine flows through this module. Every stochastic
//! stage receives its own [`NoiseSource`] built from an explicit seed, so
//! renders are reproducible and channel correlation is a caller decision.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Creates a PCG32 RNG from a 32-bit seed.
///
/// The 32-bit seed is expanded to 64 bits by duplicating the value in both
/// halves, as required by PCG32's state initialization.
///
/// # Arguments
/// * `seed` - A 32-bit seed value
///
/// # Returns
/// A deterministically initialized PCG32 generator
pub fn create_rng(seed: u32) -> Pcg32 {
    let seed64 = (seed as u64) | ((seed as u64) << 32);
    Pcg32::seed_from_u64(seed64)
}

/// Derives a seed for a specific component from the base seed using a string key.
///
/// Uses BLAKE3 to hash the base seed concatenated with the component key,
/// producing an independent seed for each component.
///
/// # Arguments
/// * `base_seed` - The patch's base seed
/// * `key` - Component name, such as `"jitter"` or `"dither/0"`
///
/// # Returns
/// A derived u32 seed for the component
pub fn derive_component_seed(base_seed: u32, key: &str) -> u32 {
    let mut input = Vec::with_capacity(4 + key.len());
    input.extend_from_slice(&base_seed.to_le_bytes());
    input.extend_from_slice(key.as_bytes());

    let hash = blake3::hash(&input);

    let bytes = hash.as_bytes();
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Seed of the jitter stage. Shared by all channels of a render.
pub fn jitter_seed(base_seed: u32) -> u32 {
    derive_component_seed(base_seed, "jitter")
}

/// Seed of the dither stage for one channel.
pub fn dither_seed(base_seed: u32, channel: usize) -> u32 {
    derive_component_seed(base_seed, &format!("dither/{channel}"))
}

/// Uniform and Gaussian deviates from one seeded stream.
#[derive(Debug, Clone)]
pub struct NoiseSource {
    rng: Pcg32,
    spare: Option<f64>,
}

impl NoiseSource {
    /// Creates a source from a 32-bit seed.
    pub fn new(seed: u32) -> Self {
        Self {
            rng: create_rng(seed),
            spare: None,
        }
    }

    /// Uniform deviate in `[0, 1)`.
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform deviate in `[-0.5, 0.5)`.
    #[inline]
    pub fn centered(&mut self) -> f64 {
        self.uniform() - 0.5
    }

    /// Standard normal deviate (Box-Muller, spare value cached).
    pub fn gaussian(&mut self) -> f64 {
        if let Some(spare) = self.spare.take() {
            return spare;
        }
        // u1 in (0, 1] keeps ln() finite
        let u1 = 1.0 - self.uniform();
        let u2 = self.uniform();
        let radius = (-2.0 * u1.ln()).sqrt();
        let angle = std::f64::consts::TAU * u2;
        self.spare = Some(radius * angle.sin());
        radius * angle.cos()
    }
}
