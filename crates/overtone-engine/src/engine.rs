//! Shared engine context.

use crate::resample::KernelCache;
use crate::transform::FftCache;

/// Read-through caches shared by every render and analysis call.
///
/// Create one per application and share it by reference; it is `Send + Sync`
/// and every entry point takes `&self`.
#[derive(Debug, Default)]
pub struct Engine {
    fft: FftCache,
    kernels: KernelCache,
}

impl Engine {
    /// Creates an engine with empty caches.
    pub fn new() -> Self {
        Self::default()
    }

    /// FFT table cache.
    pub fn fft(&self) -> &FftCache {
        &self.fft
    }

    /// Resampling kernel cache.
    pub fn kernels(&self) -> &KernelCache {
        &self.kernels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_engine_is_shareable() {
        assert_send_sync::<Engine>();
    }
}
