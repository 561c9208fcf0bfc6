//! Spectral transforms, windows and filter-kernel design.

pub mod fft;
pub mod kernel;
pub mod window;

pub use fft::{FftCache, FftResult, FftTables, FFT_MAX_LEN, FFT_MIN_LEN};
pub use kernel::{
    blackman_harris_sinc, design_kaiser_sinc, kaiser_design, kaiser_sinc_kernel,
    linear_phase_kernel, polyphase_decompose, KaiserDesign, PolyphaseKernel, MAX_KERNEL_TAPS,
};
pub use window::{bessel_i0, blackman_harris, kaiser};
