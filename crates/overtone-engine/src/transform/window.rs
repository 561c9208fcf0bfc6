//! Window functions.

use std::f64::consts::{PI, TAU};

/// Four-term Blackman-Harris window (-92 dB sidelobes).
pub fn blackman_harris(len: usize) -> Vec<f64> {
    const A0: f64 = 0.35875;
    const A1: f64 = 0.48829;
    const A2: f64 = 0.14128;
    const A3: f64 = 0.01168;

    if len < 2 {
        return vec![1.0; len];
    }
    let denom = (len - 1) as f64;
    (0..len)
        .map(|n| {
            let x = TAU * n as f64 / denom;
            A0 - A1 * x.cos() + A2 * (2.0 * x).cos() - A3 * (3.0 * x).cos()
        })
        .collect()
}

/// Kaiser window with shape parameter `alpha` (`beta = π·alpha`).
pub fn kaiser(len: usize, alpha: f64) -> Vec<f64> {
    if len < 2 {
        return vec![1.0; len];
    }
    let beta = PI * alpha;
    let norm = bessel_i0(beta);
    let denom = (len - 1) as f64;
    (0..len)
        .map(|n| {
            let r = 2.0 * n as f64 / denom - 1.0;
            bessel_i0(beta * (1.0 - r * r).max(0.0).sqrt()) / norm
        })
        .collect()
}

/// Zeroth-order modified Bessel function of the first kind.
///
/// Two-branch polynomial approximation (Abramowitz & Stegun 9.8.1/9.8.2),
/// relative error below 2e-7.
pub fn bessel_i0(x: f64) -> f64 {
    let ax = x.abs();
    if ax < 3.75 {
        let t = (x / 3.75).powi(2);
        1.0 + t
            * (3.515_622_9
                + t * (3.089_942_4
                    + t * (1.206_749_2 + t * (0.265_973_2 + t * (0.036_076_8 + t * 0.004_581_3)))))
    } else {
        let t = 3.75 / ax;
        let poly = 0.398_942_28
            + t * (0.013_285_92
                + t * (0.002_253_19
                    + t * (-0.001_575_65
                        + t * (0.009_162_81
                            + t * (-0.020_577_06
                                + t * (0.026_355_37 + t * (-0.016_476_33 + t * 0.003_923_77)))))));
        poly * ax.exp() / ax.sqrt()
    }
}
