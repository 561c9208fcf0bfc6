//! Dither and requantization.

use overtone_patch::{DitherType, Patch};

use crate::rng::NoiseSource;

/// Quantizer variant, chosen once per buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantizer {
    /// Rounding only.
    Plain,
    /// Dither added before rounding.
    Dither,
    /// Dither added before rounding and removed after.
    DitherSubtract,
    /// Error feedback around the dithered quantizer.
    Shaped {
        /// Remove the pre-quantization dither after rounding.
        subtract: bool,
    },
}

/// Requantization settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DitherParams {
    /// Largest positive code, `2^(bits-1)`.
    pub max_int: f64,
    /// Dither distribution.
    pub dither_type: DitherType,
    /// Peak-to-peak dither width in LSB.
    pub level: f64,
    /// Split between real and fake dither, in degrees.
    pub fakeness_degrees: f64,
    /// Error feedback coefficient.
    pub noise_shaping: f64,
    /// Subtract the real dither after rounding.
    pub subtract: bool,
}

impl DitherParams {
    /// Requantization settings of a patch, `None` when the patch keeps full resolution.
    pub fn from_patch(patch: &Patch) -> Option<Self> {
        patch.quantization_enabled().then(|| Self {
            max_int: patch.max_int(),
            dither_type: patch.digital_dither_type,
            level: patch.digital_dither_level.max(0.0),
            fakeness_degrees: patch.digital_dither_fakeness,
            noise_shaping: patch.digital_noise_shaping.clamp(0.0, 1.0),
            subtract: patch.digital_dither_subtract,
        })
    }

    /// Variant implementing these settings.
    pub fn quantizer(&self) -> Quantizer {
        if self.noise_shaping > 0.0 {
            Quantizer::Shaped {
                subtract: self.subtract,
            }
        } else if self.level <= 0.0 {
            Quantizer::Plain
        } else if self.subtract {
            Quantizer::DitherSubtract
        } else {
            Quantizer::Dither
        }
    }
}

/// Draws one dither value in LSB.
pub fn draw_dither(noise: &mut NoiseSource, dither_type: DitherType, level: f64) -> f64 {
    match dither_type {
        DitherType::Rectangular => noise.centered() * level,
        DitherType::Triangular => (noise.uniform() + noise.uniform() - 1.0) * level / 2.0,
        DitherType::Gaussian => noise.gaussian() * level / (2.0 * 6.0_f64.sqrt()),
    }
}

/// Rounds to the nearest code in `[-(max_int-1), max_int]`, in LSB.
#[inline]
fn quantize_lsb(value_lsb: f64, max_int: f64) -> f64 {
    value_lsb.round().clamp(-(max_int - 1.0), max_int)
}

/// Requantizes a buffer.
///
/// # Arguments
/// * `params` - Bit depth and dither settings
/// * `samples` - Input samples in full-scale units
/// * `noise` - Dither noise stream for this channel
///
/// # Returns
/// Requantized samples in full-scale units
pub fn requantize(params: &DitherParams, samples: &[f64], noise: &mut NoiseSource) -> Vec<f64> {
    let max_int = params.max_int;
    let theta = params.fakeness_degrees.to_radians();
    let (pre_gain, post_gain) = if params.level > 0.0 {
        (theta.cos(), theta.sin())
    } else {
        (0.0, 0.0)
    };
    let mut draw = |gain: f64| -> f64 {
        if gain.abs() > 1e-12 {
            gain * draw_dither(noise, params.dither_type, params.level)
        } else {
            0.0
        }
    };

    match params.quantizer() {
        Quantizer::Plain => samples
            .iter()
            .map(|&s| quantize_lsb(s * max_int, max_int) / max_int)
            .collect(),
        Quantizer::Dither | Quantizer::DitherSubtract => {
            let subtract = params.quantizer() == Quantizer::DitherSubtract;
            samples
                .iter()
                .map(|&s| {
                    let pre = draw(pre_gain);
                    let post = draw(post_gain);
                    let q = quantize_lsb(s * max_int + pre, max_int);
                    let y = if subtract { q - pre } else { q };
                    (y + post) / max_int
                })
                .collect()
        }
        Quantizer::Shaped { subtract } => {
            let k = params.noise_shaping;
            let mut error = 0.0;
            samples
                .iter()
                .map(|&s| {
                    let pre = draw(pre_gain);
                    let post = draw(post_gain);
                    let v = s * max_int - k * error;
                    let q = quantize_lsb(v + pre, max_int);
                    error = q - (v + pre);
                    let y = if subtract { q - pre } else { q };
                    (y + post) / max_int
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(bits: u32, level: f64) -> DitherParams {
        DitherParams {
            max_int: 2.0_f64.powi(bits as i32 - 1),
            dither_type: DitherType::Triangular,
            level,
            fakeness_degrees: 0.0,
            noise_shaping: 0.0,
            subtract: false,
        }
    }

    #[test]
    fn test_variant_selection() {
        let mut p = params(8, 0.0);
        assert_eq!(p.quantizer(), Quantizer::Plain);
        p.level = 2.0;
        assert_eq!(p.quantizer(), Quantizer::Dither);
        p.subtract = true;
        assert_eq!(p.quantizer(), Quantizer::DitherSubtract);
        p.noise_shaping = 0.5;
        assert_eq!(p.quantizer(), Quantizer::Shaped { subtract: true });
    }

    #[test]
    fn test_plain_rounding_and_clamp() {
        let p = params(4, 0.0);
        let mut noise = NoiseSource::new(0);
        let out = requantize(&p, &[0.06, 0.07, 2.0, -2.0], &mut noise);
        // 8 levels per unit
        assert_eq!(out, vec![0.0, 0.125, 1.0, -0.875]);
    }

    #[test]
    fn test_dither_distributions() {
        let mut noise = NoiseSource::new(5);
        let n = 100_000;
        for (kind, var) in [
            (DitherType::Rectangular, 4.0 / 12.0),
            (DitherType::Triangular, 1.0 / 6.0),
            (DitherType::Gaussian, 1.0 / 6.0),
        ] {
            let draws: Vec<f64> = (0..n).map(|_| draw_dither(&mut noise, kind, 2.0)).collect();
            let measured = draws.iter().map(|d| d * d).sum::<f64>() / n as f64;
            assert!((measured - var).abs() < 0.01, "{:?}: {}", kind, measured);
            if kind != DitherType::Gaussian {
                assert!(draws.iter().all(|d| d.abs() <= 1.0));
            }
        }
    }

    #[test]
    fn test_subtractive_dither_error_is_bounded() {
        let mut p = params(8, 2.0);
        p.subtract = true;
        let mut noise = NoiseSource::new(11);
        let input: Vec<f64> = (0..1000).map(|i| (i as f64 * 0.01).sin() * 0.5).collect();
        let out = requantize(&p, &input, &mut noise);
        for (x, y) in input.iter().zip(&out) {
            assert!((x - y).abs() <= 0.5 / p.max_int + 1e-12);
        }
    }

    #[test]
    fn test_fake_dither_only() {
        let mut p = params(8, 2.0);
        p.fakeness_degrees = 90.0;
        let mut noise = NoiseSource::new(3);
        // the quantizer sees no dither, so exact codes come back with noise on top
        let out = requantize(&p, &[0.0; 256], &mut noise);
        assert!(out.iter().any(|&v| v != 0.0));
        assert!(out.iter().all(|v| v.abs() <= 1.0 / p.max_int));
    }

    #[test]
    fn test_noise_shaping_moves_error_up() {
        let mut p = params(8, 0.0);
        p.noise_shaping = 1.0;
        let mut noise = NoiseSource::new(0);
        let input: Vec<f64> = (0..4096).map(|i| 0.3 * (i as f64 * 0.013).sin()).collect();
        let out = requantize(&p, &input, &mut noise);
        let err: Vec<f64> = input.iter().zip(&out).map(|(x, y)| y - x).collect();
        // first-order shaping makes the running sum of the error bounded
        let mut acc: f64 = 0.0;
        let mut max_acc: f64 = 0.0;
        for e in &err {
            acc += e;
            max_acc = max_acc.max(acc.abs());
        }
        assert!(max_acc <= 1.0 / p.max_int + 1e-12);
    }

    #[test]
    fn test_shaped_subtractive_dither_keeps_error_first_order() {
        let mut p = params(8, 2.0);
        p.noise_shaping = 1.0;
        p.subtract = true;
        assert_eq!(p.quantizer(), Quantizer::Shaped { subtract: true });

        let mut noise = NoiseSource::new(5);
        let input: Vec<f64> = (0..8192).map(|i| 0.3 * (i as f64 * 0.013).sin()).collect();
        let out = requantize(&p, &input, &mut noise);
        let lsb = 1.0 / p.max_int;

        let mut acc: f64 = 0.0;
        let mut max_acc: f64 = 0.0;
        let mut moved = false;
        for (x, y) in input.iter().zip(&out) {
            let e = y - x;
            assert!(e.abs() <= lsb + 1e-12, "error {} LSB", e / lsb);
            moved |= e.abs() > 1e-12;
            acc += e;
            max_acc = max_acc.max(acc.abs());
        }
        assert!(moved);
        // the accumulated error is the last rounding residue
        assert!(max_acc <= 0.5 * lsb + 1e-9, "running sum {} LSB", max_acc / lsb);
    }
}
