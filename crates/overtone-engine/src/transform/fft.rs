//! Radix-2 FFT and inverse FFT with per-length cached tables.
//!
//! Phases are referenced to sine rather than cosine: a component
//! `A·sin(2πkn/N + φ)` shows up in bin `k` with magnitude `A` and phase `φ`,
//! which matches the phase model of the harmonic synthesizer.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{EngineError, EngineResult};
use crate::level::ZERO_LEVEL;

/// Smallest supported transform length.
pub const FFT_MIN_LEN: usize = 4;

/// Largest supported transform length.
pub const FFT_MAX_LEN: usize = 1 << 20;

/// Bit-reversal swaps and a half-cycle sine table for one length.
#[derive(Debug)]
pub struct FftTables {
    len: usize,
    swaps: Vec<(u32, u32)>,
    /// `sin(2πk/N)` for `k` in `0..N/2`.
    sine: Vec<f64>,
}

impl FftTables {
    fn new(len: usize) -> Self {
        let bits = len.trailing_zeros();
        let swaps = (0..len)
            .filter_map(|i| {
                let j = i.reverse_bits() >> (usize::BITS - bits);
                (i < j).then_some((i as u32, j as u32))
            })
            .collect();
        let sine = (0..len / 2)
            .map(|k| (std::f64::consts::TAU * k as f64 / len as f64).sin())
            .collect();
        Self { len, swaps, sine }
    }

    /// Transform length these tables serve.
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn cos(&self, k: usize) -> f64 {
        let quarter = self.len / 4;
        if k < quarter {
            self.sine[k + quarter]
        } else {
            -self.sine[k - quarter]
        }
    }

    fn permute(&self, re: &mut [f64], im: &mut [f64]) {
        for &(i, j) in &self.swaps {
            re.swap(i as usize, j as usize);
            im.swap(i as usize, j as usize);
        }
    }

    /// In-place butterfly network. `sign` is -1 for forward, +1 for inverse.
    fn butterflies(&self, re: &mut [f64], im: &mut [f64], sign: f64) {
        let n = self.len;
        let mut size = 2;
        while size <= n {
            let half = size / 2;
            let step = n / size;
            for start in (0..n).step_by(size) {
                for j in 0..half {
                    let k = j * step;
                    let wr = self.cos(k);
                    let wi = sign * self.sine[k];
                    let a = start + j;
                    let b = a + half;
                    let tr = wr * re[b] - wi * im[b];
                    let ti = wr * im[b] + wi * re[b];
                    re[b] = re[a] - tr;
                    im[b] = im[a] - ti;
                    re[a] += tr;
                    im[a] += ti;
                }
            }
            size *= 2;
        }
    }
}

/// Magnitude and sine-referenced phase of the first `N/2` bins.
#[derive(Debug, Clone, PartialEq)]
pub struct FftResult {
    /// Amplitude per bin (`2|X_k|/N`, DC `|X_0|/N`).
    pub magnitude: Vec<f64>,
    /// Phase per bin in radians, zero where magnitude is under [`ZERO_LEVEL`].
    pub phase: Vec<f64>,
}

impl FftResult {
    /// Number of bins.
    pub fn len(&self) -> usize {
        self.magnitude.len()
    }

    /// Whether the result holds no bins.
    pub fn is_empty(&self) -> bool {
        self.magnitude.is_empty()
    }

    /// Cosine and sine amplitudes per bin, the input form of [`FftCache::inverse`].
    pub fn to_rectangular(&self) -> (Vec<f64>, Vec<f64>) {
        self.magnitude
            .iter()
            .zip(&self.phase)
            .map(|(&m, &p)| (m * p.sin(), m * p.cos()))
            .unzip()
    }
}

/// Lazily populated FFT tables keyed by transform length.
///
/// Safe to share between threads; concurrent first use of a length builds the
/// tables more than once but only the first insert is kept.
#[derive(Debug, Default)]
pub struct FftCache {
    tables: RwLock<HashMap<usize, Arc<FftTables>>>,
}

impl FftCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tables for `len`, building them on first use.
    pub fn tables(&self, len: usize) -> EngineResult<Arc<FftTables>> {
        if !len.is_power_of_two() || !(FFT_MIN_LEN..=FFT_MAX_LEN).contains(&len) {
            return Err(EngineError::UnsupportedFftLength {
                len,
                min: FFT_MIN_LEN,
                max: FFT_MAX_LEN,
            });
        }
        {
            let map = self.tables.read().unwrap_or_else(|e| e.into_inner());
            if let Some(tables) = map.get(&len) {
                return Ok(Arc::clone(tables));
            }
        }
        let built = Arc::new(FftTables::new(len));
        let mut map = self.tables.write().unwrap_or_else(|e| e.into_inner());
        Ok(Arc::clone(map.entry(len).or_insert(built)))
    }

    /// Number of distinct lengths cached so far.
    pub fn cached_lengths(&self) -> usize {
        self.tables.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Forward transform of a real signal whose length is a power of two.
    pub fn forward(&self, samples: &[f64]) -> EngineResult<FftResult> {
        let n = samples.len();
        let tables = self.tables(n)?;

        let mut re = samples.to_vec();
        let mut im = vec![0.0; n];
        tables.permute(&mut re, &mut im);
        tables.butterflies(&mut re, &mut im, -1.0);

        let half = n / 2;
        let mut magnitude = Vec::with_capacity(half);
        let mut phase = Vec::with_capacity(half);
        for k in 0..half {
            let norm = (if k == 0 { 1.0 } else { 2.0 }) / n as f64;
            let (r, i) = (re[k] * norm, im[k] * norm);
            let m = (r * r + i * i).sqrt();
            magnitude.push(m);
            phase.push(if m < ZERO_LEVEL { 0.0 } else { r.atan2(-i) });
        }
        Ok(FftResult { magnitude, phase })
    }

    /// Inverse transform from cosine/sine amplitudes of the first `N/2` bins.
    ///
    /// Returns `N = 2·len` samples of `Σ cos_k·cos(2πkn/N) + sin_k·sin(2πkn/N)`.
    pub fn inverse(&self, cos: &[f64], sin: &[f64]) -> EngineResult<Vec<f64>> {
        if cos.len() != sin.len() {
            return Err(EngineError::LengthMismatch {
                expected: cos.len(),
                found: sin.len(),
            });
        }
        let n = cos.len() * 2;
        let tables = self.tables(n)?;

        // Hermitian completion of the half spectrum
        let mut re = vec![0.0; n];
        let mut im = vec![0.0; n];
        re[0] = cos[0];
        for k in 1..n / 2 {
            re[k] = 0.5 * cos[k];
            im[k] = -0.5 * sin[k];
            re[n - k] = re[k];
            im[n - k] = -im[k];
        }

        tables.permute(&mut re, &mut im);
        tables.butterflies(&mut re, &mut im, 1.0);
        Ok(re)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustfft::num_complex::Complex;
    use rustfft::FftPlanner;
    use std::f64::consts::TAU;

    fn test_signal(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64 / n as f64;
                0.25 + 0.8 * (TAU * 3.0 * t + 0.4).sin() + 0.3 * (TAU * 17.0 * t - 1.1).cos()
            })
            .collect()
    }

    #[test]
    fn test_matches_reference_fft() {
        let cache = FftCache::new();
        let n = 256;
        let signal: Vec<f64> = (0..n).map(|i| ((i * 7919) % 263) as f64 / 263.0 - 0.5).collect();

        let ours = cache.forward(&signal).unwrap();

        let mut buffer: Vec<Complex<f64>> = signal.iter().map(|&s| Complex::new(s, 0.0)).collect();
        FftPlanner::new().plan_fft_forward(n).process(&mut buffer);

        for k in 0..n / 2 {
            let norm = (if k == 0 { 1.0 } else { 2.0 }) / n as f64;
            let expected = buffer[k].norm() * norm;
            assert!(
                (ours.magnitude[k] - expected).abs() < 1e-12,
                "bin {}: {} vs {}",
                k,
                ours.magnitude[k],
                expected
            );
        }
    }

    #[test]
    fn test_sine_phase_convention() {
        let cache = FftCache::new();
        let n = 1024;
        let phi = 0.7;
        let signal: Vec<f64> = (0..n)
            .map(|i| 0.5 * (TAU * 5.0 * i as f64 / n as f64 + phi).sin())
            .collect();

        let result = cache.forward(&signal).unwrap();
        assert!((result.magnitude[5] - 0.5).abs() < 1e-12);
        assert!((result.phase[5] - phi).abs() < 1e-9);
        // empty bins have their phase pinned to zero
        assert_eq!(result.phase[6], 0.0);
    }

    #[test]
    fn test_roundtrip_band_limited() {
        let cache = FftCache::new();
        for n in [128, 1024, 65536] {
            let signal = test_signal(n);
            let spectrum = cache.forward(&signal).unwrap();
            let (cos, sin) = spectrum.to_rectangular();
            let rebuilt = cache.inverse(&cos, &sin).unwrap();

            assert_eq!(rebuilt.len(), n);
            for (a, b) in signal.iter().zip(&rebuilt) {
                assert!((a - b).abs() < 1e-9, "n={}: {} vs {}", n, a, b);
            }
        }
    }

    #[test]
    fn test_rejects_bad_lengths() {
        let cache = FftCache::new();
        assert!(matches!(
            cache.forward(&[0.0; 100]),
            Err(EngineError::UnsupportedFftLength { len: 100, .. })
        ));
        assert!(cache.forward(&[0.0; 2]).is_err());
        assert!(matches!(
            cache.inverse(&[0.0; 8], &[0.0; 4]),
            Err(EngineError::LengthMismatch {
                expected: 8,
                found: 4
            })
        ));
    }

    #[test]
    fn test_tables_are_shared() {
        let cache = FftCache::new();
        let a = cache.tables(512).unwrap();
        let b = cache.tables(512).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        cache.tables(1024).unwrap();
        assert_eq!(cache.cached_lengths(), 2);
    }

    #[test]
    fn test_concurrent_first_use() {
        let cache = Arc::new(FftCache::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.forward(&test_signal(2048)).unwrap())
            })
            .collect();
        let results: Vec<FftResult> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(cache.cached_lengths(), 1);
    }
}
