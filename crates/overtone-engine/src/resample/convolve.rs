//! Centered FIR convolution at unit or integer stride.

use super::BoundaryPolicy;

/// `y[m] = Σ h[i]·x[stride·m + offset − i]` for `m` in `0..out_len`.
pub fn convolve_strided(
    x: &[f64],
    kernel: &[f64],
    stride: usize,
    offset: isize,
    out_len: usize,
    policy: BoundaryPolicy,
) -> Vec<f64> {
    let n = x.len() as isize;
    let taps = kernel.len() as isize;
    (0..out_len)
        .map(|m| {
            let base = (stride * m) as isize + offset;
            // fast path when the whole stencil is inside the buffer
            if base - taps + 1 >= 0 && base < n {
                kernel
                    .iter()
                    .enumerate()
                    .map(|(i, &h)| h * x[(base - i as isize) as usize])
                    .sum()
            } else {
                kernel
                    .iter()
                    .enumerate()
                    .map(|(i, &h)| h * policy.sample(x, base - i as isize))
                    .sum()
            }
        })
        .collect()
}

/// Same-length convolution with the kernel centered on each output sample.
pub fn convolve(x: &[f64], kernel: &[f64], policy: BoundaryPolicy) -> Vec<f64> {
    let center = (kernel.len().saturating_sub(1) / 2) as isize;
    convolve_strided(x, kernel, 1, center, x.len(), policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_kernel() {
        let x = vec![0.5, -1.0, 0.25, 2.0];
        assert_eq!(convolve(&x, &[0.0, 1.0, 0.0], BoundaryPolicy::ZeroPadded), x);
    }

    #[test]
    fn test_edges_follow_policy() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let kernel = [1.0 / 3.0; 3];

        let padded = convolve(&x, &kernel, BoundaryPolicy::ZeroPadded);
        assert!((padded[0] - 1.0).abs() < 1e-12);
        assert!((padded[3] - 7.0 / 3.0).abs() < 1e-12);

        let cyclic = convolve(&x, &kernel, BoundaryPolicy::Cyclic);
        assert!((cyclic[0] - 7.0 / 3.0).abs() < 1e-12);
        assert!((cyclic[3] - 7.0 / 3.0).abs() < 1e-12);
        assert!((cyclic[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_strided_picks_every_other_center() {
        let x: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let y = convolve_strided(&x, &[0.0, 1.0, 0.0], 2, 1, 4, BoundaryPolicy::ZeroPadded);
        assert_eq!(y, vec![0.0, 2.0, 4.0, 6.0]);
    }
}
