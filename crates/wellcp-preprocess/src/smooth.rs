// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use wellcp_core::{SignalMatrix, WcpError};

/// Gaussian smoothing window parameters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct GaussianSmoothConfig {
    pub size: usize,
    pub sigma: f64,
}

impl Default for GaussianSmoothConfig {
    fn default() -> Self {
        Self {
            size: 10,
            sigma: 5.0,
        }
    }
}

impl GaussianSmoothConfig {
    pub fn validate(&self) -> Result<(), WcpError> {
        if self.size == 0 {
            return Err(WcpError::invalid_input("smoothing size must be >= 1"));
        }
        if !self.sigma.is_finite() || self.sigma <= 0.0 {
            return Err(WcpError::invalid_input(format!(
                "smoothing sigma must be finite and > 0; got {}",
                self.sigma
            )));
        }
        Ok(())
    }
}

/// Unnormalized Gaussian window, peak value 1 at the centre.
pub fn gaussian_window(size: usize, sigma: f64) -> Vec<f64> {
    let centre = (size as f64 - 1.0) / 2.0;
    (0..size)
        .map(|n| {
            let z = (n as f64 - centre) / sigma;
            (-0.5 * z * z).exp()
        })
        .collect()
}

/// Discrete convolution cropped to `max(a.len(), v.len())` samples, centred
/// on the full convolution.
pub fn convolve_same(a: &[f64], v: &[f64]) -> Vec<f64> {
    if a.is_empty() || v.is_empty() {
        return Vec::new();
    }
    let (long, short) = if a.len() >= v.len() { (a, v) } else { (v, a) };
    let offset = (short.len() - 1) / 2;

    (offset..offset + long.len())
        .map(|k| {
            let lo = (k + 1).saturating_sub(short.len());
            let hi = k.min(long.len() - 1);
            (lo..=hi).map(|i| long[i] * short[k - i]).sum::<f64>()
        })
        .collect()
}

/// Convolves every well with a Gaussian window.
pub fn gaussian_smooth(
    matrix: &SignalMatrix,
    config: &GaussianSmoothConfig,
) -> Result<SignalMatrix, WcpError> {
    config.validate()?;
    if config.size > matrix.n_frames() {
        return Err(WcpError::invalid_input(format!(
            "smoothing size {} exceeds {} frames",
            config.size,
            matrix.n_frames()
        )));
    }

    let window = gaussian_window(config.size, config.sigma);
    let smoothed = matrix
        .columns()
        .iter()
        .map(|column| convolve_same(column, &window))
        .collect::<Vec<_>>();
    SignalMatrix::from_columns(&smoothed)
}

#[cfg(test)]
mod tests {
    use super::{GaussianSmoothConfig, convolve_same, gaussian_smooth, gaussian_window};
    use wellcp_core::SignalMatrix;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() <= 1e-12, "expected {expected:?}, got {actual:?}");
        }
    }

    #[test]
    fn window_is_symmetric_with_unit_peak() {
        let w = gaussian_window(5, 1.0);
        assert_eq!(w[2], 1.0);
        assert_close(&[w[0], w[1]], &[w[4], w[3]]);
        assert_close(&[w[1]], &[(-0.5f64).exp()]);
    }

    #[test]
    fn convolve_same_matches_hand_computed_odd_and_even_kernels() {
        // full conv of [1,2,3] with [0,1,0.5] = [0,1,2.5,4,1.5]; centred slice.
        assert_close(&convolve_same(&[1.0, 2.0, 3.0], &[0.0, 1.0, 0.5]), &[1.0, 2.5, 4.0]);
        // full conv of [1,2,3,4] with [1,1] = [1,3,5,7,4]; offset 0.
        assert_close(
            &convolve_same(&[1.0, 2.0, 3.0, 4.0], &[1.0, 1.0]),
            &[1.0, 3.0, 5.0, 7.0],
        );
    }

    #[test]
    fn convolve_same_is_commutative_in_length() {
        let a = [1.0, 2.0];
        let v = [1.0, 0.0, 0.0, 1.0];
        assert_eq!(convolve_same(&a, &v).len(), 4);
        assert_close(&convolve_same(&a, &v), &convolve_same(&v, &a));
    }

    #[test]
    fn smoothing_preserves_shape_and_spreads_impulses() {
        let matrix = SignalMatrix::from_columns(&[
            vec![0.0, 0.0, 1.0, 0.0, 0.0],
            vec![1.0, 1.0, 1.0, 1.0, 1.0],
        ])
        .unwrap();
        let config = GaussianSmoothConfig { size: 3, sigma: 1.0 };
        let out = gaussian_smooth(&matrix, &config).unwrap();
        let e = (-0.5f64).exp();
        assert_eq!(out.shape(), (5, 2));
        assert_close(&out.column(0).unwrap(), &[0.0, e, 1.0, e, 0.0]);
        assert_close(
            &out.column(1).unwrap(),
            &[1.0 + e, 1.0 + 2.0 * e, 1.0 + 2.0 * e, 1.0 + 2.0 * e, 1.0 + e],
        );
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let matrix = SignalMatrix::from_columns(&[vec![0.0; 4]]).unwrap();
        let bad_sigma = GaussianSmoothConfig { size: 3, sigma: 0.0 };
        assert!(gaussian_smooth(&matrix, &bad_sigma).is_err());
        let too_wide = GaussianSmoothConfig { size: 5, sigma: 1.0 };
        assert!(gaussian_smooth(&matrix, &too_wide).is_err());
    }
}
