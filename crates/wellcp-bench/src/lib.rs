// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use wellcp_core::SignalMatrix;

/// Activity trace that drops from a busy to a quiet level at `at`.
pub fn falling_trace(n_frames: usize, at: usize, phase: usize) -> Vec<f64> {
    (0..n_frames)
        .map(|t| {
            let level = if t < at { 0.9 } else { 0.1 };
            level + 0.05 * ((t * (phase + 3)) as f64 * 0.37).sin()
        })
        .collect()
}

/// `n_frames x n_wells` population with staggered falling edges.
pub fn falling_population(n_frames: usize, n_wells: usize) -> SignalMatrix {
    let columns = (0..n_wells)
        .map(|well| falling_trace(n_frames, n_frames / 4 + (well * n_frames) / (2 * n_wells), well))
        .collect::<Vec<_>>();
    SignalMatrix::from_columns(&columns)
        .unwrap_or_else(|err| panic!("benchmark population should be valid: {err}"))
}

#[cfg(test)]
mod tests {
    use super::falling_population;

    #[test]
    fn population_has_requested_shape() {
        assert_eq!(falling_population(120, 8).shape(), (120, 8));
    }
}
