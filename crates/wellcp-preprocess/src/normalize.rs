// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use wellcp_core::{SignalMatrix, WcpError};

/// Scales every well by `coef / max(well)`.
///
/// A well whose maximum is exactly zero is divided by one instead, so it
/// never turns into NaN/Inf.
pub fn normalize(matrix: &SignalMatrix, coef: f64) -> Result<SignalMatrix, WcpError> {
    if !coef.is_finite() {
        return Err(WcpError::invalid_input(format!(
            "normalize coef must be finite; got {coef}"
        )));
    }

    let (n_frames, n_wells) = matrix.shape();
    let mut divisors = vec![f64::NEG_INFINITY; n_wells];
    for t in 0..n_frames {
        if let Some(row) = matrix.row(t) {
            for (divisor, value) in divisors.iter_mut().zip(row) {
                *divisor = divisor.max(*value);
            }
        }
    }
    for divisor in &mut divisors {
        if *divisor == 0.0 {
            *divisor = 1.0;
        }
    }

    let values = matrix
        .values()
        .chunks_exact(n_wells)
        .flat_map(|row| {
            row.iter()
                .zip(&divisors)
                .map(|(value, divisor)| coef * (value / divisor))
        })
        .collect();
    SignalMatrix::new(values, n_frames, n_wells)
}
