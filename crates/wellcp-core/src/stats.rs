// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::{SignalMatrix, WcpError};

/// Mean and population standard deviation (`ddof = 0`).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeanStd {
    pub mean: f64,
    pub std: f64,
}

/// Two-pass mean and population standard deviation of `values`.
pub fn mean_std(values: &[f64]) -> Result<MeanStd, WcpError> {
    if values.is_empty() {
        return Err(WcpError::invalid_input(
            "mean/std requires at least one value",
        ));
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values
        .iter()
        .map(|value| {
            let diff = value - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;
    let std = var.sqrt();

    if !mean.is_finite() || !std.is_finite() {
        return Err(WcpError::numerical_issue(format!(
            "non-finite statistics over {} values: mean={mean}, std={std}",
            values.len()
        )));
    }

    Ok(MeanStd { mean, std })
}

/// Mean/std over every value of every well.
pub fn population_mean_std(matrix: &SignalMatrix) -> Result<MeanStd, WcpError> {
    mean_std(matrix.values())
}
