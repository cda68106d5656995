// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod normalize;
pub mod pad;
pub mod smooth;
pub mod weight;

pub use normalize::normalize;
pub use pad::{PaddedSignal, SUMMARY_SPAN, pad_signal};
pub use smooth::{GaussianSmoothConfig, convolve_same, gaussian_smooth, gaussian_window};
pub use weight::{TimeRamp, WEIGHT_GAIN, weight_by_time};

use wellcp_core::{SignalMatrix, WcpError};

/// Optional transforms applied to a population before thresholding.
///
/// A `None` stage is skipped.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PreprocessConfig {
    pub smooth: Option<GaussianSmoothConfig>,
    pub weight: Option<TimeRamp>,
}

impl PreprocessConfig {
    /// Runs smoothing, then weighting.
    pub fn apply(&self, matrix: &SignalMatrix) -> Result<SignalMatrix, WcpError> {
        let smoothed = match &self.smooth {
            Some(config) => gaussian_smooth(matrix, config)?,
            None => matrix.clone(),
        };
        match self.weight {
            Some(ramp) => weight_by_time(&smoothed, ramp),
            None => Ok(smoothed),
        }
    }
}

/// Preprocessing crate name helper.
pub fn crate_name() -> &'static str {
    let _ = wellcp_core::crate_name();
    "wellcp-preprocess"
}
