// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod compare;
pub mod sweep;

pub use compare::{Comparison, ConsistencyBand, compare_with_manual, default_bands};
pub use sweep::{
    DEFAULT_BINS, DEFAULT_COEF_START, DEFAULT_COEF_STEP, DEFAULT_COEF_STOP, DEFAULT_GROUP_SIZE,
    GroupSweep, Sweep, SweepConfig, SweepRow, bin_edges, coef_range, histogram, sweep_thresholds,
};

/// Evaluation utilities crate name helper.
pub fn crate_name() -> &'static str {
    let _ = (wellcp_core::crate_name(), wellcp_events::crate_name());
    "wellcp-eval"
}
