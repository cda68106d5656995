// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod batch;
pub mod changefinder;
pub mod detector;
pub mod retry;
pub mod sdar;

pub use batch::{BatchConfig, BatchScores, WellSummary, score_wells, well_seed};
pub use changefinder::{CANCEL_POLL_EVERY, ChangeFinder, ChangeFinderConfig, OnlineScorer};
pub use detector::{
    ChangeScore, DEFAULT_MAX_ATTEMPTS, DetectorConfig, SURVIVAL_INTERCEPT, SURVIVAL_SLOPE,
    ScoreOutcome, detect_changes, survived,
};
pub use retry::{Attempted, retry_bounded};
pub use sdar::{Sdar, SdarStep, levinson_durbin};

/// Online scoring crate name helper.
pub fn crate_name() -> &'static str {
    let _ = (wellcp_core::crate_name(), wellcp_preprocess::crate_name());
    "wellcp-online"
}
