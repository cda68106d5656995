// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod extract;
pub mod threshold;

pub use extract::{NO_EVENT, extract_event_times, extract_first_crossings, first_crossing, scan_well};
pub use threshold::{Threshold, population_threshold};

/// Event extraction crate name helper.
pub fn crate_name() -> &'static str {
    let _ = wellcp_core::crate_name();
    "wellcp-events"
}
