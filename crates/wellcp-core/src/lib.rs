// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod control;
pub mod error;
pub mod execution_context;
pub mod observability;
pub mod signal;
pub mod stats;

pub use control::CancelToken;
pub use error::WcpError;
pub use execution_context::ExecutionContext;
pub use observability::ProgressSink;
pub use signal::{Direction, EventKind, SignalMatrix};
pub use stats::{MeanStd, mean_std, population_mean_std};

/// Core shared types and traits for wellcp.
pub fn crate_name() -> &'static str {
    "wellcp-core"
}
