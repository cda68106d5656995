// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod csv;
pub mod error;
pub mod io;
pub mod npy;
pub mod progress;

pub use csv::parse_csv_data;
pub use error::CliError;
pub use io::{
    ensure_exists, load_matrix, load_table, load_vector, score_output_path, to_blacklist,
    to_event_times, write_json_output, write_npy,
};
pub use npy::{encode_npy_f64, parse_npy_bytes};
pub use progress::LogProgressSink;

/// CLI crate name helper.
pub fn crate_name() -> &'static str {
    let _ = (
        wellcp_core::crate_name(),
        wellcp_online::crate_name(),
        wellcp_eval::crate_name(),
    );
    "wellcp-cli"
}
