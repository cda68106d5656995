// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::csv::parse_csv_data;
use crate::error::CliError;
use crate::npy::{encode_npy_f64, parse_npy_bytes};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use wellcp_core::SignalMatrix;

/// Fails unless `path` exists.
pub fn ensure_exists(path: &Path) -> Result<(), CliError> {
    if path.exists() {
        Ok(())
    } else {
        Err(CliError::invalid_input(format!(
            "the given path does not exist: '{}'",
            path.display()
        )))
    }
}

/// Reads a `.npy` or `.csv` table as row-major values plus `(rows, cols)`.
pub fn load_table(path: &Path) -> Result<(Vec<f64>, usize, usize), CliError> {
    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| {
            CliError::not_supported(format!(
                "unable to infer input format for '{}'; expected .csv or .npy",
                path.display()
            ))
        })?;

    match extension.as_str() {
        "csv" => {
            let raw = fs::read_to_string(path).map_err(|source| {
                CliError::io(format!("failed to read '{}'", path.display()), source)
            })?;
            parse_csv_data(raw.as_str())
        }
        "npy" => {
            let bytes = fs::read(path).map_err(|source| {
                CliError::io(format!("failed to read '{}'", path.display()), source)
            })?;
            parse_npy_bytes(bytes.as_slice())
        }
        other => Err(CliError::not_supported(format!(
            "unsupported input format '{other}'; expected .csv or .npy"
        ))),
    }
}

/// Loads a `frames x wells` signal matrix.
pub fn load_matrix(path: &Path) -> Result<SignalMatrix, CliError> {
    let (values, n_frames, n_wells) = load_table(path)?;
    Ok(SignalMatrix::new(values, n_frames, n_wells)?)
}

/// Loads a table and flattens it in row-major order.
pub fn load_vector(path: &Path) -> Result<Vec<f64>, CliError> {
    load_table(path).map(|(values, _, _)| values)
}

/// Interprets values as non-negative integer frame indices.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_event_times(values: &[f64], label: &str) -> Result<Vec<usize>, CliError> {
    values
        .iter()
        .enumerate()
        .map(|(well, &value)| {
            if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX)
            {
                Ok(value as usize)
            } else {
                Err(CliError::invalid_input(format!(
                    "{label} entry {well} must be a non-negative integer frame; got {value}"
                )))
            }
        })
        .collect()
}

/// Interprets `1` as blacklisted and `0` as kept.
pub fn to_blacklist(values: &[f64]) -> Result<Vec<bool>, CliError> {
    values
        .iter()
        .enumerate()
        .map(|(well, &value)| {
            if value == 1.0 {
                Ok(true)
            } else if value == 0.0 {
                Ok(false)
            } else {
                Err(CliError::invalid_input(format!(
                    "blacklist entry {well} must be 0 or 1; got {value}"
                )))
            }
        })
        .collect()
}

/// `cf_r{r:.3}_signals.npy` in the directory of `input`.
pub fn score_output_path(input: &Path, r: f64) -> PathBuf {
    let name = format!("cf_r{r:.3}_signals.npy");
    match input.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Writes `matrix` as a `<f8` C-order NPY file.
pub fn write_npy(path: &Path, matrix: &SignalMatrix) -> Result<(), CliError> {
    let (rows, cols) = matrix.shape();
    let bytes = encode_npy_f64(matrix.values(), rows, cols)?;
    fs::write(path, bytes)
        .map_err(|source| CliError::io(format!("failed to write '{}'", path.display()), source))
}

/// Pretty-prints `payload` to `output_path`, or to stdout when absent.
pub fn write_json_output<T: Serialize>(
    payload: &T,
    output_path: Option<&Path>,
) -> Result<(), CliError> {
    let encoded = serde_json::to_string_pretty(payload)
        .map_err(|source| CliError::json("failed to serialize JSON output", source))?;

    if let Some(path) = output_path {
        fs::write(path, format!("{encoded}\n"))
            .map_err(|source| CliError::io(format!("failed to write '{}'", path.display()), source))
    } else {
        println!("{encoded}");
        Ok(())
    }
}
