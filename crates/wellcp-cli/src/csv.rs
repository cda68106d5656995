// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::error::CliError;

/// Parses rectangular numeric CSV into row-major values plus `(rows, cols)`.
///
/// A single non-numeric header row is skipped when the row after it is
/// numeric.
pub fn parse_csv_data(raw: &str) -> Result<(Vec<f64>, usize, usize), CliError> {
    let rows = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();

    if rows.is_empty() {
        return Err(CliError::invalid_input("CSV input is empty"));
    }

    match parse_csv_rows(rows.as_slice()) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            if rows.len() > 1 && first_row_looks_like_header(rows[0], rows[1]) {
                if let Ok(without_header) = parse_csv_rows(&rows[1..]) {
                    return Ok(without_header);
                }
            }
            Err(err)
        }
    }
}

fn parse_csv_rows(rows: &[&str]) -> Result<(Vec<f64>, usize, usize), CliError> {
    let mut values = Vec::<f64>::new();
    let mut expected_cols: Option<usize> = None;

    for (row_idx, row) in rows.iter().enumerate() {
        let cells = row.split(',').map(str::trim).collect::<Vec<_>>();

        match expected_cols {
            Some(cols) if cells.len() != cols => {
                return Err(CliError::invalid_input(format!(
                    "CSV row {} has {} columns but expected {cols}",
                    row_idx + 1,
                    cells.len()
                )));
            }
            Some(_) => {}
            None => expected_cols = Some(cells.len()),
        }

        for (col_idx, cell) in cells.iter().enumerate() {
            if cell.is_empty() {
                return Err(CliError::invalid_input(format!(
                    "CSV row {} column {} is empty",
                    row_idx + 1,
                    col_idx + 1
                )));
            }

            let value = cell.parse::<f64>().map_err(|_| {
                CliError::invalid_input(format!(
                    "CSV row {} column {} is not a valid number: '{cell}'",
                    row_idx + 1,
                    col_idx + 1
                ))
            })?;
            values.push(value);
        }
    }

    let cols = expected_cols.ok_or_else(|| CliError::invalid_input("CSV input is empty"))?;
    Ok((values, rows.len(), cols))
}

fn first_row_looks_like_header(first_row: &str, second_row: &str) -> bool {
    let first_cells = first_row.split(',').map(str::trim).collect::<Vec<_>>();
    let second_cells = second_row.split(',').map(str::trim).collect::<Vec<_>>();

    if first_cells.len() != second_cells.len()
        || first_cells.iter().any(|cell| cell.is_empty())
        || second_cells.iter().any(|cell| cell.is_empty())
    {
        return false;
    }

    first_cells.iter().all(|cell| cell.parse::<f64>().is_err())
        && second_cells.iter().all(|cell| cell.parse::<f64>().is_ok())
}
