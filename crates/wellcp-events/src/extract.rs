// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::threshold::Threshold;
use wellcp_core::{Direction, SignalMatrix, WcpError};

/// Event time reported when a scan finds no crossing.
pub const NO_EVENT: usize = 0;

/// Event time of one well, with `0` standing for "no crossing".
///
/// Rising scans return the first index whose value is strictly above
/// `threshold`. Falling scans return the index just after the last value
/// strictly above `threshold`; a signal that is still above threshold at its
/// last sample maps to `0` as well. A rising result of `0` is ambiguous with
/// a crossing at frame 0; use [`first_crossing`] to tell them apart.
pub fn scan_well(signal: &[f64], threshold: f64, direction: Direction) -> usize {
    match direction {
        Direction::Rising => signal
            .iter()
            .position(|&value| value > threshold)
            .unwrap_or(NO_EVENT),
        Direction::Falling => {
            let len = signal.len();
            let offset = signal
                .iter()
                .rev()
                .position(|&value| value > threshold)
                .unwrap_or(0);
            match len - offset {
                time if time == len => NO_EVENT,
                time => time,
            }
        }
    }
}

/// Like [`scan_well`], but `None` when there is no crossing.
///
/// A falling scan whose last sample is above threshold has no completed
/// crossing and also yields `None`.
pub fn first_crossing(signal: &[f64], threshold: f64, direction: Direction) -> Option<usize> {
    match direction {
        Direction::Rising => signal.iter().position(|&value| value > threshold),
        Direction::Falling => match signal.iter().rev().position(|&value| value > threshold) {
            Some(offset) if offset > 0 => Some(signal.len() - offset),
            _ => None,
        },
    }
}

fn scan_matrix<T>(
    matrix: &SignalMatrix,
    threshold: &Threshold,
    mut scan: impl FnMut(&[f64], f64) -> T,
) -> Result<Vec<T>, WcpError> {
    threshold.ensure_covers(matrix.n_wells())?;
    matrix
        .columns()
        .iter()
        .enumerate()
        .map(|(well, column)| Ok(scan(column, threshold.for_well(well)?)))
        .collect()
}

/// One event time per well; `0` when a well has no crossing.
pub fn extract_event_times(
    matrix: &SignalMatrix,
    threshold: &Threshold,
    direction: Direction,
) -> Result<Vec<usize>, WcpError> {
    scan_matrix(matrix, threshold, |column, value| {
        scan_well(column, value, direction)
    })
}

/// One optional event time per well; `None` when a well has no crossing.
pub fn extract_first_crossings(
    matrix: &SignalMatrix,
    threshold: &Threshold,
    direction: Direction,
) -> Result<Vec<Option<usize>>, WcpError> {
    scan_matrix(matrix, threshold, |column, value| {
        first_crossing(column, value, direction)
    })
}

#[cfg(test)]
mod tests {
    use super::{NO_EVENT, extract_event_times, extract_first_crossings, first_crossing, scan_well};
    use crate::threshold::Threshold;
    use wellcp_core::{Direction, SignalMatrix};

    #[test]
    fn rising_scan_finds_first_strict_exceedance() {
        assert_eq!(scan_well(&[0.0, 0.0, 0.0, 5.0, 5.0, 5.0], 3.0, Direction::Rising), 3);
        assert_eq!(scan_well(&[0.0, 3.0, 3.0, 3.1], 3.0, Direction::Rising), 3);
    }

    #[test]
    fn rising_scan_without_crossing_returns_zero() {
        assert_eq!(scan_well(&[1.0, 2.0, 3.0], 3.0, Direction::Rising), NO_EVENT);
        assert_eq!(first_crossing(&[1.0, 2.0, 3.0], 3.0, Direction::Rising), None);
        // A real crossing at frame 0 looks the same through scan_well.
        assert_eq!(scan_well(&[4.0, 0.0], 3.0, Direction::Rising), 0);
        assert_eq!(first_crossing(&[4.0, 0.0], 3.0, Direction::Rising), Some(0));
    }

    #[test]
    fn falling_scan_matches_hand_computed_table() {
        let table: [(&[f64], usize); 6] = [
            // reversed offset 3, len 4
            (&[5.0, 0.0, 0.0, 0.0], 1),
            // reversed offset 3, len 6
            (&[5.0, 5.0, 5.0, 0.0, 0.0, 0.0], 3),
            // reversed offset 4, len 9
            (&[0.0, 4.0, 4.0, 1.0, 4.0, 0.0, 0.0, 0.0, 0.0], 5),
            // reversed offset 1, len 3
            (&[9.0, 9.0, 0.0], 2),
            // still above at the end: offset 0 maps to the sentinel
            (&[1.0, 1.0, 1.0, 4.0], NO_EVENT),
            // never above
            (&[1.0, 2.0, 3.0, 2.0, 1.0], NO_EVENT),
        ];
        for (signal, expected) in table {
            assert_eq!(
                scan_well(signal, 3.0, Direction::Falling),
                expected,
                "signal {signal:?}"
            );
        }
    }

    #[test]
    fn first_crossing_distinguishes_missing_falling_events() {
        assert_eq!(
            first_crossing(&[5.0, 5.0, 5.0, 0.0, 0.0, 0.0], 3.0, Direction::Falling),
            Some(3)
        );
        assert_eq!(first_crossing(&[1.0, 1.0, 4.0], 3.0, Direction::Falling), None);
        assert_eq!(first_crossing(&[1.0, 1.0, 1.0], 3.0, Direction::Falling), None);
    }

    #[test]
    fn matrix_extraction_uses_per_well_thresholds() {
        let matrix = SignalMatrix::from_columns(&[
            vec![0.0, 2.0, 4.0, 6.0],
            vec![0.0, 2.0, 4.0, 6.0],
            vec![0.0, 0.0, 0.0, 0.0],
        ])
        .unwrap();
        let global = Threshold::Global(3.0);
        assert_eq!(
            extract_event_times(&matrix, &global, Direction::Rising).unwrap(),
            vec![2, 2, 0]
        );
        assert_eq!(
            extract_first_crossings(&matrix, &global, Direction::Rising).unwrap(),
            vec![Some(2), Some(2), None]
        );

        let per_well = Threshold::PerWell(vec![1.0, 5.0, -1.0]);
        assert_eq!(
            extract_event_times(&matrix, &per_well, Direction::Rising).unwrap(),
            vec![1, 3, 0]
        );
    }

    #[test]
    fn threshold_length_mismatch_is_rejected() {
        let matrix = SignalMatrix::from_columns(&[vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        let err = extract_event_times(&matrix, &Threshold::PerWell(vec![0.5]), Direction::Falling)
            .expect_err("one threshold for two wells");
        assert_eq!(err.code(), "invalid_input");
    }
}
