// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use proptest::prelude::*;
use wellcp_core::{Direction, SignalMatrix};
use wellcp_eval::{bin_edges, compare_with_manual, histogram};
use wellcp_events::{extract_event_times, population_threshold};

fn falling_population(stops: &[usize], n_frames: usize) -> SignalMatrix {
    let columns: Vec<Vec<f64>> = stops
        .iter()
        .map(|&stop| (0..n_frames).map(|t| if t < stop { 1.0 } else { 0.0 }).collect())
        .collect();
    SignalMatrix::from_columns(&columns).expect("population should build")
}

#[test]
fn extracted_times_compare_exactly_with_their_ground_truth() {
    let stops = [120, 300, 450, 610];
    let matrix = falling_population(&stops, 1000);
    let threshold = population_threshold(&matrix, 0.0).expect("threshold");
    let auto = extract_event_times(&matrix, &threshold, Direction::Falling).expect("times");
    assert_eq!(auto, stops.to_vec());

    let comparison = compare_with_manual(&auto, &stops, None, 1000).expect("comparison");
    assert_eq!(comparison.errors, vec![0; 4]);
    assert_eq!(comparison.rms, 0.0);
    assert!(comparison.bands.iter().all(|band| band.count == 4));
}

proptest! {
    #[test]
    fn histogram_conserves_in_range_values(
        values in prop::collection::vec(0usize..500, 0..200),
        n_bins in 1usize..60,
    ) {
        let counts = histogram(&values, &bin_edges(500.0, n_bins));
        prop_assert_eq!(counts.len(), n_bins);
        prop_assert_eq!(counts.iter().sum::<usize>(), values.len());
    }
}
