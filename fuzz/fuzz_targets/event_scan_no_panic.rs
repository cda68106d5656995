// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

#[path = "common.rs"]
mod common;

use libfuzzer_sys::fuzz_target;
use wellcp_core::{Direction, SignalMatrix};
use wellcp_events::{
    NO_EVENT, extract_event_times, extract_first_crossings, population_threshold,
};

fuzz_target!(|data: &[u8]| {
    let mut cursor = common::ByteCursor::new(data);
    let n_frames = common::bounded(cursor.next_u8(), 0, 48);
    let n_wells = common::bounded(cursor.next_u8(), 0, 8);
    let coef = f64::from(cursor.next_i16()) / 256.0;
    let direction = if cursor.next_u8() & 1 == 0 {
        Direction::Rising
    } else {
        Direction::Falling
    };

    let values = common::decode_f64_chunks(
        &cursor.take_padded(n_frames.saturating_mul(n_wells).saturating_mul(8)),
        n_frames.saturating_mul(n_wells),
    );
    let Ok(matrix) = SignalMatrix::new(values, n_frames, n_wells) else {
        return;
    };
    let Ok(threshold) = population_threshold(&matrix, coef) else {
        return;
    };

    let (Ok(times), Ok(crossings)) = (
        extract_event_times(&matrix, &threshold, direction),
        extract_first_crossings(&matrix, &threshold, direction),
    ) else {
        return;
    };
    for (time, crossing) in times.iter().zip(&crossings) {
        assert!(*time < n_frames.max(1));
        assert_eq!(*time, crossing.unwrap_or(NO_EVENT));
    }
});
