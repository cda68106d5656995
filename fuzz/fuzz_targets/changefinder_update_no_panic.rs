// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

#[path = "common.rs"]
mod common;

use libfuzzer_sys::fuzz_target;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use wellcp_core::{EventKind, ExecutionContext};
use wellcp_online::{ChangeFinder, ChangeFinderConfig, DetectorConfig, OnlineScorer, detect_changes};

fn build_value(base: f64, mode_seed: u8, raw_seed: i16) -> f64 {
    match mode_seed % 8 {
        0 | 1 | 2 => base,
        3 => f64::from(raw_seed) / 64.0,
        4 => 0.0,
        5 => f64::NAN,
        6 => f64::INFINITY,
        _ => f64::from(raw_seed) * 1.0e150,
    }
}

fn build_config(cursor: &mut common::ByteCursor<'_>) -> ChangeFinderConfig {
    ChangeFinderConfig {
        r: (f64::from(cursor.next_u8()) + 0.5) / 256.0,
        order: common::bounded(cursor.next_u8(), 0, 4),
        smooth: common::bounded(cursor.next_u8(), 0, 24),
    }
}

fuzz_target!(|data: &[u8]| {
    let mut cursor = common::ByteCursor::new(data);
    let config = build_config(&mut cursor);
    let seed = cursor.next_u64();

    let payload_len = common::bounded(cursor.next_u8(), 0, 160).saturating_mul(8);
    let mut values = common::decode_f64_chunks(&cursor.take_padded(payload_len), 160)
        .into_iter()
        .map(|value| value.clamp(-1.0e6, 1.0e6))
        .collect::<Vec<_>>();
    if values.is_empty() {
        values.push(0.0);
    }

    let steps = common::bounded(cursor.next_u8(), 1, 128);
    let signal = (0..steps)
        .map(|t| build_value(values[t % values.len()], cursor.next_u8(), cursor.next_i16()))
        .collect::<Vec<_>>();

    let ctx = ExecutionContext::new();
    let mut rng = Pcg64::seed_from_u64(seed);
    if let Ok(mut finder) = ChangeFinder::new(config, &mut rng) {
        let _ = finder.update_many(&signal, &ctx);
    }

    let detector = DetectorConfig {
        r: config.r,
        order: config.order,
        smooth: config.smooth,
        head_width: common::bounded(cursor.next_u8(), 0, 64),
        tail_width: Some(common::bounded(cursor.next_u8(), 0, 16)),
        window: common::bounded(cursor.next_u8(), 0, 24),
        survival_check: cursor.next_u8() & 1 == 1,
        max_attempts: common::bounded(cursor.next_u8(), 0, 3),
    };
    let kind = EventKind::ALL[usize::from(cursor.next_u8()) % EventKind::ALL.len()];
    if let Ok(out) = detect_changes(&signal, kind, &detector, &mut rng, &ctx) {
        assert_eq!(out.score.len(), signal.len());
    }
});
