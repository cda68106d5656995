// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use tracing::info;
use wellcp_core::ProgressSink;

/// Logs progress through `tracing` each time another tenth completes.
pub struct LogProgressSink {
    task: &'static str,
    last_decile: AtomicU32,
}

impl LogProgressSink {
    pub fn new(task: &'static str) -> Self {
        Self {
            task,
            last_decile: AtomicU32::new(0),
        }
    }
}

impl ProgressSink for LogProgressSink {
    fn on_progress(&self, fraction: f32) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let decile = (fraction.clamp(0.0, 1.0) * 10.0).floor() as u32;
        let previous = self.last_decile.fetch_max(decile, Ordering::Relaxed);
        if decile > previous {
            info!(task = self.task, percent = decile * 10, "progress");
        }
    }
}
