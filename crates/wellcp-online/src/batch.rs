// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::detector::{DetectorConfig, ScoreOutcome, detect_changes};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use wellcp_core::{EventKind, ExecutionContext, SignalMatrix, WcpError};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

const WELL_SEED_STRIDE: u64 = 0x9e37_79b9_7f4a_7c15;

/// Batch-level execution settings.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchConfig {
    /// Base seed; a fresh one is drawn (and reported) when absent.
    pub seed: Option<u64>,
    /// Worker threads; the global pool is used when absent.
    pub jobs: Option<usize>,
    /// Wall-clock budget for a single well, retries included.
    pub well_timeout: Option<Duration>,
}

impl BatchConfig {
    pub fn validate(&self) -> Result<(), WcpError> {
        if self.jobs == Some(0) {
            return Err(WcpError::invalid_input("jobs must be >= 1"));
        }
        if self.well_timeout == Some(Duration::ZERO) {
            return Err(WcpError::invalid_input("well timeout must be > 0"));
        }
        Ok(())
    }
}

/// Per-well bookkeeping of a batch run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WellSummary {
    pub well: usize,
    pub outcome: ScoreOutcome,
    pub attempts: usize,
}

/// Scores of every well, shaped like the input matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchScores {
    pub scores: SignalMatrix,
    pub wells: Vec<WellSummary>,
    /// Base seed actually used.
    pub seed: u64,
}

/// Seed of the generator dedicated to `well`.
pub fn well_seed(seed: u64, well: usize) -> u64 {
    seed.wrapping_add((well as u64).wrapping_add(1).wrapping_mul(WELL_SEED_STRIDE))
}

fn well_context<'a>(ctx: &ExecutionContext<'a>, timeout: Option<Duration>) -> ExecutionContext<'a> {
    let Some(timeout) = timeout else {
        return *ctx;
    };
    let scoped = ctx.with_timeout(timeout);
    match (ctx.deadline, scoped.deadline) {
        (Some(outer), Some(inner)) if outer <= inner => *ctx,
        _ => scoped,
    }
}

struct WellRun<'a> {
    signals: &'a SignalMatrix,
    kind: EventKind,
    config: &'a DetectorConfig,
    seed: u64,
    timeout: Option<Duration>,
    ctx: &'a ExecutionContext<'a>,
    done: AtomicUsize,
}

impl WellRun<'_> {
    fn score(&self, well: usize) -> Result<(Vec<f64>, WellSummary), WcpError> {
        let result = self.score_inner(well);
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        self.ctx
            .report_progress(done as f32 / self.signals.n_wells() as f32);
        result.map_err(|err| {
            error!(well, code = err.code(), error = %err, "well scoring failed");
            WcpError::well_failed(well, err)
        })
    }

    fn score_inner(&self, well: usize) -> Result<(Vec<f64>, WellSummary), WcpError> {
        self.ctx.check_cancelled()?;
        let signal = self.signals.column(well)?;
        let ctx = well_context(self.ctx, self.timeout);
        let mut rng = Pcg64::seed_from_u64(well_seed(self.seed, well));
        let out = detect_changes(&signal, self.kind, self.config, &mut rng, &ctx)?;
        debug!(well, outcome = ?out.outcome, attempts = out.attempts, "well scored");
        Ok((
            out.score,
            WellSummary {
                well,
                outcome: out.outcome,
                attempts: out.attempts,
            },
        ))
    }
}

#[cfg(feature = "rayon")]
fn run_wells(
    run: &WellRun<'_>,
    jobs: Option<usize>,
) -> Result<Vec<(Vec<f64>, WellSummary)>, WcpError> {
    let n_wells = run.signals.n_wells();
    let collect = || {
        (0..n_wells)
            .into_par_iter()
            .map(|well| run.score(well))
            .collect::<Result<Vec<_>, WcpError>>()
    };
    match jobs {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|err| WcpError::resource_limit(format!("failed to build worker pool: {err}")))?
            .install(collect),
        None => collect(),
    }
}

#[cfg(not(feature = "rayon"))]
fn run_wells(
    run: &WellRun<'_>,
    _jobs: Option<usize>,
) -> Result<Vec<(Vec<f64>, WellSummary)>, WcpError> {
    (0..run.signals.n_wells())
        .map(|well| run.score(well))
        .collect()
}

/// Scores every well of `signals` independently.
///
/// Each well gets its own generator seeded from `(seed, well)`, so output
/// does not depend on worker count or scheduling. The first failing well
/// aborts the batch with [`WcpError::WellFailed`].
pub fn score_wells(
    signals: &SignalMatrix,
    kind: EventKind,
    config: &DetectorConfig,
    batch: &BatchConfig,
    ctx: &ExecutionContext<'_>,
) -> Result<BatchScores, WcpError> {
    config.validate()?;
    batch.validate()?;

    let seed = batch.seed.unwrap_or_else(|| rand::rng().random());
    let (n_frames, n_wells) = signals.shape();
    info!(
        n_frames,
        n_wells,
        kind = %kind,
        r = config.r,
        seed,
        jobs = ?batch.jobs,
        "scoring wells"
    );

    let run = WellRun {
        signals,
        kind,
        config,
        seed,
        timeout: batch.well_timeout,
        ctx,
        done: AtomicUsize::new(0),
    };
    let started = Instant::now();
    let (columns, wells): (Vec<Vec<f64>>, Vec<WellSummary>) =
        run_wells(&run, batch.jobs)?.into_iter().unzip();

    let scores = SignalMatrix::from_columns(&columns)?;
    signals.ensure_same_shape(&scores)?;

    let retried = wells.iter().filter(|summary| summary.attempts > 1).count();
    let skipped = wells
        .iter()
        .filter(|summary| summary.outcome != ScoreOutcome::Scored)
        .count();
    info!(
        n_wells,
        retried,
        skipped,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "scoring finished"
    );

    Ok(BatchScores {
        scores,
        wells,
        seed,
    })
}
