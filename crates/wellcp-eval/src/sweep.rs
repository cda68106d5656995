// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use tracing::{debug, info};
use wellcp_core::{Direction, ExecutionContext, SignalMatrix, WcpError, population_mean_std};
use wellcp_events::{Threshold, extract_event_times};

pub const DEFAULT_COEF_START: f64 = -2.0;
pub const DEFAULT_COEF_STOP: f64 = 20.0;
pub const DEFAULT_COEF_STEP: f64 = 0.1;
/// Wells per plate.
pub const DEFAULT_GROUP_SIZE: usize = 96;
pub const DEFAULT_BINS: usize = 499;

const MAX_COEFS: usize = 1_000_000;

/// `start, start + step, ...` up to but excluding `stop`.
pub fn coef_range(start: f64, stop: f64, step: f64) -> Result<Vec<f64>, WcpError> {
    if !start.is_finite() || !stop.is_finite() || !step.is_finite() || step == 0.0 {
        return Err(WcpError::invalid_input(format!(
            "coefficient range needs finite bounds and a non-zero step; got start={start}, stop={stop}, step={step}"
        )));
    }
    let span = ((stop - start) / step).ceil();
    if span < 1.0 {
        return Err(WcpError::invalid_input(format!(
            "coefficient range [{start}, {stop}) with step {step} is empty"
        )));
    }
    if span > MAX_COEFS as f64 {
        return Err(WcpError::resource_limit(format!(
            "coefficient range would hold {span} values; limit is {MAX_COEFS}"
        )));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = span as usize;
    Ok((0..count).map(|i| start + i as f64 * step).collect())
}

/// `n_bins + 1` evenly spaced edges over `[0, upper]`.
pub fn bin_edges(upper: f64, n_bins: usize) -> Vec<f64> {
    (0..=n_bins)
        .map(|i| upper * i as f64 / n_bins as f64)
        .collect()
}

/// Counts `values` into the bins delimited by `edges`.
///
/// Bins are half-open except the last, which also takes `edges[last]`.
/// Values outside the edges are dropped.
pub fn histogram(values: &[usize], edges: &[f64]) -> Vec<usize> {
    let n_bins = edges.len().saturating_sub(1);
    let mut counts = vec![0; n_bins];
    let (Some(&low), Some(&high)) = (edges.first(), edges.last()) else {
        return counts;
    };
    for &value in values {
        let value = value as f64;
        if value < low || value > high || n_bins == 0 {
            continue;
        }
        let bin = edges.partition_point(|&edge| edge <= value).saturating_sub(1);
        counts[bin.min(n_bins - 1)] += 1;
    }
    counts
}

/// Sweep settings.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SweepConfig {
    pub coefs: Vec<f64>,
    pub group_size: usize,
    pub n_bins: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            coefs: coef_range(DEFAULT_COEF_START, DEFAULT_COEF_STOP, DEFAULT_COEF_STEP)
                .unwrap_or_default(),
            group_size: DEFAULT_GROUP_SIZE,
            n_bins: DEFAULT_BINS,
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> Result<(), WcpError> {
        if self.coefs.is_empty() {
            return Err(WcpError::invalid_input("sweep needs at least one coefficient"));
        }
        if let Some(coef) = self.coefs.iter().find(|coef| !coef.is_finite()) {
            return Err(WcpError::invalid_input(format!(
                "threshold coefficient must be finite; got {coef}"
            )));
        }
        if self.group_size == 0 {
            return Err(WcpError::invalid_input("group size must be >= 1"));
        }
        if self.n_bins == 0 {
            return Err(WcpError::invalid_input("histogram needs at least one bin"));
        }
        Ok(())
    }
}

/// Event-time histogram of one group at one coefficient.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SweepRow {
    pub coef: f64,
    pub threshold: f64,
    pub counts: Vec<usize>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct GroupSweep {
    pub first_well: usize,
    pub n_wells: usize,
    pub rows: Vec<SweepRow>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Sweep {
    pub direction: Direction,
    pub edges: Vec<f64>,
    pub groups: Vec<GroupSweep>,
}

/// Histograms event times per well group for every coefficient.
///
/// Each group gets its own population threshold. Wells are grouped in
/// index order; a trailing short group is kept.
pub fn sweep_thresholds(
    matrix: &SignalMatrix,
    direction: Direction,
    config: &SweepConfig,
    ctx: &ExecutionContext<'_>,
) -> Result<Sweep, WcpError> {
    config.validate()?;
    let (n_frames, n_wells) = matrix.shape();
    let edges = bin_edges(n_frames as f64, config.n_bins);
    info!(
        n_frames,
        n_wells,
        coefs = config.coefs.len(),
        group_size = config.group_size,
        direction = direction.as_str(),
        "sweeping threshold coefficients"
    );

    let columns = matrix.columns();
    let mut groups = Vec::with_capacity(n_wells.div_ceil(config.group_size));
    for (index, chunk) in columns.chunks(config.group_size).enumerate() {
        let group = SignalMatrix::from_columns(chunk)?;
        let stats = population_mean_std(&group)?;
        let mut rows = Vec::with_capacity(config.coefs.len());
        for (i, &coef) in config.coefs.iter().enumerate() {
            ctx.check_cancelled_every(i, 1)?;
            let threshold = stats.mean + coef * stats.std;
            let times = extract_event_times(&group, &Threshold::Global(threshold), direction)?;
            rows.push(SweepRow {
                coef,
                threshold,
                counts: histogram(&times, &edges),
            });
        }
        debug!(group = index, n_wells = chunk.len(), "group swept");
        let first_well = index * config.group_size;
        groups.push(GroupSweep {
            first_well,
            n_wells: chunk.len(),
            rows,
        });
        ctx.report_progress((first_well + chunk.len()) as f32 / n_wells as f32);
    }

    Ok(Sweep {
        direction,
        edges,
        groups,
    })
}
