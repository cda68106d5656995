// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use rand::Rng;
use rand_distr::{Distribution, Normal};
use wellcp_core::{WcpError, mean_std};

/// Number of edge samples summarized to parameterize the padding noise.
pub const SUMMARY_SPAN: usize = 10;

/// A signal with synthetic noise prepended and appended.
///
/// `values.len() == head_width + interior_len + tail_width`, and the interior
/// slice is the source signal verbatim.
#[derive(Clone, Debug, PartialEq)]
pub struct PaddedSignal {
    values: Vec<f64>,
    head_width: usize,
    tail_width: usize,
}

impl PaddedSignal {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn head_width(&self) -> usize {
        self.head_width
    }

    pub fn tail_width(&self) -> usize {
        self.tail_width
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The original, unpadded samples.
    pub fn interior(&self) -> &[f64] {
        &self.values[self.head_width..self.values.len() - self.tail_width]
    }
}

fn edge_noise(edge: &[f64], label: &str) -> Result<Normal<f64>, WcpError> {
    let stats = mean_std(edge)?;
    Normal::new(stats.mean, stats.std).map_err(|err| {
        WcpError::numerical_issue(format!(
            "{label} padding distribution is invalid (mean={}, std={}): {err}",
            stats.mean, stats.std
        ))
    })
}

/// Pads `signal` with `head_width` draws from a normal distribution fitted to
/// its first [`SUMMARY_SPAN`] samples and `tail_width` draws fitted to its
/// last [`SUMMARY_SPAN`] samples.
///
/// Shorter signals are summarized in full.
pub fn pad_signal<R: Rng + ?Sized>(
    signal: &[f64],
    head_width: usize,
    tail_width: usize,
    rng: &mut R,
) -> Result<PaddedSignal, WcpError> {
    if signal.is_empty() {
        return Err(WcpError::invalid_input("cannot pad an empty signal"));
    }

    let span = SUMMARY_SPAN.min(signal.len());
    let head_noise = edge_noise(&signal[..span], "head")?;
    let tail_noise = edge_noise(&signal[signal.len() - span..], "tail")?;

    let total = head_width
        .checked_add(signal.len())
        .and_then(|len| len.checked_add(tail_width))
        .ok_or_else(|| WcpError::resource_limit("padded length overflows usize"))?;

    let mut values = Vec::with_capacity(total);
    values.extend(head_noise.sample_iter(&mut *rng).take(head_width));
    values.extend_from_slice(signal);
    values.extend(tail_noise.sample_iter(&mut *rng).take(tail_width));

    Ok(PaddedSignal {
        values,
        head_width,
        tail_width,
    })
}
