// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use tracing::info;
use wellcp_core::WcpError;

/// Wells whose absolute error is strictly below `limit` frames.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ConsistencyBand {
    pub name: String,
    pub limit: usize,
    pub count: usize,
    /// `count` over the number of compared wells.
    pub ratio: f64,
}

/// Agreement between automatic and manual event times.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Comparison {
    /// Indices of the compared (not blacklisted) wells.
    pub wells: Vec<usize>,
    /// `auto - manual` for each compared well, in frames.
    pub errors: Vec<i64>,
    pub rms: f64,
    pub bands: Vec<ConsistencyBand>,
}

impl Comparison {
    pub fn band(&self, name: &str) -> Option<&ConsistencyBand> {
        self.bands.iter().find(|band| band.name == name)
    }
}

/// `round(fraction * n_frames)`, ties to even.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn fraction_of_frames(fraction: f64, n_frames: usize) -> usize {
    (fraction * n_frames as f64).round_ties_even() as usize
}

/// Tolerance bands used by [`compare_with_manual`]: within 5% and 1% of the
/// recording, and within 10 frames.
pub fn default_bands(n_frames: usize) -> Vec<(String, usize)> {
    vec![
        ("5%".to_string(), fraction_of_frames(0.05, n_frames)),
        ("1%".to_string(), fraction_of_frames(0.01, n_frames)),
        ("10 frames".to_string(), 11),
    ]
}

fn to_i64(value: usize, label: &str) -> Result<i64, WcpError> {
    i64::try_from(value)
        .map_err(|_| WcpError::resource_limit(format!("{label} {value} does not fit in i64")))
}

/// Compares `auto` with `manual` event times over wells not in `blacklist`.
///
/// An absent blacklist compares every well.
pub fn compare_with_manual(
    auto: &[usize],
    manual: &[usize],
    blacklist: Option<&[bool]>,
    n_frames: usize,
) -> Result<Comparison, WcpError> {
    if auto.len() != manual.len() {
        return Err(WcpError::invalid_input(format!(
            "auto/manual length mismatch: got auto={}, manual={}",
            auto.len(),
            manual.len()
        )));
    }
    if let Some(blacklist) = blacklist {
        if blacklist.len() != auto.len() {
            return Err(WcpError::invalid_input(format!(
                "blacklist length mismatch: got {}, expected {}",
                blacklist.len(),
                auto.len()
            )));
        }
    }

    let wells: Vec<usize> = (0..auto.len())
        .filter(|&well| !blacklist.is_some_and(|list| list[well]))
        .collect();
    if wells.is_empty() {
        return Err(WcpError::invalid_input(
            "no wells left to compare after applying the blacklist",
        ));
    }

    let errors = wells
        .iter()
        .map(|&well| Ok(to_i64(auto[well], "auto time")? - to_i64(manual[well], "manual time")?))
        .collect::<Result<Vec<_>, WcpError>>()?;

    let n = errors.len() as f64;
    let rms = (errors.iter().map(|&err| (err as f64).powi(2)).sum::<f64>() / n).sqrt();

    let bands = default_bands(n_frames)
        .into_iter()
        .map(|(name, limit)| {
            let count = errors
                .iter()
                .filter(|err| usize::try_from(err.unsigned_abs()).is_ok_and(|abs| abs < limit))
                .count();
            ConsistencyBand {
                name,
                limit,
                count,
                ratio: count as f64 / n,
            }
        })
        .collect::<Vec<_>>();
    info!(
        compared = wells.len(),
        excluded = auto.len() - wells.len(),
        rms,
        "compared against manual evaluation"
    );

    Ok(Comparison {
        wells,
        errors,
        rms,
        bands,
    })
}
