// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::changefinder::{ChangeFinder, ChangeFinderConfig, OnlineScorer};
use crate::retry::retry_bounded;
use rand::Rng;
use tracing::debug;
use wellcp_core::{Direction, EventKind, ExecutionContext, WcpError, mean_std};
use wellcp_preprocess::pad_signal;

/// Slope of the survival discriminant over `start_mean - end_mean`.
pub const SURVIVAL_SLOPE: f64 = -2.8;
/// Intercept of the survival discriminant.
pub const SURVIVAL_INTERCEPT: f64 = 1.0;
/// Scoring attempts before a numerical failure becomes fatal.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// Parameters of [`detect_changes`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorConfig {
    pub r: f64,
    pub order: usize,
    pub smooth: usize,
    /// Samples summarized at each end by the survival check.
    pub window: usize,
    pub head_width: usize,
    /// Tail padding; `smooth / 2` when unset.
    pub tail_width: Option<usize>,
    pub survival_check: bool,
    pub max_attempts: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            r: 0.003,
            order: 1,
            smooth: 30,
            window: 20,
            head_width: 1000,
            tail_width: None,
            survival_check: false,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), WcpError> {
        if !self.r.is_finite() || self.r <= 0.0 || self.r >= 1.0 {
            return Err(WcpError::invalid_input(format!(
                "r must lie strictly between 0 and 1; got {}",
                self.r
            )));
        }
        if self.order == 0 {
            return Err(WcpError::invalid_input("order must be >= 1"));
        }
        if self.smooth <= 3 {
            return Err(WcpError::invalid_input(format!(
                "smooth must be > 3; got {}",
                self.smooth
            )));
        }
        if self.survival_check && self.window == 0 {
            return Err(WcpError::invalid_input(
                "survival window must be >= 1 when the survival check is enabled",
            ));
        }
        if self.max_attempts == 0 {
            return Err(WcpError::invalid_input("max_attempts must be >= 1"));
        }
        Ok(())
    }

    pub fn tail_width(&self) -> usize {
        self.tail_width.unwrap_or(self.smooth / 2)
    }

    pub fn changefinder(&self) -> ChangeFinderConfig {
        ChangeFinderConfig {
            r: self.r,
            order: self.order,
            smooth: self.smooth,
        }
    }

    /// Length of a padded signal built from `len` samples.
    pub fn padded_len(&self, len: usize) -> usize {
        self.head_width + len + self.tail_width()
    }
}

/// How a [`ChangeScore`] was produced.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreOutcome {
    Scored,
    /// Every sample was identical; scores are all zero.
    Constant,
    /// The survival discriminant held; scores are all zero.
    Survived,
}

/// Result of [`detect_changes`], in the orientation of the input signal.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeScore {
    /// One score per input sample.
    pub score: Vec<f64>,
    /// Score of every padded sample, before trimming.
    pub padded_score: Vec<f64>,
    pub padded_signal: Vec<f64>,
    pub outcome: ScoreOutcome,
    /// Scoring attempts used; zero on a fast path.
    pub attempts: usize,
}

impl ChangeScore {
    fn zeros(len: usize, config: &DetectorConfig, outcome: ScoreOutcome) -> Self {
        let padded_len = config.padded_len(len);
        Self {
            score: vec![0.0; len],
            padded_score: vec![0.0; padded_len],
            padded_signal: vec![0.0; padded_len],
            outcome,
            attempts: 0,
        }
    }
}

/// Returns true when the signal's ends satisfy the survival discriminant
/// `SLOPE * (start_mean - end_mean) + INTERCEPT > start_std - end_std`.
///
/// Each end summarizes `min(window, len)` samples.
pub fn survived(signal: &[f64], window: usize) -> Result<bool, WcpError> {
    let span = window.min(signal.len());
    let start = mean_std(&signal[..span])?;
    let end = mean_std(&signal[signal.len() - span..])?;
    Ok(SURVIVAL_SLOPE * (start.mean - end.mean) + SURVIVAL_INTERCEPT > start.std - end.std)
}

/// Scores every sample of `signal` for a change of the given event kind.
///
/// Falling-edge kinds are reversed before scoring and restored afterwards.
/// The padded signal is drawn once; each retry rebuilds the ChangeFinder
/// from `rng`.
pub fn detect_changes<R: Rng + ?Sized>(
    signal: &[f64],
    kind: EventKind,
    config: &DetectorConfig,
    rng: &mut R,
    ctx: &ExecutionContext<'_>,
) -> Result<ChangeScore, WcpError> {
    config.validate()?;
    let Some(&first) = signal.first() else {
        return Err(WcpError::invalid_input("cannot score an empty signal"));
    };

    if signal.iter().all(|&value| value == first) {
        debug!(len = signal.len(), value = first, "constant signal; skipping scoring");
        return Ok(ChangeScore::zeros(signal.len(), config, ScoreOutcome::Constant));
    }

    if config.survival_check && survived(signal, config.window)? {
        debug!(len = signal.len(), window = config.window, "survival check held; skipping scoring");
        return Ok(ChangeScore::zeros(signal.len(), config, ScoreOutcome::Survived));
    }

    let falling = kind.direction() == Direction::Falling;
    let oriented: Vec<f64> = if falling {
        signal.iter().rev().copied().collect()
    } else {
        signal.to_vec()
    };

    let padded = pad_signal(&oriented, config.head_width, config.tail_width(), rng)?;
    let finder_config = config.changefinder();

    let scored = retry_bounded(config.max_attempts, |attempt| {
        ctx.check_cancelled()?;
        debug!(attempt, kind = %kind, "scoring padded signal");
        let mut finder = ChangeFinder::new(finder_config, &mut *rng)?;
        finder.update_many(padded.values(), ctx)
    })?;

    let mut padded_score = scored.value;
    let skip = config.head_width + config.tail_width();
    let mut score = padded_score[skip..].to_vec();
    let mut padded_signal = padded.into_values();

    if falling {
        score.reverse();
        padded_score.reverse();
        padded_signal.reverse();
    }

    Ok(ChangeScore {
        score,
        padded_score,
        padded_signal,
        outcome: ScoreOutcome::Scored,
        attempts: scored.attempts,
    })
}
