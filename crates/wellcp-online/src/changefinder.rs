// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::sdar::Sdar;
use rand::Rng;
use std::collections::VecDeque;
use wellcp_core::{ExecutionContext, WcpError};

/// Iterations between cancellation/deadline polls in [`OnlineScorer::update_many`].
pub const CANCEL_POLL_EVERY: usize = 256;

/// Online scorer contract: one score per observed sample.
pub trait OnlineScorer {
    fn update(&mut self, x: f64) -> Result<f64, WcpError>;

    /// Default batched streaming path implemented on top of `update`.
    fn update_many(
        &mut self,
        values: &[f64],
        ctx: &ExecutionContext<'_>,
    ) -> Result<Vec<f64>, WcpError> {
        let mut out = Vec::with_capacity(values.len());
        for (t, &x) in values.iter().enumerate() {
            ctx.check_cancelled_every(t, CANCEL_POLL_EVERY)?;
            out.push(self.update(x)?);
        }
        Ok(out)
    }
}

/// ChangeFinder hyperparameters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChangeFinderConfig {
    /// Forgetting factor of both SDAR stages.
    pub r: f64,
    pub order: usize,
    /// Width of the first-stage score window.
    pub smooth: usize,
}

impl Default for ChangeFinderConfig {
    fn default() -> Self {
        Self {
            r: 0.003,
            order: 1,
            smooth: 30,
        }
    }
}

impl ChangeFinderConfig {
    pub fn validate(&self) -> Result<(), WcpError> {
        if !self.r.is_finite() || self.r <= 0.0 || self.r >= 1.0 {
            return Err(WcpError::invalid_input(format!(
                "ChangeFinder requires 0 < r < 1; got r={}",
                self.r
            )));
        }
        if self.order == 0 {
            return Err(WcpError::invalid_input("ChangeFinder requires order >= 1"));
        }
        if self.second_smooth() == 0 {
            return Err(WcpError::invalid_input(format!(
                "ChangeFinder requires smooth >= 2; got smooth={}",
                self.smooth
            )));
        }
        Ok(())
    }

    /// Width of the second-stage window: `smooth / 2`, ties to even.
    pub fn second_smooth(&self) -> usize {
        let half = self.smooth / 2;
        if self.smooth % 2 == 1 && half % 2 == 1 {
            half + 1
        } else {
            half
        }
    }
}

fn push_bounded(window: &mut VecDeque<f64>, value: f64, capacity: usize) {
    window.push_back(value);
    while window.len() > capacity {
        window.pop_front();
    }
}

fn window_mean(window: &VecDeque<f64>) -> f64 {
    window.iter().sum::<f64>() / window.len() as f64
}

/// Two-stage SDAR change-point scorer.
///
/// Stage one scores raw samples; the moving average of those scores feeds
/// stage two, whose moving-average log-loss is the output. Output is `0.0`
/// until the second-stage window fills.
#[derive(Clone, Debug)]
pub struct ChangeFinder {
    config: ChangeFinderConfig,
    smooth2: usize,
    first: Sdar,
    second: Sdar,
    history: VecDeque<f64>,
    first_scores: VecDeque<f64>,
    smoothed: VecDeque<f64>,
    second_scores: VecDeque<f64>,
}

impl ChangeFinder {
    pub fn new<R: Rng + ?Sized>(config: ChangeFinderConfig, rng: &mut R) -> Result<Self, WcpError> {
        config.validate()?;
        let first = Sdar::new(config.r, config.order, rng);
        let second = Sdar::new(config.r, config.order, rng);
        Ok(Self::from_models(config, first, second))
    }

    /// Builds a scorer around pre-initialized SDAR stages.
    pub fn from_models(config: ChangeFinderConfig, first: Sdar, second: Sdar) -> Self {
        let smooth2 = config.second_smooth();
        Self {
            config,
            smooth2,
            first,
            second,
            history: VecDeque::with_capacity(config.order + 1),
            first_scores: VecDeque::with_capacity(config.smooth + 1),
            smoothed: VecDeque::with_capacity(config.order + 1),
            second_scores: VecDeque::with_capacity(smooth2 + 1),
        }
    }
}

impl OnlineScorer for ChangeFinder {
    fn update(&mut self, x: f64) -> Result<f64, WcpError> {
        let order = self.config.order;

        if self.history.len() == order {
            let step = self.first.update(x, &self.history)?;
            push_bounded(&mut self.first_scores, step.score, self.config.smooth);
        }
        push_bounded(&mut self.history, x, order);

        let second_target = (self.first_scores.len() == self.config.smooth)
            .then(|| window_mean(&self.first_scores));

        if let Some(target) = second_target {
            if self.smoothed.len() == order {
                let step = self.second.update(target, &self.smoothed)?;
                push_bounded(&mut self.second_scores, step.score, self.smooth2);
            }
            push_bounded(&mut self.smoothed, target, order);
        }

        if self.second_scores.len() == self.smooth2 {
            Ok(window_mean(&self.second_scores))
        } else {
            Ok(0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeFinder, ChangeFinderConfig, OnlineScorer};
    use crate::sdar::Sdar;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;
    use wellcp_core::{CancelToken, ExecutionContext};

    fn step_signal(n: usize, at: usize) -> Vec<f64> {
        (0..n)
            .map(|t| {
                let base = if t < at { 0.1 } else { 0.9 };
                base + 0.01 * ((t as f64) * 0.7).sin()
            })
            .collect()
    }

    #[test]
    fn second_window_rounds_half_to_even() {
        let widths = [(30, 15), (7, 4), (5, 2), (9, 4), (11, 6), (2, 1), (3, 2)];
        for (smooth, expected) in widths {
            let config = ChangeFinderConfig {
                smooth,
                ..ChangeFinderConfig::default()
            };
            assert_eq!(config.second_smooth(), expected, "smooth={smooth}");
        }
    }

    #[test]
    fn validate_rejects_out_of_range_parameters() {
        for r in [0.0, 1.0, -0.5, f64::NAN] {
            let config = ChangeFinderConfig {
                r,
                ..ChangeFinderConfig::default()
            };
            assert!(config.validate().is_err(), "r={r} should be rejected");
        }
        let config = ChangeFinderConfig {
            order: 0,
            ..ChangeFinderConfig::default()
        };
        assert!(config.validate().is_err());
        let config = ChangeFinderConfig {
            smooth: 1,
            ..ChangeFinderConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn output_is_zero_until_second_window_fills() {
        let config = ChangeFinderConfig {
            r: 0.1,
            order: 1,
            smooth: 4,
        };
        let mut rng = Pcg64::seed_from_u64(11);
        let mut finder = ChangeFinder::new(config, &mut rng).unwrap();
        let scores = finder
            .update_many(&step_signal(40, 20), &ExecutionContext::new())
            .unwrap();

        // First score after `order` samples; first-stage window full after
        // `order + smooth`; second stage scores one `order` later and its
        // window of 2 fills one sample after that.
        let first_nonzero = 1 + 4 + 1 + 1;
        assert!(scores[..first_nonzero - 1].iter().all(|&s| s == 0.0));
        assert!(scores[first_nonzero - 1] != 0.0);
        assert!(scores.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn same_models_give_identical_scores() {
        let config = ChangeFinderConfig {
            r: 0.05,
            order: 2,
            smooth: 6,
        };
        let build = || {
            ChangeFinder::from_models(
                config,
                Sdar::with_initial(0.05, 2, 0.2, 0.3),
                Sdar::with_initial(0.05, 2, 0.4, 0.5),
            )
        };
        let signal = step_signal(120, 60);
        let ctx = ExecutionContext::new();
        let a = build().update_many(&signal, &ctx).unwrap();
        let b = build().update_many(&signal, &ctx).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), signal.len());
    }

    #[test]
    fn step_change_raises_the_score() {
        let config = ChangeFinderConfig {
            r: 0.02,
            order: 1,
            smooth: 10,
        };
        let mut rng = Pcg64::seed_from_u64(5);
        let mut finder = ChangeFinder::new(config, &mut rng).unwrap();
        let scores = finder
            .update_many(&step_signal(400, 250), &ExecutionContext::new())
            .unwrap();

        let before = scores[200..245].iter().copied().fold(f64::MIN, f64::max);
        let after = scores[250..290].iter().copied().fold(f64::MIN, f64::max);
        assert!(after > before, "after={after} before={before}");
    }

    #[test]
    fn update_many_stops_on_cancellation() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let ctx = ExecutionContext::new().with_cancel(&cancel);
        let mut rng = Pcg64::seed_from_u64(0);
        let mut finder = ChangeFinder::new(ChangeFinderConfig::default(), &mut rng).unwrap();
        let err = finder
            .update_many(&[0.0, 1.0, 2.0], &ctx)
            .expect_err("cancelled token should stop iteration");
        assert_eq!(err.to_string(), "cancelled");
    }
}
