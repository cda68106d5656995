// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use rand::Rng;
use std::collections::VecDeque;
use std::f64::consts::PI;
use wellcp_core::WcpError;

/// AR coefficients `a[0..=order]` (with `a[0] == 1`) solving the Yule-Walker
/// system for autocovariances `c[0..=order]`.
///
/// The predictor is `xhat = -sum(a[j] * x[t-j])` for `j` in `1..=order`.
pub fn levinson_durbin(c: &[f64], order: usize) -> Result<Vec<f64>, WcpError> {
    if order == 0 || c.len() < order + 1 {
        return Err(WcpError::invalid_input(format!(
            "levinson-durbin needs order >= 1 and {} autocovariances; got order={order}, len={}",
            order + 1,
            c.len()
        )));
    }
    if c[0] == 0.0 || !c[0].is_finite() {
        return Err(WcpError::numerical_issue(format!(
            "levinson-durbin requires finite non-zero lag-0 autocovariance; got {}",
            c[0]
        )));
    }

    let mut a = vec![0.0; order + 1];
    a[0] = 1.0;
    a[1] = -c[1] / c[0];
    let mut err = c[0] + c[1] * a[1];

    let mut next = vec![0.0; order + 1];
    for k in 1..order {
        if err == 0.0 || !err.is_finite() {
            return Err(WcpError::numerical_issue(format!(
                "levinson-durbin prediction error degenerated at step {k}: {err}"
            )));
        }
        let lambda = -(0..=k).map(|j| a[j] * c[k + 1 - j]).sum::<f64>() / err;

        next[0] = 1.0;
        for i in 1..=k {
            next[i] = a[i] + lambda * a[k + 1 - i];
        }
        next[k + 1] = lambda;
        a[..=k + 1].copy_from_slice(&next[..=k + 1]);

        err *= 1.0 - lambda * lambda;
    }

    if let Some(bad) = a.iter().find(|value| !value.is_finite()) {
        return Err(WcpError::numerical_issue(format!(
            "levinson-durbin produced non-finite coefficient {bad}"
        )));
    }
    Ok(a)
}

/// Output of one SDAR update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SdarStep {
    /// Gaussian log-loss of the observation under the prediction.
    pub score: f64,
    pub prediction: f64,
}

/// Sequentially discounting autoregressive model of a fixed order.
///
/// Every statistic is an exponentially discounted average with forgetting
/// factor `r`.
#[derive(Clone, Debug, PartialEq)]
pub struct Sdar {
    r: f64,
    order: usize,
    mu: f64,
    sigma: f64,
    c: Vec<f64>,
}

impl Sdar {
    /// Starts from a random mean and variance in `[0, 1)`.
    pub fn new<R: Rng + ?Sized>(r: f64, order: usize, rng: &mut R) -> Self {
        let mu = rng.random::<f64>();
        let sigma = rng.random::<f64>();
        Self::with_initial(r, order, mu, sigma)
    }

    pub fn with_initial(r: f64, order: usize, mu: f64, sigma: f64) -> Self {
        Self {
            r,
            order,
            mu,
            sigma,
            c: vec![0.0; order + 1],
        }
    }

    /// Scores `x` given the `order` preceding observations (oldest first),
    /// then folds `x` into the model.
    pub fn update(&mut self, x: f64, history: &VecDeque<f64>) -> Result<SdarStep, WcpError> {
        if history.len() != self.order {
            return Err(WcpError::invalid_input(format!(
                "sdar history must hold exactly {} values; got {}",
                self.order,
                history.len()
            )));
        }

        let r = self.r;
        let keep = 1.0 - r;
        self.mu = keep * self.mu + r * x;
        let mu = self.mu;
        for lag in 1..=self.order {
            let past = history[self.order - lag];
            self.c[lag] = keep * self.c[lag] + r * (x - mu) * (past - mu);
        }
        self.c[0] = keep * self.c[0] + r * (x - mu) * (x - mu);

        let a = levinson_durbin(&self.c, self.order)?;
        let prediction = (1..=self.order)
            .map(|lag| -a[lag] * (history[self.order - lag] - mu))
            .sum::<f64>()
            + mu;

        let residual = x - prediction;
        self.sigma = keep * self.sigma + r * residual * residual;
        let sigma = self.sigma;
        if !(sigma > 0.0) || !sigma.is_finite() {
            return Err(WcpError::numerical_issue(format!(
                "sdar residual variance must be finite and > 0; got {sigma}"
            )));
        }

        let density =
            (-0.5 * residual * residual / sigma).exp() / ((2.0 * PI).sqrt() * sigma.sqrt());
        if !(density > 0.0) || !density.is_finite() {
            return Err(WcpError::numerical_issue(format!(
                "sdar predictive density is not a positive finite number: {density} (residual={residual}, sigma={sigma})"
            )));
        }

        Ok(SdarStep {
            score: -density.ln(),
            prediction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Sdar, levinson_durbin};
    use std::collections::VecDeque;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn levinson_durbin_order_one_is_lag_ratio() {
        let a = levinson_durbin(&[2.0, 1.0], 1).unwrap();
        assert_eq!(a, vec![1.0, -0.5]);
    }

    #[test]
    fn levinson_durbin_recovers_ar1_with_zero_second_coefficient() {
        let a = levinson_durbin(&[1.0, 0.5, 0.25], 2).unwrap();
        assert_close(a[0], 1.0);
        assert_close(a[1], -0.5);
        assert_close(a[2], 0.0);
    }

    #[test]
    fn levinson_durbin_order_two_matches_yule_walker() {
        // Solve [[1, .6], [.6, 1]] phi = [.6, .2] by hand.
        let c = [1.0, 0.6, 0.2];
        let a = levinson_durbin(&c, 2).unwrap();
        let phi1 = (0.6 - 0.6 * 0.2) / (1.0 - 0.36);
        let phi2 = (0.2 - 0.6 * 0.6) / (1.0 - 0.36);
        assert_close(-a[1], phi1);
        assert_close(-a[2], phi2);
    }

    #[test]
    fn levinson_durbin_rejects_zero_variance() {
        let err = levinson_durbin(&[0.0, 0.0], 1).expect_err("zero c0 should fail");
        assert_eq!(err.code(), "numerical_issue");
    }

    #[test]
    fn sdar_first_step_matches_closed_form() {
        let mut model = Sdar::with_initial(0.5, 1, 0.0, 1.0);
        let history = VecDeque::from(vec![0.0]);
        let step = model.update(1.0, &history).unwrap();
        // mu=0.5, c=[0.125,-0.125], a1=1, xhat=1, sigma=0.5.
        assert_close(step.prediction, 1.0);
        assert_close(step.score, 0.5 * std::f64::consts::PI.ln());
    }

    #[test]
    fn sdar_fails_when_density_underflows_for_tiny_r() {
        let mut model = Sdar::with_initial(1e-4, 1, 0.0, 1e-12);
        let history = VecDeque::from(vec![0.0]);
        let err = model
            .update(1_000.0, &history)
            .expect_err("density should underflow to zero");
        assert_eq!(err.code(), "numerical_issue");
        assert!(err.to_string().contains("predictive density"));
    }

    #[test]
    fn sdar_rejects_nan_observation() {
        let mut model = Sdar::with_initial(0.1, 1, 0.3, 0.4);
        let history = VecDeque::from(vec![0.2]);
        let err = model.update(f64::NAN, &history).expect_err("NaN should fail");
        assert_eq!(err.code(), "numerical_issue");
    }

    #[test]
    fn sdar_rejects_short_history() {
        let mut model = Sdar::with_initial(0.1, 2, 0.0, 1.0);
        let history = VecDeque::from(vec![0.2]);
        let err = model.update(1.0, &history).expect_err("short history should fail");
        assert_eq!(err.code(), "invalid_input");
    }
}
