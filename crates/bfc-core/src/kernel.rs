//! Log-posterior kernel for the logistic slope.
//!
//! Both Bayes factor variants integrate the same function of the slope `b`:
//!
//! ```text
//! log_kernel(b) = Σ [y_i·(b0 + x_i·b) − ln(1 + e^(b0 + x_i·b))] + ln N(b; 0, W)
//! ```
//!
//! They differ only in where `b0` comes from. [`Intercept`] names the two
//! sources and [`build_kernel`] turns either into a [`LogisticKernel`],
//! together with the maximum-likelihood fit it was derived from.

use crate::fit::{fit_fixed_intercept_with, fit_with, validate_data, FitOptions, LogisticFit};
use bfc_common::{Error, Result};
use bfc_math::{bernoulli_logit_log_pmf, normal_log_pdf, sigmoid};
use serde::{Deserialize, Serialize};

/// Where the intercept of the kernel comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Intercept {
    /// Supplied by the caller and held constant as an offset.
    Fixed(f64),
    /// Estimated jointly with the slope, then held at its MLE.
    Estimated,
}

/// Unnormalized log posterior of the slope with the intercept held fixed.
#[derive(Debug, Clone, Copy)]
pub struct LogisticKernel<'a> {
    x: &'a [f64],
    y: &'a [u8],
    b0: f64,
    prior_variance: f64,
    prior_sd: f64,
}

impl<'a> LogisticKernel<'a> {
    /// Build a kernel over `(x, y)` with intercept `b0` and a Normal(0, W)
    /// prior on the slope.
    pub fn new(x: &'a [f64], y: &'a [u8], b0: f64, prior_variance: f64) -> Result<Self> {
        validate_data(x, y)?;
        validate_prior_variance(prior_variance)?;
        if !b0.is_finite() {
            return Err(Error::InvalidArgument(format!("intercept must be finite, got {b0}")));
        }
        Ok(Self {
            x,
            y,
            b0,
            prior_variance,
            prior_sd: prior_variance.sqrt(),
        })
    }

    /// Intercept the kernel is evaluated at.
    pub fn intercept(&self) -> f64 {
        self.b0
    }

    pub fn prior_variance(&self) -> f64 {
        self.prior_variance
    }

    /// Binomial log-likelihood at slope `b`.
    pub fn log_likelihood(&self, b: f64) -> f64 {
        self.x
            .iter()
            .zip(self.y)
            .map(|(&xi, &yi)| bernoulli_logit_log_pmf(yi, self.b0 + xi * b))
            .sum()
    }

    /// Log density of the Normal(0, W) prior at `b`.
    pub fn log_prior(&self, b: f64) -> f64 {
        normal_log_pdf(b, 0.0, self.prior_sd)
    }

    /// `log_likelihood(b) + log_prior(b)`.
    pub fn log_kernel(&self, b: f64) -> f64 {
        self.log_likelihood(b) + self.log_prior(b)
    }

    /// First derivative of the log kernel.
    pub fn score(&self, b: f64) -> f64 {
        let data: f64 = self
            .x
            .iter()
            .zip(self.y)
            .map(|(&xi, &yi)| (f64::from(yi.min(1)) - sigmoid(self.b0 + xi * b)) * xi)
            .sum();
        data - b / self.prior_variance
    }

    /// Negative second derivative of the log kernel: `Σ p_i(1−p_i)·x_i² + 1/W`.
    pub fn curvature(&self, b: f64) -> f64 {
        let info: f64 = self
            .x
            .iter()
            .map(|&xi| {
                let p = sigmoid(self.b0 + xi * b);
                p * (1.0 - p) * xi * xi
            })
            .sum();
        info + 1.0 / self.prior_variance
    }
}

/// Fit the model implied by `intercept` and build the matching kernel.
///
/// `Estimated` runs the free two-parameter fit and pins the kernel's
/// intercept at `b0hat`; `Fixed(b0)` runs the slope-only fit with `b0` as an
/// offset.
pub fn build_kernel<'a>(
    x: &'a [f64],
    y: &'a [u8],
    intercept: Intercept,
    prior_variance: f64,
    options: &FitOptions,
) -> Result<(LogisticKernel<'a>, LogisticFit)> {
    validate_prior_variance(prior_variance)?;
    let fit = match intercept {
        Intercept::Estimated => fit_with(x, y, options)?,
        Intercept::Fixed(b0) => fit_fixed_intercept_with(x, y, b0, options)?,
    };
    let b0 = fit.intercept();
    let kernel = LogisticKernel::new(x, y, b0, prior_variance)?;
    Ok((kernel, fit))
}

pub(crate) fn validate_prior_variance(prior_variance: f64) -> Result<()> {
    if prior_variance.is_finite() && prior_variance > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "prior_variance must be finite and > 0, got {prior_variance}"
        )))
    }
}
