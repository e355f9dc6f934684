//! Maximum-likelihood logistic regression on a single covariate.
//!
//! Two entry points:
//! - [`fit`]: intercept and slope estimated jointly (Newton-Raphson on the
//!   2x2 observed information, closed-form solve).
//! - [`fit_fixed_intercept`]: slope only, with a caller-supplied intercept
//!   used as an offset (scalar Newton).
//!
//! Both use step halving so the log-likelihood never decreases, and both
//! check for separation before iterating: on separated data the slope MLE
//! is infinite and the fit fails with [`Error::DegenerateData`] instead of
//! returning a large but meaningless estimate.

use bfc_common::{Error, Result};
use bfc_math::{bernoulli_logit_log_pmf, sigmoid};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Halvings tried before a Newton step is declared unusable.
const MAX_STEP_HALVINGS: usize = 50;

/// Newton iteration settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    /// Maximum Newton iterations.
    pub max_iterations: usize,
    /// Convergence threshold on the relative change of the log-likelihood.
    pub tolerance: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-10,
        }
    }
}

impl FitOptions {
    fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(Error::InvalidArgument("max_iterations must be > 0".to_string()));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "tolerance must be finite and > 0, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Result of a logistic fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticFit {
    /// Estimated intercept; None when the intercept was fixed.
    pub b0hat: Option<f64>,
    /// Slope estimate.
    pub bhat: f64,
    /// Standard error of the slope estimate, always finite and > 0.
    pub std: f64,
    /// The fixed intercept; None when the intercept was estimated.
    pub b0: Option<f64>,
    /// Newton iterations used.
    pub iterations: usize,
    /// Log-likelihood at the optimum.
    pub log_likelihood: f64,
}

impl LogisticFit {
    /// Intercept in effect for this fit, estimated or fixed.
    pub fn intercept(&self) -> f64 {
        match (self.b0hat, self.b0) {
            (Some(b0hat), _) => b0hat,
            (None, Some(b0)) => b0,
            (None, None) => 0.0,
        }
    }

    /// Wald statistic `bhat / std`.
    pub fn zhat(&self) -> f64 {
        self.bhat / self.std
    }

    pub fn is_fixed_intercept(&self) -> bool {
        self.b0.is_some()
    }
}

/// Fit intercept and slope with default options.
pub fn fit(x: &[f64], y: &[u8]) -> Result<LogisticFit> {
    fit_with(x, y, &FitOptions::default())
}

/// Fit the slope with the intercept held at `b0`, with default options.
pub fn fit_fixed_intercept(x: &[f64], y: &[u8], b0: f64) -> Result<LogisticFit> {
    fit_fixed_intercept_with(x, y, b0, &FitOptions::default())
}

/// Fit intercept and slope jointly.
pub fn fit_with(x: &[f64], y: &[u8], options: &FitOptions) -> Result<LogisticFit> {
    validate_data(x, y)?;
    options.validate()?;
    if let Some(reason) = separation(x, y) {
        return Err(Error::DegenerateData(reason.to_string()));
    }

    let n = x.len() as f64;
    let successes = y.iter().filter(|&&v| v != 0).count() as f64;
    let ybar = successes / n;
    let mut beta = [(ybar / (1.0 - ybar)).ln(), 0.0];
    let mut ll = log_likelihood(x, y, beta[0], beta[1]);

    let mut converged = false;
    let mut iterations = 0;
    while iterations < options.max_iterations {
        iterations += 1;
        let stats = Sufficient::at(x, y, beta[0], beta[1]);
        let det = stats.determinant();
        if !(det.is_finite() && det > 0.0) {
            return Err(Error::NumericalDivergence(format!(
                "observed information is singular at iteration {iterations} (det={det})"
            )));
        }
        let step = [
            (stats.h11 * stats.g0 - stats.h01 * stats.g1) / det,
            (stats.h00 * stats.g1 - stats.h01 * stats.g0) / det,
        ];

        let mut t = 1.0;
        let mut accepted = None;
        for _ in 0..MAX_STEP_HALVINGS {
            let cand = [beta[0] + t * step[0], beta[1] + t * step[1]];
            let ll_cand = log_likelihood(x, y, cand[0], cand[1]);
            if ll_cand.is_finite() && ll_cand >= ll - f64::EPSILON * (1.0 + ll.abs()) {
                accepted = Some((cand, ll_cand));
                break;
            }
            t *= 0.5;
        }
        let Some((cand, ll_new)) = accepted else {
            return Err(Error::NumericalDivergence(format!(
                "no ascent step found at iteration {iterations}"
            )));
        };

        let change = (ll_new - ll).abs();
        trace!(iteration = iterations, b0 = cand[0], b = cand[1], ll = ll_new, step = t, "newton step");
        beta = cand;
        ll = ll_new;
        if change <= options.tolerance * (ll.abs() + 0.1) {
            converged = true;
            break;
        }
    }

    if !converged {
        return Err(Error::NumericalDivergence(format!(
            "logistic fit did not converge in {} iterations",
            options.max_iterations
        )));
    }

    let stats = Sufficient::at(x, y, beta[0], beta[1]);
    let variance = stats.h00 / stats.determinant();
    let std = checked_std(variance, beta[1], || separation(x, y).is_some())?;

    debug!(b0hat = beta[0], bhat = beta[1], std, iterations, "free-intercept fit converged");
    Ok(LogisticFit {
        b0hat: Some(beta[0]),
        bhat: beta[1],
        std,
        b0: None,
        iterations,
        log_likelihood: ll,
    })
}

/// Fit the slope only, treating `b0` as a known offset.
pub fn fit_fixed_intercept_with(
    x: &[f64],
    y: &[u8],
    b0: f64,
    options: &FitOptions,
) -> Result<LogisticFit> {
    validate_data(x, y)?;
    options.validate()?;
    if !b0.is_finite() {
        return Err(Error::InvalidArgument(format!("intercept must be finite, got {b0}")));
    }
    if let Some(reason) = separation_through_origin(x, y) {
        return Err(Error::DegenerateData(reason.to_string()));
    }

    let mut b = 0.0;
    let mut ll = log_likelihood(x, y, b0, b);

    let mut converged = false;
    let mut iterations = 0;
    while iterations < options.max_iterations {
        iterations += 1;
        let (score, info) = slope_score_info(x, y, b0, b);
        if !(info.is_finite() && info > 0.0) {
            return Err(Error::NumericalDivergence(format!(
                "slope information is {info} at iteration {iterations}"
            )));
        }
        let step = score / info;

        let mut t = 1.0;
        let mut accepted = None;
        for _ in 0..MAX_STEP_HALVINGS {
            let cand = b + t * step;
            let ll_cand = log_likelihood(x, y, b0, cand);
            if ll_cand.is_finite() && ll_cand >= ll - f64::EPSILON * (1.0 + ll.abs()) {
                accepted = Some((cand, ll_cand));
                break;
            }
            t *= 0.5;
        }
        let Some((cand, ll_new)) = accepted else {
            return Err(Error::NumericalDivergence(format!(
                "no ascent step found at iteration {iterations}"
            )));
        };

        let change = (ll_new - ll).abs();
        trace!(iteration = iterations, b = cand, ll = ll_new, step = t, "newton step");
        b = cand;
        ll = ll_new;
        if change <= options.tolerance * (ll.abs() + 0.1) {
            converged = true;
            break;
        }
    }

    if !converged {
        return Err(Error::NumericalDivergence(format!(
            "fixed-intercept fit did not converge in {} iterations",
            options.max_iterations
        )));
    }

    let (_, info) = slope_score_info(x, y, b0, b);
    let std = checked_std(1.0 / info, b, || separation_through_origin(x, y).is_some())?;

    debug!(b0, bhat = b, std, iterations, "fixed-intercept fit converged");
    Ok(LogisticFit {
        b0hat: None,
        bhat: b,
        std,
        b0: Some(b0),
        iterations,
        log_likelihood: ll,
    })
}

/// Reject empty, mismatched or malformed data.
pub(crate) fn validate_data(x: &[f64], y: &[u8]) -> Result<()> {
    if x.is_empty() {
        return Err(Error::InvalidArgument("sample size must be > 0".to_string()));
    }
    if x.len() != y.len() {
        return Err(Error::InvalidArgument(format!(
            "x and y lengths differ ({} vs {})",
            x.len(),
            y.len()
        )));
    }
    if let Some(i) = x.iter().position(|v| !v.is_finite()) {
        return Err(Error::InvalidArgument(format!("x[{i}] is not finite")));
    }
    if let Some(i) = y.iter().position(|&v| v > 1) {
        return Err(Error::InvalidArgument(format!("y[{i}] = {} is not 0 or 1", y[i])));
    }
    Ok(())
}

/// Whether the free-intercept MLE is infinite for this data.
pub fn is_separated(x: &[f64], y: &[u8]) -> bool {
    separation(x, y).is_some()
}

/// Whether the fixed-intercept slope MLE is infinite for this data.
pub fn is_separated_through_origin(x: &[f64], y: &[u8]) -> bool {
    separation_through_origin(x, y).is_some()
}

fn separation(x: &[f64], y: &[u8]) -> Option<&'static str> {
    let mut min0 = f64::INFINITY;
    let mut max0 = f64::NEG_INFINITY;
    let mut min1 = f64::INFINITY;
    let mut max1 = f64::NEG_INFINITY;
    for (&xi, &yi) in x.iter().zip(y) {
        if yi != 0 {
            min1 = min1.min(xi);
            max1 = max1.max(xi);
        } else {
            min0 = min0.min(xi);
            max0 = max0.max(xi);
        }
    }

    if min1 == f64::INFINITY || min0 == f64::INFINITY {
        return Some("all responses are identical");
    }
    if min0.min(min1) == max0.max(max1) {
        return Some("covariate is constant");
    }
    // Quasi-complete separation (ties at the boundary) still has an infinite MLE.
    if max0 <= min1 || max1 <= min0 {
        return Some("response is perfectly separated by x");
    }
    None
}

fn separation_through_origin(x: &[f64], y: &[u8]) -> Option<&'static str> {
    let mut positive_up = true;
    let mut positive_down = true;
    let mut informative = false;
    for (&xi, &yi) in x.iter().zip(y) {
        if xi == 0.0 {
            continue;
        }
        informative = true;
        let success = yi != 0;
        // b → +inf wins when every x>0 is a success and every x<0 a failure.
        if (xi > 0.0) != success {
            positive_up = false;
        }
        if (xi > 0.0) == success {
            positive_down = false;
        }
    }

    if !informative {
        return Some("covariate is identically zero");
    }
    if positive_up || positive_down {
        return Some("response is perfectly separated by the sign of x");
    }
    None
}

fn checked_std(variance: f64, bhat: f64, separated: impl Fn() -> bool) -> Result<f64> {
    let std = variance.sqrt();
    if variance.is_finite() && variance > 0.0 && std.is_finite() && bhat.is_finite() {
        return Ok(std);
    }
    if separated() {
        Err(Error::DegenerateData(format!(
            "slope variance is {variance} on separated data"
        )))
    } else {
        Err(Error::NumericalDivergence(format!(
            "slope variance is {variance} (bhat={bhat})"
        )))
    }
}

fn log_likelihood(x: &[f64], y: &[u8], b0: f64, b: f64) -> f64 {
    x.iter()
        .zip(y)
        .map(|(&xi, &yi)| bernoulli_logit_log_pmf(yi, b0 + b * xi))
        .sum()
}

fn slope_score_info(x: &[f64], y: &[u8], b0: f64, b: f64) -> (f64, f64) {
    let mut score = 0.0;
    let mut info = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let p = sigmoid(b0 + b * xi);
        score += (f64::from(yi) - p) * xi;
        info += p * (1.0 - p) * xi * xi;
    }
    (score, info)
}

/// Gradient and observed information of the two-parameter log-likelihood.
struct Sufficient {
    g0: f64,
    g1: f64,
    h00: f64,
    h01: f64,
    h11: f64,
}

impl Sufficient {
    fn at(x: &[f64], y: &[u8], b0: f64, b: f64) -> Self {
        let mut s = Sufficient {
            g0: 0.0,
            g1: 0.0,
            h00: 0.0,
            h01: 0.0,
            h11: 0.0,
        };
        for (&xi, &yi) in x.iter().zip(y) {
            let p = sigmoid(b0 + b * xi);
            let r = f64::from(yi) - p;
            let w = p * (1.0 - p);
            s.g0 += r;
            s.g1 += r * xi;
            s.h00 += w;
            s.h01 += w * xi;
            s.h11 += w * xi * xi;
        }
        s
    }

    fn determinant(&self) -> f64 {
        self.h00 * self.h11 - self.h01 * self.h01
    }
}
