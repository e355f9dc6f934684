//! Bayes factor for the logistic slope by adaptive Gauss-Hermite quadrature.
//!
//! The marginal likelihood `log ∫ exp(log_kernel(b)) db` is integrated on
//! Gauss-Hermite nodes centred and scaled by a Laplace approximation of the
//! kernel, then compared against the null model.
//!
//! | variant        | centre / precision                      | null term                     |
//! |----------------|-----------------------------------------|-------------------------------|
//! | fixed `b0`     | `bhat`, `1/std²` from the offset fit     | log-likelihood at `b = 0`     |
//! | estimated `b0` | posterior mode, `Σp(1−p)x² + 1/W` there  | Bernoulli at sample proportion |
//!
//! The estimated-intercept null re-estimates the intercept as the sample
//! proportion instead of profiling it; treat that variant as an
//! approximation.

use crate::fit::{FitOptions, LogisticFit};
use crate::kernel::{build_kernel, Intercept, LogisticKernel};
use bfc_common::{Error, Result};
use bfc_math::optimize::maximize_bounded;
use bfc_math::quadrature::{adaptive_gauss_hermite, GaussHermiteRule, DEFAULT_NODES, MAX_NODES};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Distance from a search bound at which a located mode is not trusted.
const BOUNDARY_MARGIN: f64 = 1e-6;

/// Quadrature and mode-search settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BfOptions {
    /// Gauss-Hermite node count, `1..=MAX_NODES`.
    pub nodes: usize,
    /// Interval searched for the posterior mode (estimated intercept only).
    pub search_bounds: [f64; 2],
    /// Absolute tolerance on the slope for the mode search.
    pub mode_tolerance: f64,
    /// Settings for the underlying fit. `max_iterations` also caps the
    /// mode search.
    pub fit: FitOptions,
}

impl Default for BfOptions {
    fn default() -> Self {
        Self {
            nodes: DEFAULT_NODES,
            search_bounds: [-100.0, 100.0],
            mode_tolerance: 1e-10,
            fit: FitOptions::default(),
        }
    }
}

impl BfOptions {
    pub fn with_nodes(mut self, nodes: usize) -> Self {
        self.nodes = nodes;
        self
    }

    fn rule(&self) -> Result<GaussHermiteRule> {
        if self.nodes == 0 || self.nodes > MAX_NODES {
            return Err(Error::InvalidArgument(format!(
                "node count must be between 1 and {MAX_NODES}, got {}",
                self.nodes
            )));
        }
        GaussHermiteRule::new(self.nodes).ok_or_else(|| {
            Error::NumericalDivergence(format!(
                "Gauss-Hermite rule with {} nodes did not converge",
                self.nodes
            ))
        })
    }

    fn validate_mode_search(&self) -> Result<()> {
        let [lo, hi] = self.search_bounds;
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(Error::InvalidArgument(format!(
                "mode search bounds must be finite with lo < hi, got [{lo}, {hi}]"
            )));
        }
        if !(self.mode_tolerance.is_finite() && self.mode_tolerance > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "mode tolerance must be finite and > 0, got {}",
                self.mode_tolerance
            )));
        }
        Ok(())
    }
}

/// Location and precision the quadrature nodes were placed with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaplaceSummary {
    pub mode: f64,
    pub precision: f64,
    /// Mode-search iterations; 0 when the fit supplied the centre.
    pub search_iterations: usize,
}

/// Everything computed on the way to one log Bayes factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayesFactorDetail {
    pub log_bf: f64,
    /// log ∫ exp(log_kernel(b)) db
    pub log_z: f64,
    /// Log marginal likelihood of the null model.
    pub log_null: f64,
    pub laplace: LaplaceSummary,
    /// The fit that fixed the kernel's intercept.
    pub fit: LogisticFit,
    pub nodes: usize,
}

/// Log BF with the intercept estimated, using `m` nodes.
pub fn log_bf(x: &[f64], y: &[u8], prior_variance: f64, m: usize) -> Result<f64> {
    let options = BfOptions::default().with_nodes(m);
    log_bf_with(x, y, prior_variance, &options).map(|d| d.log_bf)
}

/// Log BF with the intercept fixed at `b0`, using `m` nodes.
pub fn log_bf_fixed_intercept(
    x: &[f64],
    y: &[u8],
    b0: f64,
    prior_variance: f64,
    m: usize,
) -> Result<f64> {
    let options = BfOptions::default().with_nodes(m);
    log_bf_fixed_intercept_with(x, y, b0, prior_variance, &options).map(|d| d.log_bf)
}

/// Estimated-intercept log BF with full diagnostics.
pub fn log_bf_with(
    x: &[f64],
    y: &[u8],
    prior_variance: f64,
    options: &BfOptions,
) -> Result<BayesFactorDetail> {
    quadrature_bayes_factor(x, y, Intercept::Estimated, prior_variance, options)
}

/// Fixed-intercept log BF with full diagnostics.
pub fn log_bf_fixed_intercept_with(
    x: &[f64],
    y: &[u8],
    b0: f64,
    prior_variance: f64,
    options: &BfOptions,
) -> Result<BayesFactorDetail> {
    quadrature_bayes_factor(x, y, Intercept::Fixed(b0), prior_variance, options)
}

fn quadrature_bayes_factor(
    x: &[f64],
    y: &[u8],
    intercept: Intercept,
    prior_variance: f64,
    options: &BfOptions,
) -> Result<BayesFactorDetail> {
    let rule = options.rule()?;
    if intercept == Intercept::Estimated {
        options.validate_mode_search()?;
    }
    let (kernel, fit) = build_kernel(x, y, intercept, prior_variance, &options.fit)?;

    let laplace = match intercept {
        Intercept::Fixed(_) => LaplaceSummary {
            mode: fit.bhat,
            precision: 1.0 / (fit.std * fit.std),
            search_iterations: 0,
        },
        Intercept::Estimated => locate_mode(&kernel, options)?,
    };

    let result = adaptive_gauss_hermite(|b| kernel.log_kernel(b), laplace.mode, laplace.precision, &rule)
        .ok_or_else(|| {
            Error::NumericalDivergence(format!(
                "invalid Laplace approximation (mode={}, precision={})",
                laplace.mode, laplace.precision
            ))
        })?;
    if !result.log_z.is_finite() {
        return Err(Error::NumericalDivergence(format!(
            "log marginal likelihood is {}",
            result.log_z
        )));
    }

    let log_null = match intercept {
        Intercept::Fixed(_) => kernel.log_likelihood(0.0),
        Intercept::Estimated => sample_proportion_log_likelihood(y),
    };
    let log_bf = result.log_z - log_null;
    if !log_bf.is_finite() {
        return Err(Error::NumericalDivergence(format!(
            "log BF is {log_bf} (log_z={}, null={log_null})",
            result.log_z
        )));
    }

    debug!(
        intercept = ?intercept,
        mode = laplace.mode,
        precision = laplace.precision,
        log_z = result.log_z,
        log_null,
        log_bf,
        nodes = rule.len(),
        "quadrature bayes factor"
    );

    Ok(BayesFactorDetail {
        log_bf,
        log_z: result.log_z,
        log_null,
        laplace,
        fit,
        nodes: rule.len(),
    })
}

/// Posterior mode of the kernel by bounded search, with its curvature.
fn locate_mode(kernel: &LogisticKernel<'_>, options: &BfOptions) -> Result<LaplaceSummary> {
    let [lo, hi] = options.search_bounds;
    let search = maximize_bounded(
        |b| kernel.log_kernel(b),
        lo,
        hi,
        options.mode_tolerance,
        options.fit.max_iterations,
    )
    .ok_or_else(|| Error::InvalidArgument(format!("invalid mode search over [{lo}, {hi}]")))?;

    if !search.converged {
        return Err(Error::NumericalDivergence(format!(
            "mode search did not converge in {} iterations",
            search.iterations
        )));
    }
    if search.at_boundary(lo, hi, BOUNDARY_MARGIN) {
        return Err(Error::NumericalDivergence(format!(
            "posterior mode {} is at the edge of the search interval [{lo}, {hi}]",
            search.argmax
        )));
    }

    let precision = kernel.curvature(search.argmax);
    if !(precision.is_finite() && precision > 0.0) {
        return Err(Error::NumericalDivergence(format!(
            "kernel curvature {precision} at mode {} is not positive",
            search.argmax
        )));
    }

    Ok(LaplaceSummary {
        mode: search.argmax,
        precision,
        search_iterations: search.iterations,
    })
}

/// `Σ ln Bernoulli(y_i; ȳ)`, with `0·ln 0 = 0`.
fn sample_proportion_log_likelihood(y: &[u8]) -> f64 {
    let n = y.len() as f64;
    let k = y.iter().filter(|&&v| v != 0).count() as f64;
    let p = k / n;
    let mut ll = 0.0;
    if k > 0.0 {
        ll += k * p.ln();
    }
    if k < n {
        ll += (n - k) * (1.0 - p).ln();
    }
    ll
}
