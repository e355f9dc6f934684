//! Wakefield's asymptotic Bayes factor.
//!
//! Treats `bhat ~ N(b, V)` with `V = std²` and puts a `N(0, W)` prior on `b`.
//! The marginal of `bhat` under the alternative is then `N(0, V + W)` and
//! under the null `N(0, V)`, so
//!
//! ```text
//! log ABF = ln N(bhat; 0, V + W) − ln N(bhat; 0, V)
//!         = ½ ln(V / (V + W)) + ½ z² · W / (V + W),   z = bhat / std
//! ```

use crate::fit::LogisticFit;
use crate::kernel::validate_prior_variance;
use bfc_common::{Error, Result};
use bfc_math::normal_log_pdf;

/// Log ABF of a fitted slope against slope = 0.
///
/// Works the same for free- and fixed-intercept fits; only `bhat` and `std`
/// are read.
pub fn log_abf(fit: &LogisticFit, prior_variance: f64) -> Result<f64> {
    wakefield_log_abf(fit.bhat, fit.std, prior_variance)
}

/// Log ABF from a point estimate and its standard error.
pub fn wakefield_log_abf(bhat: f64, std: f64, prior_variance: f64) -> Result<f64> {
    validate_prior_variance(prior_variance)?;
    if !bhat.is_finite() {
        return Err(Error::InvalidArgument(format!("bhat must be finite, got {bhat}")));
    }
    if !(std.is_finite() && std > 0.0) {
        return Err(Error::InvalidArgument(format!(
            "standard error must be finite and > 0, got {std}"
        )));
    }

    let alt_sd = (std * std + prior_variance).sqrt();
    let labf = normal_log_pdf(bhat, 0.0, alt_sd) - normal_log_pdf(bhat, 0.0, std);
    if labf.is_finite() {
        Ok(labf)
    } else {
        Err(Error::NumericalDivergence(format!(
            "log ABF is {labf} for bhat={bhat} std={std}"
        )))
    }
}
