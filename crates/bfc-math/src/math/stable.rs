//! Overflow-free building blocks for logistic likelihoods and log-space sums.

/// Past this, `ln(1 + e^x) == x` in f64.
const SOFTPLUS_CUTOFF: f64 = 36.0;

/// `ln Σ exp(v)` shifted by the maximum term.
///
/// Empty input (or all `-inf`) is `-inf`; any NaN gives NaN; a `+inf` term
/// gives `+inf`.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        if v.is_nan() {
            return f64::NAN;
        }
        max = max.max(v);
    }
    if max.is_infinite() {
        return max;
    }
    let shifted: f64 = values.iter().map(|&v| (v - max).exp()).sum();
    max + shifted.ln()
}

/// Softplus `ln(1 + e^x)`, the logistic log-partition function.
pub fn log1p_exp(x: f64) -> f64 {
    match x {
        x if x.is_nan() => f64::NAN,
        x if x > SOFTPLUS_CUTOFF => x,
        x if x > 0.0 => x + (-x).exp().ln_1p(),
        x => x.exp().ln_1p(),
    }
}

/// Inverse logit. Only `exp` of a non-positive number is ever taken.
pub fn sigmoid(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    let e = (-x.abs()).exp();
    if x >= 0.0 {
        1.0 / (1.0 + e)
    } else {
        e / (1.0 + e)
    }
}

/// `y·eta - ln(1 + e^eta)`: log P(y) for a Bernoulli with logit `eta`.
/// Any nonzero `y` counts as a success.
pub fn bernoulli_logit_log_pmf(y: u8, eta: f64) -> f64 {
    let success = if y != 0 { eta } else { 0.0 };
    success - log1p_exp(eta)
}
