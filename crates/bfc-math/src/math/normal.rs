//! Normal distribution densities in log space.

/// 0.5 * ln(2*pi)
pub const LOG_SQRT_2PI: f64 = 0.918_938_533_204_672_8;

/// Log-density of Normal(mean, sd²) at `x`.
///
/// Returns NaN for `sd <= 0` or NaN inputs.
///
/// # Example
/// ```
/// use bfc_math::normal_log_pdf;
///
/// let lp = normal_log_pdf(0.0, 0.0, 1.0);
/// assert!((lp + 0.918_938_533_204_672_8).abs() < 1e-15);
/// ```
pub fn normal_log_pdf(x: f64, mean: f64, sd: f64) -> f64 {
    if x.is_nan() || mean.is_nan() || sd.is_nan() || sd <= 0.0 {
        return f64::NAN;
    }
    if sd.is_infinite() {
        return f64::NEG_INFINITY;
    }
    let z = (x - mean) / sd;
    -LOG_SQRT_2PI - sd.ln() - 0.5 * z * z
}

/// Density of Normal(mean, sd²) at `x`.
pub fn normal_pdf(x: f64, mean: f64, sd: f64) -> f64 {
    let lp = normal_log_pdf(x, mean, sd);
    if lp.is_nan() {
        return f64::NAN;
    }
    lp.exp()
}
