//! Fuzz target for the logistic fitter and both Bayes factor variants.
//!
//! Arbitrary (x, y) data, including separated, constant and extreme inputs,
//! must produce a value or a typed error, never a panic.

#![no_main]

use arbitrary::Arbitrary;
use bfc_core::{fit, fit_fixed_intercept, log_abf, log_bf, log_bf_fixed_intercept};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    points: Vec<(f64, bool)>,
    b0: f64,
    prior_variance: f64,
    nodes: u8,
}

fuzz_target!(|input: Input| {
    let points = &input.points[..input.points.len().min(256)];
    let x: Vec<f64> = points.iter().map(|&(x, _)| x).collect();
    let y: Vec<u8> = points.iter().map(|&(_, y)| u8::from(y)).collect();
    let nodes = usize::from(input.nodes);

    if let Ok(out) = fit(&x, &y) {
        assert!(out.std.is_finite() && out.std > 0.0);
        let _ = log_abf(&out, input.prior_variance);
    }
    let _ = fit_fixed_intercept(&x, &y, input.b0);
    if let Ok(lbf) = log_bf(&x, &y, input.prior_variance, nodes) {
        assert!(lbf.is_finite());
    }
    if let Ok(lbf) = log_bf_fixed_intercept(&x, &y, input.b0, input.prior_variance, nodes) {
        assert!(lbf.is_finite());
    }
});
