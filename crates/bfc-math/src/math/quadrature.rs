//! Gauss-Hermite quadrature for log marginal likelihoods.
//!
//! A rule of `m` nodes integrates `∫ g(x) exp(-x²) dx` exactly for
//! polynomials `g` of degree up to `2m - 1`. To integrate an unnormalized
//! log-density `f` we use the adaptive form: given a Laplace location `mu`
//! and precision `tau`, substitute `b = mu + sqrt(2/tau)·x`, so that
//!
//! ```text
//! ∫ exp(f(b)) db = sqrt(2/tau) · ∫ exp(f(mu + sqrt(2/tau)·x) + x²) · exp(-x²) dx
//! ```
//!
//! When `f` is close to the Gaussian with that location and precision the
//! bracketed factor is nearly constant and a handful of nodes suffice. All
//! accumulation happens in log space, so kernels whose values are far below
//! `exp(-745)` (typical of log-likelihoods for large n) are still handled.

use super::stable::log_sum_exp;

/// Largest supported node count.
pub const MAX_NODES: usize = 200;

/// Default node count used by the Bayes factor calculators.
pub const DEFAULT_NODES: usize = 16;

const NEWTON_EPS: f64 = 3e-14;
const NEWTON_MAX_ITER: usize = 100;
/// pi^(-1/4), the value of the zeroth orthonormal Hermite function.
const PI_POW_NEG_QUARTER: f64 = 0.751_125_544_464_942_5;

/// Gauss-Hermite quadrature rule for the weight `exp(-x²)`.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussHermiteRule {
    /// Quadrature nodes (roots of the physicists' Hermite polynomial), ascending.
    nodes: Vec<f64>,
    /// Quadrature weights, summing to sqrt(pi).
    weights: Vec<f64>,
}

impl GaussHermiteRule {
    /// Compute an `m`-node rule.
    ///
    /// Nodes are found by Newton iteration on the orthonormal Hermite
    /// recurrence, seeded from asymptotic estimates of the largest roots and
    /// extrapolation from the previous two roots for the rest. Returns None
    /// if `m` is zero, exceeds [`MAX_NODES`], or a root fails to converge.
    pub fn new(m: usize) -> Option<Self> {
        if m == 0 || m > MAX_NODES {
            return None;
        }

        let n = m as f64;
        // Roots in descending order; only the non-negative half is solved.
        let mut desc_nodes = vec![0.0f64; m];
        let mut desc_weights = vec![0.0f64; m];
        let half = m.div_ceil(2);
        let mut z = 0.0f64;

        for i in 0..half {
            z = match i {
                0 => (2.0 * n + 1.0).sqrt() - 1.855_75 * (2.0 * n + 1.0).powf(-0.166_67),
                1 => z - 1.14 * n.powf(0.426) / z,
                2 => 1.86 * z - 0.86 * desc_nodes[0],
                3 => 1.91 * z - 0.91 * desc_nodes[1],
                _ => 2.0 * z - desc_nodes[i - 2],
            };

            let mut converged = false;
            let mut derivative = 0.0;
            for _ in 0..NEWTON_MAX_ITER {
                let (value, prev) = orthonormal_hermite(m, z);
                derivative = (2.0 * n).sqrt() * prev;
                if derivative == 0.0 || !derivative.is_finite() {
                    return None;
                }
                let step = value / derivative;
                z -= step;
                if step.abs() <= NEWTON_EPS {
                    converged = true;
                    break;
                }
            }
            if !converged || !z.is_finite() {
                return None;
            }

            let w = 2.0 / (derivative * derivative);
            desc_nodes[i] = z;
            desc_nodes[m - 1 - i] = -z;
            desc_weights[i] = w;
            desc_weights[m - 1 - i] = w;
        }
        if m % 2 == 1 {
            // Odd rules have an exact root at zero.
            desc_nodes[half - 1] = 0.0;
        }

        desc_nodes.reverse();
        desc_weights.reverse();
        Some(Self {
            nodes: desc_nodes,
            weights: desc_weights,
        })
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Plain Gauss-Hermite estimate of `∫ g(x) exp(-x²) dx`.
    pub fn integrate<F: Fn(f64) -> f64>(&self, g: F) -> f64 {
        self.nodes
            .iter()
            .zip(&self.weights)
            .map(|(&x, &w)| w * g(x))
            .sum()
    }
}

/// Evaluate the orthonormal Hermite functions of degree `m` and `m - 1` at `z`.
fn orthonormal_hermite(m: usize, z: f64) -> (f64, f64) {
    let mut p1 = PI_POW_NEG_QUARTER;
    let mut p2 = 0.0;
    for j in 0..m {
        let p3 = p2;
        p2 = p1;
        let jf = j as f64;
        p1 = z * (2.0 / (jf + 1.0)).sqrt() * p2 - (jf / (jf + 1.0)).sqrt() * p3;
    }
    (p1, p2)
}

/// Outcome of an adaptive Gauss-Hermite integration.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureResult {
    /// log ∫ exp(f(b)) db
    pub log_z: f64,
    /// Node locations on the original scale, `mu + sqrt(2/tau)·x_k`.
    pub nodes: Vec<f64>,
    /// Per-node log contributions `ln(w_k) + f(b_k) + x_k² + ln(sqrt(2/tau))`;
    /// their log-sum-exp is `log_z`.
    pub log_terms: Vec<f64>,
}

/// Integrate `exp(log_f)` over the real line with nodes centred at `mode`
/// and scaled by the Laplace `precision`.
///
/// Returns None if `mode` is not finite or `precision` is not a finite
/// positive number. A NaN from `log_f` at any node yields a NaN `log_z`;
/// callers decide how to report it.
///
/// # Example
/// ```
/// use bfc_math::quadrature::{adaptive_gauss_hermite, GaussHermiteRule};
///
/// // exp(-2(b-1)²) integrates to sqrt(pi/2)
/// let rule = GaussHermiteRule::new(8).unwrap();
/// let out = adaptive_gauss_hermite(|b| -2.0 * (b - 1.0) * (b - 1.0), 1.0, 4.0, &rule).unwrap();
/// assert!((out.log_z - (std::f64::consts::PI / 2.0).sqrt().ln()).abs() < 1e-12);
/// ```
pub fn adaptive_gauss_hermite<F: Fn(f64) -> f64>(
    log_f: F,
    mode: f64,
    precision: f64,
    rule: &GaussHermiteRule,
) -> Option<QuadratureResult> {
    if !mode.is_finite() || !precision.is_finite() || precision <= 0.0 {
        return None;
    }
    let scale = (2.0 / precision).sqrt();
    let log_scale = scale.ln();

    let mut nodes = Vec::with_capacity(rule.len());
    let mut log_terms = Vec::with_capacity(rule.len());
    for (&x, &w) in rule.nodes().iter().zip(rule.weights()) {
        let b = mode + scale * x;
        nodes.push(b);
        log_terms.push(w.ln() + log_f(b) + x * x + log_scale);
    }

    let log_z = log_sum_exp(&log_terms);
    Some(QuadratureResult {
        log_z,
        nodes,
        log_terms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    /// ∫ x^(2k) exp(-x²) dx = Γ(k + 1/2) = (2k-1)!! sqrt(pi) / 2^k
    fn even_moment(k: u32) -> f64 {
        let mut double_factorial = 1.0;
        let mut j = 2 * k as i64 - 1;
        while j > 1 {
            double_factorial *= j as f64;
            j -= 2;
        }
        double_factorial * PI.sqrt() / 2f64.powi(k as i32)
    }

    #[test]
    fn rejects_zero_and_oversized_rules() {
        assert!(GaussHermiteRule::new(0).is_none());
        assert!(GaussHermiteRule::new(MAX_NODES + 1).is_none());
        assert!(GaussHermiteRule::new(64).is_some());
    }

    #[test]
    fn one_point_rule() {
        let rule = GaussHermiteRule::new(1).unwrap();
        assert!(approx_eq(rule.nodes()[0], 0.0, 1e-15));
        assert!(approx_eq(rule.weights()[0], PI.sqrt(), 1e-13));
    }

    #[test]
    fn two_point_rule_known_values() {
        let rule = GaussHermiteRule::new(2).unwrap();
        let r = 0.5f64.sqrt();
        assert!(approx_eq(rule.nodes()[0], -r, 1e-13));
        assert!(approx_eq(rule.nodes()[1], r, 1e-13));
        assert!(approx_eq(rule.weights()[0], PI.sqrt() / 2.0, 1e-13));
        assert!(approx_eq(rule.weights()[1], PI.sqrt() / 2.0, 1e-13));
    }

    #[test]
    fn matches_known_7_point_constants() {
        let expected_nodes = [
            -2.651_961_356_835_233,
            -1.673_551_628_767_471,
            -0.816_287_882_858_965,
            0.0,
            0.816_287_882_858_965,
            1.673_551_628_767_471,
            2.651_961_356_835_233,
        ];
        let expected_weights = [
            9.717_812_450_995e-4,
            5.451_558_281_913e-2,
            4.256_072_526_101e-1,
            8.102_646_175_568e-1,
            4.256_072_526_101e-1,
            5.451_558_281_913e-2,
            9.717_812_450_995e-4,
        ];
        let rule = GaussHermiteRule::new(7).unwrap();
        for i in 0..7 {
            assert!(approx_eq(rule.nodes()[i], expected_nodes[i], 1e-12));
            assert!(approx_eq(rule.weights()[i], expected_weights[i], 1e-12));
        }
    }

    #[test]
    fn nodes_ascending_and_symmetric() {
        for m in [3, 16, 32, 64] {
            let rule = GaussHermiteRule::new(m).unwrap();
            assert_eq!(rule.len(), m);
            for w in rule.nodes().windows(2) {
                assert!(w[0] < w[1], "nodes not ascending for m={m}");
            }
            for i in 0..m {
                assert!(approx_eq(rule.nodes()[i], -rule.nodes()[m - 1 - i], 1e-12));
                assert!(approx_eq(rule.weights()[i], rule.weights()[m - 1 - i], 1e-14));
            }
        }
    }

    #[test]
    fn weights_sum_to_sqrt_pi() {
        for m in [1, 2, 5, 16, 32, 100] {
            let rule = GaussHermiteRule::new(m).unwrap();
            let sum: f64 = rule.weights().iter().sum();
            assert!(approx_eq(sum, PI.sqrt(), 1e-12), "m={m} sum={sum}");
        }
    }

    #[test]
    fn moment_exactness_up_to_degree_2m_minus_1() {
        let m = 16;
        let rule = GaussHermiteRule::new(m).unwrap();
        for k in 0..(m as u32) {
            let got = rule.integrate(|x| x.powi(2 * k as i32));
            let expected = even_moment(k);
            assert!(
                (got - expected).abs() <= 1e-10 * expected.max(1.0),
                "degree {}: got {got}, expected {expected}",
                2 * k
            );
            let odd = rule.integrate(|x| x.powi(2 * k as i32 + 1));
            assert!(odd.abs() <= 1e-9 * expected.max(1.0));
        }
    }

    #[test]
    fn gaussian_kernel_is_exact_for_any_rule() {
        // ∫ exp(c - tau/2 (b-mu)²) db = exp(c) sqrt(2 pi / tau)
        let (mu, tau, c) = (0.3, 250.0, -812.5);
        let expected = c + 0.5 * (2.0 * PI / tau).ln();
        for m in [1, 4, 16] {
            let rule = GaussHermiteRule::new(m).unwrap();
            let out = adaptive_gauss_hermite(
                |b| c - 0.5 * tau * (b - mu) * (b - mu),
                mu,
                tau,
                &rule,
            )
            .unwrap();
            assert!(approx_eq(out.log_z, expected, 1e-10), "m={m}");
            assert_eq!(out.nodes.len(), m);
            assert!(approx_eq(log_sum_exp(&out.log_terms), out.log_z, 1e-12));
        }
    }

    #[test]
    fn off_centre_gaussian_is_still_accurate() {
        // Laplace guess slightly wrong in both location and precision.
        let (mu, tau) = (1.0, 4.0);
        let expected = 0.5 * (2.0 * PI / tau).ln();
        let rule = GaussHermiteRule::new(32).unwrap();
        let out = adaptive_gauss_hermite(
            |b| -0.5 * tau * (b - mu) * (b - mu),
            mu + 0.1,
            tau * 1.2,
            &rule,
        )
        .unwrap();
        assert!(approx_eq(out.log_z, expected, 1e-8));
    }

    #[test]
    fn skewed_kernel_matches_log_gamma() {
        // ∫ exp(a b - e^b) db = Γ(a); mode ln(a), curvature a.
        let a: f64 = 20.0;
        let ln_19_factorial = 39.339_884_187_199_495;
        let rule16 = GaussHermiteRule::new(16).unwrap();
        let rule32 = GaussHermiteRule::new(32).unwrap();
        let f = |b: f64| a * b - b.exp();
        let z16 = adaptive_gauss_hermite(f, a.ln(), a, &rule16).unwrap().log_z;
        let z32 = adaptive_gauss_hermite(f, a.ln(), a, &rule32).unwrap().log_z;
        assert!(approx_eq(z16, ln_19_factorial, 1e-3), "z16={z16}");
        assert!(approx_eq(z32, ln_19_factorial, 1e-3), "z32={z32}");
        assert!(approx_eq(z16, z32, 1e-3));
    }

    #[test]
    fn invalid_laplace_parameters_rejected() {
        let rule = GaussHermiteRule::new(4).unwrap();
        assert!(adaptive_gauss_hermite(|b| -b * b, 0.0, 0.0, &rule).is_none());
        assert!(adaptive_gauss_hermite(|b| -b * b, 0.0, -1.0, &rule).is_none());
        assert!(adaptive_gauss_hermite(|b| -b * b, f64::NAN, 1.0, &rule).is_none());
        assert!(adaptive_gauss_hermite(|b| -b * b, 0.0, f64::INFINITY, &rule).is_none());
    }

    #[test]
    fn nan_kernel_propagates() {
        let rule = GaussHermiteRule::new(4).unwrap();
        let out = adaptive_gauss_hermite(|_| f64::NAN, 0.0, 1.0, &rule).unwrap();
        assert!(out.log_z.is_nan());
    }
}
