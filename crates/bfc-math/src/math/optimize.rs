//! Bounded one-dimensional maximization.
//!
//! Brent's method: golden-section search safeguarded with successive
//! parabolic interpolation. Needs no derivatives and never evaluates outside
//! `[lo, hi]`.

/// (3 - sqrt(5)) / 2, the golden-section ratio.
const GOLDEN: f64 = 0.381_966_011_250_105_1;

/// Outcome of a bounded mode search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeSearch {
    /// Location of the maximum found.
    pub argmax: f64,
    /// Objective value at `argmax`.
    pub value: f64,
    /// Number of objective evaluations after the initial one.
    pub iterations: usize,
    /// Whether the bracket shrank below tolerance within the iteration cap.
    pub converged: bool,
}

impl ModeSearch {
    /// Whether `argmax` sits within `margin` of either end of `[lo, hi]`,
    /// meaning the true maximum may lie outside the searched interval.
    pub fn at_boundary(&self, lo: f64, hi: f64, margin: f64) -> bool {
        self.argmax - lo <= margin || hi - self.argmax <= margin
    }
}

/// Maximize `f` on `[lo, hi]`.
///
/// `tol` is the absolute tolerance on the location; a relative term of
/// sqrt(machine epsilon)·|x| is always added. NaN objective values are
/// treated as -inf. Returns None for non-finite or unordered bounds, a
/// non-positive tolerance or a zero iteration cap.
///
/// # Example
/// ```
/// use bfc_math::optimize::maximize_bounded;
///
/// let out = maximize_bounded(|x| -(x - 2.0) * (x - 2.0), -100.0, 100.0, 1e-10, 200).unwrap();
/// assert!(out.converged);
/// assert!((out.argmax - 2.0).abs() < 1e-6);
/// ```
pub fn maximize_bounded<F: Fn(f64) -> f64>(
    f: F,
    lo: f64,
    hi: f64,
    tol: f64,
    max_iter: usize,
) -> Option<ModeSearch> {
    if !lo.is_finite() || !hi.is_finite() || lo >= hi {
        return None;
    }
    if tol.is_nan() || tol <= 0.0 || max_iter == 0 {
        return None;
    }

    // Minimize the negated objective.
    let objective = |x: f64| {
        let v = f(x);
        if v.is_nan() {
            f64::INFINITY
        } else {
            -v
        }
    };

    let eps = f64::EPSILON.sqrt();
    let tol3 = tol / 3.0;

    let (mut a, mut b) = (lo, hi);
    let mut x = a + GOLDEN * (b - a);
    let (mut v, mut w) = (x, x);
    let mut fx = objective(x);
    let (mut fv, mut fw) = (fx, fx);
    let mut d: f64 = 0.0;
    let mut e: f64 = 0.0;

    let mut converged = false;
    let mut iterations = 0;

    while iterations < max_iter {
        let xm = 0.5 * (a + b);
        let tol1 = eps * x.abs() + tol3;
        let tol2 = 2.0 * tol1;

        if (x - xm).abs() <= tol2 - 0.5 * (b - a) {
            converged = true;
            break;
        }
        iterations += 1;

        let mut p = 0.0;
        let mut q = 0.0;
        let mut r = 0.0;
        if e.abs() > tol1 {
            // Trial parabola through (v, fv), (w, fw), (x, fx).
            r = (x - w) * (fx - fv);
            q = (x - v) * (fx - fw);
            p = (x - v) * q - (x - w) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            } else {
                q = -q;
            }
            r = e;
            e = d;
        }

        let parabola_unusable = !p.is_finite() || !q.is_finite();
        if parabola_unusable
            || p.abs() >= (0.5 * q * r).abs()
            || p <= q * (a - x)
            || p >= q * (b - x)
        {
            e = if x < xm { b - x } else { a - x };
            d = GOLDEN * e;
        } else {
            d = p / q;
            let u = x + d;
            if u - a < tol2 || b - u < tol2 {
                d = if x < xm { tol1 } else { -tol1 };
            }
        }

        let u = if d.abs() >= tol1 {
            x + d
        } else if d > 0.0 {
            x + tol1
        } else {
            x - tol1
        };
        let fu = objective(u);

        if fu <= fx {
            if u < x {
                b = x;
            } else {
                a = x;
            }
            v = w;
            fv = fw;
            w = x;
            fw = fx;
            x = u;
            fx = fu;
        } else {
            if u < x {
                a = u;
            } else {
                b = u;
            }
            if fu <= fw || w == x {
                v = w;
                fv = fw;
                w = u;
                fw = fu;
            } else if fu <= fv || v == x || v == w {
                v = u;
                fv = fu;
            }
        }
    }

    Some(ModeSearch {
        argmax: x,
        value: -fx,
        iterations,
        converged,
    })
}
