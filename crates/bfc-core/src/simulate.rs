//! Synthetic data from the logistic generative model.
//!
//! `x_i ~ N(0, 1)`, `logit_i = b0 + b·x_i`, `y_i ~ Bernoulli(sigmoid(logit_i))`.
//!
//! The random source is always passed in, so a trial is reproducible from
//! its seed alone. [`trial_rng`] derives an independent stream per trial so
//! trials can be replayed (or run in any order) without sharing state.

use bfc_common::{Error, Result};
use bfc_math::sigmoid;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Bernoulli, Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

/// One simulated dataset. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedDataset {
    x: Vec<f64>,
    y: Vec<u8>,
    logit: Vec<f64>,
}

impl SimulatedDataset {
    /// Covariates.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Binary responses, each 0 or 1.
    pub fn y(&self) -> &[u8] {
        &self.y
    }

    /// Linear predictor used to draw `y`.
    pub fn logit(&self) -> &[f64] {
        &self.logit
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Number of successes.
    pub fn successes(&self) -> usize {
        self.y.iter().filter(|&&v| v != 0).count()
    }
}

/// Draw a dataset of size `n` with true intercept `b0` and slope `b`.
pub fn simulate<R: Rng + ?Sized>(n: usize, b0: f64, b: f64, rng: &mut R) -> Result<SimulatedDataset> {
    if n == 0 {
        return Err(Error::InvalidArgument("sample size must be > 0".to_string()));
    }
    if !b0.is_finite() || !b.is_finite() {
        return Err(Error::InvalidArgument(format!(
            "true coefficients must be finite, got b0={b0} b={b}"
        )));
    }

    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    let mut logit = Vec::with_capacity(n);
    for _ in 0..n {
        let xi: f64 = StandardNormal.sample(rng);
        let eta = b0 + b * xi;
        let draw = Bernoulli::new(sigmoid(eta))
            .map_err(|e| Error::InvalidArgument(format!("invalid success probability: {e}")))?;
        x.push(xi);
        logit.push(eta);
        y.push(u8::from(draw.sample(rng)));
    }

    tracing::trace!(n, b0, b, successes = y.iter().filter(|&&v| v != 0).count(), "simulated dataset");
    Ok(SimulatedDataset { x, y, logit })
}

/// Deterministic per-trial random stream.
///
/// Mixes the base seed with the grid cell and trial index through SplitMix64
/// so neighbouring trials get unrelated streams.
pub fn trial_rng(seed: u64, cell: u64, trial: u64) -> StdRng {
    let mixed = splitmix64(splitmix64(seed ^ splitmix64(cell)) ^ trial);
    StdRng::seed_from_u64(mixed)
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
