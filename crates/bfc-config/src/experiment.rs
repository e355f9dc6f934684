//! Experiment configuration types.
//!
//! These types match the experiment.json file layout. Every field except
//! `schema_version` has a default, so a file only needs to name what it
//! changes.

use bfc_math::quadrature::DEFAULT_NODES;
use serde::{Deserialize, Serialize};

/// Largest number of trials one run may attempt, over all cells.
pub const MAX_TOTAL_TRIALS: usize = 10_000_000;

/// Grid and numerical settings for one ABF-versus-BF experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentConfig {
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Sample sizes to simulate.
    #[serde(default = "default_sample_sizes")]
    pub sample_sizes: Vec<usize>,

    /// True slopes to simulate.
    #[serde(default = "default_slopes")]
    pub slopes: Vec<f64>,

    /// True intercept shared by every grid cell.
    #[serde(default = "default_intercept")]
    pub intercept: f64,

    /// Independent trials per (n, b) cell.
    #[serde(default = "default_trials")]
    pub trials: usize,

    /// Variance W of the Normal(0, W) prior on the slope.
    #[serde(default = "default_prior_variance")]
    pub prior_variance: f64,

    /// Gauss-Hermite node count.
    #[serde(default = "default_quadrature_nodes")]
    pub quadrature_nodes: usize,

    /// Interval searched for the posterior mode in the free-intercept BF.
    #[serde(default = "default_mode_search_bounds")]
    pub mode_search_bounds: [f64; 2],

    /// Iteration cap for the Newton fit and the mode search.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Newton fit tolerance on the relative change of the log-likelihood.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Absolute tolerance on the slope when locating the posterior mode.
    #[serde(default = "default_mode_tolerance")]
    pub mode_tolerance: f64,

    /// Base seed; each trial derives its own stream from it.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_sample_sizes() -> Vec<usize> {
    vec![100, 500, 1000, 5000]
}

fn default_slopes() -> Vec<f64> {
    vec![0.1, 0.25, 0.5, 1.0, 2.0]
}

fn default_intercept() -> f64 {
    -1.0
}

fn default_trials() -> usize {
    20
}

fn default_prior_variance() -> f64 {
    1.0
}

fn default_quadrature_nodes() -> usize {
    DEFAULT_NODES
}

fn default_mode_search_bounds() -> [f64; 2] {
    [-100.0, 100.0]
}

fn default_max_iterations() -> usize {
    100
}

fn default_tolerance() -> f64 {
    1e-10
}

fn default_mode_tolerance() -> f64 {
    1e-10
}

fn default_seed() -> u64 {
    42
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            description: None,
            sample_sizes: default_sample_sizes(),
            slopes: default_slopes(),
            intercept: default_intercept(),
            trials: default_trials(),
            prior_variance: default_prior_variance(),
            quadrature_nodes: default_quadrature_nodes(),
            mode_search_bounds: default_mode_search_bounds(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            mode_tolerance: default_mode_tolerance(),
            seed: default_seed(),
        }
    }
}

impl ExperimentConfig {
    /// Number of (n, b) cells in the grid; None on overflow.
    pub fn cell_count(&self) -> Option<usize> {
        self.sample_sizes.len().checked_mul(self.slopes.len())
    }

    /// Total trials the driver will attempt; None on overflow.
    pub fn total_trials(&self) -> Option<usize> {
        self.cell_count()?.checked_mul(self.trials)
    }

    pub fn with_sample_sizes(mut self, sample_sizes: Vec<usize>) -> Self {
        self.sample_sizes = sample_sizes;
        self
    }

    pub fn with_slopes(mut self, slopes: Vec<f64>) -> Self {
        self.slopes = slopes;
        self
    }

    pub fn with_intercept(mut self, intercept: f64) -> Self {
        self.intercept = intercept;
        self
    }

    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_prior_variance(mut self, prior_variance: f64) -> Self {
        self.prior_variance = prior_variance;
        self
    }

    pub fn with_quadrature_nodes(mut self, nodes: usize) -> Self {
        self.quadrature_nodes = nodes;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: ExperimentConfig =
            serde_json::from_str(r#"{"schema_version": "1.0.0", "trials": 3}"#).unwrap();
        assert_eq!(config.trials, 3);
        assert_eq!(config.quadrature_nodes, 16);
        assert_eq!(config.mode_search_bounds, [-100.0, 100.0]);
        assert_eq!(config.mode_tolerance, 1e-10);
        assert_eq!(config.prior_variance, 1.0);
        assert_eq!(config.sample_sizes, default_sample_sizes());
    }

    #[test]
    fn unknown_fields_rejected() {
        let out = serde_json::from_str::<ExperimentConfig>(
            r#"{"schema_version": "1.0.0", "prior_varience": 2.0}"#,
        );
        assert!(out.is_err());
    }

    #[test]
    fn schema_version_required() {
        let out = serde_json::from_str::<ExperimentConfig>(r#"{"trials": 3}"#);
        assert!(out.is_err());
    }

    #[test]
    fn grid_counts() {
        let config = ExperimentConfig::default()
            .with_sample_sizes(vec![10, 20])
            .with_slopes(vec![0.5, 1.0, 2.0])
            .with_trials(4);
        assert_eq!(config.cell_count(), Some(6));
        assert_eq!(config.total_trials(), Some(24));
    }

    #[test]
    fn total_trials_overflow_is_none() {
        let config = ExperimentConfig::default().with_trials(usize::MAX / 2);
        assert_eq!(config.cell_count(), Some(20));
        assert_eq!(config.total_trials(), None);
    }

    #[test]
    fn serializes_back_to_same_config() {
        let config = ExperimentConfig::default().with_seed(7);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ExperimentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
