//! Experiment driver: simulate, fit and score every cell of an (n, b) grid.
//!
//! Each trial draws its own dataset from [`trial_rng`], so any single trial
//! can be replayed from `(seed, cell, trial)`. Numerical failures on one
//! dataset (separation, non-convergence) skip that trial and are recorded;
//! anything else aborts the run.

use crate::abf::log_abf;
use crate::bf::{log_bf_fixed_intercept_with, log_bf_with, BfOptions};
use crate::fit::FitOptions;
use crate::simulate::{simulate, trial_rng};
use bfc_common::{Error, Result, RunId, StructuredError, SuggestedAction, SCHEMA_VERSION};
use bfc_config::{validate_experiment, ExperimentConfig};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Settings shared by every trial of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialSettings {
    pub prior_variance: f64,
    pub bf: BfOptions,
}

impl Default for TrialSettings {
    fn default() -> Self {
        Self {
            prior_variance: 1.0,
            bf: BfOptions::default(),
        }
    }
}

impl TrialSettings {
    pub fn from_config(config: &ExperimentConfig) -> Self {
        Self {
            prior_variance: config.prior_variance,
            bf: BfOptions {
                nodes: config.quadrature_nodes,
                search_bounds: config.mode_search_bounds,
                mode_tolerance: config.mode_tolerance,
                fit: FitOptions {
                    max_iterations: config.max_iterations,
                    tolerance: config.tolerance,
                },
            },
        }
    }
}

/// Scores from one simulated dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BayesFactorResult {
    pub n: usize,
    /// True intercept.
    pub b0: f64,
    /// True slope.
    pub b: f64,
    /// `bhat / std` from the free-intercept fit.
    pub zhat: f64,
    pub labf: f64,
    pub labf_fixed: f64,
    pub lbf: f64,
    pub lbf_fixed: f64,
}

/// A trial that failed with a skippable numerical error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedTrial {
    pub cell: usize,
    pub trial: usize,
    pub n: usize,
    pub b: f64,
    pub error: StructuredError,
}

/// A completed trial tagged with its grid position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub cell: usize,
    pub trial: usize,
    #[serde(flatten)]
    pub result: BayesFactorResult,
}

/// Per-cell aggregates over completed trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSummary {
    pub cell: usize,
    pub n: usize,
    pub b0: f64,
    pub b: f64,
    pub completed: usize,
    pub skipped: usize,
    pub mean_zhat: Option<f64>,
    pub mean_labf: Option<f64>,
    pub mean_labf_fixed: Option<f64>,
    pub mean_lbf: Option<f64>,
    pub mean_lbf_fixed: Option<f64>,
    /// Mean of `labf / lbf` over trials with `lbf != 0`.
    pub mean_ratio: Option<f64>,
    /// Least-squares slope of labf on lbf through the origin.
    pub origin_slope: Option<f64>,
    /// `1 / b`, the slope the scaling law predicts; None for `b = 0`.
    pub inverse_b: Option<f64>,
}

/// Output of a full grid run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    pub schema_version: String,
    pub run_id: RunId,
    pub generated_at: String,
    pub config: ExperimentConfig,
    pub results: Vec<TrialRecord>,
    pub skipped: Vec<SkippedTrial>,
    pub cells: Vec<CellSummary>,
}

impl ExperimentReport {
    /// Whether any trial was skipped.
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Simulate one dataset and compute all four log scores.
pub fn run_trial<R: Rng + ?Sized>(
    n: usize,
    b0: f64,
    b: f64,
    settings: &TrialSettings,
    rng: &mut R,
) -> Result<BayesFactorResult> {
    let data = simulate(n, b0, b, rng)?;
    let (x, y) = (data.x(), data.y());
    let w = settings.prior_variance;

    let free = log_bf_with(x, y, w, &settings.bf)?;
    let fixed = log_bf_fixed_intercept_with(x, y, b0, w, &settings.bf)?;

    Ok(BayesFactorResult {
        n,
        b0,
        b,
        zhat: free.fit.zhat(),
        labf: log_abf(&free.fit, w)?,
        labf_fixed: log_abf(&fixed.fit, w)?,
        lbf: free.log_bf,
        lbf_fixed: fixed.log_bf,
    })
}

/// Run every trial of every cell in `config`.
///
/// Cells are ordered sample size major, slope minor.
pub fn run_experiment(config: &ExperimentConfig) -> Result<ExperimentReport> {
    run_experiment_with_id(config, RunId::new())
}

/// [`run_experiment`] with a caller-chosen run id.
pub fn run_experiment_with_id(config: &ExperimentConfig, run_id: RunId) -> Result<ExperimentReport> {
    validate_experiment(config).map_err(|e| Error::Config(e.to_string()))?;
    let settings = TrialSettings::from_config(config);

    info!(
        run_id = %run_id,
        cells = config.cell_count().unwrap_or_default(),
        trials = config.total_trials().unwrap_or_default(),
        nodes = config.quadrature_nodes,
        prior_variance = config.prior_variance,
        "experiment started"
    );

    let mut results = Vec::new();
    let mut skipped = Vec::new();
    let mut cells = Vec::new();

    let grid = config
        .sample_sizes
        .iter()
        .flat_map(|&n| config.slopes.iter().map(move |&b| (n, b)));
    for (cell, (n, b)) in grid.enumerate() {
        let mut completed = Vec::new();
        let mut cell_skipped = 0;
        for trial in 0..config.trials {
            let mut rng = trial_rng(config.seed, cell as u64, trial as u64);
            match run_trial(n, config.intercept, b, &settings, &mut rng) {
                Ok(result) => {
                    debug!(cell, trial, n, b, lbf = result.lbf, labf = result.labf, "trial complete");
                    completed.push(result);
                    results.push(TrialRecord { cell, trial, result });
                }
                Err(err) if err.suggested_action() == SuggestedAction::Skip => {
                    warn!(cell, trial, n, b, code = err.code(), error = %err, "trial skipped");
                    cell_skipped += 1;
                    skipped.push(SkippedTrial {
                        cell,
                        trial,
                        n,
                        b,
                        error: StructuredError::from(&err),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        let summary = summarize_cell(cell, n, config.intercept, b, &completed, cell_skipped);
        info!(
            cell,
            n,
            b,
            completed = summary.completed,
            skipped = summary.skipped,
            mean_lbf = summary.mean_lbf,
            origin_slope = summary.origin_slope,
            "cell finished"
        );
        cells.push(summary);
    }

    Ok(ExperimentReport {
        schema_version: SCHEMA_VERSION.to_string(),
        run_id,
        generated_at: chrono::Utc::now().to_rfc3339(),
        config: config.clone(),
        results,
        skipped,
        cells,
    })
}

/// Aggregate the completed trials of one cell.
pub fn summarize_cell(
    cell: usize,
    n: usize,
    b0: f64,
    b: f64,
    completed: &[BayesFactorResult],
    skipped: usize,
) -> CellSummary {
    let ratios: Vec<f64> = completed
        .iter()
        .filter(|r| r.lbf != 0.0)
        .map(|r| r.labf / r.lbf)
        .collect();
    let sxy: f64 = completed.iter().map(|r| r.labf * r.lbf).sum();
    let sxx: f64 = completed.iter().map(|r| r.lbf * r.lbf).sum();

    CellSummary {
        cell,
        n,
        b0,
        b,
        completed: completed.len(),
        skipped,
        mean_zhat: mean(completed.iter().map(|r| r.zhat)),
        mean_labf: mean(completed.iter().map(|r| r.labf)),
        mean_labf_fixed: mean(completed.iter().map(|r| r.labf_fixed)),
        mean_lbf: mean(completed.iter().map(|r| r.lbf)),
        mean_lbf_fixed: mean(completed.iter().map(|r| r.lbf_fixed)),
        mean_ratio: mean(ratios.iter().copied()),
        origin_slope: (sxx > 0.0).then(|| sxy / sxx),
        inverse_b: (b != 0.0).then(|| 1.0 / b),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn result(labf: f64, lbf: f64) -> BayesFactorResult {
        BayesFactorResult {
            n: 100,
            b0: -1.0,
            b: 0.5,
            zhat: 2.0,
            labf,
            labf_fixed: labf,
            lbf,
            lbf_fixed: lbf,
        }
    }

    #[test]
    fn summary_of_empty_cell_has_no_means() {
        let summary = summarize_cell(0, 20, 0.0, 50.0, &[], 3);
        assert_eq!(summary.completed, 0);
        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.mean_lbf, None);
        assert_eq!(summary.origin_slope, None);
        assert_eq!(summary.inverse_b, Some(0.02));
    }

    #[test]
    fn summary_statistics() {
        let rows = [result(1.0, 2.0), result(3.0, 4.0)];
        let summary = summarize_cell(2, 100, -1.0, 0.5, &rows, 0);
        assert_eq!(summary.mean_labf, Some(2.0));
        assert_eq!(summary.mean_lbf, Some(3.0));
        assert_eq!(summary.mean_ratio, Some((0.5 + 0.75) / 2.0));
        // (1·2 + 3·4) / (4 + 16)
        assert_eq!(summary.origin_slope, Some(14.0 / 20.0));
        assert_eq!(summary.inverse_b, Some(2.0));
    }

    #[test]
    fn zero_slope_has_no_inverse() {
        let summary = summarize_cell(0, 100, -1.0, 0.0, &[result(-1.0, -1.5)], 0);
        assert_eq!(summary.inverse_b, None);
    }

    #[test]
    fn trial_is_reproducible_from_its_stream() {
        let settings = TrialSettings::default();
        let a = run_trial(200, -1.0, 0.5, &settings, &mut trial_rng(1, 0, 3)).unwrap();
        let b = run_trial(200, -1.0, 0.5, &settings, &mut trial_rng(1, 0, 3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn trial_scores_are_finite() {
        let settings = TrialSettings::default();
        let r = run_trial(500, -1.0, 0.5, &settings, &mut StdRng::seed_from_u64(5)).unwrap();
        for v in [r.zhat, r.labf, r.labf_fixed, r.lbf, r.lbf_fixed] {
            assert!(v.is_finite());
        }
        assert_eq!((r.n, r.b0, r.b), (500, -1.0, 0.5));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ExperimentConfig::default().with_prior_variance(0.0);
        let err = run_experiment(&config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn settings_follow_config() {
        let config = ExperimentConfig::default()
            .with_prior_variance(0.25)
            .with_quadrature_nodes(32);
        let settings = TrialSettings::from_config(&config);
        assert_eq!(settings.prior_variance, 0.25);
        assert_eq!(settings.bf.nodes, 32);
        assert_eq!(settings.bf.search_bounds, config.mode_search_bounds);
        assert_eq!(settings.bf.fit.max_iterations, config.max_iterations);
        assert_eq!(settings.bf.mode_tolerance, config.mode_tolerance);
    }
}
