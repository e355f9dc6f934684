//! Wakefield ABF versus quadrature Bayes factor for logistic regression.
//!
//! Pipeline for one trial:
//! [`simulate`] → [`fit`] / [`fit_fixed_intercept`] → [`log_abf`] and
//! [`log_bf`] / [`log_bf_fixed_intercept`]. The [`experiment`] module runs
//! that pipeline over a grid of sample sizes and slopes.
//!
//! The binary entry point is in `main.rs`.

pub mod abf;
pub mod bf;
pub mod exit_codes;
pub mod experiment;
pub mod fit;
pub mod kernel;
pub mod logging;
pub mod report;
pub mod simulate;

pub use abf::{log_abf, wakefield_log_abf};
pub use bf::{
    log_bf, log_bf_fixed_intercept, log_bf_fixed_intercept_with, log_bf_with, BayesFactorDetail,
    BfOptions, LaplaceSummary,
};
pub use experiment::{
    run_experiment, run_trial, BayesFactorResult, CellSummary, ExperimentReport, SkippedTrial,
    TrialSettings,
};
pub use fit::{fit, fit_fixed_intercept, FitOptions, LogisticFit};
pub use kernel::{build_kernel, Intercept, LogisticKernel};
pub use simulate::{simulate, trial_rng, SimulatedDataset};
