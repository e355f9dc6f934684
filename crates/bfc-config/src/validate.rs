//! Configuration validation errors and semantic validation.

use crate::experiment::{ExperimentConfig, MAX_TOTAL_TRIALS};
use bfc_math::quadrature::MAX_NODES;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::MissingField(_) => 64,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate an experiment configuration semantically.
pub fn validate_experiment(config: &ExperimentConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if config.sample_sizes.is_empty() {
        return Err(ValidationError::MissingField("sample_sizes".to_string()));
    }
    if let Some(n) = config.sample_sizes.iter().find(|&&n| n == 0) {
        return Err(invalid("sample_sizes", format!("sample size must be > 0, got {n}")));
    }

    if config.slopes.is_empty() {
        return Err(ValidationError::MissingField("slopes".to_string()));
    }
    if let Some(b) = config.slopes.iter().find(|b| !b.is_finite()) {
        return Err(invalid("slopes", format!("slope must be finite, got {b}")));
    }

    if !config.intercept.is_finite() {
        return Err(invalid("intercept", "must be finite"));
    }

    if config.trials == 0 {
        return Err(invalid("trials", "must be > 0"));
    }
    match config.total_trials() {
        Some(total) if total <= MAX_TOTAL_TRIALS => {}
        _ => {
            return Err(invalid(
                "trials",
                format!(
                    "{} sample sizes x {} slopes x {} trials exceeds {MAX_TOTAL_TRIALS} total",
                    config.sample_sizes.len(),
                    config.slopes.len(),
                    config.trials
                ),
            ))
        }
    }

    if !(config.prior_variance.is_finite() && config.prior_variance > 0.0) {
        return Err(invalid(
            "prior_variance",
            format!("must be finite and > 0, got {}", config.prior_variance),
        ));
    }

    if config.quadrature_nodes == 0 || config.quadrature_nodes > MAX_NODES {
        return Err(invalid(
            "quadrature_nodes",
            format!(
                "must be between 1 and {MAX_NODES}, got {}",
                config.quadrature_nodes
            ),
        ));
    }

    let [lo, hi] = config.mode_search_bounds;
    if !lo.is_finite() || !hi.is_finite() || lo >= hi {
        return Err(invalid(
            "mode_search_bounds",
            format!("need finite lo < hi, got [{lo}, {hi}]"),
        ));
    }

    if config.max_iterations == 0 {
        return Err(invalid("max_iterations", "must be > 0"));
    }

    if !(config.tolerance.is_finite() && config.tolerance > 0.0) {
        return Err(invalid("tolerance", "must be finite and > 0"));
    }

    if !(config.mode_tolerance.is_finite() && config.mode_tolerance > 0.0) {
        return Err(invalid("mode_tolerance", "must be finite and > 0"));
    }

    Ok(())
}
