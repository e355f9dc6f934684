//! Experiment configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for experiment.json
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation of grids, prior and quadrature settings

pub mod experiment;
pub mod resolve;
pub mod validate;

pub use experiment::{ExperimentConfig, MAX_TOTAL_TRIALS};
pub use resolve::{resolve_config_path, resolve_with, ConfigSource};
pub use validate::{validate_experiment, ValidationError, ValidationResult};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Semantic validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// A validated configuration with provenance information.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ExperimentConfig,
    /// Path the config was read from (None for built-in defaults).
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Load and validate the experiment configuration.
///
/// An explicit `cli_path` must be an existing file; every other location is
/// optional and falls through to the built-in defaults.
pub fn load_config(cli_path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    if let Some(path) = cli_path {
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
    }

    let (path, source) = resolve_config_path(cli_path);
    let config = match &path {
        Some(p) => load_from_path(p)?,
        None => {
            let config = ExperimentConfig::default();
            validate_experiment(&config)?;
            config
        }
    };

    Ok(LoadedConfig {
        config,
        path,
        source,
    })
}

/// Read, parse and validate a config file.
pub fn load_from_path(path: &Path) -> Result<ExperimentConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ExperimentConfig =
        serde_json::from_str(&contents).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;
    validate_experiment(&config)?;
    Ok(config)
}
