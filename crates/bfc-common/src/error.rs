//! Error type shared by every bfc crate.
//!
//! Each variant carries a static [`ErrorDescriptor`]: a stable numeric code,
//! a category, what a batch driver should do about it, and a one-line fix
//! for humans. The CLI renders errors either as a [`StructuredError`] JSON
//! object or with [`format_error_human`]:
//!
//! ```text
//! ✗ Degenerate Data
//!   Reason: degenerate data: response is perfectly separated by x
//!   Fix: Skip this trial; the slope MLE is infinite for separated data.
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Argument,
    Config,
    /// Fitter, mode search and quadrature failures, including separation.
    Numerical,
    Io,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorCategory::Argument => "argument",
            ErrorCategory::Config => "config",
            ErrorCategory::Numerical => "numerical",
            ErrorCategory::Io => "io",
        })
    }
}

/// What the experiment driver does with a failed trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Record the trial as skipped and carry on with the grid.
    Skip,
    FixArguments,
    FixConfig,
    /// Stop the run.
    Abort,
}

impl fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SuggestedAction::Skip => "skip",
            SuggestedAction::FixArguments => "fix_arguments",
            SuggestedAction::FixConfig => "fix_config",
            SuggestedAction::Abort => "abort",
        })
    }
}

/// Static facts about one error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorDescriptor {
    /// 10-19 arguments and config, 30-39 numerical, 60-69 I/O.
    pub code: u32,
    pub category: ErrorCategory,
    pub action: SuggestedAction,
    pub headline: &'static str,
    pub remediation: &'static str,
}

const INVALID_ARGUMENT: ErrorDescriptor = ErrorDescriptor {
    code: 10,
    category: ErrorCategory::Argument,
    action: SuggestedAction::FixArguments,
    headline: "Invalid Argument",
    remediation: "Check that n > 0, prior_variance > 0 and the node count is between 1 and the supported maximum.",
};

const CONFIG: ErrorDescriptor = ErrorDescriptor {
    code: 11,
    category: ErrorCategory::Config,
    action: SuggestedAction::FixConfig,
    headline: "Configuration Error",
    remediation: "Run 'bfc config validate' on the experiment file, or remove it to use built-in defaults.",
};

const NUMERICAL_DIVERGENCE: ErrorDescriptor = ErrorDescriptor {
    code: 31,
    category: ErrorCategory::Numerical,
    action: SuggestedAction::Skip,
    headline: "Numerical Divergence",
    remediation: "Skip this trial. If it happens often, raise max_iterations or widen mode_search_bounds.",
};

const DEGENERATE_DATA: ErrorDescriptor = ErrorDescriptor {
    code: 32,
    category: ErrorCategory::Numerical,
    action: SuggestedAction::Skip,
    headline: "Degenerate Data",
    remediation: "Skip this trial; the slope MLE is infinite for separated data. Larger n makes separation rarer.",
};

const IO: ErrorDescriptor = ErrorDescriptor {
    code: 60,
    category: ErrorCategory::Io,
    action: SuggestedAction::Abort,
    headline: "I/O Error",
    remediation: "Check that the config path exists and is readable.",
};

const JSON: ErrorDescriptor = ErrorDescriptor {
    code: 61,
    category: ErrorCategory::Io,
    action: SuggestedAction::Abort,
    headline: "JSON Error",
    remediation: "Check the file with 'jq .' or regenerate it from 'bfc config show'.",
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("numerical divergence: {0}")]
    NumericalDivergence(String),

    #[error("degenerate data: {0}")]
    DegenerateData(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn descriptor(&self) -> &'static ErrorDescriptor {
        match self {
            Error::InvalidArgument(_) => &INVALID_ARGUMENT,
            Error::Config(_) => &CONFIG,
            Error::NumericalDivergence(_) => &NUMERICAL_DIVERGENCE,
            Error::DegenerateData(_) => &DEGENERATE_DATA,
            Error::Io(_) => &IO,
            Error::Json(_) => &JSON,
        }
    }

    pub fn code(&self) -> u32 {
        self.descriptor().code
    }

    pub fn category(&self) -> ErrorCategory {
        self.descriptor().category
    }

    pub fn suggested_action(&self) -> SuggestedAction {
        self.descriptor().action
    }

    /// Whether the rest of a batch is still meaningful after this error.
    /// True exactly for failures tied to one simulated dataset.
    pub fn is_recoverable(&self) -> bool {
        self.suggested_action() == SuggestedAction::Skip
    }

    pub fn headline(&self) -> &'static str {
        self.descriptor().headline
    }

    pub fn remediation(&self) -> &'static str {
        self.descriptor().remediation
    }
}

/// Machine-readable form of an [`Error`], also stored on skipped trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredError {
    pub code: u32,
    pub category: ErrorCategory,
    pub message: String,
    pub recoverable: bool,
    pub suggested_action: SuggestedAction,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let d = err.descriptor();
        StructuredError {
            code: d.code,
            category: d.category,
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: d.action,
            context: HashMap::new(),
        }
    }
}

impl StructuredError {
    /// Attach a context value. Values that fail to serialize are dropped.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Single-line JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| format!(r#"{{"code":{},"message":"unserializable error"}}"#, self.code))
    }
}

/// Three-line stderr rendering: headline, reason, fix.
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let paint = |code: &str, text: &str| {
        if use_color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    };
    format!(
        "{} {}\n  Reason: {err}\n  {} {}",
        paint("31", "✗"),
        err.headline(),
        paint("36", "Fix:"),
        err.remediation()
    )
}
