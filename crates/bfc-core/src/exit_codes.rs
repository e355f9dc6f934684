//! Process exit codes of the `bfc` binary.
//!
//! - 0-2: the command ran; the code says how it went
//! - 10-19: bad arguments or config, fixable by the user
//! - 20-29: internal or I/O failures

use bfc_common::{Error, ErrorCategory};
use std::fmt;

/// Stable contract for scripts driving `bfc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Every trial completed.
    Clean = 0,
    /// The grid finished with some trials skipped.
    PartialFail = 1,
    /// The single `trial` command hit degenerate data or divergence.
    TrialFailed = 2,
    ArgsError = 10,
    /// Config file missing, malformed or semantically invalid.
    ConfigError = 11,
    InternalError = 20,
    IoError = 21,
}

impl ExitCode {
    const NAMES: [(ExitCode, &'static str); 7] = [
        (ExitCode::Clean, "OK_CLEAN"),
        (ExitCode::PartialFail, "ERR_PARTIAL"),
        (ExitCode::TrialFailed, "ERR_TRIAL"),
        (ExitCode::ArgsError, "ERR_ARGS"),
        (ExitCode::ConfigError, "ERR_CONFIG"),
        (ExitCode::InternalError, "ERR_INTERNAL"),
        (ExitCode::IoError, "ERR_IO"),
    ];

    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// The command itself ran to completion (codes 0-2).
    pub fn is_operational(self) -> bool {
        self.as_i32() < 10
    }

    pub fn is_user_error(self) -> bool {
        (10..20).contains(&self.as_i32())
    }

    pub fn is_internal_error(self) -> bool {
        self.as_i32() >= 20
    }

    /// Name used in JSON error output.
    pub fn code_name(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(code, _)| *code == self)
            .map_or("ERR_INTERNAL", |(_, name)| name)
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match (err.category(), err) {
            (ErrorCategory::Numerical, _) => ExitCode::TrialFailed,
            (ErrorCategory::Argument, _) => ExitCode::ArgsError,
            (ErrorCategory::Config, _) => ExitCode::ConfigError,
            (ErrorCategory::Io, Error::Io(_)) => ExitCode::IoError,
            // Serialization of our own output failing is a bug.
            (ErrorCategory::Io, _) => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
