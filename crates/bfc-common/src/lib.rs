//! Common types shared by the bfc crates.
//!
//! This crate provides:
//! - The unified error type and its structured JSON form
//! - Run identifiers for log correlation
//! - Output formats for the CLI

pub mod error;
pub mod id;
pub mod output;

pub use error::{Error, ErrorCategory, ErrorDescriptor, Result, StructuredError, SuggestedAction};
pub use id::RunId;
pub use output::OutputFormat;

/// Schema version for serialized experiment reports.
pub const SCHEMA_VERSION: &str = "1.0.0";
