//! Structured logging for bfc.
//!
//! Results go to stdout; every log line goes to stderr, either as
//! human-readable text or as JSON lines for batch runs.

pub mod config;

pub use config::{LogConfig, LogEnv, LogFilter, LogFormat, LogLevel};

use bfc_common::RunId;
use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crate targets a level filter applies to.
const TARGETS: &[&str] = &["bfc", "bfc_core"];

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(config: &LogConfig) {
    let filter = build_filter(&config.filter);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match (config.format, config.timestamps) {
        (LogFormat::Jsonl, _) => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        (LogFormat::Human, timestamps) => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());
            if timestamps {
                registry.with(layer).try_init()
            } else {
                registry.with(layer.without_time()).try_init()
            }
        }
    };

    if installed.is_err() {
        tracing::debug!("subscriber already installed");
    }
}

/// Filter for the subscriber. Malformed directives fall back to `info`.
fn build_filter(filter: &LogFilter) -> EnvFilter {
    match filter {
        LogFilter::Level(level) => level_filter(*level),
        LogFilter::Directives(directives) => {
            EnvFilter::try_new(directives).unwrap_or_else(|_| level_filter(LogLevel::Info))
        }
    }
}

fn level_filter(level: LogLevel) -> EnvFilter {
    let directives: Vec<String> = TARGETS.iter().map(|t| format!("{t}={level}")).collect();
    EnvFilter::new(directives.join(","))
}

/// Fresh id for one `run` invocation.
pub fn generate_run_id() -> RunId {
    RunId::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_distinct_and_well_formed() {
        let a = generate_run_id();
        let b = generate_run_id();
        assert_ne!(a, b);
        assert!(RunId::parse(a.as_str()).is_some());
    }

    #[test]
    fn level_filter_names_both_targets() {
        let filter = level_filter(LogLevel::Warn).to_string();
        assert!(filter.contains("bfc_core=warn"));
        assert!(filter.contains("bfc=warn"));
    }

    #[test]
    fn bad_directives_fall_back() {
        let filter = build_filter(&LogFilter::Directives("bfc_core=loud".to_string())).to_string();
        assert!(filter.contains("bfc_core=info"));
    }

    #[test]
    fn double_init_does_not_panic() {
        let config = LogConfig::default().with_level(LogLevel::Off);
        init_logging(&config);
        init_logging(&config);
    }
}
