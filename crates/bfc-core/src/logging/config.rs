//! Log settings resolved from the environment and CLI flags.
//!
//! Level precedence, highest first: `--log-level`, `BFC_LOG`, `RUST_LOG`
//! directives, then `info`. Format: `--log-format`, `BFC_LOG_FORMAT`, then
//! human.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

pub const ENV_LOG_LEVEL: &str = "BFC_LOG";
pub const ENV_LOG_FORMAT: &str = "BFC_LOG_FORMAT";
pub const ENV_RUST_LOG: &str = "RUST_LOG";

/// Where log lines on stderr are rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Terminal reading.
    #[default]
    Human,
    /// One JSON object per event, for log collectors.
    Jsonl,
}

impl LogFormat {
    const ALIASES: &'static [(&'static str, LogFormat)] = &[
        ("human", LogFormat::Human),
        ("text", LogFormat::Human),
        ("jsonl", LogFormat::Jsonl),
        ("json", LogFormat::Jsonl),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Human => "human",
            LogFormat::Jsonl => "jsonl",
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(Self::ALIASES, s).ok_or_else(|| format!("unknown log format '{s}'"))
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verbosity of the `bfc` targets.
///
/// `info` reports run start and per-cell summaries, `warn` adds nothing
/// but skipped trials, `debug` logs each fit and quadrature, `trace` each
/// Newton step.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const ALIASES: &'static [(&'static str, LogLevel)] = &[
        ("off", LogLevel::Off),
        ("quiet", LogLevel::Off),
        ("error", LogLevel::Error),
        ("warn", LogLevel::Warn),
        ("warning", LogLevel::Warn),
        ("info", LogLevel::Info),
        ("debug", LogLevel::Debug),
        ("trace", LogLevel::Trace),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    pub fn filter(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(Self::ALIASES, s).ok_or_else(|| format!("unknown log level '{s}'"))
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn lookup<T: Copy>(table: &[(&str, T)], s: &str) -> Option<T> {
    let s = s.trim();
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(s))
        .map(|&(_, value)| value)
}

/// What decides the subscriber's filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFilter {
    /// A single level applied to the `bfc` targets.
    Level(LogLevel),
    /// Raw `RUST_LOG` directives, used as given.
    Directives(String),
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub filter: LogFilter,
    /// Prefix human lines with a timestamp.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Human,
            filter: LogFilter::Level(LogLevel::Info),
            timestamps: true,
        }
    }
}

/// Raw values of the logging environment variables.
#[derive(Debug, Clone, Default)]
pub struct LogEnv {
    pub level: Option<String>,
    pub rust_log: Option<String>,
    pub format: Option<String>,
}

impl LogEnv {
    pub fn capture() -> Self {
        Self {
            level: std::env::var(ENV_LOG_LEVEL).ok(),
            rust_log: std::env::var(ENV_RUST_LOG).ok(),
            format: std::env::var(ENV_LOG_FORMAT).ok(),
        }
    }
}

impl LogConfig {
    /// Resolve from the process environment with CLI overrides.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::resolve(&LogEnv::capture(), cli_level, cli_format)
    }

    /// Resolve from captured variables. Unparseable values are ignored.
    pub fn resolve(env: &LogEnv, cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        let env_level = env.level.as_deref().and_then(|v| v.parse::<LogLevel>().ok());
        let directives = env
            .rust_log
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        let filter = match (cli_level.or(env_level), directives) {
            (Some(level), _) => LogFilter::Level(level),
            (None, Some(d)) => LogFilter::Directives(d.to_string()),
            (None, None) => LogFilter::Level(LogLevel::default()),
        };
        let format = cli_format
            .or_else(|| env.format.as_deref().and_then(|v| v.parse().ok()))
            .unwrap_or_default();

        Self {
            format,
            filter,
            timestamps: true,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.filter = LogFilter::Level(level);
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(level: Option<&str>, rust_log: Option<&str>, format: Option<&str>) -> LogEnv {
        LogEnv {
            level: level.map(String::from),
            rust_log: rust_log.map(String::from),
            format: format.map(String::from),
        }
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Jsonl));
        assert_eq!(" text ".parse::<LogFormat>(), Ok(LogFormat::Human));
        assert_eq!("Warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("quiet".parse::<LogLevel>(), Ok(LogLevel::Off));
        assert!("xml".parse::<LogFormat>().is_err());
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for level in [LogLevel::Off, LogLevel::Warn, LogLevel::Trace] {
            assert_eq!(level.to_string().parse::<LogLevel>(), Ok(level));
        }
        assert_eq!(LogFormat::Jsonl.to_string(), "jsonl");
    }

    #[test]
    fn levels_are_ordered_by_verbosity() {
        assert!(LogLevel::Off < LogLevel::Error);
        assert!(LogLevel::Debug < LogLevel::Trace);
        assert_eq!(LogLevel::Off.filter(), LevelFilter::OFF);
    }

    #[test]
    fn bfc_log_beats_rust_log() {
        let config = LogConfig::resolve(&env(Some("error"), Some("trace"), None), None, None);
        assert_eq!(config.filter, LogFilter::Level(LogLevel::Error));
    }

    #[test]
    fn rust_log_directives_pass_through() {
        let config = LogConfig::resolve(&env(None, Some("bfc_core=debug"), None), None, None);
        assert_eq!(config.filter, LogFilter::Directives("bfc_core=debug".to_string()));
    }

    #[test]
    fn cli_flags_win() {
        let config = LogConfig::resolve(
            &env(Some("error"), Some("warn"), Some("jsonl")),
            Some(LogLevel::Trace),
            Some(LogFormat::Human),
        );
        assert_eq!(config.filter, LogFilter::Level(LogLevel::Trace));
        assert_eq!(config.format, LogFormat::Human);
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let config = LogConfig::resolve(&env(Some("loud"), Some("  "), Some("xml")), None, None);
        assert_eq!(config, LogConfig::default());
    }
}
