//! Where `experiment.json` is looked for.
//!
//! Candidates in order: `--config`, `$BFC_CONFIG`,
//! `$BFC_CONFIG_DIR/experiment.json`, `<XDG config>/bfc/experiment.json`.
//! The first one that exists wins; with none, built-in defaults apply.

use std::fmt;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "BFC_CONFIG";
pub const ENV_CONFIG_DIR: &str = "BFC_CONFIG_DIR";
pub const CONFIG_FILENAME: &str = "experiment.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    CliArgument,
    /// `BFC_CONFIG` or `BFC_CONFIG_DIR`.
    Environment,
    XdgConfig,
    #[default]
    BuiltinDefault,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigSource::CliArgument => "CLI argument",
            ConfigSource::Environment => "environment variable",
            ConfigSource::XdgConfig => "XDG config",
            ConfigSource::BuiltinDefault => "builtin default",
        })
    }
}

/// Resolve against the process environment and the user's config dir.
pub fn resolve_config_path(cli_path: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    resolve_with(cli_path, |key| std::env::var(key).ok(), xdg_config_dir())
}

/// Resolve with an injected environment and XDG directory.
pub fn resolve_with<E>(
    cli_path: Option<&Path>,
    env: E,
    xdg_dir: Option<PathBuf>,
) -> (Option<PathBuf>, ConfigSource)
where
    E: Fn(&str) -> Option<String>,
{
    let candidates = [
        cli_path.map(|p| (p.to_path_buf(), ConfigSource::CliArgument)),
        env(ENV_CONFIG_PATH).map(|p| (PathBuf::from(p), ConfigSource::Environment)),
        env(ENV_CONFIG_DIR)
            .map(|d| (PathBuf::from(d).join(CONFIG_FILENAME), ConfigSource::Environment)),
        xdg_dir.map(|d| (d.join(CONFIG_FILENAME), ConfigSource::XdgConfig)),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|(path, _)| path.is_file())
        .map_or((None, ConfigSource::BuiltinDefault), |(path, source)| {
            (Some(path), source)
        })
}

/// `<config dir>/bfc`, e.g. `~/.config/bfc` on Linux.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("bfc"))
}
