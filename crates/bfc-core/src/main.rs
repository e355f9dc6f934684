//! bfc - compare Wakefield's ABF with the quadrature Bayes factor
//!
//! Commands:
//! - `run`: full grid experiment
//! - `trial`: one simulated dataset
//! - `config show|validate`: inspect the resolved experiment config
//! - `version`

use bfc_common::error::format_error_human;
use bfc_common::{Error, OutputFormat, StructuredError, SCHEMA_VERSION};
use bfc_config::{load_config, load_from_path, ConfigError, ExperimentConfig, LoadedConfig};
use bfc_core::exit_codes::ExitCode;
use bfc_core::experiment::{run_experiment_with_id, run_trial, TrialSettings};
use bfc_core::logging::{generate_run_id, init_logging, LogConfig, LogFormat, LogLevel};
use bfc_core::report::{render_report, render_trial};
use bfc_core::simulate::trial_rng;
use clap::{Args, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Compare Wakefield's asymptotic Bayes factor with the quadrature Bayes factor
#[derive(Parser)]
#[command(name = "bfc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to experiment.json (otherwise BFC_CONFIG, BFC_CONFIG_DIR, XDG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Log level (overrides BFC_LOG)
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Log format on stderr (overrides BFC_LOG_FORMAT)
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the (n, b) grid experiment
    Run(RunArgs),

    /// Simulate and score a single dataset
    Trial(TrialArgs),

    /// Inspect the experiment configuration
    Config(ConfigArgs),

    /// Print version information
    Version,
}

/// Overrides applied on top of the loaded config.
#[derive(Args, Debug, Default)]
struct OverrideArgs {
    /// Prior variance W of the slope
    #[arg(long)]
    prior_variance: Option<f64>,

    /// Gauss-Hermite node count
    #[arg(long)]
    nodes: Option<usize>,

    /// Base random seed
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Sample sizes, comma separated
    #[arg(long, value_delimiter = ',')]
    sample_sizes: Option<Vec<usize>>,

    /// True slopes, comma separated
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    slopes: Option<Vec<f64>>,

    /// True intercept
    #[arg(long, allow_negative_numbers = true)]
    intercept: Option<f64>,

    /// Trials per grid cell
    #[arg(long)]
    trials: Option<usize>,

    #[command(flatten)]
    overrides: OverrideArgs,
}

#[derive(Args, Debug)]
struct TrialArgs {
    /// Sample size
    #[arg(short = 'n', long)]
    n: usize,

    /// True intercept
    #[arg(long, allow_negative_numbers = true)]
    b0: f64,

    /// True slope
    #[arg(long, allow_negative_numbers = true)]
    b: f64,

    /// Trial index within the seed's stream
    #[arg(long, default_value_t = 0)]
    trial: u64,

    #[command(flatten)]
    overrides: OverrideArgs,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the resolved configuration, defaults included
    Show,
    /// Validate a config file (defaults to the resolved one)
    Validate {
        /// Path to the file to validate
        path: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(cli.global.log_level, cli.global.log_format);
    init_logging(&log_config);

    let exit_code = match &cli.command {
        Commands::Run(args) => run_grid(&cli.global, args),
        Commands::Trial(args) => run_single_trial(&cli.global, args),
        Commands::Config(args) => match &args.command {
            ConfigCommands::Show => run_config_show(&cli.global),
            ConfigCommands::Validate { path } => run_config_validate(&cli.global, path.as_ref()),
        },
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Commands
// ============================================================================

fn run_grid(global: &GlobalOpts, args: &RunArgs) -> ExitCode {
    let loaded = match load(global) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let mut config = loaded.config;
    if let Some(sizes) = &args.sample_sizes {
        config.sample_sizes = sizes.clone();
    }
    if let Some(slopes) = &args.slopes {
        config.slopes = slopes.clone();
    }
    if let Some(intercept) = args.intercept {
        config.intercept = intercept;
    }
    if let Some(trials) = args.trials {
        config.trials = trials;
    }
    apply_overrides(&mut config, &args.overrides);

    let run_id = generate_run_id();
    tracing::info!(
        run_id = %run_id,
        config_source = %loaded.source,
        config_path = ?loaded.path,
        "starting run"
    );

    let report = match run_experiment_with_id(&config, run_id) {
        Ok(report) => report,
        Err(err) => return output_error(global, &err),
    };

    match render_report(&report, global.format) {
        Ok(out) => print!("{}", terminated(out)),
        Err(err) => return output_error(global, &err),
    }

    if report.is_partial() {
        tracing::warn!(skipped = report.skipped.len(), "some trials were skipped");
        ExitCode::PartialFail
    } else {
        ExitCode::Clean
    }
}

fn run_single_trial(global: &GlobalOpts, args: &TrialArgs) -> ExitCode {
    let loaded = match load(global) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let mut config = loaded.config;
    apply_overrides(&mut config, &args.overrides);
    if let Err(err) = bfc_config::validate_experiment(&config) {
        return output_error(global, &Error::Config(err.to_string()));
    }

    let settings = TrialSettings::from_config(&config);
    let mut rng = trial_rng(config.seed, 0, args.trial);
    tracing::debug!(n = args.n, b0 = args.b0, b = args.b, seed = config.seed, trial = args.trial, "single trial");

    let result = match run_trial(args.n, args.b0, args.b, &settings, &mut rng) {
        Ok(result) => result,
        Err(err) => return output_error(global, &err),
    };

    match render_trial(&result, global.format) {
        Ok(out) => {
            print!("{}", terminated(out));
            ExitCode::Clean
        }
        Err(err) => output_error(global, &err),
    }
}

fn run_config_show(global: &GlobalOpts) -> ExitCode {
    let loaded = match load(global) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "source": {
                    "kind": loaded.source.to_string(),
                    "path": loaded.path.as_ref().map(|p| p.display().to_string()),
                    "using_defaults": loaded.path.is_none(),
                },
                "config": &loaded.config,
            });
            print_json(global, &response)
        }
        OutputFormat::Csv | OutputFormat::Summary => {
            let c = &loaded.config;
            println!("source: {}", loaded.source);
            if let Some(path) = &loaded.path {
                println!("path: {}", path.display());
            }
            println!("sample_sizes: {:?}", c.sample_sizes);
            println!("slopes: {:?}", c.slopes);
            println!("intercept: {}", c.intercept);
            println!("trials: {}", c.trials);
            println!("prior_variance: {}", c.prior_variance);
            println!("quadrature_nodes: {}", c.quadrature_nodes);
            println!("mode_search_bounds: {:?}", c.mode_search_bounds);
            println!("seed: {}", c.seed);
            ExitCode::Clean
        }
    }
}

fn run_config_validate(global: &GlobalOpts, path: Option<&PathBuf>) -> ExitCode {
    let outcome = match path {
        Some(p) => load_from_path(p).map(|config| (config, Some(p.clone()))),
        None => load_config(global.config.as_deref()).map(|l| (l.config, l.path)),
    };

    match outcome {
        Ok((config, path)) => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "status": "valid",
                "path": path.as_ref().map(|p| p.display().to_string()),
                "cells": config.cell_count(),
                "total_trials": config.total_trials(),
            });
            match global.format {
                OutputFormat::Json | OutputFormat::Jsonl => print_json(global, &response),
                _ => {
                    println!(
                        "valid: {} cells, {} trials",
                        config.cell_count().unwrap_or_default(),
                        config.total_trials().unwrap_or_default()
                    );
                    ExitCode::Clean
                }
            }
        }
        Err(err) => output_config_error(global, &err),
    }
}

fn print_version(global: &GlobalOpts) {
    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            let version_info = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "bfc_version": env!("CARGO_PKG_VERSION"),
            });
            print_json(global, &version_info);
        }
        _ => {
            println!("bfc {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn load(global: &GlobalOpts) -> Result<LoadedConfig, ExitCode> {
    load_config(global.config.as_deref()).map_err(|err| output_config_error(global, &err))
}

fn apply_overrides(config: &mut ExperimentConfig, overrides: &OverrideArgs) {
    if let Some(w) = overrides.prior_variance {
        config.prior_variance = w;
    }
    if let Some(nodes) = overrides.nodes {
        config.quadrature_nodes = nodes;
    }
    if let Some(seed) = overrides.seed {
        config.seed = seed;
    }
}

fn terminated(mut out: String) -> String {
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn print_json(global: &GlobalOpts, value: &serde_json::Value) -> ExitCode {
    let rendered = match global.format {
        OutputFormat::Jsonl => serde_json::to_string(value),
        _ => serde_json::to_string_pretty(value),
    };
    match rendered {
        Ok(s) => {
            println!("{s}");
            ExitCode::Clean
        }
        Err(err) => output_error(global, &Error::from(err)),
    }
}

fn output_config_error(global: &GlobalOpts, err: &ConfigError) -> ExitCode {
    output_error(global, &Error::Config(err.to_string()))
}

/// Report an error on stderr and map it to an exit code.
fn output_error(global: &GlobalOpts, err: &Error) -> ExitCode {
    let code = ExitCode::from(err);
    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            let structured = StructuredError::from(err).with_context("exit_code", code.code_name());
            eprintln!("{}", structured.to_json());
        }
        _ => {
            let use_color = !global.no_color && std::io::stderr().is_terminal();
            eprintln!("{}", format_error_human(err, use_color));
        }
    }
    code
}
