//! CLI tests for the bfc binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

/// Get a Command for the bfc binary with a clean config environment.
fn bfc() -> Command {
    let mut cmd = Command::cargo_bin("bfc").expect("bfc binary should exist");
    cmd.env_remove("BFC_CONFIG")
        .env_remove("BFC_CONFIG_DIR")
        .env_remove("RUST_LOG")
        .env("BFC_LOG", "off");
    cmd
}

fn write_config(dir: &Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("experiment.json");
    std::fs::write(&path, contents).expect("write config");
    path
}

// ============================================================================
// Argument errors
// ============================================================================

mod invalid_arguments {
    use super::*;

    #[test]
    fn unknown_command_fails() {
        bfc()
            .arg("nonexistent-command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn unknown_config_subcommand_fails() {
        bfc()
            .args(["config", "nonexistent"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn trial_requires_coefficients() {
        bfc()
            .args(["trial", "-n", "100"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--b0"));
    }

    #[test]
    fn invalid_format_fails() {
        bfc()
            .args(["--format", "yaml", "version"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid value"));
    }
}

// ============================================================================
// version / config
// ============================================================================

#[test]
fn version_json() {
    bfc()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"bfc_version\""));
}

#[test]
fn version_summary() {
    bfc()
        .args(["--format", "summary", "version"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("bfc "));
}

#[test]
fn config_show_reports_source_and_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), r#"{"schema_version": "1.0.0", "trials": 7}"#);
    let out = bfc()
        .args(["--config", path.to_str().unwrap(), "config", "show"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["config"]["trials"], 7);
    assert_eq!(json["config"]["quadrature_nodes"], 16);
    assert_eq!(json["source"]["kind"], "CLI argument");
}

#[test]
fn config_validate_rejects_bad_prior() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"{"schema_version": "1.0.0", "prior_variance": 0.0}"#,
    );
    bfc()
        .args(["config", "validate", path.to_str().unwrap()])
        .assert()
        .code(11)
        .stderr(predicate::str::contains("prior_variance"));
}

#[test]
fn missing_config_path_is_config_error() {
    bfc()
        .args(["--config", "/nonexistent/experiment.json", "run"])
        .assert()
        .code(11)
        .stderr(predicate::str::contains("\"code\":11"));
}

#[test]
fn config_dir_env_is_honoured() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), r#"{"schema_version": "1.0.0", "seed": 1234}"#);
    bfc()
        .env("BFC_CONFIG_DIR", dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1234"))
        .stdout(predicate::str::contains("environment variable"));
}

// ============================================================================
// trial / run
// ============================================================================

#[test]
fn trial_outputs_all_scores() {
    let out = bfc()
        .args(["trial", "-n", "300", "--b0", "-1", "--b", "0.5", "--seed", "5"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    for key in ["zhat", "labf", "labf_fixed", "lbf", "lbf_fixed"] {
        assert!(json[key].as_f64().unwrap().is_finite(), "{key}");
    }
    assert_eq!(json["n"], 300);
}

#[test]
fn trial_is_reproducible() {
    let run = || {
        bfc()
            .args(["trial", "-n", "200", "--b0=-1", "--b=1", "--seed", "9", "--trial", "2"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone()
    };
    assert_eq!(run(), run());
}

#[test]
fn degenerate_trial_exits_with_trial_failed() {
    // n = 2 with a huge slope is separated for almost every seed; search for one.
    let mut saw_degenerate = false;
    for seed in 0..10 {
        let assert = bfc()
            .args(["trial", "-n", "2", "--b0", "0", "--b", "50", "--seed"])
            .arg(seed.to_string())
            .assert();
        let output = assert.get_output();
        if output.status.code() == Some(2) {
            let stderr = String::from_utf8_lossy(&output.stderr);
            assert!(stderr.contains("\"code\":32"), "{stderr}");
            saw_degenerate = true;
            break;
        }
    }
    assert!(saw_degenerate);
}

#[test]
fn small_grid_run_as_csv() {
    let out = bfc()
        .args([
            "--format",
            "csv",
            "run",
            "--sample-sizes",
            "100,200",
            "--slopes",
            "0.5",
            "--trials",
            "2",
            "--seed",
            "3",
        ])
        .assert()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("cell,trial,n,b0,b,zhat,labf,labf_fixed,lbf,lbf_fixed")
    );
    assert!(lines.count() <= 4);
}

#[test]
fn run_with_separated_cell_is_partial() {
    bfc()
        .args([
            "--format",
            "summary",
            "run",
            "--sample-sizes",
            "4",
            "--slopes",
            "50",
            "--intercept",
            "0",
            "--trials",
            "5",
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("skipped"));
}

#[test]
fn invalid_node_override_is_config_error() {
    bfc()
        .args(["run", "--nodes", "0", "--trials", "1"])
        .assert()
        .code(11);
}

#[test]
fn overflowing_trial_count_is_config_error() {
    bfc()
        .args(["run", "--trials", &usize::MAX.to_string()])
        .assert()
        .code(11)
        .stderr(predicate::str::contains("trials"));
}

#[test]
fn oversized_grid_in_file_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        &format!(
            r#"{{"schema_version": "1.0.0", "sample_sizes": [10, 20, 30, 40, 50], "trials": {}}}"#,
            usize::MAX / 2
        ),
    );
    bfc()
        .args(["config", "validate", path.to_str().unwrap()])
        .assert()
        .code(11)
        .stderr(predicate::str::contains("trials"));
}
