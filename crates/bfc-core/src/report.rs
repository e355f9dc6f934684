//! Rendering of experiment results for stdout.

use crate::experiment::{BayesFactorResult, ExperimentReport};
use bfc_common::{OutputFormat, Result};
use std::fmt::Write as _;

const CSV_HEADER: &str = "cell,trial,n,b0,b,zhat,labf,labf_fixed,lbf,lbf_fixed";

/// Render a full report in the requested format.
pub fn render_report(report: &ExperimentReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Jsonl => render_jsonl(report),
        OutputFormat::Csv => Ok(render_csv(report)),
        OutputFormat::Summary => Ok(render_summary(report)),
    }
}

/// Render a single trial (the `trial` command).
pub fn render_trial(result: &BayesFactorResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Jsonl => Ok(serde_json::to_string(result)?),
        OutputFormat::Csv => Ok(format!("{CSV_HEADER}\n{}", csv_row(0, 0, result))),
        OutputFormat::Summary => Ok(format!(
            "n={} b0={} b={}  zhat={:.3}\n  labf={:.4}  labf_fixed={:.4}\n  lbf={:.4}  lbf_fixed={:.4}",
            result.n,
            result.b0,
            result.b,
            result.zhat,
            result.labf,
            result.labf_fixed,
            result.lbf,
            result.lbf_fixed
        )),
    }
}

/// One JSON object per line: trials, then skipped trials, then cell summaries.
fn render_jsonl(report: &ExperimentReport) -> Result<String> {
    let mut out = String::new();
    for record in &report.results {
        let mut value = serde_json::to_value(record)?;
        tag(&mut value, "trial", report);
        out.push_str(&serde_json::to_string(&value)?);
        out.push('\n');
    }
    for skipped in &report.skipped {
        let mut value = serde_json::to_value(skipped)?;
        tag(&mut value, "skipped", report);
        out.push_str(&serde_json::to_string(&value)?);
        out.push('\n');
    }
    for cell in &report.cells {
        let mut value = serde_json::to_value(cell)?;
        tag(&mut value, "cell", report);
        out.push_str(&serde_json::to_string(&value)?);
        out.push('\n');
    }
    Ok(out)
}

fn tag(value: &mut serde_json::Value, kind: &str, report: &ExperimentReport) {
    if let Some(obj) = value.as_object_mut() {
        obj.insert("kind".to_string(), kind.into());
        obj.insert("run_id".to_string(), report.run_id.as_str().into());
    }
}

fn render_csv(report: &ExperimentReport) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for record in &report.results {
        out.push_str(&csv_row(record.cell, record.trial, &record.result));
        out.push('\n');
    }
    out
}

fn csv_row(cell: usize, trial: usize, r: &BayesFactorResult) -> String {
    format!(
        "{cell},{trial},{},{},{},{},{},{},{},{}",
        r.n, r.b0, r.b, r.zhat, r.labf, r.labf_fixed, r.lbf, r.lbf_fixed
    )
}

fn render_summary(report: &ExperimentReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({} trials, {} skipped, {} nodes, W={})",
        report.run_id,
        report.results.len(),
        report.skipped.len(),
        report.config.quadrature_nodes,
        report.config.prior_variance
    );
    let _ = writeln!(
        out,
        "{:>7} {:>7} {:>5} {:>9} {:>10} {:>10} {:>8} {:>8}",
        "n", "b", "ok", "zhat", "labf", "lbf", "slope", "1/b"
    );
    for cell in &report.cells {
        let _ = writeln!(
            out,
            "{:>7} {:>7} {:>5} {:>9} {:>10} {:>10} {:>8} {:>8}",
            cell.n,
            cell.b,
            format!("{}/{}", cell.completed, cell.completed + cell.skipped),
            fmt_opt(cell.mean_zhat, 2),
            fmt_opt(cell.mean_labf, 2),
            fmt_opt(cell.mean_lbf, 2),
            fmt_opt(cell.origin_slope, 3),
            fmt_opt(cell.inverse_b, 3),
        );
    }
    out
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => "-".to_string(),
    }
}
