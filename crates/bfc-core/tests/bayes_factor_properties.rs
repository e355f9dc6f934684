//! Statistical behaviour of the ABF and the quadrature BF across repeated
//! simulated datasets.

use bfc_core::bf::BfOptions;
use bfc_core::experiment::{run_trial, TrialSettings};
use bfc_core::{
    fit, log_abf, log_bf, log_bf_fixed_intercept, log_bf_with, simulate, trial_rng,
    BayesFactorResult,
};

fn trials(n: usize, b0: f64, b: f64, count: u64, seed: u64) -> Vec<BayesFactorResult> {
    let settings = TrialSettings::default();
    (0..count)
        .map(|t| run_trial(n, b0, b, &settings, &mut trial_rng(seed, n as u64, t)).unwrap())
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let v: Vec<f64> = values.collect();
    v.iter().sum::<f64>() / v.len() as f64
}

#[test]
fn all_scores_finite_when_fit_succeeds() {
    for r in trials(300, -1.0, 0.25, 10, 1) {
        for v in [r.zhat, r.labf, r.labf_fixed, r.lbf, r.lbf_fixed] {
            assert!(v.is_finite(), "{r:?}");
        }
    }
}

#[test]
fn null_slope_gives_no_systematic_evidence() {
    let rows = trials(200, -1.0, 0.0, 30, 2);
    for (name, m) in [
        ("labf", mean(rows.iter().map(|r| r.labf))),
        ("labf_fixed", mean(rows.iter().map(|r| r.labf_fixed))),
        ("lbf", mean(rows.iter().map(|r| r.lbf))),
        ("lbf_fixed", mean(rows.iter().map(|r| r.lbf_fixed))),
    ] {
        assert!(m > -5.0 && m < 1.0, "{name} mean = {m}");
    }
}

#[test]
fn evidence_grows_with_sample_size() {
    let small = trials(250, -1.0, 0.5, 20, 3);
    let large = trials(1000, -1.0, 0.5, 20, 3);

    let z_ratio = mean(large.iter().map(|r| r.zhat)) / mean(small.iter().map(|r| r.zhat));
    assert!((1.5..=2.7).contains(&z_ratio), "zhat ratio = {z_ratio}");

    let abf_small = mean(small.iter().map(|r| r.labf.abs()));
    let abf_large = mean(large.iter().map(|r| r.labf.abs()));
    assert!(abf_large > abf_small, "{abf_large} <= {abf_small}");

    let bf_small = mean(small.iter().map(|r| r.lbf.abs()));
    let bf_large = mean(large.iter().map(|r| r.lbf.abs()));
    assert!(bf_large > bf_small, "{bf_large} <= {bf_small}");
}

#[test]
fn abf_tracks_fixed_intercept_bf_at_moderate_n() {
    let rows = trials(1000, -1.0, 0.5, 20, 4);
    let scale = mean(rows.iter().map(|r| r.lbf_fixed.abs()));
    let tolerance = f64::max(0.5, 0.15 * scale);

    let free_gap = mean(rows.iter().map(|r| (r.labf - r.lbf_fixed).abs()));
    assert!(free_gap < tolerance, "|labf - lbf_fixed| = {free_gap}, |lbf_fixed| = {scale}");

    let fixed_gap = mean(rows.iter().map(|r| (r.labf_fixed - r.lbf_fixed).abs()));
    assert!(fixed_gap < tolerance, "|labf_fixed - lbf_fixed| = {fixed_gap}, |lbf_fixed| = {scale}");
}

#[test]
fn exact_bf_outgrows_abf_for_large_effects() {
    let rows = trials(2000, -1.0, 2.0, 5, 5);
    for r in &rows {
        assert!(r.lbf > r.labf, "{r:?}");
        assert!(r.lbf_fixed > r.labf_fixed, "{r:?}");
    }
    let ratio = mean(rows.iter().map(|r| r.labf / r.lbf));
    assert!(ratio < 0.9, "labf/lbf = {ratio}");
}

#[test]
fn node_count_is_a_convergence_parameter() {
    for seed in 0..5 {
        let data = simulate(1000, -1.0, 0.5, &mut trial_rng(6, 0, seed)).unwrap();
        let (x, y) = (data.x(), data.y());

        let free16 = log_bf(x, y, 1.0, 16).unwrap();
        let free32 = log_bf(x, y, 1.0, 32).unwrap();
        assert!((free16 - free32).abs() < 1e-3, "{free16} vs {free32}");

        let fixed16 = log_bf_fixed_intercept(x, y, -1.0, 1.0, 16).unwrap();
        let fixed32 = log_bf_fixed_intercept(x, y, -1.0, 1.0, 32).unwrap();
        assert!((fixed16 - fixed32).abs() < 1e-3, "{fixed16} vs {fixed32}");
    }
}

#[test]
fn abf_from_free_fit_matches_trial_record() {
    let data = simulate(400, -1.0, 0.5, &mut trial_rng(8, 0, 0)).unwrap();
    let free = fit(data.x(), data.y()).unwrap();
    let detail = log_bf_with(data.x(), data.y(), 1.0, &BfOptions::default()).unwrap();
    assert_eq!(detail.fit, free);
    assert_eq!(log_abf(&free, 1.0).unwrap(), log_abf(&detail.fit, 1.0).unwrap());
}

#[test]
fn wider_prior_penalises_null_data() {
    // Under the null a more diffuse prior spreads mass away from the data.
    let data = simulate(500, -1.0, 0.0, &mut trial_rng(9, 0, 0)).unwrap();
    let narrow = log_bf(data.x(), data.y(), 0.1, 16).unwrap();
    let wide = log_bf(data.x(), data.y(), 10.0, 16).unwrap();
    assert!(wide < narrow, "{wide} >= {narrow}");
}
