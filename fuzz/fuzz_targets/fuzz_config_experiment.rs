//! Fuzz target for experiment.json parsing and validation.
//!
//! Tests that config parsing and semantic validation handle arbitrary input
//! without panicking.

#![no_main]

use bfc_config::{validate_experiment, ExperimentConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Parse errors are expected; validation must never panic on what parses.
    if let Ok(config) = serde_json::from_slice::<ExperimentConfig>(data) {
        let _ = validate_experiment(&config);
    }
});
