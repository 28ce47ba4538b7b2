//! Shared fixtures for the integration tests
//!
//! `builders` shapes configurations and scripted sample sequences;
//! `mock_helpers` runs a supervisor against in-memory collaborators.

#![allow(dead_code)]

pub mod builders;
pub mod mock_helpers;

use std::time::Duration;

/// Ceiling on how long any short test run may take end to end
pub fn run_deadline() -> Duration {
    Duration::from_secs(5)
}

/// Assert every value lies within `tolerance` of `expected`
pub fn assert_all_near(values: &[f64], expected: f64, tolerance: f64) {
    assert!(!values.is_empty(), "no values to compare");
    for (i, value) in values.iter().enumerate() {
        assert!(
            (value - expected).abs() <= tolerance,
            "value #{} = {} is not within {} of {}",
            i,
            value,
            tolerance,
            expected
        );
    }
}
