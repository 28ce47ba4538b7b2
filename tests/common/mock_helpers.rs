//! Helpers for running the supervisor against in-memory collaborators

use sensorlog_rs::config::LoggerConfig;
use sensorlog_rs::output::MemorySink;
use sensorlog_rs::storage::{MemoryStorage, SharedStorage, Storage};
use sensorlog_rs::{RunSummary, RunSupervisor, SensorPair};

/// Everything observable after a finished run
pub struct RunOutcome {
    pub summary: RunSummary,
    pub output: MemorySink,
}

/// Run with `storage` as the medium and a memory sink as the console
pub fn run_with_storage(
    config: LoggerConfig,
    sensors: SensorPair,
    storage: impl Storage + 'static,
) -> RunOutcome {
    let output = MemorySink::new();
    let summary = RunSupervisor::new(config, sensors, SharedStorage::new(storage), output.clone())
        .run()
        .expect("run should complete");
    RunOutcome { summary, output }
}

/// Run against a fresh in-memory store and return it for inspection
pub fn run_in_memory(config: LoggerConfig, sensors: SensorPair) -> (RunOutcome, MemoryStorage) {
    let storage = MemoryStorage::new();
    let outcome = run_with_storage(config, sensors, storage.clone());
    (outcome, storage)
}

/// Leading numeric field of each log line (altitude or x acceleration)
pub fn leading_values(lines: &[String]) -> Vec<f64> {
    lines
        .iter()
        .map(|line| {
            let start = line
                .find(|c: char| c.is_ascii_digit() || c == '-')
                .expect("line has a number");
            let rest = &line[start..];
            let end = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
                .unwrap_or(rest.len());
            rest[..end].parse().expect("valid number")
        })
        .collect()
}
