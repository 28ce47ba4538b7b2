//! End-of-run report and machine-readable summary

use crate::config::{LockOrdering, LoggerConfig, SchedulingMode};
use crate::error::{Result, ResultExt};
use crate::output::OutputSink;
use crate::pipeline::{CounterSnapshot, QueueStats, RunCounters};
use crate::sensor::SensorStats;
use crate::storage::{LockStats, SharedStorage};
use crate::types::ChannelId;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Read statistics of one sensor at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SensorSummary {
    pub successful_reads: u64,
    pub failed_reads: u64,
    pub avg_read_time_us: f64,
    pub max_read_time_us: u64,
    pub jitter_us: u64,
}

impl From<&SensorStats> for SensorSummary {
    fn from(stats: &SensorStats) -> Self {
        Self {
            successful_reads: stats.successful_reads,
            failed_reads: stats.failed_reads,
            avg_read_time_us: stats.avg_read_time_us(),
            max_read_time_us: stats.max_read_time_us,
            jitter_us: stats.jitter_us(),
        }
    }
}

/// Final state of one channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSummary {
    pub channel: ChannelId,
    pub device: &'static str,
    pub log_path: String,
    pub counters: CounterSnapshot,
    /// Present only when the channel ran through a queue
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<QueueStats>,
    pub sensor: SensorSummary,
}

/// Everything a finished run reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub mode: SchedulingMode,
    pub lock_ordering: LockOrdering,
    pub started_at: DateTime<Local>,
    pub run_duration_ms: u64,
    pub elapsed_ms: u64,
    pub channels: Vec<ChannelSummary>,
    pub storage_lock: LockStats,
}

impl RunSummary {
    pub fn channel(&self, channel: ChannelId) -> Option<&ChannelSummary> {
        self.channels.iter().find(|c| c.channel == channel)
    }

    pub fn reads(&self, channel: ChannelId) -> u64 {
        self.channel(channel).map_or(0, |c| c.counters.reads)
    }

    pub fn saves(&self, channel: ChannelId) -> u64 {
        self.channel(channel).map_or(0, |c| c.counters.saves)
    }

    /// Write the summary as pretty-printed JSON
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing summary to {}", path.display()))
    }
}

/// Inputs gathered by the supervisor once all tasks are stopped
pub(crate) struct ReportInputs<'a> {
    pub config: &'a LoggerConfig,
    pub started_at: DateTime<Local>,
    pub elapsed_ms: u64,
    pub counters: &'a RunCounters,
    pub queues: [Option<QueueStats>; 2],
    pub sensors: [SensorSummary; 2],
    pub lock: LockStats,
}

pub(crate) fn build_summary(inputs: ReportInputs<'_>) -> RunSummary {
    let channels = ChannelId::ALL
        .iter()
        .enumerate()
        .map(|(i, &channel)| ChannelSummary {
            channel,
            device: channel.device_name(),
            log_path: inputs.config.channel(channel).log_path.clone(),
            counters: inputs.counters.get(channel).snapshot(),
            queue: inputs.queues[i],
            sensor: inputs.sensors[i],
        })
        .collect();

    RunSummary {
        mode: inputs.config.mode,
        lock_ordering: inputs.config.lock_ordering,
        started_at: inputs.started_at,
        run_duration_ms: inputs.config.run_duration_ms,
        elapsed_ms: inputs.elapsed_ms,
        channels,
        storage_lock: inputs.lock,
    }
}

/// Print both logs front to back, then the four counters
pub(crate) fn emit_report(
    output: &mut dyn OutputSink,
    storage: &SharedStorage,
    summary: &RunSummary,
) {
    output.write_line("Run complete. Saved data:");

    for channel in &summary.channels {
        match storage.read_all(&channel.log_path) {
            Ok(bytes) => {
                output.write_line("");
                output.write_line(&format!("{} data:", channel.device));
                for line in String::from_utf8_lossy(&bytes).lines() {
                    output.write_line(line);
                }
            }
            Err(e) => {
                tracing::warn!(path = %channel.log_path, "Failed to read back log: {}", e);
                output.write_line(&format!(
                    "Error opening {} for reading.",
                    channel.log_path.trim_start_matches('/')
                ));
            }
        }
    }

    output.write_line("");
    output.write_line("Run summary:");
    for channel in &summary.channels {
        output.write_line(&format!("{} reads: {}", channel.device, channel.counters.reads));
        output.write_line(&format!("{} saves: {}", channel.device, channel.counters.saves));
    }
    output.flush();
}
