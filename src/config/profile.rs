//! Reference run profiles and scheduling choices
//!
//! The logger ships with two reference profiles that mirror how the hardware
//! build was originally tuned:
//!
//! - [`RunProfile::Fast`] - concurrent pipelines, 300 ms / 100 ms periods, 20 s run
//! - [`RunProfile::Slow`] - single-threaded cooperative loop, 2 s / 1 s periods, 30 s run

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the supervisor drives the two channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingMode {
    /// Producer and consumer threads per channel, joined by bounded queues
    #[default]
    Concurrent,
    /// One control thread checking two periodic timers, no queues
    Cooperative,
}

impl fmt::Display for SchedulingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulingMode::Concurrent => write!(f, "concurrent"),
            SchedulingMode::Cooperative => write!(f, "cooperative"),
        }
    }
}

impl FromStr for SchedulingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "concurrent" => Ok(SchedulingMode::Concurrent),
            "cooperative" | "sequential" => Ok(SchedulingMode::Cooperative),
            other => Err(format!("unknown scheduling mode '{}'", other)),
        }
    }
}

/// When a persistence consumer takes the shared storage lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LockOrdering {
    /// Wait for a sample without the lock, lock only around the append
    #[default]
    AppendOnly,
    /// Take the lock first and wait for a sample while holding it.
    ///
    /// Serializes both consumers whenever either queue is empty.
    HoldWhileWaiting,
}

impl fmt::Display for LockOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockOrdering::AppendOnly => write!(f, "append-only"),
            LockOrdering::HoldWhileWaiting => write!(f, "hold-while-waiting"),
        }
    }
}

/// Named reference configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunProfile {
    /// Concurrent mode, short run
    #[default]
    Fast,
    /// Cooperative mode, long run
    Slow,
}

impl RunProfile {
    /// Scheduling mode for this profile
    pub fn mode(&self) -> SchedulingMode {
        match self {
            RunProfile::Fast => SchedulingMode::Concurrent,
            RunProfile::Slow => SchedulingMode::Cooperative,
        }
    }

    /// Environmental channel period in milliseconds
    pub fn environmental_period_ms(&self) -> u64 {
        match self {
            RunProfile::Fast => 300,
            RunProfile::Slow => 2000,
        }
    }

    /// Inertial channel period in milliseconds
    pub fn inertial_period_ms(&self) -> u64 {
        match self {
            RunProfile::Fast => 100,
            RunProfile::Slow => 1000,
        }
    }

    /// Total run duration in milliseconds
    pub fn run_duration_ms(&self) -> u64 {
        match self {
            RunProfile::Fast => 20_000,
            RunProfile::Slow => 30_000,
        }
    }
}

impl FromStr for RunProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fast" => Ok(RunProfile::Fast),
            "slow" => Ok(RunProfile::Slow),
            other => Err(format!("unknown profile '{}'", other)),
        }
    }
}

impl fmt::Display for RunProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunProfile::Fast => write!(f, "fast"),
            RunProfile::Slow => write!(f, "slow"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_values() {
        assert_eq!(RunProfile::Fast.mode(), SchedulingMode::Concurrent);
        assert_eq!(RunProfile::Fast.run_duration_ms(), 20_000);
        assert_eq!(RunProfile::Slow.mode(), SchedulingMode::Cooperative);
        assert_eq!(RunProfile::Slow.environmental_period_ms(), 2000);
        assert_eq!(RunProfile::Slow.inertial_period_ms(), 1000);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Concurrent".parse(), Ok(SchedulingMode::Concurrent));
        assert_eq!("sequential".parse(), Ok(SchedulingMode::Cooperative));
        assert!("parallel".parse::<SchedulingMode>().is_err());
    }
}
