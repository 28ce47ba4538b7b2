//! Run supervision
//!
//! [`RunSupervisor`] owns a run from start to finish:
//!
//! ```text
//! Init ──> Running ──> DrainingReport ──> Halted
//!   │
//!   └── storage or sensor failure: diagnostic on the output sink, error returned
//! ```
//!
//! - **Init** truncates both log files and performs each sensor's handshake.
//! - **Running** hands the sensors to a [`Scheduler`], which samples and
//!   persists until the configured duration has elapsed and then stops and
//!   joins everything it started.
//! - **DrainingReport** reads both logs back, prints them and the counters,
//!   and optionally writes the JSON summary.
//! - **Halted** is terminal; [`RunSupervisor::run`] returns the summary.

mod concurrent;
mod cooperative;
pub mod report;

pub use concurrent::ConcurrentScheduler;
pub use cooperative::{CooperativeScheduler, PeriodicTimer};
pub use report::{ChannelSummary, RunSummary, SensorSummary};

use crate::config::{LoggerConfig, SchedulingMode};
use crate::error::{Result, SensorLogError};
use crate::output::OutputSink;
use crate::pipeline::{QueueStats, RunCounters};
use crate::sensor::SensorSource;
use crate::storage::SharedStorage;
use crate::types::{ChannelId, EnvironmentalSample, InertialSample};
use chrono::Local;
use report::ReportInputs;
use std::fmt;
use std::time::Instant;

/// Boxed barometer source
pub type EnvironmentalSource = Box<dyn SensorSource<Sample = EnvironmentalSample>>;
/// Boxed IMU source
pub type InertialSource = Box<dyn SensorSource<Sample = InertialSample>>;

/// The two sensors of a run
pub struct SensorPair {
    pub environmental: EnvironmentalSource,
    pub inertial: InertialSource,
}

impl SensorPair {
    pub fn new(
        environmental: impl SensorSource<Sample = EnvironmentalSample> + 'static,
        inertial: impl SensorSource<Sample = InertialSample> + 'static,
    ) -> Self {
        Self {
            environmental: Box::new(environmental),
            inertial: Box::new(inertial),
        }
    }
}

/// Shared state handed to a scheduler
pub struct RunContext<'a> {
    pub config: &'a LoggerConfig,
    pub storage: SharedStorage,
    pub counters: RunCounters,
    /// Start of the Running state; the run duration is measured from here
    pub started: Instant,
}

/// What a scheduler hands back after it has stopped all its work
pub struct ScheduleOutcome {
    pub sensors: SensorPair,
    /// Queue statistics in [`ChannelId::ALL`] order, if queues were used
    pub queues: [Option<QueueStats>; 2],
}

/// A strategy for driving both channels for the run duration
///
/// Implementations must not return until every task they started has
/// finished, so the counters are final when the report is built.
pub trait Scheduler: Send {
    fn mode(&self) -> SchedulingMode;

    fn run(&mut self, sensors: SensorPair, ctx: &RunContext<'_>) -> Result<ScheduleOutcome>;
}

/// Scheduler for a configured mode
pub fn scheduler_for(mode: SchedulingMode) -> Box<dyn Scheduler> {
    match mode {
        SchedulingMode::Concurrent => Box::new(ConcurrentScheduler::new()),
        SchedulingMode::Cooperative => Box::new(CooperativeScheduler::new()),
    }
}

/// Supervisor lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Init,
    Running,
    DrainingReport,
    Halted,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorState::Init => write!(f, "INIT"),
            SupervisorState::Running => write!(f, "RUNNING"),
            SupervisorState::DrainingReport => write!(f, "DRAINING_REPORT"),
            SupervisorState::Halted => write!(f, "HALTED"),
        }
    }
}

/// Starts, times, stops and reports one run
pub struct RunSupervisor {
    config: LoggerConfig,
    sensors: Option<SensorPair>,
    storage: SharedStorage,
    output: Box<dyn OutputSink>,
    scheduler: Box<dyn Scheduler>,
    state: SupervisorState,
}

impl RunSupervisor {
    /// Create a supervisor using the scheduler selected by `config.mode`
    pub fn new(
        config: LoggerConfig,
        sensors: SensorPair,
        storage: SharedStorage,
        output: impl OutputSink + 'static,
    ) -> Self {
        let scheduler = scheduler_for(config.mode);
        Self {
            config,
            sensors: Some(sensors),
            storage,
            output: Box::new(output),
            scheduler,
            state: SupervisorState::Init,
        }
    }

    /// Replace the scheduler chosen from the config
    pub fn with_scheduler(mut self, scheduler: Box<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    fn transition(&mut self, next: SupervisorState) {
        tracing::debug!(from = %self.state, to = %next, "Supervisor state change");
        self.state = next;
    }

    /// Execute the whole run and return its summary
    ///
    /// Fails only before any task starts (invalid config, storage or sensor
    /// initialization) or if a task cannot be spawned or panics.
    pub fn run(mut self) -> Result<RunSummary> {
        if let Err(e) = self.config.validate() {
            return Err(self.fail_fatal(e));
        }
        let Some(mut sensors) = self.sensors.take() else {
            return Err(self.fail_init("sensors already consumed".to_string()));
        };
        self.initialize(&mut sensors)?;

        let counters = RunCounters::new();
        let started_at = Local::now();
        let started = Instant::now();
        self.transition(SupervisorState::Running);
        tracing::info!(
            mode = %self.scheduler.mode(),
            duration_ms = self.config.run_duration_ms,
            "Run started"
        );

        let ctx = RunContext {
            config: &self.config,
            storage: self.storage.clone(),
            counters: counters.clone(),
            started,
        };
        let outcome = match self.scheduler.run(sensors, &ctx) {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail_fatal(e)),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        self.transition(SupervisorState::DrainingReport);
        let summary = report::build_summary(ReportInputs {
            config: &self.config,
            started_at,
            elapsed_ms,
            counters: &counters,
            queues: outcome.queues,
            sensors: [
                outcome.sensors.environmental.stats().into(),
                outcome.sensors.inertial.stats().into(),
            ],
            lock: self.storage.stats(),
        });
        report::emit_report(&mut *self.output, &self.storage, &summary);

        if let Some(path) = &self.config.output.summary_json {
            if let Err(e) = summary.write_json(path) {
                tracing::warn!("Failed to write run summary: {}", e);
            }
        }

        for channel in &summary.channels {
            tracing::info!(
                channel = %channel.channel,
                reads = channel.counters.reads,
                saves = channel.counters.saves,
                "Channel finished"
            );
        }

        self.transition(SupervisorState::Halted);
        Ok(summary)
    }

    fn initialize(&mut self, sensors: &mut SensorPair) -> Result<()> {
        let prepared = match self.storage.lock() {
            Ok(mut storage) => {
                let result = ChannelId::ALL.iter().try_for_each(|&channel| {
                    let path = &self.config.channel(channel).log_path;
                    storage
                        .truncate_or_create(path)
                        .map_err(|e| format!("Failed to prepare {}: {}", path, e))
                });
                result
            }
            Err(e) => Err(format!("Failed to prepare log files: {}", e)),
        };
        if let Err(message) = prepared {
            return Err(self.fail_init(message));
        }

        // Handshakes run IMU first, matching the bus bring-up order
        if let Err(e) = sensors.inertial.begin() {
            let message = format!("{} initialization failed: {}", sensors.inertial.name(), e);
            return Err(self.fail_init(message));
        }
        if let Err(e) = sensors.environmental.begin() {
            let message = format!("{} initialization failed: {}", sensors.environmental.name(), e);
            return Err(self.fail_init(message));
        }
        Ok(())
    }

    fn fail_init(&mut self, message: String) -> SensorLogError {
        self.fail_fatal(SensorLogError::Initialization(message))
    }

    /// Put the diagnostic for a run-ending error on the output sink
    fn fail_fatal(&mut self, err: SensorLogError) -> SensorLogError {
        tracing::error!(state = %self.state, "{}", err);
        let message = match &err {
            SensorLogError::Initialization(message) => message.clone(),
            other => other.to_string(),
        };
        self.output.write_line(&message);
        self.output.flush();
        err
    }
}
