//! SensorLog-RS - Main Entry Point
//!
//! Runs one logging session with the simulated BMP280 and MPU6050 and
//! writes the per-channel logs under the configured storage root.
//!
//! # Usage
//!
//! ```bash
//! sensorlog-rs --profile slow
//! sensorlog-rs --config logger.toml --duration-ms 5000
//! sensorlog-rs --write-config logger.toml
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use sensorlog_rs::{
    config::{default_config_path, ConfigOverrides, LoggerConfig, RunProfile, SchedulingMode},
    logging,
    output::{OutputSink, StdoutSink, TranscriptSink},
    sensor::{SimulatedBmp280, SimulatedMpu6050},
    storage::{FileStorage, SharedStorage},
    supervisor::{RunSupervisor, SensorPair},
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Process exit status of a finished run
const EXIT_OK: u8 = 0;
/// Process exit status of a configuration, initialization or run failure
const EXIT_FAILURE: u8 = 1;

#[derive(Parser, Debug)]
#[command(name = "sensorlog-rs", version)]
#[command(about = "Dual-channel sensor logger with durable per-channel logs", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reference profile: fast or slow
    #[arg(long)]
    profile: Option<RunProfile>,

    /// Override the total run duration
    #[arg(long)]
    duration_ms: Option<u64>,

    /// Override the scheduling mode: concurrent or cooperative
    #[arg(long)]
    mode: Option<SchedulingMode>,

    /// Override the storage root directory
    #[arg(long)]
    storage_root: Option<PathBuf>,

    /// Also copy the console report into this file
    #[arg(long)]
    transcript: Option<PathBuf>,

    /// Write the run summary as JSON to this file
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Write the effective configuration to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_file: self.config.clone(),
            profile: self.profile,
            duration_ms: self.duration_ms,
            mode: self.mode,
            storage_root: self.storage_root.clone(),
            transcript: self.transcript.clone(),
            summary_json: self.summary_json.clone(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    ExitCode::from(execute(&cli, default_config_path().as_deref()))
}

/// Resolve the configuration, then either write it out or run
fn execute(cli: &Cli, default_file: Option<&std::path::Path>) -> u8 {
    let config = match cli.overrides().resolve(default_file) {
        Ok(config) => config,
        Err(e) => {
            let mut output = StdoutSink;
            output.write_line(&e.to_string());
            output.flush();
            return EXIT_FAILURE;
        }
    };

    let _log_guard = logging::init_tracing(&config.logging);

    if let Some(path) = &cli.write_config {
        return match config.save(path) {
            Ok(()) => {
                tracing::info!("Wrote configuration to {:?}", path);
                EXIT_OK
            }
            Err(e) => {
                tracing::error!("{}", e);
                StdoutSink.write_line(&e.to_string());
                EXIT_FAILURE
            }
        };
    }

    match run(config) {
        Ok(()) => EXIT_OK,
        Err(e) => {
            tracing::error!("Run aborted: {:#}", e);
            EXIT_FAILURE
        }
    }
}

fn run(config: LoggerConfig) -> Result<()> {
    tracing::info!(
        mode = %config.mode,
        root = %config.storage.root.display(),
        "Starting sensor logger"
    );

    let mut output: Box<dyn OutputSink> = match &config.output.transcript_path {
        Some(path) => match TranscriptSink::create(path, StdoutSink) {
            Ok(sink) => Box::new(sink),
            Err(e) => {
                StdoutSink.write_line(&format!("Failed to create transcript {}: {}", path.display(), e));
                return Err(e).with_context(|| format!("creating transcript {}", path.display()));
            }
        },
        None => Box::new(StdoutSink),
    };

    let storage = match FileStorage::mount(&config.storage.root) {
        Ok(storage) => storage,
        Err(e) => {
            output.write_line("Failed to mount the file system!");
            output.flush();
            return Err(e).context("mounting storage");
        }
    };

    let sensors = SensorPair::new(
        SimulatedBmp280::from_config(&config),
        SimulatedMpu6050::from_config(&config),
    );

    let summary = RunSupervisor::new(config, sensors, SharedStorage::new(storage), output).run()?;
    tracing::info!(elapsed_ms = summary.elapsed_ms, "Run finished");
    Ok(())
}
