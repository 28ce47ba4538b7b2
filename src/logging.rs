//! Diagnostic logging setup

use crate::config::{LoggingConfig, APP_ID};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` takes precedence over `config.level`. Human-readable output
/// goes to stderr so stdout carries only the run report. When
/// `config.directory` is set, diagnostics are also written to daily-rolling
/// files there; keep the returned guard alive until exit so buffered lines
/// are flushed.
pub fn init_tracing(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, format!("{}.log", APP_ID));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init();

    if let Err(e) = result {
        eprintln!("Logging already initialized: {}", e);
    }
    guard
}
