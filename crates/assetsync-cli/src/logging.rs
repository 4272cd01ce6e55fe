//! Tracing setup: console layer on stderr plus an optional daily log file.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Prefix of the rolling log files.
pub const LOG_FILE_NAME: &str = "assetsync.log";

/// Filter from `RUST_LOG`, else `level` for every crate.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber.
///
/// Keep the returned guard alive for the lifetime of the process, dropping it
/// flushes the file writer.
pub fn init(level: &str, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = build_filter(level);

    let mut guard = None;
    let file_layer = match log_dir {
        Some(dir) => match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
                let (file_writer, worker_guard) = tracing_appender::non_blocking(file_appender);
                guard = Some(worker_guard);
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(file_writer)
                        .with_ansi(false)
                        .with_filter(env_filter.clone()),
                )
            }
            Err(err) => {
                eprintln!(
                    "Warning: failed to create log directory {}: {}",
                    dir.display(),
                    err
                );
                None
            }
        },
        None => None,
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    // A second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init();

    guard
}
