//! Tracing subscriber setup.
//!
//! Solvers only emit `tracing` events; installing a subscriber is left to the
//! caller. [`init_logging`] gives human-readable stderr output filtered by
//! `RUST_LOG`, plus an optional newline-delimited JSON log file.
//! [`init_test_logging`] routes events through the test harness capture.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

/// Installs the global subscriber.
///
/// With a `logfile`, every event is also written there as JSON. The returned
/// guard must be kept alive for as long as the file should keep flushing.
///
/// # Errors
///
/// Fails if the log file cannot be created.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init_logging(logfile: Option<impl AsRef<Path>>) -> io::Result<Option<WorkerGuard>> {
    let subscriber = registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(io::stderr));

    let Some(path) = logfile else {
        subscriber.init();
        return Ok(None);
    };

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    let (writer, guard) = NonBlockingBuilder::default().lossy(false).finish(file);
    subscriber
        .with(
            fmt::layer()
                .json()
                .with_span_list(true)
                .with_current_span(false)
                .with_writer(writer),
        )
        .init();
    Ok(Some(guard))
}

/// Installs a subscriber writing to the test harness, filtered by
/// `RUST_LOG`. Safe to call from every test: returns `false` if a subscriber
/// was already installed.
pub fn init_test_logging() -> bool {
    registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_test_writer())
        .try_init()
        .is_ok()
}
