//! Terminal and JSON-lines logging for harness runs.
//!
//! The terminal layer is compact and human-readable. When a log directory
//! is given, every event is also written as one JSON object per line to
//! `<log_dir>/acid-harness.log.jsonl`, carrying the structured fields the
//! harness attaches (`scenario`, `store`, `verdict`, counts).

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use acid_error::{AcidError, Result};
use parking_lot::{Mutex, MutexGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// File name of the JSON-lines log inside the log directory.
pub const LOG_FILE_NAME: &str = "acid-harness.log.jsonl";

/// Returned by [`init_logging`]. Keep it alive for the whole run.
#[derive(Debug)]
pub struct LogGuard {
    /// Path of the JSON-lines file, if one was opened.
    pub log_path: Option<PathBuf>,
}

/// Serializes whole events onto one shared file handle.
#[derive(Clone)]
struct SharedFileWriter {
    file: Arc<Mutex<File>>,
}

impl SharedFileWriter {
    fn new(file: File) -> Self {
        Self {
            file: Arc::new(Mutex::new(file)),
        }
    }
}

impl<'a> MakeWriter<'a> for SharedFileWriter {
    type Writer = SharedFileGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SharedFileGuard {
            guard: self.file.lock(),
        }
    }
}

struct SharedFileGuard<'a> {
    guard: MutexGuard<'a, File>,
}

impl io::Write for SharedFileGuard<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut *self.guard, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::Write::flush(&mut *self.guard)
    }
}

fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }))
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the default level (`info`, or `debug` when
/// `verbose` is set).
///
/// # Errors
///
/// Returns an error if the log directory or file cannot be created, or if a
/// global subscriber is already installed.
pub fn init_logging(log_dir: Option<&Path>, verbose: bool) -> Result<LogGuard> {
    let terminal_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact();

    let (json_layer, log_path) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let path = dir.join(LOG_FILE_NAME);
            let writer = SharedFileWriter::new(File::create(&path)?);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(true)
                .with_thread_names(true);
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(terminal_layer)
        .with(json_layer)
        .try_init()
        .map_err(|e| AcidError::Internal(format!("logging already initialized: {e}")))?;

    Ok(LogGuard { log_path })
}

/// Terminal-only logging routed through the test writer. Safe to call from
/// every test.
pub fn init_test_logging() {
    let _ = tracing_subscriber::registry()
        .with(default_filter(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_test_writer()
                .compact(),
        )
        .try_init();
}
