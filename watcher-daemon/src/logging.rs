//! Process-wide log output and the [`TracingSink`] handed to components.
//!
//! Console output is always on. When `watcher.yaml` configures file sinks,
//! records below ERROR also go to `<info.path>/info.log` and ERROR records to
//! `<error.path>/error.log`, both as JSON lines with size-based rotation.
//! A sink directory may not be the watched directory itself: every record
//! written there would come back as a change event.

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::{self, format::Writer, time::FormatTime};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry};
use watcher_core::{LogConfig, LogSettings, LogSink};

use crate::error::{io_err, DaemonError};
use crate::log_rotation::{create_log_dir, RotatingFile};
use crate::paths::{error_log_path, info_log_path, ERROR_LOG, INFO_LOG};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// [`LogSink`] that forwards every line to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }
}

/// `2006-01-02 15:04:05` in local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTimestamp;

impl FormatTime for LocalTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Install the global subscriber. Call once at startup.
///
/// Verbosity comes from `RUST_LOG` and defaults to `info`. `watch_dir` is the
/// directory the event loop will watch.
pub fn init(settings: Option<&LogSettings>, watch_dir: &Path) -> Result<(), DaemonError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let mut layers: Vec<BoxedLayer> = vec![fmt::layer()
        .with_timer(LocalTimestamp)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(std::io::stdout().is_terminal())
        .boxed()];
    if let Some(settings) = settings {
        layers.extend(file_layers(settings, watch_dir)?);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|err| DaemonError::Logging(err.to_string()))
}

fn file_layers(settings: &LogSettings, watch_dir: &Path) -> Result<Vec<BoxedLayer>, DaemonError> {
    ensure_unwatched("info", &settings.info, watch_dir)?;
    ensure_unwatched("error", &settings.error, watch_dir)?;

    let info_file = RotatingFile::from_config(&settings.info, INFO_LOG)
        .map_err(|e| io_err(info_log_path(&settings.info.path), e))?;
    let error_file = RotatingFile::from_config(&settings.error, ERROR_LOG)
        .map_err(|e| io_err(error_log_path(&settings.error.path), e))?;

    let info = fmt::layer()
        .json()
        .with_timer(LocalTimestamp)
        .with_file(true)
        .with_line_number(true)
        .with_writer(Mutex::new(info_file))
        .with_filter(filter_fn(|meta| *meta.level() != Level::ERROR))
        .boxed();
    let error = fmt::layer()
        .json()
        .with_timer(LocalTimestamp)
        .with_file(true)
        .with_line_number(true)
        .with_writer(Mutex::new(error_file))
        .with_filter(filter_fn(|meta| *meta.level() == Level::ERROR))
        .boxed();

    Ok(vec![info, error])
}

/// Fail when `config.path` resolves to `watch_dir`. Creates the directory so
/// that symlinks and `..` components resolve.
fn ensure_unwatched(
    section: &'static str,
    config: &LogConfig,
    watch_dir: &Path,
) -> Result<(), DaemonError> {
    create_log_dir(&config.path).map_err(|e| io_err(&config.path, e))?;
    let log_dir = config
        .path
        .canonicalize()
        .map_err(|e| io_err(&config.path, e))?;

    match watch_dir.canonicalize() {
        Ok(watched) if watched == log_dir => Err(DaemonError::LogDirWatched {
            section,
            path: config.path.clone(),
        }),
        Ok(_) => Ok(()),
        // Registration reports a missing watch path later.
        Err(_) => Ok(()),
    }
}
