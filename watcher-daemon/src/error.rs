use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

/// Error surface for the lock record, notification source, event loop and
/// logging setup.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid lock record at {path}: {contents:?} is not a positive process id")]
    InvalidLock { path: PathBuf, contents: String },

    #[error("NewWatcher failed: {0}")]
    Acquire(#[source] notify::Error),

    #[error("Add failed: {path}: {source}")]
    Register {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("notification streams already taken")]
    StreamsTaken,

    #[error("watch registration already bound to a path")]
    AlreadyRegistered,

    #[error("event loop is not registered to a path")]
    NotRegistered,

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("{section} log directory {path} is the watched directory")]
    LogDirWatched { section: &'static str, path: PathBuf },

    #[error("{task} task join failure: {message}")]
    Join { task: &'static str, message: String },
}

/// Failures of the lifecycle controller. Each one ends the invocation.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The daemon child could not be started.
    #[error("start {program} failed with error: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The path of the running executable could not be resolved.
    #[error("cannot locate current executable: {0}")]
    CurrentExe(#[source] std::io::Error),

    /// The child started but its pid could not be recorded.
    #[error("daemon [PID] {pid} started but lock record was not written: {source}")]
    LockWrite {
        pid: u32,
        #[source]
        source: DaemonError,
    },

    /// The lock record is missing, unreadable or malformed.
    #[error(transparent)]
    LockRead(DaemonError),

    /// The termination signal could not be issued.
    #[error("shutdown watcher error: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: Errno,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
