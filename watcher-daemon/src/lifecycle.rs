//! Startup mode selection: daemonize, help, shutdown, or run in the
//! foreground.
//!
//! The controller performs the side effects of each mode but never exits the
//! process. It reports an [`Outcome`] or a [`LifecycleError`] and the binary
//! maps those to exit codes.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use nix::errno::Errno;
use watcher_core::LogSink;

use crate::error::LifecycleError;
use crate::lockfile;
use crate::paths::lock_path;
use crate::process::{ProcessControl, SystemProcess};

/// Startup mode, chosen from the command-line flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Daemonize,
    Help,
    Shutdown,
    Foreground,
}

impl Decision {
    /// Fixed priority: daemonize, then help, then shutdown.
    pub fn from_flags(daemon: bool, help: bool, shutdown: bool) -> Self {
        if daemon {
            Self::Daemonize
        } else if help {
            Self::Help
        } else if shutdown {
            Self::Shutdown
        } else {
            Self::Foreground
        }
    }
}

/// What happened; everything except `Proceed` ends the invocation with 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A detached child was started and its pid recorded.
    Daemonized { pid: u32 },
    /// The caller should print usage.
    Help,
    /// The kill signal was issued. `stale` is set when no such process existed.
    ShutdownSent { pid: u32, stale: bool },
    /// Continue into the event loop.
    Proceed,
}

pub struct Lifecycle<P = SystemProcess> {
    sink: Arc<dyn LogSink>,
    process: P,
    dir: PathBuf,
    program: Option<PathBuf>,
}

impl Lifecycle<SystemProcess> {
    /// Controller acting on the real OS, with its lock record in `dir`.
    pub fn system(sink: Arc<dyn LogSink>, dir: impl Into<PathBuf>) -> Self {
        Self::new(sink, SystemProcess, dir)
    }
}

impl<P: ProcessControl> Lifecycle<P> {
    pub fn new(sink: Arc<dyn LogSink>, process: P, dir: impl Into<PathBuf>) -> Self {
        Self {
            sink,
            process,
            dir: dir.into(),
            program: None,
        }
    }

    /// Re-exec `program` instead of the current executable when daemonizing.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn lock_path(&self) -> PathBuf {
        lock_path(&self.dir)
    }

    /// Carry out `decision`. `args` are the trailing arguments forwarded to a
    /// daemon child.
    pub fn execute(
        &self,
        decision: Decision,
        args: &[OsString],
    ) -> Result<Outcome, LifecycleError> {
        match decision {
            Decision::Daemonize => self.daemonize(args),
            Decision::Help => Ok(Outcome::Help),
            Decision::Shutdown => self.shutdown(),
            Decision::Foreground => Ok(Outcome::Proceed),
        }
    }

    fn daemonize(&self, args: &[OsString]) -> Result<Outcome, LifecycleError> {
        let program = self.program()?;
        let pid = self
            .process
            .spawn_detached(&program, args)
            .map_err(|source| LifecycleError::Spawn {
                program: program.clone(),
                source,
            })?;

        lockfile::write_pid(&self.lock_path(), pid)
            .map_err(|source| LifecycleError::LockWrite { pid, source })?;

        self.sink
            .info(&format!("{} [PID] {pid} running...", program.display()));
        Ok(Outcome::Daemonized { pid })
    }

    fn shutdown(&self) -> Result<Outcome, LifecycleError> {
        let lock = self.lock_path();
        let pid = lockfile::read_pid(&lock).map_err(LifecycleError::LockRead)?;

        let stale = match self.process.terminate(pid) {
            Ok(()) => false,
            Err(Errno::ESRCH) => {
                self.sink.warn(&format!(
                    "no process with [PID] {pid}; lock record {} is stale",
                    lock.display()
                ));
                true
            }
            Err(source) => return Err(LifecycleError::Signal { pid, source }),
        };

        self.sink.info("watcher is down");
        Ok(Outcome::ShutdownSent { pid, stale })
    }

    fn program(&self) -> Result<PathBuf, LifecycleError> {
        match &self.program {
            Some(program) => Ok(program.clone()),
            None => std::env::current_exe().map_err(LifecycleError::CurrentExe),
        }
    }
}

impl<P> std::fmt::Debug for Lifecycle<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("dir", &self.dir)
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}
