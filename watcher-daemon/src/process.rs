//! Process effects used by the lifecycle controller.

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

/// Starting detached children and signalling processes by id.
pub trait ProcessControl {
    /// Launch `program` with `args` without waiting for it; returns its pid.
    fn spawn_detached(&self, program: &Path, args: &[OsString]) -> io::Result<u32>;

    /// Deliver a forced termination signal to `pid`.
    fn terminate(&self, pid: u32) -> Result<(), Errno>;
}

/// The real operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcess;

impl ProcessControl for SystemProcess {
    fn spawn_detached(&self, program: &Path, args: &[OsString]) -> io::Result<u32> {
        let mut command = Command::new(program);
        command.args(args).stdin(Stdio::null());
        #[cfg(unix)]
        {
            // Own process group: Ctrl-C in the launching shell must not reach it.
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        // Dropping the handle neither waits for nor kills the child.
        let child = command.spawn()?;
        Ok(child.id())
    }

    fn terminate(&self, pid: u32) -> Result<(), Errno> {
        let raw = i32::try_from(pid).map_err(|_| Errno::EINVAL)?;
        if raw <= 0 {
            return Err(Errno::EINVAL);
        }
        kill(Pid::from_raw(raw), Signal::SIGKILL)
    }
}
