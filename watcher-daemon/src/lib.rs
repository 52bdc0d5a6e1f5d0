//! Lifecycle controller and event loop for the `watcher` daemon.

mod error;
pub mod event_loop;
pub mod lifecycle;
pub mod lockfile;
pub mod log_rotation;
pub mod logging;
pub mod paths;
pub mod process;
mod runtime;
pub mod source;

pub use error::{DaemonError, LifecycleError};
pub use event_loop::{EventLoop, LoopExit, LoopState};
pub use lifecycle::{Decision, Lifecycle, Outcome};
pub use logging::TracingSink;
pub use process::{ProcessControl, SystemProcess};
pub use runtime::{run, start_blocking};
pub use source::{NotificationSource, NotifySource};
