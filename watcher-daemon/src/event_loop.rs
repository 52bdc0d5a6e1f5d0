//! The event loop: one watch registration plus a pump task that serializes
//! change events and notification errors into the log sink.
//!
//! ```text
//! Uninitialized --register()--> Registered --run()--> Running --> Closed
//! ```
//!
//! `Closed` is reached when both source streams close or a shutdown signal
//! arrives. The registration is released on every exit path, including drop.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use watcher_core::LogSink;

use crate::error::DaemonError;
use crate::source::{ErrorStream, EventStream, NotificationSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Uninitialized,
    Registered,
    Running,
    Closed,
}

/// Why a run finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Both the event and the error stream were closed by the source.
    SourceClosed,
    /// The shutdown channel fired; already-queued items were still logged.
    Cancelled,
}

pub struct EventLoop<S: NotificationSource> {
    source: S,
    sink: Arc<dyn LogSink>,
    state: LoopState,
    released: bool,
}

impl<S: NotificationSource> EventLoop<S> {
    pub fn new(source: S, sink: Arc<dyn LogSink>) -> Self {
        Self {
            source,
            sink,
            state: LoopState::Uninitialized,
            released: false,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Bind the single watch registration to `path`.
    pub fn register(&mut self, path: &Path) -> Result<(), DaemonError> {
        if self.state != LoopState::Uninitialized {
            return Err(DaemonError::AlreadyRegistered);
        }
        self.source.register(path)?;
        self.state = LoopState::Registered;
        Ok(())
    }

    /// Spawn the pump and wait for it to finish, then release the source.
    pub async fn run(
        &mut self,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<LoopExit, DaemonError> {
        if self.state != LoopState::Registered {
            return Err(DaemonError::NotRegistered);
        }
        let (events, errors) = self
            .source
            .take_streams()
            .ok_or(DaemonError::StreamsTaken)?;

        self.state = LoopState::Running;
        let pump = tokio::spawn(pump(events, errors, self.sink.clone(), shutdown));
        let joined = pump.await;

        self.release();
        joined.map_err(|err| DaemonError::Join {
            task: "pump",
            message: err.to_string(),
        })
    }

    /// Release the watch registration. Only the first call has any effect.
    pub fn release(&mut self) {
        if !self.released {
            self.source.release();
            self.released = true;
        }
        self.state = LoopState::Closed;
    }
}

impl<S: NotificationSource> Drop for EventLoop<S> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Drain both streams into `sink` until both close or `shutdown` fires.
///
/// A single unbiased `select!` serves both streams so neither starves. Items
/// within a stream are logged in delivery order. Notification errors are
/// logged at info severity, the same as events, and never end the loop.
pub async fn pump(
    mut events: EventStream,
    mut errors: ErrorStream,
    sink: Arc<dyn LogSink>,
    mut shutdown: broadcast::Receiver<()>,
) -> LoopExit {
    let mut events_open = true;
    let mut errors_open = true;
    let mut shutdown_open = true;

    while events_open || errors_open {
        tokio::select! {
            signal = shutdown.recv(), if shutdown_open => match signal {
                // No sender left: nobody can cancel any more.
                Err(RecvError::Closed) => shutdown_open = false,
                Ok(()) | Err(RecvError::Lagged(_)) => {
                    drain(&mut events, &mut errors, sink.as_ref());
                    return LoopExit::Cancelled;
                }
            },
            event = events.recv(), if events_open => match event {
                Some(event) => sink.info(&event.to_string()),
                None => events_open = false,
            },
            err = errors.recv(), if errors_open => match err {
                Some(err) => sink.info(&format!("error: {err}")),
                None => errors_open = false,
            },
        }
    }

    LoopExit::SourceClosed
}

fn drain(events: &mut EventStream, errors: &mut ErrorStream, sink: &dyn LogSink) {
    while let Ok(event) = events.try_recv() {
        sink.info(&event.to_string());
    }
    while let Ok(err) = errors.try_recv() {
        sink.info(&format!("error: {err}"));
    }
}
