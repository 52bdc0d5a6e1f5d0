use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::broadcast;
use watcher_core::LogSink;

use crate::error::{io_err, DaemonError};
use crate::event_loop::{EventLoop, LoopExit};
use crate::source::NotifySource;

/// Build the runtime and block the current thread on [`run`].
pub fn start_blocking(
    watch_path: &Path,
    sink: Arc<dyn LogSink>,
) -> Result<LoopExit, DaemonError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(watch_path.to_path_buf(), sink))
}

/// Watch `watch_path` until the source closes or SIGINT/SIGTERM arrives.
pub async fn run(
    watch_path: PathBuf,
    sink: Arc<dyn LogSink>,
) -> Result<LoopExit, DaemonError> {
    let source = NotifySource::acquire()?;
    let mut event_loop = EventLoop::new(source, sink.clone());
    event_loop.register(&watch_path)?;

    let terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => Some(stream),
        Err(err) => {
            sink.warn(&format!("SIGTERM handler unavailable: {err}"));
            None
        }
    };

    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let signal_handle = tokio::spawn(forward_shutdown_signals(terminate, shutdown_tx, sink));

    let exit = event_loop.run(shutdown_rx).await;
    signal_handle.abort();
    exit
}

/// Send one shutdown on the first ctrl-c or SIGTERM. Either signal still
/// works when the other could not be installed.
async fn forward_shutdown_signals(
    mut terminate: Option<Signal>,
    shutdown: broadcast::Sender<()>,
    sink: Arc<dyn LogSink>,
) {
    let mut interrupt_armed = true;
    let received = loop {
        tokio::select! {
            result = tokio::signal::ctrl_c(), if interrupt_armed => match result {
                Ok(()) => break "ctrl-c",
                Err(err) => {
                    sink.warn(&format!("ctrl-c handler failed: {err}"));
                    interrupt_armed = false;
                }
            },
            () = next_terminate(&mut terminate) => break "SIGTERM",
        }
    };

    sink.info(&format!("received {received}, shutting down watcher"));
    let _ = shutdown.send(());
}

/// Resolves on the next SIGTERM; never resolves without a stream.
async fn next_terminate(terminate: &mut Option<Signal>) {
    if let Some(stream) = terminate {
        if stream.recv().await.is_some() {
            return;
        }
    }
    std::future::pending::<()>().await
}
