//! Filesystem notification sources.
//!
//! A source owns one watch registration and exposes two closable streams: one
//! of [`ChangeEvent`]s, one of [`NotificationError`]s. Both close once the
//! source is released.

use std::path::Path;

use notify::event::{ModifyKind, RenameMode};
use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use watcher_core::{ChangeEvent, NotificationError, Operation};

use crate::error::DaemonError;

pub type EventStream = mpsc::UnboundedReceiver<ChangeEvent>;
pub type ErrorStream = mpsc::UnboundedReceiver<NotificationError>;

/// The notification mechanism as seen by the event loop.
pub trait NotificationSource: Send {
    /// Bind the registration to `path`.
    fn register(&mut self, path: &Path) -> Result<(), DaemonError>;

    /// Hand out the event and error streams. Yields `Some` exactly once.
    fn take_streams(&mut self) -> Option<(EventStream, ErrorStream)>;

    /// Release the underlying registration. Idempotent.
    fn release(&mut self);
}

/// Source backed by the platform's recommended `notify` watcher.
pub struct NotifySource {
    watcher: Option<RecommendedWatcher>,
    streams: Option<(EventStream, ErrorStream)>,
}

impl NotifySource {
    /// Initialize the platform watcher.
    pub fn acquire() -> Result<Self, DaemonError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel::<ChangeEvent>();
        let (error_tx, error_rx) = mpsc::unbounded_channel::<NotificationError>();

        let watcher = recommended_watcher(move |result: notify::Result<Event>| match result {
            Ok(event) => {
                for change in change_events(event) {
                    let _ = event_tx.send(change);
                }
            }
            Err(err) => {
                let _ = error_tx.send(NotificationError::new(err.to_string()));
            }
        })
        .map_err(DaemonError::Acquire)?;

        Ok(Self {
            watcher: Some(watcher),
            streams: Some((event_rx, error_rx)),
        })
    }
}

impl NotificationSource for NotifySource {
    fn register(&mut self, path: &Path) -> Result<(), DaemonError> {
        let register_err = |source: notify::Error| DaemonError::Register {
            path: path.to_path_buf(),
            source,
        };
        let watcher = self
            .watcher
            .as_mut()
            .ok_or_else(|| register_err(notify::Error::generic("watch already released")))?;
        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(register_err)
    }

    fn take_streams(&mut self) -> Option<(EventStream, ErrorStream)> {
        self.streams.take()
    }

    fn release(&mut self) {
        // Dropping the watcher drops the handler and with it both senders.
        self.watcher.take();
    }
}

/// Split one backend event into per-path change events.
pub fn change_events(event: Event) -> Vec<ChangeEvent> {
    let Some(operation) = operation_for(&event.kind) else {
        return Vec::new();
    };
    event
        .paths
        .into_iter()
        .map(|path| ChangeEvent::new(path, operation))
        .collect()
}

fn operation_for(kind: &EventKind) -> Option<Operation> {
    match kind {
        EventKind::Create(_) => Some(Operation::CREATE),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(Operation::CREATE),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => None,
        EventKind::Modify(ModifyKind::Name(_)) => Some(Operation::RENAME),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(Operation::CHMOD),
        EventKind::Modify(_) => Some(Operation::WRITE),
        EventKind::Remove(_) => Some(Operation::REMOVE),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn ops(kind: EventKind) -> Option<Operation> {
        operation_for(&kind)
    }

    #[test]
    fn backend_kinds_map_to_operations() {
        assert_eq!(ops(EventKind::Create(CreateKind::File)), Some(Operation::CREATE));
        assert_eq!(
            ops(EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Some(Operation::WRITE)
        );
        assert_eq!(ops(EventKind::Modify(ModifyKind::Any)), Some(Operation::WRITE));
        assert_eq!(
            ops(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions))),
            Some(Operation::CHMOD)
        );
        assert_eq!(
            ops(EventKind::Modify(ModifyKind::Name(RenameMode::From))),
            Some(Operation::RENAME)
        );
        assert_eq!(
            ops(EventKind::Modify(ModifyKind::Name(RenameMode::To))),
            Some(Operation::CREATE)
        );
        assert_eq!(ops(EventKind::Remove(RemoveKind::File)), Some(Operation::REMOVE));
    }

    #[test]
    fn access_and_combined_rename_records_are_not_surfaced() {
        assert_eq!(ops(EventKind::Access(AccessKind::Any)), None);
        assert_eq!(ops(EventKind::Any), None);
        assert_eq!(ops(EventKind::Modify(ModifyKind::Name(RenameMode::Both))), None);

        let event = Event::new(EventKind::Access(AccessKind::Any)).add_path("./a.txt".into());
        assert!(change_events(event).is_empty());
    }

    #[test]
    fn multi_path_event_yields_one_change_per_path_in_order() {
        let event = Event::new(EventKind::Remove(RemoveKind::Any))
            .add_path("./a.txt".into())
            .add_path("./b.txt".into());

        let changes = change_events(event);

        assert_eq!(
            changes,
            vec![
                ChangeEvent::new("./a.txt", Operation::REMOVE),
                ChangeEvent::new("./b.txt", Operation::REMOVE),
            ]
        );
    }

    #[test]
    fn register_missing_path_fails() {
        let dir = TempDir::new().unwrap();
        let missing: PathBuf = dir.path().join("does-not-exist");
        let mut source = NotifySource::acquire().unwrap();

        let err = source.register(&missing).unwrap_err();

        assert!(matches!(err, DaemonError::Register { ref path, .. } if path == &missing));
    }

    #[test]
    fn streams_are_handed_out_once() {
        let mut source = NotifySource::acquire().unwrap();
        assert!(source.take_streams().is_some());
        assert!(source.take_streams().is_none());
    }

    #[test]
    fn register_after_release_fails() {
        let dir = TempDir::new().unwrap();
        let mut source = NotifySource::acquire().unwrap();
        source.release();
        source.release();
        assert!(source.register(dir.path()).is_err());
    }
}
