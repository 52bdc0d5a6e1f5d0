//! Domain types for filesystem change notifications.

use std::fmt;
use std::path::{Path, PathBuf};

use bitflags::bitflags;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

bitflags! {
    /// The kind(s) of change reported for a single path.
    ///
    /// Displayed as the member names joined with `|`, always in declaration
    /// order: `CREATE|WRITE|REMOVE|RENAME|CHMOD`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Operation: u8 {
        const CREATE = 1 << 0;
        const WRITE = 1 << 1;
        const REMOVE = 1 << 2;
        const RENAME = 1 << 3;
        const CHMOD = 1 << 4;
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (name, _)) in self.iter_names().enumerate() {
            if index > 0 {
                f.write_str("|")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ChangeEvent
// ---------------------------------------------------------------------------

/// One change to one path, as delivered by the notification source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    path: PathBuf,
    operation: Operation,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, operation: Operation) -> Self {
        Self {
            path: path.into(),
            operation,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }
}

/// Renders the log line body: `<path> <OPS>`.
impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path.display(), self.operation)
    }
}

// ---------------------------------------------------------------------------
// NotificationError
// ---------------------------------------------------------------------------

/// A fault reported by the watch mechanism after registration.
///
/// Opaque: only the text survives, not which path caused it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct NotificationError {
    message: String,
}

impl NotificationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Operation::CREATE, "CREATE")]
    #[case(Operation::WRITE, "WRITE")]
    #[case(Operation::CHMOD, "CHMOD")]
    #[case(Operation::CREATE | Operation::WRITE, "CREATE|WRITE")]
    #[case(Operation::CHMOD | Operation::REMOVE, "REMOVE|CHMOD")]
    fn operation_display_joins_names_in_fixed_order(
        #[case] operation: Operation,
        #[case] expected: &str,
    ) {
        assert_eq!(operation.to_string(), expected);
    }

    #[test]
    fn change_event_renders_path_then_operation() {
        let event = ChangeEvent::new("./tmp/a.txt", Operation::CREATE);
        assert_eq!(event.to_string(), "./tmp/a.txt CREATE");
        assert_eq!(event.path(), Path::new("./tmp/a.txt"));
        assert_eq!(event.operation(), Operation::CREATE);
    }

    #[test]
    fn notification_error_displays_only_its_text() {
        let err = NotificationError::new("event queue overflow");
        assert_eq!(err.to_string(), "event queue overflow");
    }
}
