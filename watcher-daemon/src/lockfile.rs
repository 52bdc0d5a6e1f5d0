//! The lock record: a plain-text decimal pid at `watcher.lock`.
//!
//! Written once when an instance daemonizes and read once by a later `-s`
//! invocation. Never checked against the live process table.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::{io_err, DaemonError};

/// Create or truncate `path` (mode `0600`) and write `pid` to it.
pub fn write_pid(path: &Path, pid: u32) -> Result<(), DaemonError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|e| io_err(path, e))?;
    write!(file, "{pid}").map_err(|e| io_err(path, e))?;
    file.sync_all().map_err(|e| io_err(path, e))?;
    set_lock_permissions(path)
}

/// Read the pid recorded at `path`.
///
/// Surrounding whitespace is ignored. Zero, negative and out-of-range values
/// are rejected so a signal can never be aimed at a process group.
pub fn read_pid(path: &Path) -> Result<u32, DaemonError> {
    let contents = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    parse_pid(&contents).ok_or_else(|| DaemonError::InvalidLock {
        path: path.to_path_buf(),
        contents,
    })
}

fn parse_pid(contents: &str) -> Option<u32> {
    let pid: u32 = contents.trim().parse().ok()?;
    (pid > 0 && i32::try_from(pid).is_ok()).then_some(pid)
}

// An existing file keeps its old mode through `open`, so force it.
#[cfg(unix)]
fn set_lock_permissions(path: &Path) -> Result<(), DaemonError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_lock_permissions(_path: &Path) -> Result<(), DaemonError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::lock_path;
    use tempfile::TempDir;

    #[test]
    fn written_pid_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = lock_path(dir.path());

        write_pid(&path, 4242).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "4242");
        assert_eq!(read_pid(&path).unwrap(), 4242);
    }

    #[cfg(unix)]
    #[test]
    fn lock_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = lock_path(dir.path());
        fs::write(&path, "1").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        write_pid(&path, 7).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn rewrite_truncates_previous_record() {
        let dir = TempDir::new().unwrap();
        let path = lock_path(dir.path());

        write_pid(&path, 1_234_567).unwrap();
        write_pid(&path, 89).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "89");
    }

    #[test]
    fn missing_record_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = read_pid(&lock_path(dir.path())).unwrap_err();
        match err {
            DaemonError::Io { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn trailing_newline_is_tolerated() {
        let dir = TempDir::new().unwrap();
        let path = lock_path(dir.path());
        fs::write(&path, "12345\n").unwrap();
        assert_eq!(read_pid(&path).unwrap(), 12345);
    }

    #[test]
    fn malformed_records_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = lock_path(dir.path());

        for contents in ["", "abc", "0", "-5", "12 34", "4294967295"] {
            fs::write(&path, contents).unwrap();
            let err = read_pid(&path).unwrap_err();
            assert!(
                matches!(err, DaemonError::InvalidLock { .. }),
                "{contents:?} should be rejected, got {err}"
            );
        }
    }
}
