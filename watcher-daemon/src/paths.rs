use std::path::{Path, PathBuf};

pub const LOCK_FILE: &str = "watcher.lock";

/// The directory every foreground instance watches.
pub const WATCH_PATH: &str = "./";

pub const INFO_LOG: &str = "info.log";
pub const ERROR_LOG: &str = "error.log";

pub fn lock_path(dir: &Path) -> PathBuf {
    dir.join(LOCK_FILE)
}

pub fn info_log_path(log_dir: &Path) -> PathBuf {
    log_dir.join(INFO_LOG)
}

pub fn error_log_path(log_dir: &Path) -> PathBuf {
    log_dir.join(ERROR_LOG)
}
