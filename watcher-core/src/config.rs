//! Optional `watcher.yaml` configuration.
//!
//! ```yaml
//! log:
//!   info:  { path: ./logs, size: 10, backups: 5, age: 7 }
//!   error: { path: ./logs, size: 10, backups: 5, age: 7 }
//! ```
//!
//! The file is looked up in the working directory. When it is absent every
//! setting takes its default and logging goes to stdout only.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_FILE: &str = "watcher.yaml";

/// Rotation threshold used when `size` is 0 or omitted.
pub const DEFAULT_MAX_SIZE_MB: u64 = 100;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatcherConfig {
    /// File sinks. `None` keeps logging on stdout only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<LogSettings>,
}

/// Separate file sinks for informational and error records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSettings {
    pub info: LogConfig,
    pub error: LogConfig,
}

/// One rotating log file sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Directory holding the log file; created when missing.
    pub path: PathBuf,
    /// Rotate once the file would exceed this many MiB (0 = default).
    #[serde(default)]
    pub size: u64,
    /// Rotated copies to keep (0 = keep all).
    #[serde(default)]
    pub backups: usize,
    /// Delete rotated copies older than this many days (0 = never).
    #[serde(default)]
    pub age: u64,
}

impl LogConfig {
    pub fn max_bytes(&self) -> u64 {
        let megabytes = if self.size == 0 {
            DEFAULT_MAX_SIZE_MB
        } else {
            self.size
        };
        megabytes.saturating_mul(1024 * 1024)
    }

    pub fn max_backups(&self) -> Option<usize> {
        (self.backups > 0).then_some(self.backups)
    }

    pub fn max_age(&self) -> Option<Duration> {
        (self.age > 0).then(|| Duration::from_secs(self.age.saturating_mul(SECONDS_PER_DAY)))
    }
}

/// `<dir>/watcher.yaml` — pure, no I/O.
pub fn config_path_at(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

/// Load `<dir>/watcher.yaml`, falling back to defaults when it does not exist.
pub fn load_at(dir: &Path) -> Result<WatcherConfig, ConfigError> {
    let path = config_path_at(dir);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(WatcherConfig::default()),
        Err(source) => return Err(ConfigError::Io { path, source }),
    };
    parse(&text, &path)
}

/// Parse and validate a configuration document read from `path`.
pub fn parse(text: &str, path: &Path) -> Result<WatcherConfig, ConfigError> {
    if text.trim().is_empty() {
        return Ok(WatcherConfig::default());
    }

    let config: WatcherConfig =
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    if let Some(log) = &config.log {
        if log.info.path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyLogPath { section: "info" });
        }
        if log.error.path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyLogPath { section: "error" });
        }
    }

    Ok(config)
}
