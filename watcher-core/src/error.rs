//! Error types for watcher-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading `watcher.yaml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error — includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A log sink was configured with an empty directory.
    #[error("log section '{section}' has an empty path")]
    EmptyLogPath { section: &'static str },
}
