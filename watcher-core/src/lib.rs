//! watcher-core — domain types, log sink contract, and configuration for the
//! `watcher` filesystem change daemon.

pub mod config;
pub mod error;
pub mod sink;
pub mod types;

pub use config::{LogConfig, LogSettings, WatcherConfig};
pub use error::ConfigError;
pub use sink::LogSink;
pub use types::{ChangeEvent, NotificationError, Operation};
