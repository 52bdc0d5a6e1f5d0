//! The leveled log sink consumed by the lifecycle controller and event loop.

/// Leveled, line-oriented logging dependency.
///
/// Constructed once at startup and handed to each component at construction
/// time. Fatal conditions are returned as errors; only the binary exits.
pub trait LogSink: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}
