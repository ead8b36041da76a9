//! OpenTelemetry log records and their time-ordered store.

pub mod storage;
pub mod types;

pub use storage::LogStore;
pub use types::{LogRecord, LogSeverity, Severity};
