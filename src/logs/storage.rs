//! Time-ordered log storage

use crate::logs::types::LogRecord;
use std::sync::Arc;

/// Log records kept sorted ascending by event timestamp.
///
/// Records with equal timestamps keep their arrival order. The store itself is
/// not synchronized; the coordinator owns the lock around it.
#[derive(Debug, Default)]
pub struct LogStore {
    logs: Vec<Arc<LogRecord>>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record at its timestamp position, after any equal timestamps.
    pub fn insert(&mut self, record: Arc<LogRecord>) {
        let ts = record.timestamp;
        let index = self.logs.partition_point(|existing| existing.timestamp <= ts);
        self.logs.insert(index, record);
    }

    /// Snapshot of the whole index in timestamp order.
    pub fn all(&self) -> Vec<Arc<LogRecord>> {
        self.logs.clone()
    }

    /// Snapshot of the newest `limit` records, still in ascending order.
    pub fn recent(&self, limit: usize) -> Vec<Arc<LogRecord>> {
        let start = self.logs.len().saturating_sub(limit);
        self.logs[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}
