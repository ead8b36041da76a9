//! Read-side accessors.
//!
//! Each call holds the read lock only while copying data out; the returned
//! values are independent of later ingestion.

use crate::core::TraceId;
use crate::logs::LogRecord;
use crate::metrics::MetricSeries;
use crate::storage::payload::Payload;
use crate::storage::TelemetryStore;
use crate::traces::{Trace, TraceSummary};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Running totals since start or the last reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub payloads: usize,
    pub logs: usize,
    pub spans: usize,
    pub metrics: usize,
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "payloads={} logs={} spans={} metrics={}",
            self.payloads, self.logs, self.spans, self.metrics
        )
    }
}

impl TelemetryStore {
    /// All log records ordered by event timestamp
    pub async fn logs(&self) -> Vec<Arc<LogRecord>> {
        self.inner.read().await.logs.all()
    }

    /// The newest `limit` log records, oldest first
    pub async fn recent_logs(&self, limit: usize) -> Vec<Arc<LogRecord>> {
        self.inner.read().await.logs.recent(limit)
    }

    /// All traces in first-seen order
    pub async fn traces(&self) -> Vec<Trace> {
        self.inner.read().await.traces.all()
    }

    pub async fn trace(&self, trace_id: &TraceId) -> Option<Trace> {
        self.inner.read().await.traces.get(trace_id)
    }

    /// List rows for every trace, in first-seen order
    pub async fn trace_summaries(&self) -> Vec<TraceSummary> {
        let traces = self.traces().await;
        traces.iter().map(Trace::summary).collect()
    }

    /// Every metric fingerprint, unordered
    pub async fn metric_names(&self) -> Vec<String> {
        self.inner.read().await.metrics.series_names()
    }

    pub async fn metric_series(&self, fingerprint: &str) -> Option<MetricSeries> {
        self.inner.read().await.metrics.series(fingerprint)
    }

    /// Audit records of every accepted batch, oldest first
    pub async fn payloads(&self) -> Vec<Arc<Payload>> {
        self.inner.read().await.payloads.clone()
    }

    pub async fn counts(&self) -> Counts {
        self.inner.read().await.counts
    }
}
