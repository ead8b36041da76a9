//! The telemetry store.
//!
//! [`TelemetryStore`] owns the log, trace and metric stores, the payload audit
//! list and the running counters behind a single readers-writer lock.
//! Ingestion normalizes a batch before taking the write lock, applies it in
//! one critical section with no await point, and notifies subscribers after
//! the lock is released. A future dropped while waiting for the lock leaves
//! no trace of its batch.

pub mod events;
pub mod normalize;
pub mod payload;
pub mod query;

pub use events::{ChangeCause, ChangeEvent, CountChanges};
pub use payload::{Payload, PayloadBatch, TelemetryKind};
pub use query::Counts;

use crate::core::config::StoreConfig;
use crate::logs::LogStore;
use crate::metrics::MetricStore;
use crate::traces::TraceStore;
use chrono::Utc;
use events::send_event;
use opentelemetry_proto::tonic::{
    logs::v1::ResourceLogs, metrics::v1::ResourceMetrics, trace::v1::ResourceSpans,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Everything guarded by the store lock
#[derive(Debug, Default)]
struct StoreState {
    logs: LogStore,
    traces: TraceStore,
    metrics: MetricStore,
    payloads: Vec<Arc<Payload>>,
    counts: Counts,
}

/// Shared in-memory telemetry store.
///
/// Constructed once and handed to the receivers and the display as an
/// `Arc<TelemetryStore>`.
pub struct TelemetryStore {
    inner: Arc<RwLock<StoreState>>,
    events: broadcast::Sender<ChangeEvent>,
}

impl TelemetryStore {
    pub fn new(config: &StoreConfig) -> Self {
        let (events, _) = broadcast::channel(config.notification_capacity.max(1));
        Self {
            inner: Arc::new(RwLock::new(StoreState::default())),
            events,
        }
    }

    /// Ingest a logs batch. An empty batch is ignored.
    pub async fn consume_logs(&self, batch: Vec<ResourceLogs>) {
        if batch.is_empty() {
            return;
        }

        let received = Utc::now();
        let records = normalize::normalize_logs(&batch, received);
        let item_count = records.len();
        let payload = Arc::new(Payload::new(
            received,
            item_count,
            PayloadBatch::Logs(Arc::new(batch)),
        ));

        let counts = {
            let mut state = self.inner.write().await;
            for record in records {
                state.logs.insert(Arc::new(record));
            }
            state.payloads.push(payload);
            state.counts.payloads += 1;
            state.counts.logs += item_count;
            state.counts
        };

        debug!(kind = "logs", items = item_count, "Ingested batch");
        self.notify(ChangeCause::Ingested(TelemetryKind::Logs), counts);
    }

    /// Ingest a traces batch. An empty batch is ignored.
    pub async fn consume_traces(&self, batch: Vec<ResourceSpans>) {
        if batch.is_empty() {
            return;
        }

        let received = Utc::now();
        let spans = normalize::normalize_traces(&batch);
        let item_count = spans.span_count;
        let payload = Arc::new(Payload::new(
            received,
            item_count,
            PayloadBatch::Traces(Arc::new(batch)),
        ));

        let counts = {
            let mut state = self.inner.write().await;
            for (trace_id, trace_spans) in spans.traces {
                state.traces.append(trace_id, trace_spans);
            }
            state.payloads.push(payload);
            state.counts.payloads += 1;
            state.counts.spans += item_count;
            state.counts
        };

        debug!(kind = "traces", items = item_count, "Ingested batch");
        self.notify(ChangeCause::Ingested(TelemetryKind::Traces), counts);
    }

    /// Ingest a metrics batch. An empty batch is ignored.
    pub async fn consume_metrics(&self, batch: Vec<ResourceMetrics>) {
        if batch.is_empty() {
            return;
        }

        let received = Utc::now();
        let points = normalize::normalize_metrics(&batch);
        let item_count = points.len();
        let payload = Arc::new(Payload::new(
            received,
            item_count,
            PayloadBatch::Metrics(Arc::new(batch)),
        ));

        let counts = {
            let mut state = self.inner.write().await;
            for point in &points {
                state.metrics.record(&point.fingerprint, point.timestamp, point.value);
            }
            state.payloads.push(payload);
            state.counts.payloads += 1;
            state.counts.metrics += item_count;
            state.counts
        };

        debug!(kind = "metrics", items = item_count, "Ingested batch");
        self.notify(ChangeCause::Ingested(TelemetryKind::Metrics), counts);
    }

    /// Drop all stored telemetry and zero the counters.
    ///
    /// Runs on its own task: once called it completes even if the caller's
    /// future is dropped.
    pub async fn reset(&self) {
        let inner = Arc::clone(&self.inner);
        let events = self.events.clone();

        let task = tokio::spawn(async move {
            {
                let mut state = inner.write().await;
                *state = StoreState::default();
            }
            send_event(&events, ChangeCause::Reset, Counts::default());
        });

        match task.await {
            Ok(()) => info!("Telemetry store reset"),
            Err(e) => error!(error = %e, "Reset task failed"),
        }
    }

    /// Re-send the current counts every `interval` so a consumer that missed
    /// events still converges. Stops once the store is dropped.
    pub fn spawn_heartbeat(&self, interval: Duration) -> JoinHandle<()> {
        let inner = Arc::downgrade(&self.inner);
        let events = self.events.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                let counts = inner.read().await.counts;
                drop(inner);
                send_event(&events, ChangeCause::Heartbeat, counts);
            }
        })
    }
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new(&StoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry_proto::tonic::logs::v1::{LogRecord, ScopeLogs};

    fn logs_batch(timestamps: &[u64]) -> Vec<ResourceLogs> {
        vec![ResourceLogs {
            resource: None,
            scope_logs: vec![ScopeLogs {
                scope: None,
                log_records: timestamps
                    .iter()
                    .map(|&ts| LogRecord {
                        time_unix_nano: ts,
                        ..Default::default()
                    })
                    .collect(),
                schema_url: String::new(),
            }],
            schema_url: String::new(),
        }]
    }

    #[tokio::test]
    async fn test_consume_logs_updates_counts_and_order() {
        let store = TelemetryStore::default();
        store.consume_logs(logs_batch(&[100, 50])).await;

        let timestamps: Vec<u64> = store.logs().await.iter().map(|l| l.timestamp).collect();
        assert_eq!(timestamps, vec![50, 100]);

        let counts = store.counts().await;
        assert_eq!(counts.payloads, 1);
        assert_eq!(counts.logs, 2);
        assert_eq!(store.payloads().await[0].item_count, 2);
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let store = TelemetryStore::default();
        let mut events = store.subscribe();

        store.consume_logs(Vec::new()).await;
        store.consume_traces(Vec::new()).await;
        store.consume_metrics(Vec::new()).await;

        assert_eq!(store.counts().await, Counts::default());
        assert!(store.payloads().await.is_empty());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_notification_after_ingest() {
        let store = TelemetryStore::default();
        let mut events = store.subscribe();

        store.consume_logs(logs_batch(&[1])).await;

        let event = events.recv().await.unwrap();
        assert_eq!(event.cause, ChangeCause::Ingested(TelemetryKind::Logs));
        assert_eq!(event.counts.logs, 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_lock_has_no_effect() {
        let store = TelemetryStore::default();
        let mut events = store.subscribe();

        let guard = store.inner.write().await;
        let attempt = tokio::time::timeout(
            Duration::from_millis(20),
            store.consume_logs(logs_batch(&[1, 2, 3])),
        )
        .await;
        assert!(attempt.is_err());
        drop(guard);

        assert_eq!(store.counts().await, Counts::default());
        assert!(store.logs().await.is_empty());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let store = TelemetryStore::default();
        store.consume_logs(logs_batch(&[5])).await;
        let mut events = store.subscribe();

        store.reset().await;

        assert_eq!(store.counts().await, Counts::default());
        assert!(store.logs().await.is_empty());
        assert!(store.payloads().await.is_empty());
        assert_eq!(events.recv().await.unwrap().cause, ChangeCause::Reset);
    }

    #[tokio::test]
    async fn test_slow_subscriber_does_not_block_ingest() {
        let config = StoreConfig {
            notification_capacity: 2,
            ..StoreConfig::default()
        };
        let store = TelemetryStore::new(&config);
        let mut events = store.subscribe();

        for ts in 0..10 {
            store.consume_logs(logs_batch(&[ts])).await;
        }

        assert_eq!(store.counts().await.logs, 10);
        assert!(matches!(
            events.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
        assert_eq!(events.recv().await.unwrap().counts.logs, 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_resends_counts() {
        let store = TelemetryStore::default();
        store.consume_logs(logs_batch(&[1])).await;
        let mut events = store.subscribe();

        let heartbeat = store.spawn_heartbeat(Duration::from_secs(1));
        let event = events.recv().await.unwrap();
        assert_eq!(event.cause, ChangeCause::Heartbeat);
        assert_eq!(event.counts.logs, 1);

        drop(store);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(heartbeat.is_finished());
    }
}
