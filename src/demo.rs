//! Synthetic telemetry for `--demo`.
//!
//! Feeds a fake `demo-app` service into the store the same way a receiver
//! would: every second an ok trace with nested children, every three seconds
//! an error trace with correlated logs, every five seconds a set of gauges.

use crate::receiver::wait_for_shutdown;
use crate::storage::TelemetryStore;
use chrono::Utc;
use opentelemetry_proto::tonic::{
    common::v1::{any_value::Value, AnyValue, InstrumentationScope, KeyValue},
    logs::v1::{LogRecord, ResourceLogs, ScopeLogs, SeverityNumber},
    metrics::v1::{
        metric::Data, number_data_point, Gauge, Metric, NumberDataPoint, ResourceMetrics,
        ScopeMetrics,
    },
    resource::v1::Resource,
    trace::v1::{
        span::{Event, SpanKind},
        status::StatusCode,
        ResourceSpans, ScopeSpans, Span, Status,
    },
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

const SERVICE_NAME: &str = "demo-app";
const SCOPE_NAME: &str = "otelui-demo";

fn string_value(value: impl Into<String>) -> Option<AnyValue> {
    Some(AnyValue {
        value: Some(Value::StringValue(value.into())),
    })
}

fn attribute(key: &str, value: impl Into<String>) -> KeyValue {
    KeyValue {
        key: key.to_string(),
        value: string_value(value),
    }
}

fn resource() -> Option<Resource> {
    Some(Resource {
        attributes: vec![attribute(
            opentelemetry_semantic_conventions::resource::SERVICE_NAME,
            SERVICE_NAME,
        )],
        ..Default::default()
    })
}

fn scope() -> Option<InstrumentationScope> {
    Some(InstrumentationScope {
        name: SCOPE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        ..Default::default()
    })
}

fn now_nanos() -> u64 {
    Utc::now()
        .timestamp_nanos_opt()
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or_default()
}

/// Generates the demo batches
#[derive(Debug)]
pub struct DemoGenerator {
    rng: fastrand::Rng,
    sequence: u64,
}

impl Default for DemoGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoGenerator {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
            sequence: 0,
        }
    }

    /// Deterministic ids for tests
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            sequence: 0,
        }
    }

    fn trace_id(&mut self) -> Vec<u8> {
        self.rng.u128(1..).to_be_bytes().to_vec()
    }

    fn span_id(&mut self) -> Vec<u8> {
        self.rng.u64(1..).to_be_bytes().to_vec()
    }

    fn span(
        &mut self,
        trace_id: &[u8],
        parent: Option<&[u8]>,
        name: &str,
        start: u64,
        duration_nanos: u64,
    ) -> Span {
        Span {
            trace_id: trace_id.to_vec(),
            span_id: self.span_id(),
            parent_span_id: parent.map(<[u8]>::to_vec).unwrap_or_default(),
            name: name.to_string(),
            kind: SpanKind::Internal as i32,
            start_time_unix_nano: start,
            end_time_unix_nano: start + duration_nanos,
            ..Default::default()
        }
    }

    fn spans_batch(spans: Vec<Span>) -> Vec<ResourceSpans> {
        vec![ResourceSpans {
            resource: resource(),
            scope_spans: vec![ScopeSpans {
                scope: scope(),
                spans,
                schema_url: String::new(),
            }],
            schema_url: String::new(),
        }]
    }

    /// A successful request: root, two children, three sequential grandchildren
    /// under the second child
    pub fn ok_trace(&mut self) -> Vec<ResourceSpans> {
        let start = now_nanos();
        let trace_id = self.trace_id();

        let mut root = self.span(&trace_id, None, "handle-request", start, 9_000_000);
        root.kind = SpanKind::Server as i32;
        root.status = Some(Status {
            message: "ok".into(),
            code: StatusCode::Ok as i32,
        });
        root.attributes.push(attribute("http.route", "/checkout"));
        root.events.push(Event {
            time_unix_nano: start + 1_000_000,
            name: "request-parsed".into(),
            ..Default::default()
        });

        let first = self.span(&trace_id, Some(&root.span_id), "load-session", start + 1_000_000, 2_000_000);
        let second = self.span(&trace_id, Some(&root.span_id), "process-order", start + 2_000_000, 6_000_000);

        let mut spans = Vec::with_capacity(6);
        for step in 0..3u64 {
            let step_start = start + 2_500_000 + step * 1_500_000;
            let jitter = self.rng.u64(100_000..1_000_000);
            spans.push(self.span(&trace_id, Some(&second.span_id), "db-query", step_start, jitter));
        }
        spans.push(second);
        spans.push(first);
        spans.push(root);

        Self::spans_batch(spans)
    }

    /// A failed request plus the logs it emitted
    pub fn error_trace(&mut self) -> (Vec<ResourceSpans>, Vec<ResourceLogs>) {
        let start = now_nanos();
        let trace_id = self.trace_id();
        let sequence = self.sequence;
        self.sequence += 1;

        let mut root = self.span(&trace_id, None, "handle-request", start, 5_000_000);
        root.kind = SpanKind::Server as i32;
        root.status = Some(Status {
            message: "payment declined".into(),
            code: StatusCode::Error as i32,
        });
        let child = self.span(&trace_id, Some(&root.span_id), "call-payment", start + 1_000_000, 3_000_000);

        let log = |severity: SeverityNumber, text: &str, body: String, attributes: Vec<KeyValue>| LogRecord {
            time_unix_nano: start + 2_000_000,
            observed_time_unix_nano: start + 2_000_000,
            severity_number: severity as i32,
            severity_text: text.to_string(),
            body: string_value(body),
            attributes,
            trace_id: trace_id.clone(),
            span_id: root.span_id.clone(),
            ..Default::default()
        };
        let records = vec![
            log(
                SeverityNumber::Error,
                "ERROR",
                "payment declined".to_string(),
                vec![attribute("order.id", format!("ord-{sequence}"))],
            ),
            log(SeverityNumber::Warn, "WARN", format!("retrying order {sequence}"), Vec::new()),
            log(
                SeverityNumber::Debug,
                "DEBUG",
                format!("attempt {sequence} finished"),
                vec![KeyValue {
                    key: "attempt".into(),
                    value: Some(AnyValue {
                        value: Some(Value::IntValue(sequence as i64)),
                    }),
                }],
            ),
        ];

        let logs = vec![ResourceLogs {
            resource: resource(),
            scope_logs: vec![ScopeLogs {
                scope: scope(),
                log_records: records,
                schema_url: String::new(),
            }],
            schema_url: String::new(),
        }];

        (Self::spans_batch(vec![root, child]), logs)
    }

    /// Gauge readings for a few runtime-style metrics
    pub fn gauges(&mut self) -> Vec<ResourceMetrics> {
        let now = now_nanos();
        let gauge = |name: &str, unit: &str, value: number_data_point::Value| Metric {
            name: name.to_string(),
            unit: unit.to_string(),
            data: Some(Data::Gauge(Gauge {
                data_points: vec![NumberDataPoint {
                    time_unix_nano: now,
                    value: Some(value),
                    ..Default::default()
                }],
            })),
            ..Default::default()
        };

        let metrics = vec![
            gauge(
                "process.memory.usage",
                "By",
                number_data_point::Value::AsInt(self.rng.i64(40_000_000..60_000_000)),
            ),
            gauge(
                "process.cpu.utilization",
                "1",
                number_data_point::Value::AsDouble(self.rng.f64()),
            ),
            gauge(
                "queue.depth",
                "{item}",
                number_data_point::Value::AsInt(self.rng.i64(0..50)),
            ),
        ];

        vec![ResourceMetrics {
            resource: resource(),
            scope_metrics: vec![ScopeMetrics {
                scope: scope(),
                metrics,
                schema_url: String::new(),
            }],
            schema_url: String::new(),
        }]
    }
}

/// Feed demo telemetry into `store` until `shutdown` flips to `true`
pub async fn run(store: Arc<TelemetryStore>, shutdown: watch::Receiver<bool>) {
    let mut generator = DemoGenerator::new();
    let mut ok_ticker = tokio::time::interval(Duration::from_secs(1));
    let mut error_ticker = tokio::time::interval(Duration::from_secs(3));
    let mut metric_ticker = tokio::time::interval(Duration::from_secs(5));

    let stopped = wait_for_shutdown(shutdown);
    tokio::pin!(stopped);

    tracing::info!("Demo telemetry generator started");

    loop {
        tokio::select! {
            _ = ok_ticker.tick() => {
                store.consume_traces(generator.ok_trace()).await;
            }
            _ = error_ticker.tick() => {
                let (spans, logs) = generator.error_trace();
                store.consume_traces(spans).await;
                store.consume_logs(logs).await;
            }
            _ = metric_ticker.tick() => {
                store.consume_metrics(generator.gauges()).await;
            }
            _ = &mut stopped => break,
        }
    }

    tracing::info!("Demo telemetry generator stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_run_feeds_store_until_shutdown() {
        let store = Arc::new(TelemetryStore::default());
        let (stop, shutdown) = watch::channel(false);

        let task = tokio::spawn(run(Arc::clone(&store), shutdown));
        tokio::time::sleep(Duration::from_millis(3500)).await;
        stop.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();

        let counts = store.counts().await;
        assert!(counts.spans > 0);
        assert!(counts.logs > 0);
        assert!(counts.metrics > 0);

        let settled = store.counts().await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(store.counts().await, settled);
    }

    #[tokio::test]
    async fn test_ok_trace_assembles_into_one_tree() {
        let store = TelemetryStore::default();
        store.consume_traces(DemoGenerator::with_seed(7).ok_trace()).await;

        let traces = store.traces().await;
        assert_eq!(traces.len(), 1);

        let forest = traces[0].assemble();
        assert_eq!(forest.root_count(), 1);
        let depths: Vec<usize> = forest.preorder().iter().map(|n| n.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 2, 2, 1]);

        let summary = traces[0].summary();
        assert_eq!(summary.display_name(), "handle-request");
        assert!(!summary.has_errors);
    }

    #[tokio::test]
    async fn test_error_trace_correlates_logs() {
        let store = TelemetryStore::default();
        let mut generator = DemoGenerator::with_seed(7);
        let (spans, logs) = generator.error_trace();
        store.consume_traces(spans).await;
        store.consume_logs(logs).await;

        let trace = &store.traces().await[0];
        assert!(trace.summary().has_errors);

        let logs = store.logs().await;
        assert_eq!(logs.len(), 3);
        assert!(logs.iter().all(|l| l.trace_id.as_ref() == Some(&trace.trace_id)));
        assert_eq!(logs[0].service_name(), SERVICE_NAME);
    }

    #[tokio::test]
    async fn test_gauges_become_series() {
        let store = TelemetryStore::default();
        let mut generator = DemoGenerator::with_seed(7);
        store.consume_metrics(generator.gauges()).await;
        store.consume_metrics(generator.gauges()).await;

        let mut names = store.metric_names().await;
        names.sort();
        assert_eq!(names.len(), 3);
        assert_eq!(names[0], r#"process.cpu.utilization{service.name="demo-app"}"#);
        assert_eq!(store.metric_series(&names[0]).await.unwrap().len(), 2);
    }
}
