//! Common test utilities and fixtures: OTLP batch builders.

#![allow(dead_code)]

use opentelemetry_proto::tonic::{
    common::v1::{any_value::Value, AnyValue, KeyValue},
    logs::v1::{LogRecord, ResourceLogs, ScopeLogs},
    metrics::v1::{
        metric::Data, number_data_point, Gauge, Metric, NumberDataPoint, ResourceMetrics,
        ScopeMetrics,
    },
    resource::v1::Resource,
    trace::v1::{ResourceSpans, ScopeSpans, Span},
};

pub fn string_attr(key: &str, value: &str) -> KeyValue {
    KeyValue {
        key: key.to_string(),
        value: Some(AnyValue {
            value: Some(Value::StringValue(value.to_string())),
        }),
    }
}

pub fn service_resource(service: &str) -> Option<Resource> {
    Some(Resource {
        attributes: vec![string_attr("service.name", service)],
        ..Default::default()
    })
}

/// Hex-friendly fixed-width id bytes from a short label
pub fn id_bytes(label: &str, width: usize) -> Vec<u8> {
    let mut bytes = label.as_bytes().to_vec();
    bytes.resize(width, 0);
    bytes
}

/// Test fixture builder for OTLP spans with sensible defaults.
pub struct TestSpanBuilder {
    trace: String,
    id: String,
    parent: Option<String>,
    start: u64,
    end: u64,
}

impl TestSpanBuilder {
    pub fn new(trace: &str, id: &str) -> Self {
        Self {
            trace: trace.to_string(),
            id: id.to_string(),
            parent: None,
            start: 0,
            end: 0,
        }
    }

    pub fn parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn times(mut self, start: u64, end: u64) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn build(self) -> Span {
        Span {
            trace_id: id_bytes(&self.trace, 16),
            span_id: id_bytes(&self.id, 8),
            parent_span_id: self.parent.map(|p| id_bytes(&p, 8)).unwrap_or_default(),
            name: self.id,
            start_time_unix_nano: self.start,
            end_time_unix_nano: self.end,
            ..Default::default()
        }
    }
}

/// Hex form of a span label as the store reports it
pub fn span_hex(label: &str) -> String {
    hex::encode(id_bytes(label, 8))
}

/// Hex form of a trace label as the store reports it
pub fn trace_hex(label: &str) -> String {
    hex::encode(id_bytes(label, 16))
}

pub fn traces_batch(spans: Vec<Span>) -> Vec<ResourceSpans> {
    vec![ResourceSpans {
        resource: service_resource("test-service"),
        scope_spans: vec![ScopeSpans {
            scope: None,
            spans,
            schema_url: String::new(),
        }],
        schema_url: String::new(),
    }]
}

pub fn log_record(timestamp: u64, body: &str) -> LogRecord {
    LogRecord {
        time_unix_nano: timestamp,
        severity_number: 9,
        severity_text: "INFO".into(),
        body: Some(AnyValue {
            value: Some(Value::StringValue(body.to_string())),
        }),
        ..Default::default()
    }
}

pub fn logs_batch(records: Vec<LogRecord>) -> Vec<ResourceLogs> {
    vec![ResourceLogs {
        resource: service_resource("test-service"),
        scope_logs: vec![ScopeLogs {
            scope: None,
            log_records: records,
            schema_url: String::new(),
        }],
        schema_url: String::new(),
    }]
}

pub fn gauge_point(timestamp: u64, value: f64, attributes: Vec<KeyValue>) -> NumberDataPoint {
    NumberDataPoint {
        attributes,
        time_unix_nano: timestamp,
        value: Some(number_data_point::Value::AsDouble(value)),
        ..Default::default()
    }
}

pub fn gauge_batch(name: &str, points: Vec<NumberDataPoint>) -> Vec<ResourceMetrics> {
    vec![ResourceMetrics {
        resource: None,
        scope_metrics: vec![ScopeMetrics {
            scope: None,
            metrics: vec![Metric {
                name: name.to_string(),
                data: Some(Data::Gauge(Gauge { data_points: points })),
                ..Default::default()
            }],
            schema_url: String::new(),
        }],
        schema_url: String::new(),
    }]
}
