//! OTLP batch normalization.
//!
//! Walks the resource → scope → record nesting of a decoded batch and produces
//! the internal records the stores hold. Runs before the store lock is taken
//! and touches no shared state. Missing resources, scopes or attribute lists
//! are treated as empty.

use crate::core::{
    AttributeValue, Attributes, InstrumentationScope, KeyValue, Resource, SpanId, TraceId,
};
use crate::logs::{LogRecord, Severity};
use crate::metrics::{fingerprint, MetricPoint};
use crate::traces::{Span, SpanEvent, SpanKind, SpanLink, SpanStatus, StatusCode};
use ahash::AHashMap;
use chrono::{DateTime, Utc};
use opentelemetry_proto::tonic::{
    common::v1::{
        any_value::Value as ProtoValue, AnyValue as ProtoAnyValue,
        InstrumentationScope as ProtoScope, KeyValue as ProtoKeyValue,
    },
    logs::v1::ResourceLogs,
    metrics::v1::{metric::Data, number_data_point::Value as NumberValue, NumberDataPoint, ResourceMetrics},
    resource::v1::Resource as ProtoResource,
    trace::v1::{
        span::SpanKind as ProtoSpanKind, status::StatusCode as ProtoStatusCode, ResourceSpans,
        Status as ProtoStatus,
    },
};
use std::sync::Arc;

/// Spans of one batch grouped by trace id, in first appearance order
#[derive(Debug, Default)]
pub struct SpanBatch {
    pub traces: Vec<(TraceId, Vec<Arc<Span>>)>,
    pub span_count: usize,
}

/// Convert an OTLP value into the internal tagged value; `None` when unset
pub fn convert_value(value: &ProtoAnyValue) -> Option<AttributeValue> {
    let converted = match value.value.as_ref()? {
        ProtoValue::StringValue(s) => AttributeValue::String(s.clone()),
        ProtoValue::BoolValue(b) => AttributeValue::Bool(*b),
        ProtoValue::IntValue(i) => AttributeValue::Int(*i),
        ProtoValue::DoubleValue(d) => AttributeValue::Double(*d),
        ProtoValue::ArrayValue(array) => AttributeValue::Array(
            array
                .values
                .iter()
                .filter_map(convert_value)
                .collect(),
        ),
        ProtoValue::KvlistValue(list) => AttributeValue::Map(convert_attributes(&list.values)),
        ProtoValue::BytesValue(bytes) => AttributeValue::Bytes(bytes.clone()),
    };
    Some(converted)
}

pub fn convert_attributes(attributes: &[ProtoKeyValue]) -> Attributes {
    attributes
        .iter()
        .map(|kv| KeyValue {
            key: kv.key.clone(),
            value: kv.value.as_ref().and_then(convert_value),
        })
        .collect()
}

pub fn convert_resource(resource: Option<&ProtoResource>, schema_url: &str) -> Arc<Resource> {
    Arc::new(Resource {
        attributes: resource
            .map(|r| convert_attributes(&r.attributes))
            .unwrap_or_default(),
        schema_url: schema_url.to_string(),
    })
}

fn convert_scope(scope: Option<&ProtoScope>, schema_url: &str) -> Arc<InstrumentationScope> {
    let mut converted = scope.map_or_else(InstrumentationScope::default, |s| InstrumentationScope {
        name: s.name.clone(),
        version: s.version.clone(),
        attributes: convert_attributes(&s.attributes),
        schema_url: String::new(),
    });
    converted.schema_url = schema_url.to_string();
    Arc::new(converted)
}

/// Map the OTLP span kind; unknown values fall back to unspecified
pub fn convert_span_kind(kind: i32) -> SpanKind {
    match ProtoSpanKind::try_from(kind) {
        Ok(ProtoSpanKind::Internal) => SpanKind::Internal,
        Ok(ProtoSpanKind::Server) => SpanKind::Server,
        Ok(ProtoSpanKind::Client) => SpanKind::Client,
        Ok(ProtoSpanKind::Producer) => SpanKind::Producer,
        Ok(ProtoSpanKind::Consumer) => SpanKind::Consumer,
        Ok(ProtoSpanKind::Unspecified) | Err(_) => SpanKind::Unspecified,
    }
}

pub fn convert_span_status(status: Option<&ProtoStatus>) -> SpanStatus {
    let Some(status) = status else {
        return SpanStatus::default();
    };
    let code = match ProtoStatusCode::try_from(status.code) {
        Ok(ProtoStatusCode::Ok) => StatusCode::Ok,
        Ok(ProtoStatusCode::Error) => StatusCode::Error,
        Ok(ProtoStatusCode::Unset) | Err(_) => StatusCode::Unset,
    };
    SpanStatus {
        code,
        message: status.message.clone(),
    }
}

/// Flatten a logs batch into records stamped with `received`
pub fn normalize_logs(batch: &[ResourceLogs], received: DateTime<Utc>) -> Vec<LogRecord> {
    let mut records = Vec::new();

    for resource_logs in batch {
        let resource =
            convert_resource(resource_logs.resource.as_ref(), &resource_logs.schema_url);

        for scope_logs in &resource_logs.scope_logs {
            let scope = convert_scope(scope_logs.scope.as_ref(), &scope_logs.schema_url);

            for log in &scope_logs.log_records {
                records.push(LogRecord {
                    received,
                    timestamp: log.time_unix_nano,
                    observed_timestamp: log.observed_time_unix_nano,
                    severity: Severity {
                        number: log.severity_number,
                        text: log.severity_text.clone(),
                    },
                    body: log.body.as_ref().and_then(convert_value),
                    attributes: convert_attributes(&log.attributes),
                    trace_id: (!log.trace_id.is_empty()).then(|| TraceId::from_bytes(&log.trace_id)),
                    span_id: SpanId::from_bytes(&log.span_id),
                    flags: log.flags,
                    scope: Arc::clone(&scope),
                    resource: Arc::clone(&resource),
                });
            }
        }
    }

    records
}

/// Convert every span of a batch and group them by trace id
pub fn normalize_traces(batch: &[ResourceSpans]) -> SpanBatch {
    let mut grouped = SpanBatch::default();
    let mut positions: AHashMap<TraceId, usize> = AHashMap::new();

    for resource_spans in batch {
        let resource =
            convert_resource(resource_spans.resource.as_ref(), &resource_spans.schema_url);

        for scope_spans in &resource_spans.scope_spans {
            let scope = convert_scope(scope_spans.scope.as_ref(), &scope_spans.schema_url);

            for span in &scope_spans.spans {
                let trace_id = TraceId::from_bytes(&span.trace_id);
                let converted = Arc::new(Span {
                    trace_id: trace_id.clone(),
                    span_id: SpanId::new(hex::encode(&span.span_id)),
                    parent_span_id: SpanId::from_bytes(&span.parent_span_id),
                    name: span.name.clone(),
                    kind: convert_span_kind(span.kind),
                    start_time: span.start_time_unix_nano,
                    end_time: span.end_time_unix_nano,
                    status: convert_span_status(span.status.as_ref()),
                    attributes: convert_attributes(&span.attributes),
                    events: span
                        .events
                        .iter()
                        .map(|event| SpanEvent {
                            timestamp: event.time_unix_nano,
                            name: event.name.clone(),
                            attributes: convert_attributes(&event.attributes),
                        })
                        .collect(),
                    links: span
                        .links
                        .iter()
                        .map(|link| SpanLink {
                            trace_id: TraceId::from_bytes(&link.trace_id),
                            span_id: SpanId::from_bytes(&link.span_id),
                            attributes: convert_attributes(&link.attributes),
                        })
                        .collect(),
                    resource: Arc::clone(&resource),
                    scope: Arc::clone(&scope),
                });

                grouped.span_count += 1;
                match positions.get(&trace_id) {
                    Some(&index) => grouped.traces[index].1.push(converted),
                    None => {
                        positions.insert(trace_id.clone(), grouped.traces.len());
                        grouped.traces.push((trace_id, vec![converted]));
                    },
                }
            }
        }
    }

    grouped
}

fn number_value(point: &NumberDataPoint) -> Option<f64> {
    match point.value.as_ref()? {
        NumberValue::AsDouble(d) => Some(*d),
        NumberValue::AsInt(i) => Some(*i as f64),
    }
}

/// Extract the scalar points of a metrics batch.
///
/// Gauge and sum points contribute their value, summary points their running
/// sum. Histogram and exponential histogram points are skipped, as are number
/// points that carry no value.
pub fn normalize_metrics(batch: &[ResourceMetrics]) -> Vec<MetricPoint> {
    let mut points = Vec::new();

    for resource_metrics in batch {
        let resource_attributes = resource_metrics
            .resource
            .as_ref()
            .map(|r| convert_attributes(&r.attributes))
            .unwrap_or_default();

        for scope_metrics in &resource_metrics.scope_metrics {
            let scope_attributes = scope_metrics
                .scope
                .as_ref()
                .map(|s| convert_attributes(&s.attributes))
                .unwrap_or_default();

            for metric in &scope_metrics.metrics {
                let mut record = |attributes: &[ProtoKeyValue], timestamp: u64, value: f64| {
                    let point_attributes = convert_attributes(attributes);
                    points.push(MetricPoint {
                        fingerprint: fingerprint(
                            &metric.name,
                            &[
                                point_attributes.as_slice(),
                                scope_attributes.as_slice(),
                                resource_attributes.as_slice(),
                            ],
                        ),
                        timestamp,
                        value,
                    });
                };

                match &metric.data {
                    Some(Data::Gauge(gauge)) => {
                        for point in &gauge.data_points {
                            if let Some(value) = number_value(point) {
                                record(&point.attributes, point.time_unix_nano, value);
                            }
                        }
                    },
                    Some(Data::Sum(sum)) => {
                        for point in &sum.data_points {
                            if let Some(value) = number_value(point) {
                                record(&point.attributes, point.time_unix_nano, value);
                            }
                        }
                    },
                    Some(Data::Summary(summary)) => {
                        for point in &summary.data_points {
                            record(&point.attributes, point.time_unix_nano, point.sum);
                        }
                    },
                    Some(Data::Histogram(_)) | Some(Data::ExponentialHistogram(_)) | None => {},
                }
            }
        }
    }

    points
}
