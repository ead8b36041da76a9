//! Ingestion audit records.
//!
//! Every accepted batch is kept verbatim next to the normalized data so the
//! raw payload can be inspected later.

use crate::core::{KeyValue, Result};
use crate::storage::normalize::{convert_attributes, convert_value};
use chrono::{DateTime, Utc};
use opentelemetry_proto::tonic::{
    common::v1::InstrumentationScope as ProtoScope,
    logs::v1::ResourceLogs,
    metrics::v1::{metric::Data, ResourceMetrics},
    resource::v1::Resource as ProtoResource,
    trace::v1::ResourceSpans,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The three OTLP signal types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetryKind {
    Logs,
    Traces,
    Metrics,
}

impl TelemetryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryKind::Logs => "logs",
            TelemetryKind::Traces => "traces",
            TelemetryKind::Metrics => "metrics",
        }
    }
}

impl fmt::Display for TelemetryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The decoded batch exactly as it was received
#[derive(Debug, Clone)]
pub enum PayloadBatch {
    Logs(Arc<Vec<ResourceLogs>>),
    Traces(Arc<Vec<ResourceSpans>>),
    Metrics(Arc<Vec<ResourceMetrics>>),
}

/// One ingested batch
#[derive(Debug, Clone)]
pub struct Payload {
    pub received: DateTime<Utc>,
    /// Records, spans or recorded metric points in the batch
    pub item_count: usize,
    pub batch: PayloadBatch,
}

impl Payload {
    pub fn new(received: DateTime<Utc>, item_count: usize, batch: PayloadBatch) -> Self {
        Self {
            received,
            item_count,
            batch,
        }
    }

    pub fn kind(&self) -> TelemetryKind {
        match self.batch {
            PayloadBatch::Logs(_) => TelemetryKind::Logs,
            PayloadBatch::Traces(_) => TelemetryKind::Traces,
            PayloadBatch::Metrics(_) => TelemetryKind::Metrics,
        }
    }

    /// Pretty JSON rendering of the raw batch
    pub fn to_json(&self) -> Result<String> {
        let json = match &self.batch {
            PayloadBatch::Logs(batch) => serde_json::to_string_pretty(batch.as_slice())?,
            PayloadBatch::Traces(batch) => serde_json::to_string_pretty(batch.as_slice())?,
            PayloadBatch::Metrics(batch) => serde_json::to_string_pretty(batch.as_slice())?,
        };
        Ok(json)
    }

    /// Flat text of the batch for substring search: one line per attribute,
    /// scope, log body, span name and metric name.
    pub fn search_text(&self) -> String {
        let mut digest = Digest::default();

        match &self.batch {
            PayloadBatch::Logs(batch) => {
                for resource_logs in batch.iter() {
                    digest.resource(resource_logs.resource.as_ref());
                    for scope_logs in &resource_logs.scope_logs {
                        digest.scope(scope_logs.scope.as_ref());
                        for log in &scope_logs.log_records {
                            if let Some(body) = log.body.as_ref().and_then(convert_value) {
                                digest.line(body.to_string());
                            }
                            digest.attributes(&convert_attributes(&log.attributes));
                        }
                    }
                }
            },
            PayloadBatch::Traces(batch) => {
                for resource_spans in batch.iter() {
                    digest.resource(resource_spans.resource.as_ref());
                    for scope_spans in &resource_spans.scope_spans {
                        digest.scope(scope_spans.scope.as_ref());
                        for span in &scope_spans.spans {
                            digest.line(span.name.clone());
                            digest.attributes(&convert_attributes(&span.attributes));
                        }
                    }
                }
            },
            PayloadBatch::Metrics(batch) => {
                for resource_metrics in batch.iter() {
                    digest.resource(resource_metrics.resource.as_ref());
                    for scope_metrics in &resource_metrics.scope_metrics {
                        digest.scope(scope_metrics.scope.as_ref());
                        for metric in &scope_metrics.metrics {
                            digest.line(metric.name.clone());
                            match &metric.data {
                                Some(Data::Gauge(gauge)) => gauge
                                    .data_points
                                    .iter()
                                    .for_each(|p| digest.attributes(&convert_attributes(&p.attributes))),
                                Some(Data::Sum(sum)) => sum
                                    .data_points
                                    .iter()
                                    .for_each(|p| digest.attributes(&convert_attributes(&p.attributes))),
                                Some(Data::Summary(summary)) => summary
                                    .data_points
                                    .iter()
                                    .for_each(|p| digest.attributes(&convert_attributes(&p.attributes))),
                                Some(Data::Histogram(histogram)) => histogram
                                    .data_points
                                    .iter()
                                    .for_each(|p| digest.attributes(&convert_attributes(&p.attributes))),
                                Some(Data::ExponentialHistogram(histogram)) => histogram
                                    .data_points
                                    .iter()
                                    .for_each(|p| digest.attributes(&convert_attributes(&p.attributes))),
                                None => {},
                            }
                        }
                    }
                }
            },
        }

        digest.lines.join("\n")
    }
}

#[derive(Default)]
struct Digest {
    lines: Vec<String>,
}

impl Digest {
    fn line(&mut self, line: String) {
        if !line.is_empty() {
            self.lines.push(line);
        }
    }

    fn attributes(&mut self, attributes: &[KeyValue]) {
        for kv in attributes {
            self.lines.push(format!("{}={}", kv.key, kv.display_value()));
        }
    }

    fn resource(&mut self, resource: Option<&ProtoResource>) {
        if let Some(resource) = resource {
            self.attributes(&convert_attributes(&resource.attributes));
        }
    }

    fn scope(&mut self, scope: Option<&ProtoScope>) {
        if let Some(scope) = scope {
            self.line(scope.name.clone());
            self.attributes(&convert_attributes(&scope.attributes));
        }
    }
}
