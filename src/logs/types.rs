//! Log data types and structures

use crate::core::{
    AttributeValue, Attributes, InstrumentationScope, Resource, SpanId, TraceId,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Log severity levels per OpenTelemetry specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum LogSeverity {
    Unspecified = 0,
    Trace = 1,
    Debug = 5,
    Info = 9,
    Warn = 13,
    Error = 17,
    Fatal = 21,
}

impl LogSeverity {
    /// Convert from OTLP severity number
    pub fn from_otlp(severity: i32) -> Self {
        match severity {
            1..=4 => Self::Trace,
            5..=8 => Self::Debug,
            9..=12 => Self::Info,
            13..=16 => Self::Warn,
            17..=20 => Self::Error,
            21..=24 => Self::Fatal,
            _ => Self::Unspecified,
        }
    }

    /// Get display string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }
}

/// Severity as sent by the producer: the numeric level and its free-form label
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Severity {
    pub number: i32,
    pub text: String,
}

impl Severity {
    pub fn level(&self) -> LogSeverity {
        LogSeverity::from_otlp(self.number)
    }

    /// Producer label when present, otherwise the label of the numeric level
    pub fn label(&self) -> &str {
        if self.text.is_empty() {
            self.level().as_str()
        } else {
            &self.text
        }
    }
}

/// A normalized log record. Immutable once stored.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Wall clock time the batch was ingested
    pub received: DateTime<Utc>,
    /// Event time in unix nanoseconds; zero when the producer left it unset
    pub timestamp: u64,
    /// Time the record was observed by the collection pipeline
    pub observed_timestamp: u64,
    pub severity: Severity,
    pub body: Option<AttributeValue>,
    pub attributes: Attributes,
    /// Optional trace ID for correlation
    pub trace_id: Option<TraceId>,
    /// Optional span ID for correlation
    pub span_id: Option<SpanId>,
    pub flags: u32,
    pub scope: Arc<InstrumentationScope>,
    pub resource: Arc<Resource>,
}

impl LogRecord {
    /// Create a record with empty resource/scope and no correlation ids
    pub fn new(timestamp: u64, severity: Severity, body: AttributeValue) -> Self {
        Self {
            received: Utc::now(),
            timestamp,
            observed_timestamp: 0,
            severity,
            body: Some(body),
            attributes: Vec::new(),
            trace_id: None,
            span_id: None,
            flags: 0,
            scope: Arc::default(),
            resource: Arc::default(),
        }
    }

    /// Set trace ID for correlation
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Set span ID for correlation
    pub fn with_span_id(mut self, span_id: SpanId) -> Self {
        self.span_id = Some(span_id);
        self
    }

    /// Body rendered for display, empty when absent
    pub fn body_text(&self) -> String {
        self.body.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    pub fn service_name(&self) -> String {
        self.resource.service_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_from_otlp() {
        assert_eq!(LogSeverity::from_otlp(1), LogSeverity::Trace);
        assert_eq!(LogSeverity::from_otlp(5), LogSeverity::Debug);
        assert_eq!(LogSeverity::from_otlp(9), LogSeverity::Info);
        assert_eq!(LogSeverity::from_otlp(13), LogSeverity::Warn);
        assert_eq!(LogSeverity::from_otlp(17), LogSeverity::Error);
        assert_eq!(LogSeverity::from_otlp(21), LogSeverity::Fatal);

        // Edge cases
        assert_eq!(LogSeverity::from_otlp(0), LogSeverity::Unspecified);
        assert_eq!(LogSeverity::from_otlp(100), LogSeverity::Unspecified);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(LogSeverity::Trace < LogSeverity::Debug);
        assert!(LogSeverity::Debug < LogSeverity::Info);
        assert!(LogSeverity::Info < LogSeverity::Warn);
        assert!(LogSeverity::Warn < LogSeverity::Error);
        assert!(LogSeverity::Error < LogSeverity::Fatal);
    }

    #[test]
    fn test_severity_label_prefers_producer_text() {
        let named = Severity { number: 17, text: "oops".into() };
        assert_eq!(named.label(), "oops");

        let numeric = Severity { number: 13, text: String::new() };
        assert_eq!(numeric.label(), "WARN");
    }

    #[test]
    fn test_log_record_with_trace() {
        let record = LogRecord::new(
            1234567890,
            Severity { number: 17, text: "ERROR".into() },
            AttributeValue::String("Error occurred".into()),
        )
        .with_trace_id(TraceId::new("abcd1234"))
        .with_span_id(SpanId::new("ef567890"));

        assert_eq!(record.trace_id, Some(TraceId::new("abcd1234")));
        assert_eq!(record.span_id, Some(SpanId::new("ef567890")));
        assert_eq!(record.body_text(), "Error occurred");
        assert_eq!(record.service_name(), "-");
    }
}
