use crate::core::{Attributes, InstrumentationScope, Resource, SpanId, TraceId};
use std::sync::Arc;
use std::time::Duration;

/// Kind of span as defined by OTLP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpanKind {
    #[default]
    Unspecified,
    Internal,
    Server,
    Client,
    Producer,
    Consumer,
}

impl SpanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanKind::Unspecified => "SPAN_KIND_UNSPECIFIED",
            SpanKind::Internal => "SPAN_KIND_INTERNAL",
            SpanKind::Server => "SPAN_KIND_SERVER",
            SpanKind::Client => "SPAN_KIND_CLIENT",
            SpanKind::Producer => "SPAN_KIND_PRODUCER",
            SpanKind::Consumer => "SPAN_KIND_CONSUMER",
        }
    }
}

/// Status code of a span execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusCode {
    #[default]
    Unset,
    Ok,
    Error,
}

impl StatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Unset => "STATUS_CODE_UNSET",
            StatusCode::Ok => "STATUS_CODE_OK",
            StatusCode::Error => "STATUS_CODE_ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpanStatus {
    pub code: StatusCode,
    pub message: String,
}

impl SpanStatus {
    /// Returns true if the span status indicates an error
    pub fn is_error(&self) -> bool {
        self.code == StatusCode::Error
    }
}

/// A timestamped annotation on a span
#[derive(Debug, Clone, PartialEq)]
pub struct SpanEvent {
    pub timestamp: u64,
    pub name: String,
    pub attributes: Attributes,
}

/// A reference from a span to a span in the same or another trace
#[derive(Debug, Clone, PartialEq)]
pub struct SpanLink {
    pub trace_id: TraceId,
    pub span_id: Option<SpanId>,
    pub attributes: Attributes,
}

/// A single timed operation. Immutable once stored.
#[derive(Debug, Clone)]
pub struct Span {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    /// `None` when the producer sent no parent
    pub parent_span_id: Option<SpanId>,
    pub name: String,
    pub kind: SpanKind,
    /// Unix nanoseconds
    pub start_time: u64,
    /// Unix nanoseconds
    pub end_time: u64,
    pub status: SpanStatus,
    pub attributes: Attributes,
    pub events: Vec<SpanEvent>,
    pub links: Vec<SpanLink>,
    pub resource: Arc<Resource>,
    pub scope: Arc<InstrumentationScope>,
}

impl Span {
    /// Creates a new span builder
    pub fn builder(trace_id: TraceId, span_id: SpanId) -> SpanBuilder {
        SpanBuilder::new(trace_id, span_id)
    }

    /// Returns true if the producer declared no parent
    pub fn is_root(&self) -> bool {
        self.parent_span_id.is_none()
    }

    /// Wall duration of the span; zero when end precedes start
    pub fn duration(&self) -> Duration {
        Duration::from_nanos(self.end_time.saturating_sub(self.start_time))
    }

    pub fn service_name(&self) -> String {
        self.resource.service_name()
    }
}

/// Builder for creating Span instances
pub struct SpanBuilder {
    span: Span,
}

impl SpanBuilder {
    fn new(trace_id: TraceId, span_id: SpanId) -> Self {
        Self {
            span: Span {
                trace_id,
                span_id,
                parent_span_id: None,
                name: String::new(),
                kind: SpanKind::Unspecified,
                start_time: 0,
                end_time: 0,
                status: SpanStatus::default(),
                attributes: Vec::new(),
                events: Vec::new(),
                links: Vec::new(),
                resource: Arc::default(),
                scope: Arc::default(),
            },
        }
    }

    pub fn parent(mut self, parent_span_id: SpanId) -> Self {
        self.span.parent_span_id = Some(parent_span_id);
        self
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.span.name = name.into();
        self
    }

    pub fn kind(mut self, kind: SpanKind) -> Self {
        self.span.kind = kind;
        self
    }

    pub fn times(mut self, start_time: u64, end_time: u64) -> Self {
        self.span.start_time = start_time;
        self.span.end_time = end_time;
        self
    }

    pub fn status(mut self, code: StatusCode, message: &str) -> Self {
        self.span.status = SpanStatus {
            code,
            message: message.to_string(),
        };
        self
    }

    pub fn resource(mut self, resource: Arc<Resource>) -> Self {
        self.span.resource = resource;
        self
    }

    pub fn build(self) -> Span {
        self.span
    }
}

/// All spans observed for one trace id, in arrival order.
///
/// The causal tree is derived on demand by [`Trace::assemble`].
#[derive(Debug, Clone)]
pub struct Trace {
    pub trace_id: TraceId,
    pub spans: Vec<Arc<Span>>,
}

/// List-row statistics for a trace
#[derive(Debug, Clone)]
pub struct TraceSummary {
    pub trace_id: TraceId,
    /// The single parentless span, `None` when there are zero or several
    pub root: Option<Arc<Span>>,
    pub span_count: usize,
    /// Earliest span start, unix nanoseconds
    pub start_time: u64,
    /// Latest span end minus earliest span start
    pub duration: Duration,
    pub has_errors: bool,
}

impl Trace {
    pub fn new(trace_id: TraceId) -> Self {
        Self {
            trace_id,
            spans: Vec::new(),
        }
    }

    /// Compute the summary shown in trace lists
    pub fn summary(&self) -> TraceSummary {
        let mut parentless = self.spans.iter().filter(|span| span.is_root());
        let root = match (parentless.next(), parentless.next()) {
            (Some(only), None) => Some(Arc::clone(only)),
            _ => None,
        };

        let start_time = self.spans.iter().map(|s| s.start_time).min().unwrap_or(0);
        let end_time = self.spans.iter().map(|s| s.end_time).max().unwrap_or(0);

        TraceSummary {
            trace_id: self.trace_id.clone(),
            root,
            span_count: self.spans.len(),
            start_time,
            duration: Duration::from_nanos(end_time.saturating_sub(start_time)),
            has_errors: self.spans.iter().any(|s| s.status.is_error()),
        }
    }
}

impl TraceSummary {
    /// Name shown for the trace: the root span name, or a placeholder for rootless traces
    pub fn display_name(&self) -> &str {
        self.root.as_ref().map_or("(no root span)", |root| root.name.as_str())
    }
}
