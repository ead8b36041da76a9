//! Spans, traces and the trace tree.
//!
//! Spans are stored flat per trace in arrival order; [`SpanForest`] derives
//! the parent/child structure on demand.

pub mod assembly;
pub mod storage;
pub mod types;

pub use assembly::{SpanForest, SpanNode};
pub use storage::TraceStore;
pub use types::{
    Span, SpanBuilder, SpanEvent, SpanKind, SpanLink, SpanStatus, StatusCode, Trace, TraceSummary,
};
