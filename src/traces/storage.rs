//! Trace storage keyed by trace id

use crate::core::TraceId;
use crate::traces::types::{Span, Trace};
use ahash::AHashMap;
use std::sync::Arc;

/// Spans grouped by trace id, iterated in the order trace ids were first seen.
///
/// A trace entry is created on its first span and only grows afterward. Not
/// synchronized; the coordinator owns the lock around it.
#[derive(Debug, Default)]
pub struct TraceStore {
    traces: AHashMap<TraceId, Trace>,
    order: Vec<TraceId>,
    span_count: usize,
}

impl TraceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append spans to a trace, creating the entry on first sight
    pub fn append(&mut self, trace_id: TraceId, spans: Vec<Arc<Span>>) {
        self.span_count += spans.len();
        match self.traces.get_mut(&trace_id) {
            Some(trace) => trace.spans.extend(spans),
            None => {
                self.order.push(trace_id.clone());
                let mut trace = Trace::new(trace_id.clone());
                trace.spans = spans;
                self.traces.insert(trace_id, trace);
            },
        }
    }

    /// Snapshot of every trace in first-seen order
    pub fn all(&self) -> Vec<Trace> {
        self.order
            .iter()
            .filter_map(|id| self.traces.get(id))
            .cloned()
            .collect()
    }

    /// Snapshot of one trace
    pub fn get(&self, trace_id: &TraceId) -> Option<Trace> {
        self.traces.get(trace_id).cloned()
    }

    /// Number of distinct traces
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Total spans across all traces
    pub fn span_count(&self) -> usize {
        self.span_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SpanId;

    fn span(trace: &str, id: &str) -> Arc<Span> {
        Arc::new(Span::builder(TraceId::new(trace), SpanId::new(id)).build())
    }

    #[test]
    fn test_first_seen_order() {
        let mut store = TraceStore::new();
        store.append(TraceId::new("b"), vec![span("b", "1")]);
        store.append(TraceId::new("a"), vec![span("a", "2")]);
        store.append(TraceId::new("b"), vec![span("b", "3")]);

        let ids: Vec<String> = store.all().iter().map(|t| t.trace_id.to_string()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.span_count(), 3);
    }

    #[test]
    fn test_append_keeps_arrival_order() {
        let mut store = TraceStore::new();
        store.append(TraceId::new("t"), vec![span("t", "child"), span("t", "root")]);
        store.append(TraceId::new("t"), vec![span("t", "late")]);

        let trace = store.get(&TraceId::new("t")).unwrap();
        let ids: Vec<&str> = trace.spans.iter().map(|s| s.span_id.as_str()).collect();
        assert_eq!(ids, vec!["child", "root", "late"]);
    }

    #[test]
    fn test_snapshot_does_not_grow() {
        let mut store = TraceStore::new();
        store.append(TraceId::new("t"), vec![span("t", "1")]);
        let snapshot = store.get(&TraceId::new("t")).unwrap();

        store.append(TraceId::new("t"), vec![span("t", "2")]);

        assert_eq!(snapshot.spans.len(), 1);
        assert!(store.get(&TraceId::new("missing")).is_none());
    }
}
