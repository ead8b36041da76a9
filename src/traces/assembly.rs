//! Trace tree assembly.
//!
//! Spans arrive in any order and in any number of batches, so the causal tree
//! is rebuilt from the flat arrival-ordered list every time it is needed:
//!
//! - a span whose parent is absent, or not present in the trace, becomes a root
//! - children are attached in arrival order
//! - a span id is expanded at most once per forest; reaching it again (a cyclic
//!   parent chain, or a redelivered copy of the span) emits a leaf that is not
//!   descended into
//! - spans reachable from no root (every member of a pure cycle) start extra
//!   trees, in arrival order
//!
//! Nodes live in a flat arena in preorder, so the arena doubles as the list of
//! display rows.

use crate::traces::types::{Span, Trace};
use ahash::{AHashMap, AHashSet};
use std::sync::Arc;

/// One placed span in a [`SpanForest`]
#[derive(Debug, Clone)]
pub struct SpanNode {
    pub span: Arc<Span>,
    /// Distance from the tree root
    pub depth: usize,
    /// Arena indices of the children, in arrival order
    pub children: Vec<usize>,
    /// Set when the span id was already expanded elsewhere; such nodes have no children
    pub repeated: bool,
}

/// Assembled trees of one trace
#[derive(Debug, Clone, Default)]
pub struct SpanForest {
    nodes: Vec<SpanNode>,
    roots: Vec<usize>,
}

struct Frame {
    arrival: usize,
    depth: usize,
    parent: Option<usize>,
}

impl SpanForest {
    /// Build the forest for an arrival-ordered span list
    pub fn assemble(spans: &[Arc<Span>]) -> Self {
        let known: AHashSet<&str> = spans.iter().map(|s| s.span_id.as_str()).collect();

        let mut children: AHashMap<&str, Vec<usize>> = AHashMap::new();
        let mut roots = Vec::new();
        for (arrival, span) in spans.iter().enumerate() {
            match &span.parent_span_id {
                Some(parent) if known.contains(parent.as_str()) => {
                    children.entry(parent.as_str()).or_default().push(arrival);
                },
                _ => roots.push(arrival),
            }
        }

        let mut forest = SpanForest::default();
        let mut placed = vec![false; spans.len()];
        let mut expanded: AHashSet<&str> = AHashSet::new();

        for arrival in roots {
            forest.descend(spans, &children, &mut placed, &mut expanded, arrival);
        }
        for arrival in 0..spans.len() {
            if !placed[arrival] {
                forest.descend(spans, &children, &mut placed, &mut expanded, arrival);
            }
        }

        forest
    }

    fn descend<'a>(
        &mut self,
        spans: &'a [Arc<Span>],
        children: &AHashMap<&'a str, Vec<usize>>,
        placed: &mut [bool],
        expanded: &mut AHashSet<&'a str>,
        root: usize,
    ) {
        let mut stack = vec![Frame {
            arrival: root,
            depth: 0,
            parent: None,
        }];

        while let Some(frame) = stack.pop() {
            let span = &spans[frame.arrival];
            let id = span.span_id.as_str();
            let repeated = !expanded.insert(id);

            let index = self.nodes.len();
            self.nodes.push(SpanNode {
                span: Arc::clone(span),
                depth: frame.depth,
                children: Vec::new(),
                repeated,
            });
            match frame.parent {
                Some(parent) => self.nodes[parent].children.push(index),
                None => self.roots.push(index),
            }
            placed[frame.arrival] = true;

            if repeated {
                continue;
            }

            if let Some(kids) = children.get(id) {
                for &child in kids.iter().rev() {
                    stack.push(Frame {
                        arrival: child,
                        depth: frame.depth + 1,
                        parent: Some(index),
                    });
                }
            }
        }
    }

    /// Root nodes, one per tree
    pub fn roots(&self) -> impl Iterator<Item = &SpanNode> {
        self.roots.iter().map(|&i| &self.nodes[i])
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Children of a node, in arrival order
    pub fn children<'a>(&'a self, node: &'a SpanNode) -> impl Iterator<Item = &'a SpanNode> {
        node.children.iter().map(|&i| &self.nodes[i])
    }

    /// Every node in preorder; row `n` of a rendered tree is element `n`
    pub fn preorder(&self) -> &[SpanNode] {
        &self.nodes
    }

    /// Span shown on a display row
    pub fn span_at(&self, row: usize) -> Option<&Arc<Span>> {
        self.nodes.get(row).map(|node| &node.span)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Trace {
    /// Derive the causal forest for this trace
    pub fn assemble(&self) -> SpanForest {
        SpanForest::assemble(&self.spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SpanId, TraceId};

    fn span(id: &str, parent: Option<&str>) -> Arc<Span> {
        let mut builder = Span::builder(TraceId::new("tr1"), SpanId::new(id)).name(id);
        if let Some(parent) = parent {
            builder = builder.parent(SpanId::new(parent));
        }
        Arc::new(builder.build())
    }

    fn rows(forest: &SpanForest) -> Vec<(usize, &str)> {
        forest
            .preorder()
            .iter()
            .map(|n| (n.depth, n.span.span_id.as_str()))
            .collect()
    }

    #[test]
    fn test_single_root_with_child() {
        let forest = SpanForest::assemble(&[span("s1", None), span("s2", Some("s1"))]);

        assert_eq!(forest.root_count(), 1);
        let root = forest.roots().next().unwrap();
        assert_eq!(root.span.span_id.as_str(), "s1");
        let kids: Vec<&str> = forest.children(root).map(|n| n.span.span_id.as_str()).collect();
        assert_eq!(kids, vec!["s2"]);
    }

    #[test]
    fn test_children_follow_arrival_order() {
        let spans = [
            span("c2", Some("root")),
            span("root", None),
            span("c1", Some("root")),
            span("g1", Some("c2")),
        ];
        let forest = SpanForest::assemble(&spans);

        assert_eq!(rows(&forest), vec![(0, "root"), (1, "c2"), (2, "g1"), (1, "c1")]);
    }

    #[test]
    fn test_orphan_becomes_root() {
        let spans = [
            span("root", None),
            span("orphan", Some("never-arrived")),
            span("child", Some("orphan")),
        ];
        let forest = SpanForest::assemble(&spans);

        assert_eq!(forest.root_count(), 2);
        assert_eq!(rows(&forest), vec![(0, "root"), (0, "orphan"), (1, "child")]);
    }

    #[test]
    fn test_three_cycle_terminates() {
        // A -> parent B, B -> parent C, C -> parent A
        let spans = [span("A", Some("B")), span("B", Some("C")), span("C", Some("A"))];
        let forest = SpanForest::assemble(&spans);

        assert_eq!(forest.root_count(), 1);
        assert_eq!(rows(&forest), vec![(0, "A"), (1, "C"), (2, "B"), (3, "A")]);
        let last = forest.preorder().last().unwrap();
        assert!(last.repeated);
        assert!(last.children.is_empty());
    }

    #[test]
    fn test_self_parent_terminates() {
        let forest = SpanForest::assemble(&[span("loop", Some("loop"))]);

        assert_eq!(rows(&forest), vec![(0, "loop"), (1, "loop")]);
        assert!(forest.preorder()[1].repeated);
    }

    #[test]
    fn test_cycle_hanging_off_a_tree() {
        // root is fine; x and y point at each other and are unreachable from it
        let spans = [span("root", None), span("x", Some("y")), span("y", Some("x"))];
        let forest = SpanForest::assemble(&spans);

        assert_eq!(forest.root_count(), 2);
        assert_eq!(rows(&forest), vec![(0, "root"), (0, "x"), (1, "y"), (2, "x")]);
    }

    #[test]
    fn test_redelivered_chain_expands_once() {
        let mut spans = vec![span("0", None)];
        for i in 1..22 {
            spans.push(span(&i.to_string(), Some(&(i - 1).to_string())));
        }
        let resent = spans.clone();
        spans.extend(resent);

        let forest = SpanForest::assemble(&spans);

        assert!(forest.len() <= 2 * spans.len());
        assert_eq!(forest.len(), 44);
        assert_eq!(forest.root_count(), 2);
        assert_eq!(forest.preorder().iter().map(|n| n.depth).max(), Some(21));
        assert_eq!(forest.preorder().iter().filter(|n| n.repeated).count(), 22);
    }

    #[test]
    fn test_duplicate_leaf_has_no_children() {
        let spans = [
            span("root", None),
            span("a", Some("root")),
            span("a", Some("root")),
            span("b", Some("a")),
        ];
        let forest = SpanForest::assemble(&spans);

        assert_eq!(rows(&forest), vec![(0, "root"), (1, "a"), (2, "b"), (1, "a")]);
        assert!(forest.preorder()[3].repeated);
        assert!(forest.preorder()[3].children.is_empty());
    }

    #[test]
    fn test_span_at_maps_rows() {
        let forest = SpanForest::assemble(&[span("b", Some("a")), span("a", None)]);

        assert_eq!(forest.span_at(0).unwrap().span_id.as_str(), "a");
        assert_eq!(forest.span_at(1).unwrap().span_id.as_str(), "b");
        assert!(forest.span_at(2).is_none());
    }

    #[test]
    fn test_empty_trace() {
        let forest = SpanForest::assemble(&[]);
        assert!(forest.is_empty());
        assert_eq!(forest.root_count(), 0);
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let mut spans = vec![span("0", None)];
        for i in 1..50_000 {
            spans.push(span(&i.to_string(), Some(&(i - 1).to_string())));
        }
        let forest = SpanForest::assemble(&spans);

        assert_eq!(forest.len(), 50_000);
        assert_eq!(forest.preorder().last().unwrap().depth, 49_999);
    }
}
