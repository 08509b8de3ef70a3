//! Accumulator for one overflow-detection walk over the last page

use crate::document::{AncestorChain, Node, NodeKind};
use crate::error::TreeError;

/// Where the next page split must happen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitBoundary {
    pub pos: usize,
    /// Number of ancestor levels to split, counted from the innermost one
    pub depth: usize,
}

/// Running height total and the single boundary found in a walk.
///
/// Lives for one walk only; the orchestrator builds a fresh one for every
/// iteration of the split loop.
#[derive(Debug)]
pub struct SplitContext<'a> {
    doc: &'a Node,
    budget: f32,
    default_height: f32,
    accumulated: f32,
    boundary: Option<SplitBoundary>,
    last_page: Option<(usize, &'a Node)>,
}

impl<'a> SplitContext<'a> {
    pub fn new(doc: &'a Node, budget: f32, default_height: f32) -> Self {
        let last_page = doc
            .content
            .iter()
            .enumerate()
            .rev()
            .find(|(_, node)| node.kind == NodeKind::Page)
            .map(|(index, page)| (doc.child_offset(index), page));
        Self {
            doc,
            budget,
            default_height,
            accumulated: 0.0,
            boundary: None,
            last_page,
        }
    }

    pub fn doc(&self) -> &'a Node {
        self.doc
    }

    pub fn budget(&self) -> f32 {
        self.budget
    }

    pub fn default_height(&self) -> f32 {
        self.default_height
    }

    pub fn accumulated(&self) -> f32 {
        self.accumulated
    }

    pub fn add_height(&mut self, height: f32) {
        self.accumulated += height;
    }

    /// Whether `height` more content would overflow the page
    pub fn is_overflow(&self, height: f32) -> bool {
        self.accumulated + height > self.budget
    }

    /// Overflow by at least one default block height
    pub fn is_overflow_test(&self, height: f32) -> bool {
        self.is_overflow(height) && self.accumulated + height - self.budget >= self.default_height
    }

    /// Record the split point. The first boundary of a walk wins.
    pub fn set_boundary(&mut self, pos: usize, depth: usize) {
        if self.boundary.is_none() {
            log::debug!("split boundary at {} depth {}", pos, depth);
            self.boundary = Some(SplitBoundary { pos, depth });
        }
    }

    pub fn page_boundary(&self) -> Option<SplitBoundary> {
        self.boundary
    }

    pub fn split_resolve(&self, pos: usize) -> Result<AncestorChain<'a>, TreeError> {
        AncestorChain::resolve(self.doc, pos)
    }

    /// The final page, the only one a walk measures
    pub fn last_page(&self) -> Option<&'a Node> {
        self.last_page.map(|(_, page)| page)
    }

    /// Position directly before the last page
    pub fn last_page_pos(&self) -> Option<usize> {
        self.last_page.map(|(pos, _)| pos)
    }

    pub fn is_last_page(&self, pos: usize) -> bool {
        self.last_page_pos() == Some(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Node {
        Node::doc(vec![
            Node::page("p1", 1, vec![Node::paragraph("a", "one")]),
            Node::page("p2", 2, vec![Node::paragraph("b", "two")]),
        ])
    }

    #[test]
    fn test_overflow_checks() {
        let doc = doc();
        let mut cx = SplitContext::new(&doc, 100.0, 20.0);
        cx.add_height(90.0);
        assert!(!cx.is_overflow(10.0));
        assert!(cx.is_overflow(10.5));
        assert!(!cx.is_overflow_test(10.5));
        assert!(cx.is_overflow_test(30.0));
    }

    #[test]
    fn test_first_boundary_wins() {
        let doc = doc();
        let mut cx = SplitContext::new(&doc, 100.0, 20.0);
        cx.set_boundary(8, 1);
        cx.set_boundary(3, 2);
        assert_eq!(cx.page_boundary(), Some(SplitBoundary { pos: 8, depth: 1 }));
    }

    #[test]
    fn test_last_page() {
        let doc = doc();
        let cx = SplitContext::new(&doc, 100.0, 20.0);
        assert_eq!(cx.last_page().and_then(Node::id).unwrap().as_str(), "p2");
        assert_eq!(cx.last_page_pos(), Some(7));
        assert!(cx.is_last_page(7));
        assert!(!cx.is_last_page(0));
        assert_eq!(cx.split_resolve(9).unwrap().depth(), 2);
    }
}
