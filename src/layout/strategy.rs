//! Height strategies, one per node kind
//!
//! The walk visits the last page's content in document order. Each strategy
//! adds the node's height to the [`SplitContext`] and tells the walk whether
//! to descend into the node; the walk stops as soon as a boundary is set.

use super::break_search::find_break;
use super::split_context::{SplitBoundary, SplitContext};
use crate::document::{Node, NodeKind};
use crate::measure::{MeasurementOracle, Measurer, RenderedBox};
use std::rc::Rc;

/// What the walk does after visiting a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// Visit the node's children next
    Descend,
    /// Continue with the next sibling
    Skip,
}

/// Tunables read by the strategies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyOptions {
    pub eager_paragraph_split: bool,
    pub fixed_block_chrome: f32,
}

impl Default for StrategyOptions {
    fn default() -> Self {
        Self {
            eager_paragraph_split: false,
            fixed_block_chrome: 8.0,
        }
    }
}

/// Walk the last page and return where it must be split, if anywhere
pub fn find_boundary<O: MeasurementOracle>(
    measurer: &mut Measurer<O>,
    cx: &mut SplitContext<'_>,
    options: StrategyOptions,
) -> Option<SplitBoundary> {
    let page = cx.last_page()?;
    let doc = cx.doc();
    let scope = measurer.markup(page);
    let mut walker = Walker {
        measurer,
        cx,
        options,
        scope,
    };
    walker.children(doc, 0);
    walker.cx.page_boundary()
}

struct Walker<'w, 'a, O> {
    measurer: &'w mut Measurer<O>,
    cx: &'w mut SplitContext<'a>,
    options: StrategyOptions,
    /// Markup of the last page; elements are measured in its context
    scope: Rc<str>,
}

impl<'w, 'a, O: MeasurementOracle> Walker<'w, 'a, O> {
    fn children(&mut self, parent: &'a Node, content_start: usize) {
        let mut pos = content_start;
        for (index, child) in parent.content.iter().enumerate() {
            if self.cx.page_boundary().is_some() {
                return;
            }
            if self.visit(child, pos, parent, index) == Walk::Descend && !child.is_leaf() {
                self.children(child, pos + 1);
            }
            pos += child.node_size();
        }
    }

    fn visit(&mut self, node: &'a Node, pos: usize, parent: &'a Node, index: usize) -> Walk {
        match node.kind {
            NodeKind::Doc | NodeKind::Text | NodeKind::HardBreak => return Walk::Skip,
            NodeKind::Page => {
                return if self.cx.is_last_page(pos) {
                    Walk::Descend
                } else {
                    Walk::Skip
                };
            }
            _ => {}
        }

        let Some(bx) = self.measurer.element_box_in(&self.scope, node) else {
            log::trace!("no rendered element for {:?} at {}", node.kind, pos);
            return Walk::Skip;
        };
        let next_margin = match parent.content.get(index + 1) {
            Some(next) => self
                .measurer
                .element_box_in(&self.scope, next)
                .map_or(0.0, |next| next.margin_top),
            None => 0.0,
        };
        let leading = index == 0 || node.kind == NodeKind::ListItem;
        let height = bx.outer_height(next_margin, leading);

        match node.kind {
            NodeKind::BulletList | NodeKind::OrderedList => self.list(height),
            NodeKind::ListItem => self.list_item(pos, &bx, height),
            NodeKind::Heading | NodeKind::Paragraph => self.textblock(node, pos, index, &bx, height),
            NodeKind::TransientText => self.transient_text(&bx, height),
            NodeKind::FixedBlock | NodeKind::FixedBlockExtend => self.fixed_block(),
            NodeKind::Doc | NodeKind::Page | NodeKind::Text | NodeKind::HardBreak => Walk::Skip,
        }
    }

    /// Lists are measured whole; only a list that overflows is entered
    fn list(&mut self, height: f32) -> Walk {
        if self.cx.is_overflow(height) {
            Walk::Descend
        } else {
            self.cx.add_height(height);
            Walk::Skip
        }
    }

    fn list_item(&mut self, pos: usize, bx: &RenderedBox, height: f32) -> Walk {
        if !self.cx.is_overflow(height) {
            self.cx.add_height(height);
            return Walk::Skip;
        }
        if height > self.cx.budget() {
            // taller than any page: split inside the item
            self.cx.add_height(bx.padding_and_margin());
            return Walk::Descend;
        }
        self.boundary_before(pos, height)
    }

    fn textblock(
        &mut self,
        node: &'a Node,
        pos: usize,
        index: usize,
        bx: &RenderedBox,
        height: f32,
    ) -> Walk {
        if !self.cx.is_overflow(height) {
            self.cx.add_height(height);
            return Walk::Skip;
        }

        let eager = self.options.eager_paragraph_split
            && node.kind == NodeKind::Paragraph
            && height > self.cx.default_height();
        if height > self.cx.budget() || eager {
            if let Some(offset) = find_break(self.measurer, self.cx, node, bx, index == 0) {
                let cut = pos + 1 + offset;
                match self.cx.split_resolve(cut) {
                    Ok(chain) => {
                        self.cx.set_boundary(cut, chain.depth());
                        return Walk::Skip;
                    }
                    Err(err) => log::warn!("break at {} does not resolve: {}", cut, err),
                }
            }
        }
        self.boundary_before(pos, height)
    }

    /// Only the content area of an overflowing transient text counts
    fn transient_text(&mut self, bx: &RenderedBox, height: f32) -> Walk {
        if self.cx.is_overflow(height) {
            self.cx.add_height(bx.content_spacing());
            Walk::Descend
        } else {
            self.cx.add_height(height);
            Walk::Skip
        }
    }

    fn fixed_block(&mut self) -> Walk {
        self.cx.add_height(self.options.fixed_block_chrome);
        Walk::Descend
    }

    /// Set the boundary directly before the node at `pos`. A first child moves
    /// the boundary up to its parent. A node that already starts the page is
    /// kept on it, overflowing.
    fn boundary_before(&mut self, pos: usize, height: f32) -> Walk {
        let chain = match self.cx.split_resolve(pos) {
            Ok(chain) => chain,
            Err(err) => {
                log::warn!("boundary at {} does not resolve: {}", pos, err);
                self.cx.add_height(height);
                return Walk::Skip;
            }
        };

        let mut depth = chain.depth();
        let mut at = pos;
        while depth >= 2 && chain.index(depth) == 0 {
            at = chain.before(depth).unwrap_or(at);
            depth -= 1;
        }

        if depth == 1 && chain.index(1) == 0 {
            log::debug!("block at {} overflows an otherwise empty page", pos);
            self.cx.add_height(height);
            return Walk::Skip;
        }
        self.cx.set_boundary(at, depth);
        Walk::Skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Attrs;
    use crate::layout::PageLayout;
    use crate::measure::HeadlessOracle;

    fn measurer() -> Measurer<HeadlessOracle> {
        let mut measurer = Measurer::new(HeadlessOracle::default(), 100);
        measurer.rebuild_surface(&PageLayout::plain(480.0, 280.0, 40.0));
        measurer
    }

    fn boundary(doc: &Node) -> Option<SplitBoundary> {
        let mut measurer = measurer();
        let mut cx = SplitContext::new(doc, 200.0, 20.0);
        find_boundary(&mut measurer, &mut cx, StrategyOptions::default())
    }

    fn lines(n: usize) -> Vec<Node> {
        (0..n)
            .map(|i| Node::paragraph(format!("p{}", i), "abcd"))
            .collect()
    }

    #[test]
    fn test_fitting_page_has_no_boundary() {
        let doc = Node::doc(vec![Node::page("pg", 1, lines(10))]);
        assert_eq!(boundary(&doc), None);
    }

    #[test]
    fn test_boundary_before_first_overflowing_block() {
        let doc = Node::doc(vec![Node::page("pg", 1, lines(12))]);
        // each paragraph occupies six positions
        assert_eq!(boundary(&doc), Some(SplitBoundary { pos: 61, depth: 1 }));
    }

    #[test]
    fn test_only_last_page_is_measured() {
        let doc = Node::doc(vec![
            Node::page("p1", 1, lines(30)),
            Node::page("p2", 2, lines(1)),
        ]);
        assert_eq!(boundary(&doc), None);
    }

    #[test]
    fn test_list_split_between_items() {
        let items = (0..15)
            .map(|i| Node::list_item(format!("li{}", i), vec![Node::paragraph(format!("p{}", i), "abcd")]))
            .collect();
        let doc = Node::doc(vec![Node::page(
            "pg",
            1,
            vec![Node::ordered_list("ol", None, items)],
        )]);
        // items occupy eight positions each; the list content starts at 2
        assert_eq!(boundary(&doc), Some(SplitBoundary { pos: 82, depth: 2 }));
    }

    #[test]
    fn test_tall_paragraph_breaks_inside_text() {
        let text = vec!["abcd"; 150].join(" ");
        let doc = Node::doc(vec![Node::page("pg", 1, vec![Node::paragraph("a", &text)])]);
        assert_eq!(boundary(&doc), Some(SplitBoundary { pos: 502, depth: 2 }));
    }

    #[test]
    fn test_first_block_moves_boundary_to_parent() {
        let mut blocks = lines(9);
        blocks.push(Node::bullet_list(
            "ul",
            vec![Node::list_item(
                "li",
                vec![Node::paragraph("x", &vec!["abcd"; 30].join(" "))],
            )],
        ));
        let doc = Node::doc(vec![Node::page("pg", 1, blocks)]);
        assert_eq!(boundary(&doc), Some(SplitBoundary { pos: 55, depth: 1 }));
    }

    fn words(n: usize) -> String {
        vec!["abcd"; n].join(" ")
    }

    #[test]
    fn test_overflowing_transient_text_counts_only_its_spacing() {
        let mut blocks = lines(9);
        blocks.push(Node::transient_text("t", &words(25)));
        blocks.push(Node::paragraph("after", "x"));
        let doc = Node::doc(vec![Node::page("pg", 1, blocks)]);
        // 180 + 8 leaves the following paragraph overflowing, not the note
        assert_eq!(boundary(&doc), Some(SplitBoundary { pos: 181, depth: 1 }));
    }

    #[test]
    fn test_fixed_block_splits_between_children() {
        let doc = Node::doc(vec![Node::page(
            "pg",
            1,
            vec![Node::fixed_block("fx", lines(12))],
        )]);
        // 8 of chrome and nine lines fit
        assert_eq!(boundary(&doc), Some(SplitBoundary { pos: 56, depth: 2 }));
    }

    #[test]
    fn test_heading_taller_than_page_breaks_inside() {
        let doc = Node::doc(vec![Node::page(
            "pg",
            1,
            vec![Node::heading("h", 1, &words(60))],
        )]);
        // 40px lines; 188px left after the heading margins holds four
        assert_eq!(boundary(&doc), Some(SplitBoundary { pos: 202, depth: 2 }));
    }

    #[test]
    fn test_item_taller_than_page_is_split_inside() {
        let items = vec![Node::list_item("li", lines(15))];
        let doc = Node::doc(vec![Node::page(
            "pg",
            1,
            vec![Node::ordered_list("ol", None, items)],
        )]);
        // ten paragraphs fit; the cut falls inside the item
        assert_eq!(boundary(&doc), Some(SplitBoundary { pos: 63, depth: 3 }));
    }

    #[test]
    fn test_block_without_id_is_skipped() {
        let text = vec!["abcd"; 150].join(" ");
        let anonymous = Node::element(
            NodeKind::Paragraph,
            Attrs::default(),
            vec![Node::text(text)],
        );
        let doc = Node::doc(vec![Node::page("pg", 1, vec![anonymous])]);
        assert_eq!(boundary(&doc), None);
    }

    #[test]
    fn test_overflowing_first_block_stays() {
        // one-line blocks taller than the page cannot be broken
        let doc = Node::doc(vec![Node::page(
            "pg",
            1,
            vec![Node::paragraph("a", "abcdef"), Node::paragraph("b", "x")],
        )]);
        let mut measurer = measurer();
        let mut cx = SplitContext::new(&doc, 10.0, 20.0);
        let found = find_boundary(&mut measurer, &mut cx, StrategyOptions::default());
        assert_eq!(found, Some(SplitBoundary { pos: 9, depth: 1 }));
    }
}
