//! The pagination pass
//!
//! One pass runs over an owned copy of the edited document:
//!
//! 1. duplicate and missing ids are resolved,
//! 2. stale page boundaries around the edit are merged away,
//! 3. the last page is split until nothing overflows,
//! 4. malformed continuation paragraphs are repaired,
//! 5. empty pages are fixed up and pages renumbered.
//!
//! The returned [`Transaction`] is the identity when the document was stable.

use super::config::PaginationConfig;
use super::dirty::DirtyPageTracker;
use super::numbering::continuation_start;
use super::split_context::{SplitBoundary, SplitContext};
use super::strategy::{find_boundary, StrategyOptions};
use crate::document::{AncestorChain, Attrs, IdGenerator, Node, NodeId, NodeKind};
use crate::editing::{EditContext, SplitShell, Transaction};
use crate::error::TreeError;
use crate::measure::{MeasurementOracle, Measurer};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DedupOp {
    /// Give the node at this position a fresh id
    Assign(usize),
    /// Remove a redundant copy
    Delete { from: usize, to: usize },
}

impl DedupOp {
    fn pos(&self) -> usize {
        match *self {
            DedupOp::Assign(pos) => pos,
            DedupOp::Delete { from, .. } => from,
        }
    }
}

/// Depth at which two adjacent pages are joined: one level per pair of
/// boundary nodes where the later one continues the earlier one
pub fn merge_depth(before: &Node, after: &Node) -> usize {
    match (before.last_child(), after.first_child()) {
        (Some(tail), Some(head)) if continues(tail, head) => 1 + merge_depth(tail, head),
        _ => 1,
    }
}

fn continues(tail: &Node, head: &Node) -> bool {
    head.attrs.extend
        && !tail.is_leaf()
        && !head.is_leaf()
        && (tail.kind == head.kind || head.kind.is_extension())
}

/// Index of the page holding `pos`
pub fn page_index(doc: &Node, pos: usize) -> usize {
    let mut end = 0;
    for (index, page) in doc.content.iter().enumerate() {
        end += page.node_size();
        if pos < end {
            return index;
        }
    }
    doc.child_count().saturating_sub(1)
}

/// One pagination pass over an edit
pub struct PageComputation<'e, O> {
    measurer: &'e mut Measurer<O>,
    config: &'e PaginationConfig,
    ids: &'e mut dyn IdGenerator,
    dirty: &'e mut DirtyPageTracker,
}

impl<'e, O: MeasurementOracle> PageComputation<'e, O> {
    pub fn new(
        measurer: &'e mut Measurer<O>,
        config: &'e PaginationConfig,
        ids: &'e mut dyn IdGenerator,
        dirty: &'e mut DirtyPageTracker,
    ) -> Self {
        Self {
            measurer,
            config,
            ids,
            dirty,
        }
    }

    pub fn run(mut self, ctx: &EditContext<'_>) -> Transaction {
        let mut tr = Transaction::new(ctx.doc.clone());
        self.dedup(&mut tr);

        let meta = ctx.meta;
        if meta.split_requested {
            log::debug!("full pagination requested");
            self.merge_pages(&mut tr, 1);
            self.split_loop(&mut tr);
        } else {
            let head = tr.mapping().map(ctx.selection.head);
            let from = tr.mapping().map(ctx.selection.from);
            if meta.deleting
                && !meta.inserting
                && tr.is_identity()
                && page_index(tr.doc(), head) + 1 >= tr.doc().child_count()
            {
                self.dirty.clear();
                return tr;
            }
            if meta.inserting || meta.deleting {
                self.merge_for_edit(&mut tr, from, head);
                self.split_loop(&mut tr);
                self.repair(&mut tr);
            }
        }

        self.recover_empty_first_page(&mut tr, ctx.prev_doc);
        self.remove_trailing_empty_pages(&mut tr);
        self.renumber(&mut tr);
        self.dirty.clear();
        tr
    }

    fn default_height(&mut self) -> f32 {
        match self.config.default_block_height {
            Some(height) => height,
            None => self.measurer.default_block_height(),
        }
    }

    fn bucket(&self, pos: usize, pages: usize) -> usize {
        (pos / self.config.positions_per_page).max(1).min(pages)
    }

    /// Merge the pages an edit may have invalidated
    fn merge_for_edit(&mut self, tr: &mut Transaction, from: usize, head: usize) {
        let pages = tr.doc().child_count();
        if pages <= 1 {
            return;
        }
        if self.bucket(from, pages) != self.bucket(head, pages) || self.dirty.needs_full() {
            log::debug!("edit spans pages, merging all {} pages", pages);
            self.merge_pages(tr, 1);
            return;
        }
        // pages before the edited page's predecessor cannot change
        let edited = page_index(tr.doc(), from.min(head));
        if edited + 1 < pages {
            let keep = edited
                .min(self.dirty.first_dirty().unwrap_or(edited))
                .max(1);
            log::debug!("edit on page {}, merging down to {} pages", edited + 1, keep);
            self.merge_pages(tr, keep);
        }
    }

    /// Join trailing pages into their predecessors until `count` remain
    pub fn merge_pages(&mut self, tr: &mut Transaction, count: usize) {
        let count = count.max(1);
        while tr.doc().child_count() > count {
            let doc = tr.doc();
            let last = doc.child_count() - 1;
            let depth = merge_depth(&doc.content[last - 1], &doc.content[last]);
            let pos = doc.child_offset(last);
            if let Err(err) = tr.join(pos, depth) {
                log::warn!("merging page {} failed: {}", last + 1, err);
                break;
            }
        }
    }

    /// Split the last page until it no longer overflows
    pub fn split_loop(&mut self, tr: &mut Transaction) {
        let budget = self.config.layout.content_height();
        let default_height = self.default_height();
        let options = StrategyOptions {
            eager_paragraph_split: self.config.eager_paragraph_split,
            fixed_block_chrome: self.config.fixed_block_chrome,
        };

        for _ in 0..self.config.max_splits_per_pass {
            let boundary = {
                let mut cx = SplitContext::new(tr.doc(), budget, default_height);
                find_boundary(self.measurer, &mut cx, options)
            };
            let Some(boundary) = boundary else {
                return;
            };
            if let Err(err) = self.split_at(tr, boundary) {
                log::warn!("split at {} failed: {}", boundary.pos, err);
                return;
            }
        }
        log::warn!(
            "split loop stopped after {} splits",
            self.config.max_splits_per_pass
        );
    }

    fn split_at(&mut self, tr: &mut Transaction, boundary: SplitBoundary) -> Result<(), TreeError> {
        let shells = {
            let doc = tr.doc();
            let chain = AncestorChain::resolve(doc, boundary.pos)?;
            if boundary.depth == 0 || boundary.depth > chain.depth() {
                return Err(TreeError::InvalidDepth {
                    pos: boundary.pos,
                    depth: boundary.depth,
                });
            }
            let base = chain.depth() - boundary.depth;
            let mut shells = Vec::with_capacity(boundary.depth);
            for depth in base + 1..=chain.depth() {
                shells.push(self.shell_for(&chain, depth));
            }
            shells
        };
        tr.split(boundary.pos, &shells)
    }

    /// Node receiving the content after the cut at `depth`
    fn shell_for(&mut self, chain: &AncestorChain<'_>, depth: usize) -> SplitShell {
        let node = chain.node(depth);
        let mut attrs = node.attrs.clone();
        attrs.id = Some(self.ids.next_id());

        if node.kind == NodeKind::Page {
            let number = node
                .attrs
                .page_number
                .unwrap_or(chain.index(0) as u32 + 1);
            attrs.page_number = Some(number + 1);
            return SplitShell::new(NodeKind::Page, attrs);
        }

        attrs.extend = true;
        if node.kind == NodeKind::OrderedList {
            attrs.start = Some(continuation_start(chain, depth));
        }
        let kind = node.kind.extend_counterpart().unwrap_or(node.kind);
        SplitShell::new(kind, attrs)
    }

    /// Resolve missing and duplicate ids
    fn dedup(&mut self, tr: &mut Transaction) {
        let ops = dedup_ops(tr.doc());
        if ops.is_empty() {
            return;
        }
        log::debug!("resolving {} id conflicts", ops.len());
        let start = tr.mapping().len();
        for op in ops {
            let pos = tr.mapping().map_from(start, op.pos());
            let result = match op {
                DedupOp::Assign(_) => {
                    let id = self.ids.next_id();
                    tr.set_attrs(pos, |attrs| attrs.id = Some(id))
                }
                DedupOp::Delete { .. } => tr.delete_node(pos),
            };
            if let Err(err) = result {
                log::warn!("id cleanup at {} failed: {}", pos, err);
            }
        }
    }

    /// Join malformed continuation pairs: an `extend` textblock of another
    /// kind directly after an `extend` textblock. Anything else is left alone.
    fn repair(&mut self, tr: &mut Transaction) {
        let mut joins = Vec::new();
        tr.doc().descendants(|node, pos, parent, index| {
            if node.kind.is_textblock() && node.attrs.extend && index > 0 {
                let prev = &parent.content[index - 1];
                if prev.kind.is_textblock() && prev.attrs.extend {
                    if node.kind != NodeKind::Paragraph {
                        joins.push(pos);
                    } else {
                        log::warn!(
                            "consecutive continuation paragraphs at {}, left in place",
                            pos
                        );
                    }
                }
            }
            !node.kind.is_textblock()
        });

        let start = tr.mapping().len();
        for pos in joins {
            let pos = tr.mapping().map_from(start, pos);
            match tr.join(pos, 1) {
                Ok(()) => log::debug!("repaired split paragraph at {}", pos),
                Err(err) => log::warn!("repair at {} failed: {}", pos, err),
            }
        }
    }

    fn recover_empty_first_page(&mut self, tr: &mut Transaction, prev_doc: &Node) {
        let was_filled = prev_doc
            .first_child()
            .map_or(false, |page| !page.content.is_empty());
        let now_empty = tr
            .doc()
            .first_child()
            .map_or(false, |page| page.kind == NodeKind::Page && page.content.is_empty());
        if was_filled && now_empty {
            let paragraph = Node::element(
                NodeKind::Paragraph,
                Attrs::with_id(self.ids.next_id()),
                Vec::new(),
            );
            if let Err(err) = tr.insert(1, paragraph) {
                log::warn!("could not refill the first page: {}", err);
            }
        }
    }

    fn remove_trailing_empty_pages(&mut self, tr: &mut Transaction) {
        loop {
            let doc = tr.doc();
            let count = doc.child_count();
            if count <= 1 || !doc.content[count - 1].content.is_empty() {
                return;
            }
            let pos = doc.child_offset(count - 1);
            if let Err(err) = tr.delete_node(pos) {
                log::warn!("removing empty page failed: {}", err);
                return;
            }
        }
    }

    /// Number pages `1..N`, touching only pages whose number is off
    fn renumber(&mut self, tr: &mut Transaction) {
        let mut updates = Vec::new();
        let mut pos = 0;
        for (index, page) in tr.doc().content.iter().enumerate() {
            let number = index as u32 + 1;
            if page.kind == NodeKind::Page && page.attrs.page_number != Some(number) {
                updates.push((pos, number));
            }
            pos += page.node_size();
        }
        for (pos, number) in updates {
            if let Err(err) = tr.set_attrs(pos, |attrs| attrs.page_number = Some(number)) {
                log::warn!("renumbering page {} failed: {}", number, err);
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Kept {
    pos: usize,
    size: usize,
}

/// Plan the id fixes for a document, sorted by position
fn dedup_ops(doc: &Node) -> Vec<DedupOp> {
    let mut seen: FxHashMap<NodeId, Kept> = FxHashMap::default();
    let mut ops = Vec::new();

    doc.descendants(|node, pos, _, _| {
        if !node.kind.carries_id() {
            return false;
        }
        let Some(id) = node.id() else {
            ops.push(DedupOp::Assign(pos));
            return true;
        };
        let size = node.node_size();
        let Some(kept) = seen.get(id).copied() else {
            seen.insert(id.clone(), Kept { pos, size });
            return true;
        };

        if size > kept.size {
            // the copy seen first is the smaller one
            match doc.node_at(kept.pos) {
                Some(old) => resolve_inferior(old, kept.pos, node, &mut ops),
                None => ops.push(DedupOp::Assign(kept.pos)),
            }
            let end = kept.pos + kept.size;
            seen.retain(|_, other| other.pos < kept.pos || other.pos >= end);
            seen.insert(id.clone(), Kept { pos, size });
            true
        } else {
            if let Some(preserved) = doc.node_at(kept.pos) {
                resolve_inferior(node, pos, preserved, &mut ops);
            } else {
                assign_subtree(node, pos, &mut ops);
            }
            false
        }
    });

    let deleted: Vec<(usize, usize)> = ops
        .iter()
        .filter_map(|op| match *op {
            DedupOp::Delete { from, to } => Some((from, to)),
            DedupOp::Assign(_) => None,
        })
        .collect();
    ops.retain(|op| {
        let pos = op.pos();
        !deleted.iter().any(|&(from, to)| match *op {
            DedupOp::Delete { from: own, .. } if own == from => false,
            _ => pos >= from && pos < to,
        })
    });
    ops.sort_by_key(DedupOp::pos);
    ops.dedup();
    ops
}

/// Drop a stale continuation copy whose text the preserved node already
/// holds; give anything else fresh ids
fn resolve_inferior(inferior: &Node, pos: usize, preserved: &Node, ops: &mut Vec<DedupOp>) {
    let redundant = inferior.attrs.extend
        && !inferior.content.is_empty()
        && preserved.text_content().contains(&inferior.text_content());
    if redundant {
        ops.push(DedupOp::Delete {
            from: pos,
            to: pos + inferior.node_size(),
        });
    } else {
        assign_subtree(inferior, pos, ops);
    }
}

fn assign_subtree(node: &Node, pos: usize, ops: &mut Vec<DedupOp>) {
    if node.kind.carries_id() {
        ops.push(DedupOp::Assign(pos));
    }
    node.descendants(|child, offset, _, _| {
        if child.kind.carries_id() {
            ops.push(DedupOp::Assign(pos + 1 + offset));
        }
        true
    });
}
