//! Position resolution into an ancestor chain

use super::node::Node;
use crate::error::TreeError;
use smallvec::SmallVec;

/// One level of a resolved position
#[derive(Debug, Clone, Copy)]
pub struct Ancestor<'a> {
    pub node: &'a Node,
    /// Index of the child the position falls in (or before)
    pub index: usize,
    /// Position where this node's content starts
    pub start: usize,
}

/// The ancestors of a document position, root first.
///
/// Depth 0 is the document itself; `depth()` is the depth of the innermost
/// node whose content contains the position.
#[derive(Debug, Clone)]
pub struct AncestorChain<'a> {
    pos: usize,
    path: SmallVec<[Ancestor<'a>; 8]>,
    /// Offset into a text node when the position falls inside one
    text_offset: usize,
}

impl<'a> AncestorChain<'a> {
    pub fn resolve(doc: &'a Node, pos: usize) -> Result<Self, TreeError> {
        let size = doc.content_size();
        if pos > size {
            return Err(TreeError::OutOfRange { pos, size });
        }

        let mut path = SmallVec::new();
        let mut node = doc;
        let mut start = 0;
        let mut parent_offset = pos;
        let text_offset = loop {
            let (index, offset) = node.find_index(parent_offset)?;
            let rem = parent_offset - offset;
            path.push(Ancestor { node, index, start });
            if rem == 0 {
                break 0;
            }
            let child = &node.content[index];
            if child.is_leaf() {
                break rem;
            }
            node = child;
            parent_offset = rem - 1;
            start += offset + 1;
        };

        Ok(Self {
            pos,
            path,
            text_offset,
        })
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    pub fn node(&self, depth: usize) -> &'a Node {
        self.path[depth].node
    }

    pub fn parent(&self) -> &'a Node {
        self.node(self.depth())
    }

    pub fn index(&self, depth: usize) -> usize {
        self.path[depth].index
    }

    /// Position where the content of the node at `depth` starts
    pub fn start(&self, depth: usize) -> usize {
        self.path[depth].start
    }

    /// Position directly before the node at `depth`; the root has none
    pub fn before(&self, depth: usize) -> Option<usize> {
        if depth == 0 {
            None
        } else {
            Some(self.path[depth].start - 1)
        }
    }

    /// Offset of the position within its parent's content
    pub fn parent_offset(&self) -> usize {
        self.pos - self.start(self.depth())
    }

    pub fn text_offset(&self) -> usize {
        self.text_offset
    }

    /// Node that starts exactly at this position
    pub fn node_after(&self) -> Option<&'a Node> {
        if self.text_offset > 0 {
            return None;
        }
        self.parent().content.get(self.index(self.depth()))
    }

    /// `(before, node)` pairs from the outermost non-root ancestor down to the parent
    pub fn ancestors(&self) -> impl Iterator<Item = (usize, &'a Node)> + '_ {
        (1..self.path.len()).map(move |d| (self.path[d].start - 1, self.path[d].node))
    }

    /// Child indices leading from the root to the parent
    pub fn index_path(&self) -> SmallVec<[usize; 8]> {
        (0..self.depth()).map(|d| self.index(d)).collect()
    }

    /// Deepest ancestor matching `pred`, as `(depth, node)`
    pub fn closest(&self, pred: impl Fn(&Node) -> bool) -> Option<(usize, &'a Node)> {
        (1..=self.depth())
            .rev()
            .map(|d| (d, self.node(d)))
            .find(|(_, node)| pred(node))
    }
}
