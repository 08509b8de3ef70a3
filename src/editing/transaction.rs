//! Structural edits on an owned document

use super::mapping::{Mapping, StepMap};
use crate::document::{append_normalized, split_content, AncestorChain, Attrs, Node, NodeKind};
use crate::error::TreeError;
use serde::Serialize;

/// Description of the node created for the trailing half of a split level
#[derive(Debug, Clone, PartialEq)]
pub struct SplitShell {
    pub kind: NodeKind,
    pub attrs: Attrs,
}

impl SplitShell {
    pub fn new(kind: NodeKind, attrs: Attrs) -> Self {
        Self { kind, attrs }
    }

    fn build(&self, content: Vec<Node>) -> Node {
        Node::element(self.kind, self.attrs.clone(), content)
    }
}

/// A recorded structural change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum Step {
    /// Zero-width replace closing and reopening `depth` levels at `pos`
    Split { pos: usize, depth: usize },
    /// Removal of the `depth` closing and opening token pairs around `pos`
    Join { pos: usize, depth: usize },
    Delete { from: usize, to: usize },
    Insert { pos: usize, size: usize },
    SetAttrs { pos: usize },
}

/// An owned document plus the steps applied to it
#[derive(Debug, Clone)]
pub struct Transaction {
    doc: Node,
    steps: Vec<Step>,
    mapping: Mapping,
}

impl Transaction {
    pub fn new(doc: Node) -> Self {
        Self {
            doc,
            steps: Vec::new(),
            mapping: Mapping::new(),
        }
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn into_doc(self) -> Node {
        self.doc
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// True when no step was applied
    pub fn is_identity(&self) -> bool {
        self.steps.is_empty()
    }

    fn record(&mut self, step: Step, map: StepMap) {
        self.steps.push(step);
        self.mapping.push(map);
    }

    /// Split the `shells.len()` innermost ancestors of `pos`.
    ///
    /// `shells` is ordered outermost first and describes the node that receives
    /// the content after `pos` at each level.
    pub fn split(&mut self, pos: usize, shells: &[SplitShell]) -> Result<(), TreeError> {
        let depth = shells.len();
        let (path, top, parent_offset) = {
            let chain = AncestorChain::resolve(&self.doc, pos)?;
            if depth == 0 || depth > chain.depth() {
                return Err(TreeError::InvalidDepth { pos, depth });
            }
            (chain.index_path(), chain.depth(), chain.parent_offset())
        };
        let base = top - depth;

        let inner = self.doc.at_path(&path[..top]).ok_or(TreeError::NoNodeAt(pos))?;
        let (left, right) = split_content(&inner.content, parent_offset)?;
        let mut before = inner.copy_with(left);
        let mut after = shells[depth - 1].build(right);

        for d in (base + 1..top).rev() {
            let node = self.doc.at_path(&path[..d]).ok_or(TreeError::NoNodeAt(pos))?;
            let index = path[d];
            let mut left = node.content[..index].to_vec();
            left.push(before);
            let mut right = vec![after];
            right.extend_from_slice(&node.content[index + 1..]);
            before = node.copy_with(left);
            after = shells[d - base - 1].build(right);
        }

        let parent = self
            .doc
            .at_path_mut(&path[..base])
            .ok_or(TreeError::NoNodeAt(pos))?;
        let index = path[base];
        parent.content.splice(index..=index, [before, after]);

        self.record(Step::Split { pos, depth }, StepMap::new(pos, 0, 2 * depth));
        Ok(())
    }

    /// Join the two sibling nodes meeting at `pos`. With a depth above one the
    /// last child of the first node is joined with the first child of the
    /// second, recursively.
    pub fn join(&mut self, pos: usize, depth: usize) -> Result<(), TreeError> {
        let (path, index) = {
            let chain = AncestorChain::resolve(&self.doc, pos)?;
            let index = chain.index(chain.depth());
            if depth == 0 || chain.text_offset() > 0 || index == 0 {
                return Err(TreeError::NotJoinable(pos));
            }
            (chain.index_path(), index)
        };
        let parent = self
            .doc
            .at_path_mut(&path)
            .ok_or(TreeError::NoNodeAt(pos))?;
        let (a, b) = match (parent.content.get(index - 1), parent.content.get(index)) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(TreeError::NotJoinable(pos)),
        };
        let joined = join_nodes(a, b, depth).ok_or(TreeError::NotJoinable(pos))?;
        parent.content.splice(index - 1..=index, [joined]);

        self.record(
            Step::Join { pos, depth },
            StepMap::new(pos - depth, 2 * depth, 0),
        );
        Ok(())
    }

    /// Remove the node starting at `pos`
    pub fn delete_node(&mut self, pos: usize) -> Result<(), TreeError> {
        let (path, index) = {
            let chain = AncestorChain::resolve(&self.doc, pos)?;
            if chain.node_after().is_none() {
                return Err(TreeError::NoNodeAt(pos));
            }
            (chain.index_path(), chain.index(chain.depth()))
        };
        let parent = self
            .doc
            .at_path_mut(&path)
            .ok_or(TreeError::NoNodeAt(pos))?;
        let removed = parent.content.remove(index);
        let size = removed.node_size();

        self.record(
            Step::Delete {
                from: pos,
                to: pos + size,
            },
            StepMap::new(pos, size, 0),
        );
        Ok(())
    }

    /// Insert `node` at a position between two siblings
    pub fn insert(&mut self, pos: usize, node: Node) -> Result<(), TreeError> {
        let (path, index) = {
            let chain = AncestorChain::resolve(&self.doc, pos)?;
            if chain.text_offset() > 0 {
                return Err(TreeError::NoNodeAt(pos));
            }
            (chain.index_path(), chain.index(chain.depth()))
        };
        let size = node.node_size();
        let parent = self
            .doc
            .at_path_mut(&path)
            .ok_or(TreeError::NoNodeAt(pos))?;
        parent.content.insert(index, node);

        self.record(Step::Insert { pos, size }, StepMap::new(pos, 0, size));
        Ok(())
    }

    /// Update the attributes of the node starting at `pos`
    pub fn set_attrs(
        &mut self,
        pos: usize,
        update: impl FnOnce(&mut Attrs),
    ) -> Result<(), TreeError> {
        let (path, index) = {
            let chain = AncestorChain::resolve(&self.doc, pos)?;
            if chain.node_after().is_none() {
                return Err(TreeError::NoNodeAt(pos));
            }
            (chain.index_path(), chain.index(chain.depth()))
        };
        let parent = self
            .doc
            .at_path_mut(&path)
            .ok_or(TreeError::NoNodeAt(pos))?;
        let node = parent
            .content
            .get_mut(index)
            .ok_or(TreeError::NoNodeAt(pos))?;
        update(&mut node.attrs);

        self.record(Step::SetAttrs { pos }, StepMap::new(pos, 0, 0));
        Ok(())
    }
}

fn join_nodes(a: &Node, b: &Node, depth: usize) -> Option<Node> {
    if a.is_leaf() || b.is_leaf() {
        return None;
    }
    let mut content = Vec::with_capacity(a.content.len() + b.content.len());
    if depth > 1 {
        let (a_last, a_rest) = a.content.split_last()?;
        let (b_first, b_rest) = b.content.split_first()?;
        let inner = join_nodes(a_last, b_first, depth - 1)?;
        content.extend_from_slice(a_rest);
        content.push(inner);
        content.extend_from_slice(b_rest);
    } else {
        append_normalized(&mut content, a.content.iter().cloned());
        append_normalized(&mut content, b.content.iter().cloned());
    }
    Some(a.copy_with(content))
}
