//! Document tree nodes
//!
//! Positions follow the flat token model: a text node occupies one position
//! per `char`, a hard break occupies one, and every other node occupies its
//! content plus an opening and a closing token.

use crate::error::TreeError;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Stable identifier used to locate a node's rendered element
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Node kinds known to the pagination engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Doc,
    Page,
    Heading,
    Paragraph,
    BulletList,
    OrderedList,
    ListItem,
    TransientText,
    FixedBlock,
    FixedBlockExtend,
    HardBreak,
    Text,
}

impl NodeKind {
    /// Text and hard breaks have no content tokens
    pub fn is_leaf(self) -> bool {
        matches!(self, NodeKind::Text | NodeKind::HardBreak)
    }

    /// Blocks holding inline content
    pub fn is_textblock(self) -> bool {
        matches!(
            self,
            NodeKind::Heading | NodeKind::Paragraph | NodeKind::TransientText
        )
    }

    pub fn is_list(self) -> bool {
        matches!(self, NodeKind::BulletList | NodeKind::OrderedList)
    }

    /// Kind used for the trailing fragment when a node of this kind is split
    pub fn extend_counterpart(self) -> Option<NodeKind> {
        match self {
            NodeKind::FixedBlock => Some(NodeKind::FixedBlockExtend),
            _ => None,
        }
    }

    /// Kinds that only ever exist as continuation fragments
    pub fn is_extension(self) -> bool {
        matches!(self, NodeKind::FixedBlockExtend)
    }

    /// Whether nodes of this kind carry an `id` attribute
    pub fn carries_id(self) -> bool {
        !matches!(self, NodeKind::Doc | NodeKind::Text | NodeKind::HardBreak)
    }
}

/// Inline formatting. Irrelevant to height except through rendered width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Node attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,
    /// Marks a continuation fragment produced by a page split
    #[serde(default, skip_serializing_if = "is_false")]
    pub extend: bool,
    /// First displayed number of an ordered list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
}

impl Attrs {
    pub fn with_id(id: impl Into<NodeId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Attrs::default()
    }
}

fn no_marks(marks: &SmallVec<[Mark; 2]>) -> bool {
    marks.is_empty()
}

/// A node of the document tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "no_marks")]
    pub marks: SmallVec<[Mark; 2]>,
}

impl Node {
    /// Create a non-text node
    pub fn element(kind: NodeKind, attrs: Attrs, content: Vec<Node>) -> Self {
        Self {
            kind,
            attrs,
            content,
            text: None,
            marks: SmallVec::new(),
        }
    }

    pub fn doc(pages: Vec<Node>) -> Self {
        Self::element(NodeKind::Doc, Attrs::default(), pages)
    }

    pub fn page(id: impl Into<NodeId>, page_number: u32, content: Vec<Node>) -> Self {
        let attrs = Attrs {
            page_number: Some(page_number),
            ..Attrs::with_id(id)
        };
        Self::element(NodeKind::Page, attrs, content)
    }

    /// Paragraph holding a single unmarked text run
    pub fn paragraph(id: impl Into<NodeId>, text: &str) -> Self {
        Self::element(NodeKind::Paragraph, Attrs::with_id(id), Self::inline_text(text))
    }

    pub fn heading(id: impl Into<NodeId>, level: u8, text: &str) -> Self {
        let attrs = Attrs {
            level: Some(level),
            ..Attrs::with_id(id)
        };
        Self::element(NodeKind::Heading, attrs, Self::inline_text(text))
    }

    pub fn bullet_list(id: impl Into<NodeId>, items: Vec<Node>) -> Self {
        Self::element(NodeKind::BulletList, Attrs::with_id(id), items)
    }

    pub fn ordered_list(id: impl Into<NodeId>, start: Option<u32>, items: Vec<Node>) -> Self {
        let attrs = Attrs {
            start,
            ..Attrs::with_id(id)
        };
        Self::element(NodeKind::OrderedList, attrs, items)
    }

    pub fn list_item(id: impl Into<NodeId>, blocks: Vec<Node>) -> Self {
        Self::element(NodeKind::ListItem, Attrs::with_id(id), blocks)
    }

    pub fn transient_text(id: impl Into<NodeId>, text: &str) -> Self {
        Self::element(
            NodeKind::TransientText,
            Attrs::with_id(id),
            Self::inline_text(text),
        )
    }

    pub fn fixed_block(id: impl Into<NodeId>, blocks: Vec<Node>) -> Self {
        Self::element(NodeKind::FixedBlock, Attrs::with_id(id), blocks)
    }

    pub fn hard_break() -> Self {
        Self::element(NodeKind::HardBreak, Attrs::default(), Vec::new())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::marked_text(text, SmallVec::new())
    }

    pub fn marked_text(text: impl Into<String>, marks: SmallVec<[Mark; 2]>) -> Self {
        Self {
            kind: NodeKind::Text,
            attrs: Attrs::default(),
            content: Vec::new(),
            text: Some(text.into()),
            marks,
        }
    }

    fn inline_text(text: &str) -> Vec<Node> {
        if text.is_empty() {
            Vec::new()
        } else {
            vec![Node::text(text)]
        }
    }

    /// Same kind, attributes and marks with new content
    pub fn copy_with(&self, content: Vec<Node>) -> Self {
        Self {
            kind: self.kind,
            attrs: self.attrs.clone(),
            content,
            text: None,
            marks: self.marks.clone(),
        }
    }

    pub fn id(&self) -> Option<&NodeId> {
        self.attrs.id.as_ref()
    }

    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    pub fn is_leaf(&self) -> bool {
        self.kind.is_leaf()
    }

    pub fn text_str(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Number of positions this node occupies in its parent
    pub fn node_size(&self) -> usize {
        match self.kind {
            NodeKind::Text => self.text_str().chars().count(),
            NodeKind::HardBreak => 1,
            _ => self.content_size() + 2,
        }
    }

    /// Number of positions between the opening and closing token
    pub fn content_size(&self) -> usize {
        self.content.iter().map(Node::node_size).sum()
    }

    pub fn child_count(&self) -> usize {
        self.content.len()
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.content.first()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.content.last()
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.content {
            child.collect_text(out);
        }
    }

    /// Locate the child covering `offset` within this node's content.
    ///
    /// Returns the child index and the offset at which that child starts. An
    /// offset that falls exactly between two children resolves to the later one.
    pub fn find_index(&self, offset: usize) -> Result<(usize, usize), TreeError> {
        if offset == 0 {
            return Ok((0, 0));
        }
        let mut cur = 0;
        for (i, child) in self.content.iter().enumerate() {
            let end = cur + child.node_size();
            if end >= offset {
                if end == offset {
                    return Ok((i + 1, end));
                }
                return Ok((i, cur));
            }
            cur = end;
        }
        Err(TreeError::OutOfRange {
            pos: offset,
            size: cur,
        })
    }

    /// Offset of child `index` within this node's content
    pub fn child_offset(&self, index: usize) -> usize {
        self.content[..index.min(self.content.len())]
            .iter()
            .map(Node::node_size)
            .sum()
    }

    /// Node starting exactly at `pos`, where `pos` is relative to this node's content
    pub fn node_at(&self, pos: usize) -> Option<&Node> {
        let mut node = self;
        let mut offset = pos;
        loop {
            let (index, start) = node.find_index(offset).ok()?;
            let child = node.content.get(index)?;
            if start == offset {
                return Some(child);
            }
            if child.is_leaf() {
                return None;
            }
            offset -= start + 1;
            node = child;
        }
    }

    /// Pre-order walk over all descendants.
    ///
    /// The callback receives the node, its position, its parent and its index in
    /// the parent; returning `false` skips the node's children.
    pub fn descendants<F>(&self, mut f: F)
    where
        F: FnMut(&Node, usize, &Node, usize) -> bool,
    {
        self.walk_children(0, &mut f);
    }

    fn walk_children<F>(&self, content_start: usize, f: &mut F)
    where
        F: FnMut(&Node, usize, &Node, usize) -> bool,
    {
        let mut pos = content_start;
        for (index, child) in self.content.iter().enumerate() {
            if f(child, pos, self, index) && !child.content.is_empty() {
                child.walk_children(pos + 1, f);
            }
            pos += child.node_size();
        }
    }

    /// Mutable access to the node reached by following child indices
    pub(crate) fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let mut node = self;
        for &index in path {
            node = node.content.get_mut(index)?;
        }
        Some(node)
    }

    pub(crate) fn at_path(&self, path: &[usize]) -> Option<&Node> {
        let mut node = self;
        for &index in path {
            node = node.content.get(index)?;
        }
        Some(node)
    }
}
