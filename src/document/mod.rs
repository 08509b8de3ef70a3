//! Document model: node tree, positions and serialization

mod fragment;
mod ids;
mod markup;
mod node;
mod resolve;

pub use fragment::{append_normalized, split_content, split_text, text_prefix};
pub use ids::{IdGenerator, SequentialIds, UuidIds};
pub use markup::{to_markup, TRAILING_BREAK_CLASS};
pub use node::{Attrs, Mark, Node, NodeId, NodeKind};
pub use resolve::{Ancestor, AncestorChain};

use crate::error::PageError;

/// Parse a document from its JSON form
pub fn from_json(json: &str) -> Result<Node, PageError> {
    Ok(serde_json::from_str(json)?)
}

/// Serialize a document to JSON
pub fn to_json(doc: &Node) -> Result<String, PageError> {
    Ok(serde_json::to_string(doc)?)
}

/// Page nodes of a document, in order
pub fn pages(doc: &Node) -> impl Iterator<Item = &Node> {
    doc.content.iter().filter(|n| n.kind == NodeKind::Page)
}
