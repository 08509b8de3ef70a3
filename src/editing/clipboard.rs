//! Paste and copy transforms

use crate::document::{IdGenerator, Node, NodeKind};

/// Give every incoming node a fresh id before it enters the tree
pub fn transform_pasted(mut nodes: Vec<Node>, ids: &mut dyn IdGenerator) -> Vec<Node> {
    for node in &mut nodes {
        regenerate_ids(node, ids);
    }
    nodes
}

/// Overwrite the id of `node` and all its descendants
pub fn regenerate_ids(node: &mut Node, ids: &mut dyn IdGenerator) {
    if node.kind.carries_id() {
        node.attrs.id = Some(ids.next_id());
    }
    for child in &mut node.content {
        regenerate_ids(child, ids);
    }
}

/// Strip page wrappers from a copied range so only page content reaches the clipboard
pub fn transform_copied(nodes: Vec<Node>) -> Vec<Node> {
    if nodes.first().map(|n| n.kind) != Some(NodeKind::Page) {
        return nodes;
    }
    nodes
        .into_iter()
        .flat_map(|node| {
            if node.kind == NodeKind::Page {
                node.content
            } else {
                vec![node]
            }
        })
        .collect()
}
