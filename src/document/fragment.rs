//! Operations on node sequences (the content of a node)

use super::node::Node;
use crate::error::TreeError;

/// Split a content sequence at `offset`, cutting a text node when the offset
/// falls inside one.
pub fn split_content(content: &[Node], offset: usize) -> Result<(Vec<Node>, Vec<Node>), TreeError> {
    let mut cur = 0;
    for (i, child) in content.iter().enumerate() {
        if cur == offset {
            return Ok((content[..i].to_vec(), content[i..].to_vec()));
        }
        let end = cur + child.node_size();
        if offset < end {
            if !child.is_text() {
                return Err(TreeError::NoNodeAt(offset));
            }
            let (head, tail) = split_text(child, offset - cur);
            let mut left = content[..i].to_vec();
            left.push(head);
            let mut right = vec![tail];
            right.extend_from_slice(&content[i + 1..]);
            return Ok((left, right));
        }
        cur = end;
    }
    if cur == offset {
        Ok((content.to_vec(), Vec::new()))
    } else {
        Err(TreeError::OutOfRange {
            pos: offset,
            size: cur,
        })
    }
}

/// Split a text node after `chars` characters
pub fn split_text(node: &Node, chars: usize) -> (Node, Node) {
    let text = node.text_str();
    let byte = text
        .char_indices()
        .nth(chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    (
        Node::marked_text(&text[..byte], node.marks.clone()),
        Node::marked_text(&text[byte..], node.marks.clone()),
    )
}

/// Text prefix of `chars` characters
pub fn text_prefix(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Append nodes, merging adjacent text runs that carry the same marks
pub fn append_normalized(into: &mut Vec<Node>, nodes: impl IntoIterator<Item = Node>) {
    for node in nodes {
        if node.is_text() && node.text_str().is_empty() {
            continue;
        }
        if let Some(last) = into.last_mut() {
            if last.is_text() && node.is_text() && last.marks == node.marks {
                let mut text = last.text.take().unwrap_or_default();
                text.push_str(node.text_str());
                last.text = Some(text);
                continue;
            }
        }
        into.push(node);
    }
}
