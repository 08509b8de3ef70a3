//! Ordered-list continuation numbering
//!
//! A list's `start` is the number shown by its first numbered item. Items
//! marked `extend` are the tails of items cut on an earlier page and show no
//! number of their own.

use crate::document::{AncestorChain, Node, NodeKind};

/// Items that open a number of their own
fn numbered_items(items: &[Node]) -> u32 {
    items
        .iter()
        .filter(|item| is_numbered(item))
        .count() as u32
}

fn is_numbered(item: &Node) -> bool {
    item.kind == NodeKind::ListItem && !item.attrs.extend
}

/// Whether the cut at `chain` falls inside the child of the node at `depth`
/// rather than before it
fn cuts_into_child(chain: &AncestorChain<'_>, depth: usize) -> bool {
    depth < chain.depth() && chain.pos() > chain.start(depth + 1) + (chain.depth() - depth - 1)
}

/// Number shown by the first numbered item of the list created when the
/// ordered list at `depth` of `chain` is split.
///
/// Counts the numbered items left in front of the cut. An item cut in two
/// keeps its number on the earlier page and continues unnumbered on the next.
pub fn continuation_start(chain: &AncestorChain<'_>, depth: usize) -> u32 {
    let list = chain.node(depth);
    let index = chain.index(depth).min(list.child_count());
    let mut kept = numbered_items(&list.content[..index]);
    if cuts_into_child(chain, depth) && list.content.get(index).map_or(false, is_numbered) {
        kept += 1;
    }
    list.attrs.start.unwrap_or(1) + kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Attrs;

    fn items(prefix: &str, n: usize) -> Vec<Node> {
        (0..n)
            .map(|i| {
                Node::list_item(
                    format!("{}-li{}", prefix, i),
                    vec![Node::paragraph(format!("{}-p{}", prefix, i), "item")],
                )
            })
            .collect()
    }

    fn position_of_item(doc: &Node, page: usize, item: usize) -> usize {
        let page_start = doc.child_offset(page) + 1;
        let list = &doc.content[page].content[0];
        page_start + 1 + list.child_offset(item)
    }

    fn continuation(start: u32, mut items: Vec<Node>) -> Node {
        items[0].attrs.extend = true;
        Node::element(
            NodeKind::OrderedList,
            Attrs {
                extend: true,
                start: Some(start),
                ..Attrs::with_id("ol-2")
            },
            items,
        )
    }

    #[test]
    fn test_fresh_list_counts_items_before_split() {
        let doc = Node::doc(vec![Node::page(
            "pg",
            1,
            vec![Node::ordered_list("ol", None, items("a", 15))],
        )]);
        let pos = position_of_item(&doc, 0, 10);
        let chain = AncestorChain::resolve(&doc, pos).unwrap();
        assert_eq!(continuation_start(&chain, 2), 11);
    }

    #[test]
    fn test_configured_start_is_kept() {
        let doc = Node::doc(vec![Node::page(
            "pg",
            1,
            vec![Node::ordered_list("ol", Some(5), items("a", 4))],
        )]);
        let pos = position_of_item(&doc, 0, 2);
        let chain = AncestorChain::resolve(&doc, pos).unwrap();
        assert_eq!(continuation_start(&chain, 2), 7);
    }

    #[test]
    fn test_item_cut_in_two_keeps_its_number() {
        let doc = Node::doc(vec![Node::page(
            "pg",
            1,
            vec![Node::ordered_list("ol", None, items("a", 3))],
        )]);
        // inside the paragraph of the second item
        let pos = position_of_item(&doc, 0, 1) + 3;
        let chain = AncestorChain::resolve(&doc, pos).unwrap();
        assert_eq!(chain.depth(), 4);
        assert_eq!(continuation_start(&chain, 2), 3);
    }

    #[test]
    fn test_cut_at_item_content_start_is_between_items() {
        let doc = Node::doc(vec![Node::page(
            "pg",
            1,
            vec![Node::ordered_list("ol", None, items("a", 3))],
        )]);
        let pos = position_of_item(&doc, 0, 1) + 2;
        let chain = AncestorChain::resolve(&doc, pos).unwrap();
        assert_eq!(continuation_start(&chain, 2), 2);
    }

    #[test]
    fn test_continuation_list_builds_on_its_start() {
        // page one shows 1-4; the tail of item 4 opens page two, then 5, 6, ...
        let doc = Node::doc(vec![
            Node::page("p1", 1, vec![Node::ordered_list("ol", Some(1), items("a", 4))]),
            Node::page("p2", 2, vec![continuation(5, items("b", 6))]),
        ]);
        let pos = position_of_item(&doc, 1, 3);
        let chain = AncestorChain::resolve(&doc, pos).unwrap();
        assert_eq!(continuation_start(&chain, 2), 7);
    }

    #[test]
    fn test_cutting_a_tail_again_adds_no_number() {
        let doc = Node::doc(vec![
            Node::page("p1", 1, vec![Node::ordered_list("ol", Some(1), items("a", 2))]),
            Node::page("p2", 2, vec![continuation(3, items("b", 2))]),
        ]);
        let pos = position_of_item(&doc, 1, 0) + 3;
        let chain = AncestorChain::resolve(&doc, pos).unwrap();
        assert_eq!(continuation_start(&chain, 2), 3);
    }
}
