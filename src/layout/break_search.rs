//! Sub-block break search
//!
//! Finds the longest prefix of a textblock that still fits the space left on
//! the page. Text runs are cut at line-break opportunities; a prefix longer
//! than [`MIN_GRAPHEMES_FOR_HARD_CUT`] graphemes with no opportunity in reach
//! may be cut between graphemes instead.

use super::split_context::SplitContext;
use crate::document::{text_prefix, Node};
use crate::measure::{MeasurementOracle, Measurer, RenderedBox};
use unicode_linebreak::linebreaks;
use unicode_segmentation::UnicodeSegmentation;

/// Shortest prefix, in graphemes, that may be cut inside a word
pub const MIN_GRAPHEMES_FOR_HARD_CUT: usize = 7;

/// Char offsets where a text may be cut, excluding both ends
fn word_breaks(text: &str) -> Vec<usize> {
    let len = text.len();
    let mut chars = 0;
    let mut last_byte = 0;
    linebreaks(text)
        .filter(|(byte, _)| *byte > 0 && *byte < len)
        .map(|(byte, _)| {
            chars += text[last_byte..byte].chars().count();
            last_byte = byte;
            chars
        })
        .collect()
}

/// Char offsets of grapheme boundaries, excluding the start
fn grapheme_breaks(text: &str) -> Vec<usize> {
    let mut chars = 0;
    text.graphemes(true)
        .map(|g| {
            chars += g.chars().count();
            chars
        })
        .collect()
}

/// Largest cut at or below `limit`
fn cut_below(text_breaks: &[usize], graphemes: &[usize], limit: usize) -> Option<usize> {
    let word = text_breaks.partition_point(|&b| b <= limit);
    if word > 0 {
        return Some(text_breaks[word - 1]);
    }
    let reachable = graphemes.partition_point(|&g| g <= limit);
    if reachable > MIN_GRAPHEMES_FOR_HARD_CUT {
        Some(graphemes[reachable - 1])
    } else {
        None
    }
}

/// Copy of `node` holding `content[..index]` plus the first `chars` of child `index`
fn prefix_node(node: &Node, index: usize, chars: usize) -> Node {
    let mut content = node.content[..index].to_vec();
    let child = &node.content[index];
    let mut cut = child.clone();
    cut.text = Some(text_prefix(child.text_str(), chars).to_string());
    content.push(cut);
    node.copy_with(content)
}

/// Search the break offset, relative to the start of `node`'s content.
///
/// Returns `None` when the node lays out on a single line, when nothing fits,
/// or when the only fitting cut would leave one side empty.
pub fn find_break<O: MeasurementOracle>(
    measurer: &mut Measurer<O>,
    cx: &SplitContext<'_>,
    node: &Node,
    bx: &RenderedBox,
    first_child: bool,
) -> Option<usize> {
    if bx.width >= measurer.measure(node).width {
        return None;
    }

    let mut limit = if cx.accumulated() == 0.0 {
        cx.budget()
    } else {
        cx.budget() - cx.accumulated()
    };
    limit -= bx.margin_bottom;
    if first_child {
        limit -= bx.margin_top;
    }
    if limit <= 0.0 {
        return None;
    }

    let total = node.content_size();
    let count = node.child_count();
    for index in (0..count).rev() {
        let child = &node.content[index];
        let before = node.child_offset(index);

        if child.is_text() {
            let text = child.text_str();
            let words = word_breaks(text);
            let graphemes = grapheme_breaks(text);
            let (mut lo, mut hi) = (1, text.chars().count());
            let mut best = None;
            while lo <= hi {
                let mid = lo + (hi - lo) / 2;
                let Some(cut) = cut_below(&words, &graphemes, mid) else {
                    break;
                };
                let candidate = prefix_node(node, index, cut);
                if measurer.measure(&candidate).height <= limit {
                    best = Some(cut);
                    lo = mid + 1;
                } else {
                    hi = mid - 1;
                }
            }
            if let Some(chars) = best {
                let offset = before + chars;
                if offset > 0 && offset < total {
                    log::trace!("break found at content offset {}", offset);
                    return Some(offset);
                }
            }
        } else if index + 1 < count {
            let candidate = node.copy_with(node.content[..=index].to_vec());
            if measurer.measure(&candidate).height <= limit {
                let offset = before + child.node_size();
                return (offset > 0 && offset < total).then_some(offset);
            }
        }
    }
    None
}
