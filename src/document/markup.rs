//! HTML serialization of node subtrees for the measurement surface

use super::node::{Mark, Node, NodeKind};
use quick_xml::escape::escape;
use std::fmt::Write;

/// Class on the placeholder break that gives an empty textblock one line of height
pub const TRAILING_BREAK_CLASS: &str = "trailing-break";

/// Render a subtree to the markup handed to the measurement oracle
pub fn to_markup(node: &Node) -> String {
    let mut out = String::with_capacity(64);
    write_node(&mut out, node);
    out
}

fn write_node(out: &mut String, node: &Node) {
    match node.kind {
        NodeKind::Doc => write_children(out, node),
        NodeKind::Text => write_text(out, node),
        NodeKind::HardBreak => out.push_str("<br/>"),
        kind => {
            let (tag, data_type) = tag_for(node);
            open_tag(out, tag, data_type, node);
            if kind.is_textblock() && node.content.is_empty() {
                let _ = write!(out, "<br class=\"{}\"/>", TRAILING_BREAK_CLASS);
            } else {
                write_children(out, node);
            }
            let _ = write!(out, "</{}>", tag);
        }
    }
}

fn tag_for(node: &Node) -> (&'static str, Option<&'static str>) {
    match node.kind {
        NodeKind::Page => ("div", Some("page")),
        NodeKind::Heading => (
            match node.attrs.level.unwrap_or(1) {
                0 | 1 => "h1",
                2 => "h2",
                3 => "h3",
                4 => "h4",
                5 => "h5",
                _ => "h6",
            },
            None,
        ),
        NodeKind::Paragraph => ("p", None),
        NodeKind::BulletList => ("ul", None),
        NodeKind::OrderedList => ("ol", None),
        NodeKind::ListItem => ("li", None),
        NodeKind::TransientText => ("div", Some("transient-text")),
        NodeKind::FixedBlock => ("div", Some("fixed-block")),
        NodeKind::FixedBlockExtend => ("div", Some("fixed-block-extend")),
        NodeKind::Doc | NodeKind::Text | NodeKind::HardBreak => ("div", None),
    }
}

fn open_tag(out: &mut String, tag: &str, data_type: Option<&str>, node: &Node) {
    out.push('<');
    out.push_str(tag);
    if let Some(data_type) = data_type {
        let _ = write!(out, " data-type=\"{}\"", data_type);
    }
    if let Some(id) = node.id() {
        out.push_str(" data-id=\"");
        out.push_str(&escape(id.as_str()));
        out.push('"');
    }
    if node.attrs.extend {
        out.push_str(" data-extend=\"true\"");
    }
    if let Some(number) = node.attrs.page_number {
        let _ = write!(out, " data-page-number=\"{}\"", number);
    }
    if node.kind == NodeKind::OrderedList {
        if let Some(start) = node.attrs.start {
            let _ = write!(out, " start=\"{}\"", start);
        }
    }
    out.push('>');
}

fn write_children(out: &mut String, node: &Node) {
    for child in &node.content {
        write_node(out, child);
    }
}

fn mark_tag(mark: Mark) -> &'static str {
    match mark {
        Mark::Bold => "strong",
        Mark::Italic => "em",
        Mark::Underline => "u",
        Mark::Strike => "s",
        Mark::Code => "code",
    }
}

fn write_text(out: &mut String, node: &Node) {
    for mark in &node.marks {
        let _ = write!(out, "<{}>", mark_tag(*mark));
    }
    out.push_str(&escape(node.text_str()));
    for mark in node.marks.iter().rev() {
        let _ = write!(out, "</{}>", mark_tag(*mark));
    }
}
