//! Edit metadata handed to the engine by the host

use crate::document::Node;
use serde::{Deserialize, Serialize};

/// Flags the host attaches to an edit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditMeta {
    /// The page holding the selection overflowed
    pub inserting: bool,
    /// The edit removed content
    pub deleting: bool,
    /// Full pagination requested, e.g. when a document is first loaded
    pub split_requested: bool,
}

impl EditMeta {
    pub fn initial() -> Self {
        Self {
            split_requested: true,
            ..Self::default()
        }
    }

    pub fn inserting() -> Self {
        Self {
            inserting: true,
            ..Self::default()
        }
    }

    pub fn deleting() -> Self {
        Self {
            deleting: true,
            ..Self::default()
        }
    }

    /// Coalesce flags of edits that were debounced into one pass
    pub fn merge(self, other: EditMeta) -> EditMeta {
        EditMeta {
            inserting: self.inserting || other.inserting,
            deleting: self.deleting || other.deleting,
            split_requested: self.split_requested || other.split_requested,
        }
    }
}

/// Selection anchor and head as document positions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub from: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(from: usize, head: usize) -> Self {
        Self { from, head }
    }

    pub fn cursor(pos: usize) -> Self {
        Self::new(pos, pos)
    }
}

/// Everything a pagination pass reads from the host
#[derive(Debug, Clone, Copy)]
pub struct EditContext<'a> {
    pub doc: &'a Node,
    pub prev_doc: &'a Node,
    pub selection: Selection,
    pub meta: EditMeta,
}

impl<'a> EditContext<'a> {
    pub fn new(doc: &'a Node, prev_doc: &'a Node, selection: Selection, meta: EditMeta) -> Self {
        Self {
            doc,
            prev_doc,
            selection,
            meta,
        }
    }

    /// Context for paginating a freshly loaded document
    pub fn initial(doc: &'a Node) -> Self {
        Self::new(doc, doc, Selection::cursor(0), EditMeta::initial())
    }
}
