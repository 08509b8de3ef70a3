//! Page-shell descriptors for header and footer chrome

use crate::document::{pages, Node, NodeId};
use crate::layout::PageNumberConfig;
use serde::{Deserialize, Serialize};

/// What a page's chrome needs to know about the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageShell {
    pub id: Option<NodeId>,
    pub page_number: u32,
    pub total_pages: u32,
}

impl PageShell {
    /// Page number label, or `None` where the configuration hides it
    pub fn label(&self, config: &PageNumberConfig) -> Option<String> {
        if !config.show || (self.page_number == 1 && !config.show_on_first_page) {
            return None;
        }
        Some(if config.show_count {
            format!("{} of {}", self.page_number, self.total_pages)
        } else {
            self.page_number.to_string()
        })
    }
}

/// One shell per page, numbered by position when a page carries no number
pub fn page_shells(doc: &Node) -> Vec<PageShell> {
    let total = pages(doc).count() as u32;
    pages(doc)
        .enumerate()
        .map(|(index, page)| PageShell {
            id: page.id().cloned(),
            page_number: page.attrs.page_number.unwrap_or(index as u32 + 1),
            total_pages: total,
        })
        .collect()
}
