//! Bookkeeping of pages touched by recent edits

use rustc_hash::FxHashSet;

/// Positions assumed to fit on one page when estimating page indices
pub const DEFAULT_POSITIONS_PER_PAGE: usize = 1000;

/// Pages whose measurements may be stale. Holds no tree references.
#[derive(Debug, Clone)]
pub struct DirtyPageTracker {
    pages: FxHashSet<usize>,
    full_recalc: bool,
    positions_per_page: usize,
}

impl Default for DirtyPageTracker {
    fn default() -> Self {
        Self::new(DEFAULT_POSITIONS_PER_PAGE)
    }
}

impl DirtyPageTracker {
    pub fn new(positions_per_page: usize) -> Self {
        Self {
            pages: FxHashSet::default(),
            full_recalc: false,
            positions_per_page: positions_per_page.max(1),
        }
    }

    /// Estimated page index of a position
    pub fn page_of(&self, pos: usize) -> usize {
        pos / self.positions_per_page
    }

    /// Mark the page of an edit and the two after it, clamped to the document
    pub fn mark_edit(&mut self, pos: usize, page_count: usize) {
        let last = page_count.saturating_sub(1);
        let page = self.page_of(pos).min(last);
        for index in page..=(page + 2).min(last) {
            self.pages.insert(index);
        }
    }

    pub fn mark_page(&mut self, index: usize) {
        self.pages.insert(index);
    }

    /// Request a recomputation of every page
    pub fn mark_full(&mut self) {
        self.full_recalc = true;
    }

    pub fn needs_full(&self) -> bool {
        self.full_recalc
    }

    pub fn is_dirty(&self, index: usize) -> bool {
        self.full_recalc || self.pages.contains(&index)
    }

    /// Lowest dirty page, if any
    pub fn first_dirty(&self) -> Option<usize> {
        if self.full_recalc {
            Some(0)
        } else {
            self.pages.iter().copied().min()
        }
    }

    pub fn is_clean(&self) -> bool {
        !self.full_recalc && self.pages.is_empty()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
        self.full_recalc = false;
    }
}
