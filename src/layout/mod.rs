//! Page layout: configuration, height strategies and the pagination pass

mod break_search;
mod config;
mod dirty;
pub mod font;
mod line_break;
mod numbering;
mod orchestrator;
mod split_context;
mod strategy;

pub use break_search::{find_break, MIN_GRAPHEMES_FOR_HARD_CUT};
pub use config::{
    PageLayout, PageNumberAlignment, PageNumberConfig, PageNumberPosition, PaginationConfig,
};
pub use dirty::{DirtyPageTracker, DEFAULT_POSITIONS_PER_PAGE};
pub use font::FontMetrics;
pub use line_break::{LineBreaker, LineSpan};
pub use numbering::continuation_start;
pub use orchestrator::{merge_depth, page_index, PageComputation};
pub use split_context::{SplitBoundary, SplitContext};
pub use strategy::{find_boundary, StrategyOptions, Walk};
