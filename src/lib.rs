//! page-flow: automatic pagination for page-structured rich-text documents
//!
//! The engine keeps a document split into fixed-height pages while it is
//! being edited:
//! - Content overflowing the last page is moved onto new pages, cutting
//!   paragraphs at line-break opportunities and lists between items
//! - Pages emptied by deletions are merged back
//! - Continuation fragments carry an `extend` flag so they rejoin cleanly
//! - Every height query goes through one cached [`MeasurementOracle`]

pub mod document;
pub mod editing;
pub mod error;
pub mod layout;
pub mod measure;
pub mod render;
pub mod schedule;
pub mod wasm;

pub use wasm::WasmPaginator;

pub use document::{Attrs, IdGenerator, Node, NodeId, NodeKind, SequentialIds, UuidIds};
pub use editing::{EditContext, EditMeta, Selection, Transaction};
pub use error::{PageError, TreeError};
pub use layout::{PageLayout, PageNumberConfig, PaginationConfig};
pub use measure::{CacheStats, Dimensions, HeadlessOracle, MeasurementOracle, RenderedBox};
pub use render::{page_shells, PageShell};
pub use schedule::{FrameScheduler, ScheduleToken};

use layout::{page_index, DirtyPageTracker, PageComputation, SplitContext};
use measure::{MeasurementCache, Measurer};
use web_time::{Duration, Instant};

/// Per-editor pagination state: the oracle and its caches, the dirty-page
/// tracker, the frame scheduler, the composition flag and the id source
pub struct PaginationEngine<O> {
    config: PaginationConfig,
    measurer: Measurer<O>,
    ids: Box<dyn IdGenerator>,
    dirty: DirtyPageTracker,
    scheduler: FrameScheduler<EditMeta>,
    composing: bool,
    surface_ready: bool,
    last_pass: Option<Duration>,
}

impl<O: MeasurementOracle> PaginationEngine<O> {
    /// Create an engine with random UUID node ids
    pub fn new(config: PaginationConfig, oracle: O) -> Result<Self, PageError> {
        config.validate()?;
        Ok(Self {
            measurer: Measurer::new(oracle, config.cache_capacity),
            dirty: DirtyPageTracker::new(config.positions_per_page),
            config,
            ids: Box::new(UuidIds),
            scheduler: FrameScheduler::new(),
            composing: false,
            surface_ready: false,
            last_pass: None,
        })
    }

    /// Replace the id source
    pub fn with_ids(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    pub fn oracle(&self) -> &O {
        self.measurer.oracle()
    }

    pub fn oracle_mut(&mut self) -> &mut O {
        self.measurer.oracle_mut()
    }

    pub fn cache(&self) -> &MeasurementCache {
        self.measurer.cache()
    }

    /// Markup, dimension and element table statistics, in that order
    pub fn cache_stats(&self) -> [CacheStats; 3] {
        let cache = self.measurer.cache();
        [
            cache.markup_stats(),
            cache.dimension_stats(),
            cache.element_stats(),
        ]
    }

    fn ensure_surface(&mut self) {
        if !self.surface_ready {
            self.measurer.rebuild_surface(&self.config.layout);
            self.surface_ready = true;
        }
    }

    /// Run one pagination pass. The returned transaction is the identity when
    /// the document is already paginated.
    pub fn paginate(&mut self, ctx: &EditContext<'_>) -> Transaction {
        self.ensure_surface();
        let started = Instant::now();
        let tr = PageComputation::new(
            &mut self.measurer,
            &self.config,
            self.ids.as_mut(),
            &mut self.dirty,
        )
        .run(ctx);
        let elapsed = started.elapsed();
        self.last_pass = Some(elapsed);

        let [markup, dimensions, elements] = self.cache_stats();
        log::debug!(
            "pass took {:?}: {} steps, {} pages, hit rates markup {:.2} dimensions {:.2} elements {:.2}",
            elapsed,
            tr.steps().len(),
            tr.doc().child_count(),
            markup.hit_rate(),
            dimensions.hit_rate(),
            elements.hit_rate()
        );
        tr
    }

    /// Wall time of the most recent pass
    pub fn last_pass_duration(&self) -> Option<Duration> {
        self.last_pass
    }

    /// Paginate a freshly loaded document
    pub fn paginate_initial(&mut self, doc: &Node) -> Transaction {
        self.paginate(&EditContext::initial(doc))
    }

    /// Inspect an applied edit and schedule a pass for the next frame when
    /// the edit overflowed its page or removed content
    pub fn view_updated(
        &mut self,
        doc: &Node,
        prev_doc: &Node,
        selection: Selection,
    ) -> Option<ScheduleToken> {
        if self.composing || doc == prev_doc {
            return None;
        }
        self.ensure_surface();

        let index = page_index(doc, selection.head);
        let inserting = match doc.content.get(index) {
            Some(page) => {
                let height = self.measurer.measure(page).height;
                let cx = SplitContext::new(
                    doc,
                    self.config.layout.content_height(),
                    self.default_block_height(),
                );
                cx.is_overflow_test(height)
            }
            None => false,
        };
        let deleting = doc.content_size() < prev_doc.content_size();

        self.dirty
            .mark_edit(selection.from.min(selection.head), doc.child_count());
        if !inserting && !deleting {
            return None;
        }

        let meta = EditMeta {
            inserting,
            deleting,
            split_requested: false,
        };
        // a pass superseded before its frame still owes its flags
        let meta = match self.scheduler.tick() {
            Some(pending) => pending.merge(meta),
            None => meta,
        };
        log::debug!("scheduling pass {:?}", meta);
        Some(self.scheduler.schedule(meta))
    }

    /// Frame callback: the edit metadata of the pass to dispatch, if any
    pub fn on_frame(&mut self) -> Option<EditMeta> {
        self.scheduler.tick()
    }

    pub fn cancel(&mut self, token: ScheduleToken) -> bool {
        self.scheduler.cancel(token)
    }

    /// IME composition started: edits are not paginated until it ends
    pub fn composition_start(&mut self) {
        self.composing = true;
        self.scheduler.clear();
    }

    pub fn composition_end(&mut self) {
        self.composing = false;
    }

    pub fn is_composing(&self) -> bool {
        self.composing
    }

    /// Switch to a new page geometry. Every page is recomputed on the next pass.
    pub fn set_page_layout(&mut self, layout: PageLayout) -> Result<(), PageError> {
        layout.validate()?;
        self.config.layout = layout;
        self.measurer.rebuild_surface(&layout);
        self.surface_ready = true;
        self.dirty.mark_full();
        log::debug!("page layout changed, full recompute pending");
        Ok(())
    }

    fn default_block_height(&mut self) -> f32 {
        match self.config.default_block_height {
            Some(height) => height,
            None => self.measurer.default_block_height(),
        }
    }

    /// Regenerate ids of pasted content
    pub fn transform_pasted(&mut self, nodes: Vec<Node>) -> Vec<Node> {
        editing::transform_pasted(nodes, self.ids.as_mut())
    }

    /// Strip page wrappers from copied content
    pub fn transform_copied(&self, nodes: Vec<Node>) -> Vec<Node> {
        editing::transform_copied(nodes)
    }

    pub fn page_shells(&self, doc: &Node) -> Vec<PageShell> {
        page_shells(doc)
    }

    /// Release the measurement surface and drop all cached state
    pub fn destroy(&mut self) {
        self.measurer.teardown();
        self.scheduler.clear();
        self.dirty.clear();
        self.surface_ready = false;
        self.composing = false;
    }
}
