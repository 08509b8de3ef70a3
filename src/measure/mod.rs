//! Measurement: the oracle seam, box arithmetic and cached measuring
//!
//! All height and width queries funnel through one [`MeasurementOracle`],
//! called synchronously. [`Measurer`] puts the LRU tables in front of it.

mod cache;
mod headless;

pub use cache::{CacheStats, CountingLru, MeasurementCache, DEFAULT_CACHE_CAPACITY};
pub use headless::{BlockStyle, HeadlessOracle, StyleSheet};

use crate::document::{to_markup, Node, NodeId};
use crate::layout::PageLayout;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Size of a subtree rendered on its own
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Border-box height when laid out at the surface width
    pub height: f32,
    /// Width of the content laid out on a single line
    pub width: f32,
}

/// Box of a rendered element
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedBox {
    /// Border-box height: content, padding and border
    pub height: f32,
    /// Border-box width
    pub width: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub padding_top: f32,
    pub padding_bottom: f32,
    /// Combined top and bottom border
    pub border: f32,
    /// Height of the inner content area, for elements that have one
    #[serde(default)]
    pub content_height: Option<f32>,
}

impl RenderedBox {
    /// Height the element occupies in its container.
    ///
    /// The trailing margin collapses with the next sibling's leading margin.
    /// The element's own leading margin only counts for the first child of a
    /// container or for a list item.
    pub fn outer_height(&self, next_margin_top: f32, leading: bool) -> f32 {
        let trailing = self.margin_bottom.max(next_margin_top);
        let top = if leading { self.margin_top } else { 0.0 };
        self.height + top + trailing
    }

    /// Vertical padding, margin and border
    pub fn padding_and_margin(&self) -> f32 {
        self.padding_top + self.padding_bottom + self.margin_top + self.margin_bottom + self.border
    }

    /// Everything in the box except the inner content area
    pub fn content_spacing(&self) -> f32 {
        match self.content_height {
            Some(content) => (self.height - content).max(0.0),
            None => 0.0,
        }
    }
}

/// Off-screen rendering surface that reports pixel dimensions
pub trait MeasurementOracle {
    /// Render markup on the surface and measure its first element
    fn render_and_measure(&mut self, markup: &str) -> Dimensions;

    /// Render markup and return the box of the element carrying `id`
    fn render_element(&mut self, markup: &str, id: &NodeId) -> Option<RenderedBox>;

    /// Box of an element already present in the live view
    fn rendered_element(&mut self, _id: &NodeId) -> Option<RenderedBox> {
        None
    }

    /// Height of an empty paragraph
    fn default_block_height(&mut self) -> f32;

    /// Recreate the surface for a new page layout
    fn rebuild_surface(&mut self, layout: &PageLayout);

    /// Release the surface
    fn teardown(&mut self) {}
}

impl<O: MeasurementOracle + ?Sized> MeasurementOracle for Box<O> {
    fn render_and_measure(&mut self, markup: &str) -> Dimensions {
        (**self).render_and_measure(markup)
    }

    fn render_element(&mut self, markup: &str, id: &NodeId) -> Option<RenderedBox> {
        (**self).render_element(markup, id)
    }

    fn rendered_element(&mut self, id: &NodeId) -> Option<RenderedBox> {
        (**self).rendered_element(id)
    }

    fn default_block_height(&mut self) -> f32 {
        (**self).default_block_height()
    }

    fn rebuild_surface(&mut self, layout: &PageLayout) {
        (**self).rebuild_surface(layout)
    }

    fn teardown(&mut self) {
        (**self).teardown()
    }
}

/// Oracle plus measurement cache
#[derive(Debug)]
pub struct Measurer<O> {
    oracle: O,
    cache: MeasurementCache,
    default_height: Option<f32>,
}

impl<O: MeasurementOracle> Measurer<O> {
    pub fn new(oracle: O, capacity: usize) -> Self {
        Self {
            oracle,
            cache: MeasurementCache::new(capacity),
            default_height: None,
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    pub fn cache(&self) -> &MeasurementCache {
        &self.cache
    }

    pub fn into_oracle(self) -> O {
        self.oracle
    }

    /// Drop every cached result
    pub fn clear(&mut self) {
        self.cache.clear();
        self.default_height = None;
    }

    /// Rendered markup for a subtree, shared between structurally equal subtrees
    pub fn markup(&mut self, node: &Node) -> Rc<str> {
        let key = match serde_json::to_string(node) {
            Ok(key) => key,
            Err(err) => {
                log::warn!("uncacheable node: {}", err);
                return Rc::from(to_markup(node));
            }
        };
        if let Some(markup) = self.cache.markup.get(key.as_str()) {
            return Rc::clone(markup);
        }
        let markup: Rc<str> = Rc::from(to_markup(node));
        self.cache.markup.insert(key, Rc::clone(&markup));
        markup
    }

    /// Natural dimensions of a subtree rendered on its own
    pub fn measure(&mut self, node: &Node) -> Dimensions {
        let markup = self.markup(node);
        if let Some(dimensions) = self.cache.dimensions.get(&markup) {
            return *dimensions;
        }
        let dimensions = self.oracle.render_and_measure(&markup);
        log::trace!("measured {:?} -> {:?}", node.kind, dimensions);
        self.cache.dimensions.insert(markup, dimensions);
        dimensions
    }

    /// Box of a node's element: the live element when the view has one,
    /// otherwise an off-screen render. Nodes without an id cannot be located.
    pub fn element_box(&mut self, node: &Node) -> Option<RenderedBox> {
        node.id()?;
        let markup = self.markup(node);
        self.element_box_in(&markup, node)
    }

    /// Box of a node's element rendered as part of `scope`, the markup of
    /// one of its ancestors, so the element is laid out in context.
    pub fn element_box_in(&mut self, scope: &Rc<str>, node: &Node) -> Option<RenderedBox> {
        let id = node.id()?;
        if let Some(live) = self.oracle.rendered_element(id) {
            return Some(live);
        }
        let key = (Rc::clone(scope), id.clone());
        if let Some(found) = self.cache.elements.get(&key) {
            return Some(*found);
        }
        let found = self.oracle.render_element(&key.0, id)?;
        self.cache.elements.insert(key, found);
        Some(found)
    }

    /// Height of an empty paragraph, asked once per surface
    pub fn default_block_height(&mut self) -> f32 {
        if let Some(height) = self.default_height {
            return height;
        }
        let height = self.oracle.default_block_height();
        self.default_height = Some(height);
        height
    }

    /// Rebuild the oracle surface and forget everything measured on the old one
    pub fn rebuild_surface(&mut self, layout: &PageLayout) {
        self.oracle.rebuild_surface(layout);
        self.clear();
    }

    pub fn teardown(&mut self) {
        self.oracle.teardown();
        self.clear();
    }
}
