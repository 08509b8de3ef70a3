//! Headless measurement oracle
//!
//! Parses the engine's own markup and lays it out with fixed font metrics and
//! the greedy line breaker. Deterministic, so it backs the demo binary, the
//! benchmarks and the tests.

use super::{Dimensions, MeasurementOracle, RenderedBox};
use crate::document::{NodeId, TRAILING_BREAK_CLASS};
use crate::layout::{FontMetrics, LineBreaker, PageLayout};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Vertical box model of one element kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockStyle {
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub padding_top: f32,
    pub padding_bottom: f32,
    pub border: f32,
    /// Left inset applied to children or inline content
    pub indent: f32,
    /// Line height multiplier for inline content
    pub line_scale: f32,
}

impl Default for BlockStyle {
    fn default() -> Self {
        Self {
            margin_top: 0.0,
            margin_bottom: 0.0,
            padding_top: 0.0,
            padding_bottom: 0.0,
            border: 0.0,
            indent: 0.0,
            line_scale: 1.0,
        }
    }
}

impl BlockStyle {
    fn heading(line_scale: f32) -> Self {
        Self {
            margin_top: 8.0,
            margin_bottom: 4.0,
            line_scale,
            ..Self::default()
        }
    }

    fn padded(padding: f32) -> Self {
        Self {
            padding_top: padding,
            padding_bottom: padding,
            ..Self::default()
        }
    }
}

/// Styles per element kind
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSheet {
    pub paragraph: BlockStyle,
    /// `h1` through `h6`
    pub headings: [BlockStyle; 6],
    pub list: BlockStyle,
    pub list_item: BlockStyle,
    pub transient_text: BlockStyle,
    pub fixed_block: BlockStyle,
    pub page: BlockStyle,
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self {
            paragraph: BlockStyle::default(),
            headings: [
                BlockStyle::heading(2.0),
                BlockStyle::heading(1.5),
                BlockStyle::heading(1.25),
                BlockStyle::heading(1.0),
                BlockStyle::heading(1.0),
                BlockStyle::heading(1.0),
            ],
            list: BlockStyle::default(),
            list_item: BlockStyle {
                indent: 24.0,
                ..BlockStyle::default()
            },
            transient_text: BlockStyle::padded(4.0),
            fixed_block: BlockStyle::padded(4.0),
            page: BlockStyle::default(),
        }
    }
}

impl StyleSheet {
    fn style_for(&self, el: &Element) -> BlockStyle {
        match el.tag.as_str() {
            "p" => self.paragraph,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = el.tag[1..].parse::<usize>().unwrap_or(1);
                self.headings[level.clamp(1, 6) - 1]
            }
            "ul" | "ol" => self.list,
            "li" => self.list_item,
            "div" => match el.attr("data-type") {
                Some("transient-text") => self.transient_text,
                Some("fixed-block") | Some("fixed-block-extend") => self.fixed_block,
                Some("page") => self.page,
                _ => BlockStyle::default(),
            },
            _ => BlockStyle::default(),
        }
    }
}

#[derive(Debug)]
enum Markup {
    Element(Element),
    Text(String),
}

#[derive(Debug)]
struct Element {
    tag: String,
    attrs: SmallVec<[(String, String); 4]>,
    children: Vec<Markup>,
}

impl Element {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn is_textblock(&self) -> bool {
        match self.tag.as_str() {
            "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => true,
            "div" => self.attr("data-type") == Some("transient-text"),
            _ => false,
        }
    }
}

/// Build the markup tree with `quick_xml`. Malformed input keeps whatever
/// was read before the error.
fn parse(markup: &str) -> Vec<Markup> {
    let mut reader = Reader::from_str(markup);
    let mut roots = Vec::new();
    let mut stack: Vec<Element> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => stack.push(element(e)),
            Ok(Event::Empty(ref e)) => {
                push_child(&mut stack, &mut roots, Markup::Element(element(e)))
            }
            Ok(Event::End(_)) => {
                if let Some(el) = stack.pop() {
                    push_child(&mut stack, &mut roots, Markup::Element(el));
                }
            }
            Ok(Event::Text(e)) => match e.unescape() {
                Ok(text) => push_child(&mut stack, &mut roots, Markup::Text(text.into_owned())),
                Err(err) => log::warn!("bad text in markup: {}", err),
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                log::warn!(
                    "markup error at position {}: {}",
                    reader.buffer_position(),
                    err
                );
                break;
            }
        }
    }

    // close anything left open
    while let Some(el) = stack.pop() {
        push_child(&mut stack, &mut roots, Markup::Element(el));
    }
    roots
}

fn element(start: &BytesStart<'_>) -> Element {
    let tag = String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase();
    let attrs = start
        .attributes()
        .filter_map(|attr| attr.ok())
        .filter_map(|attr| {
            let value = attr.unescape_value().ok()?.into_owned();
            Some((String::from_utf8_lossy(attr.key.as_ref()).into_owned(), value))
        })
        .collect();
    Element {
        tag,
        attrs,
        children: Vec::new(),
    }
}

fn push_child(stack: &mut [Element], roots: &mut Vec<Markup>, child: Markup) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(child),
        None => roots.push(child),
    }
}

fn collect_inline(el: &Element, out: &mut String) {
    for child in &el.children {
        match child {
            Markup::Text(text) => out.push_str(text),
            Markup::Element(br) if br.tag == "br" => {
                if br.attr("class") != Some(TRAILING_BREAK_CLASS) {
                    out.push('\n');
                }
            }
            Markup::Element(inline) => collect_inline(inline, out),
        }
    }
}

struct Laid {
    bx: RenderedBox,
    natural_width: f32,
    list_item: bool,
}

/// Boxes of every identified element of the most recently rendered markup
#[derive(Debug, Clone, Default)]
struct Scope {
    markup: String,
    boxes: FxHashMap<String, RenderedBox>,
}

/// Deterministic oracle over fixed font metrics
#[derive(Debug, Clone)]
pub struct HeadlessOracle {
    metrics: FontMetrics,
    breaker: LineBreaker,
    styles: StyleSheet,
    surface_width: Option<f32>,
    scope: Option<Scope>,
    renders: usize,
}

impl Default for HeadlessOracle {
    fn default() -> Self {
        Self::new(FontMetrics::default(), StyleSheet::default())
    }
}

impl HeadlessOracle {
    pub fn new(metrics: FontMetrics, styles: StyleSheet) -> Self {
        Self {
            metrics,
            breaker: LineBreaker::new(),
            styles,
            surface_width: None,
            scope: None,
            renders: 0,
        }
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    /// Width of the surface, once it has been built
    pub fn surface_width(&self) -> Option<f32> {
        self.surface_width
    }

    /// Number of layouts performed so far
    pub fn render_count(&self) -> usize {
        self.renders
    }

    fn width(&self) -> f32 {
        self.surface_width
            .unwrap_or_else(|| PageLayout::default().content_width())
    }

    fn layout_element(
        &self,
        el: &Element,
        width: f32,
        boxes: &mut FxHashMap<String, RenderedBox>,
    ) -> Laid {
        let style = self.styles.style_for(el);
        let inner_width = (width - style.indent).max(0.0);

        let (content_height, natural, content_area) = if el.is_textblock() {
            let mut text = String::new();
            collect_inline(el, &mut text);
            let lines = self
                .breaker
                .break_lines(&text, inner_width, &self.metrics)
                .len();
            let height = lines as f32 * self.metrics.line_height * style.line_scale;
            let natural = self.breaker.natural_width(&text, &self.metrics);
            (height, natural, true)
        } else {
            let children: Vec<Laid> = el
                .children
                .iter()
                .filter_map(|child| match child {
                    Markup::Element(child) => Some(self.layout_element(child, inner_width, boxes)),
                    Markup::Text(_) => None,
                })
                .collect();
            let mut height = 0.0;
            let mut natural: f32 = 0.0;
            for (i, child) in children.iter().enumerate() {
                let next_margin = children.get(i + 1).map_or(0.0, |n| n.bx.margin_top);
                height += child.bx.outer_height(next_margin, i == 0 || child.list_item);
                natural = natural.max(child.natural_width);
            }
            (height, natural, false)
        };

        let bx = RenderedBox {
            height: style.padding_top + content_height + style.padding_bottom + style.border,
            width,
            margin_top: style.margin_top,
            margin_bottom: style.margin_bottom,
            padding_top: style.padding_top,
            padding_bottom: style.padding_bottom,
            border: style.border,
            content_height: content_area.then_some(content_height),
        };
        if let Some(id) = el.attr("data-id") {
            boxes.insert(id.to_string(), bx);
        }
        Laid {
            bx,
            natural_width: natural + style.indent,
            list_item: el.tag == "li",
        }
    }

    /// Lay out every root element of `markup` at the surface width
    fn layout_markup(&mut self, markup: &str) -> (Option<Laid>, FxHashMap<String, RenderedBox>) {
        self.renders += 1;
        let width = self.width();
        let mut boxes = FxHashMap::default();
        let mut first = None;
        for node in parse(markup) {
            if let Markup::Element(el) = node {
                let laid = self.layout_element(&el, width, &mut boxes);
                first.get_or_insert(laid);
            }
        }
        (first, boxes)
    }
}

impl MeasurementOracle for HeadlessOracle {
    fn render_and_measure(&mut self, markup: &str) -> Dimensions {
        match self.layout_markup(markup).0 {
            Some(laid) => Dimensions {
                height: laid.bx.height,
                width: laid.natural_width,
            },
            None => Dimensions::default(),
        }
    }

    fn render_element(&mut self, markup: &str, id: &NodeId) -> Option<RenderedBox> {
        let cached = self
            .scope
            .as_ref()
            .map_or(false, |scope| scope.markup == markup);
        if !cached {
            let (_, boxes) = self.layout_markup(markup);
            self.scope = Some(Scope {
                markup: markup.to_string(),
                boxes,
            });
        }
        self.scope
            .as_ref()
            .and_then(|scope| scope.boxes.get(id.as_str()).copied())
    }

    fn default_block_height(&mut self) -> f32 {
        let markup = format!("<p><br class=\"{}\"/></p>", TRAILING_BREAK_CLASS);
        self.render_and_measure(&markup).height
    }

    fn rebuild_surface(&mut self, layout: &PageLayout) {
        self.surface_width = Some(layout.content_width());
        self.scope = None;
    }

    fn teardown(&mut self) {
        self.surface_width = None;
        self.scope = None;
    }
}
