//! WASM bindings for the pagination engine
//!
//! Documents, configuration and results cross the boundary as JSON strings.
//! Measurement is delegated to JS callbacks wrapped in [`JsOracle`].

use crate::document::{from_json, Node, NodeId};
use crate::editing::{EditContext, EditMeta, Selection, Step};
use crate::layout::{PageLayout, PaginationConfig};
use crate::measure::{Dimensions, MeasurementOracle, RenderedBox};
use crate::{PageError, PaginationEngine, ScheduleToken};
use js_sys::Function;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Initialize panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    // fails only when a logger is already installed
    #[cfg(feature = "console_log")]
    let _ = console_log::init_with_level(log::Level::Info);
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Measurement oracle backed by an off-screen DOM surface owned by the host
#[wasm_bindgen]
pub struct JsOracle {
    render_and_measure: Function,
    render_element: Function,
    default_block_height: Function,
    rendered_element: Option<Function>,
    rebuild_surface: Option<Function>,
    teardown: Option<Function>,
}

#[wasm_bindgen]
impl JsOracle {
    /// `renderAndMeasure(markup)` and `renderElement(markup, id)` return
    /// JSON; `defaultBlockHeight()` returns a number
    #[wasm_bindgen(constructor)]
    pub fn new(
        render_and_measure: Function,
        render_element: Function,
        default_block_height: Function,
    ) -> JsOracle {
        JsOracle {
            render_and_measure,
            render_element,
            default_block_height,
            rendered_element: None,
            rebuild_surface: None,
            teardown: None,
        }
    }

    /// `renderedElement(id)` returns the JSON box of a live element or null
    #[wasm_bindgen(js_name = setRenderedElement)]
    pub fn set_rendered_element(&mut self, callback: Function) {
        self.rendered_element = Some(callback);
    }

    /// `rebuildSurface(layoutJson)`
    #[wasm_bindgen(js_name = setRebuildSurface)]
    pub fn set_rebuild_surface(&mut self, callback: Function) {
        self.rebuild_surface = Some(callback);
    }

    #[wasm_bindgen(js_name = setTeardown)]
    pub fn set_teardown(&mut self, callback: Function) {
        self.teardown = Some(callback);
    }
}

fn parse_box(value: Result<JsValue, JsValue>) -> Option<RenderedBox> {
    let json = value.ok()?.as_string()?;
    match serde_json::from_str(&json) {
        Ok(bx) => Some(bx),
        Err(err) => {
            log::warn!("bad element box from host: {}", err);
            None
        }
    }
}

impl MeasurementOracle for JsOracle {
    fn render_and_measure(&mut self, markup: &str) -> Dimensions {
        let result = self
            .render_and_measure
            .call1(&JsValue::NULL, &JsValue::from_str(markup));
        match result.ok().and_then(|value| value.as_string()) {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|err| {
                log::warn!("bad dimensions from host: {}", err);
                Dimensions::default()
            }),
            None => Dimensions::default(),
        }
    }

    fn render_element(&mut self, markup: &str, id: &NodeId) -> Option<RenderedBox> {
        parse_box(self.render_element.call2(
            &JsValue::NULL,
            &JsValue::from_str(markup),
            &JsValue::from_str(id.as_str()),
        ))
    }

    fn rendered_element(&mut self, id: &NodeId) -> Option<RenderedBox> {
        let callback = self.rendered_element.as_ref()?;
        parse_box(callback.call1(&JsValue::NULL, &JsValue::from_str(id.as_str())))
    }

    fn default_block_height(&mut self) -> f32 {
        self.default_block_height
            .call0(&JsValue::NULL)
            .ok()
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0) as f32
    }

    fn rebuild_surface(&mut self, layout: &PageLayout) {
        let Some(callback) = &self.rebuild_surface else {
            return;
        };
        match serde_json::to_string(layout) {
            Ok(json) => {
                if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                    log::warn!("surface rebuild failed: {:?}", err);
                }
            }
            Err(err) => log::warn!("layout not serializable: {}", err),
        }
    }

    fn teardown(&mut self) {
        if let Some(callback) = &self.teardown {
            if let Err(err) = callback.call0(&JsValue::NULL) {
                log::warn!("surface teardown failed: {:?}", err);
            }
        }
    }
}

#[derive(Serialize)]
struct PassResult<'a> {
    changed: bool,
    steps: &'a [Step],
    doc: &'a Node,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShellView {
    id: Option<NodeId>,
    page_number: u32,
    total_pages: u32,
    label: Option<String>,
}

/// WASM-exposed pagination engine
#[wasm_bindgen]
pub struct WasmPaginator {
    engine: PaginationEngine<JsOracle>,
}

#[wasm_bindgen]
impl WasmPaginator {
    /// Create an engine from a JSON `PaginationConfig`; an empty string uses
    /// the defaults (US Letter)
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, oracle: JsOracle) -> Result<WasmPaginator, JsValue> {
        let config = if config_json.trim().is_empty() {
            PaginationConfig::default()
        } else {
            serde_json::from_str(config_json)
                .map_err(PageError::from)
                .map_err(js_error)?
        };
        let engine = PaginationEngine::new(config, oracle).map_err(js_error)?;
        Ok(Self { engine })
    }

    /// Run a pass over an applied edit. Returns `{ changed, steps, doc }`.
    pub fn paginate(
        &mut self,
        doc_json: &str,
        prev_doc_json: &str,
        from: usize,
        head: usize,
        meta_json: &str,
    ) -> Result<String, JsValue> {
        let doc = from_json(doc_json).map_err(js_error)?;
        let prev_doc = from_json(prev_doc_json).map_err(js_error)?;
        let meta: EditMeta = serde_json::from_str(meta_json).map_err(js_error)?;
        let ctx = EditContext::new(&doc, &prev_doc, Selection::new(from, head), meta);
        let tr = self.engine.paginate(&ctx);
        let result = PassResult {
            changed: !tr.is_identity(),
            steps: tr.steps(),
            doc: tr.doc(),
        };
        serde_json::to_string(&result).map_err(js_error)
    }

    /// Paginate a freshly loaded document
    #[wasm_bindgen(js_name = paginateInitial)]
    pub fn paginate_initial(&mut self, doc_json: &str) -> Result<String, JsValue> {
        let doc = from_json(doc_json).map_err(js_error)?;
        let tr = self.engine.paginate_initial(&doc);
        let result = PassResult {
            changed: !tr.is_identity(),
            steps: tr.steps(),
            doc: tr.doc(),
        };
        serde_json::to_string(&result).map_err(js_error)
    }

    /// Returns the schedule token, or `undefined` when no pass is needed
    #[wasm_bindgen(js_name = viewUpdated)]
    pub fn view_updated(
        &mut self,
        doc_json: &str,
        prev_doc_json: &str,
        from: usize,
        head: usize,
    ) -> Result<Option<f64>, JsValue> {
        let doc = from_json(doc_json).map_err(js_error)?;
        let prev_doc = from_json(prev_doc_json).map_err(js_error)?;
        let token = self
            .engine
            .view_updated(&doc, &prev_doc, Selection::new(from, head));
        Ok(token.map(|token| token.0 as f64))
    }

    /// Frame callback: JSON `EditMeta` of the pass to dispatch
    #[wasm_bindgen(js_name = onFrame)]
    pub fn on_frame(&mut self) -> Option<String> {
        let meta = self.engine.on_frame()?;
        serde_json::to_string(&meta).ok()
    }

    pub fn cancel(&mut self, token: f64) -> bool {
        self.engine.cancel(ScheduleToken(token as u64))
    }

    #[wasm_bindgen(js_name = compositionStart)]
    pub fn composition_start(&mut self) {
        self.engine.composition_start();
    }

    #[wasm_bindgen(js_name = compositionEnd)]
    pub fn composition_end(&mut self) {
        self.engine.composition_end();
    }

    #[wasm_bindgen(js_name = setPageLayout)]
    pub fn set_page_layout(&mut self, layout_json: &str) -> Result<(), JsValue> {
        let layout: PageLayout = serde_json::from_str(layout_json).map_err(js_error)?;
        self.engine.set_page_layout(layout).map_err(js_error)
    }

    /// Page ids, numbers and labels as a JSON array
    #[wasm_bindgen(js_name = pageShells)]
    pub fn page_shells(&self, doc_json: &str) -> Result<String, JsValue> {
        let doc = from_json(doc_json).map_err(js_error)?;
        let numbers = &self.engine.config().layout.page_numbers;
        let shells: Vec<ShellView> = self
            .engine
            .page_shells(&doc)
            .into_iter()
            .map(|shell| ShellView {
                label: shell.label(numbers),
                id: shell.id,
                page_number: shell.page_number,
                total_pages: shell.total_pages,
            })
            .collect();
        serde_json::to_string(&shells).map_err(js_error)
    }

    /// Give pasted nodes (a JSON array) fresh ids
    #[wasm_bindgen(js_name = transformPasted)]
    pub fn transform_pasted(&mut self, nodes_json: &str) -> Result<String, JsValue> {
        let nodes: Vec<Node> = serde_json::from_str(nodes_json).map_err(js_error)?;
        serde_json::to_string(&self.engine.transform_pasted(nodes)).map_err(js_error)
    }

    #[wasm_bindgen(js_name = transformCopied)]
    pub fn transform_copied(&self, nodes_json: &str) -> Result<String, JsValue> {
        let nodes: Vec<Node> = serde_json::from_str(nodes_json).map_err(js_error)?;
        serde_json::to_string(&self.engine.transform_copied(nodes)).map_err(js_error)
    }

    pub fn destroy(&mut self) {
        self.engine.destroy();
    }
}
