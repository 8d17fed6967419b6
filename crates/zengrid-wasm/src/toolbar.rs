//! `ZenGridToolbarCore`: the state behind one `<zen-grid-toolbar>` element.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::Function;
use serde_json::{Value, json};
use wasm_bindgen::prelude::*;
use web_sys::Element;
use zengrid::error::GridError;
use zengrid::export::{ExportFormat, ExportSnapshot};
use zengrid::toolbar::{Discovery, GRID_TAG, Toolbar, ToolbarView};

use crate::dom::{self, DomTree, TimeoutScheduler};
use crate::registry;

/// Toolbar state for one `<zen-grid-toolbar>` element.
#[wasm_bindgen]
pub struct ZenGridToolbarCore {
    element: Element,
    toolbar: Rc<RefCell<Toolbar>>,
    discovery: Rc<RefCell<Discovery<Element>>>,
}

#[wasm_bindgen]
impl ZenGridToolbarCore {
    #[wasm_bindgen(constructor)]
    pub fn new(element: Element) -> Self {
        Self {
            element,
            toolbar: Rc::new(RefCell::new(Toolbar::new())),
            discovery: Rc::new(RefCell::new(Discovery::new(GRID_TAG))),
        }
    }

    /// Registers the element and looks for its grid.
    #[wasm_bindgen(js_name = "connectedCallback")]
    pub fn connected_callback(&self) {
        registry::register_toolbar(&self.element, &self.toolbar);
        self.discover();
    }

    #[wasm_bindgen(js_name = "disconnectedCallback")]
    pub fn disconnected_callback(&self) {
        registry::unregister_toolbar(&self.element);
        self.discovery.borrow_mut().reset();
    }

    /// Sends `term` to the grid. Returns `false` when no grid is paired; the
    /// term is then kept, discovery runs again, and pairing delivers it.
    pub fn search(&self, term: &str) -> bool {
        let result = match self.toolbar.try_borrow_mut() {
            Ok(mut toolbar) => toolbar.search(term),
            Err(_) => Err(GridError::PeerUnavailable("toolbar is busy".into())),
        };
        match result {
            Ok(()) => true,
            Err(GridError::PeerUnavailable(_)) => {
                self.discovery.borrow_mut().reset();
                self.discover();
                false
            }
            Err(err) => {
                dom::report("zen-grid-toolbar: search failed", &JsValue::from_str(&err.to_string()));
                false
            }
        }
    }

    /// Calls `encoder(format, { headers, records, rows })` with the grid's
    /// raw data. Returns `false` when export is disabled, the format is
    /// unknown, no grid is paired, or the encoder throws.
    pub fn export(&self, format: &str, encoder: Function) -> bool {
        let format = match format.parse::<ExportFormat>() {
            Ok(format) => format,
            Err(err) => {
                dom::report("zen-grid-toolbar: export refused", &JsValue::from_str(&err.to_string()));
                return false;
            }
        };
        let threw = Cell::new(false);
        let encode = |format: ExportFormat, snapshot: &ExportSnapshot| -> zengrid::Result<()> {
            let payload = json!({
                "headers": snapshot.headers(),
                "records": snapshot.records(),
                "rows": snapshot.rows.iter().map(|row| row.as_ref().clone()).collect::<Vec<Value>>(),
            });
            if let Err(err) = encoder.call2(
                &JsValue::NULL,
                &JsValue::from_str(format.as_str()),
                &dom::to_js(&payload),
            ) {
                dom::report("zen-grid-toolbar: encoder failed", &err);
                threw.set(true);
            }
            Ok(())
        };
        let Ok(toolbar) = self.toolbar.try_borrow() else {
            return false;
        };
        match toolbar.export(format, &encode) {
            Ok(()) => !threw.get(),
            Err(err) => {
                dom::report("zen-grid-toolbar: export refused", &JsValue::from_str(&err.to_string()));
                false
            }
        }
    }

    pub fn view(&self) -> JsValue {
        self.toolbar
            .try_borrow()
            .map_or(JsValue::NULL, |toolbar| view_to_js(&toolbar.view()))
    }

    /// Calls `callback(view)` whenever the grid pushes a change.
    #[wasm_bindgen(js_name = "setRenderer")]
    pub fn set_renderer(&self, callback: Function) {
        if let Ok(mut toolbar) = self.toolbar.try_borrow_mut() {
            toolbar.set_renderer(move |view| {
                if let Err(err) = callback.call1(&JsValue::NULL, &view_to_js(view)) {
                    dom::report("zen-grid-toolbar: renderer failed", &err);
                }
            });
        }
    }

    #[wasm_bindgen(getter)]
    pub fn language(&self) -> String {
        self.toolbar
            .try_borrow()
            .map_or_else(|_| zengrid::i18n::DEFAULT_LANGUAGE.to_string(), |t| t.language().to_string())
    }

    #[wasm_bindgen(getter, js_name = "isPaired")]
    pub fn is_paired(&self) -> bool {
        self.toolbar.try_borrow().is_ok_and(|toolbar| toolbar.is_paired())
    }
}

impl ZenGridToolbarCore {
    fn discover(&self) {
        let Some(tree) = DomTree::current() else {
            return;
        };
        let toolbar = Rc::downgrade(&self.toolbar);
        let discovery = Rc::downgrade(&self.discovery);
        Discovery::run(
            &self.discovery,
            Rc::new(tree),
            self.element.clone(),
            &TimeoutScheduler,
            move |grid, _step| {
                registry::link(registry::grid_for(&grid), toolbar.upgrade(), &discovery);
            },
        );
    }
}

fn view_to_js(view: &ToolbarView) -> JsValue {
    serde_json::to_value(view).map_or(JsValue::NULL, |value| dom::to_js(&value))
}
