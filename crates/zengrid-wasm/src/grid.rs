//! `ZenGridCore`: the state behind one `<zen-grid>` element.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use js_sys::{Array, Function};
use serde_json::Value;
use tracing::debug;
use wasm_bindgen::prelude::*;
use web_sys::Element;
use zengrid::bridge::{self, Bridge, BridgeOutcome};
use zengrid::events::GridEvent;
use zengrid::grid::{Grid, GridView};
use zengrid::model::{SortDirection, SortOptions};
use zengrid::schedule::Scheduler;
use zengrid::toolbar::{Discovery, TOOLBAR_TAG};

use crate::dom::{self, DomTree, TimeoutScheduler};
use crate::registry;

// =============================================================================
// Outbox
// =============================================================================

/// Grid events waiting to be re-emitted on the host element.
///
/// Events are queued while the grid is borrowed and flushed from a zero
/// delay timeout, so listeners may call back into the core.
struct Outbox {
    element: Element,
    queue: RefCell<Vec<GridEvent>>,
    scheduled: Cell<bool>,
    listeners: RefCell<Vec<(String, Function)>>,
}

impl Outbox {
    fn new(element: Element) -> Self {
        Self {
            element,
            queue: RefCell::new(Vec::new()),
            scheduled: Cell::new(false),
            listeners: RefCell::new(Vec::new()),
        }
    }

    fn push(self: &Rc<Self>, event: &GridEvent) {
        self.queue.borrow_mut().push(event.clone());
        if self.scheduled.replace(true) {
            return;
        }
        let outbox = Rc::clone(self);
        TimeoutScheduler.defer(Duration::ZERO, Box::new(move || outbox.flush()));
    }

    fn flush(&self) {
        self.scheduled.set(false);
        let events = std::mem::take(&mut *self.queue.borrow_mut());
        for event in events {
            let detail = dom::to_js(&event.detail());
            let names = bridge::event_names(event.name());
            for name in &names {
                dom::dispatch(&self.element, name, &detail);
            }
            let listeners: Vec<Function> = self
                .listeners
                .borrow()
                .iter()
                .filter(|(name, _)| names.contains(name))
                .map(|(_, callback)| callback.clone())
                .collect();
            for callback in listeners {
                if let Err(err) = callback.call1(&JsValue::NULL, &detail) {
                    dom::report(event.name(), &err);
                }
            }
        }
    }
}

// =============================================================================
// Core
// =============================================================================

/// Grid state for one `<zen-grid>` element.
///
/// The custom element class forwards its lifecycle callbacks here:
///
/// ```javascript
/// class ZenGrid extends HTMLElement {
///     static get observedAttributes() { return ZenGridCore.observedAttributes(); }
///     constructor() { super(); this.core = new ZenGridCore(this); }
///     connectedCallback() { this.core.connectedCallback(); }
///     disconnectedCallback() { this.core.disconnectedCallback(); }
///     attributeChangedCallback(name, old, value) {
///         this.core.attributeChangedCallback(name, old, value);
///     }
/// }
/// customElements.define("zen-grid", ZenGrid);
/// ```
#[wasm_bindgen]
pub struct ZenGridCore {
    element: Element,
    grid: Rc<RefCell<Grid>>,
    bridge: Bridge,
    outbox: Rc<Outbox>,
    discovery: Rc<RefCell<Discovery<Element>>>,
}

#[wasm_bindgen]
impl ZenGridCore {
    #[wasm_bindgen(constructor)]
    pub fn new(element: Element) -> Self {
        let grid = Grid::new();
        let outbox = Rc::new(Outbox::new(element.clone()));
        let sink = Rc::clone(&outbox);
        grid.subscribe(move |event| sink.push(event));
        Self {
            element,
            grid: Rc::new(RefCell::new(grid)),
            bridge: Bridge::new(),
            outbox,
            discovery: Rc::new(RefCell::new(Discovery::new(TOOLBAR_TAG))),
        }
    }

    /// Attribute names the element should observe.
    #[must_use]
    #[wasm_bindgen(js_name = "observedAttributes")]
    pub fn observed_attributes() -> Array {
        bridge::observed_attributes()
            .into_iter()
            .map(JsValue::from)
            .collect()
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Registers the element and looks for a toolbar.
    #[wasm_bindgen(js_name = "connectedCallback")]
    pub fn connected_callback(&self) {
        registry::register_grid(&self.element, &self.grid);
        let Some(tree) = DomTree::current() else {
            return;
        };
        let grid = Rc::downgrade(&self.grid);
        let discovery = Rc::downgrade(&self.discovery);
        Discovery::run(
            &self.discovery,
            Rc::new(tree),
            self.element.clone(),
            &TimeoutScheduler,
            move |toolbar, _step| {
                registry::link(grid.upgrade(), registry::toolbar_for(&toolbar), &discovery);
            },
        );
    }

    #[wasm_bindgen(js_name = "disconnectedCallback")]
    pub fn disconnected_callback(&self) {
        registry::unregister_grid(&self.element);
        self.discovery.borrow_mut().reset();
    }

    /// Applies an attribute change. Returns what happened:
    /// `applied`, `ignored`, `passed-through` or `rejected`.
    #[wasm_bindgen(js_name = "attributeChangedCallback")]
    pub fn attribute_changed_callback(
        &self,
        name: &str,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> String {
        self.with_grid(|grid| {
            self.bridge
                .attribute_changed(grid, name, old_value.as_deref(), new_value.as_deref())
        })
        .map_or_else(|| "ignored".to_string(), outcome_name)
    }

    /// Applies a property assignment with a structured value.
    #[wasm_bindgen(js_name = "setProperty")]
    pub fn set_property(&self, name: &str, value: &JsValue) -> String {
        let value = match dom::from_js(name, value) {
            Ok(value) => value,
            Err(err) => return outcome_name(BridgeOutcome::Rejected(err)),
        };
        self.with_grid(|grid| self.bridge.set_property(grid, name, value))
            .map_or_else(|| "ignored".to_string(), outcome_name)
    }

    /// Calls `callback` with the event detail for every event named `name`.
    /// Both canonical and kebab-case names are accepted.
    #[wasm_bindgen(js_name = "addEventListener")]
    pub fn add_event_listener(&self, name: &str, callback: Function) {
        self.outbox
            .listeners
            .borrow_mut()
            .push((name.to_string(), callback));
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Filters with a search string, a criteria object or `null`.
    pub fn filter(&self, criteria: &JsValue) {
        match dom::from_js("filter", criteria) {
            Ok(criteria) => {
                self.with_grid(|grid| grid.filter_value(&criteria));
            }
            Err(err) => dom::report("zen-grid: filter ignored", &JsValue::from_str(&err.to_string())),
        }
    }

    pub fn search(&self, term: &str) {
        self.with_grid(|grid| grid.search(term));
    }

    #[wasm_bindgen(js_name = "clickHeader")]
    pub fn click_header(&self, field: &str) {
        self.with_grid(|grid| grid.click_header(field));
    }

    /// Sets the sort without toggling. `comparator(a, b)` receives whole rows
    /// and returns a number like `Array.prototype.sort` expects.
    #[wasm_bindgen(js_name = "sortBy")]
    pub fn sort_by(&self, field: &str, direction: &str, comparator: Option<Function>) {
        let direction = match direction.trim().to_ascii_lowercase().as_str() {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => SortDirection::None,
        };
        let mut options = SortOptions::new(field, direction);
        if let Some(callback) = comparator {
            options = options.comparator(move |a, b| compare_with(&callback, a, b));
        }
        self.with_grid(|grid| grid.set_sort_options(Some(options)));
    }

    #[wasm_bindgen(js_name = "setPage")]
    pub fn set_page(&self, page: u32) {
        self.with_grid(|grid| grid.set_page(index(page)));
    }

    #[wasm_bindgen(js_name = "setPageSize")]
    pub fn set_page_size(&self, page_size: u32) {
        self.with_grid(|grid| grid.set_page_size(index(page_size)));
    }

    #[wasm_bindgen(js_name = "setLanguage")]
    pub fn set_language(&self, code: &str) {
        self.with_grid(|grid| grid.set_language(code));
    }

    /// Row click at `index` within the visible page.
    #[wasm_bindgen(js_name = "clickRow")]
    pub fn click_row(&self, row_index: u32) {
        self.with_grid(|grid| grid.click_row(index(row_index)));
    }

    /// Toggles the selection of a row given as a plain object.
    ///
    /// The row is matched against the data by value. With a row key set, an
    /// object carrying only the key is enough.
    #[wasm_bindgen(js_name = "selectRow")]
    pub fn select_row(&self, row: &JsValue) -> bool {
        let Ok(value) = dom::from_js("row", row) else {
            return false;
        };
        self.with_grid(|grid| {
            let found = grid
                .data()
                .iter()
                .find(|candidate| ***candidate == value)
                .cloned()
                .or_else(|| grid.row_key().map(|_| Arc::new(value)));
            found.is_some_and(|row| {
                grid.select_row(&row);
                true
            })
        })
        .unwrap_or(false)
    }

    #[wasm_bindgen(js_name = "clearSelection")]
    pub fn clear_selection(&self) {
        self.with_grid(Grid::clear_selection);
    }

    #[wasm_bindgen(js_name = "getSelectedRows")]
    pub fn selected_rows(&self) -> JsValue {
        self.grid.try_borrow().map_or(JsValue::NULL, |grid| {
            let rows = grid.selected_rows().iter().map(|row| row.as_ref().clone()).collect();
            dom::to_js(&Value::Array(rows))
        })
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    #[wasm_bindgen(getter, js_name = "currentPage")]
    pub fn current_page(&self) -> u32 {
        self.grid
            .try_borrow()
            .map_or(1, |grid| count(grid.current_page()))
    }

    #[wasm_bindgen(getter, js_name = "totalPages")]
    pub fn total_pages(&self) -> u32 {
        self.grid
            .try_borrow()
            .map_or(1, |grid| count(grid.total_pages()))
    }

    /// The current render view as a plain object.
    pub fn view(&self) -> JsValue {
        self.grid
            .try_borrow()
            .map_or(JsValue::NULL, |grid| view_to_js(&grid.view()))
    }

    /// Calls `callback(view)` after every change, and once now.
    #[wasm_bindgen(js_name = "setRenderer")]
    pub fn set_renderer(&self, callback: Function) {
        self.with_grid(|grid| {
            grid.set_renderer(move |view: &GridView| {
                if let Err(err) = callback.call1(&JsValue::NULL, &view_to_js(view)) {
                    dom::report("zen-grid: renderer failed", &err);
                }
            });
        });
    }

    /// Formats cells of the column bound to `field` with
    /// `callback(value, rowIndex)`. Returns `false` for unknown fields.
    #[wasm_bindgen(js_name = "setCellRenderer")]
    pub fn set_cell_renderer(&self, field: &str, callback: Function) -> bool {
        self.with_grid(|grid| {
            let mut columns = grid.columns().to_vec();
            let Some(column) = columns.iter_mut().find(|column| column.field == field) else {
                debug!(column.field = field, "No column for cell renderer");
                return false;
            };
            *column = column.clone().cell_renderer(move |value, row_index| {
                callback
                    .call2(&JsValue::NULL, &dom::to_js(value), &JsValue::from(count(row_index)))
                    .ok()
                    .and_then(|text| text.as_string())
                    .unwrap_or_default()
            });
            grid.set_columns(columns);
            true
        })
        .unwrap_or(false)
    }
}

impl ZenGridCore {
    fn with_grid<R>(&self, f: impl FnOnce(&mut Grid) -> R) -> Option<R> {
        if let Ok(mut grid) = self.grid.try_borrow_mut() {
            Some(f(&mut grid))
        } else {
            dom::report(
                "zen-grid: call ignored",
                &JsValue::from_str("grid is busy rendering"),
            );
            None
        }
    }
}

fn outcome_name(outcome: BridgeOutcome) -> String {
    match outcome {
        BridgeOutcome::Applied(_) => "applied".to_string(),
        BridgeOutcome::Ignored => "ignored".to_string(),
        BridgeOutcome::PassedThrough(_) => "passed-through".to_string(),
        BridgeOutcome::Rejected(err) => {
            dom::report("zen-grid: input rejected", &JsValue::from_str(&err.to_string()));
            "rejected".to_string()
        }
    }
}

fn compare_with(callback: &Function, a: &Value, b: &Value) -> Ordering {
    match callback.call2(&JsValue::NULL, &dom::to_js(a), &dom::to_js(b)) {
        Ok(result) => result
            .as_f64()
            .and_then(|n| n.partial_cmp(&0.0))
            .unwrap_or(Ordering::Equal),
        Err(err) => {
            dom::report("zen-grid: comparator failed", &err);
            Ordering::Equal
        }
    }
}

fn view_to_js(view: &GridView) -> JsValue {
    serde_json::to_value(view).map_or(JsValue::NULL, |value| dom::to_js(&value))
}

fn index(n: u32) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
