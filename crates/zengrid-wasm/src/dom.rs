//! Browser glue: the live DOM as an [`ElementTree`], `setTimeout` as a
//! [`Scheduler`], and conversions between `JsValue` and JSON values.

use std::time::Duration;

use serde_json::Value;
use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CustomEvent, CustomEventInit, Document, Element};
use zengrid::error::GridError;
use zengrid::schedule::{Scheduler, Task};
use zengrid::toolbar::ElementTree;

// =============================================================================
// Element tree
// =============================================================================

/// The page's element tree.
#[derive(Debug, Clone)]
pub struct DomTree {
    document: Document,
}

impl DomTree {
    /// Tree of the current window's document, if there is one.
    pub fn current() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        Some(Self { document })
    }
}

impl ElementTree for DomTree {
    type Element = Element;

    fn tag_name(&self, element: &Element) -> String {
        element.tag_name().to_ascii_lowercase()
    }

    fn next_sibling(&self, element: &Element) -> Option<Element> {
        element.next_element_sibling()
    }

    fn previous_sibling(&self, element: &Element) -> Option<Element> {
        element.previous_element_sibling()
    }

    fn parent(&self, element: &Element) -> Option<Element> {
        element.parent_element()
    }

    fn find_descendant(&self, root: &Element, tag: &str) -> Option<Element> {
        root.query_selector(tag).ok().flatten()
    }

    fn find_in_document(&self, tag: &str) -> Option<Element> {
        self.document.query_selector(tag).ok().flatten()
    }
}

// =============================================================================
// Scheduler
// =============================================================================

/// Defers tasks with `window.setTimeout`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutScheduler;

impl Scheduler for TimeoutScheduler {
    fn defer(&self, delay: Duration, task: Task) {
        let Some(window) = web_sys::window() else {
            warn!("No window, deferred task dropped");
            return;
        };
        let callback = Closure::once_into_js(move || task());
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        if let Err(err) = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), millis)
        {
            warn!(error = ?err, "setTimeout failed, deferred task dropped");
        }
    }
}

// =============================================================================
// Values
// =============================================================================

/// JSON value as a plain JS value. Unserializable input becomes `null`.
pub fn to_js(value: &Value) -> JsValue {
    serde_json::to_string(value)
        .ok()
        .and_then(|text| js_sys::JSON::parse(&text).ok())
        .unwrap_or(JsValue::NULL)
}

/// Plain JS value as JSON. `undefined` maps to `null`; functions and
/// cyclic structures are rejected.
pub fn from_js(property: &str, value: &JsValue) -> Result<Value, GridError> {
    if value.is_undefined() || value.is_null() {
        return Ok(Value::Null);
    }
    if let Some(text) = value.as_string() {
        return Ok(Value::String(text));
    }
    if value.is_function() {
        return Err(GridError::invalid_shape(property, "expected a JSON value, found function"));
    }
    let text: String = js_sys::JSON::stringify(value)
        .map_err(|err| GridError::malformed_json(property, format!("{err:?}")))?
        .into();
    serde_json::from_str(&text).map_err(|err| GridError::malformed_json(property, err.to_string()))
}

/// Fires a bubbling, composed `CustomEvent` named `name` on `target`.
pub fn dispatch(target: &Element, name: &str, detail: &JsValue) {
    let init = CustomEventInit::new();
    init.set_bubbles(true);
    init.set_composed(true);
    init.set_detail(detail);
    let dispatched = CustomEvent::new_with_event_init_dict(name, &init)
        .and_then(|event| target.dispatch_event(&event));
    if let Err(err) = dispatched {
        warn!(event = name, error = ?err, "Event dispatch failed");
    }
}

/// Logs a failed JS callback to the browser console.
pub fn report(context: &str, err: &JsValue) {
    web_sys::console::warn_2(&JsValue::from_str(context), err);
}
