//! Browser-based WASM tests.
//!
//! Run with: wasm-pack test --headless --chrome

#![cfg(target_arch = "wasm32")]

use js_sys::{Array, Reflect};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;
use zengrid_wasm::{ZenGridCore, ZenGridToolbarCore};

wasm_bindgen_test_configure!(run_in_browser);

fn element(tag: &str) -> web_sys::Element {
    let document = web_sys::window().unwrap().document().unwrap();
    let element = document.create_element(tag).unwrap();
    document.document_element().unwrap().append_child(&element).unwrap();
    element
}

fn rows() -> JsValue {
    js_sys::JSON::parse(
        r#"[{"id": 1, "name": "Ada", "age": 36}, {"id": 2, "name": "Linus", "age": 28}, {"id": 3, "name": "Grace", "age": 45}]"#,
    )
    .unwrap()
}

#[wasm_bindgen_test]
fn test_version() {
    let version = zengrid_wasm::version();
    assert!(version.contains('.'));
}

#[wasm_bindgen_test]
fn test_observed_attributes() {
    let names = ZenGridCore::observed_attributes();
    assert!(names.includes(&JsValue::from_str("pagination-options"), 0));
    assert!(names.includes(&JsValue::from_str(":sort-options"), 0));
}

#[wasm_bindgen_test]
fn test_attribute_and_property_agree() {
    let core = ZenGridCore::new(element("zen-grid"));
    assert_eq!(core.set_property("data", &rows()), "applied");
    assert_eq!(
        core.attribute_changed_callback("pagination-options", None, Some(r#"{"pageSize": 2}"#.into())),
        "applied"
    );
    assert_eq!(core.total_pages(), 2);
    assert_eq!(
        core.attribute_changed_callback("data", None, Some("[{".into())),
        "rejected"
    );
    assert_eq!(core.total_pages(), 2);
}

#[wasm_bindgen_test]
fn test_sort_and_view() {
    let core = ZenGridCore::new(element("zen-grid"));
    core.set_property("data", &rows());
    core.click_header("age");
    let view = core.view();
    let rows = Array::from(&Reflect::get(&view, &"rows".into()).unwrap());
    assert_eq!(rows.length(), 3);
}

#[wasm_bindgen_test]
fn test_selection_by_value() {
    let core = ZenGridCore::new(element("zen-grid"));
    core.set_property("data", &rows());
    let first = Array::from(&rows()).get(0);
    assert!(core.select_row(&first));
    assert_eq!(Array::from(&core.selected_rows()).length(), 1);
    core.clear_selection();
    assert_eq!(Array::from(&core.selected_rows()).length(), 0);
}

#[wasm_bindgen_test]
fn test_toolbar_without_grid() {
    let toolbar = ZenGridToolbarCore::new(element("zen-grid-toolbar"));
    assert!(!toolbar.is_paired());
    assert!(!toolbar.search("ada"));
    assert_eq!(toolbar.language(), "en");
}

#[wasm_bindgen_test]
fn test_sibling_elements_pair() {
    let grid = ZenGridCore::new(element("zen-grid"));
    let toolbar = ZenGridToolbarCore::new(element("zen-grid-toolbar"));
    grid.set_property("data", &rows());
    grid.connected_callback();
    toolbar.connected_callback();
    assert!(toolbar.is_paired());
    assert!(toolbar.search("linus"));
    assert_eq!(grid.total_pages(), 1);
}
