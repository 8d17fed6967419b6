//! # zengrid-wasm
//!
//! Browser bindings for the zengrid engine, compiled to WebAssembly.
//!
//! The crate exports one core per custom element. A thin JavaScript class
//! defines the element and forwards lifecycle callbacks to its core; the
//! cores own the grid state, the attribute bridge, toolbar discovery and
//! DOM event re-emission.
//!
//! ## Quick Start (JavaScript)
//!
//! ```javascript
//! import init, { ZenGridCore, ZenGridToolbarCore } from 'zengrid-wasm';
//!
//! await init();
//!
//! customElements.define("zen-grid", class extends HTMLElement {
//!     static get observedAttributes() { return ZenGridCore.observedAttributes(); }
//!     constructor() { super(); this.core = new ZenGridCore(this); }
//!     connectedCallback() {
//!         this.core.setRenderer(view => this.draw(view));
//!         this.core.connectedCallback();
//!     }
//!     disconnectedCallback() { this.core.disconnectedCallback(); }
//!     attributeChangedCallback(name, old, value) {
//!         this.core.attributeChangedCallback(name, old, value);
//!     }
//!     set data(rows) { this.core.setProperty("data", rows); }
//! });
//! ```
//!
//! ## Available APIs
//!
//! - `ZenGridCore` - grid state, attribute bridge, events
//! - `ZenGridToolbarCore` - toolbar state, search and export
//! - `version()` - package version

#![forbid(unsafe_code)]

mod dom;
mod grid;
mod registry;
mod toolbar;

use wasm_bindgen::prelude::*;

pub use grid::ZenGridCore;
pub use toolbar::ZenGridToolbarCore;

/// Installs the panic hook when the module loads.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Module version information.
#[must_use]
#[wasm_bindgen(js_name = "version")]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Element tag names the cores expect.
#[must_use]
#[wasm_bindgen(js_name = "tagNames")]
pub fn tag_names() -> Vec<String> {
    vec![
        zengrid::toolbar::GRID_TAG.to_string(),
        zengrid::toolbar::TOOLBAR_TAG.to_string(),
    ]
}
