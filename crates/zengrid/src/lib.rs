#![forbid(unsafe_code)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # ZenGrid
//!
//! The state engine behind the `<zen-grid>` data-grid element.
//!
//! A [`Grid`](grid::Grid) owns a raw row collection and derives the visible
//! page from it in three stages: filter, then sort, then paginate. Everything
//! around it turns the outside world into calls on the grid:
//!
//! - **model** - columns, sort, pagination, toolbar and display options
//! - **pipeline** - criteria matching, nested lookup, ordering, paging
//! - **grid** - the controller: state, selection, events, view snapshots
//! - **bridge** - attribute and property writes from HTML and frameworks
//! - **toolbar** - the companion toolbar, its discovery and pairing
//! - **i18n** - translation tables and language fallback
//! - **export** - the snapshot handed to host-side file encoders
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use zengrid::prelude::*;
//!
//! let mut grid = Grid::new();
//! grid.set_columns(vec![Column::new("name", "Name"), Column::new("age", "Age")]);
//! grid.set_data(vec![
//!     json!({"name": "Ada", "age": 36}),
//!     json!({"name": "Grace", "age": 45}),
//!     json!({"name": "Linus", "age": 28}),
//! ]);
//! grid.set_pagination_options(Some(PaginationOptions::with_page_size(2)));
//! grid.click_header("age");
//!
//! let names: Vec<_> = grid
//!     .visible_rows()
//!     .iter()
//!     .map(|row| row["name"].clone())
//!     .collect();
//! assert_eq!(names, vec![json!("Linus"), json!("Ada")]);
//! assert_eq!(grid.total_pages(), 2);
//! ```

pub mod bridge;
pub mod error;
pub mod events;
pub mod export;
pub mod grid;
pub mod i18n;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod schedule;
pub mod toolbar;

pub use error::{GridError, Result};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bridge::{Bridge, BridgeOutcome, Property, event_names, observed_attributes};
    pub use crate::error::{GridError, Result};
    pub use crate::events::{EventBus, GridEvent, ListenerId};
    pub use crate::export::{ExportEncoder, ExportFormat, ExportSnapshot};
    pub use crate::grid::{Grid, GridView, PaginationView, Renderer};
    pub use crate::i18n::{DEFAULT_LANGUAGE, Localizer, TranslationKey};
    pub use crate::model::{
        Align, Column, DisplayFlags, GridOptions, PaginationOptions, Row, SortDirection,
        SortOptions, ToolbarOptions,
    };
    pub use crate::pipeline::{Collation, Criteria, Criterion};
    pub use crate::schedule::{ManualScheduler, Scheduler};
    pub use crate::toolbar::{
        Discovery, ElementTree, GridPeer, PairingState, Toolbar, ToolbarPeer, pair,
    };
}
