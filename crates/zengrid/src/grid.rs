//! Grid state controller.
//!
//! [`Grid`] is the single source of truth for one grid instance. Every
//! mutation fully re-derives the filtered sequence from the raw data before
//! returning, refreshes pagination, emits the matching [`GridEvent`] and
//! hands a fresh [`GridView`] to the installed [`Renderer`].
//!
//! No mutation returns an error. Bad input is logged at `warn` and the
//! previous state is kept.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use zengrid::grid::Grid;
//! use zengrid::model::{Column, PaginationOptions};
//! use zengrid::pipeline::Criteria;
//!
//! let mut grid = Grid::new();
//! grid.set_columns(vec![Column::new("name", "Name"), Column::new("city", "City")]);
//! grid.set_data(vec![
//!     json!({"name": "Ayşe", "city": "Ankara"}),
//!     json!({"name": "Can", "city": "İzmir"}),
//! ]);
//! grid.set_pagination_options(Some(PaginationOptions::with_page_size(1)));
//! assert_eq!(grid.total_pages(), 2);
//!
//! grid.filter(Criteria::search("ankara"));
//! assert_eq!(grid.visible_rows().len(), 1);
//! assert_eq!(grid.total_pages(), 1);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Weak;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{GridError, Result};
use crate::events::{EventBus, GridEvent, ListenerId};
use crate::export::ExportSnapshot;
use crate::i18n::{DEFAULT_LANGUAGE, Localizer, TranslationKey};
use crate::model::{
    Align, Column, DisplayFlags, GridOptions, PaginationOptions, Row, SortDirection, SortOptions,
    ToolbarOptions, kind_of,
};
use crate::pipeline::{self, Collation, Criteria};
use crate::toolbar::{GridPeer, ToolbarNotice, ToolbarPeer};

// =============================================================================
// View model
// =============================================================================

/// One header cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderView {
    pub field: String,
    pub label: String,
    pub sortable: bool,
    /// Direction indicator; `None` unless this column is the sorted one.
    pub sort: SortDirection,
    pub align: Align,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css_class: Option<String>,
}

/// One visible row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowView {
    /// Index within the visible page.
    pub index: usize,
    pub cells: Vec<String>,
    pub selected: bool,
}

/// The pagination bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationView {
    pub current_page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub first_item: usize,
    pub last_item: usize,
    /// Localized summary, e.g. `11-20 of 42`.
    pub info: String,
    /// Page numbers shown as buttons.
    pub pages: Vec<usize>,
    pub show_first_last: bool,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size_options: Option<Vec<usize>>,
}

/// Everything a render collaborator needs to draw the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridView {
    pub headers: Vec<HeaderView>,
    pub rows: Vec<RowView>,
    /// Set when there are no rows to show.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationView>,
    pub flags: DisplayFlags,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css_class: Option<String>,
    pub language: String,
}

/// Draws a [`GridView`]. Called after every mutation.
pub trait Renderer {
    fn render(&self, view: &GridView);
}

impl<F> Renderer for F
where
    F: Fn(&GridView),
{
    fn render(&self, view: &GridView) {
        self(view);
    }
}

// =============================================================================
// Grid
// =============================================================================

/// State controller for one grid instance.
pub struct Grid {
    columns: Vec<Column>,
    data: Vec<Row>,
    filtered: Vec<Row>,
    criteria: Criteria,
    sort: Option<SortOptions>,
    pagination: Option<PaginationOptions>,
    toolbar_options: ToolbarOptions,
    display: DisplayFlags,
    height: Option<String>,
    empty_message: Option<String>,
    css_class: Option<String>,
    row_key: Option<String>,
    selection: Vec<Row>,
    localizer: Localizer,
    collation: Collation,
    events: EventBus,
    renderer: Option<Box<dyn Renderer>>,
    toolbar: Option<Weak<RefCell<dyn ToolbarPeer>>>,
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("columns", &self.columns.len())
            .field("rows", &self.data.len())
            .field("filtered", &self.filtered.len())
            .field("criteria", &self.criteria)
            .field("sort", &self.sort)
            .field("pagination", &self.pagination)
            .field("toolbar_options", &self.toolbar_options)
            .field("selected", &self.selection.len())
            .field("language", &self.localizer.language())
            .field("paired", &self.has_toolbar())
            .finish_non_exhaustive()
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    /// Creates an empty grid with default options in the default language.
    #[must_use]
    pub fn new() -> Self {
        Self::with_localizer(Localizer::new())
    }

    /// Creates an empty grid using `localizer` for its labels.
    #[must_use]
    pub fn with_localizer(localizer: Localizer) -> Self {
        let collation = Collation::for_language(localizer.language());
        let toolbar_options = ToolbarOptions {
            language: localizer.language().to_string(),
            ..ToolbarOptions::default()
        };
        Self {
            columns: Vec::new(),
            data: Vec::new(),
            filtered: Vec::new(),
            criteria: Criteria::new(),
            sort: None,
            pagination: None,
            toolbar_options,
            display: DisplayFlags::default(),
            height: None,
            empty_message: None,
            css_class: None,
            row_key: None,
            selection: Vec::new(),
            localizer,
            collation,
            events: EventBus::new(),
            renderer: None,
            toolbar: None,
        }
    }

    /// Builds a grid from a complete configuration.
    ///
    /// `language` wins over `toolbarOptions.language` unless it is left at
    /// the default.
    #[must_use]
    pub fn from_options(options: GridOptions) -> Self {
        let requested = if options.language == DEFAULT_LANGUAGE {
            &options.toolbar_options.language
        } else {
            &options.language
        };
        let localizer = Localizer::new().with_language(requested);
        let mut grid = Self::with_localizer(localizer);

        let mut toolbar_options = options.toolbar_options;
        toolbar_options.language = grid.localizer.language().to_string();

        grid.columns = options.columns;
        grid.data = options.data.into_iter().map(Arc::new).collect();
        grid.sort = options.sort_options;
        grid.pagination = options.pagination_options.map(PaginationOptions::normalized);
        grid.toolbar_options = toolbar_options;
        grid.display = options.display;
        grid.height = options.height;
        grid.empty_message = options.empty_message;
        grid.css_class = options.css_class;
        grid.row_key = options.row_key;
        grid.rederive();
        grid
    }

    /// Installs the render collaborator and draws once.
    pub fn set_renderer(&mut self, renderer: impl Renderer + 'static) {
        self.renderer = Some(Box::new(renderer));
        self.render();
    }

    /// Registers an event listener.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&GridEvent) + 'static,
    {
        self.events.subscribe(listener)
    }

    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // -------------------------------------------------------------------------
    // Columns and data
    // -------------------------------------------------------------------------

    /// Replaces the columns. Filter, sort and selection are kept.
    pub fn set_columns(&mut self, columns: Vec<Column>) {
        debug!(grid.columns = columns.len(), "Columns replaced");
        self.columns = columns;
        self.render();
    }

    /// Replaces the raw data with fresh row handles.
    pub fn set_data(&mut self, rows: Vec<Value>) {
        self.set_rows(rows.into_iter().map(Arc::new).collect());
    }

    /// Replaces the raw data, keeping the given handles.
    ///
    /// Clears the criteria and the selection. The current page is kept and
    /// clamped; only the item count is refreshed.
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        debug!(grid.rows = rows.len(), "Data replaced");
        self.data = rows;
        self.criteria = Criteria::new();
        self.selection.clear();
        self.rederive();
        self.render();
    }

    // -------------------------------------------------------------------------
    // Filter, sort, paginate
    // -------------------------------------------------------------------------

    /// Re-derives the filtered rows from the raw data with `criteria`.
    ///
    /// Resets to page 1 and emits `filtered`.
    pub fn filter(&mut self, criteria: Criteria) {
        self.criteria = criteria;
        self.rederive();
        if let Some(pagination) = &mut self.pagination {
            pagination.current_page = 1;
        }
        let result_count = self.filtered.len();
        debug!(
            grid.rows = self.data.len(),
            grid.matched = result_count,
            "Filter applied"
        );
        self.events.emit(&GridEvent::Filtered {
            criteria: self.criteria.clone(),
            result_count,
        });
        self.render();
    }

    /// Filters with a JSON payload: a search string, an object or `null`.
    pub fn filter_value(&mut self, criteria: &Value) {
        match Criteria::from_value(criteria) {
            Ok(criteria) => self.filter(criteria),
            Err(err) => warn!(error = %err, "Filter ignored"),
        }
    }

    /// Shorthand for a criteria holding only `term`.
    pub fn search(&mut self, term: &str) {
        self.filter(Criteria::search(term));
    }

    /// Replaces the sort options and re-derives the filtered rows.
    ///
    /// Does not toggle and does not emit; see [`click_header`](Self::click_header).
    pub fn set_sort_options(&mut self, options: Option<SortOptions>) {
        self.sort = options;
        self.rederive();
        self.render();
    }

    /// Header click on `field`: ascending first, then flipping.
    ///
    /// Ignored for unknown and non-sortable columns. Emits `sortChange`.
    pub fn click_header(&mut self, field: &str) {
        let sortable = self
            .columns
            .iter()
            .find(|column| column.field == field)
            .is_some_and(|column| column.sortable);
        if !sortable {
            debug!(grid.field = %field, "Header click ignored");
            return;
        }

        let options = SortOptions::after_header_click(self.sort.as_ref(), field);
        debug!(sort.field = %field, sort.direction = ?options.direction, "Header clicked");
        self.sort = Some(options.clone());
        self.rederive();
        self.events.emit(&GridEvent::SortChange(options));
        self.render();
    }

    /// Replaces pagination wholesale, or removes it with `None`.
    pub fn set_pagination_options(&mut self, options: Option<PaginationOptions>) {
        self.pagination = options.map(PaginationOptions::normalized);
        self.refresh_pagination();
        self.render();
    }

    /// Goes to page `page`. Pages outside `[1, total_pages]` are ignored.
    pub fn set_page(&mut self, page: usize) {
        let total = self.total_pages();
        let Some(pagination) = &mut self.pagination else {
            debug!(grid.page = page, "No pagination, page change ignored");
            return;
        };
        if page < 1 || page > total {
            debug!(grid.page = page, grid.total_pages = total, "Page out of range");
            return;
        }
        pagination.current_page = page;
        self.events.emit(&GridEvent::PageChange(page));
        self.render();
    }

    /// Changes the page size from the page-size control and returns to page 1.
    pub fn set_page_size(&mut self, page_size: usize) {
        let Some(pagination) = &mut self.pagination else {
            debug!("No pagination, page size change ignored");
            return;
        };
        pagination.page_size = page_size.max(1);
        pagination.current_page = 1;
        self.events.emit(&GridEvent::PageChange(1));
        self.render();
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    /// Toggles `row` in the selection and emits `selectionChange`.
    ///
    /// In single-select mode, selecting a new row first clears the others.
    pub fn select_row(&mut self, row: &Row) {
        if let Some(position) = self.selection.iter().position(|s| self.same_row(s, row)) {
            self.selection.remove(position);
        } else {
            if !self.display.multi_selectable {
                self.selection.clear();
            }
            self.selection.push(Row::clone(row));
        }
        debug!(grid.selected = self.selection.len(), "Selection changed");
        self.events
            .emit(&GridEvent::SelectionChange(self.selection.clone()));
        self.render();
    }

    /// Row click at `index` within the visible page. Requires `selectable`.
    pub fn click_row(&mut self, index: usize) {
        if !self.display.selectable {
            return;
        }
        match self.visible_rows().get(index) {
            Some(row) => {
                let row = Row::clone(row);
                self.select_row(&row);
            }
            None => debug!(grid.index = index, "Row click outside the visible page"),
        }
    }

    /// Empties the selection and emits `selectionChange`.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.events.emit(&GridEvent::SelectionChange(Vec::new()));
        self.render();
    }

    /// Snapshot of the selected rows.
    #[must_use]
    pub fn selected_rows(&self) -> Vec<Row> {
        self.selection.clone()
    }

    #[must_use]
    pub fn is_selected(&self, row: &Row) -> bool {
        self.selection.iter().any(|s| self.same_row(s, row))
    }

    /// Field used for selection identity; `None` means handle identity.
    pub fn set_row_key(&mut self, key: Option<String>) {
        self.row_key = key;
    }

    fn same_row(&self, a: &Row, b: &Row) -> bool {
        match &self.row_key {
            Some(key) => {
                let left = pipeline::lookup(a, key);
                !left.is_null() && left == pipeline::lookup(b, key)
            }
            None => Arc::ptr_eq(a, b),
        }
    }

    // -------------------------------------------------------------------------
    // Toolbar options and language
    // -------------------------------------------------------------------------

    /// Merges `options` into the toolbar options.
    ///
    /// Accepts an object or a JSON-encoded string. The merged options are
    /// emitted as `toolbarOptionsChange` and pushed to the paired toolbar.
    /// A new language is then applied to the grid through
    /// [`set_language`](Self::set_language), so grid and toolbar never
    /// disagree.
    pub fn set_toolbar_options(&mut self, options: &Value) {
        if let Err(err) = self.try_set_toolbar_options(options) {
            warn!(error = %err, "Toolbar options ignored");
        }
    }

    pub(crate) fn try_set_toolbar_options(&mut self, options: &Value) -> Result<()> {
        let merged = self.merge_toolbar_options(options)?;
        debug!(?merged, "Toolbar options merged");
        self.toolbar_options = merged.clone();
        self.events
            .emit(&GridEvent::ToolbarOptionsChange(merged.clone()));
        let language = merged.language.clone();
        self.notify_toolbar(&ToolbarNotice::OptionsChanged(merged));
        if language == self.localizer.language() {
            self.render();
        } else {
            self.set_language(&language);
        }
        Ok(())
    }

    fn merge_toolbar_options(&self, options: &Value) -> Result<ToolbarOptions> {
        let parsed;
        let patch = match options {
            Value::String(text) => {
                parsed = serde_json::from_str::<Value>(text)
                    .map_err(|e| GridError::malformed_json("toolbarOptions", e.to_string()))?;
                &parsed
            }
            other => other,
        };
        if !patch.is_object() {
            return Err(GridError::invalid_shape(
                "toolbarOptions",
                format!("expected an object, got {}", kind_of(patch)),
            ));
        }
        let mut merged = self.toolbar_options.merged(patch)?;
        merged.language = self.localizer.resolve_or_default(&merged.language);
        Ok(merged)
    }

    /// Switches the grid's language. Unsupported codes fall back to the default.
    ///
    /// Labels are re-translated, strings re-collated, `languageChange` is
    /// emitted and the paired toolbar follows.
    pub fn set_language(&mut self, code: &str) {
        let from = self.localizer.language().to_string();
        let language = self.localizer.set_language(code).to_string();
        info!(grid.from = %from, grid.to = %language, "Language switched");

        self.collation = Collation::for_language(&language);
        self.toolbar_options.language = language.clone();
        self.rederive();
        self.events.emit(&GridEvent::LanguageChange {
            language: language.clone(),
        });
        self.notify_toolbar(&ToolbarNotice::LanguageChanged(language));
        self.render();
    }

    // -------------------------------------------------------------------------
    // Display flags
    // -------------------------------------------------------------------------

    pub fn set_height(&mut self, height: Option<String>) {
        self.height = height.filter(|h| !h.trim().is_empty());
        self.render();
    }

    pub fn set_striped(&mut self, striped: bool) {
        self.display.striped = striped;
        self.render();
    }

    pub fn set_bordered(&mut self, bordered: bool) {
        self.display.bordered = bordered;
        self.render();
    }

    pub fn set_responsive(&mut self, responsive: bool) {
        self.display.responsive = responsive;
        self.render();
    }

    pub fn set_show_header(&mut self, show_header: bool) {
        self.display.show_header = show_header;
        self.render();
    }

    /// Enables row clicks. Turning selection off clears it.
    pub fn set_selectable(&mut self, selectable: bool) {
        self.display.selectable = selectable;
        if !selectable && !self.selection.is_empty() {
            self.clear_selection();
        } else {
            self.render();
        }
    }

    pub fn set_multi_selectable(&mut self, multi_selectable: bool) {
        self.display.multi_selectable = multi_selectable;
        self.render();
    }

    /// Overrides the translated empty-state message.
    pub fn set_empty_message(&mut self, message: Option<String>) {
        self.empty_message = message;
        self.render();
    }

    pub fn set_css_class(&mut self, class: Option<String>) {
        self.css_class = class;
        self.render();
    }

    // -------------------------------------------------------------------------
    // Read access
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Raw data in insertion order.
    #[must_use]
    pub fn data(&self) -> &[Row] {
        &self.data
    }

    /// Filtered and sorted rows, before pagination.
    #[must_use]
    pub fn filtered_rows(&self) -> &[Row] {
        &self.filtered
    }

    /// Rows of the current page, or every filtered row without pagination.
    #[must_use]
    pub fn visible_rows(&self) -> Vec<Row> {
        match &self.pagination {
            Some(p) => pipeline::paginate(&self.filtered, p.current_page, p.page_size),
            None => self.filtered.clone(),
        }
    }

    #[must_use]
    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    #[must_use]
    pub fn sort_options(&self) -> Option<&SortOptions> {
        self.sort.as_ref()
    }

    #[must_use]
    pub fn pagination_options(&self) -> Option<&PaginationOptions> {
        self.pagination.as_ref()
    }

    /// 1-based current page; 1 without pagination.
    #[must_use]
    pub fn current_page(&self) -> usize {
        self.pagination.as_ref().map_or(1, |p| p.current_page)
    }

    /// Number of pages, at least 1.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.pagination
            .as_ref()
            .map_or(1, |p| p.total_pages().max(1))
    }

    #[must_use]
    pub fn toolbar_options(&self) -> &ToolbarOptions {
        &self.toolbar_options
    }

    #[must_use]
    pub fn language(&self) -> &str {
        self.localizer.language()
    }

    #[must_use]
    pub fn localizer(&self) -> &Localizer {
        &self.localizer
    }

    #[must_use]
    pub fn display(&self) -> DisplayFlags {
        self.display
    }

    #[must_use]
    pub fn height(&self) -> Option<&str> {
        self.height.as_deref()
    }

    #[must_use]
    pub fn row_key(&self) -> Option<&str> {
        self.row_key.as_deref()
    }

    /// Returns true while a toolbar is paired and alive.
    #[must_use]
    pub fn has_toolbar(&self) -> bool {
        self.toolbar
            .as_ref()
            .is_some_and(|toolbar| toolbar.strong_count() > 0)
    }

    /// Raw data and columns for the export encoders.
    #[must_use]
    pub fn export_snapshot(&self) -> ExportSnapshot {
        ExportSnapshot {
            columns: self.columns.clone(),
            rows: self.data.clone(),
        }
    }

    // -------------------------------------------------------------------------
    // Views
    // -------------------------------------------------------------------------

    /// Builds the render snapshot.
    #[must_use]
    pub fn view(&self) -> GridView {
        let active_sort = self.sort.as_ref().filter(|s| s.is_active());
        let headers = self
            .columns
            .iter()
            .map(|column| HeaderView {
                field: column.field.clone(),
                label: column.header_text().to_string(),
                sortable: column.sortable,
                sort: active_sort
                    .filter(|s| s.field == column.field)
                    .map_or(SortDirection::None, |s| s.direction),
                align: column.align,
                width: column.width.clone(),
                css_class: column.css_class.clone(),
            })
            .collect();

        let rows: Vec<RowView> = self
            .visible_rows()
            .iter()
            .enumerate()
            .map(|(index, row)| RowView {
                index,
                cells: self
                    .columns
                    .iter()
                    .map(|column| cell_text(column, row, index))
                    .collect(),
                selected: self.is_selected(row),
            })
            .collect();

        let empty_message = rows.is_empty().then(|| {
            self.empty_message
                .clone()
                .unwrap_or_else(|| self.localizer.translate(TranslationKey::NoData, &[]))
        });

        GridView {
            headers,
            rows,
            empty_message,
            pagination: self.pagination_view(),
            flags: self.display,
            height: self.height.clone(),
            css_class: self.css_class.clone(),
            language: self.localizer.language().to_string(),
        }
    }

    /// Builds the pagination bar, absent when there is at most one page.
    #[must_use]
    pub fn pagination_view(&self) -> Option<PaginationView> {
        let pagination = self.pagination.as_ref()?;
        let total_pages = pagination.total_pages();
        if total_pages <= 1 {
            return None;
        }
        let info = self.localizer.translate(
            TranslationKey::PageInfo,
            &[
                ("start", pagination.first_item().to_string()),
                ("end", pagination.last_item().to_string()),
                ("total", pagination.total_items.to_string()),
            ],
        );
        Some(PaginationView {
            current_page: pagination.current_page,
            total_pages,
            page_size: pagination.page_size,
            total_items: pagination.total_items,
            first_item: pagination.first_item(),
            last_item: pagination.last_item(),
            info,
            pages: pagination.page_window().collect(),
            show_first_last: pagination.show_first_last_buttons,
            can_go_back: pagination.current_page > 1,
            can_go_forward: pagination.current_page < total_pages,
            page_size_options: pagination
                .show_page_size_options
                .then(|| pagination.page_size_options.clone()),
        })
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn rederive(&mut self) {
        self.filtered = pipeline::derive(
            &self.data,
            &self.criteria,
            self.sort.as_ref(),
            &self.collation,
        );
        self.refresh_pagination();
    }

    fn refresh_pagination(&mut self) {
        let total_items = self.filtered.len();
        if let Some(pagination) = &mut self.pagination {
            pagination.total_items = total_items;
            pagination.clamp_page();
        }
    }

    fn render(&self) {
        let Some(renderer) = &self.renderer else {
            return;
        };
        let result = catch_unwind(AssertUnwindSafe(|| renderer.render(&self.view())));
        if result.is_err() {
            warn!(grid.rows = self.filtered.len(), "Renderer panicked");
        }
    }

    fn notify_toolbar(&self, notice: &ToolbarNotice) {
        let Some(toolbar) = &self.toolbar else {
            return;
        };
        let Some(toolbar) = toolbar.upgrade() else {
            warn!(
                error = %GridError::PeerUnavailable("toolbar".into()),
                "Paired toolbar is gone, continuing without it"
            );
            return;
        };
        match toolbar.try_borrow_mut() {
            Ok(mut toolbar) => toolbar.receive(notice),
            Err(_) => warn!(?notice, "Toolbar busy, notice dropped"),
        };
    }
}

fn cell_text(column: &Column, row: &Value, index: usize) -> String {
    if let Some(renderer) = &column.cell_renderer {
        let rendered = renderer(row, index);
        if !rendered.is_empty() {
            return rendered;
        }
    }
    pipeline::display_string(pipeline::lookup(row, &column.field))
}

impl GridPeer for Grid {
    fn deliver_search(&mut self, term: &str) {
        self.search(term);
    }

    fn export_snapshot(&self) -> ExportSnapshot {
        Self::export_snapshot(self)
    }

    fn toolbar_options(&self) -> ToolbarOptions {
        self.toolbar_options.clone()
    }

    fn attach_toolbar(&mut self, toolbar: Weak<RefCell<dyn ToolbarPeer>>) {
        info!(grid.rows = self.data.len(), "Toolbar attached");
        self.toolbar = Some(toolbar);
    }
}
