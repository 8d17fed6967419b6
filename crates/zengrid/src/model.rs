//! Configuration model: columns, sort, pagination and toolbar options.
//!
//! Every type here deserializes from the camelCase JSON that host pages write
//! into attributes, with per-field defaults so partial payloads are accepted.

use std::cmp::Ordering;
use std::fmt;
use std::ops::RangeInclusive;
use std::rc::Rc;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GridError, Result};
use crate::i18n::DEFAULT_LANGUAGE;

/// One record of grid data.
///
/// Rows are shared handles; cloning a `Row` never copies the record, so
/// handle identity is preserved through filtering, sorting and paging.
pub type Row = Arc<Value>;

/// Custom cell formatter, called with the row and its index in the visible page.
pub type CellRenderer = Rc<dyn Fn(&Value, usize) -> String>;

/// Custom row comparator used in place of the default field comparison.
pub type Comparator = Rc<dyn Fn(&Value, &Value) -> Ordering>;

const fn default_true() -> bool {
    true
}

// =============================================================================
// Column
// =============================================================================

/// Horizontal alignment of a column's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Display and behavior descriptor bound to one row field.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Dot path of the field this column reads.
    pub field: String,
    /// Header label. Empty headers display the field name.
    #[serde(default)]
    pub header: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(default = "default_true")]
    pub sortable: bool,
    #[serde(default)]
    pub filterable: bool,
    #[serde(default)]
    pub align: Align,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_class: Option<String>,
    /// Host-supplied formatter. Never serialized.
    #[serde(skip)]
    pub cell_renderer: Option<CellRenderer>,
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("field", &self.field)
            .field("header", &self.header)
            .field("width", &self.width)
            .field("sortable", &self.sortable)
            .field("filterable", &self.filterable)
            .field("align", &self.align)
            .field("css_class", &self.css_class)
            .field("cell_renderer", &self.cell_renderer.is_some())
            .finish()
    }
}

impl Column {
    /// Creates a sortable, left-aligned column.
    #[must_use]
    pub fn new(field: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            header: header.into(),
            width: None,
            sortable: true,
            filterable: false,
            align: Align::Left,
            css_class: None,
            cell_renderer: None,
        }
    }

    #[must_use]
    pub fn width(mut self, width: impl Into<String>) -> Self {
        self.width = Some(width.into());
        self
    }

    #[must_use]
    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    #[must_use]
    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    #[must_use]
    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    #[must_use]
    pub fn css_class(mut self, class: impl Into<String>) -> Self {
        self.css_class = Some(class.into());
        self
    }

    /// Sets a custom cell formatter.
    #[must_use]
    pub fn cell_renderer(mut self, renderer: impl Fn(&Value, usize) -> String + 'static) -> Self {
        self.cell_renderer = Some(Rc::new(renderer));
        self
    }

    /// Returns the label shown in the header cell.
    #[must_use]
    pub fn header_text(&self) -> &str {
        if self.header.is_empty() {
            &self.field
        } else {
            &self.header
        }
    }
}

// =============================================================================
// Sorting
// =============================================================================

/// Sort direction. `None` means no active sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
    #[default]
    None,
}

impl SortDirection {
    /// Flips asc and desc. `None` becomes `Asc`.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc | Self::None => Self::Asc,
        }
    }
}

/// Requested ordering of the filtered rows.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortOptions {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
    /// Compares whole rows. In descending order the operands are swapped
    /// rather than the result negated.
    #[serde(skip)]
    pub comparator: Option<Comparator>,
}

impl fmt::Debug for SortOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortOptions")
            .field("field", &self.field)
            .field("direction", &self.direction)
            .field("comparator", &self.comparator.is_some())
            .finish()
    }
}

impl PartialEq for SortOptions {
    fn eq(&self, other: &Self) -> bool {
        let same_comparator = match (&self.comparator, &other.comparator) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        self.field == other.field && self.direction == other.direction && same_comparator
    }
}

impl SortOptions {
    /// Creates options sorting `field` in `direction`.
    #[must_use]
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
            comparator: None,
        }
    }

    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    /// Sets a custom row comparator.
    #[must_use]
    pub fn comparator(mut self, cmp: impl Fn(&Value, &Value) -> Ordering + 'static) -> Self {
        self.comparator = Some(Rc::new(cmp));
        self
    }

    /// Returns true if these options reorder rows at all.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.direction != SortDirection::None && !self.field.is_empty()
    }

    /// Options after a header click on `field`.
    ///
    /// The same field flips direction and keeps its comparator; any other
    /// field starts ascending.
    #[must_use]
    pub fn after_header_click(current: Option<&Self>, field: &str) -> Self {
        match current {
            Some(current) if current.field == field => Self {
                field: field.to_string(),
                direction: current.direction.toggled(),
                comparator: current.comparator.clone(),
            },
            _ => Self::asc(field),
        }
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Paging state and the controls the pagination bar shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaginationOptions {
    /// 1-based page number.
    pub current_page: usize,
    pub page_size: usize,
    /// Maintained by the grid from the filtered row count.
    pub total_items: usize,
    pub max_page_buttons: usize,
    pub show_first_last_buttons: bool,
    pub show_page_size_options: bool,
    pub page_size_options: Vec<usize>,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            current_page: 1,
            page_size: 10,
            total_items: 0,
            max_page_buttons: 5,
            show_first_last_buttons: true,
            show_page_size_options: true,
            page_size_options: vec![5, 10, 25, 50, 100],
        }
    }
}

impl PaginationOptions {
    /// Creates default options with the given page size.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    /// Raises zero counts to their minimum of one.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.current_page = self.current_page.max(1);
        self.page_size = self.page_size.max(1);
        self.max_page_buttons = self.max_page_buttons.max(1);
        self
    }

    /// Number of pages needed for `total_items`. Zero when there are no items.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.page_size.max(1))
    }

    /// Clamps `current_page` into `[1, total_pages]`.
    pub fn clamp_page(&mut self) {
        let last = self.total_pages().max(1);
        self.current_page = self.current_page.clamp(1, last);
    }

    /// 1-based index of the first item on the current page, or 0 when empty.
    #[must_use]
    pub fn first_item(&self) -> usize {
        if self.total_items == 0 {
            0
        } else {
            self.current_page
                .saturating_sub(1)
                .saturating_mul(self.page_size)
                .saturating_add(1)
                .min(self.total_items)
        }
    }

    /// 1-based index of the last item on the current page, or 0 when empty.
    #[must_use]
    pub fn last_item(&self) -> usize {
        self.current_page
            .saturating_mul(self.page_size)
            .min(self.total_items)
    }

    /// Page numbers shown as buttons.
    ///
    /// At most `max_page_buttons` pages, centred on the current page and
    /// shifted to stay inside `[1, total_pages]`.
    #[must_use]
    pub fn page_window(&self) -> RangeInclusive<usize> {
        let total = self.total_pages().max(1);
        let max = self.max_page_buttons.clamp(1, total);
        let current = self.current_page.clamp(1, total);
        let start = current
            .saturating_sub(max / 2)
            .clamp(1, total - max + 1);
        start..=start + (max - 1)
    }
}

// =============================================================================
// Toolbar
// =============================================================================

/// Toolbar feature flags and language, shared between a grid and its toolbar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolbarOptions {
    pub visible: bool,
    pub search: bool,
    pub export: bool,
    pub language: String,
}

impl Default for ToolbarOptions {
    fn default() -> Self {
        Self {
            visible: true,
            search: true,
            export: true,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl ToolbarOptions {
    /// Overlays the keys of a JSON object onto these options.
    ///
    /// Keys absent from `patch` keep their current value; unknown keys are
    /// ignored.
    pub fn merged(&self, patch: &Value) -> Result<Self> {
        let Value::Object(patch) = patch else {
            return Err(GridError::invalid_shape(
                "toolbarOptions",
                format!("expected an object, got {}", kind_of(patch)),
            ));
        };
        let mut base = serde_json::to_value(self)
            .map_err(|e| GridError::invalid_shape("toolbarOptions", e.to_string()))?;
        if let Value::Object(base) = &mut base {
            for (key, value) in patch {
                base.insert(key.clone(), value.clone());
            }
        }
        serde_json::from_value(base)
            .map_err(|e| GridError::invalid_shape("toolbarOptions", e.to_string()))
    }
}

// =============================================================================
// Grid options
// =============================================================================

/// Boolean display switches of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplayFlags {
    pub striped: bool,
    pub bordered: bool,
    pub responsive: bool,
    pub show_header: bool,
    pub selectable: bool,
    pub multi_selectable: bool,
}

impl Default for DisplayFlags {
    fn default() -> Self {
        Self {
            striped: true,
            bordered: true,
            responsive: true,
            show_header: true,
            selectable: false,
            multi_selectable: false,
        }
    }
}

/// Complete initial configuration of a grid.
///
/// ```rust
/// use zengrid::model::GridOptions;
///
/// let options = GridOptions::from_json(
///     r#"{"columns": [{"field": "name", "header": "Name"}], "selectable": true}"#,
/// ).unwrap();
/// assert!(options.display.selectable);
/// assert!(options.display.striped);
/// assert!(options.columns[0].sortable);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridOptions {
    pub columns: Vec<Column>,
    pub data: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_options: Option<SortOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination_options: Option<PaginationOptions>,
    pub toolbar_options: ToolbarOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(flatten)]
    pub display: DisplayFlags,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css_class: Option<String>,
    pub language: String,
    /// Field whose value identifies a row for selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_key: Option<String>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            data: Vec::new(),
            sort_options: None,
            pagination_options: None,
            toolbar_options: ToolbarOptions::default(),
            height: None,
            display: DisplayFlags::default(),
            empty_message: None,
            css_class: None,
            language: DEFAULT_LANGUAGE.to_string(),
            row_key: None,
        }
    }
}

impl GridOptions {
    /// Parses options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GridError::malformed_json("options", e.to_string()))
    }
}

/// Short name of a JSON value's type, for diagnostics.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn column_defaults_from_json() {
        let column: Column = serde_json::from_value(json!({"field": "age"})).unwrap();
        assert!(column.sortable);
        assert!(!column.filterable);
        assert_eq!(column.align, Align::Left);
        assert_eq!(column.header_text(), "age");
    }

    #[test]
    fn sort_direction_parses_lowercase() {
        let sort: SortOptions =
            serde_json::from_value(json!({"field": "name", "direction": "desc"})).unwrap();
        assert_eq!(sort, SortOptions::desc("name"));
        assert!(sort.is_active());
        assert!(!SortOptions::new("name", SortDirection::None).is_active());
        assert!(!SortOptions::asc("").is_active());
    }

    #[test]
    fn header_click_toggles_same_field() {
        let first = SortOptions::after_header_click(None, "age");
        assert_eq!(first, SortOptions::asc("age"));
        let second = SortOptions::after_header_click(Some(&first), "age");
        assert_eq!(second, SortOptions::desc("age"));
        let other = SortOptions::after_header_click(Some(&second), "name");
        assert_eq!(other, SortOptions::asc("name"));
    }

    #[test]
    fn pagination_defaults() {
        let options: PaginationOptions = serde_json::from_value(json!({"pageSize": 3})).unwrap();
        assert_eq!(options.current_page, 1);
        assert_eq!(options.page_size, 3);
        assert_eq!(options.max_page_buttons, 5);
        assert_eq!(options.page_size_options, vec![5, 10, 25, 50, 100]);
    }

    #[test]
    fn pagination_clamps_into_range() {
        let mut options = PaginationOptions {
            current_page: 9,
            total_items: 10,
            ..PaginationOptions::with_page_size(3)
        };
        options.clamp_page();
        assert_eq!(options.current_page, 4);
        assert_eq!(options.first_item(), 10);
        assert_eq!(options.last_item(), 10);

        options.total_items = 0;
        options.clamp_page();
        assert_eq!(options.current_page, 1);
        assert_eq!(options.first_item(), 0);
    }

    #[test]
    fn page_window_shifts_at_edges() {
        let mut options = PaginationOptions {
            total_items: 100,
            ..PaginationOptions::with_page_size(10)
        };
        assert_eq!(options.page_window(), 1..=5);
        options.current_page = 6;
        assert_eq!(options.page_window(), 4..=8);
        options.current_page = 10;
        assert_eq!(options.page_window(), 6..=10);
        options.total_items = 20;
        options.current_page = 2;
        assert_eq!(options.page_window(), 1..=2);
    }

    #[test]
    fn huge_counts_do_not_overflow() {
        let mut options = PaginationOptions {
            total_items: 95,
            max_page_buttons: usize::MAX,
            ..PaginationOptions::with_page_size(10)
        };
        assert_eq!(options.page_window(), 1..=10);
        options.current_page = usize::MAX;
        assert_eq!(options.page_window(), 1..=10);

        options.page_size = usize::MAX;
        options.current_page = 3;
        assert_eq!(options.first_item(), 95);
        assert_eq!(options.last_item(), 95);
        assert_eq!(options.page_window(), 1..=1);
    }

    #[test]
    fn toolbar_merge_keeps_other_keys() {
        let merged = ToolbarOptions::default()
            .merged(&json!({"search": false}))
            .unwrap();
        assert_eq!(
            merged,
            ToolbarOptions {
                search: false,
                ..ToolbarOptions::default()
            }
        );
    }

    #[test]
    fn toolbar_merge_rejects_wrong_shapes() {
        let defaults = ToolbarOptions::default();
        assert!(defaults.merged(&json!([1, 2])).is_err());
        assert!(defaults.merged(&json!({"visible": "yes"})).is_err());
    }

    #[test]
    fn grid_options_flatten_display_flags() {
        let options =
            GridOptions::from_json(r#"{"striped": false, "rowKey": "id", "language": "tr"}"#)
                .unwrap();
        assert!(!options.display.striped);
        assert!(options.display.bordered);
        assert_eq!(options.row_key.as_deref(), Some("id"));
        assert_eq!(options.language, "tr");
        assert!(GridOptions::from_json("{").is_err());
    }
}
