//! Attribute and property bridge.
//!
//! Hosts write to a grid in three idioms:
//!
//! - plain HTML attributes: kebab-case names, string values, JSON for objects
//!   (`pagination-options="{&quot;pageSize&quot;: 5}"`);
//! - direct property assignment: camelCase names, structured values
//!   (`grid.paginationOptions = {...}`);
//! - framework-decorated attribute names: `[data]`, `:columns`,
//!   `v-bind:height`, `v-model:data`, always JSON-encoded.
//!
//! [`Bridge`] strips the decoration, resolves the canonical [`Property`],
//! decodes the value and calls the matching [`Grid`] setter. It is the only
//! translation layer; the grid itself never sees attribute names.
//!
//! ```rust
//! use zengrid::bridge::{Bridge, BridgeOutcome, Property};
//! use zengrid::grid::Grid;
//!
//! let bridge = Bridge::new();
//! let mut grid = Grid::new();
//!
//! let outcome = bridge.attribute_changed(
//!     &mut grid,
//!     ":pagination-options",
//!     None,
//!     Some(r#"{"pageSize": 5}"#),
//! );
//! assert_eq!(outcome, BridgeOutcome::Applied(Property::PaginationOptions));
//! assert_eq!(grid.pagination_options().map(|p| p.page_size), Some(5));
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{GridError, Result};
use crate::grid::Grid;
use crate::i18n::DEFAULT_LANGUAGE;
use crate::model::{Column, PaginationOptions, SortOptions, kind_of};
use crate::pipeline::display_string;

// =============================================================================
// Properties
// =============================================================================

/// How a property's string form is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// Arrays and objects, JSON-encoded in attributes.
    Json,
    /// Free text.
    Text,
    /// Boolean attribute: present means true.
    Flag,
}

/// Every engine property the bridge can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Data,
    Columns,
    PaginationOptions,
    SortOptions,
    ToolbarOptions,
    Height,
    Striped,
    Bordered,
    Responsive,
    Language,
    Selectable,
    MultiSelectable,
    RowKey,
    EmptyMessage,
}

impl Property {
    pub const ALL: [Self; 14] = [
        Self::Data,
        Self::Columns,
        Self::PaginationOptions,
        Self::SortOptions,
        Self::ToolbarOptions,
        Self::Height,
        Self::Striped,
        Self::Bordered,
        Self::Responsive,
        Self::Language,
        Self::Selectable,
        Self::MultiSelectable,
        Self::RowKey,
        Self::EmptyMessage,
    ];

    /// camelCase property name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Columns => "columns",
            Self::PaginationOptions => "paginationOptions",
            Self::SortOptions => "sortOptions",
            Self::ToolbarOptions => "toolbarOptions",
            Self::Height => "height",
            Self::Striped => "striped",
            Self::Bordered => "bordered",
            Self::Responsive => "responsive",
            Self::Language => "language",
            Self::Selectable => "selectable",
            Self::MultiSelectable => "multiSelectable",
            Self::RowKey => "rowKey",
            Self::EmptyMessage => "emptyMessage",
        }
    }

    /// kebab-case attribute name.
    #[must_use]
    pub fn attribute(self) -> String {
        kebab_case(self.name())
    }

    #[must_use]
    pub fn kind(self) -> PropertyKind {
        match self {
            Self::Data
            | Self::Columns
            | Self::PaginationOptions
            | Self::SortOptions
            | Self::ToolbarOptions => PropertyKind::Json,
            Self::Height | Self::Language | Self::RowKey | Self::EmptyMessage => PropertyKind::Text,
            Self::Striped
            | Self::Bordered
            | Self::Responsive
            | Self::Selectable
            | Self::MultiSelectable => PropertyKind::Flag,
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `paginationOptions` to `pagination-options`.
#[must_use]
pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

// =============================================================================
// Binding conventions
// =============================================================================

/// Which idiom a write came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingStyle {
    /// Plain kebab-case HTML attribute.
    Attribute,
    /// Direct property assignment.
    Property,
    /// `[name]`
    Bracketed,
    /// `:name` or `v-bind:name`
    Bound,
    /// `v-model:name`
    Model,
}

/// A name decoration recognized by the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Convention {
    pub prefix: String,
    pub suffix: String,
    pub style: BindingStyle,
}

impl Convention {
    #[must_use]
    pub fn new(prefix: &str, suffix: &str, style: BindingStyle) -> Self {
        Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            style,
        }
    }

    fn strip<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())
            .filter(|inner| !inner.is_empty())
    }

    fn decorate(&self, name: &str) -> String {
        format!("{}{name}{}", self.prefix, self.suffix)
    }
}

/// Result of one bridge write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeOutcome {
    /// The setter ran.
    Applied(Property),
    /// Old and new attribute values were equal.
    Ignored,
    /// Not an engine property; left to the base element.
    PassedThrough(String),
    /// Bad input; the previous state is kept.
    Rejected(GridError),
}

/// Normalizes external writes into grid setter calls.
#[derive(Debug, Clone)]
pub struct Bridge {
    conventions: Vec<Convention>,
    names: HashMap<String, Property>,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Bridge {
    /// Bridge with the `[name]`, `:name`, `v-bind:name` and `v-model:name`
    /// conventions and every property's camel and kebab names.
    #[must_use]
    pub fn new() -> Self {
        let mut names = HashMap::new();
        for property in Property::ALL {
            names.insert(property.name().to_ascii_lowercase(), property);
            names.insert(property.attribute(), property);
        }
        Self {
            conventions: vec![
                Convention::new("[", "]", BindingStyle::Bracketed),
                Convention::new("v-model:", "", BindingStyle::Model),
                Convention::new("v-bind:", "", BindingStyle::Bound),
                Convention::new(":", "", BindingStyle::Bound),
            ],
            names,
        }
    }

    /// Adds a name decoration. Earlier conventions are tried first.
    #[must_use]
    pub fn with_convention(mut self, convention: Convention) -> Self {
        self.conventions.push(convention);
        self
    }

    /// Maps an extra alias to `property`.
    #[must_use]
    pub fn with_rename(mut self, alias: &str, property: Property) -> Self {
        self.names.insert(alias.trim().to_ascii_lowercase(), property);
        self
    }

    /// Strips any decoration and resolves the canonical property.
    ///
    /// Names compare case-insensitively, since browsers lowercase attribute
    /// names.
    #[must_use]
    pub fn resolve(&self, name: &str) -> (Option<Property>, Option<BindingStyle>) {
        let name = name.trim();
        let (inner, style) = self
            .conventions
            .iter()
            .find_map(|c| c.strip(name).map(|inner| (inner, Some(c.style))))
            .unwrap_or((name, None));
        let property = self.names.get(&inner.to_ascii_lowercase()).copied();
        (property, style)
    }

    /// Every attribute name the host element should observe: the kebab names
    /// plus each decorated variant.
    #[must_use]
    pub fn observed_attributes(&self) -> Vec<String> {
        let plain: Vec<String> = Property::ALL.iter().map(|p| p.attribute()).collect();
        let mut names = plain.clone();
        for convention in &self.conventions {
            names.extend(plain.iter().map(|name| convention.decorate(name)));
        }
        names
    }

    /// Handles an attribute change. `None` means the attribute is absent.
    pub fn attribute_changed(
        &self,
        grid: &mut Grid,
        name: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) -> BridgeOutcome {
        if old == new {
            return BridgeOutcome::Ignored;
        }
        let (Some(property), style) = self.resolve(name) else {
            debug!(bridge.name = %name, "Attribute passed through");
            return BridgeOutcome::PassedThrough(name.to_string());
        };
        let style = style.unwrap_or(BindingStyle::Attribute);

        let value = match new {
            None => Ok(Value::Null),
            Some(text) => decode_attribute(property, style, text),
        };
        finish(property, style, value.and_then(|v| apply(grid, property, v)))
    }

    /// Handles a direct property write with a structured value.
    pub fn set_property(&self, grid: &mut Grid, name: &str, value: Value) -> BridgeOutcome {
        let (Some(property), style) = self.resolve(name) else {
            debug!(bridge.name = %name, "Property passed through");
            return BridgeOutcome::PassedThrough(name.to_string());
        };
        let style = style.unwrap_or(BindingStyle::Property);
        finish(property, style, apply(grid, property, value))
    }
}

/// Observed attributes of a grid using the default conventions.
#[must_use]
pub fn observed_attributes() -> Vec<String> {
    Bridge::new().observed_attributes()
}

/// DOM event names to dispatch for one canonical grid event.
///
/// The canonical name, its kebab-case form, and an `update:` event for the
/// events that back a two-way binding.
#[must_use]
pub fn event_names(canonical: &str) -> Vec<String> {
    let mut names = vec![canonical.to_string()];
    let kebab = kebab_case(canonical);
    if kebab != canonical {
        names.push(kebab);
    }
    match canonical {
        "selectionChange" => names.push("update:selected-rows".to_string()),
        "sortChange" => names.push("update:sort-options".to_string()),
        "toolbarOptionsChange" => names.push("update:toolbar-options".to_string()),
        _ => {}
    }
    names
}

// =============================================================================
// Decoding and applying
// =============================================================================

fn finish(property: Property, style: BindingStyle, result: Result<()>) -> BridgeOutcome {
    match result {
        Ok(()) => {
            debug!(bridge.property = %property, bridge.style = ?style, "Property applied");
            BridgeOutcome::Applied(property)
        }
        Err(err) => {
            warn!(
                bridge.property = %property,
                bridge.style = ?style,
                error = %err,
                "Write rejected, previous state kept"
            );
            BridgeOutcome::Rejected(err)
        }
    }
}

fn decode_attribute(property: Property, style: BindingStyle, text: &str) -> Result<Value> {
    let decorated = style != BindingStyle::Attribute;
    match property.kind() {
        PropertyKind::Json => serde_json::from_str(text)
            .map_err(|e| GridError::malformed_json(property.attribute(), e.to_string())),
        PropertyKind::Text if decorated => Ok(match serde_json::from_str::<Value>(text) {
            Ok(value @ (Value::String(_) | Value::Number(_) | Value::Null)) => value,
            _ => Value::String(text.to_string()),
        }),
        PropertyKind::Text => Ok(Value::String(text.to_string())),
        PropertyKind::Flag => Ok(match serde_json::from_str::<Value>(text) {
            Ok(Value::Bool(flag)) if decorated => Value::Bool(flag),
            _ => Value::Bool(text.trim() != "false"),
        }),
    }
}

/// Object payloads may also arrive as JSON text through property writes.
fn structured(property: Property, value: Value) -> Result<Value> {
    match value {
        Value::String(text) => serde_json::from_str(&text)
            .map_err(|e| GridError::malformed_json(property.name(), e.to_string())),
        other => Ok(other),
    }
}

fn typed<T: DeserializeOwned>(property: Property, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| GridError::invalid_shape(property.name(), e.to_string()))
}

fn flag(property: Property, value: &Value) -> Result<bool> {
    match value {
        Value::Null => Ok(false),
        Value::Bool(flag) => Ok(*flag),
        Value::String(text) => Ok(text.trim() != "false"),
        other => Err(GridError::invalid_shape(
            property.name(),
            format!("expected a boolean, got {}", kind_of(other)),
        )),
    }
}

fn text(property: Property, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(_) | Value::Number(_) => Ok(Some(display_string(value))),
        other => Err(GridError::invalid_shape(
            property.name(),
            format!("expected text, got {}", kind_of(other)),
        )),
    }
}

fn apply(grid: &mut Grid, property: Property, value: Value) -> Result<()> {
    match property {
        Property::Data => match structured(property, value)? {
            Value::Null => grid.set_data(Vec::new()),
            Value::Array(rows) => grid.set_data(rows),
            other => {
                return Err(GridError::invalid_shape(
                    property.name(),
                    format!("expected an array, got {}", kind_of(&other)),
                ));
            }
        },
        Property::Columns => {
            let columns: Vec<Column> = match structured(property, value)? {
                Value::Null => Vec::new(),
                other => typed(property, other)?,
            };
            grid.set_columns(columns);
        }
        Property::PaginationOptions => {
            let options: Option<PaginationOptions> = match structured(property, value)? {
                Value::Null => None,
                other => Some(typed(property, other)?),
            };
            grid.set_pagination_options(options);
        }
        Property::SortOptions => {
            let options: Option<SortOptions> = match structured(property, value)? {
                Value::Null => None,
                other => Some(typed(property, other)?),
            };
            grid.set_sort_options(options);
        }
        Property::ToolbarOptions => grid.try_set_toolbar_options(&value)?,
        Property::Height => grid.set_height(text(property, &value)?),
        Property::Striped => grid.set_striped(flag(property, &value)?),
        Property::Bordered => grid.set_bordered(flag(property, &value)?),
        Property::Responsive => grid.set_responsive(flag(property, &value)?),
        Property::Selectable => grid.set_selectable(flag(property, &value)?),
        Property::MultiSelectable => grid.set_multi_selectable(flag(property, &value)?),
        Property::Language => {
            let code = text(property, &value)?.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
            grid.set_language(&code);
        }
        Property::RowKey => grid.set_row_key(text(property, &value)?),
        Property::EmptyMessage => grid.set_empty_message(text(property, &value)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kebab_case_names() {
        assert_eq!(kebab_case("paginationOptions"), "pagination-options");
        assert_eq!(kebab_case("data"), "data");
        assert_eq!(Property::MultiSelectable.attribute(), "multi-selectable");
    }

    #[test]
    fn resolves_every_convention() {
        let bridge = Bridge::new();
        let cases = [
            ("pagination-options", None),
            ("paginationOptions", None),
            ("paginationoptions", None),
            ("[paginationOptions]", Some(BindingStyle::Bracketed)),
            (":pagination-options", Some(BindingStyle::Bound)),
            ("v-bind:pagination-options", Some(BindingStyle::Bound)),
            ("v-model:pagination-options", Some(BindingStyle::Model)),
        ];
        for (name, style) in cases {
            assert_eq!(
                bridge.resolve(name),
                (Some(Property::PaginationOptions), style),
                "{name}"
            );
        }
        assert_eq!(bridge.resolve("class").0, None);
        assert_eq!(bridge.resolve("[]").0, None);
    }

    #[test]
    fn custom_rename_and_convention() {
        let bridge = Bridge::new()
            .with_rename("rows", Property::Data)
            .with_convention(Convention::new("ng-", "", BindingStyle::Bound));
        assert_eq!(bridge.resolve("rows").0, Some(Property::Data));
        assert_eq!(
            bridge.resolve("ng-rows"),
            (Some(Property::Data), Some(BindingStyle::Bound))
        );
    }

    #[test]
    fn plain_flags_follow_html_semantics() {
        let bridge = Bridge::new();
        let mut grid = Grid::new();
        bridge.attribute_changed(&mut grid, "striped", None, Some("false"));
        assert!(!grid.display().striped);
        bridge.attribute_changed(&mut grid, "striped", Some("false"), Some(""));
        assert!(grid.display().striped);
        bridge.attribute_changed(&mut grid, "striped", Some(""), None);
        assert!(!grid.display().striped);
    }

    #[test]
    fn decorated_text_is_json_decoded_with_raw_fallback() {
        let bridge = Bridge::new();
        let mut grid = Grid::new();
        bridge.attribute_changed(&mut grid, ":height", None, Some("\"300px\""));
        assert_eq!(grid.height(), Some("300px"));
        bridge.attribute_changed(&mut grid, ":height", None, Some("50vh"));
        assert_eq!(grid.height(), Some("50vh"));
        bridge.attribute_changed(&mut grid, "height", None, Some("\"quoted\""));
        assert_eq!(grid.height(), Some("\"quoted\""));
    }

    #[test]
    fn equal_values_are_ignored() {
        let bridge = Bridge::new();
        let mut grid = Grid::new();
        assert_eq!(
            bridge.attribute_changed(&mut grid, "data", Some("[]"), Some("[]")),
            BridgeOutcome::Ignored
        );
    }

    #[test]
    fn property_writes_skip_json_parsing_for_structures() {
        let bridge = Bridge::new();
        let mut grid = Grid::new();
        let outcome = bridge.set_property(&mut grid, "sortOptions", json!({"field": "age", "direction": "desc"}));
        assert_eq!(outcome, BridgeOutcome::Applied(Property::SortOptions));
        assert_eq!(grid.sort_options(), Some(&SortOptions::desc("age")));

        let outcome = bridge.set_property(&mut grid, "columns", json!({"field": "age"}));
        assert!(matches!(outcome, BridgeOutcome::Rejected(GridError::InvalidShape { .. })));
        assert!(grid.columns().is_empty());
    }

    #[test]
    fn observed_attributes_cover_decorations() {
        let names = observed_attributes();
        for expected in [
            "data",
            "pagination-options",
            "[toolbar-options]",
            ":sort-options",
            "v-model:data",
            "v-bind:language",
        ] {
            assert!(names.iter().any(|n| n == expected), "{expected}");
        }
    }

    #[test]
    fn event_name_variants() {
        assert_eq!(
            event_names("selectionChange"),
            vec!["selectionChange", "selection-change", "update:selected-rows"]
        );
        assert_eq!(event_names("filtered"), vec!["filtered"]);
        assert_eq!(event_names("pageChange"), vec!["pageChange", "page-change"]);
    }
}
