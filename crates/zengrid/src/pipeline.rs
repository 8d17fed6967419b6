//! Data pipeline: filter, sort and paginate.
//!
//! Every stage is a pure function over a slice of [`Row`] handles and returns
//! a fresh `Vec`. Nothing here panics on bad data: a row that cannot be
//! evaluated is excluded from the filter result, and a sort whose comparator
//! panics leaves the input order untouched.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use zengrid::model::SortOptions;
//! use zengrid::pipeline::{self, Criteria};
//!
//! let rows = vec![
//!     Arc::new(json!({"name": "Ayşe", "city": "Ankara", "age": 34})),
//!     Arc::new(json!({"name": "Can", "city": "İzmir", "age": 28})),
//!     Arc::new(json!({"name": "Deniz", "city": "Bursa", "age": 41})),
//! ];
//!
//! let found = pipeline::filter(&rows, &Criteria::search("ANKARA"));
//! assert_eq!(found.len(), 1);
//!
//! let sorted = pipeline::sort(&rows, &SortOptions::desc("age"));
//! assert_eq!(sorted[0]["name"], "Deniz");
//!
//! let page = pipeline::paginate(&sorted, 2, 2);
//! assert_eq!(page.len(), 1);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use chrono::{DateTime, NaiveDate, Utc};
use icu::collator::options::CollatorOptions;
use icu::collator::{Collator, CollatorBorrowed};
use icu::locale::Locale;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{GridError, Result};
use crate::i18n::DEFAULT_LANGUAGE;
use crate::model::{kind_of, Row, SortDirection, SortOptions};

/// Reserved criteria key that triggers the global substring search.
pub const SEARCH_TERM: &str = "searchTerm";

static NULL: Value = Value::Null;

// =============================================================================
// Criteria
// =============================================================================

/// A single per-field constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// No constraint.
    Any,
    /// Case-insensitive substring of the field's text.
    Text(String),
    /// Numeric equality after coercing the field to a number. The number is
    /// kept as given so it reports back unchanged.
    Number(serde_json::Number),
    /// Equality with the field's truthiness.
    Bool(bool),
    /// Exact timestamp equality.
    Date(DateTime<Utc>),
    /// The field value is one of these.
    OneOf(Vec<Value>),
    /// Strict equality.
    Exact(Value),
}

impl Criterion {
    /// Picks the matching rule from the JSON type of `value`.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::Any,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(n.clone()),
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(items) => Self::OneOf(items.clone()),
            Value::Object(_) => Self::Exact(value.clone()),
        }
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Any => Value::Null,
            Self::Text(s) => Value::String(s.clone()),
            Self::Number(n) => Value::Number(n.clone()),
            Self::Bool(b) => Value::Bool(*b),
            Self::Date(d) => Value::String(d.to_rfc3339()),
            Self::OneOf(items) => Value::Array(items.clone()),
            Self::Exact(v) => v.clone(),
        }
    }

    /// Tests `field` (the looked-up value) against this criterion.
    ///
    /// `row` is only used to label errors.
    pub fn matches(&self, field: &Value, row: usize) -> Result<bool> {
        Ok(match self {
            Self::Any => true,
            Self::Text(needle) => display_string(field)
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            Self::Number(n) => as_number(field)
                .zip(n.as_f64())
                .is_some_and(|(actual, expected)| actual == expected),
            Self::Bool(b) => truthy(field) == *b,
            Self::Date(expected) => {
                if field.is_null() {
                    return Ok(false);
                }
                let actual = parse_timestamp(field).ok_or_else(|| {
                    GridError::row_evaluation(
                        row,
                        format!("{} is not a date", display_string(field)),
                    )
                })?;
                actual.timestamp_millis() == expected.timestamp_millis()
            }
            Self::OneOf(items) => items.iter().any(|item| values_equal(item, field)),
            Self::Exact(expected) => values_equal(expected, field),
        })
    }
}

/// Filter criteria: an optional global search plus per-field constraints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    search: Option<String>,
    fields: Vec<(String, Criterion)>,
}

impl Criteria {
    /// Empty criteria, matching every row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Criteria holding only a search term.
    #[must_use]
    pub fn search(term: impl Into<String>) -> Self {
        Self::new().with_search(term)
    }

    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Adds a constraint on the field at dot path `field`.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, criterion: Criterion) -> Self {
        self.fields.push((field.into(), criterion));
        self
    }

    /// Reads criteria from a JSON payload.
    ///
    /// A bare string is a search term, `null` is no constraint, an object maps
    /// field paths (or `searchTerm`) to match values.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::String(term) => Ok(Self::search(term.clone())),
            Value::Object(map) => Ok(map.iter().fold(Self::new(), |criteria, (key, value)| {
                if key == SEARCH_TERM {
                    criteria.with_search(display_string(value))
                } else {
                    criteria.with(key.clone(), Criterion::from_value(value))
                }
            })),
            other => Err(GridError::invalid_shape(
                "criteria",
                format!("expected a string, object or null, got {}", kind_of(other)),
            )),
        }
    }

    /// The JSON form carried by the `filtered` notification.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(term) = &self.search {
            map.insert(SEARCH_TERM.to_string(), Value::String(term.clone()));
        }
        for (field, criterion) in &self.fields {
            map.insert(field.clone(), criterion.to_value());
        }
        Value::Object(map)
    }

    /// The raw search term, if one was given.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Per-field constraints in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Criterion)> {
        self.fields.iter().map(|(field, c)| (field.as_str(), c))
    }

    /// Returns true if no key was given at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.fields.is_empty()
    }

    fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty())
    }

    /// With a search term present, the search alone decides and an empty
    /// term keeps every row.
    fn constrains(&self) -> bool {
        if self.search.is_some() {
            return self.needle().is_some();
        }
        self
                .fields
                .iter()
                .any(|(_, criterion)| *criterion != Criterion::Any)
    }
}

// =============================================================================
// Filter
// =============================================================================

/// Keeps the rows matching `criteria`, in their original order.
///
/// With a search term, a row matches if any flattened value contains it and
/// the per-field constraints are not consulted. Otherwise every per-field
/// constraint must match.
#[must_use]
pub fn filter(rows: &[Row], criteria: &Criteria) -> Vec<Row> {
    if !criteria.constrains() {
        return rows.to_vec();
    }
    let needle = criteria.needle();

    let result: Vec<Row> = rows
        .iter()
        .enumerate()
        .filter(|(index, row)| match row_matches(row, *index, needle.as_deref(), criteria) {
            Ok(matched) => matched,
            Err(err) => {
                debug!(error = %err, "Row excluded from filter result");
                false
            }
        })
        .map(|(_, row)| Row::clone(row))
        .collect();

    debug!(
        pipeline.input = rows.len(),
        pipeline.output = result.len(),
        "Filter applied"
    );
    result
}

fn row_matches(row: &Value, index: usize, needle: Option<&str>, criteria: &Criteria) -> Result<bool> {
    if let Some(needle) = needle {
        return Ok(flatten(row)
            .iter()
            .any(|(_, value)| !value.is_null() && display_string(value).to_lowercase().contains(needle)));
    }
    for (field, criterion) in &criteria.fields {
        if !criterion.matches(lookup(row, field), index)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Follows a dot path through objects and array indices.
///
/// Any missing step yields `null`.
#[must_use]
pub fn lookup<'a>(value: &'a Value, path: &str) -> &'a Value {
    path.split('.')
        .try_fold(value, |current, step| match current {
            Value::Object(map) => map.get(step),
            Value::Array(items) => step.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
        .unwrap_or(&NULL)
}

/// Flattens a row into `(dotted path, scalar)` pairs.
///
/// Arrays are expanded element by element and also deposited once, as a
/// comma-joined string, under their own path. A top-level scalar is reported
/// under the path `value`.
#[must_use]
pub fn flatten(value: &Value) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    flatten_into(value, String::new(), &mut out);
    out
}

fn flatten_into(value: &Value, prefix: String, out: &mut Vec<(String, Value)>) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        }
    };
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(child, join(key), out);
            }
        }
        Value::Array(items) => {
            if !prefix.is_empty() {
                out.push((prefix.clone(), Value::String(display_string(value))));
            }
            for (index, child) in items.iter().enumerate() {
                flatten_into(child, join(&index.to_string()), out);
            }
        }
        scalar => {
            let path = if prefix.is_empty() {
                "value".to_string()
            } else {
                prefix
            };
            out.push((path, scalar.clone()));
        }
    }
}

/// Text form of a value as shown in cells and searched by the filter.
#[must_use]
pub fn display_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_string)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|d| d.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|d| d.and_utc())
                })
        }
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

// =============================================================================
// Sort
// =============================================================================

/// Locale-aware string ordering for one language.
///
/// Falls back to a case-insensitive ordinal compare when no collator can be
/// built for the language.
#[derive(Clone)]
pub struct Collation {
    language: String,
    collator: Option<Rc<CollatorBorrowed<'static>>>,
}

impl fmt::Debug for Collation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collation")
            .field("language", &self.language)
            .field("icu", &self.collator.is_some())
            .finish()
    }
}

impl Default for Collation {
    fn default() -> Self {
        Self::for_language(DEFAULT_LANGUAGE)
    }
}

impl Collation {
    /// Builds the collation for a language code such as `en` or `tr`.
    #[must_use]
    pub fn for_language(code: &str) -> Self {
        let collator = code
            .parse::<Locale>()
            .ok()
            .and_then(|locale| Collator::try_new(locale.into(), CollatorOptions::default()).ok());
        if collator.is_none() {
            debug!(collation.language = %code, "No collator, using ordinal compare");
        }
        Self {
            language: code.to_string(),
            collator: collator.map(Rc::new),
        }
    }

    /// Ordinal collation that never consults locale data.
    #[must_use]
    pub fn ordinal() -> Self {
        Self {
            language: String::new(),
            collator: None,
        }
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    #[must_use]
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
        }
    }
}

/// Sorts with the default language's collation. See [`sort_with`].
#[must_use]
pub fn sort(rows: &[Row], options: &SortOptions) -> Vec<Row> {
    sort_with(rows, options, &Collation::default())
}

/// Stable sort of `rows` by `options`.
///
/// Inactive options return the rows in their given order. Null field values
/// sort last in both directions. A custom comparator receives whole rows; in
/// descending order its operands are swapped.
#[must_use]
pub fn sort_with(rows: &[Row], options: &SortOptions, collation: &Collation) -> Vec<Row> {
    if !options.is_active() {
        return rows.to_vec();
    }

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut sorted = rows.to_vec();
        sorted.sort_by(|a, b| compare_rows(a, b, options, collation));
        sorted
    }));

    match outcome {
        Ok(sorted) => {
            debug!(sort.field = %options.field, sort.direction = ?options.direction, "Sort applied");
            sorted
        }
        Err(_) => {
            warn!(sort.field = %options.field, "Sort comparator panicked, keeping filtered order");
            rows.to_vec()
        }
    }
}

fn compare_rows(a: &Value, b: &Value, options: &SortOptions, collation: &Collation) -> Ordering {
    let descending = options.direction == SortDirection::Desc;
    if let Some(comparator) = &options.comparator {
        return if descending {
            comparator(b, a)
        } else {
            comparator(a, b)
        };
    }

    let left = lookup(a, &options.field);
    let right = lookup(b, &options.field);
    match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ordering = compare_values(left, right, collation);
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        }
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_values(a: &Value, b: &Value, collation: &Collation) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => collation.compare(x, y),
        _ if type_rank(a) == type_rank(b) => {
            collation.compare(&display_string(a), &display_string(b))
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

// =============================================================================
// Paginate and helpers
// =============================================================================

/// Returns the 1-based page `page` of `page_size` items.
///
/// Pages past the end, page 0 and a zero page size all yield an empty page.
#[must_use]
pub fn paginate<T: Clone>(rows: &[T], page: usize, page_size: usize) -> Vec<T> {
    if page == 0 || page_size == 0 {
        return Vec::new();
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= rows.len() {
        return Vec::new();
    }
    let end = start.saturating_add(page_size).min(rows.len());
    rows[start..end].to_vec()
}

/// Filters, then sorts. The full derivation of the filtered sequence.
#[must_use]
pub fn derive(
    rows: &[Row],
    criteria: &Criteria,
    sort: Option<&SortOptions>,
    collation: &Collation,
) -> Vec<Row> {
    let filtered = filter(rows, criteria);
    match sort {
        Some(options) => sort_with(&filtered, options, collation),
        None => filtered,
    }
}

/// Distinct non-null values of `field`, in first-seen order.
#[must_use]
pub fn unique_values(rows: &[Row], field: &str) -> Vec<Value> {
    let mut seen: Vec<Value> = Vec::new();
    for row in rows {
        let value = lookup(row, field);
        if !value.is_null() && !seen.iter().any(|v| values_equal(v, value)) {
            seen.push(value.clone());
        }
    }
    seen
}

/// Target type for [`coerce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    Date,
}

/// Best-effort conversion of `value` to `kind`.
///
/// Values that cannot be represented become `null`. Dates are written as
/// RFC 3339 strings.
#[must_use]
pub fn coerce(value: &Value, kind: ValueKind) -> Value {
    match kind {
        ValueKind::String => Value::String(display_string(value)),
        ValueKind::Number => as_number(value)
            .and_then(serde_json::Number::from_f64)
            .map_or(Value::Null, Value::Number),
        ValueKind::Boolean => Value::Bool(truthy(value)),
        ValueKind::Date => {
            parse_timestamp(value).map_or(Value::Null, |d| Value::String(d.to_rfc3339()))
        }
    }
}
