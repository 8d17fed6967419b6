//! Error types for the grid engine.
//!
//! Nothing in the engine is fatal. The public mutation surface of
//! [`Grid`](crate::grid::Grid) and [`Bridge`](crate::bridge::Bridge) never
//! returns these errors to the host page: they are logged and the previous
//! state is kept. Internal helpers still return [`Result`] so that the
//! decision to swallow an error is made in exactly one place.
//!
//! | Variant | Origin | Outcome |
//! |---------|--------|---------|
//! | [`MalformedJson`](GridError::MalformedJson) | attribute or setter payload | setter is a no-op |
//! | [`InvalidShape`](GridError::InvalidShape) | well-formed JSON of the wrong type | setter is a no-op |
//! | [`PeerUnavailable`](GridError::PeerUnavailable) | toolbar/grid pairing | grid-only operation |
//! | [`UnsupportedLanguage`](GridError::UnsupportedLanguage) | localization | default language |
//! | [`RowEvaluation`](GridError::RowEvaluation) | filter stage | row excluded |

use thiserror::Error;

/// Convenience alias used by the engine's fallible helpers.
pub type Result<T> = std::result::Result<T, GridError>;

/// Canonical error enumeration for the grid engine.
///
/// Payloads are stored as `String`s so the type stays `Clone` and
/// `PartialEq`, which keeps assertions in tests simple.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// A string payload that should have been JSON could not be parsed.
    #[error("malformed JSON for '{property}': {message}")]
    MalformedJson { property: String, message: String },

    /// The payload parsed, but does not have the shape the property needs.
    #[error("invalid value for '{property}': {message}")]
    InvalidShape { property: String, message: String },

    /// The paired grid or toolbar is gone, or was never found.
    #[error("peer unavailable: {0}")]
    PeerUnavailable(String),

    /// A language code with no translation table.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// A single row could not be evaluated against the filter criteria.
    #[error("row {row} could not be evaluated: {message}")]
    RowEvaluation { row: usize, message: String },
}

impl GridError {
    /// Creates a [`MalformedJson`](GridError::MalformedJson) error.
    pub fn malformed_json(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedJson {
            property: property.into(),
            message: message.into(),
        }
    }

    /// Creates an [`InvalidShape`](GridError::InvalidShape) error.
    pub fn invalid_shape(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidShape {
            property: property.into(),
            message: message.into(),
        }
    }

    /// Creates a [`RowEvaluation`](GridError::RowEvaluation) error.
    pub fn row_evaluation(row: usize, message: impl Into<String>) -> Self {
        Self::RowEvaluation {
            row,
            message: message.into(),
        }
    }

    /// Returns true for errors caused by the caller's input rather than by
    /// the surrounding page.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedJson { .. } | Self::InvalidShape { .. }
        )
    }
}
