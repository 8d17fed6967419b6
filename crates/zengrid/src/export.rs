//! Export hand-off.
//!
//! Encoding files is the host's job. The engine only builds the
//! [`ExportSnapshot`] (raw data and column configuration, never the filtered
//! view) and passes it to an [`ExportEncoder`].

use std::fmt;
use std::str::FromStr;

use crate::error::{GridError, Result};
use crate::i18n::TranslationKey;
use crate::model::{Column, Row};
use crate::pipeline::{display_string, lookup};

/// File formats offered by the toolbar's export menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Csv,
    Json,
    /// Excel-compatible CSV.
    Excel,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [Self; 4] = [Self::Csv, Self::Json, Self::Excel, Self::Pdf];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Excel => "excel",
            Self::Pdf => "pdf",
        }
    }

    /// Menu label key.
    #[must_use]
    pub fn label_key(self) -> TranslationKey {
        match self {
            Self::Csv => TranslationKey::ExportCsv,
            Self::Json => TranslationKey::ExportJson,
            Self::Excel => TranslationKey::ExportExcel,
            Self::Pdf => TranslationKey::ExportPdf,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "excel" | "xlsx" => Ok(Self::Excel),
            "pdf" => Ok(Self::Pdf),
            other => Err(GridError::invalid_shape(
                "exportFormat",
                format!("unknown format '{other}'"),
            )),
        }
    }
}

/// Columns and raw rows of a grid at export time.
#[derive(Debug, Clone)]
pub struct ExportSnapshot {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl ExportSnapshot {
    /// Header labels in column order.
    #[must_use]
    pub fn headers(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| column.header_text().to_string())
            .collect()
    }

    /// Cell text of every row, one inner `Vec` per row in column order.
    #[must_use]
    pub fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|column| display_string(lookup(row, &column.field)))
                    .collect()
            })
            .collect()
    }
}

/// Receives export requests. Implemented outside the engine.
pub trait ExportEncoder {
    fn export(&self, format: ExportFormat, snapshot: &ExportSnapshot) -> Result<()>;
}

impl<F> ExportEncoder for F
where
    F: Fn(ExportFormat, &ExportSnapshot) -> Result<()>,
{
    fn export(&self, format: ExportFormat, snapshot: &ExportSnapshot) -> Result<()> {
        self(format, snapshot)
    }
}
