//! Localization context for grid and toolbar labels.
//!
//! A [`Localizer`] is an ordinary value: each grid and each toolbar owns one,
//! constructed by the host and injected at construction time. Switching the
//! language of one grid never affects another instance on the same page.
//!
//! # Example
//!
//! ```rust
//! use zengrid::i18n::{Localizer, TranslationKey};
//!
//! let mut localizer = Localizer::new();
//! assert_eq!(localizer.translate(TranslationKey::NoData, &[]), "No data to display");
//!
//! localizer.set_language("tr");
//! let info = localizer.translate(
//!     TranslationKey::PageInfo,
//!     &[("start", "1".into()), ("end", "10".into()), ("total", "42".into())],
//! );
//! assert_eq!(info, "1-10 / 42");
//! ```

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};

use crate::error::{GridError, Result};

/// Language used when a requested code has no translation table.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Keys of every translatable label the grid and toolbar display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranslationKey {
    /// Placeholder text of the toolbar search box.
    SearchPlaceholder,
    /// Export menu entry for CSV.
    ExportCsv,
    /// Export menu entry for JSON.
    ExportJson,
    /// Export menu entry for PDF.
    ExportPdf,
    /// Export menu entry for Excel.
    ExportExcel,
    /// Message shown in place of rows when nothing matches.
    NoData,
    /// Toolbar title.
    TableTitle,
    /// Pagination summary, with `{start}`, `{end}` and `{total}` placeholders.
    PageInfo,
}

impl TranslationKey {
    /// All keys, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::SearchPlaceholder,
        Self::ExportCsv,
        Self::ExportJson,
        Self::ExportPdf,
        Self::ExportExcel,
        Self::NoData,
        Self::TableTitle,
        Self::PageInfo,
    ];

    /// Stable identifier of the key, also used as the last-resort label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SearchPlaceholder => "search_placeholder",
            Self::ExportCsv => "export_csv",
            Self::ExportJson => "export_json",
            Self::ExportPdf => "export_pdf",
            Self::ExportExcel => "export_excel",
            Self::NoData => "no_data",
            Self::TableTitle => "table_title",
            Self::PageInfo => "page_info",
        }
    }
}

impl fmt::Display for TranslationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Table = HashMap<TranslationKey, String>;

fn table(entries: [(TranslationKey, &str); 8]) -> Table {
    entries
        .into_iter()
        .map(|(key, text)| (key, text.to_string()))
        .collect()
}

fn builtin_catalog() -> HashMap<String, Table> {
    use TranslationKey::*;

    let mut catalog = HashMap::new();
    catalog.insert(
        "en".to_string(),
        table([
            (SearchPlaceholder, "Search..."),
            (ExportCsv, "Export as CSV"),
            (ExportJson, "Export as JSON"),
            (ExportPdf, "Export as PDF"),
            (ExportExcel, "Export as Excel"),
            (NoData, "No data to display"),
            (TableTitle, "Data Table"),
            (PageInfo, "{start}-{end} of {total}"),
        ]),
    );
    catalog.insert(
        "tr".to_string(),
        table([
            (SearchPlaceholder, "Ara..."),
            (ExportCsv, "CSV Olarak Dışa Aktar"),
            (ExportJson, "JSON Olarak Dışa Aktar"),
            (ExportPdf, "PDF Olarak Dışa Aktar"),
            (ExportExcel, "Excel Olarak Dışa Aktar"),
            (NoData, "Görüntülenecek veri yok"),
            (TableTitle, "Veri Tablosu"),
            (PageInfo, "{start}-{end} / {total}"),
        ]),
    );
    catalog
}

/// Per-instance translation context.
#[derive(Clone)]
pub struct Localizer {
    language: String,
    catalog: HashMap<String, Table>,
}

impl fmt::Debug for Localizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut languages: Vec<&str> = self.catalog.keys().map(String::as_str).collect();
        languages.sort_unstable();
        f.debug_struct("Localizer")
            .field("language", &self.language)
            .field("languages", &languages)
            .finish()
    }
}

impl Default for Localizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Localizer {
    /// Creates a localizer with the built-in tables, set to [`DEFAULT_LANGUAGE`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            catalog: builtin_catalog(),
        }
    }

    /// Sets the language (builder pattern). Unknown codes fall back silently.
    #[must_use]
    pub fn with_language(mut self, code: &str) -> Self {
        self.set_language(code);
        self
    }

    /// Adds or replaces a language table on this instance only.
    ///
    /// Keys missing from `entries` resolve through the default language.
    #[must_use]
    pub fn with_table<I, S>(mut self, code: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (TranslationKey, S)>,
        S: Into<String>,
    {
        let table = entries
            .into_iter()
            .map(|(key, text)| (key, text.into()))
            .collect();
        self.catalog.insert(normalize(code), table);
        self
    }

    /// Returns the active language code.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Returns true if `code` has a translation table.
    #[must_use]
    pub fn supports(&self, code: &str) -> bool {
        self.catalog.contains_key(&normalize(code))
    }

    /// Resolves `code` to a supported language code.
    pub fn resolve(&self, code: &str) -> Result<String> {
        let code = normalize(code);
        if self.catalog.contains_key(&code) {
            Ok(code)
        } else {
            Err(GridError::UnsupportedLanguage(code))
        }
    }

    /// Resolves `code` the way [`set_language`](Self::set_language) would,
    /// without changing the active language and without logging.
    #[must_use]
    pub fn resolve_or_default(&self, code: &str) -> String {
        self.resolve(code)
            .unwrap_or_else(|_| DEFAULT_LANGUAGE.to_string())
    }

    /// Switches the active language and returns the code actually applied.
    ///
    /// Unsupported codes fall back to [`DEFAULT_LANGUAGE`] with a warning.
    pub fn set_language(&mut self, code: &str) -> &str {
        self.language = match self.resolve(code) {
            Ok(code) => code,
            Err(err) => {
                warn!(
                    i18n.requested = %code,
                    i18n.fallback = DEFAULT_LANGUAGE,
                    error = %err,
                    "Unsupported language, using default"
                );
                DEFAULT_LANGUAGE.to_string()
            }
        };
        debug!(i18n.language = %self.language, "Language set");
        &self.language
    }

    /// Looks up `key` and substitutes `{name}` placeholders from `params`.
    ///
    /// Lookup order is the active table, the default table, then the key
    /// identifier itself.
    #[must_use]
    pub fn translate(&self, key: TranslationKey, params: &[(&str, String)]) -> String {
        let template = self
            .catalog
            .get(&self.language)
            .and_then(|table| table.get(&key))
            .or_else(|| {
                self.catalog
                    .get(DEFAULT_LANGUAGE)
                    .and_then(|table| table.get(&key))
            })
            .map_or(key.as_str(), String::as_str);

        params
            .iter()
            .fold(template.to_string(), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_language_is_english() {
        let localizer = Localizer::new();
        assert_eq!(localizer.language(), "en");
        assert_eq!(
            localizer.translate(TranslationKey::SearchPlaceholder, &[]),
            "Search..."
        );
    }

    #[test]
    fn unsupported_language_falls_back() {
        let mut localizer = Localizer::new().with_language("tr");
        assert_eq!(localizer.set_language("xx"), "en");
        assert_eq!(localizer.language(), "en");
    }

    #[test]
    fn codes_are_normalized() {
        let localizer = Localizer::new().with_language(" TR ");
        assert_eq!(localizer.language(), "tr");
        assert!(localizer.supports("Tr"));
    }

    #[test]
    fn page_info_substitutes_params() {
        let localizer = Localizer::new();
        let text = localizer.translate(
            TranslationKey::PageInfo,
            &[
                ("start", "11".into()),
                ("end", "20".into()),
                ("total", "25".into()),
            ],
        );
        assert_eq!(text, "11-20 of 25");
    }

    #[test]
    fn partial_table_falls_back_to_default() {
        let localizer = Localizer::new()
            .with_table("de", [(TranslationKey::NoData, "Keine Daten")])
            .with_language("de");
        assert_eq!(localizer.translate(TranslationKey::NoData, &[]), "Keine Daten");
        assert_eq!(
            localizer.translate(TranslationKey::TableTitle, &[]),
            "Data Table"
        );
    }

    #[test]
    fn every_builtin_key_is_translated() {
        for code in ["en", "tr"] {
            let localizer = Localizer::new().with_language(code);
            for key in TranslationKey::ALL {
                assert_ne!(localizer.translate(key, &[]), key.as_str());
            }
        }
    }

    #[test]
    fn instances_are_independent() {
        let mut first = Localizer::new();
        let second = Localizer::new();
        first.set_language("tr");
        assert_eq!(first.language(), "tr");
        assert_eq!(second.language(), "en");
    }
}
