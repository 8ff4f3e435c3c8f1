//! GML Diagnostics - Feather catalog entries and fix records
//!
//! This crate holds the plain data exchanged between the fix engine and its
//! callers: the diagnostic catalog (supplied by the caller, never detected
//! here), the `FixDetail` records the engine produces, and offset helpers.

use serde::{Deserialize, Serialize};

/// A half-open byte range into the original source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub start: u32,
    pub end: u32,
}

impl TextRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// One Feather rule as described by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatherDiagnostic {
    /// Rule id (e.g., "GM2000")
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Code snippet exhibiting the problem
    #[serde(default)]
    pub bad_example: String,
    /// The same snippet after correction
    #[serde(default)]
    pub good_example: String,
    /// Free-text correction guidance
    #[serde(default)]
    pub correction: String,
}

impl FeatherDiagnostic {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            bad_example: String::new(),
            good_example: String::new(),
            correction: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_examples(mut self, bad: impl Into<String>, good: impl Into<String>) -> Self {
        self.bad_example = bad.into();
        self.good_example = good.into();
        self
    }

    pub fn with_correction(mut self, correction: impl Into<String>) -> Self {
        self.correction = correction.into();
        self
    }
}

/// Ordered list of diagnostics. Order is the order fixers run in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagnosticCatalog {
    entries: Vec<FeatherDiagnostic>,
}

impl DiagnosticCatalog {
    pub fn new(entries: Vec<FeatherDiagnostic>) -> Self {
        Self { entries }
    }

    /// Decode a catalog from a JSON array of diagnostic objects
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatherDiagnostic> {
        self.entries.iter()
    }

    pub fn get(&self, id: &str) -> Option<&FeatherDiagnostic> {
        self.entries.iter().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keep only the entries accepted by `keep`, preserving order
    pub fn retain(&mut self, keep: impl FnMut(&FeatherDiagnostic) -> bool) {
        self.entries.retain(keep);
    }
}

impl FromIterator<FeatherDiagnostic> for DiagnosticCatalog {
    fn from_iter<T: IntoIterator<Item = FeatherDiagnostic>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// The record produced for every applied (or recorded-but-unapplied) fix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixDetail {
    pub id: String,
    pub title: String,
    pub description: String,
    pub correction: String,
    /// Name of the symbol the fix is about, when there is one
    pub target: Option<String>,
    /// Offsets into the original, unpreprocessed source
    pub range: Option<TextRange>,
    /// `true` if an edit was made, `false` if the fix was only recorded
    pub automatic: bool,
    /// New name or text, for rename and substitute fixes
    pub replacement: Option<String>,
}

impl FixDetail {
    /// An automatic fix record for `diagnostic`
    pub fn automatic(diagnostic: &FeatherDiagnostic) -> Self {
        Self {
            id: diagnostic.id.clone(),
            title: diagnostic.title.clone(),
            description: diagnostic.description.clone(),
            correction: diagnostic.correction.clone(),
            target: None,
            range: None,
            automatic: true,
            replacement: None,
        }
    }

    /// A record for a diagnostic the engine could not fix by itself
    pub fn manual(diagnostic: &FeatherDiagnostic) -> Self {
        Self {
            automatic: false,
            ..Self::automatic(diagnostic)
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_range(mut self, range: Option<TextRange>) -> Self {
        self.range = range;
        self
    }

    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = Some(replacement.into());
        self
    }
}

/// Byte offset to 1-indexed line/column conversion
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        // Estimate: ~40 chars per line on average
        let mut line_starts = Vec::with_capacity(source.len() / 40 + 1);
        line_starts.push(0);
        for (i, c) in source.bytes().enumerate() {
            if c == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Convert a byte offset to line and column (1-indexed)
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let offset = offset as usize;
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let column = offset - self.line_starts[line] + 1;
        ((line + 1) as u32, column as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_from_json_keeps_order() {
        let json = r#"[
            {"id": "GM2000", "title": "Blend mode not reset", "badExample": "gpu_set_blendmode(bm_add);", "goodExample": "gpu_set_blendmode(bm_add);\ngpu_set_blendmode(bm_normal);"},
            {"id": "GM1000", "title": "No enclosing loop"}
        ]"#;
        let catalog = DiagnosticCatalog::from_json(json).unwrap();
        let ids: Vec<_> = catalog.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["GM2000", "GM1000"]);
        assert_eq!(catalog.get("GM2000").unwrap().bad_example, "gpu_set_blendmode(bm_add);");
        assert!(catalog.get("GM1000").unwrap().correction.is_empty());
    }

    #[test]
    fn test_manual_detail_is_not_automatic() {
        let diagnostic = FeatherDiagnostic::new("GM2017", "Uninitialised field");
        let detail = FixDetail::manual(&diagnostic);
        assert!(!detail.automatic);
        assert_eq!(detail.target, None);
        assert_eq!(detail.range, None);
    }

    #[test]
    fn test_fix_detail_serializes_nulls() {
        let diagnostic = FeatherDiagnostic::new("GM1000", "Stray break");
        let detail = FixDetail::automatic(&diagnostic).with_range(Some(TextRange::new(3, 9)));
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["range"]["start"], 3);
        assert!(value["target"].is_null());
        assert_eq!(value["automatic"], true);
    }

    #[test]
    fn test_line_index() {
        let index = LineIndex::new("a\nbc\n\nd");
        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.line_col(3), (2, 2));
        assert_eq!(index.line_col(6), (4, 1));
    }
}
