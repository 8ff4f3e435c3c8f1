//! Engine configuration

use serde::{Deserialize, Serialize};

/// Feature flags read by individual fixers. Every field has a default, so a
/// partial JSON object (or `{}`) deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixOptions {
    /// Delete a `vertex_end` that has no `vertex_begin` instead of
    /// synthesising the missing begin call
    pub remove_standalone_vertex_end: bool,
    /// Record a non-automatic fix once per id when a fixer made no edit
    pub record_unfixed_as_manual: bool,
    /// Rename `var alias = argumentN;` locals to documented parameter names
    pub rename_argument_aliases: bool,
    pub reserved_identifier_prefix: String,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            remove_standalone_vertex_end: false,
            record_unfixed_as_manual: true,
            rename_argument_aliases: true,
            reserved_identifier_prefix: "__featherFix_".to_string(),
        }
    }
}

impl FixOptions {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options = FixOptions::from_json(r#"{"remove_standalone_vertex_end": true}"#).unwrap();
        assert!(options.remove_standalone_vertex_end);
        assert!(options.record_unfixed_as_manual);
        assert_eq!(options.reserved_identifier_prefix, "__featherFix_");
    }
}
