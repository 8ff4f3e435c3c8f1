//! Protected GML names and the per-run name registry
//!
//! Lists follow GMEdit's fnames markers: `*` read-only built-in variables,
//! plus the built-ins Feather treats as reserved identifiers.

use gml_diagnostics::DiagnosticCatalog;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::templates::diff_identifier_pairs;

/// Language keywords; never valid as a declaration name
pub const KEYWORDS: &[&str] = &[
    "globalvar", "var", "static",
    "if", "then", "else", "begin", "end", "for", "while", "do", "until", "repeat",
    "switch", "case", "default", "break", "continue", "with", "exit", "return",
    "self", "other", "noone", "all", "global", "local",
    "mod", "div", "not", "and", "or", "xor", "enum",
    "function", "constructor", "new", "delete", "throw", "try", "catch", "finally",
    "true", "false", "undefined",
];

/// Built-in variables that cannot be assigned (GM1008)
pub const READONLY_VARIABLES: &[&str] = &[
    // Instance
    "id", "object_index", "instance_count", "instance_id",
    // Time
    "fps", "fps_real", "current_time", "current_year", "current_month", "current_day",
    "current_weekday", "current_hour", "current_minute", "current_second", "delta_time",
    // Room
    "room_first", "room_last", "room_width", "room_height",
    // Events
    "event_type", "event_number", "event_object", "event_action",
    // Display and system
    "application_surface", "view_current", "display_aa", "webgl_enabled",
    "browser_width", "browser_height", "os_type", "os_device", "os_browser", "os_version",
    "mouse_x", "mouse_y",
    // Sprite
    "sprite_width", "sprite_height", "sprite_xoffset", "sprite_yoffset",
    "image_number", "bbox_left", "bbox_right", "bbox_top", "bbox_bottom",
    // Async and data
    "async_load", "event_data", "iap_data",
    // Game info
    "game_id", "game_display_name", "game_project_name", "game_save_id",
    "working_directory", "temp_directory", "cache_directory", "program_directory",
];

/// Built-in names Feather reserves (GM1030)
pub const RESERVED_IDENTIFIERS: &[&str] = &[
    // Global game state
    "score", "lives", "health", "room", "room_speed", "room_persistent",
    "keyboard_key", "keyboard_lastkey", "keyboard_lastchar", "keyboard_string",
    "debug_mode", "font_texture_page_size", "icon", "caption", "cursor",
    // Frequently shadowed runtime functions
    "string", "real", "int64", "bool", "ptr", "array_length", "array_push",
    "show_debug_message", "show_message", "draw_text", "draw_sprite", "draw_self",
    "instance_create_depth", "instance_create_layer", "instance_destroy",
    "ds_list_create", "ds_map_create", "irandom", "random", "choose", "clamp", "lerp",
    "point_distance", "point_direction", "abs", "sign", "floor", "ceil", "round",
    "min", "max", "sqr", "sqrt", "power", "sin", "cos", "tan",
];

/// Diagnostics whose replacements come from their example diff
const SUBSTITUTION_IDS: &[&str] = &["GM1017", "GM1023"];

pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// Names and substitutions consulted by the fixers, built once per run
#[derive(Debug, Clone)]
pub struct NameRegistry {
    readonly: FxHashSet<&'static str>,
    reserved: FxHashSet<&'static str>,
    substitutions: FxHashMap<String, Vec<(String, String)>>,
}

impl NameRegistry {
    pub fn from_catalog(catalog: &DiagnosticCatalog) -> Self {
        let mut substitutions: FxHashMap<String, Vec<(String, String)>> = FxHashMap::default();
        for diagnostic in catalog.iter().filter(|d| SUBSTITUTION_IDS.contains(&d.id.as_str())) {
            let pairs = diff_identifier_pairs(&diagnostic.bad_example, &diagnostic.good_example);
            debug!(id = %diagnostic.id, pairs = pairs.len(), "derived substitutions");
            let entry = substitutions.entry(diagnostic.id.clone()).or_default();
            for pair in pairs {
                if !entry.iter().any(|(old, _)| *old == pair.0) {
                    entry.push(pair);
                }
            }
        }
        Self {
            readonly: READONLY_VARIABLES.iter().copied().collect(),
            reserved: RESERVED_IDENTIFIERS.iter().copied().collect(),
            substitutions,
        }
    }

    pub fn is_readonly(&self, name: &str) -> bool {
        self.readonly.contains(name)
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    /// Old → new pairs for a substitution diagnostic
    pub fn substitutions(&self, id: &str) -> &[(String, String)] {
        self.substitutions.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for NameRegistry {
    fn default() -> Self {
        Self::from_catalog(&DiagnosticCatalog::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gml_diagnostics::FeatherDiagnostic;

    #[test]
    fn test_name_classes() {
        let names = NameRegistry::default();
        assert!(is_keyword("function"));
        assert!(names.is_readonly("fps"));
        assert!(names.is_reserved("score"));
        assert!(!names.is_reserved("my_score"));
    }

    #[test]
    fn test_substitutions_come_from_catalog() {
        let catalog: DiagnosticCatalog = [
            FeatherDiagnostic::new("GM1017", "Deprecated function")
                .with_examples("var n = array_length_1d(a);", "var n = array_length(a);"),
            FeatherDiagnostic::new("GM2000", "Blend mode").with_examples("a(b);", "c(d);"),
        ]
        .into_iter()
        .collect();
        let names = NameRegistry::from_catalog(&catalog);
        assert_eq!(names.substitutions("GM1017"), &[("array_length_1d".to_string(), "array_length".to_string())]);
        assert!(names.substitutions("GM2000").is_empty());
    }
}
