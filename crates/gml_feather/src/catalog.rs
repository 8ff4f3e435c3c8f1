//! The built-in diagnostic catalog
//!
//! Documents every rule the engine knows, in the order the fixers run. The
//! bad/good examples are live data: substitution and missing-argument fixers
//! derive their replacements from them.

use gml_diagnostics::{DiagnosticCatalog, FeatherDiagnostic};
use tracing::debug;

use crate::error::FixError;

fn entry(id: &str, title: &str, bad: &str, good: &str, correction: &str) -> FeatherDiagnostic {
    FeatherDiagnostic::new(id, title)
        .with_description(title)
        .with_examples(bad, good)
        .with_correction(correction)
}

/// Decode a caller-supplied catalog (a JSON array of diagnostics)
pub fn load_catalog(json: &str) -> Result<DiagnosticCatalog, FixError> {
    let catalog = DiagnosticCatalog::from_json(json)?;
    debug!(diagnostics = catalog.len(), "catalog decoded");
    Ok(catalog)
}

pub fn builtin_catalog() -> DiagnosticCatalog {
    vec![
        entry(
            "GM1000",
            "No enclosing loop or switch for break",
            "if (done) { break; }",
            "if (done) { }",
            "Remove the break statement.",
        ),
        entry(
            "GM1001",
            "No enclosing loop for continue",
            "if (skip) { continue; }",
            "if (skip) { }",
            "Remove the continue statement.",
        ),
        entry(
            "GM1002",
            "globalvar is deprecated",
            "globalvar high_score;\nhigh_score = 0;",
            "global.high_score = 0;",
            "Use the global struct instead of globalvar.",
        ),
        entry(
            "GM1003",
            "Enum values must be integers",
            "enum Level { Low = \"1\", High = \"2\" }",
            "enum Level { Low = 1, High = 2 }",
            "Write enum values as numbers, not strings.",
        ),
        entry(
            "GM1004",
            "Duplicate enum member",
            "enum Dir { Up, Down, Up }",
            "enum Dir { Up, Down }",
            "Remove the duplicate member.",
        ),
        entry(
            "GM1005",
            "Missing function arguments",
            "draw_sprite(spr_player, 0);",
            "draw_sprite(spr_player, 0, x, y);",
            "Supply every required argument.",
        ),
        entry(
            "GM1008",
            "Cannot declare a read-only built-in variable",
            "var fps = 60;",
            "var __featherFix_fps = 60;",
            "Rename the local variable.",
        ),
        entry(
            "GM1010",
            "Operand types do not match",
            "var total = \"5\" + 3;",
            "var total = real(\"5\") + 3;",
            "Convert one operand explicitly.",
        ),
        entry(
            "GM1013",
            "Struct field used before it is set",
            "function Foo() constructor { show_debug_message(value); }",
            "function Foo() constructor { value = 0; show_debug_message(value); }",
            "Initialise the field before reading it.",
        ),
        entry(
            "GM1016",
            "Statement has no effect",
            "true;",
            "",
            "Remove the statement.",
        ),
        entry(
            "GM1017",
            "Deprecated function",
            "var n = array_length_1d(list);",
            "var n = array_length(list);",
            "Use the replacement function.",
        ),
        entry(
            "GM1023",
            "Deprecated constant",
            "if (os_type == os_win32) { }",
            "if (os_type == os_windows) { }",
            "Use the replacement constant.",
        ),
        entry(
            "GM1029",
            "Malformed number",
            "var half = .5;\nvar whole = 5.;",
            "var half = 0.5;\nvar whole = 5.0;",
            "Write the number with digits on both sides of the point.",
        ),
        entry(
            "GM1030",
            "Reserved identifier",
            "var score = 0;",
            "var __featherFix_score = 0;",
            "Rename the identifier.",
        ),
        entry(
            "GM1032",
            "Argument indices are not sequential",
            "function f() { return argument0 + argument2; }",
            "function f() { return argument0 + argument1; }",
            "Use consecutive argument indices.",
        ),
        entry(
            "GM1033",
            "Duplicate semicolon",
            "x = 1;;",
            "x = 1;",
            "Remove the extra semicolons.",
        ),
        entry(
            "GM1034",
            "argumentN used in a function with named parameters",
            "function f(a, b) { return argument1; }",
            "function f(a, b) { return b; }",
            "Use the parameter name.",
        ),
        entry(
            "GM1036",
            "Multi-dimensional array syntax",
            "var v = grid[1, 2];",
            "var v = grid[1][2];",
            "Index one dimension at a time.",
        ),
        entry(
            "GM1038",
            "Duplicate macro",
            "#macro SPEED 4\n#macro SPEED 4",
            "#macro SPEED 4",
            "Remove the duplicate macro.",
        ),
        entry(
            "GM1041",
            "Wrong argument type",
            "instance_create_depth(0, 0, 0, \"obj_player\");",
            "instance_create_depth(0, 0, 0, obj_player);",
            "Pass an asset reference.",
        ),
        entry(
            "GM1051",
            "Macro ends with a semicolon",
            "#macro SPEED 4;",
            "#macro SPEED 4",
            "Remove the trailing semicolon.",
        ),
        entry(
            "GM1052",
            "Delete on a non-struct value",
            "var n = 3;\ndelete n;",
            "var n = 3;\nn = undefined;",
            "Only delete structs.",
        ),
        entry(
            "GM1056",
            "Required parameter after an optional one",
            "function f(a = 1, b) { }",
            "function f(a = 1, b = undefined) { }",
            "Give the parameter a default value.",
        ),
        entry(
            "GM1058",
            "new used on a non-constructor function",
            "function Point() { }\nvar p = new Point();",
            "function Point() constructor { }\nvar p = new Point();",
            "Mark the function as a constructor.",
        ),
        entry(
            "GM1059",
            "Duplicate parameter",
            "function f(a, a) { }",
            "function f(a) { }",
            "Remove the duplicate parameter.",
        ),
        entry(
            "GM1062",
            "Malformed type annotation",
            "/// @param {String} name",
            "/// @param {string} name",
            "Use the canonical type name.",
        ),
        entry(
            "GM1063",
            "Possibly undefined value in arithmetic",
            "var t = tex ?? 0 + 1;",
            "var t = (tex ?? 0) + 1;",
            "Check the value before using it.",
        ),
        entry(
            "GM1100",
            "Unexpected dereference",
            "var value\n*value = 4;",
            "var value\nvalue = 4;",
            "Remove the dereference.",
        ),
        entry(
            "GM2000",
            "Blend mode not reset",
            "gpu_set_blendmode(bm_add);\ndraw_self();",
            "gpu_set_blendmode(bm_add);\ndraw_self();\ngpu_set_blendmode(bm_normal);",
            "Reset the blend mode to bm_normal.",
        ),
        entry(
            "GM2003",
            "Shader not reset",
            "shader_set(sh_glow);\ndraw_self();",
            "shader_set(sh_glow);\ndraw_self();\nshader_reset();",
            "Call shader_reset.",
        ),
        entry(
            "GM2004",
            "for loop can be a repeat loop",
            "for (var i = 0; i < 10; i++) { spawn(); }",
            "repeat (10) { spawn(); }",
            "Use repeat when the loop index is unused.",
        ),
        entry(
            "GM2005",
            "Surface target not reset",
            "surface_set_target(surf);\ndraw_self();",
            "surface_set_target(surf);\ndraw_self();\nsurface_reset_target();",
            "Call surface_reset_target.",
        ),
        entry(
            "GM2007",
            "Assignment to all.",
            "all.visible = false;",
            "with (all) { visible = false; }",
            "Use a with statement.",
        ),
        entry(
            "GM2009",
            "Unbalanced vertex_format_begin/end",
            "vertex_format_end();\nvertex_format_begin();\nvertex_format_end();",
            "vertex_format_begin();\nvertex_format_end();",
            "Remove the unmatched call.",
        ),
        entry(
            "GM2011",
            "vertex_end without vertex_begin",
            "fmt = vertex_format_end();\nvertex_end(vb);",
            "fmt = vertex_format_end();\nvertex_begin(vb, fmt);\nvertex_end(vb);",
            "Begin the vertex buffer first.",
        ),
        entry(
            "GM2012",
            "vertex_format_begin without vertex_format_end",
            "vertex_format_begin();\nvertex_format_add_position();",
            "vertex_format_begin();\nvertex_format_add_position();\nvertex_format_end();",
            "Call vertex_format_end.",
        ),
        entry(
            "GM2015",
            "vertex_begin without vertex_end",
            "vertex_begin(vb, fmt);\nvertex_position(vb, 0, 0);",
            "vertex_begin(vb, fmt);\nvertex_position(vb, 0, 0);\nvertex_end(vb);",
            "Call vertex_end.",
        ),
        entry(
            "GM2017",
            "Field may be uninitialised",
            "function Foo() constructor { show_debug_message(self.count); }",
            "function Foo() constructor { count = 0; show_debug_message(self.count); }",
            "Initialise the field in the constructor.",
        ),
        entry(
            "GM2020",
            "Fog not reset",
            "gpu_set_fog(true, c_red, 0, 100);\ndraw_self();",
            "gpu_set_fog(true, c_red, 0, 100);\ndraw_self();\ngpu_set_fog(false, c_white, 0, 1);",
            "Disable fog again.",
        ),
        entry(
            "GM2023",
            "Possible division by zero",
            "var ratio = a / 0;",
            "var ratio = a / max(b, 1);",
            "Guard the divisor.",
        ),
        entry(
            "GM2025",
            "Unbalanced draw_primitive_begin/end",
            "draw_primitive_end();\ndraw_primitive_begin(pr_linelist);\ndraw_primitive_end();",
            "draw_primitive_begin(pr_linelist);\ndraw_primitive_end();",
            "Remove the unmatched call.",
        ),
        entry(
            "GM2026",
            "Z testing not reset",
            "gpu_set_ztestenable(true);\ndraw_self();",
            "gpu_set_ztestenable(true);\ndraw_self();\ngpu_set_ztestenable(false);",
            "Disable z testing again.",
        ),
        entry(
            "GM2027",
            "Z writing not reset",
            "gpu_set_zwriteenable(false);\ndraw_self();",
            "gpu_set_zwriteenable(false);\ndraw_self();\ngpu_set_zwriteenable(true);",
            "Enable z writing again.",
        ),
        entry(
            "GM2028",
            "draw_primitive_begin without draw_primitive_end",
            "draw_primitive_begin(pr_trianglelist);\ndraw_vertex(0, 0);",
            "draw_primitive_begin(pr_trianglelist);\ndraw_vertex(0, 0);\ndraw_primitive_end();",
            "Call draw_primitive_end.",
        ),
        entry(
            "GM2029",
            "Draw alpha not reset",
            "draw_set_alpha(0.5);\ndraw_self();",
            "draw_set_alpha(0.5);\ndraw_self();\ndraw_set_alpha(1);",
            "Reset the alpha to 1.",
        ),
        entry(
            "GM2031",
            "file_find_first without file_find_close",
            "var name = file_find_first(\"*.sav\", 0);",
            "var name = file_find_first(\"*.sav\", 0);\nfile_find_close();",
            "Call file_find_close.",
        ),
        entry(
            "GM2033",
            "Instance variable in a static function",
            "static f = function() { return x; };",
            "static f = function() { return other.x; };",
            "Qualify the variable.",
        ),
        entry(
            "GM2035",
            "gpu_push_state without gpu_pop_state",
            "gpu_push_state();\ndraw_self();",
            "gpu_push_state();\ndraw_self();\ngpu_pop_state();",
            "Call gpu_pop_state.",
        ),
        entry(
            "GM2040",
            "Event inherited without a parent",
            "event_inherited();",
            "",
            "Give the object a parent or remove the call.",
        ),
        entry(
            "GM2042",
            "Unbalanced gpu_push_state/gpu_pop_state",
            "gpu_pop_state();\ngpu_push_state();\ngpu_pop_state();",
            "gpu_push_state();\ngpu_pop_state();",
            "Remove the unmatched call.",
        ),
        entry(
            "GM2043",
            "Local variable used outside its block",
            "if (ready) { var msg = \"go\"; }\nshow_debug_message(msg);",
            "var msg;\nif (ready) { msg = \"go\"; }\nshow_debug_message(msg);",
            "Declare the variable before the block.",
        ),
        entry(
            "GM2044",
            "Local variable declared twice",
            "var speed_cap = 4;\nvar speed_cap = 8;",
            "var speed_cap = 4;\nspeed_cap = 8;",
            "Assign instead of redeclaring.",
        ),
        entry(
            "GM2046",
            "Surface created without being freed",
            "surf = surface_create(64, 64);",
            "surf = surface_create(64, 64);\nsurface_free(surf);",
            "Free the surface when done.",
        ),
        entry(
            "GM2048",
            "Blend enable not reset",
            "gpu_set_blendenable(false);\ndraw_self();",
            "gpu_set_blendenable(false);\ndraw_self();\ngpu_set_blendenable(true);",
            "Enable blending again.",
        ),
        entry(
            "GM2050",
            "Cull mode not reset",
            "gpu_set_cullmode(cull_clockwise);\ndraw_self();",
            "gpu_set_cullmode(cull_clockwise);\ndraw_self();\ngpu_set_cullmode(cull_noculling);",
            "Reset the cull mode.",
        ),
        entry(
            "GM2051",
            "Colour write enable not reset",
            "gpu_set_colourwriteenable(true, false, false, true);\ndraw_self();",
            "gpu_set_colourwriteenable(true, false, false, true);\ndraw_self();\ngpu_set_colourwriteenable(true, true, true, true);",
            "Enable every channel again.",
        ),
        entry(
            "GM2052",
            "Alpha test not reset",
            "gpu_set_alphatestenable(true);\ndraw_self();",
            "gpu_set_alphatestenable(true);\ndraw_self();\ngpu_set_alphatestenable(false);",
            "Disable alpha testing again.",
        ),
        entry(
            "GM2053",
            "Alpha test reference not reset",
            "gpu_set_alphatestref(128);\ndraw_self();",
            "gpu_set_alphatestref(128);\ndraw_self();\ngpu_set_alphatestref(0);",
            "Reset the reference value to 0.",
        ),
        entry(
            "GM2054",
            "Texture repeat not reset",
            "gpu_set_texrepeat(true);\ndraw_self();",
            "gpu_set_texrepeat(true);\ndraw_self();\ngpu_set_texrepeat(false);",
            "Disable texture repeat again.",
        ),
        entry(
            "GM2056",
            "Texture filtering not reset",
            "gpu_set_texfilter(true);\ndraw_self();",
            "gpu_set_texfilter(true);\ndraw_self();\ngpu_set_texfilter(false);",
            "Disable texture filtering again.",
        ),
        entry(
            "GM2061",
            "Undefined check can use ??=",
            "if (name == undefined) name = \"anon\";",
            "name ??= \"anon\";",
            "Use the nullish assignment operator.",
        ),
    ]
    .into_iter()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FixerRegistry;

    #[test]
    fn test_every_entry_has_a_fixer() {
        let registry = FixerRegistry::with_builtins();
        let catalog = builtin_catalog();
        let missing: Vec<_> = catalog.iter().filter(|d| !registry.is_registered(&d.id)).map(|d| d.id.clone()).collect();
        assert!(missing.is_empty(), "Unregistered ids: {:?}", missing);
        assert_eq!(catalog.len(), registry.len());
    }

    #[test]
    fn test_ids_are_unique() {
        let catalog = builtin_catalog();
        let mut ids: Vec<_> = catalog.iter().map(|d| d.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn test_load_catalog() {
        let catalog = load_catalog(r#"[{"id": "GM1000", "title": "Stray break"}]"#).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(matches!(load_catalog("{not json"), Err(FixError::Catalog(_))));
    }
}
