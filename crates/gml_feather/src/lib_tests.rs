use gml_diagnostics::{DiagnosticCatalog, TextRange};
use gml_parser::{ExprKind, NodeId, Program, StmtKind};

use super::*;
use crate::test_utils::{call_names, diagnostic, parse, run_catalog, run_fixer};

fn only(ids: &[&str]) -> DiagnosticCatalog {
    ids.iter().map(|id| diagnostic(id)).collect()
}

// ========== End-to-end scenarios ==========

#[test]
fn test_blendmode_reset_after_draw() {
    let (program, fixes) = run_fixer("GM2000", "gpu_set_blendmode(bm_add); draw_self();");
    assert_eq!(call_names(&program.body), vec!["gpu_set_blendmode", "draw_self", "gpu_set_blendmode"]);
    assert_eq!(program, parse("gpu_set_blendmode(bm_add); draw_self(); gpu_set_blendmode(bm_normal);"));
    assert_eq!(fixes.len(), 1);
}

#[test]
fn test_stray_break_removed_with_exact_range() {
    let source = "var a; if (a != b) {} else { break; }";
    let (program, fixes) = run_fixer("GM1000", source);
    let StmtKind::If { else_branch: Some(else_branch), .. } = &program.body[1].kind else {
        panic!("Expected if/else");
    };
    let StmtKind::Block(block) = &else_branch.kind else {
        panic!("Expected else block");
    };
    assert!(block.statements.is_empty());
    assert_eq!(fixes.len(), 1);
    assert_eq!(fixes[0].range, Some(TextRange::new(29, 35)));
    assert_eq!(&source[29..35], "break;");
}

#[test]
fn test_numeric_enum_string_through_pipeline() {
    let source = r#"enum E { A = "1", B = "x" }"#;
    let preprocessed = preprocess(source);
    assert_eq!(preprocessed.adjustments, vec![IndexAdjustment { index: 14, delta: 2 }]);

    let (program, fixes) = run_fixer("GM1003", source);
    let StmtKind::Enum { members, .. } = &program.body[0].kind else {
        panic!("Expected enum");
    };
    assert!(matches!(members[0].value.as_ref().map(|v| &v.kind), Some(ExprKind::Literal(gml_parser::Literal::Number(n))) if n == "1"));
    assert!(matches!(members[1].value.as_ref().map(|v| &v.kind), Some(ExprKind::Literal(gml_parser::Literal::String(_)))));
    assert_eq!(fixes.len(), 1);
    assert_eq!(fixes[0].range, Some(TextRange::new(13, 16)));
}

#[test]
fn test_argument_gap_renumbered() {
    let (program, fixes) = run_fixer("GM1032", "function f() { return argument0 + argument2; }");
    assert_eq!(program, parse("function f() { return argument0 + argument1; }"));
    assert_eq!(fixes.len(), 1);
    assert_eq!(fixes[0].target.as_deref(), Some("argument1"));
}

// ========== Registry ==========

#[test]
fn test_builtins_cover_the_catalog_once() {
    let registry = FixerRegistry::with_builtins();
    let catalog = builtin_catalog();
    assert_eq!(registry.len(), catalog.len());

    let mut ids: Vec<_> = catalog.iter().map(|d| d.id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), catalog.len());
}

#[test]
fn test_duplicate_catalog_entries_run_once() {
    let catalog = only(&["GM1000", "GM1000"]);
    let (_, fixes) = run_catalog(&catalog, "break;", &FixOptions::default());
    assert_eq!(fixes.len(), 1);
}

// ========== Laws ==========

#[test]
fn test_second_run_makes_no_automatic_fix() {
    let source = "\
/// @param {String} name
function greet() {
    var n = argument1;
    gpu_set_blendmode(bm_add);
    draw_self();
    if (n == undefined) n = \"you\";
    all.speed = .5;
    return n;
}
p = new greet();
x = grid[1, 2];
";
    let catalog = builtin_catalog();
    let options = FixOptions::default();
    let (mut program, first) = run_catalog(&catalog, source, &options);
    assert!(first.iter().any(|f| f.automatic));

    let before = program.clone();
    let metadata = preprocess(source).metadata;
    let second = apply_feather_fixes(&mut program, &catalog, source, &metadata, &options);
    let automatic: Vec<_> = second.iter().filter(|f| f.automatic).map(|f| f.id.as_str()).collect();
    assert!(automatic.is_empty(), "Second run still fixed: {:?}", automatic);
    assert_eq!(program, before);
}

fn push_pop_source(pattern: u32, len: u32) -> String {
    (0..len)
        .map(|bit| if pattern & (1 << bit) != 0 { "gpu_push_state();\n" } else { "gpu_pop_state();\n" })
        .collect()
}

fn depth_never_negative(program: &Program) -> bool {
    let mut depth = 0i32;
    for name in call_names(&program.body) {
        depth += if name == "gpu_push_state" { 1 } else { -1 };
        if depth < 0 {
            return false;
        }
    }
    true
}

#[test]
fn test_balance_laws_for_every_short_sequence() {
    let catalog = only(&["GM2042"]);
    let options = FixOptions::default();
    for len in 0..=6u32 {
        for pattern in 0..(1u32 << len) {
            let source = push_pop_source(pattern, len);
            let pushes = pattern.count_ones() as usize;
            let pops = len as usize - pushes;
            let (program, fixes) = run_catalog(&catalog, &source, &options);
            let remaining = call_names(&program.body);
            let automatic = fixes.iter().filter(|f| f.automatic).count();

            assert!(depth_never_negative(&program), "{:?} left unmatched pops", source);
            assert_eq!(automatic, len as usize - remaining.len(), "{:?}", source);
            if pops == 0 {
                // Only pushes: a missing pop, not an extra push
                assert_eq!(remaining.len(), len as usize, "{:?}", source);
            } else {
                let open = remaining.iter().filter(|n| **n == "gpu_push_state").count();
                assert_eq!(open * 2, remaining.len(), "{:?} is not balanced", source);
            }
        }
    }
}

#[test]
fn test_offsets_map_monotonically() {
    let source = "enum A { X = \"1\", Y = \"22\" }\nenum B { Z = \"33\" }\nfoo();\n";
    let result = preprocess(source);
    assert_eq!(result.adjustments.len(), 3);
    let mapped: Vec<u32> = (0..=result.source.len() as u32).map(|o| map_offset(&result.adjustments, o)).collect();
    assert!(mapped.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(mapped.last().copied(), Some(source.len() as u32));
}

#[test]
fn test_fix_ranges_lie_inside_the_original_source() {
    let source = "enum A { X = \"1\" }\nvar a\n*a = 4;\nx = .5;;\n#macro M 3;\nbreak;\n";
    let (_, fixes) = run_catalog(&builtin_catalog(), source, &FixOptions::default());
    let ranges: Vec<TextRange> = fixes.iter().filter_map(|f| f.range).collect();
    assert!(ranges.len() >= 5);
    for range in ranges {
        assert!(range.start <= range.end && range.end as usize <= source.len(), "{:?}", range);
    }
}

// ========== Robustness ==========

#[test]
fn test_valid_code_with_boolean_lines_still_parses() {
    let source = "x =\n    true;\nflags = [\n    false\n];\n";
    let outcome = fix_source(source, &builtin_catalog(), &FixOptions::default()).unwrap();
    assert_eq!(outcome.program, parse("x = true; flags = [false];"));
    assert!(outcome.fixes.iter().all(|f| f.id != "GM1016"));
}

#[test]
fn test_bare_else_reaches_list_fixers() {
    let (program, fixes) = run_catalog(
        &only(&["GM1000", "GM2000"]),
        "if (a) { b(); } else break;\nif (c) { d(); } else gpu_set_blendmode(bm_add);",
        &FixOptions::default(),
    );
    assert_eq!(
        program,
        parse("if (a) { b(); } else {}\nif (c) { d(); } else { gpu_set_blendmode(bm_add); gpu_set_blendmode(bm_normal); }")
    );
    assert_eq!(fixes.iter().filter(|f| f.automatic).count(), 2);
}

#[test]
fn test_unterminated_strings_never_panic() {
    for source in ["enum E { A = \"\u{e9}", "enum E { A = \"12", "x = \"\u{e9}\u{e9}", "enum E { A = @\"1"] {
        let result = std::panic::catch_unwind(|| fix_source(source, &builtin_catalog(), &FixOptions::default()));
        assert!(result.is_ok(), "{:?} panicked", source);
    }
}

#[test]
fn test_records_survive_removal_by_a_later_fixer() {
    let (mut program, fixes) = run_catalog(
        &only(&["GM1029", "GM2042"]),
        "gpu_pop_state(.5); gpu_push_state(); gpu_pop_state();",
        &FixOptions::default(),
    );
    assert_eq!(call_names(&program.body), vec!["gpu_push_state", "gpu_pop_state"]);
    assert!(fixes.iter().any(|f| f.id == "GM1029") && fixes.iter().any(|f| f.id == "GM2042"));

    let live = crate::walk::live_node_ids(&mut program.body);
    let keys: Vec<NodeId> = program.applied.nodes().collect();
    assert!(keys.iter().all(|node| *node == NodeId::ROOT || live.contains(node)), "{:?}", keys);
    assert_eq!(program.applied.for_node(NodeId::ROOT).iter().filter(|d| d.id == "GM1029").count(), 1);
}
