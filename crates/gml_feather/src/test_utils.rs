use gml_diagnostics::{DiagnosticCatalog, FeatherDiagnostic, FixDetail};
use gml_parser::{Expr, Program, Stmt};

use crate::context::FixContext;
use crate::keywords::NameRegistry;
use crate::matchers::calls::{call_name, stmt_call_name};
use crate::options::FixOptions;
use crate::preprocess::PreprocessMetadata;
use crate::walk::{walk_expr, walk_stmts, Visit};

pub fn parse(source: &str) -> Program {
    match gml_parser::parse(source) {
        Ok(program) => program,
        Err(e) => panic!("Parse errors in test source: {:?}", e),
    }
}

/// Run `f` with a default context over an empty source
pub fn with_context<R>(f: impl FnOnce(&FixContext) -> R) -> R {
    let metadata = PreprocessMetadata::default();
    let options = FixOptions::default();
    let names = NameRegistry::default();
    f(&FixContext::new("", &metadata, &options, &names))
}

/// The built-in catalog entry for `id`
pub fn diagnostic(id: &str) -> FeatherDiagnostic {
    match crate::builtin_catalog().get(id) {
        Some(diagnostic) => diagnostic.clone(),
        None => panic!("No built-in diagnostic '{}'", id),
    }
}

/// Run the full pipeline with a catalog holding only `id`
pub fn run_fixer(id: &str, source: &str) -> (Program, Vec<FixDetail>) {
    run_fixer_with(id, source, &FixOptions::default())
}

pub fn run_fixer_with(id: &str, source: &str, options: &FixOptions) -> (Program, Vec<FixDetail>) {
    let catalog: DiagnosticCatalog = std::iter::once(diagnostic(id)).collect();
    run_catalog(&catalog, source, options)
}

pub fn run_catalog(catalog: &DiagnosticCatalog, source: &str, options: &FixOptions) -> (Program, Vec<FixDetail>) {
    match crate::fix_source(source, catalog, options) {
        Ok(outcome) => (outcome.program, outcome.fixes),
        Err(e) => panic!("Fixing failed: {}", e),
    }
}

/// Assert that fixing `source` for `id` yields the tree of `expected`;
/// returns the automatic records
pub fn assert_fix(id: &str, source: &str, expected: &str) -> Vec<FixDetail> {
    let (program, fixes) = run_fixer(id, source);
    let expected_program = parse(expected);
    if program != expected_program {
        panic!(
            "Fix {} produced an unexpected tree.\n  source:   {}\n  expected: {}\n  got body: {:#?}",
            id, source, expected, program.body
        );
    }
    let automatic: Vec<_> = fixes.into_iter().filter(|f| f.automatic).collect();
    assert!(!automatic.is_empty(), "Expected at least one automatic fix for {}", id);
    automatic
}

/// Assert that `id` leaves `source` untouched and makes no automatic fix
pub fn assert_no_fix(id: &str, source: &str) {
    let (program, fixes) = run_fixer(id, source);
    assert_eq!(program, parse(source), "Expected {} to leave the tree unchanged", id);
    let automatic: Vec<_> = fixes.iter().filter(|f| f.automatic).map(|f| f.id.clone()).collect();
    assert!(automatic.is_empty(), "Expected no automatic fixes, but found: {:?}", automatic);
}

/// Callee names of the expression statements of a list
pub fn call_names(stmts: &[Stmt]) -> Vec<&str> {
    stmts.iter().filter_map(stmt_call_name).collect()
}

/// First call to `name` anywhere in `stmts`, cloned
pub fn find_call(stmts: &[Stmt], name: &str) -> Option<Expr> {
    struct Find<'n> {
        name: &'n str,
        found: Option<Expr>,
    }
    impl Visit for Find<'_> {
        fn visit_expr(&mut self, expr: &Expr) {
            if self.found.is_some() {
                return;
            }
            if call_name(expr) == Some(self.name) {
                self.found = Some(expr.clone());
                return;
            }
            walk_expr(self, expr);
        }
    }
    let mut find = Find { name, found: None };
    walk_stmts(&mut find, stmts);
    find.found
}
