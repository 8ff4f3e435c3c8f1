//! Local-name queries and scoped renames
//!
//! GML `var` is function scoped, so both helpers stop at nested function
//! bodies.

use gml_parser::{Expr, ExprKind, Function, NodeId, Stmt, StmtKind};
use rustc_hash::FxHashSet;

use crate::walk::{walk_expr_mut, walk_stmt, walk_stmt_mut, walk_stmts, walk_stmts_mut, Visit, VisitMut};

/// Names declared with `var` in `stmts`, nested blocks included but not
/// nested functions
pub fn local_names(stmts: &[Stmt]) -> FxHashSet<String> {
    struct Locals(FxHashSet<String>);
    impl Visit for Locals {
        fn visit_stmt(&mut self, stmt: &Stmt) {
            if let StmtKind::VarDecl { declarations, .. } = &stmt.kind {
                self.0.extend(declarations.iter().map(|d| d.name.name.clone()));
            }
            walk_stmt(self, stmt);
        }

        fn visit_function(&mut self, _func: &Function) {}
    }
    let mut locals = Locals(FxHashSet::default());
    walk_stmts(&mut locals, stmts);
    locals.0
}

/// Rename a local: every identifier reference and `var` declaration of
/// `from` in `stmts`, not descending into nested functions. Member fields,
/// struct keys and parameters are left alone. Returns the renamed references.
pub fn rename_in_scope(stmts: &mut [Stmt], from: &str, to: &str) -> Vec<NodeId> {
    struct Rename<'n> {
        from: &'n str,
        to: &'n str,
        renamed: Vec<NodeId>,
    }
    impl VisitMut for Rename<'_> {
        fn visit_stmt(&mut self, stmt: &mut Stmt) {
            if let StmtKind::VarDecl { declarations, .. } = &mut stmt.kind {
                for decl in declarations.iter_mut().filter(|d| d.name.name == self.from) {
                    decl.name.name = self.to.to_string();
                    self.renamed.push(decl.id);
                }
            }
            walk_stmt_mut(self, stmt);
        }

        fn visit_expr(&mut self, expr: &mut Expr) {
            if let ExprKind::Identifier(name) = &mut expr.kind {
                if name == self.from {
                    *name = self.to.to_string();
                    self.renamed.push(expr.id);
                }
                return;
            }
            walk_expr_mut(self, expr);
        }

        fn visit_function(&mut self, _func: &mut Function) {}
    }
    let mut rename = Rename { from, to, renamed: Vec::new() };
    walk_stmts_mut(&mut rename, stmts);
    rename.renamed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::parse;

    #[test]
    fn test_rename_in_scope_skips_members_and_functions() {
        let mut program = parse("var score = 1; obj.score = score; f = function() { return score; };");
        let renamed = rename_in_scope(&mut program.body, "score", "__featherFix_score");
        assert_eq!(renamed.len(), 2);
        let expected = parse("var __featherFix_score = 1; obj.score = __featherFix_score; f = function() { return score; };");
        assert_eq!(program, expected);
    }

    #[test]
    fn test_local_names() {
        let program = parse("var a = 1; if (c) { var b; } f = function() { var c; };");
        let names = local_names(&program.body);
        assert!(names.contains("a") && names.contains("b"));
        assert!(!names.contains("c"));
    }
}
