//! GM1002: `globalvar` declarations
//!
//! The declaration goes away and every reference becomes `global.name`,
//! except inside functions that declare a parameter or local of that name.

use gml_diagnostics::FeatherDiagnostic;
use gml_parser::{Expr, ExprKind, Function, Ident, NodeIdGen, Program, StmtKind};
use rustc_hash::FxHashSet;

use crate::context::FixContext;
use crate::error::FixError;
use crate::fixer::{range_of, AppliedFix, Fixer};
use crate::matchers::scope::local_names;
use crate::walk::{visit_stmt_lists, walk_expr_mut, walk_function_mut, walk_stmts_mut, StatementCursor, VisitMut};

pub struct GlobalVarDeclaration {
    diagnostic: FeatherDiagnostic,
}

impl GlobalVarDeclaration {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

struct Qualify<'a> {
    names: &'a FxHashSet<String>,
    ids: &'a mut NodeIdGen,
    /// Names hidden by the enclosing functions
    shadowed: Vec<FxHashSet<String>>,
    rewritten: usize,
}

impl Qualify<'_> {
    fn is_shadowed(&self, name: &str) -> bool {
        self.shadowed.iter().any(|frame| frame.contains(name))
    }
}

impl VisitMut for Qualify<'_> {
    fn visit_function(&mut self, func: &mut Function) {
        let mut frame = local_names(&func.body.statements);
        frame.extend(func.params.iter().map(|p| p.name.name.clone()));
        frame.retain(|name| self.names.contains(name));
        self.shadowed.push(frame);
        walk_function_mut(self, func);
        self.shadowed.pop();
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        if let ExprKind::Identifier(name) = &expr.kind {
            if self.names.contains(name.as_str()) && !self.is_shadowed(name) {
                let field = Ident::new(name.clone(), expr.span);
                let object = Expr::new(self.ids.fresh(), expr.span, ExprKind::Identifier("global".to_string()));
                expr.kind = ExprKind::Member { object: Box::new(object), field };
                self.rewritten += 1;
            }
            return;
        }
        walk_expr_mut(self, expr);
    }
}

impl Fixer for GlobalVarDeclaration {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let Program { body, ids, .. } = program;
        let mut names = FxHashSet::default();
        let mut fixes = Vec::new();

        visit_stmt_lists(body, &mut |list, cx| {
            let mut cursor = StatementCursor::new();
            while !cursor.is_done(list) {
                let at = cursor.index();
                if matches!(list[at].kind, StmtKind::GlobalVarDecl { .. }) {
                    let removed = cursor.remove(list, at);
                    if let StmtKind::GlobalVarDecl { names: declared } = removed.kind {
                        for ident in declared {
                            fixes.push(AppliedFix::new(
                                self.detail()
                                    .with_target(ident.name.as_str())
                                    .with_replacement(format!("global.{}", ident.name))
                                    .with_range(range_of(removed.span)),
                                cx.owner,
                            ));
                            names.insert(ident.name);
                        }
                    }
                }
                cursor.advance();
            }
        });

        if !names.is_empty() {
            let mut qualify = Qualify { names: &names, ids, shadowed: Vec::new(), rewritten: 0 };
            walk_stmts_mut(&mut qualify, body);
            tracing::trace!(names = names.len(), references = qualify.rewritten, "qualified globalvar references");
        }
        Ok(fixes)
    }
}
