//! GM1058: functions instantiated with `new` must be constructors

use gml_diagnostics::FeatherDiagnostic;
use gml_parser::{Expr, ExprKind, Program, StmtKind};
use rustc_hash::FxHashSet;

use crate::context::FixContext;
use crate::error::FixError;
use crate::fixer::{range_of, AppliedFix, Fixer};
use crate::walk::{visit_stmt_lists, walk_expr, walk_stmts, Visit};

/// Names used as `new Name(...)` anywhere in `program`
fn instantiated_names(program: &Program) -> FxHashSet<String> {
    struct News(FxHashSet<String>);
    impl Visit for News {
        fn visit_expr(&mut self, expr: &Expr) {
            if let ExprKind::New { callee, .. } = &expr.kind {
                if let Some(name) = callee.unparenthesized().as_identifier() {
                    self.0.insert(name.to_string());
                }
            }
            walk_expr(self, expr);
        }
    }
    let mut news = News(FxHashSet::default());
    walk_stmts(&mut news, &program.body);
    news.0
}

pub struct MissingConstructor {
    diagnostic: FeatherDiagnostic,
}

impl MissingConstructor {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

impl Fixer for MissingConstructor {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let names = instantiated_names(program);
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let mut fixes = Vec::new();
        visit_stmt_lists(&mut program.body, &mut |list, _cx| {
            for stmt in list.iter_mut() {
                let (id, span) = (stmt.id, stmt.span);
                let StmtKind::FunctionDecl(func) = &mut stmt.kind else {
                    continue;
                };
                let Some(name) = &func.name else {
                    continue;
                };
                if func.is_constructor || !names.contains(&name.name) {
                    continue;
                }
                let target = name.name.clone();
                func.is_constructor = true;
                fixes.push(AppliedFix::new(self.detail().with_target(target).with_range(range_of(span)), id));
            }
        });
        Ok(fixes)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{assert_fix, assert_no_fix};

    #[test]
    fn test_constructor_added() {
        let fixes = assert_fix(
            "GM1058",
            "function Point(x, y) { self.x = x; }\np = new Point(1, 2);",
            "function Point(x, y) constructor { self.x = x; }\np = new Point(1, 2);",
        );
        assert_eq!(fixes[0].target.as_deref(), Some("Point"));
    }

    #[test]
    fn test_plain_functions_and_constructors_kept() {
        assert_no_fix("GM1058", "function Point() constructor {}\np = new Point();");
        assert_no_fix("GM1058", "function helper() {}\nhelper();");
    }
}
