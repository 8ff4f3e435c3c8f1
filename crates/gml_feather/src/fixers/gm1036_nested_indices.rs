//! GM1036: `a[i, j]` on a plain array becomes `a[i][j]`

use gml_diagnostics::FeatherDiagnostic;
use gml_parser::{Accessor, Expr, ExprKind, Literal, NodeIdGen, Program};

use crate::context::FixContext;
use crate::error::FixError;
use crate::fixer::{range_of, AppliedFix, Fixer};
use crate::walk::{walk_expr_mut, walk_stmts_mut, VisitMut};

pub struct NestedIndices {
    diagnostic: FeatherDiagnostic,
}

impl NestedIndices {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

struct Nest<'a> {
    fixer: &'a NestedIndices,
    ids: &'a mut NodeIdGen,
    fixes: Vec<AppliedFix>,
}

impl VisitMut for Nest<'_> {
    fn visit_expr(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
        let ExprKind::Index { object, accessor: Accessor::Plain, indices } = &mut expr.kind else {
            return;
        };
        if indices.len() < 2 {
            return;
        }
        let target = object.as_identifier().map(str::to_string);
        // Every index but the last wraps the object one level deeper
        let last = indices.pop();
        let placeholder = Expr::new(self.ids.fresh(), None, ExprKind::Literal(Literal::Undefined));
        let mut nested = std::mem::replace(object.as_mut(), placeholder);
        for index in indices.drain(..) {
            nested = Expr::new(
                self.ids.fresh(),
                expr.span,
                ExprKind::Index { object: Box::new(nested), accessor: Accessor::Plain, indices: vec![index] },
            );
        }
        **object = nested;
        indices.extend(last);

        let mut detail = self.fixer.detail().with_range(range_of(expr.span));
        detail.target = target;
        self.fixes.push(AppliedFix::new(detail, expr.id));
    }
}

impl Fixer for NestedIndices {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let Program { body, ids, .. } = program;
        let mut nest = Nest { fixer: self, ids, fixes: Vec::new() };
        walk_stmts_mut(&mut nest, body);
        Ok(nest.fixes)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{assert_fix, assert_no_fix};

    #[test]
    fn test_two_indices_nested() {
        let fixes = assert_fix("GM1036", "x = grid[i, j];", "x = grid[i][j];");
        assert_eq!(fixes[0].target.as_deref(), Some("grid"));
    }

    #[test]
    fn test_three_indices_and_assignment_target() {
        assert_fix("GM1036", "cube[a, b, c] = 1;", "cube[a][b][c] = 1;");
    }

    #[test]
    fn test_accessors_and_single_index_kept() {
        assert_no_fix("GM1036", "x = grid[# i, j];");
        assert_no_fix("GM1036", "x = list[i][j];");
    }
}
