//! GM1017/GM1023: deprecated functions and constants
//!
//! Old → new pairs are read from the diagnostic's bad/good examples when the
//! run starts (see `NameRegistry`). Only identifier references are rewritten:
//! declaration names, parameters and member fields are not references.

use gml_diagnostics::FeatherDiagnostic;
use gml_parser::{Expr, ExprKind, Program};

use crate::context::FixContext;
use crate::error::FixError;
use crate::fixer::{range_of, AppliedFix, Fixer};
use crate::walk::{walk_expr_mut, walk_stmts_mut, VisitMut};

pub struct DeprecatedNames {
    diagnostic: FeatherDiagnostic,
}

impl DeprecatedNames {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

struct Substitute<'a> {
    fixer: &'a DeprecatedNames,
    pairs: &'a [(String, String)],
    fixes: Vec<AppliedFix>,
}

impl VisitMut for Substitute<'_> {
    fn visit_expr(&mut self, expr: &mut Expr) {
        if let ExprKind::Identifier(name) = &mut expr.kind {
            if let Some((old, new)) = self.pairs.iter().find(|(old, _)| *old == *name) {
                *name = new.clone();
                self.fixes.push(AppliedFix::new(
                    self.fixer.detail().with_target(old.as_str()).with_replacement(new.as_str()).with_range(range_of(expr.span)),
                    expr.id,
                ));
            }
            return;
        }
        walk_expr_mut(self, expr);
    }
}

impl Fixer for DeprecatedNames {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let pairs = ctx.names.substitutions(&self.diagnostic.id);
        if pairs.is_empty() {
            return Ok(Vec::new());
        }
        let mut substitute = Substitute { fixer: self, pairs, fixes: Vec::new() };
        walk_stmts_mut(&mut substitute, &mut program.body);
        Ok(substitute.fixes)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{assert_fix, assert_no_fix};

    #[test]
    fn test_deprecated_function_replaced() {
        let fixes = assert_fix(
            "GM1017",
            "var size = array_length_1d(items);",
            "var size = array_length(items);",
        );
        assert_eq!(fixes[0].target.as_deref(), Some("array_length_1d"));
        assert_eq!(fixes[0].replacement.as_deref(), Some("array_length"));
    }

    #[test]
    fn test_deprecated_constant_replaced_everywhere() {
        let fixes = assert_fix(
            "GM1023",
            "if (os_type == os_win32) { platform = os_win32; }",
            "if (os_type == os_windows) { platform = os_windows; }",
        );
        assert_eq!(fixes.len(), 2);
    }

    #[test]
    fn test_member_named_like_old_name_kept() {
        assert_no_fix("GM1023", "settings.os_win32 = 1;");
    }
}
