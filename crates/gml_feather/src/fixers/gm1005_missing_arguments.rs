//! GM1005: calls made with fewer arguments than the function needs
//!
//! The full argument list comes from the diagnostic's good example; calls to
//! the same function in the tree get the missing tail appended.

use gml_diagnostics::FeatherDiagnostic;
use gml_parser::{Expr, ExprKind, NodeIdGen, Program};
use tracing::debug;

use crate::context::FixContext;
use crate::error::FixError;
use crate::fixer::{range_of, AppliedFix, Fixer};
use crate::matchers::calls::call_name;
use crate::synth::Synth;
use crate::templates::{call_template, CallTemplate};
use crate::walk::{walk_expr_mut, walk_stmts_mut, VisitMut};

pub struct MissingArguments {
    diagnostic: FeatherDiagnostic,
    template: CallTemplate,
}

impl MissingArguments {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        match call_template(diagnostic) {
            Ok(template) => Some(Box::new(Self { diagnostic: diagnostic.clone(), template })),
            Err(e) => {
                debug!(id = %diagnostic.id, error = %e, "no argument template");
                None
            }
        }
    }
}

struct Complete<'a> {
    fixer: &'a MissingArguments,
    ids: &'a mut NodeIdGen,
    fixes: Vec<AppliedFix>,
}

impl VisitMut for Complete<'_> {
    fn visit_expr(&mut self, expr: &mut Expr) {
        // Arguments first, so nested calls are completed too
        walk_expr_mut(self, expr);

        let template = &self.fixer.template;
        if call_name(expr) != Some(template.callee.as_str()) {
            return;
        }
        let span = expr.span;
        let id = expr.id;
        let ExprKind::Call { args, .. } = &mut expr.kind else {
            return;
        };
        if args.len() >= template.args.len() {
            return;
        }
        let mut synth = Synth::new(self.ids, span);
        for arg in &template.args[args.len()..] {
            args.push(synth.instantiate(arg));
        }
        self.fixes.push(AppliedFix::new(
            self.fixer
                .detail()
                .with_target(template.callee.as_str())
                .with_range(range_of(span)),
            id,
        ));
    }
}

impl Fixer for MissingArguments {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let mut complete = Complete { fixer: self, ids: &mut program.ids, fixes: Vec::new() };
        walk_stmts_mut(&mut complete, &mut program.body);
        Ok(complete.fixes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_fix, assert_no_fix};

    #[test]
    fn test_template_arguments_appended() {
        let fixes = assert_fix(
            "GM1005",
            "draw_sprite(spr_enemy, 1);",
            "draw_sprite(spr_enemy, 1, x, y);",
        );
        assert_eq!(fixes[0].target.as_deref(), Some("draw_sprite"));
    }

    #[test]
    fn test_nested_call_completed() {
        assert_fix(
            "GM1005",
            "if (visible) { draw_sprite(spr_enemy, frame); }",
            "if (visible) { draw_sprite(spr_enemy, frame, x, y); }",
        );
    }

    #[test]
    fn test_complete_calls_untouched() {
        assert_no_fix("GM1005", "draw_sprite(spr_enemy, 1, 10, 20);");
        assert_no_fix("GM1005", "draw_self();");
    }

    #[test]
    fn test_unusable_example_declines() {
        let diagnostic = FeatherDiagnostic::new("GM1005", "Missing arguments").with_examples("foo(", "foo(1)");
        assert!(MissingArguments::factory(&diagnostic).is_none());
    }
}
