//! GM2009/GM2025/GM2042: begin/end pairs that do not line up
//!
//! An end with nothing open is deleted. Begins still open at the end of the
//! list are deleted too, but only when the list has ends at all: a lone
//! begin is a missing end (GM2012, GM2028, GM2035), not an extra begin.

use gml_diagnostics::FeatherDiagnostic;
use gml_parser::Program;

use crate::context::FixContext;
use crate::error::FixError;
use crate::fixer::{range_of, AppliedFix, Fixer};
use crate::matchers::balance::scan_balance;
use crate::matchers::calls::stmt_call_name;
use crate::walk::visit_stmt_lists;

pub struct BalanceRule {
    pub id: &'static str,
    pub begin: &'static str,
    pub end: &'static str,
}

pub const BALANCE_RULES: &[BalanceRule] = &[
    BalanceRule { id: "GM2009", begin: "vertex_format_begin", end: "vertex_format_end" },
    BalanceRule { id: "GM2025", begin: "draw_primitive_begin", end: "draw_primitive_end" },
    BalanceRule { id: "GM2042", begin: "gpu_push_state", end: "gpu_pop_state" },
];

pub struct UnbalancedPair {
    diagnostic: FeatherDiagnostic,
    rule: &'static BalanceRule,
}

impl UnbalancedPair {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        let rule = BALANCE_RULES.iter().find(|rule| rule.id == diagnostic.id)?;
        Some(Box::new(Self { diagnostic: diagnostic.clone(), rule }))
    }
}

impl Fixer for UnbalancedPair {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let mut fixes = Vec::new();
        visit_stmt_lists(&mut program.body, &mut |list, cx| {
            let report = scan_balance(list, self.rule.begin, self.rule.end);
            // Back to front so earlier indices stay valid
            for &index in report.removals().iter().rev() {
                let removed = list.remove(index);
                let name = stmt_call_name(&removed).unwrap_or(self.rule.end);
                fixes.push(AppliedFix::new(
                    self.detail().with_target(name).with_range(range_of(removed.span)),
                    cx.owner,
                ));
            }
        });
        // Report in source order
        fixes.reverse();
        Ok(fixes)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{assert_fix, assert_no_fix, call_names, run_fixer};

    #[test]
    fn test_leading_end_removed() {
        let fixes = assert_fix(
            "GM2042",
            "gpu_pop_state(); gpu_push_state(); draw_self(); gpu_pop_state();",
            "gpu_push_state(); draw_self(); gpu_pop_state();",
        );
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].target.as_deref(), Some("gpu_pop_state"));
        assert_eq!(fixes[0].range.map(|r| r.start), Some(0));
    }

    #[test]
    fn test_trailing_begin_removed_when_ends_exist() {
        assert_fix(
            "GM2025",
            "draw_primitive_begin(pr_linelist); draw_vertex(0, 0); draw_primitive_end(); draw_primitive_begin(pr_linelist);",
            "draw_primitive_begin(pr_linelist); draw_vertex(0, 0); draw_primitive_end();",
        );
    }

    #[test]
    fn test_lone_begins_are_left_alone() {
        assert_no_fix("GM2042", "gpu_push_state(); draw_self(); gpu_push_state();");
        assert_no_fix("GM2009", "vertex_format_begin(); vertex_format_add_position();");
    }

    #[test]
    fn test_balanced_nesting_untouched() {
        assert_no_fix("GM2042", "gpu_push_state(); gpu_push_state(); gpu_pop_state(); gpu_pop_state();");
    }

    #[test]
    fn test_lists_are_balanced_separately() {
        let source = "gpu_push_state(); if (a) { gpu_push_state(); gpu_pop_state(); gpu_pop_state(); } gpu_pop_state();";
        let fixes = assert_fix(
            "GM2042",
            source,
            "gpu_push_state(); if (a) { gpu_push_state(); gpu_pop_state(); } gpu_pop_state();",
        );
        assert_eq!(fixes.len(), 1);
        let (program, _) = run_fixer("GM2042", source);
        assert_eq!(call_names(&program.body), vec!["gpu_push_state", "gpu_pop_state"]);
    }
}
