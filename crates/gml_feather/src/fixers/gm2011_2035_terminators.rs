//! GM2011/GM2012/GM2015/GM2028/GM2035: one half of a begin/end pair missing
//!
//! A begin with no end gets one inserted where its run of work stops. A
//! `vertex_end` with no `vertex_begin` gets a begin in front of the writes
//! that lead up to it, or is deleted when the options ask for that.

use gml_diagnostics::FeatherDiagnostic;
use gml_parser::{Expr, ExprKind, Program, Stmt, StmtKind};

use crate::context::FixContext;
use crate::error::FixError;
use crate::fixer::{range_of, AppliedFix, Fixer};
use crate::matchers::balance::has_matching_end;
use crate::matchers::calls::{is_call_to, same_expr, stmt_call, stmt_top_call};
use crate::matchers::insertion::{end_of_run, find_reset_insertion, Insertion};
use crate::synth::Synth;
use crate::walk::{visit_stmt_lists, StatementCursor};

/// How far the work of an open begin reaches
#[derive(Debug, Clone, Copy)]
pub enum Run {
    /// Calls whose name starts with the prefix
    Prefix(&'static str),
    /// Calls on the same buffer (first argument) as the begin
    SameTarget,
    /// Everything up to the end of the list or the first exit
    UntilExit,
}

pub struct TerminatorRule {
    pub id: &'static str,
    pub begin: &'static str,
    pub end: &'static str,
    pub run: Run,
}

pub const TERMINATOR_RULES: &[TerminatorRule] = &[
    TerminatorRule {
        id: "GM2012",
        begin: "vertex_format_begin",
        end: "vertex_format_end",
        run: Run::Prefix("vertex_format_add"),
    },
    TerminatorRule { id: "GM2015", begin: "vertex_begin", end: "vertex_end", run: Run::SameTarget },
    TerminatorRule {
        id: "GM2028",
        begin: "draw_primitive_begin",
        end: "draw_primitive_end",
        run: Run::Prefix("draw_vertex"),
    },
    TerminatorRule { id: "GM2035", begin: "gpu_push_state", end: "gpu_pop_state", run: Run::UntilExit },
];

/// First argument of a `name(...)` statement
fn target_of<'s>(stmt: &'s Stmt, name: &str) -> Option<&'s Expr> {
    match stmt_top_call(stmt) {
        Some((called, args)) if called == name => args.first(),
        _ => None,
    }
}

fn calls(stmt: &Stmt, name: &str) -> bool {
    stmt_top_call(stmt).is_some_and(|(called, _)| called == name)
}

/// A call statement whose first argument is `target`
fn works_on(stmt: &Stmt, target: &Expr) -> bool {
    stmt_call(stmt).is_some_and(|(_, args)| args.first().is_some_and(|arg| same_expr(arg, target)))
}

pub struct MissingEnd {
    diagnostic: FeatherDiagnostic,
    rule: &'static TerminatorRule,
}

impl MissingEnd {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        let rule = TERMINATOR_RULES.iter().find(|rule| rule.id == diagnostic.id)?;
        Some(Box::new(Self { diagnostic: diagnostic.clone(), rule }))
    }

    fn matches_begin(&self, stmt: &Stmt, target: Option<&Expr>) -> bool {
        match (self.rule.run, target) {
            (Run::SameTarget, Some(target)) => {
                target_of(stmt, self.rule.begin).is_some_and(|t| same_expr(t, target))
            }
            _ => calls(stmt, self.rule.begin),
        }
    }

    fn matches_end(&self, stmt: &Stmt, target: Option<&Expr>) -> bool {
        match (self.rule.run, target) {
            (Run::SameTarget, Some(target)) => target_of(stmt, self.rule.end).is_some_and(|t| same_expr(t, target)),
            _ => calls(stmt, self.rule.end),
        }
    }

    /// Index the end call goes to, for the begin at `list[at]`
    fn insertion(&self, list: &[Stmt], at: usize, target: Option<&Expr>) -> usize {
        match (self.rule.run, target) {
            (Run::Prefix(prefix), _) => end_of_run(list, at, |s| {
                stmt_call(s).is_some_and(|(name, _)| name.starts_with(prefix))
            }),
            (Run::SameTarget, Some(target)) => end_of_run(list, at, |s| {
                works_on(s, target) && !calls(s, self.rule.begin) && !calls(s, self.rule.end)
            }),
            (Run::SameTarget, None) => at + 1,
            (Run::UntilExit, _) => match find_reset_insertion(list, at, |_| false) {
                Insertion::At(index) => index,
                Insertion::AlreadySatisfied => at + 1,
            },
        }
    }
}

impl Fixer for MissingEnd {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let Program { body, ids, applied, .. } = program;
        let mut fixes = Vec::new();

        visit_stmt_lists(body, &mut |list, _cx| {
            let mut cursor = StatementCursor::new();
            while !cursor.is_done(list) {
                let at = cursor.index();
                if calls(&list[at], self.rule.begin) {
                    let target = match self.rule.run {
                        Run::SameTarget => target_of(&list[at], self.rule.begin).cloned(),
                        _ => None,
                    };
                    let target = target.as_ref();
                    let closed = has_matching_end(
                        list,
                        at,
                        |s| self.matches_begin(s, target),
                        |s| self.matches_end(s, target),
                    );
                    if !closed {
                        let index = self.insertion(list, at, target);
                        let span = list[at].span;
                        let mut synth = Synth::new(ids, span);
                        let args = target.map(|t| vec![synth.instantiate(t)]).unwrap_or_default();
                        let stmt = synth.call_stmt(self.rule.end, args);
                        let inserted = stmt.id;
                        cursor.insert(list, index, stmt);
                        applied.preserve_layout(inserted);
                        fixes.push(AppliedFix::new(
                            self.detail().with_target(self.rule.end).with_range(range_of(span)),
                            inserted,
                        ));
                    }
                }
                cursor.advance();
            }
        });
        Ok(fixes)
    }
}

/// GM2011
pub struct MissingVertexBegin {
    diagnostic: FeatherDiagnostic,
}

impl MissingVertexBegin {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

/// Was the `vertex_end` at `list[at]` opened earlier in the list?
fn is_opened(list: &[Stmt], at: usize, buffer: &Expr) -> bool {
    for stmt in list[..at].iter().rev() {
        if target_of(stmt, "vertex_begin").is_some_and(|t| same_expr(t, buffer)) {
            return true;
        }
        if target_of(stmt, "vertex_end").is_some_and(|t| same_expr(t, buffer)) {
            return false;
        }
    }
    false
}

/// Name holding the latest finished vertex format before `at`:
/// `fmt = vertex_format_end();` or `var fmt = vertex_format_end();`
fn preceding_format(list: &[Stmt], at: usize) -> Option<Expr> {
    list[..at].iter().rev().find_map(|stmt| match &stmt.kind {
        StmtKind::Expr(expr) => match &expr.unparenthesized().kind {
            ExprKind::Assignment { target, value, .. } if is_call_to(value, "vertex_format_end") => {
                Some((**target).clone())
            }
            _ => None,
        },
        StmtKind::VarDecl { declarations, .. } => declarations.iter().find_map(|decl| {
            let init = decl.init.as_ref()?;
            is_call_to(init, "vertex_format_end")
                .then(|| Expr::new(decl.id, decl.name.span, ExprKind::Identifier(decl.name.name.clone())))
        }),
        _ => None,
    })
}

impl Fixer for MissingVertexBegin {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let Program { body, ids, applied, .. } = program;
        let remove = ctx.options.remove_standalone_vertex_end;
        let mut fixes = Vec::new();

        visit_stmt_lists(body, &mut |list, cx| {
            let mut cursor = StatementCursor::new();
            while !cursor.is_done(list) {
                let at = cursor.index();
                let Some(buffer) = target_of(&list[at], "vertex_end").cloned() else {
                    cursor.advance();
                    continue;
                };
                if is_opened(list, at, &buffer) {
                    cursor.advance();
                    continue;
                }

                if remove {
                    let removed = cursor.remove(list, at);
                    fixes.push(AppliedFix::new(
                        self.detail().with_target("vertex_end").with_range(range_of(removed.span)),
                        cx.owner,
                    ));
                } else if let Some(format) = preceding_format(list, at) {
                    // In front of the writes that lead up to the end
                    let mut start = at;
                    while start > 0 && works_on(&list[start - 1], &buffer) && !calls(&list[start - 1], "vertex_end") {
                        start -= 1;
                    }
                    let span = list[at].span;
                    let mut synth = Synth::new(ids, span);
                    let args = vec![synth.instantiate(&buffer), synth.instantiate(&format)];
                    let stmt = synth.call_stmt("vertex_begin", args);
                    let inserted = stmt.id;
                    cursor.insert(list, start, stmt);
                    applied.preserve_layout(inserted);
                    fixes.push(AppliedFix::new(
                        self.detail().with_target("vertex_begin").with_range(range_of(span)),
                        inserted,
                    ));
                }
                cursor.advance();
            }
        });
        Ok(fixes)
    }
}

#[cfg(test)]
mod tests {
    use crate::options::FixOptions;
    use crate::test_utils::{assert_fix, assert_no_fix, run_fixer_with};

    #[test]
    fn test_format_end_after_add_calls() {
        assert_fix(
            "GM2012",
            "vertex_format_begin(); vertex_format_add_position(); vertex_format_add_colour(); draw_self();",
            "vertex_format_begin(); vertex_format_add_position(); vertex_format_add_colour(); vertex_format_end(); draw_self();",
        );
    }

    #[test]
    fn test_vertex_end_stops_at_other_buffer() {
        let fixes = assert_fix(
            "GM2015",
            "vertex_begin(vb, fmt); vertex_position(vb, 0, 0); vertex_position(other_vb, 1, 1);",
            "vertex_begin(vb, fmt); vertex_position(vb, 0, 0); vertex_end(vb); vertex_position(other_vb, 1, 1);",
        );
        assert_eq!(fixes[0].target.as_deref(), Some("vertex_end"));
    }

    #[test]
    fn test_closed_pairs_untouched() {
        assert_no_fix("GM2015", "vertex_begin(vb, fmt); vertex_position(vb, 0, 0); vertex_end(vb);");
        assert_no_fix("GM2028", "draw_primitive_begin(pr_linelist); draw_vertex(0, 0); draw_primitive_end();");
        assert_no_fix("GM2035", "gpu_push_state(); draw_self(); gpu_pop_state();");
    }

    #[test]
    fn test_primitive_end_inserted() {
        assert_fix(
            "GM2028",
            "draw_primitive_begin(pr_trianglelist); draw_vertex(0, 0); draw_vertex_colour(1, 1, c_red, 1); draw_self();",
            "draw_primitive_begin(pr_trianglelist); draw_vertex(0, 0); draw_vertex_colour(1, 1, c_red, 1); draw_primitive_end(); draw_self();",
        );
    }

    #[test]
    fn test_pop_state_goes_before_exit() {
        assert_fix(
            "GM2035",
            "gpu_push_state(); draw_self(); exit;",
            "gpu_push_state(); draw_self(); gpu_pop_state(); exit;",
        );
    }

    #[test]
    fn test_vertex_begin_synthesised_from_format() {
        assert_fix(
            "GM2011",
            "fmt = vertex_format_end(); vertex_position(vb, 0, 0); vertex_end(vb);",
            "fmt = vertex_format_end(); vertex_begin(vb, fmt); vertex_position(vb, 0, 0); vertex_end(vb);",
        );
    }

    #[test]
    fn test_vertex_end_without_format_is_left() {
        assert_no_fix("GM2011", "vertex_end(vb);");
        assert_no_fix("GM2011", "vertex_begin(vb, fmt); vertex_end(vb);");
    }

    #[test]
    fn test_standalone_vertex_end_removed_by_option() {
        let options = FixOptions { remove_standalone_vertex_end: true, ..FixOptions::default() };
        let (program, fixes) = run_fixer_with("GM2011", "draw_self(); vertex_end(vb);", &options);
        assert_eq!(program.body.len(), 1);
        assert_eq!(fixes.len(), 1);
        assert!(fixes[0].automatic);
    }
}
