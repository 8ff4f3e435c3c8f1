//! GM2004/GM2007/GM2061: statements rewritten into the form Feather expects

use gml_diagnostics::FeatherDiagnostic;
use gml_parser::{
    AssignOp, BinaryOp, Block, DeclKeyword, Expr, ExprKind, Literal, Program, Stmt, StmtKind, UpdateOp,
};

use crate::context::FixContext;
use crate::error::FixError;
use crate::fixer::{range_of, AppliedFix, Fixer};
use crate::matchers::calls::{call_args, is_call_to, same_expr};
use crate::synth::{carry_provenance, Synth};
use crate::walk::{expr_references_identifier, references_identifier, visit_stmt_lists, StatementCursor};

// ========== GM2004 ==========

/// GM2004: a counting `for` whose index is never read becomes `repeat`
pub struct UnusedLoopIndex {
    diagnostic: FeatherDiagnostic,
}

impl UnusedLoopIndex {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

/// Loop variable of `var i = 0` or `i = 0`
fn counter_start(init: &Stmt) -> Option<&str> {
    let is_zero = |expr: &Expr| matches!(&expr.unparenthesized().kind, ExprKind::Literal(l @ Literal::Number(_)) if l.as_number() == Some(0.0));
    match &init.kind {
        StmtKind::VarDecl { keyword: DeclKeyword::Var, declarations } if declarations.len() == 1 => {
            let decl = &declarations[0];
            decl.init.as_ref().filter(|e| is_zero(e))?;
            Some(decl.name.name.as_str())
        }
        StmtKind::Expr(Expr { kind: ExprKind::Assignment { target, op: AssignOp::Assign, value }, .. }) if is_zero(value) => {
            target.as_identifier()
        }
        _ => None,
    }
}

/// `i++`, `++i`, `i += 1`
fn is_step(update: &Expr, name: &str) -> bool {
    match &update.unparenthesized().kind {
        ExprKind::Update { operand, op: UpdateOp::Increment, .. } => operand.as_identifier() == Some(name),
        ExprKind::Assignment { target, op: AssignOp::Add, value } => {
            target.as_identifier() == Some(name)
                && matches!(&value.kind, ExprKind::Literal(l @ Literal::Number(_)) if l.as_number() == Some(1.0))
        }
        _ => false,
    }
}

/// `N` of `i < N`, when it does not depend on `i`
fn bound<'e>(condition: &'e Expr, name: &str) -> Option<&'e Expr> {
    match &condition.unparenthesized().kind {
        ExprKind::Binary { left, op: BinaryOp::Less, right } if left.as_identifier() == Some(name) => {
            (!expr_references_identifier(right, name)).then_some(right.as_ref())
        }
        _ => None,
    }
}

/// The `repeat` count for a `for` statement at `list[at]`, if it qualifies
fn repeat_count(list: &[Stmt], at: usize) -> Option<(String, Expr)> {
    let StmtKind::For { init: Some(init), condition: Some(condition), update: Some(update), body } = &list[at].kind else {
        return None;
    };
    let name = counter_start(init)?;
    let count = bound(condition, name)?;
    if !is_step(update, name) || references_identifier(&body.statements, name) {
        return None;
    }
    // `var` is function scoped, so the index may still be read afterwards
    if references_identifier(&list[at + 1..], name) {
        return None;
    }
    Some((name.to_string(), count.clone()))
}

impl Fixer for UnusedLoopIndex {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let mut fixes = Vec::new();
        visit_stmt_lists(&mut program.body, &mut |list, _cx| {
            for at in 0..list.len() {
                let Some((name, count)) = repeat_count(list, at) else {
                    continue;
                };
                let stmt = &mut list[at];
                let StmtKind::For { body, .. } = &mut stmt.kind else {
                    continue;
                };
                let body = std::mem::replace(body, Block::new(Vec::new(), None));
                stmt.kind = StmtKind::Repeat { count, body };
                fixes.push(AppliedFix::new(self.detail().with_target(name).with_range(range_of(stmt.span)), stmt.id));
            }
        });
        Ok(fixes)
    }
}

// ========== GM2007 ==========

/// GM2007: `all.x = v;` becomes `with (all) { x = v; }`
pub struct AssignmentThroughAll {
    diagnostic: FeatherDiagnostic,
}

impl AssignmentThroughAll {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

fn is_all_assignment(stmt: &Stmt) -> bool {
    let Some(Expr { kind: ExprKind::Assignment { target, .. }, .. }) = stmt.as_expr() else {
        return false;
    };
    matches!(&target.kind, ExprKind::Member { object, .. } if object.as_identifier() == Some("all"))
}

impl Fixer for AssignmentThroughAll {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let Program { body, ids, .. } = program;
        let mut fixes = Vec::new();
        visit_stmt_lists(body, &mut |list, _cx| {
            for stmt in list.iter_mut().filter(|stmt| is_all_assignment(stmt)) {
                let span = stmt.span;
                let StmtKind::Expr(Expr { kind: ExprKind::Assignment { target, op, value }, .. }) =
                    std::mem::replace(&mut stmt.kind, StmtKind::Empty)
                else {
                    continue;
                };
                let ExprKind::Member { object, field } = target.kind else {
                    continue;
                };

                let mut synth = Synth::new(&mut *ids, span);
                let bare = synth.ident(&field.name);
                let inner = synth.assign_stmt(bare, op, *value);
                let block = synth.block(vec![inner]);
                stmt.kind = StmtKind::With { target: *object, body: block };
                fixes.push(AppliedFix::new(
                    self.detail().with_target(field.name.as_str()).with_range(range_of(span)),
                    stmt.id,
                ));
            }
        });
        Ok(fixes)
    }
}

// ========== GM2061 ==========

/// GM2061: `if (x == undefined) x = v;` becomes `x ??= v;`, or folds into an
/// assignment of `x` right before it
pub struct UndefinedFallback {
    diagnostic: FeatherDiagnostic,
}

impl UndefinedFallback {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

/// `x` of `x == undefined`, `undefined == x` or `is_undefined(x)`
fn undefined_test(condition: &Expr) -> Option<&Expr> {
    let condition = condition.unparenthesized();
    if is_call_to(condition, "is_undefined") {
        return match call_args(condition)? {
            [subject] => Some(subject),
            _ => None,
        };
    }
    match &condition.kind {
        ExprKind::Binary { left, op: BinaryOp::Equal, right } if right.is_undefined() => Some(left),
        ExprKind::Binary { left, op: BinaryOp::Equal, right } if left.is_undefined() => Some(right),
        _ => None,
    }
}

/// The fallback value of a qualifying `if`
fn fallback_of(stmt: &Stmt) -> Option<(&Expr, &Expr)> {
    let StmtKind::If { condition, then_branch, else_branch: None } = &stmt.kind else {
        return None;
    };
    let subject = undefined_test(condition)?;
    let [only] = then_branch.statements.as_slice() else {
        return None;
    };
    let Some(Expr { kind: ExprKind::Assignment { target, op: AssignOp::Assign, value }, .. }) = only.as_expr() else {
        return None;
    };
    same_expr(target, subject).then_some((target.as_ref(), value.as_ref()))
}

/// The value slot of `subject = prior;` or `var subject = prior;`
fn prior_value<'s>(stmt: &'s mut Stmt, subject: &Expr) -> Option<&'s mut Expr> {
    match &mut stmt.kind {
        StmtKind::Expr(Expr { kind: ExprKind::Assignment { target, op: AssignOp::Assign, value }, .. })
            if same_expr(target, subject) =>
        {
            Some(value.as_mut())
        }
        StmtKind::VarDecl { declarations, .. } if declarations.len() == 1 => {
            let decl = &mut declarations[0];
            if Some(decl.name.name.as_str()) != subject.as_identifier() {
                return None;
            }
            decl.init.as_mut()
        }
        _ => None,
    }
}

impl Fixer for UndefinedFallback {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let Program { body, ids, comments, applied, .. } = program;
        let mut fixes = Vec::new();
        visit_stmt_lists(body, &mut |list, _cx| {
            let mut cursor = StatementCursor::new();
            while !cursor.is_done(list) {
                let at = cursor.index();
                let Some((subject, fallback)) = fallback_of(&list[at]).map(|(s, f)| (s.clone(), f.clone())) else {
                    cursor.advance();
                    continue;
                };
                let span = list[at].span;
                let detail = self.detail().with_range(range_of(span));
                let detail = match subject.as_identifier() {
                    Some(name) => detail.with_target(name),
                    None => detail,
                };

                let folded = at > 0 && prior_value(&mut list[at - 1], &subject).is_some();
                if folded {
                    let removed = cursor.remove(list, at);
                    let previous = &mut list[at - 1];
                    if let Some(slot) = prior_value(previous, &subject) {
                        let prior = std::mem::replace(slot, Synth::new(&mut *ids, span).undefined());
                        *slot = Synth::new(&mut *ids, prior.span).null_coalesce(prior, fallback);
                    }
                    carry_provenance(comments, applied, removed.id, previous.id);
                    fixes.push(AppliedFix::new(detail, previous.id));
                } else {
                    let stmt = &mut list[at];
                    let assignment = Synth::new(&mut *ids, span).assign(subject, AssignOp::NullCoalesce, fallback);
                    stmt.kind = StmtKind::Expr(assignment);
                    fixes.push(AppliedFix::new(detail, stmt.id));
                }
                cursor.advance();
            }
        });
        Ok(fixes)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{assert_fix, assert_no_fix};

    #[test]
    fn test_for_becomes_repeat() {
        let fixes = assert_fix(
            "GM2004",
            "for (var i = 0; i < 10; i++) { spawn(); }",
            "repeat (10) { spawn(); }",
        );
        assert_eq!(fixes[0].target.as_deref(), Some("i"));
        assert_fix("GM2004", "for (var k = 0; k < n; k += 1) { step(); }", "repeat (n) { step(); }");
    }

    #[test]
    fn test_for_with_used_index_kept() {
        assert_no_fix("GM2004", "for (var i = 0; i < 10; i++) { arr[i] = 0; }");
        assert_no_fix("GM2004", "for (var i = 1; i < 10; i++) { spawn(); }");
        assert_no_fix("GM2004", "for (var i = 0; i <= 10; i++) { spawn(); }");
        assert_no_fix("GM2004", "for (i = 0; i < 10; i++) { spawn(); }\nshow(i);");
    }

    #[test]
    fn test_all_assignment_wrapped() {
        let fixes = assert_fix("GM2007", "all.speed = 0;", "with (all) { speed = 0; }");
        assert_eq!(fixes[0].target.as_deref(), Some("speed"));
        assert_fix("GM2007", "all.hp += 5;", "with (all) { hp += 5; }");
        assert_no_fix("GM2007", "other.speed = 0;");
    }

    #[test]
    fn test_undefined_check_becomes_null_assignment() {
        let fixes = assert_fix("GM2061", "if (x == undefined) x = 5;", "x ??= 5;");
        assert_eq!(fixes[0].target.as_deref(), Some("x"));
        assert_fix("GM2061", "if (is_undefined(o.hp)) { o.hp = 1; }", "o.hp ??= 1;");
    }

    #[test]
    fn test_undefined_check_folds_into_prior_assignment() {
        assert_fix("GM2061", "x = load();\nif (x == undefined) x = 5;", "x = load() ?? 5;");
        assert_fix("GM2061", "var x = load();\nif (undefined == x) { x = 5; }", "var x = load() ?? 5;");
    }

    #[test]
    fn test_other_ifs_kept() {
        assert_no_fix("GM2061", "if (x == undefined) y = 5;");
        assert_no_fix("GM2061", "if (x == undefined) x = 5; else x = 6;");
        assert_no_fix("GM2061", "if (x != undefined) x = 5;");
    }
}
