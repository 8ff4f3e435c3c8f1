//! GM1003/GM1016/GM1100: fixes the preprocessor already made on text
//!
//! The preprocessor rewrote the source before parsing and left a hint per
//! rewrite. These fixers turn hints into records and finish whatever is left
//! in the tree. Each also handles trees that never went through the
//! preprocessor.

use gml_diagnostics::{FeatherDiagnostic, TextRange};
use gml_lexer::Span;
use gml_parser::{Expr, ExprKind, Literal, NodeIdGen, Program, Stmt, StmtKind, UnaryOp};

use crate::context::FixContext;
use crate::error::FixError;
use crate::fixer::{range_of, AppliedFix, Fixer};
use crate::metadata::is_recorded;
use crate::preprocess::PreprocessHint;
use crate::walk::{stmt_at_offset, visit_stmt_lists, walk_stmt_mut, walk_stmts_mut, StatementCursor, VisitMut};

/// Record every hint of `id` not recorded yet, on the statement it falls in
fn record_hints(fixer: &dyn Fixer, program: &Program, hints: &[PreprocessHint]) -> Vec<AppliedFix> {
    let id = fixer.diagnostic().id.as_str();
    hints
        .iter()
        .filter(|hint| !is_recorded(program, id, hint.range))
        .map(|hint| {
            let mut detail = fixer.detail().with_range(Some(hint.range));
            detail.target = hint.target.clone();
            match stmt_at_offset(&program.body, hint.range.start) {
                Some(node) => AppliedFix::new(detail, node),
                None => AppliedFix::at_root(detail),
            }
        })
        .collect()
}

fn contains(range: TextRange, stmt: &Stmt) -> bool {
    stmt.span.is_some_and(|span| range.start <= span.start && span.end <= range.end)
}

/// GM1003
pub struct EnumStringValues {
    diagnostic: FeatherDiagnostic,
}

impl EnumStringValues {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

/// `12`, `-3`, `0.5`, `.5`
fn is_numeric_text(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let mut parts = digits.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let fraction = parts.next();
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    match fraction {
        None => !whole.is_empty() && all_digits(whole),
        Some(fraction) => (!whole.is_empty() || !fraction.is_empty()) && all_digits(whole) && all_digits(fraction),
    }
}

fn numeric_literal(text: &str, span: Option<Span>, ids: &mut NodeIdGen) -> ExprKind {
    match text.strip_prefix('-') {
        Some(magnitude) => ExprKind::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(Expr::new(ids.fresh(), span, ExprKind::Literal(Literal::Number(magnitude.to_string())))),
        },
        None => ExprKind::Literal(Literal::Number(text.to_string())),
    }
}

impl Fixer for EnumStringValues {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let mut fixes = record_hints(self, program, ctx.metadata.hints(&self.diagnostic.id));

        struct Unquote<'f> {
            fixer: &'f EnumStringValues,
            fixes: &'f mut Vec<AppliedFix>,
            ids: &'f mut NodeIdGen,
        }
        impl VisitMut for Unquote<'_> {
            fn visit_stmt(&mut self, stmt: &mut Stmt) {
                let owner = stmt.id;
                if let StmtKind::Enum { members, .. } = &mut stmt.kind {
                    for member in members {
                        let Some(value) = &mut member.value else {
                            continue;
                        };
                        let ExprKind::Literal(literal @ Literal::String(_)) = &value.kind else {
                            continue;
                        };
                        let Some(text) = literal.string_value().filter(|t| is_numeric_text(t)) else {
                            continue;
                        };
                        let text = text.to_string();
                        self.fixes.push(AppliedFix::new(
                            self.fixer
                                .detail()
                                .with_target(member.name.name.as_str())
                                .with_replacement(text.as_str())
                                .with_range(range_of(value.span)),
                            owner,
                        ));
                        value.kind = numeric_literal(&text, value.span, self.ids);
                    }
                }
                walk_stmt_mut(self, stmt);
            }
        }

        let Program { body, ids, .. } = program;
        walk_stmts_mut(&mut Unquote { fixer: self, fixes: &mut fixes, ids }, body);
        Ok(fixes)
    }
}

/// GM1016
pub struct BooleanStatements {
    diagnostic: FeatherDiagnostic,
}

impl BooleanStatements {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

fn boolean_statement(stmt: &Stmt) -> Option<bool> {
    match &stmt.as_expr()?.unparenthesized().kind {
        ExprKind::Literal(Literal::Boolean(value)) => Some(*value),
        _ => None,
    }
}

impl Fixer for BooleanStatements {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let hints = ctx.metadata.hints(&self.diagnostic.id);
        let mut fixes = Vec::new();

        visit_stmt_lists(&mut program.body, &mut |list, cx| {
            let mut cursor = StatementCursor::new();
            while !cursor.is_done(list) {
                let at = cursor.index();
                let stmt = &list[at];
                let blanked = stmt
                    .is_empty()
                    .then(|| hints.iter().find(|hint| contains(hint.range, stmt)))
                    .flatten();
                if let Some(hint) = blanked {
                    let mut detail = self.detail().with_range(Some(hint.range));
                    detail.target = hint.target.clone();
                    cursor.remove(list, at);
                    fixes.push(AppliedFix::new(detail, cx.owner));
                } else if let Some(value) = boolean_statement(stmt) {
                    let removed = cursor.remove(list, at);
                    fixes.push(AppliedFix::new(
                        self.detail().with_target(value.to_string()).with_range(range_of(removed.span)),
                        cx.owner,
                    ));
                }
                cursor.advance();
            }
        });
        Ok(fixes)
    }
}

/// GM1100
pub struct DereferenceAssignments {
    diagnostic: FeatherDiagnostic,
}

impl DereferenceAssignments {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

impl Fixer for DereferenceAssignments {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        Ok(record_hints(self, program, ctx.metadata.hints(&self.diagnostic.id)))
    }
}
