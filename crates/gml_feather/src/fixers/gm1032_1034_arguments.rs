//! GM1032/GM1034: `argumentN` references
//!
//! GM1032 renumbers the indices a function actually uses into a dense run
//! (`argument0`, `argument2` → `argument0`, `argument1`), then optionally
//! renames `var alias = argumentN;` locals after the function's `@param`
//! docs. GM1034 replaces `argumentN` in functions that declare parameters
//! with the parameter itself.

use std::collections::BTreeMap;

use gml_diagnostics::{FeatherDiagnostic, FixDetail};
use gml_lexer::Span;
use gml_parser::{Comments, Expr, ExprKind, Function, Literal, NodeId, Program, Stmt, StmtKind};

use crate::context::FixContext;
use crate::error::FixError;
use crate::fixer::{range_of, AppliedFix, Fixer};
use crate::matchers::scope::{local_names, rename_in_scope};
use crate::walk::{for_each_function_mut, walk_expr, walk_expr_mut, walk_stmts, walk_stmts_mut, Visit, VisitMut};

/// Index of an `argumentN` or `argument[N]` reference
fn argument_index(expr: &Expr) -> Option<usize> {
    match &expr.kind {
        ExprKind::Identifier(name) => {
            let digits = name.strip_prefix("argument")?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            digits.parse().ok()
        }
        ExprKind::Index { object, indices, .. } if object.as_identifier() == Some("argument") && indices.len() == 1 => {
            let value = match &indices[0].kind {
                ExprKind::Literal(literal) => literal.as_number()?,
                _ => return None,
            };
            (value >= 0.0 && value.fract() == 0.0).then_some(value as usize)
        }
        _ => None,
    }
}

/// Every argument reference of a body, first span per index, not looking
/// into nested functions
fn argument_uses(stmts: &[Stmt]) -> BTreeMap<usize, Option<Span>> {
    struct Uses(BTreeMap<usize, Option<Span>>);
    impl Visit for Uses {
        fn visit_expr(&mut self, expr: &Expr) {
            if let Some(index) = argument_index(expr) {
                self.0.entry(index).or_insert(expr.span);
                return;
            }
            walk_expr(self, expr);
        }

        fn visit_function(&mut self, _func: &Function) {}
    }
    let mut uses = Uses(BTreeMap::new());
    walk_stmts(&mut uses, stmts);
    uses.0
}

/// Renumber argument references through `remap`, keeping the form they
/// were written in, not looking into nested functions
fn renumber_arguments(stmts: &mut [Stmt], remap: &BTreeMap<usize, usize>) {
    struct Renumber<'m>(&'m BTreeMap<usize, usize>);
    impl VisitMut for Renumber<'_> {
        fn visit_expr(&mut self, expr: &mut Expr) {
            if let Some(new) = argument_index(expr).and_then(|old| self.0.get(&old)).copied() {
                match &mut expr.kind {
                    ExprKind::Index { indices, .. } => indices[0].kind = ExprKind::Literal(Literal::Number(new.to_string())),
                    kind => *kind = ExprKind::Identifier(format!("argument{}", new)),
                }
                return;
            }
            walk_expr_mut(self, expr);
        }

        fn visit_function(&mut self, _func: &mut Function) {}
    }
    walk_stmts_mut(&mut Renumber(remap), stmts);
}

/// Parameter names from `/// @param {type} name` docs, in order
fn documented_params(comments: &Comments, owner: NodeId) -> Vec<String> {
    comments
        .doc_comments_of(owner)
        .iter()
        .filter_map(|comment| {
            let rest = comment.text.trim_start().strip_prefix("@param")?.trim_start();
            let rest = match rest.strip_prefix('{') {
                Some(typed) => typed.split_once('}')?.1.trim_start(),
                None => rest,
            };
            let name: String = rest
                .trim_start_matches('[')
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect();
            (!name.is_empty()).then_some(name)
        })
        .collect()
}

/// `var alias = argumentN;` at the top of a body: (alias, N)
fn argument_aliases(stmts: &[Stmt]) -> Vec<(String, usize)> {
    stmts
        .iter()
        .filter_map(|stmt| match &stmt.kind {
            StmtKind::VarDecl { declarations, .. } if declarations.len() == 1 => {
                let decl = &declarations[0];
                Some((decl.name.name.clone(), argument_index(decl.init.as_ref()?)?))
            }
            _ => None,
        })
        .collect()
}

/// GM1032
pub struct ArgumentGaps {
    diagnostic: FeatherDiagnostic,
}

impl ArgumentGaps {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }

    /// Renumber one body; returns one record per moved index
    fn renumber(&self, stmts: &mut [Stmt], owner: Option<NodeId>, docs: &[String], ctx: &FixContext) -> Vec<AppliedFix> {
        let uses = argument_uses(stmts);
        let remap: BTreeMap<usize, usize> = uses.keys().enumerate().map(|(new, old)| (*old, new)).collect();
        if remap.iter().all(|(old, new)| old == new) {
            return Vec::new();
        }

        renumber_arguments(stmts, &remap);

        let place = |detail: FixDetail| match owner {
            Some(node) => AppliedFix::new(detail, node),
            None => AppliedFix::at_root(detail),
        };
        let mut fixes: Vec<AppliedFix> = remap
            .iter()
            .filter(|(old, new)| old != new)
            .map(|(old, new)| {
                let span = uses.get(old).copied().flatten();
                place(self.detail().with_target(format!("argument{}", new)).with_range(range_of(span)))
            })
            .collect();

        if ctx.options.rename_argument_aliases && !docs.is_empty() {
            let locals = local_names(stmts);
            for (alias, index) in argument_aliases(stmts) {
                let Some(documented) = docs.get(index) else {
                    continue;
                };
                if *documented == alias || locals.contains(documented.as_str()) {
                    continue;
                }
                rename_in_scope(stmts, &alias, documented);
                fixes.push(place(self.detail().with_target(alias.as_str()).with_replacement(documented.as_str())));
            }
        }
        fixes
    }
}

impl Fixer for ArgumentGaps {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let Program { body, comments, .. } = program;
        let mut fixes = self.renumber(body, None, &[], ctx);
        for_each_function_mut(body, &mut |func, owner| {
            if func.params.is_empty() {
                let docs = documented_params(comments, owner);
                fixes.extend(self.renumber(&mut func.body.statements, Some(owner), &docs, ctx));
            }
        });
        Ok(fixes)
    }
}

/// GM1034
pub struct ArgumentsWithParameters {
    diagnostic: FeatherDiagnostic,
}

impl ArgumentsWithParameters {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

impl Fixer for ArgumentsWithParameters {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        struct Replace<'a> {
            fixer: &'a ArgumentsWithParameters,
            params: Vec<String>,
            fixes: Vec<AppliedFix>,
        }
        impl VisitMut for Replace<'_> {
            fn visit_expr(&mut self, expr: &mut Expr) {
                if let Some(index) = argument_index(expr) {
                    if let Some(param) = self.params.get(index) {
                        let old = match &expr.kind {
                            ExprKind::Identifier(name) => name.clone(),
                            _ => format!("argument[{}]", index),
                        };
                        self.fixes.push(AppliedFix::new(
                            self.fixer
                                .detail()
                                .with_target(old)
                                .with_replacement(param.as_str())
                                .with_range(range_of(expr.span)),
                            expr.id,
                        ));
                        expr.kind = ExprKind::Identifier(param.clone());
                    }
                    return;
                }
                walk_expr_mut(self, expr);
            }

            fn visit_function(&mut self, _func: &mut Function) {}
        }

        let mut fixes = Vec::new();
        for_each_function_mut(&mut program.body, &mut |func, _owner| {
            if func.params.is_empty() {
                return;
            }
            let params = func.params.iter().map(|p| p.name.name.clone()).collect();
            let mut replace = Replace { fixer: self, params, fixes: Vec::new() };
            walk_stmts_mut(&mut replace, &mut func.body.statements);
            fixes.append(&mut replace.fixes);
        });
        Ok(fixes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::FixOptions;
    use crate::test_utils::{assert_fix, assert_no_fix, run_fixer_with};

    #[test]
    fn test_gap_closed() {
        let fixes = assert_fix(
            "GM1032",
            "function f() { return argument0 + argument2; }",
            "function f() { return argument0 + argument1; }",
        );
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].target.as_deref(), Some("argument1"));
    }

    #[test]
    fn test_indexed_form_renumbered() {
        assert_fix(
            "GM1032",
            "function f() { var a = argument[1]; var b = argument3; }",
            "function f() { var a = argument[0]; var b = argument1; }",
        );
    }

    #[test]
    fn test_dense_arguments_untouched() {
        assert_no_fix("GM1032", "function f() { return argument0 + argument1; }");
        assert_no_fix("GM1032", "function f(a) { return argument2; }");
    }

    #[test]
    fn test_nested_functions_renumbered_separately() {
        assert_fix(
            "GM1032",
            "function f() { var g = function() { return argument1; }; return argument0; }",
            "function f() { var g = function() { return argument0; }; return argument0; }",
        );
    }

    #[test]
    fn test_aliases_take_documented_names() {
        let source = "/// @param {real} speed\n/// @param {real} angle\nfunction f() {\n    var a = argument0;\n    var b = argument2;\n    return a + b;\n}";
        let fixes = assert_fix(
            "GM1032",
            source,
            "function f() { var speed = argument0; var angle = argument1; return speed + angle; }",
        );
        assert!(fixes.iter().any(|f| f.target.as_deref() == Some("b") && f.replacement.as_deref() == Some("angle")));

        let options = FixOptions { rename_argument_aliases: false, ..FixOptions::default() };
        let (program, _) = run_fixer_with("GM1032", source, &options);
        assert_eq!(
            program,
            crate::test_utils::parse("function f() { var a = argument0; var b = argument1; return a + b; }")
        );
    }

    #[test]
    fn test_argument_replaced_by_parameter() {
        let fixes = assert_fix(
            "GM1034",
            "function f(a, b) { return argument1 + argument[0]; }",
            "function f(a, b) { return b + a; }",
        );
        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].replacement.as_deref(), Some("b"));
    }

    #[test]
    fn test_out_of_range_argument_kept() {
        assert_no_fix("GM1034", "function f(a) { return argument3; }");
    }

    #[test]
    fn test_argument_index() {
        let expr = gml_parser::Parser::new("argument[2]").parse_expression_only().unwrap();
        assert_eq!(argument_index(&expr), Some(2));
        let expr = gml_parser::Parser::new("argument_count").parse_expression_only().unwrap();
        assert_eq!(argument_index(&expr), None);
    }
}
