//! Replacement templates read from a diagnostic's own examples
//!
//! Examples are hand-written snippets and may not parse. Everything here is
//! best effort: a failure means "no template", never a hard error upstream.

use gml_diagnostics::FeatherDiagnostic;
use gml_lexer::{Lexer, TokenKind};
use gml_parser::{Expr, ExprKind};

use crate::error::FixError;
use crate::matchers::calls::call_name;
use crate::walk::{walk_expr, walk_stmts, Visit};

/// Identifier tokens of `text`, in order
pub fn identifier_tokens(text: &str) -> Vec<&str> {
    Lexer::new(text)
        .tokenize()
        .into_iter()
        .filter_map(|token| match token.kind {
            TokenKind::Identifier(name) => Some(name),
            _ => None,
        })
        .collect()
}

/// Old → new name pairs from a bad/good example pair.
///
/// Examples that differ only by renamed tokens pair up position by position.
/// Otherwise the names present in only one of the examples are paired in
/// order of first appearance.
pub fn diff_identifier_pairs(bad: &str, good: &str) -> Vec<(String, String)> {
    let bad_ids = identifier_tokens(bad);
    let good_ids = identifier_tokens(good);
    let mut pairs = Vec::new();

    if bad_ids.len() == good_ids.len() {
        for (old, new) in bad_ids.iter().zip(&good_ids) {
            if old != new {
                push_pair(&mut pairs, old, new);
            }
        }
        return pairs;
    }

    let only_bad = unique(bad_ids.iter().copied().filter(|id| !good_ids.contains(id)));
    let only_good = unique(good_ids.iter().copied().filter(|id| !bad_ids.contains(id)));
    for (old, new) in only_bad.into_iter().zip(only_good) {
        push_pair(&mut pairs, old, new);
    }
    pairs
}

fn push_pair(pairs: &mut Vec<(String, String)>, old: &str, new: &str) {
    if !pairs.iter().any(|(o, _)| o == old) {
        pairs.push((old.to_string(), new.to_string()));
    }
}

fn unique<'t>(ids: impl Iterator<Item = &'t str>) -> Vec<&'t str> {
    let mut out: Vec<&str> = Vec::new();
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

/// Argument list of a call in the good example that the bad example makes
/// with fewer arguments
#[derive(Debug, Clone)]
pub struct CallTemplate {
    pub callee: String,
    pub args: Vec<Expr>,
}

pub fn call_template(diagnostic: &FeatherDiagnostic) -> Result<CallTemplate, FixError> {
    let id = diagnostic.id.as_str();
    let good = example_calls(&diagnostic.good_example)?;
    let bad = example_calls(&diagnostic.bad_example)?;

    for (callee, args) in &bad {
        let longer = good.iter().find(|(name, good_args)| name == callee && good_args.len() > args.len());
        if let Some((_, good_args)) = longer {
            return Ok(CallTemplate { callee: callee.clone(), args: good_args.clone() });
        }
    }
    Err(FixError::template(id, "examples show no call gaining arguments"))
}

/// Every named call in a snippet, outermost first
fn example_calls(text: &str) -> Result<Vec<(String, Vec<Expr>)>, FixError> {
    struct Calls(Vec<(String, Vec<Expr>)>);
    impl Visit for Calls {
        fn visit_expr(&mut self, expr: &Expr) {
            if let (Some(name), ExprKind::Call { args, .. }) = (call_name(expr), &expr.kind) {
                self.0.push((name.to_string(), args.clone()));
            }
            walk_expr(self, expr);
        }
    }

    let program = gml_parser::parse(text)?;
    let mut calls = Calls(Vec::new());
    walk_stmts(&mut calls, &program.body);
    Ok(calls.0)
}
