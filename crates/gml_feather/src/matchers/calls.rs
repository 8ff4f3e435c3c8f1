//! Call-site recognition
//!
//! Every helper looks through redundant parentheses first, so
//! `(foo)(a)` and `((foo(a)))` match like `foo(a)`.

use gml_parser::{Expr, ExprKind, Literal, Stmt, StmtKind};

/// Simple name of the callee when `expr` is a call
pub fn call_name(expr: &Expr) -> Option<&str> {
    match &expr.unparenthesized().kind {
        ExprKind::Call { callee, .. } => callee.unparenthesized().as_identifier(),
        _ => None,
    }
}

/// Positional arguments when `expr` is a call
pub fn call_args(expr: &Expr) -> Option<&[Expr]> {
    match &expr.unparenthesized().kind {
        ExprKind::Call { args, .. } => Some(args),
        _ => None,
    }
}

pub fn call_args_mut(expr: &mut Expr) -> Option<&mut Vec<Expr>> {
    match &mut expr.kind {
        ExprKind::Grouping(inner) => call_args_mut(inner),
        ExprKind::Call { args, .. } => Some(args),
        _ => None,
    }
}

pub fn is_call_to(expr: &Expr, name: &str) -> bool {
    call_name(expr) == Some(name)
}

/// The call made by an expression statement: `foo(a);`
pub fn stmt_call(stmt: &Stmt) -> Option<(&str, &[Expr])> {
    let StmtKind::Expr(expr) = &stmt.kind else {
        return None;
    };
    Some((call_name(expr)?, call_args(expr)?))
}

/// The call a statement is built around: `foo(a);`, `x = foo(a);` or
/// `var x = foo(a);` (single declarator)
pub fn stmt_top_call(stmt: &Stmt) -> Option<(&str, &[Expr])> {
    let expr = match &stmt.kind {
        StmtKind::Expr(expr) => match &expr.unparenthesized().kind {
            ExprKind::Assignment { value, .. } => &**value,
            _ => expr,
        },
        StmtKind::VarDecl { declarations, .. } if declarations.len() == 1 => declarations[0].init.as_ref()?,
        _ => return None,
    };
    Some((call_name(expr)?, call_args(expr)?))
}

pub fn stmt_call_name(stmt: &Stmt) -> Option<&str> {
    stmt_call(stmt).map(|(name, _)| name)
}

/// Does `expr` read as the given literal or constant?
///
/// Numbers compare by value, so `1`, `1.0` and `$1` all match `"1"`.
pub fn is_constant(expr: &Expr, expected: &str) -> bool {
    match &expr.unparenthesized().kind {
        ExprKind::Identifier(name) => name == expected,
        ExprKind::Literal(Literal::Boolean(value)) => expected == if *value { "true" } else { "false" },
        ExprKind::Literal(Literal::Undefined) => expected == "undefined",
        ExprKind::Literal(literal @ Literal::Number(_)) => {
            literal.as_number().is_some_and(|n| gml_parser::parse_number(expected) == Some(n))
        }
        ExprKind::Literal(Literal::String(raw)) => raw == expected,
        _ => false,
    }
}

/// Structural identity of two argument expressions (`buf` vs `buf`, `a.b` vs `a.b`)
pub fn same_expr(a: &Expr, b: &Expr) -> bool {
    a.unparenthesized() == b.unparenthesized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::parse;

    fn first_expr(source: &str) -> Expr {
        let program = parse(source);
        program.body[0].as_expr().cloned().unwrap()
    }

    #[test]
    fn test_call_name_unwraps_parentheses() {
        assert_eq!(call_name(&first_expr("((draw_self()));")), Some("draw_self"));
        assert_eq!(call_name(&first_expr("(foo)(1);")), Some("foo"));
        assert_eq!(call_name(&first_expr("a.b();")), None);
        assert_eq!(call_name(&first_expr("x = 1;")), None);
    }

    #[test]
    fn test_is_constant() {
        let args = first_expr("f(bm_normal, 1.0, true, undefined);");
        let args = call_args(&args).unwrap();
        assert!(is_constant(&args[0], "bm_normal"));
        assert!(is_constant(&args[1], "1"));
        assert!(is_constant(&args[2], "true"));
        assert!(is_constant(&args[3], "undefined"));
        assert!(!is_constant(&args[2], "false"));
    }

    #[test]
    fn test_stmt_call() {
        let program = parse("vertex_end(vb); x = 1;");
        let (name, args) = stmt_call(&program.body[0]).unwrap();
        assert_eq!(name, "vertex_end");
        assert_eq!(args.len(), 1);
        assert!(stmt_call(&program.body[1]).is_none());
    }

    #[test]
    fn test_stmt_top_call() {
        let program = parse("fmt = vertex_format_end(); var f = file_find_first(\"*\", 0); var a = 1, b = g();");
        assert_eq!(stmt_top_call(&program.body[0]).map(|c| c.0), Some("vertex_format_end"));
        assert_eq!(stmt_top_call(&program.body[1]).map(|c| c.1.len()), Some(2));
        assert!(stmt_top_call(&program.body[2]).is_none());
    }
}
