//! Node synthesis
//!
//! Synthetic nodes take a fresh id and the span of a template node (usually
//! the node that triggered the fix) so printers and later passes keep them
//! next to the code they came from. Without a template they have no span.

use gml_lexer::Span;
use gml_parser::{
    AppliedDiagnostics, AssignOp, Block, Comments, DeclKeyword, Declarator, Expr, ExprKind, Ident,
    Literal, NodeId, NodeIdGen, Stmt, StmtKind,
};

use crate::walk::VisitMut;

pub struct Synth<'a> {
    ids: &'a mut NodeIdGen,
    span: Option<Span>,
}

impl<'a> Synth<'a> {
    pub fn new(ids: &'a mut NodeIdGen, template: Option<Span>) -> Self {
        Self { ids, span: template }
    }

    pub fn expr(&mut self, kind: ExprKind) -> Expr {
        Expr::new(self.ids.fresh(), self.span, kind)
    }

    pub fn stmt(&mut self, kind: StmtKind) -> Stmt {
        Stmt::new(self.ids.fresh(), self.span, kind)
    }

    pub fn ident(&mut self, name: &str) -> Expr {
        self.expr(ExprKind::Identifier(name.to_string()))
    }

    pub fn number(&mut self, raw: &str) -> Expr {
        self.expr(ExprKind::Literal(Literal::Number(raw.to_string())))
    }

    pub fn undefined(&mut self) -> Expr {
        self.expr(ExprKind::Literal(Literal::Undefined))
    }

    pub fn call(&mut self, name: &str, args: Vec<Expr>) -> Expr {
        let callee = self.ident(name);
        self.expr(ExprKind::Call { callee: Box::new(callee), args })
    }

    /// `name(args);`
    pub fn call_stmt(&mut self, name: &str, args: Vec<Expr>) -> Stmt {
        let call = self.call(name, args);
        self.stmt(StmtKind::Expr(call))
    }

    pub fn member(&mut self, object: Expr, field: &str) -> Expr {
        let field = Ident::new(field, self.span);
        self.expr(ExprKind::Member { object: Box::new(object), field })
    }

    pub fn assign(&mut self, target: Expr, op: AssignOp, value: Expr) -> Expr {
        self.expr(ExprKind::Assignment { target: Box::new(target), op, value: Box::new(value) })
    }

    /// `target op value;`
    pub fn assign_stmt(&mut self, target: Expr, op: AssignOp, value: Expr) -> Stmt {
        let assignment = self.assign(target, op, value);
        self.stmt(StmtKind::Expr(assignment))
    }

    pub fn null_coalesce(&mut self, left: Expr, right: Expr) -> Expr {
        self.expr(ExprKind::NullCoalesce { left: Box::new(left), right: Box::new(right) })
    }

    /// `var name = init;`
    pub fn var_decl(&mut self, name: &str, init: Option<Expr>) -> Stmt {
        let declarator = Declarator {
            id: self.ids.fresh(),
            name: Ident::new(name, self.span),
            init,
            span: self.span,
        };
        self.stmt(StmtKind::VarDecl { keyword: DeclKeyword::Var, declarations: vec![declarator] })
    }

    pub fn block(&mut self, statements: Vec<Stmt>) -> Block {
        Block::new(statements, self.span)
    }

    /// Deep copy of `expr` with fresh ids throughout and this synth's span
    pub fn instantiate(&mut self, expr: &Expr) -> Expr {
        let mut copy = expr.clone();
        Restamp { ids: &mut *self.ids, span: self.span }.visit_expr(&mut copy);
        copy
    }
}

struct Restamp<'a> {
    ids: &'a mut NodeIdGen,
    span: Option<Span>,
}

impl VisitMut for Restamp<'_> {
    fn visit_node_id(&mut self, id: &mut NodeId) {
        *id = self.ids.fresh();
    }

    fn visit_span_slot(&mut self, slot: &mut Option<Span>) {
        *slot = self.span;
    }
}

/// Hand the comments and fix records of a replaced node to its replacement
pub fn carry_provenance(comments: &mut Comments, applied: &mut AppliedDiagnostics, from: NodeId, to: NodeId) {
    if from == to {
        return;
    }
    comments.transfer(from, to);
    applied.retarget(from, to);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::parse;
    use crate::walk::{walk_expr, Visit};

    #[test]
    fn test_call_stmt_clones_template_span() {
        let mut program = parse("draw_self();");
        let template = program.body[0].span;
        let stmt = Synth::new(&mut program.ids, template).call_stmt("gpu_set_blendmode", vec![]);
        assert_eq!(stmt.span, template);
        assert_eq!(stmt, parse("gpu_set_blendmode();").body[0]);
        assert_ne!(stmt.id, program.body[0].id);
    }

    #[test]
    fn test_instantiate_restamps_ids_and_spans() {
        let snippet = gml_parser::Parser::new("gpu_set_fog(false, c_white, 0, 1)").parse_expression_only().unwrap();
        let mut program = parse("a();");
        let copy = Synth::new(&mut program.ids, None).instantiate(&snippet);
        assert_eq!(copy, snippet);

        struct Check(Vec<(NodeId, Option<Span>)>);
        impl Visit for Check {
            fn visit_expr(&mut self, expr: &Expr) {
                self.0.push((expr.id, expr.span));
                walk_expr(self, expr);
            }
        }
        let mut check = Check(Vec::new());
        check.visit_expr(&copy);
        assert!(check.0.iter().all(|(id, span)| id.0 > 2 && span.is_none()));
    }

    #[test]
    fn test_carry_provenance_moves_comments() {
        let mut program = parse("// note\nfoo();");
        let old = program.body[0].id;
        let new = program.ids.fresh();
        carry_provenance(&mut program.comments, &mut program.applied, old, new);
        assert_eq!(program.comments.attached_to(new).count(), 1);
    }
}
