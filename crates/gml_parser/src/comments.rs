//! Root-owned comment list
//!
//! Comments never appear in the node tree. Each one optionally points at the
//! statement it belongs to, decided by source proximity once parsing is done:
//! a comment that shares a line with the end of a statement trails it, a
//! comment followed by a statement leads it, and a comment with nothing after
//! it inside a block sits inside the enclosing statement.

use gml_lexer::Span;

use crate::ast::{Block, Expr, ExprKind, NodeId, Program, Stmt, StmtKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// `// ...`
    Line,
    /// `/* ... */`
    Block,
    /// `/// ...`
    Doc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentPlacement {
    Leading,
    Trailing,
    Inner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentAttachment {
    pub node: NodeId,
    pub placement: CommentPlacement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub kind: CommentKind,
    /// Content without the delimiters
    pub text: String,
    pub span: Span,
    pub attachment: Option<CommentAttachment>,
}

/// All comments of a file, in source order
#[derive(Debug, Clone, Default)]
pub struct Comments(Vec<Comment>);

impl Comments {
    pub fn new(comments: Vec<Comment>) -> Self {
        Self(comments)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Comment> {
        self.0.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Comments attached to `node`, any placement
    pub fn attached_to(&self, node: NodeId) -> impl Iterator<Item = &Comment> {
        self.0
            .iter()
            .filter(move |c| c.attachment.is_some_and(|a| a.node == node))
    }

    /// Reattach every comment of `from` to `to`, keeping placements.
    /// Returns the number of comments moved.
    pub fn transfer(&mut self, from: NodeId, to: NodeId) -> usize {
        let mut moved = 0;
        for comment in &mut self.0 {
            if let Some(attachment) = &mut comment.attachment {
                if attachment.node == from {
                    attachment.node = to;
                    moved += 1;
                }
            }
        }
        moved
    }

    /// The run of doc comments immediately leading `node`
    pub fn doc_comments_of(&self, node: NodeId) -> Vec<&Comment> {
        self.0
            .iter()
            .filter(|c| {
                c.kind == CommentKind::Doc
                    && c.attachment
                        == Some(CommentAttachment {
                            node,
                            placement: CommentPlacement::Leading,
                        })
            })
            .collect()
    }
}

/// Attach every comment of `program` to its closest statement
pub fn attach_comments(program: &mut Program, source: &str) {
    let mut statements = Vec::new();
    collect_statement_spans(&program.body, 0, &mut statements);
    // Outer statements first, then by position
    statements.sort_by_key(|s| (s.span.start, s.depth));

    let bytes = source.as_bytes();
    let same_line = |from: u32, to: u32| {
        let (from, to) = (from as usize, (to as usize).min(bytes.len()));
        from <= to && !bytes[from..to].contains(&b'\n')
    };

    for comment in program.comments.iter_mut() {
        comment.attachment = resolve(&statements, comment.span, &same_line);
    }
}

struct StatementSpan {
    id: NodeId,
    span: Span,
    depth: u32,
}

fn resolve(
    statements: &[StatementSpan],
    comment: Span,
    same_line: &impl Fn(u32, u32) -> bool,
) -> Option<CommentAttachment> {
    let attach = |id, placement| Some(CommentAttachment { node: id, placement });

    // Trailing: the deepest statement ending on the comment's line, right before it
    let trailing = statements
        .iter()
        .filter(|s| s.span.end <= comment.start && same_line(s.span.end, comment.start))
        .max_by_key(|s| (s.span.end, s.depth));
    if let Some(s) = trailing {
        return attach(s.id, CommentPlacement::Trailing);
    }

    // Innermost enclosing statement bounds the search for a following one
    let enclosing = statements
        .iter()
        .filter(|s| s.span.start < comment.start && comment.end <= s.span.end)
        .max_by_key(|s| s.depth);
    let bound = enclosing.map_or(u32::MAX, |s| s.span.end);

    let leading = statements
        .iter()
        .filter(|s| s.span.start >= comment.end && s.span.start < bound)
        .min_by_key(|s| (s.span.start, s.depth));
    if let Some(s) = leading {
        return attach(s.id, CommentPlacement::Leading);
    }

    enclosing.and_then(|s| attach(s.id, CommentPlacement::Inner))
}

fn collect_statement_spans(stmts: &[Stmt], depth: u32, out: &mut Vec<StatementSpan>) {
    for stmt in stmts {
        if let Some(span) = stmt.span {
            out.push(StatementSpan { id: stmt.id, span, depth });
        }
        let depth = depth + 1;
        match &stmt.kind {
            StmtKind::VarDecl { declarations, .. } => {
                for decl in declarations {
                    if let Some(init) = &decl.init {
                        collect_in_expr(init, depth, out);
                    }
                }
            }
            StmtKind::FunctionDecl(func) => {
                collect_block(&func.body, depth, out);
            }
            StmtKind::If { condition, then_branch, else_branch } => {
                collect_in_expr(condition, depth, out);
                collect_block(then_branch, depth, out);
                if let Some(else_branch) = else_branch {
                    collect_statement_spans(std::slice::from_ref(else_branch), depth, out);
                }
            }
            StmtKind::For { init, body, .. } => {
                if let Some(init) = init {
                    collect_statement_spans(std::slice::from_ref(init), depth, out);
                }
                collect_block(body, depth, out);
            }
            StmtKind::While { body, .. }
            | StmtKind::DoUntil { body, .. }
            | StmtKind::Repeat { body, .. }
            | StmtKind::With { body, .. } => collect_block(body, depth, out),
            StmtKind::Switch { cases, .. } => {
                for case in cases {
                    collect_statement_spans(&case.body, depth, out);
                }
            }
            StmtKind::TryCatch { try_block, catch_block, finally_block, .. } => {
                collect_block(try_block, depth, out);
                for block in [catch_block, finally_block].into_iter().flatten() {
                    collect_block(block, depth, out);
                }
            }
            StmtKind::Block(block) => collect_block(block, depth, out),
            StmtKind::Expr(expr) | StmtKind::Return { value: Some(expr) } => {
                collect_in_expr(expr, depth, out)
            }
            _ => {}
        }
    }
}

fn collect_block(block: &Block, depth: u32, out: &mut Vec<StatementSpan>) {
    collect_statement_spans(&block.statements, depth, out);
}

/// Function literals nested in expressions own statements too
fn collect_in_expr(expr: &Expr, depth: u32, out: &mut Vec<StatementSpan>) {
    match &expr.kind {
        ExprKind::Function(func) => collect_block(&func.body, depth, out),
        ExprKind::Assignment { value, .. } => collect_in_expr(value, depth, out),
        ExprKind::Call { args, .. } | ExprKind::New { args, .. } => {
            for arg in args {
                collect_in_expr(arg, depth, out);
            }
        }
        ExprKind::Struct { fields } => {
            for field in fields {
                collect_in_expr(&field.value, depth, out);
            }
        }
        ExprKind::Grouping(inner) => collect_in_expr(inner, depth, out),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;

    fn placements(source: &str) -> Vec<(String, Option<CommentPlacement>)> {
        let program = Parser::new(source).parse().unwrap();
        program
            .comments
            .iter()
            .map(|c| (c.text.trim().to_string(), c.attachment.map(|a| a.placement)))
            .collect()
    }

    #[test]
    fn test_trailing_and_leading() {
        let got = placements("// head\nx = 1; // tail\ny = 2;");
        assert_eq!(
            got,
            vec![
                ("head".to_string(), Some(CommentPlacement::Leading)),
                ("tail".to_string(), Some(CommentPlacement::Trailing)),
            ]
        );
    }

    #[test]
    fn test_inner_comment_in_empty_block() {
        let got = placements("if (a) {\n    // nothing yet\n}");
        assert_eq!(got, vec![("nothing yet".to_string(), Some(CommentPlacement::Inner))]);
    }

    #[test]
    fn test_transfer() {
        let mut program = Parser::new("// keep me\nfoo();").parse().unwrap();
        let old = program.body[0].id;
        let new = program.ids.fresh();
        assert_eq!(program.comments.transfer(old, new), 1);
        assert_eq!(program.comments.attached_to(new).count(), 1);
        assert_eq!(program.comments.attached_to(old).count(), 0);
    }

    #[test]
    fn test_doc_comments_lead_function() {
        let program = Parser::new("/// @param {real} speed\nfunction go(argument0) {}").parse().unwrap();
        let docs = program.comments.doc_comments_of(program.body[0].id);
        assert_eq!(docs.len(), 1);
        assert!(docs[0].text.contains("@param"));
    }
}
