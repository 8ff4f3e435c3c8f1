//! GML Parser implementation
//!
//! A hand-written recursive descent parser for GML.

use gml_lexer::{Lexer, Span, Token, TokenKind};

use crate::ast::*;
use crate::comments::{attach_comments, Comment, CommentKind, Comments};

/// Parse error
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.span.start, self.span.end)
    }
}

impl std::error::Error for ParseError {}

/// The GML parser
pub struct Parser<'a> {
    source: &'a str,
    /// Non-comment tokens, always terminated by `Eof`
    tokens: Vec<Token<'a>>,
    comments: Vec<Comment>,
    current: usize,
    errors: Vec<ParseError>,
    ids: NodeIdGen,
}

impl<'a> Parser<'a> {
    /// Create a new parser from source code
    pub fn new(source: &'a str) -> Self {
        let lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        let mut comments = Vec::new();
        for token in lexer.tokenize() {
            let kind = match token.kind {
                TokenKind::LineComment(text) => (CommentKind::Line, text),
                TokenKind::BlockComment(text) => (CommentKind::Block, text),
                TokenKind::DocComment(text) => (CommentKind::Doc, text),
                _ => {
                    tokens.push(token);
                    continue;
                }
            };
            comments.push(Comment {
                kind: kind.0,
                text: kind.1.to_string(),
                span: token.span,
                attachment: None,
            });
        }
        Self {
            source,
            tokens,
            comments,
            current: 0,
            errors: Vec::new(),
            ids: NodeIdGen::new(),
        }
    }

    /// Parse the source into a program
    pub fn parse(mut self) -> Result<Program, Vec<ParseError>> {
        // ~1 statement per 10 tokens on average
        let mut statements = Vec::with_capacity(self.tokens.len() / 10);

        while !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
        }

        if !self.errors.is_empty() {
            return Err(self.errors);
        }

        let mut program = Program::new(statements, Span::new(0, self.source.len() as u32));
        program.comments = Comments::new(std::mem::take(&mut self.comments));
        program.ids = self.ids;
        attach_comments(&mut program, self.source);
        Ok(program)
    }

    /// Parse a standalone expression (used for example snippets)
    pub fn parse_expression_only(mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;
        self.match_token(&TokenKind::Semicolon);
        if !self.is_at_end() {
            return Err(ParseError::new("Trailing input after expression", self.current_span()));
        }
        Ok(expr)
    }

    // ========== Node construction ==========

    fn stmt(&mut self, start: Span, kind: StmtKind) -> Stmt {
        let end = self.previous_span();
        Stmt::new(self.ids.fresh(), Some(Span::new(start.start, end.end.max(start.start))), kind)
    }

    fn expr(&mut self, span: Span, kind: ExprKind) -> Expr {
        Expr::new(self.ids.fresh(), Some(span), kind)
    }

    fn span_from(&self, start: &Expr) -> Span {
        Span::new(span_of(start).start, self.previous_span().end)
    }

    // ========== Statement parsing ==========

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();

        match self.peek_kind() {
            TokenKind::Macro(name, body) => {
                let (name, body) = (*name, *body);
                self.advance();
                return Ok(self.macro_stmt(start, name, body));
            }
            TokenKind::Region(_) | TokenKind::EndRegion | TokenKind::Define(_) => {
                self.advance();
                return Ok(self.stmt(start, StmtKind::Empty));
            }
            TokenKind::Hash => {
                self.advance();
                self.skip_to_line_end();
                return Ok(self.stmt(start, StmtKind::Empty));
            }
            TokenKind::Error(message) => {
                return Err(ParseError::new(message.clone(), start));
            }
            _ => {}
        }

        if self.check(&TokenKind::Var) {
            self.parse_var_decl(&TokenKind::Var, DeclKeyword::Var)
        } else if self.check(&TokenKind::Static) {
            self.parse_var_decl(&TokenKind::Static, DeclKeyword::Static)
        } else if self.check(&TokenKind::Globalvar) {
            self.parse_globalvar_decl()
        } else if self.check(&TokenKind::Function) && matches!(self.peek_next_kind(), TokenKind::Identifier(_)) {
            self.parse_function_decl()
        } else if self.check(&TokenKind::If) {
            self.parse_if_stmt()
        } else if self.check(&TokenKind::For) {
            self.parse_for_stmt()
        } else if self.check(&TokenKind::While) {
            self.parse_while_stmt()
        } else if self.check(&TokenKind::Do) {
            self.parse_do_until_stmt()
        } else if self.check(&TokenKind::Repeat) {
            self.parse_repeat_stmt()
        } else if self.check(&TokenKind::With) {
            self.parse_with_stmt()
        } else if self.check(&TokenKind::Switch) {
            self.parse_switch_stmt()
        } else if self.check(&TokenKind::Return) {
            self.parse_return_stmt()
        } else if self.check(&TokenKind::Exit) {
            self.parse_simple_stmt(&TokenKind::Exit, StmtKind::Exit)
        } else if self.check(&TokenKind::Break) {
            self.parse_simple_stmt(&TokenKind::Break, StmtKind::Break)
        } else if self.check(&TokenKind::Continue) {
            self.parse_simple_stmt(&TokenKind::Continue, StmtKind::Continue)
        } else if self.check(&TokenKind::Throw) {
            self.parse_throw_stmt()
        } else if self.check(&TokenKind::Try) {
            self.parse_try_catch_stmt()
        } else if self.check(&TokenKind::Enum) {
            self.parse_enum_decl()
        } else if self.check(&TokenKind::Delete) {
            self.parse_delete_stmt()
        } else if self.check(&TokenKind::LeftBrace) {
            let block = self.parse_block()?;
            Ok(self.stmt(start, StmtKind::Block(block)))
        } else if self.check(&TokenKind::Semicolon) {
            self.advance();
            Ok(self.stmt(start, StmtKind::Empty))
        } else {
            self.parse_expr_stmt()
        }
    }

    fn macro_stmt(&mut self, start: Span, name: &'a str, body: Option<&'a str>) -> Stmt {
        let name_start = self.offset_of(name);
        let end = match body {
            Some(body) => self.offset_of(body) + body.len() as u32,
            None => name_start + name.len() as u32,
        };
        let name = Ident::new(name, Some(Span::new(name_start, name_start + name.len() as u32)));
        Stmt::new(
            self.ids.fresh(),
            Some(Span::new(start.start, end)),
            StmtKind::Macro {
                name,
                body: body.unwrap_or_default().to_string(),
            },
        )
    }

    fn parse_var_decl(&mut self, token: &TokenKind<'a>, keyword: DeclKeyword) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(token)?;

        let mut declarations = Vec::new();
        // Comma-separated: var a, b = 1, c;
        loop {
            let item_start = self.current_span();
            let name = self.expect_ident()?;

            let init = if self.match_token(&TokenKind::Assign) {
                Some(self.parse_expression()?)
            } else {
                None
            };

            let item_end = self.previous_span();
            declarations.push(Declarator {
                id: self.ids.fresh(),
                name,
                init,
                span: Some(Span::new(item_start.start, item_end.end)),
            });

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        // Optional semicolon
        self.match_token(&TokenKind::Semicolon);

        Ok(self.stmt(start, StmtKind::VarDecl { keyword, declarations }))
    }

    fn parse_globalvar_decl(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::Globalvar)?;

        let mut names = vec![self.expect_ident()?];
        while self.match_token(&TokenKind::Comma) {
            names.push(self.expect_ident()?);
        }
        self.match_token(&TokenKind::Semicolon);

        Ok(self.stmt(start, StmtKind::GlobalVarDecl { names }))
    }

    fn parse_function_decl(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        let func = self.parse_function()?;
        Ok(self.stmt(start, StmtKind::FunctionDecl(Box::new(func))))
    }

    /// Anonymous function expression: `function() { }` or `function(a, b) { }`
    fn parse_function_expr(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_span();
        let func = self.parse_function()?;
        let span = Span::new(start.start, self.previous_span().end);
        Ok(self.expr(span, ExprKind::Function(Box::new(func))))
    }

    fn parse_function(&mut self) -> Result<Function, ParseError> {
        self.expect(&TokenKind::Function)?;

        let name = if matches!(self.peek_kind(), TokenKind::Identifier(_)) {
            Some(self.expect_ident()?)
        } else {
            None
        };

        self.expect(&TokenKind::LeftParen)?;
        let params = self.parse_params()?;
        self.expect(&TokenKind::RightParen)?;

        // Inheritance: function Foo() : Bar() constructor {}
        let parent = if self.match_token(&TokenKind::Colon) {
            Some(Box::new(self.parse_call()?))
        } else {
            None
        };
        let is_constructor = self.match_token(&TokenKind::Constructor);

        let body = self.parse_block()?;

        Ok(Function {
            name,
            params,
            parent,
            is_constructor,
            body,
        })
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params = Vec::new();

        if !self.check(&TokenKind::RightParen) {
            loop {
                let param_start = self.current_span();
                let name = self.expect_ident()?;

                let default = if self.match_token(&TokenKind::Assign) {
                    Some(self.parse_expression()?)
                } else {
                    None
                };

                let param_end = self.previous_span();
                params.push(Param {
                    name,
                    default,
                    span: Some(Span::new(param_start.start, param_end.end)),
                });

                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }

        Ok(params)
    }

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::LeftBrace)?;

        let mut statements = Vec::new();

        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
        }

        self.expect(&TokenKind::RightBrace)?;
        let end = self.previous_span();

        Ok(Block::new(statements, Some(Span::new(start.start, end.end))))
    }

    /// Braced block, or a single statement wrapped in one
    fn parse_body(&mut self) -> Result<Block, ParseError> {
        if self.check(&TokenKind::LeftBrace) {
            self.parse_block()
        } else {
            let stmt = self.parse_statement()?;
            let span = stmt.span;
            Ok(Block::new(vec![stmt], span))
        }
    }

    fn parse_if_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::If)?;

        // Parentheses, if any, are part of the condition as a grouping
        let condition = self.parse_expression()?;
        self.match_token(&TokenKind::Then);

        let then_branch = self.parse_body()?;

        let else_branch = if self.match_token(&TokenKind::Else) {
            Some(Box::new(self.parse_else_branch()?))
        } else {
            None
        };

        Ok(self.stmt(start, StmtKind::If { condition, then_branch, else_branch }))
    }

    /// `else if` stays a nested `If`; any other bare statement is wrapped in a
    /// block like every other body
    fn parse_else_branch(&mut self) -> Result<Stmt, ParseError> {
        let stmt = self.parse_statement()?;
        if matches!(stmt.kind, StmtKind::If { .. } | StmtKind::Block(_)) {
            return Ok(stmt);
        }
        let span = stmt.span;
        Ok(Stmt::new(self.ids.fresh(), span, StmtKind::Block(Block::new(vec![stmt], span))))
    }

    fn parse_for_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::For)?;
        self.expect(&TokenKind::LeftParen)?;

        let init = if self.check(&TokenKind::Semicolon) {
            None
        } else if self.check(&TokenKind::Var) {
            Some(Box::new(self.parse_var_decl(&TokenKind::Var, DeclKeyword::Var)?))
        } else {
            Some(Box::new(self.parse_expr_stmt()?))
        };

        // Semicolon after init (may already be consumed by the declaration)
        if !matches!(self.previous().kind, TokenKind::Semicolon) {
            self.match_token(&TokenKind::Semicolon);
        }

        let condition = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon)?;

        let update = if self.check(&TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        // GML allows a trailing semicolon: for(;;i++;)
        self.match_token(&TokenKind::Semicolon);
        self.expect(&TokenKind::RightParen)?;

        let body = self.parse_body()?;

        Ok(self.stmt(start, StmtKind::For { init, condition, update, body }))
    }

    fn parse_while_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::While)?;
        let condition = self.parse_expression()?;
        let body = self.parse_body()?;
        Ok(self.stmt(start, StmtKind::While { condition, body }))
    }

    fn parse_do_until_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::Do)?;
        let body = self.parse_body()?;
        self.expect(&TokenKind::Until)?;
        let condition = self.parse_expression()?;
        self.match_token(&TokenKind::Semicolon);
        Ok(self.stmt(start, StmtKind::DoUntil { body, condition }))
    }

    fn parse_repeat_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::Repeat)?;
        let count = self.parse_expression()?;
        let body = self.parse_body()?;
        Ok(self.stmt(start, StmtKind::Repeat { count, body }))
    }

    fn parse_with_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::With)?;
        let target = self.parse_expression()?;
        let body = self.parse_body()?;
        Ok(self.stmt(start, StmtKind::With { target, body }))
    }

    fn parse_switch_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::Switch)?;

        let value = self.parse_expression()?;

        self.expect(&TokenKind::LeftBrace)?;

        let mut cases = Vec::new();

        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            if matches!(self.peek_kind(), TokenKind::Region(_) | TokenKind::EndRegion | TokenKind::Define(_)) {
                self.advance();
                continue;
            }

            let case_start = self.current_span();
            let case_value = if self.match_token(&TokenKind::Case) {
                let val = self.parse_expression()?;
                self.expect(&TokenKind::Colon)?;
                Some(val)
            } else if self.match_token(&TokenKind::Default) {
                self.expect(&TokenKind::Colon)?;
                None
            } else {
                return Err(ParseError::new("Expected 'case' or 'default'", self.current_span()));
            };

            let mut body = Vec::new();
            while !self.check(&TokenKind::Case)
                && !self.check(&TokenKind::Default)
                && !self.check(&TokenKind::RightBrace)
                && !self.is_at_end()
            {
                match self.parse_statement() {
                    Ok(stmt) => body.push(stmt),
                    Err(e) => {
                        self.errors.push(e);
                        self.synchronize();
                    }
                }
            }

            let case_end = self.previous_span();
            cases.push(SwitchCase {
                id: self.ids.fresh(),
                value: case_value,
                body,
                span: Some(Span::new(case_start.start, case_end.end)),
            });
        }

        self.expect(&TokenKind::RightBrace)?;

        Ok(self.stmt(start, StmtKind::Switch { value, cases }))
    }

    fn parse_return_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::Return)?;

        let value = if !self.check(&TokenKind::Semicolon) && !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.match_token(&TokenKind::Semicolon);
        Ok(self.stmt(start, StmtKind::Return { value }))
    }

    /// `exit`, `break` and `continue`
    fn parse_simple_stmt(&mut self, token: &TokenKind<'a>, kind: StmtKind) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(token)?;
        self.match_token(&TokenKind::Semicolon);
        Ok(self.stmt(start, kind))
    }

    fn parse_throw_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::Throw)?;
        let value = self.parse_expression()?;
        self.match_token(&TokenKind::Semicolon);
        Ok(self.stmt(start, StmtKind::Throw { value }))
    }

    fn parse_delete_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::Delete)?;
        let target = self.parse_expression()?;
        self.match_token(&TokenKind::Semicolon);
        Ok(self.stmt(start, StmtKind::Delete { target }))
    }

    fn parse_try_catch_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::Try)?;
        let try_block = self.parse_block()?;

        let mut catch_var = None;
        let mut catch_block = None;
        if self.match_token(&TokenKind::Catch) {
            if self.match_token(&TokenKind::LeftParen) {
                catch_var = Some(self.expect_ident()?);
                self.expect(&TokenKind::RightParen)?;
            }
            catch_block = Some(self.parse_block()?);
        }

        let mut finally_block = None;
        if self.match_token(&TokenKind::Finally) {
            finally_block = Some(self.parse_block()?);
        }

        Ok(self.stmt(
            start,
            StmtKind::TryCatch {
                try_block,
                catch_var,
                catch_block,
                finally_block,
            },
        ))
    }

    fn parse_enum_decl(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::Enum)?;
        let name = self.expect_ident()?;

        self.expect(&TokenKind::LeftBrace)?;

        let mut members = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            let member_start = self.current_span();
            let member_name = self.expect_ident()?;

            let value = if self.match_token(&TokenKind::Assign) {
                Some(self.parse_expression()?)
            } else {
                None
            };

            let member_end = self.previous_span();
            members.push(EnumMember {
                id: self.ids.fresh(),
                name: member_name,
                value,
                span: Some(Span::new(member_start.start, member_end.end)),
            });

            // Commas are optional between members, and a trailing one is allowed
            self.match_token(&TokenKind::Comma);
        }

        self.expect(&TokenKind::RightBrace)?;

        Ok(self.stmt(start, StmtKind::Enum { name, members }))
    }

    fn parse_expr_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        let expr = self.parse_expression()?;
        self.match_token(&TokenKind::Semicolon);
        Ok(self.stmt(start, StmtKind::Expr(expr)))
    }

    // ========== Expression parsing (precedence climbing) ==========

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_ternary()?;

        if let Some(op) = self.match_assign_op() {
            let value = self.parse_assignment()?;
            let span = Span::new(span_of(&expr).start, span_of(&value).end);
            return Ok(self.expr(
                span,
                ExprKind::Assignment {
                    target: Box::new(expr),
                    op,
                    value: Box::new(value),
                },
            ));
        }

        Ok(expr)
    }

    fn parse_ternary(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_null_coalesce()?;

        if self.match_token(&TokenKind::Question) {
            let then_expr = self.parse_expression()?;
            self.expect(&TokenKind::Colon)?;
            let else_expr = self.parse_ternary()?;
            let span = Span::new(span_of(&expr).start, span_of(&else_expr).end);
            return Ok(self.expr(
                span,
                ExprKind::Ternary {
                    condition: Box::new(expr),
                    then_expr: Box::new(then_expr),
                    else_expr: Box::new(else_expr),
                },
            ));
        }

        Ok(expr)
    }

    fn parse_null_coalesce(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_binary_level(0)?;

        while self.match_token(&TokenKind::NullCoalesce) {
            let right = self.parse_binary_level(0)?;
            let span = Span::new(span_of(&expr).start, span_of(&right).end);
            expr = self.expr(
                span,
                ExprKind::NullCoalesce {
                    left: Box::new(expr),
                    right: Box::new(right),
                },
            );
        }

        Ok(expr)
    }

    /// Left-associative binary levels, loosest first
    fn parse_binary_level(&mut self, level: usize) -> Result<Expr, ParseError> {
        if level == BINARY_LEVELS {
            return self.parse_unary();
        }

        let mut expr = self.parse_binary_level(level + 1)?;

        while let Some(op) = binary_op_at(level, self.peek_kind()) {
            self.advance();
            let right = self.parse_binary_level(level + 1)?;
            let span = Span::new(span_of(&expr).start, span_of(&right).end);
            expr = self.expr(
                span,
                ExprKind::Binary {
                    left: Box::new(expr),
                    op,
                    right: Box::new(right),
                },
            );
        }

        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_span();

        let op = match self.peek_kind() {
            TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Pos),
            TokenKind::BitNot => Some(UnaryOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            let span = Span::new(start.start, span_of(&operand).end);
            return Ok(self.expr(span, ExprKind::Unary { op, operand: Box::new(operand) }));
        }

        // Pre-increment/decrement
        let update = match self.peek_kind() {
            TokenKind::Increment => Some(UpdateOp::Increment),
            TokenKind::Decrement => Some(UpdateOp::Decrement),
            _ => None,
        };
        if let Some(op) = update {
            self.advance();
            let operand = self.parse_unary()?;
            let span = Span::new(start.start, span_of(&operand).end);
            return Ok(self.expr(
                span,
                ExprKind::Update {
                    operand: Box::new(operand),
                    op,
                    prefix: true,
                },
            ));
        }

        if self.match_token(&TokenKind::New) {
            let callee = self.parse_call()?;
            let span = Span::new(start.start, span_of(&callee).end);
            // new Foo(a) parses as a call; split it back into callee and args
            let (callee, args) = match callee.kind {
                ExprKind::Call { callee, args } => (callee, args),
                _ => (Box::new(callee), Vec::new()),
            };
            return Ok(self.expr(span, ExprKind::New { callee, args }));
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_call()?;

        let op = match self.peek_kind() {
            TokenKind::Increment => UpdateOp::Increment,
            TokenKind::Decrement => UpdateOp::Decrement,
            _ => return Ok(expr),
        };
        self.advance();
        let span = self.span_from(&expr);
        Ok(self.expr(
            span,
            ExprKind::Update {
                operand: Box::new(expr),
                op,
                prefix: false,
            },
        ))
    }

    fn parse_call(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.match_token(&TokenKind::LeftParen) {
                let args = self.parse_arguments()?;
                self.expect(&TokenKind::RightParen)?;
                let span = self.span_from(&expr);
                expr = self.expr(span, ExprKind::Call { callee: Box::new(expr), args });
            } else if self.match_token(&TokenKind::Dot) || self.match_token(&TokenKind::NullDot) {
                let field = self.expect_ident()?;
                let span = self.span_from(&expr);
                expr = self.expr(span, ExprKind::Member { object: Box::new(expr), field });
            } else if let Some(accessor) = accessor_of(self.peek_kind()) {
                self.advance();
                let mut indices = vec![self.parse_expression()?];
                while self.match_token(&TokenKind::Comma) {
                    indices.push(self.parse_expression()?);
                }
                self.expect(&TokenKind::RightBracket)?;
                let span = self.span_from(&expr);
                expr = self.expr(
                    span,
                    ExprKind::Index {
                        object: Box::new(expr),
                        accessor,
                        indices,
                    },
                );
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();

        if !self.check(&TokenKind::RightParen) {
            loop {
                if self.check(&TokenKind::Comma) || self.check(&TokenKind::RightParen) {
                    // Skipped argument: foo(a,, b)
                    let span = Span::new(self.current_span().start, self.current_span().start);
                    args.push(self.expr(span, ExprKind::Literal(Literal::Undefined)));
                } else {
                    args.push(self.parse_expression()?);
                }

                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }

        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let span = self.current_span();

        let literal = match self.peek_kind() {
            TokenKind::Number(raw) => Some(Literal::Number(raw.to_string())),
            TokenKind::String(raw) => Some(Literal::String(raw.to_string())),
            TokenKind::True => Some(Literal::Boolean(true)),
            TokenKind::False => Some(Literal::Boolean(false)),
            TokenKind::Undefined => Some(Literal::Undefined),
            _ => None,
        };
        if let Some(literal) = literal {
            self.advance();
            return Ok(self.expr(span, ExprKind::Literal(literal)));
        }

        if self.check(&TokenKind::Function) {
            return self.parse_function_expr();
        }

        if let TokenKind::Identifier(name) = self.peek_kind() {
            let name = name.to_string();
            self.advance();
            return Ok(self.expr(span, ExprKind::Identifier(name)));
        }

        if self.match_token(&TokenKind::LeftParen) {
            let inner = self.parse_expression()?;
            self.expect(&TokenKind::RightParen)?;
            let end = self.previous_span();
            return Ok(self.expr(Span::new(span.start, end.end), ExprKind::Grouping(Box::new(inner))));
        }

        if self.match_token(&TokenKind::LeftBracket) {
            let mut elements = Vec::new();
            while !self.check(&TokenKind::RightBracket) && !self.is_at_end() {
                elements.push(self.parse_expression()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RightBracket)?;
            let end = self.previous_span();
            return Ok(self.expr(Span::new(span.start, end.end), ExprKind::Array { elements }));
        }

        if self.match_token(&TokenKind::LeftBrace) {
            let mut fields = Vec::new();
            while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
                let key_span = self.current_span();
                let name = if let TokenKind::String(raw) = self.peek_kind() {
                    let key = raw.trim_matches(|c| c == '"' || c == '\'').to_string();
                    self.advance();
                    Ident::new(key, Some(key_span))
                } else {
                    self.expect_ident()?
                };
                self.expect(&TokenKind::Colon)?;
                let value = self.parse_expression()?;
                fields.push(StructField { name, value });
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RightBrace)?;
            let end = self.previous_span();
            return Ok(self.expr(Span::new(span.start, end.end), ExprKind::Struct { fields }));
        }

        Err(ParseError::new(
            format!("Expected expression, got {:?}", self.peek_kind()),
            span,
        ))
    }

    // ========== Helper methods ==========

    fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn peek(&self) -> &Token<'a> {
        // The lexer always terminates the stream with Eof
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind<'a> {
        &self.peek().kind
    }

    fn peek_next_kind(&self) -> &TokenKind<'a> {
        &self.tokens[(self.current + 1).min(self.tokens.len() - 1)].kind
    }

    fn previous(&self) -> &Token<'a> {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    fn previous_span(&self) -> Span {
        self.previous().span
    }

    fn advance(&mut self) -> &Token<'a> {
        let consumed = self.current.min(self.tokens.len() - 1);
        if self.current < self.tokens.len() {
            self.current += 1;
        }
        &self.tokens[consumed]
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind<'a>) -> Result<&Token<'a>, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::new(
                format!("Expected {:?}, got {:?}", kind, self.peek_kind()),
                self.current_span(),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<Ident, ParseError> {
        let span = self.current_span();
        if let TokenKind::Identifier(name) = self.peek_kind() {
            let name = name.to_string();
            self.advance();
            Ok(Ident::new(name, Some(span)))
        } else {
            Err(ParseError::new(
                format!("Expected identifier, got {:?}", self.peek_kind()),
                span,
            ))
        }
    }

    fn match_assign_op(&mut self) -> Option<AssignOp> {
        let op = match self.peek_kind() {
            TokenKind::Assign => AssignOp::Assign,
            TokenKind::PlusAssign => AssignOp::Add,
            TokenKind::MinusAssign => AssignOp::Sub,
            TokenKind::StarAssign => AssignOp::Mul,
            TokenKind::SlashAssign => AssignOp::Div,
            TokenKind::PercentAssign => AssignOp::Mod,
            TokenKind::BitAndAssign => AssignOp::BitAnd,
            TokenKind::BitOrAssign => AssignOp::BitOr,
            TokenKind::BitXorAssign => AssignOp::BitXor,
            TokenKind::ShiftLeftAssign => AssignOp::ShiftLeft,
            TokenKind::ShiftRightAssign => AssignOp::ShiftRight,
            TokenKind::NullCoalesceAssign => AssignOp::NullCoalesce,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    /// Byte offset of a slice borrowed from the source
    fn offset_of(&self, text: &str) -> u32 {
        (text.as_ptr() as usize).saturating_sub(self.source.as_ptr() as usize) as u32
    }

    fn skip_to_line_end(&mut self) {
        // Skip the rest of an unknown `#` directive up to the next statement starter
        while !self.is_at_end() {
            match self.peek_kind() {
                TokenKind::Function
                | TokenKind::Var
                | TokenKind::Static
                | TokenKind::If
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::Repeat
                | TokenKind::With
                | TokenKind::Return
                | TokenKind::Exit
                | TokenKind::LeftBrace
                | TokenKind::RightBrace
                | TokenKind::Macro(_, _)
                | TokenKind::Region(_)
                | TokenKind::EndRegion
                | TokenKind::Switch
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Enum
                | TokenKind::Try
                | TokenKind::Throw => break,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Recover from an error by skipping to a synchronization point
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            // After a semicolon, we're probably at a new statement
            if matches!(self.previous().kind, TokenKind::Semicolon) {
                return;
            }

            match self.peek_kind() {
                TokenKind::Function
                | TokenKind::Var
                | TokenKind::Static
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Return
                | TokenKind::Switch
                | TokenKind::With
                | TokenKind::Repeat => return,
                _ => {}
            }

            self.advance();
        }
    }
}

/// Source span of a parsed expression (parser output always has one)
fn span_of(expr: &Expr) -> Span {
    expr.span.unwrap_or_default()
}

const BINARY_LEVELS: usize = 11;

/// Binary operator accepted at `level`, loosest (`||`) to tightest (`*`)
fn binary_op_at(level: usize, kind: &TokenKind) -> Option<BinaryOp> {
    let (op, op_level) = match kind {
        TokenKind::Or => (BinaryOp::Or, 0),
        TokenKind::And => (BinaryOp::And, 1),
        TokenKind::Xor => (BinaryOp::Xor, 2),
        TokenKind::BitOr => (BinaryOp::BitOr, 3),
        TokenKind::BitXor => (BinaryOp::BitXor, 4),
        TokenKind::BitAnd => (BinaryOp::BitAnd, 5),
        TokenKind::Equal => (BinaryOp::Equal, 6),
        TokenKind::NotEqual => (BinaryOp::NotEqual, 6),
        TokenKind::Less => (BinaryOp::Less, 7),
        TokenKind::LessEqual => (BinaryOp::LessEqual, 7),
        TokenKind::Greater => (BinaryOp::Greater, 7),
        TokenKind::GreaterEqual => (BinaryOp::GreaterEqual, 7),
        TokenKind::ShiftLeft => (BinaryOp::ShiftLeft, 8),
        TokenKind::ShiftRight => (BinaryOp::ShiftRight, 8),
        TokenKind::Plus => (BinaryOp::Add, 9),
        TokenKind::Minus => (BinaryOp::Sub, 9),
        TokenKind::Star => (BinaryOp::Mul, 10),
        TokenKind::Slash => (BinaryOp::Div, 10),
        TokenKind::Percent | TokenKind::Mod => (BinaryOp::Mod, 10),
        TokenKind::Div => (BinaryOp::IDiv, 10),
        _ => return None,
    };
    (op_level == level).then_some(op)
}

fn accessor_of(kind: &TokenKind) -> Option<Accessor> {
    match kind {
        TokenKind::LeftBracket | TokenKind::NullBracket => Some(Accessor::Plain),
        TokenKind::ArrayAccessor => Some(Accessor::Array),
        TokenKind::ListAccessor => Some(Accessor::List),
        TokenKind::MapAccessor => Some(Accessor::Map),
        TokenKind::GridAccessor => Some(Accessor::Grid),
        TokenKind::StructAccessor => Some(Accessor::Struct),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        Parser::new(source).parse().unwrap()
    }

    #[test]
    fn test_parse_var_decl() {
        let program = parse("var x = 42;");
        assert_eq!(program.body.len(), 1);
        let StmtKind::VarDecl { keyword, declarations } = &program.body[0].kind else {
            panic!("Expected var declaration");
        };
        assert_eq!(*keyword, DeclKeyword::Var);
        assert_eq!(declarations[0].name.name, "x");
        assert_eq!(program.body[0].span, Some(Span::new(0, 11)));
    }

    #[test]
    fn test_parse_function() {
        let program = parse("function foo(a, b = 2) { return a + b; }");
        let StmtKind::FunctionDecl(func) = &program.body[0].kind else {
            panic!("Expected function");
        };
        assert_eq!(func.name.as_ref().map(|n| n.name.as_str()), Some("foo"));
        assert_eq!(func.params.len(), 2);
        assert!(func.params[1].default.is_some());
    }

    #[test]
    fn test_parse_constructor_with_parent() {
        let program = parse("function Child(a) : Parent(a) constructor { x = a; }");
        let StmtKind::FunctionDecl(func) = &program.body[0].kind else {
            panic!("Expected function");
        };
        assert!(func.is_constructor);
        assert!(func.parent.is_some());
    }

    #[test]
    fn test_parse_if_else() {
        assert!(Parser::new("if (x > 0) { y = 1; } else { y = 0; }").parse().is_ok());
    }

    #[test]
    fn test_bare_else_becomes_block() {
        let program = parse("if (a) {} else break;");
        let StmtKind::If { else_branch: Some(else_branch), .. } = &program.body[0].kind else {
            panic!("Expected if/else");
        };
        let StmtKind::Block(block) = &else_branch.kind else {
            panic!("Expected else block");
        };
        assert!(matches!(block.statements[0].kind, StmtKind::Break));
        assert_ne!(else_branch.id, block.statements[0].id);
        assert_eq!(program, parse("if (a) {} else { break; }"));

        let program = parse("if (a) {} else if (b) {}");
        assert!(matches!(
            &program.body[0].kind,
            StmtKind::If { else_branch: Some(branch), .. } if matches!(branch.kind, StmtKind::If { .. })
        ));
    }

    #[test]
    fn test_parse_for_loop() {
        let program = parse("for (var i = 0; i < 10; i++) { x += i; }");
        let StmtKind::For { init, condition, update, .. } = &program.body[0].kind else {
            panic!("Expected for");
        };
        assert!(init.is_some() && condition.is_some() && update.is_some());
    }

    #[test]
    fn test_precedence() {
        let program = parse("x = a + b * c;");
        let Some(Expr { kind: ExprKind::Assignment { value, .. }, .. }) = program.body[0].as_expr() else {
            panic!("Expected assignment");
        };
        let ExprKind::Binary { op, right, .. } = &value.kind else {
            panic!("Expected binary");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_index_accessors() {
        let program = parse("a[i, j] = grid[# 1, 2] + map[? \"k\"] + argument[0];");
        let Some(Expr { kind: ExprKind::Assignment { target, .. }, .. }) = program.body[0].as_expr() else {
            panic!("Expected assignment");
        };
        let ExprKind::Index { accessor, indices, .. } = &target.kind else {
            panic!("Expected index");
        };
        assert_eq!(*accessor, Accessor::Plain);
        assert_eq!(indices.len(), 2);
    }

    #[test]
    fn test_macro_statement() {
        let program = parse("#macro SPEED 4;\nx = SPEED;");
        let StmtKind::Macro { name, body } = &program.body[0].kind else {
            panic!("Expected macro");
        };
        assert_eq!(name.name, "SPEED");
        assert_eq!(body, "4;");
        assert_eq!(program.body[0].span, Some(Span::new(0, 15)));
    }

    #[test]
    fn test_globalvar_and_delete() {
        let program = parse("globalvar a, b;\ndelete s;");
        assert!(matches!(&program.body[0].kind, StmtKind::GlobalVarDecl { names } if names.len() == 2));
        assert!(matches!(program.body[1].kind, StmtKind::Delete { .. }));
    }

    #[test]
    fn test_new_expression() {
        let program = parse("v = new Vec2(1, 2);");
        let Some(Expr { kind: ExprKind::Assignment { value, .. }, .. }) = program.body[0].as_expr() else {
            panic!("Expected assignment");
        };
        assert!(matches!(&value.kind, ExprKind::New { args, .. } if args.len() == 2));
    }

    #[test]
    fn test_node_ids_are_unique() {
        let program = parse("var a = 1; if (a) { b(); } else c();");
        let mut ids = vec![program.body[0].id, program.body[1].id];
        if let StmtKind::VarDecl { declarations, .. } = &program.body[0].kind {
            ids.push(declarations[0].id);
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
        assert!(!ids.contains(&NodeId::ROOT));
    }

    #[test]
    fn test_structural_equality_ignores_layout() {
        assert_eq!(parse("x=1;\n\n  y =  2;"), parse("x = 1; y = 2;"));
    }

    #[test]
    fn test_parse_error_reports_span() {
        let errors = Parser::new("var = 3;").parse().unwrap_err();
        assert_eq!(errors[0].span, Span::new(4, 5));
    }

    #[test]
    fn test_expression_only() {
        let expr = Parser::new("gpu_set_fog(false, c_white, 0, 1)").parse_expression_only().unwrap();
        assert!(matches!(&expr.kind, ExprKind::Call { args, .. } if args.len() == 4));
    }
}
