//! AST node definitions for GML
//!
//! Nodes own their children and carry no parent pointers. Every statement,
//! expression, declarator, enum member and switch case has a `NodeId` that
//! stays stable while fixers rewrite the tree, plus an optional source span
//! (synthetic nodes may have none).
//!
//! Structural equality (`PartialEq`) deliberately ignores ids and spans, so a
//! rewritten tree can be compared against a freshly parsed expectation.

use gml_lexer::Span;

use crate::comments::Comments;
use crate::sidecar::AppliedDiagnostics;

/// Stable identity of a node within one tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The program root
    pub const ROOT: NodeId = NodeId(0);
}

/// Hands out fresh node ids for one tree
#[derive(Debug, Clone)]
pub struct NodeIdGen {
    next: u32,
}

impl NodeIdGen {
    pub fn new() -> Self {
        // 0 is reserved for the root
        Self { next: 1 }
    }

    pub fn fresh(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

impl Default for NodeIdGen {
    fn default() -> Self {
        Self::new()
    }
}

/// A GML program (file)
#[derive(Debug, Clone)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub span: Span,
    /// All comments of the file, in source order
    pub comments: Comments,
    pub ids: NodeIdGen,
    /// Fix provenance and per-tree guards, kept out of the node shapes
    pub applied: AppliedDiagnostics,
}

impl Program {
    pub fn new(body: Vec<Stmt>, span: Span) -> Self {
        Self {
            body,
            span,
            comments: Comments::default(),
            ids: NodeIdGen::new(),
            applied: AppliedDiagnostics::default(),
        }
    }
}

impl PartialEq for Program {
    fn eq(&self, other: &Self) -> bool {
        self.body == other.body
    }
}

/// A plain name with its own position (declaration names, parameters, fields)
#[derive(Debug, Clone)]
pub struct Ident {
    pub name: String,
    pub span: Option<Span>,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Option<Span>) -> Self {
        Self { name: name.into(), span }
    }
}

impl PartialEq for Ident {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// A statement in GML
#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: NodeId,
    pub span: Option<Span>,
    pub kind: StmtKind,
}

impl PartialEq for Stmt {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `var x = 5;`, `var a, b = 1;` or `static s = 0;`
    VarDecl {
        keyword: DeclKeyword,
        declarations: Vec<Declarator>,
    },
    /// `globalvar g_score, g_lives;`
    GlobalVarDecl { names: Vec<Ident> },
    /// `function foo(a, b) { ... }`, also constructors
    FunctionDecl(Box<Function>),
    If {
        condition: Expr,
        then_branch: Block,
        else_branch: Option<Box<Stmt>>,
    },
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        update: Option<Expr>,
        body: Block,
    },
    While { condition: Expr, body: Block },
    DoUntil { body: Block, condition: Expr },
    Repeat { count: Expr, body: Block },
    With { target: Expr, body: Block },
    Switch { value: Expr, cases: Vec<SwitchCase> },
    Return { value: Option<Expr> },
    Exit,
    Break,
    Continue,
    Throw { value: Expr },
    TryCatch {
        try_block: Block,
        catch_var: Option<Ident>,
        catch_block: Option<Block>,
        finally_block: Option<Block>,
    },
    Enum { name: Ident, members: Vec<EnumMember> },
    /// `#macro NAME body`
    Macro { name: Ident, body: String },
    /// `delete value;`
    Delete { target: Expr },
    Block(Block),
    Expr(Expr),
    /// Stray `;` or a preprocessor line without semantic content
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKeyword {
    Var,
    Static,
}

impl DeclKeyword {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclKeyword::Var => "var",
            DeclKeyword::Static => "static",
        }
    }
}

/// A single variable declaration item
#[derive(Debug, Clone)]
pub struct Declarator {
    pub id: NodeId,
    pub name: Ident,
    pub init: Option<Expr>,
    pub span: Option<Span>,
}

impl PartialEq for Declarator {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.init == other.init
    }
}

/// A block of statements
#[derive(Debug, Clone)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Option<Span>,
}

impl Block {
    pub fn new(statements: Vec<Stmt>, span: Option<Span>) -> Self {
        Self { statements, span }
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.statements == other.statements
    }
}

/// Named or anonymous function, shared by declarations and expressions
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Option<Ident>,
    pub params: Vec<Param>,
    /// Parent constructor call of `function Child() : Parent() constructor`
    pub parent: Option<Box<Expr>>,
    pub is_constructor: bool,
    pub body: Block,
}

/// A function parameter
#[derive(Debug, Clone)]
pub struct Param {
    pub name: Ident,
    pub default: Option<Expr>,
    pub span: Option<Span>,
}

impl PartialEq for Param {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.default == other.default
    }
}

/// A switch case; `value == None` is the default case
#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub id: NodeId,
    pub value: Option<Expr>,
    pub body: Vec<Stmt>,
    pub span: Option<Span>,
}

impl PartialEq for SwitchCase {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.body == other.body
    }
}

/// An enum member
#[derive(Debug, Clone)]
pub struct EnumMember {
    pub id: NodeId,
    pub name: Ident,
    pub value: Option<Expr>,
    pub span: Option<Span>,
}

impl PartialEq for EnumMember {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value
    }
}

/// An expression in GML
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub span: Option<Span>,
    pub kind: ExprKind,
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Identifier(String),
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Function call: `foo(a, b)`
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// Member access: `obj.x`
    Member {
        object: Box<Expr>,
        field: Ident,
    },
    /// Index access: `arr[0]`, `arr[i, j]`, `grid[# x, y]`, `map[? key]`
    Index {
        object: Box<Expr>,
        accessor: Accessor,
        indices: Vec<Expr>,
    },
    Array {
        elements: Vec<Expr>,
    },
    Struct {
        fields: Vec<StructField>,
    },
    Assignment {
        target: Box<Expr>,
        op: AssignOp,
        value: Box<Expr>,
    },
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    NullCoalesce {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Update {
        operand: Box<Expr>,
        op: UpdateOp,
        prefix: bool,
    },
    New {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// Parentheses
    Grouping(Box<Expr>),
    /// Anonymous function expression: `function(a, b) { ... }`
    Function(Box<Function>),
}

/// A `key: value` pair of a struct literal
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: Ident,
    pub value: Expr,
}

/// A literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Raw numeric lexeme as written
    Number(String),
    /// Raw string lexeme including quotes
    String(String),
    Boolean(bool),
    Undefined,
}

impl Literal {
    /// Numeric value of a number literal, if it can be read
    pub fn as_number(&self) -> Option<f64> {
        let Literal::Number(raw) = self else {
            return None;
        };
        parse_number(raw)
    }

    /// Unquoted contents of a plain string literal
    pub fn string_value(&self) -> Option<&str> {
        let Literal::String(raw) = self else {
            return None;
        };
        let raw = raw.strip_prefix('@').unwrap_or(raw);
        raw.get(1..raw.len().saturating_sub(1))
    }
}

/// Read a GML numeric lexeme (`12`, `.5`, `5.`, `$FF`, `0x1F`, `0b101`, `#FF00FF`)
pub fn parse_number(raw: &str) -> Option<f64> {
    let lower = raw.to_ascii_lowercase();
    let radix = |digits: &str, radix: u32| {
        let digits: String = digits.chars().filter(|c| *c != '_').collect();
        i64::from_str_radix(&digits, radix).ok().map(|v| v as f64)
    };
    if let Some(hex) = lower.strip_prefix("0x") {
        radix(hex, 16)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        radix(bin, 2)
    } else if let Some(hex) = lower.strip_prefix('$').or_else(|| lower.strip_prefix('#')) {
        radix(hex, 16)
    } else {
        let trimmed = lower.strip_suffix('.').unwrap_or(&lower);
        trimmed.parse().ok()
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add, Sub, Mul, Div, Mod, IDiv,
    Equal, NotEqual, Greater, GreaterEqual, Less, LessEqual,
    And, Or, Xor,
    BitAnd, BitOr, BitXor, ShiftLeft, ShiftRight,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Pos, Neg, Not, BitNot,
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add, Sub, Mul, Div, Mod,
    BitAnd, BitOr, BitXor, ShiftLeft, ShiftRight,
    NullCoalesce,
}

/// Increment/decrement operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

/// Accessor flavours of an index expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
    /// `[`
    Plain,
    /// `[@`
    Array,
    /// `[|`
    List,
    /// `[?`
    Map,
    /// `[#`
    Grid,
    /// `[$`
    Struct,
}

impl Stmt {
    pub fn new(id: NodeId, span: Option<Span>, kind: StmtKind) -> Self {
        Self { id, span, kind }
    }

    /// The expression of an expression statement
    pub fn as_expr(&self) -> Option<&Expr> {
        match &self.kind {
            StmtKind::Expr(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, StmtKind::Empty)
    }
}

impl Expr {
    pub fn new(id: NodeId, span: Option<Span>, kind: ExprKind) -> Self {
        Self { id, span, kind }
    }

    /// Name of a plain identifier expression
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// Strip any number of enclosing parentheses
    pub fn unparenthesized(&self) -> &Expr {
        let mut expr = self;
        while let ExprKind::Grouping(inner) = &expr.kind {
            expr = inner;
        }
        expr
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self.unparenthesized().kind, ExprKind::Literal(Literal::Undefined))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(id: u32, name: &str, span: Option<Span>) -> Expr {
        Expr::new(NodeId(id), span, ExprKind::Identifier(name.to_string()))
    }

    #[test]
    fn test_equality_ignores_identity_and_position() {
        let a = ident(1, "x", Some(Span::new(0, 1)));
        let b = ident(7, "x", None);
        assert_eq!(a, b);
        assert_ne!(a, ident(1, "y", Some(Span::new(0, 1))));
    }

    #[test]
    fn test_parse_number_spellings() {
        assert_eq!(parse_number("12"), Some(12.0));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("5."), Some(5.0));
        assert_eq!(parse_number("$FF"), Some(255.0));
        assert_eq!(parse_number("0X1f"), Some(31.0));
        assert_eq!(parse_number("0b1_01"), Some(5.0));
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn test_string_value_strips_quotes() {
        assert_eq!(Literal::String("\"12\"".into()).string_value(), Some("12"));
        assert_eq!(Literal::String("@'raw'".into()).string_value(), Some("raw"));
        assert_eq!(Literal::Number("1".into()).string_value(), None);
    }

    #[test]
    fn test_unparenthesized() {
        let inner = ident(2, "x", None);
        let grouped = Expr::new(
            NodeId(3),
            None,
            ExprKind::Grouping(Box::new(Expr::new(NodeId(4), None, ExprKind::Grouping(Box::new(inner))))),
        );
        assert_eq!(grouped.unparenthesized().as_identifier(), Some("x"));
    }
}
