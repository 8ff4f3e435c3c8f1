//! Tree traversal shared by every fixer
//!
//! Two flavours:
//! - `Visit`/`VisitMut`: full node traversal (statements, expressions, names, spans).
//!   Override a hook and call the matching `walk_*` function to keep descending.
//! - `visit_stmt_lists`: hands every statement list to a closure together with
//!   the control-flow context it sits in. Fixers that insert or delete
//!   statements work at this level, using a `StatementCursor`.

use gml_lexer::Span;
use gml_parser::{Block, Expr, ExprKind, Function, Ident, NodeId, Stmt, StmtKind};

use crate::matchers::statements::ParentField;

// ========== Read-only traversal ==========

pub trait Visit {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt)
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr)
    }

    fn visit_function(&mut self, func: &Function) {
        walk_function(self, func)
    }
}

pub fn walk_stmts<V: Visit + ?Sized>(v: &mut V, stmts: &[Stmt]) {
    for stmt in stmts {
        v.visit_stmt(stmt);
    }
}

pub fn walk_block<V: Visit + ?Sized>(v: &mut V, block: &Block) {
    walk_stmts(v, &block.statements);
}

pub fn walk_function<V: Visit + ?Sized>(v: &mut V, func: &Function) {
    for param in &func.params {
        if let Some(default) = &param.default {
            v.visit_expr(default);
        }
    }
    if let Some(parent) = &func.parent {
        v.visit_expr(parent);
    }
    walk_block(v, &func.body);
}

pub fn walk_stmt<V: Visit + ?Sized>(v: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::VarDecl { declarations, .. } => {
            for decl in declarations {
                if let Some(init) = &decl.init {
                    v.visit_expr(init);
                }
            }
        }
        StmtKind::FunctionDecl(func) => v.visit_function(func),
        StmtKind::If { condition, then_branch, else_branch } => {
            v.visit_expr(condition);
            walk_block(v, then_branch);
            if let Some(else_branch) = else_branch {
                v.visit_stmt(else_branch);
            }
        }
        StmtKind::For { init, condition, update, body } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            if let Some(condition) = condition {
                v.visit_expr(condition);
            }
            if let Some(update) = update {
                v.visit_expr(update);
            }
            walk_block(v, body);
        }
        StmtKind::While { condition, body } | StmtKind::DoUntil { body, condition } => {
            v.visit_expr(condition);
            walk_block(v, body);
        }
        StmtKind::Repeat { count: head, body } | StmtKind::With { target: head, body } => {
            v.visit_expr(head);
            walk_block(v, body);
        }
        StmtKind::Switch { value, cases } => {
            v.visit_expr(value);
            for case in cases {
                if let Some(value) = &case.value {
                    v.visit_expr(value);
                }
                walk_stmts(v, &case.body);
            }
        }
        StmtKind::TryCatch { try_block, catch_block, finally_block, .. } => {
            walk_block(v, try_block);
            for block in [catch_block, finally_block].into_iter().flatten() {
                walk_block(v, block);
            }
        }
        StmtKind::Enum { members, .. } => {
            for member in members {
                if let Some(value) = &member.value {
                    v.visit_expr(value);
                }
            }
        }
        StmtKind::Block(block) => walk_block(v, block),
        StmtKind::Return { value: Some(expr) }
        | StmtKind::Throw { value: expr }
        | StmtKind::Delete { target: expr }
        | StmtKind::Expr(expr) => v.visit_expr(expr),
        StmtKind::Return { value: None }
        | StmtKind::GlobalVarDecl { .. }
        | StmtKind::Macro { .. }
        | StmtKind::Exit
        | StmtKind::Break
        | StmtKind::Continue
        | StmtKind::Empty => {}
    }
}

pub fn walk_expr<V: Visit + ?Sized>(v: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Binary { left, right, .. } | ExprKind::NullCoalesce { left, right } => {
            v.visit_expr(left);
            v.visit_expr(right);
        }
        ExprKind::Assignment { target, value, .. } => {
            v.visit_expr(target);
            v.visit_expr(value);
        }
        ExprKind::Unary { operand, .. } | ExprKind::Update { operand, .. } => v.visit_expr(operand),
        ExprKind::Call { callee, args } | ExprKind::New { callee, args } => {
            v.visit_expr(callee);
            for arg in args {
                v.visit_expr(arg);
            }
        }
        ExprKind::Member { object, .. } => v.visit_expr(object),
        ExprKind::Index { object, indices, .. } => {
            v.visit_expr(object);
            for index in indices {
                v.visit_expr(index);
            }
        }
        ExprKind::Array { elements } => {
            for element in elements {
                v.visit_expr(element);
            }
        }
        ExprKind::Struct { fields } => {
            for field in fields {
                v.visit_expr(&field.value);
            }
        }
        ExprKind::Ternary { condition, then_expr, else_expr } => {
            v.visit_expr(condition);
            v.visit_expr(then_expr);
            v.visit_expr(else_expr);
        }
        ExprKind::Grouping(inner) => v.visit_expr(inner),
        ExprKind::Function(func) => v.visit_function(func),
        ExprKind::Literal(_) | ExprKind::Identifier(_) => {}
    }
}

// ========== Mutable traversal ==========

pub trait VisitMut {
    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt)
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr)
    }

    fn visit_function(&mut self, func: &mut Function) {
        walk_function_mut(self, func)
    }

    /// Declaration-site and member names (never references)
    fn visit_ident(&mut self, _ident: &mut Ident) {}

    /// Every node identity, statements and expressions included
    fn visit_node_id(&mut self, _id: &mut NodeId) {}

    fn visit_span(&mut self, _span: &mut Span) {}

    /// Every optional span field; visits the span when there is one
    fn visit_span_slot(&mut self, slot: &mut Option<Span>) {
        if let Some(span) = slot {
            self.visit_span(span);
        }
    }
}

fn span_mut<V: VisitMut + ?Sized>(v: &mut V, span: &mut Option<Span>) {
    v.visit_span_slot(span);
}

fn ident_mut<V: VisitMut + ?Sized>(v: &mut V, ident: &mut Ident) {
    v.visit_ident(ident);
    span_mut(v, &mut ident.span);
}

pub fn walk_stmts_mut<V: VisitMut + ?Sized>(v: &mut V, stmts: &mut [Stmt]) {
    for stmt in stmts {
        v.visit_stmt(stmt);
    }
}

pub fn walk_block_mut<V: VisitMut + ?Sized>(v: &mut V, block: &mut Block) {
    span_mut(v, &mut block.span);
    walk_stmts_mut(v, &mut block.statements);
}

pub fn walk_function_mut<V: VisitMut + ?Sized>(v: &mut V, func: &mut Function) {
    if let Some(name) = &mut func.name {
        ident_mut(v, name);
    }
    for param in &mut func.params {
        ident_mut(v, &mut param.name);
        span_mut(v, &mut param.span);
        if let Some(default) = &mut param.default {
            v.visit_expr(default);
        }
    }
    if let Some(parent) = &mut func.parent {
        v.visit_expr(parent);
    }
    walk_block_mut(v, &mut func.body);
}

pub fn walk_stmt_mut<V: VisitMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    v.visit_node_id(&mut stmt.id);
    span_mut(v, &mut stmt.span);
    match &mut stmt.kind {
        StmtKind::VarDecl { declarations, .. } => {
            for decl in declarations {
                v.visit_node_id(&mut decl.id);
                span_mut(v, &mut decl.span);
                ident_mut(v, &mut decl.name);
                if let Some(init) = &mut decl.init {
                    v.visit_expr(init);
                }
            }
        }
        StmtKind::GlobalVarDecl { names } => {
            for name in names {
                ident_mut(v, name);
            }
        }
        StmtKind::FunctionDecl(func) => v.visit_function(func),
        StmtKind::If { condition, then_branch, else_branch } => {
            v.visit_expr(condition);
            walk_block_mut(v, then_branch);
            if let Some(else_branch) = else_branch {
                v.visit_stmt(else_branch);
            }
        }
        StmtKind::For { init, condition, update, body } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            if let Some(condition) = condition {
                v.visit_expr(condition);
            }
            if let Some(update) = update {
                v.visit_expr(update);
            }
            walk_block_mut(v, body);
        }
        StmtKind::While { condition, body } | StmtKind::DoUntil { body, condition } => {
            v.visit_expr(condition);
            walk_block_mut(v, body);
        }
        StmtKind::Repeat { count: head, body } | StmtKind::With { target: head, body } => {
            v.visit_expr(head);
            walk_block_mut(v, body);
        }
        StmtKind::Switch { value, cases } => {
            v.visit_expr(value);
            for case in cases {
                v.visit_node_id(&mut case.id);
                span_mut(v, &mut case.span);
                if let Some(value) = &mut case.value {
                    v.visit_expr(value);
                }
                walk_stmts_mut(v, &mut case.body);
            }
        }
        StmtKind::TryCatch { try_block, catch_var, catch_block, finally_block } => {
            walk_block_mut(v, try_block);
            if let Some(catch_var) = catch_var {
                ident_mut(v, catch_var);
            }
            for block in [catch_block, finally_block].into_iter().flatten() {
                walk_block_mut(v, block);
            }
        }
        StmtKind::Enum { name, members } => {
            ident_mut(v, name);
            for member in members {
                v.visit_node_id(&mut member.id);
                span_mut(v, &mut member.span);
                ident_mut(v, &mut member.name);
                if let Some(value) = &mut member.value {
                    v.visit_expr(value);
                }
            }
        }
        StmtKind::Macro { name, .. } => ident_mut(v, name),
        StmtKind::Block(block) => walk_block_mut(v, block),
        StmtKind::Return { value: Some(expr) }
        | StmtKind::Throw { value: expr }
        | StmtKind::Delete { target: expr }
        | StmtKind::Expr(expr) => v.visit_expr(expr),
        StmtKind::Return { value: None }
        | StmtKind::Exit
        | StmtKind::Break
        | StmtKind::Continue
        | StmtKind::Empty => {}
    }
}

pub fn walk_expr_mut<V: VisitMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    v.visit_node_id(&mut expr.id);
    span_mut(v, &mut expr.span);
    match &mut expr.kind {
        ExprKind::Binary { left, right, .. } | ExprKind::NullCoalesce { left, right } => {
            v.visit_expr(left);
            v.visit_expr(right);
        }
        ExprKind::Assignment { target, value, .. } => {
            v.visit_expr(target);
            v.visit_expr(value);
        }
        ExprKind::Unary { operand, .. } | ExprKind::Update { operand, .. } => v.visit_expr(operand),
        ExprKind::Call { callee, args } | ExprKind::New { callee, args } => {
            v.visit_expr(callee);
            for arg in args {
                v.visit_expr(arg);
            }
        }
        ExprKind::Member { object, field } => {
            v.visit_expr(object);
            ident_mut(v, field);
        }
        ExprKind::Index { object, indices, .. } => {
            v.visit_expr(object);
            for index in indices {
                v.visit_expr(index);
            }
        }
        ExprKind::Array { elements } => {
            for element in elements {
                v.visit_expr(element);
            }
        }
        ExprKind::Struct { fields } => {
            for field in fields {
                ident_mut(v, &mut field.name);
                v.visit_expr(&mut field.value);
            }
        }
        ExprKind::Ternary { condition, then_expr, else_expr } => {
            v.visit_expr(condition);
            v.visit_expr(then_expr);
            v.visit_expr(else_expr);
        }
        ExprKind::Grouping(inner) => v.visit_expr(inner),
        ExprKind::Function(func) => v.visit_function(func),
        ExprKind::Literal(_) | ExprKind::Identifier(_) => {}
    }
}

// ========== Queries ==========

/// Is `name` referenced as an identifier anywhere in `stmts` (nested functions included)?
pub fn references_identifier(stmts: &[Stmt], name: &str) -> bool {
    struct Finder<'n> {
        name: &'n str,
        found: bool,
    }
    impl Visit for Finder<'_> {
        fn visit_expr(&mut self, expr: &Expr) {
            if self.found {
                return;
            }
            if expr.as_identifier() == Some(self.name) {
                self.found = true;
                return;
            }
            walk_expr(self, expr);
        }
    }
    let mut finder = Finder { name, found: false };
    walk_stmts(&mut finder, stmts);
    finder.found
}

/// Same as `references_identifier`, for a single expression
pub fn expr_references_identifier(expr: &Expr, name: &str) -> bool {
    let mut found = false;
    for_each_expr(expr, &mut |e: &Expr| found |= e.as_identifier() == Some(name));
    found
}

/// Call `f` on `expr` and every expression nested in it
pub fn for_each_expr(expr: &Expr, f: &mut dyn FnMut(&Expr)) {
    struct Each<'f> {
        f: &'f mut dyn FnMut(&Expr),
    }
    impl Visit for Each<'_> {
        fn visit_expr(&mut self, expr: &Expr) {
            (self.f)(expr);
            walk_expr(self, expr);
        }
    }
    Each { f }.visit_expr(expr);
}

/// Every id in the tree, for re-resolving attachments after edits
pub fn live_node_ids(stmts: &mut [Stmt]) -> rustc_hash::FxHashSet<NodeId> {
    #[derive(Default)]
    struct Ids(rustc_hash::FxHashSet<NodeId>);
    impl VisitMut for Ids {
        fn visit_node_id(&mut self, id: &mut NodeId) {
            self.0.insert(*id);
        }
    }
    let mut ids = Ids::default();
    walk_stmts_mut(&mut ids, stmts);
    ids.0
}

/// Call `f` on every function (declarations and literals), outer first,
/// with the id of the node that owns it
pub fn for_each_function_mut(stmts: &mut [Stmt], f: &mut dyn FnMut(&mut Function, NodeId)) {
    struct Functions<'f> {
        f: &'f mut dyn FnMut(&mut Function, NodeId),
    }
    impl VisitMut for Functions<'_> {
        fn visit_stmt(&mut self, stmt: &mut Stmt) {
            let owner = stmt.id;
            if let StmtKind::FunctionDecl(func) = &mut stmt.kind {
                (self.f)(func, owner);
            }
            walk_stmt_mut(self, stmt);
        }

        fn visit_expr(&mut self, expr: &mut Expr) {
            let owner = expr.id;
            if let ExprKind::Function(func) = &mut expr.kind {
                (self.f)(func, owner);
            }
            walk_expr_mut(self, expr);
        }
    }
    walk_stmts_mut(&mut Functions { f }, stmts);
}

/// Deepest statement whose span contains `offset`
pub fn stmt_at_offset(stmts: &[Stmt], offset: u32) -> Option<NodeId> {
    struct Deepest {
        offset: u32,
        found: Option<(NodeId, u32)>,
    }
    impl Visit for Deepest {
        fn visit_stmt(&mut self, stmt: &Stmt) {
            if let Some(span) = stmt.span {
                if span.start <= self.offset && self.offset <= span.end {
                    // Later (nested) hits are never wider than earlier ones
                    if self.found.map_or(true, |(_, len)| span.len() <= len) {
                        self.found = Some((stmt.id, span.len()));
                    }
                }
            }
            walk_stmt(self, stmt);
        }
    }
    let mut deepest = Deepest { offset, found: None };
    walk_stmts(&mut deepest, stmts);
    deepest.found.map(|(id, _)| id)
}

/// A direct child of a statement that can hold statements
pub enum StmtChild<'a> {
    List(&'a mut Vec<Stmt>),
    /// `else` branches and `for` initialisers
    Single(&'a mut Stmt),
}

/// Children of `stmt` in source order, not descending into functions
pub fn children_mut(stmt: &mut Stmt) -> Vec<StmtChild<'_>> {
    match &mut stmt.kind {
        StmtKind::If { then_branch, else_branch, .. } => {
            let mut children = vec![StmtChild::List(&mut then_branch.statements)];
            if let Some(else_branch) = else_branch {
                children.push(StmtChild::Single(else_branch));
            }
            children
        }
        StmtKind::For { init, body, .. } => {
            let mut children = Vec::with_capacity(2);
            if let Some(init) = init {
                children.push(StmtChild::Single(init));
            }
            children.push(StmtChild::List(&mut body.statements));
            children
        }
        StmtKind::While { body, .. }
        | StmtKind::DoUntil { body, .. }
        | StmtKind::Repeat { body, .. }
        | StmtKind::With { body, .. }
        | StmtKind::Block(body) => vec![StmtChild::List(&mut body.statements)],
        StmtKind::Switch { cases, .. } => cases.iter_mut().map(|case| StmtChild::List(&mut case.body)).collect(),
        StmtKind::TryCatch { try_block, catch_block, finally_block, .. } => {
            let mut children = vec![StmtChild::List(&mut try_block.statements)];
            for block in [catch_block, finally_block].into_iter().flatten() {
                children.push(StmtChild::List(&mut block.statements));
            }
            children
        }
        _ => Vec::new(),
    }
}

// ========== Statement lists ==========

/// Where a statement list sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListContext {
    pub field: ParentField,
    /// Statement or function owning the list; `NodeId::ROOT` for the program body
    pub owner: NodeId,
    pub in_loop: bool,
    pub in_switch: bool,
    pub in_function: bool,
    pub depth: u32,
}

impl ListContext {
    pub fn program() -> Self {
        Self {
            field: ParentField::ProgramBody,
            owner: NodeId::ROOT,
            in_loop: false,
            in_switch: false,
            in_function: false,
            depth: 0,
        }
    }

    fn nested(&self, field: ParentField, owner: NodeId) -> Self {
        Self {
            field,
            owner,
            depth: self.depth + 1,
            ..*self
        }
    }

    fn looping(mut self) -> Self {
        self.in_loop = true;
        self
    }

    fn function_body(&self, owner: NodeId) -> Self {
        Self {
            field: ParentField::BlockBody,
            owner,
            in_loop: false,
            in_switch: false,
            in_function: true,
            depth: self.depth + 1,
        }
    }
}

/// Hand every statement list of `body` to `f`, outer lists first.
///
/// `f` may freely splice the list it is given; nested lists are visited
/// after `f` returns, over the list as it is then.
pub fn visit_stmt_lists<F>(body: &mut Vec<Stmt>, f: &mut F)
where
    F: FnMut(&mut Vec<Stmt>, &ListContext),
{
    visit_list(body, &ListContext::program(), f);
}

fn visit_list<F>(list: &mut Vec<Stmt>, cx: &ListContext, f: &mut F)
where
    F: FnMut(&mut Vec<Stmt>, &ListContext),
{
    f(list, cx);
    for stmt in list.iter_mut() {
        visit_lists_in_stmt(stmt, cx, f);
    }
}

fn visit_lists_in_stmt<F>(stmt: &mut Stmt, cx: &ListContext, f: &mut F)
where
    F: FnMut(&mut Vec<Stmt>, &ListContext),
{
    let owner = stmt.id;
    let block_cx = cx.nested(ParentField::BlockBody, owner);
    match &mut stmt.kind {
        StmtKind::VarDecl { declarations, .. } => {
            for decl in declarations {
                if let Some(init) = &mut decl.init {
                    visit_lists_in_expr(init, cx, f);
                }
            }
        }
        StmtKind::FunctionDecl(func) => visit_list(&mut func.body.statements, &cx.function_body(owner), f),
        StmtKind::If { condition, then_branch, else_branch } => {
            visit_lists_in_expr(condition, cx, f);
            visit_list(&mut then_branch.statements, &block_cx, f);
            if let Some(else_branch) = else_branch {
                visit_lists_in_stmt(else_branch, cx, f);
            }
        }
        StmtKind::For { init, body, .. } => {
            if let Some(init) = init {
                visit_lists_in_stmt(init, cx, f);
            }
            visit_list(&mut body.statements, &block_cx.looping(), f);
        }
        StmtKind::While { body, .. }
        | StmtKind::DoUntil { body, .. }
        | StmtKind::Repeat { body, .. }
        | StmtKind::With { body, .. } => visit_list(&mut body.statements, &block_cx.looping(), f),
        StmtKind::Switch { cases, .. } => {
            for case in cases {
                let mut case_cx = cx.nested(ParentField::CaseBody, case.id);
                case_cx.in_switch = true;
                visit_list(&mut case.body, &case_cx, f);
            }
        }
        StmtKind::TryCatch { try_block, catch_block, finally_block, .. } => {
            visit_list(&mut try_block.statements, &block_cx, f);
            for block in [catch_block, finally_block].into_iter().flatten() {
                visit_list(&mut block.statements, &block_cx, f);
            }
        }
        StmtKind::Block(block) => visit_list(&mut block.statements, &block_cx, f),
        StmtKind::Expr(expr) | StmtKind::Return { value: Some(expr) } => visit_lists_in_expr(expr, cx, f),
        _ => {}
    }
}

/// Function literals carry statement lists of their own
fn visit_lists_in_expr<F>(expr: &mut Expr, cx: &ListContext, f: &mut F)
where
    F: FnMut(&mut Vec<Stmt>, &ListContext),
{
    struct Functions<'f, 'c, F> {
        cx: &'c ListContext,
        f: &'f mut F,
    }
    impl<F> VisitMut for Functions<'_, '_, F>
    where
        F: FnMut(&mut Vec<Stmt>, &ListContext),
    {
        fn visit_expr(&mut self, expr: &mut Expr) {
            let owner = expr.id;
            if let ExprKind::Function(func) = &mut expr.kind {
                let body_cx = self.cx.function_body(owner);
                visit_list(&mut func.body.statements, &body_cx, self.f);
                return;
            }
            walk_expr_mut(self, expr);
        }
    }
    Functions { cx, f }.visit_expr(expr);
}

/// Index into a statement list that stays valid while the list is spliced.
///
/// Splice through the cursor: inserting at or before the current index shifts
/// it forward, removing the current statement makes the next `advance` a no-op
/// so the statement that slid into its place is visited next.
#[derive(Debug, Default)]
pub struct StatementCursor {
    index: usize,
    hold: bool,
}

impl StatementCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_done(&self, list: &[Stmt]) -> bool {
        self.index >= list.len()
    }

    pub fn insert(&mut self, list: &mut Vec<Stmt>, at: usize, stmt: Stmt) {
        list.insert(at.min(list.len()), stmt);
        if at <= self.index {
            self.index += 1;
        }
    }

    pub fn remove(&mut self, list: &mut Vec<Stmt>, at: usize) -> Stmt {
        let removed = list.remove(at);
        if at < self.index {
            self.index -= 1;
        } else if at == self.index {
            self.hold = true;
        }
        removed
    }

    pub fn advance(&mut self) {
        if self.hold {
            self.hold = false;
        } else {
            self.index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::parse;

    #[test]
    fn test_visit_stmt_lists_tracks_context() {
        let mut program = parse(
            "a();\nwhile (x) { b(); }\nswitch (y) { case 1: c(); }\nfunction f() { d(); }",
        );
        let mut seen = Vec::new();
        visit_stmt_lists(&mut program.body, &mut |list, cx| {
            seen.push((list.len(), cx.field, cx.in_loop, cx.in_switch, cx.in_function));
        });
        assert_eq!(
            seen,
            vec![
                (4, ParentField::ProgramBody, false, false, false),
                (1, ParentField::BlockBody, true, false, false),
                (1, ParentField::CaseBody, false, true, false),
                (1, ParentField::BlockBody, false, false, true),
            ]
        );
    }

    #[test]
    fn test_function_literal_resets_loop_context() {
        let mut program = parse("repeat (3) { var f = function() { g(); }; }");
        let mut contexts = Vec::new();
        visit_stmt_lists(&mut program.body, &mut |_, cx| contexts.push((cx.in_loop, cx.in_function)));
        assert_eq!(contexts, vec![(false, false), (true, false), (false, true)]);
    }

    #[test]
    fn test_cursor_insert_before_and_remove_current() {
        let mut list = parse("a(); b(); c();").body;
        let extra = parse("x();").body.remove(0);
        let mut cursor = StatementCursor::new();
        cursor.advance();
        // Insert before the current statement: still pointing at b()
        cursor.insert(&mut list, 0, extra);
        assert_eq!(cursor.index(), 2);
        cursor.remove(&mut list, 2);
        cursor.advance();
        // c() slid into the removed slot and is visited next
        assert_eq!(cursor.index(), 2);
        assert_eq!(list.len(), 3);
        cursor.advance();
        assert!(cursor.is_done(&list));
    }

    #[test]
    fn test_for_each_function_mut_sees_literals() {
        let mut program = parse("function a() { var f = function(x) {}; }");
        let mut arities = Vec::new();
        for_each_function_mut(&mut program.body, &mut |func, _| arities.push(func.params.len()));
        assert_eq!(arities, vec![0, 1]);
    }

    #[test]
    fn test_stmt_at_offset_prefers_innermost() {
        let program = parse("if (a) {\n    b();\n}");
        let StmtKind::If { then_branch, .. } = &program.body[0].kind else {
            panic!("expected if");
        };
        assert_eq!(stmt_at_offset(&program.body, 14), Some(then_branch.statements[0].id));
        assert_eq!(stmt_at_offset(&program.body, 1), Some(program.body[0].id));
    }

    #[test]
    fn test_children_mut_in_source_order() {
        let mut program = parse("if (a) { b(); } else { c(); d(); }");
        let children = children_mut(&mut program.body[0]);
        assert_eq!(children.len(), 2);
        assert!(matches!(&children[0], StmtChild::List(list) if list.len() == 1));
        assert!(matches!(&children[1], StmtChild::Single(_)));
    }

    #[test]
    fn test_references_identifier() {
        let program = parse("var a = 1; b = a + c;");
        assert!(references_identifier(&program.body, "c"));
        assert!(!references_identifier(&program.body, "d"));
    }
}
