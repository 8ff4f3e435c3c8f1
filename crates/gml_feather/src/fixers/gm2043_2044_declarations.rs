//! GM2043/GM2044: `var` declarations in the wrong place
//!
//! Both fixers turn some declarators of a `var` statement back into plain
//! assignments. GM2043 then declares the name once before the block that used
//! to declare it; GM2044 keeps the first declaration and demotes the rest.

use gml_diagnostics::FeatherDiagnostic;
use gml_lexer::Span;
use gml_parser::{
    AppliedDiagnostics, AssignOp, BinaryOp, Block, Comments, DeclKeyword, Declarator, Expr, ExprKind, Function, NodeId,
    NodeIdGen, Program, Stmt, StmtKind, UnaryOp,
};
use rustc_hash::FxHashSet;

use crate::context::FixContext;
use crate::error::FixError;
use crate::fixer::{range_of, AppliedFix, Fixer};
use crate::matchers::calls::{call_args, is_call_to, same_expr};
use crate::synth::{carry_provenance, Synth};
use crate::walk::{
    children_mut, for_each_function_mut, references_identifier, walk_stmt, walk_stmts, StatementCursor, StmtChild,
    Visit,
};

/// A declarator that stopped declaring
struct Demoted {
    name: String,
    span: Option<Span>,
}

/// Split a `var` statement at every declarator picked by `pick`: those become
/// assignments (or vanish without an initialiser), each run of the others
/// stays a `var`, all in source order. `None` when nothing was picked.
/// Replacement statements carry fresh ids.
fn demote(stmt: &mut Stmt, pick: &mut dyn FnMut(&Declarator) -> bool, ids: &mut NodeIdGen) -> Option<(Vec<Stmt>, Vec<Demoted>)> {
    let StmtKind::VarDecl { keyword: DeclKeyword::Var, declarations } = &mut stmt.kind else {
        return None;
    };
    // `pick` is stateful for duplicates, so ask once per declarator
    let picked: Vec<bool> = declarations.iter().map(|decl| pick(decl)).collect();
    if !picked.contains(&true) {
        return None;
    }
    let mut run = Vec::new();
    let mut replacement = Vec::new();
    let mut demoted = Vec::new();
    for (decl, picked) in std::mem::take(declarations).into_iter().zip(picked) {
        if !picked {
            run.push(decl);
            continue;
        }
        flush_run(&mut run, &mut replacement, stmt.span, ids);
        demoted.push(Demoted { name: decl.name.name.clone(), span: decl.span });
        if let Some(init) = decl.init {
            let mut synth = Synth::new(&mut *ids, decl.span);
            let target = synth.ident(&decl.name.name);
            replacement.push(synth.assign_stmt(target, AssignOp::Assign, init));
        }
    }
    flush_run(&mut run, &mut replacement, stmt.span, ids);
    Some((replacement, demoted))
}

/// Close a run of kept declarators into its own `var` statement
fn flush_run(run: &mut Vec<Declarator>, replacement: &mut Vec<Stmt>, fallback: Option<Span>, ids: &mut NodeIdGen) {
    if run.is_empty() {
        return;
    }
    let declarations = std::mem::take(run);
    let span = match (declarations.first().and_then(|d| d.span), declarations.last().and_then(|d| d.span)) {
        (Some(first), Some(last)) => Some(first.cover(last)),
        _ => fallback,
    };
    replacement.push(Stmt::new(ids.fresh(), span, StmtKind::VarDecl { keyword: DeclKeyword::Var, declarations }));
}

/// One statement standing in for `replacement` where only one fits
fn collapse(mut replacement: Vec<Stmt>, id: NodeId, span: Option<Span>) -> Stmt {
    match replacement.len() {
        0 => Stmt::new(id, span, StmtKind::Empty),
        1 => {
            let mut only = replacement.swap_remove(0);
            only.id = id;
            only
        }
        _ => Stmt::new(id, span, StmtKind::Block(Block::new(replacement, span))),
    }
}

/// Replace `list[at]` by `replacement`; the first replacement keeps the old id.
/// Returns the node the change should be recorded on.
fn splice(list: &mut Vec<Stmt>, at: usize, mut replacement: Vec<Stmt>, cursor: &mut StatementCursor, owner: NodeId) -> NodeId {
    let removed = cursor.remove(list, at);
    let Some(first) = replacement.first_mut() else {
        return owner;
    };
    first.id = removed.id;
    for (offset, stmt) in replacement.into_iter().enumerate() {
        cursor.insert(list, at + offset, stmt);
    }
    removed.id
}

/// Names a compound statement declares with `var`, in source order, not
/// looking into nested functions
fn declared_in(stmt: &Stmt) -> Vec<String> {
    struct Names(Vec<String>);
    impl Visit for Names {
        fn visit_stmt(&mut self, stmt: &Stmt) {
            if let StmtKind::VarDecl { keyword: DeclKeyword::Var, declarations } = &stmt.kind {
                for decl in declarations {
                    if !self.0.contains(&decl.name.name) {
                        self.0.push(decl.name.name.clone());
                    }
                }
            }
            walk_stmt(self, stmt);
        }

        fn visit_function(&mut self, _func: &Function) {}
    }
    let mut names = Names(Vec::new());
    walk_stmts(&mut names, std::slice::from_ref(stmt));
    names.0
}

// ========== GM2043 ==========

pub struct BlockScopedLocals {
    diagnostic: FeatherDiagnostic,
}

impl BlockScopedLocals {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

struct Hoist<'a> {
    fixer: &'a BlockScopedLocals,
    ids: &'a mut NodeIdGen,
    fixes: Vec<AppliedFix>,
}

impl Hoist<'_> {
    fn list(&mut self, list: &mut Vec<Stmt>, outer: &FxHashSet<String>) {
        let mut declared = outer.clone();
        let mut cursor = StatementCursor::new();
        while !cursor.is_done(list) {
            let at = cursor.index();
            if let StmtKind::VarDecl { declarations, .. } = &list[at].kind {
                declared.extend(declarations.iter().map(|d| d.name.name.clone()));
            } else if !matches!(list[at].kind, StmtKind::FunctionDecl(_) | StmtKind::Expr(_)) {
                self.hoist_escaping(list, &mut cursor, &mut declared);
            }

            let at = cursor.index();
            for child in children_mut(&mut list[at]) {
                match child {
                    StmtChild::List(inner) => self.list(inner, &declared),
                    StmtChild::Single(single) => {
                        let (id, span) = (single.id, single.span);
                        let mut wrapped = vec![std::mem::replace(single, Stmt::new(id, span, StmtKind::Empty))];
                        self.list(&mut wrapped, &declared);
                        *single = collapse(wrapped, id, span);
                    }
                }
            }
            cursor.advance();
        }
    }

    /// Declare before the compound statement under the cursor every local it
    /// declares that is read after it
    fn hoist_escaping(&mut self, list: &mut Vec<Stmt>, cursor: &mut StatementCursor, declared: &mut FxHashSet<String>) {
        let at = cursor.index();
        let escaping: Vec<String> = declared_in(&list[at])
            .into_iter()
            .filter(|name| !declared.contains(name) && references_identifier(&list[at + 1..], name))
            .collect();
        for name in escaping {
            let mut demoted = Vec::new();
            self.undeclare_single(&mut list[cursor.index()], &name, &mut demoted);
            let span = demoted.first().and_then(|d| d.span);
            let declaration = Synth::new(&mut *self.ids, span).var_decl(&name, None);
            let node = declaration.id;
            let index = cursor.index();
            cursor.insert(list, index, declaration);
            self.fixes.push(AppliedFix::new(
                self.fixer.detail().with_target(name.as_str()).with_range(range_of(span)),
                node,
            ));
            declared.insert(name);
        }
    }

    fn undeclare_single(&mut self, stmt: &mut Stmt, name: &str, demoted: &mut Vec<Demoted>) {
        match demote(stmt, &mut |d: &Declarator| d.name.name == name, self.ids) {
            Some((replacement, mut gone)) => {
                *stmt = collapse(replacement, stmt.id, stmt.span);
                demoted.append(&mut gone);
            }
            None => self.undeclare_children(stmt, name, demoted),
        }
    }

    fn undeclare_children(&mut self, stmt: &mut Stmt, name: &str, demoted: &mut Vec<Demoted>) {
        for child in children_mut(stmt) {
            match child {
                StmtChild::List(list) => self.undeclare_list(list, name, demoted),
                StmtChild::Single(single) => self.undeclare_single(single, name, demoted),
            }
        }
    }

    fn undeclare_list(&mut self, list: &mut Vec<Stmt>, name: &str, demoted: &mut Vec<Demoted>) {
        let mut at = 0;
        while at < list.len() {
            match demote(&mut list[at], &mut |d: &Declarator| d.name.name == name, self.ids) {
                Some((mut replacement, mut gone)) => {
                    demoted.append(&mut gone);
                    if let Some(first) = replacement.first_mut() {
                        first.id = list[at].id;
                    }
                    let len = replacement.len();
                    list.splice(at..=at, replacement);
                    at += len;
                }
                None => {
                    self.undeclare_children(&mut list[at], name, demoted);
                    at += 1;
                }
            }
        }
    }
}

impl Fixer for BlockScopedLocals {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let Program { body, ids, .. } = program;
        let mut hoist = Hoist { fixer: self, ids, fixes: Vec::new() };
        hoist.list(body, &FxHashSet::default());
        for_each_function_mut(body, &mut |func, _owner| {
            let params = func.params.iter().map(|p| p.name.name.clone()).collect();
            hoist.list(&mut func.body.statements, &params);
        });
        Ok(hoist.fixes)
    }
}

// ========== GM2044 ==========

pub struct DuplicateLocals {
    diagnostic: FeatherDiagnostic,
}

impl DuplicateLocals {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

/// The `V` of `V != undefined`, `undefined != V` or `!is_undefined(V)`
fn defined_test(condition: &Expr) -> Option<&Expr> {
    match &condition.unparenthesized().kind {
        ExprKind::Binary { left, op: BinaryOp::NotEqual, right } if right.is_undefined() => Some(left),
        ExprKind::Binary { left, op: BinaryOp::NotEqual, right } if left.is_undefined() => Some(right),
        ExprKind::Unary { op: UnaryOp::Not, operand } if is_call_to(operand.unparenthesized(), "is_undefined") => {
            match call_args(operand.unparenthesized())? {
                [subject] => Some(subject),
                _ => None,
            }
        }
        _ => None,
    }
}

/// `argument_count > K`
fn is_argument_count_test(condition: &Expr) -> bool {
    matches!(
        &condition.unparenthesized().kind,
        ExprKind::Binary { left, op: BinaryOp::Greater, .. } if left.as_identifier() == Some("argument_count")
    )
}

struct Dedupe<'a> {
    fixer: &'a DuplicateLocals,
    ids: &'a mut NodeIdGen,
    comments: &'a mut Comments,
    applied: &'a mut AppliedDiagnostics,
    declared: FxHashSet<String>,
    owner: NodeId,
    fixes: Vec<AppliedFix>,
}

impl Dedupe<'_> {
    fn list(&mut self, list: &mut Vec<Stmt>) {
        let mut cursor = StatementCursor::new();
        while !cursor.is_done(list) {
            let at = cursor.index();
            self.merge_fallback(list, at);

            let declared = &mut self.declared;
            let mut is_duplicate = |d: &Declarator| !declared.insert(d.name.name.clone());
            match demote(&mut list[at], &mut is_duplicate, self.ids) {
                Some((replacement, demoted)) => {
                    let node = splice(list, at, replacement, &mut cursor, self.owner);
                    self.record(demoted, node);
                }
                None => self.children(&mut list[at]),
            }
            cursor.advance();
        }
    }

    fn children(&mut self, stmt: &mut Stmt) {
        for child in children_mut(stmt) {
            match child {
                StmtChild::List(list) => self.list(list),
                StmtChild::Single(single) => {
                    let declared = &mut self.declared;
                    let mut is_duplicate = |d: &Declarator| !declared.insert(d.name.name.clone());
                    match demote(single, &mut is_duplicate, self.ids) {
                        Some((replacement, demoted)) => {
                            *single = collapse(replacement, single.id, single.span);
                            self.record(demoted, single.id);
                        }
                        None => self.children(single),
                    }
                }
            }
        }
    }

    fn record(&mut self, demoted: Vec<Demoted>, node: NodeId) {
        for Demoted { name, span } in demoted {
            self.fixes.push(AppliedFix::new(self.fixer.detail().with_target(name).with_range(range_of(span)), node));
        }
    }

    /// `var x = D;` followed by an `if` that only redeclares `x` from an
    /// optional argument or a maybe-undefined value: fold both into one
    /// declaration
    fn merge_fallback(&mut self, list: &mut Vec<Stmt>, at: usize) {
        let Some((name, merged)) = self.fallback_merge(list, at) else {
            return;
        };
        let removed = list.remove(at + 1);
        let id = list[at].id;
        if let StmtKind::VarDecl { declarations, .. } = &mut list[at].kind {
            declarations[0].init = Some(merged);
        }
        carry_provenance(self.comments, self.applied, removed.id, id);
        self.fixes.push(AppliedFix::new(
            self.fixer.detail().with_target(name).with_range(range_of(removed.span)),
            id,
        ));
    }

    fn fallback_merge(&mut self, list: &[Stmt], at: usize) -> Option<(String, Expr)> {
        let StmtKind::VarDecl { keyword: DeclKeyword::Var, declarations } = &list[at].kind else {
            return None;
        };
        let [Declarator { name, init: Some(default), .. }] = declarations.as_slice() else {
            return None;
        };
        let StmtKind::If { condition, then_branch, else_branch: None } = &list.get(at + 1)?.kind else {
            return None;
        };
        let [inner] = then_branch.statements.as_slice() else {
            return None;
        };
        let StmtKind::VarDecl { keyword: DeclKeyword::Var, declarations: inner } = &inner.kind else {
            return None;
        };
        let [Declarator { name: inner_name, init: Some(value), .. }] = inner.as_slice() else {
            return None;
        };
        if inner_name.name != name.name {
            return None;
        }

        let mut synth = Synth::new(&mut *self.ids, default.span);
        let merged = if is_argument_count_test(condition) {
            let condition = synth.instantiate(condition.unparenthesized());
            synth.expr(ExprKind::Ternary {
                condition: Box::new(condition),
                then_expr: Box::new(value.clone()),
                else_expr: Box::new(default.clone()),
            })
        } else {
            let subject = defined_test(condition)?;
            if !same_expr(subject, value) {
                return None;
            }
            synth.null_coalesce(value.clone(), default.clone())
        };
        Some((name.name.clone(), merged))
    }
}

impl Fixer for DuplicateLocals {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let Program { body, ids, comments, applied, .. } = program;
        let mut dedupe = Dedupe {
            fixer: self,
            ids,
            comments,
            applied,
            declared: FxHashSet::default(),
            owner: NodeId::ROOT,
            fixes: Vec::new(),
        };
        dedupe.list(body);
        for_each_function_mut(body, &mut |func, owner| {
            dedupe.declared = func.params.iter().map(|p| p.name.name.clone()).collect();
            dedupe.owner = owner;
            dedupe.list(&mut func.body.statements);
        });
        Ok(dedupe.fixes)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{assert_fix, assert_no_fix};

    #[test]
    fn test_escaping_local_hoisted() {
        let fixes = assert_fix(
            "GM2043",
            "if (ready) { var msg = \"go\"; }\nshow_debug_message(msg);",
            "var msg;\nif (ready) { msg = \"go\"; }\nshow_debug_message(msg);",
        );
        assert_eq!(fixes[0].target.as_deref(), Some("msg"));
    }

    #[test]
    fn test_loop_index_hoisted() {
        assert_fix(
            "GM2043",
            "function f() { for (var i = 0; i < 3; i++) {} return i; }",
            "function f() { var i; for (i = 0; i < 3; i++) {} return i; }",
        );
    }

    #[test]
    fn test_block_local_kept() {
        assert_no_fix("GM2043", "if (ready) { var msg = \"go\"; show_debug_message(msg); }");
        assert_no_fix("GM2043", "var msg = \"\";\nif (ready) { var msg = \"go\"; }\nshow_debug_message(msg);");
    }

    #[test]
    fn test_duplicate_becomes_assignment() {
        let fixes = assert_fix(
            "GM2044",
            "var speed_cap = 4;\nvar speed_cap = 8;",
            "var speed_cap = 4;\nspeed_cap = 8;",
        );
        assert_eq!(fixes[0].target.as_deref(), Some("speed_cap"));
        assert_fix("GM2044", "var a = 1, a = 2, b;", "var a = 1;\na = 2;\nvar b;");
        assert_fix("GM2044", "function f(n) { var n; return n; }", "function f(n) { return n; }");
    }

    #[test]
    fn test_demoted_declarator_keeps_its_place() {
        let fixes = assert_fix("GM2044", "var a = 1, a = a + 1, b = a;", "var a = 1;\na = a + 1;\nvar b = a;");
        assert_eq!(fixes.len(), 1);
        assert_fix("GM2044", "var a, b = 2, a = b;", "var a, b = 2;\na = b;");
    }

    #[test]
    fn test_duplicate_in_nested_block() {
        assert_fix("GM2044", "var t = 0;\nif (c) { var t = 1; }", "var t = 0;\nif (c) { t = 1; }");
    }

    #[test]
    fn test_optional_argument_merged() {
        assert_fix(
            "GM2044",
            "function f() { var size = 4; if (argument_count > 0) { var size = argument[0]; } return size; }",
            "function f() { var size = argument_count > 0 ? argument[0] : 4; return size; }",
        );
    }

    #[test]
    fn test_defined_value_merged() {
        assert_fix(
            "GM2044",
            "var name = \"none\";\nif (input != undefined) { var name = input; }",
            "var name = input ?? \"none\";",
        );
    }

    #[test]
    fn test_separate_functions_do_not_clash() {
        assert_no_fix("GM2044", "function a() { var x = 1; }\nfunction b() { var x = 2; }");
    }
}
