//! GM1000/GM1001: `break` or `continue` with nothing to leave
//!
//! `break` needs an enclosing loop, `with` or `switch`; `continue` needs a
//! loop or `with`. Function bodies start a fresh context.

use gml_diagnostics::FeatherDiagnostic;
use gml_parser::{Program, Stmt, StmtKind};

use crate::context::FixContext;
use crate::error::FixError;
use crate::fixer::{range_of, AppliedFix, Fixer};
use crate::walk::{visit_stmt_lists, ListContext, StatementCursor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Jump {
    Break,
    Continue,
}

impl Jump {
    fn matches(self, stmt: &Stmt) -> bool {
        match self {
            Jump::Break => matches!(stmt.kind, StmtKind::Break),
            Jump::Continue => matches!(stmt.kind, StmtKind::Continue),
        }
    }

    fn allowed(self, cx: &ListContext) -> bool {
        match self {
            Jump::Break => cx.in_loop || cx.in_switch,
            Jump::Continue => cx.in_loop,
        }
    }
}

pub struct StrayJump {
    diagnostic: FeatherDiagnostic,
    jump: Jump,
}

impl StrayJump {
    pub fn breaks(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone(), jump: Jump::Break }))
    }

    pub fn continues(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone(), jump: Jump::Continue }))
    }
}

impl Fixer for StrayJump {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let mut fixes = Vec::new();
        visit_stmt_lists(&mut program.body, &mut |list, cx| {
            if self.jump.allowed(cx) {
                return;
            }
            let mut cursor = StatementCursor::new();
            while !cursor.is_done(list) {
                let at = cursor.index();
                if self.jump.matches(&list[at]) {
                    let removed = cursor.remove(list, at);
                    fixes.push(AppliedFix::new(self.detail().with_range(range_of(removed.span)), cx.owner));
                }
                cursor.advance();
            }
        });
        Ok(fixes)
    }
}
