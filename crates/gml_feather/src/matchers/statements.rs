//! Statement-level predicates

use gml_parser::{Stmt, StmtKind};

/// The field of a parent node that holds a statement list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentField {
    /// `Program.body`
    ProgramBody,
    /// `Block.statements` of any braced or single-statement body
    BlockBody,
    /// `SwitchCase.body`
    CaseBody,
}

/// Statements that leave the current list: code placed after them never runs
pub fn is_exit_like(stmt: &Stmt) -> bool {
    matches!(
        stmt.kind,
        StmtKind::Return { .. } | StmtKind::Exit | StmtKind::Throw { .. } | StmtKind::Break | StmtKind::Continue
    )
}

/// Stray `;` and blanked-out lines
pub fn is_structurally_empty(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Empty => true,
        StmtKind::Block(block) => block.statements.iter().all(is_structurally_empty),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::parse;

    #[test]
    fn test_exit_like_and_empty() {
        let program = parse("return 1; exit; throw e; foo(); ; {}");
        let flags: Vec<_> = program.body.iter().map(is_exit_like).collect();
        assert_eq!(flags, vec![true, true, true, false, false, false]);
        assert!(is_structurally_empty(&program.body[4]));
        assert!(is_structurally_empty(&program.body[5]));
        assert!(!is_structurally_empty(&program.body[3]));
    }
}
