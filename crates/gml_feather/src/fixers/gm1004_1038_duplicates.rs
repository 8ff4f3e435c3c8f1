//! GM1004/GM1038: names declared twice where only one can win
//!
//! The first declaration stays; later ones are removed.

use gml_diagnostics::FeatherDiagnostic;
use gml_parser::{Program, StmtKind};
use rustc_hash::FxHashSet;

use crate::context::FixContext;
use crate::error::FixError;
use crate::fixer::{range_of, AppliedFix, Fixer};
use crate::walk::{visit_stmt_lists, StatementCursor};

/// GM1004
pub struct DuplicateEnumMembers {
    diagnostic: FeatherDiagnostic,
}

impl DuplicateEnumMembers {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

impl Fixer for DuplicateEnumMembers {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let mut fixes = Vec::new();
        visit_stmt_lists(&mut program.body, &mut |list, _cx| {
            for stmt in list.iter_mut() {
                let owner = stmt.id;
                let StmtKind::Enum { members, .. } = &mut stmt.kind else {
                    continue;
                };
                let mut seen = FxHashSet::default();
                members.retain(|member| {
                    if seen.insert(member.name.name.clone()) {
                        return true;
                    }
                    fixes.push(AppliedFix::new(
                        self.detail().with_target(member.name.name.as_str()).with_range(range_of(member.span)),
                        owner,
                    ));
                    false
                });
            }
        });
        Ok(fixes)
    }
}

/// GM1038
pub struct DuplicateMacros {
    diagnostic: FeatherDiagnostic,
}

impl DuplicateMacros {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

impl Fixer for DuplicateMacros {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        // Macros are global to the file whatever block they sit in
        let mut seen = FxHashSet::default();
        let mut fixes = Vec::new();
        visit_stmt_lists(&mut program.body, &mut |list, cx| {
            let mut cursor = StatementCursor::new();
            while !cursor.is_done(list) {
                let at = cursor.index();
                if let StmtKind::Macro { name, .. } = &list[at].kind {
                    if !seen.insert(name.name.clone()) {
                        let target = name.name.clone();
                        let removed = cursor.remove(list, at);
                        fixes.push(AppliedFix::new(
                            self.detail().with_target(target).with_range(range_of(removed.span)),
                            cx.owner,
                        ));
                    }
                }
                cursor.advance();
            }
        });
        Ok(fixes)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{assert_fix, assert_no_fix};

    #[test]
    fn test_duplicate_enum_member_removed() {
        let fixes = assert_fix("GM1004", "enum Dir { Up, Down, Up = 4 }", "enum Dir { Up, Down }");
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].target.as_deref(), Some("Up"));
    }

    #[test]
    fn test_separate_enums_may_share_names() {
        assert_no_fix("GM1004", "enum A { One, Two } enum B { One, Two }");
    }

    #[test]
    fn test_duplicate_macro_removed() {
        let fixes = assert_fix(
            "GM1038",
            "#macro SPEED 4\n#macro GRAVITY 1\n#macro SPEED 8\n",
            "#macro SPEED 4\n#macro GRAVITY 1\n",
        );
        assert_eq!(fixes[0].target.as_deref(), Some("SPEED"));
    }

    #[test]
    fn test_distinct_macros_kept() {
        assert_no_fix("GM1038", "#macro A 1\n#macro B 2\n");
    }
}
