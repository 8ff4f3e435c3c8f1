//! GM1008/GM1030: locals and parameters named after built-ins
//!
//! The local is renamed with the configured prefix throughout its function.
//! References to the built-in itself (no local of that name in scope) stay.

use gml_diagnostics::FeatherDiagnostic;
use gml_lexer::Span;
use gml_parser::{Program, Stmt, StmtKind};

use crate::context::FixContext;
use crate::error::FixError;
use crate::fixer::{range_of, AppliedFix, Fixer};
use crate::keywords::NameRegistry;
use crate::matchers::scope::{local_names, rename_in_scope};
use crate::walk::{for_each_function_mut, walk_stmt, walk_stmts, Visit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameClass {
    /// Read-only built-in variables (`fps`, `room_speed`)
    ReadOnly,
    /// Built-in instance variables and commonly shadowed functions
    Reserved,
}

impl NameClass {
    fn contains(self, names: &NameRegistry, name: &str) -> bool {
        match self {
            NameClass::ReadOnly => names.is_readonly(name),
            NameClass::Reserved => names.is_reserved(name),
        }
    }
}

pub struct ReservedNames {
    diagnostic: FeatherDiagnostic,
    class: NameClass,
}

impl ReservedNames {
    pub fn readonly(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone(), class: NameClass::ReadOnly }))
    }

    pub fn reserved(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone(), class: NameClass::Reserved }))
    }

    fn colliding(&self, names: impl IntoIterator<Item = String>, ctx: &FixContext) -> Vec<String> {
        let mut colliding: Vec<String> =
            names.into_iter().filter(|name| self.class.contains(ctx.names, name)).collect();
        colliding.sort_unstable();
        colliding.dedup();
        colliding
    }

    fn record(&self, old: &str, new: &str, at: Option<(gml_parser::NodeId, Option<Span>)>) -> AppliedFix {
        let detail = self.detail().with_target(old).with_replacement(new);
        match at {
            Some((node, span)) => AppliedFix::new(detail.with_range(range_of(span)), node),
            None => AppliedFix::at_root(detail),
        }
    }
}

/// First `var` statement declaring `name`, not looking into functions
fn declaration_of(stmts: &[Stmt], name: &str) -> Option<(gml_parser::NodeId, Option<Span>)> {
    struct Find<'n> {
        name: &'n str,
        found: Option<(gml_parser::NodeId, Option<Span>)>,
    }
    impl Visit for Find<'_> {
        fn visit_stmt(&mut self, stmt: &Stmt) {
            if self.found.is_some() {
                return;
            }
            if let StmtKind::VarDecl { declarations, .. } = &stmt.kind {
                if declarations.iter().any(|d| d.name.name == self.name) {
                    self.found = Some((stmt.id, stmt.span));
                    return;
                }
            }
            walk_stmt(self, stmt);
        }

        fn visit_function(&mut self, _func: &gml_parser::Function) {}
    }
    let mut find = Find { name, found: None };
    walk_stmts(&mut find, stmts);
    find.found
}

impl Fixer for ReservedNames {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let prefix = ctx.options.reserved_identifier_prefix.as_str();
        let mut fixes = Vec::new();

        for old in self.colliding(local_names(&program.body), ctx) {
            let new = format!("{}{}", prefix, old);
            let at = declaration_of(&program.body, &old);
            rename_in_scope(&mut program.body, &old, &new);
            fixes.push(self.record(&old, &new, at));
        }

        for_each_function_mut(&mut program.body, &mut |func, owner| {
            let params = func.params.iter().map(|p| p.name.name.clone());
            let candidates = local_names(&func.body.statements).into_iter().chain(params);
            for old in self.colliding(candidates, ctx) {
                let new = format!("{}{}", prefix, old);
                let param = func.params.iter_mut().find(|p| p.name.name == old);
                let at = match param {
                    Some(param) => {
                        param.name.name = new.clone();
                        Some((owner, param.span))
                    }
                    None => declaration_of(&func.body.statements, &old),
                };
                rename_in_scope(&mut func.body.statements, &old, &new);
                fixes.push(self.record(&old, &new, at));
            }
        });
        Ok(fixes)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{assert_fix, assert_no_fix};

    #[test]
    fn test_readonly_local_renamed() {
        let fixes = assert_fix(
            "GM1008",
            "var fps = 60; show_debug_message(fps);",
            "var __featherFix_fps = 60; show_debug_message(__featherFix_fps);",
        );
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].target.as_deref(), Some("fps"));
        assert_eq!(fixes[0].replacement.as_deref(), Some("__featherFix_fps"));
        assert!(fixes[0].range.is_some());
    }

    #[test]
    fn test_reserved_parameter_renamed_in_its_function() {
        assert_fix(
            "GM1030",
            "function add(score) { return score + 1; } total = score;",
            "function add(__featherFix_score) { return __featherFix_score + 1; } total = score;",
        );
    }

    #[test]
    fn test_builtin_reads_untouched() {
        assert_no_fix("GM1008", "show_debug_message(fps);");
        assert_no_fix("GM1030", "score += 10;");
    }

    #[test]
    fn test_prefix_comes_from_options() {
        let options = crate::FixOptions { reserved_identifier_prefix: "my_".to_string(), ..Default::default() };
        let (program, _) = crate::test_utils::run_fixer_with("GM1030", "var score = 0;", &options);
        assert_eq!(program, crate::test_utils::parse("var my_score = 0;"));
    }
}
