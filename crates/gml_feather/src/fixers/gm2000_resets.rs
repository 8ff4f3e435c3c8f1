//! GM2000 and friends: render and file state left changed at the end of a
//! statement list
//!
//! Every rule is one row of `RESET_RULES`: the call that changes the state,
//! the arguments that mean "already the default", and the call that resets
//! it. The reset goes after the last statement of the list, or before the
//! first statement that leaves it.

use gml_diagnostics::FeatherDiagnostic;
use gml_parser::{Expr, Parser, Program, Stmt};
use tracing::debug;

use crate::context::FixContext;
use crate::error::FixError;
use crate::fixer::{range_of, AppliedFix, Fixer};
use crate::matchers::calls::{call_name, is_constant, stmt_top_call};
use crate::matchers::insertion::{find_reset_insertion, Insertion};
use crate::synth::Synth;
use crate::walk::{visit_stmt_lists, StatementCursor};

pub struct ResetRule {
    pub id: &'static str,
    pub setter: &'static str,
    /// Leading arguments that leave the state at its default. Empty: every
    /// call changes the state.
    pub defaults: &'static [&'static str],
    pub reset: &'static str,
}

pub const RESET_RULES: &[ResetRule] = &[
    ResetRule { id: "GM2000", setter: "gpu_set_blendmode", defaults: &["bm_normal"], reset: "gpu_set_blendmode(bm_normal)" },
    ResetRule { id: "GM2003", setter: "shader_set", defaults: &[], reset: "shader_reset()" },
    ResetRule { id: "GM2005", setter: "surface_set_target", defaults: &[], reset: "surface_reset_target()" },
    ResetRule { id: "GM2020", setter: "gpu_set_fog", defaults: &["false"], reset: "gpu_set_fog(false, c_white, 0, 1)" },
    ResetRule { id: "GM2026", setter: "gpu_set_ztestenable", defaults: &["false"], reset: "gpu_set_ztestenable(false)" },
    ResetRule { id: "GM2027", setter: "gpu_set_zwriteenable", defaults: &["true"], reset: "gpu_set_zwriteenable(true)" },
    ResetRule { id: "GM2029", setter: "draw_set_alpha", defaults: &["1"], reset: "draw_set_alpha(1)" },
    ResetRule { id: "GM2031", setter: "file_find_first", defaults: &[], reset: "file_find_close()" },
    ResetRule { id: "GM2048", setter: "gpu_set_blendenable", defaults: &["true"], reset: "gpu_set_blendenable(true)" },
    ResetRule { id: "GM2050", setter: "gpu_set_cullmode", defaults: &["cull_noculling"], reset: "gpu_set_cullmode(cull_noculling)" },
    ResetRule {
        id: "GM2051",
        setter: "gpu_set_colourwriteenable",
        defaults: &["true", "true", "true", "true"],
        reset: "gpu_set_colourwriteenable(true, true, true, true)",
    },
    ResetRule { id: "GM2052", setter: "gpu_set_alphatestenable", defaults: &["false"], reset: "gpu_set_alphatestenable(false)" },
    ResetRule { id: "GM2053", setter: "gpu_set_alphatestref", defaults: &["0"], reset: "gpu_set_alphatestref(0)" },
    ResetRule { id: "GM2054", setter: "gpu_set_texrepeat", defaults: &["false"], reset: "gpu_set_texrepeat(false)" },
    ResetRule { id: "GM2056", setter: "gpu_set_texfilter", defaults: &["false"], reset: "gpu_set_texfilter(false)" },
];

impl ResetRule {
    fn leaves_default(&self, args: &[Expr]) -> bool {
        !self.defaults.is_empty()
            && args.len() >= self.defaults.len()
            && self.defaults.iter().zip(args).all(|(expected, arg)| is_constant(arg, expected))
    }
}

pub struct StateReset {
    diagnostic: FeatherDiagnostic,
    rule: &'static ResetRule,
    reset: Expr,
    reset_name: String,
}

impl StateReset {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        let rule = RESET_RULES.iter().find(|rule| rule.id == diagnostic.id)?;
        let reset = match Parser::new(rule.reset).parse_expression_only() {
            Ok(expr) => expr,
            Err(e) => {
                debug!(id = rule.id, error = %e.message, "reset call does not parse");
                return None;
            }
        };
        let reset_name = call_name(&reset)?.to_string();
        Some(Box::new(Self { diagnostic: diagnostic.clone(), rule, reset, reset_name }))
    }

    fn is_trigger(&self, stmt: &Stmt) -> bool {
        stmt_top_call(stmt).is_some_and(|(name, args)| name == self.rule.setter && !self.rule.leaves_default(args))
    }

    /// A later setter call takes over the job, so does the reset itself
    fn is_reset(&self, stmt: &Stmt) -> bool {
        stmt_top_call(stmt).is_some_and(|(name, _)| name == self.rule.setter || name == self.reset_name)
    }
}

impl Fixer for StateReset {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let Program { body, ids, applied, .. } = program;
        let mut fixes = Vec::new();

        visit_stmt_lists(body, &mut |list, _cx| {
            let mut cursor = StatementCursor::new();
            while !cursor.is_done(list) {
                let at = cursor.index();
                if self.is_trigger(&list[at]) {
                    if let Insertion::At(target) = find_reset_insertion(list, at, |s| self.is_reset(s)) {
                        let trigger = &list[at];
                        let (trigger_id, trigger_span) = (trigger.id, trigger.span);
                        let mut synth = Synth::new(ids, trigger_span);
                        let call = synth.instantiate(&self.reset);
                        let stmt = synth.stmt(gml_parser::StmtKind::Expr(call));
                        let inserted = stmt.id;
                        cursor.insert(list, target, stmt);

                        applied.preserve_layout(trigger_id);
                        applied.preserve_layout(inserted);
                        fixes.push(AppliedFix::new(
                            self.detail().with_target(self.rule.setter).with_range(range_of(trigger_span)),
                            inserted,
                        ));
                    }
                }
                cursor.advance();
            }
        });
        Ok(fixes)
    }
}
