//! GM1056/GM1059: parameter list hygiene

use gml_diagnostics::FeatherDiagnostic;
use gml_parser::Program;
use rustc_hash::FxHashSet;

use crate::context::FixContext;
use crate::error::FixError;
use crate::fixer::{range_of, AppliedFix, Fixer};
use crate::synth::Synth;
use crate::walk::for_each_function_mut;

/// GM1056: a required parameter after an optional one
pub struct RequiredAfterOptional {
    diagnostic: FeatherDiagnostic,
}

impl RequiredAfterOptional {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

impl Fixer for RequiredAfterOptional {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let Program { body, ids, .. } = program;
        let mut fixes = Vec::new();
        for_each_function_mut(body, &mut |func, owner| {
            let Some(first_optional) = func.params.iter().position(|p| p.default.is_some()) else {
                return;
            };
            for param in func.params.iter_mut().skip(first_optional + 1).filter(|p| p.default.is_none()) {
                param.default = Some(Synth::new(&mut *ids, param.span).undefined());
                fixes.push(AppliedFix::new(
                    self.detail()
                        .with_target(param.name.name.as_str())
                        .with_replacement(format!("{} = undefined", param.name.name))
                        .with_range(range_of(param.span)),
                    owner,
                ));
            }
        });
        Ok(fixes)
    }
}

/// GM1059: the same name twice in one parameter list; the first one stays
pub struct DuplicateParameters {
    diagnostic: FeatherDiagnostic,
}

impl DuplicateParameters {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

impl Fixer for DuplicateParameters {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let mut fixes = Vec::new();
        for_each_function_mut(&mut program.body, &mut |func, owner| {
            let mut seen = FxHashSet::default();
            func.params.retain(|param| {
                if seen.insert(param.name.name.clone()) {
                    return true;
                }
                fixes.push(AppliedFix::new(
                    self.detail().with_target(param.name.name.as_str()).with_range(range_of(param.span)),
                    owner,
                ));
                false
            });
        });
        Ok(fixes)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{assert_fix, assert_no_fix};

    #[test]
    fn test_required_after_optional_defaulted() {
        let fixes = assert_fix(
            "GM1056",
            "function f(a, b = 1, c, d) {}",
            "function f(a, b = 1, c = undefined, d = undefined) {}",
        );
        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].target.as_deref(), Some("c"));
    }

    #[test]
    fn test_ordered_parameters_kept() {
        assert_no_fix("GM1056", "function f(a, b, c = 1) {}");
        assert_no_fix("GM1056", "var g = function(x = 0, y = 0) {};");
    }

    #[test]
    fn test_duplicate_parameter_removed() {
        let fixes = assert_fix("GM1059", "function f(a, b, a) { return b; }", "function f(a, b) { return b; }");
        assert_eq!(fixes[0].target.as_deref(), Some("a"));
        assert_no_fix("GM1059", "function f(a, b) {}");
    }
}
