//! Diagnostic id → fixer registry, and the catalog-ordered driver

use std::panic::{self, AssertUnwindSafe};

use gml_diagnostics::{DiagnosticCatalog, FeatherDiagnostic, FixDetail};
use gml_parser::{NodeId, Program};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::context::FixContext;
use crate::fixer::{Fixer, FixerFactory, Noop};
use crate::fixers;
use crate::metadata;

#[derive(Default)]
pub struct FixerRegistry {
    factories: FxHashMap<String, FixerFactory>,
}

impl FixerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every fixer this crate implements
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        fixers::register_builtins(&mut registry);
        registry
    }

    /// Register `factory` for `id`. The first registration for an id wins;
    /// later ones are ignored and `false` is returned.
    pub fn register(&mut self, id: &str, factory: FixerFactory) -> bool {
        if self.factories.contains_key(id) {
            debug!(id, "fixer already registered, ignoring");
            return false;
        }
        self.factories.insert(id.to_string(), factory);
        true
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// The fixer for `diagnostic`, and whether it came from a registration.
    /// Unknown ids and declining factories get a `Noop`.
    pub fn build(&self, diagnostic: &FeatherDiagnostic) -> (Box<dyn Fixer>, bool) {
        let Some(factory) = self.factories.get(&diagnostic.id) else {
            debug!(id = %diagnostic.id, "no fixer registered, substituting no-op");
            return (Box::new(Noop::new(diagnostic)), false);
        };
        match factory(diagnostic) {
            Some(fixer) => (fixer, true),
            None => {
                debug!(id = %diagnostic.id, "no usable template in examples, substituting no-op");
                (Box::new(Noop::new(diagnostic)), false)
            }
        }
    }

    /// Run one fixer per catalog id, in catalog order, and return every
    /// record produced
    pub fn apply_all(&self, program: &mut Program, catalog: &DiagnosticCatalog, ctx: &FixContext) -> Vec<FixDetail> {
        let mut seen = FxHashSet::default();
        let mut details = Vec::new();

        for diagnostic in catalog.iter() {
            if !seen.insert(diagnostic.id.as_str()) {
                continue;
            }
            let (fixer, registered) = self.build(diagnostic);
            details.extend(run_fixer(program, fixer.as_ref(), ctx, registered));
        }
        details
    }
}

/// Run one fixer in isolation. A failing or panicking fixer leaves the tree
/// exactly as it found it.
fn run_fixer(program: &mut Program, fixer: &dyn Fixer, ctx: &FixContext, registered: bool) -> Vec<FixDetail> {
    let diagnostic = fixer.diagnostic();
    if fixer.is_manual_only() {
        return record_manual_once(program, diagnostic);
    }

    let snapshot = program.clone();
    let fixes = match panic::catch_unwind(AssertUnwindSafe(|| fixer.apply(program, ctx))) {
        Ok(Ok(fixes)) => fixes,
        Ok(Err(e)) => {
            warn!(id = %diagnostic.id, error = %e, "fixer failed, discarding its edits");
            *program = snapshot;
            Vec::new()
        }
        Err(payload) => {
            warn!(id = %diagnostic.id, panic = panic_message(payload.as_ref()), "fixer panicked, discarding its edits");
            *program = snapshot;
            Vec::new()
        }
    };

    if fixes.is_empty() {
        if registered && ctx.options.record_unfixed_as_manual {
            return record_manual_once(program, diagnostic);
        }
        return Vec::new();
    }
    metadata::attach_all(program, fixes)
}

/// One non-automatic record per id per tree
pub fn record_manual_once(program: &mut Program, diagnostic: &FeatherDiagnostic) -> Vec<FixDetail> {
    if !program.applied.mark_manual(&diagnostic.id) {
        return Vec::new();
    }
    let detail = FixDetail::manual(diagnostic);
    program.applied.attach(NodeId::ROOT, detail.clone());
    vec![detail]
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FixError;
    use crate::fixer::AppliedFix;
    use crate::test_utils::{parse, with_context};

    struct Renamer(FeatherDiagnostic);
    impl Fixer for Renamer {
        fn diagnostic(&self) -> &FeatherDiagnostic {
            &self.0
        }
        fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
            program.body.clear();
            Ok(vec![AppliedFix::at_root(self.detail().with_target("first"))])
        }
    }

    struct Other(FeatherDiagnostic);
    impl Fixer for Other {
        fn diagnostic(&self) -> &FeatherDiagnostic {
            &self.0
        }
        fn apply(&self, _program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
            Ok(vec![AppliedFix::at_root(self.detail().with_target("second"))])
        }
    }

    struct Broken(FeatherDiagnostic);
    impl Fixer for Broken {
        fn diagnostic(&self) -> &FeatherDiagnostic {
            &self.0
        }
        fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
            program.body.clear();
            Err(FixError::template(&self.0.id, "test"))
        }
    }

    struct Panicky(FeatherDiagnostic);
    impl Fixer for Panicky {
        fn diagnostic(&self) -> &FeatherDiagnostic {
            &self.0
        }
        fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
            program.body.clear();
            panic!("boom");
        }
    }

    fn catalog(ids: &[&str]) -> DiagnosticCatalog {
        ids.iter().map(|id| FeatherDiagnostic::new(*id, "test")).collect()
    }

    #[test]
    fn test_first_registration_wins() {
        let mut registry = FixerRegistry::new();
        assert!(registry.register("GM9000", |d| Some(Box::new(Renamer(d.clone())))));
        assert!(!registry.register("GM9000", |d| Some(Box::new(Other(d.clone())))));

        let mut program = parse("a();");
        let details = with_context(|ctx| registry.apply_all(&mut program, &catalog(&["GM9000", "GM9000"]), ctx));
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].target.as_deref(), Some("first"));
    }

    #[test]
    fn test_failures_restore_tree_and_record_manual() {
        let mut registry = FixerRegistry::new();
        registry.register("GM9001", |d| Some(Box::new(Broken(d.clone()))));
        registry.register("GM9002", |d| Some(Box::new(Panicky(d.clone()))));

        let mut program = parse("a(); b();");
        let details = with_context(|ctx| registry.apply_all(&mut program, &catalog(&["GM9001", "GM9002"]), ctx));
        assert_eq!(program.body.len(), 2);
        assert_eq!(details.len(), 2);
        assert!(details.iter().all(|d| !d.automatic));
    }

    #[test]
    fn test_unregistered_id_is_noop_without_record() {
        let registry = FixerRegistry::new();
        let mut program = parse("a();");
        let details = with_context(|ctx| registry.apply_all(&mut program, &catalog(&["GM9999"]), ctx));
        assert!(details.is_empty());
        assert_eq!(program.body.len(), 1);
    }

    #[test]
    fn test_manual_recorded_once_per_tree() {
        let mut registry = FixerRegistry::new();
        registry.register("GM2017", crate::fixer::ManualOnly::factory);
        let mut program = parse("a();");
        let first = with_context(|ctx| registry.apply_all(&mut program, &catalog(&["GM2017"]), ctx));
        let second = with_context(|ctx| registry.apply_all(&mut program, &catalog(&["GM2017"]), ctx));
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(program.applied.for_node(NodeId::ROOT).len(), 1);
    }
}
