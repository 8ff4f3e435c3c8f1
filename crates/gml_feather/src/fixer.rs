//! The `Fixer` trait and the two fallback fixers

use gml_diagnostics::{FeatherDiagnostic, FixDetail, TextRange};
use gml_lexer::Span;
use gml_parser::{NodeId, Program};

use crate::context::FixContext;
use crate::error::FixError;

/// One edit made by a fixer, and the node it should be attached to
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedFix {
    pub detail: FixDetail,
    /// `None` attaches to the program root
    pub node: Option<NodeId>,
}

impl AppliedFix {
    pub fn new(detail: FixDetail, node: NodeId) -> Self {
        Self { detail, node: Some(node) }
    }

    pub fn at_root(detail: FixDetail) -> Self {
        Self { detail, node: None }
    }
}

/// A fix for one diagnostic id.
///
/// Fixers mutate the tree in place and return one `AppliedFix` per edit.
/// An empty result means "nothing to do here", not failure.
pub trait Fixer: Send + Sync {
    fn diagnostic(&self) -> &FeatherDiagnostic;

    fn apply(&self, program: &mut Program, ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError>;

    /// Fixers that never edit; the registry records them once per tree
    fn is_manual_only(&self) -> bool {
        false
    }

    /// Automatic record for this fixer's diagnostic
    fn detail(&self) -> FixDetail {
        FixDetail::automatic(self.diagnostic())
    }
}

/// Builds the fixer for a diagnostic. `None` means the diagnostic carries no
/// usable template (an unparseable example, say); the id is then skipped.
pub type FixerFactory = fn(&FeatherDiagnostic) -> Option<Box<dyn Fixer>>;

/// Stands in for ids without an implementation
pub struct Noop {
    diagnostic: FeatherDiagnostic,
}

impl Noop {
    pub fn new(diagnostic: &FeatherDiagnostic) -> Self {
        Self { diagnostic: diagnostic.clone() }
    }
}

impl Fixer for Noop {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, _program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        Ok(Vec::new())
    }
}

/// Diagnostics that need information the tree does not carry
pub struct ManualOnly {
    diagnostic: FeatherDiagnostic,
}

impl ManualOnly {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

impl Fixer for ManualOnly {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, _program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        Ok(Vec::new())
    }

    fn is_manual_only(&self) -> bool {
        true
    }
}

/// Span to a `FixDetail` range
pub fn range_of(span: Option<Span>) -> Option<TextRange> {
    span.map(|s| TextRange::new(s.start, s.end))
}
