//! GML Feather - automatic fixes for Feather diagnostics
//!
//! Pipeline: `preprocess` sanitises the source text, the parser builds the
//! tree, spans are mapped back to original offsets, then every registered
//! fixer runs in catalog order over the tree. The result is the rewritten
//! tree plus one `FixDetail` per edit (or per unfixable diagnostic).

pub mod catalog;
pub mod context;
pub mod error;
pub mod fixer;
pub mod fixers;
pub mod keywords;
pub mod matchers;
pub mod metadata;
pub mod options;
pub mod preprocess;
pub mod registry;
pub mod scanner;
pub mod synth;
pub mod templates;
pub mod walk;

#[cfg(test)]
mod test_utils;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

use gml_diagnostics::{DiagnosticCatalog, FixDetail};
use gml_parser::Program;
use tracing::debug;

pub use catalog::{builtin_catalog, load_catalog};
pub use context::FixContext;
pub use error::FixError;
pub use fixer::{AppliedFix, Fixer, FixerFactory};
pub use keywords::NameRegistry;
pub use options::FixOptions;
pub use preprocess::{
    apply_index_adjustments, map_offset, preprocess, IndexAdjustment, PreprocessHint, PreprocessMetadata,
    PreprocessResult,
};
pub use registry::FixerRegistry;

/// A fixed tree and the records of what changed
#[derive(Debug)]
pub struct FixOutcome {
    pub program: Program,
    pub fixes: Vec<FixDetail>,
}

/// Apply every fixer named by `catalog` to an already-built tree.
///
/// `source` must be the original text and `program`'s spans must already be
/// in original offsets (see `apply_index_adjustments`).
pub fn apply_feather_fixes(
    program: &mut Program,
    catalog: &DiagnosticCatalog,
    source: &str,
    metadata: &PreprocessMetadata,
    options: &FixOptions,
) -> Vec<FixDetail> {
    let names = NameRegistry::from_catalog(catalog);
    let registry = FixerRegistry::with_builtins();
    let ctx = FixContext::new(source, metadata, options, &names);
    registry.apply_all(program, catalog, &ctx)
}

/// Preprocess, parse and fix one source text
pub fn fix_source(source: &str, catalog: &DiagnosticCatalog, options: &FixOptions) -> Result<FixOutcome, FixError> {
    let preprocessed = preprocess(source);
    let mut program = gml_parser::parse(&preprocessed.source)?;
    apply_index_adjustments(&mut program, &preprocessed.adjustments);

    let fixes = apply_feather_fixes(&mut program, catalog, source, &preprocessed.metadata, options);
    debug!(fixes = fixes.len(), "fixed source");
    Ok(FixOutcome { program, fixes })
}
