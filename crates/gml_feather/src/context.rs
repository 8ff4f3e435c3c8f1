use crate::keywords::NameRegistry;
use crate::options::FixOptions;
use crate::preprocess::PreprocessMetadata;

/// Read-only inputs shared by every fixer during one run
pub struct FixContext<'a> {
    /// The original, unpreprocessed source text
    pub source: &'a str,
    /// Text-derived hints recorded by the preprocessor
    pub metadata: &'a PreprocessMetadata,
    pub options: &'a FixOptions,
    pub names: &'a NameRegistry,
}

impl<'a> FixContext<'a> {
    pub fn new(
        source: &'a str,
        metadata: &'a PreprocessMetadata,
        options: &'a FixOptions,
        names: &'a NameRegistry,
    ) -> Self {
        Self { source, metadata, options, names }
    }
}
