use gml_parser::ParseError;
use thiserror::Error;

/// Errors a fixer (or the engine entry points) can report
#[derive(Debug, Error)]
pub enum FixError {
    #[error("parse error at offset {offset}: {message}")]
    Parse { message: String, offset: u32 },

    #[error("{id}: no replacement template ({reason})")]
    Template { id: String, reason: String },

    #[error("invalid diagnostic catalog: {0}")]
    Catalog(#[from] serde_json::Error),
}

impl FixError {
    pub fn template(id: &str, reason: impl Into<String>) -> Self {
        FixError::Template { id: id.to_string(), reason: reason.into() }
    }
}

impl From<ParseError> for FixError {
    fn from(error: ParseError) -> Self {
        FixError::Parse { message: error.message, offset: error.span.start }
    }
}

impl From<Vec<ParseError>> for FixError {
    fn from(mut errors: Vec<ParseError>) -> Self {
        match errors.drain(..).next() {
            Some(first) => first.into(),
            None => FixError::Parse { message: "unknown parse failure".to_string(), offset: 0 },
        }
    }
}
