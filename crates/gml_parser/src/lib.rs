//! GML Parser - AST builder for GameMaker Language
//!
//! A hand-written recursive descent parser that produces an owned tree from
//! tokens. Comments are collected on the root and attached by proximity, and
//! every node gets a stable `NodeId` so later passes can key side data on it.

mod ast;
mod comments;
mod parser;
mod sidecar;

pub use ast::*;
pub use comments::{attach_comments, Comment, CommentAttachment, CommentKind, CommentPlacement, Comments};
pub use parser::{ParseError, Parser};
pub use sidecar::AppliedDiagnostics;

/// Parse a whole source file
pub fn parse(source: &str) -> Result<Program, Vec<ParseError>> {
    Parser::new(source).parse()
}
