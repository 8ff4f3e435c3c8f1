//! GML Lexer - Tokenizer for GameMaker Language
//!
//! This crate provides a fast, hand-written lexer for GML that produces
//! a stream of tokens suitable for parsing. Comments are emitted as tokens
//! so the tree builder can keep them alongside the syntax tree.

mod lexer;
mod token;

pub use lexer::Lexer;
pub use token::{Span, Token, TokenKind};
