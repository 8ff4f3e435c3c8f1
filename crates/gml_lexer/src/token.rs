//! Token definitions for GML

/// A span in the source code (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`
    pub fn cover(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn contains(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind<'a>, span: Span) -> Self {
        Self { kind, span }
    }
}

/// All possible token types in GML
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind<'a> {
    // Literals
    /// Raw numeric lexeme, e.g. `42`, `.5`, `$FF00FF`, `0x1f`
    Number(&'a str),
    /// Raw string lexeme including quotes (and the `@` of verbatim strings)
    String(&'a str),
    True,
    False,
    Undefined,

    Identifier(&'a str),

    // Keywords
    If,
    Then,
    Else,
    For,
    While,
    Do,
    Until,
    Repeat,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Return,
    Exit,
    With,
    Var,
    Globalvar,
    Function,
    Constructor,
    New,
    Delete,
    Static,
    Enum,
    Try,
    Catch,
    Finally,
    Throw,

    // Operators
    Plus,           // +
    Minus,          // -
    Star,           // *
    Slash,          // /
    Percent,        // %
    Div,            // div
    Mod,            // mod

    // Comparison
    Equal,          // ==
    NotEqual,       // != or <>
    Less,           // <
    LessEqual,      // <=
    Greater,        // >
    GreaterEqual,   // >=

    // Logical
    And,            // && or and
    Or,             // || or or
    Not,            // ! or not
    Xor,            // ^^ or xor

    // Bitwise
    BitAnd,         // &
    BitOr,          // |
    BitXor,         // ^
    BitNot,         // ~
    ShiftLeft,      // <<
    ShiftRight,     // >>

    // Assignment
    Assign,         // =
    PlusAssign,     // +=
    MinusAssign,    // -=
    StarAssign,     // *=
    SlashAssign,    // /=
    PercentAssign,  // %=
    BitAndAssign,   // &=
    BitOrAssign,    // |=
    BitXorAssign,   // ^=
    ShiftLeftAssign,  // <<=
    ShiftRightAssign, // >>=

    // Null-coalescing
    NullCoalesce,       // ??
    NullCoalesceAssign, // ??=
    NullDot,            // ?.
    NullBracket,        // ?[

    Increment,      // ++
    Decrement,      // --

    Question,       // ?
    Colon,          // :

    // Punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    Dot,
    Hash,

    // Accessor operators
    ArrayAccessor,  // [@
    ListAccessor,   // [|
    MapAccessor,    // [?
    GridAccessor,   // [#
    StructAccessor, // [$

    // Comments, content without the delimiters
    LineComment(&'a str),
    BlockComment(&'a str),
    DocComment(&'a str),

    // Preprocessor
    Macro(&'a str, Option<&'a str>), // #macro <name> [body]
    Region(&'a str),
    EndRegion,
    Define(&'a str),

    Eof,
    Error(String),
}

impl<'a> TokenKind<'a> {
    /// Check if this token is a comment of any flavour
    pub fn is_comment(&self) -> bool {
        matches!(
            self,
            TokenKind::LineComment(_) | TokenKind::BlockComment(_) | TokenKind::DocComment(_)
        )
    }

    /// Check if this token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::If
                | TokenKind::Else
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::Until
                | TokenKind::Repeat
                | TokenKind::Switch
                | TokenKind::Case
                | TokenKind::Default
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Return
                | TokenKind::Exit
                | TokenKind::With
                | TokenKind::Var
                | TokenKind::Globalvar
                | TokenKind::Function
                | TokenKind::Constructor
                | TokenKind::New
                | TokenKind::Delete
                | TokenKind::Static
                | TokenKind::Enum
                | TokenKind::Try
                | TokenKind::Catch
                | TokenKind::Finally
                | TokenKind::Throw
        )
    }

    /// Check if this token is a literal
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::Number(_)
                | TokenKind::String(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Undefined
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_cover() {
        let a = Span::new(4, 10);
        let b = Span::new(2, 6);
        assert_eq!(a.cover(b), Span::new(2, 10));
        assert!(a.contains(4));
        assert!(!a.contains(10));
    }
}
