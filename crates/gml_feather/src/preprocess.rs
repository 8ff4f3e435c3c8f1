//! Source sanitising ahead of parsing
//!
//! The grammar rejects a few patterns that Feather still wants fixed. They are
//! rewritten here, on text, and reported as hints keyed by diagnostic id:
//!
//! - GM1016: a statement that is only `true` or `false`. The literal is blanked
//!   to spaces and the leftover `;` parses as an empty statement.
//! - GM1100: `var name` followed by a `*name = value` line. The `*` is blanked so
//!   the second line parses as a plain assignment.
//! - GM1003: an enum initialiser written as a numeric string (`A = "1"`). The
//!   quotes are dropped, which shortens the text; every removal is recorded as
//!   an `IndexAdjustment` so spans can be mapped back to the original.

use gml_diagnostics::TextRange;
use gml_lexer::Span;
use gml_parser::Program;
use regex::Regex;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::scanner::{segments, Segment, SegmentKind};
use crate::walk::{walk_stmts_mut, VisitMut};

/// `delta` characters were removed just before sanitised offset `index`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexAdjustment {
    pub index: u32,
    pub delta: u32,
}

/// A text location the grammar could not represent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessHint {
    /// Offsets into the original text
    pub range: TextRange,
    pub target: Option<String>,
}

/// Hints keyed by diagnostic id
#[derive(Debug, Clone, Default)]
pub struct PreprocessMetadata {
    hints: FxHashMap<String, Vec<PreprocessHint>>,
}

impl PreprocessMetadata {
    pub fn push(&mut self, id: &str, hint: PreprocessHint) {
        self.hints.entry(id.to_string()).or_default().push(hint);
    }

    pub fn hints(&self, id: &str) -> &[PreprocessHint] {
        self.hints.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.hints.values().all(Vec::is_empty)
    }
}

#[derive(Debug, Clone)]
pub struct PreprocessResult {
    pub source: String,
    pub metadata: PreprocessMetadata,
    pub adjustments: Vec<IndexAdjustment>,
}

impl PreprocessResult {
    fn unchanged(source: &str) -> Self {
        Self {
            source: source.to_string(),
            metadata: PreprocessMetadata::default(),
            adjustments: Vec::new(),
        }
    }
}

/// Compiled line patterns
pub struct Preprocessor {
    boolean_statement: Regex,
    bare_var: Regex,
    dereference: Regex,
    numeric: Regex,
}

impl Preprocessor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            boolean_statement: Regex::new(r"^\s*(true|false)\s*(;)\s*$")?,
            bare_var: Regex::new(r"^\s*var\s+([A-Za-z_][A-Za-z0-9_]*)\s*;?\s*$")?,
            dereference: Regex::new(r"^\s*(\*)\s*([A-Za-z_][A-Za-z0-9_]*)\s*=[^=]")?,
            numeric: Regex::new(r"^-?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)$")?,
        })
    }

    pub fn run(&self, source: &str) -> PreprocessResult {
        let mut metadata = PreprocessMetadata::default();
        let code = CodeMap::new(source);

        // Line passes keep the length, so offsets stay original
        let mut text = source.as_bytes().to_vec();
        self.blank_boolean_statements(source, &code, &mut text, &mut metadata);
        self.rewrite_dereferences(source, &code, &mut text, &mut metadata);

        let Ok(text) = String::from_utf8(text) else {
            // Only ASCII bytes were overwritten, so this cannot fail in practice
            return PreprocessResult::unchanged(source);
        };
        let (text, adjustments) = self.unquote_enum_values(&text, &mut metadata);

        if !adjustments.is_empty() || !metadata.is_empty() {
            debug!(adjustments = adjustments.len(), "preprocessed source");
        }
        PreprocessResult { source: text, metadata, adjustments }
    }

    fn blank_boolean_statements(
        &self,
        source: &str,
        code: &CodeMap,
        text: &mut [u8],
        metadata: &mut PreprocessMetadata,
    ) {
        for (start, line) in lines(source) {
            let Some(caps) = self.boolean_statement.captures(line) else {
                continue;
            };
            let (Some(literal), Some(semicolon)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let at = start + literal.start();
            if !code.is_code(at) || !code.starts_statement(source, at) {
                continue;
            }
            text[at..start + literal.end()].fill(b' ');
            let end = start + semicolon.end();
            metadata.push(
                "GM1016",
                PreprocessHint {
                    range: TextRange::new(at as u32, end as u32),
                    target: Some(literal.as_str().to_string()),
                },
            );
        }
    }

    fn rewrite_dereferences(
        &self,
        source: &str,
        code: &CodeMap,
        text: &mut [u8],
        metadata: &mut PreprocessMetadata,
    ) {
        let all: Vec<(usize, &str)> = lines(source).collect();
        for (i, (start, line)) in all.iter().enumerate() {
            let Some(declared) = self.bare_var.captures(line).and_then(|c| c.get(1)) else {
                continue;
            };
            if !code.is_code(start + declared.start()) {
                continue;
            }
            // The dereference has to be the next non-blank line
            let Some((next_start, next)) = all[i + 1..].iter().find(|(_, l)| !l.trim().is_empty()) else {
                continue;
            };
            let Some(caps) = self.dereference.captures(next) else {
                continue;
            };
            let (Some(star), Some(name)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            if name.as_str() != declared.as_str() || !code.is_code(next_start + star.start()) {
                continue;
            }
            text[next_start + star.start()] = b' ';
            let trimmed = next.trim_end();
            metadata.push(
                "GM1100",
                PreprocessHint {
                    range: TextRange::new(
                        (next_start + star.start()) as u32,
                        (next_start + trimmed.len()) as u32,
                    ),
                    target: Some(name.as_str().to_string()),
                },
            );
        }
    }

    fn unquote_enum_values(&self, text: &str, metadata: &mut PreprocessMetadata) -> (String, Vec<IndexAdjustment>) {
        let mut out = String::with_capacity(text.len());
        let mut adjustments = Vec::new();
        let mut copied = 0;
        let mut state = EnumState::Outside;

        for segment in segments(text) {
            match segment.kind {
                SegmentKind::Code => state.feed(segment.text(text)),
                SegmentKind::Comment => {}
                SegmentKind::String => {
                    let EnumState::Body { depth: 1, after_equals: true, member } = &state else {
                        state.clear_equals();
                        continue;
                    };
                    if let Some(value) = self.numeric_value(text, &segment) {
                        out.push_str(&text[copied..segment.start]);
                        out.push_str(value);
                        copied = segment.end;
                        adjustments.push(IndexAdjustment { index: out.len() as u32, delta: 2 });
                        metadata.push(
                            "GM1003",
                            PreprocessHint {
                                range: TextRange::new(segment.start as u32, segment.end as u32),
                                target: member.clone(),
                            },
                        );
                    }
                    state.clear_equals();
                }
            }
        }
        out.push_str(&text[copied..]);
        (out, adjustments)
    }

    /// The unquoted value of a numeric-looking enum initialiser, if it is
    /// followed by the end of the member
    fn numeric_value<'t>(&self, text: &'t str, segment: &Segment) -> Option<&'t str> {
        let raw = segment.text(text).as_bytes();
        // Unterminated strings run to the end of input and are left alone
        let (&quote, &close) = (raw.first()?, raw.last()?);
        if quote == b'@' || raw.len() < 2 || close != quote {
            return None;
        }
        let value = &segment.text(text)[1..raw.len() - 1];
        if !self.numeric.is_match(value) {
            return None;
        }
        let rest = text[segment.end..].trim_start();
        (rest.is_empty() || rest.starts_with(',') || rest.starts_with('}')).then_some(value)
    }
}

/// Run the preprocessor; never fails, falling back to the input unchanged
pub fn preprocess(source: &str) -> PreprocessResult {
    match Preprocessor::new() {
        Ok(preprocessor) => preprocessor.run(source),
        Err(e) => {
            warn!(error = %e, "preprocessor patterns failed to compile, skipping");
            PreprocessResult::unchanged(source)
        }
    }
}

/// Map a sanitised-text offset back to the original text
pub fn map_offset(adjustments: &[IndexAdjustment], offset: u32) -> u32 {
    offset
        + adjustments
            .iter()
            .take_while(|a| a.index <= offset)
            .map(|a| a.delta)
            .sum::<u32>()
}

/// Rewrite every span in `program` (statements, expressions, names, comments)
/// from sanitised to original offsets
pub fn apply_index_adjustments(program: &mut Program, adjustments: &[IndexAdjustment]) {
    if adjustments.is_empty() {
        return;
    }

    struct Remap<'a>(&'a [IndexAdjustment]);
    impl VisitMut for Remap<'_> {
        fn visit_span(&mut self, span: &mut Span) {
            *span = Span::new(map_offset(self.0, span.start), map_offset(self.0, span.end));
        }
    }

    let mut remap = Remap(adjustments);
    walk_stmts_mut(&mut remap, &mut program.body);
    for comment in program.comments.iter_mut() {
        remap.visit_span(&mut comment.span);
    }
    remap.visit_span(&mut program.span);
}

/// Lines with the byte offset they start at, terminators stripped
fn lines(source: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    source.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        (start, raw.trim_end_matches(['\n', '\r']))
    })
}

/// Which offsets of the original text are code (not string or comment)
struct CodeMap {
    non_code: Vec<(usize, usize)>,
}

impl CodeMap {
    fn new(source: &str) -> Self {
        let non_code = segments(source)
            .filter(|s| s.kind != SegmentKind::Code)
            .map(|s| (s.start, s.end))
            .collect();
        Self { non_code }
    }

    fn is_code(&self, offset: usize) -> bool {
        self.enclosing(offset).is_none()
    }

    /// The string or comment run covering `offset`
    fn enclosing(&self, offset: usize) -> Option<(usize, usize)> {
        let i = self.non_code.partition_point(|(start, _)| *start <= offset);
        (i > 0 && self.non_code[i - 1].1 > offset).then(|| self.non_code[i - 1])
    }

    /// Does code at `offset` begin a statement? Looks back past whitespace,
    /// strings and comments for a terminator, a brace, a case colon or a
    /// keyword that takes a statement.
    fn starts_statement(&self, source: &str, offset: usize) -> bool {
        let bytes = source.as_bytes();
        let mut i = offset;
        while i > 0 {
            i -= 1;
            if let Some((start, _)) = self.enclosing(i) {
                // Comments separate tokens; a string before us is an operand
                if bytes[start] != b'/' {
                    return false;
                }
                i = start;
                continue;
            }
            match bytes[i] {
                b if b.is_ascii_whitespace() => continue,
                b';' | b'{' | b'}' | b':' => return true,
                b if b.is_ascii_alphanumeric() || b == b'_' => {
                    let word_start = bytes[..=i]
                        .iter()
                        .rposition(|b| !(b.is_ascii_alphanumeric() || *b == b'_'))
                        .map_or(0, |at| at + 1);
                    return matches!(&source[word_start..=i], "else" | "do" | "then");
                }
                _ => return false,
            }
        }
        true
    }
}

/// Tracks whether the scan is inside an `enum { ... }` body
enum EnumState {
    Outside,
    /// Saw `enum`, waiting for `{`
    Header,
    Body {
        depth: u32,
        after_equals: bool,
        member: Option<String>,
    },
}

impl EnumState {
    fn clear_equals(&mut self) {
        if let EnumState::Body { after_equals, .. } = self {
            *after_equals = false;
        }
    }

    fn feed(&mut self, code: &str) {
        let bytes = code.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if b.is_ascii_alphabetic() || b == b'_' {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                self.word(&code[start..i]);
                continue;
            }
            if b.is_ascii_whitespace() {
                i += 1;
                continue;
            }
            match self {
                EnumState::Header => {
                    *self = if b == b'{' {
                        EnumState::Body { depth: 1, after_equals: false, member: None }
                    } else {
                        EnumState::Outside
                    };
                }
                EnumState::Body { depth, after_equals, .. } => {
                    *after_equals = b == b'=' && *depth == 1;
                    if b == b'{' {
                        *depth += 1;
                    } else if b == b'}' {
                        *depth -= 1;
                        if *depth == 0 {
                            *self = EnumState::Outside;
                        }
                    }
                }
                EnumState::Outside => {}
            }
            i += 1;
        }
    }

    fn word(&mut self, word: &str) {
        match self {
            EnumState::Outside if word == "enum" => *self = EnumState::Header,
            // The enum's own name
            EnumState::Header => {}
            EnumState::Body { depth, after_equals, member } => {
                if *depth == 1 && !*after_equals {
                    *member = Some(word.to_string());
                }
                *after_equals = false;
            }
            EnumState::Outside => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_enum_string_is_unquoted() {
        let result = preprocess(r#"enum E { A = "1", B = "x" }"#);
        assert_eq!(result.source, r#"enum E { A = 1, B = "x" }"#);
        assert_eq!(result.adjustments, vec![IndexAdjustment { index: 14, delta: 2 }]);
        let hints = result.metadata.hints("GM1003");
        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].target.as_deref(), Some("A"));
        assert_eq!(hints[0].range, TextRange::new(13, 16));
    }

    #[test]
    fn test_strings_outside_enums_are_left_alone() {
        let source = "x = \"1\";\n// enum E { A = \"2\" }\ns = \"enum { B = \\\"3\\\" }\";";
        let result = preprocess(source);
        assert_eq!(result.source, source);
        assert!(result.adjustments.is_empty());
    }

    #[test]
    fn test_nested_braces_inside_enum() {
        let result = preprocess("enum E {\n A = \"1\",\n B = \"2.5\"\n}\nx = { a: \"3\" };");
        assert_eq!(result.source, "enum E {\n A = 1,\n B = 2.5\n}\nx = { a: \"3\" };");
        assert_eq!(result.adjustments.len(), 2);
        assert_eq!(result.adjustments[1].index, 25);
    }

    #[test]
    fn test_boolean_statement_is_blanked() {
        let result = preprocess("foo();\n    true;\nbar();");
        assert_eq!(result.source, "foo();\n        ;\nbar();");
        let hints = result.metadata.hints("GM1016");
        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].range, TextRange::new(11, 16));
    }

    #[test]
    fn test_boolean_on_continuation_line_is_kept() {
        for source in ["x =\n    true;\n", "f(a,\n  false);\n", "y = \"s\" +\n true;"] {
            let result = preprocess(source);
            assert_eq!(result.source, source);
            assert!(result.metadata.hints("GM1016").is_empty());
        }
        assert!(gml_parser::parse(&preprocess("x =\n    true;\n").source).is_ok());
    }

    #[test]
    fn test_boolean_after_comment_or_else_is_blanked() {
        let result = preprocess("foo(); // done\ntrue;\nif (a) b(); else\n    false;");
        assert_eq!(result.metadata.hints("GM1016").len(), 2);
        let result = preprocess("true;");
        assert_eq!(result.source, "    ;");
    }

    #[test]
    fn test_unterminated_enum_string_is_left_alone() {
        for source in ["enum E { A = \"\u{e9}", "enum E { A = \"12", "enum E { A = \"1\\\""] {
            let result = preprocess(source);
            assert_eq!(result.source, source);
            assert!(result.adjustments.is_empty());
        }
    }

    #[test]
    fn test_dereference_after_var() {
        let result = preprocess("var value\n\n*value = 4;");
        assert_eq!(result.source, "var value\n\n value = 4;");
        let hints = result.metadata.hints("GM1100");
        assert_eq!(hints[0].target.as_deref(), Some("value"));
        assert_eq!(hints[0].range, TextRange::new(11, 22));
    }

    #[test]
    fn test_no_match_is_identity() {
        let source = "var a = 1;\nif (a) { b = true; }";
        let result = preprocess(source);
        assert_eq!(result.source, source);
        assert!(result.metadata.is_empty());
    }

    #[test]
    fn test_map_offset_folds_adjustments() {
        let adjustments = [IndexAdjustment { index: 5, delta: 2 }, IndexAdjustment { index: 9, delta: 2 }];
        assert_eq!(map_offset(&adjustments, 4), 4);
        assert_eq!(map_offset(&adjustments, 5), 7);
        assert_eq!(map_offset(&adjustments, 9), 13);
    }
}
