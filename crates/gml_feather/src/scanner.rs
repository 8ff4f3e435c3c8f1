//! String- and comment-aware segmentation of raw source text
//!
//! Splits text into code, string and comment runs so that braces, quotes and
//! semicolons inside strings or comments are never mistaken for code.
//! Recognises `"..."` and `'...'` with backslash escapes, verbatim `@"..."`
//! strings, `//` line comments and `/* */` block comments.

use memchr::{memchr, memchr2, memchr3, memmem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Code,
    String,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.start..self.end]
    }
}

pub struct Segments<'s> {
    bytes: &'s [u8],
    pos: usize,
}

/// Iterate the segments of `source` in order; together they cover it exactly
pub fn segments(source: &str) -> Segments<'_> {
    Segments { bytes: source.as_bytes(), pos: 0 }
}

impl Segments<'_> {
    fn peek(&self, at: usize) -> Option<u8> {
        self.bytes.get(at).copied()
    }

    /// End of a quoted string whose opening quote is at `open`
    fn string_end(&self, open: usize, verbatim: bool) -> usize {
        let quote = self.bytes[open];
        let len = self.bytes.len();
        let mut i = open + 1;
        if verbatim {
            return memchr(quote, &self.bytes[i..]).map_or(len, |at| i + at + 1);
        }
        while i < len {
            match memchr2(quote, b'\\', &self.bytes[i..]) {
                Some(at) if self.bytes[i + at] == b'\\' => i += at + 2,
                Some(at) => return i + at + 1,
                None => return len,
            }
        }
        len
    }

    /// End of a code run starting at `start`
    fn code_end(&self, start: usize) -> usize {
        let len = self.bytes.len();
        let mut i = start;
        while i < len {
            let Some(at) = memchr3(b'"', b'\'', b'/', &self.bytes[i..]) else {
                return len;
            };
            let at = i + at;
            match self.bytes[at] {
                b'/' if matches!(self.peek(at + 1), Some(b'/' | b'*')) => return at,
                b'/' => i = at + 1,
                _ if at > start && self.bytes[at - 1] == b'@' => return at - 1,
                _ => return at,
            }
        }
        len
    }
}

impl Iterator for Segments<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        let start = self.pos;
        let len = self.bytes.len();
        if start >= len {
            return None;
        }

        let (kind, end) = match (self.bytes[start], self.peek(start + 1)) {
            (b'"' | b'\'', _) => (SegmentKind::String, self.string_end(start, false)),
            (b'@', Some(b'"' | b'\'')) => (SegmentKind::String, self.string_end(start + 1, true)),
            (b'/', Some(b'/')) => {
                let end = memchr(b'\n', &self.bytes[start..]).map_or(len, |at| start + at);
                (SegmentKind::Comment, end)
            }
            (b'/', Some(b'*')) => {
                let end = memmem::find(&self.bytes[start + 2..], b"*/").map_or(len, |at| start + 2 + at + 2);
                (SegmentKind::Comment, end)
            }
            _ => (SegmentKind::Code, self.code_end(start)),
        };

        // Always make progress, even on a lone quote at end of input
        let end = end.max(start + 1).min(len);
        self.pos = end;
        Some(Segment { kind, start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<(SegmentKind, &str)> {
        segments(source).map(|s| (s.kind, s.text(source))).collect()
    }

    #[test]
    fn test_strings_and_comments_are_split_out() {
        let got = kinds("a = \"{;\"; // }\nb;");
        assert_eq!(
            got,
            vec![
                (SegmentKind::Code, "a = "),
                (SegmentKind::String, "\"{;\""),
                (SegmentKind::Code, "; "),
                (SegmentKind::Comment, "// }"),
                (SegmentKind::Code, "\nb;"),
            ]
        );
    }

    #[test]
    fn test_escapes_and_verbatim_strings() {
        let got = kinds(r#"s = "a\"b"; t = @"c:\dir\"; /* x */ u / 2;"#);
        assert_eq!(got[1], (SegmentKind::String, r#""a\"b""#));
        assert_eq!(got[3], (SegmentKind::String, r#"@"c:\dir\""#));
        assert_eq!(got[5], (SegmentKind::Comment, "/* x */"));
        assert_eq!(got[6], (SegmentKind::Code, " u / 2;"));
    }

    #[test]
    fn test_segments_cover_input() {
        let source = "x = 'unterminated";
        let total: usize = segments(source).map(|s| s.end - s.start).sum();
        assert_eq!(total, source.len());
    }
}
