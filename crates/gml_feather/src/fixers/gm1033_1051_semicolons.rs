//! GM1033/GM1051: stray semicolons
//!
//! Semicolons leave no trace in the tree, so both fixers scan the original
//! text and report byte ranges only. Deleting them is up to the printer.

use gml_diagnostics::{FeatherDiagnostic, FixDetail, TextRange};
use gml_parser::{Program, StmtKind};

use crate::context::FixContext;
use crate::error::FixError;
use crate::fixer::{AppliedFix, Fixer};
use crate::metadata::is_recorded;
use crate::scanner::{segments, SegmentKind};
use crate::walk::{stmt_at_offset, visit_stmt_lists};

fn place(detail: FixDetail, program: &Program, offset: u32) -> AppliedFix {
    match stmt_at_offset(&program.body, offset) {
        Some(node) => AppliedFix::new(detail, node),
        None => AppliedFix::at_root(detail),
    }
}

/// Ranges of the extra semicolons in runs like `;;` or `; ;`. Semicolons
/// inside parentheses (`for (;;)`) are not statements and are skipped.
pub fn duplicate_semicolons(source: &str) -> Vec<TextRange> {
    let bytes = source.as_bytes();
    let mut ranges = Vec::new();
    let mut depth = 0usize;
    // A run is open while only whitespace has followed a statement semicolon
    let mut run_open = false;
    let mut extra: Option<(usize, usize)> = None;

    let mut close = |extra: &mut Option<(usize, usize)>| {
        if let Some((start, end)) = extra.take() {
            ranges.push(TextRange::new(start as u32, end as u32));
        }
    };

    for segment in segments(source) {
        if segment.kind != SegmentKind::Code {
            // Comments end a run; so do strings
            run_open = false;
            close(&mut extra);
            continue;
        }
        for at in segment.start..segment.end {
            match bytes[at] {
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                b';' if depth == 0 => {
                    if run_open {
                        extra = Some((extra.map_or(at, |(start, _)| start), at + 1));
                    }
                    run_open = true;
                    continue;
                }
                b if b.is_ascii_whitespace() => continue,
                _ => {}
            }
            run_open = false;
            close(&mut extra);
        }
    }
    close(&mut extra);
    ranges
}

/// GM1033
pub struct DuplicateSemicolons {
    diagnostic: FeatherDiagnostic,
}

impl DuplicateSemicolons {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

impl Fixer for DuplicateSemicolons {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let program = &*program;
        Ok(duplicate_semicolons(ctx.source)
            .into_iter()
            .filter(|range| !is_recorded(program, &self.diagnostic.id, *range))
            .map(|range| place(self.detail().with_range(Some(range)), program, range.start))
            .collect())
    }
}

/// Offset within `body` of a trailing `;`, ignoring trailing comments and
/// whitespace
fn trailing_semicolon(body: &str) -> Option<usize> {
    let mut last = None;
    for segment in segments(body) {
        if segment.kind != SegmentKind::Code {
            if segment.kind == SegmentKind::String {
                last = Some((segment.end - 1, b'"'));
            }
            continue;
        }
        let text = segment.text(body);
        if let Some(at) = text.rfind(|c: char| !c.is_whitespace()) {
            last = Some((segment.start + at, text.as_bytes()[at]));
        }
    }
    match last {
        Some((at, b';')) => Some(at),
        _ => None,
    }
}

/// GM1051
pub struct MacroSemicolons {
    diagnostic: FeatherDiagnostic,
}

impl MacroSemicolons {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

impl Fixer for MacroSemicolons {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let mut found = Vec::new();
        visit_stmt_lists(&mut program.body, &mut |list, _cx| {
            for stmt in list.iter() {
                let (StmtKind::Macro { name, body }, Some(span)) = (&stmt.kind, stmt.span) else {
                    continue;
                };
                let Some(at) = trailing_semicolon(body) else {
                    continue;
                };
                // The body is the tail of the statement text
                let Some(body_start) = (span.end as usize).checked_sub(body.len()) else {
                    continue;
                };
                if ctx.source.get(body_start..span.end as usize) != Some(body.as_str()) {
                    continue;
                }
                let offset = (body_start + at) as u32;
                found.push((stmt.id, name.name.clone(), TextRange::new(offset, offset + 1)));
            }
        });

        let program = &*program;
        Ok(found
            .into_iter()
            .filter(|(_, _, range)| !is_recorded(program, &self.diagnostic.id, *range))
            .map(|(node, name, range)| AppliedFix::new(self.detail().with_target(name).with_range(Some(range)), node))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{parse, run_fixer};

    #[test]
    fn test_duplicate_semicolon_ranges() {
        assert_eq!(duplicate_semicolons("x = 1;;"), vec![TextRange::new(6, 7)]);
        assert_eq!(duplicate_semicolons("x = 1; ;\ny = 2;;;"), vec![TextRange::new(7, 8), TextRange::new(15, 17)]);
    }

    #[test]
    fn test_for_header_and_strings_ignored() {
        assert!(duplicate_semicolons("for (;;) { break; }").is_empty());
        assert!(duplicate_semicolons("s = \";;\";").is_empty());
        assert!(duplicate_semicolons("x = 1; // ;;\ny = 2;").is_empty());
    }

    #[test]
    fn test_duplicate_semicolons_reported_not_removed() {
        let source = "x = 1;;\ny = 2;";
        let (program, fixes) = run_fixer("GM1033", source);
        assert_eq!(program, parse(source));
        assert_eq!(fixes.len(), 1);
        assert!(fixes[0].automatic);
        assert_eq!(fixes[0].range, Some(TextRange::new(6, 7)));
    }

    #[test]
    fn test_trailing_semicolon() {
        assert_eq!(trailing_semicolon(" 4;"), Some(2));
        assert_eq!(trailing_semicolon(" 4; // speed"), Some(2));
        assert_eq!(trailing_semicolon(" \";\""), None);
        assert_eq!(trailing_semicolon(" 4"), None);
    }

    #[test]
    fn test_macro_semicolon_reported() {
        let source = "#macro SPEED 4;\nx = SPEED;";
        let (_, fixes) = run_fixer("GM1051", source);
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].target.as_deref(), Some("SPEED"));
        assert_eq!(fixes[0].range, Some(TextRange::new(14, 15)));
    }
}
