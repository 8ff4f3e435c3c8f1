//! GM1029/GM1062: literal spellings Feather does not accept
//!
//! GM1029 rewrites number lexemes (`.5`, `5.`, `0X1F`). GM1062 rewrites the
//! type annotations of doc comments (`{String}`, `{Array<Real>}`).

use gml_diagnostics::{FeatherDiagnostic, TextRange};
use gml_parser::{CommentKind, Expr, ExprKind, Literal, Program};
use regex::Regex;
use tracing::debug;

use crate::context::FixContext;
use crate::error::FixError;
use crate::fixer::{range_of, AppliedFix, Fixer};
use crate::walk::{walk_expr_mut, walk_stmts_mut, VisitMut};

/// GM1029
pub struct MalformedNumbers {
    diagnostic: FeatherDiagnostic,
}

impl MalformedNumbers {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        Some(Box::new(Self { diagnostic: diagnostic.clone() }))
    }
}

/// Canonical spelling of a number lexeme, if it differs
fn normalize_number(raw: &str) -> Option<String> {
    if let Some(hex) = raw.strip_prefix("0X") {
        return Some(format!("0x{}", hex));
    }
    if let Some(bin) = raw.strip_prefix("0B") {
        return Some(format!("0b{}", bin));
    }
    if raw.starts_with('.') {
        return Some(format!("0{}", raw));
    }
    if raw.ends_with('.') && raw[..raw.len() - 1].bytes().all(|b| b.is_ascii_digit()) {
        return Some(format!("{}0", raw));
    }
    None
}

impl Fixer for MalformedNumbers {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        struct Numbers<'f> {
            fixer: &'f MalformedNumbers,
            fixes: Vec<AppliedFix>,
        }
        impl VisitMut for Numbers<'_> {
            fn visit_expr(&mut self, expr: &mut Expr) {
                if let ExprKind::Literal(Literal::Number(raw)) = &mut expr.kind {
                    if let Some(fixed) = normalize_number(raw) {
                        let detail = self
                            .fixer
                            .detail()
                            .with_target(raw.as_str())
                            .with_replacement(fixed.as_str())
                            .with_range(range_of(expr.span));
                        *raw = fixed;
                        self.fixes.push(AppliedFix::new(detail, expr.id));
                    }
                    return;
                }
                walk_expr_mut(self, expr);
            }
        }

        let mut numbers = Numbers { fixer: self, fixes: Vec::new() };
        walk_stmts_mut(&mut numbers, &mut program.body);
        Ok(numbers.fixes)
    }
}

/// GM1062
pub struct DocCommentTypes {
    diagnostic: FeatherDiagnostic,
    braces: Regex,
    words: Regex,
}

/// Lower-case spelling → canonical type name
const TYPE_NAMES: &[(&str, &str)] = &[
    ("string", "string"),
    ("real", "real"),
    ("number", "real"),
    ("bool", "bool"),
    ("boolean", "bool"),
    ("array", "array"),
    ("struct", "struct"),
    ("function", "function"),
    ("method", "method"),
    ("any", "any"),
    ("undefined", "undefined"),
    ("int64", "int64"),
    ("pointer", "pointer"),
];

impl DocCommentTypes {
    pub fn factory(diagnostic: &FeatherDiagnostic) -> Option<Box<dyn Fixer>> {
        match Self::patterns() {
            Ok((braces, words)) => Some(Box::new(Self { diagnostic: diagnostic.clone(), braces, words })),
            Err(e) => {
                debug!(id = %diagnostic.id, error = %e, "type annotation pattern does not compile");
                None
            }
        }
    }

    fn patterns() -> Result<(Regex, Regex), regex::Error> {
        Ok((Regex::new(r"\{([^{}\n]+)\}")?, Regex::new(r"[A-Za-z_][A-Za-z0-9_]*")?))
    }

    /// `{Array<Real>}` → `{array<real>}`. Unknown names and qualified names
    /// (`Struct.Player`, `Asset.GMSprite`) keep their spelling.
    fn normalize(&self, annotation: &str) -> String {
        self.words
            .replace_all(annotation, |caps: &regex::Captures| {
                let word = &caps[0];
                let qualified = caps.get(0).is_some_and(|m| annotation[m.end()..].starts_with('.'));
                if qualified {
                    return word.to_string();
                }
                let lower = word.to_ascii_lowercase();
                TYPE_NAMES
                    .iter()
                    .find(|(spelling, _)| *spelling == lower)
                    .map_or_else(|| word.to_string(), |(_, canonical)| canonical.to_string())
            })
            .into_owned()
    }
}

impl Fixer for DocCommentTypes {
    fn diagnostic(&self) -> &FeatherDiagnostic {
        &self.diagnostic
    }

    fn apply(&self, program: &mut Program, _ctx: &FixContext) -> Result<Vec<AppliedFix>, FixError> {
        let mut fixes = Vec::new();
        for comment in program.comments.iter_mut().filter(|c| c.kind == CommentKind::Doc) {
            // Doc comments run to the end of their line, so the text ends where the span does
            let text_start = comment.span.end.saturating_sub(comment.text.len() as u32);
            let mut edits = Vec::new();
            for caps in self.braces.captures_iter(&comment.text) {
                let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                let fixed = self.normalize(inner.as_str());
                if fixed != inner.as_str() {
                    edits.push((inner.range(), fixed, whole.start(), whole.end()));
                }
            }
            // Back to front so earlier ranges stay valid
            for (inner, fixed, start, end) in edits.into_iter().rev() {
                let original = comment.text[inner.clone()].to_string();
                comment.text.replace_range(inner, &fixed);
                let range = TextRange::new(text_start + start as u32, text_start + end as u32);
                let detail = self.detail().with_target(original).with_replacement(fixed).with_range(Some(range));
                fixes.push(match comment.attachment {
                    Some(attachment) => AppliedFix::new(detail, attachment.node),
                    None => AppliedFix::at_root(detail),
                });
            }
        }
        Ok(fixes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_fix, assert_no_fix, run_fixer};

    #[test]
    fn test_number_spellings() {
        assert_eq!(normalize_number(".5").as_deref(), Some("0.5"));
        assert_eq!(normalize_number("5.").as_deref(), Some("5.0"));
        assert_eq!(normalize_number("0X1F").as_deref(), Some("0x1F"));
        assert_eq!(normalize_number("0.5"), None);
        assert_eq!(normalize_number("$FF"), None);
    }

    #[test]
    fn test_malformed_numbers_rewritten() {
        let fixes = assert_fix("GM1029", "var half = .5;\nvar whole = 5.;", "var half = 0.5;\nvar whole = 5.0;");
        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].target.as_deref(), Some(".5"));
        assert_eq!(fixes[0].replacement.as_deref(), Some("0.5"));
    }

    #[test]
    fn test_wellformed_numbers_untouched() {
        assert_no_fix("GM1029", "x = 0.25 + 10 + $FF;");
    }

    #[test]
    fn test_doc_comment_types_normalised() {
        let source = "/// @param {String} name\n/// @param {Array<Real>} values\nfunction f(name, values) {}";
        let (program, fixes) = run_fixer("GM1062", source);
        let texts: Vec<_> = program.comments.iter().map(|c| c.text.trim().to_string()).collect();
        assert_eq!(texts, vec!["@param {string} name", "@param {array<real>} values"]);
        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].target.as_deref(), Some("String"));
        let start = source.find("{String}").unwrap() as u32;
        assert_eq!(fixes[0].range, Some(TextRange::new(start, start + 8)));
        assert_eq!(program.applied.for_node(program.body[0].id).len(), 2);
    }

    #[test]
    fn test_custom_types_and_plain_comments_kept() {
        let (_, fixes) = run_fixer("GM1062", "/// @param {Struct.Player} who\n// {String} not a doc comment\nf();");
        assert!(fixes.iter().all(|f| !f.automatic), "{:?}", fixes);
    }
}
