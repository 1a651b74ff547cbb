//! Inline content rendering.

use super::Inline;

/// Render inline content to plain text.
///
/// Cross-references render as their label, falling back to the anchor id;
/// anchors render as nothing.
pub fn render_text(content: &[Inline]) -> String {
    let mut out = String::new();
    push_text(content, &mut out, false);
    out.trim().to_string()
}

/// Render inline content for the expression parsers.
///
/// Cross-references are kept as `<<id>>` / `<<id,label>>` markers, which the
/// expression lexer turns back into a single reference token.
pub fn render_expression_text(content: &[Inline]) -> String {
    let mut out = String::new();
    push_text(content, &mut out, true);
    out.trim().to_string()
}

fn push_text(content: &[Inline], out: &mut String, keep_references: bool) {
    for inline in content {
        match inline {
            Inline::Text(text) => out.push_str(text),
            Inline::CrossReference(xref) if keep_references => {
                out.push_str(&xref.to_string());
            }
            Inline::CrossReference(xref) => match &xref.label {
                Some(label) => out.push_str(label),
                None => out.push_str(&xref.id),
            },
            Inline::Anchor { .. } => {}
            Inline::Formatted(inner) => push_text(inner, out, keep_references),
        }
    }
}
