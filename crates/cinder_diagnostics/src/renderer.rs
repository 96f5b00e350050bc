//! Rustc-style rendering of errors located in a template body.

use crate::source_text::SourceText;

/// Renders an error at a template location with the offending source line.
///
/// Produces output like:
/// ```text
/// error: unterminated construct
///   --> page.pt:3:5
///    |
///  3 | <p>{name</p>
///    |     ^
/// ```
///
/// When `line` is out of range only the header and location are emitted.
pub fn render_excerpt(
    source: &SourceText<'_>,
    origin: &str,
    line: u32,
    col: u32,
    message: &str,
) -> String {
    let mut out = format!("error: {message}\n");
    out.push_str(&format!("  --> {origin}:{line}:{col}\n"));

    if let Some(text) = source.line(line) {
        let line_num = format!("{line}");
        let padding = " ".repeat(line_num.len());
        let col_padding = " ".repeat((col as usize).saturating_sub(1));
        out.push_str(&format!("{padding} |\n"));
        out.push_str(&format!("{line_num} | {text}\n"));
        out.push_str(&format!("{padding} | {col_padding}^\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_with_caret() {
        let source = SourceText::new("<h1>{title}</h1>\n<p>{name</p>\n");
        let out = render_excerpt(&source, "page.pt", 2, 4, "unterminated construct");
        assert!(out.contains("error: unterminated construct"));
        assert!(out.contains("--> page.pt:2:4"));
        assert!(out.contains("2 | <p>{name</p>"));
        assert!(out.contains("\n |    ^\n"));
    }

    #[test]
    fn render_out_of_range_line() {
        let source = SourceText::new("one line");
        let out = render_excerpt(&source, "inline", 9, 1, "bad");
        assert!(out.contains("--> inline:9:1"));
        assert!(!out.contains(" | "));
    }
}
