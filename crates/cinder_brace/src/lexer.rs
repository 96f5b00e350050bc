//! Splits a template body into literal text and `{...}` constructs.

use cinder_diagnostics::SourceText;
use cinder_template::CompileError;

/// A `{...}` construct in the body.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Construct {
    /// The construct exactly as written, braces included.
    pub source: String,
    /// The trimmed text between the braces.
    pub inner: String,
    /// Byte offset of the opening brace.
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment {
    Text(String),
    Construct(Construct),
}

/// Builds a compile error located at a byte offset of `body`.
pub(crate) fn error_at(body: &str, offset: usize, message: impl Into<String>) -> CompileError {
    let (line, col) = SourceText::new(body).line_col(offset as u32);
    CompileError::at(message, line, col)
}

/// Lexes the body. Inside a construct, quotes may contain braces and
/// balanced braces nest, so `{string: ${name}}` is one construct.
pub(crate) fn lex(body: &str) -> Result<Vec<Segment>, CompileError> {
    let bytes = body.as_bytes();
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let next = bytes.get(pos + 1).copied();
        match bytes[pos] {
            b'{' if next == Some(b'{') => {
                text.push('{');
                pos += 2;
            }
            b'}' if next == Some(b'}') => {
                text.push('}');
                pos += 2;
            }
            b'{' => {
                let end = construct_end(bytes, pos)
                    .ok_or_else(|| error_at(body, pos, "unterminated construct"))?;
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Construct(Construct {
                    source: body[pos..=end].to_string(),
                    inner: body[pos + 1..end].trim().to_string(),
                    offset: pos,
                }));
                pos = end + 1;
            }
            b'}' => return Err(error_at(body, pos, "unmatched `}`; write `}}` for a literal brace")),
            _ => {
                let stop = body[pos..]
                    .find(['{', '}'])
                    .map_or(bytes.len(), |i| pos + i);
                text.push_str(&body[pos..stop]);
                pos = stop;
            }
        }
    }

    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    Ok(segments)
}

/// Finds the closing brace of the construct opened at `start`.
fn construct_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    let mut depth = 0usize;
    let mut i = start + 1;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(_) if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'}' && depth == 0 => return Some(i),
            None if b == b'}' => depth -= 1,
            None if b == b'{' => depth += 1,
            None => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn construct(seg: &Segment) -> &Construct {
        match seg {
            Segment::Construct(c) => c,
            other => panic!("expected construct, got {other:?}"),
        }
    }

    #[test]
    fn text_and_constructs() {
        let segs = lex("Hello {name}!").unwrap();
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[0], Segment::Text("Hello ".to_string()));
        let c = construct(&segs[1]);
        assert_eq!(c.source, "{name}");
        assert_eq!(c.inner, "name");
        assert_eq!(c.offset, 6);
        assert_eq!(segs[2], Segment::Text("!".to_string()));
    }

    #[test]
    fn escaped_braces() {
        let segs = lex("{{literal}} {x}").unwrap();
        assert_eq!(segs[0], Segment::Text("{literal} ".to_string()));
        assert_eq!(construct(&segs[1]).inner, "x");
    }

    #[test]
    fn quotes_may_hold_braces() {
        let segs = lex(r#"{expr: upper("}")}"#).unwrap();
        assert_eq!(segs.len(), 1);
        assert_eq!(construct(&segs[0]).inner, r#"expr: upper("}")"#);
    }

    #[test]
    fn multibyte_text() {
        let segs = lex("héllo {x} wörld").unwrap();
        assert_eq!(segs[0], Segment::Text("héllo ".to_string()));
        assert_eq!(segs[2], Segment::Text(" wörld".to_string()));
    }

    #[test]
    fn unterminated_is_located() {
        let err = lex("line one\n  {name").unwrap_err();
        assert_eq!(err.line, Some(2));
        assert_eq!(err.col, Some(3));
    }

    #[test]
    fn balanced_braces_nest() {
        let segs = lex("{string: Hi ${name}}!").unwrap();
        assert_eq!(construct(&segs[0]).inner, "string: Hi ${name}");
        assert_eq!(segs[1], Segment::Text("!".to_string()));
    }

    #[test]
    fn nested_open_brace_is_unterminated() {
        let err = lex("{a {b}").unwrap_err();
        assert_eq!(err.message, "unterminated construct");
    }

    #[test]
    fn stray_close_brace() {
        let err = lex("a } b").unwrap_err();
        assert_eq!(err.col, Some(3));
    }
}
