//! Builds the construct tree from lexed segments.

use std::collections::BTreeMap;

use cinder_common::Value;
use cinder_template::CompileError;

use crate::lexer::{error_at, lex, Construct, Segment};

/// An expression as written: optional dialect prefix plus its text.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExprSource {
    pub dialect: Option<String>,
    pub text: String,
}

impl ExprSource {
    /// Splits a leading `dialect:` prefix off `src`.
    fn parse(src: &str) -> Self {
        if let Some((prefix, rest)) = src.split_once(':') {
            let prefix = prefix.trim();
            let is_name = prefix
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic())
                && prefix
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            if is_name {
                return Self {
                    dialect: Some(prefix.to_string()),
                    text: rest.trim().to_string(),
                };
            }
        }
        Self {
            dialect: None,
            text: src.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Emit {
        expr: ExprSource,
        structure: bool,
        at: Construct,
    },
    If {
        cond: ExprSource,
        then: Vec<Node>,
        otherwise: Vec<Node>,
        at: Construct,
    },
    Let {
        name: String,
        expr: ExprSource,
        at: Construct,
    },
    Select {
        name: String,
        value: Value,
    },
}

/// A parsed template: the main body and its macros.
#[derive(Debug, Default)]
pub(crate) struct Document {
    pub main: Vec<Node>,
    pub macros: BTreeMap<String, Vec<Node>>,
}

/// Block-closing constructs.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Closer {
    Else,
    EndIf,
    EndMacro,
}

pub(crate) fn parse(body: &str) -> Result<Document, CompileError> {
    let mut parser = Parser {
        body,
        segments: lex(body)?.into_iter(),
    };
    let mut doc = Document::default();
    let (main, closer) = parser.parse_block(&mut doc, true)?;
    if let Some((_, at)) = closer {
        return Err(parser.error(&at, format!("`{}` without a matching opener", at.source)));
    }
    doc.main = main;
    Ok(doc)
}

struct Parser<'a> {
    body: &'a str,
    segments: std::vec::IntoIter<Segment>,
}

impl Parser<'_> {
    fn error(&self, at: &Construct, message: impl Into<String>) -> CompileError {
        error_at(self.body, at.offset, message)
    }

    /// Parses nodes until end of input or a closing construct, which is returned.
    fn parse_block(
        &mut self,
        doc: &mut Document,
        top_level: bool,
    ) -> Result<(Vec<Node>, Option<(Closer, Construct)>), CompileError> {
        let mut nodes = Vec::new();
        while let Some(segment) = self.segments.next() {
            let at = match segment {
                Segment::Text(text) => {
                    nodes.push(Node::Text(text));
                    continue;
                }
                Segment::Construct(at) => at,
            };

            let inner = at.inner.clone();
            match inner.as_str() {
                "#else" => return Ok((nodes, Some((Closer::Else, at)))),
                "/if" => return Ok((nodes, Some((Closer::EndIf, at)))),
                "/macro" => return Ok((nodes, Some((Closer::EndMacro, at)))),
                _ => {}
            }

            if let Some(cond) = inner.strip_prefix("#if ") {
                nodes.push(self.parse_if(doc, cond, at)?);
            } else if let Some(rest) = inner.strip_prefix("#macro ") {
                self.parse_macro(doc, rest.trim(), &at, top_level)?;
            } else if let Some(rest) = inner.strip_prefix("#let ") {
                let (name, expr) = self.split_name(rest, &at)?;
                nodes.push(Node::Let {
                    name,
                    expr: ExprSource::parse(expr),
                    at,
                });
            } else if let Some(rest) = inner.strip_prefix("#select ") {
                let (name, literal) = self.split_name(rest, &at)?;
                nodes.push(Node::Select {
                    name,
                    value: parse_literal(literal),
                });
            } else if inner.starts_with('#') || inner.starts_with('/') {
                return Err(self.error(&at, format!("unknown directive `{}`", at.source)));
            } else if let Some(rest) = inner.strip_prefix("structure ") {
                nodes.push(Node::Emit {
                    expr: ExprSource::parse(rest),
                    structure: true,
                    at,
                });
            } else if inner.is_empty() {
                return Err(self.error(&at, "empty construct"));
            } else {
                nodes.push(Node::Emit {
                    expr: ExprSource::parse(&inner),
                    structure: false,
                    at,
                });
            }
        }
        Ok((nodes, None))
    }

    fn parse_if(&mut self, doc: &mut Document, cond: &str, at: Construct) -> Result<Node, CompileError> {
        let (then, closer) = self.parse_block(doc, false)?;
        let otherwise = match closer {
            Some((Closer::EndIf, _)) => Vec::new(),
            Some((Closer::Else, _)) => match self.parse_block(doc, false)? {
                (otherwise, Some((Closer::EndIf, _))) => otherwise,
                _ => return Err(self.error(&at, "`{#if}` is missing its `{/if}`")),
            },
            Some((Closer::EndMacro, end)) => {
                return Err(self.error(&end, "`{/macro}` closes an open `{#if}`"))
            }
            None => return Err(self.error(&at, "`{#if}` is missing its `{/if}`")),
        };
        Ok(Node::If {
            cond: ExprSource::parse(cond),
            then,
            otherwise,
            at,
        })
    }

    fn parse_macro(
        &mut self,
        doc: &mut Document,
        name: &str,
        at: &Construct,
        top_level: bool,
    ) -> Result<(), CompileError> {
        if !top_level {
            return Err(self.error(at, "macros must be defined at the top level"));
        }
        if !is_identifier(name) {
            return Err(self.error(at, format!("invalid macro name `{name}`")));
        }
        let body = match self.parse_block(doc, false)? {
            (body, Some((Closer::EndMacro, _))) => body,
            _ => return Err(self.error(at, format!("macro `{name}` is missing its `{{/macro}}`"))),
        };
        if doc.macros.insert(name.to_string(), body).is_some() {
            return Err(self.error(at, format!("macro `{name}` is defined twice")));
        }
        Ok(())
    }

    fn split_name<'s>(&self, rest: &'s str, at: &Construct) -> Result<(String, &'s str), CompileError> {
        let rest = rest.trim();
        let (name, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        if !is_identifier(name) || tail.trim().is_empty() {
            return Err(self.error(at, format!("expected `name value` in `{}`", at.source)));
        }
        Ok((name.to_string(), tail.trim()))
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parses a selector literal: a number, boolean, `null`, a quoted string, or
/// else the bare text as a string.
fn parse_literal(src: &str) -> Value {
    match src {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }
    if let Ok(i) = src.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = src.parse::<f64>() {
        return Value::Float(f);
    }
    for q in ['"', '\''] {
        if let Some(inner) = src.strip_prefix(q).and_then(|s| s.strip_suffix(q)) {
            return Value::from(inner);
        }
    }
    Value::from(src)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(dialect: Option<&str>, text: &str) -> ExprSource {
        ExprSource {
            dialect: dialect.map(str::to_string),
            text: text.to_string(),
        }
    }

    #[test]
    fn dialect_prefix() {
        assert_eq!(ExprSource::parse("user/name"), expr(None, "user/name"));
        assert_eq!(ExprSource::parse("expr: a + 1"), expr(Some("expr"), "a + 1"));
        assert_eq!(ExprSource::parse("string:Hi $name"), expr(Some("string"), "Hi $name"));
        // Not a name before the colon.
        assert_eq!(ExprSource::parse("'a:b'"), expr(None, "'a:b'"));
    }

    #[test]
    fn emit_and_structure() {
        let doc = parse("{name}{structure html}").unwrap();
        assert!(matches!(&doc.main[0], Node::Emit { structure: false, .. }));
        assert!(matches!(&doc.main[1], Node::Emit { structure: true, expr, .. } if expr.text == "html"));
    }

    #[test]
    fn if_else() {
        let doc = parse("{#if ok}yes{#else}no{/if}").unwrap();
        match &doc.main[0] {
            Node::If { cond, then, otherwise, .. } => {
                assert_eq!(cond.text, "ok");
                assert_eq!(then, &vec![Node::Text("yes".to_string())]);
                assert_eq!(otherwise, &vec![Node::Text("no".to_string())]);
            }
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn macros_are_separated() {
        let doc = parse("main{#macro head}<h1>{title}</h1>{/macro}").unwrap();
        assert_eq!(doc.main, vec![Node::Text("main".to_string())]);
        assert_eq!(doc.macros["head"].len(), 3);
    }

    #[test]
    fn let_and_select() {
        let doc = parse("{#let total expr: a + b}{#select lang \"en\"}{#select n 3}").unwrap();
        assert!(matches!(&doc.main[0], Node::Let { name, expr, .. } if name == "total" && expr.dialect.as_deref() == Some("expr")));
        assert_eq!(
            doc.main[1],
            Node::Select {
                name: "lang".to_string(),
                value: Value::from("en")
            }
        );
        assert_eq!(
            doc.main[2],
            Node::Select {
                name: "n".to_string(),
                value: Value::from(3)
            }
        );
    }

    #[test]
    fn unclosed_if_is_located() {
        let err = parse("a\n{#if x}b").unwrap_err();
        assert_eq!(err.line, Some(2));
    }

    #[test]
    fn stray_closer() {
        assert!(parse("{/if}").is_err());
        assert!(parse("{#else}").is_err());
    }

    #[test]
    fn nested_macro_rejected() {
        assert!(parse("{#if x}{#macro m}{/macro}{/if}").is_err());
    }

    #[test]
    fn duplicate_macro_rejected() {
        let err = parse("{#macro m}a{/macro}{#macro m}b{/macro}").unwrap_err();
        assert!(err.message.contains("defined twice"));
    }

    #[test]
    fn unknown_directive() {
        let err = parse("{#for x}").unwrap_err();
        assert!(err.message.contains("unknown directive"));
    }

    #[test]
    fn literals() {
        assert_eq!(parse_literal("true"), Value::Bool(true));
        assert_eq!(parse_literal("2.5"), Value::Float(2.5));
        assert_eq!(parse_literal("'x y'"), Value::from("x y"));
        assert_eq!(parse_literal("bare"), Value::from("bare"));
    }
}
