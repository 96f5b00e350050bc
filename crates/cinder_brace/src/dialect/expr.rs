//! The `expr` dialect: a small expression language.
//!
//! Pratt parser. Binding powers, loosest first:
//!
//! | BP (L,R) | Operators |
//! |----------|-----------|
//! | (1,2)    | `or` `\|\|` |
//! | (3,4)    | `and` `&&` |
//! | prefix 5 | `not` `!` |
//! | (7,8)    | `==` `!=` `<` `<=` `>` `>=` |
//! | (9,10)   | `+` `-` |
//! | (11,12)  | `*` `/` `%` |
//! | prefix 13 | `-` |
//!
//! Postfix `.name` and `[literal]` access members; `name(args)` calls a global.

use cinder_common::Value;
use cinder_runtime::{BinOp, Expr, UnaryOp};
use cinder_template::Dialect;

/// Arithmetic, comparisons, boolean logic, member access, and global calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExprDialect;

impl Dialect for ExprDialect {
    fn translate(&self, source: &str) -> Result<Expr, String> {
        let tokens = tokenize(source)?;
        let mut parser = ExprParser { tokens, pos: 0 };
        let expr = parser.parse_expr_bp(0)?;
        match parser.peek() {
            Tok::Eof => Ok(expr),
            other => Err(format!("unexpected {} after expression", other.describe())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Eof,
}

impl Tok {
    fn describe(&self) -> String {
        match self {
            Tok::Int(i) => format!("`{i}`"),
            Tok::Float(f) => format!("`{f}`"),
            Tok::Str(s) => format!("{s:?}"),
            Tok::Ident(name) => format!("`{name}`"),
            Tok::Op(op) => format!("`{op}`"),
            Tok::LParen => "`(`".to_string(),
            Tok::RParen => "`)`".to_string(),
            Tok::LBracket => "`[`".to_string(),
            Tok::RBracket => "`]`".to_string(),
            Tok::Comma => "`,`".to_string(),
            Tok::Dot => "`.`".to_string(),
            Tok::Eof => "end of expression".to_string(),
        }
    }
}

const OPERATORS: [&str; 14] = [
    "==", "!=", "<=", ">=", "&&", "||", "<", ">", "+", "-", "*", "/", "%", "!",
];

fn tokenize(source: &str) -> Result<Vec<Tok>, String> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let rest = &source[start..];

        if c.is_ascii_digit() {
            let len = rest
                .find(|ch: char| !(ch.is_ascii_digit() || ch == '.'))
                .unwrap_or(rest.len());
            let text = &rest[..len];
            let tok = if text.contains('.') {
                Tok::Float(text.parse().map_err(|_| format!("invalid number `{text}`"))?)
            } else {
                Tok::Int(
                    text.parse()
                        .map_err(|_| format!("integer `{text}` is out of range"))?,
                )
            };
            tokens.push(tok);
            advance(&mut chars, len);
        } else if c.is_ascii_alphabetic() || c == '_' {
            let len = rest
                .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
                .unwrap_or(rest.len());
            tokens.push(Tok::Ident(rest[..len].to_string()));
            advance(&mut chars, len);
        } else if c == '"' || c == '\'' {
            chars.next();
            let mut text = String::new();
            loop {
                match chars.next() {
                    Some((_, ch)) if ch == c => break,
                    Some((_, '\\')) => match chars.next() {
                        Some((_, 'n')) => text.push('\n'),
                        Some((_, 't')) => text.push('\t'),
                        Some((_, other)) => text.push(other),
                        None => return Err("unterminated string literal".to_string()),
                    },
                    Some((_, ch)) => text.push(ch),
                    None => return Err("unterminated string literal".to_string()),
                }
            }
            tokens.push(Tok::Str(text));
        } else {
            let single = match c {
                '(' => Some(Tok::LParen),
                ')' => Some(Tok::RParen),
                '[' => Some(Tok::LBracket),
                ']' => Some(Tok::RBracket),
                ',' => Some(Tok::Comma),
                '.' => Some(Tok::Dot),
                _ => None,
            };
            if let Some(tok) = single {
                tokens.push(tok);
                chars.next();
                continue;
            }
            let op = OPERATORS
                .iter()
                .find(|op| rest.starts_with(**op))
                .ok_or_else(|| format!("unexpected character `{c}`"))?;
            tokens.push(Tok::Op(*op));
            advance(&mut chars, op.len());
        }
    }
    tokens.push(Tok::Eof);
    Ok(tokens)
}

/// Skips `len` bytes of ASCII input.
fn advance(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>, len: usize) {
    for _ in 0..len {
        chars.next();
    }
}

/// Binding power for binary operators. Returns (left_bp, right_bp).
fn infix_binding_power(tok: &Tok) -> Option<(BinOp, u8, u8)> {
    let op = match tok {
        Tok::Ident(word) if word == "or" => BinOp::Or,
        Tok::Ident(word) if word == "and" => BinOp::And,
        Tok::Op("||") => BinOp::Or,
        Tok::Op("&&") => BinOp::And,
        Tok::Op("==") => BinOp::Eq,
        Tok::Op("!=") => BinOp::Ne,
        Tok::Op("<") => BinOp::Lt,
        Tok::Op("<=") => BinOp::Le,
        Tok::Op(">") => BinOp::Gt,
        Tok::Op(">=") => BinOp::Ge,
        Tok::Op("+") => BinOp::Add,
        Tok::Op("-") => BinOp::Sub,
        Tok::Op("*") => BinOp::Mul,
        Tok::Op("/") => BinOp::Div,
        Tok::Op("%") => BinOp::Rem,
        _ => return None,
    };
    let (l, r) = match op {
        BinOp::Or => (1, 2),
        BinOp::And => (3, 4),
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => (7, 8),
        BinOp::Add | BinOp::Sub => (9, 10),
        BinOp::Mul | BinOp::Div | BinOp::Rem => (11, 12),
    };
    Some((op, l, r))
}

const NOT_BP: u8 = 5;
const NEG_BP: u8 = 13;

static EOF: Tok = Tok::Eof;

struct ExprParser {
    tokens: Vec<Tok>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> &Tok {
        self.tokens.get(self.pos).unwrap_or(&EOF)
    }

    fn bump(&mut self) -> Tok {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, want: Tok) -> Result<(), String> {
        let got = self.bump();
        if got == want {
            Ok(())
        } else {
            Err(format!("expected {}, found {}", want.describe(), got.describe()))
        }
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr, String> {
        let mut lhs = self.parse_prefix()?;
        loop {
            lhs = match self.peek() {
                Tok::Dot => {
                    self.bump();
                    match self.bump() {
                        Tok::Ident(name) => member(lhs, name),
                        other => return Err(format!("expected a member name, found {}", other.describe())),
                    }
                }
                Tok::LBracket => {
                    self.bump();
                    let name = match self.bump() {
                        Tok::Int(i) => i.to_string(),
                        Tok::Str(s) => s,
                        other => {
                            return Err(format!(
                                "subscripts must be literals, found {}",
                                other.describe()
                            ))
                        }
                    };
                    self.expect(Tok::RBracket)?;
                    member(lhs, name)
                }
                tok => {
                    let Some((op, l_bp, r_bp)) = infix_binding_power(tok) else {
                        break;
                    };
                    if l_bp < min_bp {
                        break;
                    }
                    self.bump();
                    let rhs = self.parse_expr_bp(r_bp)?;
                    Expr::binary(op, lhs, rhs)
                }
            };
        }
        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr, String> {
        match self.bump() {
            Tok::Int(i) => Ok(Expr::lit(i)),
            Tok::Float(f) => Ok(Expr::lit(f)),
            Tok::Str(s) => Ok(Expr::lit(s)),
            Tok::Ident(word) => match word.as_str() {
                "true" => Ok(Expr::lit(true)),
                "false" => Ok(Expr::lit(false)),
                "null" => Ok(Expr::Literal(Value::Null)),
                "not" => Ok(unary(UnaryOp::Not, self.parse_expr_bp(NOT_BP)?)),
                "and" | "or" => Err(format!("unexpected `{word}`")),
                _ if self.peek() == &Tok::LParen => {
                    self.bump();
                    let args = self.parse_call_args()?;
                    Ok(Expr::Call {
                        function: word,
                        args,
                    })
                }
                _ => Ok(Expr::Var(word)),
            },
            Tok::Op("!") => Ok(unary(UnaryOp::Not, self.parse_expr_bp(NOT_BP)?)),
            Tok::Op("-") => Ok(unary(UnaryOp::Neg, self.parse_expr_bp(NEG_BP)?)),
            Tok::LParen => {
                let inner = self.parse_expr_bp(0)?;
                self.expect(Tok::RParen)?;
                Ok(inner)
            }
            other => Err(format!("expected an expression, found {}", other.describe())),
        }
    }

    /// Parses arguments after the opening parenthesis, through the closing one.
    fn parse_call_args(&mut self) -> Result<Vec<Expr>, String> {
        let mut args = Vec::new();
        if self.peek() == &Tok::RParen {
            self.bump();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr_bp(0)?);
            match self.bump() {
                Tok::Comma => {}
                Tok::RParen => return Ok(args),
                other => return Err(format!("expected `,` or `)`, found {}", other.describe())),
            }
        }
    }
}

fn member(base: Expr, name: String) -> Expr {
    Expr::Member {
        base: Box::new(base),
        name,
    }
}

fn unary(op: UnaryOp, operand: Expr) -> Expr {
    Expr::Unary {
        op,
        operand: Box::new(operand),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> String {
        ExprDialect.translate(src).unwrap().to_string()
    }

    #[test]
    fn literals_and_names() {
        assert_eq!(parse("42"), "42");
        assert_eq!(parse("2.5"), "2.5");
        assert_eq!(parse("'hi'"), "\"hi\"");
        assert_eq!(parse("name"), "name");
        assert_eq!(ExprDialect.translate("null").unwrap(), Expr::Literal(Value::Null));
    }

    #[test]
    fn precedence_add_mul() {
        assert_eq!(parse("a + b * c"), "(a + (b * c))");
        assert_eq!(parse("(a + b) * c"), "((a + b) * c)");
        assert_eq!(parse("a - b - c"), "((a - b) - c)");
    }

    #[test]
    fn precedence_logic_vs_comparison() {
        assert_eq!(parse("a < b and c or d"), "(((a < b) and c) or d)");
        assert_eq!(parse("a || b && c"), "(a or (b and c))");
    }

    #[test]
    fn not_binds_looser_than_comparison() {
        assert_eq!(parse("not a == b"), "not (a == b)");
        assert_eq!(parse("!a and b"), "(not a and b)");
    }

    #[test]
    fn unary_minus() {
        assert_eq!(parse("-a * b"), "(-a * b)");
    }

    #[test]
    fn member_and_subscript() {
        assert_eq!(parse("user.address.city"), "user/address/city");
        assert_eq!(parse("items[0]"), "items/0");
        assert_eq!(parse("m['key']"), "m/key");
    }

    #[test]
    fn calls() {
        assert_eq!(parse("upper(name)"), "upper(name)");
        assert_eq!(parse("default(x, 'n/a')"), "default(x, \"n/a\")");
        assert_eq!(parse("f()"), "f()");
        assert_eq!(parse("len(items) > 0"), "(len(items) > 0)");
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            ExprDialect.translate(r#""a\"b""#).unwrap(),
            Expr::lit("a\"b")
        );
    }

    #[test]
    fn errors() {
        for bad in ["", "a +", "(a", "a b", "f(a,", "x[y]", "'open", "a $ b", "and"] {
            assert!(ExprDialect.translate(bad).is_err(), "{bad:?} should fail");
        }
    }
}
