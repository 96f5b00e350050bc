//! The `path` dialect: `name/member/member` traversal.

use cinder_runtime::Expr;
use cinder_template::Dialect;

/// `user/address/city`: a variable followed by map keys or list indexes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathDialect;

impl Dialect for PathDialect {
    fn translate(&self, source: &str) -> Result<Expr, String> {
        parse_path(source)
    }
}

pub(crate) fn parse_path(source: &str) -> Result<Expr, String> {
    let source = source.trim();
    let mut segments = source.split('/');
    let root = segments.next().unwrap_or_default();
    let starts_ok = root
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !starts_ok || !root.chars().all(is_segment_char) {
        return Err(format!("`{root}` is not a valid path root"));
    }

    let mut expr = Expr::var(root);
    for segment in segments {
        if segment.is_empty() || !segment.chars().all(is_segment_char) {
            return Err(format!("`{segment}` is not a valid path segment"));
        }
        expr = Expr::Member {
            base: Box::new(expr),
            name: segment.to_string(),
        };
    }
    Ok(expr)
}

fn is_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}
