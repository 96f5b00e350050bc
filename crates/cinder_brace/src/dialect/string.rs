//! The `string` dialect: text with `$name` and `${path}` interpolation.

use cinder_runtime::Expr;
use cinder_template::Dialect;

use super::path::parse_path;

/// `Hello ${user/name}, you owe $$5`: literal text with interpolated paths.
/// `$$` is a literal dollar sign.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringDialect;

impl Dialect for StringDialect {
    fn translate(&self, source: &str) -> Result<Expr, String> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(i) = rest.find('$') {
            literal.push_str(&rest[..i]);
            let after = &rest[i + 1..];
            let (path, tail) = if let Some(tail) = after.strip_prefix('$') {
                literal.push('$');
                rest = tail;
                continue;
            } else if let Some(braced) = after.strip_prefix('{') {
                let end = braced
                    .find('}')
                    .ok_or_else(|| "unterminated `${`".to_string())?;
                (&braced[..end], &braced[end + 1..])
            } else {
                let end = after
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '/'))
                    .unwrap_or(after.len());
                let path = after[..end].trim_end_matches('/');
                if path.is_empty() {
                    return Err("`$` must be followed by a name, `{`, or `$`".to_string());
                }
                (path, &after[path.len()..])
            };

            if !literal.is_empty() {
                parts.push(Expr::lit(std::mem::take(&mut literal)));
            }
            parts.push(parse_path(path)?);
            rest = tail;
        }
        literal.push_str(rest);

        if parts.is_empty() {
            return Ok(Expr::lit(literal));
        }
        if !literal.is_empty() {
            parts.push(Expr::lit(literal));
        }
        Ok(Expr::Concat(parts))
    }
}
