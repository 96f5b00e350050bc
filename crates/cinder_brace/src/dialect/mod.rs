//! The standard expression dialects.

mod expr;
mod path;
mod string;

use std::sync::Arc;

use cinder_runtime::{Expr, UnaryOp};
use cinder_template::{Dialect, DialectTable};

pub use expr::ExprDialect;
pub use path::PathDialect;
pub use string::StringDialect;

/// `exists: a/b`: true when the path resolves.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExistsDialect;

impl Dialect for ExistsDialect {
    fn translate(&self, source: &str) -> Result<Expr, String> {
        Ok(Expr::Exists(Box::new(path::parse_path(source)?)))
    }
}

/// `not: a/b`: the negated truthiness of a path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotDialect;

impl Dialect for NotDialect {
    fn translate(&self, source: &str) -> Result<Expr, String> {
        Ok(Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(path::parse_path(source)?),
        })
    }
}

/// Returns `path`, `string`, `expr`, `exists`, and `not`.
pub fn standard_dialects() -> DialectTable {
    let mut table = DialectTable::new();
    table.insert("path".to_string(), Arc::new(PathDialect) as Arc<dyn Dialect>);
    table.insert("string".to_string(), Arc::new(StringDialect));
    table.insert("expr".to_string(), Arc::new(ExprDialect));
    table.insert("exists".to_string(), Arc::new(ExistsDialect));
    table.insert("not".to_string(), Arc::new(NotDialect));
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exists_wraps_path() {
        let e = ExistsDialect.translate("user/email").unwrap();
        assert_eq!(e.to_string(), "exists(user/email)");
    }

    #[test]
    fn not_wraps_path() {
        let e = NotDialect.translate("items").unwrap();
        assert_eq!(e.to_string(), "not items");
    }

    #[test]
    fn standard_table() {
        let table = standard_dialects();
        let names: Vec<&str> = table.keys().map(String::as_str).collect();
        assert_eq!(names, ["exists", "expr", "not", "path", "string"]);
    }
}
