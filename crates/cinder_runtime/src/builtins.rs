//! Registry of native symbols that generated programs may reference.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use cinder_common::Value;

use crate::error::{ExecError, ExecErrorKind};

/// A native function callable from generated code.
pub type NativeFn = Arc<dyn Fn(&[Value]) -> Result<Value, ExecError> + Send + Sync>;

/// Native symbols available to every render.
///
/// An artifact's globals table maps local names to symbol names in this
/// registry; symbols are resolved at call time, so artifacts stay plain data.
/// Builtin values (such as `nothing`) are visible as variables of last resort.
#[derive(Clone)]
pub struct Builtins {
    functions: BTreeMap<String, NativeFn>,
    values: BTreeMap<String, Value>,
}

impl Builtins {
    /// Creates a registry holding only the `nothing` value.
    pub fn new() -> Self {
        let mut values = BTreeMap::new();
        values.insert("nothing".to_string(), Value::Null);
        Self {
            functions: BTreeMap::new(),
            values,
        }
    }

    /// Creates a registry with the standard string and collection helpers:
    /// `upper`, `lower`, `len`, `str`, and `default`.
    pub fn standard() -> Self {
        let mut b = Self::new();
        b.register("upper", |args| {
            let [v] = expect_args::<1>("upper", args)?;
            Ok(Value::Str(v.to_string().to_uppercase()))
        });
        b.register("lower", |args| {
            let [v] = expect_args::<1>("lower", args)?;
            Ok(Value::Str(v.to_string().to_lowercase()))
        });
        b.register("str", |args| {
            let [v] = expect_args::<1>("str", args)?;
            Ok(Value::Str(v.to_string()))
        });
        b.register("len", |args| {
            let [v] = expect_args::<1>("len", args)?;
            let n = match v {
                Value::Str(s) => s.chars().count(),
                Value::List(items) => items.len(),
                Value::Map(entries) => entries.len(),
                other => {
                    return Err(ExecError::raised(format!(
                        "object of type {} has no len()",
                        other.type_name()
                    )))
                }
            };
            Ok(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
        });
        b.register("default", |args| {
            let [v, fallback] = expect_args::<2>("default", args)?;
            Ok(if v.is_truthy() {
                v.clone()
            } else {
                fallback.clone()
            })
        });
        b
    }

    /// Registers a native function under a symbol name.
    pub fn register<F>(&mut self, symbol: impl Into<String>, f: F)
    where
        F: Fn(&[Value]) -> Result<Value, ExecError> + Send + Sync + 'static,
    {
        self.functions.insert(symbol.into(), Arc::new(f));
    }

    /// Defines a builtin value visible to every render.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Looks up a native function by symbol name.
    pub fn function(&self, symbol: &str) -> Option<&NativeFn> {
        self.functions.get(symbol)
    }

    /// Looks up a builtin value by name.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Builtins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtins")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("values", &self.values)
            .finish()
    }
}

/// Checks the argument count of a native call.
fn expect_args<'a, const N: usize>(
    function: &str,
    args: &'a [Value],
) -> Result<&'a [Value; N], ExecError> {
    args.try_into().map_err(|_| {
        ExecError::new(ExecErrorKind::Arity {
            function: function.to_string(),
            expected: N,
            got: args.len(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(b: &Builtins, symbol: &str, args: &[Value]) -> Result<Value, ExecError> {
        (b.function(symbol).unwrap())(args)
    }

    #[test]
    fn new_has_nothing() {
        let b = Builtins::new();
        assert_eq!(b.value("nothing"), Some(&Value::Null));
        assert!(b.function("upper").is_none());
    }

    #[test]
    fn standard_functions() {
        let b = Builtins::standard();
        assert_eq!(
            call(&b, "upper", &[Value::from("abc")]).unwrap(),
            Value::from("ABC")
        );
        assert_eq!(
            call(&b, "len", &[Value::from(vec![Value::Null, Value::Null])]).unwrap(),
            Value::from(2)
        );
        assert_eq!(
            call(&b, "default", &[Value::Null, Value::from("n/a")]).unwrap(),
            Value::from("n/a")
        );
    }

    #[test]
    fn arity_checked() {
        let b = Builtins::standard();
        let err = call(&b, "upper", &[]).unwrap_err();
        assert_eq!(
            err.kind,
            ExecErrorKind::Arity {
                function: "upper".to_string(),
                expected: 1,
                got: 0
            }
        );
    }

    #[test]
    fn len_rejects_scalars() {
        let b = Builtins::standard();
        let err = call(&b, "len", &[Value::from(3)]).unwrap_err();
        assert!(matches!(err.kind, ExecErrorKind::Raised(_)));
    }

    #[test]
    fn register_and_define() {
        let mut b = Builtins::new();
        b.register("answer", |_| Ok(Value::from(42)));
        b.define("site", Value::from("cinder"));
        assert_eq!(call(&b, "answer", &[]).unwrap(), Value::from(42));
        assert_eq!(b.value("site"), Some(&Value::from("cinder")));
    }
}
