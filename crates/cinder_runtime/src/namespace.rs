//! The name-resolution environment a program executes against.

use std::collections::BTreeMap;

use cinder_common::{Value, Variables};

use crate::builtins::{Builtins, NativeFn};

/// Mapping from a global's local name (as used in generated code) to the
/// symbol it resolves to in [`Builtins`].
pub type GlobalsTable = BTreeMap<String, String>;

/// Variables, declared globals, and builtins visible to one render.
pub struct Namespace<'a> {
    variables: &'a Variables,
    globals: &'a GlobalsTable,
    builtins: &'a Builtins,
}

impl<'a> Namespace<'a> {
    /// Creates a namespace from render variables, an artifact's globals
    /// table, and the builtin registry.
    pub fn new(variables: &'a Variables, globals: &'a GlobalsTable, builtins: &'a Builtins) -> Self {
        Self {
            variables,
            globals,
            builtins,
        }
    }

    /// Resolves a variable: render variables shadow builtin values.
    pub fn variable(&self, name: &str) -> Option<&'a Value> {
        self.variables
            .get(name)
            .or_else(|| self.builtins.value(name))
    }

    /// Resolves a global function by its local name.
    ///
    /// Returns `None` when the artifact does not declare the name or the
    /// declared symbol is not registered.
    pub fn global(&self, local: &str) -> Option<&'a NativeFn> {
        let symbol = self.globals.get(local)?;
        self.builtins.function(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_shadow_builtin_values() {
        let mut vars = Variables::new();
        vars.insert("nothing".to_string(), Value::from("shadowed"));
        let globals = GlobalsTable::new();
        let builtins = Builtins::new();
        let ns = Namespace::new(&vars, &globals, &builtins);
        assert_eq!(ns.variable("nothing"), Some(&Value::from("shadowed")));
    }

    #[test]
    fn builtin_value_fallback() {
        let vars = Variables::new();
        let globals = GlobalsTable::new();
        let builtins = Builtins::new();
        let ns = Namespace::new(&vars, &globals, &builtins);
        assert_eq!(ns.variable("nothing"), Some(&Value::Null));
        assert_eq!(ns.variable("missing"), None);
    }

    #[test]
    fn globals_resolve_through_table() {
        let vars = Variables::new();
        let mut globals = GlobalsTable::new();
        globals.insert("up".to_string(), "upper".to_string());
        let builtins = Builtins::standard();
        let ns = Namespace::new(&vars, &globals, &builtins);
        assert!(ns.global("up").is_some());
        // Registered symbol, but not declared by the artifact.
        assert!(ns.global("upper").is_none());
    }
}
