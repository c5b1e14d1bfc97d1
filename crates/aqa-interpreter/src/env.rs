//! Environments: nested scopes with mutable bindings, write-once constants
//! and attached modules for delegated lookup.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::value::{Module, Value};

/// Shared handle to an environment. Enclosed environments and subroutine
/// values hold the same handle to their defining scope, which is what makes
/// closures over module-level bindings work.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical scope. A name lives in at most one of `store` and `constants`
/// at the same scope level; attached modules are consulted only after local
/// and outer lookup both fail, and only for their exposed names.
#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Value>,
    constants: HashMap<String, Value>,
    outer: Option<EnvRef>,
    modules: Vec<Rc<Module>>,
}

impl Environment {
    /// Creates a fresh root environment.
    pub fn new() -> EnvRef {
        Rc::new(RefCell::new(Environment::default()))
    }

    /// Creates an environment enclosed in `outer`; used for subroutine call
    /// frames. Loop bodies do not get one: they run in the enclosing scope.
    pub fn new_enclosed(outer: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            outer: Some(Rc::clone(outer)),
            ..Environment::default()
        }))
    }

    /// Looks a name up: store, then constants, then the outer chain, then
    /// attached modules in insertion order.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.store.get(name) {
            return Some(value.clone());
        }
        if let Some(value) = self.constants.get(name) {
            return Some(value.clone());
        }
        if let Some(outer) = &self.outer {
            if let Some(value) = outer.borrow().get(name) {
                return Some(value);
            }
        }
        for module in &self.modules {
            if module.exposed.contains(name) {
                if let Some(value) = module.env.borrow().get(name) {
                    return Some(value);
                }
            }
        }
        None
    }

    /// Writes a mutable binding at this scope. Never mutates a parent scope,
    /// so assignments inside subroutine bodies shadow instead.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), String> {
        if self.constants.contains_key(name) {
            return Err(format!("cannot assign to constant: {}", name));
        }

        self.store.insert(name.to_string(), value);
        Ok(())
    }

    /// Adds a write-once constant at this scope. An existing mutable binding
    /// of the same name is displaced so the name lives in exactly one table.
    pub fn set_constant(&mut self, name: &str, value: Value) -> Result<(), String> {
        if self.constants.contains_key(name) {
            return Err(format!("cannot assign to constant: {}", name));
        }

        self.store.remove(name);
        self.constants.insert(name.to_string(), value);
        Ok(())
    }

    /// Attaches a module for delegated lookup. Modules can never shadow
    /// local bindings; they are consulted last.
    pub fn add_module(&mut self, module: Rc<Module>) {
        self.modules.push(module);
    }

    /// Every name bound at this scope (store and constants). Used to expose
    /// a freshly imported file's contents.
    pub fn names(&self) -> HashSet<String> {
        self.store
            .keys()
            .chain(self.constants.keys())
            .cloned()
            .collect()
    }

    /// Name/value snapshot of this scope, for the REPL's `:vars`.
    pub fn snapshot(&self) -> Vec<(String, Value)> {
        self.store
            .iter()
            .chain(self.constants.iter())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_round_trip() {
        let env = Environment::new();
        env.borrow_mut().set("a", Value::Int(1)).unwrap();
        assert_eq!(env.borrow().get("a"), Some(Value::Int(1)));
        assert_eq!(env.borrow().get("missing"), None);
    }

    #[test]
    fn constants_are_write_once_per_scope() {
        let env = Environment::new();
        env.borrow_mut().set_constant("pi", Value::Float(3.14)).unwrap();

        assert!(env.borrow_mut().set_constant("pi", Value::Int(3)).is_err());
        assert!(env.borrow_mut().set("pi", Value::Int(3)).is_err());
        assert_eq!(env.borrow().get("pi"), Some(Value::Float(3.14)));
    }

    #[test]
    fn inner_scopes_shadow_without_mutating_the_parent() {
        let outer = Environment::new();
        outer.borrow_mut().set("a", Value::Int(1)).unwrap();

        let inner = Environment::new_enclosed(&outer);
        assert_eq!(inner.borrow().get("a"), Some(Value::Int(1)));

        inner.borrow_mut().set("a", Value::Int(2)).unwrap();
        assert_eq!(inner.borrow().get("a"), Some(Value::Int(2)));
        assert_eq!(outer.borrow().get("a"), Some(Value::Int(1)));
    }

    #[test]
    fn modules_resolve_only_exposed_names() {
        let module_env = Environment::new();
        module_env.borrow_mut().set("visible", Value::Int(1)).unwrap();
        module_env.borrow_mut().set("hidden", Value::Int(2)).unwrap();

        let module = Rc::new(Module {
            env: module_env,
            exposed: ["visible".to_string()].into_iter().collect(),
            path: "lib.aqa".into(),
            is_builtin: false,
        });

        let env = Environment::new();
        env.borrow_mut().add_module(module);

        assert_eq!(env.borrow().get("visible"), Some(Value::Int(1)));
        assert_eq!(env.borrow().get("hidden"), None);
    }

    #[test]
    fn local_bindings_shadow_modules() {
        let module_env = Environment::new();
        module_env.borrow_mut().set("x", Value::Int(10)).unwrap();

        let module = Rc::new(Module {
            env: module_env,
            exposed: ["x".to_string()].into_iter().collect(),
            path: "lib.aqa".into(),
            is_builtin: false,
        });

        let env = Environment::new();
        env.borrow_mut().add_module(module);
        env.borrow_mut().set("x", Value::Int(1)).unwrap();

        assert_eq!(env.borrow().get("x"), Some(Value::Int(1)));
    }
}
