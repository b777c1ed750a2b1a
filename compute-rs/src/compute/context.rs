//! Caller-supplied variable bindings.

use std::collections::{BTreeMap, HashMap};

use super::value::{Value, ValueMap};

/// Read-only name → value lookup used while evaluating one expression.
///
/// The engine never mutates or retains a context beyond a single call.
pub trait VariableContext {
    fn get(&self, name: &str) -> Option<Value>;
}

/// A context with no bindings.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyContext;

impl VariableContext for EmptyContext {
    fn get(&self, _name: &str) -> Option<Value> {
        None
    }
}

impl VariableContext for HashMap<String, Value> {
    fn get(&self, name: &str) -> Option<Value> {
        HashMap::get(self, name).cloned()
    }
}

impl VariableContext for HashMap<&str, Value> {
    fn get(&self, name: &str) -> Option<Value> {
        HashMap::get(self, name).cloned()
    }
}

impl VariableContext for BTreeMap<String, Value> {
    fn get(&self, name: &str) -> Option<Value> {
        BTreeMap::get(self, name).cloned()
    }
}

/// A map value doubles as a context: its string keys are the variable names.
impl VariableContext for ValueMap {
    fn get(&self, name: &str) -> Option<Value> {
        self.get_str(name).cloned()
    }
}

impl<T: VariableContext + ?Sized> VariableContext for &T {
    fn get(&self, name: &str) -> Option<Value> {
        (**self).get(name)
    }
}
