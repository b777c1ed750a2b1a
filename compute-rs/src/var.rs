//! Owned variable store for the command-line front end.
//!
//! Populated from `-v` flags and `/var` lines in a settings file, then handed
//! to the engine as the evaluation context.

use std::collections::HashMap;

use crate::compute::context::VariableContext;
use crate::compute::value::Value;

#[derive(Debug, Default, Clone)]
pub struct Vars {
    vars: HashMap<String, Value>,
}

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl VariableContext for Vars {
    fn get(&self, name: &str) -> Option<Value> {
        self.vars.get(name).cloned()
    }
}

impl Extend<(String, Value)> for Vars {
    fn extend<I: IntoIterator<Item = (String, Value)>>(&mut self, iter: I) {
        self.vars.extend(iter);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
