//! Expression language and template engine.
//!
//! Expressions are parsed straight into a tree of [`Runner`] nodes. Constant
//! sub-trees are folded while parsing, so `1 + 2 * 3` compiles to a single
//! constant. The rest is evaluated against a [`VariableContext`]:
//!
//! - Arithmetic, bitwise, comparison and logical operators, plus `?:`
//! - List `[1, 2]` and map `{a: 1}` literals, indexing with `[i]`
//! - Member and method chains: `name.trim().length()`
//! - Static classes: `@Math.max(a, b)`, `@Integer.MAX_VALUE`
//! - Templates embedding expressions between `{{` and `}}`
//!
//! # Quick start
//!
//! ```rust
//! use compute::compute::{Engine, Value};
//! use std::collections::HashMap;
//!
//! let engine = Engine::new();
//! assert_eq!(engine.run("1 + 2 * 3").unwrap(), Value::Int(7));
//!
//! let mut ctx = HashMap::new();
//! ctx.insert("name".to_owned(), Value::from("world"));
//! assert_eq!(engine.render("Hello, {{name}}!", &ctx).unwrap(), "Hello, world!");
//! ```

pub mod chars;
pub mod classes;
pub mod context;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod members;
pub mod parse;
pub mod runner;
pub mod settings;
pub mod template;
pub mod value;

// Re-exports for convenience.
pub use classes::{ClassRegistry, ClassResolver, NativeClass, StaticClass};
pub use context::{EmptyContext, VariableContext};
pub use engine::{
    compile_template, render, render_with_delimiters, run, run_with, Engine, Expression,
};
pub use error::{Error, EvalError, ParseError, ParseErrorKind, Result};
pub use members::{BuiltinMembers, MemberResolver};
pub use runner::Runner;
pub use settings::{Delimiters, RunnerSettings};
pub use template::{Segment, Template};
pub use value::{HostObject, Value, ValueMap};
