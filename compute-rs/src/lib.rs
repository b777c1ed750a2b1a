pub mod cli;
pub mod compute;
pub mod config;
pub mod var;

pub use compute::{Engine, Error, EvalError, ParseError, RunnerSettings, Template, Value};
