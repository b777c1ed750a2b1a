//! Error types for parsing, evaluation, and template compilation.
//!
//! Parse errors always carry the character offset at which scanning failed.
//! Evaluation errors depend on the runtime context and so carry names and
//! type names instead of positions.

use thiserror::Error;

/// What went wrong while parsing an expression or compiling a template.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unterminated {0}")]
    Unterminated(&'static str),
    #[error("malformed map entry: {0}")]
    MalformedMapEntry(&'static str),
    #[error("invalid number literal `{0}`")]
    InvalidNumber(String),
    #[error("unknown class `{0}`")]
    UnknownClass(String),
    #[error("class reference is not a value")]
    NotAValue,
    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
    #[error("unterminated template delimiter `{0}`")]
    UnterminatedDelimiter(String),
    #[error("empty expression")]
    EmptyExpression,
    #[error("constant expression failed: {0}")]
    ConstantFold(EvalError),
}

/// A syntax error, detected while building the runner tree.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at offset {pos}")]
pub struct ParseError {
    /// Character offset into the source text.
    pub pos: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(pos: usize, kind: ParseErrorKind) -> Self {
        ParseError { pos, kind }
    }

    /// Shift the position by `delta` characters (used when an expression was
    /// cut out of a larger template).
    pub(crate) fn shifted(mut self, delta: usize) -> Self {
        self.pos += delta;
        self
    }
}

/// A failure while evaluating a runner tree against a context.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unresolved variable `{0}`")]
    UnresolvedVariable(String),
    #[error("no member `{name}` on {target}")]
    UnresolvedMember { name: String, target: &'static str },
    #[error("no static member `{name}` on class {class}")]
    UnresolvedStatic { class: String, name: String },
    #[error("cannot call `{name}`: {reason}")]
    CallResolution { name: String, reason: String },
    #[error("operator `{op}` not applicable to {left}{}", .right.map(|r| format!(" and {r}")).unwrap_or_default())]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: Option<&'static str>,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },
    #[error("{0}")]
    Host(String),
}

impl EvalError {
    pub(crate) fn arity(name: &str, expected: &str, got: usize) -> Self {
        EvalError::CallResolution {
            name: name.to_owned(),
            reason: format!("expected {expected} argument(s), got {got}"),
        }
    }

    pub(crate) fn bad_arg(name: &str, reason: impl Into<String>) -> Self {
        EvalError::CallResolution {
            name: name.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Either kind of failure, for entry points that parse and evaluate in one go.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
