//! Template compiler: splits text into literal and expression segments.
//!
//! Scanning is left to right. Literal text runs up to the next start marker;
//! the expression runs up to the first end marker after it. Expressions
//! therefore cannot contain the end marker themselves, but may contain the
//! start marker's characters (e.g. map braces inside `{{ }}`).

use std::fmt;
use std::sync::Arc;

use aho_corasick::AhoCorasick;

use super::context::VariableContext;
use super::error::{EvalError, ParseError, ParseErrorKind};
use super::members::MemberResolver;
use super::parse::parse;
use super::runner::{Env, Runner};
use super::settings::{Delimiters, RunnerSettings};
use super::value::Value;

#[derive(Debug, Clone)]
pub enum Segment {
    Literal(String),
    Expr(Arc<Runner>),
}

/// A compiled template. Immutable; render it any number of times, from any
/// number of threads.
#[derive(Clone)]
pub struct Template {
    segments: Vec<Segment>,
    members: Arc<dyn MemberResolver>,
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("segments", &self.segments)
            .finish_non_exhaustive()
    }
}

impl Template {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Evaluate every expression and concatenate the results with the
    /// literal text. The first failing expression aborts the whole render.
    pub fn render(&self, ctx: &dyn VariableContext) -> Result<String, EvalError> {
        let env = Env { vars: ctx, members: self.members.as_ref() };
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Expr(runner) => out.push_str(&runner.eval(&env)?.to_string()),
            }
        }
        Ok(out)
    }

    /// Like [`render`](Self::render), except that a template consisting of a
    /// single expression yields that expression's value unconverted.
    pub fn eval(&self, ctx: &dyn VariableContext) -> Result<Value, EvalError> {
        if let [Segment::Expr(runner)] = self.segments.as_slice() {
            let env = Env { vars: ctx, members: self.members.as_ref() };
            return runner.eval(&env);
        }
        self.render(ctx).map(Value::Str)
    }
}

fn char_offset(src: &str, byte: usize) -> usize {
    src[..byte].chars().count()
}

/// Compile `src` using `delimiters`; everything else comes from `settings`.
pub fn compile(
    src: &str,
    delimiters: &Delimiters,
    settings: &RunnerSettings,
) -> Result<Template, ParseError> {
    let starts = AhoCorasick::new([delimiters.start()]);
    let ends = AhoCorasick::new([delimiters.end()]);

    let mut segments = Vec::new();
    let mut rest = 0;
    while let Some(open) = starts.find(&src[rest..]) {
        let open_start = rest + open.start();
        let expr_start = rest + open.end();
        let close = ends.find(&src[expr_start..]).ok_or_else(|| {
            ParseError::new(
                char_offset(src, open_start),
                ParseErrorKind::UnterminatedDelimiter(delimiters.start().to_owned()),
            )
        })?;
        let expr_end = expr_start + close.start();

        if open_start > rest {
            segments.push(Segment::Literal(src[rest..open_start].to_owned()));
        }
        let runner = parse(&src[expr_start..expr_end], settings)
            .map_err(|e| e.shifted(char_offset(src, expr_start)))?;
        segments.push(Segment::Expr(Arc::new(runner)));
        rest = expr_start + close.end();
    }
    if rest < src.len() {
        segments.push(Segment::Literal(src[rest..].to_owned()));
    }

    tracing::debug!(
        len = src.len(),
        segments = segments.len(),
        start = delimiters.start(),
        "compiled template"
    );
    Ok(Template { segments, members: Arc::clone(&settings.members) })
}
