//! Public facade: compile, run, and render with memoised parse results.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;

use super::context::{EmptyContext, VariableContext};
use super::error::{EvalError, ParseError, Result};
use super::members::MemberResolver;
use super::parse::parse;
use super::runner::{Env, Runner};
use super::settings::{Delimiters, RunnerSettings};
use super::template::{self, Template};
use super::value::Value;

/// A parsed expression, ready to evaluate against any context.
#[derive(Clone)]
pub struct Expression {
    runner: Arc<Runner>,
    members: Arc<dyn MemberResolver>,
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expression").field(&self.runner).finish()
    }
}

impl Expression {
    pub fn eval(&self, ctx: &dyn VariableContext) -> Result<Value, EvalError> {
        let env = Env { vars: ctx, members: self.members.as_ref() };
        self.runner.eval(&env)
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    /// `true` when parsing folded the whole expression to a single value.
    pub fn is_const(&self) -> bool {
        matches!(*self.runner, Runner::Const(_))
    }
}

/// Owns the settings and the compile caches.
///
/// Cached trees are immutable, so an `Engine` can be shared across threads.
/// Two threads racing on the same source both parse it; the first insert wins.
/// Each cache holds at most [`RunnerSettings::cache_capacity`] entries.
pub struct Engine {
    settings: RunnerSettings,
    expressions: DashMap<String, Arc<Runner>>,
    templates: DashMap<(Delimiters, String), Template>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_settings(RunnerSettings::default())
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("settings", &self.settings)
            .field("cached_expressions", &self.expressions.len())
            .field("cached_templates", &self.templates.len())
            .finish()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: RunnerSettings) -> Self {
        Engine {
            settings,
            expressions: DashMap::new(),
            templates: DashMap::new(),
        }
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    pub fn compile(&self, src: &str) -> Result<Expression, ParseError> {
        let runner = self.compile_runner(src)?;
        Ok(Expression { runner, members: Arc::clone(&self.settings.members) })
    }

    fn compile_runner(&self, src: &str) -> Result<Arc<Runner>, ParseError> {
        if let Some(found) = self.expressions.get(src) {
            tracing::trace!(src, "expression cache hit");
            return Ok(Arc::clone(found.value()));
        }
        let runner = Arc::new(parse(src, &self.settings)?);
        tracing::debug!(len = src.len(), folded = runner.is_const(), "compiled expression");
        Ok(remember(&self.expressions, self.settings.cache_capacity, src.to_owned(), runner))
    }

    pub fn run(&self, src: &str) -> Result<Value> {
        self.run_with(src, &EmptyContext)
    }

    pub fn run_with(&self, src: &str, ctx: &dyn VariableContext) -> Result<Value> {
        Ok(self.compile(src)?.eval(ctx)?)
    }

    pub fn compile_template(&self, src: &str) -> Result<Template, ParseError> {
        self.compile_template_with(src, &self.settings.delimiters)
    }

    pub fn compile_template_with(
        &self,
        src: &str,
        delimiters: &Delimiters,
    ) -> Result<Template, ParseError> {
        let key = (delimiters.clone(), src.to_owned());
        if let Some(found) = self.templates.get(&key) {
            tracing::trace!(src, "template cache hit");
            return Ok(found.value().clone());
        }
        let compiled = template::compile(src, delimiters, &self.settings)?;
        Ok(remember(&self.templates, self.settings.cache_capacity, key, compiled))
    }

    pub fn render(&self, src: &str, ctx: &dyn VariableContext) -> Result<String> {
        Ok(self.compile_template(src)?.render(ctx)?)
    }

    pub fn render_with_delimiters(
        &self,
        src: &str,
        delimiters: &Delimiters,
        ctx: &dyn VariableContext,
    ) -> Result<String> {
        Ok(self.compile_template_with(src, delimiters)?.render(ctx)?)
    }

    pub fn cached(&self) -> (usize, usize) {
        (self.expressions.len(), self.templates.len())
    }

    pub fn clear_cache(&self) {
        self.expressions.clear();
        self.templates.clear();
    }
}

/// Insert `value` unless another thread got there first, and return whichever
/// is cached. A full cache is emptied before the insert.
fn remember<K, V>(cache: &DashMap<K, V>, capacity: usize, key: K, value: V) -> V
where
    K: Eq + Hash,
    V: Clone,
{
    if capacity == 0 {
        return value;
    }
    if cache.len() >= capacity && !cache.contains_key(&key) {
        tracing::debug!(capacity, "compile cache full, clearing");
        cache.clear();
    }
    match cache.entry(key) {
        Entry::Vacant(v) => v.insert(value).value().clone(),
        Entry::Occupied(o) => o.get().clone(),
    }
}

static DEFAULT_ENGINE: Lazy<Engine> = Lazy::new(Engine::default);

/// Evaluate `src` with no variables, using the default engine.
pub fn run(src: &str) -> Result<Value> {
    DEFAULT_ENGINE.run(src)
}

pub fn run_with(src: &str, ctx: &dyn VariableContext) -> Result<Value> {
    DEFAULT_ENGINE.run_with(src, ctx)
}

/// Render `src` with the default `{{`/`}}` delimiters.
pub fn render(src: &str, ctx: &dyn VariableContext) -> Result<String> {
    DEFAULT_ENGINE.render(src, ctx)
}

pub fn render_with_delimiters(
    src: &str,
    delimiters: &Delimiters,
    ctx: &dyn VariableContext,
) -> Result<String> {
    DEFAULT_ENGINE.render_with_delimiters(src, delimiters, ctx)
}

pub fn compile_template(src: &str) -> Result<Template, ParseError> {
    DEFAULT_ENGINE.compile_template(src)
}
