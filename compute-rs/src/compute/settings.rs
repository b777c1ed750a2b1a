//! Engine configuration.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::classes::{ClassRegistry, ClassResolver};
use super::members::{BuiltinMembers, MemberResolver};

/// Nesting limit for groups, literals, argument lists and operator chains.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Entries kept per compile cache before it is emptied.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

pub const DEFAULT_START: &str = "{{";
pub const DEFAULT_END: &str = "}}";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("template delimiters must not be empty")]
    EmptyDelimiter,
    #[error("max_depth must be at least 1")]
    ZeroDepth,
}

/// The pair of markers that surround expressions in a template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delimiters {
    start: String,
    end: String,
}

impl Delimiters {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Result<Self, SettingsError> {
        let (start, end) = (start.into(), end.into());
        if start.is_empty() || end.is_empty() {
            return Err(SettingsError::EmptyDelimiter);
        }
        Ok(Delimiters { start, end })
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn end(&self) -> &str {
        &self.end
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Delimiters {
            start: DEFAULT_START.to_owned(),
            end: DEFAULT_END.to_owned(),
        }
    }
}

/// Everything the parser and evaluator need beyond the source text.
#[derive(Clone)]
pub struct RunnerSettings {
    pub delimiters: Delimiters,
    /// Resolves `@ClassName` during parsing.
    pub classes: Arc<dyn ClassResolver>,
    /// Resolves `.member` chains during evaluation.
    pub members: Arc<dyn MemberResolver>,
    pub max_depth: usize,
    /// Limit on each engine cache; 0 turns caching off.
    pub cache_capacity: usize,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        RunnerSettings {
            delimiters: Delimiters::default(),
            classes: Arc::new(ClassRegistry::default()),
            members: Arc::new(BuiltinMembers),
            max_depth: DEFAULT_MAX_DEPTH,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl fmt::Debug for RunnerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerSettings")
            .field("delimiters", &self.delimiters)
            .field("max_depth", &self.max_depth)
            .field("cache_capacity", &self.cache_capacity)
            .finish_non_exhaustive()
    }
}

impl RunnerSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    pub fn with_classes(mut self, classes: impl ClassResolver + 'static) -> Self {
        self.classes = Arc::new(classes);
        self
    }

    pub fn with_members(mut self, members: impl MemberResolver + 'static) -> Self {
        self.members = Arc::new(members);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Result<Self, SettingsError> {
        if max_depth == 0 {
            return Err(SettingsError::ZeroDepth);
        }
        self.max_depth = max_depth;
        Ok(self)
    }

    pub fn with_cache_capacity(mut self, cache_capacity: usize) -> Self {
        self.cache_capacity = cache_capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_delimiters() {
        let d = Delimiters::default();
        assert_eq!((d.start(), d.end()), ("{{", "}}"));
    }

    #[test]
    fn empty_delimiter_rejected() {
        assert_eq!(Delimiters::new("", "}}"), Err(SettingsError::EmptyDelimiter));
        assert_eq!(Delimiters::new("${", ""), Err(SettingsError::EmptyDelimiter));
        assert!(Delimiters::new("${", "}}").is_ok());
    }

    #[test]
    fn builder() {
        let s = RunnerSettings::new()
            .with_delimiters(Delimiters::new("<%", "%>").unwrap())
            .with_max_depth(8)
            .unwrap();
        assert_eq!(s.delimiters.start(), "<%");
        assert_eq!(s.max_depth, 8);
        assert_eq!(s.cache_capacity, DEFAULT_CACHE_CAPACITY);
        assert_eq!(RunnerSettings::new().with_cache_capacity(4).cache_capacity, 4);
        assert!(s.classes.resolve("Math").is_some());
        assert!(RunnerSettings::new().with_max_depth(0).is_err());
    }
}
