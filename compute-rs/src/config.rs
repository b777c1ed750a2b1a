//! Settings file parser for the command-line front end.
//!
//! Line-oriented; one directive per line:
//!
//! | Directive | Action |
//! |-----------|--------|
//! | `/set start=<tok>` or `/set start <tok>` | template start delimiter |
//! | `/set end=<tok>` | template end delimiter |
//! | `/set max_depth=<n>` | parser nesting limit |
//! | `/var <name>=<expression>` | evaluate and bind a variable |
//! | Lines starting with `;` | comment, ignored |
//! | Any other `/command` | silently skipped |
//!
//! `/var` expressions are evaluated as they are read, so a later line may
//! refer to variables bound earlier in the file.

use std::path::Path;

use crate::compute::settings::{
    Delimiters, RunnerSettings, SettingsError, DEFAULT_END, DEFAULT_MAX_DEPTH, DEFAULT_START,
};
use crate::compute::Engine;
use crate::var::Vars;

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a settings file.
#[derive(Debug)]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Parsed settings: delimiters, depth limit, and pre-bound variables.
#[derive(Debug)]
pub struct Config {
    pub start: String,
    pub end: String,
    pub max_depth: usize,
    pub vars: Vars,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            start: DEFAULT_START.to_owned(),
            end: DEFAULT_END.to_owned(),
            max_depth: DEFAULT_MAX_DEPTH,
            vars: Vars::new(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build engine settings from the loaded values.
    pub fn settings(&self) -> Result<RunnerSettings, SettingsError> {
        RunnerSettings::new()
            .with_delimiters(Delimiters::new(self.start.as_str(), self.end.as_str())?)
            .with_max_depth(self.max_depth)
    }

    /// Parse a settings string.
    ///
    /// Unknown directives are silently skipped. Returns the config and a list
    /// of any errors on recognised lines.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            // blank lines and comments (`;` or `;;` prefix)
            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let Some(rest) = line.strip_prefix('/') else { continue };

            // split off the command name
            let (cmd, args_str) = rest
                .split_once(|c: char| c.is_ascii_whitespace())
                .unwrap_or((rest, ""));
            let args_str = args_str.trim();

            let result = match cmd {
                "set" => parse_set(&split_args(args_str), &mut config),
                "var" => parse_var(args_str, &mut config),
                _ => Ok(()), // silently skip unknown commands
            };
            if let Err(message) = result {
                errors.push(ConfigError { line: lineno, message });
            }
        }

        (config, errors)
    }

    /// Read and parse a settings file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }
}

// ── Argument tokenizer ────────────────────────────────────────────────────────

/// Split `s` into whitespace-delimited tokens, honouring double-quoted strings
/// and `\"` escapes within them.
fn split_args(s: &str) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    cur.push(escaped);
                }
            }
            c if c.is_ascii_whitespace() && !in_quotes => {
                if !cur.is_empty() {
                    args.push(std::mem::take(&mut cur));
                }
            }
            c => cur.push(c),
        }
    }
    if !cur.is_empty() {
        args.push(cur);
    }
    args
}

// ── /set ─────────────────────────────────────────────────────────────────────

/// Parse `/set <name>=<value>` or `/set <name> <value>`.
fn parse_set(tokens: &[String], config: &mut Config) -> Result<(), String> {
    if tokens.is_empty() {
        return Err("/set: requires an argument".into());
    }

    let (name, value) = if let Some((name, value)) = tokens[0].split_once('=') {
        (name.to_owned(), value.to_owned())
    } else if tokens.len() >= 2 {
        (tokens[0].clone(), tokens[1..].join(" "))
    } else {
        return Err(format!("/set: missing value for '{}'", tokens[0]));
    };

    match name.as_str() {
        "start" | "end" if value.is_empty() => {
            Err(format!("/set: {name} delimiter cannot be empty"))
        }
        "start" => {
            config.start = value;
            Ok(())
        }
        "end" => {
            config.end = value;
            Ok(())
        }
        "max_depth" => match value.parse::<usize>() {
            Ok(n) if n > 0 => {
                config.max_depth = n;
                Ok(())
            }
            _ => Err(format!("/set: max_depth must be a positive integer, got '{value}'")),
        },
        _ => Err(format!("/set: unknown setting '{name}'")),
    }
}

// ── /var ─────────────────────────────────────────────────────────────────────

/// Parse `/var <name>=<expression>`, evaluating against earlier bindings.
fn parse_var(args: &str, config: &mut Config) -> Result<(), String> {
    let Some((name, expr)) = args.split_once('=') else {
        return Err("/var: expected <name>=<expression>".into());
    };
    let name = name.trim();
    if name.is_empty() {
        return Err("/var: variable name cannot be empty".into());
    }
    let settings = RunnerSettings::new()
        .with_max_depth(config.max_depth)
        .map_err(|e| e.to_string())?;
    let value = Engine::with_settings(settings)
        .run_with(expr, &config.vars)
        .map_err(|e| format!("/var {name}: {e}"))?;
    tracing::debug!(name, %value, "bound variable");
    config.vars.set(name, value);
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::Value;
    use std::io::Write;

    // -- split_args -----------------------------------------------------------

    #[test]
    fn split_simple() {
        assert_eq!(split_args("foo bar baz"), ["foo", "bar", "baz"]);
    }

    #[test]
    fn split_quoted_spaces() {
        assert_eq!(split_args(r#"start="<% " x"#), ["start=<% ", "x"]);
    }

    #[test]
    fn split_escaped_quote_inside_quotes() {
        assert_eq!(split_args(r#""say \"hi\"""#), [r#"say "hi""#]);
    }

    // -- /set -----------------------------------------------------------------

    #[test]
    fn defaults() {
        let (cfg, errs) = Config::load_str("");
        assert!(errs.is_empty());
        let s = cfg.settings().unwrap();
        assert_eq!((s.delimiters.start(), s.delimiters.end()), ("{{", "}}"));
        assert_eq!(s.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn set_delimiters() {
        let (cfg, errs) = Config::load_str("/set start=<%\n/set end %>");
        assert!(errs.is_empty(), "{errs:?}");
        let s = cfg.settings().unwrap();
        assert_eq!((s.delimiters.start(), s.delimiters.end()), ("<%", "%>"));
    }

    #[test]
    fn set_max_depth() {
        let (cfg, errs) = Config::load_str("/set max_depth=12");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.max_depth, 12);
    }

    #[test]
    fn bad_settings_are_errors() {
        let (cfg, errs) = Config::load_str(
            "/set max_depth=zero\n\
             /set max_depth=0\n\
             /set start=\n\
             /set colour=red\n\
             /set",
        );
        let lines: Vec<usize> = errs.iter().map(|e| e.line).collect();
        assert_eq!(lines, [1, 2, 3, 4, 5]);
        assert_eq!(cfg.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(cfg.start, "{{");
    }

    // -- /var -----------------------------------------------------------------

    #[test]
    fn var_evaluates_expression() {
        let (cfg, errs) = Config::load_str("/var answer = 6 * 7\n/var name='tf'");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.vars.get("answer"), Some(&Value::Int(42)));
        assert_eq!(cfg.vars.get("name"), Some(&Value::from("tf")));
    }

    #[test]
    fn var_sees_earlier_bindings() {
        let (cfg, errs) = Config::load_str("/var a=2\n/var b=a * 10 + 1");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.vars.get("b"), Some(&Value::Int(21)));
    }

    #[test]
    fn var_errors_are_reported_by_line() {
        let (cfg, errs) = Config::load_str("/var ok=1\n/var bad=missing + 1\n/var =3\n/var nope");
        let lines: Vec<usize> = errs.iter().map(|e| e.line).collect();
        assert_eq!(lines, [2, 3, 4]);
        assert!(errs[0].message.contains("missing"), "{}", errs[0]);
        assert_eq!(cfg.vars.len(), 1);
    }

    // -- Comments & skipping --------------------------------------------------

    #[test]
    fn comments_and_unknown_commands_skipped() {
        let (cfg, errs) = Config::load_str(
            ";; This is a comment\n\
             ; Also a comment\n\
             \n\
             /def -i mytrigger = /echo hi\n\
             /var real=true",
        );
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.vars.get("real"), Some(&Value::Bool(true)));
        assert_eq!(cfg.vars.len(), 1);
    }

    #[test]
    fn load_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "; settings").unwrap();
        writeln!(file, "/set start=[[").unwrap();
        writeln!(file, "/set end=]]").unwrap();
        writeln!(file, "/var who='disk'").unwrap();
        let (cfg, errs) = Config::load_file(file.path()).unwrap();
        assert!(errs.is_empty(), "{errs:?}");
        let engine = Engine::with_settings(cfg.settings().unwrap());
        assert_eq!(engine.render("from [[who]]", &cfg.vars).unwrap(), "from disk");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_file(&dir.path().join("absent.cfg")).is_err());
    }
}
