//! Property and method resolution on runtime values.
//!
//! Chains like `name.length()` or `map.key` are resolved here at evaluation
//! time. Both lookups return `None` when the member does not exist; the
//! evaluator turns that into [`EvalError::UnresolvedMember`].
//!
//! [`BuiltinMembers`] covers the built-in value types with a small
//! Java-flavoured method set and defers to
//! [`HostObject`](super::value::HostObject) for caller values.

use regex::Regex;

use super::error::EvalError;
use super::value::Value;

/// Resolves `.name` and `.name(args)` against a value.
pub trait MemberResolver: Send + Sync {
    fn property(&self, target: &Value, name: &str) -> Option<Result<Value, EvalError>>;

    fn method(&self, target: &Value, name: &str, args: &[Value])
        -> Option<Result<Value, EvalError>>;
}

/// The default resolver.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinMembers;

impl MemberResolver for BuiltinMembers {
    fn property(&self, target: &Value, name: &str) -> Option<Result<Value, EvalError>> {
        match target {
            // Bean-style access on maps reads the string key.
            Value::Map(map) => Some(Ok(map.get_str(name).cloned().unwrap_or_default())),
            Value::Object(obj) => obj.property(name),
            Value::List(items) if name == "length" => Some(Ok(len_value(items.len()))),
            _ => None,
        }
    }

    fn method(
        &self,
        target: &Value,
        name: &str,
        args: &[Value],
    ) -> Option<Result<Value, EvalError>> {
        if let Value::Object(obj) = target {
            if let Some(res) = obj.call(name, args) {
                return Some(res);
            }
        }
        // Typed dispatch returns Result<Option<Value>, EvalError>:
        //   Ok(None)    → no such method
        //   Ok(Some(v)) → success
        //   Err(e)      → the method exists but the call failed
        let typed = match target {
            Value::Str(s) => string_method(s, name, args),
            Value::List(items) => list_method(items, name, args),
            Value::Map(_) => map_method(target, name, args),
            Value::Int(_) | Value::Float(_) => number_method(target, name, args),
            Value::Bool(b) => match name {
                "booleanValue" => no_args(name, args).map(|()| Some(Value::Bool(*b))),
                _ => Ok(None),
            },
            Value::Null | Value::Object(_) => Ok(None),
        };
        match typed {
            Ok(None) => common_method(target, name, args).transpose(),
            other => other.transpose(),
        }
    }
}

/// Methods every value answers to.
fn common_method(target: &Value, name: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
    Ok(Some(match name {
        "toString" => {
            no_args(name, args)?;
            Value::Str(target.to_string())
        }
        "equals" => Value::Bool(target.loose_eq(arg(args, 0, name, 1)?)),
        "isNull" => {
            no_args(name, args)?;
            Value::Bool(matches!(target, Value::Null))
        }
        _ => return Ok(None),
    }))
}

fn number_method(target: &Value, name: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
    let (Some(n), Some(x)) = (target.as_i64(), target.as_f64()) else {
        return Ok(None);
    };
    Ok(Some(match name {
        "intValue" | "longValue" => {
            no_args(name, args)?;
            Value::Int(n)
        }
        "doubleValue" | "floatValue" => {
            no_args(name, args)?;
            Value::Float(x)
        }
        "abs" => {
            no_args(name, args)?;
            match target {
                Value::Int(n) => Value::Int(n.wrapping_abs()),
                _ => Value::Float(x.abs()),
            }
        }
        _ => return Ok(None),
    }))
}

fn string_method(s: &str, name: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
    Ok(Some(match name {
        "length" => {
            no_args(name, args)?;
            len_value(s.chars().count())
        }
        "isEmpty" => {
            no_args(name, args)?;
            Value::Bool(s.is_empty())
        }
        "isBlank" => {
            no_args(name, args)?;
            Value::Bool(s.trim().is_empty())
        }
        "trim" => {
            no_args(name, args)?;
            Value::Str(s.trim().to_owned())
        }
        "toUpperCase" => {
            no_args(name, args)?;
            Value::Str(s.to_uppercase())
        }
        "toLowerCase" => {
            no_args(name, args)?;
            Value::Str(s.to_lowercase())
        }
        "charAt" => {
            let i = int_arg(args, 0, name, 1)?;
            let len = s.chars().count();
            let c = usize::try_from(i)
                .ok()
                .and_then(|i| s.chars().nth(i))
                .ok_or(EvalError::IndexOutOfBounds { index: i, len })?;
            Value::Str(c.to_string())
        }
        "substring" => {
            let chars: Vec<char> = s.chars().collect();
            let (from, to) = match args.len() {
                1 => (int_arg(args, 0, name, 1)?, chars.len() as i64),
                2 => (int_arg(args, 0, name, 2)?, int_arg(args, 1, name, 2)?),
                n => return Err(EvalError::arity(name, "1 or 2", n)),
            };
            if from < 0 || to < from || to as usize > chars.len() {
                return Err(EvalError::IndexOutOfBounds { index: from.max(to), len: chars.len() });
            }
            Value::Str(chars[from as usize..to as usize].iter().collect())
        }
        "indexOf" => {
            let needle = str_arg(args, 0, name, 1)?;
            match s.find(needle) {
                Some(byte) => len_value(s[..byte].chars().count()),
                None => Value::Int(-1),
            }
        }
        "contains" => Value::Bool(s.contains(str_arg(args, 0, name, 1)?)),
        "startsWith" => Value::Bool(s.starts_with(str_arg(args, 0, name, 1)?)),
        "endsWith" => Value::Bool(s.ends_with(str_arg(args, 0, name, 1)?)),
        "concat" => Value::Str(format!("{s}{}", arg(args, 0, name, 1)?)),
        "replace" => {
            expect_arity(name, args, 2)?;
            Value::Str(s.replace(str_arg(args, 0, name, 2)?, str_arg(args, 1, name, 2)?))
        }
        "matches" => {
            // Whole-string match, as `String.matches` does.
            let re = regex_arg(args, 0, name, 1, true)?;
            Value::Bool(re.is_match(s))
        }
        "replaceAll" => {
            expect_arity(name, args, 2)?;
            let re = regex_arg(args, 0, name, 2, false)?;
            Value::Str(re.replace_all(s, str_arg(args, 1, name, 2)?).into_owned())
        }
        "split" => {
            let re = regex_arg(args, 0, name, 1, false)?;
            let mut parts: Vec<&str> = re.split(s).collect();
            // Trailing empty pieces are dropped once the separator matched.
            if parts.len() > 1 {
                while parts.last() == Some(&"") {
                    parts.pop();
                }
            }
            Value::List(parts.into_iter().map(Value::from).collect())
        }
        _ => return Ok(None),
    }))
}

fn list_method(items: &[Value], name: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
    Ok(Some(match name {
        "size" => {
            no_args(name, args)?;
            len_value(items.len())
        }
        "isEmpty" => {
            no_args(name, args)?;
            Value::Bool(items.is_empty())
        }
        "get" => {
            let i = int_arg(args, 0, name, 1)?;
            usize::try_from(i)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or(EvalError::IndexOutOfBounds { index: i, len: items.len() })?
        }
        "contains" => {
            let needle = arg(args, 0, name, 1)?;
            Value::Bool(items.iter().any(|v| v.loose_eq(needle)))
        }
        "indexOf" => {
            let needle = arg(args, 0, name, 1)?;
            match items.iter().position(|v| v.loose_eq(needle)) {
                Some(i) => len_value(i),
                None => Value::Int(-1),
            }
        }
        _ => return Ok(None),
    }))
}

fn map_method(target: &Value, name: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
    let Value::Map(map) = target else {
        return Ok(None);
    };
    Ok(Some(match name {
        "size" => {
            no_args(name, args)?;
            len_value(map.len())
        }
        "isEmpty" => {
            no_args(name, args)?;
            Value::Bool(map.is_empty())
        }
        "get" => map.get(arg(args, 0, name, 1)?).cloned().unwrap_or_default(),
        "containsKey" => Value::Bool(map.contains_key(arg(args, 0, name, 1)?)),
        "containsValue" => {
            let needle = arg(args, 0, name, 1)?;
            Value::Bool(map.values().any(|v| v.loose_eq(needle)))
        }
        "keySet" => {
            no_args(name, args)?;
            Value::List(map.keys().cloned().collect())
        }
        "values" => {
            no_args(name, args)?;
            Value::List(map.values().cloned().collect())
        }
        _ => return Ok(None),
    }))
}

// ── Argument helpers ──────────────────────────────────────────────────────────

fn len_value(n: usize) -> Value {
    Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

fn expect_arity(name: &str, args: &[Value], n: usize) -> Result<(), EvalError> {
    if args.len() == n {
        Ok(())
    } else {
        Err(EvalError::arity(name, &n.to_string(), args.len()))
    }
}

fn no_args(name: &str, args: &[Value]) -> Result<(), EvalError> {
    expect_arity(name, args, 0)
}

/// Argument `idx` of a method taking exactly `arity` arguments.
///
/// Exposed for callers writing their own host objects or static classes.
pub fn arg<'a>(
    args: &'a [Value],
    idx: usize,
    name: &str,
    arity: usize,
) -> Result<&'a Value, EvalError> {
    if args.len() != arity {
        return Err(EvalError::arity(name, &arity.to_string(), args.len()));
    }
    args.get(idx).ok_or_else(|| EvalError::arity(name, &arity.to_string(), args.len()))
}

pub fn str_arg<'a>(
    args: &'a [Value],
    idx: usize,
    name: &str,
    arity: usize,
) -> Result<&'a str, EvalError> {
    match arg(args, idx, name, arity)? {
        Value::Str(s) => Ok(s),
        other => Err(EvalError::bad_arg(
            name,
            format!("argument {idx} must be a string, got {}", other.type_name()),
        )),
    }
}

pub fn int_arg(args: &[Value], idx: usize, name: &str, arity: usize) -> Result<i64, EvalError> {
    match arg(args, idx, name, arity)? {
        Value::Int(n) => Ok(*n),
        other => Err(EvalError::bad_arg(
            name,
            format!("argument {idx} must be an integer, got {}", other.type_name()),
        )),
    }
}

fn regex_arg(
    args: &[Value],
    idx: usize,
    name: &str,
    arity: usize,
    anchored: bool,
) -> Result<Regex, EvalError> {
    let src = str_arg(args, idx, name, arity)?;
    let pattern = if anchored { format!("^(?:{src})$") } else { src.to_owned() };
    Regex::new(&pattern).map_err(|e| EvalError::bad_arg(name, format!("regex error: {e}")))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
