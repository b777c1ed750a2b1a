//! Static classes reachable through `@Name.member`.
//!
//! Class names are resolved while parsing, so an unknown class fails before
//! any evaluation. Fields and methods are looked up at evaluation time.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use super::error::EvalError;
use super::members::{arg, str_arg};
use super::value::Value;

/// A class exposing static fields and methods.
pub trait StaticClass: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Read a static field; `None` if there is no such field.
    fn field(&self, name: &str) -> Option<Value>;

    /// Call a static method; `None` if there is no such method.
    fn call(&self, method: &str, args: &[Value]) -> Option<Result<Value, EvalError>>;
}

/// Maps a simple class name to a class.
pub trait ClassResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Arc<dyn StaticClass>>;
}

pub type FieldFn = fn(&str) -> Option<Value>;
pub type CallFn = fn(&str, &[Value]) -> Result<Option<Value>, EvalError>;

/// A class backed by two plain functions.
///
/// The call function follows the dispatcher convention used throughout the
/// engine: `Ok(None)` means "no such method".
pub struct NativeClass {
    name: String,
    fields: FieldFn,
    methods: CallFn,
}

impl NativeClass {
    pub fn new(name: impl Into<String>, fields: FieldFn, methods: CallFn) -> Self {
        NativeClass {
            name: name.into(),
            fields,
            methods,
        }
    }
}

impl fmt::Debug for NativeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeClass").field("name", &self.name).finish()
    }
}

impl StaticClass for NativeClass {
    fn name(&self) -> &str {
        &self.name
    }

    fn field(&self, name: &str) -> Option<Value> {
        (self.fields)(name)
    }

    fn call(&self, method: &str, args: &[Value]) -> Option<Result<Value, EvalError>> {
        (self.methods)(method, args).transpose()
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// Name → class table. `ClassRegistry::default()` holds the built-in classes.
#[derive(Debug, Clone)]
pub struct ClassRegistry {
    classes: HashMap<String, Arc<dyn StaticClass>>,
}

impl ClassRegistry {
    /// A registry with no classes at all.
    pub fn empty() -> Self {
        ClassRegistry {
            classes: HashMap::new(),
        }
    }

    /// Add or replace a class under its own name.
    pub fn register(&mut self, class: impl StaticClass + 'static) -> &mut Self {
        self.classes.insert(class.name().to_owned(), Arc::new(class));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        let mut reg = ClassRegistry::empty();
        reg.register(NativeClass::new("Math", math_field, math_call))
            .register(NativeClass::new("Integer", integer_field, integer_call))
            .register(NativeClass::new("Long", integer_field, long_call))
            .register(NativeClass::new("Double", double_field, double_call))
            .register(NativeClass::new("String", no_fields, string_call))
            .register(NativeClass::new("Boolean", boolean_field, boolean_call))
            .register(NativeClass::new("Objects", no_fields, objects_call))
            .register(NativeClass::new("System", no_fields, system_call));
        reg
    }
}

impl ClassResolver for ClassRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<dyn StaticClass>> {
        self.classes.get(name).cloned()
    }
}

// ── Built-in classes ──────────────────────────────────────────────────────────

fn no_fields(_name: &str) -> Option<Value> {
    None
}

fn num_arg(args: &[Value], idx: usize, name: &str, arity: usize) -> Result<f64, EvalError> {
    let v = arg(args, idx, name, arity)?;
    v.as_f64().ok_or_else(|| {
        EvalError::bad_arg(name, format!("argument {idx} must be a number, got {}", v.type_name()))
    })
}

fn math_field(name: &str) -> Option<Value> {
    match name {
        "PI" => Some(Value::Float(std::f64::consts::PI)),
        "E" => Some(Value::Float(std::f64::consts::E)),
        _ => None,
    }
}

fn math_call(name: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
    Ok(Some(match name {
        "max" | "min" => {
            let (a, b) = (arg(args, 0, name, 2)?, arg(args, 1, name, 2)?);
            if let (Value::Int(a), Value::Int(b)) = (a, b) {
                Value::Int(if name == "max" { *a.max(b) } else { *a.min(b) })
            } else {
                let (a, b) = (num_arg(args, 0, name, 2)?, num_arg(args, 1, name, 2)?);
                Value::Float(if name == "max" { a.max(b) } else { a.min(b) })
            }
        }
        "abs" => match arg(args, 0, name, 1)? {
            Value::Int(n) => Value::Int(n.wrapping_abs()),
            _ => Value::Float(num_arg(args, 0, name, 1)?.abs()),
        },
        "pow" => Value::Float(num_arg(args, 0, name, 2)?.powf(num_arg(args, 1, name, 2)?)),
        "sqrt" => Value::Float(num_arg(args, 0, name, 1)?.sqrt()),
        "floor" => Value::Float(num_arg(args, 0, name, 1)?.floor()),
        "ceil" => Value::Float(num_arg(args, 0, name, 1)?.ceil()),
        // Halves round up, so -2.5 becomes -2.
        "round" => Value::Int((num_arg(args, 0, name, 1)? + 0.5).floor() as i64),
        _ => return Ok(None),
    }))
}

fn integer_field(name: &str) -> Option<Value> {
    match name {
        "MAX_VALUE" => Some(Value::Int(i64::MAX)),
        "MIN_VALUE" => Some(Value::Int(i64::MIN)),
        _ => None,
    }
}

fn parse_int(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let s = str_arg(args, 0, name, 1)?;
    s.trim()
        .parse()
        .map(Value::Int)
        .map_err(|e| EvalError::Host(format!("{name}: cannot parse {s:?}: {e}")))
}

fn integer_call(name: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
    Ok(Some(match name {
        "parseInt" => parse_int(name, args)?,
        "valueOf" => match arg(args, 0, name, 1)? {
            Value::Str(_) => parse_int(name, args)?,
            v => v.as_i64().map(Value::Int).ok_or_else(|| {
                EvalError::bad_arg(name, format!("cannot convert {}", v.type_name()))
            })?,
        },
        _ => return Ok(None),
    }))
}

fn long_call(name: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
    match name {
        "parseLong" => parse_int(name, args).map(Some),
        _ => integer_call(name, args),
    }
}

fn double_field(name: &str) -> Option<Value> {
    match name {
        "MAX_VALUE" => Some(Value::Float(f64::MAX)),
        "MIN_VALUE" => Some(Value::Float(f64::MIN_POSITIVE)),
        "NaN" => Some(Value::Float(f64::NAN)),
        _ => None,
    }
}

fn double_call(name: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
    Ok(Some(match name {
        "parseDouble" | "valueOf" => match arg(args, 0, name, 1)? {
            Value::Str(s) => s
                .trim()
                .parse()
                .map(Value::Float)
                .map_err(|e| EvalError::Host(format!("{name}: cannot parse {s:?}: {e}")))?,
            _ => Value::Float(num_arg(args, 0, name, 1)?),
        },
        _ => return Ok(None),
    }))
}

fn string_call(name: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
    Ok(Some(match name {
        "valueOf" => Value::Str(arg(args, 0, name, 1)?.to_string()),
        "join" => {
            let (sep, rest) = match args.split_first() {
                Some((Value::Str(sep), rest)) => (sep, rest),
                _ => {
                    return Err(EvalError::bad_arg(
                        name,
                        "first argument must be a separator string",
                    ))
                }
            };
            // join(sep, list) or join(sep, a, b, ...)
            let parts: Vec<String> = match rest {
                [Value::List(items)] => items.iter().map(Value::to_string).collect(),
                _ => rest.iter().map(Value::to_string).collect(),
            };
            Value::Str(parts.join(sep))
        }
        _ => return Ok(None),
    }))
}

fn boolean_field(name: &str) -> Option<Value> {
    match name {
        "TRUE" => Some(Value::Bool(true)),
        "FALSE" => Some(Value::Bool(false)),
        _ => None,
    }
}

fn boolean_call(name: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
    Ok(Some(match name {
        "parseBoolean" => Value::Bool(str_arg(args, 0, name, 1)?.eq_ignore_ascii_case("true")),
        _ => return Ok(None),
    }))
}

fn objects_call(name: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
    Ok(Some(match name {
        "toString" => match args {
            [v] => Value::Str(v.to_string()),
            [Value::Null, default] => default.clone(),
            [v, _] => Value::Str(v.to_string()),
            _ => return Err(EvalError::arity(name, "1 or 2", args.len())),
        },
        "isNull" => Value::Bool(matches!(arg(args, 0, name, 1)?, Value::Null)),
        "nonNull" => Value::Bool(!matches!(arg(args, 0, name, 1)?, Value::Null)),
        "equals" => Value::Bool(arg(args, 0, name, 2)?.loose_eq(arg(args, 1, name, 2)?)),
        "requireNonNullElse" => match arg(args, 0, name, 2)? {
            Value::Null => args[1].clone(),
            v => v.clone(),
        },
        _ => return Ok(None),
    }))
}

fn system_call(name: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
    Ok(Some(match name {
        "currentTimeMillis" => {
            if !args.is_empty() {
                return Err(EvalError::arity(name, "0", args.len()));
            }
            let millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default();
            Value::Int(i64::try_from(millis).unwrap_or(i64::MAX))
        }
        "lineSeparator" => Value::Str("\n".into()),
        _ => return Ok(None),
    }))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::members::int_arg;

    fn call(class: &str, method: &str, args: &[Value]) -> Result<Value, EvalError> {
        ClassRegistry::default()
            .resolve(class)
            .expect("class not registered")
            .call(method, args)
            .expect("method not found")
    }

    #[test]
    fn default_registry_has_builtins() {
        let reg = ClassRegistry::default();
        for name in ["Math", "Integer", "Long", "Double", "String", "Objects", "System"] {
            assert!(reg.contains(name), "{name} missing");
        }
        assert!(reg.resolve("DateUtil").is_none());
    }

    #[test]
    fn math() {
        assert_eq!(call("Math", "max", &[Value::Int(1), Value::Int(5)]), Ok(Value::Int(5)));
        assert_eq!(call("Math", "min", &[Value::Int(1), Value::Float(0.5)]), Ok(Value::Float(0.5)));
        assert_eq!(call("Math", "pow", &[Value::Int(2), Value::Int(10)]), Ok(Value::Float(1024.0)));
        assert_eq!(call("Math", "round", &[Value::Float(2.5)]), Ok(Value::Int(3)));
        assert_eq!(call("Math", "round", &[Value::Float(-2.5)]), Ok(Value::Int(-2)));
        assert_eq!(call("Math", "round", &[Value::Float(-2.6)]), Ok(Value::Int(-3)));
        assert_eq!(call("Math", "round", &[Value::Int(7)]), Ok(Value::Int(7)));
        let pi = ClassRegistry::default().resolve("Math").unwrap().field("PI");
        assert_eq!(pi, Some(Value::Float(std::f64::consts::PI)));
    }

    #[test]
    fn parsing_numbers() {
        assert_eq!(call("Long", "parseLong", &[Value::from("42")]), Ok(Value::Int(42)));
        assert_eq!(call("Integer", "valueOf", &[Value::Float(3.9)]), Ok(Value::Int(3)));
        assert_eq!(call("Double", "parseDouble", &[Value::from("2.5")]), Ok(Value::Float(2.5)));
        assert!(matches!(call("Long", "parseLong", &[Value::from("x")]), Err(EvalError::Host(_))));
    }

    #[test]
    fn objects_and_strings() {
        assert_eq!(call("Objects", "toString", &[Value::Int(7)]), Ok(Value::from("7")));
        assert_eq!(call("Objects", "isNull", &[Value::Null]), Ok(Value::Bool(true)));
        assert_eq!(
            call("String", "join", &[Value::from("-"), Value::Int(1), Value::Int(2)]),
            Ok(Value::from("1-2"))
        );
        let list = Value::List(vec![Value::from("a"), Value::from("b")]);
        assert_eq!(call("String", "join", &[Value::from(","), list]), Ok(Value::from("a,b")));
    }

    #[test]
    fn system_time_is_an_integer() {
        assert!(matches!(call("System", "currentTimeMillis", &[]), Ok(Value::Int(n)) if n > 0));
    }

    #[test]
    fn unknown_method_is_none() {
        let math = ClassRegistry::default().resolve("Math").unwrap();
        assert!(math.call("nope", &[]).is_none());
        assert!(math.field("nope").is_none());
    }

    #[test]
    fn custom_class_registration() {
        fn fields(name: &str) -> Option<Value> {
            (name == "yyyy_MM").then(|| Value::from("yyyy-MM"))
        }
        fn methods(name: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
            Ok(match name {
                "twice" => Some(Value::Int(2 * int_arg(args, 0, name, 1)?)),
                _ => None,
            })
        }
        let mut reg = ClassRegistry::empty();
        reg.register(NativeClass::new("DateUtil", fields, methods));
        let class = reg.resolve("DateUtil").unwrap();
        assert_eq!(class.field("yyyy_MM"), Some(Value::from("yyyy-MM")));
        assert_eq!(class.call("twice", &[Value::Int(4)]), Some(Ok(Value::Int(8))));
        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["DateUtil"]);
    }
}
