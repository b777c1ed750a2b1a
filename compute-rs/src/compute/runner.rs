//! The executable expression tree.
//!
//! A [`Runner`] is built once by the parser and is immutable afterwards, so
//! one tree may be evaluated from several threads against different
//! contexts. Unary, binary, ternary and grouping nodes are folded into
//! [`Runner::Const`] at construction time whenever every operand is constant.

use std::cmp::Ordering;
use std::sync::Arc;

use super::classes::StaticClass;
use super::context::VariableContext;
use super::error::EvalError;
use super::members::MemberResolver;
use super::value::{Value, ValueMap};

// ── Operators ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    /// Binding strength; higher binds tighter. All levels are left-associative.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => 3,
            BinOp::BitOr => 4,
            BinOp::BitXor => 5,
            BinOp::BitAnd => 6,
            BinOp::Shl | BinOp::Shr => 7,
            BinOp::Add | BinOp::Sub => 8,
            BinOp::Mul | BinOp::Div | BinOp::Rem => 9,
        }
    }
}

// ── Tree ──────────────────────────────────────────────────────────────────────

/// One step of a member-access chain.
#[derive(Debug, Clone)]
pub enum Access {
    Property(String),
    Method(String, Vec<Runner>),
    Index(Runner),
}

#[derive(Debug, Clone)]
pub enum Runner {
    Const(Value),
    Var(String),
    Unary(UnaryOp, Box<Runner>),
    Binary(BinOp, Box<Runner>, Box<Runner>),
    Ternary(Box<Runner>, Box<Runner>, Box<Runner>),
    Array(Vec<Runner>),
    /// Entries in declared order; evaluated key first, then value.
    Map(Vec<(Runner, Runner)>),
    Group(Box<Runner>),
    /// A bare `@Class`. Not a value; the parser rejects it where one is needed.
    ClassRef(Arc<dyn StaticClass>),
    StaticField {
        class: Arc<dyn StaticClass>,
        name: String,
    },
    StaticCall {
        class: Arc<dyn StaticClass>,
        method: String,
        args: Vec<Runner>,
    },
    Chain {
        base: Box<Runner>,
        steps: Vec<Access>,
    },
}

/// What a runner needs at evaluation time.
pub struct Env<'a> {
    pub vars: &'a dyn VariableContext,
    pub members: &'a dyn MemberResolver,
}

impl Runner {
    /// `true` when the node's value is known without a context.
    ///
    /// Array and map literals are never constant: each evaluation builds a
    /// fresh collection. Chains and static accesses are never constant either.
    pub fn is_const(&self) -> bool {
        match self {
            Runner::Const(_) => true,
            Runner::Group(inner) | Runner::Unary(_, inner) => inner.is_const(),
            Runner::Binary(_, l, r) => l.is_const() && r.is_const(),
            Runner::Ternary(c, a, b) => c.is_const() && a.is_const() && b.is_const(),
            _ => false,
        }
    }

    /// `true` when the node produces a value.
    pub fn is_valuer(&self) -> bool {
        match self {
            Runner::ClassRef(_) => false,
            Runner::Group(inner) => inner.is_valuer(),
            _ => true,
        }
    }

    fn const_value(&self) -> Option<&Value> {
        match self {
            Runner::Const(v) => Some(v),
            Runner::Group(inner) => inner.const_value(),
            _ => None,
        }
    }

    // ── Folding constructors ──────────────────────────────────────────────────

    pub fn group(inner: Runner) -> Runner {
        match inner {
            Runner::Const(_) => inner,
            other => Runner::Group(Box::new(other)),
        }
    }

    pub fn unary(op: UnaryOp, operand: Runner) -> Result<Runner, EvalError> {
        if let Some(v) = operand.const_value() {
            let folded = apply_unary(op, v.clone())?;
            tracing::trace!(op = op.symbol(), %folded, "folded unary");
            return Ok(Runner::Const(folded));
        }
        Ok(Runner::Unary(op, Box::new(operand)))
    }

    pub fn binary(op: BinOp, lhs: Runner, rhs: Runner) -> Result<Runner, EvalError> {
        if matches!(op, BinOp::And | BinOp::Or) {
            return Runner::logical(op, lhs, rhs);
        }
        if let (Some(l), Some(r)) = (lhs.const_value(), rhs.const_value()) {
            let folded = apply_binary(op, l, r)?;
            tracing::trace!(op = op.symbol(), %folded, "folded binary");
            return Ok(Runner::Const(folded));
        }
        Ok(Runner::Binary(op, Box::new(lhs), Box::new(rhs)))
    }

    /// Folds `&&`/`||` with the same short-circuit as evaluation: a constant
    /// left operand that decides the result makes the right one irrelevant.
    fn logical(op: BinOp, lhs: Runner, rhs: Runner) -> Result<Runner, EvalError> {
        if let Some(l) = lhs.const_value() {
            let l = truth(l, op.symbol())?;
            let folded = if (op == BinOp::And) != l {
                Some(l)
            } else {
                rhs.const_value().map(|r| truth(r, op.symbol())).transpose()?
            };
            if let Some(b) = folded {
                tracing::trace!(op = op.symbol(), folded = b, "folded logical");
                return Ok(Runner::Const(Value::Bool(b)));
            }
        }
        Ok(Runner::Binary(op, Box::new(lhs), Box::new(rhs)))
    }

    pub fn ternary(cond: Runner, then: Runner, otherwise: Runner) -> Result<Runner, EvalError> {
        let branches_const = then.const_value().is_some() && otherwise.const_value().is_some();
        if let (true, Some(c)) = (branches_const, cond.const_value()) {
            return Ok(if truth(c, "?:")? { then } else { otherwise });
        }
        Ok(Runner::Ternary(Box::new(cond), Box::new(then), Box::new(otherwise)))
    }

    // ── Evaluation ────────────────────────────────────────────────────────────

    pub fn eval(&self, env: &Env<'_>) -> Result<Value, EvalError> {
        match self {
            Runner::Const(v) => Ok(v.clone()),

            Runner::Var(name) => env
                .vars
                .get(name)
                .ok_or_else(|| EvalError::UnresolvedVariable(name.clone())),

            Runner::Unary(op, inner) => apply_unary(*op, inner.eval(env)?),

            // Short-circuit for && and ||
            Runner::Binary(op @ (BinOp::And | BinOp::Or), lhs, rhs) => {
                let l = truth(&lhs.eval(env)?, op.symbol())?;
                if (*op == BinOp::And) != l {
                    return Ok(Value::Bool(l));
                }
                Ok(Value::Bool(truth(&rhs.eval(env)?, op.symbol())?))
            }

            Runner::Binary(op, lhs, rhs) => {
                let l = lhs.eval(env)?;
                let r = rhs.eval(env)?;
                apply_binary(*op, &l, &r)
            }

            Runner::Ternary(cond, then, otherwise) => {
                if truth(&cond.eval(env)?, "?:")? {
                    then.eval(env)
                } else {
                    otherwise.eval(env)
                }
            }

            Runner::Array(items) => eval_all(items, env).map(Value::List),

            Runner::Map(entries) => {
                let mut map = ValueMap::new();
                for (k, v) in entries {
                    let key = k.eval(env)?;
                    let value = v.eval(env)?;
                    map.insert(key, value);
                }
                Ok(Value::Map(map))
            }

            Runner::Group(inner) => inner.eval(env),

            Runner::ClassRef(class) => Err(EvalError::bad_arg(
                class.name(),
                "a class reference is not a value",
            )),

            Runner::StaticField { class, name } => {
                class.field(name).ok_or_else(|| EvalError::UnresolvedStatic {
                    class: class.name().to_owned(),
                    name: name.clone(),
                })
            }

            Runner::StaticCall { class, method, args } => {
                let args = eval_all(args, env)?;
                class.call(method, &args).unwrap_or_else(|| {
                    Err(EvalError::UnresolvedStatic {
                        class: class.name().to_owned(),
                        name: method.clone(),
                    })
                })
            }

            Runner::Chain { base, steps } => {
                let mut cur = base.eval(env)?;
                for step in steps {
                    cur = step.apply(cur, env)?;
                }
                Ok(cur)
            }
        }
    }
}

impl Access {
    fn apply(&self, target: Value, env: &Env<'_>) -> Result<Value, EvalError> {
        match self {
            Access::Property(name) => env
                .members
                .property(&target, name)
                .unwrap_or_else(|| Err(unresolved_member(name, &target))),
            Access::Method(name, args) => {
                let args = eval_all(args, env)?;
                env.members
                    .method(&target, name, &args)
                    .unwrap_or_else(|| Err(unresolved_member(name, &target)))
            }
            Access::Index(index) => index_value(target, index.eval(env)?),
        }
    }
}

fn unresolved_member(name: &str, target: &Value) -> EvalError {
    EvalError::UnresolvedMember {
        name: name.to_owned(),
        target: target.type_name(),
    }
}

fn eval_all(runners: &[Runner], env: &Env<'_>) -> Result<Vec<Value>, EvalError> {
    runners.iter().map(|r| r.eval(env)).collect()
}

// ── Operator semantics ────────────────────────────────────────────────────────

fn mismatch(op: &'static str, l: &Value, r: Option<&Value>) -> EvalError {
    EvalError::TypeMismatch {
        op,
        left: l.type_name(),
        right: r.map(Value::type_name),
    }
}

fn truth(v: &Value, op: &'static str) -> Result<bool, EvalError> {
    v.as_bool().ok_or_else(|| mismatch(op, v, None))
}

pub fn apply_unary(op: UnaryOp, v: Value) -> Result<Value, EvalError> {
    match (op, v) {
        (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (op, v) => Err(mismatch(op.symbol(), &v, None)),
    }
}

fn apply_logical(op: BinOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
    let (l, r) = (truth(l, op.symbol())?, truth(r, op.symbol())?);
    Ok(Value::Bool(if op == BinOp::And { l && r } else { l || r }))
}

/// Apply a non-short-circuit binary operator to two evaluated operands.
pub fn apply_binary(op: BinOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
    match op {
        BinOp::Add => {
            if l.is_numeric() && r.is_numeric() {
                arith(op, l, r)
            } else {
                Ok(Value::Str(format!("{l}{r}")))
            }
        }
        BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem => arith(op, l, r),

        BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor | BinOp::Shl | BinOp::Shr => {
            let (Value::Int(a), Value::Int(b)) = (l, r) else {
                return Err(mismatch(op.symbol(), l, Some(r)));
            };
            Ok(Value::Int(match op {
                BinOp::BitAnd => a & b,
                BinOp::BitOr => a | b,
                BinOp::BitXor => a ^ b,
                BinOp::Shl => a.wrapping_shl((b & 63) as u32),
                _ => a.wrapping_shr((b & 63) as u32),
            }))
        }

        BinOp::Eq => Ok(Value::Bool(l.loose_eq(r))),
        BinOp::Ne => Ok(Value::Bool(!l.loose_eq(r))),

        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ord = compare(op, l, r)?;
            Ok(Value::Bool(match (op, ord) {
                (_, None) => false,
                (BinOp::Lt, Some(o)) => o == Ordering::Less,
                (BinOp::Le, Some(o)) => o != Ordering::Greater,
                (BinOp::Gt, Some(o)) => o == Ordering::Greater,
                (_, Some(o)) => o != Ordering::Less,
            }))
        }

        BinOp::And | BinOp::Or => apply_logical(op, l, r),
    }
}

fn arith(op: BinOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
    if let (Value::Int(a), Value::Int(b)) = (l, r) {
        let (a, b) = (*a, *b);
        if matches!(op, BinOp::Div | BinOp::Rem) && b == 0 {
            return Err(EvalError::DivisionByZero);
        }
        return Ok(Value::Int(match op {
            BinOp::Add => a.wrapping_add(b),
            BinOp::Sub => a.wrapping_sub(b),
            BinOp::Mul => a.wrapping_mul(b),
            BinOp::Div => a.wrapping_div(b),
            _ => a.wrapping_rem(b),
        }));
    }
    let (Some(a), Some(b)) = (l.as_f64(), r.as_f64()) else {
        return Err(mismatch(op.symbol(), l, Some(r)));
    };
    Ok(Value::Float(match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        _ => a % b,
    }))
}

/// `None` means the operands are unordered (a NaN was involved).
fn compare(op: BinOp, l: &Value, r: &Value) -> Result<Option<Ordering>, EvalError> {
    match (l, r) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::Int(a), Value::Int(b)) => Ok(Some(a.cmp(b))),
        _ => match (l.as_f64(), r.as_f64()) {
            (Some(a), Some(b)) => Ok(a.partial_cmp(&b)),
            _ => Err(mismatch(op.symbol(), l, Some(r))),
        },
    }
}

/// `target[index]` for lists, maps and strings.
fn index_value(target: Value, index: Value) -> Result<Value, EvalError> {
    match (&target, &index) {
        (Value::Map(map), key) => Ok(map.get(key).cloned().unwrap_or_default()),
        (Value::List(items), Value::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .ok_or(EvalError::IndexOutOfBounds { index: *i, len: items.len() }),
        (Value::Str(s), Value::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::Str(c.to_string()))
            .ok_or(EvalError::IndexOutOfBounds { index: *i, len: s.chars().count() }),
        _ => Err(mismatch("[]", &target, Some(&index))),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::context::EmptyContext;
    use crate::compute::members::BuiltinMembers;

    fn run(r: &Runner) -> Result<Value, EvalError> {
        let env = Env { vars: &EmptyContext, members: &BuiltinMembers };
        r.eval(&env)
    }

    fn int(n: i64) -> Runner {
        Runner::Const(Value::Int(n))
    }

    #[test]
    fn binary_of_constants_folds() {
        let r = Runner::binary(BinOp::Add, int(1), int(2)).unwrap();
        assert!(matches!(r, Runner::Const(Value::Int(3))));
    }

    #[test]
    fn binary_with_variable_stays_runtime() {
        let r = Runner::binary(BinOp::Add, int(1), Runner::Var("x".into())).unwrap();
        assert!(matches!(r, Runner::Binary(BinOp::Add, _, _)));
        assert!(!r.is_const());
    }

    #[test]
    fn folding_surfaces_type_errors() {
        let err = Runner::binary(BinOp::BitXor, int(1), Runner::Const("a".into())).unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch { op: "^", .. }));
    }

    #[test]
    fn group_is_transparent() {
        assert!(matches!(Runner::group(int(4)), Runner::Const(Value::Int(4))));
        let g = Runner::group(Runner::Var("x".into()));
        assert!(matches!(g, Runner::Group(_)));
        assert!(g.is_valuer());
        assert!(!g.is_const());
    }

    #[test]
    fn polymorphic_add() {
        assert_eq!(apply_binary(BinOp::Add, &Value::Int(1), &Value::Int(1)), Ok(Value::Int(2)));
        assert_eq!(
            apply_binary(BinOp::Add, &Value::Int(1), &Value::Float(1.0)),
            Ok(Value::Float(2.0))
        );
        assert_eq!(
            apply_binary(BinOp::Add, &Value::Bool(false), &Value::Bool(false)),
            Ok(Value::Str("falsefalse".into()))
        );
        assert_eq!(
            apply_binary(BinOp::Add, &Value::Str("yyyy-MM".into()), &Value::Int(20)),
            Ok(Value::Str("yyyy-MM20".into()))
        );
        assert_eq!(
            apply_binary(BinOp::Add, &Value::Null, &Value::Str("x".into())),
            Ok(Value::Str("nullx".into()))
        );
    }

    #[test]
    fn arithmetic_type_table() {
        assert_eq!(apply_binary(BinOp::Div, &Value::Int(7), &Value::Int(2)), Ok(Value::Int(3)));
        assert_eq!(
            apply_binary(BinOp::Div, &Value::Int(7), &Value::Float(2.0)),
            Ok(Value::Float(3.5))
        );
        assert_eq!(apply_binary(BinOp::Rem, &Value::Int(7), &Value::Int(3)), Ok(Value::Int(1)));
        assert_eq!(
            apply_binary(BinOp::Div, &Value::Int(1), &Value::Int(0)),
            Err(EvalError::DivisionByZero)
        );
        assert!(matches!(
            apply_binary(BinOp::Mul, &Value::Str("a".into()), &Value::Int(2)),
            Err(EvalError::TypeMismatch { op: "*", left: "string", right: Some("integer") })
        ));
    }

    #[test]
    fn bitwise_requires_integers() {
        assert_eq!(apply_binary(BinOp::BitXor, &Value::Int(1), &Value::Int(1)), Ok(Value::Int(0)));
        assert_eq!(apply_binary(BinOp::Shl, &Value::Int(1), &Value::Int(3)), Ok(Value::Int(8)));
        assert!(apply_binary(BinOp::BitAnd, &Value::Float(1.0), &Value::Int(1)).is_err());
        assert!(apply_binary(BinOp::BitOr, &Value::Bool(true), &Value::Bool(false)).is_err());
    }

    #[test]
    fn comparisons() {
        let yes: Result<Value, EvalError> = Ok(Value::Bool(true));
        assert_eq!(apply_binary(BinOp::Lt, &Value::Int(1), &Value::Float(1.5)), yes);
        assert_eq!(
            apply_binary(BinOp::Ge, &Value::Str("b".into()), &Value::Str("a".into())),
            Ok(Value::Bool(true))
        );
        assert_eq!(apply_binary(BinOp::Eq, &Value::Int(2), &Value::Float(2.0)), yes);
        assert_eq!(apply_binary(BinOp::Ne, &Value::Null, &Value::Int(0)), Ok(Value::Bool(true)));
        assert!(apply_binary(BinOp::Lt, &Value::Null, &Value::Int(0)).is_err());
        assert_eq!(
            apply_binary(BinOp::Lt, &Value::Float(f64::NAN), &Value::Int(0)),
            Ok(Value::Bool(false))
        );
    }

    #[test]
    fn unary_semantics() {
        assert_eq!(apply_unary(UnaryOp::Neg, Value::Float(20.0)), Ok(Value::Float(-20.0)));
        assert_eq!(apply_unary(UnaryOp::Not, Value::Bool(true)), Ok(Value::Bool(false)));
        assert!(apply_unary(UnaryOp::Not, Value::Int(0)).is_err());
        assert!(apply_unary(UnaryOp::Neg, Value::Str("1".into())).is_err());
    }

    #[test]
    fn logical_short_circuit_skips_rhs() {
        // The right side would fail with an unresolved variable if evaluated.
        let r = Runner::Binary(
            BinOp::And,
            Box::new(Runner::Const(Value::Bool(false))),
            Box::new(Runner::Var("missing".into())),
        );
        assert_eq!(run(&r), Ok(Value::Bool(false)));
        let r = Runner::Binary(
            BinOp::Or,
            Box::new(Runner::Const(Value::Bool(true))),
            Box::new(Runner::Var("missing".into())),
        );
        assert_eq!(run(&r), Ok(Value::Bool(true)));
    }

    #[test]
    fn ternary_folds_when_all_constant() {
        let r = Runner::ternary(Runner::Const(Value::Bool(true)), int(1), int(2)).unwrap();
        assert!(matches!(r, Runner::Const(Value::Int(1))));
        assert!(Runner::ternary(int(1), int(1), int(2)).is_err());
    }

    #[test]
    fn map_literal_last_write_wins() {
        let r = Runner::Map(vec![
            (Runner::Const("a".into()), int(1)),
            (Runner::Const("a".into()), int(2)),
        ]);
        let Value::Map(map) = run(&r).unwrap() else { panic!("expected a map") };
        assert_eq!(map.len(), 1);
        assert_eq!(map.get_str("a"), Some(&Value::Int(2)));
    }

    #[test]
    fn indexing() {
        let list = Value::List(vec![Value::Int(10), Value::Int(20)]);
        assert_eq!(index_value(list.clone(), Value::Int(1)), Ok(Value::Int(20)));
        assert!(matches!(
            index_value(list, Value::Int(5)),
            Err(EvalError::IndexOutOfBounds { index: 5, len: 2 })
        ));
        assert_eq!(index_value(Value::Str("中文".into()), Value::Int(1)), Ok(Value::Str("文".into())));
        assert_eq!(index_value(Value::Map(ValueMap::new()), Value::Int(1)), Ok(Value::Null));
    }

    #[test]
    fn unresolved_variable() {
        assert_eq!(
            run(&Runner::Var("nope".into())),
            Err(EvalError::UnresolvedVariable("nope".into()))
        );
    }
}
