//! Expression parser: character-driven recursive descent straight to runners.
//!
//! There is no separate token stream. Every function takes the shared
//! [`Cursor`] by `&mut`, dispatches on the next significant character, and
//! leaves the cursor on the first character it did not consume.
//!
//! Grammar (loosest → tightest):
//!
//! ```text
//! expr     := binary ('?' expr ':' expr)?
//! binary   := unary (binop unary)*            -- precedence climbing
//! unary    := ('-' | '!') unary | postfix
//! postfix  := primary ('.' ident args? | '[' expr ']')*
//! primary  := '(' expr ')' | array | map | static | string | number | ident
//! array    := '[' (expr (',' expr)*)? ']'
//! map      := '{' '}' | '{' ':' '}' | '{' entry (',' entry)* '}'
//! entry    := key ':' expr
//! static   := '@' ident ('.' ident args?)?
//! ```

use super::chars::{
    is_ident_continue, is_ident_start, CharClass, ARRAY_CLOSE, ARRAY_OPEN, COLON, COMMA, DOT,
    GROUP_CLOSE, GROUP_OPEN, MAP_CLOSE,
};
use super::cursor::Cursor;
use super::error::{EvalError, ParseError, ParseErrorKind};
use super::runner::{Access, BinOp, Runner, UnaryOp};
use super::settings::RunnerSettings;
use super::value::Value;

/// Parse a complete expression. Only whitespace may follow it.
pub fn parse(src: &str, settings: &RunnerSettings) -> Result<Runner, ParseError> {
    let mut cur = Cursor::new(src, settings.max_depth);
    if cur.next_significant().is_none() {
        return Err(cur.error(ParseErrorKind::EmptyExpression));
    }
    let runner = expression(&mut cur, settings)?;
    if cur.next_significant().is_some() {
        return Err(cur.unexpected());
    }
    Ok(runner)
}

fn fold_error(pos: usize) -> impl FnOnce(EvalError) -> ParseError {
    move |e| ParseError::new(pos, ParseErrorKind::ConstantFold(e))
}

// ── Operators ─────────────────────────────────────────────────────────────────

pub(crate) fn expression(cur: &mut Cursor, s: &RunnerSettings) -> Result<Runner, ParseError> {
    let cond = binary(cur, s, 0)?;
    if cur.next_significant() != Some('?') {
        return Ok(cond);
    }
    let pos = cur.pos();
    cur.advance()?;
    cur.descend()?;
    let then = expression(cur, s)?;
    cur.expect(COLON)?;
    let otherwise = expression(cur, s)?;
    cur.ascend();
    Runner::ternary(cond, then, otherwise).map_err(fold_error(pos))
}

/// Recognise the binary operator at the cursor without consuming it.
/// Returns the operator and its width in characters.
fn peek_binop(cur: &mut Cursor) -> Option<(BinOp, usize)> {
    let first = cur.next_significant()?;
    let two = |op: BinOp| Some((op, 2usize));
    match (first, cur.peek_at(1)) {
        ('|', Some('|')) => two(BinOp::Or),
        ('&', Some('&')) => two(BinOp::And),
        ('=', Some('=')) => two(BinOp::Eq),
        ('!', Some('=')) => two(BinOp::Ne),
        ('<', Some('=')) => two(BinOp::Le),
        ('>', Some('=')) => two(BinOp::Ge),
        ('<', Some('<')) => two(BinOp::Shl),
        ('>', Some('>')) => two(BinOp::Shr),
        ('<', _) => Some((BinOp::Lt, 1)),
        ('>', _) => Some((BinOp::Gt, 1)),
        ('|', _) => Some((BinOp::BitOr, 1)),
        ('&', _) => Some((BinOp::BitAnd, 1)),
        ('^', _) => Some((BinOp::BitXor, 1)),
        ('+', _) => Some((BinOp::Add, 1)),
        ('-', _) => Some((BinOp::Sub, 1)),
        ('*', _) => Some((BinOp::Mul, 1)),
        ('/', _) => Some((BinOp::Div, 1)),
        ('%', _) => Some((BinOp::Rem, 1)),
        _ => None,
    }
}

fn binary(cur: &mut Cursor, s: &RunnerSettings, min_prec: u8) -> Result<Runner, ParseError> {
    let mut lhs = unary(cur, s)?;
    // Every runtime node adds a level to the tree, so it counts against depth.
    let mut levels = 0;
    while let Some((op, width)) = peek_binop(cur) {
        if op.precedence() < min_prec {
            break;
        }
        let pos = cur.pos();
        for _ in 0..width {
            cur.advance()?;
        }
        let rhs = binary(cur, s, op.precedence() + 1)?;
        lhs = Runner::binary(op, lhs, rhs).map_err(fold_error(pos))?;
        if !lhs.is_const() {
            cur.descend()?;
            levels += 1;
        }
    }
    for _ in 0..levels {
        cur.ascend();
    }
    Ok(lhs)
}

fn unary(cur: &mut Cursor, s: &RunnerSettings) -> Result<Runner, ParseError> {
    let op = match cur.next_significant() {
        Some('-') => UnaryOp::Neg,
        Some('!') if cur.peek_at(1) != Some('=') => UnaryOp::Not,
        _ => return postfix(cur, s),
    };
    let pos = cur.pos();
    cur.advance()?;
    cur.descend()?;
    let operand = unary(cur, s)?;
    cur.ascend();
    Runner::unary(op, operand).map_err(fold_error(pos))
}

// ── Primaries ─────────────────────────────────────────────────────────────────

fn postfix(cur: &mut Cursor, s: &RunnerSettings) -> Result<Runner, ParseError> {
    let base = primary(cur, s)?;
    chain(cur, s, base)
}

/// Parse one primary expression, dispatching on its first character.
fn primary(cur: &mut Cursor, s: &RunnerSettings) -> Result<Runner, ParseError> {
    let start = cur.pos();
    let runner = match cur.classify_next() {
        Some(CharClass::GroupOpen) => group(cur, s)?,
        Some(CharClass::ArrayOpen) => array(cur, s)?,
        Some(CharClass::MapOpen) => map(cur, s)?,
        Some(CharClass::StaticMarker) => static_access(cur, s)?,
        Some(CharClass::Quote) => string(cur)?,
        Some(CharClass::Digit) => number(cur)?,
        Some(CharClass::IdentStart) => variable(cur),
        _ => return Err(cur.unexpected()),
    };
    if !runner.is_valuer() {
        return Err(cur.error_at(start, ParseErrorKind::NotAValue));
    }
    Ok(runner)
}

/// Consume the closing character of a bracketed construct opened at `open`.
fn close(cur: &mut Cursor, c: char, open: usize, what: &'static str) -> Result<(), ParseError> {
    match cur.next_significant() {
        Some(found) if found == c => {
            cur.advance()?;
            Ok(())
        }
        Some(found) => Err(cur.error(ParseErrorKind::UnexpectedChar(found))),
        None => Err(cur.error_at(open, ParseErrorKind::Unterminated(what))),
    }
}

fn group(cur: &mut Cursor, s: &RunnerSettings) -> Result<Runner, ParseError> {
    let open = cur.pos();
    cur.advance()?;
    cur.descend()?;
    let inner = expression(cur, s)?;
    close(cur, GROUP_CLOSE, open, "group")?;
    cur.ascend();
    Ok(Runner::group(inner))
}

/// Comma-separated expressions up to `end`, after the opener was consumed.
fn sequence(
    cur: &mut Cursor,
    s: &RunnerSettings,
    end: char,
    open: usize,
    what: &'static str,
) -> Result<Vec<Runner>, ParseError> {
    let mut items = Vec::new();
    if cur.next_significant() == Some(end) {
        cur.advance()?;
        return Ok(items);
    }
    loop {
        items.push(expression(cur, s)?);
        match cur.next_significant() {
            Some(COMMA) => {
                cur.advance()?;
            }
            Some(c) if c == end => {
                cur.advance()?;
                return Ok(items);
            }
            Some(c) => return Err(cur.error(ParseErrorKind::UnexpectedChar(c))),
            None => return Err(cur.error_at(open, ParseErrorKind::Unterminated(what))),
        }
    }
}

fn array(cur: &mut Cursor, s: &RunnerSettings) -> Result<Runner, ParseError> {
    let open = cur.pos();
    cur.advance()?;
    cur.descend()?;
    let items = sequence(cur, s, ARRAY_CLOSE, open, "array literal")?;
    cur.ascend();
    Ok(Runner::Array(items))
}

fn arguments(cur: &mut Cursor, s: &RunnerSettings) -> Result<Vec<Runner>, ParseError> {
    let open = cur.pos();
    cur.advance()?;
    cur.descend()?;
    let args = sequence(cur, s, GROUP_CLOSE, open, "argument list")?;
    cur.ascend();
    Ok(args)
}

/// `{}`, `{:}`, or `{key: value, ...}`. Every entry needs a key, a colon and
/// a value; nothing is recovered leniently.
fn map(cur: &mut Cursor, s: &RunnerSettings) -> Result<Runner, ParseError> {
    let open = cur.pos();
    cur.advance()?;
    cur.descend()?;
    let unterminated =
        |cur: &Cursor| cur.error_at(open, ParseErrorKind::Unterminated("map literal"));

    match cur.next_significant() {
        Some(MAP_CLOSE) => {
            cur.advance()?;
            cur.ascend();
            return Ok(Runner::Map(Vec::new()));
        }
        Some(COLON) => {
            cur.advance()?;
            close(cur, MAP_CLOSE, open, "map literal")?;
            cur.ascend();
            return Ok(Runner::Map(Vec::new()));
        }
        _ => {}
    }

    let mut entries = Vec::new();
    loop {
        let key = map_key(cur, s)?;
        match cur.next_significant() {
            Some(COLON) => {
                cur.advance()?;
            }
            Some(_) => {
                return Err(cur.error(ParseErrorKind::MalformedMapEntry("expected `:` after key")))
            }
            None => return Err(unterminated(cur)),
        }
        match cur.next_significant() {
            Some(COMMA | MAP_CLOSE) => {
                return Err(cur.error(ParseErrorKind::MalformedMapEntry("missing value")))
            }
            Some(_) => {}
            None => return Err(unterminated(cur)),
        }
        let value = expression(cur, s)?;
        entries.push((key, value));
        match cur.next_significant() {
            Some(COMMA) => {
                cur.advance()?;
            }
            Some(MAP_CLOSE) => {
                cur.advance()?;
                break;
            }
            Some(c) => return Err(cur.error(ParseErrorKind::UnexpectedChar(c))),
            None => return Err(unterminated(cur)),
        }
    }
    cur.ascend();
    Ok(Runner::Map(entries))
}

/// A bare identifier key names itself (`{a: 1}` has key `"a"`); keywords and
/// every other primary are evaluated.
fn map_key(cur: &mut Cursor, s: &RunnerSettings) -> Result<Runner, ParseError> {
    match cur.classify_next() {
        Some(CharClass::IdentStart) => {
            let name = identifier(cur);
            Ok(keyword(&name).unwrap_or(Runner::Const(Value::Str(name))))
        }
        _ => postfix(cur, s),
    }
}

/// `@ Class`, `@ Class.FIELD`, or `@ Class.method(args)`. The class must be
/// known to the configured resolver.
fn static_access(cur: &mut Cursor, s: &RunnerSettings) -> Result<Runner, ParseError> {
    cur.advance()?;
    let name_pos = match cur.next_significant() {
        Some(c) if is_ident_start(c) => cur.pos(),
        _ => return Err(cur.unexpected()),
    };
    let class_name = identifier(cur);
    let class = s
        .classes
        .resolve(&class_name)
        .ok_or_else(|| cur.error_at(name_pos, ParseErrorKind::UnknownClass(class_name)))?;

    if cur.next_significant() != Some(DOT) {
        return Ok(Runner::ClassRef(class));
    }
    cur.advance()?;
    match cur.next_significant() {
        Some(c) if is_ident_start(c) => {}
        _ => return Err(cur.unexpected()),
    }
    let member = identifier(cur);
    if cur.next_significant() == Some(GROUP_OPEN) {
        let args = arguments(cur, s)?;
        Ok(Runner::StaticCall { class, method: member, args })
    } else {
        Ok(Runner::StaticField { class, name: member })
    }
}

/// Greedily consume `.name`, `.name(args)` and `[index]` suffixes.
fn chain(cur: &mut Cursor, s: &RunnerSettings, base: Runner) -> Result<Runner, ParseError> {
    let mut steps = Vec::new();
    loop {
        match cur.next_significant() {
            Some(DOT) => {
                cur.advance()?;
                match cur.next_significant() {
                    Some(c) if is_ident_start(c) => {}
                    _ => return Err(cur.unexpected()),
                }
                let name = identifier(cur);
                if cur.next_significant() == Some(GROUP_OPEN) {
                    let args = arguments(cur, s)?;
                    steps.push(Access::Method(name, args));
                } else {
                    steps.push(Access::Property(name));
                }
            }
            Some(ARRAY_OPEN) => {
                let open = cur.pos();
                cur.advance()?;
                cur.descend()?;
                let index = expression(cur, s)?;
                close(cur, ARRAY_CLOSE, open, "index")?;
                cur.ascend();
                steps.push(Access::Index(index));
            }
            _ => break,
        }
    }
    if steps.is_empty() {
        Ok(base)
    } else {
        Ok(Runner::Chain { base: Box::new(base), steps })
    }
}

// ── Literals ──────────────────────────────────────────────────────────────────

fn identifier(cur: &mut Cursor) -> String {
    cur.take_while(is_ident_continue)
}

fn keyword(name: &str) -> Option<Runner> {
    match name {
        "true" => Some(Runner::Const(Value::Bool(true))),
        "false" => Some(Runner::Const(Value::Bool(false))),
        "null" => Some(Runner::Const(Value::Null)),
        _ => None,
    }
}

fn variable(cur: &mut Cursor) -> Runner {
    let name = identifier(cur);
    keyword(&name).unwrap_or(Runner::Var(name))
}

fn string(cur: &mut Cursor) -> Result<Runner, ParseError> {
    let open = cur.pos();
    let quote = cur.advance()?;
    let unterminated = || ParseError::new(open, ParseErrorKind::Unterminated("string literal"));
    let mut out = String::new();
    loop {
        let c = cur.advance().map_err(|_| unterminated())?;
        match c {
            '\\' => {
                let escaped = cur.advance().map_err(|_| unterminated())?;
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => other,
                });
            }
            c if c == quote => break,
            c => out.push(c),
        }
    }
    Ok(Runner::Const(Value::Str(out)))
}

/// Integer, decimal, exponent, or hex literal. A `.` only belongs to the
/// number when a digit follows it, so `1.doubleValue()` is a method call.
fn number(cur: &mut Cursor) -> Result<Runner, ParseError> {
    let start = cur.pos();
    let invalid = |text: String| ParseError::new(start, ParseErrorKind::InvalidNumber(text));

    if cur.peek() == Some('0') && matches!(cur.peek_at(1), Some('x' | 'X')) {
        cur.advance()?;
        cur.advance()?;
        let digits = cur.take_while(|c| c.is_ascii_hexdigit());
        return i64::from_str_radix(&digits, 16)
            .map(|n| Runner::Const(Value::Int(n)))
            .map_err(|_| invalid(format!("0x{digits}")));
    }

    let mut text = cur.take_while(|c| c.is_ascii_digit());
    let mut is_float = false;
    if cur.peek() == Some(DOT) && matches!(cur.peek_at(1), Some(d) if d.is_ascii_digit()) {
        cur.advance()?;
        text.push('.');
        text.push_str(&cur.take_while(|c| c.is_ascii_digit()));
        is_float = true;
    }
    if matches!(cur.peek(), Some('e' | 'E')) {
        let digit_at = if matches!(cur.peek_at(1), Some('+' | '-')) { 2 } else { 1 };
        if matches!(cur.peek_at(digit_at), Some(d) if d.is_ascii_digit()) {
            for _ in 0..digit_at {
                text.push(cur.advance()?);
            }
            text.push_str(&cur.take_while(|c| c.is_ascii_digit()));
            is_float = true;
        }
    }

    if is_float {
        text.parse::<f64>()
            .map(|x| Runner::Const(Value::Float(x)))
            .map_err(|_| invalid(text))
    } else {
        text.parse::<i64>()
            .map(|n| Runner::Const(Value::Int(n)))
            .map_err(|_| invalid(text))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::context::EmptyContext;
    use crate::compute::members::BuiltinMembers;
    use crate::compute::runner::Env;
    use crate::compute::value::ValueMap;

    fn parse_default(src: &str) -> Result<Runner, ParseError> {
        parse(src, &RunnerSettings::default())
    }

    fn eval(src: &str) -> Value {
        let runner = parse_default(src).unwrap_or_else(|e| panic!("parse {src:?}: {e}"));
        let env = Env { vars: &EmptyContext, members: &BuiltinMembers };
        runner.eval(&env).unwrap_or_else(|e| panic!("eval {src:?}: {e}"))
    }

    fn parse_err(src: &str) -> ParseErrorKind {
        match parse_default(src) {
            Ok(r) => panic!("{src:?} parsed as {r:?}"),
            Err(e) => e.kind,
        }
    }

    #[test]
    #[allow(clippy::approx_constant)]
    fn literals() {
        assert_eq!(eval("42"), Value::Int(42));
        assert_eq!(eval("3.14"), Value::Float(3.14));
        assert_eq!(eval("1e3"), Value::Float(1000.0));
        assert_eq!(eval("0xff"), Value::Int(255));
        assert_eq!(eval("'a\\'b'"), Value::Str("a'b".into()));
        assert_eq!(eval("\"tab\\t\""), Value::Str("tab\t".into()));
        assert_eq!(eval("null"), Value::Null);
        assert_eq!(eval("true"), Value::Bool(true));
    }

    #[test]
    fn constant_expressions_fold_to_a_single_node() {
        for src in ["1+2*3", "-(4)", "!true", "(1+2)", "'a'+1", "1 < 2 ? 'y' : 'n'"] {
            let r = parse_default(src).unwrap();
            assert!(matches!(r, Runner::Const(_)), "{src} left {r:?}");
        }
    }

    #[test]
    fn logical_folding_short_circuits() {
        assert_eq!(eval("false && 1"), Value::Bool(false));
        assert_eq!(eval("true || 'x'"), Value::Bool(true));
        assert_eq!(eval("false && x"), Value::Bool(false));
        assert!(matches!(parse_default("true && x").unwrap(), Runner::Binary(BinOp::And, _, _)));
        assert!(matches!(
            parse_err("true && 1"),
            ParseErrorKind::ConstantFold(EvalError::TypeMismatch { op: "&&", .. })
        ));
        assert!(matches!(parse_err("1 || true"), ParseErrorKind::ConstantFold(_)));
    }

    #[test]
    fn variables_are_not_folded() {
        let r = parse_default("x + 1").unwrap();
        assert!(matches!(r, Runner::Binary(BinOp::Add, _, _)));
        let r = parse_default("-x").unwrap();
        assert!(matches!(r, Runner::Unary(UnaryOp::Neg, _)));
    }

    #[test]
    fn chains_are_never_folded() {
        let r = parse_default("'abc'.length()").unwrap();
        assert!(matches!(r, Runner::Chain { .. }));
    }

    #[test]
    fn precedence() {
        assert_eq!(eval("2 + 3 * 4"), Value::Int(14));
        assert_eq!(eval("(2 + 3) * 4"), Value::Int(20));
        #[allow(clippy::precedence)]
        let expected = 2 ^ 1 + 5;
        assert_eq!(eval("2^1+5"), Value::Int(expected));
        assert_eq!(eval("1 + 2 == 3 && 2 > 1"), Value::Bool(true));
        assert_eq!(eval("10 - 4 - 3"), Value::Int(3));
        assert_eq!(eval("1 << 2 + 1"), Value::Int(8));
    }

    #[test]
    fn prefix_binds_looser_than_chain() {
        assert_eq!(eval("-20.doubleValue()"), Value::Float(-20.0));
        assert_eq!(eval("-20.doubleValue().intValue()"), Value::Int(-20));
        assert_eq!(eval("!{:}.isEmpty()"), Value::Bool(false));
        assert_eq!(eval("!({}).isEmpty()"), Value::Bool(false));
        assert_eq!(eval("--3"), Value::Int(3));
    }

    #[test]
    fn number_then_method() {
        assert_eq!(eval("1+1.doubleValue()"), Value::Float(2.0));
        assert_eq!(eval("1.5.intValue()"), Value::Int(1));
    }

    #[test]
    fn map_literal_forms() {
        assert_eq!(eval("{}"), Value::Map(ValueMap::new()));
        assert_eq!(eval("{ : }"), Value::Map(ValueMap::new()));
        let Value::Map(m) = eval("{key: null, null: true, 25.3: 25, 'k': 1}") else {
            panic!("expected map")
        };
        assert_eq!(m.len(), 4);
        assert_eq!(m.get_str("key"), Some(&Value::Null));
        assert_eq!(m.get(&Value::Null), Some(&Value::Bool(true)));
        assert_eq!(m.get_str("null"), None);
        assert_eq!(m.get(&Value::Float(25.3)), Some(&Value::Int(25)));
    }

    #[test]
    fn malformed_maps() {
        assert_eq!(parse_err("{a:}"), ParseErrorKind::MalformedMapEntry("missing value"));
        assert_eq!(parse_err("{a:,}"), ParseErrorKind::MalformedMapEntry("missing value"));
        assert_eq!(
            parse_err("{a}"),
            ParseErrorKind::MalformedMapEntry("expected `:` after key")
        );
        assert_eq!(parse_err("{a:1,}"), ParseErrorKind::UnexpectedChar('}'));
        assert_eq!(parse_err("{a:1"), ParseErrorKind::Unterminated("map literal"));
        assert_eq!(parse_err("{:"), ParseErrorKind::Unterminated("map literal"));
    }

    #[test]
    fn arrays_and_indexing() {
        assert_eq!(eval("[]"), Value::List(vec![]));
        assert_eq!(eval("[1, 'a'][1]"), Value::Str("a".into()));
        assert_eq!(eval("{a: [1, 2]}.a[0]"), Value::Int(1));
        assert_eq!(parse_err("[1, 2"), ParseErrorKind::Unterminated("array literal"));
        assert_eq!(parse_err("[1,]"), ParseErrorKind::UnexpectedChar(']'));
    }

    #[test]
    fn static_access() {
        assert_eq!(eval("@Math.max(1, 2)"), Value::Int(2));
        assert_eq!(eval("@   Math.abs(-3)"), Value::Int(3));
        assert_eq!(eval("@Integer.MAX_VALUE"), Value::Int(i64::MAX));
        assert_eq!(eval("@Long.parseLong(@Objects.toString(12)) + 1"), Value::Int(13));
        assert_eq!(eval("-@Math.max(1, 2).intValue()"), Value::Int(-2));
    }

    #[test]
    fn static_errors() {
        assert_eq!(parse_err("@Nope.x()"), ParseErrorKind::UnknownClass("Nope".into()));
        assert_eq!(parse_err("@Math"), ParseErrorKind::NotAValue);
        assert_eq!(parse_err("1 + @Math"), ParseErrorKind::NotAValue);
        assert_eq!(parse_err("@ 1"), ParseErrorKind::UnexpectedChar('1'));
        assert_eq!(parse_err("@Math.max(1, 2"), ParseErrorKind::Unterminated("argument list"));
    }

    #[test]
    fn error_positions() {
        let e = parse_default("1 + #").unwrap_err();
        assert_eq!((e.pos, e.kind), (4, ParseErrorKind::UnexpectedChar('#')));
        let e = parse_default("(1 + 2").unwrap_err();
        assert_eq!((e.pos, e.kind), (0, ParseErrorKind::Unterminated("group")));
        let e = parse_default("'abc").unwrap_err();
        assert_eq!((e.pos, e.kind), (0, ParseErrorKind::Unterminated("string literal")));
        let e = parse_default("1 2").unwrap_err();
        assert_eq!((e.pos, e.kind), (2, ParseErrorKind::UnexpectedChar('2')));
    }

    #[test]
    fn empty_and_dangling_input() {
        assert_eq!(parse_err("   "), ParseErrorKind::EmptyExpression);
        assert_eq!(parse_err("1 +"), ParseErrorKind::UnexpectedEnd);
        assert_eq!(parse_err("x."), ParseErrorKind::UnexpectedEnd);
        assert_eq!(parse_err("a = 1"), ParseErrorKind::UnexpectedChar('='));
    }

    #[test]
    fn invalid_numbers() {
        assert_eq!(
            parse_err("99999999999999999999"),
            ParseErrorKind::InvalidNumber("99999999999999999999".into())
        );
        assert_eq!(parse_err("0x"), ParseErrorKind::InvalidNumber("0x".into()));
    }

    #[test]
    fn folding_errors_are_parse_errors() {
        let e = parse_default("1 ^ 'a'").unwrap_err();
        assert_eq!(e.pos, 2);
        assert!(matches!(
            e.kind,
            ParseErrorKind::ConstantFold(EvalError::TypeMismatch { op: "^", .. })
        ));
        assert!(matches!(
            parse_err("1 / 0"),
            ParseErrorKind::ConstantFold(EvalError::DivisionByZero)
        ));
        assert!(matches!(parse_err("!1"), ParseErrorKind::ConstantFold(_)));
    }

    #[test]
    fn nesting_limit() {
        let settings = RunnerSettings::default().with_max_depth(4).unwrap();
        assert!(parse("(((((1)))))", &settings).is_err());
        assert!(parse("((((1))))", &settings).is_ok());
        let deep = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert!(matches!(parse_err(&deep), ParseErrorKind::TooDeep(_)));
        let long = vec!["x"; 1_000].join(" + ");
        assert!(matches!(parse_err(&long), ParseErrorKind::TooDeep(_)));
        let folded = vec!["1"; 1_000].join(" + ");
        assert!(parse_default(&folded).is_ok());
    }

    #[test]
    fn whitespace_is_insignificant_between_tokens() {
        assert_eq!(eval("  { a : 10 } . isEmpty ( )  "), Value::Bool(false));
        assert_eq!(eval("[ 1 , 2 ] [ 0 ]"), Value::Int(1));
    }
}
