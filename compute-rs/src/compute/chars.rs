//! Character classification for the scanner.
//!
//! Every primary parser dispatches on the class of the next significant
//! character, so the classes here mirror the grammar's entry points.

/// Role of a character at the start of a primary expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// `(`
    GroupOpen,
    /// `[`
    ArrayOpen,
    /// `{`
    MapOpen,
    /// `@`
    StaticMarker,
    /// `'` or `"`
    Quote,
    Digit,
    IdentStart,
    Whitespace,
    /// Any of the operator symbols.
    Operator,
    Other,
}

pub const GROUP_OPEN: char = '(';
pub const GROUP_CLOSE: char = ')';
pub const ARRAY_OPEN: char = '[';
pub const ARRAY_CLOSE: char = ']';
pub const MAP_OPEN: char = '{';
pub const MAP_CLOSE: char = '}';
pub const STATIC_MARKER: char = '@';
pub const DOT: char = '.';
pub const COMMA: char = ',';
pub const COLON: char = ':';

pub fn classify(c: char) -> CharClass {
    match c {
        GROUP_OPEN => CharClass::GroupOpen,
        ARRAY_OPEN => CharClass::ArrayOpen,
        MAP_OPEN => CharClass::MapOpen,
        STATIC_MARKER => CharClass::StaticMarker,
        '\'' | '"' => CharClass::Quote,
        '0'..='9' => CharClass::Digit,
        c if is_ident_start(c) => CharClass::IdentStart,
        c if c.is_whitespace() => CharClass::Whitespace,
        c if is_operator(c) => CharClass::Operator,
        _ => CharClass::Other,
    }
}

pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

pub fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

pub fn is_operator(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '*' | '/' | '%' | '!' | '^' | '&' | '|' | '<' | '>' | '=' | '?' | ':'
    )
}
