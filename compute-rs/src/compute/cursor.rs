//! Scan position over an immutable character buffer.
//!
//! One `Cursor` is created per parse call and threaded through every parser
//! function by `&mut`. The offset only moves forward.

use super::chars::{classify, CharClass};
use super::error::{ParseError, ParseErrorKind};

pub struct Cursor {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl Cursor {
    pub fn new(src: &str, max_depth: usize) -> Self {
        Cursor {
            chars: src.chars().collect(),
            pos: 0,
            depth: 0,
            max_depth,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    /// Consume one character. Advancing past the end is an error.
    pub fn advance(&mut self) -> Result<char, ParseError> {
        let c = self.peek().ok_or_else(|| self.error(ParseErrorKind::UnexpectedEnd))?;
        self.pos += 1;
        Ok(c)
    }

    pub fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    /// Skip whitespace and return the next character without consuming it.
    pub fn next_significant(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.peek()
    }

    pub fn classify_next(&mut self) -> Option<CharClass> {
        self.next_significant().map(classify)
    }

    /// Skip whitespace and require `c` as the next character.
    pub fn expect(&mut self, c: char) -> Result<(), ParseError> {
        match self.next_significant() {
            Some(found) if found == c => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(self.error(ParseErrorKind::UnexpectedChar(found))),
            None => Err(self.error(ParseErrorKind::UnexpectedEnd)),
        }
    }

    /// Consume characters while `pred` holds and return them.
    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if pred(c)) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Enter one nesting level (group, literal, argument list).
    pub fn descend(&mut self) -> Result<(), ParseError> {
        if self.depth >= self.max_depth {
            return Err(self.error(ParseErrorKind::TooDeep(self.max_depth)));
        }
        self.depth += 1;
        Ok(())
    }

    pub fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.pos, kind)
    }

    pub fn error_at(&self, pos: usize, kind: ParseErrorKind) -> ParseError {
        ParseError::new(pos, kind)
    }

    /// Error for whatever is at the current position.
    pub fn unexpected(&self) -> ParseError {
        match self.peek() {
            Some(c) => self.error(ParseErrorKind::UnexpectedChar(c)),
            None => self.error(ParseErrorKind::UnexpectedEnd),
        }
    }
}
