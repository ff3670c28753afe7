//! `TokenReader`: pull-based JSON tokenizer.
//!
//! The byte-level readers (`read_str`, literal matching, array capture)
//! follow the `JsonDecoder` of json-joy-json-pack; here they are driven by
//! an explicit frame stack so tokens can be handed out one at a time.
//! Numbers are checked against the RFC 8259 grammar and kept as literal
//! text.

use std::iter::FusedIterator;

use crate::error::TokenError;
use crate::token::{ScalarKind, Token};
use crate::util::{decode_json_string, find_array_end, find_ending_quote};

const BIN_PREFIX: &[u8] = b"data:application/octet-stream;base64,";

/// Deepest object nesting accepted, matching serde_json's recursion limit.
pub const MAX_DEPTH: usize = 128;

/// Position inside an open object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    /// Right after `{`.
    Open,
    /// After a member value, expecting `,` or `}`.
    Member,
    /// After `name:`, expecting the member value.
    Value,
}

#[derive(Debug, Clone)]
pub struct TokenReader<'a> {
    data: &'a [u8],
    x: usize,
    stack: Vec<Frame>,
    started: bool,
    done: bool,
}

impl<'a> TokenReader<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::from_bytes(input.as_bytes())
    }

    pub fn from_bytes(data: &'a [u8]) -> Self {
        Self {
            data,
            x: 0,
            stack: Vec::new(),
            started: false,
            done: false,
        }
    }

    /// Byte offset of the next unread input.
    pub fn offset(&self) -> usize {
        self.x
    }

    /// Number of currently open objects.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.x).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.x += 1;
        }
    }

    fn set_top(&mut self, frame: Frame) {
        if let Some(top) = self.stack.last_mut() {
            *top = frame;
        }
    }

    fn end_of_input(&self) -> TokenError {
        if self.stack.is_empty() {
            TokenError::Invalid(self.x)
        } else {
            TokenError::Unbalanced(self.x)
        }
    }

    fn read_token(&mut self) -> Result<Option<Token>, TokenError> {
        self.skip_whitespace();
        let Some(frame) = self.stack.last().copied() else {
            if self.started {
                if self.x < self.data.len() {
                    return Err(TokenError::Invalid(self.x));
                }
                return Ok(None);
            }
            self.started = true;
            return self.read_value().map(Some);
        };
        let ch = self.peek().ok_or_else(|| self.end_of_input())?;
        if frame == Frame::Value {
            self.set_top(Frame::Member);
            return self.read_value().map(Some);
        }
        if ch == b'}' {
            self.x += 1;
            self.stack.pop();
            return Ok(Some(Token::EndObject));
        }
        if frame == Frame::Member {
            if ch != b',' {
                return Err(TokenError::Invalid(self.x));
            }
            self.x += 1;
            self.skip_whitespace();
        }
        let key = self.read_key()?;
        self.skip_whitespace();
        match self.peek() {
            Some(b':') => self.x += 1,
            Some(_) => return Err(TokenError::Invalid(self.x)),
            None => return Err(self.end_of_input()),
        }
        self.set_top(Frame::Value);
        Ok(Some(Token::PropertyName(key)))
    }

    fn read_value(&mut self) -> Result<Token, TokenError> {
        self.skip_whitespace();
        let x = self.x;
        let ch = self.peek().ok_or_else(|| self.end_of_input())?;
        match ch {
            b'{' => {
                if self.stack.len() >= MAX_DEPTH {
                    return Err(TokenError::TooDeep(x));
                }
                self.x += 1;
                self.stack.push(Frame::Open);
                Ok(Token::StartObject)
            }
            b'[' => self.read_arr(),
            b'"' => {
                let text = self.read_str()?;
                let kind = if text.as_bytes().starts_with(BIN_PREFIX) {
                    ScalarKind::Binary
                } else {
                    ScalarKind::String
                };
                Ok(Token::Scalar { kind, text })
            }
            b't' => {
                self.read_literal(b"true")?;
                Ok(Token::scalar(ScalarKind::Boolean, "true"))
            }
            b'f' => {
                self.read_literal(b"false")?;
                Ok(Token::scalar(ScalarKind::Boolean, "false"))
            }
            b'n' => {
                self.read_literal(b"null")?;
                Ok(Token::Null)
            }
            c if c.is_ascii_digit() || c == b'-' => self.read_num(),
            _ => Err(TokenError::Invalid(x)),
        }
    }

    fn read_literal(&mut self, literal: &[u8]) -> Result<(), TokenError> {
        let end = self.x + literal.len();
        if end > self.data.len() || &self.data[self.x..end] != literal {
            return Err(TokenError::Invalid(self.x));
        }
        self.x = end;
        Ok(())
    }

    /// `-? (0 | [1-9][0-9]*) (. [0-9]+)? ([eE] [+-]? [0-9]+)?`
    fn read_num(&mut self) -> Result<Token, TokenError> {
        let start = self.x;
        let data = self.data;
        let digits = |mut x: usize| {
            while x < data.len() && data[x].is_ascii_digit() {
                x += 1;
            }
            x
        };
        let invalid = || TokenError::Invalid(start);

        let mut x = start;
        if data.get(x) == Some(&b'-') {
            x += 1;
        }
        match data.get(x) {
            Some(b'0') => {
                x += 1;
                if data.get(x).is_some_and(u8::is_ascii_digit) {
                    return Err(invalid());
                }
            }
            Some(b'1'..=b'9') => x = digits(x),
            _ => return Err(invalid()),
        }
        if data.get(x) == Some(&b'.') {
            let end = digits(x + 1);
            if end == x + 1 {
                return Err(invalid());
            }
            x = end;
        }
        if let Some(b'e' | b'E') = data.get(x) {
            x += 1;
            if let Some(b'+' | b'-') = data.get(x) {
                x += 1;
            }
            let end = digits(x);
            if end == x {
                return Err(invalid());
            }
            x = end;
        }

        let s = std::str::from_utf8(&data[start..x]).map_err(|_| TokenError::InvalidUtf8)?;
        self.x = x;
        Ok(Token::scalar(ScalarKind::Number, s))
    }

    fn read_str(&mut self) -> Result<String, TokenError> {
        if self.peek() != Some(b'"') {
            return Err(TokenError::Invalid(self.x));
        }
        let x0 = self.x + 1;
        let x1 = find_ending_quote(self.data, x0)?;
        let s = decode_json_string(&self.data[x0..x1])?;
        self.x = x1 + 1;
        Ok(s)
    }

    fn read_key(&mut self) -> Result<String, TokenError> {
        if self.x >= self.data.len() {
            return Err(self.end_of_input());
        }
        self.read_str()
    }

    /// Arrays are captured whole and re-rendered compactly.
    fn read_arr(&mut self) -> Result<Token, TokenError> {
        let start = self.x;
        let end = find_array_end(self.data, start)?;
        let value: serde_json::Value =
            serde_json::from_slice(&self.data[start..end]).map_err(|_| TokenError::Invalid(start))?;
        self.x = end;
        Ok(Token::scalar(ScalarKind::Array, serde_json::to_string(&value)?))
    }
}

impl Iterator for TokenReader<'_> {
    type Item = Result<Token, TokenError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_token() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl FusedIterator for TokenReader<'_> {}
