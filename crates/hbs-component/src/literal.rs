/*
 * literal.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Lenient structured-literal parser.
//!
//! Parses the relaxed JSON dialect ("jsonic") that template authors write in
//! inline component arguments and data files:
//!
//! - Unquoted object keys: `{color: red}`
//! - Single- or double-quoted strings: `['col-md-6', "col-lg-6"]`
//! - Bare words as strings: `[primary, secondary]`
//! - Trailing commas: `[1, 2,]`
//! - Comments: `// line`, `/* block */`
//! - An implicit top-level object: `size: large, color: teal`
//!
//! Every valid JSON document parses to the same value as with `serde_json`.

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Maximum nesting of arrays and objects.
const MAX_DEPTH: usize = 128;

/// Error produced when a literal cannot be parsed.
///
/// The message follows the `Expected <what> but <found> found.` format that
/// template authors see verbatim in component errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LiteralError {
    /// Human-readable description of the failure.
    pub message: String,
    /// Character offset at which parsing failed.
    pub offset: usize,
}

/// Parse a lenient literal into a JSON value.
///
/// Empty input (or input consisting only of whitespace and comments) parses
/// to `Value::Null`.
pub fn parse(input: &str) -> Result<Value, LiteralError> {
    let mut parser = LiteralParser::new(input);
    parser.parse_document()
}

struct LiteralParser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

/// Which characters end a bare (unquoted) token.
#[derive(Clone, Copy, PartialEq, Eq)]
enum BareMode {
    /// Object keys and top-level tokens also stop at `:`.
    Key,
    Value,
}

impl LiteralParser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            depth: 0,
        }
    }

    fn parse_document(&mut self) -> Result<Value, LiteralError> {
        self.skip_insignificant();
        let Some(first) = self.peek() else {
            return Ok(Value::Null);
        };

        let value = match first {
            '{' | '[' | '"' | '\'' => self.parse_value()?,
            _ => {
                let token = self.parse_bare(BareMode::Key)?;
                self.skip_insignificant();
                if self.peek() == Some(':') {
                    Value::String(token)
                } else {
                    interpret_bare(token)
                }
            }
        };

        self.skip_insignificant();
        let value = match (self.peek(), value) {
            (Some(':'), Value::String(first_key)) => self.parse_implicit_object(first_key)?,
            (_, value) => value,
        };

        self.skip_insignificant();
        match self.peek() {
            None => Ok(value),
            Some(_) => Err(self.expected("end of input")),
        }
    }

    /// Parse `key: value, key: value` without surrounding braces. The first
    /// key has already been consumed and the cursor sits on its `:`.
    fn parse_implicit_object(&mut self, first_key: String) -> Result<Value, LiteralError> {
        let mut map = Map::new();
        let mut key = first_key;
        loop {
            self.expect_char(':')?;
            self.skip_insignificant();
            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_insignificant();
            if self.peek() != Some(',') {
                break;
            }
            self.pos += 1;
            self.skip_insignificant();
            if self.peek().is_none() {
                break;
            }
            key = self.parse_key()?;
            self.skip_insignificant();
        }
        Ok(Value::Object(map))
    }

    fn parse_value(&mut self) -> Result<Value, LiteralError> {
        match self.peek() {
            Some('{') => self.parse_object(),
            Some('[') => self.parse_array(),
            Some(quote @ ('"' | '\'')) => self.parse_string(quote).map(Value::String),
            Some(',' | '}' | ']' | ':') | None => Err(self.expected("value")),
            Some(_) => self.parse_bare(BareMode::Value).map(interpret_bare),
        }
    }

    fn parse_object(&mut self) -> Result<Value, LiteralError> {
        self.enter()?;
        self.pos += 1;
        let mut map = Map::new();
        loop {
            self.skip_insignificant();
            if self.peek() == Some('}') {
                self.pos += 1;
                break;
            }
            let key = self.parse_key()?;
            self.skip_insignificant();
            self.expect_char(':')?;
            self.skip_insignificant();
            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_insignificant();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('}') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.expected("\",\" or \"}\"")),
            }
        }
        self.depth -= 1;
        Ok(Value::Object(map))
    }

    fn parse_array(&mut self) -> Result<Value, LiteralError> {
        self.enter()?;
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_insignificant();
            if self.peek() == Some(']') {
                self.pos += 1;
                break;
            }
            items.push(self.parse_value()?);

            self.skip_insignificant();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.expected("\",\" or \"]\"")),
            }
        }
        self.depth -= 1;
        Ok(Value::Array(items))
    }

    fn parse_key(&mut self) -> Result<String, LiteralError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => self.parse_string(quote),
            Some(',' | '{' | '}' | '[' | ']' | ':') | None => Err(self.expected("key")),
            Some(_) => self.parse_bare(BareMode::Key),
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<String, LiteralError> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(self.expected(&format!("\"{}\"", quote)));
            };
            self.pos += 1;
            match c {
                c if c == quote => return Ok(out),
                '\\' => out.push(self.parse_escape()?),
                c => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self) -> Result<char, LiteralError> {
        let Some(c) = self.peek() else {
            return Err(self.expected("escape character"));
        };
        self.pos += 1;
        let escaped = match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'u' => {
                let start = self.pos;
                let digits: String = self.chars.iter().skip(start).take(4).collect();
                let code = (digits.len() == 4)
                    .then(|| u32::from_str_radix(&digits, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match code {
                    Some(ch) => {
                        self.pos += 4;
                        ch
                    }
                    None => return Err(self.expected("four hex digits")),
                }
            }
            other => other,
        };
        Ok(escaped)
    }

    /// Read an unquoted token, trimmed of surrounding whitespace.
    fn parse_bare(&mut self, mode: BareMode) -> Result<String, LiteralError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            let stop = matches!(c, ',' | '{' | '}' | '[' | ']' | '\n' | '\r')
                || (mode == BareMode::Key && c == ':')
                || (self.at_comment() && self.after_whitespace(start));
            if stop {
                break;
            }
            self.pos += 1;
        }
        let token: String = self.chars[start..self.pos].iter().collect();
        let token = token.trim();
        if token.is_empty() {
            return Err(self.expected("value"));
        }
        Ok(token.to_string())
    }

    fn enter(&mut self) -> Result<(), LiteralError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(LiteralError {
                message: format!("Nesting deeper than {} levels.", MAX_DEPTH),
                offset: self.pos,
            });
        }
        Ok(())
    }

    fn expect_char(&mut self, expected: char) -> Result<(), LiteralError> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.expected(&format!("\"{}\"", expected)))
        }
    }

    fn at_comment(&self) -> bool {
        self.peek() == Some('/') && matches!(self.peek_at(1), Some('/' | '*'))
    }

    /// A comment only ends a bare token when separated from it by whitespace,
    /// so `http://host` stays one token.
    fn after_whitespace(&self, token_start: usize) -> bool {
        self.pos > token_start && self.chars[self.pos - 1].is_whitespace()
    }

    fn skip_insignificant(&mut self) {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => self.pos += 1,
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                (Some('/'), Some('*')) => {
                    self.pos += 2;
                    while self.peek().is_some() && !(self.peek() == Some('*') && self.peek_at(1) == Some('/')) {
                        self.pos += 1;
                    }
                    self.pos = (self.pos + 2).min(self.chars.len());
                }
                _ => break,
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn expected(&self, what: &str) -> LiteralError {
        let found = match self.peek() {
            Some(c) => format!("\"{}\"", c),
            None => "end of input".to_string(),
        };
        LiteralError {
            message: format!("Expected {} but {} found.", what, found),
            offset: self.pos,
        }
    }
}

/// Turn a bare token into a keyword, number or string.
fn interpret_bare(token: String) -> Value {
    match token.as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }
    if let Ok(int) = token.parse::<i64>() {
        return Value::Number(int.into());
    }
    let numeric_start = token
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '.');
    if numeric_start {
        if let Some(number) = token.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(number);
        }
    }
    Value::String(token)
}
