//! Cursor over the argument text that follows a command's alias.
//!
//! Supports:
//! - Whitespace-separated tokens
//! - Double-quoted strings: `"hello world"` → `hello world`
//! - Single-quoted strings: `'hello world'` → `hello world`
//! - Escape sequences in quotes: `"say \"hi\""` → `say "hi"`
//!
//! Every read that fails leaves the cursor at the start of the offending
//! token, so the error position points at what the user typed.

use crate::error::ArgumentParseError;

/// Opaque snapshot of a reader's cursor, restored with [`ArgumentReader::set_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderState(usize);

/// Mutable cursor over a single argument string.
#[derive(Debug, Clone)]
pub struct ArgumentReader {
    input: String,
    cursor: usize,
}

impl ArgumentReader {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            cursor: 0,
        }
    }

    /// The full argument string.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Byte offset of the cursor.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Text not yet consumed, including leading whitespace.
    pub fn remaining(&self) -> &str {
        &self.input[self.cursor..]
    }

    /// Text already consumed.
    pub fn parsed(&self) -> &str {
        &self.input[..self.cursor]
    }

    /// Whether any character, whitespace included, is left.
    pub fn can_read(&self) -> bool {
        self.cursor < self.input.len()
    }

    /// Whether a non-whitespace token is left.
    pub fn has_remaining_tokens(&self) -> bool {
        !self.remaining().trim_start().is_empty()
    }

    pub fn state(&self) -> ReaderState {
        ReaderState(self.cursor)
    }

    pub fn set_state(&mut self, state: ReaderState) {
        self.cursor = state.0.min(self.input.len());
    }

    pub fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    pub fn read_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.cursor += c.len_utf8();
        Some(c)
    }

    pub fn skip_whitespace(&mut self) {
        let remaining = self.remaining();
        self.cursor += remaining.len() - remaining.trim_start().len();
    }

    /// Builds a parse error anchored at the current cursor.
    pub fn error(&self, message: impl Into<String>) -> ArgumentParseError {
        ArgumentParseError::new(message, self.input.clone(), self.cursor)
    }

    /// Reads up to the next whitespace. Quotes are not interpreted.
    pub fn parse_unquoted_string(&mut self) -> Result<String, ArgumentParseError> {
        self.skip_whitespace();
        let remaining = self.remaining();
        let end = remaining
            .find(char::is_whitespace)
            .unwrap_or(remaining.len());
        if end == 0 {
            return Err(self.error("Expected a word, found end of input"));
        }
        let word = remaining[..end].to_string();
        self.cursor += end;
        Ok(word)
    }

    /// Reads one token, honouring single or double quotes around it.
    pub fn parse_string(&mut self) -> Result<String, ArgumentParseError> {
        self.skip_whitespace();
        match self.peek_char() {
            Some(quote @ ('"' | '\'')) => {
                let start = self.state();
                self.read_char();
                self.collect_quoted(quote).map_err(|message| {
                    self.set_state(start);
                    self.error(message)
                })
            }
            _ => self.parse_unquoted_string(),
        }
    }

    /// Reads the next token without consuming it.
    pub fn peek_string(&mut self) -> Result<String, ArgumentParseError> {
        let state = self.state();
        let result = self.parse_string();
        self.set_state(state);
        result
    }

    pub fn parse_int(&mut self) -> Result<i32, ArgumentParseError> {
        self.parse_number("an integer")
    }

    pub fn parse_long(&mut self) -> Result<i64, ArgumentParseError> {
        self.parse_number("a whole number")
    }

    pub fn parse_double(&mut self) -> Result<f64, ArgumentParseError> {
        self.parse_number("a number")
    }

    /// Accepts `true`/`false` and the usual yes/no spellings, case-insensitively.
    pub fn parse_bool(&mut self) -> Result<bool, ArgumentParseError> {
        self.skip_whitespace();
        let start = self.state();
        let token = self.parse_unquoted_string()?;
        match token.to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "on" | "1" => Ok(true),
            "false" | "f" | "no" | "n" | "off" | "0" => Ok(false),
            _ => {
                self.set_state(start);
                Err(self.error(format!("Expected true or false, found '{token}'")))
            }
        }
    }

    fn parse_number<N: std::str::FromStr>(&mut self, what: &str) -> Result<N, ArgumentParseError> {
        self.skip_whitespace();
        let start = self.state();
        let token = self.parse_unquoted_string()?;
        token.parse::<N>().map_err(|_| {
            self.set_state(start);
            self.error(format!("Expected {what}, found '{token}'"))
        })
    }

    /// Collects characters up to the closing `quote`, handling escape sequences.
    fn collect_quoted(&mut self, quote: char) -> Result<String, String> {
        let mut result = String::new();
        let mut escaped = false;

        while let Some(c) = self.read_char() {
            if escaped {
                match c {
                    'n' => result.push('\n'),
                    't' => result.push('\t'),
                    'r' => result.push('\r'),
                    '\\' => result.push('\\'),
                    '"' => result.push('"'),
                    '\'' => result.push('\''),
                    _ => {
                        // Unknown escape, keep as-is
                        result.push('\\');
                        result.push(c);
                    }
                }
                escaped = false;
                continue;
            }

            if c == '\\' {
                escaped = true;
                continue;
            }

            if c == quote {
                return Ok(result);
            }

            result.push(c);
        }

        Err(format!("Unterminated quoted string, expected closing {quote}"))
    }
}
