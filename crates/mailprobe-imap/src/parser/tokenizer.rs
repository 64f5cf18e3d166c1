//! FETCH response tokenizer.
//!
//! Turns the accumulated text of one or more `* n FETCH (...)` responses
//! into one [`Record`] per message.

use tracing::trace;

use super::cursor::Cursor;
use super::token::{Record, Token};
use crate::types::SeqNum;
use crate::{Error, Result};

/// Delimiters between the words of a response preamble.
const HEADER_DELIMITERS: &[u8] = b" \r\n";

/// Bytes of input quoted in parse errors.
const ERROR_CONTEXT: usize = 40;

/// Tokenizes FETCH responses into records, in response order.
///
/// # Errors
///
/// Returns [`Error::Parse`] for a malformed `* n FETCH` header, a bad or
/// truncated `{N}` literal, or a quoted string or list left open at end of
/// input.
pub fn tokenize(input: &[u8]) -> Result<Vec<Record>> {
    Tokenizer::new(input).records()
}

/// Returns true for bytes that may appear in a bare word.
const fn is_word_byte(b: u8) -> bool {
    b > b' ' && b != 0x7F && !matches!(b, b'(' | b')' | b'{' | b'"')
}

struct Tokenizer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    fn skip_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, position: usize, message: impl Into<String>) -> Error {
        let position = position.min(self.input.len());
        let end = (position + ERROR_CONTEXT).min(self.input.len());
        Error::Parse {
            position,
            message: message.into(),
            near: String::from_utf8_lossy(&self.input[position..end]).into_owned(),
        }
    }

    fn records(mut self) -> Result<Vec<Record>> {
        let mut records = Vec::new();

        loop {
            self.skip_while(|b| matches!(b, b' ' | b'\r' | b'\n'));
            if self.peek().is_none() {
                break;
            }

            let seq = self.header()?;
            let tokens = self.record_body()?;
            trace!(seq = seq.get(), tokens = tokens.len(), "tokenized FETCH record");
            records.push(Record { seq, tokens });
        }

        Ok(records)
    }

    /// Consumes `* n FETCH (`.
    fn header(&mut self) -> Result<SeqNum> {
        let start = self.pos;
        let mut cursor = Cursor::default();

        let star = cursor.init(self.remaining(), HEADER_DELIMITERS);
        let id = cursor.next(HEADER_DELIMITERS);
        let fetch = cursor.next(HEADER_DELIMITERS);

        let seq = std::str::from_utf8(id)
            .ok()
            .and_then(|id| id.parse().ok())
            .and_then(SeqNum::new)
            .filter(|_| star == b"*" && fetch.eq_ignore_ascii_case(b"FETCH"));
        let Some(seq) = seq else {
            return Err(self.error_at(start, "malformed FETCH header"));
        };

        self.pos = start + cursor.position();
        self.skip_while(|b| b == b' ');
        if self.peek() != Some(b'(') {
            return Err(self.error("expected '(' after FETCH header"));
        }
        self.pos += 1;

        Ok(seq)
    }

    /// Scans up to and including the `)` that closes the record.
    fn record_body(&mut self) -> Result<Vec<Token>> {
        let mut current = Vec::new();
        let mut open: Vec<Vec<Token>> = Vec::new();

        loop {
            let Some(byte) = self.peek() else {
                return Err(self.error(format!(
                    "unterminated list at depth {}",
                    open.len() + 1
                )));
            };

            match byte {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                b'(' => {
                    self.pos += 1;
                    open.push(std::mem::take(&mut current));
                }
                b')' => {
                    self.pos += 1;
                    match open.pop() {
                        Some(parent) => {
                            let child = std::mem::replace(&mut current, parent);
                            current.push(Token::Container(child));
                        }
                        None => {
                            self.end_of_record()?;
                            return Ok(current);
                        }
                    }
                }
                b'"' => current.push(self.quoted()?),
                b'{' => current.push(self.literal()?),
                b if is_word_byte(b) => current.push(self.word()),
                b => return Err(self.error(format!("unexpected byte {b:#04x}"))),
            }
        }
    }

    fn end_of_record(&mut self) -> Result<()> {
        self.skip_while(|b| b == b' ' || b == b'\t');
        let rest = self.remaining();
        if rest.starts_with(b"\r\n") {
            self.pos += 2;
        } else if rest.starts_with(b"\n") {
            self.pos += 1;
        } else if !rest.is_empty() {
            return Err(self.error("unexpected data after FETCH record"));
        }
        Ok(())
    }

    fn word(&mut self) -> Token {
        let start = self.pos;
        self.skip_while(is_word_byte);
        Token::from_word(&self.input[start..self.pos])
    }

    fn quoted(&mut self) -> Result<Token> {
        let start = self.pos;
        self.pos += 1;
        let mut value = Vec::new();

        loop {
            match self.peek() {
                None => return Err(self.error_at(start, "unterminated quoted string")),
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    if let Some(escaped) = self.peek() {
                        value.push(escaped);
                        self.pos += 1;
                    }
                }
                Some(b) => {
                    value.push(b);
                    self.pos += 1;
                }
            }
        }

        Ok(Token::Quoted(String::from_utf8_lossy(&value).into_owned()))
    }

    /// Consumes `{N}` CRLF and exactly N raw bytes.
    fn literal(&mut self) -> Result<Token> {
        let start = self.pos;
        self.pos += 1;

        let digits_start = self.pos;
        self.skip_while(|b| b.is_ascii_digit());
        let digits = &self.input[digits_start..self.pos];
        if digits.is_empty() || self.peek() != Some(b'}') {
            return Err(self.error_at(start, "non-numeric literal length"));
        }

        let len: usize = std::str::from_utf8(digits)
            .ok()
            .and_then(|d| d.parse().ok())
            .ok_or_else(|| self.error_at(start, "literal length overflows"))?;
        self.pos += 1;

        let rest = self.remaining();
        if rest.starts_with(b"\r\n") {
            self.pos += 2;
        } else if rest.starts_with(b"\n") {
            self.pos += 1;
        } else {
            return Err(self.error("expected line break after literal length"));
        }

        let available = self.remaining().len();
        if available < len {
            return Err(self.error_at(
                start,
                format!("truncated literal: {len} bytes announced, {available} available"),
            ));
        }

        let bytes = self.input[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(Token::Atom(bytes))
    }
}
