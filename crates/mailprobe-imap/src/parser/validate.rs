//! Checked access into token trees.
//!
//! Every positional or typed read of a [`Record`] goes through a
//! [`FieldReader`], so unexpected server output surfaces as
//! [`Error::UnexpectedToken`] or [`Error::MissingField`] instead of a panic.

use std::fmt::Display;

use super::token::{Record, Token, TokenKind};
use crate::types::Uid;
use crate::{Error, Result};

/// Reads fields out of one record, reporting the record on failure.
#[derive(Debug, Clone, Copy)]
pub struct FieldReader<'r> {
    record: &'r Record,
}

impl<'r> FieldReader<'r> {
    /// Creates a reader for `record`.
    #[must_use]
    pub const fn new(record: &'r Record) -> Self {
        Self { record }
    }

    /// Returns the record being read.
    #[must_use]
    pub const fn record(&self) -> &'r Record {
        self.record
    }

    /// Succeeds if `token` is one of the `accepted` kinds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedToken`] naming the accepted kinds, the
    /// token, `field` and the whole record.
    pub fn expect<'t>(
        &self,
        token: &'t Token,
        accepted: &[TokenKind],
        field: impl Display,
    ) -> Result<&'t Token> {
        if accepted.contains(&token.kind()) {
            Ok(token)
        } else {
            Err(self.unexpected(token, accepted, field))
        }
    }

    /// Returns `tokens[index]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if the list is too short.
    pub fn child<'t>(&self, tokens: &'t [Token], index: usize, field: impl Display) -> Result<&'t Token> {
        tokens.get(index).ok_or_else(|| Error::MissingField {
            field: format!("{field} (position {index} of {})", tokens.len()),
            record: self.record.to_string(),
        })
    }

    /// Returns the value following the field name at `index` in the
    /// record's top level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if the name is the last token.
    pub fn value_after(&self, index: usize, name: &str) -> Result<&'r Token> {
        self.child(&self.record.tokens, index + 1, format_args!("value after {name}"))
    }

    /// Reads a `Number` token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedToken`] for any other kind.
    pub fn number(&self, token: &Token, field: impl Display) -> Result<u64> {
        match token {
            Token::Number(n) => Ok(*n),
            other => Err(self.unexpected(other, &[TokenKind::Number], field)),
        }
    }

    /// Reads a `Literal` token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedToken`] for any other kind.
    pub fn literal<'t>(&self, token: &'t Token, field: impl Display) -> Result<&'t str> {
        match token {
            Token::Literal(s) => Ok(s),
            other => Err(self.unexpected(other, &[TokenKind::Literal], field)),
        }
    }

    /// Reads a `Number` token holding a valid UID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedToken`] for any other kind, zero, or a
    /// value wider than 32 bits.
    pub fn uid(&self, token: &Token, field: impl Display) -> Result<Uid> {
        let uid = match token {
            Token::Number(n) => u32::try_from(*n).ok().and_then(Uid::new),
            _ => None,
        };
        uid.ok_or_else(|| Error::UnexpectedToken {
            field: field.to_string(),
            expected: "Number (non-zero, 32-bit)".to_string(),
            found: token.to_string(),
            record: self.record.to_string(),
        })
    }

    /// Reads the children of a `Container` token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedToken`] for any other kind.
    pub fn container<'t>(&self, token: &'t Token, field: impl Display) -> Result<&'t [Token]> {
        match token {
            Token::Container(children) => Ok(children),
            other => Err(self.unexpected(other, &[TokenKind::Container], field)),
        }
    }

    /// Reads a textual token of one of the `accepted` kinds.
    ///
    /// `Nil` reads as the empty string and `Number` as its decimal form;
    /// `Atom` bytes are decoded as lossy UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedToken`] if the kind is not accepted.
    pub fn text(&self, token: &Token, accepted: &[TokenKind], field: impl Display) -> Result<String> {
        let token = self.expect(token, accepted, field)?;
        Ok(match token {
            Token::Literal(s) | Token::Quoted(s) => s.clone(),
            Token::Atom(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Token::Number(n) => n.to_string(),
            Token::Nil | Token::Container(_) => String::new(),
        })
    }

    fn unexpected(&self, token: &Token, accepted: &[TokenKind], field: impl Display) -> Error {
        let expected: Vec<_> = accepted.iter().map(|k| k.name()).collect();
        Error::UnexpectedToken {
            field: field.to_string(),
            expected: expected.join("|"),
            found: token.to_string(),
            record: self.record.to_string(),
        }
    }
}
