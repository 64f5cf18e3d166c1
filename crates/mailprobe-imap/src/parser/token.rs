//! Token trees produced from FETCH responses.

use std::fmt;

use crate::types::SeqNum;

/// Kind of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Tokenizer idle state; never carried by a produced token.
    Unset,
    /// Length-prefixed raw bytes (`{N}`).
    Atom,
    /// Unsigned integer word.
    Number,
    /// Bare word: field names, flags, `BODY[]`.
    Literal,
    /// Double-quoted string.
    Quoted,
    /// The word `NIL`.
    Nil,
    /// Parenthesized list.
    Container,
}

impl TokenKind {
    /// Returns the kind's name as used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unset => "Unset",
            Self::Atom => "Atom",
            Self::Number => "Number",
            Self::Literal => "Literal",
            Self::Quoted => "Quoted",
            Self::Nil => "Nil",
            Self::Container => "Container",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One element of a FETCH response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Raw bytes of a `{N}` literal, exactly as sent.
    Atom(Vec<u8>),
    /// Fully numeric word.
    Number(u64),
    /// Any other bare word.
    Literal(String),
    /// Quoted string with escapes removed.
    Quoted(String),
    /// `NIL`.
    Nil,
    /// Parenthesized list of tokens.
    Container(Vec<Token>),
}

impl Token {
    /// Returns the token's kind.
    #[must_use]
    pub const fn kind(&self) -> TokenKind {
        match self {
            Self::Atom(_) => TokenKind::Atom,
            Self::Number(_) => TokenKind::Number,
            Self::Literal(_) => TokenKind::Literal,
            Self::Quoted(_) => TokenKind::Quoted,
            Self::Nil => TokenKind::Nil,
            Self::Container(_) => TokenKind::Container,
        }
    }

    /// Classifies a bare word.
    pub(crate) fn from_word(word: &[u8]) -> Self {
        if word == b"NIL" {
            return Self::Nil;
        }
        if word.iter().all(u8::is_ascii_digit)
            && let Some(n) = std::str::from_utf8(word).ok().and_then(|s| s.parse().ok())
        {
            return Self::Number(n);
        }
        Self::Literal(String::from_utf8_lossy(word).into_owned())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(bytes) => write!(f, "(Atom, len {})", bytes.len()),
            Self::Number(n) => write!(f, "(Number {n})"),
            Self::Literal(s) => write!(f, "(Literal {s})"),
            Self::Quoted(s) => write!(f, "(Quoted, len {} {s:?})", s.len()),
            Self::Nil => f.write_str("Nil"),
            Self::Container(children) => {
                f.write_str("(Container children: [")?;
                write_list(f, children)?;
                f.write_str("])")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, tokens: &[Token]) -> fmt::Result {
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{token}")?;
    }
    Ok(())
}

/// The tokens of one `* n FETCH (...)` response.
///
/// The top level alternates field names and values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Message sequence number from the response header.
    pub seq: SeqNum,
    /// Top-level tokens inside the outer parentheses.
    pub tokens: Vec<Token>,
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "* {} FETCH [", self.seq)?;
        write_list(f, &self.tokens)?;
        f.write_str("]")
    }
}
