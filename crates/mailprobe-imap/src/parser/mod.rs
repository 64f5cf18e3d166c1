//! IMAP response parsing.
//!
//! The parser is sans-I/O: it works on response bytes already read by the
//! executor.
//!
//! - [`Cursor`]: delimiter scanner for response preambles
//! - [`tokenize`]: turns FETCH responses into [`Record`] token trees
//! - [`FieldReader`]: checked positional and typed access into a record
//! - [`parse_list`] / [`parse_search`]: LIST and SEARCH responses
//!
//! # Example
//!
//! ```
//! use mailprobe_imap::parser::{Token, tokenize};
//!
//! let records = tokenize(b"* 1 FETCH (UID 42 FLAGS (\\Seen))\r\n").unwrap();
//! assert_eq!(records[0].tokens[1], Token::Number(42));
//! ```

mod cursor;
mod token;
mod tokenizer;
mod untagged;
mod validate;

pub use cursor::Cursor;
pub use token::{Record, Token, TokenKind};
pub use tokenizer::tokenize;
pub use untagged::{is_fetch, parse_list, parse_search};
pub use validate::FieldReader;
