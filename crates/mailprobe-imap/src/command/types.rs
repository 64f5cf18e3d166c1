//! Command-related type definitions.

use std::fmt;

/// FETCH items to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchItems {
    /// `ALL`: FLAGS INTERNALDATE RFC822.SIZE ENVELOPE.
    All,
    /// `BODY.PEEK[]`: the whole raw message, without setting `\Seen`.
    BodyPeek,
}

impl FetchItems {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::BodyPeek => "BODY.PEEK[]",
        }
    }
}

impl fmt::Display for FetchItems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
