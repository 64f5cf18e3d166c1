//! Error types for the IMAP library.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Response text could not be tokenized.
    #[error("Parse error at position {position}: {message} (near {near:?})")]
    Parse {
        /// Byte offset into the response where the error occurred.
        position: usize,
        /// Description of what went wrong.
        message: String,
        /// The offending prefix of the unconsumed input.
        near: String,
    },

    /// A token of the wrong kind sits at a known field position.
    #[error("expected {expected} token {field}, got {found} in {record}")]
    UnexpectedToken {
        /// Where in the record the token was read.
        field: String,
        /// Accepted kinds, joined with `|`.
        expected: String,
        /// The offending token.
        found: String,
        /// The whole enclosing record.
        record: String,
    },

    /// A positional field is absent from a record.
    #[error("missing {field} in {record}")]
    MissingField {
        /// Description of the absent field.
        field: String,
        /// The whole enclosing record.
        record: String,
    },

    /// Server returned NO response.
    #[error("Server returned NO: {0}")]
    No(String),

    /// Server returned BAD response.
    #[error("Server returned BAD: {0}")]
    Bad(String),

    /// Tagged completion with a status other than OK, NO or BAD.
    #[error("Command rejected with {status}: {text}")]
    Rejected {
        /// Status word following the tag.
        status: String,
        /// Remainder of the completion line.
        text: String,
    },

    /// Connection establishment timed out.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid state for the requested operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Protocol violation or unexpected data.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Error from the MIME layer that invalidates a whole response.
    #[error("MIME error: {0}")]
    Mime(#[from] mailprobe_mime::Error),
}

impl Error {
    /// Returns true if the error means the transport is unusable.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Tls(_) | Self::InvalidDnsName(_) | Self::Timeout(_)
        )
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
