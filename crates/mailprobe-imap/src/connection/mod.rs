//! IMAP connection management.
//!
//! This module provides connection handling for IMAP servers, including:
//! - Configuration (host, port, security mode, credentials)
//! - TLS/plaintext stream abstraction
//! - Framed I/O with literal reassembly
//! - Tagged command execution
//! - The [`Client`] that ties these to the parser and assembler

mod client;
mod config;
mod executor;
mod framed;
mod stream;

pub use client::Client;
pub use config::{Config, ConfigBuilder, Security};
pub use executor::Executor;
pub use framed::{FramedStream, MAX_LINE_LENGTH, MAX_LITERAL_SIZE};
pub(crate) use framed::trim_line_end;
pub use stream::{ImapStream, connect, connect_plain, connect_tls, create_tls_connector};
