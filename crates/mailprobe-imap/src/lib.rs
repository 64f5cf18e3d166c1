//! # mailprobe-imap
//!
//! A small IMAP client engine: it issues tagged commands, reassembles
//! responses with embedded literals, tokenizes FETCH responses and builds
//! [`Email`] records from them.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailprobe_imap::{Client, Config};
//!
//! #[tokio::main]
//! async fn main() -> mailprobe_imap::Result<()> {
//!     let config = Config::new("imap.example.com", "user@example.com", "password");
//!     let mut client = Client::connect(&config).await?;
//!
//!     for folder in client.list_folders().await? {
//!         println!("Folder: {folder}");
//!     }
//!
//!     client.examine("INBOX").await?;
//!     let uids = client.search_uids("UNSEEN").await?;
//!     for (uid, email) in client.fetch_emails(&uids).await? {
//!         println!("{uid}\n{email}");
//!     }
//!
//!     client.close().await
//! }
//! ```
//!
//! ## Layers
//!
//! ```text
//! Client ── Executor ── FramedStream ── ImapStream (TLS/TCP)
//!   │
//!   ├── parser::tokenize      FETCH bytes → Record token trees
//!   ├── parser::FieldReader   checked access into a Record
//!   └── assemble              Records → UID → Email
//! ```
//!
//! Fetching emails takes two round trips. `UID FETCH ... ALL` yields an
//! overview per message; `UID FETCH ... BODY.PEEK[]` yields the raw
//! message, which [`mailprobe_mime`] parses and which is merged into the
//! overview.
//!
//! ## Modules
//!
//! - [`assemble`]: building emails from token trees
//! - [`command`]: IMAP command builders and tags
//! - [`connection`]: configuration, transport, execution and the client
//! - [`parser`]: sans-I/O response parsing
//! - [`types`]: identifiers, UID sets and the email model

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod assemble;
pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{Command, FetchItems, TagGenerator};
pub use connection::{Client, Config, ConfigBuilder, Executor, FramedStream, ImapStream, Security};
pub use error::{Error, Result};
pub use parser::{FieldReader, Record, Token, TokenKind, tokenize};
pub use types::{Attachment, Email, EmailAddresses, SeqNum, Tag, Uid, UidSet};
