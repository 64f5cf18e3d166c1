//! # mailprobe-mime
//!
//! MIME message parsing for fetched email.
//!
//! ## Features
//!
//! - **Message parsing**: Parse MIME messages with nested multipart support
//! - **Body extraction**: Plain text, HTML, attachments and inline parts
//! - **Decoding**: Base64, Quoted-Printable, RFC 2047 encoded words
//! - **Charsets**: Pluggable [`charset::CharsetResolver`] with vendor aliases
//! - **Addresses**: Address-list headers, including groups
//!
//! ## Quick Start
//!
//! ```
//! use mailprobe_mime::Message;
//!
//! let raw = b"From: sender@example.com\r\n\
//!             Subject: Test\r\n\
//!             Content-Type: text/plain\r\n\
//!             \r\n\
//!             Hello, World!";
//!
//! let message = Message::parse(raw).unwrap();
//! assert_eq!(message.subject(), Some("Test"));
//! assert_eq!(message.text, "Hello, World!");
//! ```
//!
//! ### Decoding Headers
//!
//! ```
//! use mailprobe_mime::charset::DefaultResolver;
//! use mailprobe_mime::encoding::decode_header;
//!
//! let subject = decode_header("=?cp1252?Q?caf=E9?=", &DefaultResolver).unwrap();
//! assert_eq!(subject, "café");
//! ```

mod content_type;
mod error;
mod header;
mod message;

pub mod charset;
pub mod encoding;

pub use content_type::{ContentDisposition, ContentType};
pub use error::{Error, Result};
pub use header::{Address, Headers, parse_address_list};
pub use message::{Attachment, Message, Part, TransferEncoding};
