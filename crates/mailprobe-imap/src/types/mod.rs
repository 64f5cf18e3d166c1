//! Core IMAP and domain types.

#![allow(clippy::missing_const_for_fn)]

mod email;
mod identifiers;
mod sequence;

pub use email::{Attachment, Email, EmailAddresses, humanize_bytes};
pub use identifiers::{SeqNum, Tag, Uid};
pub use sequence::UidSet;
