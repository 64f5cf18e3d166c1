//! IMAP command builder.
//!
//! This module provides the commands the client issues and their
//! serialization. Tags are added by the executor.

mod serialize;
mod tag_generator;
mod types;

use std::fmt;

use crate::types::UidSet;

pub use serialize::{escape, quote, redact, unescape};
pub use tag_generator::{TAG_WIDTH, TagGenerator};
pub use types::FetchItems;

use serialize::write_quoted;

/// IMAP command.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    /// LOGIN command.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// LIST command.
    List {
        /// Reference name.
        reference: String,
        /// Mailbox pattern.
        pattern: String,
    },
    /// SELECT command.
    Select {
        /// Folder to select.
        folder: String,
    },
    /// EXAMINE command (read-only SELECT).
    Examine {
        /// Folder to examine.
        folder: String,
    },
    /// UID SEARCH command.
    UidSearch {
        /// Raw search criteria, e.g. `UNSEEN SINCE 1-Jan-2024`.
        criteria: String,
    },
    /// UID FETCH command.
    UidFetch {
        /// UIDs to fetch.
        uids: UidSet,
        /// Items to fetch.
        items: FetchItems,
    },
}

impl Command {
    /// Serializes the command line without tag or CRLF.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut buf = String::new();

        match self {
            Self::Login { username, password } => {
                buf.push_str("LOGIN ");
                write_quoted(&mut buf, username);
                buf.push(' ');
                write_quoted(&mut buf, password);
            }
            Self::List { reference, pattern } => {
                buf.push_str("LIST ");
                write_quoted(&mut buf, reference);
                buf.push(' ');
                write_quoted(&mut buf, pattern);
            }
            Self::Select { folder } => {
                buf.push_str("SELECT ");
                write_quoted(&mut buf, folder);
            }
            Self::Examine { folder } => {
                buf.push_str("EXAMINE ");
                write_quoted(&mut buf, folder);
            }
            Self::UidSearch { criteria } => {
                buf.push_str("UID SEARCH ");
                buf.push_str(criteria);
            }
            Self::UidFetch { uids, items } => {
                buf.push_str("UID FETCH ");
                buf.push_str(&uids.to_string());
                buf.push(' ');
                buf.push_str(items.as_str());
            }
        }

        buf
    }
}

/// Renders the command with credentials redacted.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(&self.serialize()))
    }
}

// Keeps passwords out of `{:?}` output.
impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command({self})")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Uid;

    #[test]
    fn test_login_serialize() {
        let cmd = Command::Login {
            username: "user@example.com".to_string(),
            password: r#"pa"ss"#.to_string(),
        };
        assert_eq!(cmd.serialize(), r#"LOGIN "user@example.com" "pa\"ss""#);
    }

    #[test]
    fn test_login_display_is_redacted() {
        let cmd = Command::Login {
            username: "user".to_string(),
            password: "hunter2".to_string(),
        };
        assert_eq!(cmd.to_string(), r#"LOGIN "user" "****""#);
        assert!(!format!("{cmd:?}").contains("hunter2"));
    }

    #[test]
    fn test_list_serialize() {
        let cmd = Command::List {
            reference: String::new(),
            pattern: "*".to_string(),
        };
        assert_eq!(cmd.serialize(), r#"LIST "" "*""#);
    }

    #[test]
    fn test_select_examine_serialize() {
        let select = Command::Select {
            folder: r#"Work "2024""#.to_string(),
        };
        assert_eq!(select.serialize(), r#"SELECT "Work \"2024\"""#);

        let examine = Command::Examine {
            folder: "INBOX".to_string(),
        };
        assert_eq!(examine.to_string(), r#"EXAMINE "INBOX""#);
    }

    #[test]
    fn test_uid_search_serialize() {
        let cmd = Command::UidSearch {
            criteria: "UNSEEN".to_string(),
        };
        assert_eq!(cmd.serialize(), "UID SEARCH UNSEEN");
    }

    #[test]
    fn test_uid_fetch_serialize() {
        let uids = UidSet::from_uids([Uid::new(7).unwrap(), Uid::new(42).unwrap()]).unwrap();
        let overview = Command::UidFetch {
            uids,
            items: FetchItems::All,
        };
        assert_eq!(overview.serialize(), "UID FETCH 7,42 ALL");

        let body = Command::UidFetch {
            uids: UidSet::everything(),
            items: FetchItems::BodyPeek,
        };
        assert_eq!(body.serialize(), "UID FETCH 1:* BODY.PEEK[]");
    }
}
