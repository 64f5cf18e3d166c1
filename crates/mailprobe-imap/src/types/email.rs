//! Domain records assembled from FETCH responses.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

/// Addresses of one role (From, To, ...), keyed by lower-cased
/// `mailbox@host` with the display name as value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailAddresses(BTreeMap<String, String>);

impl EmailAddresses {
    /// Creates an empty address map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Adds an address. The key is lower-cased; a later name for the same
    /// address replaces an earlier one.
    pub fn insert(&mut self, address: &str, name: impl Into<String>) {
        self.0.insert(address.to_lowercase(), name.into());
    }

    /// Looks up the display name for an address.
    #[must_use]
    pub fn get(&self, address: &str) -> Option<&str> {
        self.0.get(&address.to_lowercase()).map(String::as_str)
    }

    /// Number of addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no addresses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates `(address, name)` pairs in address order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(a, n)| (a.as_str(), n.as_str()))
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for EmailAddresses {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut addresses = Self::new();
        for (address, name) in iter {
            addresses.insert(address, name);
        }
        addresses
    }
}

impl fmt::Display for EmailAddresses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (address, name)) in self.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            if name.is_empty() {
                write!(f, "{address}")?;
            } else if name.contains(',') {
                write!(f, "\"{}\" <{address}>", crate::command::escape(name))?;
            } else {
                write!(f, "{name} <{address}>")?;
            }
        }
        Ok(())
    }
}

/// A message attachment or inline part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name, empty if the part had none.
    pub name: String,
    /// `type/subtype`.
    pub mime_type: String,
    /// Decoded content.
    pub content: Vec<u8>,
}

impl From<mailprobe_mime::Attachment> for Attachment {
    fn from(part: mailprobe_mime::Attachment) -> Self {
        Self {
            name: part.file_name,
            mime_type: part.content_type,
            content: part.content,
        }
    }
}

impl fmt::Display for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {})",
            self.name,
            self.mime_type,
            humanize_bytes(self.content.len() as u64)
        )
    }
}

/// A message, keyed externally by its UID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Email {
    /// Flags in server order.
    pub flags: Vec<String>,
    /// INTERNALDATE.
    pub received: Option<DateTime<Utc>>,
    /// Envelope date, if it could be parsed.
    pub sent: Option<DateTime<Utc>>,
    /// RFC822.SIZE in bytes.
    pub size: u64,
    /// Decoded subject.
    pub subject: String,
    /// Message-ID header value.
    pub message_id: String,
    /// From addresses.
    pub from: EmailAddresses,
    /// To addresses.
    pub to: EmailAddresses,
    /// Reply-To addresses.
    pub reply_to: EmailAddresses,
    /// CC addresses.
    pub cc: EmailAddresses,
    /// BCC addresses.
    pub bcc: EmailAddresses,
    /// Plain-text body.
    pub text: String,
    /// HTML body.
    pub html: String,
    /// Attachments followed by inline parts.
    pub attachments: Vec<Attachment>,
}

/// Longest body preview shown by `Display`, in characters.
const PREVIEW_CHARS: usize = 20;

fn write_preview(f: &mut fmt::Formatter<'_>, label: &str, body: &str) -> fmt::Result {
    if body.is_empty() {
        return Ok(());
    }
    let preview: String = body.chars().take(PREVIEW_CHARS).collect();
    let ellipsis = if preview.len() < body.len() { "..." } else { "" };
    writeln!(
        f,
        "{label}: {preview}{ellipsis} ({})",
        humanize_bytes(body.len() as u64)
    )
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Subject: {}", self.subject)?;

        for (label, addresses) in [
            ("To", &self.to),
            ("From", &self.from),
            ("CC", &self.cc),
            ("BCC", &self.bcc),
            ("ReplyTo", &self.reply_to),
        ] {
            if !addresses.is_empty() {
                writeln!(f, "{label}: {addresses}")?;
            }
        }

        write_preview(f, "Text", &self.text)?;
        write_preview(f, "HTML", &self.html)?;

        if !self.attachments.is_empty() {
            let names: Vec<_> = self.attachments.iter().map(ToString::to_string).collect();
            writeln!(
                f,
                "{} Attachment(s): [{}]",
                self.attachments.len(),
                names.join(", ")
            )?;
        }

        Ok(())
    }
}

/// Renders a byte count with SI units (`1.5 kB`, `83 MB`).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn humanize_bytes(bytes: u64) -> String {
    const UNITS: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];

    if bytes < 10 {
        return format!("{bytes} B");
    }

    let mut exponent = 0;
    let mut scale = 1u64;
    while exponent < UNITS.len() - 1 && bytes / scale >= 1000 {
        scale *= 1000;
        exponent += 1;
    }

    let value = (bytes as f64 / scale as f64 * 10.0).round() / 10.0;
    if value < 10.0 {
        format!("{value:.1} {}", UNITS[exponent])
    } else {
        format!("{value:.0} {}", UNITS[exponent])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize_bytes() {
        assert_eq!(humanize_bytes(0), "0 B");
        assert_eq!(humanize_bytes(9), "9 B");
        assert_eq!(humanize_bytes(100), "100 B");
        assert_eq!(humanize_bytes(1_500), "1.5 kB");
        assert_eq!(humanize_bytes(82_854_982), "83 MB");
        assert_eq!(humanize_bytes(u64::MAX), "18 EB");
    }

    #[test]
    fn test_addresses_keyed_lowercase() {
        let mut addresses = EmailAddresses::new();
        addresses.insert("John@Example.COM", "John");
        assert_eq!(addresses.get("john@example.com"), Some("John"));
        assert_eq!(addresses.len(), 1);
    }

    #[test]
    fn test_addresses_display() {
        let addresses: EmailAddresses = [
            ("a@example.com", "Alice"),
            ("b@example.com", ""),
            ("c@example.com", "Doe, \"C\""),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            addresses.to_string(),
            r#"Alice <a@example.com>, b@example.com, "Doe, \"C\"" <c@example.com>"#
        );
    }

    #[test]
    fn test_email_display() {
        let mut email = Email {
            subject: "Quarterly report".to_string(),
            text: "The numbers are in and they look good".to_string(),
            html: "<p>hi</p>".to_string(),
            ..Email::default()
        };
        email.from.insert("cfo@example.com", "CFO");
        email.attachments.push(Attachment {
            name: "q1.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            content: vec![0; 2_048],
        });

        let rendered = email.to_string();
        assert_eq!(
            rendered,
            "Subject: Quarterly report\n\
             From: CFO <cfo@example.com>\n\
             Text: The numbers are in a... (37 B)\n\
             HTML: <p>hi</p> (9 B)\n\
             1 Attachment(s): [q1.pdf (application/pdf 2.0 kB)]\n"
        );
    }
}
