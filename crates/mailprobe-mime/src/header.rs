//! MIME header handling.

use crate::charset::CharsetResolver;
use crate::encoding::decode_header;
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Collection of email headers. Names are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    headers: HashMap<String, Vec<String>>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_lowercase();
        self.headers.entry(name).or_default().push(value.into());
    }

    /// Gets the first raw value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|v| v.first().map(String::as_str))
    }

    /// Returns true if no headers are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Gets the first value for a header with encoded words decoded.
    ///
    /// # Errors
    ///
    /// Returns an error if an encoded word names an unknown charset.
    pub fn decoded(&self, name: &str, resolver: &dyn CharsetResolver) -> Option<Result<String>> {
        self.get(name).map(|value| decode_header(value, resolver))
    }

    /// Parses an address-list header (`From`, `To`, `Cc`, ...).
    ///
    /// Returns `None` if the header is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if a display name uses an unknown charset.
    pub fn address_list(
        &self,
        name: &str,
        resolver: &dyn CharsetResolver,
    ) -> Option<Result<Vec<Address>>> {
        let values = self.headers.get(&name.to_lowercase())?;
        let mut addresses = Vec::new();
        for value in values {
            match parse_address_list(value, resolver) {
                Ok(list) => addresses.extend(list),
                Err(e) => return Some(Err(e)),
            }
        }
        Some(Ok(addresses))
    }

    /// Parses a header block.
    ///
    /// Lines starting with whitespace continue the previous header. Parsing
    /// stops at the first empty line.
    ///
    /// # Errors
    ///
    /// Returns an error if a line is neither a continuation nor a
    /// `Name: value` pair.
    pub fn parse(text: &str) -> Result<Self> {
        let mut headers = Self::new();
        let mut current: Option<(String, String)> = None;

        for line in text.lines() {
            if line.is_empty() {
                break;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some((_, value)) = current.as_mut() {
                    value.push(' ');
                    value.push_str(line.trim());
                    continue;
                }
                return Err(Error::InvalidHeader(format!(
                    "continuation without a header: {line:?}"
                )));
            }

            if let Some((name, value)) = current.take() {
                headers.add(name, value);
            }

            let (name, value) = line
                .split_once(':')
                .filter(|(name, _)| is_field_name(name))
                .ok_or_else(|| Error::InvalidHeader(format!("malformed header line: {line:?}")))?;
            current = Some((name.to_string(), value.trim().to_string()));
        }

        if let Some((name, value)) = current {
            headers.add(name, value);
        }

        Ok(headers)
    }
}

/// RFC 5322 field names are printable ASCII without colon or space.
fn is_field_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| (0x21..=0x7E).contains(&b))
}

/// A mailbox from an address-list header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Display name, empty if none was given.
    pub name: String,
    /// `local@domain`.
    pub email: String,
}

/// Parses a comma-separated address list, flattening groups.
///
/// # Errors
///
/// Returns an error if a display name uses an unknown charset.
pub fn parse_address_list(value: &str, resolver: &dyn CharsetResolver) -> Result<Vec<Address>> {
    let mut addresses = Vec::new();
    for entry in split_entries(value) {
        if let Some(address) = parse_mailbox(&entry, resolver)? {
            addresses.push(address);
        }
    }
    Ok(addresses)
}

/// Splits at top-level `,` and `;`, dropping `group-name:` prefixes.
fn split_entries(value: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut escaped = false;
    let mut angle = false;
    let mut comment = 0usize;

    for c in value.chars() {
        if escaped {
            escaped = false;
            current.push(c);
            continue;
        }
        match c {
            '\\' if quoted || comment > 0 => {
                escaped = true;
                current.push(c);
            }
            '"' if comment == 0 => {
                quoted = !quoted;
                current.push(c);
            }
            '(' if !quoted => {
                comment += 1;
                current.push(c);
            }
            ')' if !quoted && comment > 0 => {
                comment -= 1;
                current.push(c);
            }
            '<' if !quoted && comment == 0 => {
                angle = true;
                current.push(c);
            }
            '>' if !quoted && comment == 0 => {
                angle = false;
                current.push(c);
            }
            ':' if !quoted && !angle && comment == 0 => current.clear(),
            ',' | ';' if !quoted && !angle && comment == 0 => {
                entries.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    entries.push(current);

    entries
        .into_iter()
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect()
}

fn parse_mailbox(entry: &str, resolver: &dyn CharsetResolver) -> Result<Option<Address>> {
    if let (Some(open), Some(close)) = (entry.rfind('<'), entry.rfind('>')) {
        if open < close {
            let email = entry[open + 1..close].trim().to_string();
            if email.is_empty() {
                return Ok(None);
            }
            let name = display_name(entry[..open].trim(), resolver)?;
            return Ok(Some(Address { name, email }));
        }
    }

    // Bare `addr@host (Comment Name)`.
    let (email, comment) = match (entry.find('('), entry.rfind(')')) {
        (Some(open), Some(close)) if open < close => {
            (entry[..open].trim(), entry[open + 1..close].trim())
        }
        _ => (entry, ""),
    };
    if email.is_empty() {
        return Ok(None);
    }

    Ok(Some(Address {
        name: display_name(comment, resolver)?,
        email: email.to_string(),
    }))
}

fn display_name(raw: &str, resolver: &dyn CharsetResolver) -> Result<String> {
    let unquoted = raw
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .map_or_else(|| raw.to_string(), |inner| inner.replace("\\\"", "\"").replace("\\\\", "\\"));
    decode_header(unquoted.trim(), resolver)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::charset::DefaultResolver;

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain"));
    }

    #[test]
    fn test_headers_parse() {
        let text = concat!(
            "From: sender@example.com\r\n",
            "To: recipient@example.com\r\n",
            "Subject: Test Message\r\n",
            "Content-Type: text/plain;\r\n",
            " charset=utf-8\r\n",
            "\r\n",
            "Not: a header\r\n"
        );

        let headers = Headers::parse(text).unwrap();
        assert_eq!(headers.get("From"), Some("sender@example.com"));
        assert_eq!(headers.get("Subject"), Some("Test Message"));
        assert_eq!(
            headers.get("Content-Type"),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(headers.get("Not"), None);
    }

    #[test]
    fn test_headers_parse_rejects_garbage() {
        assert!(Headers::parse("this is not a header\r\n").is_err());
        assert!(Headers::parse(" leading continuation\r\n").is_err());
        assert!(Headers::parse("Bad Name: value\r\n").is_err());
    }

    #[test]
    fn test_decoded_subject() {
        let headers = Headers::parse("Subject: =?utf-8?B?SMOpbGxv?= world\r\n").unwrap();
        let subject = headers.decoded("subject", &DefaultResolver).unwrap().unwrap();
        assert_eq!(subject, "Héllo world");
        assert!(headers.decoded("x-missing", &DefaultResolver).is_none());
    }

    #[test]
    fn test_address_list_forms() {
        let list = parse_address_list(
            "\"Doe, John\" <John@Example.com>, jane@example.org (Jane), <bare@example.net>",
            &DefaultResolver,
        )
        .unwrap();

        assert_eq!(
            list,
            vec![
                Address {
                    name: "Doe, John".to_string(),
                    email: "John@Example.com".to_string(),
                },
                Address {
                    name: "Jane".to_string(),
                    email: "jane@example.org".to_string(),
                },
                Address {
                    name: String::new(),
                    email: "bare@example.net".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_address_list_group() {
        let list =
            parse_address_list("Team: a@example.com, b@example.com;, c@example.com", &DefaultResolver)
                .unwrap();
        let emails: Vec<_> = list.iter().map(|a| a.email.as_str()).collect();
        assert_eq!(emails, ["a@example.com", "b@example.com", "c@example.com"]);
    }

    #[test]
    fn test_address_list_encoded_name() {
        let list =
            parse_address_list("=?utf-8?Q?Ren=C3=A9?= <rene@example.com>", &DefaultResolver).unwrap();
        assert_eq!(list[0].name, "René");
    }

    #[test]
    fn test_header_address_list_absent() {
        let headers = Headers::parse("To: a@example.com\r\n").unwrap();
        assert!(headers.address_list("cc", &DefaultResolver).is_none());
        assert_eq!(
            headers.address_list("to", &DefaultResolver).unwrap().unwrap().len(),
            1
        );
    }
}
