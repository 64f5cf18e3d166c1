//! MIME message structure and handling.

use crate::charset::{CharsetResolver, DefaultResolver, decode_lossy};
use crate::content_type::{ContentDisposition, ContentType};
use crate::encoding::{decode_base64, decode_header, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;
use std::fmt;

/// Multipart nesting deeper than this is treated as malformed.
const MAX_NESTING: usize = 32;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// MIME entity: headers, raw body and, for multiparts, child parts.
#[derive(Debug, Clone)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body (raw, still transfer-encoded).
    pub body: Vec<u8>,
    /// Child parts of a multipart entity.
    pub parts: Vec<Part>,
}

impl Part {
    /// Gets the content type, defaulting to `text/plain` when absent or
    /// unparseable.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.headers
            .get("content-type")
            .and_then(|v| ContentType::parse(v).ok())
            .unwrap_or_else(ContentType::text_plain)
    }

    /// Gets the content disposition, if any.
    #[must_use]
    pub fn disposition(&self) -> Option<ContentDisposition> {
        self.headers
            .get("content-disposition")
            .map(ContentDisposition::parse)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64(&self.body),
            TransferEncoding::QuotedPrintable => decode_quoted_printable(&self.body),
            _ => Ok(self.body.clone()),
        }
    }

    /// Decoded body, or the raw body if the transfer encoding is broken.
    fn content(&self) -> Vec<u8> {
        self.decode_body().unwrap_or_else(|_| self.body.clone())
    }

    fn file_name(&self, resolver: &dyn CharsetResolver) -> Option<String> {
        let disposition = self.disposition();
        let content_type = self.content_type();
        let raw = disposition
            .as_ref()
            .and_then(ContentDisposition::filename)
            .or_else(|| content_type.name())?;
        Some(decode_header(raw, resolver).unwrap_or_else(|_| raw.to_string()))
    }
}

/// A non-body part of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name, empty if the part has none.
    pub file_name: String,
    /// `type/subtype`.
    pub content_type: String,
    /// Decoded content.
    pub content: Vec<u8>,
}

/// A parsed MIME message with its bodies and attachments extracted.
#[derive(Debug, Clone)]
pub struct Message {
    /// Top-level headers.
    pub headers: Headers,
    /// Root entity.
    pub root: Part,
    /// Concatenated `text/plain` body parts.
    pub text: String,
    /// Concatenated `text/html` body parts.
    pub html: String,
    /// Parts with an `attachment` disposition, or non-text parts without
    /// one.
    pub attachments: Vec<Attachment>,
    /// Parts with an `inline` disposition or Content-ID that are not bodies.
    pub inlines: Vec<Attachment>,
}

impl Message {
    /// Parses a raw RFC 5322 message using the default charset resolver.
    ///
    /// # Errors
    ///
    /// Returns an error if the header block or multipart structure is
    /// malformed.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        Self::parse_with(raw, &DefaultResolver)
    }

    /// Parses a raw message, decoding text parts with `resolver`.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is empty, its header block is
    /// malformed, or a multipart entity has no usable boundary.
    pub fn parse_with(raw: &[u8], resolver: &dyn CharsetResolver) -> Result<Self> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Err(Error::EmptyMessage);
        }

        let root = parse_entity(raw, 0)?;
        if root.headers.is_empty() {
            return Err(Error::InvalidHeader("message has no headers".to_string()));
        }

        let mut message = Self {
            headers: root.headers.clone(),
            root,
            text: String::new(),
            html: String::new(),
            attachments: Vec::new(),
            inlines: Vec::new(),
        };
        let root = message.root.clone();
        message.collect(&root, resolver);
        Ok(message)
    }

    /// Gets the Subject header, undecoded.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.headers.get("subject")
    }

    /// Gets the Message-ID header.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.headers.get("message-id")
    }

    fn collect(&mut self, part: &Part, resolver: &dyn CharsetResolver) {
        if !part.parts.is_empty() {
            for child in &part.parts {
                self.collect(child, resolver);
            }
            return;
        }

        let content_type = part.content_type();
        let disposition = part.disposition();
        let is_attachment = disposition
            .as_ref()
            .is_some_and(ContentDisposition::is_attachment);
        let file_name = part.file_name(resolver);

        if !is_attachment && file_name.is_none() && content_type.is("text", "plain") {
            let text = decode_lossy(&part.content(), content_type.charset(), resolver);
            append_body(&mut self.text, &text);
            return;
        }
        if !is_attachment && file_name.is_none() && content_type.is("text", "html") {
            let html = decode_lossy(&part.content(), content_type.charset(), resolver);
            append_body(&mut self.html, &html);
            return;
        }

        let attachment = Attachment {
            file_name: file_name.unwrap_or_default(),
            content_type: content_type.mime_type(),
            content: part.content(),
        };

        let is_inline = disposition
            .as_ref()
            .is_some_and(ContentDisposition::is_inline)
            || part.headers.get("content-id").is_some();
        if !is_attachment && is_inline {
            self.inlines.push(attachment);
        } else {
            self.attachments.push(attachment);
        }
    }
}

fn append_body(target: &mut String, body: &str) {
    if !target.is_empty() && !body.is_empty() {
        target.push('\n');
    }
    target.push_str(body);
}

/// Splits an entity into headers and body, recursing into multiparts.
fn parse_entity(raw: &[u8], depth: usize) -> Result<Part> {
    if depth > MAX_NESTING {
        return Err(Error::InvalidMultipart("nesting too deep".to_string()));
    }

    let (header_bytes, body) = split_header_body(raw);
    let headers = Headers::parse(&String::from_utf8_lossy(header_bytes))?;

    let mut part = Part {
        headers,
        body: body.to_vec(),
        parts: Vec::new(),
    };

    let content_type = part.content_type();
    if content_type.is_multipart() {
        let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
        part.parts = split_multipart(body, boundary)?
            .into_iter()
            .map(|raw_part| parse_entity(raw_part, depth + 1))
            .collect::<Result<_>>()?;
    }

    Ok(part)
}

/// Finds the blank line separating headers from body.
fn split_header_body(raw: &[u8]) -> (&[u8], &[u8]) {
    if raw.starts_with(b"\r\n") {
        return (&[], &raw[2..]);
    }
    if raw.starts_with(b"\n") {
        return (&[], &raw[1..]);
    }

    let crlf = find(raw, b"\r\n\r\n").map(|i| (i, i + 4));
    let lf = find(raw, b"\n\n").map(|i| (i, i + 2));
    let split = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    };

    split.map_or((raw, &[][..]), |(end, body)| (&raw[..end], &raw[body..]))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits a multipart body at `--boundary` delimiter lines.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Result<Vec<&'a [u8]>> {
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();

    let mut parts = Vec::new();
    let mut part_start: Option<usize> = None;
    let mut seen_delimiter = false;
    let mut offset = 0;

    while offset < body.len() {
        let line_end = body[offset..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |i| offset + i + 1);
        let line = trim_line(&body[offset..line_end]);

        if let Some(rest) = line.strip_prefix(delimiter) {
            let closing = rest.starts_with(b"--");
            if rest.iter().all(u8::is_ascii_whitespace) || closing {
                if let Some(start) = part_start.take() {
                    parts.push(strip_trailing_newline(&body[start..offset]));
                }
                seen_delimiter = true;
                if closing {
                    return Ok(parts);
                }
                part_start = Some(line_end);
            }
        }

        offset = line_end;
    }

    if !seen_delimiter {
        return Err(Error::InvalidMultipart(format!(
            "boundary {boundary:?} never appears"
        )));
    }

    // Missing close delimiter: keep what we have.
    if let Some(start) = part_start {
        parts.push(strip_trailing_newline(&body[start..]));
    }
    Ok(parts)
}

fn trim_line(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &line[..end]
}

fn strip_trailing_newline(part: &[u8]) -> &[u8] {
    part.strip_suffix(b"\r\n")
        .or_else(|| part.strip_suffix(b"\n"))
        .unwrap_or(part)
}
