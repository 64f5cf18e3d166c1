//! MIME decoding utilities.
//!
//! Supports Base64, Quoted-Printable and RFC 2047 encoded words.

use crate::charset::{CharsetResolver, decode_bytes};
use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Decodes Base64 data, ignoring embedded whitespace.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Decodes Quoted-Printable data (RFC 2045) into raw bytes.
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences.
pub fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        // Soft line break
        match data.get(i + 1..i + 3) {
            Some(b"\r\n") => {
                i += 3;
                continue;
            }
            _ if data.get(i + 1) == Some(&b'\n') => {
                i += 2;
                continue;
            }
            _ => {}
        }

        let hex = data
            .get(i + 1..i + 3)
            .ok_or_else(|| Error::InvalidEncoding("Incomplete escape sequence".to_string()))?;
        result.push(hex_byte(hex)?);
        i += 3;
    }

    Ok(result)
}

fn hex_byte(hex: &[u8]) -> Result<u8> {
    std::str::from_utf8(hex)
        .ok()
        .and_then(|s| u8::from_str_radix(s, 16).ok())
        .ok_or_else(|| {
            Error::InvalidEncoding(format!("Invalid hex: {}", String::from_utf8_lossy(hex)))
        })
}

/// Decodes the `Q` encoding of RFC 2047 (`_` is a space).
fn decode_q(text: &str) -> Result<Vec<u8>> {
    let with_spaces: Vec<u8> = text
        .bytes()
        .map(|b| if b == b'_' { b' ' } else { b })
        .collect();
    decode_quoted_printable(&with_spaces)
}

/// One `=?charset?encoding?text?=` word.
struct EncodedWord<'a> {
    charset: &'a str,
    encoding: &'a str,
    text: &'a str,
    len: usize,
}

impl<'a> EncodedWord<'a> {
    /// Parses an encoded word at the start of `s`.
    fn parse(s: &'a str) -> Option<Self> {
        let inner = s.strip_prefix("=?")?;
        let (charset, rest) = inner.split_once('?')?;
        let (encoding, rest) = rest.split_once('?')?;
        let end = rest.find("?=")?;
        let text = &rest[..end];

        let valid = !charset.is_empty()
            && encoding.len() == 1
            && !charset.contains(char::is_whitespace)
            && !text.contains(char::is_whitespace);
        if !valid {
            return None;
        }

        Some(Self {
            charset,
            encoding,
            text,
            len: 2 + charset.len() + 1 + encoding.len() + 1 + end + 2,
        })
    }

    fn decode_bytes(&self) -> Result<Vec<u8>> {
        match self.encoding {
            "B" | "b" => decode_base64(self.text.as_bytes()),
            "Q" | "q" => decode_q(self.text),
            other => Err(Error::InvalidEncoding(format!("Unknown encoding: {other}"))),
        }
    }
}

/// Decodes every RFC 2047 encoded word in a header value.
///
/// Whitespace between adjacent encoded words is dropped. Words whose
/// payload is malformed are kept verbatim.
///
/// # Errors
///
/// Returns [`Error::UnknownCharset`] if a well-formed word names a charset
/// the resolver cannot decode.
pub fn decode_header(value: &str, resolver: &dyn CharsetResolver) -> Result<String> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    let mut after_word = false;

    while let Some(start) = rest.find("=?") {
        let Some(word) = EncodedWord::parse(&rest[start..]) else {
            out.push_str(&rest[..start + 2]);
            rest = &rest[start + 2..];
            after_word = false;
            continue;
        };

        let gap = &rest[..start];
        if !(after_word && gap.chars().all(char::is_whitespace)) {
            out.push_str(gap);
        }

        if let Ok(bytes) = word.decode_bytes() {
            out.push_str(&decode_bytes(&bytes, word.charset, resolver)?);
            after_word = true;
        } else {
            out.push_str(&rest[start..start + word.len]);
            after_word = false;
        }
        rest = &rest[start + word.len..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::charset::DefaultResolver;

    #[test]
    fn test_base64_decode_with_whitespace() {
        let decoded = decode_base64(b"SGVsbG8s\r\nIFdvcmxkIQ==").unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_quoted_printable_decode() {
        assert_eq!(decode_quoted_printable(b"Hello, World!").unwrap(), b"Hello, World!");
        assert_eq!(decode_quoted_printable(b"H=C3=A9llo").unwrap(), "Héllo".as_bytes());
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        assert_eq!(decode_quoted_printable(b"Hello=\r\nWorld").unwrap(), b"HelloWorld");
        assert_eq!(decode_quoted_printable(b"Hello=\nWorld").unwrap(), b"HelloWorld");
    }

    #[test]
    fn test_quoted_printable_invalid() {
        assert!(decode_quoted_printable(b"bad=ZZ").is_err());
        assert!(decode_quoted_printable(b"cut=4").is_err());
    }

    #[test]
    fn test_decode_header_plain() {
        assert_eq!(decode_header("Hello", &DefaultResolver).unwrap(), "Hello");
        assert_eq!(decode_header("", &DefaultResolver).unwrap(), "");
    }

    #[test]
    fn test_decode_header_base64() {
        let decoded = decode_header("=?utf-8?B?SMOpbGxv?=", &DefaultResolver).unwrap();
        assert_eq!(decoded, "Héllo");
    }

    #[test]
    fn test_decode_header_q_with_charset() {
        let decoded = decode_header("=?ISO-8859-1?Q?caf=E9_au_lait?=", &DefaultResolver).unwrap();
        assert_eq!(decoded, "café au lait");
    }

    #[test]
    fn test_decode_header_adjacent_words() {
        let decoded =
            decode_header("Re: =?utf-8?Q?a?= =?utf-8?Q?b?= tail", &DefaultResolver).unwrap();
        assert_eq!(decoded, "Re: ab tail");
    }

    #[test]
    fn test_decode_header_vendor_alias() {
        let decoded = decode_header("=?cp1252?Q?=80?=", &DefaultResolver).unwrap();
        assert_eq!(decoded, "€");
    }

    #[test]
    fn test_decode_header_malformed_word_kept() {
        let decoded = decode_header("=?utf-8?B?***?= x", &DefaultResolver).unwrap();
        assert_eq!(decoded, "=?utf-8?B?***?= x");
        assert_eq!(decode_header("a =? b", &DefaultResolver).unwrap(), "a =? b");
    }

    #[test]
    fn test_decode_header_unknown_charset() {
        let err = decode_header("=?x-klingon?Q?a?=", &DefaultResolver).unwrap_err();
        assert!(matches!(err, Error::UnknownCharset(_)));
    }
}
