//! Charset label resolution.
//!
//! Mail in the wild labels charsets inconsistently (`cp1252`, `windows-1252`,
//! `x-gbk`, `utf8`, quoted labels, RFC 2231 language suffixes). A
//! [`CharsetResolver`] maps such a label to a decoder.

use encoding_rs::Encoding;

use crate::error::{Error, Result};

/// Maps a charset label to a decoder.
pub trait CharsetResolver {
    /// Returns the encoding for `label`, or `None` if it is unknown.
    fn resolve(&self, label: &str) -> Option<&'static Encoding>;
}

/// Resolver that normalizes common vendor aliases before a WHATWG label
/// lookup.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultResolver;

impl CharsetResolver for DefaultResolver {
    fn resolve(&self, label: &str) -> Option<&'static Encoding> {
        let label = normalize_label(label);

        lookup(&label)
            .or_else(|| label.strip_prefix("x-").and_then(lookup))
            .or_else(|| swap_windows_alias(&label).as_deref().and_then(lookup))
    }
}

impl<F> CharsetResolver for F
where
    F: Fn(&str) -> Option<&'static Encoding>,
{
    fn resolve(&self, label: &str) -> Option<&'static Encoding> {
        self(label)
    }
}

/// Lower-cases a label and strips quotes and any RFC 2231 language suffix.
#[must_use]
pub fn normalize_label(label: &str) -> String {
    let label = label.trim().trim_matches('"').to_ascii_lowercase();
    let label = label.split('*').next().unwrap_or_default();

    match label {
        "utf8" | "cp65001" | "unicode-1-1-utf-8" => "utf-8".to_string(),
        "ks_c_5601" | "ks_c_5601-1989" => "euc-kr".to_string(),
        "ascii" | "ansi" => "us-ascii".to_string(),
        other => other.to_string(),
    }
}

/// Decodes `bytes` labelled with `label`.
///
/// # Errors
///
/// Returns [`Error::UnknownCharset`] if the resolver has no decoder for the
/// label.
pub fn decode_bytes(bytes: &[u8], label: &str, resolver: &dyn CharsetResolver) -> Result<String> {
    let encoding = resolver
        .resolve(label)
        .ok_or_else(|| Error::UnknownCharset(label.to_string()))?;

    let (text, _had_errors) = encoding.decode_without_bom_handling(bytes);
    Ok(text.into_owned())
}

/// Decodes `bytes` with the label if it is known, otherwise as lossy UTF-8.
#[must_use]
pub fn decode_lossy(bytes: &[u8], label: Option<&str>, resolver: &dyn CharsetResolver) -> String {
    label
        .and_then(|label| decode_bytes(bytes, label, resolver).ok())
        .unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned())
}

fn lookup(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.as_bytes())
}

/// `cp1252` <-> `windows-1252`.
fn swap_windows_alias(label: &str) -> Option<String> {
    if let Some(code) = label.strip_prefix("windows-") {
        return Some(format!("cp{code}"));
    }
    label
        .strip_prefix("cp")
        .filter(|code| !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit()))
        .map(|code| format!("windows-{code}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("\"UTF8\""), "utf-8");
        assert_eq!(normalize_label("iso-8859-1*en"), "iso-8859-1");
        assert_eq!(normalize_label(" Windows-1252 "), "windows-1252");
    }

    #[test]
    fn test_default_resolver_aliases() {
        let resolver = DefaultResolver;
        assert_eq!(resolver.resolve("utf8"), Some(encoding_rs::UTF_8));
        assert_eq!(resolver.resolve("cp1252"), Some(encoding_rs::WINDOWS_1252));
        assert_eq!(resolver.resolve("windows-1251"), Some(encoding_rs::WINDOWS_1251));
        assert_eq!(resolver.resolve("x-gbk"), Some(encoding_rs::GBK));
        assert!(resolver.resolve("no-such-charset").is_none());
    }

    #[test]
    fn test_decode_bytes_latin1() {
        let text = decode_bytes(b"caf\xe9", "iso-8859-1", &DefaultResolver).unwrap();
        assert_eq!(text, "café");
    }

    #[test]
    fn test_decode_bytes_unknown() {
        let err = decode_bytes(b"abc", "klingon", &DefaultResolver).unwrap_err();
        assert!(matches!(err, Error::UnknownCharset(label) if label == "klingon"));
    }

    #[test]
    fn test_closure_resolver() {
        let only_utf8 = |label: &str| (label == "utf-8").then_some(encoding_rs::UTF_8);
        assert_eq!(decode_lossy(b"abc", Some("utf-8"), &only_utf8), "abc");
        assert_eq!(decode_lossy(b"abc", Some("latin1"), &only_utf8), "abc");
    }
}
