//! Quoting helpers for command arguments and server strings.

use std::borrow::Cow;

/// Escapes `\` and `"` so `s` can sit inside a quoted string.
#[must_use]
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['\\', '"']) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        if c == '\\' || c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    Cow::Owned(out)
}

/// Reverses [`escape`]: `\x` becomes `x`. A trailing lone backslash is kept.
#[must_use]
pub fn unescape(s: &str) -> Cow<'_, str> {
    if !s.contains('\\') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.push(chars.next().unwrap_or('\\'));
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Appends `s` as a quoted string.
pub fn write_quoted(buf: &mut String, s: &str) {
    buf.push('"');
    buf.push_str(&escape(s));
    buf.push('"');
}

/// Returns `s` as a quoted string.
#[must_use]
pub fn quote(s: &str) -> String {
    let mut buf = String::with_capacity(s.len() + 2);
    write_quoted(&mut buf, s);
    buf
}

/// Replaces the password of a `LOGIN` command with `"****"` for logging.
///
/// Other commands are returned unchanged.
#[must_use]
pub fn redact(command: &str) -> Cow<'_, str> {
    let is_login = command
        .get(..6)
        .is_some_and(|verb| verb.eq_ignore_ascii_case("LOGIN "));
    if !is_login {
        return Cow::Borrowed(command);
    }

    let args = command[6..].trim_start();
    let user_len = astring_len(args);
    let prefix_len = command.len() - args.len() + user_len;
    Cow::Owned(format!("{} \"****\"", &command[..prefix_len]))
}

/// Length of the quoted string or atom at the start of `s`.
fn astring_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'"') {
        return s.find(' ').unwrap_or(s.len());
    }

    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            _ => i += 1,
        }
    }
    s.len()
}
