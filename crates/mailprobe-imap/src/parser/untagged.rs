//! Parsers for the untagged LIST and SEARCH responses.

use super::cursor::Cursor;
use crate::command::unescape;
use crate::connection::trim_line_end;
use crate::types::Uid;
use crate::{Error, Result};

const DELIMITERS: &[u8] = b" \r\n";
const LIST_PREFIX: &[u8] = b"* LIST ";

fn parse_error(line: &[u8], position: usize, message: &str) -> Error {
    let position = position.min(line.len());
    Error::Parse {
        position,
        message: message.to_string(),
        near: String::from_utf8_lossy(&line[position..]).into_owned(),
    }
}

/// Parses `* SEARCH 4 8 15`.
///
/// Returns `Ok(None)` if `line` is some other response.
///
/// # Errors
///
/// Returns [`Error::Parse`] if a listed UID is not a positive integer.
pub fn parse_search(line: &[u8]) -> Result<Option<Vec<Uid>>> {
    let mut cursor = Cursor::default();
    if cursor.init(line, DELIMITERS) != b"*"
        || !cursor.next(DELIMITERS).eq_ignore_ascii_case(b"SEARCH")
    {
        return Ok(None);
    }

    let mut uids = Vec::new();
    loop {
        let start = cursor.position();
        let word = cursor.next(DELIMITERS);
        if word.is_empty() {
            break;
        }
        let uid = std::str::from_utf8(word)
            .ok()
            .and_then(|w| w.parse().ok())
            .and_then(Uid::new)
            .ok_or_else(|| parse_error(line, start, "invalid UID in SEARCH response"))?;
        uids.push(uid);
    }

    Ok(Some(uids))
}

/// Returns true if `line` starts a `* n FETCH` response.
#[must_use]
pub fn is_fetch(line: &[u8]) -> bool {
    let mut cursor = Cursor::default();
    cursor.init(line, DELIMITERS) == b"*"
        && {
            let seq = cursor.next(DELIMITERS);
            !seq.is_empty() && seq.iter().all(u8::is_ascii_digit)
        }
        && cursor.next(DELIMITERS).eq_ignore_ascii_case(b"FETCH")
}

/// Extracts the folder name from `* LIST (attrs) "delim" name`.
///
/// The name may be an atom, a quoted string with escapes, or a `{N}`
/// literal already joined to the line. Returns `Ok(None)` for other
/// responses.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the LIST response is malformed.
pub fn parse_list(line: &[u8]) -> Result<Option<String>> {
    let line = trim_line_end(line);
    if line.len() < LIST_PREFIX.len() || !line[..LIST_PREFIX.len()].eq_ignore_ascii_case(LIST_PREFIX) {
        return Ok(None);
    }

    let mut pos = LIST_PREFIX.len();
    let skip_spaces = |pos: &mut usize| {
        while line.get(*pos) == Some(&b' ') {
            *pos += 1;
        }
    };

    // Attributes
    if line.get(pos) != Some(&b'(') {
        return Err(parse_error(line, pos, "expected attribute list"));
    }
    pos += line[pos..]
        .iter()
        .position(|&b| b == b')')
        .ok_or_else(|| parse_error(line, pos, "unterminated attribute list"))?
        + 1;
    skip_spaces(&mut pos);

    // Hierarchy delimiter
    match line.get(pos) {
        Some(b'"') => pos = quoted_end(line, pos)?,
        Some(_) if line[pos..].len() >= 3 && line[pos..pos + 3].eq_ignore_ascii_case(b"NIL") => {
            pos += 3;
        }
        _ => return Err(parse_error(line, pos, "expected hierarchy delimiter")),
    }
    skip_spaces(&mut pos);

    let name = match line.get(pos) {
        None => return Err(parse_error(line, pos, "missing folder name")),
        Some(b'"') => {
            let end = quoted_end(line, pos)?;
            let raw = String::from_utf8_lossy(&line[pos + 1..end - 1]);
            unescape(&raw).into_owned()
        }
        Some(b'{') => literal_name(line, pos)?,
        Some(_) => String::from_utf8_lossy(&line[pos..]).into_owned(),
    };

    Ok(Some(name))
}

/// Returns the offset just past the quoted string starting at `start`.
fn quoted_end(line: &[u8], start: usize) -> Result<usize> {
    let mut i = start + 1;
    while i < line.len() {
        match line[i] {
            b'\\' => i += 2,
            b'"' => return Ok(i + 1),
            _ => i += 1,
        }
    }
    Err(parse_error(line, start, "unterminated quoted string"))
}

fn literal_name(line: &[u8], start: usize) -> Result<String> {
    let close = line[start..]
        .iter()
        .position(|&b| b == b'}')
        .map(|i| start + i)
        .ok_or_else(|| parse_error(line, start, "unterminated literal length"))?;
    let len: usize = std::str::from_utf8(&line[start + 1..close])
        .ok()
        .and_then(|n| n.trim_end_matches('+').parse().ok())
        .ok_or_else(|| parse_error(line, start, "non-numeric literal length"))?;

    let rest = &line[close + 1..];
    let body = rest
        .strip_prefix(b"\r\n")
        .or_else(|| rest.strip_prefix(b"\n"))
        .ok_or_else(|| parse_error(line, close + 1, "expected line break after literal length"))?;
    let name = body
        .get(..len)
        .ok_or_else(|| parse_error(line, start, "truncated literal"))?;

    Ok(String::from_utf8_lossy(name).into_owned())
}
