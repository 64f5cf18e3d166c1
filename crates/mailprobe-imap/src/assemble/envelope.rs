//! ENVELOPE structure reading.

use chrono::{DateTime, Utc};
use mailprobe_mime::charset::CharsetResolver;
use mailprobe_mime::encoding::decode_header;

use crate::parser::{FieldReader, Token, TokenKind};
use crate::types::{Email, EmailAddresses};
use crate::Result;

// Positions inside the ENVELOPE list (RFC 3501 section 7.4.2).
const DATE: usize = 0;
const SUBJECT: usize = 1;
const FROM: usize = 2;
const REPLY_TO: usize = 4;
const TO: usize = 5;
const CC: usize = 6;
const BCC: usize = 7;
const MESSAGE_ID: usize = 9;

// Positions inside an address list entry.
const ADDR_NAME: usize = 0;
const ADDR_MAILBOX: usize = 2;
const ADDR_HOST: usize = 3;

const TEXT: &[TokenKind] = &[TokenKind::Quoted, TokenKind::Atom, TokenKind::Nil];

/// Reads an ENVELOPE value into `email`.
///
/// The date is best effort: an unparseable date leaves `sent` unset.
pub(super) fn read_envelope(
    reader: &FieldReader<'_>,
    token: &Token,
    email: &mut Email,
    resolver: &dyn CharsetResolver,
) -> Result<()> {
    let fields = reader.container(token, "after ENVELOPE")?;
    // The last position must exist even though the sender and
    // in-reply-to slots are never read.
    reader.child(fields, MESSAGE_ID, "ENVELOPE")?;

    let date = reader.text(
        reader.child(fields, DATE, "ENVELOPE date")?,
        TEXT,
        "in ENVELOPE date",
    )?;
    email.sent = parse_envelope_date(&date);

    let subject = reader.text(
        reader.child(fields, SUBJECT, "ENVELOPE subject")?,
        TEXT,
        "in ENVELOPE subject",
    )?;
    email.subject = decode_header(&subject, resolver)?;

    for (index, role, target) in [
        (FROM, "from", &mut email.from),
        (REPLY_TO, "reply-to", &mut email.reply_to),
        (TO, "to", &mut email.to),
        (CC, "cc", &mut email.cc),
        (BCC, "bcc", &mut email.bcc),
    ] {
        let token = reader.child(fields, index, format_args!("ENVELOPE {role}"))?;
        *target = read_addresses(reader, token, role, resolver)?;
    }

    email.message_id = reader.text(
        reader.child(fields, MESSAGE_ID, "ENVELOPE message-id")?,
        TEXT,
        "in ENVELOPE message-id",
    )?;

    Ok(())
}

/// Reads one address role: `NIL` or a list of 4-field entries.
///
/// Entries with a `NIL` host are group markers (RFC 3501) and carry no
/// address.
fn read_addresses(
    reader: &FieldReader<'_>,
    token: &Token,
    role: &str,
    resolver: &dyn CharsetResolver,
) -> Result<EmailAddresses> {
    let mut addresses = EmailAddresses::new();
    if matches!(token, Token::Nil) {
        return Ok(addresses);
    }

    for entry in reader.container(token, format_args!("in ENVELOPE {role}"))? {
        let parts = reader.container(entry, format_args!("in ENVELOPE {role} entry"))?;
        let host_token = reader.child(parts, ADDR_HOST, format_args!("{role} host"))?;
        if matches!(host_token, Token::Nil) {
            continue;
        }

        let name = address_part(reader, parts, ADDR_NAME, role, "name", resolver)?;
        let mailbox = address_part(reader, parts, ADDR_MAILBOX, role, "mailbox", resolver)?;
        let host = address_part(reader, parts, ADDR_HOST, role, "host", resolver)?;
        addresses.insert(&format!("{mailbox}@{host}"), name);
    }

    Ok(addresses)
}

fn address_part(
    reader: &FieldReader<'_>,
    parts: &[Token],
    index: usize,
    role: &str,
    part: &str,
    resolver: &dyn CharsetResolver,
) -> Result<String> {
    let token = reader.child(parts, index, format_args!("{role} {part}"))?;
    let raw = reader.text(token, TEXT, format_args!("in ENVELOPE {role} {part}"))?;
    Ok(decode_header(&raw, resolver)?)
}

/// Parses an RFC 5322 date, tolerating a trailing `(zone comment)`.
pub(super) fn parse_envelope_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc2822(raw)
        .or_else(|e| {
            strip_comment(raw).map_or(Err(e), DateTime::parse_from_rfc2822)
        })
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

fn strip_comment(raw: &str) -> Option<&str> {
    if !raw.ends_with(')') {
        return None;
    }
    raw.rfind('(').map(|open| raw[..open].trim_end())
}

/// Parses an INTERNALDATE value such as `01-Jan-2021 00:00:00 +0000`.
///
/// Single-digit days may be space padded.
pub(super) fn parse_internal_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw.trim_start(), "%d-%b-%Y %H:%M:%S %z")
        .ok()
        .map(|date| date.with_timezone(&Utc))
}
