//! Assembly of [`Email`] values from FETCH token trees.
//!
//! Emails are built in two passes. [`assemble_overviews`] reads the
//! `UID FETCH ... ALL` records (flags, dates, size, envelope) and
//! [`merge_bodies`] folds the parsed `BODY[]` of each message into its
//! overview.
//!
//! Structural problems in a record fail the whole batch. A body that
//! cannot be parsed as MIME only drops its own message.

mod envelope;

use std::collections::BTreeMap;

use mailprobe_mime::Message;
use mailprobe_mime::charset::CharsetResolver;
use tracing::{debug, warn};

use crate::parser::{FieldReader, Record, Token, TokenKind};
use crate::types::{Attachment, Email, EmailAddresses, Uid};
use crate::{Error, Result};

use envelope::{parse_internal_date, read_envelope};

/// Builds one overview per record, keyed by UID.
///
/// Top-level field names must be bare words. `FLAGS`, `INTERNALDATE`,
/// `RFC822.SIZE`, `ENVELOPE` and `UID` are read; other fields are
/// skipped along with their value. Records without a UID are unsolicited
/// updates and are skipped.
///
/// # Errors
///
/// Returns an error if any record is malformed or carries an invalid
/// INTERNALDATE. No partial result is returned.
pub fn assemble_overviews(
    records: &[Record],
    resolver: &dyn CharsetResolver,
) -> Result<BTreeMap<Uid, Email>> {
    let mut overviews = BTreeMap::new();
    for record in records {
        match read_overview(record, resolver)? {
            Some((uid, email)) => {
                overviews.insert(uid, email);
            }
            None => debug!(seq = record.seq.get(), "FETCH record without UID, skipping"),
        }
    }
    debug!(count = overviews.len(), "assembled overviews");
    Ok(overviews)
}

fn read_overview(record: &Record, resolver: &dyn CharsetResolver) -> Result<Option<(Uid, Email)>> {
    let reader = FieldReader::new(record);
    let mut email = Email::default();
    let mut uid = None;

    let mut i = 0;
    while i < record.tokens.len() {
        let name = field_name(&reader, i)?;
        let value = reader.value_after(i, name)?;

        match name {
            "FLAGS" => {
                email.flags = reader
                    .container(value, "after FLAGS")?
                    .iter()
                    .map(|flag| reader.text(flag, &[TokenKind::Literal], "in FLAGS"))
                    .collect::<Result<_>>()?;
            }
            "INTERNALDATE" => {
                let raw = reader.text(value, &[TokenKind::Quoted], "after INTERNALDATE")?;
                let received = parse_internal_date(&raw).ok_or_else(|| Error::Parse {
                    position: 0,
                    message: "invalid INTERNALDATE".to_string(),
                    near: raw.clone(),
                })?;
                email.received = Some(received);
            }
            "RFC822.SIZE" => email.size = reader.number(value, "after RFC822.SIZE")?,
            "ENVELOPE" => read_envelope(&reader, value, &mut email, resolver)?,
            "UID" => uid = Some(reader.uid(value, "after UID")?),
            _ => {}
        }
        i += 2;
    }

    Ok(uid.map(|uid| (uid, email)))
}

/// Merges parsed message bodies into `overviews`.
///
/// Records lacking `UID` or `BODY[]` are skipped. Subject, addresses, bodies
/// and attachments from the MIME message replace the overview values;
/// a header absent from the message keeps the envelope value. Records for
/// UIDs without an overview are ignored.
///
/// # Errors
///
/// Returns an error if a record is malformed. A message whose body fails
/// to parse is logged and removed from the result instead.
pub fn merge_bodies(
    mut overviews: BTreeMap<Uid, Email>,
    records: &[Record],
    resolver: &dyn CharsetResolver,
) -> Result<BTreeMap<Uid, Email>> {
    for record in records {
        let Some((uid, raw)) = read_body(record)? else {
            debug!(seq = record.seq.get(), "FETCH record without UID or BODY[], skipping");
            continue;
        };

        let Some(overview) = overviews.remove(&uid) else {
            debug!(uid = uid.get(), "body without overview, ignoring");
            continue;
        };

        match merge(uid, overview, raw, resolver) {
            Ok(email) => {
                overviews.insert(uid, email);
            }
            Err(error) => {
                warn!(uid = uid.get(), %error, "dropping message with unparseable body");
            }
        }
    }
    Ok(overviews)
}

fn read_body(record: &Record) -> Result<Option<(Uid, &[u8])>> {
    let reader = FieldReader::new(record);
    let mut uid = None;
    let mut body = None;

    let mut i = 0;
    while i < record.tokens.len() {
        let name = field_name(&reader, i)?;
        let value = reader.value_after(i, name)?;

        match name {
            "UID" => uid = Some(reader.uid(value, "after UID")?),
            "BODY[]" => {
                let token = reader.expect(
                    value,
                    &[TokenKind::Atom, TokenKind::Quoted],
                    "after BODY[]",
                )?;
                match token {
                    Token::Atom(bytes) => body = Some(bytes.as_slice()),
                    Token::Quoted(s) => body = Some(s.as_bytes()),
                    _ => {}
                }
            }
            _ => {}
        }
        i += 2;
    }

    Ok(uid.zip(body))
}

fn field_name<'r>(reader: &FieldReader<'r>, index: usize) -> Result<&'r str> {
    let token = reader.child(&reader.record().tokens, index, "field name")?;
    reader.literal(token, "in root")
}

/// Builds the final email from its overview and raw message.
///
/// Only a MIME parse failure is an error. A header that is present but
/// cannot be decoded keeps the envelope value.
fn merge(uid: Uid, overview: Email, raw: &[u8], resolver: &dyn CharsetResolver) -> Result<Email> {
    let message = Message::parse_with(raw, resolver)?;

    let subject = match message.headers.decoded("subject", resolver) {
        Some(Ok(subject)) => subject,
        Some(Err(error)) => {
            warn!(uid = uid.get(), %error, "undecodable Subject, keeping envelope value");
            overview.subject
        }
        None => overview.subject,
    };

    let addresses = |header: &str, fallback: EmailAddresses| match message
        .headers
        .address_list(header, resolver)
    {
        Some(Ok(list)) => list
            .iter()
            .map(|a| (a.email.as_str(), a.name.as_str()))
            .collect::<EmailAddresses>(),
        Some(Err(error)) => {
            warn!(uid = uid.get(), header, %error, "undecodable address header, keeping envelope value");
            fallback
        }
        None => fallback,
    };

    let from = addresses("from", overview.from);
    let to = addresses("to", overview.to);
    let reply_to = addresses("reply-to", overview.reply_to);
    let cc = addresses("cc", overview.cc);
    let bcc = addresses("bcc", overview.bcc);

    let attachments = message
        .attachments
        .into_iter()
        .chain(message.inlines)
        .map(Attachment::from)
        .collect();

    Ok(Email {
        subject,
        from,
        to,
        reply_to,
        cc,
        bcc,
        text: message.text,
        html: message.html,
        attachments,
        ..overview
    })
}
