//! Integration tests for the IMAP client.
//!
//! These tests use a mock stream to simulate IMAP server responses
//! without requiring a real server connection.

#![allow(clippy::unwrap_used)]

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use mailprobe_imap::{Client, Error, TagGenerator, Uid};

/// Mock stream that returns predefined responses.
///
/// Reads are served in chunks of at most `chunk` bytes so literals and
/// lines arrive split across reads.
struct MockStream {
    /// Responses to return (in order).
    responses: Cursor<Vec<u8>>,
    /// Captured commands sent by the client.
    sent: Arc<Mutex<Vec<u8>>>,
    chunk: usize,
}

impl MockStream {
    fn new(responses: &[u8]) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let stream = Self {
            responses: Cursor::new(responses.to_vec()),
            sent: Arc::clone(&sent),
            chunk: 7,
        };
        (stream, sent)
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let pos = usize::try_from(self.responses.position()).unwrap();
        let data = self.responses.get_ref();

        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }

        let to_read = (data.len() - pos).min(buf.remaining()).min(self.chunk);
        buf.put_slice(&data[pos..pos + to_read]);
        self.responses.set_position((pos + to_read) as u64);

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// The `n`th tag issued by a generator starting at 1.
fn tag(n: u64) -> String {
    format!("{n:016X}")
}

fn uid(n: u32) -> Uid {
    Uid::new(n).unwrap()
}

/// Prefixes `* n FETCH (... BODY[] {len}` to `message`.
fn body_record(seq: u32, uid: u32, message: &str) -> String {
    format!(
        "* {seq} FETCH (UID {uid} BODY[] {{{}}}\r\n{message})\r\n",
        message.len()
    )
}

async fn client(script: &str) -> (Client<MockStream>, Arc<Mutex<Vec<u8>>>) {
    let (stream, sent) = MockStream::new(script.as_bytes());
    let client = Client::from_stream_with_tags(stream, TagGenerator::starting_at(1))
        .await
        .unwrap();
    (client, sent)
}

fn sent_lines(sent: &Arc<Mutex<Vec<u8>>>) -> Vec<String> {
    String::from_utf8(sent.lock().unwrap().clone())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

const MESSAGE_7: &str = concat!(
    "From: John <john@example.com>\r\n",
    "To: me@example.org\r\n",
    "Subject: Quarterly numbers\r\n",
    "Content-Type: multipart/alternative; boundary=\"alt\"\r\n",
    "\r\n",
    "--alt\r\n",
    "Content-Type: text/plain; charset=utf-8\r\n",
    "\r\n",
    "The numbers are in.\r\n",
    "--alt\r\n",
    "Content-Type: text/html; charset=utf-8\r\n",
    "\r\n",
    "<p>The numbers are in.</p>\r\n",
    "--alt--\r\n",
);

#[tokio::test]
async fn test_session_end_to_end() {
    let mut script = String::from("* OK IMAP4rev1 ready\r\n");
    script += &format!("{} OK logged in\r\n", tag(1));
    script += "* LIST (\\HasNoChildren) \"/\" INBOX\r\n";
    script += "* LIST (\\HasNoChildren) \"/\" \"Work \\\"2024\\\"\"\r\n";
    script += "* LIST (\\HasNoChildren) \"/\" {8}\r\nArchive1\r\n";
    script += &format!("{} OK LIST completed\r\n", tag(2));
    script += "* 2 EXISTS\r\n* OK [UIDVALIDITY 3857529045] UIDs valid\r\n";
    script += &format!("{} OK [READ-WRITE] SELECT completed\r\n", tag(3));
    script += "* SEARCH 7 9\r\n";
    script += &format!("{} OK SEARCH completed\r\n", tag(4));
    script += concat!(
        "* 1 FETCH (UID 7 FLAGS (\\Seen) INTERNALDATE \"01-Jan-2021 00:00:00 +0000\" ",
        "RFC822.SIZE 100 ENVELOPE (\"Fri, 1 Jan 2021 00:00:00 +0000\" \"Quarterly\" ",
        "((\"John\" NIL \"john\" \"example.com\")) NIL NIL NIL NIL NIL NIL \"<7@example.com>\"))\r\n",
        "* 2 FETCH (UID 9 FLAGS () INTERNALDATE \"02-Jan-2021 08:30:00 +0100\" ",
        "RFC822.SIZE 20 ENVELOPE (NIL NIL NIL NIL NIL NIL NIL NIL NIL NIL))\r\n",
    );
    script += &format!("{} OK FETCH completed\r\n", tag(5));
    script += &body_record(1, 7, MESSAGE_7);
    script += &body_record(2, 9, "not a message at all\r\n\r\n");
    script += &format!("{} OK FETCH completed\r\n", tag(6));

    let (mut client, sent) = client(&script).await;

    client.login("me@example.org", "hunter2").await.unwrap();

    let folders = client.list_folders().await.unwrap();
    assert_eq!(folders, ["INBOX", "Work \"2024\"", "Archive1"]);

    client.select("INBOX").await.unwrap();
    assert_eq!(client.selected_folder(), Some("INBOX"));

    let uids = client.search_uids("ALL").await.unwrap();
    assert_eq!(uids, [uid(7), uid(9)]);

    let emails = client.fetch_emails(&uids).await.unwrap();

    // UID 9's body is not a MIME message, so only UID 7 survives.
    assert_eq!(emails.keys().copied().collect::<Vec<_>>(), [uid(7)]);
    let email = &emails[&uid(7)];
    assert_eq!(email.flags, ["\\Seen"]);
    assert_eq!(email.size, 100);
    assert_eq!(email.subject, "Quarterly numbers");
    assert_eq!(email.message_id, "<7@example.com>");
    assert_eq!(email.from.get("john@example.com"), Some("John"));
    assert_eq!(email.to.get("me@example.org"), Some(""));
    assert!(email.text.starts_with("The numbers are in."));
    assert!(email.html.contains("<p>The numbers are in.</p>"));
    assert!(email.attachments.is_empty());

    let rendered = email.to_string();
    assert!(rendered.starts_with("Subject: Quarterly numbers\n"));
    assert!(rendered.contains("From: John <john@example.com>\n"));

    assert_eq!(
        sent_lines(&sent),
        [
            format!("{} LOGIN \"me@example.org\" \"hunter2\"", tag(1)),
            format!("{} LIST \"\" \"*\"", tag(2)),
            format!("{} SELECT \"INBOX\"", tag(3)),
            format!("{} UID SEARCH ALL", tag(4)),
            format!("{} UID FETCH 7,9 ALL", tag(5)),
            format!("{} UID FETCH 7,9 BODY.PEEK[]", tag(6)),
        ]
    );
}

#[tokio::test]
async fn test_empty_folder_skips_body_fetch() {
    let mut script = String::from("* OK ready\r\n");
    script += &format!("{} OK [READ-ONLY] EXAMINE completed\r\n", tag(1));
    script += &format!("{} OK FETCH completed\r\n", tag(2));

    let (mut client, sent) = client(&script).await;
    client.examine("Empty").await.unwrap();

    let emails = client.fetch_emails(&[]).await.unwrap();
    assert!(emails.is_empty());
    assert_eq!(
        sent_lines(&sent),
        [
            format!("{} EXAMINE \"Empty\"", tag(1)),
            format!("{} UID FETCH 1:* ALL", tag(2)),
        ]
    );
}

#[tokio::test]
async fn test_malformed_fetch_returns_no_partial_result() {
    let mut script = String::from("* OK ready\r\n");
    script += &format!("{} OK selected\r\n", tag(1));
    script += "* 1 FETCH (UID 1 RFC822.SIZE 10)\r\n";
    script += "* 2 FETCH (UID 2 FLAGS (\\Seen)\r\n";
    script += &format!("{} OK FETCH completed\r\n", tag(2));

    let (mut client, _sent) = client(&script).await;
    client.select("INBOX").await.unwrap();

    let err = client.fetch_overviews(&[]).await.unwrap_err();
    let Error::Parse { message, .. } = err else {
        panic!("expected parse error, got {err:?}");
    };
    assert!(message.contains("unterminated"), "{message}");
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_wrong_token_kind_names_the_field() {
    let mut script = String::from("* OK ready\r\n");
    script += &format!("{} OK selected\r\n", tag(1));
    script += "* 1 FETCH (UID 1 RFC822.SIZE NIL)\r\n";
    script += &format!("{} OK FETCH completed\r\n", tag(2));

    let (mut client, _sent) = client(&script).await;
    client.select("INBOX").await.unwrap();

    let err = client.fetch_overviews(&[uid(1)]).await.unwrap_err();
    let Error::UnexpectedToken {
        field,
        expected,
        found,
        record,
    } = err
    else {
        panic!("expected token error, got {err:?}");
    };
    assert_eq!(field, "after RFC822.SIZE");
    assert_eq!(expected, "Number");
    assert_eq!(found, "Nil");
    assert_eq!(record, "* 1 FETCH [(Literal UID) (Number 1) (Literal RFC822.SIZE) Nil]");
}

#[tokio::test]
async fn test_server_refusal() {
    let mut script = String::from("* OK ready\r\n");
    script += &format!("{} NO [AUTHENTICATIONFAILED] Invalid credentials\r\n", tag(1));
    script += &format!("{} BAD Command unknown\r\n", tag(2));

    let (mut client, _sent) = client(&script).await;

    let err = client.login("me", "wrong").await.unwrap_err();
    assert!(matches!(err, Error::No(ref text) if text.contains("Invalid credentials")));

    let err = client.execute("XYZZY", |_| Ok(())).await.unwrap_err();
    assert!(matches!(err, Error::Bad(_)));
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_raw_execute_collect() {
    let mut script = String::from("* OK ready\r\n");
    script += "* CAPABILITY IMAP4rev1 IDLE\r\n";
    script += &format!("{} OK done\r\n", tag(1));

    let (mut client, sent) = client(&script).await;
    let raw = client.execute_collect("CAPABILITY").await.unwrap();
    assert_eq!(raw, b"* CAPABILITY IMAP4rev1 IDLE\r\n");
    assert_eq!(sent_lines(&sent), [format!("{} CAPABILITY", tag(1))]);
}

#[tokio::test]
async fn test_bye_greeting() {
    let (stream, _sent) = MockStream::new(b"* BYE server shutting down\r\n");
    let err = Client::from_stream(stream).await.unwrap_err();
    assert!(matches!(err, Error::Rejected { ref status, .. } if status == "BYE"));
}

#[tokio::test]
async fn test_connection_drop_mid_literal() {
    let mut script = String::from("* OK ready\r\n");
    script += &format!("{} OK selected\r\n", tag(1));
    script += "* 1 FETCH (UID 1 BODY[] {100}\r\nshort";

    let (mut client, _sent) = client(&script).await;
    client.select("INBOX").await.unwrap();

    let err = client.execute_collect("UID FETCH 1 BODY.PEEK[]").await.unwrap_err();
    assert!(err.is_transport());
    assert!(!client.is_connected());
    assert_eq!(client.selected_folder(), None);
}
