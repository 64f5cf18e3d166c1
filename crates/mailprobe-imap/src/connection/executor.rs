//! Tagged command execution.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::framed::{FramedStream, trim_line_end};
use crate::command::{TagGenerator, redact};
use crate::{Error, Result};

/// Longest slice of a response shown in debug logs.
const LOG_PREVIEW: usize = 512;

/// Sends tagged commands and collects their responses.
///
/// One command is in flight at a time: [`execute`](Self::execute) writes
/// the command and reads until the matching tagged completion.
pub struct Executor<S> {
    framed: FramedStream<S>,
    tags: TagGenerator,
}

impl<S> std::fmt::Debug for Executor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

impl<S> Executor<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates an executor with a wall-clock seeded tag generator.
    pub fn new(stream: S) -> Self {
        Self::with_tags(stream, TagGenerator::new())
    }

    /// Creates an executor using `tags`.
    pub fn with_tags(stream: S, tags: TagGenerator) -> Self {
        Self {
            framed: FramedStream::new(stream),
            tags,
        }
    }

    /// Reads one untagged response, such as the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub async fn read_response(&mut self) -> Result<Vec<u8>> {
        let response = self.framed.read_response().await?;
        debug!("<- {}", preview(&response));
        Ok(response)
    }

    /// Runs `command` and passes every untagged response to `on_line`.
    ///
    /// `command` is the text after the tag, without CRLF. Responses are
    /// complete, literals included, and keep their line terminator.
    ///
    /// If `on_line` fails, the remaining responses are still read up to the
    /// completion so the connection stays in step, and the first callback
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::No`], [`Error::Bad`] or [`Error::Rejected`] for a
    /// completion other than `OK`, a transport error as soon as the stream
    /// fails, or the callback's error.
    pub async fn execute<F>(&mut self, command: &str, mut on_line: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        let tag = self.tags.next();
        debug!(tag = tag.as_str(), "-> {}", redact(command));
        self.framed
            .write_line(format!("{tag} {command}").as_bytes())
            .await?;

        let mut callback_error = None;
        loop {
            let response = self.framed.read_response().await?;
            debug!(tag = tag.as_str(), "<- {}", preview(&response));

            if let Some(rest) = tag.completion(&response) {
                completion_status(rest)?;
                return callback_error.map_or(Ok(()), Err);
            }

            if callback_error.is_none()
                && let Err(e) = on_line(&response)
            {
                callback_error = Some(e);
            }
        }
    }

    /// Runs `command` and returns all untagged responses concatenated.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn execute_collect(&mut self, command: &str) -> Result<Vec<u8>> {
        let mut collected = Vec::new();
        self.execute(command, |line| {
            collected.extend_from_slice(line);
            Ok(())
        })
        .await?;
        Ok(collected)
    }

    /// Shuts down the underlying stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails while shutting down.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.framed.shutdown().await
    }
}

/// Interprets the text after `TAG SP` on a completion line.
fn completion_status(rest: &[u8]) -> Result<()> {
    let rest = String::from_utf8_lossy(trim_line_end(rest));
    let (status, text) = rest.split_once(' ').unwrap_or((rest.as_ref(), ""));

    match status.to_ascii_uppercase().as_str() {
        "OK" => Ok(()),
        "NO" => Err(Error::No(text.to_string())),
        "BAD" => Err(Error::Bad(text.to_string())),
        _ => Err(Error::Rejected {
            status: status.to_string(),
            text: text.to_string(),
        }),
    }
}

fn preview(response: &[u8]) -> String {
    let line = trim_line_end(response);
    if line.len() <= LOG_PREVIEW {
        return String::from_utf8_lossy(line).into_owned();
    }
    format!(
        "{}... ({} bytes)",
        String::from_utf8_lossy(&line[..LOG_PREVIEW]),
        line.len()
    )
}
