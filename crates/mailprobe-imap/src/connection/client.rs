//! IMAP client connection.
//!
//! [`Client`] owns one connection and tracks its state at runtime: whether
//! the transport is still usable and which folder is selected. A failed
//! command leaves the state as it was, so the caller can carry on with the
//! same connection.

use std::collections::BTreeMap;

use mailprobe_mime::charset::{CharsetResolver, DefaultResolver};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, trace};

use super::config::Config;
use super::executor::Executor;
use super::stream::{ImapStream, connect};
use crate::assemble::{assemble_overviews, merge_bodies};
use crate::command::{Command, FetchItems, TagGenerator};
use crate::parser::{is_fetch, parse_list, parse_search, tokenize};
use crate::types::{Email, Uid, UidSet};
use crate::{Error, Result};

/// IMAP client connection.
pub struct Client<S> {
    executor: Executor<S>,
    folder: Option<String>,
    connected: bool,
    resolver: Box<dyn CharsetResolver + Send + Sync>,
}

impl<S> std::fmt::Debug for Client<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("executor", &self.executor)
            .field("folder", &self.folder)
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}

impl Client<ImapStream> {
    /// Connects, reads the greeting and logs in with the configured
    /// credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the transport is not established within
    /// `config.connect_timeout`, or any error from the greeting or LOGIN.
    pub async fn connect(config: &Config) -> Result<Self> {
        let stream = connect(config).await?;
        let mut client = Self::from_stream(stream).await?;
        client.login(&config.username, &config.password).await?;
        info!(host = %config.host, user = %config.username, "logged in");
        Ok(client)
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a client from a connected stream and reads the greeting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Rejected`] if the server greets with `BYE`, or
    /// [`Error::Protocol`] for any other non-`OK` greeting.
    pub async fn from_stream(stream: S) -> Result<Self> {
        Self::with_executor(Executor::new(stream)).await
    }

    /// Like [`from_stream`](Self::from_stream) with a caller-supplied tag
    /// generator.
    ///
    /// # Errors
    ///
    /// See [`from_stream`](Self::from_stream).
    pub async fn from_stream_with_tags(stream: S, tags: TagGenerator) -> Result<Self> {
        Self::with_executor(Executor::with_tags(stream, tags)).await
    }

    async fn with_executor(mut executor: Executor<S>) -> Result<Self> {
        let greeting = executor.read_response().await?;
        check_greeting(&greeting)?;
        info!("connected");

        Ok(Self {
            executor,
            folder: None,
            connected: true,
            resolver: Box::new(DefaultResolver),
        })
    }

    /// Replaces the charset resolver used to decode headers and bodies.
    #[must_use]
    pub fn with_charset_resolver(
        mut self,
        resolver: impl CharsetResolver + Send + Sync + 'static,
    ) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Returns true until the transport fails or the client is closed.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Returns the selected folder, if any.
    #[must_use]
    pub fn selected_folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    /// Authenticates with LOGIN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::No`] if the server rejects the credentials.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let command = Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.run(&command, |_| Ok(())).await
    }

    /// Lists every folder name (`LIST "" "*"`).
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails or a LIST line is malformed.
    pub async fn list_folders(&mut self) -> Result<Vec<String>> {
        let command = Command::List {
            reference: String::new(),
            pattern: "*".to_string(),
        };

        let mut folders = Vec::new();
        self.run(&command, |line| {
            if let Some(name) = parse_list(line)? {
                folders.push(name);
            }
            Ok(())
        })
        .await?;

        debug!(count = folders.len(), "listed folders");
        Ok(folders)
    }

    /// Selects `folder` read-write.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder cannot be selected; the previous
    /// selection is kept.
    pub async fn select(&mut self, folder: &str) -> Result<()> {
        let command = Command::Select {
            folder: folder.to_string(),
        };
        self.open(folder, &command).await
    }

    /// Selects `folder` read-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder cannot be examined; the previous
    /// selection is kept.
    pub async fn examine(&mut self, folder: &str) -> Result<()> {
        let command = Command::Examine {
            folder: folder.to_string(),
        };
        self.open(folder, &command).await
    }

    async fn open(&mut self, folder: &str, command: &Command) -> Result<()> {
        self.run(command, |_| Ok(())).await?;
        self.folder = Some(folder.to_string());
        info!(folder, "folder selected");
        Ok(())
    }

    /// Runs `UID SEARCH criteria` and returns the UIDs in server order.
    ///
    /// `criteria` is sent verbatim, e.g. `UNSEEN` or `SINCE 1-Jan-2024`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if no folder is selected, or an
    /// error if the command fails or a SEARCH line is malformed.
    pub async fn search_uids(&mut self, criteria: &str) -> Result<Vec<Uid>> {
        self.require_folder()?;
        let command = Command::UidSearch {
            criteria: criteria.to_string(),
        };

        let mut uids = Vec::new();
        self.run(&command, |line| {
            if let Some(found) = parse_search(line)? {
                uids.extend(found);
            }
            Ok(())
        })
        .await?;

        debug!(folder = self.folder.as_deref(), count = uids.len(), "search finished");
        Ok(uids)
    }

    /// Fetches flags, dates, size and envelope for `uids`.
    ///
    /// An empty slice fetches every message in the folder.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails or any record is malformed;
    /// no partial result is returned.
    pub async fn fetch_overviews(&mut self, uids: &[Uid]) -> Result<BTreeMap<Uid, Email>> {
        self.require_folder()?;
        let set = UidSet::from_uids(uids.iter().copied()).unwrap_or_else(UidSet::everything);
        let raw = self.fetch(set, FetchItems::All).await?;
        assemble_overviews(&tokenize(&raw)?, self.resolver.as_ref())
    }

    /// Fetches complete emails for `uids`: overviews first, then bodies.
    ///
    /// An empty slice fetches every message in the folder. Messages whose
    /// body cannot be parsed are left out of the result.
    ///
    /// # Errors
    ///
    /// Returns an error if either command fails or a record is malformed.
    pub async fn fetch_emails(&mut self, uids: &[Uid]) -> Result<BTreeMap<Uid, Email>> {
        let overviews = self.fetch_overviews(uids).await?;
        if overviews.is_empty() {
            return Ok(overviews);
        }

        let set = UidSet::from_uids(overviews.keys().copied()).unwrap_or_else(UidSet::everything);
        let raw = self.fetch(set, FetchItems::BodyPeek).await?;
        let emails = merge_bodies(overviews, &tokenize(&raw)?, self.resolver.as_ref())?;

        debug!(folder = self.folder.as_deref(), count = emails.len(), "fetched emails");
        Ok(emails)
    }

    /// Runs `UID FETCH` and returns the FETCH responses concatenated.
    async fn fetch(&mut self, uids: UidSet, items: FetchItems) -> Result<Vec<u8>> {
        let command = Command::UidFetch { uids, items };
        let mut raw = Vec::new();
        self.run(&command, |line| {
            if is_fetch(line) {
                raw.extend_from_slice(line);
            } else {
                trace!("ignoring non-FETCH response during fetch");
            }
            Ok(())
        })
        .await?;
        Ok(raw)
    }

    /// Runs a raw command, passing each untagged response to `on_line`.
    ///
    /// `command` is the text after the tag, without CRLF.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] once the client is disconnected, or
    /// any executor error.
    pub async fn execute<F>(&mut self, command: &str, on_line: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        self.require_connected()?;
        let result = self.executor.execute(command, on_line).await;
        self.track(result)
    }

    /// Runs a raw command and returns its untagged responses concatenated.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn execute_collect(&mut self, command: &str) -> Result<Vec<u8>> {
        self.require_connected()?;
        let result = self.executor.execute_collect(command).await;
        self.track(result)
    }

    /// Shuts the connection down. Calling it again does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails while shutting down; the
    /// client counts as closed either way.
    pub async fn close(&mut self) -> Result<()> {
        if !self.connected {
            return Ok(());
        }
        self.connected = false;
        self.folder = None;
        info!("connection closed");
        self.executor.shutdown().await
    }

    async fn run<F>(&mut self, command: &Command, on_line: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        self.execute(&command.serialize(), on_line).await
    }

    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result
            && e.is_transport()
        {
            self.connected = false;
            self.folder = None;
        }
        result
    }

    fn require_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(Error::InvalidState("connection is closed".to_string()))
        }
    }

    fn require_folder(&self) -> Result<()> {
        if self.folder.is_some() {
            Ok(())
        } else {
            Err(Error::InvalidState("no folder selected".to_string()))
        }
    }
}

/// Accepts `* OK` and `* PREAUTH` greetings.
fn check_greeting(greeting: &[u8]) -> Result<()> {
    let line = String::from_utf8_lossy(greeting);
    let line = line.trim_end();
    let Some(rest) = line.strip_prefix("* ") else {
        return Err(Error::Protocol(format!("unexpected greeting: {line}")));
    };
    let (status, text) = rest.split_once(' ').unwrap_or((rest, ""));

    match status.to_ascii_uppercase().as_str() {
        "OK" | "PREAUTH" => Ok(()),
        "BYE" => Err(Error::Rejected {
            status: status.to_string(),
            text: text.to_string(),
        }),
        _ => Err(Error::Protocol(format!("unexpected greeting: {line}"))),
    }
}
