//! Settings read from `MAILPROBE_*` environment variables.

use anyhow::{Context, Result, bail};
use mailprobe_imap::{Config, Security};

/// What to connect to and what to look for.
#[derive(Debug)]
pub struct Settings {
    /// Connection parameters.
    pub config: Config,
    /// Folder to examine.
    pub folder: String,
    /// `UID SEARCH` criteria.
    pub search: String,
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`.
    ///
    /// `MAILPROBE_HOST`, `MAILPROBE_USER` and `MAILPROBE_PASSWORD` are
    /// required. `MAILPROBE_PORT` defaults to 993 and `MAILPROBE_PLAIN=1`
    /// turns TLS off.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .with_context(|| format!("{name} is not set"))
        };

        let security = match lookup("MAILPROBE_PLAIN").as_deref() {
            None | Some("" | "0") => Security::Implicit,
            Some("1") => Security::None,
            Some(other) => bail!("MAILPROBE_PLAIN must be 0 or 1, got {other:?}"),
        };

        let mut builder = Config::builder(required("MAILPROBE_HOST")?)
            .security(security)
            .credentials(required("MAILPROBE_USER")?, required("MAILPROBE_PASSWORD")?);
        if let Some(port) = lookup("MAILPROBE_PORT") {
            let port = port
                .parse()
                .with_context(|| format!("MAILPROBE_PORT is not a port number: {port:?}"))?;
            builder = builder.port(port);
        }

        Ok(Self {
            config: builder.build(),
            folder: lookup("MAILPROBE_FOLDER").unwrap_or_else(|| "INBOX".to_string()),
            search: lookup("MAILPROBE_SEARCH").unwrap_or_else(|| "ALL".to_string()),
        })
    }
}
