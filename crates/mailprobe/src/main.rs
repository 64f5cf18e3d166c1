//! `mailprobe` - look into an IMAP mailbox from the command line.
//!
//! Connects with the `MAILPROBE_*` settings, lists the folders, examines
//! one folder, runs a search there and prints every matching email.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod settings;

use anyhow::{Context, Result};
use mailprobe_imap::Client;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailprobe=info,mailprobe_imap=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = Settings::from_env().context("reading settings")?;
    info!(host = %settings.config.host, port = settings.config.port, "starting");

    let mut client = Client::connect(&settings.config)
        .await
        .with_context(|| format!("connecting to {}", settings.config.host))?;

    let result = probe(&mut client, &settings).await;
    if let Err(e) = client.close().await {
        warn!(error = %e, "closing connection");
    }
    result
}

async fn probe(client: &mut Client<mailprobe_imap::ImapStream>, settings: &Settings) -> Result<()> {
    let folders = client.list_folders().await.context("listing folders")?;
    println!("{} folder(s):", folders.len());
    for folder in &folders {
        println!("  {folder}");
    }

    client
        .examine(&settings.folder)
        .await
        .with_context(|| format!("opening {}", settings.folder))?;

    let uids = client
        .search_uids(&settings.search)
        .await
        .with_context(|| format!("searching {} for {}", settings.folder, settings.search))?;
    info!(folder = %settings.folder, matches = uids.len(), "search finished");
    if uids.is_empty() {
        println!("No messages match {:?}.", settings.search);
        return Ok(());
    }

    let emails = client.fetch_emails(&uids).await.context("fetching emails")?;
    if emails.len() < uids.len() {
        warn!(
            skipped = uids.len() - emails.len(),
            "some messages could not be read"
        );
    }

    for (uid, email) in &emails {
        println!("\n--- UID {uid} ---");
        if let Some(received) = email.received {
            println!("Received: {}", received.to_rfc2822());
        }
        print!("{email}");
    }

    Ok(())
}
