//! `mailpeek` - print the plaintext of Gmail messages matching a query.
//!
//! Authorizes against Google with a locally stored token, searches the
//! mailbox, batch-fetches the matches and prints one block per message.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
mod report;

use std::process::ExitCode;

use anyhow::Context;
use mailpeek_gmail::GmailClient;
use mailpeek_oauth::{CredentialProvider, TokenStore};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use report::Report;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so the report can be piped
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailpeek=info,mailpeek_gmail=info,mailpeek_oauth=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::load(std::env::args().skip(1)).context("Failed to load configuration")?;
    info!(query = %config.filter_query, "Starting mailpeek");

    let http = reqwest::Client::new();

    let credentials = CredentialProvider::new(
        TokenStore::new(&config.token_path),
        &config.client_secret_path,
        config.scopes.clone(),
    )
    .with_http_client(http.clone());
    let token = credentials
        .get_credentials()
        .await
        .context("Authorization failed")?;

    let gmail = GmailClient::new(http, token.access_token).with_max_messages(config.max_messages);
    let messages = gmail
        .list_messages(&config.filter_query)
        .await
        .context("Failed to list messages")?;

    if messages.is_empty() {
        println!("No messages found.");
        return Ok(());
    }

    let mut report = Report::new(std::io::stdout().lock());
    let stats = report
        .print_all(&messages)
        .context("Failed to write report")?;
    info!(printed = stats.printed, skipped = stats.skipped, "Done");
    Ok(())
}
