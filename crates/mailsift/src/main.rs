//! `Mailsift` - Gmail inbox digest from the terminal
//!
//! Signs in with `OAuth2` + PKCE, fetches one page of the inbox, decodes
//! every message and prints a digest.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod digest;
mod login;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mailsift_core::{Config, InMemoryTokenStore, Mailbox, TokenManager};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "mailsift", version, about = "Print a decoded digest of your Gmail inbox")]
struct Cli {
    /// Print the authorization URL without opening a browser.
    #[arg(long)]
    no_browser: bool,

    /// Messages per page (overrides MAILSIFT_MAX_RESULTS).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=500))]
    max_results: Option<u32>,

    /// Label to list instead of INBOX.
    #[arg(long)]
    label: Option<String>,

    /// Gmail search expression, e.g. "is:unread newer_than:2d".
    #[arg(long, short)]
    query: Option<String>,

    /// Print the page as JSON instead of a text digest.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailsift=info,mailsift_core=info,mailsift_oauth=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    debug!(?cli, "starting");

    let mut config = Config::from_env().context("invalid configuration")?;
    if let Some(max_results) = cli.max_results {
        config = config.with_max_results(max_results);
    }
    if let Some(label) = cli.label {
        config = config.with_label(label);
    }
    let mut query = config.list_query();
    if let Some(q) = cli.query {
        query = query.with_query(q);
    }

    let tokens = Arc::new(TokenManager::new(
        config.oauth_client()?,
        Arc::new(InMemoryTokenStore::new()),
    ));
    let mailbox = Mailbox::new(Arc::clone(&tokens), config.gmail_client()?);

    let request = tokens.begin_login().context("cannot start sign-in")?;
    login::present(&request, !cli.no_browser);
    let input = login::read_line().await?;
    let params = login::parse_redirect(&input, &request.state);

    let session = tokens
        .complete_callback(&params, Some(request.state.as_str()), Some(request.pkce.verifier()))
        .await
        .context("sign-in failed")?;

    let profile = mailbox.profile(&session).await?;
    info!(
        messages = profile.messages_total,
        threads = profile.threads_total,
        "signed in"
    );

    let page = mailbox.inbox(&session, &query).await?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        println!("\n{} ({})\n", profile.email_address, config.label);
        print!("{}", digest::render(&page));
    }

    tokens.logout(&session).await?;
    Ok(())
}
