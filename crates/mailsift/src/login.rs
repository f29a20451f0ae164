//! Interactive login: open the authorization URL, read back the redirect.

use anyhow::{Context, Result};
use mailsift_core::{CallbackParams, LoginRequest};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use url::Url;

/// Shows the authorization URL and optionally opens it in a browser.
pub fn present(login: &LoginRequest, open_browser: bool) {
    println!("Sign in to Google to continue:\n\n  {}\n", login.url);
    if open_browser {
        if let Err(e) = opener::open(login.url.as_str()) {
            warn!(error = %e, "could not open a browser, use the URL above");
        }
    }
    println!("After approving, paste the URL you were redirected to (or just the code):");
}

/// Reads one line of input from stdin.
///
/// # Errors
///
/// Returns an error if stdin is closed before a line arrives.
pub async fn read_line() -> Result<String> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    lines
        .next_line()
        .await
        .context("failed to read from stdin")?
        .context("stdin closed before a redirect URL was entered")
}

/// Interprets pasted input as a redirect URL, a bare query string or a
/// bare authorization code.
///
/// A bare code cannot carry the state, so the issued state is filled in.
/// That input therefore skips the anti-CSRF state comparison in
/// `complete_callback`; only a pasted URL or query string is checked
/// against the state this process issued.
pub fn parse_redirect(input: &str, issued_state: &str) -> CallbackParams {
    let input = input.trim();
    if let Ok(url) = Url::parse(input) {
        return CallbackParams::from_url(&url);
    }
    if input.contains('=') {
        return CallbackParams::from_query(input);
    }
    CallbackParams {
        code: Some(input.to_string()).filter(|c| !c.is_empty()),
        state: Some(issued_state.to_string()),
        error: None,
    }
}
