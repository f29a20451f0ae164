//! `OAuth2` provider configurations.

use crate::error::{Error, Result};
use url::Url;

/// Google authorization endpoint.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Scopes requested from Google when the caller does not choose any.
pub const GOOGLE_DEFAULT_SCOPES: &[&str] = &[
    "openid",
    "email",
    "profile",
    "https://www.googleapis.com/auth/gmail.readonly",
];

/// `OAuth2` provider configuration.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Provider name (e.g., "Google").
    pub name: String,
    /// Authorization endpoint URL.
    pub auth_url: Url,
    /// Token endpoint URL.
    pub token_url: Url,
    /// Default scopes.
    pub default_scopes: Vec<String>,
}

impl Provider {
    /// Creates a new provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if either URL fails to parse or cannot carry a path
    /// and query (e.g. `mailto:`).
    pub fn new(
        name: impl Into<String>,
        auth_url: impl AsRef<str>,
        token_url: impl AsRef<str>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            auth_url: base_url("auth_url", auth_url.as_ref())?,
            token_url: base_url("token_url", token_url.as_ref())?,
            default_scopes: Vec::new(),
        })
    }

    /// Sets the default scopes.
    #[must_use]
    pub fn with_default_scopes(mut self, scopes: Vec<String>) -> Self {
        self.default_scopes = scopes;
        self
    }

    /// Google `OAuth2` provider configuration.
    ///
    /// Scopes:
    /// - `openid`, `email`, `profile` - identity
    /// - `https://www.googleapis.com/auth/gmail.readonly` - read-only mailbox access
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn google() -> Result<Self> {
        Ok(Self::new("Google", GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL)?.with_default_scopes(
            GOOGLE_DEFAULT_SCOPES
                .iter()
                .map(ToString::to_string)
                .collect(),
        ))
    }
}

fn base_url(field: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(Error::InvalidConfig(format!("{field} is not a base URL")));
    }
    Ok(url)
}
