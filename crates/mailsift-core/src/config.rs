//! Runtime configuration.
//!
//! Values come from the environment. Credentials are optional at load time
//! and checked when first used, so a half-configured deployment still starts
//! and reports exactly which setting is missing.

use mailsift_oauth::{OAuthClient, Provider};

use crate::mailbox::{DEFAULT_LABEL, DEFAULT_MAX_RESULTS, GMAIL_API_BASE, GmailClient, ListQuery};
use crate::{Error, Result};

/// OAuth client id.
pub const ENV_CLIENT_ID: &str = "GOOGLE_CLIENT_ID";
/// OAuth client secret.
pub const ENV_CLIENT_SECRET: &str = "GOOGLE_CLIENT_SECRET";
/// Registered redirect URI.
pub const ENV_REDIRECT_URI: &str = "GOOGLE_REDIRECT_URI";
/// Gmail API origin override.
pub const ENV_GMAIL_API_BASE: &str = "MAILSIFT_GMAIL_API_BASE";
/// Inbox page size override.
pub const ENV_MAX_RESULTS: &str = "MAILSIFT_MAX_RESULTS";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// OAuth client id.
    pub client_id: Option<String>,
    /// OAuth client secret.
    pub client_secret: Option<String>,
    /// Redirect URI registered with the provider.
    pub redirect_uri: Option<String>,
    /// Gmail API origin.
    pub gmail_api_base: String,
    /// Inbox page size.
    pub max_results: u32,
    /// Label to list.
    pub label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            gmail_api_base: GMAIL_API_BASE.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            label: DEFAULT_LABEL.to_string(),
        }
    }
}

impl Config {
    /// Creates a configuration with the given client id and defaults elsewhere.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            ..Self::default()
        }
    }

    /// Sets the client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Sets the Gmail API origin.
    #[must_use]
    pub fn with_gmail_api_base(mut self, base: impl Into<String>) -> Self {
        self.gmail_api_base = base.into();
        self
    }

    /// Sets the inbox page size.
    #[must_use]
    pub const fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// Sets the label to list.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Loads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if an override is present but invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if an override is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut config = Self {
            client_id: get(ENV_CLIENT_ID),
            client_secret: get(ENV_CLIENT_SECRET),
            redirect_uri: get(ENV_REDIRECT_URI),
            ..Self::default()
        };
        if let Some(base) = get(ENV_GMAIL_API_BASE) {
            config.gmail_api_base = base;
        }
        if let Some(raw) = get(ENV_MAX_RESULTS) {
            config.max_results = raw
                .parse::<u32>()
                .ok()
                .filter(|n| (1..=500).contains(n))
                .ok_or_else(|| {
                    Error::Configuration(format!(
                        "{ENV_MAX_RESULTS} must be between 1 and 500, got {raw:?}"
                    ))
                })?;
        }
        Ok(config)
    }

    /// Builds the OAuth client for Google.
    ///
    /// Missing credentials are not checked here; the client reports them on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the provider endpoints are invalid.
    pub fn oauth_client(&self) -> Result<OAuthClient> {
        let mut client = OAuthClient::new(self.client_id.clone().unwrap_or_default(), Provider::google()?);
        if let Some(secret) = &self.client_secret {
            client = client.with_client_secret(secret);
        }
        if let Some(uri) = &self.redirect_uri {
            client = client.with_redirect_uri(uri);
        }
        Ok(client)
    }

    /// Builds the Gmail client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the API base is not a usable URL.
    pub fn gmail_client(&self) -> Result<GmailClient> {
        GmailClient::with_base_url(&self.gmail_api_base)
    }

    /// The inbox listing described by this configuration.
    #[must_use]
    pub fn list_query(&self) -> ListQuery {
        ListQuery::default()
            .with_max_results(self.max_results)
            .with_labels(vec![self.label.clone()])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.gmail_api_base, "https://gmail.googleapis.com");
        assert_eq!(config.max_results, 25);
        assert_eq!(config.label, "INBOX");
    }

    #[test]
    fn test_from_lookup() {
        let config = Config::from_lookup(lookup(&[
            (ENV_CLIENT_ID, "id.apps.googleusercontent.com"),
            (ENV_CLIENT_SECRET, " secret "),
            (ENV_REDIRECT_URI, "http://localhost:5173/auth/callback"),
            (ENV_GMAIL_API_BASE, "http://127.0.0.1:9000"),
            (ENV_MAX_RESULTS, "10"),
        ]))
        .unwrap();
        assert_eq!(config.client_id.as_deref(), Some("id.apps.googleusercontent.com"));
        assert_eq!(config.client_secret.as_deref(), Some("secret"));
        assert_eq!(config.gmail_api_base, "http://127.0.0.1:9000");
        assert_eq!(config.max_results, 10);
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = Config::from_lookup(lookup(&[(ENV_CLIENT_ID, "")])).unwrap();
        assert!(config.client_id.is_none());
    }

    #[test]
    fn test_invalid_max_results() {
        for bad in ["0", "abc", "501", "-1"] {
            let err = Config::from_lookup(lookup(&[(ENV_MAX_RESULTS, bad)])).unwrap_err();
            assert!(matches!(err, Error::Configuration(_)), "{bad}");
        }
    }

    #[test]
    fn test_missing_credentials_fail_at_use() {
        let client = Config::default().oauth_client().unwrap();
        let err: Error = client
            .authorization_url(&mailsift_oauth::AuthorizationRequest::new("s", "c"))
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Configuration(msg) if msg.contains("client id")));
    }

    #[test]
    fn test_builders() {
        let config = Config::new("id")
            .with_client_secret("secret")
            .with_redirect_uri("http://localhost/cb")
            .with_max_results(5)
            .with_label("STARRED");
        let query = config.list_query();
        assert_eq!(query.max_results, 5);
        assert_eq!(query.label_ids, vec!["STARRED".to_string()]);
        assert!(config.oauth_client().is_ok());
        assert!(config.gmail_client().is_ok());
    }
}
