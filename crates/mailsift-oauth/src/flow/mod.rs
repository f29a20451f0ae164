//! `OAuth2` authorization code flow with PKCE.

mod code;
mod pkce;

pub use code::{AccessType, AuthorizationRequest};
pub use pkce::{
    CHALLENGE_METHOD, PkceChallenge, VERIFIER_BYTES, challenge_from_verifier, random_hex,
    random_verifier,
};

use crate::error::{Error, Result};
use crate::provider::Provider;
use crate::token::TokenGrant;
use reqwest::Client;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Common `OAuth2` client configuration.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    /// Client ID from provider.
    pub client_id: String,
    /// Client secret (required by the token endpoint for web clients).
    pub client_secret: Option<String>,
    /// Redirect URI registered with the provider.
    pub redirect_uri: Option<String>,
    /// Provider configuration.
    pub provider: Provider,
    /// HTTP client.
    http_client: Client,
}

impl OAuthClient {
    /// Creates a new OAuth client.
    #[must_use]
    pub fn new(client_id: impl Into<String>, provider: Provider) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: None,
            provider,
            http_client: Client::new(),
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

    /// Uses a caller-provided HTTP client (shared connection pool, timeouts).
    #[must_use]
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Exchanges an authorization code plus PKCE verifier for tokens.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when client id, secret or redirect URI
    /// is missing, [`Error::Provider`] on a non-success status and
    /// [`Error::MalformedResponse`] if the body is not a token document.
    pub async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<TokenGrant> {
        let client_id = self.require_client_id()?;
        let secret = self.require_client_secret()?;
        let redirect_uri = self
            .redirect_uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| Error::missing("redirect URI"))?;

        let mut params = HashMap::new();
        params.insert("client_id", client_id);
        params.insert("client_secret", secret);
        params.insert("code", code);
        params.insert("code_verifier", code_verifier);
        params.insert("grant_type", "authorization_code");
        params.insert("redirect_uri", redirect_uri);

        debug!(provider = %self.provider.name, "exchanging authorization code");
        self.post_token_form(&params).await
    }

    /// Refreshes an access token using a refresh token.
    ///
    /// The returned grant may not carry a refresh token; callers keep the
    /// previous one (see [`TokenGrant::carry_refresh_token`]).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when client id or secret is missing,
    /// [`Error::Provider`] on a non-success status and
    /// [`Error::MalformedResponse`] if the body is not a token document.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        let client_id = self.require_client_id()?;
        let secret = self.require_client_secret()?;

        let mut params = HashMap::new();
        params.insert("client_id", client_id);
        params.insert("client_secret", secret);
        params.insert("grant_type", "refresh_token");
        params.insert("refresh_token", refresh_token);

        debug!(provider = %self.provider.name, "refreshing access token");
        self.post_token_form(&params).await
    }

    async fn post_token_form(&self, params: &HashMap<&str, &str>) -> Result<TokenGrant> {
        let response = self
            .http_client
            .post(self.provider.token_url.clone())
            .form(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let error = Error::Provider {
                status: status.as_u16(),
                body,
            };
            let code = error.oauth_error_code().unwrap_or_default();
            warn!(status = status.as_u16(), %code, "token endpoint rejected request");
            return Err(error);
        }

        serde_json::from_str(&body).map_err(|e| Error::MalformedResponse(e.to_string()))
    }

    pub(crate) fn require_client_id(&self) -> Result<&str> {
        if self.client_id.is_empty() {
            return Err(Error::missing("client id"));
        }
        Ok(&self.client_id)
    }

    fn require_client_secret(&self) -> Result<&str> {
        self.client_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::missing("client secret"))
    }
}
