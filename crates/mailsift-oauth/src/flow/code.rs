//! Authorization URL construction for the authorization code flow.

use super::OAuthClient;
use super::pkce::CHALLENGE_METHOD;
use crate::error::{Error, Result};
use url::Url;

/// Whether the provider should issue a refresh token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessType {
    /// Access token only.
    Online,
    /// Access token plus refresh token.
    #[default]
    Offline,
}

impl AccessType {
    /// Query parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

/// Parameters of one authorization redirect.
///
/// `state` and `code_challenge` are opaque to this crate; the caller keeps
/// the matching state and verifier for the callback.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// CSRF state echoed back by the provider.
    pub state: String,
    /// PKCE S256 challenge.
    pub code_challenge: String,
    /// Scopes to request; provider defaults when `None`.
    pub scopes: Option<Vec<String>>,
    /// Online or offline access.
    pub access_type: AccessType,
    /// Force the consent screen (needed to be re-issued a refresh token).
    pub prompt_consent: bool,
}

impl AuthorizationRequest {
    /// Creates a request with default scopes, offline access and consent prompt.
    #[must_use]
    pub fn new(state: impl Into<String>, code_challenge: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            code_challenge: code_challenge.into(),
            scopes: None,
            access_type: AccessType::Offline,
            prompt_consent: true,
        }
    }

    /// Overrides the requested scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets the access type.
    #[must_use]
    pub const fn with_access_type(mut self, access_type: AccessType) -> Self {
        self.access_type = access_type;
        self
    }

    /// Enables or disables the consent prompt.
    #[must_use]
    pub const fn with_prompt_consent(mut self, prompt_consent: bool) -> Self {
        self.prompt_consent = prompt_consent;
        self
    }
}

impl OAuthClient {
    /// Builds the authorization URL for user consent.
    ///
    /// The user should be redirected to this URL to authorize the application.
    /// The query is deterministic for a given request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the client id or redirect URI is missing.
    pub fn authorization_url(&self, request: &AuthorizationRequest) -> Result<Url> {
        let client_id = self.require_client_id()?;
        let redirect_uri = self
            .redirect_uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| Error::missing("redirect URI"))?;

        let scope_str = request.scopes.as_ref().map_or_else(
            || self.provider.default_scopes.join(" "),
            |s| s.join(" "),
        );

        let mut url = self.provider.auth_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("client_id", client_id)
                .append_pair("redirect_uri", redirect_uri)
                .append_pair("response_type", "code")
                .append_pair("scope", &scope_str)
                .append_pair("state", &request.state)
                .append_pair("access_type", request.access_type.as_str())
                .append_pair("include_granted_scopes", "true")
                .append_pair("code_challenge", &request.code_challenge)
                .append_pair("code_challenge_method", CHALLENGE_METHOD);

            if request.prompt_consent {
                pairs.append_pair("prompt", "consent");
            }
        }

        Ok(url)
    }
}
