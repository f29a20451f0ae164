//! `OAuth2` token types and expiry bookkeeping.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Seconds subtracted from a token's lifetime before it is considered stale.
pub const EXPIRY_BUFFER_SECS: i64 = 60;

/// Token set returned by the token endpoint, for both the code exchange and
/// the refresh grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    /// Access token string.
    pub access_token: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: u32,
    /// Refresh token for obtaining new access tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// `OpenID` Connect ID token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Scope granted by authorization server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Token type (usually "Bearer").
    pub token_type: String,
}

impl TokenGrant {
    /// Creates a bearer grant without refresh token or scope.
    #[must_use]
    pub fn new(access_token: impl Into<String>, expires_in: u32) -> Self {
        Self {
            access_token: access_token.into(),
            expires_in,
            refresh_token: None,
            id_token: None,
            scope: None,
            token_type: "Bearer".to_string(),
        }
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Sets the scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Keeps `prior` as the refresh token when this grant carries none.
    ///
    /// Providers may omit the refresh token from a refresh response; the
    /// previous one stays valid in that case.
    #[must_use]
    pub fn carry_refresh_token(mut self, prior: Option<&str>) -> Self {
        if self.refresh_token.is_none() {
            self.refresh_token = prior.map(ToString::to_string);
        }
        self
    }
}

/// A grant stamped with the moment it was stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// The token set.
    #[serde(flatten)]
    pub grant: TokenGrant,
    /// When the grant was stored (epoch milliseconds on the wire).
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Stamps a grant with an explicit creation time.
    #[must_use]
    pub const fn issued_at(grant: TokenGrant, created_at: DateTime<Utc>) -> Self {
        Self { grant, created_at }
    }

    /// Stamps a grant with the current time.
    #[must_use]
    pub fn issued_now(grant: TokenGrant) -> Self {
        Self::issued_at(grant, Utc::now())
    }

    /// Returns the access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.grant.access_token
    }

    /// Returns the refresh token if available.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.grant.refresh_token.as_deref()
    }

    /// The instant from which the access token must no longer be presented.
    #[must_use]
    pub fn stale_at(&self) -> DateTime<Utc> {
        self.created_at
            + Duration::seconds(i64::from(self.grant.expires_in) - EXPIRY_BUFFER_SECS)
    }

    /// Checks expiry (with 60 second buffer) against `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.stale_at()
    }

    /// Checks expiry (with 60 second buffer) against the current time.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Millisecond form of the expiry rule:
/// `now >= created_at + (expires_in - 60) * 1000`.
#[must_use]
pub fn is_expired(created_at_ms: i64, expires_in: u32, now_ms: i64) -> bool {
    now_ms >= created_at_ms + (i64::from(expires_in) - EXPIRY_BUFFER_SECS) * 1000
}

/// Error response from `OAuth2` server.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub error: String,
    /// Error description.
    #[serde(default)]
    pub error_description: String,
}
