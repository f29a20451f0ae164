//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Required configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No token record exists for the session (never logged in, or logged out).
    #[error("Session not found")]
    SessionNotFound,

    /// The access token is stale and there is no refresh token to renew it.
    #[error("Access token expired and no refresh token is available")]
    RefreshUnavailable,

    /// A provider endpoint answered with a non-success status.
    #[error("Provider returned {status}: {body}")]
    Provider {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A provider response was not the expected JSON shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The operating system random number generator failed.
    #[error("Secure random source unavailable: {0}")]
    Entropy(String),

    /// The user or provider refused the authorization request.
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    /// The OAuth callback is missing required parameters or cookies.
    #[error("Invalid OAuth callback: {0}")]
    InvalidCallback(String),

    /// The `state` returned by the provider does not match the one issued.
    #[error("OAuth state mismatch")]
    StateMismatch,

    /// The token store backend failed.
    #[error("Token store error: {0}")]
    Store(String),
}

impl Error {
    /// Returns true when the caller has to start a new login.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::SessionNotFound | Self::RefreshUnavailable)
    }
}

impl From<mailsift_oauth::Error> for Error {
    fn from(err: mailsift_oauth::Error) -> Self {
        use mailsift_oauth::Error as OAuth;
        match err {
            OAuth::Http(e) => Self::Http(e),
            OAuth::Provider { status, body } => Self::Provider { status, body },
            OAuth::MalformedResponse(msg) => Self::MalformedResponse(msg),
            OAuth::InvalidConfig(msg) => Self::Configuration(msg),
            OAuth::Entropy(e) => Self::Entropy(e.to_string()),
            OAuth::UrlError(e) => Self::Configuration(e.to_string()),
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::Configuration(format!("invalid URL: {err}"))
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
