//! Error types for `OAuth2` operations.

use crate::token::ErrorResponse;

/// Result type alias for `OAuth2` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `OAuth2` error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Token endpoint answered with a non-success status.
    #[error("Token endpoint returned {status}: {body}")]
    Provider {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Response body was not the expected JSON shape.
    #[error("Malformed token response: {0}")]
    MalformedResponse(String),

    /// Invalid configuration (missing client credentials, redirect URI, ...).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The operating system random number generator failed.
    #[error("Secure random source unavailable: {0}")]
    Entropy(#[from] rand::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),
}

impl Error {
    /// Creates a configuration error for a missing setting.
    #[must_use]
    pub fn missing(setting: &str) -> Self {
        Self::InvalidConfig(format!("missing {setting}"))
    }

    /// Returns the `OAuth2` error code (e.g. `invalid_grant`) carried in a
    /// provider error body, if the body is a standard error document.
    #[must_use]
    pub fn oauth_error_code(&self) -> Option<String> {
        match self {
            Self::Provider { body, .. } => serde_json::from_str::<ErrorResponse>(body)
                .ok()
                .map(|e| e.error),
            _ => None,
        }
    }
}
