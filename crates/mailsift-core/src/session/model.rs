//! Session model types.

use mailsift_oauth::random_hex;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Opaque session identifier: 32 lowercase hex characters from a CSPRNG.
///
/// The id is a bearer credential. Log [`SessionId::fingerprint`], never the
/// full value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Random bytes per generated id.
    pub const BYTES: usize = 16;

    /// Generates a fresh random session id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Entropy`] if the OS random source fails.
    pub fn generate() -> Result<Self> {
        Ok(Self(random_hex(Self::BYTES)?))
    }

    /// Wraps an id received from a client (e.g. a cookie value).
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix safe to put in logs.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
