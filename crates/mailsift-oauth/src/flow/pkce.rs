//! PKCE (Proof Key for Code Exchange) implementation for `OAuth2`.
//!
//! PKCE (RFC 7636) enhances security for public clients by preventing
//! authorization code interception attacks.

use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// Number of random bytes behind a code verifier.
pub const VERIFIER_BYTES: usize = 32;

/// The only challenge method this crate emits.
pub const CHALLENGE_METHOD: &str = "S256";

/// PKCE code challenge and verifier pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge {
    /// Code verifier (random hex string).
    pub verifier: String,
    /// Code challenge (SHA256 hash of verifier).
    pub challenge: String,
}

impl PkceChallenge {
    /// Generates a new PKCE challenge from a fresh random verifier.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Entropy`] if the OS random source fails.
    pub fn generate() -> Result<Self> {
        Ok(Self::from_verifier(random_verifier()?))
    }

    /// Builds the pair for an existing verifier.
    #[must_use]
    pub fn from_verifier(verifier: impl Into<String>) -> Self {
        let verifier = verifier.into();
        let challenge = challenge_from_verifier(&verifier);
        Self {
            verifier,
            challenge,
        }
    }

    /// Returns the verifier.
    #[must_use]
    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    /// Returns the challenge.
    #[must_use]
    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    /// Returns the method.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        CHALLENGE_METHOD
    }
}

/// Returns `byte_len` bytes from the OS random source, hex encoded.
///
/// Never falls back to a non-cryptographic generator.
///
/// # Errors
///
/// Returns [`crate::Error::Entropy`] if the OS random source fails.
pub fn random_hex(byte_len: usize) -> Result<String> {
    let mut bytes = vec![0u8; byte_len];
    OsRng.try_fill_bytes(&mut bytes)?;

    let mut out = String::with_capacity(byte_len * 2);
    for byte in &bytes {
        let _ = write!(out, "{byte:02x}");
    }
    Ok(out)
}

/// Generates a code verifier: 32 random bytes as 64 hex characters.
///
/// # Errors
///
/// Returns [`crate::Error::Entropy`] if the OS random source fails.
pub fn random_verifier() -> Result<String> {
    random_hex(VERIFIER_BYTES)
}

/// Computes the S256 code challenge for a verifier.
#[must_use]
pub fn challenge_from_verifier(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let hash = hasher.finalize();
    URL_SAFE_NO_PAD.encode(hash)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pkce_generation() {
        let pkce = PkceChallenge::generate().unwrap();
        assert!(!pkce.verifier.is_empty());
        assert!(!pkce.challenge.is_empty());
        assert_eq!(pkce.method(), "S256");
        assert_ne!(pkce.verifier, pkce.challenge);
    }

    #[test]
    fn test_verifier_length() {
        let verifier = random_verifier().unwrap();
        assert_eq!(verifier.len(), 64);
        assert!(verifier.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_random_hex_length() {
        assert_eq!(random_hex(16).unwrap().len(), 32);
        assert_eq!(random_hex(0).unwrap(), "");
    }

    #[test]
    fn test_known_challenge() {
        // RFC 7636 appendix B
        let challenge = challenge_from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
        assert_eq!(challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn test_from_verifier_matches_compute() {
        let pkce = PkceChallenge::from_verifier("test_verifier_string");
        assert_eq!(pkce.challenge, challenge_from_verifier("test_verifier_string"));
    }

    #[test]
    fn test_multiple_generations_unique() {
        let pkce1 = PkceChallenge::generate().unwrap();
        let pkce2 = PkceChallenge::generate().unwrap();
        assert_ne!(pkce1.verifier, pkce2.verifier);
        assert_ne!(pkce1.challenge, pkce2.challenge);
    }

    proptest! {
        #[test]
        fn challenge_is_deterministic_and_url_safe(bytes in proptest::collection::vec(any::<u8>(), 32)) {
            let verifier: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
            let first = challenge_from_verifier(&verifier);
            let second = challenge_from_verifier(&verifier);
            prop_assert_eq!(&first, &second);
            prop_assert!(!first.contains(['+', '/', '=']));
            prop_assert_eq!(first.len(), 43);
        }
    }
}
