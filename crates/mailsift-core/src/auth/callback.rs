//! Authorization redirect and callback types.

use mailsift_oauth::PkceChallenge;
use url::Url;

use super::cookies::{OAUTH_STATE, OAUTH_VERIFIER};

/// A pending login: where to send the user and what to remember until the
/// callback arrives.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    /// Anti-CSRF state, echoed back by the provider.
    pub state: String,
    /// PKCE pair; only the challenge went into the URL.
    pub pkce: PkceChallenge,
    /// Provider authorization URL.
    pub url: Url,
}

impl LoginRequest {
    /// `Set-Cookie` values persisting the state and verifier for the callback.
    #[must_use]
    pub fn set_cookie_headers(&self) -> [String; 2] {
        [
            OAUTH_STATE.set_header(&self.state),
            OAUTH_VERIFIER.set_header(self.pkce.verifier()),
        ]
    }
}

/// Query parameters of the provider's redirect back to us.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    /// Authorization code.
    pub code: Option<String>,
    /// Echoed state.
    pub state: Option<String>,
    /// Provider error code, e.g. `access_denied`.
    pub error: Option<String>,
}

impl CallbackParams {
    /// Parses an `application/x-www-form-urlencoded` query string.
    ///
    /// Empty values count as absent; the first occurrence of a key wins.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            if value.is_empty() {
                continue;
            }
            let slot = match &*key {
                "code" => &mut params.code,
                "state" => &mut params.state,
                "error" => &mut params.error,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    /// Extracts the parameters from a full redirect URL.
    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        url.query().map(Self::from_query).unwrap_or_default()
    }
}
