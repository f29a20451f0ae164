//! Cookies carrying login state between the redirect and the callback.
//!
//! All cookies are `HttpOnly`, `SameSite=Lax` and scoped to `/`. Lax lets
//! them ride along on the provider's top-level redirect back to us.

/// Name and lifetime of one cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieSpec {
    /// Cookie name.
    pub name: &'static str,
    /// Lifetime in seconds.
    pub max_age_secs: u64,
}

/// Anti-CSRF state issued with the authorization redirect.
pub const OAUTH_STATE: CookieSpec = CookieSpec {
    name: "oauth_state",
    max_age_secs: 600,
};

/// PKCE verifier for the pending authorization.
pub const OAUTH_VERIFIER: CookieSpec = CookieSpec {
    name: "oauth_verifier",
    max_age_secs: 600,
};

/// Session id after a successful login.
pub const SESSION_ID: CookieSpec = CookieSpec {
    name: "session_id",
    max_age_secs: 86_400,
};

impl CookieSpec {
    /// `Set-Cookie` header value storing `value`.
    #[must_use]
    pub fn set_header(&self, value: &str) -> String {
        format!(
            "{}={value}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
            self.name, self.max_age_secs
        )
    }

    /// `Set-Cookie` header value that deletes the cookie.
    #[must_use]
    pub fn clear_header(&self) -> String {
        format!("{}=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax", self.name)
    }

    /// Finds this cookie's value in a `Cookie` request header.
    ///
    /// Empty values count as absent.
    #[must_use]
    pub fn read<'a>(&self, cookie_header: &'a str) -> Option<&'a str> {
        cookie_header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.name)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }
}
