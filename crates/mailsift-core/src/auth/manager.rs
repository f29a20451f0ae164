//! Token lifecycle manager.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use mailsift_oauth::{AuthorizationRequest, OAuthClient, PkceChallenge, random_hex};
use tracing::{debug, info, warn};

use super::callback::{CallbackParams, LoginRequest};
use crate::session::{SessionId, TokenStore};
use crate::{Error, Result};

/// Random bytes in the anti-CSRF state parameter.
const STATE_BYTES: usize = 16;

/// Drives login, refresh and logout for sessions held in a [`TokenStore`].
///
/// Refreshes are single-flight per session: concurrent callers that all see
/// a stale token wait on one refresh and share its result.
pub struct TokenManager<S> {
    client: OAuthClient,
    store: Arc<S>,
    refresh_locks: Mutex<HashMap<SessionId, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: TokenStore> TokenManager<S> {
    /// Creates a manager over a shared store.
    #[must_use]
    pub fn new(client: OAuthClient, store: Arc<S>) -> Self {
        Self {
            client,
            store,
            refresh_locks: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying OAuth client.
    #[must_use]
    pub const fn client(&self) -> &OAuthClient {
        &self.client
    }

    /// The underlying token store.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Starts a login: fresh state, fresh PKCE pair, authorization URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Entropy`] if the random source fails and
    /// [`Error::Configuration`] if the client id or redirect URI is missing.
    pub fn begin_login(&self) -> Result<LoginRequest> {
        let state = random_hex(STATE_BYTES)?;
        let pkce = PkceChallenge::generate()?;
        let url = self
            .client
            .authorization_url(&AuthorizationRequest::new(&state, pkce.challenge()))?;
        debug!(provider = %self.client.provider.name, "login started");
        Ok(LoginRequest { state, pkce, url })
    }

    /// Validates the provider's redirect and completes the login.
    ///
    /// `cookie_state` and `cookie_verifier` are the values stored by
    /// [`LoginRequest::set_cookie_headers`]. Checks run in order: provider
    /// error, missing code or state, missing cookies, state mismatch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthorizationDenied`], [`Error::InvalidCallback`] or
    /// [`Error::StateMismatch`] for a rejected callback, and any error of
    /// [`TokenManager::complete_login`].
    pub async fn complete_callback(
        &self,
        params: &CallbackParams,
        cookie_state: Option<&str>,
        cookie_verifier: Option<&str>,
    ) -> Result<SessionId> {
        if let Some(error) = &params.error {
            warn!(%error, "provider denied authorization");
            return Err(Error::AuthorizationDenied(error.clone()));
        }
        let (Some(code), Some(state)) = (&params.code, &params.state) else {
            return Err(Error::InvalidCallback("missing code or state".into()));
        };
        let (Some(expected_state), Some(verifier)) = (cookie_state, cookie_verifier) else {
            return Err(Error::InvalidCallback(
                "missing state or verifier cookie".into(),
            ));
        };
        if state != expected_state {
            warn!("callback state does not match issued state");
            return Err(Error::StateMismatch);
        }

        self.complete_login(code, verifier).await
    }

    /// Exchanges the authorization code and opens a new session.
    ///
    /// # Errors
    ///
    /// Returns the token endpoint error, or a store or entropy failure.
    pub async fn complete_login(&self, code: &str, code_verifier: &str) -> Result<SessionId> {
        let grant = self.client.exchange_code(code, code_verifier).await?;
        let session = self.store.create()?;
        self.store.put(&session, grant).await?;
        info!(session = session.fingerprint(), "session created");
        Ok(session)
    }

    /// Returns a usable access token, refreshing it first if stale.
    ///
    /// A refresh response without a refresh token keeps the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] for an unknown session,
    /// [`Error::RefreshUnavailable`] if the token is stale and cannot be
    /// renewed, and the token endpoint error if the refresh fails. A failed
    /// refresh leaves the stored record untouched.
    pub async fn ensure_access_token(&self, session: &SessionId) -> Result<String> {
        let record = self
            .store
            .get(session)
            .await?
            .ok_or(Error::SessionNotFound)?;
        if !record.is_expired() {
            return Ok(record.grant.access_token);
        }

        let lock = self.refresh_lock(session);
        let result = {
            let _guard = lock.lock().await;
            self.refresh_locked(session).await
        };
        self.release_refresh_lock(session, &lock);
        result
    }

    /// Refresh step of [`Self::ensure_access_token`]; the caller holds the
    /// session's refresh lock.
    async fn refresh_locked(&self, session: &SessionId) -> Result<String> {
        // Re-read: another task may have refreshed while we waited.
        let record = self
            .store
            .get(session)
            .await?
            .ok_or(Error::SessionNotFound)?;
        if !record.is_expired() {
            debug!(
                session = session.fingerprint(),
                "token refreshed by concurrent caller"
            );
            return Ok(record.grant.access_token);
        }

        let refresh_token = record.refresh_token().ok_or(Error::RefreshUnavailable)?;
        info!(session = session.fingerprint(), "access token stale, refreshing");
        let grant = self
            .client
            .refresh(refresh_token)
            .await
            .inspect_err(|e| warn!(session = session.fingerprint(), error = %e, "refresh failed"))?
            .carry_refresh_token(Some(refresh_token));
        let stored = self.store.put(session, grant).await?;
        Ok(stored.grant.access_token)
    }

    /// Ends the session. Logging out an unknown session is not an error.
    ///
    /// Waits for an in-flight refresh of the same session so it cannot
    /// recreate the record afterwards.
    ///
    /// # Errors
    ///
    /// Returns a store failure.
    pub async fn logout(&self, session: &SessionId) -> Result<()> {
        let lock = self.refresh_lock(session);
        {
            let _guard = lock.lock().await;
            self.store.delete(session).await?;
        }
        self.release_refresh_lock(session, &lock);
        info!(session = session.fingerprint(), "session ended");
        Ok(())
    }

    fn refresh_lock(&self, session: &SessionId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .refresh_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(session.clone()).or_default())
    }

    /// Drops the session's lock entry once no other task holds or awaits it.
    fn release_refresh_lock(&self, session: &SessionId, lock: &Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self
            .refresh_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one held by the caller.
        let idle = locks
            .get(session)
            .is_some_and(|entry| Arc::ptr_eq(entry, lock) && Arc::strong_count(lock) == 2);
        if idle {
            locks.remove(session);
        }
    }

    #[cfg(test)]
    fn refresh_lock_count(&self) -> usize {
        self.refresh_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::InMemoryTokenStore;
    use mailsift_oauth::{Provider, TokenGrant};

    fn manager() -> TokenManager<InMemoryTokenStore> {
        manager_with(Provider::google().unwrap())
    }

    fn manager_with(provider: Provider) -> TokenManager<InMemoryTokenStore> {
        let client = OAuthClient::new("client", provider)
            .with_client_secret("secret")
            .with_redirect_uri("http://localhost:5173/auth/callback");
        TokenManager::new(client, Arc::new(InMemoryTokenStore::new()))
    }

    fn mock_provider(server: &mockito::ServerGuard) -> Provider {
        Provider::new(
            "Test",
            format!("{}/auth", server.url()),
            format!("{}/token", server.url()),
        )
        .unwrap()
    }

    fn callback(code: Option<&str>, state: Option<&str>) -> CallbackParams {
        CallbackParams {
            code: code.map(str::to_string),
            state: state.map(str::to_string),
            error: None,
        }
    }

    #[test]
    fn test_begin_login() {
        let manager = manager();
        let login = manager.begin_login().unwrap();
        assert_eq!(login.state.len(), STATE_BYTES * 2);

        let query: HashMap<_, _> = login.url.query_pairs().into_owned().collect();
        assert_eq!(query["state"], login.state);
        assert_eq!(query["code_challenge"], login.pkce.challenge());
        assert_eq!(query["code_challenge_method"], "S256");
        assert!(!login.url.as_str().contains(login.pkce.verifier()));
    }

    #[test]
    fn test_begin_login_is_fresh() {
        let manager = manager();
        let a = manager.begin_login().unwrap();
        let b = manager.begin_login().unwrap();
        assert_ne!(a.state, b.state);
        assert_ne!(a.pkce.verifier(), b.pkce.verifier());
    }

    #[tokio::test]
    async fn test_callback_provider_error() {
        let params = CallbackParams {
            error: Some("access_denied".into()),
            ..callback(Some("c"), Some("s"))
        };
        let err = manager()
            .complete_callback(&params, Some("s"), Some("v"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AuthorizationDenied(code) if code == "access_denied"));
    }

    #[tokio::test]
    async fn test_callback_missing_params() {
        let manager = manager();
        let err = manager
            .complete_callback(&callback(None, Some("s")), Some("s"), Some("v"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCallback(_)));

        let err = manager
            .complete_callback(&callback(Some("c"), Some("s")), None, Some("v"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCallback(_)));
    }

    #[tokio::test]
    async fn test_callback_state_mismatch() {
        let err = manager()
            .complete_callback(&callback(Some("c"), Some("s1")), Some("s2"), Some("v"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StateMismatch));
    }

    #[tokio::test]
    async fn test_fresh_token_returned_without_refresh() {
        let manager = manager();
        let session = SessionId::from("s1");
        manager
            .store()
            .put(&session, TokenGrant::new("fresh", 3600))
            .await
            .unwrap();
        assert_eq!(manager.ensure_access_token(&session).await.unwrap(), "fresh");
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let err = manager()
            .ensure_access_token(&SessionId::from("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SessionNotFound));
        assert!(err.requires_login());
    }

    #[tokio::test]
    async fn test_stale_without_refresh_token() {
        let manager = manager();
        let session = SessionId::from("s1");
        manager
            .store()
            .put(&session, TokenGrant::new("stale", 30))
            .await
            .unwrap();
        let err = manager.ensure_access_token(&session).await.unwrap_err();
        assert!(matches!(err, Error::RefreshUnavailable));
        assert_eq!(manager.refresh_lock_count(), 0);
    }

    #[tokio::test]
    async fn test_refresh_lock_released_after_refresh() {
        let mut server = mockito::Server::new_async().await;
        let refresh_mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token":"renewed","expires_in":3599,"token_type":"Bearer"}"#)
            .expect(1)
            .create_async()
            .await;
        let manager = manager_with(mock_provider(&server));
        let session = SessionId::from("s1");
        let mut grant = TokenGrant::new("stale", 30);
        grant.refresh_token = Some("r1".into());
        manager.store().put(&session, grant).await.unwrap();

        let results =
            futures::future::join_all((0..4).map(|_| manager.ensure_access_token(&session))).await;
        for result in results {
            assert_eq!(result.unwrap(), "renewed");
        }
        assert_eq!(manager.refresh_lock_count(), 0);
        refresh_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_lock_released_after_failed_refresh() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;
        let manager = manager_with(mock_provider(&server));
        let session = SessionId::from("s1");
        let mut grant = TokenGrant::new("stale", 30);
        grant.refresh_token = Some("r1".into());
        manager.store().put(&session, grant).await.unwrap();

        assert!(manager.ensure_access_token(&session).await.is_err());
        assert_eq!(manager.refresh_lock_count(), 0);
    }

    #[tokio::test]
    async fn test_logout() {
        let manager = manager();
        let session = SessionId::from("s1");
        manager
            .store()
            .put(&session, TokenGrant::new("a", 3600))
            .await
            .unwrap();

        manager.logout(&session).await.unwrap();
        manager.logout(&session).await.unwrap();
        assert_eq!(manager.refresh_lock_count(), 0);
        let err = manager.ensure_access_token(&session).await.unwrap_err();
        assert!(matches!(err, Error::SessionNotFound));
    }
}
