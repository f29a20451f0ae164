//! Token record storage.

use std::collections::HashMap;
use std::future::Future;

use mailsift_oauth::{TokenGrant, TokenRecord};
use tokio::sync::RwLock;
use tracing::debug;

use super::model::SessionId;
use crate::Result;

/// Storage for token records keyed by session id.
///
/// Implementations must be safe to share between tasks. Writes are
/// last-writer-wins; the lifecycle manager serializes refreshes per session.
pub trait TokenStore: Send + Sync {
    /// Allocates a new random session id. Nothing is stored until [`put`].
    ///
    /// [`put`]: TokenStore::put
    ///
    /// # Errors
    ///
    /// Returns an error if the random source fails.
    fn create(&self) -> Result<SessionId> {
        SessionId::generate()
    }

    /// Stores a grant for the session, stamped with the current time, and
    /// returns the stored record.
    fn put(
        &self,
        session: &SessionId,
        grant: TokenGrant,
    ) -> impl Future<Output = Result<TokenRecord>> + Send;

    /// Returns the record for the session, if any.
    fn get(&self, session: &SessionId) -> impl Future<Output = Result<Option<TokenRecord>>> + Send;

    /// Removes the session. Removing an unknown session is not an error.
    fn delete(&self, session: &SessionId) -> impl Future<Output = Result<()>> + Send;
}

/// Process-local token store.
///
/// Records are lost on restart; multi-instance deployments need a shared
/// backend implementing [`TokenStore`].
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    records: RwLock<HashMap<SessionId, TokenRecord>>,
}

impl InMemoryTokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if no sessions are stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Removes every session.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

impl TokenStore for InMemoryTokenStore {
    async fn put(&self, session: &SessionId, grant: TokenGrant) -> Result<TokenRecord> {
        let record = TokenRecord::issued_now(grant);
        self.records
            .write()
            .await
            .insert(session.clone(), record.clone());
        debug!(session = session.fingerprint(), "token record stored");
        Ok(record)
    }

    async fn get(&self, session: &SessionId) -> Result<Option<TokenRecord>> {
        Ok(self.records.read().await.get(session).cloned())
    }

    async fn delete(&self, session: &SessionId) -> Result<()> {
        if self.records.write().await.remove(session).is_some() {
            debug!(session = session.fingerprint(), "token record removed");
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mailsift_oauth::token::EXPIRY_BUFFER_SECS;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = InMemoryTokenStore::new();
        let id = store.create().unwrap();
        let grant = TokenGrant::new("access", 3600).with_refresh_token("refresh");

        let stored = store.put(&id, grant.clone()).await.unwrap();
        assert_eq!(stored.grant, grant);

        let fetched = store.get(&id).await.unwrap().unwrap();
        assert_eq!(fetched, stored);
        assert!(!fetched.is_expired());
    }

    #[test]
    fn test_get_unknown_session() {
        let store = InMemoryTokenStore::new();
        let record = tokio_test::block_on(store.get(&SessionId::from("nope"))).unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = InMemoryTokenStore::new();
        let id = SessionId::from("s1");
        store.put(&id, TokenGrant::new("one", 3600)).await.unwrap();
        store.put(&id, TokenGrant::new("two", 3600)).await.unwrap();

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.access_token(), "two");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemoryTokenStore::new();
        let id = SessionId::from("s1");
        store.put(&id, TokenGrant::new("a", 3600)).await.unwrap();

        store.delete(&id).await.unwrap();
        store.delete(&id).await.unwrap();
        assert!(store.get(&id).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_short_lived_grant_is_stale_on_arrival() {
        let store = InMemoryTokenStore::new();
        let id = SessionId::from("s1");
        let lifetime = u32::try_from(EXPIRY_BUFFER_SECS).unwrap();
        let record = store.put(&id, TokenGrant::new("a", lifetime)).await.unwrap();
        assert!(record.is_expired());
    }

    #[tokio::test]
    async fn test_clear() {
        let store = InMemoryTokenStore::new();
        store
            .put(&SessionId::from("a"), TokenGrant::new("a", 3600))
            .await
            .unwrap();
        store
            .put(&SessionId::from("b"), TokenGrant::new("b", 3600))
            .await
            .unwrap();
        assert_eq!(store.len().await, 2);
        store.clear().await;
        assert!(store.is_empty().await);
    }
}
