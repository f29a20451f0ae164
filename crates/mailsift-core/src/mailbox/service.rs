//! Session-bound mailbox operations.

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::decode::{DecodedMessage, decode_message};
use super::gmail::{GmailClient, LabelChange, LabeledMessage, ListQuery, Profile};
use crate::Result;
use crate::auth::TokenManager;
use crate::session::{SessionId, TokenStore};

/// Outcome of fetching one message in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchItem {
    /// Fetched and decoded.
    Decoded(DecodedMessage),
    /// The fetch failed; other items are unaffected.
    Failed {
        /// Message id.
        id: String,
        /// Error description.
        error: String,
    },
}

impl BatchItem {
    /// Message id of the item.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Decoded(message) => &message.id,
            Self::Failed { id, .. } => id,
        }
    }

    /// The decoded message, if the fetch succeeded.
    #[must_use]
    pub const fn message(&self) -> Option<&DecodedMessage> {
        match self {
            Self::Decoded(message) => Some(message),
            Self::Failed { .. } => None,
        }
    }
}

/// One page of decoded inbox messages, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxPage {
    /// One entry per listed message.
    pub items: Vec<BatchItem>,
    /// Token for the next page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl InboxPage {
    /// Number of items that failed to fetch.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, BatchItem::Failed { .. }))
            .count()
    }
}

/// Mailbox operations on behalf of a logged-in session.
pub struct Mailbox<S> {
    tokens: Arc<TokenManager<S>>,
    gmail: GmailClient,
}

impl<S: TokenStore> Mailbox<S> {
    /// Creates the service.
    #[must_use]
    pub const fn new(tokens: Arc<TokenManager<S>>, gmail: GmailClient) -> Self {
        Self { tokens, gmail }
    }

    /// Lists the inbox and decodes every message on the page.
    ///
    /// Messages are fetched concurrently. A message that fails to fetch
    /// becomes [`BatchItem::Failed`] instead of failing the page.
    ///
    /// # Errors
    ///
    /// Returns token errors ([`crate::Error::SessionNotFound`],
    /// [`crate::Error::RefreshUnavailable`], refresh failures) and listing
    /// failures.
    pub async fn inbox(&self, session: &SessionId, query: &ListQuery) -> Result<InboxPage> {
        let token = self.tokens.ensure_access_token(session).await?;
        let list = self.gmail.list_messages(&token, query).await?;
        let items = self
            .fetch_batch(&token, list.messages.iter().map(|m| m.id.as_str()))
            .await;

        let page = InboxPage {
            items,
            next_page_token: list.next_page_token,
        };
        info!(
            session = session.fingerprint(),
            messages = page.items.len(),
            failed = page.failed_count(),
            "inbox page loaded"
        );
        Ok(page)
    }

    /// Fetches and decodes messages concurrently, preserving input order.
    pub async fn fetch_batch<'a>(
        &self,
        access_token: &str,
        ids: impl IntoIterator<Item = &'a str>,
    ) -> Vec<BatchItem> {
        join_all(ids.into_iter().map(|id| async move {
            match self.gmail.get_message(access_token, id).await {
                Ok(raw) => BatchItem::Decoded(decode_message(&raw)),
                Err(e) => {
                    warn!(id, error = %e, "message fetch failed");
                    BatchItem::Failed {
                        id: id.to_string(),
                        error: e.to_string(),
                    }
                }
            }
        }))
        .await
    }

    /// Applies a label change to one message.
    ///
    /// # Errors
    ///
    /// Returns token errors and API failures.
    pub async fn modify(
        &self,
        session: &SessionId,
        id: &str,
        change: &LabelChange,
    ) -> Result<LabeledMessage> {
        let token = self.tokens.ensure_access_token(session).await?;
        self.gmail.modify_labels(&token, id, change).await
    }

    /// Fetches the mailbox profile.
    ///
    /// # Errors
    ///
    /// Returns token errors and API failures.
    pub async fn profile(&self, session: &SessionId) -> Result<Profile> {
        let token = self.tokens.ensure_access_token(session).await?;
        self.gmail.profile(&token).await
    }
}
