//! Gmail REST client.

use mailsift_mime::MessagePart;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::{Error, Result};

/// Production API origin.
pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com";

/// Default page size for inbox listings.
pub const DEFAULT_MAX_RESULTS: u32 = 25;

/// Default label for inbox listings.
pub const DEFAULT_LABEL: &str = "INBOX";

/// Parameters of a message listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Page size.
    pub max_results: u32,
    /// Only messages carrying all of these labels.
    pub label_ids: Vec<String>,
    /// Gmail search expression (`from:alice is:unread`).
    pub query: Option<String>,
    /// Continuation token from a previous page.
    pub page_token: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            label_ids: vec![DEFAULT_LABEL.to_string()],
            query: None,
            page_token: None,
        }
    }
}

impl ListQuery {
    /// Sets the page size.
    #[must_use]
    pub const fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// Replaces the label filter.
    #[must_use]
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.label_ids = labels;
        self
    }

    /// Sets a search expression.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Continues from a previous page.
    #[must_use]
    pub fn with_page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }
}

/// Id pair returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    /// Message id.
    pub id: String,
    /// Thread id.
    #[serde(default)]
    pub thread_id: String,
}

/// One page of a message listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageList {
    /// Messages on this page; absent when the mailbox is empty.
    #[serde(default)]
    pub messages: Vec<MessageRef>,
    /// Token for the next page.
    #[serde(default)]
    pub next_page_token: Option<String>,
    /// Estimated total number of results.
    #[serde(default)]
    pub result_size_estimate: Option<u32>,
}

/// A message as returned by `messages.get` with `format=full`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    /// Message id.
    pub id: String,
    /// Thread id.
    #[serde(default)]
    pub thread_id: String,
    /// Labels on the message.
    #[serde(default)]
    pub label_ids: Vec<String>,
    /// Short preview, HTML-escaped by the API.
    #[serde(default)]
    pub snippet: String,
    /// Receive time in epoch milliseconds, as a string.
    #[serde(default)]
    pub internal_date: Option<String>,
    /// MIME payload tree.
    #[serde(default)]
    pub payload: Option<MessagePart>,
}

/// Labels to add and remove in one `modify` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelChange {
    /// Labels to add.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add_label_ids: Vec<String>,
    /// Labels to remove.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove_label_ids: Vec<String>,
}

impl LabelChange {
    /// Marks the message read.
    #[must_use]
    pub fn mark_read() -> Self {
        Self {
            remove_label_ids: vec!["UNREAD".to_string()],
            ..Self::default()
        }
    }

    /// Marks the message unread.
    #[must_use]
    pub fn mark_unread() -> Self {
        Self {
            add_label_ids: vec!["UNREAD".to_string()],
            ..Self::default()
        }
    }

    /// Moves the message out of the inbox.
    #[must_use]
    pub fn archive() -> Self {
        Self {
            remove_label_ids: vec![DEFAULT_LABEL.to_string()],
            ..Self::default()
        }
    }

    /// Returns true if the change does nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add_label_ids.is_empty() && self.remove_label_ids.is_empty()
    }
}

/// Message labels after a `modify` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabeledMessage {
    /// Message id.
    pub id: String,
    /// Thread id.
    #[serde(default)]
    pub thread_id: String,
    /// Labels now on the message.
    #[serde(default)]
    pub label_ids: Vec<String>,
}

/// Mailbox owner and counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Account address.
    pub email_address: String,
    /// Total messages in the mailbox.
    #[serde(default)]
    pub messages_total: u64,
    /// Total threads in the mailbox.
    #[serde(default)]
    pub threads_total: u64,
    /// Current mailbox history id.
    #[serde(default)]
    pub history_id: String,
}

/// Gmail REST API client for the `users/me` mailbox.
#[derive(Debug, Clone)]
pub struct GmailClient {
    base: Url,
    http_client: Client,
}

impl GmailClient {
    /// Creates a client against the production API.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the signature matches [`GmailClient::with_base_url`].
    pub fn new() -> Result<Self> {
        Self::with_base_url(GMAIL_API_BASE)
    }

    /// Creates a client against another origin (proxies, test servers).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `base` is not an absolute
    /// hierarchical URL.
    pub fn with_base_url(base: &str) -> Result<Self> {
        let base = Url::parse(base)?;
        if base.cannot_be_a_base() {
            return Err(Error::Configuration(format!(
                "Gmail API base {base} cannot carry a path"
            )));
        }
        Ok(Self {
            base,
            http_client: Client::new(),
        })
    }

    /// Uses a caller-provided HTTP client.
    #[must_use]
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Lists message ids.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] on a non-success status,
    /// [`Error::MalformedResponse`] on an unexpected body and
    /// [`Error::Http`] on transport failure.
    pub async fn list_messages(&self, access_token: &str, query: &ListQuery) -> Result<MessageList> {
        let mut url = self.endpoint(&["messages"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("maxResults", &query.max_results.to_string());
            for label in &query.label_ids {
                pairs.append_pair("labelIds", label);
            }
            if let Some(q) = &query.query {
                pairs.append_pair("q", q);
            }
            if let Some(token) = &query.page_token {
                pairs.append_pair("pageToken", token);
            }
        }

        let list: MessageList = Self::send(self.http_client.get(url), access_token).await?;
        debug!(count = list.messages.len(), "listed messages");
        Ok(list)
    }

    /// Fetches one message with its full payload tree.
    ///
    /// # Errors
    ///
    /// Same as [`GmailClient::list_messages`].
    pub async fn get_message(&self, access_token: &str, id: &str) -> Result<RawMessage> {
        let mut url = self.endpoint(&["messages", id])?;
        url.query_pairs_mut().append_pair("format", "full");
        Self::send(self.http_client.get(url), access_token).await
    }

    /// Adds and removes labels on one message.
    ///
    /// # Errors
    ///
    /// Same as [`GmailClient::list_messages`].
    pub async fn modify_labels(
        &self,
        access_token: &str,
        id: &str,
        change: &LabelChange,
    ) -> Result<LabeledMessage> {
        let url = self.endpoint(&["messages", id, "modify"])?;
        Self::send(self.http_client.post(url).json(change), access_token)
            .await
    }

    /// Fetches the mailbox profile.
    ///
    /// # Errors
    ///
    /// Same as [`GmailClient::list_messages`].
    pub async fn profile(&self, access_token: &str) -> Result<Profile> {
        let url = self.endpoint(&["profile"])?;
        Self::send(self.http_client.get(url), access_token).await
    }

    /// `{base}/gmail/v1/users/me/{segments}`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Configuration("Gmail API base cannot carry a path".into()))?
            .pop_if_empty()
            .extend(["gmail", "v1", "users", "me"])
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder, access_token: &str) -> Result<T> {
        let response = request.bearer_auth(access_token).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Gmail API request failed");
            return Err(Error::Provider {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::MalformedResponse(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_ids() {
        let client = GmailClient::new().unwrap();
        let url = client.endpoint(&["messages", "a/b c", "modify"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://gmail.googleapis.com/gmail/v1/users/me/messages/a%2Fb%20c/modify"
        );
    }

    #[test]
    fn test_endpoint_with_base_path() {
        let client = GmailClient::with_base_url("http://127.0.0.1:9000/proxy/").unwrap();
        let url = client.endpoint(&["profile"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/proxy/gmail/v1/users/me/profile");
    }

    #[test]
    fn test_rejects_non_hierarchical_base() {
        assert!(matches!(
            GmailClient::with_base_url("mailto:someone@example.com"),
            Err(Error::Configuration(_))
        ));
        assert!(GmailClient::with_base_url("not a url").is_err());
    }

    #[test]
    fn test_default_query() {
        let query = ListQuery::default();
        assert_eq!(query.max_results, 25);
        assert_eq!(query.label_ids, vec!["INBOX".to_string()]);
    }

    #[test]
    fn test_label_change_json() {
        assert_eq!(
            serde_json::to_string(&LabelChange::mark_read()).unwrap(),
            r#"{"removeLabelIds":["UNREAD"]}"#
        );
        assert!(LabelChange::default().is_empty());
        assert!(!LabelChange::archive().is_empty());
    }

    #[test]
    fn test_message_list_empty_mailbox() {
        let list: MessageList = serde_json::from_str(r#"{"resultSizeEstimate":0}"#).unwrap();
        assert!(list.messages.is_empty());
        assert!(list.next_page_token.is_none());
    }

    #[test]
    fn test_raw_message_json() {
        let raw: RawMessage = serde_json::from_str(
            r#"{"id":"18c","threadId":"18b","labelIds":["INBOX","UNREAD"],
                "snippet":"Hi","internalDate":"1700000000000",
                "payload":{"mimeType":"text/plain","body":{"size":2,"data":"SGk"}}}"#,
        )
        .unwrap();
        assert_eq!(raw.thread_id, "18b");
        assert_eq!(raw.label_ids.len(), 2);
        assert!(raw.payload.is_some());
    }
}
