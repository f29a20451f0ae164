//! Flattening a raw message into display fields.

use mailsift_mime::{Headers, decode_html_entities, extract_body_text};
use serde::{Deserialize, Serialize};

use super::gmail::RawMessage;

/// Display-ready view of one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedMessage {
    /// Message id.
    pub id: String,
    /// Thread id.
    pub thread_id: String,
    /// Decoded `Subject`, empty if absent.
    pub subject: String,
    /// Decoded `From`, empty if absent.
    pub from: String,
    /// Decoded `Date`, empty if absent.
    pub date: String,
    /// Preview text with entities decoded.
    pub snippet: String,
    /// Labels on the message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label_ids: Vec<String>,
    /// Best-effort body text.
    pub body_text: String,
}

impl DecodedMessage {
    /// Returns true if the message carries the `UNREAD` label.
    #[must_use]
    pub fn is_unread(&self) -> bool {
        self.label_ids.iter().any(|l| l == "UNREAD")
    }
}

/// Decodes headers, snippet and body of a raw message. Never fails; missing
/// pieces come out empty.
#[must_use]
pub fn decode_message(raw: &RawMessage) -> DecodedMessage {
    let (headers, body_text) = raw.payload.as_ref().map_or_else(
        || (Headers::new(), String::new()),
        |payload| (payload.headers(), extract_body_text(payload)),
    );

    DecodedMessage {
        id: raw.id.clone(),
        thread_id: raw.thread_id.clone(),
        subject: headers.get_decoded("Subject"),
        from: headers.get_decoded("From"),
        date: headers.get_decoded("Date"),
        snippet: decode_html_entities(&raw.snippet),
        label_ids: raw.label_ids.clone(),
        body_text,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mailsift_mime::{HeaderField, MessagePart};

    #[test]
    fn test_decode_full_message() {
        let mut payload = MessagePart::multipart(
            "multipart/alternative",
            vec![
                MessagePart::leaf("text/plain", "SGVsbG8gV29ybGQ"),
                MessagePart::leaf("text/html", "PGI-SGVsbG88L2I-"),
            ],
        );
        payload.headers = vec![
            HeaderField::new("Subject", "=?UTF-8?B?SGVsbG8=?="),
            HeaderField::new("From", "Ana &lt;ana@example.com&gt;"),
            HeaderField::new("Date", "Mon, 1 Jan 2024 10:00:00 +0000"),
        ];
        let raw = RawMessage {
            id: "m1".into(),
            thread_id: "t1".into(),
            label_ids: vec!["INBOX".into(), "UNREAD".into()],
            snippet: "it&#39;s here".into(),
            payload: Some(payload),
            ..RawMessage::default()
        };

        let decoded = decode_message(&raw);
        assert_eq!(decoded.id, "m1");
        assert_eq!(decoded.thread_id, "t1");
        assert_eq!(decoded.subject, "Hello");
        assert_eq!(decoded.from, "Ana <ana@example.com>");
        assert_eq!(decoded.date, "Mon, 1 Jan 2024 10:00:00 +0000");
        assert_eq!(decoded.snippet, "it's here");
        assert_eq!(decoded.body_text, "Hello World");
        assert!(decoded.is_unread());
    }

    #[test]
    fn test_decode_without_payload() {
        let raw = RawMessage {
            id: "m2".into(),
            ..RawMessage::default()
        };
        let decoded = decode_message(&raw);
        assert_eq!(decoded.subject, "");
        assert_eq!(decoded.body_text, "");
        assert!(!decoded.is_unread());
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(DecodedMessage {
            id: "m".into(),
            thread_id: "t".into(),
            body_text: "b".into(),
            ..DecodedMessage::default()
        })
        .unwrap();
        assert_eq!(json["threadId"], "t");
        assert_eq!(json["bodyText"], "b");
        assert!(json.get("labelIds").is_none());
    }
}
