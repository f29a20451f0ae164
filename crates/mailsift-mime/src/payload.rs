//! Message payload trees and body text extraction.
//!
//! A payload is the JSON tree a mailbox API returns for one message: each
//! node has a MIME type, optional URL-safe Base64 body data and optional
//! child parts, nested to any depth.

use crate::content_type::ContentType;
use crate::encoding::{decode_base64url_lossy, decode_base64url_text, decode_text_lossy};
use crate::header::{HeaderField, Headers};
use crate::html::{decode_html_entities, strip_tags};
use serde::{Deserialize, Serialize};

/// Body of a payload node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartBody {
    /// Set when the content must be fetched separately (attachments).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<String>,
    /// Size of the decoded body in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// URL-safe Base64 content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// One node of a payload tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    /// Position of the part in the tree (e.g. `0.1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_id: Option<String>,
    /// Declared MIME type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// File name for attachment parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Headers of this part. The root part carries the message headers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<HeaderField>,
    /// Body content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<PartBody>,
    /// Child parts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<Self>,
}

/// Shape of a payload node as seen by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartNode<'a> {
    /// A node with its own content.
    Leaf {
        /// Parsed MIME type, `None` if absent or unparseable.
        content_type: Option<ContentType>,
        /// URL-safe Base64 body data, `None` if absent or empty.
        data: Option<&'a str>,
        /// Whether the node is a file attachment.
        attachment: bool,
    },
    /// A node whose content lives in its children.
    Multipart {
        /// Child parts, in document order.
        parts: &'a [MessagePart],
    },
}

impl MessagePart {
    /// Creates a leaf part with raw (unencoded) content, mainly for tests
    /// and fixtures.
    #[must_use]
    pub fn leaf(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: Some(mime_type.into()),
            body: Some(PartBody {
                data: Some(data.into()),
                ..PartBody::default()
            }),
            ..Self::default()
        }
    }

    /// Creates a container part.
    #[must_use]
    pub fn multipart(mime_type: impl Into<String>, parts: Vec<Self>) -> Self {
        Self {
            mime_type: Some(mime_type.into()),
            parts,
            ..Self::default()
        }
    }

    /// Returns the body data if present and non-empty.
    #[must_use]
    pub fn body_data(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.data.as_deref())
            .filter(|d| !d.is_empty())
    }

    /// Returns true for file attachments (separately fetched or named parts).
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.body.as_ref().is_some_and(|b| b.attachment_id.is_some())
            || self.filename.as_deref().is_some_and(|f| !f.is_empty())
    }

    /// Returns the headers of this part.
    #[must_use]
    pub fn headers(&self) -> Headers {
        Headers::from_fields(&self.headers)
    }

    /// Classifies the node as a leaf or a container.
    #[must_use]
    pub fn node(&self) -> PartNode<'_> {
        if self.parts.is_empty() {
            PartNode::Leaf {
                content_type: ContentType::parse_lenient(self.mime_type.as_deref()),
                data: self.body_data(),
                attachment: self.is_attachment(),
            }
        } else {
            PartNode::Multipart { parts: &self.parts }
        }
    }
}

/// Extracts readable body text from a payload tree.
///
/// 1. The first `text/plain` leaf in depth-first, left-to-right order wins.
/// 2. Otherwise the first `text/html` leaf, with tags stripped and entities
///    decoded.
/// 3. Otherwise the root's own body data, decoded best effort.
/// 4. Otherwise an empty string.
///
/// Attachments never contribute text.
#[must_use]
pub fn extract_body_text(payload: &MessagePart) -> String {
    if let Some(text) = first_text(payload, ContentType::is_text_plain) {
        return text;
    }
    if let Some(html) = first_text(payload, ContentType::is_text_html) {
        return html_to_text(&html);
    }
    decode_base64url_text(payload.body_data())
}

/// Decoded content of the first non-empty leaf whose type satisfies `wanted`.
fn first_text(part: &MessagePart, wanted: fn(&ContentType) -> bool) -> Option<String> {
    match part.node() {
        PartNode::Multipart { parts } => parts.iter().find_map(|child| first_text(child, wanted)),
        PartNode::Leaf {
            content_type: Some(content_type),
            data: Some(data),
            attachment: false,
        } if wanted(&content_type) => {
            let bytes = decode_base64url_lossy(Some(data));
            Some(decode_text_lossy(bytes, content_type.charset())).filter(|text| !text.is_empty())
        }
        PartNode::Leaf { .. } => None,
    }
}

/// Lossy conversion of an HTML body to one line of text.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    decode_html_entities(&strip_tags(html))
}
