//! Message header handling.

use crate::encoding::decode_encoded_words;
use crate::html::decode_html_entities;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single `name: value` header as delivered by the mailbox API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderField {
    /// Header name as sent (case preserved).
    pub name: String,
    /// Raw header value.
    pub value: String,
}

impl HeaderField {
    /// Creates a header field.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Collection of email headers with case-insensitive lookup.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    headers: HashMap<String, Vec<String>>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the collection from header fields, preserving order per name.
    #[must_use]
    pub fn from_fields(fields: &[HeaderField]) -> Self {
        let mut headers = Self::new();
        for field in fields {
            headers.add(&field.name, &field.value);
        }
        headers
    }

    /// Adds a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_lowercase();
        let value = value.into();
        self.headers.entry(name).or_default().push(value);
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|v| v.first().map(String::as_str))
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .get(&name.to_lowercase())
            .map(|v| v.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Gets the first value for a header, decoded for display.
    ///
    /// Missing headers decode to an empty string.
    #[must_use]
    pub fn get_decoded(&self, name: &str) -> String {
        self.get(name).map(decode_header_text).unwrap_or_default()
    }

    /// Returns the number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

/// Decodes a header value for display: RFC 2047 encoded words first, then
/// HTML entities.
///
/// Entities may appear inside decoded encoded-word text, never the other
/// way round. Best effort; never fails.
#[must_use]
pub fn decode_header_text(value: &str) -> String {
    decode_html_entities(&decode_encoded_words(value))
}
