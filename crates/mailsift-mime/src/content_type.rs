//! MIME content type handling.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "jpeg").
    pub sub_type: String,
    /// Parameters (e.g., charset=utf-8, boundary=xxx).
    pub parameters: HashMap<String, String>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: HashMap::new(),
        }
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameters.get("charset").map(String::as_str)
    }

    /// Checks if this is a text content type.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("text")
    }

    /// Checks for `text/plain`.
    #[must_use]
    pub fn is_text_plain(&self) -> bool {
        self.is_text() && self.sub_type.eq_ignore_ascii_case("plain")
    }

    /// Checks for `text/html`.
    #[must_use]
    pub fn is_text_html(&self) -> bool {
        self.is_text() && self.sub_type.eq_ignore_ascii_case("html")
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2=value2`
    ///
    /// # Errors
    ///
    /// Returns an error if the format is invalid.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split(';');

        // Parse type/subtype
        let type_str = parts
            .next()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::InvalidContentType("Empty content type".to_string()))?;

        let (main_type, sub_type) = type_str
            .split_once('/')
            .ok_or_else(|| Error::InvalidContentType(format!("Missing subtype in {type_str}")))?;

        let mut content_type =
            Self::new(main_type.trim().to_lowercase(), sub_type.trim().to_lowercase());

        // Parse parameters
        for param in parts {
            let param = param.trim();
            if let Some((key, value)) = param.split_once('=') {
                let key = key.trim().to_lowercase();
                let value = value.trim().trim_matches('"').to_string();
                content_type.parameters.insert(key, value);
            }
        }

        Ok(content_type)
    }

    /// Parses an optional MIME type, treating absent or invalid values as unknown.
    #[must_use]
    pub fn parse_lenient(s: Option<&str>) -> Option<Self> {
        s.and_then(|s| Self::parse(s).ok())
    }
}
